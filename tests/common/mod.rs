use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use axum::{Router, http::StatusCode, routing::get};
use blacklist_fetcher::telemetry;
use tokio::net::TcpListener;

// Helper function to spawn a blacklist server on a random port
pub async fn spawn_server(status: StatusCode, body: &'static str) -> String {
    telemetry::init_tracing();

    let app = Router::new().route("/blacklist", get(move || async move { (status, body) }));

    // Use a random OS port
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("failed to run server");
    });

    format!("http://{addr}/blacklist")
}

// Same as `spawn_server`, for tests that must run without an active runtime
pub fn spawn_server_in_thread(status: StatusCode, body: &'static str) -> String {
    let (tx, rx) = std::sync::mpsc::channel();

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let url = spawn_server(status, body).await;
            tx.send(url).unwrap();
            std::future::pending::<()>().await;
        });
    });

    rx.recv().unwrap()
}

// Like `spawn_server`, also returning how many requests the endpoint served
pub async fn spawn_counting_server(body: &'static str) -> (String, Arc<AtomicUsize>) {
    telemetry::init_tracing();

    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let app = Router::new().route(
        "/blacklist",
        get(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { body }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("failed to run server");
    });

    (format!("http://{addr}/blacklist"), hits)
}
