use blacklist_fetcher::{
    blacklist::{BlacklistFetcher, Classification},
    config::{Config, OutputFormat},
    telemetry,
};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    // Load configuration
    let config = Config::load()?;
    tracing::info!("Loaded configuration: {:?}", config);

    let fetcher = BlacklistFetcher::new(config.fetcher.to_fetcher_config());
    let classification = fetcher.fetch().await?;

    if !classification.discarded().is_empty() {
        tracing::warn!(
            "Skipped {} malformed blacklist lines",
            classification.discarded().len()
        );
    }

    match config.output.format {
        OutputFormat::Text => print_text(&classification),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&classification)?),
    }

    Ok(())
}

fn print_text(classification: &Classification) {
    for addr in classification.addresses() {
        println!("{addr}");
    }
    for net in classification.ranges() {
        println!("{net}");
    }
}
