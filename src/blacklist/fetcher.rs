use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::thread;
use std::time::Duration;

use reqwest::Client;
use tokio::runtime::{Builder, Handle, RuntimeFlavor};
use tokio::task::block_in_place;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use super::error::{BlacklistError, BlacklistResult};
use super::parser::classify_with;
use super::types::{Classification, ParseMode};

/// Blacklist service queried when no endpoint is configured
pub const DEFAULT_ENDPOINT: &str = "https://core.security.luova.club/api/blacklist?text=1";

/// Configuration for a [`BlacklistFetcher`]
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// URL returning newline separated addresses and ranges
    pub endpoint: String,
    /// Upper bound for the request including reading the body
    pub timeout: Duration,
    /// Reject non-2xx responses instead of classifying their body
    pub require_success: bool,
    pub user_agent: String,
    pub parse_mode: ParseMode,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(30),
            require_success: true,
            user_agent: concat!("blacklist-fetcher/", env!("CARGO_PKG_VERSION")).to_string(),
            parse_mode: ParseMode::Lenient,
        }
    }
}

/// Unstarted fetch-and-classify computation, returned by
/// [`BlacklistFetcher::retrieve`] when called inside an async runtime
pub type PendingClassification =
    Pin<Box<dyn Future<Output = BlacklistResult<Classification>> + Send + 'static>>;

/// Outcome of [`BlacklistFetcher::retrieve`]
pub enum Retrieval {
    /// Fetched on the calling thread because no runtime was active
    Ready(BlacklistResult<Classification>),
    /// Deferred because a runtime is driving the calling thread; must be awaited
    Pending(PendingClassification),
}

impl Retrieval {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Take the materialized result, if there is one
    pub fn into_ready(self) -> Option<BlacklistResult<Classification>> {
        match self {
            Self::Ready(result) => Some(result),
            Self::Pending(_) => None,
        }
    }

    /// Await the pending computation or hand back the ready result
    pub async fn resolve(self) -> BlacklistResult<Classification> {
        match self {
            Self::Ready(result) => result,
            Self::Pending(pending) => pending.await,
        }
    }
}

impl fmt::Debug for Retrieval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(result) => f.debug_tuple("Ready").field(result).finish(),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// Fetches the remote blacklist and classifies it.
///
/// Every call performs exactly one GET with a fresh HTTP client. Nothing is
/// cached and nothing is retried.
#[derive(Debug, Clone, Default)]
pub struct BlacklistFetcher {
    config: FetcherConfig,
}

impl BlacklistFetcher {
    /// Create a new fetcher
    pub fn new(config: FetcherConfig) -> Self {
        Self { config }
    }

    /// Create a fetcher for `endpoint` with otherwise default settings
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self::new(FetcherConfig {
            endpoint: endpoint.into(),
            ..FetcherConfig::default()
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Download the raw blacklist text
    #[instrument(skip(self), fields(endpoint = %self.config.endpoint))]
    pub async fn fetch_raw(&self) -> BlacklistResult<String> {
        let url = &self.config.endpoint;
        info!("Fetching blacklist from: {}", url);

        let client = Client::builder()
            .user_agent(self.config.user_agent.as_str())
            .build()?;

        let request = async {
            let response = client.get(url).send().await?;
            let status = response.status();

            if !status.is_success() {
                if self.config.require_success {
                    return Err(BlacklistError::Status {
                        status,
                        url: url.clone(),
                    });
                }
                warn!("Blacklist endpoint {} returned {}, using body anyway", url, status);
            }

            Ok::<_, BlacklistError>(response.text().await?)
        };

        let body = match timeout(self.config.timeout, request).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(BlacklistError::Timeout {
                    timeout: self.config.timeout,
                });
            }
        };

        info!("Fetched {} bytes of blacklist data from {}", body.len(), url);
        Ok(body)
    }

    /// Fetch and classify the blacklist
    pub async fn fetch(&self) -> BlacklistResult<Classification> {
        let raw = self.fetch_raw().await?;
        classify_with(&raw, self.config.parse_mode)
    }

    /// Fetch and classify the blacklist, blocking the calling thread.
    ///
    /// Without a surrounding runtime a private current-thread runtime drives
    /// the fetch. On a multi-thread runtime the fetch runs through
    /// [`block_in_place`] so the worker's other tasks are handed off. A
    /// current-thread runtime cannot hand off its tasks, so the fetch runs on
    /// a scoped thread with its own runtime while this thread waits.
    pub fn fetch_blocking(&self) -> BlacklistResult<Classification> {
        match Handle::try_current() {
            Err(_) => self.block_on_own_runtime(),
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                debug!("Blocking on the surrounding multi-thread runtime");
                block_in_place(|| handle.block_on(self.fetch()))
            }
            Ok(_) => {
                debug!("Current-thread runtime detected, fetching on a dedicated thread");
                thread::scope(|scope| scope.spawn(|| self.block_on_own_runtime()).join())
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            }
        }
    }

    fn block_on_own_runtime(&self) -> BlacklistResult<Classification> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(BlacklistError::Runtime)?;

        runtime.block_on(self.fetch())
    }

    /// Fetch in whichever way suits the calling context.
    ///
    /// Inside a tokio runtime this returns [`Retrieval::Pending`] without
    /// touching the network; the caller has to await it. Outside a runtime
    /// the fetch runs to completion here and [`Retrieval::Ready`] is returned.
    ///
    /// Detection goes by the runtime handle, which `spawn_blocking` threads
    /// and `Runtime::enter` guards also carry. Synchronous code on such a
    /// thread should call [`fetch_blocking`](Self::fetch_blocking) directly.
    pub fn retrieve(&self) -> Retrieval {
        if Handle::try_current().is_ok() {
            debug!("Async runtime detected, deferring blacklist fetch");
            let fetcher = self.clone();
            Retrieval::Pending(Box::pin(async move { fetcher.fetch().await }))
        } else {
            debug!("No async runtime active, fetching blacklist synchronously");
            Retrieval::Ready(self.fetch_blocking())
        }
    }
}
