//! Remote IP blacklist retrieval
//!
//! Fetches a plaintext denylist over HTTP and splits it into single
//! addresses and network ranges.
//!
//! # Features
//! - One GET per call with an explicit timeout
//! - Lenient or strict classification of each line
//! - Async, blocking, and context-detecting entry points

pub mod error;
pub mod fetcher;
pub mod parser;
pub mod types;

pub use error::{BlacklistError, BlacklistResult};
pub use fetcher::{
    BlacklistFetcher, DEFAULT_ENDPOINT, FetcherConfig, PendingClassification, Retrieval,
};
pub use parser::{Entry, classify, classify_with, parse_entry};
pub use types::{Classification, DiscardedLine, ParseMode};
