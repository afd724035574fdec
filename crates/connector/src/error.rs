//! Connector error types.

use thiserror::Error;

/// Pointer-store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Fetcher failures.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("fetcher returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed fetch response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A failed tick, tagged with the stage that aborted it.
///
/// Load and fetch failures abort before any write; a persist failure can
/// leave a prefix of the write fan-out applied, which is safe because
/// every individual write is a monotonic advance.
#[derive(Debug, Error)]
pub enum TickError {
    #[error("load: {0}")]
    Load(#[source] StoreError),

    #[error("fetch: {0}")]
    Fetch(#[from] FetchError),

    #[error("persist: {0}")]
    Persist(#[source] StoreError),
}
