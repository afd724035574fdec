//! Cursor-coordinated channel pulling.
//!
//! The tick handler reads per-channel high-water marks from a pointer
//! store, invokes the containerized fetcher with them, folds the returned
//! records into advanced cursors, and persists the result. The fetcher
//! owns the upstream protocol and its own sink; this crate only
//! coordinates cursors.

pub mod error;
pub mod fetcher;
pub mod pointer_store;
pub mod tick;

pub use error::{FetchError, StoreError, TickError};
pub use fetcher::{Fetcher, HttpFetcher};
pub use pointer_store::{JsonPointerStore, MemoryPointerStore, PointerStore};
pub use tick::{fold_records, TickHandler, TickReport, TriggerKind};
