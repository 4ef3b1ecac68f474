//! Shared types used across the layered store workspace: configuration,
//! the canonical error type, and the small result structs returned by
//! `stat`-like calls.


use std::io;
use thiserror::Error;

/// Canonical error type shared across the store and its backends.
///
/// Backend implementations define their own error type and convert into
/// this one via `#[from]` so that callers see a single error surface
/// regardless of which backend is plugged in.
#[derive(Error, Debug)]
pub enum StoreError {
    /// `offset + size` (or `offset + data.len()`) exceeds the configured
    /// `strict_size_enforcement` limit.
    #[error("offset {offset} + size {size} exceeds strict size enforcement limit {limit}")]
    LimitExceeded {
        offset: u64,
        size: u64,
        limit: u64,
    },

    /// A `Strict` store was asked to read past the current logical size.
    #[error("read at offset {offset} of length {size} is out of range (size is {current_size})")]
    OutOfRange {
        offset: u64,
        size: u64,
        current_size: u64,
    },

    /// A backend operation failed.
    #[error("backend: {0}")]
    Backend(String),

    /// The backend file does not exist and `create_if_missing` is false.
    #[error("backend file not found")]
    NotFound,

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result alias that carries a [`StoreError`].
pub type StoreResult<T> = Result<T, StoreError>;

/// Length of a backend or overlay, as returned by `stat`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Stat {
    pub size: u64,
}

/// Runtime configuration for a layered store.
///
/// # Example
/// ```
/// use common::StoreConfig;
///
/// let config = StoreConfig::builder()
///     .page_size(4096)
///     .max_pages(64)
///     .strict_size_enforcement(1 << 20)
///     .build();
/// assert_eq!(config.page_size, 4096);
/// ```
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, bon::Builder)]
pub struct StoreConfig {
    /// Page granularity in bytes.
    #[builder(default = 1_048_576)]
    pub page_size: u32,
    /// Maximum number of pages kept resident by the LRU cache.
    #[builder(default = 100)]
    pub max_pages: u32,
    /// Whether opening the backend may create it if missing.
    #[builder(default = true)]
    pub create_if_missing: bool,
    /// Upper bound on addressable byte offset. `None` disables the check.
    pub strict_size_enforcement: Option<u64>,
    /// Whether `close` flushes the whole overlay before closing the backend.
    #[builder(default = true)]
    pub flush_on_close: bool,
    /// Whether a dirty page is flushed before it is evicted from the cache.
    #[builder(default = true)]
    pub auto_flush_on_evict: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            page_size: 1_048_576,
            max_pages: 100,
            create_if_missing: true,
            strict_size_enforcement: None,
            flush_on_close: true,
            auto_flush_on_evict: true,
        }
    }
}
