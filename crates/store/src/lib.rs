//! A layered, page-granular byte store.
//!
//! [`Store`] sits in front of an arbitrary random-access [`Backend`] (a
//! RAM buffer, a file, an indexed database, another `Store`, ...) and
//! absorbs reads and writes at byte granularity. It keeps a bounded
//! working set of pages resident under LRU discipline, tracks which
//! pages are dirty, and writes dirty data back to the backend on
//! demand: explicit [`Store::flush`], eviction, or [`Store::close`].
//!
//! Additional facilities layered on top of the paging engine:
//! - [`Store::pin`] / [`Store::unpin`] exclude page ranges from eviction.
//! - [`Store::set_bitmask`] / [`Store::clear_bitmask`] gate byte-level
//!   writes with a bitmap.
//! - [`StoreConfig::strict_size_enforcement`] rejects I/O past a byte
//!   bound.
//! - [`Strict`] wraps a `Store` so that reads past the current size fail
//!   instead of zero-filling.
//!
//! # Example
//!
//! ```
//! use store::Store;
//! use testsupport::MemBackend;
//!
//! let mut store = Store::new(MemBackend::new(), Default::default());
//! store.write(10, b"hi").unwrap();
//! store.write(0, b"hello").unwrap();
//! assert_eq!(store.read(10, 2).unwrap(), b"hi");
//! assert_eq!(store.read(0, 5).unwrap(), b"hello");
//! assert_eq!(store.read(5, 5).unwrap(), vec![0u8; 5]);
//! ```

#[cfg(test)]
mod tests;

mod backend;
mod bitmask;
mod page;
mod store;
mod strict;

pub use backend::{Backend, BackendError};
pub use common::{Stat, StoreConfig, StoreError, StoreResult};
pub use store::Store;
pub use strict::Strict;
