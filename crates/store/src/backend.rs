//! The capability-probed contract a layered store composes over.
//!
//! A `Backend` is an arbitrary random-access byte store: a RAM buffer, a
//! local file, a browser-indexed database, or another [`crate::Store`].
//! Every operation is optional — a backend advertises what it supports via
//! the `supports_*` methods, and the store falls back to an overlay-only
//! behavior when a capability is absent (see each method's documentation).

use common::Stat;
use thiserror::Error;

/// Error surfaced by a [`Backend`] implementation.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("{0}")]
    Io(String),
    /// A read returned fewer bytes than requested for a reason other than
    /// end-of-file. Short reads at EOF are not an error — see
    /// [`Backend::read`].
    #[error("could not satisfy length")]
    ShortRead,
    #[error("{0}")]
    Other(String),
}

impl From<BackendError> for common::StoreError {
    fn from(e: BackendError) -> Self {
        common::StoreError::Backend(e.to_string())
    }
}

/// Uniform contract for the store the overlay writes through to.
///
/// Implementors may support any subset of these operations; the
/// `supports_*` methods let the store probe capabilities instead of
/// relying on every backend implementing every operation.
pub trait Backend {
    /// Whether `open` does anything observable. A backend that has no
    /// open step (e.g. a plain RAM buffer) should return `false` here;
    /// the store then treats the backend as implicitly open.
    fn supports_open(&self) -> bool {
        false
    }

    fn open(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    fn supports_read(&self) -> bool {
        true
    }

    /// Read exactly `size` bytes at `offset`, except that a short result
    /// is permitted when `offset + actual_len` lands exactly on the
    /// backend's current end-of-file; the caller is responsible for
    /// zero-filling the remainder.
    fn read(&mut self, offset: u64, size: u64) -> Result<Vec<u8>, BackendError>;

    fn supports_write(&self) -> bool {
        true
    }

    /// Write all of `buf` at `offset`, implicitly extending the
    /// backend's length if necessary.
    fn write(&mut self, offset: u64, buf: &[u8]) -> Result<(), BackendError>;

    fn supports_del(&self) -> bool {
        false
    }

    /// Zero-fill `[offset, offset+size)`. Equivalent to a write of
    /// zeros; backends that don't implement this directly may simply
    /// not support it and let the caller fall back to `write`.
    fn del(&mut self, offset: u64, size: u64) -> Result<(), BackendError> {
        let _ = (offset, size);
        Err(BackendError::Other("del not supported".into()))
    }

    fn supports_truncate(&self) -> bool {
        false
    }

    /// Set the backend's length to exactly `len`.
    fn truncate(&mut self, len: u64) -> Result<(), BackendError> {
        let _ = len;
        Err(BackendError::Other("truncate not supported".into()))
    }

    fn supports_stat(&self) -> bool {
        false
    }

    fn stat(&mut self) -> Result<Stat, BackendError> {
        Err(BackendError::Other("stat not supported".into()))
    }

    fn supports_close(&self) -> bool {
        false
    }

    fn close(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    fn supports_unlink(&self) -> bool {
        false
    }

    fn unlink(&mut self) -> Result<(), BackendError> {
        Ok(())
    }
}
