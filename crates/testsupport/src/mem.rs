//! A plain RAM-buffer backend: the simplest [`Backend`] there is.

use common::Stat;
use store::{Backend, BackendError};

/// Backs a [`store::Store`] with a growable in-memory byte buffer.
///
/// Supports every capability except `open` (a RAM buffer has no open
/// step — the store treats it as implicitly open) and `close`.
#[derive(Debug, Default, Clone)]
pub struct MemBackend {
    data: Vec<u8>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a backend pre-populated with `bytes`, as if a prior session
    /// had already written and flushed them.
    pub fn with_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self { data: bytes.into() }
    }

    /// Snapshot of the backend's current contents, for asserting what a
    /// flush actually committed.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }
}

impl Backend for MemBackend {
    fn supports_read(&self) -> bool {
        true
    }

    fn read(&mut self, offset: u64, size: u64) -> Result<Vec<u8>, BackendError> {
        let offset = offset as usize;
        if offset >= self.data.len() {
            return Ok(Vec::new());
        }
        let end = (offset + size as usize).min(self.data.len());
        Ok(self.data[offset..end].to_vec())
    }

    fn supports_write(&self) -> bool {
        true
    }

    fn write(&mut self, offset: u64, buf: &[u8]) -> Result<(), BackendError> {
        let offset = offset as usize;
        let end = offset + buf.len();
        if self.data.len() < end {
            self.data.resize(end, 0);
        }
        self.data[offset..end].copy_from_slice(buf);
        Ok(())
    }

    fn supports_del(&self) -> bool {
        true
    }

    fn del(&mut self, offset: u64, size: u64) -> Result<(), BackendError> {
        let offset = offset as usize;
        if offset >= self.data.len() {
            return Ok(());
        }
        let end = (offset + size as usize).min(self.data.len());
        for b in &mut self.data[offset..end] {
            *b = 0;
        }
        Ok(())
    }

    fn supports_truncate(&self) -> bool {
        true
    }

    fn truncate(&mut self, len: u64) -> Result<(), BackendError> {
        self.data.resize(len as usize, 0);
        Ok(())
    }

    fn supports_stat(&self) -> bool {
        true
    }

    fn stat(&mut self) -> Result<Stat, BackendError> {
        Ok(Stat {
            size: self.data.len() as u64,
        })
    }

    fn supports_unlink(&self) -> bool {
        true
    }

    fn unlink(&mut self) -> Result<(), BackendError> {
        self.data.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_extends_backend_length() {
        let mut backend = MemBackend::new();
        backend.write(4, b"hi").unwrap();
        assert_eq!(backend.bytes().len(), 6);
        assert_eq!(backend.bytes(), &[0, 0, 0, 0, b'h', b'i']);
    }

    #[test]
    fn read_past_end_is_a_short_read() {
        let mut backend = MemBackend::with_bytes(b"abc".to_vec());
        assert_eq!(backend.read(1, 10).unwrap(), b"bc");
        assert_eq!(backend.read(10, 10).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn unlink_clears_contents() {
        let mut backend = MemBackend::with_bytes(b"abc".to_vec());
        backend.unlink().unwrap();
        assert_eq!(backend.stat().unwrap().size, 0);
    }
}
