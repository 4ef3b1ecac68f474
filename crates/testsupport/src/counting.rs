//! A [`Backend`] wrapper that counts calls per operation, so tests can
//! assert a store served a request entirely from cache (e.g. pinned
//! pages must never round-trip to the backend across an eviction).

use hashbrown::HashMap;

use common::Stat;
use store::{Backend, BackendError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Op {
    Open,
    Read,
    Write,
    Del,
    Truncate,
    Stat,
    Close,
    Unlink,
}

/// Wraps an inner [`Backend`], incrementing a per-operation counter on
/// every call before delegating.
#[derive(Debug)]
pub struct CountingBackend<B> {
    inner: B,
    counts: HashMap<Op, usize>,
}

impl<B: Backend> CountingBackend<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            counts: HashMap::new(),
        }
    }

    fn bump(&mut self, op: Op) {
        *self.counts.entry(op).or_insert(0) += 1;
    }

    pub fn read_count(&self) -> usize {
        *self.counts.get(&Op::Read).unwrap_or(&0)
    }

    pub fn write_count(&self) -> usize {
        *self.counts.get(&Op::Write).unwrap_or(&0)
    }

    pub fn truncate_count(&self) -> usize {
        *self.counts.get(&Op::Truncate).unwrap_or(&0)
    }

    pub fn into_inner(self) -> B {
        self.inner
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }
}

impl<B: Backend> Backend for CountingBackend<B> {
    fn supports_open(&self) -> bool {
        self.inner.supports_open()
    }

    fn open(&mut self) -> Result<(), BackendError> {
        self.bump(Op::Open);
        self.inner.open()
    }

    fn supports_read(&self) -> bool {
        self.inner.supports_read()
    }

    fn read(&mut self, offset: u64, size: u64) -> Result<Vec<u8>, BackendError> {
        self.bump(Op::Read);
        self.inner.read(offset, size)
    }

    fn supports_write(&self) -> bool {
        self.inner.supports_write()
    }

    fn write(&mut self, offset: u64, buf: &[u8]) -> Result<(), BackendError> {
        self.bump(Op::Write);
        self.inner.write(offset, buf)
    }

    fn supports_del(&self) -> bool {
        self.inner.supports_del()
    }

    fn del(&mut self, offset: u64, size: u64) -> Result<(), BackendError> {
        self.bump(Op::Del);
        self.inner.del(offset, size)
    }

    fn supports_truncate(&self) -> bool {
        self.inner.supports_truncate()
    }

    fn truncate(&mut self, len: u64) -> Result<(), BackendError> {
        self.bump(Op::Truncate);
        self.inner.truncate(len)
    }

    fn supports_stat(&self) -> bool {
        self.inner.supports_stat()
    }

    fn stat(&mut self) -> Result<Stat, BackendError> {
        self.bump(Op::Stat);
        self.inner.stat()
    }

    fn supports_close(&self) -> bool {
        self.inner.supports_close()
    }

    fn close(&mut self) -> Result<(), BackendError> {
        self.bump(Op::Close);
        self.inner.close()
    }

    fn supports_unlink(&self) -> bool {
        self.inner.supports_unlink()
    }

    fn unlink(&mut self) -> Result<(), BackendError> {
        self.bump(Op::Unlink);
        self.inner.unlink()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemBackend;

    #[test]
    fn counts_reads_and_writes_separately() {
        let mut backend = CountingBackend::new(MemBackend::new());
        backend.write(0, b"hi").unwrap();
        backend.read(0, 2).unwrap();
        backend.read(0, 2).unwrap();
        assert_eq!(backend.write_count(), 1);
        assert_eq!(backend.read_count(), 2);
    }
}
