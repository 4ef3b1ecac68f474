//! A single resident page: its bytes and whether they've been written
//! since the last flush.

/// A resident page. `data` is shorter than the configured page size
/// until something writes past its current end; bytes past `data.len()`
/// are logically zero.
#[derive(Debug, Clone, Default)]
pub(crate) struct Page {
    pub data: Vec<u8>,
    pub dirty: bool,
}

impl Page {
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            dirty: false,
        }
    }
}
