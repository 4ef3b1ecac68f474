//! The paging engine: byte-addressed reads and writes over a bounded,
//! dirty-aware LRU page cache, layered atop an arbitrary [`Backend`].

use common::{Stat, StoreConfig, StoreError, StoreResult};
use hashbrown::HashSet;
use lru::LruCache;
use tracing::{debug, warn};

use crate::backend::Backend;
use crate::bitmask::BitmaskGate;
use crate::page::Page;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Fresh,
    Opened,
    Closed,
    Unlinked,
}

/// A layered, page-granular overlay in front of an arbitrary [`Backend`].
///
/// # Example
///
/// ```
/// use store::Store;
/// use testsupport::MemBackend;
///
/// let mut store = Store::new(MemBackend::new(), Default::default());
/// store.write(0, b"Hello, world!").unwrap();
/// assert_eq!(store.read(0, 13).unwrap(), b"Hello, world!");
/// ```
pub struct Store<B: Backend> {
    backend: B,
    config: StoreConfig,
    cache: LruCache<u64, Page>,
    pins: HashSet<u64>,
    dirty: HashSet<u64>,
    bitmask: BitmaskGate,
    size: u64,
    file_exists: bool,
    state: Lifecycle,
}

impl<B: Backend> Store<B> {
    /// Build a store over `backend` with the given configuration.
    ///
    /// # Panics
    ///
    /// Panics if `config.max_pages` is 0.
    pub fn new(backend: B, config: StoreConfig) -> Self {
        assert!(config.max_pages > 0, "max_pages must be > 0");
        Self {
            backend,
            // Capacity is enforced by `ensure_capacity`/`evict_one` below so
            // that pinned pages are never evicted by the crate's own
            // built-in LRU eviction; the cache itself is left unbounded.
            cache: LruCache::unbounded(),
            pins: HashSet::new(),
            dirty: HashSet::new(),
            bitmask: BitmaskGate::default(),
            size: 0,
            file_exists: false,
            config,
            state: Lifecycle::Fresh,
        }
    }

    /// Current logical length of the overlay.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Alias for [`Store::size`].
    pub fn len(&self) -> u64 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Borrow the backend this store overlays. Chiefly useful for tests
    /// that need to observe backend-level call counts or contents
    /// directly, bypassing the overlay.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn page_size(&self) -> u64 {
        self.config.page_size as u64
    }

    // ---- 4.H Lifecycle -----------------------------------------------

    /// Idempotent open. Queries the backend's length (if supported) and
    /// folds it into the logical size. A failing `open` or `stat` is
    /// swallowed and treated as an empty backend when `create_if_missing`
    /// is set; with it unset, either failure surfaces as `NotFound`.
    pub fn open(&mut self) -> StoreResult<()> {
        if self.state != Lifecycle::Fresh {
            return Ok(());
        }
        let mut backend_opened = true;
        if self.backend.supports_open() {
            if let Err(e) = self.backend.open() {
                if !self.config.create_if_missing {
                    return Err(StoreError::NotFound);
                }
                debug!(error = %e, "open failed, treating backend as empty");
                backend_opened = false;
            }
        }
        self.file_exists = backend_opened;
        if backend_opened && self.backend.supports_stat() {
            match self.backend.stat() {
                Ok(Stat { size }) => self.size = self.size.max(size),
                Err(e) => {
                    if !self.config.create_if_missing {
                        return Err(StoreError::NotFound);
                    }
                    debug!(error = %e, "stat failed at open, treating backend as empty");
                }
            }
        }
        self.state = Lifecycle::Opened;
        Ok(())
    }

    fn ensure_opened(&mut self) -> StoreResult<()> {
        if self.state == Lifecycle::Fresh {
            self.open()?;
        }
        Ok(())
    }

    /// Flush (if configured) and close the backend. Never fails due to a
    /// flush error — the error is logged and close proceeds.
    pub fn close(&mut self) -> StoreResult<()> {
        self.ensure_opened()?;
        if self.config.flush_on_close {
            if let Err(e) = self.flush() {
                warn!(error = %e, "flush failed during close, proceeding anyway");
            }
        }
        if self.backend.supports_close() {
            self.backend.close()?;
        }
        self.state = Lifecycle::Closed;
        Ok(())
    }

    /// Delete the backend if it supports `unlink`; otherwise clear all
    /// in-memory state.
    pub fn unlink(&mut self) -> StoreResult<()> {
        self.ensure_opened()?;
        if self.backend.supports_unlink() {
            self.backend.unlink()?;
        } else {
            self.cache.clear();
            self.dirty.clear();
            self.pins.clear();
            self.size = 0;
        }
        self.state = Lifecycle::Unlinked;
        Ok(())
    }

    // ---- 4.C Pin Set ---------------------------------------------------

    fn page_range(&self, offset: u64, size: u64) -> std::ops::RangeInclusive<u64> {
        let page_size = self.page_size();
        let start = offset / page_size;
        let end = if size == 0 {
            start
        } else {
            (offset + size - 1) / page_size
        };
        start..=end
    }

    pub fn pin(&mut self, offset: u64, size: u64) {
        if size == 0 {
            return;
        }
        for p in self.page_range(offset, size) {
            self.pins.insert(p);
        }
    }

    pub fn unpin(&mut self, offset: u64, size: u64) {
        if size == 0 {
            return;
        }
        for p in self.page_range(offset, size) {
            self.pins.remove(&p);
        }
    }

    // ---- 4.D Bitmask Gate -----------------------------------------------

    pub fn set_bitmask(&mut self, buf: Vec<u8>) {
        self.bitmask.set(buf);
    }

    pub fn clear_bitmask(&mut self) {
        self.bitmask.clear();
    }

    // ---- 4.B Page Cache / eviction --------------------------------------

    /// The least-recently-used resident page that isn't pinned, if any.
    fn find_evictable(&self) -> Option<u64> {
        self.cache
            .iter()
            .rev()
            .find(|(k, _)| !self.pins.contains(*k))
            .map(|(k, _)| *k)
    }

    /// Evict one unpinned page, flushing it first if it's dirty and
    /// `auto_flush_on_evict` is set. Returns whether a page was evicted.
    fn evict_one(&mut self) -> StoreResult<bool> {
        let Some(key) = self.find_evictable() else {
            return Ok(false);
        };
        let page = self.cache.pop(&key).expect("key came from the cache");
        self.dirty.remove(&key);
        if page.dirty && self.config.auto_flush_on_evict {
            if let Err(e) = self.flush_one_page(key, &page) {
                warn!(page = key, error = %e, "failed to flush dirty page during eviction");
            }
        }
        Ok(true)
    }

    fn ensure_capacity(&mut self) -> StoreResult<()> {
        while self.cache.len() >= self.config.max_pages as usize {
            if !self.evict_one()? {
                break;
            }
        }
        Ok(())
    }

    /// Evict `percent` of resident pages (LRU-first, pinned pages
    /// skipped). `flush_first` flushes the whole overlay before
    /// evicting, so no per-page flush is needed during eviction itself.
    pub fn evict(&mut self, percent: f64, flush_first: bool) -> StoreResult<()> {
        if flush_first {
            self.flush()?;
        }
        let percent = percent.clamp(0.0, 1.0);
        let target = ((self.cache.len() as f64) * percent).round() as usize;
        for _ in 0..target {
            if !self.evict_one()? {
                break;
            }
        }
        Ok(())
    }

    fn load_page(&mut self, p: u64) -> StoreResult<Page> {
        let page_size = self.page_size();
        let page_offset = p * page_size;
        let mut data = Vec::new();
        if self.file_exists && self.backend.supports_read() {
            data = self
                .backend
                .read(page_offset, page_size)
                .map_err(StoreError::from)?;
            if data.len() as u64 > page_size {
                data.truncate(page_size as usize);
            }
        }
        Ok(Page { data, dirty: false })
    }

    fn ensure_resident(&mut self, p: u64) -> StoreResult<()> {
        if self.cache.contains(&p) {
            return Ok(());
        }
        let page = self.load_page(p)?;
        self.ensure_capacity()?;
        self.cache.push(p, page);
        Ok(())
    }

    // ---- 4.F I/O Engine --------------------------------------------------

    pub fn read(&mut self, offset: u64, size: u64) -> StoreResult<Vec<u8>> {
        self.ensure_opened()?;
        if let Some(limit) = self.config.strict_size_enforcement {
            if offset.saturating_add(size) > limit {
                return Err(StoreError::LimitExceeded { offset, size, limit });
            }
        }
        let mut out = vec![0u8; size as usize];
        if size == 0 {
            return Ok(out);
        }
        let page_size = self.page_size();
        let start_page = offset / page_size;
        let end_page = (offset + size - 1) / page_size;
        for p in start_page..=end_page {
            let page_offset = p * page_size;
            let start_in_page = if p == start_page {
                (offset - page_offset) as usize
            } else {
                0
            };
            let end_in_page = if p == end_page {
                (offset + size - page_offset) as usize
            } else {
                page_size as usize
            };
            self.ensure_resident(p)?;
            let page = self.cache.get(&p).expect("just ensured resident");
            let avail = page.data.len();
            let copy_end = end_in_page.min(avail);
            if start_in_page < copy_end {
                let dst_start = (page_offset + start_in_page as u64 - offset) as usize;
                let n = copy_end - start_in_page;
                out[dst_start..dst_start + n].copy_from_slice(&page.data[start_in_page..copy_end]);
            }
        }
        Ok(out)
    }

    pub fn write(&mut self, offset: u64, data: &[u8]) -> StoreResult<()> {
        self.ensure_opened()?;
        let len = data.len() as u64;
        if let Some(limit) = self.config.strict_size_enforcement {
            if offset.saturating_add(len) > limit {
                return Err(StoreError::LimitExceeded { offset, size: len, limit });
            }
        }
        if len == 0 {
            return Ok(());
        }
        let page_size = self.page_size();
        let start_page = offset / page_size;
        let end_page = (offset + len - 1) / page_size;
        // Bytes that were actually written (not skipped by the bitmask)
        // are the only ones allowed to grow `size` — see DESIGN.md.
        let mut max_written_end = self.size;
        for p in start_page..=end_page {
            let page_offset = p * page_size;
            let start_in_page = if p == start_page {
                (offset - page_offset) as usize
            } else {
                0
            };
            let end_in_page = if p == end_page {
                (offset + len - page_offset) as usize
            } else {
                page_size as usize
            };
            self.ensure_resident(p)?;
            let mut wrote_any = false;
            {
                let page = self.cache.get_mut(&p).expect("just ensured resident");
                for in_page_off in start_in_page..end_in_page {
                    let abs_off = page_offset + in_page_off as u64;
                    if !self.bitmask.permits(abs_off) {
                        continue;
                    }
                    let src_idx = (abs_off - offset) as usize;
                    if page.data.len() <= in_page_off {
                        page.data.resize(in_page_off + 1, 0);
                    }
                    page.data[in_page_off] = data[src_idx];
                    wrote_any = true;
                    max_written_end = max_written_end.max(abs_off + 1);
                }
                if wrote_any {
                    page.dirty = true;
                }
            }
            if wrote_any {
                self.dirty.insert(p);
            }
        }
        self.size = self.size.max(max_written_end);
        Ok(())
    }

    /// Zero-fill `[offset, offset+size)`. `size = None` deletes to the
    /// current end of the overlay, shrinking `size` to `offset`.
    pub fn del(&mut self, offset: u64, size: Option<u64>) -> StoreResult<()> {
        self.ensure_opened()?;
        let current_size = self.size;
        let requested_end = match size {
            Some(s) => offset.saturating_add(s),
            None => u64::MAX,
        };
        let end = requested_end.min(current_size);
        if end > offset {
            let page_size = self.page_size();
            let mut p = offset / page_size;
            let mut pos = offset;
            while pos < end {
                let page_offset = p * page_size;
                let start_in_page = (pos - page_offset) as usize;
                let end_in_page = ((end.min(page_offset + page_size)) - page_offset) as usize;
                if let Some(page) = self.cache.peek_mut(&p) {
                    let avail = page.data.len();
                    let zero_end = end_in_page.min(avail);
                    if start_in_page < zero_end {
                        for b in &mut page.data[start_in_page..zero_end] {
                            *b = 0;
                        }
                        page.dirty = true;
                        self.dirty.insert(p);
                    }
                }
                pos = page_offset + page_size;
                p += 1;
            }
        }
        if end == current_size && offset <= current_size {
            self.size = offset;
        }
        Ok(())
    }

    /// Grow (zero-fill) or shrink the overlay to exactly `new_len`.
    pub fn truncate(&mut self, new_len: u64) -> StoreResult<()> {
        self.ensure_opened()?;
        if new_len > self.size {
            let gap = (new_len - self.size) as usize;
            let zeros = vec![0u8; gap];
            let at = self.size;
            self.write(at, &zeros)?;
            self.size = new_len;
        } else {
            self.size = new_len;
            let page_size = self.page_size();
            let boundary_page = new_len / page_size;
            let evict_keys: Vec<u64> = self
                .cache
                .iter()
                .map(|(k, _)| *k)
                .filter(|&k| k > boundary_page)
                .collect();
            for k in evict_keys {
                self.cache.pop(&k);
                self.dirty.remove(&k);
            }
            if new_len % page_size == 0 {
                self.cache.pop(&boundary_page);
                self.dirty.remove(&boundary_page);
            } else if let Some(page) = self.cache.peek_mut(&boundary_page) {
                let keep = (new_len % page_size) as usize;
                if page.data.len() > keep {
                    page.data.truncate(keep);
                }
                page.dirty = true;
                self.dirty.insert(boundary_page);
            }
            if self.backend.supports_truncate() {
                self.backend.truncate(new_len)?;
            }
        }
        Ok(())
    }

    pub fn stat(&mut self) -> StoreResult<Stat> {
        self.ensure_opened()?;
        Ok(Stat { size: self.size })
    }

    // ---- 4.G Flush Engine ------------------------------------------------

    fn flush_one_page(&mut self, p: u64, page: &Page) -> StoreResult<()> {
        let page_size = self.page_size();
        let abs_offset = p * page_size;
        self.backend.write(abs_offset, &page.data)?;
        Ok(())
    }

    /// Flush `[offset, offset+size)`: write dirty pages (and zero-fill
    /// missing pages within range) back through the backend, clearing
    /// their dirty flag. If `offset + size` exceeded the current size,
    /// also truncate the backend down to it.
    pub fn flush_range(&mut self, offset: u64, size: u64) -> StoreResult<()> {
        self.ensure_opened()?;
        let current_size = self.size;
        let clipped = size.min(current_size.saturating_sub(offset.min(current_size)));
        if clipped > 0 {
            let page_size = self.page_size();
            let start_page = offset / page_size;
            let end_page = (offset + clipped - 1) / page_size;
            for p in start_page..=end_page {
                let page_offset = p * page_size;
                let start_in_page = if p == start_page {
                    offset - page_offset
                } else {
                    0
                };
                let end_in_page = if p == end_page {
                    offset + clipped - page_offset
                } else {
                    page_size
                };
                let abs_offset = page_offset + start_in_page;
                let write_len = (end_in_page - start_in_page) as usize;

                if let Some(page) = self.cache.peek(&p) {
                    let s = start_in_page as usize;
                    let avail = page.data.len();
                    let mut buf = vec![0u8; write_len];
                    if s < avail {
                        let copy_end = (s + write_len).min(avail);
                        buf[..copy_end - s].copy_from_slice(&page.data[s..copy_end]);
                    }
                    self.backend.write(abs_offset, &buf)?;
                } else {
                    let buf = vec![0u8; write_len];
                    self.backend.write(abs_offset, &buf)?;
                }

                if let Some(page) = self.cache.peek_mut(&p) {
                    if page.dirty {
                        page.dirty = false;
                        self.dirty.remove(&p);
                    }
                }
            }
        }
        if current_size < offset.saturating_add(size) && self.backend.supports_truncate() {
            self.backend.truncate(current_size)?;
        }
        Ok(())
    }

    /// Flush the whole overlay (`flush_range(0, size())`).
    pub fn flush(&mut self) -> StoreResult<()> {
        self.flush_range(0, self.size)
    }
}
