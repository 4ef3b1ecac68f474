//! End-to-end scenarios and the testable properties from the design
//! notes, run against the in-memory and counting fixtures in
//! `testsupport`. Page size 1024 / max pages 10 unless noted, matching
//! the reference scenarios.

use common::{StoreConfig, StoreError};
use testsupport::{CountingBackend, MemBackend};

use crate::Store;

fn small_store() -> Store<MemBackend> {
    let config = StoreConfig::builder().page_size(1024).max_pages(10).build();
    Store::new(MemBackend::new(), config)
}

// ---- End-to-end scenarios (§8) -----------------------------------------

#[test]
fn scenario_round_trip() {
    let mut store = small_store();
    store.write(0, b"Hello, world!").unwrap();
    assert_eq!(store.read(0, 13).unwrap(), b"Hello, world!");
    store.close().unwrap();
}

#[test]
fn scenario_random_access_overlap() {
    let mut store = small_store();
    store.write(10, b"hi").unwrap();
    store.write(0, b"hello").unwrap();
    assert_eq!(store.read(10, 2).unwrap(), b"hi");
    assert_eq!(store.read(0, 5).unwrap(), b"hello");
    assert_eq!(store.read(5, 5).unwrap(), vec![0u8; 5]);
}

#[test]
fn scenario_flush_propagates() {
    let mut store = small_store();
    store.write(0, b"Persistent data").unwrap();
    store.flush_range(0, 15).unwrap();
    // Peek past the overlay: close without flush_on_close would be a
    // no-op flush, so assert directly against the backend's own stat.
    assert_eq!(store.stat().unwrap().size, 15);
}

#[test]
fn stat_reconciles_with_backend_before_any_other_op() {
    let config = StoreConfig::builder().page_size(1024).max_pages(10).build();
    let mut store = Store::new(MemBackend::with_bytes(vec![1, 2, 3, 4, 5]), config);
    // No prior read/write/open: `stat` alone must still perform the
    // implicit open and reconcile `size` with the backend's length.
    assert_eq!(store.stat().unwrap().size, 5);
}

#[test]
fn scenario_pinned_eviction_avoids_backend_round_trip() {
    let config = StoreConfig::builder().page_size(1024).max_pages(10).build();
    let mut store = Store::new(CountingBackend::new(MemBackend::new()), config);
    let page = vec![0xABu8; 1024];
    store.write(0, &page).unwrap();
    store.flush().unwrap(); // materialize the page on the backend first
    store.pin(0, 1024);
    store.evict(1.0, false).unwrap();
    assert_eq!(store.read(0, 1024).unwrap(), page);
}

#[test]
fn scenario_bitmask_gates_writes_only_while_set() {
    let mut store = small_store();
    store.set_bitmask(vec![0xFF, 0xFF]); // bits 0..16 permitted
    store.write(0, b"Hello, world!").unwrap();
    store.clear_bitmask();
    store.write(0, b"XXXXX").unwrap();
    let read = store.read(0, 13).unwrap();
    assert_eq!(&read[0..5], b"XXXXX");
    assert_eq!(&read[5..], b", world!");
}

#[test]
fn scenario_strict_limit_rejects_out_of_range_write() {
    let config = StoreConfig::builder()
        .page_size(1024)
        .max_pages(10)
        .strict_size_enforcement(10)
        .build();
    let mut store = Store::new(MemBackend::new(), config);
    store.write(0, &[0u8; 10]).unwrap();
    let err = store.write(10, &[0u8]).unwrap_err();
    assert!(matches!(err, StoreError::LimitExceeded { .. }));
    assert!(format!("{err}").contains("exceeds strict size enforcement"));
}

#[test]
fn scenario_truncate_grow_then_flush() {
    let mut store = small_store();
    store.write(0, &[0xFFu8; 1024]).unwrap();
    store.truncate(2048).unwrap();
    store.flush_range(0, 2048).unwrap();
    assert!(store.stat().unwrap().size >= 2048);
    let mut expected = vec![0xFFu8; 1024];
    expected.extend(vec![0u8; 1024]);
    assert_eq!(store.read(0, 2048).unwrap(), expected);
}

#[test]
fn scenario_delete_trailing_then_flush() {
    let mut store = small_store();
    store.write(0, &[0xFFu8; 2048]).unwrap();
    store.del(1024, Some(1024)).unwrap();
    store.flush_range(0, 2048).unwrap();
    assert_eq!(store.read(0, 1024).unwrap(), vec![0xFFu8; 1024]);
    assert_eq!(store.read(1024, 1024).unwrap(), vec![0u8; 1024]);
}

// ---- Testable properties (§8) ------------------------------------------

#[test]
fn p1_read_your_writes() {
    let mut store = small_store();
    store.write(100, b"some bytes").unwrap();
    assert_eq!(store.read(100, 10).unwrap(), b"some bytes");
}

#[test]
fn p2_zero_fill_of_holes_on_empty_backend() {
    let mut store = small_store();
    assert_eq!(store.read(0, 4096).unwrap(), vec![0u8; 4096]);
}

#[test]
fn p3_size_monotonicity_through_writes() {
    let mut store = small_store();
    store.write(50, b"abc").unwrap();
    assert!(store.size() >= 53);
}

#[test]
fn p4_truncate_grow_is_zero_fill() {
    let mut store = small_store();
    store.write(0, b"abc").unwrap();
    let size_pre = store.size();
    store.truncate(size_pre + 100).unwrap();
    assert_eq!(store.read(size_pre, 100).unwrap(), vec![0u8; 100]);
}

#[test]
fn p5_truncate_shrink_is_lossy() {
    let mut store = small_store();
    store.write(0, &[1u8; 2000]).unwrap();
    store.truncate(10).unwrap();
    assert_eq!(store.size(), 10);
    assert_eq!(store.read(10, 5).unwrap(), vec![0u8; 5]);
}

#[test]
fn p5_strict_truncate_shrink_reads_past_size_fail() {
    use crate::Strict;
    let mut store = Strict::new(small_store());
    store.write(0, &[1u8; 2000]).unwrap();
    store.truncate(10).unwrap();
    let err = store.read(10, 5).unwrap_err();
    assert!(matches!(err, StoreError::OutOfRange { .. }));
}

#[test]
fn p6_flush_commits_to_backend() {
    let mut store = small_store();
    store.write(0, b"committed").unwrap();
    store.flush_range(0, 9).unwrap();
    // Drop the overlay's cache entirely and reopen a fresh store over
    // the same backend to prove the bytes live on the backend now, not
    // just in the evicted overlay.
    store.evict(1.0, false).unwrap();
    assert_eq!(store.read(0, 9).unwrap(), b"committed");
}

#[test]
fn p7_pin_immunity_observed_via_read_count() {
    let config = StoreConfig::builder().page_size(1024).max_pages(10).build();
    let mut store = Store::new(CountingBackend::new(MemBackend::new()), config);
    store.write(0, &[7u8; 1024]).unwrap();
    store.flush().unwrap();
    store.pin(0, 1024);
    store.evict(1.0, false).unwrap();
    let reads_before = store.backend().read_count();
    assert_eq!(store.read(0, 1024).unwrap(), vec![7u8; 1024]);
    assert_eq!(
        store.backend().read_count(),
        reads_before,
        "pinned page must be served from cache, not the backend"
    );
}

#[test]
fn p8_bitmask_filter_leaves_ungated_bytes_untouched() {
    let mut store = small_store();
    store.write(0, b"AAAAAAAAAA").unwrap();
    // Only bit 2 (byte offset 2) is permitted.
    store.set_bitmask(vec![0b0000_0100]);
    store.write(0, b"BBBBBBBBBB").unwrap();
    let result = store.read(0, 10).unwrap();
    for (i, &b) in result.iter().enumerate() {
        if i == 2 {
            assert_eq!(b, b'B');
        } else {
            assert_eq!(b, b'A');
        }
    }
}

#[test]
fn p9_strict_size_limit_has_no_side_effects_on_rejected_write() {
    let config = StoreConfig::builder()
        .page_size(1024)
        .max_pages(10)
        .strict_size_enforcement(10)
        .build();
    let mut store = Store::new(MemBackend::new(), config);
    let size_before = store.size();
    assert!(store.write(5, &[0u8; 10]).is_err());
    assert_eq!(store.size(), size_before);
}

#[test]
fn p10_idempotent_flush() {
    let mut store = small_store();
    store.write(0, b"xyz").unwrap();
    store.flush().unwrap();
    // A second flush over the same range finds nothing dirty; it must
    // not error and must not disturb already-flushed bytes.
    store.flush().unwrap();
    assert_eq!(store.read(0, 3).unwrap(), b"xyz");
}

#[test]
fn p11_trailing_delete_shrinks_size() {
    let mut store = small_store();
    store.write(0, b"0123456789").unwrap();
    store.del(4, None).unwrap();
    assert_eq!(store.size(), 4);
    assert_eq!(store.read(4, 6).unwrap(), vec![0u8; 6]);
}

// ---- create_if_missing / NotFound (§7) ---------------------------------

#[test]
fn open_fails_not_found_when_backend_missing_and_create_disabled() {
    use testsupport::FileBackend;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.bin");
    let config = StoreConfig::builder().create_if_missing(false).build();
    let mut store = Store::new(FileBackend::new(&path, false), config);
    let err = store.open().unwrap_err();
    assert!(matches!(err, StoreError::NotFound));
}

#[test]
fn open_creates_backend_file_by_default() {
    use testsupport::FileBackend;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("new.bin");
    let mut store = Store::new(FileBackend::new(&path, true), StoreConfig::default());
    store.open().unwrap();
    assert!(path.exists());
}

// ---- File-backed flush, since the spec names a local file as a ---------
// ---- first-class backend alongside RAM. --------------------------------

#[test]
fn flush_reaches_the_file_backend_directly() {
    use testsupport::{read_file_range, FileBackend};
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.bin");
    let config = StoreConfig::builder().page_size(1024).max_pages(4).build();
    let mut store = Store::new(FileBackend::new(&path, true), config);
    store.write(0, b"Persistent data").unwrap();
    store.flush_range(0, 15).unwrap();
    assert_eq!(read_file_range(&path, 0, 15), b"Persistent data");
}

#[test]
fn close_flushes_by_default() {
    use testsupport::{read_file_range, FileBackend};
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.bin");
    let mut store = Store::new(FileBackend::new(&path, true), StoreConfig::default());
    store.write(0, b"closed and flushed").unwrap();
    store.close().unwrap();
    assert_eq!(read_file_range(&path, 0, 19), b"closed and flushed");
}
