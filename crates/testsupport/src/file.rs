//! A local-file [`Backend`], grounded on the same `OpenOptions` + seek
//! pattern the workspace's buffer pool (`buffer::FilePager`) uses.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use common::Stat;
use store::{Backend, BackendError};

/// Backs a [`store::Store`] with a single file on the local filesystem.
///
/// The file is opened lazily on [`Backend::open`]; if `create_if_missing`
/// is `false` and the file does not exist, `open` fails and the store
/// surfaces [`common::StoreError::NotFound`].
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    create_if_missing: bool,
    file: Option<File>,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>, create_if_missing: bool) -> Self {
        Self {
            path: path.into(),
            create_if_missing,
            file: None,
        }
    }

    fn file_mut(&mut self) -> Result<&mut File, BackendError> {
        self.file
            .as_mut()
            .ok_or_else(|| BackendError::Other("backend not open".into()))
    }
}

impl Backend for FileBackend {
    fn supports_open(&self) -> bool {
        true
    }

    fn open(&mut self) -> Result<(), BackendError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(self.create_if_missing)
            .open(&self.path)
            .map_err(|e| BackendError::Io(format!("open {}: {e}", self.path.display())))?;
        self.file = Some(file);
        Ok(())
    }

    fn supports_read(&self) -> bool {
        true
    }

    fn read(&mut self, offset: u64, size: u64) -> Result<Vec<u8>, BackendError> {
        let file = self.file_mut()?;
        file.seek(SeekFrom::Start(offset))
            .map_err(|e| BackendError::Io(e.to_string()))?;
        let mut buf = vec![0u8; size as usize];
        let mut read_total = 0usize;
        loop {
            match file.read(&mut buf[read_total..]) {
                Ok(0) => break,
                Ok(n) => read_total += n,
                Err(e) => return Err(BackendError::Io(e.to_string())),
            }
            if read_total == buf.len() {
                break;
            }
        }
        buf.truncate(read_total);
        Ok(buf)
    }

    fn supports_write(&self) -> bool {
        true
    }

    fn write(&mut self, offset: u64, data: &[u8]) -> Result<(), BackendError> {
        let file = self.file_mut()?;
        file.seek(SeekFrom::Start(offset))
            .map_err(|e| BackendError::Io(e.to_string()))?;
        file.write_all(data)
            .map_err(|e| BackendError::Io(e.to_string()))
    }

    fn supports_truncate(&self) -> bool {
        true
    }

    fn truncate(&mut self, len: u64) -> Result<(), BackendError> {
        let file = self.file_mut()?;
        file.set_len(len).map_err(|e| BackendError::Io(e.to_string()))
    }

    fn supports_stat(&self) -> bool {
        true
    }

    fn stat(&mut self) -> Result<Stat, BackendError> {
        let file = self.file_mut()?;
        let len = file
            .metadata()
            .map_err(|e| BackendError::Io(e.to_string()))?
            .len();
        Ok(Stat { size: len })
    }

    fn supports_close(&self) -> bool {
        true
    }

    fn close(&mut self) -> Result<(), BackendError> {
        self.file = None;
        Ok(())
    }

    fn supports_unlink(&self) -> bool {
        true
    }

    fn unlink(&mut self) -> Result<(), BackendError> {
        self.file = None;
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BackendError::Io(e.to_string())),
        }
    }
}

/// Directly read `size` bytes at `offset` from the file at `path`,
/// bypassing any [`store::Store`] overlay. Used by tests that assert a
/// flush actually reached the backend.
pub fn read_file_range(path: &Path, offset: u64, size: u64) -> Vec<u8> {
    let mut file = File::open(path).expect("file exists");
    file.seek(SeekFrom::Start(offset)).unwrap();
    let mut buf = vec![0u8; size as usize];
    let mut read_total = 0usize;
    while read_total < buf.len() {
        match file.read(&mut buf[read_total..]) {
            Ok(0) => break,
            Ok(n) => read_total += n,
            Err(e) => panic!("read failed: {e}"),
        }
    }
    buf.truncate(read_total);
    buf
}
