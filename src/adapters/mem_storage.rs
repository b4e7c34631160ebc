//! In-memory volume.
//!
//! Implements [`StoragePort`] over a `HashMap` of file bodies, with knobs
//! to simulate missing media, an unformatted volume, failed or short
//! reads and write failures.
//! Used by the unit and integration tests.

use std::collections::HashMap;

use log::debug;

use crate::app::ports::{FileStat, MountStatus, StorageError, StoragePort};

#[derive(Debug, Default)]
pub struct MemStorage {
    files: HashMap<String, Vec<u8>>,
    label: Option<String>,
    media_present: bool,
    formatted: bool,
    mounted: bool,
    writes: usize,
    fail_label: bool,
    fail_format: bool,
    fail_writes: bool,
    fail_reads: bool,
    read_limit: Option<usize>,
}

impl MemStorage {
    /// Media present, no filesystem.
    pub fn new() -> Self {
        Self {
            media_present: true,
            ..Self::default()
        }
    }

    /// Media present with an empty filesystem.
    pub fn formatted() -> Self {
        Self {
            media_present: true,
            formatted: true,
            ..Self::default()
        }
    }

    pub fn set_media_present(&mut self, present: bool) {
        self.media_present = present;
        if !present {
            self.mounted = false;
        }
    }

    pub fn fail_label(&mut self, fail: bool) {
        self.fail_label = fail;
    }

    pub fn fail_format(&mut self, fail: bool) {
        self.fail_format = fail;
    }

    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Cap every read at `limit` bytes regardless of file size.
    pub fn set_read_limit(&mut self, limit: Option<usize>) {
        self.read_limit = limit;
    }

    /// Place a file on the volume, as a USB host would.
    pub fn insert_file(&mut self, path: &str, data: &[u8]) {
        self.files.insert(path.to_owned(), data.to_vec());
    }

    pub fn remove_file(&mut self, path: &str) -> Option<Vec<u8>> {
        self.files.remove(path)
    }

    pub fn file(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Successful `write_file` calls so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    fn ensure_mounted(&self) -> Result<(), StorageError> {
        if self.mounted {
            Ok(())
        } else {
            Err(StorageError::NotMounted)
        }
    }
}

impl StoragePort for MemStorage {
    fn mount(&mut self) -> Result<MountStatus, StorageError> {
        if !self.media_present {
            return Err(StorageError::NotReady);
        }
        if !self.formatted {
            return Ok(MountStatus::NoFilesystem);
        }
        self.mounted = true;
        Ok(MountStatus::Ready)
    }

    fn format(&mut self) -> Result<(), StorageError> {
        if !self.media_present || self.fail_format {
            return Err(StorageError::FormatFailed);
        }
        self.files.clear();
        self.label = None;
        self.formatted = true;
        self.mounted = true;
        debug!("mem storage: formatted");
        Ok(())
    }

    fn set_label(&mut self, label: &str) -> Result<(), StorageError> {
        self.ensure_mounted()?;
        if self.fail_label {
            return Err(StorageError::LabelFailed);
        }
        self.label = Some(label.to_owned());
        Ok(())
    }

    fn stat(&self, path: &str) -> Result<FileStat, StorageError> {
        self.ensure_mounted()?;
        self.files
            .get(path)
            .map(|data| FileStat {
                size: data.len() as u64,
            })
            .ok_or(StorageError::NotFound)
    }

    fn read_file(&self, path: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        self.ensure_mounted()?;
        let data = self.files.get(path).ok_or(StorageError::NotFound)?;
        if self.fail_reads {
            return Err(StorageError::ReadFailed);
        }
        let len = data
            .len()
            .min(buf.len())
            .min(self.read_limit.unwrap_or(usize::MAX));
        buf[..len].copy_from_slice(&data[..len]);
        Ok(len)
    }

    fn write_file(&mut self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        self.ensure_mounted()?;
        if self.fail_writes {
            return Err(StorageError::WriteFailed);
        }
        self.files.insert(path.to_owned(), data.to_vec());
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_media_is_not_ready() {
        let mut storage = MemStorage::new();
        storage.set_media_present(false);
        assert_eq!(storage.mount(), Err(StorageError::NotReady));
    }

    #[test]
    fn blank_media_reports_no_filesystem() {
        let mut storage = MemStorage::new();
        assert_eq!(storage.mount(), Ok(MountStatus::NoFilesystem));
        assert_eq!(storage.stat("A.CFG"), Err(StorageError::NotMounted));
    }

    #[test]
    fn format_mounts_and_clears() {
        let mut storage = MemStorage::formatted();
        storage.mount().unwrap();
        storage.write_file("A.CFG", b"x").unwrap();
        storage.format().unwrap();
        assert_eq!(storage.stat("A.CFG"), Err(StorageError::NotFound));
    }

    #[test]
    fn read_truncates_to_buffer() {
        let mut storage = MemStorage::formatted();
        storage.mount().unwrap();
        storage.write_file("A.CFG", b"abcdef").unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(storage.read_file("A.CFG", &mut buf), Ok(4));
        assert_eq!(&buf, b"abcd");
        assert_eq!(storage.stat("A.CFG").unwrap().size, 6);
    }

    #[test]
    fn read_knobs() {
        let mut storage = MemStorage::formatted();
        storage.mount().unwrap();
        storage.insert_file("A.CFG", b"abcdef");
        let mut buf = [0u8; 16];

        storage.set_read_limit(Some(2));
        assert_eq!(storage.read_file("A.CFG", &mut buf), Ok(2));
        storage.fail_reads(true);
        assert_eq!(storage.read_file("A.CFG", &mut buf), Err(StorageError::ReadFailed));
    }

    #[test]
    fn failed_write_is_not_counted() {
        let mut storage = MemStorage::formatted();
        storage.mount().unwrap();
        storage.fail_writes(true);
        assert_eq!(storage.write_file("A.CFG", b"x"), Err(StorageError::WriteFailed));
        assert_eq!(storage.writes(), 0);
    }
}
