//! Host directory volume.
//!
//! Implements [`StoragePort`] on top of `std::fs`, treating one directory
//! as the root of the removable volume.  A missing directory under an
//! existing parent is an unformatted volume; `format` (re)creates it.
//! A root that exists but is not a directory is never touched.
//! The volume label is kept in a hidden file at the root.

use std::fs::{self, File};
use std::io::{self, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::app::ports::{FileStat, MountStatus, StorageError, StoragePort};

const LABEL_FILE: &str = ".volume-label";

pub struct FsStorage {
    root: PathBuf,
    mounted: bool,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            mounted: false,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        if !self.mounted {
            return Err(StorageError::NotMounted);
        }
        Ok(self.root.join(path))
    }
}

fn open_error(e: &io::Error) -> StorageError {
    match e.kind() {
        ErrorKind::NotFound => StorageError::NotFound,
        _ => StorageError::OpenFailed,
    }
}

impl StoragePort for FsStorage {
    fn mount(&mut self) -> Result<MountStatus, StorageError> {
        match fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => {
                self.mounted = true;
                Ok(MountStatus::Ready)
            }
            Ok(_) => {
                warn!("fs storage: {} is not a directory", self.root.display());
                Err(StorageError::NotReady)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let parent_ready = self
                    .root
                    .parent()
                    .is_some_and(|p| p.as_os_str().is_empty() || p.is_dir());
                if parent_ready {
                    Ok(MountStatus::NoFilesystem)
                } else {
                    Err(StorageError::NotReady)
                }
            }
            Err(e) => {
                debug!("fs storage: {}: {e}", self.root.display());
                Err(StorageError::NotReady)
            }
        }
    }

    fn format(&mut self) -> Result<(), StorageError> {
        self.mounted = false;
        match fs::symlink_metadata(&self.root) {
            Ok(meta) if meta.is_dir() => {
                fs::remove_dir_all(&self.root).map_err(|_| StorageError::FormatFailed)?;
            }
            Ok(_) => {
                warn!("fs storage: refusing to format non-directory {}", self.root.display());
                return Err(StorageError::FormatFailed);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(_) => return Err(StorageError::FormatFailed),
        }
        fs::create_dir_all(&self.root).map_err(|e| {
            warn!("fs storage: create {}: {e}", self.root.display());
            StorageError::FormatFailed
        })?;
        self.mounted = true;
        Ok(())
    }

    fn set_label(&mut self, label: &str) -> Result<(), StorageError> {
        let path = self.resolve(LABEL_FILE)?;
        fs::write(path, label).map_err(|_| StorageError::LabelFailed)
    }

    fn stat(&self, path: &str) -> Result<FileStat, StorageError> {
        let meta = fs::metadata(self.resolve(path)?).map_err(|e| open_error(&e))?;
        if !meta.is_file() {
            return Err(StorageError::NotFound);
        }
        Ok(FileStat { size: meta.len() })
    }

    fn read_file(&self, path: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let mut file = File::open(self.resolve(path)?).map_err(|e| open_error(&e))?;
        let mut filled = 0;
        while filled < buf.len() {
            match file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(_) => return Err(StorageError::ReadFailed),
            }
        }
        Ok(filled)
    }

    fn write_file(&mut self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        let mut file = File::create(self.resolve(path)?).map_err(|_| StorageError::OpenFailed)?;
        file.write_all(data).map_err(|e| match e.kind() {
            ErrorKind::WriteZero => StorageError::ShortTransfer,
            _ => StorageError::WriteFailed,
        })?;
        file.sync_all().map_err(|_| StorageError::WriteFailed)
    }
}
