use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use parking_lot::Mutex;
use thiserror::Error;

use crate::common::types::{PageId, PAGE_SIZE};

#[derive(Error, Debug)]
pub enum DiskManagerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid page ID: {0}")]
    InvalidPageId(PageId),
}

/// DiskManager is responsible for handling the actual disk I/O operations.
///
/// Pages live at `page_id * PAGE_SIZE` in a single database file. A page
/// that was never written reads back as zeros.
pub struct DiskManager {
    db_file: Mutex<File>,
}

impl DiskManager {
    /// Create a new DiskManager with the specified database file
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, DiskManagerError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(db_path)
            .map_err(DiskManagerError::IoError)?;

        Ok(Self {
            db_file: Mutex::new(file),
        })
    }

    /// Read a page from disk into the supplied buffer
    pub fn read_page(&self, page_id: PageId, buf: &mut [u8; PAGE_SIZE]) -> Result<(), DiskManagerError> {
        let offset = Self::page_offset(page_id)?;

        let mut file = self.db_file.lock();
        let file_size = file.metadata().map_err(DiskManagerError::IoError)?.len();

        // A page past the end of the file has never been written; it reads
        // back as zeros.
        if offset + PAGE_SIZE as u64 > file_size {
            buf.fill(0);
            return Ok(());
        }

        file.seek(SeekFrom::Start(offset))
            .map_err(DiskManagerError::IoError)?;
        file.read_exact(buf).map_err(DiskManagerError::IoError)?;

        Ok(())
    }

    /// Write a page to disk
    pub fn write_page(&self, page_id: PageId, buf: &[u8; PAGE_SIZE]) -> Result<(), DiskManagerError> {
        let offset = Self::page_offset(page_id)?;

        let mut file = self.db_file.lock();
        file.seek(SeekFrom::Start(offset))
            .map_err(DiskManagerError::IoError)?;
        file.write_all(buf).map_err(DiskManagerError::IoError)?;
        file.flush().map_err(DiskManagerError::IoError)?;

        Ok(())
    }

    /// Release a page's on-disk storage.
    ///
    /// File space is not reclaimed; a deallocated page simply becomes
    /// eligible to read back as whatever is next written under its id.
    pub fn deallocate_page(&self, page_id: PageId) {
        log::trace!("deallocate page {}", page_id);
    }

    /// Calculate the offset of a page in the file
    fn page_offset(page_id: PageId) -> Result<u64, DiskManagerError> {
        if page_id < 0 {
            return Err(DiskManagerError::InvalidPageId(page_id));
        }
        Ok(page_id as u64 * PAGE_SIZE as u64)
    }
}
