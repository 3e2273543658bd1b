use std::sync::atomic::{AtomicU64, Ordering};

use crate::common::types::Lsn;

/// Write-ahead log handle.
///
/// The buffer pool accepts and stores one so that log-before-data ordering
/// can be added without touching the pool's API. None of the pool
/// operations invoke it yet; it only hands out log sequence numbers.
pub struct LogManager {
    next_lsn: AtomicU64,
}

impl LogManager {
    pub fn new() -> Self {
        Self {
            next_lsn: AtomicU64::new(1),
        }
    }

    /// Claim the next log sequence number.
    pub fn next_lsn(&self) -> Lsn {
        self.next_lsn.fetch_add(1, Ordering::SeqCst)
    }

    /// The most recently claimed LSN, or 0 if none has been handed out.
    pub fn current_lsn(&self) -> Lsn {
        self.next_lsn.load(Ordering::SeqCst) - 1
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}
