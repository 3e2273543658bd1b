use std::sync::Arc;
use parking_lot::RwLock;

/// Page size in bytes (4KB)
pub const PAGE_SIZE: usize = 4096;

/// Page ID type. Valid ids are non-negative.
pub type PageId = i32;

/// ID of a frame that currently holds no page.
pub const INVALID_PAGE_ID: PageId = -1;

/// Buffer pool frame ID type, local to one pool instance.
pub type FrameId = u32;

/// LSN (Log Sequence Number) type
pub type Lsn = u64;

/// Page structure
#[derive(Debug, Clone)]
pub struct Page {
    pub data: [u8; PAGE_SIZE],
    pub page_id: PageId,
}

impl Page {
    pub fn new(page_id: PageId) -> Self {
        Self {
            data: [0; PAGE_SIZE],
            page_id,
        }
    }

    /// Return the page to its unbound state: no id, zeroed contents.
    pub fn reset(&mut self) {
        self.data.fill(0);
        self.page_id = INVALID_PAGE_ID;
    }
}

/// Smart pointer to a page
pub type PagePtr = Arc<RwLock<Page>>;

/// Buffer pool frame structure.
///
/// The page bytes live behind `page`'s own lock so clients can keep reading
/// and writing them after the pool call returns; `pin_count` and `is_dirty`
/// are guarded by the owning instance's latch.
#[derive(Debug)]
pub struct Frame {
    pub page: PagePtr,
    pub pin_count: u32,
    pub is_dirty: bool,
}

impl Frame {
    pub fn new() -> Self {
        Self {
            page: Arc::new(RwLock::new(Page::new(INVALID_PAGE_ID))),
            pin_count: 0,
            is_dirty: false,
        }
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}
