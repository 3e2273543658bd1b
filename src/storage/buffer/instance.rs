use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use log::{debug, warn};
use parking_lot::Mutex;

use crate::common::types::{Frame, FrameId, PageId, PagePtr};
use crate::storage::buffer::error::BufferPoolError;
use crate::storage::buffer::replacer::LRUReplacer;
use crate::storage::buffer::BufferPool;
use crate::storage::disk::DiskManager;
use crate::storage::wal::LogManager;

/// Bookkeeping guarded by the instance latch. Every public operation locks
/// this for its whole duration, disk I/O included.
struct InstanceState {
    frames: Vec<Frame>,
    page_table: HashMap<PageId, FrameId>,
    free_list: VecDeque<FrameId>,
    next_page_id: PageId,
}

/// A single buffer pool shard.
///
/// Owns a fixed set of frames and the pages cached in them. When used as
/// shard `k` of `n`, it allocates and caches exactly the page ids congruent
/// to `k` modulo `n`; a standalone instance is the `k = 0, n = 1` case.
///
/// Frames sit in exactly one of three places at any time: the free list,
/// the replacer's eviction order, or pinned in the page table. The replacer
/// keeps its own lock and is only ever called while the instance latch is
/// held, never the other way around.
pub struct BufferPoolInstance {
    pool_size: usize,
    num_instances: u32,
    instance_index: u32,
    state: Mutex<InstanceState>,
    replacer: LRUReplacer,
    disk_manager: Arc<DiskManager>,
    log_manager: Option<Arc<LogManager>>,
}

impl BufferPoolInstance {
    /// Create a standalone instance owning every page id.
    pub fn new(pool_size: usize, disk_manager: Arc<DiskManager>) -> Self {
        Self::with_sharding(pool_size, 1, 0, disk_manager, None)
    }

    /// Create a standalone instance that keeps a WAL handle for later use.
    pub fn new_with_wal(
        pool_size: usize,
        disk_manager: Arc<DiskManager>,
        log_manager: Arc<LogManager>,
    ) -> Self {
        Self::with_sharding(pool_size, 1, 0, disk_manager, Some(log_manager))
    }

    /// Create instance `instance_index` of `num_instances`.
    pub fn with_sharding(
        pool_size: usize,
        num_instances: u32,
        instance_index: u32,
        disk_manager: Arc<DiskManager>,
        log_manager: Option<Arc<LogManager>>,
    ) -> Self {
        assert!(num_instances > 0, "a pool needs at least one instance");
        assert!(
            instance_index < num_instances,
            "instance index {} out of range for {} instances",
            instance_index,
            num_instances
        );

        let mut frames = Vec::with_capacity(pool_size);
        let mut free_list = VecDeque::with_capacity(pool_size);
        for frame_id in 0..pool_size {
            frames.push(Frame::new());
            free_list.push_back(frame_id as FrameId);
        }

        Self {
            pool_size,
            num_instances,
            instance_index,
            state: Mutex::new(InstanceState {
                frames,
                page_table: HashMap::new(),
                free_list,
                next_page_id: instance_index as PageId,
            }),
            replacer: LRUReplacer::new(pool_size),
            disk_manager,
            log_manager,
        }
    }

    /// Fetch a page from the buffer pool or disk
    pub fn fetch_page(&self, page_id: PageId) -> Result<PagePtr, BufferPoolError> {
        let mut state = self.state.lock();

        if let Some(&frame_id) = state.page_table.get(&page_id) {
            let frame = &mut state.frames[frame_id as usize];
            frame.pin_count += 1;
            let page = frame.page.clone();
            // A resident page with no pins sits in the eviction order; the
            // new pin takes it back out. No-op when it was already pinned.
            self.replacer.pin(frame_id);
            return Ok(page);
        }

        let frame_id = self.acquire_frame(&mut state)?;
        let frame = &mut state.frames[frame_id as usize];
        frame.pin_count = 1;
        frame.is_dirty = false;
        {
            let mut page = frame.page.write();
            page.page_id = page_id;
            if let Err(e) = self.disk_manager.read_page(page_id, &mut page.data) {
                page.reset();
                drop(page);
                frame.pin_count = 0;
                state.free_list.push_back(frame_id);
                return Err(e.into());
            }
        }
        let page = frame.page.clone();
        state.page_table.insert(page_id, frame_id);
        self.replacer.pin(frame_id);

        Ok(page)
    }

    /// Create a new page owned by this instance, pinned in a fresh frame
    pub fn new_page(&self) -> Result<(PagePtr, PageId), BufferPoolError> {
        let mut state = self.state.lock();

        let page_id = self.allocate_page_id(&mut state);
        let frame_id = self.acquire_frame(&mut state)?;

        let frame = &mut state.frames[frame_id as usize];
        frame.pin_count = 1;
        frame.is_dirty = false;
        {
            let mut page = frame.page.write();
            page.reset();
            page.page_id = page_id;
        }
        let page = frame.page.clone();
        state.page_table.insert(page_id, frame_id);
        // The slot came from the free list or straight out of the replacer;
        // either way it is already absent from the eviction order.

        Ok((page, page_id))
    }

    /// Unpin a page, potentially marking it as dirty.
    ///
    /// Returns false if the page is not resident or had no outstanding pins.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        let mut state = self.state.lock();

        let frame_id = match state.page_table.get(&page_id) {
            Some(&id) => id,
            None => return false,
        };

        let frame = &mut state.frames[frame_id as usize];
        if frame.pin_count == 0 {
            warn!("unpin of page {} which has no outstanding pins", page_id);
            return false;
        }

        // The dirty bit is sticky until a flush or eviction writes the
        // page back; an `is_dirty = false` unpin never clears it.
        if is_dirty {
            frame.is_dirty = true;
        }

        frame.pin_count -= 1;
        if frame.pin_count == 0 {
            self.replacer.unpin(frame_id);
        }
        true
    }

    /// Write a page to disk, pinned or not.
    ///
    /// Returns false if the page is not resident in this instance.
    pub fn flush_page(&self, page_id: PageId) -> Result<bool, BufferPoolError> {
        let mut state = self.state.lock();

        // INVALID_PAGE_ID is never mapped, so the lookup also covers it.
        let frame_id = match state.page_table.get(&page_id) {
            Some(&id) => id,
            None => return Ok(false),
        };

        let frame = &mut state.frames[frame_id as usize];
        {
            let page = frame.page.read();
            self.disk_manager.write_page(page_id, &page.data)?;
        }
        frame.is_dirty = false;

        Ok(true)
    }

    /// Write every page resident in this instance to disk
    pub fn flush_all_pages(&self) -> Result<(), BufferPoolError> {
        let mut state = self.state.lock();

        let resident: Vec<(PageId, FrameId)> =
            state.page_table.iter().map(|(&p, &f)| (p, f)).collect();

        for (page_id, frame_id) in resident {
            let frame = &mut state.frames[frame_id as usize];
            {
                let page = frame.page.read();
                self.disk_manager.write_page(page_id, &page.data)?;
            }
            frame.is_dirty = false;
        }

        Ok(())
    }

    /// Deallocate a page and drop it from the pool.
    ///
    /// Returns false if the page is resident and still pinned; returns true
    /// when the page was dropped or was not resident to begin with.
    pub fn delete_page(&self, page_id: PageId) -> Result<bool, BufferPoolError> {
        let mut state = self.state.lock();

        // The deallocation hook fires whether or not the page is resident.
        self.disk_manager.deallocate_page(page_id);

        let frame_id = match state.page_table.get(&page_id) {
            Some(&id) => id,
            None => return Ok(true),
        };

        let frame = &mut state.frames[frame_id as usize];
        if frame.pin_count != 0 {
            debug!("refusing to delete page {} with {} pins", page_id, frame.pin_count);
            return Ok(false);
        }

        if frame.is_dirty {
            let page = frame.page.read();
            self.disk_manager.write_page(page_id, &page.data)?;
        }
        frame.is_dirty = false;
        frame.page.write().reset();

        // A freed frame must not linger in the eviction order.
        self.replacer.pin(frame_id);
        state.page_table.remove(&page_id);
        state.free_list.push_back(frame_id);

        Ok(true)
    }

    /// Number of frames owned by this instance
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Index of this instance within its pool
    pub fn instance_index(&self) -> u32 {
        self.instance_index
    }

    /// Get a reference to the disk manager
    pub fn disk_manager(&self) -> Arc<DiskManager> {
        self.disk_manager.clone()
    }

    /// Get a reference to the log manager, if one was attached
    pub fn log_manager(&self) -> Option<Arc<LogManager>> {
        self.log_manager.clone()
    }

    /// Hand out the next page id owned by this instance. Ids step by the
    /// instance count so that every id maps back here under modulo routing.
    fn allocate_page_id(&self, state: &mut InstanceState) -> PageId {
        let page_id = state.next_page_id;
        state.next_page_id += self.num_instances as PageId;
        assert_eq!(
            page_id % self.num_instances as PageId,
            self.instance_index as PageId,
            "allocated page id {} does not map back to instance {}",
            page_id,
            self.instance_index
        );
        page_id
    }

    /// Claim a frame to hold a new page: free list first, then eviction.
    ///
    /// An evicted dirty page is written back before its binding is removed.
    /// Fails with `NoFreeFrames` when every frame is pinned.
    fn acquire_frame(&self, state: &mut InstanceState) -> Result<FrameId, BufferPoolError> {
        if let Some(frame_id) = state.free_list.pop_front() {
            return Ok(frame_id);
        }

        let frame_id = match self.replacer.victim() {
            Some(id) => id,
            None => return Err(BufferPoolError::NoFreeFrames),
        };

        let frame = &mut state.frames[frame_id as usize];
        let evicted_page_id;
        {
            let page = frame.page.read();
            evicted_page_id = page.page_id;
            if frame.is_dirty {
                debug!("evicting dirty page {} from frame {}", evicted_page_id, frame_id);
                if let Err(e) = self.disk_manager.write_page(evicted_page_id, &page.data) {
                    // Keep the old binding; the frame goes back to being
                    // evictable in last place.
                    drop(page);
                    self.replacer.unpin(frame_id);
                    return Err(e.into());
                }
            }
        }
        frame.is_dirty = false;
        state.page_table.remove(&evicted_page_id);

        Ok(frame_id)
    }
}

impl BufferPool for BufferPoolInstance {
    fn fetch_page(&self, page_id: PageId) -> Result<PagePtr, BufferPoolError> {
        Self::fetch_page(self, page_id)
    }

    fn new_page(&self) -> Result<(PagePtr, PageId), BufferPoolError> {
        Self::new_page(self)
    }

    fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        Self::unpin_page(self, page_id, is_dirty)
    }

    fn flush_page(&self, page_id: PageId) -> Result<bool, BufferPoolError> {
        Self::flush_page(self, page_id)
    }

    fn flush_all_pages(&self) -> Result<(), BufferPoolError> {
        Self::flush_all_pages(self)
    }

    fn delete_page(&self, page_id: PageId) -> Result<bool, BufferPoolError> {
        Self::delete_page(self, page_id)
    }

    fn pool_size(&self) -> usize {
        Self::pool_size(self)
    }
}
