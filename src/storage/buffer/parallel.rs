use std::sync::Arc;
use parking_lot::Mutex;

use crate::common::types::{PageId, PagePtr};
use crate::storage::buffer::error::BufferPoolError;
use crate::storage::buffer::instance::BufferPoolInstance;
use crate::storage::buffer::BufferPool;
use crate::storage::disk::DiskManager;
use crate::storage::wal::LogManager;

/// Several buffer pool instances unioned into one logical pool.
///
/// Page ids are routed to the instance at `page_id mod num_instances`, which
/// matches how the instances allocate ids, so every operation on a given
/// page lands on the shard that owns it. Instances latch independently;
/// the only shared state is the rotation cursor for `new_page`.
pub struct ParallelBufferPoolManager {
    instances: Vec<BufferPoolInstance>,
    start_index: Mutex<usize>,
}

impl ParallelBufferPoolManager {
    pub fn new(
        num_instances: usize,
        pool_size: usize,
        disk_manager: Arc<DiskManager>,
        log_manager: Option<Arc<LogManager>>,
    ) -> Self {
        assert!(num_instances > 0, "a pool needs at least one instance");

        let instances = (0..num_instances)
            .map(|instance_index| {
                BufferPoolInstance::with_sharding(
                    pool_size,
                    num_instances as u32,
                    instance_index as u32,
                    disk_manager.clone(),
                    log_manager.clone(),
                )
            })
            .collect();

        Self {
            instances,
            start_index: Mutex::new(0),
        }
    }

    /// The instance responsible for the given page id
    fn instance_for(&self, page_id: PageId) -> &BufferPoolInstance {
        let index = page_id.rem_euclid(self.instances.len() as PageId) as usize;
        &self.instances[index]
    }

    pub fn fetch_page(&self, page_id: PageId) -> Result<PagePtr, BufferPoolError> {
        self.instance_for(page_id).fetch_page(page_id)
    }

    /// Create a new page on the first instance with room, scanning
    /// round-robin from a rotating start position.
    pub fn new_page(&self) -> Result<(PagePtr, PageId), BufferPoolError> {
        let mut start_index = self.start_index.lock();
        let num_instances = self.instances.len();

        let mut result = Err(BufferPoolError::NoFreeFrames);
        for offset in 0..num_instances {
            let index = (*start_index + offset) % num_instances;
            match self.instances[index].new_page() {
                // A full instance just means the scan moves on.
                Err(BufferPoolError::NoFreeFrames) => continue,
                other => {
                    result = other;
                    break;
                }
            }
        }

        // The cursor rotates for fairness across instances, so it advances
        // by one whether or not the scan found room.
        *start_index = (*start_index + 1) % num_instances;
        result
    }

    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        self.instance_for(page_id).unpin_page(page_id, is_dirty)
    }

    pub fn flush_page(&self, page_id: PageId) -> Result<bool, BufferPoolError> {
        self.instance_for(page_id).flush_page(page_id)
    }

    pub fn flush_all_pages(&self) -> Result<(), BufferPoolError> {
        for instance in &self.instances {
            instance.flush_all_pages()?;
        }
        Ok(())
    }

    pub fn delete_page(&self, page_id: PageId) -> Result<bool, BufferPoolError> {
        self.instance_for(page_id).delete_page(page_id)
    }

    /// Total number of frames across all instances
    pub fn pool_size(&self) -> usize {
        self.instances.len() * self.instances[0].pool_size()
    }

    /// Number of instances the pool is sharded across
    pub fn num_instances(&self) -> usize {
        self.instances.len()
    }
}

impl BufferPool for ParallelBufferPoolManager {
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
