use std::sync::Arc;
use tempfile::NamedTempFile;
use anyhow::Result;

use tarimdb::storage::buffer::{BufferPoolInstance, ParallelBufferPoolManager};
use tarimdb::storage::disk::DiskManager;

// Create a temporary database file for testing
#[allow(dead_code)]
pub fn create_temp_db_file() -> Result<(NamedTempFile, String)> {
    let file = NamedTempFile::new()?;
    let path = file.path().to_str().unwrap().to_string();
    Ok((file, path))
}

// Create a standalone buffer pool instance backed by a temporary database
#[allow(dead_code)]
pub fn create_test_buffer_pool(pool_size: usize) -> Result<(Arc<BufferPoolInstance>, NamedTempFile)> {
    let (file, path) = create_temp_db_file()?;
    let disk_manager = Arc::new(DiskManager::new(path)?);
    let buffer_pool = Arc::new(BufferPoolInstance::new(pool_size, disk_manager));
    Ok((buffer_pool, file))
}

// Create a sharded buffer pool backed by a temporary database
#[allow(dead_code)]
pub fn create_test_parallel_pool(
    num_instances: usize,
    pool_size: usize,
) -> Result<(Arc<ParallelBufferPoolManager>, NamedTempFile)> {
    let (file, path) = create_temp_db_file()?;
    let disk_manager = Arc::new(DiskManager::new(path)?);
    let pool = Arc::new(ParallelBufferPoolManager::new(
        num_instances,
        pool_size,
        disk_manager,
        None,
    ));
    Ok((pool, file))
}
