use thiserror::Error;
use crate::storage::disk::DiskManagerError;

#[derive(Error, Debug)]
pub enum BufferPoolError {
    #[error("No free frames available")]
    NoFreeFrames,

    #[error("Disk manager error: {0}")]
    DiskManagerError(#[from] DiskManagerError),
}
