//! Pool errors

use thiserror::Error;

/// Errors raised by pool configuration and index validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Configuration error: buffer pool already allocated")]
    AlreadyAllocated,

    #[error("Configuration error: buffer pool capacity must be at least 1")]
    ZeroCapacity,

    #[error("Buffer pool has not been allocated")]
    NotAllocated,

    #[error("Buffer index {index} out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Pool result
pub type PoolResult<T> = Result<T, PoolError>;
