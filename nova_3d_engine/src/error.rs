//! Error types for the Nova3D engine
//!
//! This module defines the error types used throughout the engine, covering
//! resource allocation, lock contract violations, and backend failures.
//!
//! Allocation and argument errors are surfaced synchronously to the caller,
//! which decides whether to retry with a smaller request or abort the load.
//! Lock contract violations (LockConflict, NoOpenLock, InvalidLockMode)
//! indicate a bug in the calling render code; they are reported as errors
//! and never silently recovered.

use std::fmt;

/// Result type for Nova3D engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Nova3D engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend cannot provide the requested GPU or host memory
    ResourceAllocation(String),

    /// Malformed creation or lock parameters (zero-length data, out-of-range lock, etc.)
    InvalidArgument(String),

    /// NoOverwrite or Discard lock requested on a buffer without dynamic usage
    InvalidLockMode(String),

    /// Lock attempted while a previous lock on the same buffer is still open
    LockConflict(String),

    /// Unlock without a matching open lock
    NoOpenLock(String),

    /// Operation on a released or unknown resource
    InvalidResource(String),

    /// Backend-specific error (driver failure, lost device, etc.)
    BackendError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ResourceAllocation(msg) => write!(f, "Resource allocation failed: {}", msg),
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::InvalidLockMode(msg) => write!(f, "Invalid lock mode: {}", msg),
            Error::LockConflict(msg) => write!(f, "Lock conflict: {}", msg),
            Error::NoOpenLock(msg) => write!(f, "No open lock: {}", msg),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
