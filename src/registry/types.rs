//! Registry result and error types

use std::collections::TryReserveError;
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::numeric::Numeric;

/// Highest number of arguments a dispatched function can take
pub const MAX_ARITY: usize = 4;

/// Failures of [`Registry::open`](super::Registry::open).
///
/// After any of these the registry is closed, and every call reports
/// [`Status::NotOpen`].
#[derive(Debug, Error)]
pub enum OpenError {
    #[error("capacity must be at least 1, got {0}")]
    CapacityInvalid(usize),

    #[error("failed to load library '{}': {}", .path.display(), .reason)]
    LibraryLoadFailed { path: PathBuf, reason: String },

    #[error("failed to allocate function tables for {capacity} entries: {source}")]
    AllocationFailed {
        capacity: usize,
        #[source]
        source: TryReserveError,
    },
}

/// Outcome code of a dispatched call.
///
/// The discriminants are stable and can be handed across a C boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Status {
    Success = 0,
    NotOpen = 1,
    CacheFull = 2,
    SymbolNotFound = 3,
}

impl Status {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == Status::Success
    }

    /// The error this status stands for, `None` on success
    pub fn error(self) -> Option<CallError> {
        match self {
            Status::Success => None,
            Status::NotOpen => Some(CallError::NotOpen),
            Status::CacheFull => Some(CallError::CacheFull),
            Status::SymbolNotFound => Some(CallError::SymbolNotFound),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Success => write!(f, "success"),
            Status::NotOpen => write!(f, "library not open"),
            Status::CacheFull => write!(f, "function table full"),
            Status::SymbolNotFound => write!(f, "function not found"),
        }
    }
}

/// A failed dispatch, as a `Result` error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("library not open")]
    NotOpen,
    #[error("function table full")]
    CacheFull,
    #[error("function not found")]
    SymbolNotFound,
}

impl From<CallError> for Status {
    fn from(err: CallError) -> Self {
        match err {
            CallError::NotOpen => Status::NotOpen,
            CallError::CacheFull => Status::CacheFull,
            CallError::SymbolNotFound => Status::SymbolNotFound,
        }
    }
}

/// Value and status of one dispatched call.
///
/// `value` is zero whenever `status` is not [`Status::Success`] and carries
/// no meaning in that case.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome<T> {
    pub value: T,
    pub status: Status,
}

impl<T: Numeric> Outcome<T> {
    pub fn success(value: T) -> Self {
        Self {
            value,
            status: Status::Success,
        }
    }

    pub fn failure(err: CallError) -> Self {
        Self {
            value: T::zero(),
            status: err.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn into_result(self) -> Result<T, CallError> {
        match self.status.error() {
            None => Ok(self.value),
            Some(err) => Err(err),
        }
    }
}
