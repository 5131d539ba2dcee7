//! # Entity Error Types
//!
//! Every outcome an entity operation can produce, plus the compact
//! [`ErrorCode`] form stored in the last-error slots.

use thiserror::Error;

/// Errors that can occur while operating on a lockable entity.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityError {
    /// The guard is held by another thread.
    ///
    /// This is the contention signal of the pairwise acquisition loop; it is
    /// recovered internally and never returned by `lock_pair`/`lock_many`.
    #[error("guard is already locked by a concurrent attempt")]
    AlreadyLocked,

    /// A guard could not be allocated.
    #[error("out of memory while allocating a guard")]
    NoMemory,

    /// The entity is not in a lifecycle state that allows the operation.
    #[error("entity is in an invalid lifecycle state")]
    InvalidState,

    /// A domain-level argument was rejected.
    #[error("invalid argument")]
    InvalidArgument,

    /// Acquisition gave up under a bounded lock policy.
    #[error("lock acquisition gave up after {attempts} attempts")]
    Timeout {
        /// Number of acquisition attempts made before giving up.
        attempts: u32,
    },
}

/// Result type for entity operations.
pub type EntityResult<T> = Result<T, EntityError>;

/// Compact outcome code, as stored in the per-entity and thread-local slots.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The operation succeeded.
    #[default]
    Success = 0,
    /// See [`EntityError::AlreadyLocked`].
    AlreadyLocked = 1,
    /// See [`EntityError::NoMemory`].
    NoMemory = 2,
    /// See [`EntityError::InvalidState`].
    InvalidState = 3,
    /// See [`EntityError::InvalidArgument`].
    InvalidArgument = 4,
    /// See [`EntityError::Timeout`].
    Timeout = 5,
    /// A collaborator's domain rule rejected the operation.
    Domain = 6,
}

impl ErrorCode {
    /// Returns true for [`ErrorCode::Success`].
    #[inline]
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// Human-readable description of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::AlreadyLocked => "guard is already locked by a concurrent attempt",
            Self::NoMemory => "out of memory while allocating a guard",
            Self::InvalidState => "entity is in an invalid lifecycle state",
            Self::InvalidArgument => "invalid argument",
            Self::Timeout => "lock acquisition gave up",
            Self::Domain => "domain rule rejected the operation",
        }
    }

    /// Raw code value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u8 {
        self as u8
    }

    /// Decodes a raw code. Unknown values decode as `Domain`.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Success,
            1 => Self::AlreadyLocked,
            2 => Self::NoMemory,
            3 => Self::InvalidState,
            4 => Self::InvalidArgument,
            5 => Self::Timeout,
            _ => Self::Domain,
        }
    }

    /// Code for the outcome of `result`.
    pub fn of<T, E: AsErrorCode>(result: &Result<T, E>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(error) => error.error_code(),
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps an error onto the shared outcome code.
///
/// Collaborator crates implement this for their own error enums so domain
/// failures land in the same last-error slots as guard failures.
pub trait AsErrorCode {
    /// The outcome code for this error.
    fn error_code(&self) -> ErrorCode;
}

impl AsErrorCode for EntityError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::AlreadyLocked => ErrorCode::AlreadyLocked,
            Self::NoMemory => ErrorCode::NoMemory,
            Self::InvalidState => ErrorCode::InvalidState,
            Self::InvalidArgument => ErrorCode::InvalidArgument,
            Self::Timeout { .. } => ErrorCode::Timeout,
        }
    }
}

impl From<EntityError> for ErrorCode {
    fn from(error: EntityError) -> Self {
        error.error_code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_codes_round_trip() {
        for code in [
            ErrorCode::Success,
            ErrorCode::AlreadyLocked,
            ErrorCode::NoMemory,
            ErrorCode::InvalidState,
            ErrorCode::InvalidArgument,
            ErrorCode::Timeout,
            ErrorCode::Domain,
        ] {
            assert_eq!(ErrorCode::from_raw(code.raw()), code);
        }
        assert_eq!(ErrorCode::from_raw(200), ErrorCode::Domain);
    }

    #[test]
    fn test_code_of_result() {
        let ok: EntityResult<u8> = Ok(1);
        let timeout: EntityResult<u8> = Err(EntityError::Timeout { attempts: 3 });
        assert_eq!(ErrorCode::of(&ok), ErrorCode::Success);
        assert_eq!(ErrorCode::of(&timeout), ErrorCode::Timeout);
    }

    #[test]
    fn test_display_matches_as_str() {
        assert_eq!(ErrorCode::NoMemory.to_string(), ErrorCode::NoMemory.as_str());
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::InvalidArgument.is_success());
    }
}
