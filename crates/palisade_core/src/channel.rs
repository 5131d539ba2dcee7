//! # Outcome Channel
//!
//! Explicit `Result` returns are the primary way an operation reports its
//! outcome. Every entity operation additionally mirrors that outcome into:
//!
//! - a thread-local "last error" slot, readable by the immediate caller
//! - the entity's own slot, readable later through `get_error()`

use std::cell::Cell;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::error::{AsErrorCode, ErrorCode};

thread_local! {
    static LAST_ERROR: Cell<ErrorCode> = const { Cell::new(ErrorCode::Success) };
}

/// Stores `code` in this thread's last-error slot.
#[inline]
pub fn record(code: ErrorCode) {
    LAST_ERROR.with(|slot| slot.set(code));
}

/// Stores the outcome of `result` in this thread's last-error slot.
pub fn record_result<T, E: AsErrorCode>(result: &Result<T, E>) -> ErrorCode {
    let code = ErrorCode::of(result);
    record(code);
    code
}

/// This thread's most recent outcome.
#[inline]
#[must_use]
pub fn last_error() -> ErrorCode {
    LAST_ERROR.with(Cell::get)
}

/// Description of this thread's most recent outcome.
#[must_use]
pub fn last_error_str() -> &'static str {
    last_error().as_str()
}

/// Per-entity last-outcome slot.
///
/// Written from `&self` accessors, so it is an atomic rather than a plain
/// field.
#[derive(Debug, Default)]
pub struct ErrorSlot(AtomicU8);

impl ErrorSlot {
    /// Creates a slot holding `Success`.
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicU8::new(0))
    }

    /// Stores `code` here and in the thread-local slot.
    #[inline]
    pub fn store(&self, code: ErrorCode) {
        self.0.store(code.raw(), Ordering::Release);
        record(code);
    }

    /// Loads the stored code.
    #[inline]
    #[must_use]
    pub fn load(&self) -> ErrorCode {
        ErrorCode::from_raw(self.0.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EntityError, EntityResult};

    #[test]
    fn test_record_is_thread_local() {
        record(ErrorCode::NoMemory);
        assert_eq!(last_error(), ErrorCode::NoMemory);

        let seen_elsewhere = std::thread::spawn(last_error).join().unwrap();
        assert_eq!(seen_elsewhere, ErrorCode::Success);

        record(ErrorCode::Success);
        assert_eq!(last_error_str(), "success");
    }

    #[test]
    fn test_slot_mirrors_into_channel() {
        let slot = ErrorSlot::new();
        assert_eq!(slot.load(), ErrorCode::Success);

        slot.store(ErrorCode::InvalidArgument);
        assert_eq!(slot.load(), ErrorCode::InvalidArgument);
        assert_eq!(last_error(), ErrorCode::InvalidArgument);
    }

    #[test]
    fn test_record_result() {
        let failed: EntityResult<()> = Err(EntityError::InvalidState);
        assert_eq!(record_result(&failed), ErrorCode::InvalidState);
        assert_eq!(last_error(), ErrorCode::InvalidState);
    }
}
