//! # Lifecycle State Machine
//!
//! ```text
//!   Uninitialized ──initialize──> Initialized ──destroy──> Destroyed
//!                                      ^                        │
//!                                      └───────initialize───────┘
//! ```
//!
//! Misuse (double initialize, use before initialize, use after destroy,
//! dropping a never-initialized entity) is a programming error. It is
//! reported through [`contract_violation`], which writes a diagnostic naming
//! the operation and aborts the whole process, whatever the panic strategy
//! of the final binary.

/// Lifecycle state of an entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Created but not yet initialized.
    #[default]
    Uninitialized,
    /// Usable.
    Initialized,
    /// Torn down; may be initialized again.
    Destroyed,
}

impl LifecycleState {
    /// Lower-case name used in diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initialized => "initialized",
            Self::Destroyed => "destroyed",
        }
    }
}

/// Aborts the process on a lifecycle contract violation.
///
/// Emits an error event, writes
/// `"<type> lifecycle error: <operation>: <reason>"` to stderr, then calls
/// [`std::process::abort`]. No unwinding takes place, so other threads
/// sharing the entity never observe it after the violation.
#[cold]
pub fn contract_violation(type_name: &str, operation: &str, reason: &str) -> ! {
    tracing::error!(entity = type_name, operation, reason, "lifecycle contract violated");
    eprintln!("{type_name} lifecycle error: {operation}: {reason}");
    std::process::abort()
}

/// Lifecycle tracker embedded in every lockable entity.
#[derive(Debug)]
pub struct Lifecycle {
    state: LifecycleState,
    type_name: &'static str,
}

impl Lifecycle {
    /// Creates an `Uninitialized` tracker for an entity of `type_name`.
    #[must_use]
    pub const fn new(type_name: &'static str) -> Self {
        Self {
            state: LifecycleState::Uninitialized,
            type_name,
        }
    }

    /// Current state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    /// Type name used in diagnostics.
    #[inline]
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// True when the entity is usable.
    #[inline]
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        matches!(self.state, LifecycleState::Initialized)
    }

    /// Aborts unless the entity is `Initialized`.
    #[inline]
    pub fn require_initialized(&self, operation: &str) {
        if !self.is_initialized() {
            self.violate(operation, "called while object is not initialized");
        }
    }

    /// Aborts unless a copy/move source is `Initialized`.
    #[inline]
    pub fn require_source_initialized(&self, operation: &str) {
        if !self.is_initialized() {
            self.violate(operation, "source object is not initialized");
        }
    }

    /// Aborts if the entity is already `Initialized`.
    #[inline]
    pub fn require_not_initialized(&self, operation: &str) {
        if self.is_initialized() {
            self.violate(operation, "called while object is already initialized");
        }
    }

    /// Transition to `Initialized`.
    pub fn mark_initialized(&mut self, operation: &str) {
        self.require_not_initialized(operation);
        tracing::debug!(entity = self.type_name, from = self.state.as_str(), "initialized");
        self.state = LifecycleState::Initialized;
    }

    /// Transition to `Destroyed`.
    pub fn mark_destroyed(&mut self, operation: &str) {
        self.require_initialized(operation);
        tracing::debug!(entity = self.type_name, "destroyed");
        self.state = LifecycleState::Destroyed;
    }

    /// Aborts with a diagnostic naming this entity's type and `operation`.
    #[cold]
    pub fn violate(&self, operation: &str, reason: &str) -> ! {
        contract_violation(self.type_name, operation, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_cycle() {
        let mut lifecycle = Lifecycle::new("Gauge");
        assert_eq!(lifecycle.state(), LifecycleState::Uninitialized);

        lifecycle.mark_initialized("initialize");
        assert!(lifecycle.is_initialized());

        lifecycle.mark_destroyed("destroy");
        assert_eq!(lifecycle.state(), LifecycleState::Destroyed);

        // Re-initialize after destroy is legal
        lifecycle.mark_initialized("initialize");
        assert!(lifecycle.is_initialized());
    }

    #[test]
    fn test_state_names() {
        assert_eq!(LifecycleState::default(), LifecycleState::Uninitialized);
        assert_eq!(LifecycleState::Initialized.as_str(), "initialized");
        assert_eq!(LifecycleState::Destroyed.as_str(), "destroyed");
        assert_eq!(Lifecycle::new("Gauge").type_name(), "Gauge");
    }
}
