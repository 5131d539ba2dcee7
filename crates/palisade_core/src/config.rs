//! # Lock Policy Configuration
//!
//! Tunables for guard and pair acquisition, loaded from TOML once at
//! startup and installed process-wide.
//!
//! ```toml
//! # Fixed pause between pairwise retries.
//! backoff_ms = 1
//! # Upper bound for a single blocking guard acquisition (omit = unbounded).
//! lock_timeout_ms = 250
//! # Give up a pairwise acquisition after this many attempts (omit = unbounded).
//! max_pair_attempts = 10000
//! ```
//!
//! The defaults keep the classic behaviour: unbounded waits, 1 ms backoff.

use std::path::Path;
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading a lock policy.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The policy file could not be read.
    #[error("failed to read lock policy: {0}")]
    Io(#[from] std::io::Error),

    /// The policy file is not valid TOML for a [`LockPolicy`].
    #[error("failed to parse lock policy: {0}")]
    Parse(#[from] toml::de::Error),

    /// The policy parsed but holds an unusable value.
    #[error("invalid lock policy: {0}")]
    Invalid(String),
}

/// Acquisition tunables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LockPolicy {
    /// Pause between pairwise retries after contention (milliseconds).
    pub backoff_ms: u64,
    /// Bound for one blocking guard acquisition (milliseconds).
    pub lock_timeout_ms: Option<u64>,
    /// Bound for the number of pairwise/N-way acquisition attempts.
    pub max_pair_attempts: Option<u32>,
}

impl LockPolicy {
    /// The default policy: 1 ms backoff, no timeouts.
    pub const DEFAULT: Self = Self {
        backoff_ms: 1,
        lock_timeout_ms: None,
        max_pair_attempts: None,
    };

    /// Parses a policy from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys and
    /// [`ConfigError::Invalid`] for unusable values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let policy: Self = toml::from_str(text)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Loads a policy from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`LockPolicy::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Serializes the policy back to TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Checks the values are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero attempt bound or a zero
    /// timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_pair_attempts == Some(0) {
            return Err(ConfigError::Invalid(
                "max_pair_attempts must be at least 1".to_string(),
            ));
        }
        if self.lock_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "lock_timeout_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Backoff as a duration.
    #[inline]
    #[must_use]
    pub const fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    /// Guard timeout as a duration.
    #[inline]
    #[must_use]
    pub fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

static ACTIVE_POLICY: RwLock<LockPolicy> = parking_lot::const_rwlock(LockPolicy::DEFAULT);

/// Installs `policy` as the process-wide policy.
pub fn install(policy: LockPolicy) {
    tracing::debug!(
        backoff_ms = policy.backoff_ms,
        lock_timeout_ms = ?policy.lock_timeout_ms,
        max_pair_attempts = ?policy.max_pair_attempts,
        "lock policy installed"
    );
    *ACTIVE_POLICY.write() = policy;
}

/// The process-wide policy.
#[inline]
#[must_use]
pub fn current() -> LockPolicy {
    *ACTIVE_POLICY.read()
}
