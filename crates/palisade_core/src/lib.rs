//! # PALISADE Core
//!
//! The entity discipline shared by every mutable, potentially shared value
//! in PALISADE (geometry shapes, RPG entities, containers):
//!
//! 1. **Lifecycle** - `Uninitialized -> Initialized -> Destroyed`, with
//!    misuse treated as a fatal contract violation
//! 2. **Guard** - an optional, lazily attached reentrant exclusion lock
//! 3. **Pair locking** - two entities are always acquired in identity order,
//!    with a release-and-retry loop on contention
//! 4. **Outcome channel** - explicit `Result`s, mirrored into a per-entity
//!    slot and a thread-local last-error slot
//!
//! ## Example
//!
//! ```rust,ignore
//! use palisade_core::{lock_pair, Lockable};
//!
//! let mut left: Lockable<u32> = Lockable::new();
//! let mut right: Lockable<u32> = Lockable::new();
//! left.initialize_with(3)?;
//! right.initialize_with(4)?;
//! left.enable_thread_safety()?;
//!
//! let pair = lock_pair(&left, &right)?;
//! // ... touch both entities ...
//! drop(pair);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod channel;
pub mod config;
pub mod contention;
pub mod entity;
pub mod error;
pub mod guard;
pub mod identity;
pub mod lifecycle;
pub mod multi;
pub mod pair;

pub use channel::{last_error, last_error_str};
pub use config::{ConfigError, LockPolicy};
pub use contention::ContentionStats;
pub use entity::{Entity, Guardable, Lockable};
pub use error::{AsErrorCode, EntityError, EntityResult, ErrorCode};
pub use guard::{Guard, GuardLock};
pub use identity::{EntityId, Identity};
pub use lifecycle::{Lifecycle, LifecycleState};
pub use multi::{lock_many, lock_many_with, MultiGuard};
pub use pair::{
    lock_pair, lock_pair_with, read_pair, unlock_pair, update_pair, PairGuard, PairState,
    SlotStatus,
};
