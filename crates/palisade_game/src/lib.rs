//! # PALISADE Game
//!
//! RPG collaborators built on the entity discipline of `palisade_core`.
//!
//! Single-entity state ([`Resistance`], [`CurrencyRate`], [`Reputation`],
//! [`Inventory`]) is guarded per entity. Rules that touch two entities
//! ([`convert_amount`], [`transfer_reputation`], [`transfer_item`]) take both
//! through the ordered pair lock and either complete or leave both unchanged.
//!
//! Rule failures are reported as [`GameError`], which wraps the entity-level
//! [`palisade_core::EntityError`] and maps onto the same error codes.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod currency;
pub mod error;
pub mod inventory;
pub mod reputation;
pub mod resistance;

pub use currency::{convert_amount, load_rates, CurrencyRate, RateValues};
pub use error::{GameError, GameResult};
pub use inventory::{transfer_item, Inventory, ItemId, ItemStack, Slots};
pub use reputation::{transfer_reputation, Reputation, Standing};
pub use resistance::{Resistance, ResistanceValues};
