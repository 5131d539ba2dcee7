//! # Game Error Types
//!
//! Domain rule failures, layered on top of the entity errors.

use palisade_core::{AsErrorCode, EntityError, ErrorCode};
use thiserror::Error;

/// Errors raised by the game collaborators.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GameError {
    /// Guard, lifecycle or argument failure from the entity layer.
    #[error(transparent)]
    Entity(#[from] EntityError),

    /// Item id 0 is reserved for empty slots.
    #[error("invalid item id: {0}")]
    InvalidItem(u32),

    /// Not enough free space for the whole amount.
    #[error("inventory full: capacity {capacity}, tried to add {amount}")]
    InventoryFull {
        /// Slot count of the inventory.
        capacity: u32,
        /// Amount that did not fit.
        amount: u32,
    },

    /// Not enough items to remove.
    #[error("insufficient items: need {required} of item {item_id}, have {available}")]
    InsufficientItems {
        /// The item that was short.
        item_id: u32,
        /// The amount required.
        required: u32,
        /// The amount available.
        available: u32,
    },

    /// Not enough current reputation to give away.
    #[error("insufficient reputation: need {required}, have {available}")]
    InsufficientReputation {
        /// The amount required.
        required: i64,
        /// The amount available.
        available: i64,
    },

    /// Exchange rates must be finite and positive.
    #[error("invalid rate to base: {0}")]
    InvalidRate(f64),

    /// Arithmetic overflow in a balance update.
    #[error("arithmetic overflow in reputation update")]
    Overflow,

    /// Invalid rate table file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for game operations.
pub type GameResult<T> = Result<T, GameError>;

impl AsErrorCode for GameError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::Entity(error) => error.error_code(),
            Self::InvalidItem(_) | Self::InvalidRate(_) => ErrorCode::InvalidArgument,
            _ => ErrorCode::Domain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(GameError::from(EntityError::NoMemory).error_code(), ErrorCode::NoMemory);
        assert_eq!(GameError::InvalidItem(0).error_code(), ErrorCode::InvalidArgument);
        assert_eq!(
            GameError::InventoryFull { capacity: 4, amount: 9 }.error_code(),
            ErrorCode::Domain
        );
    }

    #[test]
    fn test_entity_error_is_transparent() {
        let error = GameError::from(EntityError::InvalidArgument);
        assert_eq!(error.to_string(), "invalid argument");
    }
}
