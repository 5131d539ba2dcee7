//! # Currency Rates
//!
//! Each currency knows its rate to a shared base currency. Conversion
//! between two currencies reads both rates under the ordered pair lock.
//!
//! Rate tables are loaded from TOML:
//!
//! ```toml
//! [[rate]]
//! currency_id = 1
//! rate_to_base = 1.0
//! display_precision = 2
//!
//! [[rate]]
//! currency_id = 2
//! rate_to_base = 0.25
//! display_precision = 0
//! ```

use palisade_core::lifecycle::contract_violation;
use palisade_core::{read_pair, Entity, ErrorCode, Guardable, LifecycleState, Lockable};
use serde::{Deserialize, Serialize};

use crate::error::{GameError, GameResult};

/// One currency's exchange data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RateValues {
    /// Currency identifier
    pub currency_id: u32,
    /// Value of one unit in base currency
    pub rate_to_base: f64,
    /// Decimal places shown and kept after conversion
    pub display_precision: u32,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RateTable {
    #[serde(default)]
    rate: Vec<RateValues>,
}

/// Parses a rate table.
///
/// # Errors
///
/// Returns [`GameError::InvalidConfig`] for malformed TOML and
/// [`GameError::InvalidRate`] for a non-positive or non-finite rate.
pub fn load_rates(text: &str) -> GameResult<Vec<RateValues>> {
    let table: RateTable =
        toml::from_str(text).map_err(|e| GameError::InvalidConfig(e.to_string()))?;
    for values in &table.rate {
        check_rate(values.rate_to_base)?;
    }
    Ok(table.rate)
}

fn check_rate(rate_to_base: f64) -> GameResult<()> {
    if rate_to_base.is_finite() && rate_to_base > 0.0 {
        Ok(())
    } else {
        Err(GameError::InvalidRate(rate_to_base))
    }
}

/// Lockable currency rate.
#[derive(Debug)]
pub struct CurrencyRate {
    inner: Lockable<RateValues>,
}

impl CurrencyRate {
    /// Creates an uninitialized rate.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Lockable::named("CurrencyRate"),
        }
    }

    /// Initializes from explicit values.
    ///
    /// Aborts if already initialized.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidRate`] for a non-positive or non-finite rate; the
    /// entity then stays uninitialized.
    pub fn initialize_rate(&mut self, values: RateValues) -> GameResult<()> {
        if self.inner.state() == LifecycleState::Initialized {
            contract_violation(
                "CurrencyRate",
                "initialize_rate",
                "called while object is already initialized",
            );
        }
        if let Err(error) = check_rate(values.rate_to_base) {
            self.record_outcome(ErrorCode::InvalidArgument);
            return Err(error);
        }
        Ok(self.inner.initialize_with(values)?)
    }

    /// Currency identifier.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn currency_id(&self) -> GameResult<u32> {
        Ok(self.inner.read("currency_id", |r| r.currency_id)?)
    }

    /// Changes the currency identifier.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn set_currency_id(&self, currency_id: u32) -> GameResult<()> {
        Ok(self.inner.update("set_currency_id", |r| r.currency_id = currency_id)?)
    }

    /// Value of one unit in base currency.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn rate_to_base(&self) -> GameResult<f64> {
        Ok(self.inner.read("rate_to_base", |r| r.rate_to_base)?)
    }

    /// Changes the rate to base.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidRate`] for a non-positive or non-finite rate, or
    /// the guard error.
    pub fn set_rate_to_base(&self, rate_to_base: f64) -> GameResult<()> {
        self.inner.try_update("set_rate_to_base", |r| {
            check_rate(rate_to_base)?;
            r.rate_to_base = rate_to_base;
            Ok(())
        })
    }

    /// Decimal places kept after conversion.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn display_precision(&self) -> GameResult<u32> {
        Ok(self.inner.read("display_precision", |r| r.display_precision)?)
    }

    /// Changes the display precision.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn set_display_precision(&self, display_precision: u32) -> GameResult<()> {
        Ok(self
            .inner
            .update("set_display_precision", |r| r.display_precision = display_precision)?)
    }

    /// All exchange data.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn values(&self) -> GameResult<RateValues> {
        Ok(self.inner.snapshot("values")?)
    }
}

impl Default for CurrencyRate {
    fn default() -> Self {
        Self::new()
    }
}

impl Entity for CurrencyRate {
    type Payload = RateValues;

    fn lockable(&self) -> &Lockable<RateValues> {
        &self.inner
    }

    fn lockable_mut(&mut self) -> &mut Lockable<RateValues> {
        &mut self.inner
    }
}

fn round_to(value: f64, precision: u32) -> f64 {
    let scale = 10f64.powi(i32::try_from(precision.min(15)).unwrap_or(15));
    (value * scale).round() / scale
}

/// Converts `amount` of `from`'s currency into `to`'s currency, rounded to
/// `to`'s display precision. `from` and `to` may be the same entity.
///
/// The outcome is recorded on both entities.
///
/// # Errors
///
/// [`GameError::InvalidRate`] if either side holds a zero rate (only
/// possible for a default-initialized entity), or the pair acquisition
/// error.
pub fn convert_amount(from: &CurrencyRate, to: &CurrencyRate, amount: f64) -> GameResult<f64> {
    let result = read_pair(&from.inner, &to.inner, "convert_amount", |a, b| (*a, *b))
        .map_err(GameError::from)
        .and_then(|(source, target)| {
            check_rate(source.rate_to_base)?;
            check_rate(target.rate_to_base)?;
            let base = amount * source.rate_to_base;
            Ok(round_to(base / target.rate_to_base, target.display_precision))
        });
    let code = ErrorCode::of(&result);
    to.record_outcome(code);
    from.record_outcome(code);
    result
}
