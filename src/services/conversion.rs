//! Currency conversion through the reference unit.
//!
//! Every exchange rate states how much of a currency one reference unit
//! buys, so converting means dividing out the source rate and multiplying
//! in the target rate. Pure arithmetic, no storage access.

use rust_decimal::{Decimal, RoundingStrategy};

/// Fractional digits kept on money amounts.
const MONEY_SCALE: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// A rate was zero or negative; conversion through it is undefined
    InvalidRate(String),
}

impl std::fmt::Display for ConversionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConversionError::InvalidRate(msg) => write!(f, "Invalid exchange rate: {}", msg),
        }
    }
}

impl std::error::Error for ConversionError {}

/// Round an amount to currency precision, midpoints going away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert `amount` from a currency with rate `from_rate` into one with
/// rate `to_rate`, both quoted against the reference unit. The result is
/// rounded to currency precision; equal rates return the amount unchanged
/// apart from that rounding.
pub fn convert(
    amount: Decimal,
    from_rate: Decimal,
    to_rate: Decimal,
) -> Result<Decimal, ConversionError> {
    if from_rate <= Decimal::ZERO {
        return Err(ConversionError::InvalidRate(format!(
            "source rate must be positive, got {}",
            from_rate
        )));
    }
    if to_rate <= Decimal::ZERO {
        return Err(ConversionError::InvalidRate(format!(
            "target rate must be positive, got {}",
            to_rate
        )));
    }

    let in_reference = amount / from_rate;
    Ok(round_money(in_reference * to_rate))
}
