//! Money helpers shared by the tax calculation and the record models.
//!
//! All amounts handled by the system are euros with cent precision, so the
//! helpers here deal with rounding to, and checking for, two decimal places.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of fractional digits carried by every money amount.
pub const CENT_SCALE: u32 = 2;

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// Values at exactly half a cent are rounded away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(10049.995)), dec!(10050.00));
/// assert_eq!(round_half_up(dec!(0.335)), dec!(0.34));
/// assert_eq!(round_half_up(dec!(-0.335)), dec!(-0.34));
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(CENT_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(CENT_SCALE);
    rounded
}

/// Returns `true` when `value` has no digits below the cent.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::is_whole_cents;
///
/// assert!(is_whole_cents(dec!(30000)));
/// assert!(is_whole_cents(dec!(30000.10)));
/// assert!(!is_whole_cents(dec!(30000.105)));
/// ```
pub fn is_whole_cents(value: Decimal) -> bool {
    value.round_dp(CENT_SCALE) == value
}
