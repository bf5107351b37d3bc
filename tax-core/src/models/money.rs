//! Serde adapter storing a [`Decimal`] money amount as a JSON number.
//!
//! Documents written by earlier tooling hold salaries as floating point
//! numbers, so amounts are written the same way and normalised back to
//! cent precision on read. Strings are accepted on read as well.
//!
//! ```
//! use rust_decimal::Decimal;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Payslip {
//!     #[serde(with = "tax_core::models::money")]
//!     gross: Decimal,
//! }
//!
//! let slip: Payslip = serde_json::from_str(r#"{"gross": 1234.5}"#).unwrap();
//! assert_eq!(slip.gross.to_string(), "1234.50");
//! assert_eq!(serde_json::to_string(&slip).unwrap(), r#"{"gross":1234.5}"#);
//! ```

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serializer, ser::Error as _};

use crate::calculations::common::round_half_up;

pub fn serialize<S>(
    value: &Decimal,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let number = value
        .to_f64()
        .ok_or_else(|| S::Error::custom(format!("{value} cannot be stored as a number")))?;
    serializer.serialize_f64(number)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = <Decimal as Deserialize>::deserialize(deserializer)?;
    Ok(round_half_up(value))
}
