//! Two-bracket income tax applied to an annual salary.
//!
//! GPM (personal income tax) is charged on the full income. Health tax is
//! then charged on a fixed share of the income (90% by default), as the
//! portion considered left after the GPM deduction.
//!
//! | Step | Value |
//! |------|-------|
//! | 1    | GPM tax: income × `gpm_tax_rate` |
//! | 2    | Health base: income × `health_taxable_share` |
//! | 3    | Health tax: step 2 × `health_tax_rate` |
//! | 4    | Tax paid: step 1 + step 3, rounded to cents |
//! | 5    | Take-home pay: income − step 4, rounded to cents |
//!
//! Intermediate steps keep full precision; only steps 4 and 5 are rounded.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::calculations::{IncomeTaxCalculator, IncomeTaxConfig};
//!
//! let calculator = IncomeTaxCalculator::new(IncomeTaxConfig::default());
//! let result = calculator.calculate(dec!(30000.00)).unwrap();
//!
//! assert_eq!(result.tax_paid, dec!(10050.00));
//! assert_eq!(result.take_home_pay, dec!(19950.00));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculations::common::round_half_up;

/// Errors that can occur while computing the income tax.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IncomeTaxError {
    #[error("GPM tax rate must be between 0 and 1, got {0}")]
    InvalidGpmRate(Decimal),

    #[error("health tax rate must be between 0 and 1, got {0}")]
    InvalidHealthRate(Decimal),

    #[error("health taxable share must be between 0 and 1, got {0}")]
    InvalidHealthTaxableShare(Decimal),

    #[error("income must be non-negative, got {0}")]
    NegativeIncome(Decimal),
}

/// Rates used by [`IncomeTaxCalculator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncomeTaxConfig {
    /// GPM rate applied to the full income. 20% by default.
    pub gpm_tax_rate: Decimal,

    /// Health tax rate applied to the health base. 15% by default.
    pub health_tax_rate: Decimal,

    /// Share of the income the health tax is charged on. 90% by default.
    pub health_taxable_share: Decimal,
}

impl Default for IncomeTaxConfig {
    fn default() -> Self {
        Self {
            gpm_tax_rate: Decimal::new(20, 2),
            health_tax_rate: Decimal::new(15, 2),
            health_taxable_share: Decimal::new(90, 2),
        }
    }
}

impl IncomeTaxConfig {
    /// Checks every rate lies in `[0, 1]`.
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use tax_core::calculations::{IncomeTaxConfig, IncomeTaxError};
    ///
    /// let config = IncomeTaxConfig {
    ///     gpm_tax_rate: dec!(1.2),
    ///     ..IncomeTaxConfig::default()
    /// };
    ///
    /// assert_eq!(config.validate(), Err(IncomeTaxError::InvalidGpmRate(dec!(1.2))));
    /// ```
    pub fn validate(&self) -> Result<(), IncomeTaxError> {
        if !is_fraction(self.gpm_tax_rate) {
            return Err(IncomeTaxError::InvalidGpmRate(self.gpm_tax_rate));
        }
        if !is_fraction(self.health_tax_rate) {
            return Err(IncomeTaxError::InvalidHealthRate(self.health_tax_rate));
        }
        if !is_fraction(self.health_taxable_share) {
            return Err(IncomeTaxError::InvalidHealthTaxableShare(
                self.health_taxable_share,
            ));
        }
        Ok(())
    }
}

fn is_fraction(value: Decimal) -> bool {
    value >= Decimal::ZERO && value <= Decimal::ONE
}

/// Outcome of [`IncomeTaxCalculator::calculate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeTaxResult {
    /// Income the tax was computed on.
    pub income: Decimal,

    /// GPM tax before rounding (step 1).
    pub gpm_tax: Decimal,

    /// Health tax before rounding (step 3).
    pub health_tax: Decimal,

    /// Total tax, rounded to cents (step 4).
    pub tax_paid: Decimal,

    /// Income left after tax, rounded to cents (step 5).
    pub take_home_pay: Decimal,
}

/// Computes GPM and health tax for an annual income.
#[derive(Debug, Clone, Default)]
pub struct IncomeTaxCalculator {
    config: IncomeTaxConfig,
}

impl IncomeTaxCalculator {
    pub fn new(config: IncomeTaxConfig) -> Self {
        Self { config }
    }

    /// Applies the tax steps to `income`.
    ///
    /// # Errors
    ///
    /// Returns [`IncomeTaxError`] when a configured rate is outside `[0, 1]`
    /// or `income` is negative.
    pub fn calculate(
        &self,
        income: Decimal,
    ) -> Result<IncomeTaxResult, IncomeTaxError> {
        self.config.validate()?;
        if income < Decimal::ZERO {
            return Err(IncomeTaxError::NegativeIncome(income));
        }

        let gpm_tax = income * self.config.gpm_tax_rate;
        let left_after_gpm = income * self.config.health_taxable_share;
        let health_tax = left_after_gpm * self.config.health_tax_rate;

        let tax_paid = round_half_up(gpm_tax + health_tax);
        let take_home_pay = round_half_up(income - tax_paid);

        Ok(IncomeTaxResult {
            income,
            gpm_tax,
            health_tax,
            tax_paid,
            take_home_pay,
        })
    }
}
