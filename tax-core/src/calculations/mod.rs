//! Salary calculations: age from a birthdate, and the two-bracket
//! income tax (GPM followed by health tax) applied to annual salary.

pub mod age;
pub mod common;
pub mod income_tax;

pub use age::age_on;
pub use income_tax::{IncomeTaxCalculator, IncomeTaxConfig, IncomeTaxError, IncomeTaxResult};
