use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculations::{age_on, common::is_whole_cents};
use crate::db::{Document, StoreError, document};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PersonError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("surname must not be empty")]
    EmptySurname,

    #[error("salary must be non-negative, got {0}")]
    NegativeSalary(Decimal),

    #[error("salary {0} has digits below the cent")]
    SalaryPrecision(Decimal),
}

/// One person record as stored in the people collection.
///
/// The salary key keeps the `anual_salary_before_tax` spelling used by
/// existing collections; `annual_salary_before_tax` is accepted on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    pub surname: String,
    pub date_of_birth: NaiveDate,
    pub age: u32,
    #[serde(
        rename = "anual_salary_before_tax",
        alias = "annual_salary_before_tax",
        with = "crate::models::money"
    )]
    pub annual_salary_before_tax: Decimal,
}

impl Person {
    pub const AGE_FIELD: &'static str = "age";

    /// Builds a record, deriving `age` from `date_of_birth` as of `today`.
    pub fn new(
        name: impl Into<String>,
        surname: impl Into<String>,
        date_of_birth: NaiveDate,
        annual_salary_before_tax: Decimal,
        today: NaiveDate,
    ) -> Result<Self, PersonError> {
        let name = name.into();
        let surname = surname.into();
        if name.trim().is_empty() {
            return Err(PersonError::EmptyName);
        }
        if surname.trim().is_empty() {
            return Err(PersonError::EmptySurname);
        }
        if annual_salary_before_tax < Decimal::ZERO {
            return Err(PersonError::NegativeSalary(annual_salary_before_tax));
        }
        if !is_whole_cents(annual_salary_before_tax) {
            return Err(PersonError::SalaryPrecision(annual_salary_before_tax));
        }

        let mut salary = annual_salary_before_tax;
        salary.rescale(2);

        Ok(Self {
            name,
            surname,
            date_of_birth,
            age: age_on(date_of_birth, today),
            annual_salary_before_tax: salary,
        })
    }

    pub fn to_document(&self) -> Result<Document, StoreError> {
        document::to_document(self)
    }

    /// Decodes a stored document. Extra keys such as `_id` are ignored.
    pub fn from_document(doc: &Document) -> Result<Self, StoreError> {
        document::from_document(doc)
    }
}

impl fmt::Display for Person {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{} {}, age {}", self.name, self.surname, self.age)
    }
}
