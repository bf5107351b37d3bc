use chrono::{Days, Months, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use tax_core::calculations::common::is_whole_cents;
use tax_core::{Person, PersonError};
use thiserror::Error;

const FIRST_NAMES: &[&str] = &[
    "Ona", "Jonas", "Rasa", "Tomas", "Greta", "Lukas", "Emilija", "Matas", "Ieva", "Mantas",
    "Laura", "Paulius", "Austeja", "Dovydas", "Gabija", "Karolis", "Ugne", "Rokas", "Egle",
    "Vytautas", "Anna", "James", "Maria", "David", "Sofia", "Michael", "Elena", "Daniel",
    "Clara", "Peter",
];

const SURNAMES: &[&str] = &[
    "Kazlauskas", "Petraitis", "Jankauskas", "Vasiliauskas", "Zukauskas", "Butkus",
    "Paulauskas", "Urbonas", "Kavaliauskas", "Navickas", "Ramanauskas", "Savickas",
    "Baranauskas", "Adomaitis", "Stankevicius", "Smith", "Johnson", "Brown", "Miller",
    "Wilson", "Moore", "Taylor", "Anderson", "Thomas", "Jackson", "Martin", "Lee", "Walker",
    "Hall", "Young",
];

/// Errors that can occur when generating person records.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeneratorError {
    #[error("Invalid salary range: {min} to {max}")]
    InvalidSalaryRange { min: Decimal, max: Decimal },

    #[error("Salary bound {0} has digits below the cent")]
    SalaryPrecision(Decimal),

    #[error("Invalid age range: {min} to {max}")]
    InvalidAgeRange { min: u32, max: u32 },

    #[error("Generated an invalid person: {0}")]
    Person(#[from] PersonError),
}

/// Bounds for generated records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub min_salary: Decimal,
    pub max_salary: Decimal,
    pub min_age: u32,
    pub max_age: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            min_salary: dec!(10000.00),
            max_salary: dec!(9990000.00),
            min_age: 18,
            max_age: 80,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<(), GeneratorError> {
        if self.min_salary < Decimal::ZERO || self.min_salary > self.max_salary {
            return Err(GeneratorError::InvalidSalaryRange {
                min: self.min_salary,
                max: self.max_salary,
            });
        }
        for bound in [self.min_salary, self.max_salary] {
            if !is_whole_cents(bound) {
                return Err(GeneratorError::SalaryPrecision(bound));
            }
        }
        if self.min_age > self.max_age || self.max_age > 150 {
            return Err(GeneratorError::InvalidAgeRange {
                min: self.min_age,
                max: self.max_age,
            });
        }
        Ok(())
    }
}

fn to_cents(amount: Decimal) -> Option<i64> {
    (amount * Decimal::ONE_HUNDRED).to_i64()
}

/// Produces random [`Person`] records.
///
/// Given the same seed and `today`, the same sequence of people is produced.
pub struct PersonGenerator {
    rng: StdRng,
    today: NaiveDate,
    min_cents: i64,
    max_cents: i64,
    earliest_birth: NaiveDate,
    latest_birth: NaiveDate,
}

impl PersonGenerator {
    /// A generator drawing from `seed`, or from OS entropy when `None`.
    pub fn new(
        config: &GeneratorConfig,
        seed: Option<u64>,
        today: NaiveDate,
    ) -> Result<Self, GeneratorError> {
        config.validate()?;

        let salary_range_error = || GeneratorError::InvalidSalaryRange {
            min: config.min_salary,
            max: config.max_salary,
        };
        let min_cents = to_cents(config.min_salary).ok_or_else(salary_range_error)?;
        let max_cents = to_cents(config.max_salary).ok_or_else(salary_range_error)?;

        // Someone born on `latest_birth` has just turned `min_age`; one day
        // before `max_age + 1` years ago is the oldest birthday still aged `max_age`.
        let age_range_error = || GeneratorError::InvalidAgeRange {
            min: config.min_age,
            max: config.max_age,
        };
        let latest_birth = today
            .checked_sub_months(Months::new(12 * config.min_age))
            .ok_or_else(age_range_error)?;
        let earliest_birth = today
            .checked_sub_months(Months::new(12 * (config.max_age + 1)))
            .and_then(|d| d.checked_add_days(Days::new(1)))
            .ok_or_else(age_range_error)?;

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            rng,
            today,
            min_cents,
            max_cents,
            earliest_birth,
            latest_birth,
        })
    }

    pub fn generate(&mut self) -> Result<Person, GeneratorError> {
        let name = FIRST_NAMES.choose(&mut self.rng).copied().unwrap_or("Jonas");
        let surname = SURNAMES.choose(&mut self.rng).copied().unwrap_or("Petraitis");

        let span = (self.latest_birth - self.earliest_birth).num_days();
        let offset = self.rng.gen_range(0..=span);
        let date_of_birth = self.earliest_birth + chrono::Duration::days(offset);

        let cents = self.rng.gen_range(self.min_cents..=self.max_cents);
        let salary = Decimal::new(cents, 2);

        Ok(Person::new(name, surname, date_of_birth, salary, self.today)?)
    }

    pub fn generate_many(
        &mut self,
        count: usize,
    ) -> Result<Vec<Person>, GeneratorError> {
        (0..count).map(|_| self.generate()).collect()
    }
}
