use std::io::Read;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::{Person, PersonError, RecordStoreClient, StoreError};
use thiserror::Error;
use tracing::info;

/// Errors that can occur when importing people.
#[derive(Debug, Error)]
pub enum PeopleLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Invalid person on line {line}: {source}")]
    InvalidPerson {
        line: usize,
        #[source]
        source: PersonError,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<csv::Error> for PeopleLoaderError {
    fn from(err: csv::Error) -> Self {
        PeopleLoaderError::CsvParse(err.to_string())
    }
}

/// A single row of a people CSV file.
///
/// - `name`, `surname`: non-empty
/// - `date_of_birth`: `YYYY-MM-DD`
/// - `anual_salary_before_tax`: non-negative, at most two decimals
///
/// There is no `age` column; age is derived on load.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PersonRecord {
    pub name: String,
    pub surname: String,
    pub date_of_birth: NaiveDate,
    #[serde(alias = "annual_salary_before_tax")]
    pub anual_salary_before_tax: Decimal,
}

/// Loads person records into a people collection.
pub struct PeopleLoader;

impl PeopleLoader {
    /// Parse CSV rows into people, computing each age as of `today`.
    pub fn parse<R: Read>(
        reader: R,
        today: NaiveDate,
    ) -> Result<Vec<Person>, PeopleLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut people = Vec::new();

        for (index, result) in csv_reader.deserialize().enumerate() {
            let record: PersonRecord = result?;
            let person = Person::new(
                record.name,
                record.surname,
                record.date_of_birth,
                record.anual_salary_before_tax,
                today,
            )
            // Header is line 1.
            .map_err(|source| PeopleLoaderError::InvalidPerson {
                line: index + 2,
                source,
            })?;
            people.push(person);
        }

        Ok(people)
    }

    /// Insert `people` in one batch. Returns the number inserted.
    pub async fn load(
        client: &RecordStoreClient,
        people: &[Person],
    ) -> Result<usize, PeopleLoaderError> {
        if people.is_empty() {
            return Ok(0);
        }

        let documents = people
            .iter()
            .map(Person::to_document)
            .collect::<Result<Vec<_>, _>>()?;
        let ids = client.insert_many(documents).await?;

        info!(namespace = %client.namespace(), count = ids.len(), "loaded people");
        Ok(ids.len())
    }
}
