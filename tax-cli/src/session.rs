//! The interactive tax session.
//!
//! Each iteration runs CollectRange, Fetch, Select and ComputeAndDisplay in
//! order and then starts over. The loop ends only when input runs out.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use tax_core::calculations::IncomeTaxCalculator;
use tax_core::db::{DocumentId, QueryOutcome, RANGE_QUERY_LIMIT};
use tax_core::{Person, RecordStoreClient, TaxCard};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::prompt::Prompter;

const BANNER: &str = "\n------------------\n|--TAX MANAGER--|\n------------------";
const RANGE_INTRO: &str = "Please provide minimal age and maximum age for people you want to see:";
const INVALID_AGE: &str = "Please enter valid integer values for age.";
const RANGE_ORDER: &str = "Minimum age must be lower than maximum age. Please try again.";
const INVALID_INPUT: &str = "Invalid input. Please enter a number.";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Pause after the result is shown.
    pub pause: Duration,
    /// Age range for the first iteration, validated like typed input.
    pub initial_range: Option<(i64, i64)>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            pause: Duration::from_secs(2),
            initial_range: None,
        }
    }
}

/// A person as listed for selection, with the id of its document.
struct Candidate {
    id: Option<DocumentId>,
    person: Person,
}

pub struct TaxSession<R, W> {
    people: RecordStoreClient,
    tax_cards: Option<RecordStoreClient>,
    calculator: IncomeTaxCalculator,
    config: SessionConfig,
    prompter: Prompter<R, W>,
}

impl<R: BufRead, W: Write> TaxSession<R, W> {
    pub fn new(
        people: RecordStoreClient,
        calculator: IncomeTaxCalculator,
        config: SessionConfig,
        prompter: Prompter<R, W>,
    ) -> Self {
        Self {
            people,
            tax_cards: None,
            calculator,
            config,
            prompter,
        }
    }

    /// Persist every computed tax card through `client`.
    pub fn with_tax_cards(
        mut self,
        client: RecordStoreClient,
    ) -> Self {
        self.tax_cards = Some(client);
        self
    }

    pub fn into_output(self) -> W {
        self.prompter.into_output()
    }

    /// Runs until input is exhausted.
    pub async fn run(&mut self) -> Result<(), SessionError> {
        let mut prefilled = self.config.initial_range.take();
        loop {
            self.prompter.say(BANNER)?;
            self.prompter.say(RANGE_INTRO)?;

            let Some((min_age, max_age)) = self.collect_range(prefilled.take())? else {
                break;
            };

            let Some(candidates) = self.fetch(min_age, max_age).await? else {
                continue;
            };
            if candidates.is_empty() {
                self.prompter.say(&format!(
                    "No people found between ages {min_age} and {max_age}."
                ))?;
                continue;
            }

            let Some(choice) = self.select(&candidates)? else {
                break;
            };

            self.compute_and_display(&candidates[choice]).await?;
            tokio::time::sleep(self.config.pause).await;
        }

        info!("input closed, ending session");
        Ok(())
    }

    /// Returns `None` at end of input.
    fn collect_range(
        &mut self,
        prefilled: Option<(i64, i64)>,
    ) -> Result<Option<(i64, i64)>, SessionError> {
        if let Some((min_age, max_age)) = prefilled {
            if min_age < max_age {
                return Ok(Some((min_age, max_age)));
            }
            self.prompter.say(RANGE_ORDER)?;
        }

        loop {
            let Some(min_age) = self.prompter.ask("Enter minimal age: ")? else {
                return Ok(None);
            };
            let Ok(min_age) = min_age.trim().parse::<i64>() else {
                self.prompter.say(INVALID_AGE)?;
                continue;
            };
            let Some(max_age) = self.prompter.ask("Enter maximal age: ")? else {
                return Ok(None);
            };
            let Ok(max_age) = max_age.trim().parse::<i64>() else {
                self.prompter.say(INVALID_AGE)?;
                continue;
            };
            if min_age >= max_age {
                self.prompter.say(RANGE_ORDER)?;
                continue;
            }
            return Ok(Some((min_age, max_age)));
        }
    }

    /// `None` when the query failed; the failure has been reported.
    async fn fetch(
        &mut self,
        min_age: i64,
        max_age: i64,
    ) -> Result<Option<Vec<Candidate>>, SessionError> {
        let outcome = self
            .people
            .find_between(Person::AGE_FIELD, min_age, max_age, None)
            .await;

        let documents = match outcome {
            QueryOutcome::Found(documents) => documents,
            QueryOutcome::Empty => Vec::new(),
            QueryOutcome::Failed(err) => {
                self.prompter
                    .say(&format!("Could not fetch people: {err}. Please try again."))?;
                return Ok(None);
            }
        };

        let candidates = documents
            .iter()
            .filter_map(|doc| match Person::from_document(doc) {
                Ok(person) => Some(Candidate {
                    id: DocumentId::of(doc),
                    person,
                }),
                Err(err) => {
                    warn!(id = ?DocumentId::of(doc), error = %err, "skipping malformed person");
                    None
                }
            })
            .collect();
        Ok(Some(candidates))
    }

    /// Lists the candidates and reads a 1-based choice. Returns the 0-based
    /// index, or `None` at end of input.
    fn select(
        &mut self,
        candidates: &[Candidate],
    ) -> Result<Option<usize>, SessionError> {
        for (i, candidate) in candidates.iter().enumerate() {
            self.prompter.say(&format!("{}. {}", i + 1, candidate.person))?;
        }

        let upper = candidates.len().min(RANGE_QUERY_LIMIT);
        let prompt = format!("Select a person (1-{upper}): ");
        loop {
            let Some(line) = self.prompter.ask(&prompt)? else {
                return Ok(None);
            };
            match line.trim().parse::<usize>() {
                Ok(choice) if (1..=upper).contains(&choice) => return Ok(Some(choice - 1)),
                Ok(_) => self.prompter.say(&format!(
                    "Invalid choice. Please enter a number between 1 and {upper}."
                ))?,
                Err(_) => self.prompter.say(INVALID_INPUT)?,
            }
        }
    }

    async fn compute_and_display(
        &mut self,
        candidate: &Candidate,
    ) -> Result<(), SessionError> {
        let person = &candidate.person;
        let result = match self.calculator.calculate(person.annual_salary_before_tax) {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "tax calculation rejected");
                self.prompter.say(&format!("Could not compute tax: {err}"))?;
                return Ok(());
            }
        };
        debug!(person = %person, tax_paid = %result.tax_paid, "computed tax");

        self.prompter.say("Tax Information:")?;
        self.prompter
            .say(&format!("Tax Paid: {} EUR", result.tax_paid))?;
        self.prompter
            .say(&format!("Take Home Pay: {} EUR", result.take_home_pay))?;

        if let Some(tax_cards) = &self.tax_cards {
            let card = TaxCard::issue(person, candidate.id, &result);
            let stored = match card.to_document() {
                Ok(doc) => tax_cards.insert_one(doc).await,
                Err(err) => Err(err),
            };
            if let Err(err) = stored {
                warn!(error = %err, "tax card was not saved");
            }
        }
        Ok(())
    }
}
