pub mod money;
mod person;
mod tax_card;

pub use person::{Person, PersonError};
pub use tax_card::TaxCard;
