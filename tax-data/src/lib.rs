//! Person record generation and bulk loading.

mod generator;
mod loader;

pub use generator::{GeneratorConfig, GeneratorError, PersonGenerator};
pub use loader::{PeopleLoader, PeopleLoaderError, PersonRecord};
