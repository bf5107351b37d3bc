//! SQLite backend for the document store.
//!
//! Every collection lives in one `documents` table keyed by namespace, with
//! the document body kept as JSON text.

mod collection;
mod factory;
mod query;

pub use collection::SqliteCollection;
pub use factory::SqliteCollectionFactory;
