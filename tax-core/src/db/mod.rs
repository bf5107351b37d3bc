pub mod client;
pub mod document;
pub mod factory;
pub mod filter;
pub mod memory;
pub mod store;

pub use client::{QueryOutcome, RANGE_QUERY_LIMIT, RecordStoreClient};
pub use document::{Document, DocumentId, ID_FIELD};
pub use factory::{CollectionFactory, DbConfig, StoreRegistry};
pub use filter::{Clause, Condition, Filter, Projection};
pub use memory::{MemoryCollection, MemoryCollectionFactory};
pub use store::{DocumentCollection, StoreError};
