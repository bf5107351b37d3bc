pub mod calculations;
pub mod db;
pub mod models;

pub use db::{
    Document, DocumentCollection, DocumentId, Filter, Projection, QueryOutcome,
    RecordStoreClient, StoreError,
};
pub use models::*;
