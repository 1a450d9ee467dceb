//! Screening pipeline: documents, the record schema, and batch orchestration

pub mod document;
pub mod schema;
pub mod batch;
