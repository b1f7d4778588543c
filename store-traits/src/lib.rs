//! # Document Store Traits
//!
//! Store-independent contract between the meme catalog and whatever document
//! store backs it.
//!
//! ## Overview
//!
//! - [`DocumentStore`](store::DocumentStore) - count, fetch-page, insert,
//!   conditional-update, delete and sample-one operations
//! - [`MemeDocument`](document::MemeDocument) - the stored record shape
//! - [`Pipeline`](query::Pipeline) - ordered match/sort/skip/limit stages
//! - [`TimeoutPolicy`](store::TimeoutPolicy) - per-call time budgets
//!
//! ## Error Handling
//!
//! Adapters convert driver-specific failures into [`StoreError`](error::StoreError).
//! The catalog never sees raw driver errors.

pub mod document;
pub mod error;
pub mod query;
pub mod store;

pub use document::{DocumentChanges, DocumentField, DocumentId, MemeDocument, NewDocument};
pub use error::{Result, StoreError};
pub use query::{compare_documents, Condition, Direction, Pipeline, Predicate, SortKey, Stage};
pub use store::{DocumentStore, TimeoutPolicy};
