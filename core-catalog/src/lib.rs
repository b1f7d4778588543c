//! # Meme Catalog Module
//!
//! Data-access and query layer for the meme catalog.
//!
//! ## Overview
//!
//! This module manages:
//! - Record models and field validation
//! - Sort/page validation against a fixed safelist
//! - Filter building, pipeline construction and paginated listing
//! - Random sampling
//! - Version-guarded create/update/delete
//! - Store adapters (in-memory and SQLite) and connection pooling

pub mod adapters;
pub mod db;
pub mod error;
pub mod filters;
pub mod models;
pub mod pagination;
pub mod query;
pub mod repositories;
pub mod validator;

mod timeout;

#[cfg(test)]
mod test_support;

pub use adapters::{InMemoryStore, SqliteStore};
pub use error::{CatalogError, FieldErrors, Result};
pub use filters::{ListParams, PageSpec, SortDirection, SortField, SortSpec};
pub use models::{Meme, MemePatch, NewMeme};
pub use pagination::{Metadata, Page};
pub use query::{MemeFilter, MemeQueryService};
pub use repositories::{MemeRepository, StoreMemeRepository};
