use std::collections::BTreeMap;
use store_traits::StoreError;
use thiserror::Error;

/// Violated constraints keyed by field name.
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("document not found")]
    NotFound,

    #[error("edit conflict: the record was modified or removed by another writer")]
    EditConflict,

    #[error("validation failed: {}", describe(.0))]
    ValidationFailed(FieldErrors),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl CatalogError {
    /// Field errors carried by a validation failure
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            CatalogError::ValidationFailed(errors) => Some(errors),
            _ => None,
        }
    }
}

fn describe(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{field} {message}"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, CatalogError>;
