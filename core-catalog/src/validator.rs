//! Field-error accumulator
//!
//! Checks are recorded rather than returned early so a single failure lists
//! every violated field.

use crate::error::{CatalogError, FieldErrors, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Record `message` for `field` unless the field already has one.
    pub fn add_error(&mut self, field: &str, message: &str) {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| message.to_string());
    }

    /// Record `message` for `field` when `ok` is false.
    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add_error(field, message);
        }
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn finish(self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(CatalogError::ValidationFailed(self.errors))
        }
    }
}

/// Whether `value` is one of `permitted`.
pub fn permitted_value(value: &str, permitted: &[&str]) -> bool {
    permitted.contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_message_per_field_wins() {
        let mut v = Validator::new();
        v.check(false, "page", "must be greater than 0");
        v.check(false, "page", "must be a maximum of 1 thousand");
        v.check(true, "sort", "invalid sort value");

        assert!(!v.is_valid());
        assert_eq!(v.errors().len(), 1);
        assert_eq!(v.errors()["page"], "must be greater than 0");
    }

    #[test]
    fn test_finish_collects_every_field() {
        let mut v = Validator::new();
        v.check(false, "artist", "must be provided");
        v.check(false, "b64", "must be provided");

        let err = v.finish().unwrap_err();
        let fields = err.field_errors().unwrap();
        assert_eq!(
            fields.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["artist", "b64"]
        );
        assert_eq!(
            err.to_string(),
            "validation failed: artist must be provided, b64 must be provided"
        );
    }

    #[test]
    fn test_finish_ok_when_clean() {
        assert!(Validator::new().finish().is_ok());
    }

    #[test]
    fn test_permitted_value() {
        assert!(permitted_value("title", &["artist", "title"]));
        assert!(!permitted_value("price", &["artist", "title"]));
    }
}
