//! Sort and page validation
//!
//! Raw listing parameters are checked once, here. A successful check yields a
//! [`SortSpec`] and a [`PageSpec`] whose fields are private, so downstream
//! code can only ever see a safelisted sort field and in-range page bounds.

use crate::error::Result;
use crate::validator::{permitted_value, Validator};
use serde::{Deserialize, Serialize};
use std::fmt;
use store_traits::{DocumentField, SortKey};

/// Sort keys accepted from callers. A leading `-` requests descending order.
pub const SORT_SAFELIST: [&str; 6] = ["artist", "title", "created", "-artist", "-title", "-created"];

pub const MAX_PAGE: i64 = 1_000;
pub const MAX_PAGE_SIZE: i64 = 10;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 5;
pub const DEFAULT_SORT: &str = "created";

// =============================================================================
// Sort
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    Artist,
    Title,
    Created,
}

impl SortField {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "artist" => Some(SortField::Artist),
            "title" => Some(SortField::Title),
            "created" => Some(SortField::Created),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Artist => "artist",
            SortField::Title => "title",
            SortField::Created => "created",
        }
    }

    fn document_field(self) -> DocumentField {
        match self {
            SortField::Artist => DocumentField::Artist,
            SortField::Title => DocumentField::Title,
            SortField::Created => DocumentField::Created,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Validated sort order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortSpec {
    field: SortField,
    direction: SortDirection,
}

impl SortSpec {
    /// Parse `raw` if it appears verbatim in `safelist` and names a sortable
    /// field.
    pub fn parse(raw: &str, safelist: &[&str]) -> Option<Self> {
        if !permitted_value(raw, safelist) {
            return None;
        }

        let (name, direction) = match raw.strip_prefix('-') {
            Some(name) => (name, SortDirection::Descending),
            None => (raw, SortDirection::Ascending),
        };

        SortField::from_name(name).map(|field| Self { field, direction })
    }

    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    pub fn field(&self) -> SortField {
        self.field
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Store sort keys: the requested field, then `_id` ascending so that
    /// equal values keep a stable order across pages.
    pub fn sort_keys(&self) -> Vec<SortKey> {
        let primary = match self.direction {
            SortDirection::Ascending => SortKey::ascending(self.field.document_field()),
            SortDirection::Descending => SortKey::descending(self.field.document_field()),
        };
        vec![primary, SortKey::ascending(DocumentField::Id)]
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        Self::new(SortField::Created, SortDirection::Ascending)
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.direction == SortDirection::Descending {
            f.write_str("-")?;
        }
        f.write_str(self.field.as_str())
    }
}

// =============================================================================
// Page
// =============================================================================

/// Validated page window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageSpec {
    page: u32,
    page_size: u32,
}

impl PageSpec {
    /// Build a page window, rejecting out-of-range values.
    pub fn new(page: i64, page_size: i64) -> Result<Self> {
        let mut v = Validator::new();
        check_page(&mut v, page, page_size);
        v.finish()?;
        Ok(Self::from_checked(page, page_size))
    }

    fn from_checked(page: i64, page_size: i64) -> Self {
        Self {
            page: page as u32,
            page_size: page_size as u32,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Documents to skip: `(page - 1) * page_size`
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }
}

impl Default for PageSpec {
    fn default() -> Self {
        Self::from_checked(DEFAULT_PAGE, DEFAULT_PAGE_SIZE)
    }
}

fn check_page(v: &mut Validator, page: i64, page_size: i64) {
    v.check(page > 0, "page", "must be greater than 0");
    v.check(page <= MAX_PAGE, "page", "must be a maximum of 1 thousand");
    v.check(page_size > 0, "page_size", "must be greater than 0");
    v.check(page_size <= MAX_PAGE_SIZE, "page_size", "must be a maximum of 10");
}

// =============================================================================
// Raw parameters
// =============================================================================

/// Listing parameters as parsed from a request, not yet validated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    pub page: i64,
    pub page_size: i64,
    pub sort: String,
}

impl ListParams {
    pub fn new(page: i64, page_size: i64, sort: impl Into<String>) -> Self {
        Self {
            page,
            page_size,
            sort: sort.into(),
        }
    }

    /// Validate against [`SORT_SAFELIST`].
    pub fn validate(&self) -> Result<(SortSpec, PageSpec)> {
        self.validate_with(&SORT_SAFELIST)
    }

    /// Validate against a caller-supplied safelist. Every violated field is
    /// reported.
    pub fn validate_with(&self, safelist: &[&str]) -> Result<(SortSpec, PageSpec)> {
        let mut v = Validator::new();
        check_page(&mut v, self.page, self.page_size);

        let sort = SortSpec::parse(&self.sort, safelist);
        v.check(sort.is_some(), "sort", "invalid sort value");

        v.finish()?;

        match sort {
            Some(sort) => Ok((sort, PageSpec::from_checked(self.page, self.page_size))),
            None => unreachable!("validator accepted a sort key outside the safelist"),
        }
    }
}

impl Default for ListParams {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE, DEFAULT_PAGE_SIZE, DEFAULT_SORT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store_traits::Direction;

    #[test]
    fn test_defaults() {
        let (sort, page) = ListParams::default().validate().unwrap();
        assert_eq!(sort, SortSpec::default());
        assert_eq!(sort.to_string(), "created");
        assert_eq!(page.page(), 1);
        assert_eq!(page.page_size(), 5);
        assert_eq!(page, PageSpec::default());
    }

    #[test]
    fn test_parse_descending() {
        let sort = SortSpec::parse("-title", &SORT_SAFELIST).unwrap();
        assert_eq!(sort.field(), SortField::Title);
        assert_eq!(sort.direction(), SortDirection::Descending);
        assert_eq!(sort.to_string(), "-title");
    }

    #[test]
    fn test_unsafelisted_sort_rejected() {
        assert!(SortSpec::parse("price", &SORT_SAFELIST).is_none());
        assert!(SortSpec::parse("Title", &SORT_SAFELIST).is_none());
        assert!(SortSpec::parse("--title", &SORT_SAFELIST).is_none());

        let err = ListParams::new(1, 5, "price").validate().unwrap_err();
        assert_eq!(err.field_errors().unwrap()["sort"], "invalid sort value");
    }

    #[test]
    fn test_safelist_entry_without_sortable_field_rejected() {
        // Present in the caller's list but not a field the store can sort on.
        assert!(SortSpec::parse("price", &["price"]).is_none());
    }

    #[test]
    fn test_narrower_safelist() {
        let params = ListParams::new(1, 5, "-created");
        assert!(params.validate_with(&["title"]).is_err());
        assert!(params.validate_with(&["-created"]).is_ok());
    }

    #[test]
    fn test_all_violations_reported() {
        let err = ListParams::new(0, 11, "price").validate().unwrap_err();
        let fields = err.field_errors().unwrap();

        assert_eq!(fields.len(), 3);
        assert_eq!(fields["page"], "must be greater than 0");
        assert_eq!(fields["page_size"], "must be a maximum of 10");
        assert_eq!(fields["sort"], "invalid sort value");
    }

    #[test]
    fn test_page_bounds() {
        assert!(PageSpec::new(1, 1).is_ok());
        assert!(PageSpec::new(1_000, 10).is_ok());

        let err = PageSpec::new(1_001, 0).unwrap_err();
        let fields = err.field_errors().unwrap();
        assert_eq!(fields["page"], "must be a maximum of 1 thousand");
        assert_eq!(fields["page_size"], "must be greater than 0");

        assert!(PageSpec::new(-3, 5).is_err());
    }

    #[test]
    fn test_offset_and_limit() {
        let page = PageSpec::new(3, 5).unwrap();
        assert_eq!(page.offset(), 10);
        assert_eq!(page.limit(), 5);

        let first = PageSpec::new(1, 10).unwrap();
        assert_eq!(first.offset(), 0);

        let last = PageSpec::new(1_000, 10).unwrap();
        assert_eq!(last.offset(), 9_990);
    }

    #[test]
    fn test_sort_keys_tie_break_on_id() {
        let keys = SortSpec::new(SortField::Artist, SortDirection::Descending).sort_keys();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].field, DocumentField::Artist);
        assert_eq!(keys[0].direction, Direction::Descending);
        assert_eq!(keys[1].field, DocumentField::Id);
        assert_eq!(keys[1].direction, Direction::Ascending);
    }
}
