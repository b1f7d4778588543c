//! Pagination metadata and paged results

use serde::{Deserialize, Serialize};

/// Pagination summary for one page of a listing
///
/// All fields are zero when the current page is empty, and zero fields are
/// omitted when serialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub current_page: u32,
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub page_size: u32,
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub first_page: u32,
    #[serde(default, skip_serializing_if = "is_zero_u64")]
    pub last_page: u64,
    #[serde(default, skip_serializing_if = "is_zero_u64")]
    pub total_records: u64,
}

impl Metadata {
    /// Compute metadata for a page holding `filtered_count` records out of
    /// `total_records` matches.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_catalog::pagination::Metadata;
    ///
    /// let metadata = Metadata::calculate(5, 12, 1, 5);
    /// assert_eq!(metadata.last_page, 3);
    ///
    /// assert!(Metadata::calculate(0, 12, 1, 5).is_empty());
    /// ```
    pub fn calculate(filtered_count: usize, total_records: u64, page: u32, page_size: u32) -> Self {
        if filtered_count == 0 || page_size == 0 {
            return Self::default();
        }

        Self {
            current_page: page,
            page_size,
            first_page: 1,
            last_page: total_records.div_ceil(u64::from(page_size)),
            total_records,
        }
    }

    /// True when there was nothing to paginate
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Check if there are more pages after the current one
    pub fn has_next(&self) -> bool {
        u64::from(self.current_page) < self.last_page
    }

    /// Check if there are pages before the current one
    pub fn has_previous(&self) -> bool {
        self.current_page > self.first_page
    }
}

fn is_zero_u32(value: &u32) -> bool {
    *value == 0
}

fn is_zero_u64(value: &u64) -> bool {
    *value == 0
}

/// One page of results with its metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub metadata: Metadata,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_records: u64, page: u32, page_size: u32) -> Self {
        let metadata = Metadata::calculate(items.len(), total_records, page, page_size);
        Self { items, metadata }
    }

    /// Map the items to a different type
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            metadata: self.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate() {
        let metadata = Metadata::calculate(5, 12, 1, 5);
        assert_eq!(
            metadata,
            Metadata {
                current_page: 1,
                page_size: 5,
                first_page: 1,
                last_page: 3,
                total_records: 12,
            }
        );
        assert!(metadata.has_next());
        assert!(!metadata.has_previous());
    }

    #[test]
    fn test_last_page_rounds_up() {
        assert_eq!(Metadata::calculate(2, 10, 2, 5).last_page, 2);
        assert_eq!(Metadata::calculate(1, 11, 3, 5).last_page, 3);
        assert_eq!(Metadata::calculate(1, 1, 1, 10).last_page, 1);
    }

    #[test]
    fn test_empty_page_yields_zero_metadata() {
        for (total, page, size) in [(0, 1, 5), (12, 4, 5), (999, 1_000, 10)] {
            let metadata = Metadata::calculate(0, total, page, size);
            assert!(metadata.is_empty());
            assert_eq!(metadata, Metadata::default());
        }
    }

    #[test]
    fn test_zero_fields_are_omitted() {
        let empty = serde_json::to_value(Metadata::default()).unwrap();
        assert_eq!(empty, serde_json::json!({}));

        let full = serde_json::to_value(Metadata::calculate(3, 8, 2, 5)).unwrap();
        assert_eq!(
            full,
            serde_json::json!({
                "current_page": 2,
                "page_size": 5,
                "first_page": 1,
                "last_page": 2,
                "total_records": 8
            })
        );
    }

    #[test]
    fn test_page_map() {
        let page = Page::new(vec![1, 2, 3], 13, 2, 3).map(|x| x * 2);
        assert_eq!(page.items, vec![2, 4, 6]);
        assert_eq!(page.metadata.last_page, 5);
        assert!(page.metadata.has_previous());
    }
}
