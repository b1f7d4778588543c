//! Store-independent query vocabulary
//!
//! A [`Pipeline`] is an ordered list of [`Stage`]s. Adapters execute stages in
//! the order given; the canonical listing pipeline is
//! match → sort → skip → limit.

use crate::document::{DocumentField, MemeDocument};
use std::cmp::Ordering;

// =============================================================================
// Predicates
// =============================================================================

/// A single constraint on a text field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Field equals `value` exactly.
    Equals { field: DocumentField, value: String },
    /// Field contains `value` anywhere, ignoring case.
    ContainsIgnoreCase { field: DocumentField, value: String },
}

impl Condition {
    pub fn field(&self) -> DocumentField {
        match self {
            Condition::Equals { field, .. } | Condition::ContainsIgnoreCase { field, .. } => *field,
        }
    }

    /// Evaluate against a document. Non-text fields never match.
    pub fn matches(&self, document: &MemeDocument) -> bool {
        let Some(actual) = document.text(self.field()) else {
            return false;
        };

        match self {
            Condition::Equals { value, .. } => actual == value,
            Condition::ContainsIgnoreCase { value, .. } => {
                actual.to_lowercase().contains(&value.to_lowercase())
            }
        }
    }
}

/// Conjunction of conditions. The empty predicate matches every document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    conditions: Vec<Condition>,
}

impl Predicate {
    /// Predicate matching every document
    pub fn all() -> Self {
        Self::default()
    }

    /// Add a condition that must also hold
    pub fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, document: &MemeDocument) -> bool {
        self.conditions.iter().all(|c| c.matches(document))
    }
}

// =============================================================================
// Sorting
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// One sort criterion. Earlier keys take precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: DocumentField,
    pub direction: Direction,
}

impl SortKey {
    pub fn ascending(field: DocumentField) -> Self {
        Self {
            field,
            direction: Direction::Ascending,
        }
    }

    pub fn descending(field: DocumentField) -> Self {
        Self {
            field,
            direction: Direction::Descending,
        }
    }

    /// Compare two documents on this key alone.
    pub fn compare(&self, a: &MemeDocument, b: &MemeDocument) -> Ordering {
        let ordering = match self.field {
            DocumentField::Id => a.id.cmp(&b.id),
            DocumentField::Created => a.created.cmp(&b.created),
            DocumentField::Version => a.version.cmp(&b.version),
            DocumentField::Artist => a.artist.cmp(&b.artist),
            DocumentField::Title => a.title.cmp(&b.title),
            DocumentField::B64 => a.b64.cmp(&b.b64),
        };

        match self.direction {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    }
}

/// Compare two documents on a list of keys, first difference wins.
pub fn compare_documents(keys: &[SortKey], a: &MemeDocument, b: &MemeDocument) -> Ordering {
    keys.iter()
        .fold(Ordering::Equal, |acc, key| acc.then_with(|| key.compare(a, b)))
}

// =============================================================================
// Pipelines
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Match(Predicate),
    Sort(Vec<SortKey>),
    Skip(u64),
    Limit(u64),
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Match(_) => "match",
            Stage::Sort(_) => "sort",
            Stage::Skip(_) => "skip",
            Stage::Limit(_) => "limit",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Stage::Match(_) => 0,
            Stage::Sort(_) => 1,
            Stage::Skip(_) => 2,
            Stage::Limit(_) => 3,
        }
    }
}

/// Ordered list of stages executed by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage after all existing ones
    pub fn then(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Stage names in execution order, e.g. `["match", "sort", "skip", "limit"]`.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(Stage::name).collect()
    }

    /// True when every stage kind appears at most once and in the order
    /// match → sort → skip → limit. Such pipelines can be flattened into a
    /// single `SELECT` without changing their result.
    pub fn is_canonical(&self) -> bool {
        self.stages
            .windows(2)
            .all(|pair| pair[0].rank() < pair[1].rank())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentId, NewDocument};
    use chrono::Utc;

    fn doc(artist: &str, title: &str) -> MemeDocument {
        NewDocument {
            created: Utc::now(),
            artist: artist.to_string(),
            title: title.to_string(),
            b64: "eA==".to_string(),
            version: 1,
        }
        .with_id(DocumentId::new())
    }

    #[test]
    fn test_empty_predicate_matches_everything() {
        let predicate = Predicate::all();
        assert!(predicate.is_empty());
        assert!(predicate.matches(&doc("a", "b")));
    }

    #[test]
    fn test_contains_ignore_case_matches_anywhere() {
        let condition = Condition::ContainsIgnoreCase {
            field: DocumentField::Title,
            value: "foo".to_string(),
        };

        assert!(condition.matches(&doc("x", "xFooBar")));
        assert!(condition.matches(&doc("x", "FOO")));
        assert!(!condition.matches(&doc("x", "bar")));
    }

    #[test]
    fn test_equals_is_exact() {
        let predicate = Predicate::all().and(Condition::Equals {
            field: DocumentField::Artist,
            value: "Björk".to_string(),
        });

        assert!(predicate.matches(&doc("Björk", "t")));
        assert!(!predicate.matches(&doc("björk", "t")));
        assert!(!predicate.matches(&doc("Björk Guðmundsdóttir", "t")));
    }

    #[test]
    fn test_compare_documents_breaks_ties_on_later_keys() {
        let a = doc("same", "a");
        let b = doc("same", "b");
        let keys = [
            SortKey::ascending(DocumentField::Artist),
            SortKey::descending(DocumentField::Title),
        ];

        assert_eq!(compare_documents(&keys, &a, &b), Ordering::Greater);
        assert_eq!(compare_documents(&keys[..1], &a, &b), Ordering::Equal);
    }

    #[test]
    fn test_canonical_order() {
        let canonical = Pipeline::new()
            .then(Stage::Match(Predicate::all()))
            .then(Stage::Sort(vec![SortKey::ascending(DocumentField::Id)]))
            .then(Stage::Skip(5))
            .then(Stage::Limit(5));
        assert!(canonical.is_canonical());
        assert_eq!(canonical.stage_names(), vec!["match", "sort", "skip", "limit"]);

        let skip_before_sort = Pipeline::new()
            .then(Stage::Skip(5))
            .then(Stage::Sort(vec![SortKey::ascending(DocumentField::Id)]));
        assert!(!skip_before_sort.is_canonical());

        let repeated = Pipeline::new().then(Stage::Limit(1)).then(Stage::Limit(2));
        assert!(!repeated.is_canonical());

        assert!(Pipeline::new().is_canonical());
    }
}
