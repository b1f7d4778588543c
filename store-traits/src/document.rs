//! Store-facing document shapes
//!
//! These types mirror what the document store persists, field for field:
//! `{_id, created, artist, title, b64, version}`. Caller-facing records live in
//! `core-catalog` and rename `_id` to `id` at that boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// Identity
// =============================================================================

/// Store-native document identifier
///
/// Assigned by the store on insert and never reassigned.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Fields
// =============================================================================

/// Persisted field names of a meme document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentField {
    Id,
    Created,
    Artist,
    Title,
    B64,
    Version,
}

impl DocumentField {
    /// Field name exactly as stored (case-sensitive).
    pub const fn as_str(self) -> &'static str {
        match self {
            DocumentField::Id => "_id",
            DocumentField::Created => "created",
            DocumentField::Artist => "artist",
            DocumentField::Title => "title",
            DocumentField::B64 => "b64",
            DocumentField::Version => "version",
        }
    }
}

impl fmt::Display for DocumentField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Documents
// =============================================================================

/// A meme document as persisted by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemeDocument {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub created: DateTime<Utc>,
    pub artist: String,
    pub title: String,
    pub b64: String,
    pub version: i64,
}

impl MemeDocument {
    /// Text value of a string-typed field; `None` for non-text fields.
    pub fn text(&self, field: DocumentField) -> Option<&str> {
        match field {
            DocumentField::Artist => Some(&self.artist),
            DocumentField::Title => Some(&self.title),
            DocumentField::B64 => Some(&self.b64),
            DocumentField::Id | DocumentField::Created | DocumentField::Version => None,
        }
    }

    /// Overwrite the mutable fields and version with `changes`.
    pub fn apply(&mut self, changes: &DocumentChanges) {
        self.artist.clone_from(&changes.artist);
        self.title.clone_from(&changes.title);
        self.b64.clone_from(&changes.b64);
        self.version = changes.version;
    }
}

/// Document contents handed to `DocumentStore::insert`, before the store
/// assigns an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocument {
    pub created: DateTime<Utc>,
    pub artist: String,
    pub title: String,
    pub b64: String,
    pub version: i64,
}

impl NewDocument {
    pub fn with_id(self, id: DocumentId) -> MemeDocument {
        MemeDocument {
            id,
            created: self.created,
            artist: self.artist,
            title: self.title,
            b64: self.b64,
            version: self.version,
        }
    }
}

/// Field values written by a version-guarded update.
///
/// `created` is absent on purpose: it is set once at insert time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentChanges {
    pub artist: String,
    pub title: String,
    pub b64: String,
    /// Version the document carries after the write.
    pub version: i64,
}
