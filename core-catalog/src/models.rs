//! Domain models for the meme catalog
//!
//! This module contains the caller-facing record, creation input, and the
//! partial-update patch, together with their validation rules.

use crate::error::Result;
use crate::validator::Validator;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use store_traits::{DocumentChanges, MemeDocument};

/// Upper bound on `artist` and `title`, in bytes.
pub const MAX_TEXT_FIELD_BYTES: usize = 64;

// =============================================================================
// Domain Models
// =============================================================================

/// Meme record as handed to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meme {
    /// Store-assigned identifier
    pub id: String,
    /// Creation time, millisecond precision
    pub created: DateTime<Utc>,
    /// Artist name
    pub artist: String,
    /// Title
    pub title: String,
    /// Base64 payload, opaque to the catalog
    pub b64: String,
    /// Optimistic concurrency token, starts at 1
    pub version: i64,
}

impl Meme {
    /// Validate record fields
    pub fn validate(&self) -> Result<()> {
        let mut v = Validator::new();
        check_fields(&mut v, &self.artist, &self.title, &self.b64);
        v.finish()
    }

    /// Mutable fields as they should read after the next successful write.
    ///
    /// `None` when the version cannot be incremented; no stored document can
    /// carry such a version.
    pub(crate) fn next_changes(&self) -> Option<DocumentChanges> {
        Some(DocumentChanges {
            artist: self.artist.clone(),
            title: self.title.clone(),
            b64: self.b64.clone(),
            version: self.version.checked_add(1)?,
        })
    }
}

impl From<MemeDocument> for Meme {
    fn from(doc: MemeDocument) -> Self {
        Self {
            id: doc.id.to_string(),
            created: doc.created,
            artist: doc.artist,
            title: doc.title,
            b64: doc.b64,
            version: doc.version,
        }
    }
}

/// Input for creating a meme
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMeme {
    pub artist: String,
    pub title: String,
    pub b64: String,
}

impl NewMeme {
    pub fn new(artist: impl Into<String>, title: impl Into<String>, b64: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
            b64: b64.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let mut v = Validator::new();
        check_fields(&mut v, &self.artist, &self.title, &self.b64);
        v.finish()
    }
}

/// Partial update of a meme
///
/// `None` leaves the stored value untouched; `Some` replaces it, including
/// with an empty string (which then fails validation).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemePatch {
    /// Version the caller last saw. When set, the update is refused unless it
    /// matches the stored version.
    pub expected_version: Option<i64>,
    pub artist: Option<String>,
    pub title: Option<String>,
    pub b64: Option<String>,
}

impl MemePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expecting_version(mut self, version: i64) -> Self {
        self.expected_version = Some(version);
        self
    }

    pub fn artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn b64(mut self, b64: impl Into<String>) -> Self {
        self.b64 = Some(b64.into());
        self
    }

    /// True when no field would change.
    pub fn is_empty(&self) -> bool {
        self.artist.is_none() && self.title.is_none() && self.b64.is_none()
    }

    /// Validate only the supplied fields.
    pub fn validate(&self) -> Result<()> {
        let mut v = Validator::new();
        if let Some(artist) = &self.artist {
            check_text(&mut v, "artist", artist);
        }
        if let Some(title) = &self.title {
            check_text(&mut v, "title", title);
        }
        if let Some(b64) = &self.b64 {
            v.check(!b64.is_empty(), "b64", "must be provided");
        }
        v.finish()
    }

    /// Overwrite each supplied field on `meme`.
    pub fn merge_into(&self, meme: &mut Meme) {
        if let Some(artist) = &self.artist {
            meme.artist.clone_from(artist);
        }
        if let Some(title) = &self.title {
            meme.title.clone_from(title);
        }
        if let Some(b64) = &self.b64 {
            meme.b64.clone_from(b64);
        }
    }
}

fn check_fields(v: &mut Validator, artist: &str, title: &str, b64: &str) {
    check_text(v, "artist", artist);
    check_text(v, "title", title);
    v.check(!b64.is_empty(), "b64", "must be provided");
}

fn check_text(v: &mut Validator, field: &str, value: &str) {
    v.check(!value.is_empty(), field, "must be provided");
    v.check(
        value.len() <= MAX_TEXT_FIELD_BYTES,
        field,
        "must not be more than 64 bytes long",
    );
}
