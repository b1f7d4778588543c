//! Listing and sampling queries for the meme catalog.
//!
//! This module turns caller filters into store predicates, assembles the
//! match → sort → skip → limit pipeline for a page, and runs the count and
//! fetch round trips that make up a listing.
//!
//! The count and the fetch are independent queries. Under concurrent writes
//! the reported `total_records` may disagree with the page contents; no
//! snapshot is taken.

use crate::error::{CatalogError, Result};
use crate::filters::{ListParams, PageSpec, SortSpec};
use crate::models::Meme;
use crate::pagination::Page;
use crate::timeout::bounded;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use store_traits::{Condition, DocumentField, DocumentStore, Pipeline, Predicate, Stage, TimeoutPolicy};
use tracing::{debug, instrument};

// =============================================================================
// Filter Builder
// =============================================================================

/// Optional listing criteria. `None` or an empty string means no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemeFilter {
    /// Exact artist match
    pub artist: Option<String>,
    /// Case-insensitive substring of the title
    pub title: Option<String>,
}

impl MemeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Translate into a store predicate.
    pub fn to_predicate(&self) -> Predicate {
        let mut predicate = Predicate::all();

        if let Some(artist) = self.artist.as_deref().filter(|a| !a.is_empty()) {
            predicate = predicate.and(Condition::Equals {
                field: DocumentField::Artist,
                value: artist.to_string(),
            });
        }

        if let Some(title) = self.title.as_deref().filter(|t| !t.is_empty()) {
            predicate = predicate.and(Condition::ContainsIgnoreCase {
                field: DocumentField::Title,
                value: title.to_string(),
            });
        }

        predicate
    }
}

/// Pipeline for one page of a listing.
pub fn build_list_pipeline(predicate: Predicate, sort: SortSpec, page: PageSpec) -> Pipeline {
    Pipeline::new()
        .then(Stage::Match(predicate))
        .then(Stage::Sort(sort.sort_keys()))
        .then(Stage::Skip(page.offset()))
        .then(Stage::Limit(page.limit()))
}

// =============================================================================
// Query Service
// =============================================================================

/// Read-only listing and sampling over the meme collection
#[derive(Clone)]
pub struct MemeQueryService {
    store: Arc<dyn DocumentStore>,
    timeouts: TimeoutPolicy,
}

impl MemeQueryService {
    pub fn new(store: Arc<dyn DocumentStore>, timeouts: TimeoutPolicy) -> Self {
        Self { store, timeouts }
    }

    /// List one page of memes matching `filter`.
    ///
    /// Issues a count over the unpaginated filtered set, then a page fetch.
    /// Either both succeed or the call fails.
    #[instrument(skip_all, fields(sort = %sort, page = page.page(), page_size = page.page_size()))]
    pub async fn list(&self, filter: &MemeFilter, sort: SortSpec, page: PageSpec) -> Result<Page<Meme>> {
        let predicate = filter.to_predicate();

        let total = bounded(
            "count_matching",
            self.timeouts.aggregate,
            self.store.count_matching(&predicate),
        )
        .await?;

        let pipeline = build_list_pipeline(predicate, sort, page);
        let documents = bounded(
            "fetch_page",
            self.timeouts.aggregate,
            self.store.fetch_page(&pipeline),
        )
        .await?;

        debug!(total, returned = documents.len(), "Listed memes");

        let memes = documents.into_iter().map(Meme::from).collect();
        Ok(Page::new(memes, total, page.page(), page.page_size()))
    }

    /// Validate raw listing parameters, then list. Invalid parameters fail
    /// before any store call.
    pub async fn list_params(&self, filter: &MemeFilter, params: &ListParams) -> Result<Page<Meme>> {
        let (sort, page) = params.validate()?;
        self.list(filter, sort, page).await
    }

    /// Pick one meme at random from the whole collection.
    ///
    /// # Errors
    ///
    /// `CatalogError::NotFound` when the collection is empty.
    #[instrument(skip(self))]
    pub async fn random(&self) -> Result<Meme> {
        let sampled = bounded("sample_one", self.timeouts.aggregate, self.store.sample_one()).await?;

        match sampled {
            Some(document) => Ok(document.into()),
            None => {
                debug!("Random sample on empty collection");
                Err(CatalogError::NotFound)
            }
        }
    }
}
