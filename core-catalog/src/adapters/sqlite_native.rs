//! Native SQLite Document Store
//!
//! Implements `DocumentStore` on top of a `sqlx` SQLite pool. Each meme
//! document is one row of the `memes` table; `created` is persisted as epoch
//! milliseconds.
//!
//! SQLite's `lower()` folds ASCII only, so the title is also stored lowercased
//! by Rust in `title_folded`, and case-insensitive title matches compare
//! against that column.
//!
//! Pipelines are flattened into a single `SELECT`, so only canonical
//! pipelines (match → sort → skip → limit, each at most once) are accepted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::query::Query;
use sqlx::{Pool, Row, Sqlite};
use store_traits::{
    Condition, Direction, DocumentChanges, DocumentField, DocumentId, DocumentStore, MemeDocument,
    NewDocument,
    Pipeline, Predicate, Result, SortKey, Stage, StoreError,
};
use tracing::{debug, warn};

const DOCUMENT_COLUMNS: &str = "_id, created, artist, title, b64, version";
const SELECT_COLUMNS: &str = "SELECT _id, created, artist, title, b64, version FROM memes";

/// SQLite implementation of `DocumentStore`
///
/// Wraps a `sqlx::Pool<Sqlite>` whose schema has been migrated by
/// [`crate::db::create_pool`].
#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

// =============================================================================
// SQL building
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum BindValue {
    Text(String),
    I64(i64),
}

/// `SELECT` statement plus its positional bind values.
#[derive(Debug, Default)]
struct CompiledQuery {
    sql: String,
    binds: Vec<BindValue>,
}

fn push_where(predicate: &Predicate, query: &mut CompiledQuery) {
    if predicate.is_empty() {
        return;
    }

    let clauses: Vec<String> = predicate
        .conditions()
        .iter()
        .map(|condition| match condition {
            Condition::Equals { field, value } => {
                query.binds.push(BindValue::Text(value.clone()));
                format!("{} = ?", field.as_str())
            }
            Condition::ContainsIgnoreCase { field, value } => {
                query.binds.push(BindValue::Text(value.to_lowercase()));
                match folded_column(*field) {
                    Some(column) => format!("instr({}, ?) > 0", column),
                    None => format!("instr(lower({}), ?) > 0", field.as_str()),
                }
            }
        })
        .collect();

    query.sql.push_str(" WHERE ");
    query.sql.push_str(&clauses.join(" AND "));
}

/// Column holding the Unicode-lowercased copy of `field`, if one is kept.
fn folded_column(field: DocumentField) -> Option<&'static str> {
    match field {
        DocumentField::Title => Some("title_folded"),
        _ => None,
    }
}

fn push_order_by(keys: &[SortKey], query: &mut CompiledQuery) {
    if keys.is_empty() {
        return;
    }

    let terms: Vec<String> = keys
        .iter()
        .map(|key| {
            let direction = match key.direction {
                Direction::Ascending => "ASC",
                Direction::Descending => "DESC",
            };
            format!("{} {}", key.field.as_str(), direction)
        })
        .collect();

    query.sql.push_str(" ORDER BY ");
    query.sql.push_str(&terms.join(", "));
}

fn to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Flatten a canonical pipeline into one `SELECT`.
fn compile_pipeline(pipeline: &Pipeline) -> Result<CompiledQuery> {
    if !pipeline.is_canonical() {
        return Err(StoreError::InvalidPipeline(format!(
            "stages must appear once each in match, sort, skip, limit order; got {:?}",
            pipeline.stage_names()
        )));
    }

    let mut query = CompiledQuery {
        sql: SELECT_COLUMNS.to_string(),
        binds: Vec::new(),
    };
    let mut skip = None;
    let mut limit = None;

    for stage in pipeline.stages() {
        match stage {
            Stage::Match(predicate) => push_where(predicate, &mut query),
            Stage::Sort(keys) => push_order_by(keys, &mut query),
            Stage::Skip(n) => skip = Some(to_i64(*n)),
            Stage::Limit(n) => limit = Some(to_i64(*n)),
        }
    }

    // SQLite only accepts OFFSET after a LIMIT; -1 means unbounded.
    match (limit, skip) {
        (Some(limit), skip) => {
            query.sql.push_str(" LIMIT ?");
            query.binds.push(BindValue::I64(limit));
            if let Some(skip) = skip {
                query.sql.push_str(" OFFSET ?");
                query.binds.push(BindValue::I64(skip));
            }
        }
        (None, Some(skip)) => {
            query.sql.push_str(" LIMIT -1 OFFSET ?");
            query.binds.push(BindValue::I64(skip));
        }
        (None, None) => {}
    }

    Ok(query)
}

fn bind_all<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    binds: &[BindValue],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for bind in binds {
        query = match bind {
            BindValue::Text(value) => query.bind(value.clone()),
            BindValue::I64(value) => query.bind(*value),
        };
    }
    query
}

// =============================================================================
// Row conversion and errors
// =============================================================================

fn map_sqlx_error(operation: &str, error: sqlx::Error) -> StoreError {
    warn!(operation, error = %error, "SQLite store call failed");
    match error {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Connection(error.to_string())
        }
        other => StoreError::Query(other.to_string()),
    }
}

fn decode_error(column: &str, error: impl std::fmt::Display) -> StoreError {
    StoreError::Serialization(format!("column `{}`: {}", column, error))
}

fn row_to_document(row: &SqliteRow) -> Result<MemeDocument> {
    let id: String = row.try_get("_id").map_err(|e| decode_error("_id", e))?;
    let created_ms: i64 = row.try_get("created").map_err(|e| decode_error("created", e))?;

    let created: DateTime<Utc> = DateTime::from_timestamp_millis(created_ms)
        .ok_or_else(|| decode_error("created", format!("{} is out of range", created_ms)))?;

    Ok(MemeDocument {
        id: DocumentId::from_string(&id).map_err(|e| decode_error("_id", e))?,
        created,
        artist: row.try_get("artist").map_err(|e| decode_error("artist", e))?,
        title: row.try_get("title").map_err(|e| decode_error("title", e))?,
        b64: row.try_get("b64").map_err(|e| decode_error("b64", e))?,
        version: row.try_get("version").map_err(|e| decode_error("version", e))?,
    })
}

// =============================================================================
// DocumentStore
// =============================================================================

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn count_matching(&self, predicate: &Predicate) -> Result<u64> {
        let mut query = CompiledQuery {
            sql: "SELECT COUNT(*) AS count FROM memes".to_string(),
            binds: Vec::new(),
        };
        push_where(predicate, &mut query);

        debug!(sql = %query.sql, "Counting matching documents");

        let row = bind_all(sqlx::query(&query.sql), &query.binds)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_matching", e))?;

        let count: i64 = row.try_get("count").map_err(|e| decode_error("count", e))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn fetch_page(&self, pipeline: &Pipeline) -> Result<Vec<MemeDocument>> {
        let query = compile_pipeline(pipeline)?;

        debug!(sql = %query.sql, binds = query.binds.len(), "Executing pipeline");

        let rows = bind_all(sqlx::query(&query.sql), &query.binds)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_page", e))?;

        rows.iter().map(row_to_document).collect()
    }

    async fn find_by_id(&self, id: DocumentId) -> Result<Option<MemeDocument>> {
        let sql = format!("{} WHERE _id = ?", SELECT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_id", e))?;

        row.as_ref().map(row_to_document).transpose()
    }

    async fn insert(&self, document: NewDocument) -> Result<DocumentId> {
        let id = DocumentId::new();

        sqlx::query(
            "INSERT INTO memes (_id, created, artist, title, title_folded, b64, version) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(document.created.timestamp_millis())
        .bind(document.artist)
        .bind(document.title.to_lowercase())
        .bind(document.title)
        .bind(document.b64)
        .bind(document.version)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert", e))?;

        debug!(%id, "Inserted document");
        Ok(id)
    }

    async fn conditional_update(
        &self,
        id: DocumentId,
        expected_version: i64,
        changes: &DocumentChanges,
    ) -> Result<Option<MemeDocument>> {
        let sql = format!(
            "UPDATE memes SET artist = ?, title = ?, title_folded = ?, b64 = ?, version = ? \
             WHERE _id = ? AND version = ? RETURNING {}",
            DOCUMENT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(changes.artist.as_str())
            .bind(changes.title.as_str())
            .bind(changes.title.to_lowercase())
            .bind(changes.b64.as_str())
            .bind(changes.version)
            .bind(id.to_string())
            .bind(expected_version)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("conditional_update", e))?;

        row.as_ref().map(row_to_document).transpose()
    }

    async fn delete(&self, id: DocumentId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM memes WHERE _id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;

        Ok(result.rows_affected())
    }

    async fn sample_one(&self) -> Result<Option<MemeDocument>> {
        let sql = format!("{} ORDER BY RANDOM() LIMIT 1", SELECT_COLUMNS);
        let row = sqlx::query(&sql)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("sample_one", e))?;

        row.as_ref().map(row_to_document).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use chrono::{SubsecRound, TimeZone};

    async fn setup_store() -> SqliteStore {
        SqliteStore::new(create_test_pool().await.unwrap())
    }

    fn new_doc(artist: &str, title: &str, created_ms: i64) -> NewDocument {
        NewDocument {
            created: Utc.timestamp_millis_opt(created_ms).unwrap(),
            artist: artist.to_string(),
            title: title.to_string(),
            b64: "eA==".to_string(),
            version: 1,
        }
    }

    fn titles(documents: Vec<MemeDocument>) -> Vec<String> {
        documents.into_iter().map(|d| d.title).collect()
    }

    #[test]
    fn test_compile_canonical_pipeline() {
        let pipeline = Pipeline::new()
            .then(Stage::Match(Predicate::all().and(Condition::Equals {
                field: DocumentField::Artist,
                value: "bob".to_string(),
            })))
            .then(Stage::Sort(vec![
                SortKey::descending(DocumentField::Created),
                SortKey::ascending(DocumentField::Id),
            ]))
            .then(Stage::Skip(10))
            .then(Stage::Limit(5));

        let compiled = compile_pipeline(&pipeline).unwrap();
        assert_eq!(
            compiled.sql,
            "SELECT _id, created, artist, title, b64, version FROM memes \
             WHERE artist = ? ORDER BY created DESC, _id ASC LIMIT ? OFFSET ?"
        );
        assert_eq!(
            compiled.binds,
            vec![
                BindValue::Text("bob".to_string()),
                BindValue::I64(5),
                BindValue::I64(10),
            ]
        );
    }

    #[test]
    fn test_compile_skip_without_limit() {
        let compiled = compile_pipeline(&Pipeline::new().then(Stage::Skip(3))).unwrap();
        assert!(compiled.sql.ends_with("LIMIT -1 OFFSET ?"));
        assert_eq!(compiled.binds, vec![BindValue::I64(3)]);
    }

    #[test]
    fn test_compile_rejects_out_of_order_stages() {
        let pipeline = Pipeline::new()
            .then(Stage::Limit(5))
            .then(Stage::Sort(vec![SortKey::ascending(DocumentField::Title)]));

        let err = compile_pipeline(&pipeline).unwrap_err();
        assert!(matches!(err, StoreError::InvalidPipeline(_)));
    }

    #[tokio::test]
    async fn test_non_canonical_pipeline_is_rejected() {
        let store = setup_store().await;
        let pipeline = Pipeline::new().then(Stage::Limit(1)).then(Stage::Limit(2));

        let err = store.fetch_page(&pipeline).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidPipeline(_)));
    }

    #[tokio::test]
    async fn test_insert_and_find_round_trip() {
        let store = setup_store().await;
        let created = Utc::now().trunc_subsecs(3);
        let id = store
            .insert(NewDocument {
                created,
                artist: "ann".to_string(),
                title: "cat".to_string(),
                b64: "aGk=".to_string(),
                version: 1,
            })
            .await
            .unwrap();

        let found = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.created, created);
        assert_eq!(found.artist, "ann");
        assert_eq!(found.title, "cat");
        assert_eq!(found.b64, "aGk=");
        assert_eq!(found.version, 1);
    }

    #[tokio::test]
    async fn test_find_missing_returns_none() {
        let store = setup_store().await;
        assert!(store.find_by_id(DocumentId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetch_page_sorts_and_pages() {
        let store = setup_store().await;
        for (i, title) in ["d", "a", "c", "b", "e"].iter().enumerate() {
            store.insert(new_doc("x", title, i as i64)).await.unwrap();
        }

        let pipeline = Pipeline::new()
            .then(Stage::Match(Predicate::all()))
            .then(Stage::Sort(vec![
                SortKey::ascending(DocumentField::Title),
                SortKey::ascending(DocumentField::Id),
            ]))
            .then(Stage::Skip(1))
            .then(Stage::Limit(2));

        let page = store.fetch_page(&pipeline).await.unwrap();
        assert_eq!(titles(page), vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_contains_ignore_case() {
        let store = setup_store().await;
        store.insert(new_doc("x", "xFooBar", 1)).await.unwrap();
        store.insert(new_doc("x", "food", 2)).await.unwrap();
        store.insert(new_doc("x", "bar", 3)).await.unwrap();

        let predicate = Predicate::all().and(Condition::ContainsIgnoreCase {
            field: DocumentField::Title,
            value: "FOO".to_string(),
        });

        assert_eq!(store.count_matching(&predicate).await.unwrap(), 2);
        assert_eq!(store.count_matching(&Predicate::all()).await.unwrap(), 3);

        let pipeline = Pipeline::new()
            .then(Stage::Match(predicate))
            .then(Stage::Sort(vec![SortKey::ascending(DocumentField::Created)]));
        assert_eq!(
            titles(store.fetch_page(&pipeline).await.unwrap()),
            vec!["xFooBar", "food"]
        );
    }

    #[tokio::test]
    async fn test_contains_ignore_case_folds_unicode() {
        let store = setup_store().await;
        store.insert(new_doc("x", "ÜBER meme", 1)).await.unwrap();
        store.insert(new_doc("x", "Straße ΣΟΦΙΑ", 2)).await.unwrap();
        store.insert(new_doc("x", "uber", 3)).await.unwrap();

        let contains = |value: &str| {
            Predicate::all().and(Condition::ContainsIgnoreCase {
                field: DocumentField::Title,
                value: value.to_string(),
            })
        };

        assert_eq!(store.count_matching(&contains("über")).await.unwrap(), 1);
        assert_eq!(store.count_matching(&contains("σοφια")).await.unwrap(), 1);
        assert_eq!(store.count_matching(&contains("UBER")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_conditional_update_refreshes_folded_title() {
        let store = setup_store().await;
        let id = store.insert(new_doc("x", "plain", 1)).await.unwrap();

        let changes = DocumentChanges {
            artist: "x".to_string(),
            title: "ÉCOLE".to_string(),
            b64: "eA==".to_string(),
            version: 2,
        };
        store.conditional_update(id, 1, &changes).await.unwrap().unwrap();

        let predicate = Predicate::all().and(Condition::ContainsIgnoreCase {
            field: DocumentField::Title,
            value: "école".to_string(),
        });
        assert_eq!(store.count_matching(&predicate).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_equals_is_exact() {
        let store = setup_store().await;
        store.insert(new_doc("bob", "a", 1)).await.unwrap();
        store.insert(new_doc("Bob", "b", 2)).await.unwrap();
        store.insert(new_doc("bobby", "c", 3)).await.unwrap();

        let predicate = Predicate::all().and(Condition::Equals {
            field: DocumentField::Artist,
            value: "bob".to_string(),
        });
        assert_eq!(store.count_matching(&predicate).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_conditional_update_checks_version() {
        let store = setup_store().await;
        let id = store.insert(new_doc("x", "before", 1)).await.unwrap();

        let changes = DocumentChanges {
            artist: "y".to_string(),
            title: "after".to_string(),
            b64: "eQ==".to_string(),
            version: 2,
        };

        let written = store
            .conditional_update(id, 1, &changes)
            .await
            .unwrap()
            .unwrap();
        assert!(store
            .conditional_update(id, 1, &changes)
            .await
            .unwrap()
            .is_none());

        let found = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(found, written);
        assert_eq!(found.title, "after");
        assert_eq!(found.artist, "y");
        assert_eq!(found.version, 2);
        assert_eq!(found.created.timestamp_millis(), 1);
    }

    #[tokio::test]
    async fn test_delete_reports_rows_affected() {
        let store = setup_store().await;
        let id = store.insert(new_doc("x", "t", 1)).await.unwrap();

        assert_eq!(store.delete(id).await.unwrap(), 1);
        assert_eq!(store.delete(id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sample_one() {
        let store = setup_store().await;
        assert!(store.sample_one().await.unwrap().is_none());

        let id = store.insert(new_doc("x", "only", 1)).await.unwrap();
        let sampled = store.sample_one().await.unwrap().unwrap();
        assert_eq!(sampled.id, id);
    }
}
