//! Repository pattern for database operations
//!
//! Defines the generic CRUD contract every concrete repository satisfies,
//! plus the SeaORM-backed paper repository. A repository borrows its
//! session from the caller; it never owns the connection.

use crate::db::models::*;
use crate::errors::{AppError, Result};
use crate::metrics::QueryMetrics;
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, EntityTrait, QueryOrder, QuerySelect, Set, SqlErr,
};
use serde_json::Value;
use uuid::Uuid;

/// Field-name to value mapping crossing the repository boundary
pub type RecordData = serde_json::Map<String, Value>;

/// Pagination window for list operations
///
/// Defaults to a page of 100 records from the start of the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Maximum number of records returned
    pub limit: u64,

    /// Number of records skipped before the page starts
    pub offset: u64,
}

impl Page {
    pub fn new(limit: u64, offset: u64) -> Self {
        Self { limit, offset }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: 100,
            offset: 0,
        }
    }
}

/// Generic CRUD contract over one record type
///
/// Absence is an expected outcome, not an error: reads return `None` and
/// `delete` reports whether anything was removed. Constraint violations and
/// connection failures surface as [`AppError`] variants documented by each
/// adapter.
#[async_trait]
pub trait Repository: Send + Sync {
    /// The persisted record type this repository manages
    type Record: Send;

    /// The identity key type for records
    type Id: Send + Sync;

    /// Create a new record from a field mapping and return it
    async fn create(&self, data: RecordData) -> Result<Self::Record>;

    /// Retrieve a record by its ID, `None` when absent
    async fn get_by_id(&self, record_id: &Self::Id) -> Result<Option<Self::Record>>;

    /// Apply a partial field mapping to an existing record
    ///
    /// Returns the updated record, or `None` when no record matches.
    async fn update(&self, record_id: &Self::Id, data: RecordData)
        -> Result<Option<Self::Record>>;

    /// Delete a record by its ID
    ///
    /// Returns `true` iff a record existed and was removed.
    async fn delete(&self, record_id: &Self::Id) -> Result<bool>;

    /// List records, newest first, within the given pagination window
    async fn list(&self, page: Page) -> Result<Vec<Self::Record>>;
}

/// SeaORM-backed repository for paper records
///
/// Works over any borrowed session: a pooled connection or an open
/// transaction. Unique-index collisions on `arxiv_id` surface as
/// [`AppError::ConstraintViolation`].
pub struct PaperRepository<'c, C: ConnectionTrait> {
    session: &'c C,
}

impl<'c, C: ConnectionTrait> PaperRepository<'c, C> {
    /// Create a repository bound to the given session
    pub fn new(session: &'c C) -> Self {
        Self { session }
    }
}

#[async_trait]
impl<C: ConnectionTrait + Sync> Repository for PaperRepository<'_, C> {
    type Record = Paper;
    type Id = Uuid;

    async fn create(&self, data: RecordData) -> Result<Paper> {
        let metrics = QueryMetrics::start("paper_create");
        let result = self.insert_paper(data).await;
        metrics.finish(result.is_ok());
        result
    }

    async fn get_by_id(&self, record_id: &Uuid) -> Result<Option<Paper>> {
        let metrics = QueryMetrics::start("paper_get_by_id");
        let result = PaperEntity::find_by_id(*record_id)
            .one(self.session)
            .await
            .map_err(Into::into);
        metrics.finish(result.is_ok());
        result
    }

    async fn update(&self, record_id: &Uuid, data: RecordData) -> Result<Option<Paper>> {
        let metrics = QueryMetrics::start("paper_update");
        let result = self.update_paper(record_id, data).await;
        metrics.finish(result.is_ok());
        result
    }

    async fn delete(&self, record_id: &Uuid) -> Result<bool> {
        let metrics = QueryMetrics::start("paper_delete");
        let result = PaperEntity::delete_by_id(*record_id)
            .exec(self.session)
            .await
            .map(|r| r.rows_affected > 0)
            .map_err(Into::into);
        metrics.finish(result.is_ok());

        if let Ok(removed) = &result {
            tracing::debug!(paper_id = %record_id, removed, "Paper delete");
        }
        result
    }

    async fn list(&self, page: Page) -> Result<Vec<Paper>> {
        let metrics = QueryMetrics::start("paper_list");
        let result = PaperEntity::find()
            .order_by_desc(PaperColumn::CreatedAt)
            .order_by_asc(PaperColumn::Id)
            .offset(page.offset)
            .limit(page.limit)
            .all(self.session)
            .await
            .map_err(Into::into);
        metrics.finish(result.is_ok());
        result
    }
}

impl<C: ConnectionTrait + Sync> PaperRepository<'_, C> {
    async fn insert_paper(&self, data: RecordData) -> Result<Paper> {
        let now = chrono::Utc::now();

        let paper = PaperActiveModel {
            id: Set(Uuid::new_v4()),
            arxiv_id: Set(require_str(&data, "arxiv_id")?),
            title: Set(require_str(&data, "title")?),
            authors: Set(require_str(&data, "authors")?),
            abstract_text: Set(require_str(&data, "abstract_text")?),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        match paper.insert(self.session).await {
            Ok(paper) => {
                tracing::debug!(paper_id = %paper.id, arxiv_id = %paper.arxiv_id, "Paper created");
                Ok(paper)
            }
            Err(err) => match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(message)) => {
                    Err(AppError::ConstraintViolation { message })
                }
                _ => Err(err.into()),
            },
        }
    }

    async fn update_paper(&self, record_id: &Uuid, data: RecordData) -> Result<Option<Paper>> {
        let Some(existing) = PaperEntity::find_by_id(*record_id).one(self.session).await? else {
            return Ok(None);
        };

        let mut paper: PaperActiveModel = existing.into();

        if let Some(value) = optional_str(&data, "arxiv_id")? {
            paper.arxiv_id = Set(value);
        }
        if let Some(value) = optional_str(&data, "title")? {
            paper.title = Set(value);
        }
        if let Some(value) = optional_str(&data, "authors")? {
            paper.authors = Set(value);
        }
        if let Some(value) = optional_str(&data, "abstract_text")? {
            paper.abstract_text = Set(value);
        }
        paper.updated_at = Set(chrono::Utc::now().into());

        let updated = match paper.update(self.session).await {
            Ok(updated) => updated,
            Err(err) => match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(message)) => {
                    return Err(AppError::ConstraintViolation { message })
                }
                _ => return Err(err.into()),
            },
        };

        tracing::debug!(paper_id = %updated.id, "Paper updated");
        Ok(Some(updated))
    }
}

/// Extract a required string field from record data
pub(crate) fn require_str(data: &RecordData, field: &str) -> Result<String> {
    match data.get(field) {
        Some(Value::String(value)) => Ok(value.clone()),
        Some(_) => Err(AppError::Validation {
            message: format!("field `{}` must be a string", field),
            field: Some(field.to_string()),
        }),
        None => Err(AppError::MissingField {
            field: field.to_string(),
        }),
    }
}

/// Extract an optional string field from record data
pub(crate) fn optional_str(data: &RecordData, field: &str) -> Result<Option<String>> {
    match data.get(field) {
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(_) => Err(AppError::Validation {
            message: format!("field `{}` must be a string", field),
            field: Some(field.to_string()),
        }),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_page() {
        let page = Page::default();
        assert_eq!(page.limit, 100);
        assert_eq!(page.offset, 0);
    }

    #[test]
    fn test_require_str_missing() {
        let data = RecordData::new();
        let err = require_str(&data, "title").unwrap_err();
        assert!(matches!(err, AppError::MissingField { ref field } if field == "title"));
    }

    #[test]
    fn test_require_str_wrong_type() {
        let mut data = RecordData::new();
        data.insert("title".into(), json!(42));
        let err = require_str(&data, "title").unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn test_optional_str_absent_is_ok() {
        let data = RecordData::new();
        assert_eq!(optional_str(&data, "authors").unwrap(), None);
    }
}
