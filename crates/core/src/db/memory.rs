//! In-memory database and repository adapters
//!
//! Backs the same contracts as the SeaORM adapters with a process-local
//! store. Used by the contract test-suite and by embedded callers that
//! have no database to reach.

use crate::db::models::Paper;
use crate::db::repository::{optional_str, require_str, Page, RecordData, Repository};
use crate::db::Database;
use crate::errors::{AppError, Result};
use crate::metrics::QueryMetrics;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct MemoryState {
    open: RwLock<bool>,
    papers: RwLock<Vec<Paper>>,
}

/// Process-local database adapter
#[derive(Default)]
pub struct MemoryDatabase {
    state: Arc<MemoryState>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    type Session = MemorySession;

    async fn startup(&self) -> Result<()> {
        *self.state.open.write().await = true;
        tracing::info!("In-memory database opened");
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        *self.state.open.write().await = false;
        tracing::info!("In-memory database closed");
        Ok(())
    }

    async fn get_session(&self) -> Result<MemorySession> {
        if !*self.state.open.read().await {
            return Err(AppError::DatabaseConnection {
                message: "database has not been started".to_string(),
            });
        }

        Ok(MemorySession {
            state: Arc::clone(&self.state),
        })
    }
}

/// Session handle over the shared in-memory store
///
/// Holds nothing that outlives the store; dropping it releases the handle.
#[derive(Clone)]
pub struct MemorySession {
    state: Arc<MemoryState>,
}

/// In-memory repository for paper records
///
/// Mirrors the SeaORM adapter's semantics, including the unique
/// constraint on `arxiv_id`.
pub struct MemoryPaperRepository<'s> {
    session: &'s MemorySession,
}

impl<'s> MemoryPaperRepository<'s> {
    /// Create a repository bound to the given session
    pub fn new(session: &'s MemorySession) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Repository for MemoryPaperRepository<'_> {
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
        let papers = self.session.state.papers.read().await;
        let found = papers.iter().find(|p| p.id == *record_id).cloned();
        metrics.finish(true);
        Ok(found)
    }

    async fn update(&self, record_id: &Uuid, data: RecordData) -> Result<Option<Paper>> {
        let metrics = QueryMetrics::start("paper_update");
        let result = self.update_paper(record_id, data).await;
        metrics.finish(result.is_ok());
        result
    }

    async fn delete(&self, record_id: &Uuid) -> Result<bool> {
        let metrics = QueryMetrics::start("paper_delete");
        let mut papers = self.session.state.papers.write().await;
        let before = papers.len();
        papers.retain(|p| p.id != *record_id);
        let removed = papers.len() < before;
        metrics.finish(true);

        tracing::debug!(paper_id = %record_id, removed, "Paper delete");
        Ok(removed)
    }

    async fn list(&self, page: Page) -> Result<Vec<Paper>> {
        let metrics = QueryMetrics::start("paper_list");
        let papers = self.session.state.papers.read().await;
        let result = papers
            .iter()
            .rev()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .cloned()
            .collect();
        metrics.finish(true);
        Ok(result)
    }
}

impl MemoryPaperRepository<'_> {
    async fn insert_paper(&self, data: RecordData) -> Result<Paper> {
        let arxiv_id = require_str(&data, "arxiv_id")?;
        let title = require_str(&data, "title")?;
        let authors = require_str(&data, "authors")?;
        let abstract_text = require_str(&data, "abstract_text")?;

        let mut papers = self.session.state.papers.write().await;

        if papers.iter().any(|p| p.arxiv_id == arxiv_id) {
            return Err(AppError::ConstraintViolation {
                message: format!("paper with arxiv_id `{}` already exists", arxiv_id),
            });
        }

        let now = chrono::Utc::now();
        let paper = Paper {
            id: Uuid::new_v4(),
            arxiv_id,
            title,
            authors,
            abstract_text,
            created_at: now.into(),
            updated_at: now.into(),
        };

        papers.push(paper.clone());
        tracing::debug!(paper_id = %paper.id, arxiv_id = %paper.arxiv_id, "Paper created");
        Ok(paper)
    }

    async fn update_paper(&self, record_id: &Uuid, data: RecordData) -> Result<Option<Paper>> {
        // Validate the whole patch before touching the record
        let arxiv_id = optional_str(&data, "arxiv_id")?;
        let title = optional_str(&data, "title")?;
        let authors = optional_str(&data, "authors")?;
        let abstract_text = optional_str(&data, "abstract_text")?;

        let mut papers = self.session.state.papers.write().await;
        let Some(index) = papers.iter().position(|p| p.id == *record_id) else {
            return Ok(None);
        };

        if let Some(ref value) = arxiv_id {
            if papers
                .iter()
                .any(|p| p.arxiv_id == *value && p.id != *record_id)
            {
                return Err(AppError::ConstraintViolation {
                    message: format!("paper with arxiv_id `{}` already exists", value),
                });
            }
        }

        let paper = &mut papers[index];
        if let Some(value) = arxiv_id {
            paper.arxiv_id = value;
        }
        if let Some(value) = title {
            paper.title = value;
        }
        if let Some(value) = authors {
            paper.authors = value;
        }
        if let Some(value) = abstract_text {
            paper.abstract_text = value;
        }
        paper.updated_at = chrono::Utc::now().into();

        tracing::debug!(paper_id = %paper.id, "Paper updated");
        Ok(Some(paper.clone()))
    }
}
