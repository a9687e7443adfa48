//! AskArxiv Core Library
//!
//! Shared code for the AskArxiv question-answering service:
//! - Database lifecycle and repository contracts
//! - SeaORM and in-memory adapters
//! - Ask/answer wire schemas
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod observability;
pub mod schemas;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::{Database, MemoryDatabase, Page, PaperRepository, RecordData, Repository};
pub use errors::{AppError, Result};
pub use schemas::{AskRequest, AskResponse, PaperSource};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default number of abstract characters in a paper source preview
pub const DEFAULT_ABSTRACT_PREVIEW_CHARS: usize = 200;
