//! Service-boundary schemas

pub mod ask;

pub use ask::{AskRequest, AskResponse, PaperSource};
