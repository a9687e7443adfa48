//! Request and response schemas for the ask/answer endpoint
//!
//! Payloads are validated once, at construction from untrusted input.
//! All fields are mandatory strings; unknown fields are ignored.

use crate::db::models::Paper;
use crate::errors::{AppError, Result};
use crate::metrics::record_schema_rejection;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request schema for asking questions about papers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskRequest {
    /// Questions to ask about arXiv papers
    pub questions: String,
}

impl AskRequest {
    /// Construct from an untrusted JSON value
    pub fn from_value(value: Value) -> Result<Self> {
        parse("AskRequest", value)
    }

    /// Construct from an untrusted JSON document
    pub fn from_json(raw: &str) -> Result<Self> {
        parse_str("AskRequest", raw)
    }
}

/// Paper source information attached to an answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperSource {
    /// arXiv paper ID
    pub arxiv_id: String,

    /// Paper title
    pub title: String,

    /// Paper authors, as one string
    pub authors: String,

    /// Preview of the paper abstract
    pub abstract_preview: String,
}

impl PaperSource {
    /// Project a stored paper into a source entry, truncating the abstract
    pub fn from_paper(paper: &Paper, preview_chars: usize) -> Self {
        Self {
            arxiv_id: paper.arxiv_id.clone(),
            title: paper.title.clone(),
            authors: paper.authors.clone(),
            abstract_preview: preview(&paper.abstract_text, preview_chars),
        }
    }
}

/// Response schema for question answering endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskResponse {
    /// Answer to the question
    pub answer: String,

    /// Source papers used for the answer, in ranking order
    pub sources: Vec<PaperSource>,
}

impl AskResponse {
    pub fn new(answer: String, sources: Vec<PaperSource>) -> Self {
        Self { answer, sources }
    }

    /// Construct from an untrusted JSON value
    pub fn from_value(value: Value) -> Result<Self> {
        parse("AskResponse", value)
    }

    /// Construct from an untrusted JSON document
    pub fn from_json(raw: &str) -> Result<Self> {
        parse_str("AskResponse", raw)
    }
}

/// Truncate text on a char boundary, appending an ellipsis when cut
fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}

fn parse<T: DeserializeOwned>(schema: &'static str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| reject(schema, e))
}

fn parse_str<T: DeserializeOwned>(schema: &'static str, raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|e| reject(schema, e))
}

fn reject(schema: &'static str, err: serde_json::Error) -> AppError {
    record_schema_rejection(schema);
    AppError::Validation {
        message: format!("{} rejected: {}", schema, err),
        field: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn attention_paper() -> Paper {
        let now = chrono::Utc::now();
        Paper {
            id: Uuid::new_v4(),
            arxiv_id: "1706.03762".into(),
            title: "Attention Is All You Need".into(),
            authors: "Vaswani et al.".into(),
            abstract_text: "The dominant sequence transduction models are based on complex \
                            recurrent or convolutional neural networks."
                .into(),
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[test]
    fn test_valid_request_preserves_questions() {
        let request =
            AskRequest::from_value(json!({"questions": "What is attention?"})).unwrap();
        assert_eq!(request.questions, "What is attention?");
    }

    #[test]
    fn test_request_missing_questions_rejected() {
        let err = AskRequest::from_value(json!({})).unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn test_request_non_string_questions_rejected() {
        let err = AskRequest::from_value(json!({"questions": 42})).unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn test_request_ignores_unknown_fields() {
        let request =
            AskRequest::from_json(r#"{"questions": "What is attention?", "extra": true}"#)
                .unwrap();
        assert_eq!(request.questions, "What is attention?");
    }

    #[test]
    fn test_response_with_one_source() {
        let response = AskResponse::from_json(
            r#"{
                "answer": "It's a mechanism.",
                "sources": [{
                    "arxiv_id": "1706.03762",
                    "title": "Attention Is All You Need",
                    "authors": "Vaswani et al.",
                    "abstract_preview": "..."
                }]
            }"#,
        )
        .unwrap();

        assert_eq!(response.answer, "It's a mechanism.");
        assert_eq!(response.sources.len(), 1);
        assert_eq!(response.sources[0].arxiv_id, "1706.03762");
    }

    #[test]
    fn test_response_empty_sources_is_valid() {
        let response =
            AskResponse::from_value(json!({"answer": "No papers matched.", "sources": []}))
                .unwrap();
        assert!(response.sources.is_empty());
    }

    #[test]
    fn test_response_preserves_source_order_and_count() {
        let sources: Vec<Value> = (0..4)
            .map(|i| {
                json!({
                    "arxiv_id": format!("2401.0000{}", i),
                    "title": format!("Paper {}", i),
                    "authors": "Doe et al.",
                    "abstract_preview": "..."
                })
            })
            .collect();

        let response =
            AskResponse::from_value(json!({"answer": "See below.", "sources": sources}))
                .unwrap();

        assert_eq!(response.sources.len(), 4);
        for (i, source) in response.sources.iter().enumerate() {
            assert_eq!(source.title, format!("Paper {}", i));
        }
    }

    #[test]
    fn test_source_missing_field_rejects_response() {
        let err = AskResponse::from_value(json!({
            "answer": "It's a mechanism.",
            "sources": [{
                "arxiv_id": "1706.03762",
                "title": "Attention Is All You Need",
                "authors": "Vaswani et al."
            }]
        }))
        .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn test_response_non_string_answer_rejected() {
        let err =
            AskResponse::from_value(json!({"answer": 7, "sources": []})).unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn test_from_paper_projection() {
        let paper = attention_paper();
        let source = PaperSource::from_paper(&paper, 200);

        assert_eq!(source.arxiv_id, paper.arxiv_id);
        assert_eq!(source.title, paper.title);
        assert_eq!(source.authors, paper.authors);
        assert_eq!(source.abstract_preview, paper.abstract_text);
    }

    #[test]
    fn test_from_paper_truncates_long_abstract() {
        let paper = attention_paper();
        let source = PaperSource::from_paper(&paper, 20);

        assert!(source.abstract_preview.ends_with("..."));
        assert_eq!(source.abstract_preview.chars().count(), 23);
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        let truncated = preview("héllo wörld, this is ünicode", 5);
        assert_eq!(truncated, "héllo...");
    }

    #[test]
    fn test_response_round_trips_through_wire_format() {
        let paper = attention_paper();
        let response = AskResponse::new(
            "It's a mechanism.".into(),
            vec![PaperSource::from_paper(&paper, 200)],
        );

        let wire = serde_json::to_value(&response).unwrap();
        assert_eq!(wire["answer"], "It's a mechanism.");
        assert_eq!(wire["sources"][0]["arxiv_id"], "1706.03762");

        let parsed = AskResponse::from_value(wire).unwrap();
        assert_eq!(parsed, response);
    }
}
