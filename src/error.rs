//! Unified error model for the query compilation and execution pipeline.
//! Mirrors the kinds named in spec §7: Parse, Plan, Store, Type, NotFound.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocSqlError {
    Parse { message: String, offset: Option<usize> },
    Plan { code: String, message: String },
    Store { message: String },
    Type { message: String },
    NotFound { collection: String, doc_id: String },
}

impl DocSqlError {
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        DocSqlError::Parse { message: msg.into(), offset: None }
    }

    pub fn parse_at<S: Into<String>>(msg: S, offset: usize) -> Self {
        DocSqlError::Parse { message: msg.into(), offset: Some(offset) }
    }

    pub fn plan<S: Into<String>>(code: S, msg: S) -> Self {
        DocSqlError::Plan { code: code.into(), message: msg.into() }
    }

    pub fn store<S: Into<String>>(msg: S) -> Self {
        DocSqlError::Store { message: msg.into() }
    }

    pub fn type_error<S: Into<String>>(msg: S) -> Self {
        DocSqlError::Type { message: msg.into() }
    }

    pub fn not_found<S: Into<String>>(collection: S, doc_id: S) -> Self {
        DocSqlError::NotFound { collection: collection.into(), doc_id: doc_id.into() }
    }

    pub fn message(&self) -> String {
        match self {
            DocSqlError::Parse { message, .. } => message.clone(),
            DocSqlError::Plan { message, .. } => message.clone(),
            DocSqlError::Store { message } => message.clone(),
            DocSqlError::Type { message } => message.clone(),
            DocSqlError::NotFound { collection, doc_id } => {
                format!("document {doc_id} not found in {collection}")
            }
        }
    }
}

impl Display for DocSqlError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DocSqlError::Parse { offset: Some(off), .. } => {
                write!(f, "parse error at offset {off}: {}", self.message())
            }
            _ => write!(f, "{}", self.message()),
        }
    }
}

impl std::error::Error for DocSqlError {}

pub type DocSqlResult<T> = Result<T, DocSqlError>;

impl From<anyhow::Error> for DocSqlError {
    fn from(err: anyhow::Error) -> Self {
        DocSqlError::store(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_round_trip_message() {
        assert_eq!(DocSqlError::parse("bad token").message(), "bad token");
        assert_eq!(
            DocSqlError::plan("unresolved_alias", "no such alias b").message(),
            "no such alias b"
        );
        assert_eq!(DocSqlError::store("timeout").message(), "timeout");
        assert_eq!(DocSqlError::type_error("expected list").message(), "expected list");
    }

    #[test]
    fn not_found_message_names_collection_and_id() {
        let err = DocSqlError::not_found("Bookings", "abc123");
        assert_eq!(err.message(), "document abc123 not found in Bookings");
    }

    #[test]
    fn parse_error_display_includes_offset() {
        let err = DocSqlError::parse_at("unexpected token", 12);
        assert_eq!(err.to_string(), "parse error at offset 12: unexpected token");
    }
}
