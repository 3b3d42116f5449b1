//! The narrow store interface the core consumes (spec §6.2).
//!
//! Everything about the real document store — connection, authentication, document-id
//! generation strategy, transport — is an external collaborator (spec §1); the core only
//! ever talks to it through this trait.

use crate::ast::BinOp;
use crate::value::Value;
use std::collections::BTreeMap;

/// A document is a mapping from field name to value; it may nest arbitrarily via
/// `Value::Map`/`Value::List`. The `docid` key is never present in a document body —
/// it is injected by projection from the map key the store returns it under.
pub type Document = BTreeMap<String, Value>;

/// The right-hand side of a pushdown predicate: either a single value (`==`, `>`, ...)
/// or a list (`in`, `not_in`, `array_contains_any`).
#[derive(Debug, Clone, PartialEq)]
pub enum PredicateValue {
    Single(Value),
    List(Vec<Value>),
}

/// One `(field, op, value)` tuple the predicate splitter has judged pushdown-eligible
/// (spec §4.D). `op` is always one drawn from `BinOp::is_pushdown_eligible`.
#[derive(Debug, Clone, PartialEq)]
pub struct PushdownPredicate {
    pub field: String,
    pub op: BinOp,
    pub value: PredicateValue,
}

/// Store-side failure surface. Kept opaque (a message) to the core; a real adapter
/// should map its own transport/permission errors into this before returning.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct StoreError(pub String);

impl StoreError {
    pub fn new(msg: impl Into<String>) -> Self {
        StoreError(msg.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The narrow interface consumed by the store executor (component F) and writers
/// (component K). Implementations must be safe for sequential reuse across calls within
/// one statement; the core holds no locks of its own (spec §5).
pub trait DocumentStore {
    /// Full scan of a collection.
    fn get_all_documents(&self, collection: &str) -> StoreResult<BTreeMap<String, Document>>;

    /// Query with a conjunction of pushdown predicates. Must support at least
    /// `==, !=, <, <=, >, >=, in, not_in, array_contains, array_contains_any`.
    fn query_by_tuples(
        &self,
        collection: &str,
        predicates: &[PushdownPredicate],
    ) -> StoreResult<BTreeMap<String, Document>>;

    /// Fetch a single document by id. Returns `Ok(None)` if absent (the core turns that
    /// into `DocSqlError::NotFound` at the call site that required the document to
    /// exist, or an empty result set for a plain `docid == X` select).
    fn get_document(&self, collection: &str, doc_id: &str) -> StoreResult<Option<Document>>;

    fn generate_document_id(&self, collection: &str) -> StoreResult<String>;

    fn set_document(&self, collection: &str, doc_id: &str, document: &Document) -> StoreResult<()>;

    /// Field-merge update: keys present in `partial` are written, unspecified fields are
    /// preserved by the store.
    fn update_document(&self, collection: &str, doc_id: &str, partial: &Document) -> StoreResult<()>;

    fn delete_document(&self, collection: &str, doc_id: &str) -> StoreResult<()>;
}
