//! A reference in-memory `DocumentStore`, shipped for tests and for callers who want a
//! drop-in store without wiring a real backend immediately.
//!
//! Grounded on `examples/euanmacinnes-clarium/src/storage/kv.rs`'s in-memory,
//! lock-guarded map idiom (`Arc<parking_lot::RwLock<HashMap<...>>>`) — simplified down to
//! document semantics, without that module's TTL/Parquet/persistence machinery, which has
//! no counterpart here.

use crate::ast::BinOp;
use crate::store::{Document, DocumentStore, PredicateValue, PushdownPredicate, StoreError, StoreResult};
use crate::value::Value;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<BTreeMap<String, BTreeMap<String, Document>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Seed a collection with pre-built documents, as tests typically want.
    pub fn seed(&self, collection: &str, docs: BTreeMap<String, Document>) {
        self.collections.write().insert(collection.to_string(), docs);
    }

    fn matches(doc: &Document, pred: &PushdownPredicate) -> bool {
        let Some(field_value) = doc.get(&pred.field) else { return false };
        match (&pred.op, &pred.value) {
            (BinOp::Eq, PredicateValue::Single(v)) => field_value.structurally_eq(v),
            (BinOp::Ne, PredicateValue::Single(v)) => !field_value.structurally_eq(v),
            (BinOp::Gt, PredicateValue::Single(v)) => numeric_cmp(field_value, v).map(|o| o.is_gt()).unwrap_or(false),
            (BinOp::Lt, PredicateValue::Single(v)) => numeric_cmp(field_value, v).map(|o| o.is_lt()).unwrap_or(false),
            (BinOp::Ge, PredicateValue::Single(v)) => numeric_cmp(field_value, v).map(|o| o.is_ge()).unwrap_or(false),
            (BinOp::Le, PredicateValue::Single(v)) => numeric_cmp(field_value, v).map(|o| o.is_le()).unwrap_or(false),
            (BinOp::In, PredicateValue::List(values)) => values.iter().any(|v| field_value.structurally_eq(v)),
            (BinOp::NotIn, PredicateValue::List(values)) => !values.iter().any(|v| field_value.structurally_eq(v)),
            (BinOp::ArrayContains, PredicateValue::Single(v)) => match field_value {
                Value::List(items) => items.iter().any(|item| item.structurally_eq(v)),
                _ => false,
            },
            (BinOp::ArrayContainsAny, PredicateValue::List(values)) => match field_value {
                Value::List(items) => items.iter().any(|item| values.iter().any(|v| item.structurally_eq(v))),
                _ => false,
            },
            _ => false,
        }
    }
}

fn numeric_cmp(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.partial_cmp(y),
        (Value::Timestamp(x), Value::Timestamp(y)) => Some(x.cmp(y)),
        (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

impl DocumentStore for MemoryStore {
    fn get_all_documents(&self, collection: &str) -> StoreResult<BTreeMap<String, Document>> {
        Ok(self.collections.read().get(collection).cloned().unwrap_or_default())
    }

    fn query_by_tuples(
        &self,
        collection: &str,
        predicates: &[PushdownPredicate],
    ) -> StoreResult<BTreeMap<String, Document>> {
        let all = self.get_all_documents(collection)?;
        Ok(all
            .into_iter()
            .filter(|(_, doc)| predicates.iter().all(|p| Self::matches(doc, p)))
            .collect())
    }

    fn get_document(&self, collection: &str, doc_id: &str) -> StoreResult<Option<Document>> {
        Ok(self.collections.read().get(collection).and_then(|c| c.get(doc_id).cloned()))
    }

    fn generate_document_id(&self, _collection: &str) -> StoreResult<String> {
        Ok(uuid::Uuid::new_v4().to_string())
    }

    fn set_document(&self, collection: &str, doc_id: &str, document: &Document) -> StoreResult<()> {
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .insert(doc_id.to_string(), document.clone());
        Ok(())
    }

    fn update_document(&self, collection: &str, doc_id: &str, partial: &Document) -> StoreResult<()> {
        let mut guard = self.collections.write();
        let coll = guard.entry(collection.to_string()).or_default();
        let entry = coll
            .get_mut(doc_id)
            .ok_or_else(|| StoreError::new(format!("document {doc_id} not found in {collection}")))?;
        for (k, v) in partial {
            entry.insert(k.clone(), v.clone());
        }
        Ok(())
    }

    fn delete_document(&self, collection: &str, doc_id: &str) -> StoreResult<()> {
        self.collections.write().entry(collection.to_string()).or_default().remove(doc_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(pairs: &[(&str, Value)]) -> Document {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn full_scan_returns_seeded_documents() {
        let store = MemoryStore::new();
        store.seed("U", BTreeMap::from([("u1".to_string(), doc(&[("name", Value::Str("A".into()))]))]));
        let all = store.get_all_documents("U").unwrap();
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn query_by_tuples_filters_equality() {
        let store = MemoryStore::new();
        store.seed(
            "U",
            BTreeMap::from([
                ("u1".to_string(), doc(&[("name", Value::Str("A".into()))])),
                ("u2".to_string(), doc(&[("name", Value::Str("B".into()))])),
            ]),
        );
        let pred = PushdownPredicate {
            field: "name".to_string(),
            op: BinOp::Eq,
            value: PredicateValue::Single(Value::Str("A".into())),
        };
        let matched = store.query_by_tuples("U", &[pred]).unwrap();
        assert_eq!(matched.len(), 1);
        assert!(matched.contains_key("u1"));
    }

    #[test]
    fn update_merges_and_preserves_untouched_fields() {
        let store = MemoryStore::new();
        store.seed(
            "U",
            BTreeMap::from([("u1".to_string(), doc(&[("name", Value::Str("A".into())), ("age", Value::Number(1.0))]))]),
        );
        store.update_document("U", "u1", &doc(&[("age", Value::Number(2.0))])).unwrap();
        let updated = store.get_document("U", "u1").unwrap().unwrap();
        assert_eq!(updated.get("name"), Some(&Value::Str("A".into())));
        assert_eq!(updated.get("age"), Some(&Value::Number(2.0)));
    }

    #[test]
    fn delete_removes_document() {
        let store = MemoryStore::new();
        store.seed("U", BTreeMap::from([("u1".to_string(), doc(&[("name", Value::Str("A".into()))]))]));
        store.delete_document("U", "u1").unwrap();
        assert!(store.get_document("U", "u1").unwrap().is_none());
    }
}
