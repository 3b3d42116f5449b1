//! Store executor (spec component F).
//!
//! Turns each alias's split predicates into store calls, and implements the `docid`
//! short-circuit adapter behavior from spec §6.2: an equality or membership test on the
//! synthetic `docid` column is served by `get_document` rather than a full scan. Any other
//! pushdown predicate on that alias is dropped outright once `docid` fires — the store
//! never sees a `docid` tuple (it doesn't know the column), and per spec §6.2 those other
//! predicates are "ignored by design", not re-applied in-process.

use crate::ast::BinOp;
use crate::error::{DocSqlError, DocSqlResult};
use crate::predicate::AliasPredicates;
use crate::store::{Document, DocumentStore, PredicateValue, PushdownPredicate};
use crate::value::Value;
use tracing::debug;

pub const DOCID_FIELD: &str = "docid";

/// Fetch the documents for one alias, honoring the `docid` short-circuit and injecting
/// the synthetic `docid` field into each returned document.
pub fn fetch_alias(
    store: &dyn DocumentStore,
    collection: &str,
    preds: &AliasPredicates,
) -> DocSqlResult<Vec<Document>> {
    let docid_pred = preds.pushdown.iter().find(|p| p.field == DOCID_FIELD);
    let rest: Vec<&PushdownPredicate> = preds.pushdown.iter().filter(|p| p.field != DOCID_FIELD).collect();

    let mut docs: Vec<(String, Document)> = match docid_pred {
        Some(PushdownPredicate { op: BinOp::Eq, value: PredicateValue::Single(Value::Str(id)), .. }) => {
            debug!(collection, doc_id = %id, "docid short-circuit: get_document");
            match store.get_document(collection, id).map_err(|e| DocSqlError::store(e.0))? {
                Some(doc) => vec![(id.clone(), doc)],
                None => vec![],
            }
        }
        Some(PushdownPredicate { op: BinOp::In, value: PredicateValue::List(ids), .. }) => {
            debug!(collection, count = ids.len(), "docid short-circuit: get_document per id");
            let mut out = Vec::new();
            for id in ids {
                if let Value::Str(id) = id {
                    if let Some(doc) = store.get_document(collection, id).map_err(|e| DocSqlError::store(e.0))? {
                        out.push((id.clone(), doc));
                    }
                } else {
                    return Err(DocSqlError::type_error("docid values must be strings"));
                }
            }
            out
        }
        Some(_) => {
            return Err(DocSqlError::plan(
                "unsupported_docid_predicate",
                "docid only supports '=' and 'in' comparisons",
            ))
        }
        None => {
            let all = if rest.is_empty() {
                debug!(collection, "full collection scan");
                store.get_all_documents(collection).map_err(|e| DocSqlError::store(e.0))?
            } else {
                debug!(collection, predicates = rest.len(), "pushdown query_by_tuples");
                let owned: Vec<PushdownPredicate> = rest.iter().map(|p| (*p).clone()).collect();
                store.query_by_tuples(collection, &owned).map_err(|e| DocSqlError::store(e.0))?
            };
            all.into_iter().collect()
        }
    };

    Ok(docs
        .into_iter()
        .map(|(id, mut doc)| {
            doc.insert(DOCID_FIELD.to_string(), Value::Str(id));
            doc
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mem_store::MemoryStore;
    use crate::predicate::AliasPredicates;
    use std::collections::BTreeMap;

    fn doc(pairs: &[(&str, Value)]) -> Document {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn full_scan_injects_docid() {
        let store = MemoryStore::new();
        store.seed("U", BTreeMap::from([("u1".to_string(), doc(&[("name", Value::Str("A".into()))]))]));
        let docs = fetch_alias(&store, "U", &AliasPredicates::default()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].get("docid"), Some(&Value::Str("u1".to_string())));
    }

    #[test]
    fn docid_eq_short_circuits_to_get_document() {
        let store = MemoryStore::new();
        store.seed(
            "U",
            BTreeMap::from([
                ("u1".to_string(), doc(&[("name", Value::Str("A".into()))])),
                ("u2".to_string(), doc(&[("name", Value::Str("B".into()))])),
            ]),
        );
        let preds = AliasPredicates {
            pushdown: vec![PushdownPredicate {
                field: "docid".into(),
                op: BinOp::Eq,
                value: PredicateValue::Single(Value::Str("u1".into())),
            }],
            residual: vec![],
        };
        let docs = fetch_alias(&store, "U", &preds).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].get("docid"), Some(&Value::Str("u1".to_string())));
    }

    #[test]
    fn docid_in_list_short_circuits_to_multiple_get_document_calls() {
        let store = MemoryStore::new();
        store.seed(
            "U",
            BTreeMap::from([
                ("u1".to_string(), doc(&[("name", Value::Str("A".into()))])),
                ("u2".to_string(), doc(&[("name", Value::Str("B".into()))])),
                ("u3".to_string(), doc(&[("name", Value::Str("C".into()))])),
            ]),
        );
        let preds = AliasPredicates {
            pushdown: vec![PushdownPredicate {
                field: "docid".into(),
                op: BinOp::In,
                value: PredicateValue::List(vec![Value::Str("u1".into()), Value::Str("u3".into())]),
            }],
            residual: vec![],
        };
        let docs = fetch_alias(&store, "U", &preds).unwrap();
        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn docid_short_circuit_ignores_other_pushdown_predicates_on_the_same_alias() {
        let store = MemoryStore::new();
        store.seed("U", BTreeMap::from([("u1".to_string(), doc(&[("name", Value::Str("A".into()))]))]));
        let preds = AliasPredicates {
            pushdown: vec![
                PushdownPredicate {
                    field: "docid".into(),
                    op: BinOp::Eq,
                    value: PredicateValue::Single(Value::Str("u1".into())),
                },
                // Conflicts with the stored document but must be ignored once docid short-circuits.
                PushdownPredicate {
                    field: "name".into(),
                    op: BinOp::Eq,
                    value: PredicateValue::Single(Value::Str("B".into())),
                },
            ],
            residual: vec![],
        };
        let docs = fetch_alias(&store, "U", &preds).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].get("name"), Some(&Value::Str("A".to_string())));
    }
}
