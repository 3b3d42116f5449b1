//! Writers (spec component K).
//!
//! `INSERT` builds a document and hands it to the store directly. `UPDATE`/`DELETE`
//! target their rows the same way a `SELECT docid, * FROM table WHERE ...` would (the
//! planner seeds exactly that column list, spec §4.E), then mutate and return a
//! projection of the affected rows — post-mutation for `UPDATE`, pre-mutation for
//! `DELETE`. Grounded on `sql_fire_insert.py`/`sql_fire_update.py`/`sql_fire_delete.py`'s
//! plan-then-mutate-then-report shape.

use crate::ast::{Assignment, Delete, Insert, Update};
use crate::error::{DocSqlError, DocSqlResult};
use crate::exec::fetch::{fetch_alias, DOCID_FIELD};
use crate::exec::filter::matches_residual;
use crate::exec::join::Row;
use crate::exec::project::project_row;
use crate::planner::Plan;
use crate::store::{Document, DocumentStore};
use crate::value::Value;
use std::collections::BTreeMap;
use tracing::info;

pub fn execute_insert(store: &dyn DocumentStore, ins: &Insert) -> DocSqlResult<Document> {
    let collection = &ins.table.collection;
    let mut doc: Document = if ins.columns.len() == 1 && ins.columns[0].column == "*" {
        match ins.values.first() {
            Some(Value::Map(m)) => m.clone(),
            _ => return Err(DocSqlError::type_error("INSERT (*) expects a single mapping value")),
        }
    } else {
        if ins.columns.len() != ins.values.len() {
            return Err(DocSqlError::plan("insert_arity", "column count does not match value count"));
        }
        ins.columns.iter().zip(ins.values.iter()).map(|(c, v)| (c.column.clone(), v.clone())).collect()
    };
    doc = doc.into_iter().map(|(k, v)| (k, v.promote_dates())).collect();

    let doc_id = store.generate_document_id(collection).map_err(|e| DocSqlError::store(e.0))?;
    store.set_document(collection, &doc_id, &doc).map_err(|e| DocSqlError::store(e.0))?;
    info!(collection, doc_id = %doc_id, "inserted document");

    let mut out = doc;
    out.insert(DOCID_FIELD.to_string(), Value::Str(doc_id));
    Ok(out.into_iter().map(|(k, v)| (k, v.render_dates())).collect())
}

pub fn execute_update(store: &dyn DocumentStore, plan: &Plan, upd: &Update) -> DocSqlResult<Vec<Document>> {
    let alias = &plan.default_alias;
    let collection = plan
        .aliases
        .get(alias)
        .ok_or_else(|| DocSqlError::plan("unresolved_alias", "no such alias"))?;
    let preds = plan.predicates.get(alias).cloned().unwrap_or_default();
    let fetched = fetch_alias(store, collection, &preds)?;

    let mut out = Vec::new();
    for doc in fetched {
        if !matches_residual(&doc, &preds.residual)? {
            continue;
        }
        let doc_id = match doc.get(DOCID_FIELD) {
            Some(Value::Str(id)) => id.clone(),
            _ => continue,
        };
        let partial = build_partial(&upd.sets);
        store.update_document(collection, &doc_id, &partial).map_err(|e| DocSqlError::store(e.0))?;
        info!(collection, doc_id = %doc_id, "updated document");

        let mut merged = doc.clone();
        for (k, v) in &partial {
            merged.insert(k.clone(), v.clone());
        }
        let row: Row = BTreeMap::from([(alias.clone(), merged)]);
        out.push(project_row(&row, plan)?);
    }
    Ok(out)
}

pub fn execute_delete(store: &dyn DocumentStore, plan: &Plan, del: &Delete) -> DocSqlResult<Vec<Document>> {
    let _ = del;
    let alias = &plan.default_alias;
    let collection = plan
        .aliases
        .get(alias)
        .ok_or_else(|| DocSqlError::plan("unresolved_alias", "no such alias"))?;
    let preds = plan.predicates.get(alias).cloned().unwrap_or_default();
    let fetched = fetch_alias(store, collection, &preds)?;

    let mut out = Vec::new();
    for doc in fetched {
        if !matches_residual(&doc, &preds.residual)? {
            continue;
        }
        let doc_id = match doc.get(DOCID_FIELD) {
            Some(Value::Str(id)) => id.clone(),
            _ => continue,
        };
        let row: Row = BTreeMap::from([(alias.clone(), doc.clone())]);
        let projected = project_row(&row, plan)?;
        store.delete_document(collection, &doc_id).map_err(|e| DocSqlError::store(e.0))?;
        info!(collection, doc_id = %doc_id, "deleted document");
        out.push(projected);
    }
    Ok(out)
}

fn build_partial(sets: &[Assignment]) -> Document {
    sets.iter().map(|a| (a.column.clone(), a.value.clone().promote_dates())).collect()
}
