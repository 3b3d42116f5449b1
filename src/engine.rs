//! Top-level façade (spec §4.K's state machine: `PARSED -> PLANNED -> FETCHED ->
//! FILTERED -> (JOINED|PROJECTED) -> (AGGREGATED|WRITTEN) -> DONE`).
//!
//! `Engine::execute` is the crate's one public entry point, modeled on
//! `SQLFireQuery.execute_command`'s single dispatch in `sql_fire_query.py`, generalized
//! per spec §9/F to surface a typed parse error instead of silently returning nothing.

use crate::ast::Statement;
use crate::cancellation::CancellationToken;
use crate::error::DocSqlResult;
use crate::exec::fetch::fetch_alias;
use crate::exec::filter::matches_residual;
use crate::exec::join::{inner_equi_join, Row};
use crate::exec::project::project_row;
use crate::exec::{aggregate, write};
use crate::parser::parse_statement;
use crate::planner::{plan, Plan, PlanKind};
use crate::store::{Document, DocumentStore};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// How `Engine::describe_columns` resolves a `*` wildcard's concrete field names without
/// running the full query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WildcardSample {
    #[default]
    FirstDocument,
}

#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    pub cancellation: Option<CancellationToken>,
    pub sample_wildcard_from: WildcardSample,
}

#[derive(Debug, Clone)]
pub struct ExecOutcome {
    pub kind: PlanKind,
    pub rows: Vec<Document>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Engine;

impl Engine {
    pub fn new() -> Self {
        Engine
    }

    pub fn execute(&self, store: &dyn DocumentStore, sql: &str) -> DocSqlResult<ExecOutcome> {
        self.execute_with_options(store, sql, &ExecOptions::default())
    }

    pub fn execute_with_options(
        &self,
        store: &dyn DocumentStore,
        sql: &str,
        options: &ExecOptions,
    ) -> DocSqlResult<ExecOutcome> {
        check(options)?;
        let statement = parse_statement(sql)?;
        debug!("statement parsed");
        let p = plan(&statement)?;
        debug!(kind = ?p.kind, "statement planned");
        check(options)?;

        let rows = match &statement {
            Statement::Select(_) => self.execute_select(store, &p, options)?,
            Statement::Insert(ins) => vec![write::execute_insert(store, ins)?],
            Statement::Update(upd) => write::execute_update(store, &p, upd)?,
            Statement::Delete(del) => write::execute_delete(store, &p, del)?,
        };
        info!(kind = ?p.kind, rows = rows.len(), "statement complete");
        Ok(ExecOutcome { kind: p.kind, rows })
    }

    /// Output column names without executing the query (spec §9's `select_fields()`
    /// supplement). A `*` wildcard is resolved against one sampled document, per
    /// `options.sample_wildcard_from`.
    pub fn describe_columns(
        &self,
        store: &dyn DocumentStore,
        sql: &str,
        options: &ExecOptions,
    ) -> DocSqlResult<Vec<String>> {
        let statement = parse_statement(sql)?;
        let p = plan(&statement)?;
        let mut out = Vec::new();
        for name in p.output_fields() {
            if name == "*" {
                out.extend(self.sample_wildcard_fields(store, &p)?);
            } else {
                out.push(name);
            }
        }
        Ok(out)
    }

    fn sample_wildcard_fields(&self, store: &dyn DocumentStore, p: &Plan) -> DocSqlResult<Vec<String>> {
        let Some(collection) = p.aliases.get(&p.default_alias) else { return Ok(Vec::new()) };
        let all = store.get_all_documents(collection).map_err(|e| crate::error::DocSqlError::store(e.0))?;
        let Some((_, doc)) = all.into_iter().next() else { return Ok(Vec::new()) };
        let mut keys: Vec<String> = doc.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    fn execute_select(&self, store: &dyn DocumentStore, p: &Plan, options: &ExecOptions) -> DocSqlResult<Vec<Document>> {
        let rows = match &p.join {
            Some(j) => {
                let left_collection = p.aliases.get(&j.left_alias).cloned().unwrap_or_default();
                let right_collection = p.aliases.get(&j.right_alias).cloned().unwrap_or_default();
                let left_preds = p.predicates.get(&j.left_alias).cloned().unwrap_or_default();
                let right_preds = p.predicates.get(&j.right_alias).cloned().unwrap_or_default();

                let left_docs = fetch_alias(store, &left_collection, &left_preds)?;
                let right_docs = fetch_alias(store, &right_collection, &right_preds)?;
                check(options)?;

                let left_docs = filter_all(left_docs, &left_preds.residual)?;
                let right_docs = filter_all(right_docs, &right_preds.residual)?;
                debug!(left = left_docs.len(), right = right_docs.len(), "joining");

                inner_equi_join(&j.left_alias, left_docs, &j.left_field, &j.right_alias, right_docs, &j.right_field)
            }
            None => {
                let collection = p.aliases.get(&p.default_alias).cloned().unwrap_or_default();
                let preds = p.predicates.get(&p.default_alias).cloned().unwrap_or_default();
                let docs = fetch_alias(store, &collection, &preds)?;
                check(options)?;
                let docs = filter_all(docs, &preds.residual)?;
                docs.into_iter().map(|d| BTreeMap::from([(p.default_alias.clone(), d)])).collect::<Vec<Row>>()
            }
        };
        check(options)?;

        if p.is_aggregate {
            Ok(vec![aggregate::aggregate_rows(&rows, p)?])
        } else {
            rows.iter().map(|r| project_row(r, p)).collect()
        }
    }
}

fn filter_all(docs: Vec<Document>, residual: &[crate::ast::Expr]) -> DocSqlResult<Vec<Document>> {
    let mut out = Vec::with_capacity(docs.len());
    for doc in docs {
        if matches_residual(&doc, residual)? {
            out.push(doc);
        }
    }
    Ok(out)
}

fn check(options: &ExecOptions) -> DocSqlResult<()> {
    match &options.cancellation {
        Some(token) => token.check(),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mem_store::MemoryStore;
    use crate::value::Value;

    fn doc(pairs: &[(&str, Value)]) -> Document {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn executes_simple_select_with_pushdown_predicate() {
        let store = MemoryStore::new();
        store.seed(
            "Bookings",
            BTreeMap::from([
                ("b1".to_string(), doc(&[("status", Value::Str("open".into())), ("seats", Value::Number(2.0))])),
                ("b2".to_string(), doc(&[("status", Value::Str("closed".into()))])),
            ]),
        );
        let engine = Engine::new();
        let outcome = engine.execute(&store, r#"SELECT seats FROM Bookings WHERE status = "open""#).unwrap();
        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.rows[0].get("seats"), Some(&Value::Number(2.0)));
    }

    #[test]
    fn executes_join_and_projects_both_sides() {
        let store = MemoryStore::new();
        store.seed("Users", BTreeMap::from([("u1".to_string(), doc(&[("email", Value::Str("a@x".into()))]))]));
        store.seed(
            "Bookings",
            BTreeMap::from([("b1".to_string(), doc(&[("email", Value::Str("a@x".into())), ("seats", Value::Number(2.0))]))]),
        );
        let engine = Engine::new();
        let outcome = engine
            .execute(&store, "SELECT u.email, b.seats FROM Users u JOIN Bookings b ON u.email = b.email")
            .unwrap();
        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.rows[0].get("email"), Some(&Value::Str("a@x".into())));
        assert_eq!(outcome.rows[0].get("seats"), Some(&Value::Number(2.0)));
    }

    #[test]
    fn cancellation_token_aborts_before_fetch() {
        let store = MemoryStore::new();
        let token = CancellationToken::new();
        token.cancel();
        let engine = Engine::new();
        let options = ExecOptions { cancellation: Some(token), sample_wildcard_from: WildcardSample::FirstDocument };
        let err = engine.execute_with_options(&store, "SELECT * FROM Bookings", &options).unwrap_err();
        assert!(matches!(err, crate::error::DocSqlError::Plan { .. }));
    }

    #[test]
    fn describe_columns_resolves_wildcard_from_sample_document() {
        let store = MemoryStore::new();
        store.seed("Bookings", BTreeMap::from([("b1".to_string(), doc(&[("seats", Value::Number(2.0))]))]));
        let engine = Engine::new();
        let fields = engine.describe_columns(&store, "SELECT * FROM Bookings", &ExecOptions::default()).unwrap();
        assert_eq!(fields, vec!["seats".to_string()]);
    }

    #[test]
    fn insert_then_select_round_trips() {
        let store = MemoryStore::new();
        let engine = Engine::new();
        engine.execute(&store, r#"INSERT INTO Bookings (email, seats) VALUES ("a@x", 3)"#).unwrap();
        let outcome = engine.execute(&store, "SELECT seats FROM Bookings").unwrap();
        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.rows[0].get("seats"), Some(&Value::Number(3.0)));
    }
}
