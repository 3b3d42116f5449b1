//! Projection (spec component I).
//!
//! Reads each selected column out of the (possibly joined) row, applies dotted-path
//! traversal for nested sub-fields, renders timestamps back to text, and expands a `*`
//! wildcard into the row's remaining fields. Grounded on the column-resolution and
//! qualified-wildcard (`t.*`) handling idiom in the teacher's
//! `examples/euanmacinnes-clarium/src/server/exec/select_stages/project_select.rs`.

use crate::ast::ColumnRef;
use crate::error::{DocSqlError, DocSqlResult};
use crate::exec::fetch::DOCID_FIELD;
use crate::exec::join::Row;
use crate::planner::Plan;
use crate::store::Document;
use crate::value::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

pub fn project_row(row: &Row, plan: &Plan) -> DocSqlResult<Document> {
    let mut out = Document::new();
    let mut emitted: BTreeSet<(String, String)> = BTreeSet::new();

    for col in &plan.select_columns {
        if col.is_star() {
            continue;
        }
        let alias = col.table.clone().unwrap_or_else(|| plan.default_alias.clone());
        let value = read_column(row, col, &plan.default_alias)?;
        let name = plan
            .column_name_map
            .get(&(col.table.clone(), col.column.clone()))
            .cloned()
            .unwrap_or_else(|| col.column.clone());
        out.insert(name, value.render_dates());
        emitted.insert((alias, col.column.clone()));
    }

    if plan.select_columns.iter().any(ColumnRef::is_star) {
        expand_wildcard(row, &emitted, &mut out);
    }

    Ok(out)
}

fn expand_wildcard(row: &Row, emitted: &BTreeSet<(String, String)>, out: &mut Document) {
    if row.is_empty() {
        warn!("wildcard expansion against an empty row set");
    }
    let mut entries: Vec<(String, String, Value)> = Vec::new();
    for (alias, doc) in row {
        for (key, value) in doc {
            if emitted.contains(&(alias.clone(), key.clone())) {
                continue;
            }
            entries.push((alias.clone(), key.clone(), value.clone()));
        }
    }
    entries.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));

    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    for (_, key, _) in &entries {
        *counts.entry(key.clone()).or_insert(0) += 1;
    }

    for (alias, key, value) in entries {
        let name = if counts.get(&key).copied().unwrap_or(0) > 1 { format!("{alias}_{key}") } else { key };
        out.entry(name).or_insert_with(|| value.render_dates());
    }
}

fn read_column(row: &Row, col: &ColumnRef, default_alias: &str) -> DocSqlResult<Value> {
    let alias = col.table.as_deref().unwrap_or(default_alias);
    let doc = row
        .get(alias)
        .ok_or_else(|| DocSqlError::plan("unresolved_alias".to_string(), format!("no such alias {alias}")))?;
    Ok(read_dotted(doc, &col.column))
}

/// Read a (possibly dotted) field path out of a document. A missing segment anywhere
/// along the path reads as an empty string rather than erroring (spec §4.I). Shared with
/// aggregation (`exec::aggregate::read_numeric`) so `SUM(address.age)` resolves the same
/// nested path a plain `SELECT address.age` would.
pub(crate) fn read_dotted(doc: &Document, path: &str) -> Value {
    if path == DOCID_FIELD {
        return doc.get(DOCID_FIELD).cloned().unwrap_or_else(|| Value::Str(String::new()));
    }
    let mut segments = path.split('.');
    let first = segments.next().unwrap_or(path);
    let mut current = doc.get(first).cloned();
    for seg in segments {
        current = match current {
            Some(Value::Map(m)) => m.get(seg).cloned(),
            _ => None,
        };
    }
    current.unwrap_or_else(|| Value::Str(String::new()))
}
