//! Query planner (spec component E).
//!
//! Resolves aliases, extracts the single supported join (if any), runs the predicate
//! splitter per alias, and builds the output column name map. Modeled on
//! `SQLFireQuery`'s plan-state object in `sql_fire_query.py` (`collections`, `aliases`,
//! `collectionFields`, `aggregationFields`, `columnNameMap`, `on`, `defaultPart`), folded
//! into one `Plan` struct the way the teacher's own `Query` struct in
//! `examples/euanmacinnes-clarium/src/query.rs` carries every resolved clause
//! (`select`, `where_clause`, `joins`, `group_by_cols`, `order_by`, ...) as fields on a
//! single parse-and-plan-carrying type rather than several loosely related maps.

use crate::ast::{ColumnRef, Delete, FromClause, Insert, Statement, Update};
use crate::error::DocSqlError;
use crate::predicate::{split_predicates, AliasPredicates};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanKind {
    Select,
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinPlan {
    pub left_alias: String,
    pub left_field: String,
    pub right_alias: String,
    pub right_field: String,
}

#[derive(Debug, Clone)]
pub struct Plan {
    pub kind: PlanKind,
    /// alias -> collection name.
    pub aliases: BTreeMap<String, String>,
    pub default_alias: String,
    pub join: Option<JoinPlan>,
    pub predicates: BTreeMap<String, AliasPredicates>,
    pub select_columns: Vec<ColumnRef>,
    pub is_aggregate: bool,
    /// `(alias-or-None, column)` -> rendered output name, after suffix disambiguation.
    pub column_name_map: BTreeMap<(Option<String>, String), String>,
    pub insert: Option<Insert>,
    pub update: Option<Update>,
    pub delete: Option<Delete>,
}

impl Plan {
    /// Output column names in select order, without executing anything (spec §9's
    /// `select_fields()` supplement).
    pub fn output_fields(&self) -> Vec<String> {
        self.select_columns
            .iter()
            .map(|c| {
                if c.is_star() {
                    "*".to_string()
                } else {
                    self.column_name_map
                        .get(&(c.table.clone(), c.column.clone()))
                        .cloned()
                        .unwrap_or_else(|| c.column.clone())
                }
            })
            .collect()
    }
}

pub fn plan(statement: &Statement) -> Result<Plan, DocSqlError> {
    match statement {
        Statement::Select(sel) => plan_select(sel),
        Statement::Insert(ins) => Ok(Plan {
            kind: PlanKind::Insert,
            aliases: BTreeMap::from([(ins.table.alias_or_collection().to_string(), ins.table.collection.clone())]),
            default_alias: ins.table.alias_or_collection().to_string(),
            join: None,
            predicates: BTreeMap::new(),
            select_columns: Vec::new(),
            is_aggregate: false,
            column_name_map: BTreeMap::new(),
            insert: Some(ins.clone()),
            update: None,
            delete: None,
        }),
        Statement::Update(upd) => plan_update(upd),
        Statement::Delete(del) => plan_delete(del),
    }
}

fn plan_select(sel: &crate::ast::Select) -> Result<Plan, DocSqlError> {
    let (aliases, join_hint) = resolve_from_aliases(&sel.from)?;
    let default_alias = sel.from.first_alias().to_string();

    let mut split = split_predicates(sel.where_clause.as_ref(), &default_alias)?;

    let join = match join_hint {
        Some(j) => Some(j),
        None => split.join_condition.take().map(|(a, b)| JoinPlan {
            left_alias: a.table.unwrap_or_default(),
            left_field: a.column,
            right_alias: b.table.unwrap_or_default(),
            right_field: b.column,
        }),
    };

    if aliases.len() > 1 && join.is_none() {
        return Err(DocSqlError::plan(
            "missing_join_condition",
            "multiple collections in FROM require an equality join condition",
        ));
    }

    validate_aggregate_mix(&sel.columns)?;
    let is_aggregate = sel.columns.iter().any(|c| c.agg_func.is_some());
    let column_name_map = build_column_name_map(&sel.columns, &default_alias);

    Ok(Plan {
        kind: PlanKind::Select,
        aliases,
        default_alias,
        join,
        predicates: split.by_alias,
        select_columns: sel.columns.clone(),
        is_aggregate,
        column_name_map,
        insert: None,
        update: None,
        delete: None,
    })
}

fn plan_update(upd: &Update) -> Result<Plan, DocSqlError> {
    let alias = upd.table.alias_or_collection().to_string();
    let split = split_predicates(upd.where_clause.as_ref(), &alias)?;
    let seed_columns = seed_star_columns();
    let column_name_map = build_column_name_map(&seed_columns, &alias);
    Ok(Plan {
        kind: PlanKind::Update,
        aliases: BTreeMap::from([(alias.clone(), upd.table.collection.clone())]),
        default_alias: alias,
        join: None,
        predicates: split.by_alias,
        select_columns: seed_columns,
        is_aggregate: false,
        column_name_map,
        insert: None,
        update: Some(upd.clone()),
        delete: None,
    })
}

fn plan_delete(del: &Delete) -> Result<Plan, DocSqlError> {
    let alias = del.table.alias_or_collection().to_string();
    let split = split_predicates(del.where_clause.as_ref(), &alias)?;
    let seed_columns = seed_star_columns();
    let column_name_map = build_column_name_map(&seed_columns, &alias);
    Ok(Plan {
        kind: PlanKind::Delete,
        aliases: BTreeMap::from([(alias.clone(), del.table.collection.clone())]),
        default_alias: alias,
        join: None,
        predicates: split.by_alias,
        select_columns: seed_columns,
        is_aggregate: false,
        column_name_map,
        insert: None,
        update: None,
        delete: Some(del.clone()),
    })
}

/// UPDATE/DELETE plan with `docid` and `*`, so writers can re-project the affected rows
/// after the mutation (spec §4.E).
fn seed_star_columns() -> Vec<ColumnRef> {
    vec![ColumnRef::new(None, "docid"), ColumnRef::new(None, "*")]
}

fn resolve_from_aliases(from: &FromClause) -> Result<(BTreeMap<String, String>, Option<JoinPlan>), DocSqlError> {
    match from {
        FromClause::List(specs) => {
            let mut aliases = BTreeMap::new();
            for spec in specs {
                aliases.insert(spec.alias_or_collection().to_string(), spec.collection.clone());
            }
            Ok((aliases, None))
        }
        FromClause::Join(j) => {
            let mut aliases = BTreeMap::new();
            aliases.insert(j.left.alias_or_collection().to_string(), j.left.collection.clone());
            aliases.insert(j.right.alias_or_collection().to_string(), j.right.collection.clone());
            let (left_col, right_col) = match &j.on {
                crate::ast::Expr::Binary { op: crate::ast::BinOp::Eq, left, right } => {
                    match (left.as_ref(), right.as_ref()) {
                        (crate::ast::Expr::Column(a), crate::ast::Expr::Column(b)) => (a.clone(), b.clone()),
                        _ => return Err(DocSqlError::plan("unsupported_join", "JOIN ON must compare two columns")),
                    }
                }
                _ => return Err(DocSqlError::plan("unsupported_join", "JOIN ON must be a single equality")),
            };
            let join = JoinPlan {
                left_alias: left_col.table.unwrap_or_else(|| j.left.alias_or_collection().to_string()),
                left_field: left_col.column,
                right_alias: right_col.table.unwrap_or_else(|| j.right.alias_or_collection().to_string()),
                right_field: right_col.column,
            };
            Ok((aliases, Some(join)))
        }
    }
}

fn validate_aggregate_mix(columns: &[ColumnRef]) -> Result<(), DocSqlError> {
    let agg = columns.iter().filter(|c| c.agg_func.is_some()).count();
    if agg > 0 && agg != columns.len() {
        return Err(DocSqlError::plan(
            "mixed_aggregation",
            "cannot mix aggregate and non-aggregate columns without GROUP BY",
        ));
    }
    Ok(())
}

/// First pass assigns each column its bare name (or `func(column)` for an aggregate);
/// any bare name shared by columns from different aliases is disambiguated in a second
/// pass by renaming both (all) to `aliasAsWritten_column` (spec §4.E).
fn build_column_name_map(columns: &[ColumnRef], default_alias: &str) -> BTreeMap<(Option<String>, String), String> {
    let mut base_names: BTreeMap<(Option<String>, String), String> = BTreeMap::new();
    let mut counts: BTreeMap<String, u32> = BTreeMap::new();

    for c in columns {
        if c.is_star() {
            continue;
        }
        let base = match c.agg_func {
            Some(f) => format!("{}({})", f.name(), c.column),
            None => c.column.clone(),
        };
        *counts.entry(base.clone()).or_insert(0) += 1;
        base_names.insert((c.table.clone(), c.column.clone()), base);
    }

    let mut out = BTreeMap::new();
    for c in columns {
        if c.is_star() {
            continue;
        }
        let key = (c.table.clone(), c.column.clone());
        let base = base_names.get(&key).cloned().unwrap_or_else(|| c.column.clone());
        let final_name = if counts.get(&base).copied().unwrap_or(0) > 1 {
            format!("{}_{base}", c.table.as_deref().unwrap_or(default_alias))
        } else {
            base
        };
        out.insert(key, final_name);
    }
    out
}
