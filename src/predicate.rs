//! Predicate splitter (spec component D).
//!
//! Flattens the WHERE/ON tree into per-alias pushdown and residual predicate lists, and
//! pulls any column-equals-column leaf out as the join spec. Grounded on the
//! AND-conjunct-walk idiom in `examples/euanmacinnes-clarium/src/server/query/query_parse_where_tokens.rs`,
//! generalized here to also classify pushdown-vs-residual and to refuse, rather than
//! silently mis-merge, a disjunction that spans more than one alias or comparison shape —
//! the redesign the spec calls for in §9 (the original `sql_transformer.py` walks both
//! branches of an OR unconditionally and merges results, which is a correctness bug for
//! disjunctions whose branches touch different fields).

use crate::ast::{BinOp, ColumnRef, Expr};
use crate::error::DocSqlError;
use crate::store::{PredicateValue, PushdownPredicate};
use crate::value::Value;
use std::collections::BTreeMap;

/// One alias's split predicates: eligible for store-side pushdown, and everything else
/// that must be re-checked against the fetched document (component G).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AliasPredicates {
    pub pushdown: Vec<PushdownPredicate>,
    pub residual: Vec<Expr>,
}

#[derive(Debug, Clone, Default)]
pub struct SplitPredicates {
    pub by_alias: BTreeMap<String, AliasPredicates>,
    /// A column-equals-column leaf naming two distinct aliases, if one was found.
    pub join_condition: Option<(ColumnRef, ColumnRef)>,
}

/// Split `where_clause` into per-alias predicate sets. `default_alias` resolves any
/// unqualified column reference (spec §4.B's default-part rule).
pub fn split_predicates(where_clause: Option<&Expr>, default_alias: &str) -> Result<SplitPredicates, DocSqlError> {
    let mut split = SplitPredicates::default();
    let Some(expr) = where_clause else { return Ok(split) };
    for conjunct in collect_conjuncts(expr) {
        classify_conjunct(conjunct, default_alias, &mut split)?;
    }
    Ok(split)
}

/// Flatten a left-leaning AND tree into its leaves (ORs are kept intact as one leaf).
fn collect_conjuncts(expr: &Expr) -> Vec<&Expr> {
    match expr {
        Expr::Binary { op: BinOp::And, left, right } => {
            let mut out = collect_conjuncts(left);
            out.extend(collect_conjuncts(right));
            out
        }
        other => vec![other],
    }
}

fn classify_conjunct(expr: &Expr, default_alias: &str, split: &mut SplitPredicates) -> Result<(), DocSqlError> {
    match expr {
        Expr::Binary { op: BinOp::Or, .. } => classify_or(expr, default_alias, split),
        Expr::Binary { op, left, right } => classify_comparison(*op, left, right, default_alias, split),
        _ => Err(DocSqlError::plan("malformed_predicate", "expected a comparison in WHERE/ON")),
    }
}

/// A disjunction is only safe to push down when every leaf is an equality comparison
/// against the *same* (alias, column) with a literal right-hand side; it then collapses
/// to a single pushdown `IN`. Anything else is a plan-time error rather than a silent
/// partial match.
fn classify_or(expr: &Expr, default_alias: &str, split: &mut SplitPredicates) -> Result<(), DocSqlError> {
    let mut leaves = Vec::new();
    collect_or_leaves(expr, &mut leaves);

    let mut target: Option<ColumnRef> = None;
    let mut values = Vec::new();
    for leaf in &leaves {
        match leaf {
            Expr::Binary { op: BinOp::Eq, left, right } => {
                let (col, val) = match (left.as_ref(), right.as_ref()) {
                    (Expr::Column(c), Expr::Literal(v)) => (c, v),
                    (Expr::Literal(v), Expr::Column(c)) => (c, v),
                    _ => {
                        return Err(DocSqlError::plan(
                            "unsupported_disjunction",
                            "OR is only supported across equality comparisons on one column",
                        ))
                    }
                };
                match &target {
                    None => target = Some(col.clone()),
                    Some(t) if t.table == col.table && t.column == col.column => {}
                    Some(_) => {
                        return Err(DocSqlError::plan(
                            "unsupported_disjunction",
                            "OR across different columns or aliases is not supported",
                        ))
                    }
                }
                values.push(val.clone());
            }
            _ => {
                return Err(DocSqlError::plan(
                    "unsupported_disjunction",
                    "OR is only supported across equality comparisons on one column",
                ))
            }
        }
    }

    let col = target.ok_or_else(|| DocSqlError::plan("unsupported_disjunction", "empty OR expression"))?;
    let alias = col.table.clone().unwrap_or_else(|| default_alias.to_string());
    split.by_alias.entry(alias).or_default().pushdown.push(PushdownPredicate {
        field: col.column,
        op: BinOp::In,
        value: PredicateValue::List(values),
    });
    Ok(())
}

fn collect_or_leaves<'a>(expr: &'a Expr, out: &mut Vec<&'a Expr>) {
    match expr {
        Expr::Binary { op: BinOp::Or, left, right } => {
            collect_or_leaves(left, out);
            collect_or_leaves(right, out);
        }
        other => out.push(other),
    }
}

fn classify_comparison(
    op: BinOp,
    left: &Expr,
    right: &Expr,
    default_alias: &str,
    split: &mut SplitPredicates,
) -> Result<(), DocSqlError> {
    // column = column across two distinct aliases: this is a join condition, not a
    // per-alias filter (spec §4.D).
    if op == BinOp::Eq {
        if let (Expr::Column(a), Expr::Column(b)) = (left, right) {
            let alias_a = a.table.clone().unwrap_or_else(|| default_alias.to_string());
            let alias_b = b.table.clone().unwrap_or_else(|| default_alias.to_string());
            if alias_a != alias_b {
                if split.join_condition.is_some() {
                    return Err(DocSqlError::plan("multiple_join_conditions", "only one join condition is supported"));
                }
                let resolved_a = ColumnRef { table: Some(alias_a), column: a.column.clone(), agg_func: None };
                let resolved_b = ColumnRef { table: Some(alias_b), column: b.column.clone(), agg_func: None };
                split.join_condition = Some((resolved_a, resolved_b));
                return Ok(());
            }
        }
    }

    let (col, val, op) = match (left, right) {
        (Expr::Column(c), Expr::Literal(v)) => (c, v.clone(), op),
        (Expr::Literal(v), Expr::Column(c)) => (c, v.clone(), flip(op)),
        (Expr::Column(c), Expr::LiteralList(items)) => {
            return push_list(c, op, items.clone(), default_alias, split);
        }
        _ => {
            return Err(DocSqlError::plan(
                "unsupported_predicate",
                "WHERE/ON leaves must compare a column to a literal, a list, or another column",
            ))
        }
    };

    let alias = col.table.clone().unwrap_or_else(|| default_alias.to_string());
    let bucket = split.by_alias.entry(alias).or_default();
    if op.is_pushdown_eligible() {
        bucket.pushdown.push(PushdownPredicate { field: col.column.clone(), op, value: PredicateValue::Single(val) });
    } else if op.is_residual() {
        bucket.residual.push(Expr::cmp(op, Expr::Column(col.clone()), Expr::literal(val)));
    } else {
        return Err(DocSqlError::plan("unsupported_predicate", "unsupported comparison operator"));
    }
    Ok(())
}

fn push_list(
    col: &ColumnRef,
    op: BinOp,
    items: Vec<Value>,
    default_alias: &str,
    split: &mut SplitPredicates,
) -> Result<(), DocSqlError> {
    if !matches!(op, BinOp::In | BinOp::NotIn | BinOp::ArrayContainsAny) {
        return Err(DocSqlError::plan("unsupported_predicate", "only IN/NOT IN/ARRAY_CONTAINS_ANY take a value list"));
    }
    let alias = col.table.clone().unwrap_or_else(|| default_alias.to_string());
    split
        .by_alias
        .entry(alias)
        .or_default()
        .pushdown
        .push(PushdownPredicate { field: col.column.clone(), op, value: PredicateValue::List(items) });
    Ok(())
}

fn flip(op: BinOp) -> BinOp {
    match op {
        BinOp::Gt => BinOp::Lt,
        BinOp::Lt => BinOp::Gt,
        BinOp::Ge => BinOp::Le,
        BinOp::Le => BinOp::Ge,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_pushdown_and_residual_by_alias() {
        let expr = Expr::cmp(
            BinOp::And,
            Expr::cmp(BinOp::Eq, Expr::column(Some("b".into()), "status"), Expr::literal(Value::Str("open".into()))),
            Expr::cmp(BinOp::Like, Expr::column(Some("b".into()), "name"), Expr::literal(Value::Str("A%".into()))),
        );
        let split = split_predicates(Some(&expr), "b").unwrap();
        let alias = split.by_alias.get("b").unwrap();
        assert_eq!(alias.pushdown.len(), 1);
        assert_eq!(alias.residual.len(), 1);
    }

    #[test]
    fn extracts_cross_alias_equality_as_join_condition() {
        let expr = Expr::cmp(BinOp::Eq, Expr::column(Some("u".into()), "email"), Expr::column(Some("b".into()), "email"));
        let split = split_predicates(Some(&expr), "u").unwrap();
        assert!(split.join_condition.is_some());
        assert!(split.by_alias.is_empty());
    }

    #[test]
    fn reduces_or_of_equalities_on_same_column_to_pushdown_in() {
        let expr = Expr::cmp(
            BinOp::Or,
            Expr::cmp(BinOp::Eq, Expr::column(Some("b".into()), "status"), Expr::literal(Value::Str("open".into()))),
            Expr::cmp(BinOp::Eq, Expr::column(Some("b".into()), "status"), Expr::literal(Value::Str("pending".into()))),
        );
        let split = split_predicates(Some(&expr), "b").unwrap();
        let alias = split.by_alias.get("b").unwrap();
        assert_eq!(alias.pushdown.len(), 1);
        assert_eq!(alias.pushdown[0].op, BinOp::In);
    }

    #[test]
    fn rejects_or_across_different_columns() {
        let expr = Expr::cmp(
            BinOp::Or,
            Expr::cmp(BinOp::Eq, Expr::column(Some("b".into()), "status"), Expr::literal(Value::Str("open".into()))),
            Expr::cmp(BinOp::Eq, Expr::column(Some("b".into()), "seats"), Expr::literal(Value::Number(2.0))),
        );
        let err = split_predicates(Some(&expr), "b").unwrap_err();
        assert!(matches!(err, DocSqlError::Plan { .. }));
    }

    #[test]
    fn rejects_or_across_different_aliases() {
        let expr = Expr::cmp(
            BinOp::Or,
            Expr::cmp(BinOp::Eq, Expr::column(Some("a".into()), "status"), Expr::literal(Value::Str("open".into()))),
            Expr::cmp(BinOp::Eq, Expr::column(Some("b".into()), "status"), Expr::literal(Value::Str("open".into()))),
        );
        let err = split_predicates(Some(&expr), "a").unwrap_err();
        assert!(matches!(err, DocSqlError::Plan { .. }));
    }

    #[test]
    fn unqualified_column_falls_back_to_default_alias() {
        let expr = Expr::cmp(BinOp::Eq, Expr::column(None, "status"), Expr::literal(Value::Str("open".into())));
        let split = split_predicates(Some(&expr), "Bookings").unwrap();
        assert!(split.by_alias.contains_key("Bookings"));
    }
}
