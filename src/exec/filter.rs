//! Residual filter (spec component G).
//!
//! Applies the predicates the splitter judged not pushdown-eligible: `LIKE`/`NOT LIKE`,
//! compiled from the SQL `%`-glob into a regex. The per-character escape-or-translate
//! loop follows the teacher's own `sql_like_to_regex` in
//! `examples/euanmacinnes-clarium/src/server/exec/exec_common.rs` (`%` → `.*`, every other
//! character escaped); unlike the teacher's version this anchors only at the start (spec
//! §4.G: "anchored at the start, prefix match"), not at the end.

use crate::ast::{BinOp, Expr};
use crate::error::{DocSqlError, DocSqlResult};
use crate::store::Document;
use crate::value::Value;
use regex::Regex;

/// True if `doc` satisfies every residual predicate. A predicate referencing a field
/// absent from the document never matches (spec §4.G).
pub fn matches_residual(doc: &Document, residual: &[Expr]) -> DocSqlResult<bool> {
    for expr in residual {
        if !eval_residual(doc, expr)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn eval_residual(doc: &Document, expr: &Expr) -> DocSqlResult<bool> {
    let Expr::Binary { op, left, right } = expr else {
        return Err(DocSqlError::plan("malformed_residual", "expected a comparison in residual filter"));
    };
    let col = left.as_column().ok_or_else(|| DocSqlError::plan("malformed_residual", "LIKE left side must be a column"))?;
    let Expr::Literal(Value::Str(pattern)) = right.as_ref() else {
        return Err(DocSqlError::type_error("LIKE pattern must be a string literal"));
    };
    let Some(field_value) = doc.get(&col.column) else { return Ok(false) };
    let Value::Str(text) = field_value else { return Ok(false) };

    let re = like_to_regex(pattern)?;
    let is_match = re.is_match(text);
    Ok(match op {
        BinOp::Like => is_match,
        BinOp::NotLike => !is_match,
        _ => return Err(DocSqlError::plan("unsupported_residual", "only LIKE/NOT LIKE are residual operators")),
    })
}

/// Translate a SQL `LIKE` pattern into a prefix-anchored regex: `%` becomes `.*`, every
/// other character is escaped literally. Anchored only at the start, matching spec §4.G
/// rather than the full-string match a `%`-less pattern might suggest.
pub fn like_to_regex(pattern: &str) -> DocSqlResult<Regex> {
    let mut re = String::from("^");
    for ch in pattern.chars() {
        if ch == '%' {
            re.push_str(".*");
        } else {
            re.push_str(&regex::escape(&ch.to_string()));
        }
    }
    Regex::new(&re).map_err(|e| DocSqlError::type_error(format!("invalid LIKE pattern: {e}")))
}
