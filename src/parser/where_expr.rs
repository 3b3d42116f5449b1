//! WHERE/ON/boolean expression parsing (spec component C, grammar `expr` production).
//!
//! Recursive descent over the flat token stream, splitting at the lowest-precedence
//! operator first (`OR`, then `AND`), in the style of
//! `examples/euanmacinnes-clarium/src/server/query/query_parse_where_tokens.rs`. Unlike
//! that file (which splits on the first `OR`/`AND` it finds), this one splits on the
//! *last* one at each level so `a AND b AND c` builds left-leaning, matching this crate's
//! own AST convention (`ast.rs`).

use crate::ast::{BinOp, Expr};
use crate::error::DocSqlError;
use crate::parser::tokens::{is_quoted, matching_paren, rfind_token_ci, split_on_commas, unquote};
use crate::value::Value;
use std::collections::BTreeSet;

pub fn parse_expr(tokens: &[String], aliases: &BTreeSet<String>) -> Result<Expr, DocSqlError> {
    if tokens.is_empty() {
        return Err(DocSqlError::parse("expected an expression"));
    }

    // Strip a redundant pair of outer parentheses wrapping the whole expression.
    if tokens[0] == "(" {
        if let Ok((inner_start, close_idx)) = matching_paren(tokens, 0) {
            if close_idx == tokens.len() - 1 {
                return parse_expr(&tokens[inner_start..close_idx], aliases);
            }
        }
    }

    if let Some(idx) = rfind_token_ci(tokens, "OR") {
        let left = parse_expr(&tokens[..idx], aliases)?;
        let right = parse_expr(&tokens[idx + 1..], aliases)?;
        return Ok(Expr::cmp(BinOp::Or, left, right));
    }

    if let Some(idx) = rfind_token_ci(tokens, "AND") {
        let left = parse_expr(&tokens[..idx], aliases)?;
        let right = parse_expr(&tokens[idx + 1..], aliases)?;
        return Ok(Expr::cmp(BinOp::And, left, right));
    }

    // IS [NOT] NULL. Lowered per spec §3/§9: IS NULL -> == null, IS NOT NULL -> != "".
    if let Some(idx) = rfind_token_ci(tokens, "IS") {
        let left = parse_operand(&tokens[..idx], aliases)?;
        let mut j = idx + 1;
        let negated = tokens.get(j).map(|t| t.eq_ignore_ascii_case("NOT")).unwrap_or(false);
        if negated {
            j += 1;
        }
        if tokens.get(j).map(|t| t.eq_ignore_ascii_case("NULL")).unwrap_or(false) && j + 1 == tokens.len() {
            return Ok(if negated {
                Expr::cmp(BinOp::Ne, left, Expr::literal(Value::Str(String::new())))
            } else {
                Expr::cmp(BinOp::Eq, left, Expr::literal(Value::Null))
            });
        }
        return Err(DocSqlError::parse("IS/IS NOT only supports NULL"));
    }

    // NOT LIKE (two-token operator) before single-token LIKE.
    if let Some(idx) = rfind_token_ci(tokens, "NOT") {
        if tokens.get(idx + 1).map(|t| t.eq_ignore_ascii_case("LIKE")).unwrap_or(false) {
            let left = parse_operand(&tokens[..idx], aliases)?;
            let right = parse_operand(&tokens[idx + 2..], aliases)?;
            return Ok(Expr::cmp(BinOp::NotLike, left, right));
        }
        if tokens.get(idx + 1).map(|t| t.eq_ignore_ascii_case("IN")).unwrap_or(false) {
            let left = parse_operand(&tokens[..idx], aliases)?;
            let list = parse_paren_literal_list(&tokens[idx + 2..], aliases)?;
            return Ok(Expr::cmp(BinOp::NotIn, left, Expr::LiteralList(list)));
        }
    }
    if let Some(idx) = rfind_token_ci(tokens, "LIKE") {
        let left = parse_operand(&tokens[..idx], aliases)?;
        let right = parse_operand(&tokens[idx + 1..], aliases)?;
        return Ok(Expr::cmp(BinOp::Like, left, right));
    }

    if let Some(idx) = rfind_token_ci(tokens, "IN") {
        let left = parse_operand(&tokens[..idx], aliases)?;
        let list = parse_paren_literal_list(&tokens[idx + 1..], aliases)?;
        return Ok(Expr::cmp(BinOp::In, left, Expr::LiteralList(list)));
    }

    if let Some(idx) = rfind_token_ci(tokens, "ARRAY_CONTAINS_ANY") {
        let left = parse_operand(&tokens[..idx], aliases)?;
        let list = parse_paren_literal_list(&tokens[idx + 1..], aliases)?;
        return Ok(Expr::cmp(BinOp::ArrayContainsAny, left, Expr::LiteralList(list)));
    }

    if let Some(idx) = rfind_token_ci(tokens, "ARRAY_CONTAINS") {
        let left = parse_operand(&tokens[..idx], aliases)?;
        let right = parse_operand(&tokens[idx + 1..], aliases)?;
        return Ok(Expr::cmp(BinOp::ArrayContains, left, right));
    }

    // Symbolic comparison operators.
    for (i, tok) in tokens.iter().enumerate() {
        let op = match tok.as_str() {
            ">=" => Some(BinOp::Ge),
            "<=" => Some(BinOp::Le),
            "!=" | "<>" => Some(BinOp::Ne),
            "=" | "==" => Some(BinOp::Eq),
            ">" => Some(BinOp::Gt),
            "<" => Some(BinOp::Lt),
            _ => None,
        };
        if let Some(op) = op {
            let left = parse_operand(&tokens[..i], aliases)?;
            let right = parse_operand(&tokens[i + 1..], aliases)?;
            return Ok(Expr::cmp(op, left, right));
        }
    }

    Err(DocSqlError::parse(format!("unrecognized expression: {}", tokens.join(" "))))
}

/// Parse a single operand: a quoted string literal, a number, a boolean, or a column
/// reference. A dotted token (`a.b`) is a `table.column` qualification only when `a`
/// names a known FROM alias; otherwise the whole token is a single column name
/// addressing a nested sub-field (`a.b.c`), per spec §3.
fn parse_operand(tokens: &[String], aliases: &BTreeSet<String>) -> Result<Expr, DocSqlError> {
    if tokens.len() != 1 {
        return Err(DocSqlError::parse(format!(
            "expected a single value or column reference, found: {}",
            tokens.join(" ")
        )));
    }
    let tok = &tokens[0];
    if is_quoted(tok) {
        return Ok(Expr::literal(Value::from_literal_str(unquote(tok))));
    }
    if tok.eq_ignore_ascii_case("true") {
        return Ok(Expr::literal(Value::Bool(true)));
    }
    if tok.eq_ignore_ascii_case("false") {
        return Ok(Expr::literal(Value::Bool(false)));
    }
    if tok.eq_ignore_ascii_case("null") {
        return Ok(Expr::literal(Value::Null));
    }
    if let Ok(n) = tok.parse::<f64>() {
        return Ok(Expr::literal(Value::Number(n)));
    }
    match tok.find('.') {
        Some(dot) if aliases.contains(&tok[..dot]) => Ok(Expr::column(Some(tok[..dot].to_string()), tok[dot + 1..].to_string())),
        _ => Ok(Expr::column(None, tok.clone())),
    }
}

/// Parse `(v1, v2, ...)` starting at `tokens[0] == "("` into a list of literal values.
fn parse_paren_literal_list(tokens: &[String], aliases: &BTreeSet<String>) -> Result<Vec<Value>, DocSqlError> {
    if tokens.first().map(|t| t.as_str()) != Some("(") {
        return Err(DocSqlError::parse("expected '(' to start a value list"));
    }
    let (start, end) = matching_paren(tokens, 0)?;
    let parts = split_on_commas(&tokens[start..end]);
    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .map(|p| match parse_operand(p, aliases)? {
            Expr::Literal(v) => Ok(v),
            Expr::Column(c) => Err(DocSqlError::type_error(format!(
                "expected a literal value in list, found column reference {}",
                c.column
            ))),
            _ => Err(DocSqlError::type_error("expected a literal value in list")),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::tokens::tokenize;

    fn aliases(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn parse(s: &str) -> Expr {
        parse_expr(&tokenize(s).unwrap(), &BTreeSet::new()).unwrap()
    }

    fn parse_with(s: &str, names: &[&str]) -> Expr {
        parse_expr(&tokenize(s).unwrap(), &aliases(names)).unwrap()
    }

    #[test]
    fn parses_simple_equality() {
        let e = parse(r#"email = "a@x""#);
        assert_eq!(e, Expr::cmp(BinOp::Eq, Expr::column(None, "email"), Expr::literal(Value::Str("a@x".into()))));
    }

    #[test]
    fn parses_and_of_two_equalities() {
        let e = parse(r#"email = "a@x" AND date = "2022-03-18T00:00:00""#);
        match e {
            Expr::Binary { op: BinOp::And, .. } => {}
            _ => panic!("expected AND"),
        }
    }

    #[test]
    fn and_chains_build_left_leaning() {
        // a AND b AND c -> And(And(a, b), c)
        let e = parse("a = 1 AND b = 2 AND c = 3");
        match e {
            Expr::Binary { op: BinOp::And, left, right } => {
                assert_eq!(*right, Expr::cmp(BinOp::Eq, Expr::column(None, "c"), Expr::literal(Value::Number(3.0))));
                match *left {
                    Expr::Binary { op: BinOp::And, .. } => {}
                    _ => panic!("expected the left branch to itself be an AND"),
                }
            }
            _ => panic!("expected AND"),
        }
    }

    #[test]
    fn parses_qualified_column_in_on_clause() {
        let e = parse_with("u.email = b.email", &["u", "b"]);
        assert_eq!(
            e,
            Expr::cmp(
                BinOp::Eq,
                Expr::column(Some("u".into()), "email"),
                Expr::column(Some("b".into()), "email")
            )
        );
    }

    #[test]
    fn dotted_token_without_a_matching_alias_is_a_single_nested_column() {
        let e = parse(r#"address.city = "NYC""#);
        assert_eq!(
            e,
            Expr::cmp(BinOp::Eq, Expr::column(None, "address.city"), Expr::literal(Value::Str("NYC".into())))
        );
    }

    #[test]
    fn parses_like_pattern() {
        let e = parse(r#"name LIKE "A%""#);
        assert_eq!(e, Expr::cmp(BinOp::Like, Expr::column(None, "name"), Expr::literal(Value::Str("A%".into()))));
    }

    #[test]
    fn parses_not_like() {
        let e = parse(r#"name NOT LIKE "A%""#);
        match e {
            Expr::Binary { op: BinOp::NotLike, .. } => {}
            _ => panic!("expected NOT LIKE"),
        }
    }

    #[test]
    fn parses_in_list() {
        let e = parse(r#"status IN ("a", "b")"#);
        match e {
            Expr::Binary { op: BinOp::In, right, .. } => match *right {
                Expr::LiteralList(items) => assert_eq!(items.len(), 2),
                _ => panic!("expected literal list"),
            },
            _ => panic!("expected IN"),
        }
    }

    #[test]
    fn lowers_is_null_and_is_not_null() {
        let e = parse("x IS NULL");
        assert_eq!(e, Expr::cmp(BinOp::Eq, Expr::column(None, "x"), Expr::literal(Value::Null)));
        let e = parse("x IS NOT NULL");
        assert_eq!(e, Expr::cmp(BinOp::Ne, Expr::column(None, "x"), Expr::literal(Value::Str(String::new()))));
    }

    #[test]
    fn parses_array_contains_any() {
        let e = parse(r#"tags ARRAY_CONTAINS_ANY ("a", "b")"#);
        match e {
            Expr::Binary { op: BinOp::ArrayContainsAny, .. } => {}
            _ => panic!("expected ARRAY_CONTAINS_ANY"),
        }
    }
}
