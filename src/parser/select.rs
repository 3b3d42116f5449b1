//! `SELECT ... FROM ... [JOIN ... ON ...] [WHERE ...]` parsing (spec component C).

use crate::ast::{ColumnRef, FromClause, FromSpec, JoinExpr, Select};
use crate::error::DocSqlError;
use crate::parser::tokens::{find_token_ci, split_on_commas, unquote};
use crate::parser::where_expr::parse_expr;
use std::collections::BTreeSet;

pub fn parse_select(tokens: &[String]) -> Result<Select, DocSqlError> {
    let from_idx = find_token_ci(tokens, "FROM").ok_or_else(|| DocSqlError::parse("SELECT missing FROM"))?;

    let where_idx = find_token_ci(tokens, "WHERE");
    let from_end = where_idx.unwrap_or(tokens.len());
    let from_tokens = &tokens[from_idx + 1..from_end];
    let from = parse_from_clause(from_tokens)?;
    let aliases = from.aliases();

    let columns = parse_select_list(&tokens[1..from_idx], &aliases)?;

    let where_clause = match where_idx {
        Some(idx) => Some(parse_expr(&tokens[idx + 1..], &aliases)?),
        None => None,
    };

    Ok(Select { columns, from, where_clause })
}

fn parse_select_list(tokens: &[String], aliases: &BTreeSet<String>) -> Result<Vec<ColumnRef>, DocSqlError> {
    if tokens.is_empty() {
        return Err(DocSqlError::parse("SELECT list is empty"));
    }
    split_on_commas(tokens)
        .into_iter()
        .filter(|part| !part.is_empty())
        .map(|part| parse_select_column(part, aliases))
        .collect()
}

fn parse_select_column(tokens: &[String], aliases: &BTreeSet<String>) -> Result<ColumnRef, DocSqlError> {
    if tokens.len() == 1 && tokens[0] == "*" {
        return Ok(ColumnRef::new(None, "*"));
    }
    // `FUNC(column)` aggregation form.
    if tokens.len() >= 4 && tokens[1] == "(" && tokens.last().map(|t| t.as_str()) == Some(")") {
        if let Some(agg) = crate::ast::AggFunc::parse(&tokens[0]) {
            let inner = &tokens[2..tokens.len() - 1];
            let mut col = parse_bare_column(inner, aliases)?;
            col.agg_func = Some(agg);
            return Ok(col);
        }
    }
    if tokens.len() != 1 {
        return Err(DocSqlError::parse(format!("unrecognized select item: {}", tokens.join(" "))));
    }
    parse_bare_column(tokens, aliases)
}

/// A dotted token (`a.b`) is a `table.column` qualification only when `a` names a known
/// FROM alias; otherwise the whole token is a single column name addressing a nested
/// sub-field (`a.b.c`), per spec §3.
fn parse_bare_column(tokens: &[String], aliases: &BTreeSet<String>) -> Result<ColumnRef, DocSqlError> {
    if tokens.len() != 1 {
        return Err(DocSqlError::parse(format!("unrecognized column reference: {}", tokens.join(" "))));
    }
    if tokens[0] == "*" {
        return Ok(ColumnRef::new(None, "*"));
    }
    let tok = unquote(&tokens[0]);
    match tok.find('.') {
        Some(dot) if aliases.contains(&tok[..dot]) => Ok(ColumnRef::new(Some(tok[..dot].to_string()), tok[dot + 1..].to_string())),
        _ => Ok(ColumnRef::new(None, tok.to_string())),
    }
}

fn parse_from_spec(tokens: &[String]) -> Result<FromSpec, DocSqlError> {
    if tokens.is_empty() {
        return Err(DocSqlError::parse("expected a collection name"));
    }
    if tokens.len() == 1 {
        return Ok(FromSpec { collection: unquote(&tokens[0]).to_string(), alias: None });
    }
    if tokens.len() == 2 {
        return Ok(FromSpec {
            collection: unquote(&tokens[0]).to_string(),
            alias: Some(unquote(&tokens[1]).to_string()),
        });
    }
    if tokens.len() == 3 && tokens[1].eq_ignore_ascii_case("AS") {
        return Ok(FromSpec {
            collection: unquote(&tokens[0]).to_string(),
            alias: Some(unquote(&tokens[2]).to_string()),
        });
    }
    Err(DocSqlError::parse(format!("unrecognized FROM item: {}", tokens.join(" "))))
}

fn parse_from_clause(tokens: &[String]) -> Result<FromClause, DocSqlError> {
    if tokens.is_empty() {
        return Err(DocSqlError::parse("FROM clause is empty"));
    }
    if let Some(join_idx) = find_token_ci(tokens, "JOIN") {
        let left = parse_from_spec(&tokens[..join_idx])?;
        let on_idx = find_token_ci(tokens, "ON")
            .ok_or_else(|| DocSqlError::parse("JOIN missing ON clause"))?;
        let right = parse_from_spec(&tokens[join_idx + 1..on_idx])?;
        let join_aliases: BTreeSet<String> =
            BTreeSet::from([left.alias_or_collection().to_string(), right.alias_or_collection().to_string()]);
        let on = parse_expr(&tokens[on_idx + 1..], &join_aliases)?;
        return Ok(FromClause::Join(JoinExpr { left, right, on }));
    }
    let specs = split_on_commas(tokens)
        .into_iter()
        .filter(|p| !p.is_empty())
        .map(parse_from_spec)
        .collect::<Result<Vec<_>, _>>()?;
    if specs.is_empty() {
        return Err(DocSqlError::parse("FROM clause is empty"));
    }
    Ok(FromClause::List(specs))
}
