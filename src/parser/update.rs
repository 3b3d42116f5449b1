//! `UPDATE table SET col = val, ... [WHERE ...]` parsing (spec component C).

use crate::ast::{Assignment, FromSpec, Update};
use crate::error::DocSqlError;
use crate::parser::tokens::{find_token_ci, split_on_commas, unquote};
use crate::parser::where_expr::parse_expr;
use crate::value::Value;

pub fn parse_update(tokens: &[String]) -> Result<Update, DocSqlError> {
    let set_idx = find_token_ci(tokens, "SET").ok_or_else(|| DocSqlError::parse("UPDATE missing SET"))?;
    let table = FromSpec { collection: unquote(&tokens[1]).to_string(), alias: None };

    let where_idx = find_token_ci(tokens, "WHERE");
    let set_end = where_idx.unwrap_or(tokens.len());
    let sets = split_on_commas(&tokens[set_idx + 1..set_end])
        .into_iter()
        .filter(|p| !p.is_empty())
        .map(parse_assignment)
        .collect::<Result<Vec<_>, _>>()?;
    if sets.is_empty() {
        return Err(DocSqlError::parse("UPDATE SET list is empty"));
    }

    let aliases = std::collections::BTreeSet::from([table.alias_or_collection().to_string()]);
    let where_clause = match where_idx {
        Some(idx) => Some(parse_expr(&tokens[idx + 1..], &aliases)?),
        None => None,
    };

    Ok(Update { table, sets, where_clause })
}

fn parse_assignment(tokens: &[String]) -> Result<Assignment, DocSqlError> {
    let eq_idx = tokens
        .iter()
        .position(|t| t == "=")
        .ok_or_else(|| DocSqlError::parse(format!("expected 'column = value' in SET list, found: {}", tokens.join(" "))))?;
    if eq_idx != 1 {
        return Err(DocSqlError::parse("SET left-hand side must be a plain column name"));
    }
    let column = unquote(&tokens[0]).to_string();
    let value = parse_value_literal(&tokens[eq_idx + 1..])?;
    Ok(Assignment { column, value })
}

fn parse_value_literal(tokens: &[String]) -> Result<Value, DocSqlError> {
    if tokens.len() != 1 {
        return Err(DocSqlError::parse(format!(
            "SET right-hand side must be a literal value, found: {}",
            tokens.join(" ")
        )));
    }
    let tok = &tokens[0];
    if tok.len() >= 2 && tok.starts_with('"') && tok.ends_with('"') {
        return Ok(Value::from_literal_str(unquote(tok)));
    }
    if tok.eq_ignore_ascii_case("true") {
        return Ok(Value::Bool(true));
    }
    if tok.eq_ignore_ascii_case("false") {
        return Ok(Value::Bool(false));
    }
    if tok.eq_ignore_ascii_case("null") {
        return Ok(Value::Null);
    }
    if let Ok(n) = tok.parse::<f64>() {
        return Ok(Value::Number(n));
    }
    Err(DocSqlError::parse(format!(
        "SET right-hand side must be a literal value, not a column reference: {tok}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::tokens::tokenize;

    #[test]
    fn parses_single_assignment_with_where() {
        let toks = tokenize(r#"UPDATE Bookings SET status = "closed" WHERE docid = "abc""#).unwrap();
        let upd = parse_update(&toks).unwrap();
        assert_eq!(upd.table.collection, "Bookings");
        assert_eq!(upd.sets, vec![Assignment { column: "status".into(), value: Value::Str("closed".into()) }]);
        assert!(upd.where_clause.is_some());
    }

    #[test]
    fn parses_multiple_assignments_without_where() {
        let toks = tokenize(r#"UPDATE Bookings SET status = "closed", seats = 0"#).unwrap();
        let upd = parse_update(&toks).unwrap();
        assert_eq!(upd.sets.len(), 2);
        assert!(upd.where_clause.is_none());
    }
}
