//! `INSERT INTO table (cols) VALUES (vals)` parsing (spec component C).
//!
//! Grounded on `sql_fire_insert.py`'s special case: `INSERT INTO t (*) VALUES ('{...}')`
//! inserts a whole document from a JSON object literal rather than a column/value pair
//! list. We spell the mapping literal as a single quoted JSON string, since the
//! tokenizer has no brace/colon syntax of its own — see the Open Questions note in
//! `DESIGN.md`.

use crate::ast::{ColumnRef, FromSpec, Insert};
use crate::error::DocSqlError;
use crate::parser::tokens::{find_token_ci, matching_paren, split_on_commas, unquote};
use crate::value::Value;

pub fn parse_insert(tokens: &[String]) -> Result<Insert, DocSqlError> {
    let into_idx = find_token_ci(tokens, "INTO").ok_or_else(|| DocSqlError::parse("INSERT missing INTO"))?;
    let values_idx = find_token_ci(tokens, "VALUES").ok_or_else(|| DocSqlError::parse("INSERT missing VALUES"))?;

    let table_tokens = &tokens[into_idx + 1..];
    let paren_idx = table_tokens
        .iter()
        .position(|t| t == "(")
        .ok_or_else(|| DocSqlError::parse("INSERT missing column list"))?;
    let table = FromSpec { collection: unquote(&table_tokens[0]).to_string(), alias: None };

    let (cols_start, cols_end) = matching_paren(table_tokens, paren_idx)?;
    let columns = split_on_commas(&table_tokens[cols_start..cols_end])
        .into_iter()
        .filter(|p| !p.is_empty())
        .map(|p| {
            if p.len() != 1 {
                return Err(DocSqlError::parse("expected a plain column name in INSERT column list"));
            }
            Ok(ColumnRef::new(None, unquote(&p[0]).to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let values_tokens = &tokens[values_idx + 1..];
    let values_paren = values_tokens
        .iter()
        .position(|t| t == "(")
        .ok_or_else(|| DocSqlError::parse("INSERT missing value list"))?;
    let (vals_start, vals_end) = matching_paren(values_tokens, values_paren)?;
    let value_parts = split_on_commas(&values_tokens[vals_start..vals_end]);

    // `(*)` column list with a single JSON-object value literal: insert the whole
    // document rather than binding column names positionally.
    if columns.len() == 1 && columns[0].column == "*" {
        if value_parts.len() != 1 || value_parts[0].len() != 1 {
            return Err(DocSqlError::parse("INSERT (*) expects a single JSON object literal value"));
        }
        let raw = unquote(&value_parts[0][0]);
        let json: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| DocSqlError::parse(format!("invalid JSON object literal in INSERT (*): {e}")))?;
        if !json.is_object() {
            return Err(DocSqlError::parse("INSERT (*) value must be a JSON object"));
        }
        return Ok(Insert { table, columns, values: vec![crate::value::from_json(&json)] });
    }

    let values = value_parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .map(parse_literal)
        .collect::<Result<Vec<_>, _>>()?;

    if values.len() != columns.len() {
        return Err(DocSqlError::parse("INSERT column count does not match value count"));
    }

    Ok(Insert { table, columns, values })
}

fn parse_literal(tokens: &[String]) -> Result<Value, DocSqlError> {
    if tokens.len() != 1 {
        return Err(DocSqlError::parse(format!("expected a single literal value, found: {}", tokens.join(" "))));
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
    Err(DocSqlError::parse(format!("expected a literal value, found: {tok}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::tokens::tokenize;

    #[test]
    fn parses_column_and_value_lists() {
        let toks = tokenize(r#"INSERT INTO Bookings (email, seats) VALUES ("a@x", 2)"#).unwrap();
        let ins = parse_insert(&toks).unwrap();
        assert_eq!(ins.table.collection, "Bookings");
        assert_eq!(ins.columns.len(), 2);
        assert_eq!(ins.values, vec![Value::Str("a@x".into()), Value::Number(2.0)]);
    }

    #[test]
    fn parses_star_mapping_literal_insert() {
        let toks = tokenize(r#"INSERT INTO Bookings (*) VALUES ('{"email":"a@x","seats":2}')"#).unwrap();
        let ins = parse_insert(&toks).unwrap();
        assert_eq!(ins.columns.len(), 1);
        assert_eq!(ins.columns[0].column, "*");
        match &ins.values[0] {
            Value::Map(m) => {
                assert_eq!(m.get("email"), Some(&Value::Str("a@x".into())));
                assert_eq!(m.get("seats"), Some(&Value::Number(2.0)));
            }
            _ => panic!("expected map"),
        }
    }

    #[test]
    fn promotes_iso_date_values_on_ingress() {
        let toks = tokenize(r#"INSERT INTO Bookings (date) VALUES ("2022-03-18T00:00:00")"#).unwrap();
        let ins = parse_insert(&toks).unwrap();
        assert!(matches!(ins.values[0], Value::Timestamp(_)));
    }
}
