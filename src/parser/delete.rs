//! `DELETE FROM table [WHERE ...]` parsing (spec component C).

use crate::ast::{Delete, FromSpec};
use crate::error::DocSqlError;
use crate::parser::tokens::{find_token_ci, unquote};
use crate::parser::where_expr::parse_expr;

pub fn parse_delete(tokens: &[String]) -> Result<Delete, DocSqlError> {
    let from_idx = find_token_ci(tokens, "FROM").ok_or_else(|| DocSqlError::parse("DELETE missing FROM"))?;
    let table_tok = tokens
        .get(from_idx + 1)
        .ok_or_else(|| DocSqlError::parse("DELETE missing collection name"))?;
    let table = FromSpec { collection: unquote(table_tok).to_string(), alias: None };

    let aliases = std::collections::BTreeSet::from([table.alias_or_collection().to_string()]);
    let where_idx = find_token_ci(tokens, "WHERE");
    let where_clause = match where_idx {
        Some(idx) => Some(parse_expr(&tokens[idx + 1..], &aliases)?),
        None => None,
    };

    Ok(Delete { table, where_clause })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::tokens::tokenize;

    #[test]
    fn parses_delete_with_where() {
        let toks = tokenize(r#"DELETE FROM Bookings WHERE docid = "abc""#).unwrap();
        let del = parse_delete(&toks).unwrap();
        assert_eq!(del.table.collection, "Bookings");
        assert!(del.where_clause.is_some());
    }

    #[test]
    fn parses_delete_without_where() {
        let toks = tokenize("DELETE FROM Bookings").unwrap();
        let del = parse_delete(&toks).unwrap();
        assert!(del.where_clause.is_none());
    }
}
