//! Statement parsing entry point (spec component C).
//!
//! Dispatches on the leading keyword, then hands the remaining tokens to the
//! statement-specific clause parser. Grounded on the teacher's query-dispatch idiom in
//! `examples/euanmacinnes-clarium/src/server/query.rs`, which re-exports one parse
//! entrypoint per statement kind from its `query_parse_*` submodules behind a single
//! dispatch surface.

pub mod delete;
pub mod insert;
pub mod select;
pub mod tokens;
pub mod update;
pub mod where_expr;

use crate::ast::Statement;
use crate::error::DocSqlError;
use tokens::tokenize;
use tracing::debug;

/// Parse a single SQL statement into a `Statement` AST. A parse failure surfaces as
/// `DocSqlError::Parse` — unlike the Python original this is distilled from, which
/// silently returned an empty result set on a malformed statement (spec §9).
pub fn parse_statement(sql: &str) -> Result<Statement, DocSqlError> {
    let toks = tokenize(sql)?;
    if toks.is_empty() {
        return Err(DocSqlError::parse("empty statement"));
    }
    debug!(tokens = toks.len(), "parsing statement");
    let keyword = toks[0].to_ascii_uppercase();
    match keyword.as_str() {
        "SELECT" => Ok(Statement::Select(select::parse_select(&toks)?)),
        "INSERT" => Ok(Statement::Insert(insert::parse_insert(&toks)?)),
        "UPDATE" => Ok(Statement::Update(update::parse_update(&toks)?)),
        "DELETE" => Ok(Statement::Delete(delete::parse_delete(&toks)?)),
        other => Err(DocSqlError::parse(format!("unrecognized statement keyword: {other}"))),
    }
}
