//! Aggregation (spec component J).
//!
//! Reduces the row set to a single output row once the planner has confirmed the query
//! is pure aggregation (no plain columns mixed in, spec component E). Grounded on the
//! `count`/`sum`/`avg`/`min`/`max` reducers in `sql_aggregation.py`, reimplemented over
//! this crate's `Value` rather than Python's dynamically typed accumulator. Output keys
//! are `func(column)` literally, matching spec §8 scenario S6 (`count(*)`). Aggregate
//! queries have already been confirmed pure (spec component E's `validate_aggregate_mix`)
//! so there is no rename/wildcard concern a full projection pass would otherwise resolve
//! — aggregation reads straight off the fetched/joined rows, sharing `project.rs`'s
//! dotted-path reader (`read_dotted`) so `SUM(address.age)` resolves the same nested path
//! a plain `SELECT address.age` would.

use crate::ast::{AggFunc, ColumnRef};
use crate::error::DocSqlResult;
use crate::exec::join::Row;
use crate::exec::project::read_dotted;
use crate::planner::Plan;
use crate::store::Document;
use crate::value::Value;

pub fn aggregate_rows(rows: &[Row], plan: &Plan) -> DocSqlResult<Document> {
    let mut out = Document::new();
    for col in &plan.select_columns {
        let Some(func) = col.agg_func else { continue };
        let name = plan
            .column_name_map
            .get(&(col.table.clone(), col.column.clone()))
            .cloned()
            .unwrap_or_else(|| format!("{}({})", func.name(), col.column));
        let value = aggregate_column(rows, col, func, &plan.default_alias);
        out.insert(name, value);
    }
    Ok(out)
}

fn aggregate_column(rows: &[Row], col: &ColumnRef, func: AggFunc, default_alias: &str) -> Value {
    // `count(col)` ignores its column argument and counts rows (spec §4.J).
    if func == AggFunc::Count {
        return Value::Number(rows.len() as f64);
    }

    let numbers: Vec<f64> = rows.iter().filter_map(|r| read_numeric(r, col, default_alias)).collect();

    match func {
        AggFunc::Sum => Value::Number(numbers.iter().sum()),
        AggFunc::Avg => {
            if numbers.is_empty() {
                Value::Number(0.0)
            } else {
                Value::Number(numbers.iter().sum::<f64>() / numbers.len() as f64)
            }
        }
        AggFunc::Min => Value::Number(numbers.into_iter().fold(f64::INFINITY, f64::min)),
        AggFunc::Max => Value::Number(numbers.into_iter().fold(f64::NEG_INFINITY, f64::max)),
        AggFunc::Count => unreachable!(),
    }
}

fn read_numeric(row: &Row, col: &ColumnRef, default_alias: &str) -> Option<f64> {
    let alias = col.table.as_deref().unwrap_or(default_alias);
    let doc = row.get(alias)?;
    read_dotted(doc, &col.column).as_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_statement;
    use crate::planner::plan;
    use std::collections::BTreeMap;

    fn doc(pairs: &[(&str, Value)]) -> Document {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn row(alias: &str, d: Document) -> Row {
        BTreeMap::from([(alias.to_string(), d)])
    }

    #[test]
    fn count_ignores_its_column_and_counts_every_row() {
        let stmt = parse_statement("SELECT COUNT(seats) FROM Bookings").unwrap();
        let p = plan(&stmt).unwrap();
        let rows = vec![
            row("Bookings", doc(&[("seats", Value::Number(2.0))])),
            row("Bookings", doc(&[("other", Value::Str("x".into()))])),
        ];
        let out = aggregate_rows(&rows, &p).unwrap();
        assert_eq!(out.get("count(seats)"), Some(&Value::Number(2.0)));
    }

    #[test]
    fn sums_numeric_column() {
        let stmt = parse_statement("SELECT SUM(seats) FROM Bookings").unwrap();
        let p = plan(&stmt).unwrap();
        let rows = vec![
            row("Bookings", doc(&[("seats", Value::Number(2.0))])),
            row("Bookings", doc(&[("seats", Value::Number(3.0))])),
        ];
        let out = aggregate_rows(&rows, &p).unwrap();
        assert_eq!(out.get("sum(seats)"), Some(&Value::Number(5.0)));
    }

    #[test]
    fn averages_numeric_column() {
        let stmt = parse_statement("SELECT AVG(seats) FROM Bookings").unwrap();
        let p = plan(&stmt).unwrap();
        let rows = vec![
            row("Bookings", doc(&[("seats", Value::Number(2.0))])),
            row("Bookings", doc(&[("seats", Value::Number(4.0))])),
        ];
        let out = aggregate_rows(&rows, &p).unwrap();
        assert_eq!(out.get("avg(seats)"), Some(&Value::Number(3.0)));
    }

    #[test]
    fn avg_is_zero_when_no_numeric_values() {
        let stmt = parse_statement("SELECT AVG(seats) FROM Bookings").unwrap();
        let p = plan(&stmt).unwrap();
        let rows = vec![row("Bookings", doc(&[]))];
        let out = aggregate_rows(&rows, &p).unwrap();
        assert_eq!(out.get("avg(seats)"), Some(&Value::Number(0.0)));
    }

    #[test]
    fn min_and_max_over_numeric_column() {
        let stmt_min = parse_statement("SELECT MIN(seats) FROM Bookings").unwrap();
        let p_min = plan(&stmt_min).unwrap();
        let stmt_max = parse_statement("SELECT MAX(seats) FROM Bookings").unwrap();
        let p_max = plan(&stmt_max).unwrap();
        let rows = vec![
            row("Bookings", doc(&[("seats", Value::Number(2.0))])),
            row("Bookings", doc(&[("seats", Value::Number(7.0))])),
        ];
        assert_eq!(aggregate_rows(&rows, &p_min).unwrap().get("min(seats)"), Some(&Value::Number(2.0)));
        assert_eq!(aggregate_rows(&rows, &p_max).unwrap().get("max(seats)"), Some(&Value::Number(7.0)));
    }

    #[test]
    fn sums_nested_dotted_path_column() {
        let stmt = parse_statement("SELECT SUM(address.age) FROM Users").unwrap();
        let p = plan(&stmt).unwrap();
        let nested_a = BTreeMap::from([("age".to_string(), Value::Number(30.0))]);
        let nested_b = BTreeMap::from([("age".to_string(), Value::Number(12.0))]);
        let rows = vec![
            row("Users", doc(&[("address", Value::Map(nested_a))])),
            row("Users", doc(&[("address", Value::Map(nested_b))])),
        ];
        let out = aggregate_rows(&rows, &p).unwrap();
        assert_eq!(out.get("sum(address.age)"), Some(&Value::Number(42.0)));
    }

    #[test]
    fn count_star_counts_every_row() {
        let stmt = parse_statement("SELECT COUNT(*) FROM Bookings").unwrap();
        let p = plan(&stmt).unwrap();
        let rows = vec![row("Bookings", doc(&[("seats", Value::Number(2.0))])), row("Bookings", doc(&[]))];
        let out = aggregate_rows(&rows, &p).unwrap();
        assert_eq!(out.get("count(*)"), Some(&Value::Number(2.0)));
    }
}
