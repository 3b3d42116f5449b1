//! Statement AST (spec component B).
//!
//! Immutable records with consistently named fields so downstream components (planner,
//! predicate splitter, executor) need not re-inspect source text. `AND`/`OR` trees are
//! built left-leaning by the parser to keep tree-walking simple.

use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggFunc {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggFunc {
    pub fn name(&self) -> &'static str {
        match self {
            AggFunc::Count => "count",
            AggFunc::Sum => "sum",
            AggFunc::Avg => "avg",
            AggFunc::Min => "min",
            AggFunc::Max => "max",
        }
    }

    pub fn parse(s: &str) -> Option<AggFunc> {
        match s.to_ascii_uppercase().as_str() {
            "COUNT" => Some(AggFunc::Count),
            "SUM" => Some(AggFunc::Sum),
            "AVG" => Some(AggFunc::Avg),
            "MIN" => Some(AggFunc::Min),
            "MAX" => Some(AggFunc::Max),
            _ => None,
        }
    }
}

/// `(table?, column, aggFunc?)` triple. `table` is an alias or collection name; absent
/// means "the default (first) collection applies". `column` may be `*`, a plain name, or
/// a dotted path addressing nested sub-fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub column: String,
    pub agg_func: Option<AggFunc>,
}

impl ColumnRef {
    pub fn new(table: Option<String>, column: impl Into<String>) -> Self {
        ColumnRef { table, column: column.into(), agg_func: None }
    }

    pub fn is_star(&self) -> bool {
        self.column == "*"
    }

    pub fn is_docid(&self) -> bool {
        self.column == "docid"
    }
}

/// `(collection, alias?)` pair. Alias defaults to the collection name.
#[derive(Debug, Clone, PartialEq)]
pub struct FromSpec {
    pub collection: String,
    pub alias: Option<String>,
}

impl FromSpec {
    pub fn alias_or_collection(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.collection)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    In,
    NotIn,
    ArrayContains,
    ArrayContainsAny,
    Like,
    NotLike,
    And,
    Or,
}

impl BinOp {
    pub fn is_pushdown_eligible(&self) -> bool {
        matches!(
            self,
            BinOp::Eq
                | BinOp::Ne
                | BinOp::Gt
                | BinOp::Lt
                | BinOp::Ge
                | BinOp::Le
                | BinOp::In
                | BinOp::NotIn
                | BinOp::ArrayContains
                | BinOp::ArrayContainsAny
        )
    }

    pub fn is_residual(&self) -> bool {
        matches!(self, BinOp::Like | BinOp::NotLike)
    }
}

/// A node in a WHERE/ON/SET-value expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Binary { op: BinOp, left: Box<Expr>, right: Box<Expr> },
    Column(ColumnRef),
    Literal(Value),
    LiteralList(Vec<Value>),
}

impl Expr {
    pub fn column(table: Option<String>, column: impl Into<String>) -> Self {
        Expr::Column(ColumnRef::new(table, column))
    }

    pub fn literal(v: Value) -> Self {
        Expr::Literal(v)
    }

    pub fn cmp(op: BinOp, left: Expr, right: Expr) -> Self {
        Expr::Binary { op, left: Box::new(left), right: Box::new(right) }
    }

    pub fn as_column(&self) -> Option<&ColumnRef> {
        match self {
            Expr::Column(c) => Some(c),
            _ => None,
        }
    }
}

/// `{left: FromSpec, right: FromSpec, on: Expr}` where `on` is an equality between two
/// qualified column references.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinExpr {
    pub left: FromSpec,
    pub right: FromSpec,
    pub on: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FromClause {
    List(Vec<FromSpec>),
    Join(JoinExpr),
}

impl FromClause {
    pub fn first_alias(&self) -> &str {
        match self {
            FromClause::List(list) => list.first().map(|f| f.alias_or_collection()).unwrap_or(""),
            FromClause::Join(j) => j.left.alias_or_collection(),
        }
    }

    /// Every alias (or bare collection name) this clause introduces. Used by the parser
    /// to tell a `table.column` qualification apart from a dotted nested-field path —
    /// only a left segment that names a real alias is a qualification.
    pub fn aliases(&self) -> std::collections::BTreeSet<String> {
        match self {
            FromClause::List(list) => list.iter().map(|f| f.alias_or_collection().to_string()).collect(),
            FromClause::Join(j) => {
                std::collections::BTreeSet::from([j.left.alias_or_collection().to_string(), j.right.alias_or_collection().to_string()])
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub columns: Vec<ColumnRef>,
    pub from: FromClause,
    pub where_clause: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: FromSpec,
    pub columns: Vec<ColumnRef>,
    pub values: Vec<Value>,
}

/// A single `SET column = literal` assignment. Copy-from-column (`SET a = b`) is not
/// supported — see spec §9 Open Questions.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub table: FromSpec,
    pub sets: Vec<Assignment>,
    pub where_clause: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub table: FromSpec,
    pub where_clause: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(Select),
    Insert(Insert),
    Update(Update),
    Delete(Delete),
}
