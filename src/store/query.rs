//! Relational select description consumed by sessions: one source (table or view),
//! inner joins, a predicate tree, ordering and paging.

use crate::config::StorageTable;
use crate::field::FieldValue;
use std::ops::{BitAnd, BitOr, Not};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    /// `None` refers to the query's source.
    pub table: Option<String>,
    pub name: String,
}

/// Column of the query's source.
pub fn col(name: &str) -> ColumnRef {
    ColumnRef { table: None, name: name.to_string() }
}

impl ColumnRef {
    pub fn qualified(table: &str, name: &str) -> Self {
        Self { table: Some(table.to_string()), name: name.to_string() }
    }

    fn compare(self, op: CompareOp, value: impl Into<FieldValue>) -> Predicate {
        Predicate::Compare { column: self, op, value: value.into() }
    }

    pub fn eq(self, value: impl Into<FieldValue>) -> Predicate {
        self.compare(CompareOp::Eq, value)
    }

    pub fn ne(self, value: impl Into<FieldValue>) -> Predicate {
        self.compare(CompareOp::Ne, value)
    }

    pub fn lt(self, value: impl Into<FieldValue>) -> Predicate {
        self.compare(CompareOp::Lt, value)
    }

    pub fn lte(self, value: impl Into<FieldValue>) -> Predicate {
        self.compare(CompareOp::Lte, value)
    }

    pub fn gt(self, value: impl Into<FieldValue>) -> Predicate {
        self.compare(CompareOp::Gt, value)
    }

    pub fn gte(self, value: impl Into<FieldValue>) -> Predicate {
        self.compare(CompareOp::Gte, value)
    }

    pub fn starts_with(self, prefix: &str) -> Predicate {
        Predicate::StartsWith { column: self, prefix: prefix.to_string() }
    }

    pub fn is_null(self) -> Predicate {
        Predicate::IsNull(self)
    }

    pub fn is_not_null(self) -> Predicate {
        Predicate::IsNotNull(self)
    }

    pub fn in_<I, V>(self, values: I) -> Predicate
    where
        I: IntoIterator<Item = V>,
        V: Into<FieldValue>,
    {
        Predicate::In { column: self, values: values.into_iter().map(Into::into).collect() }
    }

    pub fn eq_col(self, other: ColumnRef) -> Predicate {
        Predicate::ColumnsEq(self, other)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CompareOp {
    pub fn sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
        }
    }
}

/// Predicate tree with SQL three-valued semantics: comparisons against null are unknown.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    Compare { column: ColumnRef, op: CompareOp, value: FieldValue },
    StartsWith { column: ColumnRef, prefix: String },
    IsNull(ColumnRef),
    IsNotNull(ColumnRef),
    In { column: ColumnRef, values: Vec<FieldValue> },
    ColumnsEq(ColumnRef, ColumnRef),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl BitAnd for Predicate {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        match self {
            Predicate::And(mut preds) => {
                preds.push(rhs);
                Predicate::And(preds)
            }
            lhs => Predicate::And(vec![lhs, rhs]),
        }
    }
}

impl BitOr for Predicate {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        match self {
            Predicate::Or(mut preds) => {
                preds.push(rhs);
                Predicate::Or(preds)
            }
            lhs => Predicate::Or(vec![lhs, rhs]),
        }
    }
}

impl Not for Predicate {
    type Output = Self;

    fn not(self) -> Self::Output {
        Predicate::Not(Box::new(self))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderBy {
    pub column: ColumnRef,
    pub direction: Direction,
}

#[derive(Clone, Debug)]
pub struct Join {
    pub table: StorageTable,
    pub on: Predicate,
}

#[derive(Clone, Debug)]
pub struct SelectQuery {
    pub source: StorageTable,
    pub joins: Vec<Join>,
    pub predicate: Option<Predicate>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl SelectQuery {
    pub fn new(source: StorageTable) -> Self {
        Self {
            source,
            joins: Vec::new(),
            predicate: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Same filter without ordering or paging, as counted.
    pub fn for_count(&self) -> Self {
        Self {
            order_by: Vec::new(),
            limit: None,
            offset: None,
            ..self.clone()
        }
    }

    /// Resolve a column reference to its table name.
    pub fn table_of<'a>(&'a self, column: &'a ColumnRef) -> &'a str {
        column.table.as_deref().unwrap_or(&self.source.name)
    }

    pub fn table(&self, name: &str) -> Option<&StorageTable> {
        if self.source.name == name {
            Some(&self.source)
        } else {
            self.joins.iter().map(|j| &j.table).find(|t| t.name == name)
        }
    }
}
