//! In-process session. Tables are maps keyed by id; pattern views are
//! materialized from their member tables on every read.

use crate::config::{Registry, StorageTable, ViewMember, ENT_TYPE_COLUMN, ID_COLUMN};
use crate::error::EntError;
use crate::field::FieldValue;
use crate::store::{ColumnRef, CompareOp, Direction, Predicate, Record, SelectQuery, Session};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

type Table = BTreeMap<Uuid, Record>;
type Row<'a> = Vec<(&'a str, &'a Record)>;

struct ViewDef {
    columns: Vec<String>,
    members: Vec<ViewMember>,
}

pub struct MemorySession {
    views: HashMap<String, ViewDef>,
    tables: RwLock<HashMap<String, Table>>,
}

impl MemorySession {
    /// Session knowing the views of every pattern in `registry`.
    pub fn new(registry: &Registry) -> Self {
        let views = registry
            .patterns()
            .iter()
            .map(|p| {
                let def = ViewDef {
                    columns: p.view.column_names().map(str::to_string).collect(),
                    members: p.members.clone(),
                };
                (p.view.name.clone(), def)
            })
            .collect();
        Self { views, tables: RwLock::new(HashMap::new()) }
    }

    pub async fn row_count(&self, table: &str) -> usize {
        self.tables.read().await.get(table).map_or(0, |t| t.len())
    }

    fn rows_of(&self, tables: &HashMap<String, Table>, name: &str) -> Vec<Record> {
        if let Some(view) = self.views.get(name) {
            let mut rows = Vec::new();
            for member in &view.members {
                let Some(table) = tables.get(&member.table) else {
                    continue;
                };
                for record in table.values() {
                    let mut row = Record::new();
                    row.set(ENT_TYPE_COLUMN, member.discriminator.as_str());
                    for column in view.columns.iter().filter(|c| *c != ENT_TYPE_COLUMN) {
                        row.set(column.as_str(), record.get(column).clone());
                    }
                    rows.push(row);
                }
            }
            return rows;
        }
        tables.get(name).map(|t| t.values().cloned().collect()).unwrap_or_default()
    }

    async fn matching(&self, query: &SelectQuery) -> Vec<Record> {
        let tables = self.tables.read().await;
        let source_rows = self.rows_of(&tables, &query.source.name);
        let join_rows: Vec<Vec<Record>> = query
            .joins
            .iter()
            .map(|j| self.rows_of(&tables, &j.table.name))
            .collect();

        let mut rows: Vec<Row<'_>> = source_rows
            .iter()
            .map(|r| vec![(query.source.name.as_str(), r)])
            .collect();
        for (join, candidates) in query.joins.iter().zip(&join_rows) {
            let mut joined = Vec::new();
            for row in &rows {
                for candidate in candidates {
                    let mut next = row.clone();
                    next.push((join.table.name.as_str(), candidate));
                    if eval(&join.on, &next) == Some(true) {
                        joined.push(next);
                    }
                }
            }
            rows = joined;
        }
        if let Some(predicate) = &query.predicate {
            rows.retain(|row| eval(predicate, row) == Some(true));
        }
        rows.sort_by(|a, b| {
            for order in &query.order_by {
                let ord = cmp_nulls_last(lookup(a, &order.column), lookup(b, &order.column));
                let ord = match order.direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
        let offset = query.offset.unwrap_or(0) as usize;
        let limit = query.limit.map_or(usize::MAX, |l| l as usize);
        rows.into_iter()
            .skip(offset)
            .take(limit)
            .map(|row| row[0].1.clone())
            .collect()
    }
}

fn check_unique(
    table: &StorageTable,
    rows: &Table,
    record: &Record,
    skip: Option<Uuid>,
) -> Result<(), EntError> {
    for column in table.columns.iter().filter(|c| c.unique) {
        let value = record.get(&column.name);
        if value.is_null() {
            continue;
        }
        let taken = rows
            .iter()
            .any(|(id, row)| Some(*id) != skip && row.get(&column.name) == value);
        if taken {
            return Err(EntError::Execution(format!(
                "duplicate key value violates unique constraint on {}.{}",
                table.name, column.name
            )));
        }
    }
    Ok(())
}

#[async_trait]
impl Session for MemorySession {
    async fn fetch_by_id(&self, table: &StorageTable, id: Uuid) -> Result<Option<Record>, EntError> {
        let tables = self.tables.read().await;
        Ok(tables.get(&table.name).and_then(|t| t.get(&id)).cloned())
    }

    async fn insert(&self, table: &StorageTable, record: &Record) -> Result<(), EntError> {
        let id = record
            .id()
            .ok_or_else(|| EntError::Execution(format!("insert into {} without {}", table.name, ID_COLUMN)))?;
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.name.clone()).or_default();
        if rows.contains_key(&id) {
            return Err(EntError::Execution(format!(
                "duplicate key value violates unique constraint {}_pkey",
                table.name
            )));
        }
        check_unique(table, rows, record, None)?;
        let mut row: Record = table
            .column_names()
            .map(|c| (c.to_string(), FieldValue::Null))
            .collect();
        row.merge(record);
        rows.insert(id, row);
        Ok(())
    }

    async fn update(&self, table: &StorageTable, id: Uuid, changes: &Record) -> Result<(), EntError> {
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(&table.name) else {
            return Ok(());
        };
        let Some(current) = rows.get(&id) else {
            return Ok(());
        };
        let mut updated = current.clone();
        updated.merge(changes);
        check_unique(table, rows, &updated, Some(id))?;
        rows.insert(id, updated);
        Ok(())
    }

    async fn delete(&self, table: &StorageTable, id: Uuid) -> Result<(), EntError> {
        let mut tables = self.tables.write().await;
        if let Some(rows) = tables.get_mut(&table.name) {
            rows.remove(&id);
        }
        Ok(())
    }

    async fn select(&self, query: &SelectQuery) -> Result<Vec<Record>, EntError> {
        Ok(self.matching(query).await)
    }

    async fn count(&self, query: &SelectQuery) -> Result<Option<i64>, EntError> {
        let n = self.matching(&query.for_count()).await.len();
        Ok(Some(n as i64))
    }
}

fn lookup<'a>(row: &[(&str, &'a Record)], column: &ColumnRef) -> &'a FieldValue {
    static NULL: FieldValue = FieldValue::Null;
    let record = match &column.table {
        None => row.first().map(|(_, r)| *r),
        Some(table) => row.iter().find(|(name, _)| name == table).map(|(_, r)| *r),
    };
    record.map_or(&NULL, |r| r.get(&column.name))
}

fn values_equal(a: &FieldValue, b: &FieldValue) -> bool {
    a == b || a.compare(b) == Some(Ordering::Equal)
}

fn cmp_nulls_last(a: &FieldValue, b: &FieldValue) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.compare(b).unwrap_or(Ordering::Equal),
    }
}

/// Three-valued evaluation; `None` is SQL unknown.
fn eval(predicate: &Predicate, row: &[(&str, &Record)]) -> Option<bool> {
    match predicate {
        Predicate::Compare { column, op, value } => {
            let current = lookup(row, column);
            if current.is_null() || value.is_null() {
                return None;
            }
            match op {
                CompareOp::Eq => Some(values_equal(current, value)),
                CompareOp::Ne => Some(!values_equal(current, value)),
                _ => {
                    let ord = current.compare(value)?;
                    Some(match op {
                        CompareOp::Lt => ord.is_lt(),
                        CompareOp::Lte => ord.is_le(),
                        CompareOp::Gt => ord.is_gt(),
                        _ => ord.is_ge(),
                    })
                }
            }
        }
        Predicate::StartsWith { column, prefix } => {
            let current = lookup(row, column);
            if current.is_null() {
                return None;
            }
            Some(current.as_str().map_or(false, |s| s.starts_with(prefix.as_str())))
        }
        Predicate::IsNull(column) => Some(lookup(row, column).is_null()),
        Predicate::IsNotNull(column) => Some(!lookup(row, column).is_null()),
        Predicate::In { column, values } => {
            let current = lookup(row, column);
            if current.is_null() {
                return None;
            }
            if values.iter().any(|v| values_equal(current, v)) {
                Some(true)
            } else if values.iter().any(FieldValue::is_null) {
                None
            } else {
                Some(false)
            }
        }
        Predicate::ColumnsEq(left, right) => {
            let (a, b) = (lookup(row, left), lookup(row, right));
            if a.is_null() || b.is_null() {
                return None;
            }
            Some(values_equal(a, b))
        }
        Predicate::And(preds) => {
            let mut result = Some(true);
            for p in preds {
                match eval(p, row) {
                    Some(false) => return Some(false),
                    None => result = None,
                    Some(true) => {}
                }
            }
            result
        }
        Predicate::Or(preds) => {
            let mut result = Some(false);
            for p in preds {
                match eval(p, row) {
                    Some(true) => return Some(true),
                    None => result = None,
                    Some(false) => {}
                }
            }
            result
        }
        Predicate::Not(inner) => eval(inner, row).map(|b| !b),
    }
}
