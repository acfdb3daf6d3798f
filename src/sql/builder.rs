//! Builds parameterized SELECT, INSERT, UPDATE, DELETE and COUNT statements.

use crate::config::{ColumnInfo, StorageTable, ID_COLUMN};
use crate::field::FieldValue;
use crate::sql::ddl::column_type;
use crate::sql::{qualified, quoted, PgBindValue};
use crate::store::{ColumnRef, Direction, Predicate, Record, SelectQuery};
use uuid::Uuid;

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<PgBindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: &FieldValue) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(PgBindValue::from(v));
        n
    }

    /// `$n::type` placeholder for `v`.
    fn placeholder(&mut self, v: &FieldValue, cast: &str) -> String {
        let n = self.push_param(v);
        format!("${}::{}", n, cast)
    }
}

/// Column as selected: enums come back as text so rows decode without custom types.
fn select_expr(alias: &str, column: &ColumnInfo) -> String {
    let expr = format!("{}.{}", quoted(alias), quoted(&column.name));
    if column.is_enum() {
        format!("{}::text AS {}", expr, quoted(&column.name))
    } else {
        expr
    }
}

fn select_list(table: &StorageTable) -> String {
    table
        .columns
        .iter()
        .map(|c| select_expr(&table.name, c))
        .collect::<Vec<_>>()
        .join(", ")
}

fn from_clause(table: &StorageTable, schema: Option<&str>) -> String {
    format!("{} AS {}", qualified(schema, &table.name), quoted(&table.name))
}

pub fn select_by_id(table: &StorageTable, id: Uuid, schema: Option<&str>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.placeholder(&FieldValue::Uuid(id), "uuid");
    q.sql = format!(
        "SELECT {} FROM {} WHERE {}.{} = {}",
        select_list(table),
        from_clause(table, schema),
        quoted(&table.name),
        quoted(ID_COLUMN),
        ph
    );
    q
}

/// INSERT of the record's columns that exist in the table, in table order.
pub fn insert(table: &StorageTable, record: &Record, schema: Option<&str>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut names = Vec::new();
    let mut values = Vec::new();
    for c in table.columns.iter().filter(|c| record.contains(&c.name)) {
        names.push(quoted(&c.name));
        values.push(q.placeholder(record.get(&c.name), &column_type(c, schema)));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        qualified(schema, &table.name),
        names.join(", "),
        values.join(", ")
    );
    q
}

/// UPDATE of the changed columns. None when nothing in `changes` maps to a column.
pub fn update(table: &StorageTable, id: Uuid, changes: &Record, schema: Option<&str>) -> Option<QueryBuf> {
    let mut q = QueryBuf::new();
    let sets: Vec<String> = table
        .columns
        .iter()
        .filter(|c| !c.primary_key && changes.contains(&c.name))
        .map(|c| {
            let ph = q.placeholder(changes.get(&c.name), &column_type(c, schema));
            format!("{} = {}", quoted(&c.name), ph)
        })
        .collect();
    if sets.is_empty() {
        return None;
    }
    let ph = q.placeholder(&FieldValue::Uuid(id), "uuid");
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {}",
        qualified(schema, &table.name),
        sets.join(", "),
        quoted(ID_COLUMN),
        ph
    );
    Some(q)
}

pub fn delete(table: &StorageTable, id: Uuid, schema: Option<&str>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.placeholder(&FieldValue::Uuid(id), "uuid");
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {}",
        qualified(schema, &table.name),
        quoted(ID_COLUMN),
        ph
    );
    q
}

pub fn select(query: &SelectQuery, schema: Option<&str>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let body = body(&mut q, query, schema);
    let mut sql = format!("SELECT {} {}", select_list(&query.source), body);
    if !query.order_by.is_empty() {
        let parts: Vec<String> = query
            .order_by
            .iter()
            .map(|o| {
                let dir = match o.direction {
                    Direction::Asc => "ASC",
                    Direction::Desc => "DESC",
                };
                format!("{} {}", column_expr(query, &o.column), dir)
            })
            .collect();
        sql.push_str(&format!(" ORDER BY {}", parts.join(", ")));
    }
    if let Some(limit) = query.limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }
    if let Some(offset) = query.offset {
        sql.push_str(&format!(" OFFSET {}", offset));
    }
    q.sql = sql;
    q
}

/// COUNT over the same FROM/JOIN/WHERE, without ordering or paging.
pub fn count(query: &SelectQuery, schema: Option<&str>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let body = body(&mut q, query, schema);
    q.sql = format!("SELECT COUNT(*) {}", body);
    q
}

fn body(q: &mut QueryBuf, query: &SelectQuery, schema: Option<&str>) -> String {
    let mut sql = format!("FROM {}", from_clause(&query.source, schema));
    for join in &query.joins {
        let on = render_predicate(q, query, &join.on, schema);
        sql.push_str(&format!(" JOIN {} ON {}", from_clause(&join.table, schema), on));
    }
    if let Some(predicate) = &query.predicate {
        let cond = render_predicate(q, query, predicate, schema);
        sql.push_str(&format!(" WHERE {}", cond));
    }
    sql
}

fn column_info<'a>(query: &'a SelectQuery, column: &ColumnRef) -> Option<&'a ColumnInfo> {
    query.table(query.table_of(column)).and_then(|t| t.column(&column.name))
}

fn column_expr(query: &SelectQuery, column: &ColumnRef) -> String {
    format!("{}.{}", quoted(query.table_of(column)), quoted(&column.name))
}

/// Comparison operands: enum columns compare by variant name, other columns cast the
/// parameter to the column type, unknown columns cast by the value's kind.
fn operand(q: &mut QueryBuf, query: &SelectQuery, column: &ColumnRef, value: &FieldValue, schema: Option<&str>) -> (String, String) {
    let lhs = column_expr(query, column);
    match column_info(query, column) {
        Some(info) if info.is_enum() => (format!("{}::text", lhs), q.placeholder(value, "text")),
        Some(info) => (lhs, q.placeholder(value, &column_type(info, schema))),
        None => (lhs, q.placeholder(value, value_cast(value))),
    }
}

fn value_cast(value: &FieldValue) -> &'static str {
    match value {
        FieldValue::Bool(_) => "boolean",
        FieldValue::Int(_) => "bigint",
        FieldValue::Datetime(_) => "timestamptz",
        FieldValue::Time(_) => "time",
        FieldValue::Uuid(_) => "uuid",
        FieldValue::Json(_) => "jsonb",
        FieldValue::Null | FieldValue::String(_) | FieldValue::Enum(_) => "text",
    }
}

fn escape_like(prefix: &str) -> String {
    prefix.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

fn render_predicate(q: &mut QueryBuf, query: &SelectQuery, predicate: &Predicate, schema: Option<&str>) -> String {
    match predicate {
        Predicate::Compare { column, op, value } => {
            let (lhs, rhs) = operand(q, query, column, value, schema);
            format!("{} {} {}", lhs, op.sql(), rhs)
        }
        Predicate::StartsWith { column, prefix } => {
            let pattern = FieldValue::String(format!("{}%", escape_like(prefix)));
            let ph = q.placeholder(&pattern, "text");
            format!("{}::text LIKE {}", column_expr(query, column), ph)
        }
        Predicate::IsNull(column) => format!("{} IS NULL", column_expr(query, column)),
        Predicate::IsNotNull(column) => format!("{} IS NOT NULL", column_expr(query, column)),
        Predicate::In { column, values } => {
            if values.is_empty() {
                return "FALSE".to_string();
            }
            let mut lhs = column_expr(query, column);
            let mut phs = Vec::with_capacity(values.len());
            for v in values {
                let (l, ph) = operand(q, query, column, v, schema);
                lhs = l;
                phs.push(ph);
            }
            format!("{} IN ({})", lhs, phs.join(", "))
        }
        Predicate::ColumnsEq(left, right) => {
            let as_text = [left, right]
                .iter()
                .any(|c| column_info(query, c).map_or(false, ColumnInfo::is_enum));
            let (l, r) = (column_expr(query, left), column_expr(query, right));
            if as_text {
                format!("{}::text = {}::text", l, r)
            } else {
                format!("{} = {}", l, r)
            }
        }
        Predicate::And(preds) => join_preds(q, query, preds, " AND ", "TRUE", schema),
        Predicate::Or(preds) => join_preds(q, query, preds, " OR ", "FALSE", schema),
        Predicate::Not(inner) => format!("NOT ({})", render_predicate(q, query, inner, schema)),
    }
}

fn join_preds(
    q: &mut QueryBuf,
    query: &SelectQuery,
    preds: &[Predicate],
    sep: &str,
    empty: &str,
    schema: Option<&str>,
) -> String {
    if preds.is_empty() {
        return empty.to_string();
    }
    let parts: Vec<String> = preds
        .iter()
        .map(|p| format!("({})", render_predicate(q, query, p, schema)))
        .collect();
    parts.join(sep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnInfo;
    use crate::field::{EnumInfo, FieldKind};
    use crate::store::{col, Join, OrderBy};

    fn column(name: &str, kind: FieldKind) -> ColumnInfo {
        ColumnInfo {
            name: name.into(),
            kind,
            nullable: true,
            unique: false,
            indexed: false,
            primary_key: name == ID_COLUMN,
            default: None,
            references: None,
        }
    }

    fn table() -> StorageTable {
        StorageTable {
            name: "test_object".into(),
            columns: vec![
                column("id", FieldKind::Uuid),
                column("a", FieldKind::String { length: 100 }),
                column(
                    "status",
                    FieldKind::Enum(EnumInfo {
                        type_name: "Status",
                        type_path: "crate::Status",
                        variants: &["On", "Off"],
                    }),
                ),
            ],
        }
    }

    #[test]
    fn select_renders_filters_order_and_paging() {
        let mut query = SelectQuery::new(table());
        query.predicate = Some(col("a").eq("x") & col("status").eq("On"));
        query.order_by.push(OrderBy { column: col("id"), direction: Direction::Desc });
        query.limit = Some(2);
        query.offset = Some(0);
        let q = select(&query, Some("app"));
        assert_eq!(
            q.sql,
            "SELECT \"test_object\".\"id\", \"test_object\".\"a\", \"test_object\".\"status\"::text AS \"status\" \
             FROM \"app\".\"test_object\" AS \"test_object\" \
             WHERE (\"test_object\".\"a\" = $1::varchar(100)) AND (\"test_object\".\"status\"::text = $2::text) \
             ORDER BY \"test_object\".\"id\" DESC LIMIT 2 OFFSET 0"
        );
        assert_eq!(q.params, vec![PgBindValue::Text("x".into()), PgBindValue::Text("On".into())]);
    }

    #[test]
    fn count_drops_ordering_and_paging() {
        let mut query = SelectQuery::new(table());
        query.order_by.push(OrderBy { column: col("id"), direction: Direction::Asc });
        query.limit = Some(5);
        let q = count(&query, None);
        assert_eq!(q.sql, "SELECT COUNT(*) FROM \"test_object\" AS \"test_object\"");
    }

    #[test]
    fn joins_qualify_columns() {
        let mut other = table();
        other.name = "other".into();
        let mut query = SelectQuery::new(table());
        query.joins.push(Join {
            table: other,
            on: ColumnRef::qualified("other", "id").eq_col(col("id")),
        });
        query.predicate = Some(ColumnRef::qualified("other", "a").is_null());
        let q = select(&query, None);
        assert!(q.sql.contains(
            "JOIN \"other\" AS \"other\" ON \"other\".\"id\" = \"test_object\".\"id\" WHERE \"other\".\"a\" IS NULL"
        ));
    }

    #[test]
    fn empty_in_list_is_false() {
        let mut query = SelectQuery::new(table());
        query.predicate = Some(col("a").in_(Vec::<String>::new()));
        assert!(select(&query, None).sql.ends_with("WHERE FALSE"));
    }

    #[test]
    fn update_without_changes_is_skipped() {
        let id = Uuid::new_v4();
        assert!(update(&table(), id, &Record::new(), None).is_none());
        let mut changes = Record::new();
        changes.set("a", "b");
        let q = update(&table(), id, &changes, None).unwrap();
        assert_eq!(q.sql, "UPDATE \"test_object\" SET \"a\" = $1::varchar(100) WHERE \"id\" = $2::uuid");
    }
}
