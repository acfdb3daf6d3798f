//! Fluent entity queries over a schema's table or a pattern's view.

use crate::config::{Registry, ResolvedPattern, ResolvedSchema, StorageTable, ID_COLUMN};
use crate::error::EntError;
use crate::runtime::privacy::Vc;
use crate::runtime::{Ent, PatternHandle, SchemaHandle};
use crate::store::{col, ColumnRef, Direction, Join, OrderBy, Predicate, Record, SelectQuery, Session};
use std::sync::Arc;

#[derive(Clone, Debug)]
enum Target {
    Schema(SchemaHandle),
    Pattern(PatternHandle),
}

/// Builder methods mutate in place and return the same builder; terminal
/// operations run it against a session.
#[derive(Clone)]
pub struct EntQuery {
    target: Target,
    vc: Vc,
    query: SelectQuery,
}

impl EntQuery {
    pub(crate) fn for_schema(registry: Registry, schema: Arc<ResolvedSchema>, vc: Vc) -> Self {
        let query = SelectQuery::new(schema.table.clone());
        Self { target: Target::Schema(SchemaHandle::new(registry, schema)), vc, query }
    }

    pub(crate) fn for_pattern(registry: Registry, pattern: Arc<ResolvedPattern>, vc: Vc) -> Self {
        let query = SelectQuery::new(pattern.view.clone());
        Self { target: Target::Pattern(PatternHandle::new(registry, pattern)), vc, query }
    }

    pub fn vc(&self) -> &Vc {
        &self.vc
    }

    /// The relational query built so far.
    pub fn select_query(&self) -> &SelectQuery {
        &self.query
    }

    /// Inner join; qualify the joined table's columns with [`ColumnRef::qualified`].
    pub fn join(&mut self, table: &StorageTable, on: Predicate) -> &mut Self {
        self.query.joins.push(Join { table: table.clone(), on });
        self
    }

    /// Repeated calls are combined with AND.
    pub fn where_(&mut self, predicate: Predicate) -> &mut Self {
        self.query.predicate = Some(match self.query.predicate.take() {
            Some(existing) => existing & predicate,
            None => predicate,
        });
        self
    }

    pub fn order_by(&mut self, column: ColumnRef, direction: Direction) -> &mut Self {
        self.query.order_by.push(OrderBy { column, direction });
        self
    }

    pub fn order_by_id_asc(&mut self) -> &mut Self {
        self.order_by(col(ID_COLUMN), Direction::Asc)
    }

    pub fn order_by_id_desc(&mut self) -> &mut Self {
        self.order_by(col(ID_COLUMN), Direction::Desc)
    }

    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.query.limit = Some(limit);
        self
    }

    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.query.offset = Some(offset);
        self
    }

    async fn to_ent(&self, session: &dyn Session, record: Record) -> Result<Option<Ent>, EntError> {
        match &self.target {
            Target::Schema(handle) => handle.load_record(&self.vc, record).await,
            Target::Pattern(handle) => match record.id() {
                Some(id) => handle.gen(session, &self.vc, id).await,
                None => Ok(None),
            },
        }
    }

    /// Matching entities; rows the viewer may not see are dropped.
    pub async fn gen(&self, session: &dyn Session) -> Result<Vec<Ent>, EntError> {
        let records = session.select(&self.query).await?;
        let mut ents = Vec::with_capacity(records.len());
        for record in records {
            if let Some(ent) = self.to_ent(session, record).await? {
                ents.push(ent);
            }
        }
        Ok(ents)
    }

    /// First row only; `None` if it is missing or hidden.
    pub async fn gen_first(&self, session: &dyn Session) -> Result<Option<Ent>, EntError> {
        let mut first = self.query.clone();
        first.limit = Some(1);
        match session.select(&first).await?.into_iter().next() {
            Some(record) => self.to_ent(session, record).await,
            None => Ok(None),
        }
    }

    pub async fn genx_first(&self, session: &dyn Session) -> Result<Ent, EntError> {
        self.gen_first(session)
            .await?
            .ok_or_else(|| EntError::NotFound("Expected query to return an ent, got None.".into()))
    }

    /// Row count with ordering and paging dropped. Privacy is not applied.
    pub async fn gen_count_no_privacy(&self, session: &dyn Session) -> Result<i64, EntError> {
        session
            .count(&self.query.for_count())
            .await?
            .ok_or_else(|| EntError::Execution("Unable to get the count".into()))
    }
}
