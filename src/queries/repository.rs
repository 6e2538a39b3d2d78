use std::collections::HashMap;

use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};
use sqlx::{
    Executor, FromRow, QueryBuilder, Sqlite, SqlitePool, sqlite::SqliteRow, types::Json,
};
use tracing::debug;
use validator::Validate;

use crate::{
    error::{AppError, Result},
    models::ListQuery,
    queries::filters::{ListRequest, Predicate, param},
};

/// SQLite's default cap on `?` parameters in one statement.
pub const MAX_BIND_VARIABLES: usize = 32766;

/// A column bound into a dynamically built statement.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(Option<i64>),
    Real(Option<f64>),
    Text(Option<String>),
    Bool(bool),
    Json(Option<serde_json::Value>),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(Some(value.into()))
    }

    pub fn push_bind(&self, builder: &mut QueryBuilder<'_, Sqlite>) {
        match self.clone() {
            FieldValue::Int(v) => {
                builder.push_bind(v);
            }
            FieldValue::Real(v) => {
                builder.push_bind(v);
            }
            FieldValue::Text(v) => {
                builder.push_bind(v);
            }
            FieldValue::Bool(v) => {
                builder.push_bind(v);
            }
            FieldValue::Json(v) => {
                builder.push_bind(v.map(Json));
            }
        }
    }
}

/// Ordered column assignments for an insert or a partial update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assignments {
    fields: Vec<(&'static str, FieldValue)>,
}

impl Assignments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, column: &'static str, value: FieldValue) -> Self {
        self.fields.push((column, value));
        self
    }

    /// Assigns only when a value was supplied; used by partial updates.
    pub fn set_some(self, column: &'static str, value: Option<FieldValue>) -> Self {
        match value {
            Some(value) => self.set(column, value),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn columns(&self) -> Vec<&'static str> {
        self.fields.iter().map(|(column, _)| *column).collect()
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, value)| value)
    }
}

/// Rows elsewhere that block deleting an entity while they point at it.
#[derive(Debug, Clone, Copy)]
pub struct DeleteGuard {
    pub table: &'static str,
    pub column: &'static str,
    pub dependents: &'static str,
}

/// Per-table configuration of the shared repository.
pub trait Entity:
    for<'r> FromRow<'r, SqliteRow> + Serialize + Send + Sync + Unpin + 'static
{
    const TABLE: &'static str;
    const NAME: &'static str;
    const SEARCH_COLUMNS: &'static [&'static str] = &["name"];
    const SORT_FIELDS: &'static [(&'static str, &'static str)] = &[
        ("name", "name"),
        ("createdAt", "created_at"),
        ("updatedAt", "updated_at"),
    ];
    const DELETE_GUARDS: &'static [DeleteGuard] = &[];

    fn id(&self) -> i64;

    fn predicate(query: &ListQuery) -> Result<Predicate> {
        Ok(Predicate::searching(param(&query.search), Self::SEARCH_COLUMNS))
    }
}

/// A validated request body that maps onto an entity's columns.
pub trait Changeset: DeserializeOwned + Validate + Send + 'static {
    fn into_assignments(self) -> Assignments;
}

pub async fn list<E: Entity>(pool: &SqlitePool, request: &ListRequest) -> Result<(Vec<E>, i64)> {
    let mut count = QueryBuilder::<Sqlite>::new(format!("SELECT COUNT(*) FROM {}", E::TABLE));
    request.predicate.push_where(E::TABLE, &mut count);
    let total: i64 = count.build_query_scalar::<i64>().fetch_one(pool).await?;

    let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT * FROM {}", E::TABLE));
    request.predicate.push_where(E::TABLE, &mut select);
    request.sort.push_order_by(E::TABLE, &mut select);
    request.page.push_limit(&mut select);

    let items = select.build_query_as::<E>().fetch_all(pool).await?;

    debug!(table = E::TABLE, total, returned = items.len(), "Listed rows");
    Ok((items, total))
}

pub async fn find_by_id<'e, E, X>(executor: X, id: i64) -> Result<Option<E>>
where
    E: Entity,
    X: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT * FROM {} WHERE id = ?", E::TABLE);
    let row = sqlx::query_as::<_, E>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(row)
}

pub async fn get_by_id<E: Entity>(pool: &SqlitePool, id: i64) -> Result<E> {
    find_by_id::<E, _>(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(E::NAME, id))
}

pub async fn find_by_column<E: Entity>(
    pool: &SqlitePool,
    column: &'static str,
    value: &str,
) -> Result<Option<E>> {
    let sql = format!("SELECT * FROM {} WHERE {} = ?", E::TABLE, column);
    let row = sqlx::query_as::<_, E>(&sql)
        .bind(value)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Loads rows by id, keyed by id. Large id sets are split across queries.
pub async fn find_many<E: Entity>(pool: &SqlitePool, ids: &[i64]) -> Result<HashMap<i64, E>> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();

    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut found = HashMap::with_capacity(ids.len());
    for chunk in ids.chunks(MAX_BIND_VARIABLES) {
        let mut query =
            QueryBuilder::<Sqlite>::new(format!("SELECT * FROM {} WHERE id IN (", E::TABLE));
        push_id_list(&mut query, chunk);
        query.push(")");

        let rows = query.build_query_as::<E>().fetch_all(pool).await?;
        found.extend(rows.into_iter().map(|row| (row.id(), row)));
    }

    Ok(found)
}

pub async fn exists<'e, E, X>(executor: X, id: i64) -> Result<bool>
where
    E: Entity,
    X: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT COUNT(*) FROM {} WHERE id = ?", E::TABLE);
    let count: i64 = sqlx::query_scalar::<_, i64>(&sql)
        .bind(id)
        .fetch_one(executor)
        .await?;

    Ok(count > 0)
}

/// Rejects a body whose `field` points at a missing `E`.
pub async fn ensure_reference<'e, E, X>(executor: X, field: &str, id: Option<i64>) -> Result<()>
where
    E: Entity,
    X: Executor<'e, Database = Sqlite>,
{
    let Some(id) = id else {
        return Ok(());
    };

    if !exists::<E, _>(executor, id).await? {
        return Err(AppError::Validation(format!(
            "{} {} does not reference an existing {}",
            field,
            id,
            E::NAME.to_lowercase()
        )));
    }

    Ok(())
}

pub async fn insert<'e, E, X>(executor: X, values: &Assignments) -> Result<E>
where
    E: Entity,
    X: Executor<'e, Database = Sqlite>,
{
    debug!(table = E::TABLE, columns = ?values.columns(), "Inserting row");

    let now = Utc::now();
    let mut query = QueryBuilder::<Sqlite>::new(format!("INSERT INTO {} (", E::TABLE));

    for (column, _) in &values.fields {
        query.push(column);
        query.push(", ");
    }
    query.push("created_at, updated_at) VALUES (");

    for (_, value) in &values.fields {
        value.push_bind(&mut query);
        query.push(", ");
    }
    query.push_bind(now);
    query.push(", ");
    query.push_bind(now);
    query.push(") RETURNING *");

    query
        .build_query_as::<E>()
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_store(e, E::NAME))
}

/// Applies a partial update; `None` when the row does not exist.
pub async fn update<'e, E, X>(executor: X, id: i64, values: &Assignments) -> Result<Option<E>>
where
    E: Entity,
    X: Executor<'e, Database = Sqlite>,
{
    if values.is_empty() {
        return find_by_id::<E, _>(executor, id).await;
    }

    debug!(table = E::TABLE, id, columns = ?values.columns(), "Updating row");

    let mut query = QueryBuilder::<Sqlite>::new(format!("UPDATE {} SET ", E::TABLE));

    for (column, value) in &values.fields {
        query.push(format!("{} = ", column));
        value.push_bind(&mut query);
        query.push(", ");
    }

    query.push("updated_at = ");
    query.push_bind(Utc::now());
    query.push(" WHERE id = ");
    query.push_bind(id);
    query.push(" RETURNING *");

    query
        .build_query_as::<E>()
        .fetch_optional(executor)
        .await
        .map_err(|e| AppError::from_store(e, E::NAME))
}

/// Deletes a row after checking its delete guards, all in one transaction.
pub async fn delete<E: Entity>(pool: &SqlitePool, id: i64) -> Result<()> {
    let mut tx = pool.begin().await?;

    if !exists::<E, _>(&mut *tx, id).await? {
        return Err(AppError::not_found(E::NAME, id));
    }

    let mut blockers = Vec::new();
    for guard in E::DELETE_GUARDS {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE {} = ?", guard.table, guard.column);
        let count: i64 = sqlx::query_scalar::<_, i64>(&sql)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        if count > 0 {
            blockers.push(format!("{} {}", count, guard.dependents));
        }
    }

    if !blockers.is_empty() {
        return Err(AppError::Conflict(format!(
            "Cannot delete {} {}: it is still referenced by {}",
            E::NAME.to_lowercase(),
            id,
            blockers.join(" and ")
        )));
    }

    let sql = format!("DELETE FROM {} WHERE id = ?", E::TABLE);
    sqlx::query(&sql)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::from_store(e, E::NAME))?;

    tx.commit().await?;

    debug!(table = E::TABLE, id, "Deleted row");
    Ok(())
}

/// Multi-row insert that silently skips rows colliding with a unique key.
/// Every row must assign the same columns in the same order. Batches are
/// split into statements under SQLite's bind limit and run in one transaction.
pub async fn insert_ignoring_duplicates<E: Entity>(
    pool: &SqlitePool,
    rows: &[Assignments],
) -> Result<u64> {
    let Some(first) = rows.first() else {
        return Ok(0);
    };

    let columns = first.columns();
    if rows.iter().any(|row| row.columns() != columns) {
        return Err(AppError::Internal(format!(
            "Bulk insert into {} received rows with differing columns",
            E::TABLE
        )));
    }

    // Two extra binds per row for the timestamps.
    let rows_per_statement = (MAX_BIND_VARIABLES / (columns.len() + 2)).max(1);
    let now = Utc::now();
    let mut inserted = 0;

    let mut tx = pool.begin().await?;

    for chunk in rows.chunks(rows_per_statement) {
        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "INSERT OR IGNORE INTO {} ({}, created_at, updated_at) VALUES ",
            E::TABLE,
            columns.join(", ")
        ));

        for (i, row) in chunk.iter().enumerate() {
            if i > 0 {
                query.push(", ");
            }
            query.push("(");
            for (_, value) in &row.fields {
                value.push_bind(&mut query);
                query.push(", ");
            }
            query.push_bind(now);
            query.push(", ");
            query.push_bind(now);
            query.push(")");
        }

        let result = query
            .build()
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::from_store(e, E::NAME))?;
        inserted += result.rows_affected();
    }

    tx.commit().await?;

    debug!(
        table = E::TABLE,
        submitted = rows.len(),
        inserted,
        "Bulk inserted rows"
    );

    Ok(inserted)
}

pub fn push_id_list(query: &mut QueryBuilder<'_, Sqlite>, ids: &[i64]) {
    let mut separated = query.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_some_skips_absent_values() {
        let values = Assignments::new()
            .set_some("name", Some(FieldValue::text("Teal")))
            .set_some("hex_code", None)
            .set("is_active", FieldValue::Bool(true));

        assert_eq!(values.columns(), vec!["name", "is_active"]);
        assert_eq!(values.get("name"), Some(&FieldValue::text("Teal")));
        assert!(values.get("hex_code").is_none());
    }

    #[test]
    fn id_list_is_bound_not_inlined() {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM colors WHERE id IN (");
        push_id_list(&mut query, &[3, 7, 9]);
        query.push(")");
        assert_eq!(query.sql(), "SELECT * FROM colors WHERE id IN (?, ?, ?)");
    }
}
