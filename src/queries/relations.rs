use std::collections::HashMap;

use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::{
    error::{AppError, Result},
    models::{Collection, Product, Variant},
    queries::repository::{MAX_BIND_VARIABLES, push_id_list},
};

/// Join table tying collections to one kind of owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionLink {
    Products,
    Variants,
}

impl CollectionLink {
    pub fn table(self) -> &'static str {
        match self {
            CollectionLink::Products => "collection_products",
            CollectionLink::Variants => "collection_variants",
        }
    }

    pub fn owner_column(self) -> &'static str {
        match self {
            CollectionLink::Products => "product_id",
            CollectionLink::Variants => "variant_id",
        }
    }
}

#[derive(sqlx::FromRow)]
struct LinkedCollection {
    owner_id: i64,
    #[sqlx(flatten)]
    collection: Collection,
}

/// Replaces the owner's whole collection set. Must run inside the caller's
/// transaction.
pub async fn replace_collections(
    conn: &mut SqliteConnection,
    link: CollectionLink,
    owner_id: i64,
    collection_ids: &[i64],
) -> Result<()> {
    let mut ids = collection_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();

    if !ids.is_empty() {
        let mut found = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(MAX_BIND_VARIABLES) {
            let mut query =
                QueryBuilder::<Sqlite>::new("SELECT id FROM collections WHERE id IN (");
            push_id_list(&mut query, chunk);
            query.push(")");
            found.extend(query.build_query_scalar::<i64>().fetch_all(&mut *conn).await?);
        }

        let missing: Vec<String> = ids
            .iter()
            .filter(|id| !found.contains(id))
            .map(|id| id.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "collectionIds {} do not reference existing collections",
                missing.join(", ")
            )));
        }
    }

    let sql = format!(
        "DELETE FROM {} WHERE {} = ?",
        link.table(),
        link.owner_column()
    );
    sqlx::query(&sql).bind(owner_id).execute(&mut *conn).await?;

    for chunk in ids.chunks(MAX_BIND_VARIABLES / 2) {
        let mut insert = QueryBuilder::<Sqlite>::new(format!(
            "INSERT INTO {} (collection_id, {}) ",
            link.table(),
            link.owner_column()
        ));
        insert.push_values(chunk.iter(), |mut row, id| {
            row.push_bind(*id).push_bind(owner_id);
        });
        insert.build().execute(&mut *conn).await?;
    }

    debug!(link = link.table(), owner_id, count = ids.len(), "Replaced collections");
    Ok(())
}

/// Collections of each owner, keyed by owner id, ordered by name.
pub async fn collections_for(
    pool: &SqlitePool,
    link: CollectionLink,
    owner_ids: &[i64],
) -> Result<HashMap<i64, Vec<Collection>>> {
    let mut grouped: HashMap<i64, Vec<Collection>> = HashMap::new();

    // Each owner lands in exactly one chunk, so per-owner ordering holds.
    for chunk in owner_ids.chunks(MAX_BIND_VARIABLES) {
        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT l.{owner} AS owner_id, c.* FROM {table} l \
             JOIN collections c ON c.id = l.collection_id \
             WHERE l.{owner} IN (",
            owner = link.owner_column(),
            table = link.table()
        ));
        push_id_list(&mut query, chunk);
        query.push(") ORDER BY c.name, c.id");

        let rows = query
            .build_query_as::<LinkedCollection>()
            .fetch_all(pool)
            .await?;

        for row in rows {
            grouped.entry(row.owner_id).or_default().push(row.collection);
        }
    }

    Ok(grouped)
}

/// Variants of each product, keyed by product id.
pub async fn variants_for_products(
    pool: &SqlitePool,
    product_ids: &[i64],
) -> Result<HashMap<i64, Vec<Variant>>> {
    let mut grouped: HashMap<i64, Vec<Variant>> = HashMap::new();

    for chunk in product_ids.chunks(MAX_BIND_VARIABLES) {
        let mut query =
            QueryBuilder::<Sqlite>::new("SELECT * FROM product_variants WHERE product_id IN (");
        push_id_list(&mut query, chunk);
        query.push(") ORDER BY id");

        let variants = query.build_query_as::<Variant>().fetch_all(pool).await?;
        for variant in variants {
            grouped.entry(variant.product_id).or_default().push(variant);
        }
    }

    Ok(grouped)
}

pub async fn products_in_collection(pool: &SqlitePool, collection_id: i64) -> Result<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT p.* FROM products p
         JOIN collection_products cp ON cp.product_id = p.id
         WHERE cp.collection_id = ?
         ORDER BY p.name, p.id",
    )
    .bind(collection_id)
    .fetch_all(pool)
    .await?;

    Ok(products)
}

pub async fn variants_in_collection(pool: &SqlitePool, collection_id: i64) -> Result<Vec<Variant>> {
    let variants = sqlx::query_as::<_, Variant>(
        "SELECT v.* FROM product_variants v
         JOIN collection_variants cv ON cv.variant_id = v.id
         WHERE cv.collection_id = ?
         ORDER BY v.variant_id, v.id",
    )
    .bind(collection_id)
    .fetch_all(pool)
    .await?;

    Ok(variants)
}
