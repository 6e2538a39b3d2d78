use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::info;

use crate::{
    error::{AppError, Result},
    models::{
        Color, CreateVariantRequest, Product, StockOperation, StockUpdateRequest, Style,
        UpdateVariantRequest, Variant, VariantDetail, VariantListItem,
    },
    queries::{
        relations::{self, CollectionLink},
        repository::{self, Entity},
    },
};

pub async fn create(pool: &SqlitePool, request: CreateVariantRequest) -> Result<VariantDetail> {
    let product_id = request.product_id;
    let color_id = request.color_id;
    let style_id = request.style_id;
    let (values, collection_ids) = request.into_parts();

    let mut tx = pool.begin().await?;

    repository::ensure_reference::<Product, _>(&mut *tx, "productId", Some(product_id)).await?;
    repository::ensure_reference::<Color, _>(&mut *tx, "colorId", color_id).await?;
    repository::ensure_reference::<Style, _>(&mut *tx, "styleId", style_id).await?;

    let variant: Variant = repository::insert(&mut *tx, &values).await?;

    if let Some(ids) = collection_ids {
        relations::replace_collections(&mut *tx, CollectionLink::Variants, variant.id, &ids).await?;
    }

    tx.commit().await?;

    info!("Created variant {} ({})", variant.id, variant.variant_id);
    expand_detail(pool, variant).await
}

pub async fn update(
    pool: &SqlitePool,
    id: i64,
    request: UpdateVariantRequest,
) -> Result<VariantDetail> {
    let product_id = request.product_id;
    let color_id = request.color_id;
    let style_id = request.style_id;
    let (values, collection_ids) = request.into_parts();

    let mut tx = pool.begin().await?;

    repository::ensure_reference::<Product, _>(&mut *tx, "productId", product_id).await?;
    repository::ensure_reference::<Color, _>(&mut *tx, "colorId", color_id).await?;
    repository::ensure_reference::<Style, _>(&mut *tx, "styleId", style_id).await?;

    let variant = repository::update::<Variant, _>(&mut *tx, id, &values)
        .await?
        .ok_or_else(|| AppError::not_found(Variant::NAME, id))?;

    if let Some(ids) = collection_ids {
        relations::replace_collections(&mut *tx, CollectionLink::Variants, variant.id, &ids).await?;
    }

    tx.commit().await?;

    info!("Updated variant {}", variant.id);
    expand_detail(pool, variant).await
}

/// Applies a stock change in a single statement; `subtract` floors at zero
/// and `add` refuses a sum that would not fit in an `i64`.
pub async fn update_stock(
    pool: &SqlitePool,
    id: i64,
    request: StockUpdateRequest,
) -> Result<VariantDetail> {
    let stock = request
        .stock
        .ok_or_else(|| AppError::Validation("stock: is required".to_string()))?;
    let operation = request.operation.unwrap_or_default();

    let mut query = QueryBuilder::<Sqlite>::new("UPDATE product_variants SET stock = ");
    match operation {
        StockOperation::Set => {
            query.push_bind(stock);
        }
        StockOperation::Add => {
            query.push("stock + ").push_bind(stock);
        }
        StockOperation::Subtract => {
            query.push("MAX(stock - ").push_bind(stock).push(", 0)");
        }
    }
    query.push(", updated_at = ").push_bind(Utc::now());
    query.push(" WHERE id = ").push_bind(id);
    if operation == StockOperation::Add {
        // SQLite would silently promote an overflowing sum to REAL.
        query
            .push(" AND stock <= ")
            .push_bind(i64::MAX.saturating_sub(stock));
    }
    query.push(" RETURNING *");

    let mut tx = pool.begin().await?;

    let updated = query
        .build_query_as::<Variant>()
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::from_store(e, Variant::NAME))?;

    let variant = match updated {
        Some(variant) => variant,
        None if repository::exists::<Variant, _>(&mut *tx, id).await? => {
            return Err(AppError::Validation(format!(
                "stock: adding {stock} would exceed the maximum stock of {}",
                i64::MAX
            )));
        }
        None => return Err(AppError::not_found(Variant::NAME, id)),
    };

    tx.commit().await?;

    info!(
        "Stock of variant {} is now {} after {:?} {}",
        variant.id, variant.stock, operation, stock
    );
    expand_detail(pool, variant).await
}

/// Attaches product summary, color, style and collection summaries to a
/// page of variants, one query per relation.
pub async fn expand_list(pool: &SqlitePool, variants: Vec<Variant>) -> Result<Vec<VariantListItem>> {
    let ids: Vec<i64> = variants.iter().map(|v| v.id).collect();
    let product_ids: Vec<i64> = variants.iter().map(|v| v.product_id).collect();
    let color_ids: Vec<i64> = variants.iter().filter_map(|v| v.color_id).collect();
    let style_ids: Vec<i64> = variants.iter().filter_map(|v| v.style_id).collect();

    let products = repository::find_many::<Product>(pool, &product_ids).await?;
    let colors = repository::find_many::<Color>(pool, &color_ids).await?;
    let styles = repository::find_many::<Style>(pool, &style_ids).await?;
    let mut collections = relations::collections_for(pool, CollectionLink::Variants, &ids).await?;

    let items = variants
        .into_iter()
        .map(|variant| VariantListItem {
            product: products.get(&variant.product_id).map(Into::into),
            color: variant.color_id.and_then(|id| colors.get(&id).cloned()),
            style: variant.style_id.and_then(|id| styles.get(&id).cloned()),
            collections: collections
                .remove(&variant.id)
                .unwrap_or_default()
                .iter()
                .map(Into::into)
                .collect(),
            variant,
        })
        .collect();

    Ok(items)
}

pub async fn expand_detail(pool: &SqlitePool, variant: Variant) -> Result<VariantDetail> {
    let product = repository::find_by_id::<Product, _>(pool, variant.product_id).await?;
    let color = match variant.color_id {
        Some(id) => repository::find_by_id::<Color, _>(pool, id).await?,
        None => None,
    };
    let style = match variant.style_id {
        Some(id) => repository::find_by_id::<Style, _>(pool, id).await?,
        None => None,
    };
    let collections = relations::collections_for(pool, CollectionLink::Variants, &[variant.id])
        .await?
        .remove(&variant.id)
        .unwrap_or_default();

    Ok(VariantDetail {
        variant,
        product,
        color,
        style,
        collections,
    })
}
