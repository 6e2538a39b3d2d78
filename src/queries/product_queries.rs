use sqlx::SqlitePool;
use tracing::info;

use crate::{
    error::{AppError, Result},
    models::{
        Brand, Color, CreateProductRequest, Product, ProductDetail, ProductListItem, ProductType,
        Style, UpdateProductRequest, VariantWithOptions,
    },
    queries::{
        relations::{self, CollectionLink},
        repository::{self, Entity},
    },
};

pub async fn find_by_slug(pool: &SqlitePool, slug: &str) -> Result<Product> {
    repository::find_by_column::<Product>(pool, "slug", slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product with slug '{}' not found", slug)))
}

pub async fn create(pool: &SqlitePool, request: CreateProductRequest) -> Result<ProductDetail> {
    let brand_id = request.brand_id;
    let product_type_id = request.product_type_id;
    let (values, collection_ids) = request.into_parts()?;

    let mut tx = pool.begin().await?;

    repository::ensure_reference::<Brand, _>(&mut *tx, "brandId", brand_id).await?;
    repository::ensure_reference::<ProductType, _>(&mut *tx, "productTypeId", product_type_id)
        .await?;

    let product: Product = repository::insert(&mut *tx, &values).await?;

    if let Some(ids) = collection_ids {
        relations::replace_collections(&mut *tx, CollectionLink::Products, product.id, &ids).await?;
    }

    tx.commit().await?;

    info!("Created product {} ({})", product.id, product.slug);
    expand_detail(pool, product).await
}

pub async fn update(
    pool: &SqlitePool,
    id: i64,
    request: UpdateProductRequest,
) -> Result<ProductDetail> {
    let brand_id = request.brand_id;
    let product_type_id = request.product_type_id;
    let (values, collection_ids) = request.into_parts();

    let mut tx = pool.begin().await?;

    repository::ensure_reference::<Brand, _>(&mut *tx, "brandId", brand_id).await?;
    repository::ensure_reference::<ProductType, _>(&mut *tx, "productTypeId", product_type_id)
        .await?;

    let product = repository::update::<Product, _>(&mut *tx, id, &values)
        .await?
        .ok_or_else(|| AppError::not_found(Product::NAME, id))?;

    if let Some(ids) = collection_ids {
        relations::replace_collections(&mut *tx, CollectionLink::Products, product.id, &ids).await?;
    }

    tx.commit().await?;

    info!("Updated product {}", product.id);
    expand_detail(pool, product).await
}

/// Attaches brand, product type, variant and collection summaries to a page
/// of products, one query per relation.
pub async fn expand_list(pool: &SqlitePool, products: Vec<Product>) -> Result<Vec<ProductListItem>> {
    let ids: Vec<i64> = products.iter().map(|p| p.id).collect();
    let brand_ids: Vec<i64> = products.iter().filter_map(|p| p.brand_id).collect();
    let type_ids: Vec<i64> = products.iter().filter_map(|p| p.product_type_id).collect();

    let brands = repository::find_many::<Brand>(pool, &brand_ids).await?;
    let product_types = repository::find_many::<ProductType>(pool, &type_ids).await?;
    let mut variants = relations::variants_for_products(pool, &ids).await?;
    let mut collections = relations::collections_for(pool, CollectionLink::Products, &ids).await?;

    let items = products
        .into_iter()
        .map(|product| ProductListItem {
            brand: product.brand_id.and_then(|id| brands.get(&id)).map(Into::into),
            product_type: product
                .product_type_id
                .and_then(|id| product_types.get(&id))
                .map(Into::into),
            variants: variants
                .remove(&product.id)
                .unwrap_or_default()
                .iter()
                .map(Into::into)
                .collect(),
            collections: collections
                .remove(&product.id)
                .unwrap_or_default()
                .iter()
                .map(Into::into)
                .collect(),
            product,
        })
        .collect();

    Ok(items)
}

pub async fn expand_detail(pool: &SqlitePool, product: Product) -> Result<ProductDetail> {
    let brand = match product.brand_id {
        Some(id) => repository::find_by_id::<Brand, _>(pool, id).await?,
        None => None,
    };
    let product_type = match product.product_type_id {
        Some(id) => repository::find_by_id::<ProductType, _>(pool, id).await?,
        None => None,
    };

    let collections = relations::collections_for(pool, CollectionLink::Products, &[product.id])
        .await?
        .remove(&product.id)
        .unwrap_or_default();

    let variants = relations::variants_for_products(pool, &[product.id])
        .await?
        .remove(&product.id)
        .unwrap_or_default();

    let color_ids: Vec<i64> = variants.iter().filter_map(|v| v.color_id).collect();
    let style_ids: Vec<i64> = variants.iter().filter_map(|v| v.style_id).collect();
    let colors = repository::find_many::<Color>(pool, &color_ids).await?;
    let styles = repository::find_many::<Style>(pool, &style_ids).await?;

    let variants = variants
        .into_iter()
        .map(|variant| VariantWithOptions {
            color: variant.color_id.and_then(|id| colors.get(&id).cloned()),
            style: variant.style_id.and_then(|id| styles.get(&id).cloned()),
            variant,
        })
        .collect();

    Ok(ProductDetail {
        product,
        brand,
        product_type,
        collections,
        variants,
    })
}
