use sqlx::SqlitePool;

use crate::{
    error::Result,
    models::{Collection, CollectionDetail},
    queries::{relations, repository},
};

pub async fn find_detail(pool: &SqlitePool, id: i64) -> Result<CollectionDetail> {
    let collection = repository::get_by_id::<Collection>(pool, id).await?;

    let products = relations::products_in_collection(pool, id).await?;
    let variants = relations::variants_in_collection(pool, id).await?;

    Ok(CollectionDetail {
        collection,
        products: products.iter().map(Into::into).collect(),
        variants: variants.iter().map(Into::into).collect(),
    })
}
