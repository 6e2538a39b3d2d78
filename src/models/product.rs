use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use validator::Validate;

use crate::{
    error::{AppError, Result},
    models::{
        Brand, BrandSummary, Collection, CollectionSummary, ListQuery, ProductType,
        ProductTypeSummary, VariantSummary, VariantWithOptions,
    },
    queries::{
        filters::{Predicate, param},
        repository::{Assignments, Entity, FieldValue},
    },
    utils::{
        slug::slugify,
        validation::{validate_not_blank, validate_slug},
    },
};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub sku: String,
    pub description: Option<String>,
    pub price: f64,
    pub compare_at_price: Option<f64>,
    pub cost_price: Option<f64>,
    pub stock: i64,
    pub is_active: bool,
    pub is_featured: bool,
    pub brand_id: Option<i64>,
    pub product_type_id: Option<i64>,
    pub seo: Option<Json<Value>>,
    pub media: Option<Json<Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Product {
    const TABLE: &'static str = "products";
    const NAME: &'static str = "Product";
    const SEARCH_COLUMNS: &'static [&'static str] = &["name", "description", "sku"];
    const SORT_FIELDS: &'static [(&'static str, &'static str)] = &[
        ("name", "name"),
        ("price", "price"),
        ("stock", "stock"),
        ("sku", "sku"),
        ("createdAt", "created_at"),
        ("updatedAt", "updated_at"),
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn predicate(query: &ListQuery) -> Result<Predicate> {
        let mut predicate = Predicate::searching(param(&query.search), Self::SEARCH_COLUMNS);
        predicate.id_filter("brandId", param(&query.brand_id), "brand_id")?;
        predicate.id_filter("productTypeId", param(&query.product_type_id), "product_type_id")?;
        predicate.linked_filter(
            "collectionId",
            param(&query.collection_id),
            "collection_products",
            "product_id",
            "collection_id",
        )?;
        predicate.price_range(param(&query.min_price), param(&query.max_price), "price")?;
        predicate.in_stock(param(&query.in_stock), "stock")?;
        Ok(predicate)
    }
}

/// Product as embedded in variant listings and collection details.
#[derive(Debug, Clone, Serialize)]
pub struct ProductSummary {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub sku: String,
    pub price: f64,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            slug: product.slug.clone(),
            sku: product.sku.clone(),
            price: product.price,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListItem {
    #[serde(flatten)]
    pub product: Product,
    pub brand: Option<BrandSummary>,
    pub product_type: Option<ProductTypeSummary>,
    pub variants: Vec<VariantSummary>,
    pub collections: Vec<CollectionSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub brand: Option<Brand>,
    pub product_type: Option<ProductType>,
    pub collections: Vec<Collection>,
    pub variants: Vec<VariantWithOptions>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[validate(
        length(min = 1, max = 200, message = "must be 1-200 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
    #[validate(length(max = 200), custom(function = "validate_slug"))]
    pub slug: Option<String>,
    #[validate(
        length(min = 1, max = 100, message = "must be 1-100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub sku: String,
    pub description: Option<String>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub price: f64,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub compare_at_price: Option<f64>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub cost_price: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0, message = "must not be negative"))]
    pub stock: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
    pub brand_id: Option<i64>,
    pub product_type_id: Option<i64>,
    pub seo: Option<Value>,
    pub media: Option<Value>,
    pub collection_ids: Option<Vec<i64>>,
}

impl CreateProductRequest {
    /// Splits the body into column values and the requested collection set.
    /// A missing slug is derived from the name.
    pub fn into_parts(self) -> Result<(Assignments, Option<Vec<i64>>)> {
        let slug = match self.slug {
            Some(slug) => slug,
            None => slugify(&self.name),
        };
        if slug.is_empty() {
            return Err(AppError::Validation(format!(
                "slug: could not be derived from name '{}'",
                self.name
            )));
        }

        let values = Assignments::new()
            .set("name", FieldValue::text(self.name.trim()))
            .set("slug", FieldValue::Text(Some(slug)))
            .set("sku", FieldValue::text(self.sku.trim()))
            .set("description", FieldValue::Text(self.description))
            .set("price", FieldValue::Real(Some(self.price)))
            .set("compare_at_price", FieldValue::Real(self.compare_at_price))
            .set("cost_price", FieldValue::Real(self.cost_price))
            .set("stock", FieldValue::Int(Some(self.stock)))
            .set("is_active", FieldValue::Bool(self.is_active))
            .set("is_featured", FieldValue::Bool(self.is_featured))
            .set("brand_id", FieldValue::Int(self.brand_id))
            .set("product_type_id", FieldValue::Int(self.product_type_id))
            .set("seo", FieldValue::Json(self.seo))
            .set("media", FieldValue::Json(self.media));

        Ok((values, self.collection_ids))
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[validate(
        length(min = 1, max = 200, message = "must be 1-200 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: Option<String>,
    #[validate(length(max = 200), custom(function = "validate_slug"))]
    pub slug: Option<String>,
    #[validate(
        length(min = 1, max = 100, message = "must be 1-100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub sku: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub price: Option<f64>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub compare_at_price: Option<f64>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub cost_price: Option<f64>,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub stock: Option<i64>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub brand_id: Option<i64>,
    pub product_type_id: Option<i64>,
    pub seo: Option<Value>,
    pub media: Option<Value>,
    pub collection_ids: Option<Vec<i64>>,
}

impl UpdateProductRequest {
    pub fn into_parts(self) -> (Assignments, Option<Vec<i64>>) {
        let values = Assignments::new()
            .set_some("name", self.name.map(|n| FieldValue::text(n.trim())))
            .set_some("slug", self.slug.map(FieldValue::text))
            .set_some("sku", self.sku.map(|s| FieldValue::text(s.trim())))
            .set_some("description", self.description.map(FieldValue::text))
            .set_some("price", self.price.map(|p| FieldValue::Real(Some(p))))
            .set_some("compare_at_price", self.compare_at_price.map(|p| FieldValue::Real(Some(p))))
            .set_some("cost_price", self.cost_price.map(|p| FieldValue::Real(Some(p))))
            .set_some("stock", self.stock.map(|s| FieldValue::Int(Some(s))))
            .set_some("is_active", self.is_active.map(FieldValue::Bool))
            .set_some("is_featured", self.is_featured.map(FieldValue::Bool))
            .set_some("brand_id", self.brand_id.map(|id| FieldValue::Int(Some(id))))
            .set_some("product_type_id", self.product_type_id.map(|id| FieldValue::Int(Some(id))))
            .set_some("seo", self.seo.map(|v| FieldValue::Json(Some(v))))
            .set_some("media", self.media.map(|v| FieldValue::Json(Some(v))));

        (values, self.collection_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::filters::{Clause, CompareOp};
    use serde_json::json;

    #[test]
    fn slug_is_derived_from_name_when_absent() {
        let body: CreateProductRequest = serde_json::from_value(json!({
            "name": "Slim Fit Jeans",
            "sku": "SFJ-001",
            "price": 79.9
        }))
        .unwrap();
        assert!(body.validate().is_ok());

        let (values, collections) = body.into_parts().unwrap();
        assert_eq!(values.get("slug"), Some(&FieldValue::text("slim-fit-jeans")));
        assert_eq!(values.get("is_active"), Some(&FieldValue::Bool(true)));
        assert!(collections.is_none());
    }

    #[test]
    fn underivable_slug_is_rejected() {
        let body: CreateProductRequest =
            serde_json::from_value(json!({"name": "!!!", "sku": "X", "price": 1})).unwrap();
        assert!(matches!(body.into_parts(), Err(AppError::Validation(_))));
    }

    #[test]
    fn negative_price_fails_validation() {
        let body: CreateProductRequest =
            serde_json::from_value(json!({"name": "Tee", "sku": "T1", "price": -1})).unwrap();
        assert!(body.validate().is_err());
    }

    #[test]
    fn list_filters_are_collected() {
        let query = ListQuery {
            brand_id: Some("2".into()),
            min_price: Some("50".into()),
            in_stock: Some("true".into()),
            ..Default::default()
        };
        let predicate = Product::predicate(&query).unwrap();
        assert_eq!(predicate.clauses().len(), 3);
        assert!(predicate.clauses().contains(&Clause::Compare {
            column: "brand_id",
            op: CompareOp::Eq,
            value: FieldValue::Int(Some(2)),
        }));
    }

    #[test]
    fn list_item_flattens_product_fields() {
        let now = Utc::now();
        let item = ProductListItem {
            product: Product {
                id: 1,
                name: "Tee".into(),
                slug: "tee".into(),
                sku: "T1".into(),
                description: None,
                price: 20.0,
                compare_at_price: None,
                cost_price: None,
                stock: 4,
                is_active: true,
                is_featured: false,
                brand_id: None,
                product_type_id: None,
                seo: None,
                media: None,
                created_at: now,
                updated_at: now,
            },
            brand: None,
            product_type: None,
            variants: Vec::new(),
            collections: Vec::new(),
        };

        let body = serde_json::to_value(item).unwrap();
        assert_eq!(body["slug"], json!("tee"));
        assert_eq!(body["isActive"], json!(true));
        assert_eq!(body["productType"], Value::Null);
        assert_eq!(body["variants"], json!([]));
    }
}
