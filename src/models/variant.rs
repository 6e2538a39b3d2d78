use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use validator::Validate;

use crate::{
    error::Result,
    models::{Collection, CollectionSummary, Color, ListQuery, Product, ProductSummary, Style},
    queries::{
        filters::{Predicate, param},
        repository::{Assignments, Entity, FieldValue},
    },
    utils::validation::validate_not_blank,
};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: i64,
    pub variant_id: String,
    pub sku: String,
    pub choices: Json<BTreeMap<String, String>>,
    pub price: Option<f64>,
    pub stock: i64,
    pub product_id: i64,
    pub color_id: Option<i64>,
    pub style_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Variant {
    const TABLE: &'static str = "product_variants";
    const NAME: &'static str = "Variant";
    const SEARCH_COLUMNS: &'static [&'static str] = &["variant_id", "sku"];
    const SORT_FIELDS: &'static [(&'static str, &'static str)] = &[
        ("variantId", "variant_id"),
        ("sku", "sku"),
        ("price", "price"),
        ("stock", "stock"),
        ("createdAt", "created_at"),
        ("updatedAt", "updated_at"),
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn predicate(query: &ListQuery) -> Result<Predicate> {
        let mut predicate = Predicate::searching(param(&query.search), Self::SEARCH_COLUMNS);
        predicate.id_filter("productId", param(&query.product_id), "product_id")?;
        predicate.id_filter("colorId", param(&query.color_id), "color_id")?;
        predicate.id_filter("styleId", param(&query.style_id), "style_id")?;
        predicate.linked_filter(
            "collectionId",
            param(&query.collection_id),
            "collection_variants",
            "variant_id",
            "collection_id",
        )?;
        predicate.price_range(param(&query.min_price), param(&query.max_price), "price")?;
        predicate.in_stock(param(&query.in_stock), "stock")?;
        Ok(predicate)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantSummary {
    pub id: i64,
    pub variant_id: String,
    pub sku: String,
    pub stock: i64,
    pub color_id: Option<i64>,
    pub style_id: Option<i64>,
}

impl From<&Variant> for VariantSummary {
    fn from(variant: &Variant) -> Self {
        Self {
            id: variant.id,
            variant_id: variant.variant_id.clone(),
            sku: variant.sku.clone(),
            stock: variant.stock,
            color_id: variant.color_id,
            style_id: variant.style_id,
        }
    }
}

/// Variant with its color and style, as nested under a product.
#[derive(Debug, Clone, Serialize)]
pub struct VariantWithOptions {
    #[serde(flatten)]
    pub variant: Variant,
    pub color: Option<Color>,
    pub style: Option<Style>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VariantListItem {
    #[serde(flatten)]
    pub variant: Variant,
    pub product: Option<ProductSummary>,
    pub color: Option<Color>,
    pub style: Option<Style>,
    pub collections: Vec<CollectionSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VariantDetail {
    #[serde(flatten)]
    pub variant: Variant,
    pub product: Option<Product>,
    pub color: Option<Color>,
    pub style: Option<Style>,
    pub collections: Vec<Collection>,
}

fn choices_value(choices: BTreeMap<String, String>) -> Value {
    Value::Object(
        choices
            .into_iter()
            .map(|(option, choice)| (option, Value::String(choice)))
            .collect(),
    )
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateVariantRequest {
    #[validate(
        length(min = 1, max = 100, message = "must be 1-100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub variant_id: String,
    #[validate(
        length(min = 1, max = 100, message = "must be 1-100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub sku: String,
    #[serde(default)]
    pub choices: BTreeMap<String, String>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub price: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0, message = "must not be negative"))]
    pub stock: i64,
    pub product_id: i64,
    pub color_id: Option<i64>,
    pub style_id: Option<i64>,
    pub collection_ids: Option<Vec<i64>>,
}

impl CreateVariantRequest {
    pub fn into_parts(self) -> (Assignments, Option<Vec<i64>>) {
        let values = Assignments::new()
            .set("variant_id", FieldValue::text(self.variant_id.trim()))
            .set("sku", FieldValue::text(self.sku.trim()))
            .set("choices", FieldValue::Json(Some(choices_value(self.choices))))
            .set("price", FieldValue::Real(self.price))
            .set("stock", FieldValue::Int(Some(self.stock)))
            .set("product_id", FieldValue::Int(Some(self.product_id)))
            .set("color_id", FieldValue::Int(self.color_id))
            .set("style_id", FieldValue::Int(self.style_id));

        (values, self.collection_ids)
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVariantRequest {
    #[validate(
        length(min = 1, max = 100, message = "must be 1-100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub variant_id: Option<String>,
    #[validate(
        length(min = 1, max = 100, message = "must be 1-100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub sku: Option<String>,
    pub choices: Option<BTreeMap<String, String>>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub price: Option<f64>,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub stock: Option<i64>,
    pub product_id: Option<i64>,
    pub color_id: Option<i64>,
    pub style_id: Option<i64>,
    pub collection_ids: Option<Vec<i64>>,
}

impl UpdateVariantRequest {
    pub fn into_parts(self) -> (Assignments, Option<Vec<i64>>) {
        let values = Assignments::new()
            .set_some("variant_id", self.variant_id.map(|v| FieldValue::text(v.trim())))
            .set_some("sku", self.sku.map(|s| FieldValue::text(s.trim())))
            .set_some("choices", self.choices.map(|c| FieldValue::Json(Some(choices_value(c)))))
            .set_some("price", self.price.map(|p| FieldValue::Real(Some(p))))
            .set_some("stock", self.stock.map(|s| FieldValue::Int(Some(s))))
            .set_some("product_id", self.product_id.map(|id| FieldValue::Int(Some(id))))
            .set_some("color_id", self.color_id.map(|id| FieldValue::Int(Some(id))))
            .set_some("style_id", self.style_id.map(|id| FieldValue::Int(Some(id))));

        (values, self.collection_ids)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockOperation {
    #[default]
    Set,
    Add,
    Subtract,
}

#[derive(Debug, Deserialize, Validate)]
pub struct StockUpdateRequest {
    #[validate(range(min = 0, message = "must not be negative"))]
    pub stock: Option<i64>,
    pub operation: Option<StockOperation>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stock_operation_defaults_to_set() {
        let body: StockUpdateRequest = serde_json::from_value(json!({"stock": 5})).unwrap();
        assert_eq!(body.operation.unwrap_or_default(), StockOperation::Set);

        let body: StockUpdateRequest =
            serde_json::from_value(json!({"stock": 5, "operation": "subtract"})).unwrap();
        assert_eq!(body.operation, Some(StockOperation::Subtract));

        assert!(serde_json::from_value::<StockUpdateRequest>(json!({"stock": 5, "operation": "double"})).is_err());
    }

    #[test]
    fn negative_stock_fails_validation() {
        let body: StockUpdateRequest = serde_json::from_value(json!({"stock": -1})).unwrap();
        assert!(body.validate().is_err());
    }

    #[test]
    fn choices_are_stored_as_json_object() {
        let body: CreateVariantRequest = serde_json::from_value(json!({
            "variantId": "SFJ-32-BLU",
            "sku": "SFJ-32-BLU",
            "productId": 1,
            "choices": {"size": "32", "color": "Blue"}
        }))
        .unwrap();
        assert!(body.validate().is_ok());

        let (values, _) = body.into_parts();
        assert_eq!(
            values.get("choices"),
            Some(&FieldValue::Json(Some(json!({"color": "Blue", "size": "32"}))))
        );
        assert_eq!(values.get("stock"), Some(&FieldValue::Int(Some(0))));
    }

    #[test]
    fn filters_reject_malformed_ids() {
        let query = ListQuery {
            color_id: Some("blue".into()),
            ..Default::default()
        };
        assert!(Variant::predicate(&query).is_err());
    }
}
