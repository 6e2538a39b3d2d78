use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    models::{ProductSummary, VariantSummary},
    queries::repository::{Assignments, Changeset, DeleteGuard, Entity, FieldValue},
    utils::validation::validate_not_blank,
};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionSummary {
    pub id: i64,
    pub name: String,
}

impl From<&Collection> for CollectionSummary {
    fn from(collection: &Collection) -> Self {
        Self {
            id: collection.id,
            name: collection.name.clone(),
        }
    }
}

/// A collection with the products and variants grouped under it.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionDetail {
    #[serde(flatten)]
    pub collection: Collection,
    pub products: Vec<ProductSummary>,
    pub variants: Vec<VariantSummary>,
}

impl Entity for Collection {
    const TABLE: &'static str = "collections";
    const NAME: &'static str = "Collection";
    const SEARCH_COLUMNS: &'static [&'static str] = &["name", "description"];
    const DELETE_GUARDS: &'static [DeleteGuard] = &[
        DeleteGuard {
            table: "collection_products",
            column: "collection_id",
            dependents: "product(s)",
        },
        DeleteGuard {
            table: "collection_variants",
            column: "collection_id",
            dependents: "variant(s)",
        },
    ];

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCollectionRequest {
    #[validate(
        length(min = 1, max = 100, message = "must be 1-100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

impl Changeset for CreateCollectionRequest {
    fn into_assignments(self) -> Assignments {
        Assignments::new()
            .set("name", FieldValue::text(self.name.trim()))
            .set("description", FieldValue::Text(self.description))
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCollectionRequest {
    #[validate(
        length(min = 1, max = 100, message = "must be 1-100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

impl Changeset for UpdateCollectionRequest {
    fn into_assignments(self) -> Assignments {
        Assignments::new()
            .set_some("name", self.name.map(|n| FieldValue::text(n.trim())))
            .set_some("description", self.description.map(FieldValue::text))
    }
}
