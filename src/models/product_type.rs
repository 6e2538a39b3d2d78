use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    queries::repository::{Assignments, Changeset, DeleteGuard, Entity, FieldValue},
    utils::validation::validate_not_blank,
};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductType {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductTypeSummary {
    pub id: i64,
    pub name: String,
}

impl From<&ProductType> for ProductTypeSummary {
    fn from(product_type: &ProductType) -> Self {
        Self {
            id: product_type.id,
            name: product_type.name.clone(),
        }
    }
}

impl Entity for ProductType {
    const TABLE: &'static str = "product_types";
    const NAME: &'static str = "Product type";
    const DELETE_GUARDS: &'static [DeleteGuard] = &[DeleteGuard {
        table: "products",
        column: "product_type_id",
        dependents: "product(s)",
    }];

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductTypeRequest {
    #[validate(
        length(min = 1, max = 100, message = "must be 1-100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

impl Changeset for CreateProductTypeRequest {
    fn into_assignments(self) -> Assignments {
        Assignments::new()
            .set("name", FieldValue::text(self.name.trim()))
            .set("description", FieldValue::Text(self.description))
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductTypeRequest {
    #[validate(
        length(min = 1, max = 100, message = "must be 1-100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

impl Changeset for UpdateProductTypeRequest {
    fn into_assignments(self) -> Assignments {
        Assignments::new()
            .set_some("name", self.name.map(|n| FieldValue::text(n.trim())))
            .set_some("description", self.description.map(FieldValue::text))
    }
}
