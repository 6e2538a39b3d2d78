use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    queries::repository::{Assignments, Changeset, DeleteGuard, Entity, FieldValue},
    utils::validation::validate_not_blank,
};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    pub id: i64,
    pub name: String,
    pub logo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Brand as embedded in product listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandSummary {
    pub id: i64,
    pub name: String,
    pub logo: Option<String>,
}

impl From<&Brand> for BrandSummary {
    fn from(brand: &Brand) -> Self {
        Self {
            id: brand.id,
            name: brand.name.clone(),
            logo: brand.logo.clone(),
        }
    }
}

impl Entity for Brand {
    const TABLE: &'static str = "brands";
    const NAME: &'static str = "Brand";
    const DELETE_GUARDS: &'static [DeleteGuard] = &[DeleteGuard {
        table: "products",
        column: "brand_id",
        dependents: "product(s)",
    }];

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBrandRequest {
    #[validate(
        length(min = 1, max = 100, message = "must be 1-100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
    #[validate(length(max = 500))]
    pub logo: Option<String>,
}

impl Changeset for CreateBrandRequest {
    fn into_assignments(self) -> Assignments {
        Assignments::new()
            .set("name", FieldValue::text(self.name.trim()))
            .set("logo", FieldValue::Text(self.logo))
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBrandRequest {
    #[validate(
        length(min = 1, max = 100, message = "must be 1-100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: Option<String>,
    #[validate(length(max = 500))]
    pub logo: Option<String>,
}

impl Changeset for UpdateBrandRequest {
    fn into_assignments(self) -> Assignments {
        Assignments::new()
            .set_some("name", self.name.map(|n| FieldValue::text(n.trim())))
            .set_some("logo", self.logo.map(FieldValue::text))
    }
}
