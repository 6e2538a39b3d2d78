use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    queries::repository::{Assignments, Changeset, DeleteGuard, Entity, FieldValue},
    utils::validation::{validate_hex_code, validate_not_blank},
};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Color {
    pub id: i64,
    pub name: String,
    pub hex_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Color {
    const TABLE: &'static str = "colors";
    const NAME: &'static str = "Color";
    const DELETE_GUARDS: &'static [DeleteGuard] = &[DeleteGuard {
        table: "product_variants",
        column: "color_id",
        dependents: "variant(s)",
    }];

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateColorRequest {
    #[validate(
        length(min = 1, max = 100, message = "must be 1-100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
    #[validate(custom(function = "validate_hex_code"))]
    pub hex_code: Option<String>,
}

impl Changeset for CreateColorRequest {
    fn into_assignments(self) -> Assignments {
        Assignments::new()
            .set("name", FieldValue::text(self.name.trim()))
            .set("hex_code", FieldValue::Text(self.hex_code))
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateColorRequest {
    #[validate(
        length(min = 1, max = 100, message = "must be 1-100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: Option<String>,
    #[validate(custom(function = "validate_hex_code"))]
    pub hex_code: Option<String>,
}

impl Changeset for UpdateColorRequest {
    fn into_assignments(self) -> Assignments {
        Assignments::new()
            .set_some("name", self.name.map(|n| FieldValue::text(n.trim())))
            .set_some("hex_code", self.hex_code.map(FieldValue::text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hex_code_is_optional_but_checked() {
        let body: CreateColorRequest = serde_json::from_value(json!({"name": "Teal"})).unwrap();
        assert!(body.validate().is_ok());

        let values = body.into_assignments();
        assert_eq!(values.columns(), vec!["name", "hex_code"]);
        assert_eq!(values.get("hex_code"), Some(&FieldValue::Text(None)));

        let body: CreateColorRequest =
            serde_json::from_value(json!({"name": "Teal", "hexCode": "teal"})).unwrap();
        assert!(body.validate().is_err());
    }

    #[test]
    fn partial_update_only_touches_supplied_fields() {
        let body: UpdateColorRequest = serde_json::from_value(json!({"hexCode": "#0F0"})).unwrap();
        assert!(body.validate().is_ok());
        assert_eq!(body.into_assignments().columns(), vec!["hex_code"]);
    }
}
