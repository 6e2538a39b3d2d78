use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use validator::Validate;

use crate::{
    error::{AppError, Result},
    models::ListQuery,
    queries::{
        filters::{Clause, CompareOp, Predicate, param},
        repository::{Assignments, Changeset, DeleteGuard, Entity, FieldValue},
    },
    utils::validation::validate_not_blank,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FitType {
    Skinny,
    Relaxed,
    Oversized,
    Classic,
}

#[derive(Debug, Error)]
#[error("fitType must be one of SKINNY, RELAXED, OVERSIZED, CLASSIC, got '{0}'")]
pub struct UnknownFitType(pub String);

impl FitType {
    pub const ALL: [FitType; 4] = [
        FitType::Skinny,
        FitType::Relaxed,
        FitType::Oversized,
        FitType::Classic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FitType::Skinny => "SKINNY",
            FitType::Relaxed => "RELAXED",
            FitType::Oversized => "OVERSIZED",
            FitType::Classic => "CLASSIC",
        }
    }
}

impl fmt::Display for FitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive: `skinny`, `Skinny` and `SKINNY` are the same fit.
impl FromStr for FitType {
    type Err = UnknownFitType;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim();
        FitType::ALL
            .into_iter()
            .find(|fit| fit.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownFitType(s.to_string()))
    }
}

impl TryFrom<String> for FitType {
    type Error = UnknownFitType;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl<'de> Deserialize<'de> for FitType {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    pub id: i64,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub fit_type: FitType,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Style {
    const TABLE: &'static str = "styles";
    const NAME: &'static str = "Style";
    const SORT_FIELDS: &'static [(&'static str, &'static str)] = &[
        ("name", "name"),
        ("fitType", "fit_type"),
        ("createdAt", "created_at"),
        ("updatedAt", "updated_at"),
    ];
    const DELETE_GUARDS: &'static [DeleteGuard] = &[DeleteGuard {
        table: "product_variants",
        column: "style_id",
        dependents: "variant(s)",
    }];

    fn id(&self) -> i64 {
        self.id
    }

    fn predicate(query: &ListQuery) -> Result<Predicate> {
        let mut predicate = Predicate::searching(param(&query.search), Self::SEARCH_COLUMNS);

        if let Some(raw) = param(&query.fit_type) {
            let fit_type = raw
                .parse::<FitType>()
                .map_err(|e| AppError::Validation(e.to_string()))?;
            predicate.push(Clause::Compare {
                column: "fit_type",
                op: CompareOp::Eq,
                value: FieldValue::text(fit_type.as_str()),
            });
        }

        Ok(predicate)
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateStyleRequest {
    #[validate(
        length(min = 1, max = 100, message = "must be 1-100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
    pub fit_type: FitType,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

impl Changeset for CreateStyleRequest {
    fn into_assignments(self) -> Assignments {
        Assignments::new()
            .set("name", FieldValue::text(self.name.trim()))
            .set("fit_type", FieldValue::text(self.fit_type.as_str()))
            .set("description", FieldValue::Text(self.description))
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStyleRequest {
    #[validate(
        length(min = 1, max = 100, message = "must be 1-100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: Option<String>,
    pub fit_type: Option<FitType>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

impl Changeset for UpdateStyleRequest {
    fn into_assignments(self) -> Assignments {
        Assignments::new()
            .set_some("name", self.name.map(|n| FieldValue::text(n.trim())))
            .set_some("fit_type", self.fit_type.map(|f| FieldValue::text(f.as_str())))
            .set_some("description", self.description.map(FieldValue::text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fit_type_parses_any_case() {
        assert_eq!("skinny".parse::<FitType>().unwrap(), FitType::Skinny);
        assert_eq!(" Oversized ".parse::<FitType>().unwrap(), FitType::Oversized);
        assert!("WIDE".parse::<FitType>().is_err());
    }

    #[test]
    fn fit_type_serializes_upper_case() {
        let body: CreateStyleRequest =
            serde_json::from_value(json!({"name": "X", "fitType": "skinny"})).unwrap();
        assert_eq!(serde_json::to_value(body.fit_type).unwrap(), json!("SKINNY"));

        let rejected = serde_json::from_value::<CreateStyleRequest>(json!({"name": "Y", "fitType": "WIDE"}));
        assert!(rejected.is_err());
    }

    #[test]
    fn fit_type_filter_is_validated() {
        let query = ListQuery {
            fit_type: Some("relaxed".into()),
            ..Default::default()
        };
        let predicate = Style::predicate(&query).unwrap();
        assert_eq!(
            predicate.clauses(),
            &[Clause::Compare {
                column: "fit_type",
                op: CompareOp::Eq,
                value: FieldValue::text("RELAXED"),
            }]
        );

        let query = ListQuery {
            fit_type: Some("baggy".into()),
            ..Default::default()
        };
        assert!(matches!(Style::predicate(&query), Err(AppError::Validation(_))));
    }
}
