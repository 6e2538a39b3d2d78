use sqlx::{QueryBuilder, Sqlite};

use crate::{
    error::{AppError, Result},
    models::{ListQuery, Pagination},
    queries::repository::{Entity, FieldValue},
};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;

/// Trimmed, non-empty view of a raw query parameter.
pub fn param(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn parse_id(name: &str, raw: Option<&str>) -> Result<Option<i64>> {
    raw.map(|v| {
        v.parse::<i64>()
            .map_err(|_| AppError::Validation(format!("{} must be an integer, got '{}'", name, v)))
    })
    .transpose()
}

pub fn parse_number(name: &str, raw: Option<&str>) -> Result<Option<f64>> {
    raw.map(|v| match v.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(AppError::Validation(format!(
            "{} must be a number, got '{}'",
            name, v
        ))),
    })
    .transpose()
}

pub fn parse_bool(name: &str, raw: Option<&str>) -> Result<Option<bool>> {
    raw.map(|v| match v.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(AppError::Validation(format!(
            "{} must be true or false, got '{}'",
            name, v
        ))),
    })
    .transpose()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Gt,
    Gte,
    Lte,
}

impl CompareOp {
    fn sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lte => "<=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Compare {
        column: &'static str,
        op: CompareOp,
        value: FieldValue,
    },
    /// Row is associated with `value` through a join table.
    Linked {
        table: &'static str,
        owner_column: &'static str,
        column: &'static str,
        value: i64,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct Search {
    term: String,
    columns: &'static [&'static str],
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    search: Option<Search>,
    clauses: Vec<Clause>,
}

impl Predicate {
    pub fn searching(term: Option<&str>, columns: &'static [&'static str]) -> Self {
        Self {
            search: term.map(|term| Search {
                term: term.to_lowercase(),
                columns,
            }),
            clauses: Vec::new(),
        }
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search.as_ref().map(|s| s.term.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_none() && self.clauses.is_empty()
    }

    pub fn push(&mut self, clause: Clause) {
        self.clauses.push(clause);
    }

    pub fn id_filter(&mut self, name: &str, raw: Option<&str>, column: &'static str) -> Result<()> {
        if let Some(id) = parse_id(name, raw)? {
            self.push(Clause::Compare {
                column,
                op: CompareOp::Eq,
                value: FieldValue::Int(Some(id)),
            });
        }
        Ok(())
    }

    pub fn linked_filter(
        &mut self,
        name: &str,
        raw: Option<&str>,
        table: &'static str,
        owner_column: &'static str,
        column: &'static str,
    ) -> Result<()> {
        if let Some(id) = parse_id(name, raw)? {
            self.push(Clause::Linked {
                table,
                owner_column,
                column,
                value: id,
            });
        }
        Ok(())
    }

    pub fn price_range(
        &mut self,
        min: Option<&str>,
        max: Option<&str>,
        column: &'static str,
    ) -> Result<()> {
        if let Some(min) = parse_number("minPrice", min)? {
            self.push(Clause::Compare {
                column,
                op: CompareOp::Gte,
                value: FieldValue::Real(Some(min)),
            });
        }
        if let Some(max) = parse_number("maxPrice", max)? {
            self.push(Clause::Compare {
                column,
                op: CompareOp::Lte,
                value: FieldValue::Real(Some(max)),
            });
        }
        Ok(())
    }

    pub fn in_stock(&mut self, raw: Option<&str>, column: &'static str) -> Result<()> {
        if let Some(in_stock) = parse_bool("inStock", raw)? {
            self.push(Clause::Compare {
                column,
                op: if in_stock { CompareOp::Gt } else { CompareOp::Lte },
                value: FieldValue::Int(Some(0)),
            });
        }
        Ok(())
    }

    pub fn push_where(&self, table: &str, builder: &mut QueryBuilder<'_, Sqlite>) {
        if self.is_empty() {
            return;
        }

        builder.push(" WHERE ");
        let mut first = true;

        if let Some(ref search) = self.search {
            builder.push("(");
            for (i, column) in search.columns.iter().enumerate() {
                if i > 0 {
                    builder.push(" OR ");
                }
                builder.push(format!("LOWER({}.{}) LIKE ", table, column));
                builder.push_bind(format!("%{}%", search.term));
            }
            builder.push(")");
            first = false;
        }

        for clause in &self.clauses {
            if !first {
                builder.push(" AND ");
            }
            first = false;

            match clause {
                Clause::Compare { column, op, value } => {
                    builder.push(format!("{}.{} {} ", table, column, op.sql()));
                    value.push_bind(builder);
                }
                Clause::Linked {
                    table: link,
                    owner_column,
                    column,
                    value,
                } => {
                    builder.push(format!(
                        "EXISTS (SELECT 1 FROM {link} WHERE {link}.{owner_column} = {table}.id AND {link}.{column} = "
                    ));
                    builder.push_bind(*value);
                    builder.push(")");
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn parse(page: Option<&str>, limit: Option<&str>) -> Result<Self> {
        let page = parse_positive("page", page)?.unwrap_or(DEFAULT_PAGE);
        let limit = parse_positive("limit", limit)?.unwrap_or(DEFAULT_LIMIT);
        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn pagination(&self, total: i64) -> Pagination {
        Pagination::new(self.page, self.limit, total)
    }

    pub fn push_limit(&self, builder: &mut QueryBuilder<'_, Sqlite>) {
        builder.push(" LIMIT ");
        builder.push_bind(self.limit);
        builder.push(" OFFSET ");
        builder.push_bind(self.offset());
    }
}

fn parse_positive(name: &str, raw: Option<&str>) -> Result<Option<i64>> {
    match raw.map(|v| (v, v.parse::<i64>())) {
        None => Ok(None),
        Some((_, Ok(n))) if n >= 1 => Ok(Some(n)),
        Some((v, _)) => Err(AppError::Validation(format!(
            "{} must be a positive integer, got '{}'",
            name, v
        ))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub column: &'static str,
    pub direction: SortDirection,
}

impl Default for Sort {
    fn default() -> Self {
        Self {
            column: "created_at",
            direction: SortDirection::Desc,
        }
    }
}

impl Sort {
    /// `fields` maps API field names to columns.
    pub fn parse(
        sort_by: Option<&str>,
        sort_order: Option<&str>,
        fields: &[(&'static str, &'static str)],
    ) -> Result<Self> {
        let mut sort = Sort::default();

        if let Some(field) = sort_by {
            sort.column = fields
                .iter()
                .find(|(name, _)| *name == field)
                .map(|(_, column)| *column)
                .ok_or_else(|| {
                    let allowed: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
                    AppError::Validation(format!(
                        "sortBy must be one of {}, got '{}'",
                        allowed.join(", "),
                        field
                    ))
                })?;
        }

        if let Some(order) = sort_order {
            sort.direction = match order.to_ascii_lowercase().as_str() {
                "asc" => SortDirection::Asc,
                "desc" => SortDirection::Desc,
                _ => {
                    return Err(AppError::Validation(format!(
                        "sortOrder must be asc or desc, got '{}'",
                        order
                    )));
                }
            };
        }

        Ok(sort)
    }

    pub fn push_order_by(&self, table: &str, builder: &mut QueryBuilder<'_, Sqlite>) {
        let direction = self.direction.sql();
        builder.push(format!(
            " ORDER BY {table}.{} {direction}, {table}.id {direction}",
            self.column
        ));
    }
}

/// Everything a list endpoint needs from its query string.
#[derive(Debug, Clone)]
pub struct ListRequest {
    pub predicate: Predicate,
    pub page: PageRequest,
    pub sort: Sort,
}

impl ListRequest {
    pub fn from_query<E: Entity>(query: &ListQuery) -> Result<Self> {
        Ok(Self {
            predicate: E::predicate(query)?,
            page: PageRequest::parse(param(&query.page), param(&query.limit))?,
            sort: Sort::parse(param(&query.sort_by), param(&query.sort_order), E::SORT_FIELDS)?,
        })
    }
}
