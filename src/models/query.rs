use serde::Deserialize;

/// Raw list-endpoint query parameters. Values stay strings until the filter
/// builder parses them, so malformed numbers surface as validation errors.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub brand_id: Option<String>,
    pub product_type_id: Option<String>,
    pub product_id: Option<String>,
    pub color_id: Option<String>,
    pub style_id: Option<String>,
    pub collection_id: Option<String>,
    pub fit_type: Option<String>,
    pub in_stock: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
}
