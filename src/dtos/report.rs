use serde::Deserialize;

/// Raw query string of `GET /reports/universal`.
///
/// Every field stays a string so a malformed value can be dropped by the
/// filter builder instead of failing extraction of the whole query.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    // Time window
    pub duration: Option<String>,
    pub date: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub period: Option<String>,

    // Entity filters (comma separated ids)
    pub buyer_ids: Option<String>,
    pub farm_ids: Option<String>,
    pub flock_ids: Option<String>,
    pub shed_ids: Option<String>,

    pub payment_status: Option<String>,

    // Numeric ranges
    pub min_amount: Option<String>,
    pub max_amount: Option<String>,
    pub min_net_weight: Option<String>,
    pub max_net_weight: Option<String>,
    pub min_birds: Option<String>,
    pub max_birds: Option<String>,
    pub min_rate: Option<String>,
    pub max_rate: Option<String>,

    // String sets (comma separated)
    pub vehicle_numbers: Option<String>,
    pub driver_names: Option<String>,
    pub accountant_names: Option<String>,

    pub search: Option<String>,

    // Presentation
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub include_details: Option<String>,
    pub group_by: Option<String>,
    pub for_export: Option<String>,
}

/// Query-string boolean: `true`, `1` and `yes` (any case) are true.
pub fn parse_flag(raw: Option<&str>) -> Option<bool> {
    raw.map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
}
