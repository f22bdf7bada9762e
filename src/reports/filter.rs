//! Raw report parameters -> normalized predicate set.
//!
//! Malformed pieces (bad ids, non-numeric bounds, unknown payment status) are
//! dropped rather than rejected.

use crate::dtos::report::ReportQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdField {
    Buyer,
    Farm,
    Flock,
    Shed,
}

impl IdField {
    pub fn column(self) -> &'static str {
        match self {
            IdField::Buyer => "l.buyer_id",
            IdField::Farm => "l.farm_id",
            IdField::Flock => "l.flock_id",
            IdField::Shed => "l.shed_id",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericField {
    TotalAmount,
    NetWeight,
    NumberOfBirds,
    Rate,
}

impl NumericField {
    pub fn column(self) -> &'static str {
        match self {
            NumericField::TotalAmount => "l.total_amount",
            NumericField::NetWeight => "l.net_weight",
            NumericField::NumberOfBirds => "l.number_of_birds",
            NumericField::Rate => "l.rate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    VehicleNumber,
    DriverName,
    AccountantName,
}

impl TextField {
    pub fn column(self) -> &'static str {
        match self {
            TextField::VehicleNumber => "l.vehicle_number",
            TextField::DriverName => "l.driver_name",
            TextField::AccountantName => "l.accountant_name",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    /// amount paid equals total amount
    Paid,
    /// something paid, something still owed
    Partial,
    /// nothing paid
    Unpaid,
}

impl PaymentStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "paid" => Some(PaymentStatus::Paid),
            "partial" => Some(PaymentStatus::Partial),
            "unpaid" => Some(PaymentStatus::Unpaid),
            _ => None,
        }
    }
}

/// Columns the free-text search looks at, ledger fields first then the
/// joined display names.
pub const SEARCH_COLUMNS: [&str; 8] = [
    "l.vehicle_number",
    "l.driver_name",
    "l.driver_contact",
    "l.accountant_name",
    "b.name",
    "f.name",
    "fl.name",
    "s.name",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    IdIn { field: IdField, ids: Vec<i64> },
    Range { field: NumericField, min: Option<f64>, max: Option<f64> },
    TextIn { field: TextField, values: Vec<String> },
    Payment(PaymentStatus),
    /// Case-insensitive substring, OR-ed across [`SEARCH_COLUMNS`].
    Search(String),
}

/// Conjunction of predicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub predicates: Vec<Predicate>,
}

impl FilterCriteria {
    pub fn from_query(query: &ReportQuery) -> Self {
        let mut predicates = Vec::new();

        let id_lists = [
            (IdField::Buyer, &query.buyer_ids),
            (IdField::Farm, &query.farm_ids),
            (IdField::Flock, &query.flock_ids),
            (IdField::Shed, &query.shed_ids),
        ];
        for (field, raw) in id_lists {
            let ids = parse_id_list(raw.as_deref());
            if !ids.is_empty() {
                predicates.push(Predicate::IdIn { field, ids });
            }
        }

        let ranges = [
            (NumericField::TotalAmount, &query.min_amount, &query.max_amount),
            (NumericField::NetWeight, &query.min_net_weight, &query.max_net_weight),
            (NumericField::NumberOfBirds, &query.min_birds, &query.max_birds),
            (NumericField::Rate, &query.min_rate, &query.max_rate),
        ];
        for (field, min, max) in ranges {
            let min = parse_bound(min.as_deref());
            let max = parse_bound(max.as_deref());
            if min.is_some() || max.is_some() {
                predicates.push(Predicate::Range { field, min, max });
            }
        }

        let text_lists = [
            (TextField::VehicleNumber, &query.vehicle_numbers),
            (TextField::DriverName, &query.driver_names),
            (TextField::AccountantName, &query.accountant_names),
        ];
        for (field, raw) in text_lists {
            let values = parse_text_list(raw.as_deref());
            if !values.is_empty() {
                predicates.push(Predicate::TextIn { field, values });
            }
        }

        if let Some(status) = query.payment_status.as_deref().and_then(PaymentStatus::parse) {
            predicates.push(Predicate::Payment(status));
        }

        if let Some(term) = query.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            predicates.push(Predicate::Search(term.to_string()));
        }

        FilterCriteria { predicates }
    }
}

fn parse_id_list(raw: Option<&str>) -> Vec<i64> {
    let mut ids: Vec<i64> = Vec::new();
    for id in raw
        .unwrap_or_default()
        .split(',')
        .filter_map(|part| part.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
    {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

fn parse_text_list(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bound(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}
