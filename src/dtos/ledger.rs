use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::models::ledger::{LedgerDraft, LedgerRecord};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLedgerRequest {
    pub farm_id: i64,
    pub flock_id: i64,
    pub shed_id: i64,
    pub buyer_id: i64,
    pub vehicle_number: String,
    pub driver_name: String,
    pub driver_contact: Option<String>,
    pub accountant_name: Option<String>,
    pub empty_vehicle_weight: f64,
    pub gross_weight: f64,
    pub net_weight: f64,
    #[serde(default)]
    pub number_of_birds: i32,
    pub rate: f64,
    pub total_amount: f64,
    #[serde(default)]
    pub amount_paid: f64,
    pub date: Option<DateTime<Utc>>, // Defaults to the time of the request
}

impl CreateLedgerRequest {
    pub fn into_draft(self, now: DateTime<Utc>) -> LedgerDraft {
        LedgerDraft {
            farm_id: self.farm_id,
            flock_id: self.flock_id,
            shed_id: self.shed_id,
            buyer_id: self.buyer_id,
            vehicle_number: self.vehicle_number.trim().to_string(),
            driver_name: self.driver_name.trim().to_string(),
            driver_contact: self.driver_contact,
            accountant_name: self.accountant_name,
            empty_vehicle_weight: self.empty_vehicle_weight,
            gross_weight: self.gross_weight,
            net_weight: self.net_weight,
            number_of_birds: self.number_of_birds,
            rate: self.rate,
            total_amount: self.total_amount,
            amount_paid: self.amount_paid,
            date: self.date.unwrap_or(now),
        }
        .round_to_column_scale()
    }
}

#[derive(Debug, Deserialize)]
pub struct BulkCreateLedgerRequest {
    pub entries: Vec<CreateLedgerRequest>,
}

/// Partial update: absent fields keep their stored values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLedgerRequest {
    pub farm_id: Option<i64>,
    pub flock_id: Option<i64>,
    pub shed_id: Option<i64>,
    pub buyer_id: Option<i64>,
    pub vehicle_number: Option<String>,
    pub driver_name: Option<String>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub driver_contact: Option<Option<String>>, // Some(None) clears
    #[serde(default, deserialize_with = "present_or_null")]
    pub accountant_name: Option<Option<String>>,
    pub empty_vehicle_weight: Option<f64>,
    pub gross_weight: Option<f64>,
    pub net_weight: Option<f64>,
    pub number_of_birds: Option<i32>,
    pub rate: Option<f64>,
    pub total_amount: Option<f64>,
    pub amount_paid: Option<f64>,
    pub date: Option<DateTime<Utc>>,
}

impl UpdateLedgerRequest {
    /// Overlays this patch onto the stored row, producing the row as it
    /// would look after the update.
    pub fn apply_to(&self, existing: &LedgerRecord) -> LedgerDraft {
        let mut draft = existing.to_draft();
        if let Some(v) = self.farm_id { draft.farm_id = v; }
        if let Some(v) = self.flock_id { draft.flock_id = v; }
        if let Some(v) = self.shed_id { draft.shed_id = v; }
        if let Some(v) = self.buyer_id { draft.buyer_id = v; }
        if let Some(v) = &self.vehicle_number { draft.vehicle_number = v.trim().to_string(); }
        if let Some(v) = &self.driver_name { draft.driver_name = v.trim().to_string(); }
        if let Some(v) = &self.driver_contact { draft.driver_contact = v.clone(); }
        if let Some(v) = &self.accountant_name { draft.accountant_name = v.clone(); }
        if let Some(v) = self.empty_vehicle_weight { draft.empty_vehicle_weight = v; }
        if let Some(v) = self.gross_weight { draft.gross_weight = v; }
        if let Some(v) = self.net_weight { draft.net_weight = v; }
        if let Some(v) = self.number_of_birds { draft.number_of_birds = v; }
        if let Some(v) = self.rate { draft.rate = v; }
        if let Some(v) = self.total_amount { draft.total_amount = v; }
        if let Some(v) = self.amount_paid { draft.amount_paid = v; }
        if let Some(v) = self.date { draft.date = v; }
        draft.round_to_column_scale()
    }

    pub fn touches_references(&self) -> bool {
        self.farm_id.is_some() || self.flock_id.is_some() || self.shed_id.is_some() || self.buyer_id.is_some()
    }
}

// Distinguishes an explicit `null` (Some(None)) from an absent field (None).
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
