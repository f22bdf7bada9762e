use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::reference::{BuyerRef, FarmRef, FlockRef, ShedRef};
use crate::numeric::round2;
use crate::validation::ledger::Measurements;

/// A persisted weighing/sale transaction.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRecord {
    pub id: i64,
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
    pub number_of_birds: i32,
    pub rate: f64,
    pub total_amount: f64,
    pub amount_paid: f64,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LedgerRecord {
    pub fn to_draft(&self) -> LedgerDraft {
        LedgerDraft {
            farm_id: self.farm_id,
            flock_id: self.flock_id,
            shed_id: self.shed_id,
            buyer_id: self.buyer_id,
            vehicle_number: self.vehicle_number.clone(),
            driver_name: self.driver_name.clone(),
            driver_contact: self.driver_contact.clone(),
            accountant_name: self.accountant_name.clone(),
            empty_vehicle_weight: self.empty_vehicle_weight,
            gross_weight: self.gross_weight,
            net_weight: self.net_weight,
            number_of_birds: self.number_of_birds,
            rate: self.rate,
            total_amount: self.total_amount,
            amount_paid: self.amount_paid,
            date: self.date,
        }
    }
}

/// Column values for a ledger row about to be written (insert, or the
/// effective row of an update).
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerDraft {
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
    pub number_of_birds: i32,
    pub rate: f64,
    pub total_amount: f64,
    pub amount_paid: f64,
    pub date: DateTime<Utc>,
}

impl LedgerDraft {
    /// Rounds weights, rate and amounts to the 2-decimal scale of their
    /// columns, so the values validated are the values stored.
    pub fn round_to_column_scale(mut self) -> Self {
        self.empty_vehicle_weight = round2(self.empty_vehicle_weight);
        self.gross_weight = round2(self.gross_weight);
        self.net_weight = round2(self.net_weight);
        self.rate = round2(self.rate);
        self.total_amount = round2(self.total_amount);
        self.amount_paid = round2(self.amount_paid);
        self
    }

    pub fn measurements(&self) -> Measurements {
        Measurements {
            empty_vehicle_weight: self.empty_vehicle_weight,
            gross_weight: self.gross_weight,
            net_weight: self.net_weight,
            rate: self.rate,
            total_amount: self.total_amount,
            amount_paid: self.amount_paid,
        }
    }
}

/// A ledger row plus the display fields of the entities it references, as
/// handed back by the store.
#[derive(Debug, Clone)]
pub struct JoinedLedger {
    pub record: LedgerRecord,
    pub farm: Option<FarmRef>,
    pub flock: Option<FlockRef>,
    pub shed: Option<ShedRef>,
    pub buyer: Option<BuyerRef>,
}

/// What callers see: the joined row with `balance` derived.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerView {
    #[serde(flatten)]
    pub record: LedgerRecord,
    pub balance: f64,
    pub farm: Option<FarmRef>,
    pub flock: Option<FlockRef>,
    pub shed: Option<ShedRef>,
    pub buyer: Option<BuyerRef>,
}

impl From<JoinedLedger> for LedgerView {
    fn from(joined: JoinedLedger) -> Self {
        let balance = joined.record.total_amount - joined.record.amount_paid;
        LedgerView {
            record: joined.record,
            balance,
            farm: joined.farm,
            flock: joined.flock,
            shed: joined.shed,
            buyer: joined.buyer,
        }
    }
}
