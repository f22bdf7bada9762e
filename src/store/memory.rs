//! In-memory store for tests. Evaluates predicates the same way the SQL
//! rendered by `postgres::push_predicate` does.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::ledger::{JoinedLedger, LedgerDraft, LedgerRecord, LedgerView};
use crate::models::reference::{Buyer, BuyerRef, Farm, FarmRef, Flock, FlockRef, Shed, ShedRef};
use crate::numeric::{approximately_equal, AMOUNT_TOLERANCE};
use crate::reports::date_range::DateRange;
use crate::reports::filter::{FilterCriteria, IdField, NumericField, PaymentStatus, Predicate, TextField};
use crate::store::{LedgerStore, ReferenceStore};

#[derive(Default)]
struct Tables {
    farms: Vec<Farm>,
    flocks: Vec<Flock>,
    sheds: Vec<Shed>,
    buyers: Vec<Buyer>,
    ledgers: Vec<LedgerRecord>,
    next_id: i64,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// Farms 1-2, flock N on farm N, shed N in flock N, buyers 1-2.
    pub fn with_reference_data() -> Self {
        let store = MemoryStore::default();
        {
            let mut t = store.tables.lock().unwrap();
            t.farms = vec![
                Farm { id: 1, name: "Green Acres".into(), location: Some("Hosur".into()) },
                Farm { id: 2, name: "Sunrise Farm".into(), location: Some("Mysuru".into()) },
            ];
            t.flocks = vec![
                Flock { id: 1, farm_id: 1, name: "Batch A".into(), breed: Some("Cobb 500".into()) },
                Flock { id: 2, farm_id: 2, name: "Batch B".into(), breed: Some("Ross 308".into()) },
            ];
            t.sheds = vec![
                Shed { id: 1, flock_id: 1, name: "Shed North".into(), capacity: Some(5000) },
                Shed { id: 2, flock_id: 2, name: "Shed South".into(), capacity: Some(3000) },
            ];
            t.buyers = vec![
                Buyer {
                    id: 1,
                    name: "Fresh Poultry Traders".into(),
                    contact: Some("9000000001".into()),
                    address: None,
                },
                Buyer {
                    id: 2,
                    name: "City Chicken Mart".into(),
                    contact: Some("9000000002".into()),
                    address: None,
                },
            ];
        }
        store
    }

    /// Inserts without validation.
    pub fn seed(&self, draft: LedgerDraft) -> i64 {
        let mut t = self.tables.lock().unwrap();
        insert(&mut t, &draft)
    }

    pub fn ledger_count(&self) -> usize {
        self.tables.lock().unwrap().ledgers.len()
    }

    pub fn remove_flock(&self, id: i64) {
        self.tables.lock().unwrap().flocks.retain(|f| f.id != id);
    }
}

fn insert(t: &mut Tables, draft: &LedgerDraft) -> i64 {
    t.next_id += 1;
    let id = t.next_id;
    let stamp = draft.date;
    t.ledgers.push(record_from_draft(id, draft, stamp, stamp));
    id
}

fn record_from_draft(id: i64, d: &LedgerDraft, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> LedgerRecord {
    LedgerRecord {
        id,
        farm_id: d.farm_id,
        flock_id: d.flock_id,
        shed_id: d.shed_id,
        buyer_id: d.buyer_id,
        vehicle_number: d.vehicle_number.clone(),
        driver_name: d.driver_name.clone(),
        driver_contact: d.driver_contact.clone(),
        accountant_name: d.accountant_name.clone(),
        empty_vehicle_weight: d.empty_vehicle_weight,
        gross_weight: d.gross_weight,
        net_weight: d.net_weight,
        number_of_birds: d.number_of_birds,
        rate: d.rate,
        total_amount: d.total_amount,
        amount_paid: d.amount_paid,
        date: d.date,
        created_at,
        updated_at,
    }
}

fn join(t: &Tables, record: LedgerRecord) -> JoinedLedger {
    let farm = t.farms.iter().find(|f| f.id == record.farm_id).map(|f| FarmRef {
        id: f.id,
        name: f.name.clone(),
        location: f.location.clone(),
    });
    let flock = t.flocks.iter().find(|f| f.id == record.flock_id).map(|f| FlockRef {
        id: f.id,
        name: f.name.clone(),
        breed: f.breed.clone(),
    });
    let shed = t.sheds.iter().find(|s| s.id == record.shed_id).map(|s| ShedRef {
        id: s.id,
        name: s.name.clone(),
        capacity: s.capacity,
    });
    let buyer = t.buyers.iter().find(|b| b.id == record.buyer_id).map(|b| BuyerRef {
        id: b.id,
        name: b.name.clone(),
        contact: b.contact.clone(),
    });
    JoinedLedger { record, farm, flock, shed, buyer }
}

fn matches(predicate: &Predicate, row: &JoinedLedger) -> bool {
    let r = &row.record;
    match predicate {
        Predicate::IdIn { field, ids } => {
            let id = match field {
                IdField::Buyer => r.buyer_id,
                IdField::Farm => r.farm_id,
                IdField::Flock => r.flock_id,
                IdField::Shed => r.shed_id,
            };
            ids.contains(&id)
        }
        Predicate::Range { field, min, max } => {
            let value = match field {
                NumericField::TotalAmount => r.total_amount,
                NumericField::NetWeight => r.net_weight,
                NumericField::NumberOfBirds => f64::from(r.number_of_birds),
                NumericField::Rate => r.rate,
            };
            min.map_or(true, |m| value >= m) && max.map_or(true, |m| value <= m)
        }
        Predicate::TextIn { field, values } => {
            let value = match field {
                TextField::VehicleNumber => Some(r.vehicle_number.as_str()),
                TextField::DriverName => Some(r.driver_name.as_str()),
                TextField::AccountantName => r.accountant_name.as_deref(),
            };
            value.is_some_and(|v| values.iter().any(|candidate| candidate == v))
        }
        Predicate::Payment(status) => {
            let settled = approximately_equal(r.amount_paid, r.total_amount, AMOUNT_TOLERANCE);
            match status {
                PaymentStatus::Paid => settled,
                PaymentStatus::Partial => r.amount_paid > 0.0 && r.amount_paid < r.total_amount && !settled,
                PaymentStatus::Unpaid => r.amount_paid == 0.0,
            }
        }
        Predicate::Search(term) => {
            let needle = term.to_lowercase();
            let haystacks = [
                Some(r.vehicle_number.as_str()),
                Some(r.driver_name.as_str()),
                r.driver_contact.as_deref(),
                r.accountant_name.as_deref(),
                row.buyer.as_ref().map(|b| b.name.as_str()),
                row.farm.as_ref().map(|f| f.name.as_str()),
                row.flock.as_ref().map(|f| f.name.as_str()),
                row.shed.as_ref().map(|s| s.name.as_str()),
            ];
            haystacks
                .into_iter()
                .flatten()
                .any(|h| h.to_lowercase().contains(&needle))
        }
    }
}

#[async_trait]
impl ReferenceStore for MemoryStore {
    async fn find_farm(&self, id: i64) -> Result<Option<Farm>, sqlx::Error> {
        Ok(self.tables.lock().unwrap().farms.iter().find(|f| f.id == id).cloned())
    }

    async fn find_flock(&self, id: i64) -> Result<Option<Flock>, sqlx::Error> {
        Ok(self.tables.lock().unwrap().flocks.iter().find(|f| f.id == id).cloned())
    }

    async fn find_shed(&self, id: i64) -> Result<Option<Shed>, sqlx::Error> {
        Ok(self.tables.lock().unwrap().sheds.iter().find(|s| s.id == id).cloned())
    }

    async fn find_buyer(&self, id: i64) -> Result<Option<Buyer>, sqlx::Error> {
        Ok(self.tables.lock().unwrap().buyers.iter().find(|b| b.id == id).cloned())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn query_ledgers(
        &self,
        range: &DateRange,
        criteria: &FilterCriteria,
    ) -> Result<Vec<JoinedLedger>, sqlx::Error> {
        let t = self.tables.lock().unwrap();
        let mut rows: Vec<JoinedLedger> = t
            .ledgers
            .iter()
            .filter(|r| r.date >= range.start && r.date <= range.end)
            .map(|r| join(&t, r.clone()))
            .filter(|row| criteria.predicates.iter().all(|p| matches(p, row)))
            .collect();
        rows.sort_by(|a, b| b.record.date.cmp(&a.record.date).then(b.record.id.cmp(&a.record.id)));
        Ok(rows)
    }

    async fn find_ledger(&self, id: i64) -> Result<Option<LedgerRecord>, sqlx::Error> {
        Ok(self.tables.lock().unwrap().ledgers.iter().find(|r| r.id == id).cloned())
    }

    async fn find_joined_ledger(&self, id: i64) -> Result<Option<JoinedLedger>, sqlx::Error> {
        let t = self.tables.lock().unwrap();
        let record = t.ledgers.iter().find(|r| r.id == id).cloned();
        Ok(record.map(|r| join(&t, r)))
    }

    async fn insert_ledger(&self, draft: &LedgerDraft) -> Result<i64, sqlx::Error> {
        let mut t = self.tables.lock().unwrap();
        Ok(insert(&mut t, draft))
    }

    async fn insert_ledgers(&self, drafts: &[LedgerDraft]) -> Result<Vec<i64>, sqlx::Error> {
        let mut t = self.tables.lock().unwrap();
        Ok(drafts.iter().map(|d| insert(&mut t, d)).collect())
    }

    async fn update_ledger(&self, id: i64, draft: &LedgerDraft) -> Result<bool, sqlx::Error> {
        let mut t = self.tables.lock().unwrap();
        let Some(existing) = t.ledgers.iter_mut().find(|r| r.id == id) else {
            return Ok(false);
        };
        *existing = record_from_draft(id, draft, existing.created_at, Utc::now());
        Ok(true)
    }

    async fn delete_ledger(&self, id: i64) -> Result<bool, sqlx::Error> {
        let mut t = self.tables.lock().unwrap();
        let before = t.ledgers.len();
        t.ledgers.retain(|r| r.id != id);
        Ok(t.ledgers.len() < before)
    }
}

/// A consistent ledger entry on farm 1 / flock 1 / shed 1 for buyer 1:
/// 3000 - 2000 = 1000 kg at 1.5 = 1500, nothing paid.
pub fn sample_ledger(date: DateTime<Utc>) -> LedgerDraft {
    LedgerDraft {
        farm_id: 1,
        flock_id: 1,
        shed_id: 1,
        buyer_id: 1,
        vehicle_number: "KA-01-AB-1234".into(),
        driver_name: "Ravi".into(),
        driver_contact: Some("9800000000".into()),
        accountant_name: Some("Meena".into()),
        empty_vehicle_weight: 2000.0,
        gross_weight: 3000.0,
        net_weight: 1000.0,
        number_of_birds: 400,
        rate: 1.5,
        total_amount: 1500.0,
        amount_paid: 0.0,
        date,
    }
}

pub fn sample_view(date: DateTime<Utc>) -> LedgerView {
    let store = MemoryStore::with_reference_data();
    let t = store.tables.lock().unwrap();
    let record = record_from_draft(1, &sample_ledger(date), date, date);
    LedgerView::from(join(&t, record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtos::report::ReportQuery;
    use crate::reports::date_range::{end_of_day, start_of_day};
    use chrono::{NaiveDate, TimeZone};

    fn march() -> DateRange {
        DateRange {
            start: start_of_day(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()),
            end: end_of_day(NaiveDate::from_ymd_opt(2025, 3, 31).unwrap()),
            title: String::new(),
        }
    }

    #[tokio::test]
    async fn search_matches_joined_names_case_insensitively() {
        let store = MemoryStore::with_reference_data();
        store.seed(sample_ledger(Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap()));
        let mut other = sample_ledger(Utc.with_ymd_and_hms(2025, 3, 4, 9, 0, 0).unwrap());
        other.farm_id = 2;
        other.flock_id = 2;
        other.shed_id = 2;
        store.seed(other);

        for (term, expected) in [("green acres", 1), ("SHED", 2), ("mart", 0), ("ka-01", 2), ("meen", 2)] {
            let query = ReportQuery { search: Some(term.into()), ..Default::default() };
            let rows = store.query_ledgers(&march(), &FilterCriteria::from_query(&query)).await.unwrap();
            assert_eq!(rows.len(), expected, "search {term}");
        }
    }

    #[tokio::test]
    async fn rows_outside_window_are_excluded() {
        let store = MemoryStore::with_reference_data();
        store.seed(sample_ledger(Utc.with_ymd_and_hms(2025, 2, 28, 23, 59, 59).unwrap()));
        store.seed(sample_ledger(Utc.with_ymd_and_hms(2025, 3, 31, 23, 59, 59).unwrap()));
        let rows = store.query_ledgers(&march(), &FilterCriteria::default()).await.unwrap();
        assert_eq!(rows.len(), 1);
    }
}
