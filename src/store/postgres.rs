use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::models::ledger::{JoinedLedger, LedgerDraft, LedgerRecord};
use crate::models::reference::{Buyer, BuyerRef, Farm, FarmRef, Flock, FlockRef, Shed, ShedRef};
use crate::numeric::AMOUNT_TOLERANCE;
use crate::reports::date_range::DateRange;
use crate::reports::filter::{FilterCriteria, PaymentStatus, Predicate, SEARCH_COLUMNS};
use crate::store::{LedgerStore, ReferenceStore};

const LEDGER_COLUMNS: &str = r#"l.id, l.farm_id, l.flock_id, l.shed_id, l.buyer_id,
    l.vehicle_number, l.driver_name, l.driver_contact, l.accountant_name,
    (l.empty_vehicle_weight)::FLOAT8 AS empty_vehicle_weight,
    (l.gross_weight)::FLOAT8 AS gross_weight,
    (l.net_weight)::FLOAT8 AS net_weight,
    l.number_of_birds,
    (l.rate)::FLOAT8 AS rate,
    (l.total_amount)::FLOAT8 AS total_amount,
    (l.amount_paid)::FLOAT8 AS amount_paid,
    l.date, l.created_at, l.updated_at"#;

const JOINED_COLUMNS: &str = r#",
    f.name AS farm_name, f.location AS farm_location,
    fl.name AS flock_name, fl.breed AS flock_breed,
    s.name AS shed_name, s.capacity AS shed_capacity,
    b.name AS buyer_name, b.contact AS buyer_contact
    FROM ledgers l
    LEFT JOIN farms f ON l.farm_id = f.id
    LEFT JOIN flocks fl ON l.flock_id = fl.id
    LEFT JOIN sheds s ON l.shed_id = s.id
    LEFT JOIN buyers b ON l.buyer_id = b.id"#;

const INSERT_COLUMNS: &str = r#"INSERT INTO ledgers (farm_id, flock_id, shed_id, buyer_id,
    vehicle_number, driver_name, driver_contact, accountant_name,
    empty_vehicle_weight, gross_weight, net_weight, number_of_birds,
    rate, total_amount, amount_paid, date) "#;

#[derive(FromRow)]
struct JoinedRow {
    #[sqlx(flatten)]
    record: LedgerRecord,
    farm_name: Option<String>,
    farm_location: Option<String>,
    flock_name: Option<String>,
    flock_breed: Option<String>,
    shed_name: Option<String>,
    shed_capacity: Option<i32>,
    buyer_name: Option<String>,
    buyer_contact: Option<String>,
}

impl From<JoinedRow> for JoinedLedger {
    fn from(row: JoinedRow) -> Self {
        let farm = row.farm_name.map(|name| FarmRef {
            id: row.record.farm_id,
            name,
            location: row.farm_location,
        });
        let flock = row.flock_name.map(|name| FlockRef {
            id: row.record.flock_id,
            name,
            breed: row.flock_breed,
        });
        let shed = row.shed_name.map(|name| ShedRef {
            id: row.record.shed_id,
            name,
            capacity: row.shed_capacity,
        });
        let buyer = row.buyer_name.map(|name| BuyerRef {
            id: row.record.buyer_id,
            name,
            contact: row.buyer_contact,
        });
        JoinedLedger { record: row.record, farm, flock, shed, buyer }
    }
}

#[derive(Clone)]
pub struct PgLedgerStore {
    db_pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(db_pool: PgPool) -> Self {
        PgLedgerStore { db_pool }
    }
}

/// `%`, `_` and `\` are literal in the search term.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

pub(crate) fn push_predicate(builder: &mut QueryBuilder<'_, Postgres>, predicate: &Predicate) {
    match predicate {
        Predicate::IdIn { field, ids } => {
            builder
                .push(" AND ")
                .push(field.column())
                .push(" = ANY(")
                .push_bind(ids.clone())
                .push(")");
        }
        Predicate::Range { field, min, max } => {
            if let Some(min) = min {
                builder.push(" AND ").push(field.column()).push(" >= ").push_bind(*min);
            }
            if let Some(max) = max {
                builder.push(" AND ").push(field.column()).push(" <= ").push_bind(*max);
            }
        }
        Predicate::TextIn { field, values } => {
            builder
                .push(" AND ")
                .push(field.column())
                .push(" = ANY(")
                .push_bind(values.clone())
                .push(")");
        }
        Predicate::Payment(status) => {
            builder.push(" AND ");
            match status {
                PaymentStatus::Paid => {
                    builder
                        .push("ABS(l.amount_paid - l.total_amount) <= ")
                        .push_bind(AMOUNT_TOLERANCE);
                }
                PaymentStatus::Partial => {
                    builder
                        .push("l.amount_paid > 0 AND l.amount_paid < l.total_amount AND ABS(l.amount_paid - l.total_amount) > ")
                        .push_bind(AMOUNT_TOLERANCE);
                }
                PaymentStatus::Unpaid => {
                    builder.push("l.amount_paid = 0");
                }
            }
        }
        Predicate::Search(term) => {
            let pattern = like_pattern(term);
            builder.push(" AND (");
            for (i, column) in SEARCH_COLUMNS.iter().enumerate() {
                if i > 0 {
                    builder.push(" OR ");
                }
                builder.push(*column).push(" ILIKE ").push_bind(pattern.clone());
            }
            builder.push(")");
        }
    }
}

/// Builds the single report statement: date window, then every predicate
/// AND-ed on.
pub(crate) fn report_query<'a>(range: &DateRange, criteria: &FilterCriteria) -> QueryBuilder<'a, Postgres> {
    let mut builder = QueryBuilder::new("SELECT ");
    builder
        .push(LEDGER_COLUMNS)
        .push(JOINED_COLUMNS)
        .push(" WHERE l.date >= ")
        .push_bind(range.start)
        .push(" AND l.date <= ")
        .push_bind(range.end);

    for predicate in &criteria.predicates {
        push_predicate(&mut builder, predicate);
    }

    builder.push(" ORDER BY l.date DESC, l.id DESC");
    builder
}

#[async_trait]
impl ReferenceStore for PgLedgerStore {
    async fn find_farm(&self, id: i64) -> Result<Option<Farm>, sqlx::Error> {
        sqlx::query_as::<_, Farm>("SELECT id, name, location FROM farms WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await
    }

    async fn find_flock(&self, id: i64) -> Result<Option<Flock>, sqlx::Error> {
        sqlx::query_as::<_, Flock>("SELECT id, farm_id, name, breed FROM flocks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await
    }

    async fn find_shed(&self, id: i64) -> Result<Option<Shed>, sqlx::Error> {
        sqlx::query_as::<_, Shed>("SELECT id, flock_id, name, capacity FROM sheds WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await
    }

    async fn find_buyer(&self, id: i64) -> Result<Option<Buyer>, sqlx::Error> {
        sqlx::query_as::<_, Buyer>("SELECT id, name, contact, address FROM buyers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn query_ledgers(
        &self,
        range: &DateRange,
        criteria: &FilterCriteria,
    ) -> Result<Vec<JoinedLedger>, sqlx::Error> {
        let mut builder = report_query(range, criteria);
        let rows = builder
            .build_query_as::<JoinedRow>()
            .fetch_all(&self.db_pool)
            .await?;
        Ok(rows.into_iter().map(JoinedLedger::from).collect())
    }

    async fn find_ledger(&self, id: i64) -> Result<Option<LedgerRecord>, sqlx::Error> {
        let sql = format!("SELECT {} FROM ledgers l WHERE l.id = $1", LEDGER_COLUMNS);
        sqlx::query_as::<_, LedgerRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await
    }

    async fn find_joined_ledger(&self, id: i64) -> Result<Option<JoinedLedger>, sqlx::Error> {
        let sql = format!("SELECT {}{} WHERE l.id = $1", LEDGER_COLUMNS, JOINED_COLUMNS);
        let row = sqlx::query_as::<_, JoinedRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?;
        Ok(row.map(JoinedLedger::from))
    }

    async fn insert_ledger(&self, draft: &LedgerDraft) -> Result<i64, sqlx::Error> {
        let mut ids = self.insert_ledgers(std::slice::from_ref(draft)).await?;
        ids.pop().ok_or(sqlx::Error::RowNotFound)
    }

    async fn insert_ledgers(&self, drafts: &[LedgerDraft]) -> Result<Vec<i64>, sqlx::Error> {
        if drafts.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(INSERT_COLUMNS);
        builder.push_values(drafts, |mut row, d| {
            row.push_bind(d.farm_id)
                .push_bind(d.flock_id)
                .push_bind(d.shed_id)
                .push_bind(d.buyer_id)
                .push_bind(d.vehicle_number.clone())
                .push_bind(d.driver_name.clone())
                .push_bind(d.driver_contact.clone())
                .push_bind(d.accountant_name.clone())
                .push_bind(d.empty_vehicle_weight)
                .push_bind(d.gross_weight)
                .push_bind(d.net_weight)
                .push_bind(d.number_of_birds)
                .push_bind(d.rate)
                .push_bind(d.total_amount)
                .push_bind(d.amount_paid)
                .push_bind(d.date);
        });
        builder.push(" RETURNING id");

        builder
            .build_query_scalar::<i64>()
            .fetch_all(&self.db_pool)
            .await
    }

    async fn update_ledger(&self, id: i64, draft: &LedgerDraft) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"UPDATE ledgers SET
                farm_id = $2, flock_id = $3, shed_id = $4, buyer_id = $5,
                vehicle_number = $6, driver_name = $7, driver_contact = $8, accountant_name = $9,
                empty_vehicle_weight = $10::FLOAT8, gross_weight = $11::FLOAT8, net_weight = $12::FLOAT8,
                number_of_birds = $13, rate = $14::FLOAT8, total_amount = $15::FLOAT8,
                amount_paid = $16::FLOAT8, date = $17, updated_at = NOW()
            WHERE id = $1"#,
        )
        .bind(id)
        .bind(draft.farm_id)
        .bind(draft.flock_id)
        .bind(draft.shed_id)
        .bind(draft.buyer_id)
        .bind(&draft.vehicle_number)
        .bind(&draft.driver_name)
        .bind(&draft.driver_contact)
        .bind(&draft.accountant_name)
        .bind(draft.empty_vehicle_weight)
        .bind(draft.gross_weight)
        .bind(draft.net_weight)
        .bind(draft.number_of_birds)
        .bind(draft.rate)
        .bind(draft.total_amount)
        .bind(draft.amount_paid)
        .bind(draft.date)
        .execute(&self.db_pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_ledger(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM ledgers WHERE id = $1")
            .bind(id)
            .execute(&self.db_pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtos::report::ReportQuery;
    use crate::reports::date_range::{end_of_day, start_of_day};
    use chrono::NaiveDate;

    fn range() -> DateRange {
        let day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        DateRange { start: start_of_day(day), end: end_of_day(day), title: String::new() }
    }

    #[test]
    fn escapes_like_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("abc"), "%abc%");
    }

    #[test]
    fn report_sql_has_window_only_without_filters() {
        let builder = report_query(&range(), &FilterCriteria::default());
        let sql = builder.sql();
        assert!(sql.contains("WHERE l.date >= $1 AND l.date <= $2"));
        assert!(!sql.contains("$3"));
        assert!(sql.ends_with("ORDER BY l.date DESC, l.id DESC"));
    }

    #[test]
    fn report_sql_ands_predicates_and_ors_search() {
        let query = ReportQuery {
            buyer_ids: Some("1,2".into()),
            min_amount: Some("10".into()),
            max_amount: Some("20".into()),
            payment_status: Some("unpaid".into()),
            search: Some("acre".into()),
            ..Default::default()
        };
        let builder = report_query(&range(), &FilterCriteria::from_query(&query));
        let sql = builder.sql();

        assert!(sql.contains(" AND l.buyer_id = ANY($3)"));
        assert!(sql.contains(" AND l.total_amount >= $4 AND l.total_amount <= $5"));
        assert!(sql.contains(" AND l.amount_paid = 0"));
        assert!(sql.contains(" AND (l.vehicle_number ILIKE $6 OR l.driver_name ILIKE $7"));
        assert!(sql.contains("s.name ILIKE $13)"));
    }
}
