//! Persistence seams. The report engine and the ledger validator only talk
//! to these traits; `postgres` is the production implementation.

pub mod postgres;
#[cfg(test)]
pub mod memory;

use async_trait::async_trait;

use crate::models::ledger::{JoinedLedger, LedgerDraft, LedgerRecord};
use crate::models::reference::{Buyer, Farm, Flock, Shed};
use crate::reports::date_range::DateRange;
use crate::reports::filter::FilterCriteria;

pub use postgres::PgLedgerStore;

#[async_trait]
pub trait ReferenceStore: Send + Sync {
    async fn find_farm(&self, id: i64) -> Result<Option<Farm>, sqlx::Error>;
    async fn find_flock(&self, id: i64) -> Result<Option<Flock>, sqlx::Error>;
    async fn find_shed(&self, id: i64) -> Result<Option<Shed>, sqlx::Error>;
    async fn find_buyer(&self, id: i64) -> Result<Option<Buyer>, sqlx::Error>;
}

#[async_trait]
pub trait LedgerStore: ReferenceStore {
    /// Every ledger row dated inside `range` that satisfies all of
    /// `criteria`, joined with its farm/flock/shed/buyer display fields.
    async fn query_ledgers(
        &self,
        range: &DateRange,
        criteria: &FilterCriteria,
    ) -> Result<Vec<JoinedLedger>, sqlx::Error>;

    async fn find_ledger(&self, id: i64) -> Result<Option<LedgerRecord>, sqlx::Error>;
    async fn find_joined_ledger(&self, id: i64) -> Result<Option<JoinedLedger>, sqlx::Error>;

    async fn insert_ledger(&self, draft: &LedgerDraft) -> Result<i64, sqlx::Error>;
    /// Inserts the whole batch in one statement.
    async fn insert_ledgers(&self, drafts: &[LedgerDraft]) -> Result<Vec<i64>, sqlx::Error>;
    /// Returns false when no row has that id.
    async fn update_ledger(&self, id: i64, draft: &LedgerDraft) -> Result<bool, sqlx::Error>;
    async fn delete_ledger(&self, id: i64) -> Result<bool, sqlx::Error>;
}
