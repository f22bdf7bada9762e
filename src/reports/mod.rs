//! Universal ledger report: date window + filters -> one store query ->
//! grouping/aggregation -> flat or grouped response.

pub mod assembler;
pub mod date_range;
pub mod filter;
pub mod grouping;
pub mod summary;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::dtos::report::ReportQuery;
use crate::store::LedgerStore;
use assembler::ReportData;
use date_range::DurationInput;
use filter::FilterCriteria;
use grouping::GroupingOptions;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Date is required for daily reports")]
    MissingDate,
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Both startDate and endDate are required for custom reports")]
    MissingDateRange,
    #[error("startDate must not be after endDate")]
    InvalidDateRange,
    #[error("Period must be a positive number of days")]
    InvalidPeriod,
    #[error("Invalid duration '{0}'. Use daily, weekly, monthly, yearly, custom or period")]
    InvalidDuration(String),
    #[error(transparent)]
    Store(#[from] sqlx::Error),
}

impl ReportError {
    pub fn code(&self) -> &'static str {
        match self {
            ReportError::MissingDate => "MISSING_DATE",
            ReportError::InvalidDate(_) => "INVALID_DATE",
            ReportError::MissingDateRange => "MISSING_DATE_RANGE",
            ReportError::InvalidDateRange => "INVALID_DATE_RANGE",
            ReportError::InvalidPeriod => "INVALID_PERIOD",
            ReportError::InvalidDuration(_) => "INVALID_DURATION",
            ReportError::Store(_) => "DATABASE_ERROR",
        }
    }
}

pub async fn generate_report<S>(
    store: &S,
    query: &ReportQuery,
    now: DateTime<Utc>,
) -> Result<ReportData, ReportError>
where
    S: LedgerStore + ?Sized,
{
    let range = date_range::resolve(&DurationInput::from(query), now)?;
    let criteria = FilterCriteria::from_query(query);
    let options = GroupingOptions::from_query(query);

    tracing::debug!(
        start = %range.start,
        end = %range.end,
        predicates = criteria.predicates.len(),
        group_by = ?options.group_by,
        "Running ledger report"
    );

    let groups = grouping::run_grouping(store, &range, &criteria, &options).await?;
    Ok(assembler::assemble(range, groups, &options))
}
