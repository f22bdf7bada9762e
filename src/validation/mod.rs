//! Write-path checks for ledger entries.

pub mod ledger;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Farm {0} not found")]
    FarmNotFound(i64),
    #[error("Flock {0} not found")]
    FlockNotFound(i64),
    #[error("Shed {0} not found")]
    ShedNotFound(i64),
    #[error("Buyer {0} not found")]
    BuyerNotFound(i64),
    #[error("Ledger entry {0} not found")]
    LedgerNotFound(i64),
    #[error("Flock {flock_id} does not belong to farm {farm_id}")]
    FlockFarmMismatch { flock_id: i64, farm_id: i64 },
    #[error("Shed {shed_id} does not belong to flock {flock_id}")]
    ShedFlockMismatch { shed_id: i64, flock_id: i64 },
    #[error("Gross weight ({gross}) must be greater than empty vehicle weight ({empty})")]
    WeightLogic { gross: f64, empty: f64 },
    #[error("Net weight ({net}) must equal gross weight minus empty vehicle weight ({expected})")]
    NetWeight { net: f64, expected: f64 },
    #[error("Total amount ({total}) must equal net weight x rate ({expected})")]
    TotalAmount { total: f64, expected: f64 },
    #[error("Amount paid ({0}) cannot be negative")]
    NegativeAmountPaid(f64),
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("At least one ledger entry is required")]
    EmptyBatch,
    #[error("Validation failed for entry {index}: {source}")]
    BulkEntry {
        index: usize,
        #[source]
        source: Box<ValidationError>,
    },
    #[error(transparent)]
    Store(#[from] sqlx::Error),
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::FarmNotFound(_) => "FARM_NOT_FOUND",
            ValidationError::FlockNotFound(_) => "FLOCK_NOT_FOUND",
            ValidationError::ShedNotFound(_) => "SHED_NOT_FOUND",
            ValidationError::BuyerNotFound(_) => "BUYER_NOT_FOUND",
            ValidationError::LedgerNotFound(_) => "LEDGER_NOT_FOUND",
            ValidationError::FlockFarmMismatch { .. } => "INVALID_FLOCK_FARM_RELATIONSHIP",
            ValidationError::ShedFlockMismatch { .. } => "INVALID_SHED_FLOCK_RELATIONSHIP",
            ValidationError::WeightLogic { .. } => "INVALID_WEIGHT_LOGIC",
            ValidationError::NetWeight { .. } => "INVALID_NET_WEIGHT_CALCULATION",
            ValidationError::TotalAmount { .. } => "INVALID_TOTAL_AMOUNT_CALCULATION",
            ValidationError::NegativeAmountPaid(_) => "INVALID_AMOUNT_PAID",
            ValidationError::MissingField(_) => "MISSING_REQUIRED_FIELD",
            ValidationError::EmptyBatch => "EMPTY_BATCH",
            ValidationError::BulkEntry { source, .. } => source.code(),
            ValidationError::Store(_) => "DATABASE_ERROR",
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            ValidationError::FarmNotFound(_)
            | ValidationError::FlockNotFound(_)
            | ValidationError::ShedNotFound(_)
            | ValidationError::BuyerNotFound(_)
            | ValidationError::LedgerNotFound(_) => true,
            ValidationError::BulkEntry { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}
