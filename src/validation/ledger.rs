use crate::dtos::ledger::UpdateLedgerRequest;
use crate::models::ledger::{LedgerDraft, LedgerRecord};
use crate::numeric::{approximately_equal, AMOUNT_TOLERANCE};
use crate::store::ReferenceStore;
use crate::validation::ValidationError;

/// The weight/amount fields the numeric rules look at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurements {
    pub empty_vehicle_weight: f64,
    pub gross_weight: f64,
    pub net_weight: f64,
    pub rate: f64,
    pub total_amount: f64,
    pub amount_paid: f64,
}

/// Numeric invariants, in the order they are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericRule {
    /// gross > empty
    WeightLogic,
    /// net == gross - empty
    NetWeight,
    /// total == net * rate
    TotalAmount,
    /// paid >= 0
    AmountPaid,
}

pub const ALL_RULES: [NumericRule; 4] = [
    NumericRule::WeightLogic,
    NumericRule::NetWeight,
    NumericRule::TotalAmount,
    NumericRule::AmountPaid,
];

impl NumericRule {
    pub fn check(self, m: &Measurements) -> Result<(), ValidationError> {
        match self {
            NumericRule::WeightLogic => {
                if m.gross_weight <= m.empty_vehicle_weight {
                    return Err(ValidationError::WeightLogic {
                        gross: m.gross_weight,
                        empty: m.empty_vehicle_weight,
                    });
                }
            }
            NumericRule::NetWeight => {
                let expected = m.gross_weight - m.empty_vehicle_weight;
                if !approximately_equal(m.net_weight, expected, AMOUNT_TOLERANCE) {
                    return Err(ValidationError::NetWeight { net: m.net_weight, expected });
                }
            }
            NumericRule::TotalAmount => {
                let expected = m.net_weight * m.rate;
                if !approximately_equal(m.total_amount, expected, AMOUNT_TOLERANCE) {
                    return Err(ValidationError::TotalAmount { total: m.total_amount, expected });
                }
            }
            NumericRule::AmountPaid => {
                if m.amount_paid < 0.0 {
                    return Err(ValidationError::NegativeAmountPaid(m.amount_paid));
                }
            }
        }
        Ok(())
    }

    /// Rules that must be re-run when `patch` sets any field they read.
    pub fn touched_by(patch: &UpdateLedgerRequest) -> Vec<NumericRule> {
        let empty = patch.empty_vehicle_weight.is_some();
        let gross = patch.gross_weight.is_some();
        let net = patch.net_weight.is_some();
        let rate = patch.rate.is_some();
        let total = patch.total_amount.is_some();
        let paid = patch.amount_paid.is_some();

        ALL_RULES
            .into_iter()
            .filter(|rule| match rule {
                NumericRule::WeightLogic => gross || empty,
                NumericRule::NetWeight => net || gross || empty,
                NumericRule::TotalAmount => total || net || rate,
                NumericRule::AmountPaid => paid,
            })
            .collect()
    }
}

pub fn validate_numeric_consistency(m: &Measurements) -> Result<(), ValidationError> {
    check_rules(m, &ALL_RULES)
}

fn check_rules(m: &Measurements, rules: &[NumericRule]) -> Result<(), ValidationError> {
    rules.iter().try_for_each(|rule| rule.check(m))
}

fn check_required_text(draft: &LedgerDraft) -> Result<(), ValidationError> {
    if draft.vehicle_number.trim().is_empty() {
        return Err(ValidationError::MissingField("vehicleNumber"));
    }
    if draft.driver_name.trim().is_empty() {
        return Err(ValidationError::MissingField("driverName"));
    }
    Ok(())
}

pub struct LedgerValidator<'a, S: ReferenceStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ReferenceStore + ?Sized> LedgerValidator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        LedgerValidator { store }
    }

    /// Looks the four references up concurrently, then checks the
    /// farm -> flock -> shed chain.
    ///
    /// Nothing is locked between this check and the write that follows.
    pub async fn validate_relationships(
        &self,
        farm_id: i64,
        flock_id: i64,
        shed_id: i64,
        buyer_id: i64,
    ) -> Result<(), ValidationError> {
        let (farm, flock, shed, buyer) = tokio::join!(
            self.store.find_farm(farm_id),
            self.store.find_flock(flock_id),
            self.store.find_shed(shed_id),
            self.store.find_buyer(buyer_id),
        );

        farm?.ok_or(ValidationError::FarmNotFound(farm_id))?;
        let flock = flock?.ok_or(ValidationError::FlockNotFound(flock_id))?;
        let shed = shed?.ok_or(ValidationError::ShedNotFound(shed_id))?;
        buyer?.ok_or(ValidationError::BuyerNotFound(buyer_id))?;

        if flock.farm_id != farm_id {
            return Err(ValidationError::FlockFarmMismatch { flock_id, farm_id });
        }
        if shed.flock_id != flock_id {
            return Err(ValidationError::ShedFlockMismatch { shed_id, flock_id });
        }
        Ok(())
    }

    pub async fn validate_new(&self, draft: &LedgerDraft) -> Result<(), ValidationError> {
        check_required_text(draft)?;
        self.validate_relationships(draft.farm_id, draft.flock_id, draft.shed_id, draft.buyer_id)
            .await?;
        validate_numeric_consistency(&draft.measurements())
    }

    /// Validates every entry before anything is written. The first failure
    /// is reported with its 1-based position in the batch.
    pub async fn validate_batch(&self, drafts: &[LedgerDraft]) -> Result<(), ValidationError> {
        if drafts.is_empty() {
            return Err(ValidationError::EmptyBatch);
        }
        for (i, draft) in drafts.iter().enumerate() {
            self.validate_new(draft).await.map_err(|e| match e {
                ValidationError::Store(_) => e,
                other => ValidationError::BulkEntry { index: i + 1, source: Box::new(other) },
            })?;
        }
        Ok(())
    }

    /// Merge-then-validate: overlays `patch` on `existing` and re-checks only
    /// what the patch touches. Returns the row to write.
    pub async fn validate_update(
        &self,
        existing: &LedgerRecord,
        patch: &UpdateLedgerRequest,
    ) -> Result<LedgerDraft, ValidationError> {
        let effective = patch.apply_to(existing);

        if patch.vehicle_number.is_some() || patch.driver_name.is_some() {
            check_required_text(&effective)?;
        }
        if patch.touches_references() {
            self.validate_relationships(
                effective.farm_id,
                effective.flock_id,
                effective.shed_id,
                effective.buyer_id,
            )
            .await?;
        }
        check_rules(&effective.measurements(), &NumericRule::touched_by(patch))?;

        Ok(effective)
    }
}
