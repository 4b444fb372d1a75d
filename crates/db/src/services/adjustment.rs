//! Adjustment proposals, creation and deletion.
//!
//! Creating an adjustment never runs the engine; the next costing pass picks
//! it up as a pending transaction. Deleting a critical adjustment recosts the
//! group from a conservative cutoff because it may have shaped FIFO layers far
//! downstream.

use chrono::NaiveDate;
use kardex_core::kardex::{
    AdjustmentAdvisor, AdjustmentClass, AdjustmentDirection, AdjustmentProposal,
    ConsolidatedBalance, GroupKey, KardexEntry, Transaction,
};
use kardex_shared::CostingConfig;
use kardex_shared::types::TransactionId;
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::{info, instrument};

use crate::error::CostingError;
use crate::repositories::ledger::DeletedRows;
use crate::repositories::transaction::NewTransaction;
use crate::repositories::{balance, ledger, transaction};
use crate::services::costing::{CostingService, GroupPass};

/// Input for creating an adjustment.
#[derive(Debug, Clone)]
pub struct CreateAdjustment {
    /// The transaction the adjustment corrects.
    pub reference_transaction_id: TransactionId,
    /// Inject or remove.
    pub direction: AdjustmentDirection,
    /// Unsigned quantity, must be positive.
    pub quantity: Decimal,
    /// Unit price; an unpriced injection enters at zero cost.
    pub price: Option<Decimal>,
    /// Free-form note.
    pub note: Option<String>,
    /// Sub-kind deciding how deletion cascades.
    pub class: AdjustmentClass,
    /// Date override; defaults to the reference transaction's date.
    ///
    /// On the default date the adjustment gets a higher id than its reference
    /// and so sorts after it. An injection meant to cover a flagged outflow
    /// must be dated strictly earlier, or the next pass flags the outflow again.
    pub effective_date: Option<NaiveDate>,
}

impl CreateAdjustment {
    /// A standard adjustment dated on its reference transaction.
    #[must_use]
    pub const fn new(
        reference_transaction_id: TransactionId,
        direction: AdjustmentDirection,
        quantity: Decimal,
        price: Option<Decimal>,
    ) -> Self {
        Self {
            reference_transaction_id,
            direction,
            quantity,
            price,
            note: None,
            class: AdjustmentClass::Standard,
            effective_date: None,
        }
    }

    /// Accepts a proposal as-is.
    #[must_use]
    pub const fn from_proposal(proposal: &AdjustmentProposal) -> Self {
        Self::new(
            proposal.reference_transaction_id,
            proposal.direction,
            proposal.quantity,
            Some(proposal.price),
        )
    }

    fn validate(&self) -> Result<(), CostingError> {
        if self.quantity <= Decimal::ZERO {
            return Err(CostingError::InvalidAdjustment(format!(
                "quantity must be positive, got {}",
                self.quantity
            )));
        }
        if self.price.is_some_and(|price| price < Decimal::ZERO) {
            return Err(CostingError::InvalidAdjustment(
                "price cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of deleting an adjustment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// The deleted adjustment.
    pub transaction_id: TransactionId,
    /// Its group.
    pub group: GroupKey,
    /// Derived rows removed for the adjustment itself.
    pub deleted: DeletedRows,
    /// The recost triggered by a critical adjustment.
    pub recost: Option<GroupPass>,
    /// Balance cache after the delete.
    pub balance: ConsolidatedBalance,
}

/// Manages the adjustment lifecycle.
#[derive(Debug, Clone)]
pub struct AdjustmentService {
    db: DatabaseConnection,
    costing: CostingService,
    advisor: AdjustmentAdvisor,
    critical_reset_lookback_days: u32,
}

impl AdjustmentService {
    /// Creates an adjustment service recosting through `costing`.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: &CostingConfig, costing: CostingService) -> Self {
        Self {
            db,
            costing,
            advisor: AdjustmentAdvisor::new(config.unit_cost_scale),
            critical_reset_lookback_days: config.critical_reset_lookback_days,
        }
    }

    /// Proposes a corrective adjustment for a transaction.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` if the id does not resolve.
    #[instrument(skip(self))]
    pub async fn propose(
        &self,
        transaction_id: TransactionId,
        direction: AdjustmentDirection,
    ) -> Result<AdjustmentProposal, CostingError> {
        let reference = transaction::find_in(&self.db, transaction_id).await?;
        let prior = ledger::entry_before_in(&self.db, &reference).await?;
        let prior = prior.as_ref().map(KardexEntry::running_balance);

        Ok(self.advisor.propose(&reference, prior.as_ref(), direction))
    }

    /// Records an adjustment and clears the reference's review flag.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAdjustment` for a non-positive quantity or negative
    /// price, `TransactionNotFound` if the reference does not resolve.
    #[instrument(skip(self, input), fields(reference = %input.reference_transaction_id))]
    pub async fn create(&self, input: CreateAdjustment) -> Result<Transaction, CostingError> {
        input.validate()?;
        let group = transaction::find_in(&self.db, input.reference_transaction_id)
            .await?
            .group;

        let _guard = self.costing.locks().acquire(&group).await;
        let txn = self.db.begin().await?;
        let reference = transaction::find_in(&txn, input.reference_transaction_id).await?;

        let movement_kind = input.direction.movement_kind();
        let created = transaction::insert_in(
            &txn,
            NewTransaction {
                group: reference.group.clone(),
                date: input.effective_date.unwrap_or(reference.date),
                movement_kind,
                effect: Some(input.direction.effect()),
                quantity: input.quantity.abs(),
                price: input.price,
                adjustment_class: Some(input.class),
                ignored_in_costing: false,
                note: input.note,
            },
        )
        .await?;

        if reference.needs_review {
            transaction::clear_review_in(&txn, reference.id).await?;
        }
        txn.commit().await?;

        info!(
            adjustment = %created.id,
            kind = movement_kind.as_str(),
            class = input.class.as_str(),
            "Adjustment created"
        );
        Ok(created)
    }

    /// Deletes an adjustment and its derived rows.
    ///
    /// A critical adjustment recosts the whole group from `cutoff`, or from
    /// its date minus the configured lookback when no cutoff is given. A
    /// cutoff later than the adjustment's own date is pulled back to it.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` if the id does not resolve and
    /// `NotAdjustable` if it is not an adjustment. Nothing is mutated then.
    #[instrument(skip(self))]
    pub async fn delete(
        &self,
        transaction_id: TransactionId,
        cutoff: Option<NaiveDate>,
    ) -> Result<DeleteOutcome, CostingError> {
        let group = transaction::find_in(&self.db, transaction_id).await?.group;

        let _guard = self.costing.locks().acquire(&group).await;
        let txn = self.db.begin().await?;
        let adjustment = transaction::find_in(&txn, transaction_id).await?;
        if !adjustment.is_adjustment() {
            return Err(CostingError::NotAdjustable(transaction_id));
        }

        let deleted = ledger::delete_for_transaction_in(&txn, transaction_id).await?;
        transaction::delete_in(&txn, transaction_id).await?;

        let (recost, balance) = if adjustment.is_critical_adjustment() {
            let from = reset_cutoff(adjustment.date, cutoff, self.critical_reset_lookback_days);
            CostingService::reset_in(&txn, &group, from).await?;
            let pass = self.costing.cost_in(&txn, &group, from).await?;
            let balance = pass.balance.clone();
            (Some(pass), balance)
        } else {
            (None, balance::refresh_in(&txn, &group).await?)
        };
        txn.commit().await?;

        info!(
            adjustment = %transaction_id,
            critical = recost.is_some(),
            entries = deleted.entries,
            consumptions = deleted.consumptions,
            "Adjustment deleted"
        );
        Ok(DeleteOutcome {
            transaction_id,
            group,
            deleted,
            recost,
            balance,
        })
    }
}

/// First date recosted after deleting a critical adjustment dated `date`.
fn reset_cutoff(date: NaiveDate, cutoff: Option<NaiveDate>, lookback_days: u32) -> NaiveDate {
    cutoff.map_or_else(|| days_before(date, lookback_days), |cutoff| cutoff.min(date))
}

/// `date - days`, clamped at the earliest representable date.
fn days_before(date: NaiveDate, days: u32) -> NaiveDate {
    date.checked_sub_days(chrono::Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_days_before() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(days_before(date, 365), NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!(days_before(NaiveDate::MIN, 1), NaiveDate::MIN);
    }

    #[test]
    fn test_reset_cutoff() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let earlier = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let later = NaiveDate::from_ymd_opt(2026, 6, 30).unwrap();

        assert_eq!(reset_cutoff(date, None, 365), NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!(reset_cutoff(date, Some(earlier), 365), earlier);
        assert_eq!(reset_cutoff(date, Some(later), 365), date);
    }

    #[test]
    fn test_validate_rejects_non_positive_quantity() {
        let input = CreateAdjustment::new(TransactionId(1), AdjustmentDirection::Inject, dec!(0), None);
        assert!(matches!(input.validate(), Err(CostingError::InvalidAdjustment(_))));

        let input = CreateAdjustment::new(TransactionId(1), AdjustmentDirection::Remove, dec!(-3), None);
        assert!(matches!(input.validate(), Err(CostingError::InvalidAdjustment(_))));
    }

    #[test]
    fn test_validate_rejects_negative_price() {
        let input = CreateAdjustment::new(
            TransactionId(1),
            AdjustmentDirection::Inject,
            dec!(3),
            Some(dec!(-1)),
        );
        assert!(matches!(input.validate(), Err(CostingError::InvalidAdjustment(_))));
    }

    #[test]
    fn test_validate_accepts_unpriced_injection() {
        let input = CreateAdjustment::new(TransactionId(1), AdjustmentDirection::Inject, dec!(3), None);
        assert!(input.validate().is_ok());
    }
}
