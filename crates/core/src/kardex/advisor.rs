//! Adjustment proposals for transactions flagged by the engine.
//!
//! A proposal is a value returned to the caller; nothing is persisted.

use chrono::NaiveDate;
use kardex_shared::types::TransactionId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::balance::{DEFAULT_UNIT_COST_SCALE, RunningBalance, unit_cost};
use super::types::{AdjustmentDirection, GroupKey, Transaction};

/// Where a proposed price came from.
///
/// The transaction-price fallback for injections awaits product-owner
/// confirmation, so callers can tell which path produced the figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    /// Weighted average of the balance preceding the transaction.
    PriorBalanceAverage,
    /// The flagged transaction's own price.
    TransactionPrice,
    /// Nothing to price from.
    Zero,
}

/// A corrective transaction suggested for a flagged transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentProposal {
    /// The transaction being corrected.
    pub reference_transaction_id: TransactionId,
    /// Group of the reference transaction.
    pub group: GroupKey,
    /// Date of the reference transaction.
    pub date: NaiveDate,
    /// Inject or remove.
    pub direction: AdjustmentDirection,
    /// Proposed unsigned quantity.
    pub quantity: Decimal,
    /// Proposed unit price.
    pub price: Decimal,
    /// How `price` was derived.
    pub price_source: PriceSource,
}

/// Computes adjustment proposals.
#[derive(Debug, Clone, Copy)]
pub struct AdjustmentAdvisor {
    unit_cost_scale: u32,
}

impl Default for AdjustmentAdvisor {
    fn default() -> Self {
        Self::new(DEFAULT_UNIT_COST_SCALE)
    }
}

impl AdjustmentAdvisor {
    /// Creates an advisor rounding derived prices to `unit_cost_scale` places.
    #[must_use]
    pub const fn new(unit_cost_scale: u32) -> Self {
        Self { unit_cost_scale }
    }

    /// Proposes a corrective adjustment.
    ///
    /// `prior` is the running balance of the kardex row immediately preceding
    /// the transaction's own row (`None` when it is the first row).
    ///
    /// - `Inject`: quantity is the shortfall `|quantity| - prior quantity`
    ///   (never below zero); price is the prior average when the prior
    ///   quantity is positive, else the transaction's price, else zero.
    /// - `Remove`: quantity is the full `|quantity|`; price is the
    ///   transaction's price or zero.
    #[must_use]
    pub fn propose(
        &self,
        transaction: &Transaction,
        prior: Option<&RunningBalance>,
        direction: AdjustmentDirection,
    ) -> AdjustmentProposal {
        let prior = prior.copied().unwrap_or(RunningBalance::ZERO);
        let magnitude = transaction.quantity.abs();

        let (quantity, price, price_source) = match direction {
            AdjustmentDirection::Inject => {
                let shortfall = (magnitude - prior.quantity).max(Decimal::ZERO);
                let (price, source) = if prior.quantity > Decimal::ZERO {
                    (
                        unit_cost(prior.value, prior.quantity, self.unit_cost_scale),
                        PriceSource::PriorBalanceAverage,
                    )
                } else {
                    Self::own_price(transaction)
                };
                (shortfall, price, source)
            }
            AdjustmentDirection::Remove => {
                let (price, source) = Self::own_price(transaction);
                (magnitude, price, source)
            }
        };

        AdjustmentProposal {
            reference_transaction_id: transaction.id,
            group: transaction.group.clone(),
            date: transaction.date,
            direction,
            quantity,
            price,
            price_source,
        }
    }

    fn own_price(transaction: &Transaction) -> (Decimal, PriceSource) {
        match transaction.price {
            Some(price) => (price, PriceSource::TransactionPrice),
            None => (Decimal::ZERO, PriceSource::Zero),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kardex_shared::types::{CompanyId, CustodianId, InstrumentId};
    use rust_decimal_macros::dec;

    use crate::kardex::types::MovementKind;

    fn sell(quantity: Decimal, price: Option<Decimal>) -> Transaction {
        Transaction {
            id: TransactionId(2),
            group: GroupKey::new(CompanyId::new(), CustodianId::new(), InstrumentId::new(), "X"),
            date: NaiveDate::from_ymd_opt(2026, 4, 2).unwrap(),
            movement_kind: MovementKind::Sell,
            effect: MovementKind::Sell.default_effect(),
            quantity,
            price,
            adjustment_class: None,
            costed: true,
            needs_review: true,
            ignored_in_costing: false,
            note: None,
        }
    }

    fn prior(quantity: Decimal, value: Decimal) -> RunningBalance {
        RunningBalance { quantity, value }
    }

    #[test]
    fn test_inject_uses_prior_average() {
        let tx = sell(dec!(80), Some(dec!(12)));
        let proposal = AdjustmentAdvisor::default().propose(
            &tx,
            Some(&prior(dec!(50), dec!(500))),
            AdjustmentDirection::Inject,
        );

        assert_eq!(proposal.quantity, dec!(30));
        assert_eq!(proposal.price, dec!(10));
        assert_eq!(proposal.price_source, PriceSource::PriorBalanceAverage);
        assert_eq!(proposal.date, tx.date);
        assert_eq!(proposal.reference_transaction_id, tx.id);
    }

    #[test]
    fn test_inject_falls_back_to_own_price() {
        let tx = sell(dec!(80), Some(dec!(12)));
        let proposal = AdjustmentAdvisor::default().propose(&tx, None, AdjustmentDirection::Inject);

        assert_eq!(proposal.quantity, dec!(80));
        assert_eq!(proposal.price, dec!(12));
        assert_eq!(proposal.price_source, PriceSource::TransactionPrice);
    }

    #[test]
    fn test_inject_without_any_price_is_zero() {
        let tx = sell(dec!(5), None);
        let proposal = AdjustmentAdvisor::default().propose(
            &tx,
            Some(&RunningBalance::ZERO),
            AdjustmentDirection::Inject,
        );

        assert_eq!(proposal.price, Decimal::ZERO);
        assert_eq!(proposal.price_source, PriceSource::Zero);
    }

    #[test]
    fn test_inject_never_proposes_negative_quantity() {
        let tx = sell(dec!(10), None);
        let proposal = AdjustmentAdvisor::default().propose(
            &tx,
            Some(&prior(dec!(40), dec!(400))),
            AdjustmentDirection::Inject,
        );
        assert_eq!(proposal.quantity, Decimal::ZERO);
    }

    #[test]
    fn test_remove_proposes_full_quantity() {
        let tx = sell(dec!(80), Some(dec!(12)));
        let proposal = AdjustmentAdvisor::default().propose(
            &tx,
            Some(&prior(dec!(50), dec!(500))),
            AdjustmentDirection::Remove,
        );

        assert_eq!(proposal.quantity, dec!(80));
        assert_eq!(proposal.price, dec!(12));
        assert_eq!(proposal.direction, AdjustmentDirection::Remove);
    }

    #[test]
    fn test_prior_average_is_rounded() {
        let tx = sell(dec!(10), None);
        let proposal = AdjustmentAdvisor::new(2).propose(
            &tx,
            Some(&prior(dec!(3), dec!(10))),
            AdjustmentDirection::Inject,
        );
        assert_eq!(proposal.price, dec!(3.33));
        assert_eq!(proposal.quantity, dec!(7));
    }
}
