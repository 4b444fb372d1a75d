//! FIFO lot ledger engine.
//!
//! Consumes the full transaction history of one group and produces its kardex
//! rows and FIFO consumption trail. Pure: no I/O, no clock, deterministic for a
//! given input set.
//!
//! Processing order is date ascending, then transaction id ascending. Outflows
//! that exceed the open lots consume what is available and come back flagged
//! for review; they never abort the pass.

use std::collections::VecDeque;

use kardex_shared::types::TransactionId;
use rust_decimal::Decimal;

use super::balance::{DEFAULT_UNIT_COST_SCALE, RunningBalance};
use super::error::KardexError;
use super::types::{AccountingEffect, ConsumptionDetail, GroupKey, KardexEntry, OpenLot, Transaction};

/// Status the engine assigns to a transaction it processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostingOutcome {
    /// The processed transaction.
    pub transaction_id: TransactionId,
    /// True when an outflow was only partially covered.
    pub needs_review: bool,
    /// Quantity of the outflow left uncovered.
    pub shortfall: Decimal,
}

/// Everything a pass over one group produces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KardexRun {
    /// One row per processed transaction, in processing order.
    pub entries: Vec<KardexEntry>,
    /// FIFO trail, grouped by outflow in processing order.
    pub consumptions: Vec<ConsumptionDetail>,
    /// One outcome per processed transaction (ignored ones are absent).
    pub outcomes: Vec<CostingOutcome>,
    /// Lots still open after the last transaction, oldest first.
    pub open_lots: Vec<OpenLot>,
}

impl KardexRun {
    /// The balance left by the last row, zero for an empty run.
    #[must_use]
    pub fn closing_balance(&self) -> RunningBalance {
        self.entries
            .last()
            .map_or(RunningBalance::ZERO, KardexEntry::running_balance)
    }

    /// Transactions flagged for review by this run.
    pub fn flagged(&self) -> impl Iterator<Item = &CostingOutcome> {
        self.outcomes.iter().filter(|outcome| outcome.needs_review)
    }
}

/// FIFO costing engine.
#[derive(Debug, Clone, Copy)]
pub struct KardexEngine {
    unit_cost_scale: u32,
}

impl Default for KardexEngine {
    fn default() -> Self {
        Self::new(DEFAULT_UNIT_COST_SCALE)
    }
}

impl KardexEngine {
    /// Creates an engine rounding derived unit costs to `unit_cost_scale` places.
    #[must_use]
    pub const fn new(unit_cost_scale: u32) -> Self {
        Self { unit_cost_scale }
    }

    /// Runs FIFO costing over the full history of `group`.
    ///
    /// The input may arrive in any order; it is processed by (date, id).
    /// Transactions flagged `ignored_in_costing` produce no row and no outcome.
    ///
    /// # Errors
    ///
    /// Returns `KardexError` for structural problems only: a transaction from
    /// another group, a negative quantity or price, or decimal overflow.
    pub fn process(
        &self,
        group: &GroupKey,
        transactions: &[Transaction],
    ) -> Result<KardexRun, KardexError> {
        for tx in transactions {
            Self::validate(group, tx)?;
        }

        let mut ordered: Vec<&Transaction> = transactions.iter().collect();
        ordered.sort_by_key(|tx| tx.fifo_key());

        let mut lots: VecDeque<OpenLot> = VecDeque::new();
        let mut balance = RunningBalance::ZERO;
        let mut run = KardexRun::default();

        for tx in ordered {
            if tx.ignored_in_costing {
                continue;
            }

            let (entry, outcome) = match tx.effect {
                AccountingEffect::Inflow => {
                    let (entry, next) = self.apply_inflow(tx, balance, &mut lots)?;
                    balance = next;
                    (entry, CostingOutcome::covered(tx.id))
                }
                AccountingEffect::Outflow => {
                    let (entry, next, outcome) =
                        self.apply_outflow(tx, balance, &mut lots, &mut run.consumptions)?;
                    balance = next;
                    (entry, outcome)
                }
                AccountingEffect::NotCosted => {
                    let entry = self.entry(tx, balance, Movement::default());
                    (entry, CostingOutcome::covered(tx.id))
                }
            };

            run.entries.push(entry);
            run.outcomes.push(outcome);
        }

        run.open_lots = lots.into_iter().collect();
        Ok(run)
    }

    fn validate(group: &GroupKey, tx: &Transaction) -> Result<(), KardexError> {
        if tx.group != *group {
            return Err(KardexError::GroupMismatch {
                transaction_id: tx.id,
                expected: group.clone(),
            });
        }
        if tx.quantity.is_sign_negative() && !tx.quantity.is_zero() {
            return Err(KardexError::NegativeQuantity(tx.id));
        }
        if tx.price.is_some_and(|p| p.is_sign_negative() && !p.is_zero()) {
            return Err(KardexError::NegativePrice(tx.id));
        }
        Ok(())
    }

    fn apply_inflow(
        &self,
        tx: &Transaction,
        balance: RunningBalance,
        lots: &mut VecDeque<OpenLot>,
    ) -> Result<(KardexEntry, RunningBalance), KardexError> {
        // Unpriced inflows (transfers, deposits without a quote) enter at zero cost.
        let unit_cost = tx.price.unwrap_or(Decimal::ZERO);
        let cost = tx
            .quantity
            .checked_mul(unit_cost)
            .ok_or(KardexError::ArithmeticOverflow(tx.id))?;

        if tx.quantity > Decimal::ZERO {
            lots.push_back(OpenLot {
                inflow_transaction_id: tx.id,
                inflow_date: tx.date,
                remaining_quantity: tx.quantity,
                unit_cost,
            });
        }

        let movement = Movement {
            inflow_quantity: tx.quantity,
            inflow_cost: cost,
            ..Movement::default()
        };
        let next = balance
            .with_inflow(tx.quantity, cost)
            .ok_or(KardexError::ArithmeticOverflow(tx.id))?;
        Ok((self.entry(tx, next, movement), next))
    }

    fn apply_outflow(
        &self,
        tx: &Transaction,
        balance: RunningBalance,
        lots: &mut VecDeque<OpenLot>,
        trail: &mut Vec<ConsumptionDetail>,
    ) -> Result<(KardexEntry, RunningBalance, CostingOutcome), KardexError> {
        let mut remaining = tx.quantity;
        let mut consumed_cost = Decimal::ZERO;
        let mut sequence = 0u32;

        while remaining > Decimal::ZERO {
            let Some(lot) = lots.front_mut() else {
                break;
            };

            let take = remaining.min(lot.remaining_quantity);
            let cost = take
                .checked_mul(lot.unit_cost)
                .ok_or(KardexError::ArithmeticOverflow(tx.id))?;
            consumed_cost = consumed_cost
                .checked_add(cost)
                .ok_or(KardexError::ArithmeticOverflow(tx.id))?;

            trail.push(ConsumptionDetail {
                outflow_transaction_id: tx.id,
                inflow_transaction_id: lot.inflow_transaction_id,
                group: tx.group.clone(),
                outflow_date: tx.date,
                inflow_date: lot.inflow_date,
                sequence,
                quantity: take,
                unit_cost: lot.unit_cost,
                cost,
            });
            sequence += 1;

            lot.remaining_quantity -= take;
            remaining -= take;
            if lot.remaining_quantity.is_zero() {
                lots.pop_front();
            }
        }

        let consumed = tx.quantity - remaining;
        let outcome = CostingOutcome {
            transaction_id: tx.id,
            needs_review: remaining > Decimal::ZERO,
            shortfall: remaining,
        };
        let movement = Movement {
            outflow_quantity: consumed,
            outflow_cost: consumed_cost,
            ..Movement::default()
        };
        let next = balance
            .with_outflow(consumed, consumed_cost)
            .ok_or(KardexError::ArithmeticOverflow(tx.id))?;
        Ok((self.entry(tx, next, movement), next, outcome))
    }

    fn entry(&self, tx: &Transaction, balance: RunningBalance, movement: Movement) -> KardexEntry {
        KardexEntry {
            transaction_id: tx.id,
            group: tx.group.clone(),
            date: tx.date,
            movement_kind: tx.movement_kind,
            inflow_quantity: movement.inflow_quantity,
            inflow_cost: movement.inflow_cost,
            outflow_quantity: movement.outflow_quantity,
            outflow_cost: movement.outflow_cost,
            balance_quantity: balance.quantity,
            balance_value: balance.value,
            average_unit_cost: balance.average_unit_cost(self.unit_cost_scale),
        }
    }
}

impl CostingOutcome {
    fn covered(transaction_id: TransactionId) -> Self {
        Self {
            transaction_id,
            needs_review: false,
            shortfall: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Movement {
    inflow_quantity: Decimal,
    inflow_cost: Decimal,
    outflow_quantity: Decimal,
    outflow_cost: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use kardex_shared::types::{CompanyId, CustodianId, InstrumentId};
    use rust_decimal_macros::dec;

    use crate::kardex::types::MovementKind;

    fn group() -> GroupKey {
        GroupKey::new(CompanyId::new(), CustodianId::new(), InstrumentId::new(), "MAIN")
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, day).unwrap()
    }

    fn tx(
        group: &GroupKey,
        id: i64,
        day: u32,
        kind: MovementKind,
        quantity: Decimal,
        price: Option<Decimal>,
    ) -> Transaction {
        Transaction {
            id: TransactionId(id),
            group: group.clone(),
            date: date(day),
            movement_kind: kind,
            effect: kind.default_effect(),
            quantity,
            price,
            adjustment_class: None,
            costed: false,
            needs_review: false,
            ignored_in_costing: false,
            note: None,
        }
    }

    #[test]
    fn test_partial_sale_leaves_fifo_remainder() {
        let g = group();
        let txs = vec![
            tx(&g, 1, 1, MovementKind::Buy, dec!(100), Some(dec!(10))),
            tx(&g, 2, 2, MovementKind::Sell, dec!(60), Some(dec!(12))),
        ];

        let run = KardexEngine::default().process(&g, &txs).unwrap();

        assert_eq!(run.entries.len(), 2);
        let last = &run.entries[1];
        assert_eq!(last.outflow_quantity, dec!(60));
        assert_eq!(last.outflow_cost, dec!(600));
        assert_eq!(last.balance_quantity, dec!(40));
        assert_eq!(last.balance_value, dec!(400));
        assert_eq!(last.average_unit_cost, dec!(10));

        assert_eq!(run.consumptions.len(), 1);
        let detail = &run.consumptions[0];
        assert_eq!(detail.inflow_transaction_id, TransactionId(1));
        assert_eq!(detail.quantity, dec!(60));
        assert_eq!(detail.cost, dec!(600));
        assert!(run.flagged().next().is_none());

        assert_eq!(run.open_lots.len(), 1);
        assert_eq!(run.open_lots[0].remaining_quantity, dec!(40));
    }

    #[test]
    fn test_oversold_outflow_is_flagged_not_failed() {
        let g = group();
        let txs = vec![
            tx(&g, 1, 1, MovementKind::Buy, dec!(50), Some(dec!(10))),
            tx(&g, 2, 2, MovementKind::Sell, dec!(80), None),
        ];

        let run = KardexEngine::default().process(&g, &txs).unwrap();

        let outcome = run.outcomes[1];
        assert!(outcome.needs_review);
        assert_eq!(outcome.shortfall, dec!(30));
        assert_eq!(run.entries[1].outflow_quantity, dec!(50));
        assert_eq!(run.entries[1].outflow_cost, dec!(500));
        assert_eq!(run.closing_balance(), RunningBalance::ZERO);
        assert_eq!(run.consumptions.len(), 1);
        assert_eq!(run.consumptions[0].quantity, dec!(50));
        assert!(run.open_lots.is_empty());
    }

    #[test]
    fn test_same_day_inflows_consumed_by_id() {
        let g = group();
        // Deliberately out of order on input.
        let txs = vec![
            tx(&g, 3, 5, MovementKind::Sell, dec!(25), None),
            tx(&g, 2, 5, MovementKind::Buy, dec!(30), Some(dec!(6))),
            tx(&g, 1, 5, MovementKind::Buy, dec!(20), Some(dec!(5))),
        ];

        let run = KardexEngine::default().process(&g, &txs).unwrap();

        assert_eq!(run.consumptions.len(), 2);
        assert_eq!(run.consumptions[0].inflow_transaction_id, TransactionId(1));
        assert_eq!(run.consumptions[0].quantity, dec!(20));
        assert_eq!(run.consumptions[0].cost, dec!(100));
        assert_eq!(run.consumptions[1].inflow_transaction_id, TransactionId(2));
        assert_eq!(run.consumptions[1].quantity, dec!(5));
        assert_eq!(run.consumptions[1].cost, dec!(30));
        assert_eq!(run.consumptions[1].sequence, 1);
        assert_eq!(run.entries[2].outflow_cost, dec!(130));
        assert_eq!(run.entries[2].balance_quantity, dec!(25));
        assert_eq!(run.entries[2].balance_value, dec!(150));
    }

    #[test]
    fn test_ignored_transactions_are_skipped() {
        let g = group();
        let mut ignored = tx(&g, 2, 2, MovementKind::Buy, dec!(999), Some(dec!(1)));
        ignored.ignored_in_costing = true;
        let txs = vec![
            tx(&g, 1, 1, MovementKind::Buy, dec!(10), Some(dec!(2))),
            ignored,
            tx(&g, 3, 3, MovementKind::Sell, dec!(4), None),
        ];

        let run = KardexEngine::default().process(&g, &txs).unwrap();

        assert_eq!(run.entries.len(), 2);
        assert!(run.outcomes.iter().all(|o| o.transaction_id != TransactionId(2)));
        assert_eq!(run.closing_balance().quantity, dec!(6));
    }

    #[test]
    fn test_not_costed_rows_keep_balance() {
        let g = group();
        let txs = vec![
            tx(&g, 1, 1, MovementKind::Buy, dec!(10), Some(dec!(3))),
            tx(&g, 2, 2, MovementKind::Dividend, dec!(10), Some(dec!(0.5))),
        ];

        let run = KardexEngine::default().process(&g, &txs).unwrap();

        let dividend = &run.entries[1];
        assert_eq!(dividend.inflow_quantity, Decimal::ZERO);
        assert_eq!(dividend.outflow_quantity, Decimal::ZERO);
        assert_eq!(dividend.balance_quantity, dec!(10));
        assert_eq!(dividend.balance_value, dec!(30));
    }

    #[test]
    fn test_unpriced_inflow_enters_at_zero_cost() {
        let g = group();
        let txs = vec![
            tx(&g, 1, 1, MovementKind::TransferIn, dec!(10), None),
            tx(&g, 2, 2, MovementKind::Buy, dec!(10), Some(dec!(4))),
            tx(&g, 3, 3, MovementKind::Sell, dec!(15), None),
        ];

        let run = KardexEngine::default().process(&g, &txs).unwrap();

        assert_eq!(run.entries[2].outflow_cost, dec!(20));
        assert_eq!(run.closing_balance().value, dec!(20));
        assert_eq!(run.entries[2].average_unit_cost, dec!(4));
    }

    #[test]
    fn test_blended_average_is_display_only() {
        let g = group();
        let txs = vec![
            tx(&g, 1, 1, MovementKind::Buy, dec!(10), Some(dec!(1))),
            tx(&g, 2, 2, MovementKind::Buy, dec!(10), Some(dec!(3))),
            tx(&g, 3, 3, MovementKind::Sell, dec!(10), None),
        ];

        let run = KardexEngine::default().process(&g, &txs).unwrap();

        assert_eq!(run.entries[1].average_unit_cost, dec!(2));
        // FIFO consumes the 1.00 lot, not the 2.00 average.
        assert_eq!(run.entries[2].outflow_cost, dec!(10));
        assert_eq!(run.entries[2].average_unit_cost, dec!(3));
    }

    #[test]
    fn test_foreign_group_is_structural_failure() {
        let g = group();
        let other = group();
        let txs = vec![tx(&other, 1, 1, MovementKind::Buy, dec!(1), Some(dec!(1)))];

        let err = KardexEngine::default().process(&g, &txs).unwrap_err();
        assert!(matches!(err, KardexError::GroupMismatch { .. }));
    }

    #[test]
    fn test_negative_quantity_is_structural_failure() {
        let g = group();
        let txs = vec![tx(&g, 1, 1, MovementKind::Buy, dec!(-1), Some(dec!(1)))];

        let err = KardexEngine::default().process(&g, &txs).unwrap_err();
        assert_eq!(err, KardexError::NegativeQuantity(TransactionId(1)));
    }

    #[test]
    fn test_balance_overflow_is_structural_failure() {
        let g = group();
        let huge = dec!(50000000000000000000000000000);
        let txs = vec![
            tx(&g, 1, 1, MovementKind::Buy, huge, Some(dec!(1))),
            tx(&g, 2, 2, MovementKind::Buy, huge, Some(dec!(1))),
        ];

        let err = KardexEngine::default().process(&g, &txs).unwrap_err();
        assert_eq!(err, KardexError::ArithmeticOverflow(TransactionId(2)));
    }

    #[test]
    fn test_empty_history() {
        let run = KardexEngine::default().process(&group(), &[]).unwrap();
        assert!(run.entries.is_empty());
        assert_eq!(run.closing_balance(), RunningBalance::ZERO);
    }
}
