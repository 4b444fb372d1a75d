//! Property-based tests for the FIFO engine.
//!
//! - FIFO order: the trail of each outflow walks inflows by (date, id)
//! - Conservation: no inflow is consumed beyond its quantity
//! - Balance recurrence and non-negative balances
//! - Determinism under input permutation
//! - Closing balance equals the value carried by open lots

use std::collections::HashMap;

use chrono::NaiveDate;
use kardex_shared::types::{CompanyId, CustodianId, InstrumentId, TransactionId};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::engine::KardexEngine;
use super::types::{GroupKey, MovementKind, Transaction};

fn fixed_group() -> GroupKey {
    GroupKey::new(
        CompanyId::from_uuid(Uuid::from_u128(1)),
        CustodianId::from_uuid(Uuid::from_u128(2)),
        InstrumentId::from_uuid(Uuid::from_u128(3)),
        "PROP",
    )
}

/// Strategy for one transaction: (day offset, is inflow, quantity cents, price cents).
fn movement() -> impl Strategy<Value = (u32, bool, i64, i64)> {
    (0u32..20, any::<bool>(), 1i64..50_000, 1i64..100_000)
}

/// Strategy for a whole group history with unique, increasing ids.
fn history(max_len: usize) -> impl Strategy<Value = Vec<Transaction>> {
    prop::collection::vec(movement(), 1..=max_len).prop_map(|moves| {
        let group = fixed_group();
        let base = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        moves
            .into_iter()
            .enumerate()
            .map(|(i, (day, inflow, qty, price))| {
                let kind = if inflow { MovementKind::Buy } else { MovementKind::Sell };
                Transaction {
                    id: TransactionId(i64::try_from(i).unwrap() + 1),
                    group: group.clone(),
                    date: base + chrono::Days::new(u64::from(day)),
                    movement_kind: kind,
                    effect: kind.default_effect(),
                    quantity: Decimal::new(qty, 2),
                    price: Some(Decimal::new(price, 2)),
                    adjustment_class: None,
                    costed: false,
                    needs_review: false,
                    ignored_in_costing: false,
                    note: None,
                }
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Each outflow's trail references inflows in non-decreasing (date, id) order.
    #[test]
    fn prop_fifo_order(txs in history(40)) {
        let run = KardexEngine::default().process(&fixed_group(), &txs).unwrap();
        let by_id: HashMap<TransactionId, &Transaction> = txs.iter().map(|t| (t.id, t)).collect();

        for pair in run.consumptions.windows(2) {
            if pair[0].outflow_transaction_id != pair[1].outflow_transaction_id {
                continue;
            }
            let first = by_id[&pair[0].inflow_transaction_id].fifo_key();
            let second = by_id[&pair[1].inflow_transaction_id].fifo_key();
            prop_assert!(first < second, "trail out of FIFO order: {:?} then {:?}", first, second);
            prop_assert_eq!(pair[0].sequence + 1, pair[1].sequence);
        }
    }

    /// Consumed quantity per inflow never exceeds the inflow quantity.
    #[test]
    fn prop_conservation(txs in history(40)) {
        let run = KardexEngine::default().process(&fixed_group(), &txs).unwrap();
        let mut consumed: HashMap<TransactionId, Decimal> = HashMap::new();
        for detail in &run.consumptions {
            *consumed.entry(detail.inflow_transaction_id).or_default() += detail.quantity;
        }
        for tx in &txs {
            if let Some(total) = consumed.get(&tx.id) {
                prop_assert!(*total <= tx.quantity);
            }
        }
    }

    /// balance[i] = balance[i-1] + inflow[i] - outflow[i], and never negative.
    #[test]
    fn prop_balance_recurrence(txs in history(40)) {
        let run = KardexEngine::default().process(&fixed_group(), &txs).unwrap();
        let mut previous_qty = Decimal::ZERO;
        let mut previous_value = Decimal::ZERO;
        for entry in &run.entries {
            prop_assert_eq!(
                entry.balance_quantity,
                previous_qty + entry.inflow_quantity - entry.outflow_quantity
            );
            prop_assert_eq!(
                entry.balance_value,
                previous_value + entry.inflow_cost - entry.outflow_cost
            );
            prop_assert!(entry.balance_quantity >= Decimal::ZERO);
            prop_assert!(entry.balance_value >= Decimal::ZERO);
            previous_qty = entry.balance_quantity;
            previous_value = entry.balance_value;
        }
    }

    /// Trail rows of an outflow add up to its kardex outflow figures, and a
    /// review flag is raised exactly when a shortfall remains.
    #[test]
    fn prop_trail_matches_entries(txs in history(40)) {
        let run = KardexEngine::default().process(&fixed_group(), &txs).unwrap();
        for (entry, outcome) in run.entries.iter().zip(&run.outcomes) {
            prop_assert_eq!(entry.transaction_id, outcome.transaction_id);
            let rows = run
                .consumptions
                .iter()
                .filter(|d| d.outflow_transaction_id == entry.transaction_id);
            let (qty, cost) = rows.fold((Decimal::ZERO, Decimal::ZERO), |(q, c), d| {
                (q + d.quantity, c + d.cost)
            });
            prop_assert_eq!(qty, entry.outflow_quantity);
            prop_assert_eq!(cost, entry.outflow_cost);
            prop_assert_eq!(outcome.needs_review, outcome.shortfall > Decimal::ZERO);
        }
    }

    /// Shuffled input produces the same run.
    #[test]
    fn prop_deterministic_under_permutation(
        txs in history(30),
        seed in any::<u64>(),
    ) {
        let engine = KardexEngine::default();
        let expected = engine.process(&fixed_group(), &txs).unwrap();

        let mut shuffled = txs.clone();
        let len = shuffled.len();
        let mut state = seed;
        for i in (1..len).rev() {
            state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            let j = usize::try_from(state % (u64::try_from(i).unwrap() + 1)).unwrap();
            shuffled.swap(i, j);
        }

        let actual = engine.process(&fixed_group(), &shuffled).unwrap();
        prop_assert_eq!(actual, expected);
    }

    /// The closing balance is exactly what the open lots still carry.
    #[test]
    fn prop_closing_balance_equals_open_lots(txs in history(40)) {
        let run = KardexEngine::default().process(&fixed_group(), &txs).unwrap();
        let closing = run.closing_balance();
        let lot_qty: Decimal = run.open_lots.iter().map(|l| l.remaining_quantity).sum();
        let lot_cost: Decimal = run.open_lots.iter().map(super::types::OpenLot::remaining_cost).sum();
        prop_assert_eq!(closing.quantity, lot_qty);
        prop_assert_eq!(closing.value, lot_cost);
    }
}
