//! Kardex domain types.
//!
//! A transaction stream is partitioned by [`GroupKey`]; every type here is scoped
//! to exactly one group. Quantities are unsigned magnitudes, the direction lives
//! in [`AccountingEffect`].

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use kardex_shared::types::{CompanyId, CustodianId, InstrumentId, TransactionId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifies one independent FIFO inventory stream.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    /// Portfolio owner.
    pub company_id: CompanyId,
    /// Broker or depositary holding the position.
    pub custodian_id: CustodianId,
    /// Security held.
    pub instrument_id: InstrumentId,
    /// Account code at the custodian.
    pub account: String,
}

impl GroupKey {
    /// Creates a group key.
    #[must_use]
    pub fn new(
        company_id: CompanyId,
        custodian_id: CustodianId,
        instrument_id: InstrumentId,
        account: impl Into<String>,
    ) -> Self {
        Self {
            company_id,
            custodian_id,
            instrument_id,
            account: account.into(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.company_id, self.custodian_id, self.instrument_id, self.account
        )
    }
}

/// Error returned when a stored code does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} code: {value}")]
pub struct UnknownCode {
    /// The enum being parsed.
    pub kind: &'static str,
    /// The offending text.
    pub value: String,
}

/// How a transaction affects the costed position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountingEffect {
    /// Adds a lot to the back of the FIFO queue.
    Inflow,
    /// Consumes lots from the front of the FIFO queue.
    Outflow,
    /// Informational; recorded with zero movement.
    NotCosted,
}

impl AccountingEffect {
    /// Stable storage code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inflow => "INFLOW",
            Self::Outflow => "OUTFLOW",
            Self::NotCosted => "NOT_COSTED",
        }
    }
}

impl fmt::Display for AccountingEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountingEffect {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INFLOW" => Ok(Self::Inflow),
            "OUTFLOW" => Ok(Self::Outflow),
            "NOT_COSTED" => Ok(Self::NotCosted),
            other => Err(UnknownCode {
                kind: "accounting effect",
                value: other.to_string(),
            }),
        }
    }
}

/// Movement kind of a security transaction.
///
/// Corporate actions are carried as opaque in/out movements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Purchase.
    Buy,
    /// Sale.
    Sell,
    /// Securities deposited into the account.
    Deposit,
    /// Securities withdrawn from the account.
    Withdrawal,
    /// Incoming transfer between custodians.
    TransferIn,
    /// Outgoing transfer between custodians.
    TransferOut,
    /// Units received through a corporate action.
    CorporateActionIn,
    /// Units surrendered through a corporate action.
    CorporateActionOut,
    /// Dividend notice, informational only.
    Dividend,
    /// Manual adjustment adding units.
    AdjustmentIn,
    /// Manual adjustment removing units.
    AdjustmentOut,
}

impl MovementKind {
    /// All movement kinds, in declaration order.
    pub const ALL: [Self; 11] = [
        Self::Buy,
        Self::Sell,
        Self::Deposit,
        Self::Withdrawal,
        Self::TransferIn,
        Self::TransferOut,
        Self::CorporateActionIn,
        Self::CorporateActionOut,
        Self::Dividend,
        Self::AdjustmentIn,
        Self::AdjustmentOut,
    ];

    /// Stable storage code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
            Self::TransferIn => "transfer_in",
            Self::TransferOut => "transfer_out",
            Self::CorporateActionIn => "corporate_action_in",
            Self::CorporateActionOut => "corporate_action_out",
            Self::Dividend => "dividend",
            Self::AdjustmentIn => "adjustment_in",
            Self::AdjustmentOut => "adjustment_out",
        }
    }

    /// The effect upstream import assigns to this kind by default.
    #[must_use]
    pub const fn default_effect(self) -> AccountingEffect {
        match self {
            Self::Buy
            | Self::Deposit
            | Self::TransferIn
            | Self::CorporateActionIn
            | Self::AdjustmentIn => AccountingEffect::Inflow,
            Self::Sell
            | Self::Withdrawal
            | Self::TransferOut
            | Self::CorporateActionOut
            | Self::AdjustmentOut => AccountingEffect::Outflow,
            Self::Dividend => AccountingEffect::NotCosted,
        }
    }

    /// Returns true for the dedicated adjustment kinds.
    #[must_use]
    pub const fn is_adjustment(self) -> bool {
        matches!(self, Self::AdjustmentIn | Self::AdjustmentOut)
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementKind {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownCode {
                kind: "movement kind",
                value: s.to_string(),
            })
    }
}

/// Direction of a corrective adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentDirection {
    /// Add the missing units (shortfall) to the group.
    Inject,
    /// Take units out of the group.
    Remove,
}

impl AdjustmentDirection {
    /// The dedicated movement kind for this direction.
    #[must_use]
    pub const fn movement_kind(self) -> MovementKind {
        match self {
            Self::Inject => MovementKind::AdjustmentIn,
            Self::Remove => MovementKind::AdjustmentOut,
        }
    }

    /// The accounting effect of an adjustment in this direction.
    #[must_use]
    pub const fn effect(self) -> AccountingEffect {
        self.movement_kind().default_effect()
    }
}

impl FromStr for AdjustmentDirection {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inject" => Ok(Self::Inject),
            "remove" => Ok(Self::Remove),
            other => Err(UnknownCode {
                kind: "adjustment direction",
                value: other.to_string(),
            }),
        }
    }
}

/// Sub-kind of an adjustment transaction, fixed when the adjustment is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentClass {
    /// Local correction; deleting it touches only its own rows.
    #[default]
    Standard,
    /// Correction of an opening balance.
    OpeningBalance,
    /// Closing entry produced by a custodian reconciliation.
    ReconciliationClose,
}

impl AdjustmentClass {
    /// Stable storage code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::OpeningBalance => "opening_balance",
            Self::ReconciliationClose => "reconciliation_close",
        }
    }

    /// Critical adjustments can shape FIFO layering far downstream, so
    /// deleting one resets the whole group.
    #[must_use]
    pub const fn is_critical(self) -> bool {
        matches!(self, Self::OpeningBalance | Self::ReconciliationClose)
    }
}

impl fmt::Display for AdjustmentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdjustmentClass {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Self::Standard),
            "opening_balance" => Ok(Self::OpeningBalance),
            "reconciliation_close" => Ok(Self::ReconciliationClose),
            other => Err(UnknownCode {
                kind: "adjustment class",
                value: other.to_string(),
            }),
        }
    }
}

/// A security transaction as seen by the costing engine.
///
/// Immutable once created except for the three status flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Surrogate id; breaks same-date ties.
    pub id: TransactionId,
    /// The FIFO stream this transaction belongs to.
    pub group: GroupKey,
    /// Trade or settlement date used for ordering.
    pub date: NaiveDate,
    /// Movement kind.
    pub movement_kind: MovementKind,
    /// Authoritative accounting effect.
    pub effect: AccountingEffect,
    /// Unsigned quantity.
    pub quantity: Decimal,
    /// Unit price; absent for non-priced movements.
    pub price: Option<Decimal>,
    /// Present only on adjustment-kind transactions.
    pub adjustment_class: Option<AdjustmentClass>,
    /// Processed by the engine.
    pub costed: bool,
    /// An outflow the engine could not fully match against open lots.
    pub needs_review: bool,
    /// Excluded from costing by policy.
    pub ignored_in_costing: bool,
    /// Free-form note.
    pub note: Option<String>,
}

impl Transaction {
    /// Derived amount (`quantity × price`), if priced.
    #[must_use]
    pub fn amount(&self) -> Option<Decimal> {
        self.price.and_then(|price| self.quantity.checked_mul(price))
    }

    /// FIFO ordering key: date, then id.
    #[must_use]
    pub fn fifo_key(&self) -> (NaiveDate, TransactionId) {
        (self.date, self.id)
    }

    /// Returns true for adjustment-kind transactions.
    #[must_use]
    pub fn is_adjustment(&self) -> bool {
        self.movement_kind.is_adjustment()
    }

    /// Returns true when deleting this adjustment requires a group reset.
    #[must_use]
    pub fn is_critical_adjustment(&self) -> bool {
        self.is_adjustment()
            && self
                .adjustment_class
                .is_some_and(AdjustmentClass::is_critical)
    }

    /// Returns true if a costing pass still has to process this transaction.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        !self.costed && !self.ignored_in_costing
    }
}

/// One kardex row: the effect of one processed transaction on its group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KardexEntry {
    /// Source transaction.
    pub transaction_id: TransactionId,
    /// Owning group.
    pub group: GroupKey,
    /// Source transaction date.
    pub date: NaiveDate,
    /// Source movement kind, denormalized for reporting.
    pub movement_kind: MovementKind,
    /// Quantity added.
    pub inflow_quantity: Decimal,
    /// Cost added.
    pub inflow_cost: Decimal,
    /// Quantity consumed from lots.
    pub outflow_quantity: Decimal,
    /// FIFO cost of the consumed quantity.
    pub outflow_cost: Decimal,
    /// Cumulative quantity after this row.
    pub balance_quantity: Decimal,
    /// Cumulative cost after this row.
    pub balance_value: Decimal,
    /// Weighted average of the balance, display only.
    pub average_unit_cost: Decimal,
}

impl KardexEntry {
    /// The running balance this row leaves behind.
    #[must_use]
    pub fn running_balance(&self) -> super::balance::RunningBalance {
        super::balance::RunningBalance {
            quantity: self.balance_quantity,
            value: self.balance_value,
        }
    }
}

/// One (outflow, inflow lot) pairing in the FIFO consumption trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionDetail {
    /// The consuming outflow.
    pub outflow_transaction_id: TransactionId,
    /// The inflow whose lot was consumed.
    pub inflow_transaction_id: TransactionId,
    /// Owning group.
    pub group: GroupKey,
    /// Outflow date.
    pub outflow_date: NaiveDate,
    /// Inflow date.
    pub inflow_date: NaiveDate,
    /// Position of this row within the outflow's trail, starting at zero.
    pub sequence: u32,
    /// Quantity taken from the lot.
    pub quantity: Decimal,
    /// Lot unit cost at consumption.
    pub unit_cost: Decimal,
    /// `quantity × unit_cost`.
    pub cost: Decimal,
}

/// An inflow lot with quantity still available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenLot {
    /// The inflow that opened this lot.
    pub inflow_transaction_id: TransactionId,
    /// Inflow date.
    pub inflow_date: NaiveDate,
    /// Quantity still unconsumed.
    pub remaining_quantity: Decimal,
    /// Original unit cost.
    pub unit_cost: Decimal,
}

impl OpenLot {
    /// Cost still carried by this lot.
    #[must_use]
    pub fn remaining_cost(&self) -> Decimal {
        self.remaining_quantity * self.unit_cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn group() -> GroupKey {
        GroupKey::new(
            CompanyId::new(),
            CustodianId::new(),
            InstrumentId::new(),
            "ACC-1",
        )
    }

    fn transaction(kind: MovementKind, class: Option<AdjustmentClass>) -> Transaction {
        Transaction {
            id: TransactionId(1),
            group: group(),
            date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            movement_kind: kind,
            effect: kind.default_effect(),
            quantity: dec!(10),
            price: Some(dec!(2.5)),
            adjustment_class: class,
            costed: false,
            needs_review: false,
            ignored_in_costing: false,
            note: None,
        }
    }

    #[test]
    fn test_movement_kind_codes_round_trip() {
        for kind in MovementKind::ALL {
            assert_eq!(kind.as_str().parse::<MovementKind>().unwrap(), kind);
        }
        assert!("split".parse::<MovementKind>().is_err());
    }

    #[rstest]
    #[case(MovementKind::Buy, AccountingEffect::Inflow)]
    #[case(MovementKind::Sell, AccountingEffect::Outflow)]
    #[case(MovementKind::CorporateActionIn, AccountingEffect::Inflow)]
    #[case(MovementKind::Withdrawal, AccountingEffect::Outflow)]
    #[case(MovementKind::Dividend, AccountingEffect::NotCosted)]
    #[case(MovementKind::AdjustmentIn, AccountingEffect::Inflow)]
    #[case(MovementKind::AdjustmentOut, AccountingEffect::Outflow)]
    fn test_default_effect(#[case] kind: MovementKind, #[case] effect: AccountingEffect) {
        assert_eq!(kind.default_effect(), effect);
    }

    #[test]
    fn test_accounting_effect_codes() {
        assert_eq!("NOT_COSTED".parse::<AccountingEffect>().unwrap(), AccountingEffect::NotCosted);
        assert_eq!(AccountingEffect::Outflow.to_string(), "OUTFLOW");
        assert!("inflow".parse::<AccountingEffect>().is_err());
    }

    #[test]
    fn test_adjustment_direction_maps_to_kind() {
        assert_eq!(AdjustmentDirection::Inject.movement_kind(), MovementKind::AdjustmentIn);
        assert_eq!(AdjustmentDirection::Remove.effect(), AccountingEffect::Outflow);
        assert_eq!("INJECT".parse::<AdjustmentDirection>().unwrap(), AdjustmentDirection::Inject);
    }

    #[rstest]
    #[case(AdjustmentClass::Standard, false)]
    #[case(AdjustmentClass::OpeningBalance, true)]
    #[case(AdjustmentClass::ReconciliationClose, true)]
    fn test_adjustment_class_criticality(#[case] class: AdjustmentClass, #[case] critical: bool) {
        assert_eq!(class.is_critical(), critical);
        assert_eq!(class.as_str().parse::<AdjustmentClass>().unwrap(), class);
    }

    #[test]
    fn test_critical_adjustment_requires_adjustment_kind() {
        let buy = transaction(MovementKind::Buy, Some(AdjustmentClass::OpeningBalance));
        assert!(!buy.is_critical_adjustment());

        let adj = transaction(MovementKind::AdjustmentIn, Some(AdjustmentClass::OpeningBalance));
        assert!(adj.is_critical_adjustment());

        let plain = transaction(MovementKind::AdjustmentOut, Some(AdjustmentClass::Standard));
        assert!(plain.is_adjustment());
        assert!(!plain.is_critical_adjustment());
    }

    #[test]
    fn test_amount_and_pending() {
        let mut tx = transaction(MovementKind::Buy, None);
        assert_eq!(tx.amount(), Some(dec!(25)));
        assert!(tx.is_pending());

        tx.price = None;
        assert_eq!(tx.amount(), None);

        tx.ignored_in_costing = true;
        assert!(!tx.is_pending());
    }

    #[test]
    fn test_group_key_display() {
        let key = group();
        let text = key.to_string();
        assert!(text.ends_with("/ACC-1"));
        assert!(text.starts_with(&key.company_id.to_string()));
    }
}
