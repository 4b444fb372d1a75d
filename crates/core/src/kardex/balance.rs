//! Running and consolidated position balances.
//!
//! The consolidated balance is a cache: it must always equal the balance left by
//! the most recent kardex row of its group, or zero when the group has none.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::types::{GroupKey, KardexEntry};

/// Default number of decimal places kept on derived unit costs.
pub const DEFAULT_UNIT_COST_SCALE: u32 = 6;

/// Divides `value` by `quantity` with banker's rounding, zero for empty positions.
#[must_use]
pub fn unit_cost(value: Decimal, quantity: Decimal, scale: u32) -> Decimal {
    if quantity <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    value
        .checked_div(quantity)
        .map_or(Decimal::ZERO, |avg| {
            avg.round_dp_with_strategy(scale, RoundingStrategy::MidpointNearestEven)
        })
}

/// Cumulative quantity and cost of a group after some prefix of its history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunningBalance {
    /// Units held.
    pub quantity: Decimal,
    /// FIFO cost of the units held.
    pub value: Decimal,
}

impl RunningBalance {
    /// The empty balance.
    pub const ZERO: Self = Self {
        quantity: Decimal::ZERO,
        value: Decimal::ZERO,
    };

    /// Balance after adding an inflow, `None` on decimal overflow.
    #[must_use]
    pub fn with_inflow(self, quantity: Decimal, cost: Decimal) -> Option<Self> {
        Some(Self {
            quantity: self.quantity.checked_add(quantity)?,
            value: self.value.checked_add(cost)?,
        })
    }

    /// Balance after consuming an outflow, `None` on decimal overflow.
    #[must_use]
    pub fn with_outflow(self, quantity: Decimal, cost: Decimal) -> Option<Self> {
        Some(Self {
            quantity: self.quantity.checked_sub(quantity)?,
            value: self.value.checked_sub(cost)?,
        })
    }

    /// Weighted average unit cost, display only.
    #[must_use]
    pub fn average_unit_cost(&self, scale: u32) -> Decimal {
        unit_cost(self.value, self.quantity, scale)
    }
}

/// The single current snapshot of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidatedBalance {
    /// Owning group.
    pub group: GroupKey,
    /// Units held.
    pub quantity: Decimal,
    /// FIFO cost of the units held.
    pub total_cost: Decimal,
    /// `total_cost / quantity`, zero when flat.
    pub average_unit_cost: Decimal,
    /// Date of the ledger row the snapshot was taken from.
    pub as_of_date: Option<NaiveDate>,
}

impl ConsolidatedBalance {
    /// The snapshot of a group with an empty ledger.
    #[must_use]
    pub fn zero(group: GroupKey) -> Self {
        Self {
            group,
            quantity: Decimal::ZERO,
            total_cost: Decimal::ZERO,
            average_unit_cost: Decimal::ZERO,
            as_of_date: None,
        }
    }

    /// Derives the snapshot from the last kardex row of the group.
    #[must_use]
    pub fn from_last_entry(group: GroupKey, last: Option<&KardexEntry>) -> Self {
        match last {
            Some(entry) => Self {
                group,
                quantity: entry.balance_quantity,
                total_cost: entry.balance_value,
                average_unit_cost: entry.average_unit_cost,
                as_of_date: Some(entry.date),
            },
            None => Self::zero(group),
        }
    }

    /// Returns true if the snapshot matches the row it should mirror.
    #[must_use]
    pub fn is_coherent_with(&self, last: Option<&KardexEntry>) -> bool {
        *self == Self::from_last_entry(self.group.clone(), last)
    }
}
