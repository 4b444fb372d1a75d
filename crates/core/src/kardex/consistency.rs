//! Comparison of engine balances against custodian statements.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::GroupKey;

/// A balance figure reported by a custodian statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalBalance {
    /// Group the statement line refers to.
    pub group: GroupKey,
    /// Statement date.
    pub statement_date: NaiveDate,
    /// Units reported by the custodian.
    pub quantity: Decimal,
}

/// Outcome of a consistency check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsistencyStatus {
    /// Within tolerance.
    Match,
    /// Outside tolerance.
    Mismatch,
}

/// Engine-versus-custodian comparison for one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    /// Checked group.
    pub group: GroupKey,
    /// Quantity according to the kardex.
    pub engine_quantity: Decimal,
    /// Date of the kardex row the engine figure comes from.
    pub engine_as_of: Option<NaiveDate>,
    /// Quantity according to the custodian.
    pub external_quantity: Decimal,
    /// Statement date.
    pub statement_date: NaiveDate,
    /// `engine_quantity - external_quantity`.
    pub difference: Decimal,
    /// Match or mismatch.
    pub status: ConsistencyStatus,
}

impl ConsistencyReport {
    /// Compares an engine quantity with a statement line.
    ///
    /// The check matches when `|difference| <= tolerance`.
    #[must_use]
    pub fn compare(
        engine_quantity: Decimal,
        engine_as_of: Option<NaiveDate>,
        external: &ExternalBalance,
        tolerance: Decimal,
    ) -> Self {
        let difference = engine_quantity - external.quantity;
        let status = if difference.abs() <= tolerance.abs() {
            ConsistencyStatus::Match
        } else {
            ConsistencyStatus::Mismatch
        };

        Self {
            group: external.group.clone(),
            engine_quantity,
            engine_as_of,
            external_quantity: external.quantity,
            statement_date: external.statement_date,
            difference,
            status,
        }
    }

    /// Returns true when the figures agree.
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.status == ConsistencyStatus::Match
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kardex_shared::types::{CompanyId, CustodianId, InstrumentId};
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn statement(quantity: Decimal) -> ExternalBalance {
        ExternalBalance {
            group: GroupKey::new(CompanyId::new(), CustodianId::new(), InstrumentId::new(), "S"),
            statement_date: NaiveDate::from_ymd_opt(2026, 5, 31).unwrap(),
            quantity,
        }
    }

    #[rstest]
    #[case(dec!(40), dec!(40), dec!(0), ConsistencyStatus::Match, dec!(0))]
    #[case(dec!(40), dec!(45), dec!(0), ConsistencyStatus::Mismatch, dec!(-5))]
    #[case(dec!(50), dec!(45), dec!(0), ConsistencyStatus::Mismatch, dec!(5))]
    #[case(dec!(40.2), dec!(40), dec!(0.5), ConsistencyStatus::Match, dec!(0.2))]
    fn test_compare(
        #[case] engine: Decimal,
        #[case] external: Decimal,
        #[case] tolerance: Decimal,
        #[case] status: ConsistencyStatus,
        #[case] difference: Decimal,
    ) {
        let report = ConsistencyReport::compare(engine, None, &statement(external), tolerance);
        assert_eq!(report.status, status);
        assert_eq!(report.difference, difference);
        assert_eq!(report.is_match(), status == ConsistencyStatus::Match);
    }
}
