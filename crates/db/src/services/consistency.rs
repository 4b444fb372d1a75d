//! Engine-versus-custodian consistency checks. Read-only.

use kardex_core::kardex::{ConsistencyReport, GroupKey};
use kardex_shared::CostingConfig;
use kardex_shared::types::CompanyId;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use tracing::{instrument, warn};

use crate::error::CostingError;
use crate::repositories::{CustodianBalanceRepository, balance, custodian_balance, ledger};

/// Compares cached balances with custodian statements.
#[derive(Debug, Clone)]
pub struct ConsistencyChecker {
    db: DatabaseConnection,
    tolerance: Decimal,
}

impl ConsistencyChecker {
    /// Creates a checker using the configured tolerance.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: &CostingConfig) -> Self {
        Self {
            db,
            tolerance: config.reconciliation_tolerance,
        }
    }

    /// Checks a group against its latest custodian statement.
    ///
    /// When the statement predates the cache, the engine figure is taken from
    /// the last kardex row on or before the statement date.
    ///
    /// # Errors
    ///
    /// Returns `StatementNotFound` if the group has no statement.
    #[instrument(skip(self, group), fields(group = %group))]
    pub async fn check(&self, group: &GroupKey) -> Result<ConsistencyReport, CostingError> {
        let statement = custodian_balance::latest_in(&self.db, group)
            .await?
            .ok_or_else(|| CostingError::StatementNotFound(group.clone()))?;

        let cached = balance::find_in(&self.db, group).await?;
        let current = cached.filter(|snapshot| {
            snapshot
                .as_of_date
                .is_none_or(|as_of| as_of <= statement.statement_date)
        });

        let (engine_quantity, engine_as_of) = match current {
            Some(snapshot) => (snapshot.quantity, snapshot.as_of_date),
            None => ledger::last_entry_on_or_before_in(&self.db, group, statement.statement_date)
                .await?
                .map_or((Decimal::ZERO, None), |entry| {
                    (entry.balance_quantity, Some(entry.date))
                }),
        };

        let report =
            ConsistencyReport::compare(engine_quantity, engine_as_of, &statement, self.tolerance);
        if !report.is_match() {
            warn!(
                engine = %report.engine_quantity,
                custodian = %report.external_quantity,
                difference = %report.difference,
                statement_date = %report.statement_date,
                "Kardex disagrees with custodian statement"
            );
        }
        Ok(report)
    }

    /// Checks every group of a company that has a custodian statement.
    ///
    /// # Errors
    ///
    /// Returns an error if any database query fails.
    #[instrument(skip(self))]
    pub async fn check_company(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<ConsistencyReport>, CostingError> {
        let groups = CustodianBalanceRepository::new(self.db.clone())
            .groups_for_company(company_id)
            .await?;

        let mut reports = Vec::with_capacity(groups.len());
        for group in &groups {
            reports.push(self.check(group).await?);
        }
        Ok(reports)
    }
}
