//! Group reset/recost orchestration and the batch costing run.
//!
//! Every public operation takes the group lock, opens one database
//! transaction, does all of its work on that transaction and commits. An
//! error anywhere drops the transaction uncommitted, which rolls it back, so
//! a group is never left with kardex rows that disagree with its balance.
//!
//! The `*_in` methods do the work without locking or committing; they are
//! shared with the adjustment service, which runs them inside its own unit of
//! work.

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use kardex_core::kardex::{ConsolidatedBalance, GroupKey, KardexEngine};
use kardex_shared::CostingConfig;
use kardex_shared::types::TransactionId;
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tracing::{info, instrument, warn};

use crate::error::CostingError;
use crate::repositories::ledger::DeletedRows;
use crate::repositories::{balance, ledger, transaction};
use crate::services::locks::GroupLocks;

/// Result of one costing pass over a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPass {
    /// Costed group.
    pub group: GroupKey,
    /// First date whose rows were rewritten.
    pub from: NaiveDate,
    /// Kardex rows written.
    pub entries_written: u64,
    /// Consumption trail rows written.
    pub consumptions_written: u64,
    /// Outflows the pass flagged for review.
    pub flagged: Vec<TransactionId>,
    /// Balance cache after the pass.
    pub balance: ConsolidatedBalance,
}

/// Result of a reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetOutcome {
    /// Reset group.
    pub group: GroupKey,
    /// Cutoff date.
    pub from: NaiveDate,
    /// Derived rows removed.
    pub deleted: DeletedRows,
    /// Transactions whose flags were cleared.
    pub transactions_cleared: u64,
    /// Balance cache after the reset.
    pub balance: ConsolidatedBalance,
}

/// Result of purging a group's tail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeOutcome {
    /// Source transactions deleted.
    pub transactions_deleted: u64,
    /// The recost that followed.
    pub pass: GroupPass,
}

/// A group that failed during a batch run.
#[derive(Debug)]
pub struct GroupFailure {
    /// Failed group.
    pub group: GroupKey,
    /// What went wrong. The group's committed state is unchanged.
    pub error: CostingError,
}

/// Summary of a batch costing run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Groups costed and committed.
    pub groups_processed: usize,
    /// Outflows flagged for review across all processed groups.
    pub needs_review: usize,
    /// Groups rolled back.
    pub failures: Vec<GroupFailure>,
}

impl RunSummary {
    /// Number of groups rolled back.
    #[must_use]
    pub fn groups_failed(&self) -> usize {
        self.failures.len()
    }
}

/// Drives the engine over stored groups.
#[derive(Debug, Clone)]
pub struct CostingService {
    db: DatabaseConnection,
    engine: KardexEngine,
    locks: GroupLocks,
    max_parallel_groups: usize,
}

impl CostingService {
    /// Creates a costing service sharing `locks` with the other services.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: &CostingConfig, locks: GroupLocks) -> Self {
        Self {
            db,
            engine: KardexEngine::new(config.unit_cost_scale),
            locks,
            max_parallel_groups: config.max_parallel_groups.max(1),
        }
    }

    /// The lock registry this service serializes groups with.
    #[must_use]
    pub const fn locks(&self) -> &GroupLocks {
        &self.locks
    }

    /// Costs every group with pending transactions.
    ///
    /// Groups run concurrently up to `max_parallel_groups`. A failing group is
    /// rolled back and reported in the summary; the others still commit.
    ///
    /// # Errors
    ///
    /// Returns an error only if the pending groups cannot be listed.
    #[instrument(skip_all)]
    pub async fn run_all(&self) -> Result<RunSummary, CostingError> {
        let groups = transaction::TransactionRepository::new(self.db.clone())
            .pending_groups()
            .await?;
        info!(groups = groups.len(), "Costing run started");

        let results: Vec<(GroupKey, Result<Option<GroupPass>, CostingError>)> =
            stream::iter(groups)
                .map(|group| async move {
                    let result = self.cost_pending_group(&group).await;
                    (group, result)
                })
                .buffer_unordered(self.max_parallel_groups)
                .collect()
                .await;

        let mut summary = RunSummary::default();
        for (group, result) in results {
            match result {
                Ok(Some(pass)) => {
                    summary.groups_processed += 1;
                    summary.needs_review += pass.flagged.len();
                }
                Ok(None) => {}
                Err(error) => {
                    warn!(group = %group, code = error.error_code(), error = %error, "Group costing rolled back");
                    summary.failures.push(GroupFailure { group, error });
                }
            }
        }

        let locks_pruned = self.locks.prune();
        info!(
            processed = summary.groups_processed,
            failed = summary.groups_failed(),
            locks_pruned,
            needs_review = summary.needs_review,
            "Costing run finished"
        );
        Ok(summary)
    }

    /// Costs one group from its earliest pending date.
    ///
    /// Returns `None` when nothing in the group is pending.
    ///
    /// # Errors
    ///
    /// Returns `Structural` if the engine rejects the history, or a database
    /// error. Either way nothing is committed.
    #[instrument(skip(self, group), fields(group = %group))]
    pub async fn cost_pending_group(
        &self,
        group: &GroupKey,
    ) -> Result<Option<GroupPass>, CostingError> {
        let _guard = self.locks.acquire(group).await;
        let txn = self.db.begin().await?;

        let history = transaction::list_by_group_in(&txn, group).await?;
        let Some(from) = history
            .iter()
            .filter(|tx| tx.is_pending())
            .map(|tx| tx.date)
            .min()
        else {
            return Ok(None);
        };

        Self::reset_in(&txn, group, from).await?;
        let pass = self.cost_in(&txn, group, from).await?;
        txn.commit().await?;
        Ok(Some(pass))
    }

    /// Deletes derived state dated on or after `from` and clears the flags of
    /// the affected transactions.
    ///
    /// # Errors
    ///
    /// Returns `GroupNotFound` if the group has no transactions.
    #[instrument(skip(self, group), fields(group = %group))]
    pub async fn reset_group(
        &self,
        group: &GroupKey,
        from: NaiveDate,
    ) -> Result<ResetOutcome, CostingError> {
        let _guard = self.locks.acquire(group).await;
        let txn = self.db.begin().await?;
        Self::ensure_group_in(&txn, group).await?;

        let outcome = Self::reset_in(&txn, group, from).await?;
        txn.commit().await?;
        Ok(outcome)
    }

    /// Resets and recosts a group in one unit of work.
    ///
    /// Without `from` the whole history is recosted.
    ///
    /// # Errors
    ///
    /// Returns `GroupNotFound` if the group has no transactions.
    #[instrument(skip(self, group), fields(group = %group))]
    pub async fn recost_group(
        &self,
        group: &GroupKey,
        from: Option<NaiveDate>,
    ) -> Result<GroupPass, CostingError> {
        let _guard = self.locks.acquire(group).await;
        let txn = self.db.begin().await?;

        let history = transaction::list_by_group_in(&txn, group).await?;
        let earliest = history
            .first()
            .map(|tx| tx.date)
            .ok_or_else(|| CostingError::GroupNotFound(group.clone()))?;
        let from = from.unwrap_or(earliest);

        Self::reset_in(&txn, group, from).await?;
        let pass = self.cost_in(&txn, group, from).await?;
        txn.commit().await?;
        Ok(pass)
    }

    /// Deletes the group's transactions dated after `date` and recosts from
    /// `date`, atomically.
    ///
    /// # Errors
    ///
    /// Returns `GroupNotFound` if the group has no transactions.
    #[instrument(skip(self, group), fields(group = %group))]
    pub async fn purge_transactions_after(
        &self,
        group: &GroupKey,
        date: NaiveDate,
    ) -> Result<PurgeOutcome, CostingError> {
        let _guard = self.locks.acquire(group).await;
        let txn = self.db.begin().await?;
        Self::ensure_group_in(&txn, group).await?;

        Self::reset_in(&txn, group, date).await?;
        let transactions_deleted = transaction::delete_after_in(&txn, group, date).await?;
        let pass = self.cost_in(&txn, group, date).await?;
        txn.commit().await?;

        info!(transactions_deleted, "Purged group tail");
        Ok(PurgeOutcome {
            transactions_deleted,
            pass,
        })
    }

    /// Rederives the group's balance cache from its last kardex row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    #[instrument(skip(self, group), fields(group = %group))]
    pub async fn refresh_balance(
        &self,
        group: &GroupKey,
    ) -> Result<ConsolidatedBalance, CostingError> {
        let _guard = self.locks.acquire(group).await;
        let txn = self.db.begin().await?;
        let snapshot = balance::refresh_in(&txn, group).await?;
        txn.commit().await?;
        Ok(snapshot)
    }

    pub(crate) async fn ensure_group_in(
        txn: &DatabaseTransaction,
        group: &GroupKey,
    ) -> Result<(), CostingError> {
        if transaction::group_exists_in(txn, group).await? {
            Ok(())
        } else {
            Err(CostingError::GroupNotFound(group.clone()))
        }
    }

    pub(crate) async fn reset_in(
        txn: &DatabaseTransaction,
        group: &GroupKey,
        from: NaiveDate,
    ) -> Result<ResetOutcome, CostingError> {
        let deleted = ledger::delete_from_in(txn, group, from).await?;
        let transactions_cleared = transaction::clear_flags_from_in(txn, group, from).await?;
        let balance = balance::refresh_in(txn, group).await?;

        info!(
            group = %group,
            %from,
            entries = deleted.entries,
            consumptions = deleted.consumptions,
            transactions_cleared,
            "Group reset"
        );
        Ok(ResetOutcome {
            group: group.clone(),
            from,
            deleted,
            transactions_cleared,
            balance,
        })
    }

    /// Runs the engine over the full history and persists the rows dated on
    /// or after `from`. Earlier rows are left as they are.
    pub(crate) async fn cost_in(
        &self,
        txn: &DatabaseTransaction,
        group: &GroupKey,
        from: NaiveDate,
    ) -> Result<GroupPass, CostingError> {
        let history = transaction::list_by_group_in(txn, group).await?;
        let run = self.engine.process(group, &history)?;

        let entries_written =
            ledger::insert_entries_in(txn, run.entries.iter().filter(|e| e.date >= from)).await?;
        let consumptions_written = ledger::insert_consumptions_in(
            txn,
            run.consumptions.iter().filter(|d| d.outflow_date >= from),
        )
        .await?;

        let mut covered = Vec::new();
        let mut flagged = Vec::new();
        for (entry, outcome) in run.entries.iter().zip(&run.outcomes) {
            if entry.date < from {
                continue;
            }
            if outcome.needs_review {
                warn!(
                    group = %group,
                    transaction_id = %outcome.transaction_id,
                    shortfall = %outcome.shortfall,
                    "Outflow exceeds open lots, flagged for review"
                );
                flagged.push(outcome.transaction_id);
            } else {
                covered.push(outcome.transaction_id);
            }
        }
        let covered_ids: Vec<i64> = covered.iter().map(|id| id.value()).collect();
        let flagged_ids: Vec<i64> = flagged.iter().map(|id| id.value()).collect();
        transaction::mark_costed_in(txn, &covered_ids, &flagged_ids).await?;

        let balance = balance::refresh_in(txn, group).await?;
        info!(
            group = %group,
            %from,
            entries_written,
            consumptions_written,
            flagged = flagged.len(),
            "Group costed"
        );

        Ok(GroupPass {
            group: group.clone(),
            from,
            entries_written,
            consumptions_written,
            flagged,
            balance,
        })
    }
}
