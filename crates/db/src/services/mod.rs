//! Services owning units of work over the costing tables.

pub mod adjustment;
pub mod consistency;
pub mod costing;
pub mod locks;

pub use adjustment::{AdjustmentService, CreateAdjustment, DeleteOutcome};
pub use consistency::ConsistencyChecker;
pub use costing::{CostingService, GroupFailure, GroupPass, PurgeOutcome, ResetOutcome, RunSummary};
pub use locks::GroupLocks;

use kardex_shared::CostingConfig;
use sea_orm::DatabaseConnection;

/// The costing services wired to one connection pool and one lock registry.
#[derive(Debug, Clone)]
pub struct KardexServices {
    /// Reset, recost and batch runs.
    pub costing: CostingService,
    /// Adjustment proposals and lifecycle.
    pub adjustments: AdjustmentService,
    /// Custodian consistency checks.
    pub consistency: ConsistencyChecker,
}

impl KardexServices {
    /// Builds the services from the costing configuration.
    #[must_use]
    pub fn new(db: &DatabaseConnection, config: &CostingConfig) -> Self {
        let costing = CostingService::new(db.clone(), config, GroupLocks::new());
        Self {
            adjustments: AdjustmentService::new(db.clone(), config, costing.clone()),
            consistency: ConsistencyChecker::new(db.clone(), config),
            costing,
        }
    }
}
