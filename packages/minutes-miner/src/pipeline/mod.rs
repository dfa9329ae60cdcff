//! Run orchestration and its output.

pub mod coordinator;
pub mod report;

pub use coordinator::{DiscoveredGroup, MiningCoordinator};
pub use report::{GroupReport, GroupStage, GroupStats, MiningReport, TierSummary};
