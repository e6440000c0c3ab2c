//! ECMP group consolidation.
//!
//! Every distinct next-hop set used by at least one resolved route gets a
//! stable [`NextHopGroupId`]; the [`PopulationTracker`] counts how many
//! routes use each id and releases the id when the count drops to zero.
//! [`EcmpGroupConsolidator`] keeps both in step with snapshot deltas and
//! [`ConsolidatorHandle`] shares it behind the feature gate.

mod handle;
mod id_table;
mod orch;
mod tracker;

pub use handle::ConsolidatorHandle;
pub use id_table::{GroupIdTable, NextHopGroupId};
pub use orch::{DeltaStats, EcmpGroupConsolidator, GroupExport};
pub use tracker::{Population, PopulationTracker};
