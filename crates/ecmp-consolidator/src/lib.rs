//! SONiC ECMP Group Consolidator
//!
//! Assigns stable identifiers to the distinct next-hop sets used by resolved
//! routes and tracks how many routes use each of them, driven by diffs of
//! immutable routing snapshots.
//!
//! # Key Components
//!
//! - [`state::RoutingSnapshot`]: copy-on-write view of every router's FIB
//! - [`state::StateDelta`]: merge-walk diff between two snapshots
//! - [`consolidator::EcmpGroupConsolidator`]: id allocation and population
//!   tracking per delta
//! - [`consolidator::ConsolidatorHandle`]: shared access behind the
//!   `consolidate_ecmp_groups` gate

pub mod config;
pub mod consolidator;
pub mod error;
pub mod route;
pub mod state;

pub use config::ConsolidatorConfig;
pub use consolidator::{
    ConsolidatorHandle, DeltaStats, EcmpGroupConsolidator, GroupExport, NextHopGroupId,
};
pub use error::{ConsolidatorError, Result};
pub use route::{IpPrefix, NextHop, NextHopSet, Route, RouterId};
pub use state::{RoutingSnapshot, StateDelta};
