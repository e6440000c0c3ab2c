//! Routing state as seen by the consolidator.
//!
//! - [`RoutingSnapshot`]: immutable, copy-on-write view of every router's FIB
//! - [`StateDelta`]: merge-walk diff between two snapshots
//! - [`file`]: JSON snapshot documents

pub mod file;
mod delta;
mod snapshot;

pub use delta::{MapChange, MapDiff, RouteChange, RouteDelta, StateDelta};
pub use snapshot::{Fib, RouteTable, RoutingSnapshot};
