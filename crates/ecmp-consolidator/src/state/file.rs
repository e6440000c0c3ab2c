//! JSON snapshot documents.
//!
//! ```json
//! {
//!   "routers": [
//!     {
//!       "router_id": 0,
//!       "routes": [
//!         { "prefix": "2601:db00:2110::/64", "next_hops": ["100::1", "100::2@3"] },
//!         { "prefix": "10.0.0.0/24", "admin_distance": 1, "next_hops": null }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! A route without `next_hops` (or with `null`) is unresolved.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::snapshot::RoutingSnapshot;
use crate::error::Result;
use crate::route::{AdminDistance, IpPrefix, NextHopSet, Route, RouterId};

/// A whole snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    #[serde(default)]
    pub routers: Vec<RouterDocument>,
}

/// One router's routes, both families mixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterDocument {
    pub router_id: RouterId,
    #[serde(default)]
    pub routes: Vec<RouteDocument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDocument {
    pub prefix: IpPrefix,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_distance: Option<AdminDistance>,
    #[serde(default)]
    pub next_hops: Option<NextHopSet>,
}

impl RouteDocument {
    fn into_route(self) -> Route {
        let route = match self.next_hops {
            Some(nexthops) => Route::resolved(self.prefix, nexthops),
            None => Route::unresolved(self.prefix),
        };
        match self.admin_distance {
            Some(distance) => route.with_admin_distance(distance),
            None => route,
        }
    }
}

impl SnapshotDocument {
    /// Builds a routing snapshot. A router listed twice has its routes merged;
    /// a prefix listed twice for one router is an error.
    pub fn into_snapshot(self) -> Result<RoutingSnapshot> {
        let mut snapshot = RoutingSnapshot::new();
        for router in self.routers {
            snapshot.add_router(router.router_id);
            for route in router.routes {
                snapshot.add_route(router.router_id, route.into_route())?;
            }
        }
        Ok(snapshot)
    }
}

/// Parses a snapshot from a JSON string.
pub fn parse_snapshot(json: &str) -> Result<RoutingSnapshot> {
    let document: SnapshotDocument = serde_json::from_str(json)?;
    document.into_snapshot()
}

/// Reads a snapshot from a JSON file.
pub fn load_snapshot(path: impl AsRef<Path>) -> Result<RoutingSnapshot> {
    let content = fs::read_to_string(path)?;
    parse_snapshot(&content)
}
