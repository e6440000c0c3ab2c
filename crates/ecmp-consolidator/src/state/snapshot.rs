//! Copy-on-write routing snapshots.
//!
//! A [`RoutingSnapshot`] is a cheap-to-clone view of every router's FIB.
//! Editing a clone copies only the router and address family it touches;
//! everything else stays shared with the snapshot it was cloned from, and
//! that earlier snapshot never changes. Sharing is what lets the diff
//! engine skip untouched routers and tables by pointer comparison.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{ConsolidatorError, Result};
use crate::route::{AddressFamily, IpPrefix, Route, RouterId};

/// Routes of one address family, keyed by prefix.
pub type RouteTable = BTreeMap<IpPrefix, Arc<Route>>;

/// Table used in place of a router that exists on only one side of a diff.
pub(crate) static EMPTY_ROUTE_TABLE: RouteTable = BTreeMap::new();

/// Forwarding information base of one router.
#[derive(Debug, Clone, Default)]
pub struct Fib {
    v4: Arc<RouteTable>,
    v6: Arc<RouteTable>,
}

impl Fib {
    /// Returns the table for one address family.
    pub fn table(&self, family: AddressFamily) -> &RouteTable {
        match family {
            AddressFamily::V4 => &self.v4,
            AddressFamily::V6 => &self.v6,
        }
    }

    fn table_mut(&mut self, family: AddressFamily) -> &mut RouteTable {
        match family {
            AddressFamily::V4 => Arc::make_mut(&mut self.v4),
            AddressFamily::V6 => Arc::make_mut(&mut self.v6),
        }
    }

    /// Returns the number of routes across both families.
    pub fn len(&self) -> usize {
        self.v4.len() + self.v6.len()
    }

    /// Returns true if the FIB holds no routes.
    pub fn is_empty(&self) -> bool {
        self.v4.is_empty() && self.v6.is_empty()
    }
}

/// An immutable point-in-time view of all routing tables.
#[derive(Debug, Clone, Default)]
pub struct RoutingSnapshot {
    fibs: BTreeMap<RouterId, Arc<Fib>>,
}

impl RoutingSnapshot {
    /// Creates a snapshot with no routers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a snapshot holding one empty FIB per router id.
    pub fn with_routers(router_ids: impl IntoIterator<Item = RouterId>) -> Self {
        let mut snapshot = Self::new();
        for router_id in router_ids {
            snapshot.add_router(router_id);
        }
        snapshot
    }

    /// Adds an empty FIB for `router_id`. Returns false if it already exists.
    pub fn add_router(&mut self, router_id: RouterId) -> bool {
        if self.fibs.contains_key(&router_id) {
            return false;
        }
        self.fibs.insert(router_id, Arc::new(Fib::default()));
        true
    }

    /// Removes a router together with all of its routes.
    pub fn remove_router(&mut self, router_id: RouterId) -> Result<Arc<Fib>> {
        self.fibs
            .remove(&router_id)
            .ok_or(ConsolidatorError::RouterNotFound(router_id))
    }

    /// Returns true if the router exists.
    pub fn has_router(&self, router_id: RouterId) -> bool {
        self.fibs.contains_key(&router_id)
    }

    /// Returns the router ids in ascending order.
    pub fn router_ids(&self) -> impl Iterator<Item = RouterId> + '_ {
        self.fibs.keys().copied()
    }

    /// Returns the FIB of a router.
    pub fn fib(&self, router_id: RouterId) -> Option<&Fib> {
        self.fibs.get(&router_id).map(|fib| &**fib)
    }

    pub(crate) fn fibs(&self) -> &BTreeMap<RouterId, Arc<Fib>> {
        &self.fibs
    }

    /// Looks up the route for exactly `prefix`.
    pub fn exact_match(&self, router_id: RouterId, prefix: &IpPrefix) -> Option<&Arc<Route>> {
        self.fib(router_id)
            .and_then(|fib| fib.table(prefix.family()).get(prefix))
    }

    /// Returns the routes of one router and family in prefix order.
    pub fn routes(
        &self,
        router_id: RouterId,
        family: AddressFamily,
    ) -> impl Iterator<Item = &Arc<Route>> + '_ {
        self.fib(router_id)
            .into_iter()
            .flat_map(move |fib| fib.table(family).values())
    }

    /// Returns the number of routes of one router and family.
    pub fn len(&self, router_id: RouterId, family: AddressFamily) -> usize {
        self.fib(router_id)
            .map(|fib| fib.table(family).len())
            .unwrap_or(0)
    }

    /// Returns the number of routes across all routers and families.
    pub fn route_count(&self) -> usize {
        self.fibs.values().map(|fib| fib.len()).sum()
    }

    /// Returns true if no router holds any route.
    pub fn is_empty(&self) -> bool {
        self.fibs.values().all(|fib| fib.is_empty())
    }

    /// Returns the number of resolved routes across all routers and families.
    pub fn resolved_route_count(&self) -> usize {
        self.fibs
            .values()
            .flat_map(|fib| AddressFamily::ALL.into_iter().map(move |f| fib.table(f)))
            .flat_map(|table| table.values())
            .filter(|route| route.is_resolved())
            .count()
    }

    /// Adds a route. The router must exist and the prefix must be new.
    pub fn add_route(&mut self, router_id: RouterId, route: Route) -> Result<()> {
        let prefix = *route.prefix();
        if !self.has_router(router_id) {
            return Err(ConsolidatorError::RouterNotFound(router_id));
        }
        if self.exact_match(router_id, &prefix).is_some() {
            return Err(ConsolidatorError::RouteExists(router_id, prefix));
        }

        self.table_mut(router_id, prefix.family())?
            .insert(prefix, Arc::new(route));
        Ok(())
    }

    /// Replaces an existing route, returning the one it replaced.
    pub fn update_route(&mut self, router_id: RouterId, route: Route) -> Result<Arc<Route>> {
        let prefix = *route.prefix();
        if self.exact_match(router_id, &prefix).is_none() {
            return Err(self.missing(router_id, prefix));
        }

        self.table_mut(router_id, prefix.family())?
            .insert(prefix, Arc::new(route))
            .ok_or(ConsolidatorError::RouteNotFound(router_id, prefix))
    }

    /// Removes a route, returning it.
    pub fn remove_route(&mut self, router_id: RouterId, prefix: &IpPrefix) -> Result<Arc<Route>> {
        if self.exact_match(router_id, prefix).is_none() {
            return Err(self.missing(router_id, *prefix));
        }

        self.table_mut(router_id, prefix.family())?
            .remove(prefix)
            .ok_or(ConsolidatorError::RouteNotFound(router_id, *prefix))
    }

    fn table_mut(&mut self, router_id: RouterId, family: AddressFamily) -> Result<&mut RouteTable> {
        self.fibs
            .get_mut(&router_id)
            .map(|fib| Arc::make_mut(fib).table_mut(family))
            .ok_or(ConsolidatorError::RouterNotFound(router_id))
    }

    fn missing(&self, router_id: RouterId, prefix: IpPrefix) -> ConsolidatorError {
        if self.has_router(router_id) {
            ConsolidatorError::RouteNotFound(router_id, prefix)
        } else {
            ConsolidatorError::RouterNotFound(router_id)
        }
    }
}
