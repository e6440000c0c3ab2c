//! Route types.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::nhg::NextHopSet;
use super::prefix::{AddressFamily, IpPrefix};

/// Routing domain (VRF) identifier.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RouterId(pub u32);

impl RouterId {
    /// The default routing domain.
    pub const DEFAULT: RouterId = RouterId(0);
}

impl fmt::Display for RouterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Administrative distance of a route's source protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdminDistance(pub u8);

impl AdminDistance {
    pub const STATIC_ROUTE: AdminDistance = AdminDistance(1);
    pub const EBGP: AdminDistance = AdminDistance(20);
    pub const IBGP: AdminDistance = AdminDistance(200);
}

impl Default for AdminDistance {
    fn default() -> Self {
        Self::EBGP
    }
}

/// A route as held by a routing snapshot.
///
/// `forward` carries the resolved next-hop set; `None` means the route is
/// unresolved and does not count toward any group population.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    prefix: IpPrefix,
    admin_distance: AdminDistance,
    forward: Option<NextHopSet>,
}

impl Route {
    /// Creates a resolved route forwarding over `nexthops`.
    pub fn resolved(prefix: IpPrefix, nexthops: NextHopSet) -> Self {
        Self {
            prefix,
            admin_distance: AdminDistance::default(),
            forward: Some(nexthops),
        }
    }

    /// Creates an unresolved route.
    pub fn unresolved(prefix: IpPrefix) -> Self {
        Self {
            prefix,
            admin_distance: AdminDistance::default(),
            forward: None,
        }
    }

    /// Sets the administrative distance.
    pub fn with_admin_distance(mut self, admin_distance: AdminDistance) -> Self {
        self.admin_distance = admin_distance;
        self
    }

    /// Returns a copy of this route with its forwarding info cleared.
    pub fn clear_forward(&self) -> Self {
        Self {
            forward: None,
            ..self.clone()
        }
    }

    /// Returns the route prefix.
    pub fn prefix(&self) -> &IpPrefix {
        &self.prefix
    }

    /// Returns the address family of the route.
    pub fn family(&self) -> AddressFamily {
        self.prefix.family()
    }

    /// Returns the administrative distance.
    pub fn admin_distance(&self) -> AdminDistance {
        self.admin_distance
    }

    /// Returns true if the route has forwarding info.
    pub fn is_resolved(&self) -> bool {
        self.forward.is_some()
    }

    /// Returns the resolved next-hop set, if any.
    pub fn next_hops(&self) -> Option<&NextHopSet> {
        self.forward.as_ref()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.forward {
            Some(nexthops) => write!(f, "{} via [{}]", self.prefix, nexthops),
            None => write!(f, "{} unresolved", self.prefix),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefix(s: &str) -> IpPrefix {
        s.parse().unwrap()
    }

    #[test]
    fn test_route_resolved() {
        let nhops: NextHopSet = "100::1,100::2".parse().unwrap();
        let route = Route::resolved(prefix("2601:db00:2110::/64"), nhops.clone());

        assert!(route.is_resolved());
        assert_eq!(route.next_hops(), Some(&nhops));
        assert_eq!(route.family(), AddressFamily::V6);
        assert_eq!(route.admin_distance(), AdminDistance::EBGP);
    }

    #[test]
    fn test_route_clear_forward() {
        let nhops: NextHopSet = "10.0.0.1".parse().unwrap();
        let route = Route::resolved(prefix("10.1.0.0/16"), nhops.clone())
            .with_admin_distance(AdminDistance::STATIC_ROUTE);
        let cleared = route.clear_forward();

        assert!(!cleared.is_resolved());
        assert_eq!(cleared.next_hops(), None);
        assert_eq!(cleared.admin_distance(), AdminDistance::STATIC_ROUTE);
        assert_ne!(route, cleared);
        assert_eq!(route.next_hops(), Some(&nhops));
    }

    #[test]
    fn test_route_display() {
        let route = Route::unresolved(prefix("10.1.0.0/16"));
        assert_eq!(route.to_string(), "10.1.0.0/16 unresolved");

        let route = Route::resolved(prefix("10.1.0.0/16"), "10.0.0.1".parse().unwrap());
        assert_eq!(route.to_string(), "10.1.0.0/16 via [10.0.0.1]");
    }
}
