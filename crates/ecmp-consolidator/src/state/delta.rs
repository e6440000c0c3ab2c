//! Snapshot diffing.
//!
//! Two snapshots are compared by a merge-walk over the sorted keys of their
//! ordered maps: first the router map, then each address-family table of
//! every router that differs. Values shared by pointer are skipped without
//! being compared, so a delta costs work in proportion to what was touched.

use std::cmp::Ordering;
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::iter::Peekable;
use std::sync::Arc;

use super::snapshot::{Fib, RouteTable, RoutingSnapshot, EMPTY_ROUTE_TABLE};
use crate::route::{AddressFamily, IpPrefix, Route, RouterId};

/// Change of a single key between two maps.
#[derive(Debug, PartialEq, Eq)]
pub enum MapChange<'a, V> {
    Added(&'a V),
    Removed(&'a V),
    Changed { old: &'a V, new: &'a V },
}

impl<V> Clone for MapChange<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for MapChange<'_, V> {}

/// Per-route change produced by [`StateDelta::route_deltas`].
pub type RouteChange<'a> = MapChange<'a, Route>;

/// Merge-walk over two ordered maps of shared values.
///
/// Yields each key present in either map exactly once, except keys whose
/// values are considered the same by the map's identity rule.
pub struct MapDiff<'a, K, V> {
    old: Peekable<btree_map::Iter<'a, K, Arc<V>>>,
    new: Peekable<btree_map::Iter<'a, K, Arc<V>>>,
    same: fn(&Arc<V>, &Arc<V>) -> bool,
}

fn same_value<V: PartialEq>(old: &Arc<V>, new: &Arc<V>) -> bool {
    Arc::ptr_eq(old, new) || old == new
}

fn same_pointer<V>(old: &Arc<V>, new: &Arc<V>) -> bool {
    Arc::ptr_eq(old, new)
}

impl<'a, K: Ord, V: PartialEq> MapDiff<'a, K, V> {
    /// Diffs two maps, eliding keys whose values are equal.
    pub fn new(old: &'a BTreeMap<K, Arc<V>>, new: &'a BTreeMap<K, Arc<V>>) -> Self {
        Self::with_rule(old, new, same_value::<V>)
    }
}

impl<'a, K: Ord, V> MapDiff<'a, K, V> {
    /// Diffs two maps, eliding only keys whose values share an allocation.
    pub fn by_identity(old: &'a BTreeMap<K, Arc<V>>, new: &'a BTreeMap<K, Arc<V>>) -> Self {
        Self::with_rule(old, new, same_pointer::<V>)
    }

    fn with_rule(
        old: &'a BTreeMap<K, Arc<V>>,
        new: &'a BTreeMap<K, Arc<V>>,
        same: fn(&Arc<V>, &Arc<V>) -> bool,
    ) -> Self {
        Self {
            old: old.iter().peekable(),
            new: new.iter().peekable(),
            same,
        }
    }
}

impl<'a, K: Ord, V> Iterator for MapDiff<'a, K, V> {
    type Item = (&'a K, MapChange<'a, V>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let ordering = match (self.old.peek(), self.new.peek()) {
                (None, None) => return None,
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some((old_key, _)), Some((new_key, _))) => old_key.cmp(new_key),
            };

            match ordering {
                Ordering::Less => {
                    let (key, old) = self.old.next()?;
                    return Some((key, MapChange::Removed(&**old)));
                }
                Ordering::Greater => {
                    let (key, new) = self.new.next()?;
                    return Some((key, MapChange::Added(&**new)));
                }
                Ordering::Equal => {
                    let (key, old) = self.old.next()?;
                    let (_, new) = self.new.next()?;
                    if (self.same)(old, new) {
                        continue;
                    }
                    return Some((
                        key,
                        MapChange::Changed {
                            old: &**old,
                            new: &**new,
                        },
                    ));
                }
            }
        }
    }
}

/// A route change located by router and address family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteDelta<'a> {
    pub router_id: RouterId,
    pub family: AddressFamily,
    pub prefix: &'a IpPrefix,
    pub change: RouteChange<'a>,
}

/// The difference between two routing snapshots.
#[derive(Debug, Clone, Copy)]
pub struct StateDelta<'a> {
    old: &'a RoutingSnapshot,
    new: &'a RoutingSnapshot,
}

impl<'a> StateDelta<'a> {
    /// Creates a delta from `old` to `new`.
    pub fn new(old: &'a RoutingSnapshot, new: &'a RoutingSnapshot) -> Self {
        Self { old, new }
    }

    /// Returns the baseline snapshot.
    pub fn old_state(&self) -> &'a RoutingSnapshot {
        self.old
    }

    /// Returns the target snapshot.
    pub fn new_state(&self) -> &'a RoutingSnapshot {
        self.new
    }

    /// Returns the changed routers.
    pub fn fib_deltas(&self) -> MapDiff<'a, RouterId, Fib> {
        MapDiff::by_identity(self.old.fibs(), self.new.fibs())
    }

    /// Returns every route change, router by router, V4 before V6, each
    /// table in prefix order.
    pub fn route_deltas(&self) -> impl Iterator<Item = RouteDelta<'a>> + 'a {
        self.fib_deltas().flat_map(|(router_id, fib_change)| {
            AddressFamily::ALL.into_iter().flat_map(move |family| {
                let (old_table, new_table) = tables(fib_change, family);
                MapDiff::new(old_table, new_table).map(move |(prefix, change)| RouteDelta {
                    router_id: *router_id,
                    family,
                    prefix,
                    change,
                })
            })
        })
    }
}

/// Tables to walk for one family of a changed router. A table still shared
/// between both FIBs is replaced by two empty ones so it is never walked.
fn tables(change: MapChange<'_, Fib>, family: AddressFamily) -> (&RouteTable, &RouteTable) {
    let (old, new) = match change {
        MapChange::Added(fib) => (&EMPTY_ROUTE_TABLE, fib.table(family)),
        MapChange::Removed(fib) => (fib.table(family), &EMPTY_ROUTE_TABLE),
        MapChange::Changed { old, new } => (old.table(family), new.table(family)),
    };
    if std::ptr::eq(old, new) {
        (&EMPTY_ROUTE_TABLE, &EMPTY_ROUTE_TABLE)
    } else {
        (old, new)
    }
}
