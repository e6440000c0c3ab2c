//! Integration tests for ECMP group consolidation across snapshot deltas.

use pretty_assertions::assert_eq;
use sonic_ecmp_consolidator::route::{AddressFamily, NextHop, UCMP_DEFAULT_WEIGHT};
use sonic_ecmp_consolidator::state::file::parse_snapshot;
use sonic_ecmp_consolidator::*;
use std::net::IpAddr;
use std::sync::Arc;

// ============================================================================
// FIXTURE
// ============================================================================

/// `n` next-hops 100::1 .. 100::n (hex), default weight.
fn make_nexthops(n: u32) -> NextHopSet {
    assert!(n < 255);
    (0..n)
        .map(|i| {
            let ip: IpAddr = format!("100::{:x}", i + 1).parse().unwrap();
            NextHop::new(ip).with_weight(UCMP_DEFAULT_WEIGHT)
        })
        .collect()
}

fn make_prefix(offset: u32) -> IpPrefix {
    format!("2601:db00:2110:{:x}::/64", offset).parse().unwrap()
}

fn default_nhops() -> NextHopSet {
    make_nexthops(54)
}

/// Default set minus its first member.
fn variant_nhops() -> NextHopSet {
    let nhops = default_nhops();
    let first = *nhops.iter().next().unwrap();
    nhops.without(&first)
}

const ROUTER: RouterId = RouterId::DEFAULT;

/// Consolidator plus the last snapshot it consumed, seeded with ten routes
/// over the default next-hop set.
struct Fixture {
    state: Arc<RoutingSnapshot>,
    consolidator: EcmpGroupConsolidator,
}

impl Fixture {
    fn new() -> Self {
        let mut fixture = Self {
            state: Arc::new(RoutingSnapshot::with_routers([ROUTER])),
            consolidator: EcmpGroupConsolidator::new(),
        };
        let mut next = fixture.clone_state();
        for i in 0..10 {
            next.add_route(ROUTER, Route::resolved(make_prefix(i), default_nhops()))
                .unwrap();
        }
        fixture.consolidate(next);
        fixture
    }

    fn clone_state(&self) -> RoutingSnapshot {
        (*self.state).clone()
    }

    fn consolidate(&mut self, next: RoutingSnapshot) -> DeltaStats {
        let next = Arc::new(next);
        let stats = self
            .consolidator
            .consolidate(&StateDelta::new(&self.state, &next))
            .unwrap();
        self.state = next;
        stats
    }

    fn next_prefix(&self) -> IpPrefix {
        (0..u32::from(u16::MAX))
            .map(make_prefix)
            .find(|prefix| self.state.exact_match(ROUTER, prefix).is_none())
            .unwrap()
    }

    fn fib_size(&self) -> u32 {
        self.state.len(ROUTER, AddressFamily::V6) as u32
    }

    fn id_of(&self, nhops: &NextHopSet) -> Option<NextHopGroupId> {
        self.consolidator.nhops_to_id().get(nhops).copied()
    }

    fn usage(&self, id: NextHopGroupId) -> u32 {
        self.consolidator.population_of(id)
    }
}

fn id(n: u32) -> NextHopGroupId {
    NextHopGroupId::new(n)
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[test]
fn test_init() {
    let fixture = Fixture::new();
    assert_eq!(fixture.consolidator.nhops_to_id().len(), 1);
    assert_eq!(fixture.id_of(&default_nhops()), Some(id(1)));
    assert_eq!(fixture.usage(id(1)), fixture.fib_size());
    assert_eq!(fixture.fib_size(), 10);
}

#[test]
fn test_add_route_same_nhops() {
    let mut fixture = Fixture::new();
    let mut next = fixture.clone_state();
    next.add_route(ROUTER, Route::resolved(fixture.next_prefix(), default_nhops()))
        .unwrap();

    let stats = fixture.consolidate(next);
    assert_eq!(stats.routes_added, 1);
    assert_eq!(stats.groups_created, 0);
    assert_eq!(fixture.consolidator.nhops_to_id().len(), 1);
    assert_eq!(fixture.id_of(&default_nhops()), Some(id(1)));
    assert_eq!(fixture.usage(id(1)), 11);
}

#[test]
fn test_add_route_new_nhops() {
    let mut fixture = Fixture::new();
    let mut next = fixture.clone_state();
    next.add_route(ROUTER, Route::resolved(fixture.next_prefix(), variant_nhops()))
        .unwrap();

    fixture.consolidate(next);
    assert_eq!(fixture.consolidator.nhops_to_id().len(), 2);
    assert_eq!(fixture.id_of(&default_nhops()), Some(id(1)));
    assert_eq!(fixture.usage(id(1)), fixture.fib_size() - 1);
    assert_eq!(fixture.id_of(&variant_nhops()), Some(id(2)));
    assert_eq!(fixture.usage(id(2)), 1);
}

#[test]
fn test_add_remove_unresolved_route() {
    let mut fixture = Fixture::new();
    let prefix = fixture.next_prefix();
    let unresolved = Route::resolved(prefix, variant_nhops()).clear_forward();

    let mut next = fixture.clone_state();
    next.add_route(ROUTER, unresolved).unwrap();
    fixture.consolidate(next);

    // Unresolved routes never get an id.
    assert_eq!(fixture.id_of(&variant_nhops()), None);
    assert_eq!(fixture.usage(id(1)), 10);
    assert_eq!(fixture.fib_size(), 11);

    let mut next = fixture.clone_state();
    next.remove_route(ROUTER, &prefix).unwrap();
    let stats = fixture.consolidate(next);

    assert_eq!(stats.routes_removed, 1);
    assert_eq!(stats.groups_destroyed, 0);
    assert_eq!(fixture.consolidator.nhops_to_id().len(), 1);
    assert_eq!(fixture.id_of(&default_nhops()), Some(id(1)));
    assert_eq!(fixture.usage(id(1)), fixture.fib_size());
}

#[test]
fn test_update_route_nhops() {
    let mut fixture = Fixture::new();
    let mut next = fixture.clone_state();
    next.update_route(ROUTER, Route::resolved(make_prefix(0), variant_nhops()))
        .unwrap();

    let stats = fixture.consolidate(next);
    assert_eq!(stats.routes_changed, 1);
    assert_eq!(fixture.fib_size(), 10);
    assert_eq!(fixture.consolidator.nhops_to_id().len(), 2);
    assert_eq!(fixture.id_of(&default_nhops()), Some(id(1)));
    assert_eq!(fixture.id_of(&variant_nhops()), Some(id(2)));
    assert_eq!(fixture.usage(id(1)), 9);
    assert_eq!(fixture.usage(id(2)), 1);
}

#[test]
fn test_update_route_to_unresolved() {
    let mut fixture = Fixture::new();
    let updated = fixture
        .state
        .exact_match(ROUTER, &make_prefix(0))
        .unwrap()
        .clear_forward();

    let mut next = fixture.clone_state();
    next.update_route(ROUTER, updated).unwrap();
    fixture.consolidate(next);

    assert_eq!(fixture.fib_size(), 10);
    assert_eq!(fixture.consolidator.nhops_to_id().len(), 1);
    assert_eq!(fixture.id_of(&default_nhops()), Some(id(1)));
    assert_eq!(fixture.usage(id(1)), 9);
}

#[test]
fn test_unresolved_route_becomes_resolved() {
    let mut fixture = Fixture::new();
    let prefix = fixture.next_prefix();

    let mut next = fixture.clone_state();
    next.add_route(ROUTER, Route::unresolved(prefix)).unwrap();
    fixture.consolidate(next);
    assert_eq!(fixture.consolidator.group_count(), 1);

    let mut next = fixture.clone_state();
    next.update_route(ROUTER, Route::resolved(prefix, variant_nhops()))
        .unwrap();
    let stats = fixture.consolidate(next);

    assert_eq!(stats.groups_created, 1);
    assert_eq!(fixture.id_of(&variant_nhops()), Some(id(2)));
    assert_eq!(fixture.usage(id(2)), 1);
}

#[test]
fn test_variant_lifecycle_in_sequence() {
    let mut fixture = Fixture::new();

    let mut next = fixture.clone_state();
    next.add_route(ROUTER, Route::resolved(fixture.next_prefix(), default_nhops()))
        .unwrap();
    fixture.consolidate(next);
    assert_eq!(fixture.usage(id(1)), 11);

    let variant_prefix = fixture.next_prefix();
    let mut next = fixture.clone_state();
    next.add_route(ROUTER, Route::resolved(variant_prefix, variant_nhops()))
        .unwrap();
    fixture.consolidate(next);
    assert_eq!(fixture.usage(id(1)), 11);
    assert_eq!(fixture.usage(id(2)), 1);

    // The variant route loses its forwarding info: its group goes away.
    let mut next = fixture.clone_state();
    let unresolved = next
        .exact_match(ROUTER, &variant_prefix)
        .unwrap()
        .clear_forward();
    next.update_route(ROUTER, unresolved).unwrap();
    let stats = fixture.consolidate(next);
    assert_eq!(stats.groups_destroyed, 1);
    assert_eq!(fixture.id_of(&variant_nhops()), None);
    assert_eq!(fixture.usage(id(1)), 11);

    // Removing the unresolved route changes nothing.
    let mut next = fixture.clone_state();
    next.remove_route(ROUTER, &variant_prefix).unwrap();
    let stats = fixture.consolidate(next);
    assert_eq!(stats.groups_created + stats.groups_destroyed, 0);
    assert_eq!(fixture.consolidator.group_count(), 1);
    assert_eq!(fixture.usage(id(1)), 11);

    // One of the seeded routes moves to the variant set, which gets a fresh id.
    let mut next = fixture.clone_state();
    next.update_route(ROUTER, Route::resolved(make_prefix(0), variant_nhops()))
        .unwrap();
    fixture.consolidate(next);
    assert_eq!(fixture.usage(id(1)), 10);
    assert_eq!(fixture.id_of(&variant_nhops()), Some(id(3)));
    assert_eq!(fixture.usage(id(3)), 1);
}

// ============================================================================
// PROPERTIES
// ============================================================================

#[test]
fn test_ids_are_reclaimed_and_never_reused() {
    let mut fixture = Fixture::new();

    // Move every route to the variant set: the default group is released.
    let mut next = fixture.clone_state();
    for i in 0..10 {
        next.update_route(ROUTER, Route::resolved(make_prefix(i), variant_nhops()))
            .unwrap();
    }
    let stats = fixture.consolidate(next);
    assert_eq!(stats.groups_created, 1);
    assert_eq!(stats.groups_destroyed, 1);
    assert_eq!(fixture.id_of(&default_nhops()), None);
    assert_eq!(fixture.consolidator.next_hops(id(1)), None);
    assert_eq!(fixture.usage(id(1)), 0);
    assert_eq!(fixture.id_of(&variant_nhops()), Some(id(2)));
    assert_eq!(fixture.usage(id(2)), 10);

    // The default set comes back with a fresh id.
    let mut next = fixture.clone_state();
    next.update_route(ROUTER, Route::resolved(make_prefix(0), default_nhops()))
        .unwrap();
    fixture.consolidate(next);
    assert_eq!(fixture.id_of(&default_nhops()), Some(id(3)));
}

#[test]
fn test_remove_all_routes_releases_everything() {
    let mut fixture = Fixture::new();
    let mut next = fixture.clone_state();
    for i in 0..10 {
        next.remove_route(ROUTER, &make_prefix(i)).unwrap();
    }
    let stats = fixture.consolidate(next);

    assert_eq!(stats.routes_removed, 10);
    assert_eq!(stats.groups_destroyed, 1);
    assert_eq!(fixture.consolidator.group_count(), 0);
    assert_eq!(fixture.consolidator.tracked_route_count(), 0);
}

#[test]
fn test_member_order_does_not_matter() {
    let mut fixture = Fixture::new();
    let reversed: NextHopSet = {
        let mut members: Vec<NextHop> = default_nhops().iter().copied().collect();
        members.reverse();
        members.into()
    };

    let mut next = fixture.clone_state();
    next.add_route(ROUTER, Route::resolved(fixture.next_prefix(), reversed))
        .unwrap();
    fixture.consolidate(next);

    assert_eq!(fixture.consolidator.group_count(), 1);
    assert_eq!(fixture.usage(id(1)), 11);
}

#[test]
fn test_weight_distinguishes_sets() {
    let mut fixture = Fixture::new();
    let first = *default_nhops().iter().next().unwrap();
    let reweighted = default_nhops().without(&first).with(first.with_weight(3));

    let mut next = fixture.clone_state();
    next.add_route(ROUTER, Route::resolved(fixture.next_prefix(), reweighted.clone()))
        .unwrap();
    fixture.consolidate(next);

    assert_eq!(fixture.consolidator.group_count(), 2);
    assert_eq!(fixture.id_of(&reweighted), Some(id(2)));
}

#[test]
fn test_groups_shared_across_routers_and_families() {
    let mut consolidator = EcmpGroupConsolidator::new();
    let empty = RoutingSnapshot::new();
    let snapshot = parse_snapshot(
        r#"{ "routers": [
            { "router_id": 0, "routes": [
                { "prefix": "10.0.0.0/24", "next_hops": ["100::1", "100::2"] },
                { "prefix": "2601:db00::/64", "next_hops": ["100::2", "100::1"] }
            ] },
            { "router_id": 1, "routes": [
                { "prefix": "10.0.0.0/24", "next_hops": ["100::1", "100::2"] },
                { "prefix": "10.0.1.0/24", "next_hops": ["10.1.1.1"] },
                { "prefix": "10.0.2.0/24" }
            ] }
        ] }"#,
    )
    .unwrap();

    let stats = consolidator
        .consolidate(&StateDelta::new(&empty, &snapshot))
        .unwrap();
    assert_eq!(stats.routes_added, 5);
    assert_eq!(stats.groups_created, 2);

    let shared: NextHopSet = "100::1,100::2".parse().unwrap();
    let shared_id = consolidator.lookup(&shared).unwrap();
    assert_eq!(consolidator.population_of(shared_id), 3);

    // Dropping a whole router releases only what it alone used.
    let mut next = snapshot.clone();
    next.remove_router(RouterId(1)).unwrap();
    let stats = consolidator
        .consolidate(&StateDelta::new(&snapshot, &next))
        .unwrap();
    assert_eq!(stats.routes_removed, 3);
    assert_eq!(stats.groups_destroyed, 1);
    assert_eq!(consolidator.population_of(shared_id), 2);
    assert_eq!(consolidator.lookup(&"10.1.1.1".parse().unwrap()), None);
}

#[test]
fn test_order_of_deltas_converges() {
    // Reaching the same snapshot through different intermediate states
    // yields the same populations per next-hop set.
    let target = parse_snapshot(
        r#"{ "routers": [ { "router_id": 0, "routes": [
            { "prefix": "10.0.0.0/24", "next_hops": ["10.1.1.1", "10.1.1.2"] },
            { "prefix": "10.0.1.0/24", "next_hops": ["10.1.1.1"] },
            { "prefix": "10.0.2.0/24", "next_hops": ["10.1.1.1", "10.1.1.2"] }
        ] } ] }"#,
    )
    .unwrap();
    let detour = parse_snapshot(
        r#"{ "routers": [ { "router_id": 0, "routes": [
            { "prefix": "10.0.0.0/24", "next_hops": ["10.1.1.3"] },
            { "prefix": "10.0.1.0/24", "next_hops": ["10.1.1.1", "10.1.1.2"] }
        ] } ] }"#,
    )
    .unwrap();
    let empty = RoutingSnapshot::new();

    let mut direct = EcmpGroupConsolidator::new();
    direct.consolidate(&StateDelta::new(&empty, &target)).unwrap();

    let mut indirect = EcmpGroupConsolidator::new();
    indirect.consolidate(&StateDelta::new(&empty, &detour)).unwrap();
    indirect.consolidate(&StateDelta::new(&detour, &target)).unwrap();

    let populations = |c: &EcmpGroupConsolidator| {
        let mut groups: Vec<_> = c
            .export()
            .into_iter()
            .map(|g| (g.next_hops.to_string(), g.population))
            .collect();
        groups.sort();
        groups
    };
    assert_eq!(populations(&direct), populations(&indirect));
    assert_eq!(
        populations(&direct),
        vec![
            ("10.1.1.1".to_string(), 1),
            ("10.1.1.1,10.1.1.2".to_string(), 2),
        ]
    );
}

#[test]
fn test_handle_replays_snapshots() {
    let handle = ConsolidatorHandle::new(&ConsolidatorConfig::enabled());
    let fixture = Fixture::new();

    handle.publish(Arc::clone(&fixture.state)).unwrap();
    assert_eq!(handle.group_count(), 1);
    assert_eq!(handle.population_of(id(1)), 10);

    let export = handle.export();
    assert_eq!(export.len(), 1);
    assert_eq!(export[0].next_hops, default_nhops());

    handle
        .publish(Arc::new(RoutingSnapshot::with_routers([ROUTER])))
        .unwrap();
    assert_eq!(handle.group_count(), 0);
}
