//! EcmpGroupConsolidator implementation.
//!
//! Applies routing snapshot deltas to the group id table and the population
//! tracker. A delta is applied to a staged copy of both structures and only
//! committed once every route change in it has been accounted for, so a
//! delta that trips an invariant leaves the previous state untouched.

use log::{debug, error, info, warn};
use serde::Serialize;
use std::collections::HashMap;

use super::id_table::{GroupIdTable, NextHopGroupId};
use super::tracker::{Population, PopulationTracker};
use crate::config::ConsolidatorConfig;
use crate::error::{ConsolidatorError, Result};
use crate::route::{NextHopSet, Route};
use crate::state::{MapChange, RouteChange, RouteDelta, StateDelta};

/// Counters describing one applied delta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeltaStats {
    pub routes_added: usize,
    pub routes_removed: usize,
    pub routes_changed: usize,
    pub groups_created: usize,
    pub groups_destroyed: usize,
}

/// One group in an export of the consolidator state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupExport {
    pub id: NextHopGroupId,
    pub population: Population,
    pub next_hops: NextHopSet,
}

/// Id table and tracker, always mutated together.
#[derive(Debug, Clone, Default)]
struct GroupState {
    table: GroupIdTable,
    tracker: PopulationTracker,
}

impl GroupState {
    fn add_route(&mut self, nhops: &NextHopSet, stats: &mut DeltaStats) -> Result<()> {
        let (id, created) = self.table.get_or_create(nhops)?;
        if created {
            stats.groups_created += 1;
        }
        self.tracker.increment(id);
        Ok(())
    }

    fn remove_route(&mut self, nhops: &NextHopSet, stats: &mut DeltaStats) -> Result<()> {
        let id = self
            .table
            .lookup(nhops)
            .ok_or_else(|| ConsolidatorError::MissingGroupId(nhops.clone()))?;
        if self.tracker.decrement(id, &mut self.table)? == 0 {
            stats.groups_destroyed += 1;
        }
        Ok(())
    }

    fn apply(&mut self, change: RouteChange<'_>, stats: &mut DeltaStats) -> Result<()> {
        match change {
            MapChange::Added(route) => {
                stats.routes_added += 1;
                if let Some(nhops) = route.next_hops() {
                    self.add_route(nhops, stats)?;
                }
            }
            MapChange::Removed(route) => {
                stats.routes_removed += 1;
                if let Some(nhops) = route.next_hops() {
                    self.remove_route(nhops, stats)?;
                }
            }
            MapChange::Changed { old, new } => {
                stats.routes_changed += 1;
                self.apply_changed(old, new, stats)?;
            }
        }
        Ok(())
    }

    /// A changed route releases its old group before joining the new one.
    fn apply_changed(&mut self, old: &Route, new: &Route, stats: &mut DeltaStats) -> Result<()> {
        match (old.next_hops(), new.next_hops()) {
            (None, None) => Ok(()),
            (Some(old_nhops), Some(new_nhops)) if old_nhops == new_nhops => Ok(()),
            (old_nhops, new_nhops) => {
                if let Some(nhops) = old_nhops {
                    self.remove_route(nhops, stats)?;
                }
                if let Some(nhops) = new_nhops {
                    self.add_route(nhops, stats)?;
                }
                Ok(())
            }
        }
    }

    /// Checks that the table and the tracker agree on every group.
    fn verify(&self) -> Result<()> {
        if self.table.len() != self.tracker.len() {
            let stray = self
                .table
                .iter()
                .map(|(id, _)| id)
                .find(|id| self.tracker.population_of(*id) == 0)
                .or_else(|| {
                    self.tracker
                        .iter()
                        .map(|(id, _)| id)
                        .find(|id| self.table.next_hops(*id).is_none())
                });
            // Unequal sizes always leave at least one id on one side only.
            return Err(ConsolidatorError::TableTrackerMismatch(
                stray.unwrap_or(NextHopGroupId::FIRST),
            ));
        }

        match self
            .tracker
            .iter()
            .find(|(id, _)| self.table.next_hops(*id).is_none())
        {
            Some((id, _)) => Err(ConsolidatorError::TableTrackerMismatch(id)),
            None => Ok(()),
        }
    }
}

/// EcmpGroupConsolidator - assigns ids to distinct next-hop sets and counts
/// the resolved routes using each of them.
#[derive(Debug, Clone, Default)]
pub struct EcmpGroupConsolidator {
    state: GroupState,
    max_ecmp_groups: Option<u32>,
}

impl EcmpGroupConsolidator {
    /// Creates an empty consolidator with no group limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty consolidator using the limits in `config`.
    pub fn from_config(config: &ConsolidatorConfig) -> Self {
        Self {
            state: GroupState::default(),
            max_ecmp_groups: config.max_ecmp_groups,
        }
    }

    /// Applies every route change between the delta's two snapshots.
    ///
    /// On error nothing is committed; the state stays as it was after the
    /// previous successful call.
    ///
    /// Staging clones the whole group state and the consistency check walks
    /// every group, so even a one-route delta costs O(groups). Group counts
    /// are bounded by the hardware ECMP table, which keeps this small.
    pub fn consolidate(&mut self, delta: &StateDelta<'_>) -> Result<DeltaStats> {
        let mut staged = self.state.clone();
        let mut stats = DeltaStats::default();

        for RouteDelta {
            router_id,
            prefix,
            change,
            ..
        } in delta.route_deltas()
        {
            if let Err(e) = staged.apply(change, &mut stats) {
                error!(
                    "EcmpGroupConsolidator: Rejecting delta at router {} prefix {}: {}",
                    router_id, prefix, e
                );
                return Err(e);
            }
        }

        if let Err(e) = staged.verify() {
            error!("EcmpGroupConsolidator: Rejecting delta: {}", e);
            return Err(e);
        }

        self.state = staged;
        self.check_capacity();

        if stats == DeltaStats::default() {
            debug!("EcmpGroupConsolidator: Delta had no route changes");
        } else {
            info!(
                "EcmpGroupConsolidator: Applied delta (+{} -{} ~{} routes, +{} -{} groups), {} groups in use",
                stats.routes_added,
                stats.routes_removed,
                stats.routes_changed,
                stats.groups_created,
                stats.groups_destroyed,
                self.group_count()
            );
        }

        Ok(stats)
    }

    fn check_capacity(&self) {
        if let Some(limit) = self.max_ecmp_groups {
            let in_use = self.group_count();
            if in_use > limit as usize {
                warn!(
                    "EcmpGroupConsolidator: {} distinct ECMP groups exceed limit {}",
                    in_use, limit
                );
            }
        }
    }

    /// Returns the id of a next-hop set, if any resolved route uses it.
    pub fn lookup(&self, nhops: &NextHopSet) -> Option<NextHopGroupId> {
        self.state.table.lookup(nhops)
    }

    /// Returns the number of resolved routes using a group.
    pub fn population_of(&self, id: NextHopGroupId) -> Population {
        self.state.tracker.population_of(id)
    }

    /// Returns the next-hop set behind an id.
    pub fn next_hops(&self, id: NextHopGroupId) -> Option<&NextHopSet> {
        self.state.table.next_hops(id)
    }

    /// Returns the full next-hop set → id mapping.
    pub fn nhops_to_id(&self) -> &HashMap<NextHopSet, NextHopGroupId> {
        self.state.table.nhops_to_id()
    }

    /// Returns the number of distinct groups in use.
    pub fn group_count(&self) -> usize {
        self.state.table.len()
    }

    /// Returns the number of resolved routes tracked across all groups.
    pub fn tracked_route_count(&self) -> u64 {
        self.state.tracker.total()
    }

    /// Returns the configured group limit.
    pub fn max_ecmp_groups(&self) -> Option<u32> {
        self.max_ecmp_groups
    }

    /// Returns true if more distinct groups are in use than the limit allows.
    pub fn is_over_capacity(&self) -> bool {
        self.max_ecmp_groups
            .is_some_and(|limit| self.group_count() > limit as usize)
    }

    /// Returns every group with its population, ordered by id.
    pub fn export(&self) -> Vec<GroupExport> {
        let mut groups: Vec<_> = self
            .state
            .table
            .iter()
            .map(|(id, nhops)| GroupExport {
                id,
                population: self.state.tracker.population_of(id),
                next_hops: nhops.clone(),
            })
            .collect();
        groups.sort_by_key(|group| group.id);
        groups
    }
}
