//! Per-group route population tracking.
//!
//! A population is the number of resolved routes that forward over a group.
//! Zero is never stored: a group without an entry has population zero, and
//! the entry is dropped together with the group's id the moment the last
//! route leaves.

use log::debug;
use std::collections::HashMap;

use super::id_table::{GroupIdTable, NextHopGroupId};
use crate::error::{ConsolidatorError, Result};

/// Number of resolved routes referencing a group.
pub type Population = u32;

/// Route population per group id.
#[derive(Debug, Clone, Default)]
pub struct PopulationTracker {
    populations: HashMap<NextHopGroupId, Population>,
}

impl PopulationTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one route to a group and returns the new population.
    pub fn increment(&mut self, id: NextHopGroupId) -> Population {
        let population = self.populations.entry(id).or_insert(0);
        *population += 1;
        *population
    }

    /// Removes one route from a group and returns the new population.
    ///
    /// At zero the entry is dropped and the id is destroyed in `table`.
    /// Decrementing a group that has no routes is a bookkeeping defect and
    /// fails without touching either structure.
    pub fn decrement(&mut self, id: NextHopGroupId, table: &mut GroupIdTable) -> Result<Population> {
        let population = self
            .populations
            .get_mut(&id)
            .ok_or(ConsolidatorError::PopulationUnderflow(id))?;

        *population -= 1;
        let remaining = *population;
        if remaining == 0 {
            self.populations.remove(&id);
            table.destroy(id)?;
            debug!("PopulationTracker: Group {} has no routes left", id);
        }

        Ok(remaining)
    }

    /// Returns the population of a group, 0 if it has none.
    pub fn population_of(&self, id: NextHopGroupId) -> Population {
        self.populations.get(&id).copied().unwrap_or(0)
    }

    /// Returns an iterator over (id, population) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (NextHopGroupId, Population)> + '_ {
        self.populations.iter().map(|(id, count)| (*id, *count))
    }

    /// Returns the sum of all populations, i.e. the resolved routes tracked.
    pub fn total(&self) -> u64 {
        self.populations.values().map(|count| u64::from(*count)).sum()
    }

    /// Returns the number of groups with a non-zero population.
    pub fn len(&self) -> usize {
        self.populations.len()
    }

    /// Returns true if no group has routes.
    pub fn is_empty(&self) -> bool {
        self.populations.is_empty()
    }
}
