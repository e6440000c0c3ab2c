//! Next-hop group id table.
//!
//! Maps each distinct next-hop set in use to a stable id and back. Both
//! directions change only through [`GroupIdTable::get_or_create`] and
//! [`GroupIdTable::destroy`], so they can never drift apart.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{ConsolidatorError, Result};
use crate::route::NextHopSet;

/// Identifier of a distinct next-hop set.
///
/// Ids start at 1 and are never reused within the lifetime of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NextHopGroupId(u32);

impl NextHopGroupId {
    /// The first id a table hands out.
    pub const FIRST: NextHopGroupId = NextHopGroupId(1);

    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for NextHopGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bidirectional next-hop set ↔ group id mapping with a monotonic allocator.
#[derive(Debug, Clone)]
pub struct GroupIdTable {
    nhops_to_id: HashMap<NextHopSet, NextHopGroupId>,
    id_to_nhops: HashMap<NextHopGroupId, NextHopSet>,
    next_id: NextHopGroupId,
}

impl GroupIdTable {
    /// Creates an empty table whose first id will be 1.
    pub fn new() -> Self {
        Self::starting_at(NextHopGroupId::FIRST)
    }

    pub(crate) fn starting_at(next_id: NextHopGroupId) -> Self {
        Self {
            nhops_to_id: HashMap::new(),
            id_to_nhops: HashMap::new(),
            next_id,
        }
    }

    /// Returns the id of a next-hop set, if any resolved route uses it.
    pub fn lookup(&self, nhops: &NextHopSet) -> Option<NextHopGroupId> {
        self.nhops_to_id.get(nhops).copied()
    }

    /// Returns the next-hop set behind an id.
    pub fn next_hops(&self, id: NextHopGroupId) -> Option<&NextHopSet> {
        self.id_to_nhops.get(&id)
    }

    /// Returns the existing id for `nhops`, or allocates the next one.
    ///
    /// Returns `(id, created)`.
    pub fn get_or_create(&mut self, nhops: &NextHopSet) -> Result<(NextHopGroupId, bool)> {
        if let Some(id) = self.lookup(nhops) {
            return Ok((id, false));
        }

        let id = self.next_id;
        let following = id
            .0
            .checked_add(1)
            .ok_or(ConsolidatorError::GroupIdExhausted)?;
        self.next_id = NextHopGroupId(following);

        self.nhops_to_id.insert(nhops.clone(), id);
        self.id_to_nhops.insert(id, nhops.clone());

        debug!(
            "GroupIdTable: Allocated group {} for {} next-hops",
            id,
            nhops.len()
        );
        Ok((id, true))
    }

    /// Removes both directions of an id's mapping, returning its next-hop set.
    ///
    /// Only the population tracker calls this, when a population reaches zero.
    pub(crate) fn destroy(&mut self, id: NextHopGroupId) -> Result<NextHopSet> {
        let nhops = self
            .id_to_nhops
            .remove(&id)
            .ok_or(ConsolidatorError::GroupIdNotFound(id))?;
        self.nhops_to_id.remove(&nhops);

        debug!("GroupIdTable: Released group {}", id);
        Ok(nhops)
    }

    /// Returns the next-hop set → id mapping.
    pub fn nhops_to_id(&self) -> &HashMap<NextHopSet, NextHopGroupId> {
        &self.nhops_to_id
    }

    /// Returns an iterator over (id, next-hop set) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (NextHopGroupId, &NextHopSet)> {
        self.id_to_nhops.iter().map(|(id, nhops)| (*id, nhops))
    }

    /// Returns the id the next new next-hop set will receive.
    pub fn next_id(&self) -> NextHopGroupId {
        self.next_id
    }

    /// Returns the number of ids in use.
    pub fn len(&self) -> usize {
        self.id_to_nhops.len()
    }

    /// Returns true if no id is in use.
    pub fn is_empty(&self) -> bool {
        self.id_to_nhops.is_empty()
    }
}

impl Default for GroupIdTable {
    fn default() -> Self {
        Self::new()
    }
}
