//! Next-hop set: the canonical key of an ECMP group.
//!
//! The set is stored sorted and deduplicated, so two sets built from the
//! same (address, weight) pairs in any order compare, hash and order
//! identically. That makes the set its own canonical key for the group id
//! table; no separate key type is needed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::nexthop::NextHop;
use crate::error::ConsolidatorError;

/// An immutable, canonically ordered set of weighted next-hops.
///
/// Members sit behind an `Arc`, so cloning a set (which the id table does
/// for both map directions) never copies the members.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Vec<NextHop>", into = "Vec<NextHop>")]
pub struct NextHopSet {
    nexthops: Arc<BTreeSet<NextHop>>,
}

impl NextHopSet {
    /// Creates an empty next-hop set.
    pub fn new() -> Self {
        Self {
            nexthops: Arc::new(BTreeSet::new()),
        }
    }

    /// Creates a next-hop set from next-hops given in any order.
    pub fn from_nexthops(nexthops: impl IntoIterator<Item = NextHop>) -> Self {
        Self {
            nexthops: Arc::new(nexthops.into_iter().collect()),
        }
    }

    /// Returns a copy of this set with `nexthop` added.
    pub fn with(&self, nexthop: NextHop) -> Self {
        let mut nexthops = (*self.nexthops).clone();
        nexthops.insert(nexthop);
        Self {
            nexthops: Arc::new(nexthops),
        }
    }

    /// Returns a copy of this set with `nexthop` removed.
    pub fn without(&self, nexthop: &NextHop) -> Self {
        let mut nexthops = (*self.nexthops).clone();
        nexthops.remove(nexthop);
        Self {
            nexthops: Arc::new(nexthops),
        }
    }

    /// Returns true if the set contains the given next-hop.
    pub fn contains(&self, nexthop: &NextHop) -> bool {
        self.nexthops.contains(nexthop)
    }

    /// Returns the number of next-hops in the set.
    pub fn len(&self) -> usize {
        self.nexthops.len()
    }

    /// Returns true if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.nexthops.is_empty()
    }

    /// Returns true if this is an ECMP group (more than one next-hop).
    pub fn is_ecmp(&self) -> bool {
        self.nexthops.len() > 1
    }

    /// Returns an iterator over the next-hops in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &NextHop> {
        self.nexthops.iter()
    }
}

impl Default for NextHopSet {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<NextHop> for NextHopSet {
    fn from_iter<I: IntoIterator<Item = NextHop>>(iter: I) -> Self {
        Self::from_nexthops(iter)
    }
}

impl From<Vec<NextHop>> for NextHopSet {
    fn from(nexthops: Vec<NextHop>) -> Self {
        Self::from_nexthops(nexthops)
    }
}

impl From<NextHopSet> for Vec<NextHop> {
    fn from(set: NextHopSet) -> Self {
        set.iter().copied().collect()
    }
}

impl fmt::Display for NextHopSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nexthops: Vec<_> = self.nexthops.iter().map(|nh| nh.to_string()).collect();
        write!(f, "{}", nexthops.join(","))
    }
}

impl FromStr for NextHopSet {
    type Err = ConsolidatorError;

    /// Parses a next-hop set from a comma-separated string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Self::new());
        }

        s.split(',')
            .map(|part| part.trim().parse::<NextHop>())
            .collect::<Result<BTreeSet<_>, _>>()
            .map(|nexthops| Self {
                nexthops: Arc::new(nexthops),
            })
    }
}
