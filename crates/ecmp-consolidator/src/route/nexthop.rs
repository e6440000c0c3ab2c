//! Next-hop key.
//!
//! A next-hop is one member of an ECMP group: a destination address and the
//! weight traffic is spread with.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use crate::error::{ConsolidatorError, Result};

/// Weight of a next-hop within its group.
pub type NextHopWeight = u32;

/// Weight used when none is given.
pub const UCMP_DEFAULT_WEIGHT: NextHopWeight = 1;

/// A single weighted next-hop.
///
/// Unlike interface-bound keys, equality, hashing and ordering all include
/// the weight: the same address with two different weights is two distinct
/// members, and therefore yields two distinct groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NextHop {
    address: IpAddr,
    weight: NextHopWeight,
}

impl NextHop {
    /// Creates a next-hop with the default weight.
    pub fn new(address: IpAddr) -> Self {
        Self {
            address,
            weight: UCMP_DEFAULT_WEIGHT,
        }
    }

    /// Creates a next-hop with weight.
    pub fn with_weight(mut self, weight: NextHopWeight) -> Self {
        self.weight = weight;
        self
    }

    /// Returns the IP address.
    pub fn address(&self) -> &IpAddr {
        &self.address
    }

    /// Returns the weight.
    pub fn weight(&self) -> NextHopWeight {
        self.weight
    }
}

impl From<IpAddr> for NextHop {
    fn from(address: IpAddr) -> Self {
        Self::new(address)
    }
}

impl fmt::Display for NextHop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.weight == UCMP_DEFAULT_WEIGHT {
            write!(f, "{}", self.address)
        } else {
            write!(f, "{}@{}", self.address, self.weight)
        }
    }
}

impl FromStr for NextHop {
    type Err = ConsolidatorError;

    /// Parses a next-hop from string.
    ///
    /// Formats supported:
    /// - `ip` - default weight
    /// - `ip@weight` - weighted next-hop
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();

        let (ip_part, weight) = match s.split_once('@') {
            Some((ip_part, weight_str)) => {
                let weight = weight_str.parse().map_err(|_| {
                    ConsolidatorError::InvalidNextHop(format!("Invalid weight: {}", weight_str))
                })?;
                (ip_part, weight)
            }
            None => (s, UCMP_DEFAULT_WEIGHT),
        };

        let address: IpAddr = ip_part.parse().map_err(|_| {
            ConsolidatorError::InvalidNextHop(format!("Invalid IP address: {}", ip_part))
        })?;

        Ok(Self::new(address).with_weight(weight))
    }
}

impl TryFrom<String> for NextHop {
    type Error = ConsolidatorError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<NextHop> for String {
    fn from(nexthop: NextHop) -> Self {
        nexthop.to_string()
    }
}
