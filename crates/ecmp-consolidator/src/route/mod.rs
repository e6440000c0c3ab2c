//! Route model observed by the consolidator.
//!
//! - [`IpPrefix`] / [`AddressFamily`]: routing table keys
//! - [`NextHop`]: one weighted member of an ECMP group
//! - [`NextHopSet`]: canonical, order-independent group key
//! - [`Route`]: a prefix with optional resolved forwarding info

mod nexthop;
mod nhg;
mod prefix;
mod types;

pub use nexthop::{NextHop, NextHopWeight, UCMP_DEFAULT_WEIGHT};
pub use nhg::NextHopSet;
pub use prefix::{AddressFamily, IpPrefix};
pub use types::{AdminDistance, Route, RouterId};
