//! Error types for the ECMP group consolidator.

use thiserror::Error;

use crate::consolidator::NextHopGroupId;
use crate::route::{IpPrefix, NextHopSet, RouterId};

/// Errors raised by the consolidator, the routing snapshot and their loaders.
#[derive(Error, Debug)]
pub enum ConsolidatorError {
    /// A route was withdrawn while its group population was already zero.
    #[error("Population underflow for next-hop group {0}")]
    PopulationUnderflow(NextHopGroupId),

    /// A resolved route was withdrawn but its next-hop set has no group id.
    #[error("No group id for next-hop set [{0}]")]
    MissingGroupId(NextHopSet),

    /// A group id was destroyed or queried that the table never issued.
    #[error("Next-hop group {0} not found")]
    GroupIdNotFound(NextHopGroupId),

    /// The id table and the population tracker disagree on membership.
    #[error("Id table and population tracker disagree on group {0}")]
    TableTrackerMismatch(NextHopGroupId),

    /// Every `u32` group id has been handed out.
    #[error("Next-hop group id space exhausted")]
    GroupIdExhausted,

    #[error("Route {1} already exists in router {0}")]
    RouteExists(RouterId, IpPrefix),

    #[error("Route {1} not found in router {0}")]
    RouteNotFound(RouterId, IpPrefix),

    #[error("Router {0} not found")]
    RouterNotFound(RouterId),

    #[error("Invalid IP prefix: {0}")]
    InvalidPrefix(String),

    #[error("Invalid next-hop: {0}")]
    InvalidNextHop(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConsolidatorError {
    /// Returns true for bookkeeping defects that must abort a delta.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::PopulationUnderflow(_)
                | Self::MissingGroupId(_)
                | Self::GroupIdNotFound(_)
                | Self::TableTrackerMismatch(_)
        )
    }
}

/// Result type for consolidator operations.
pub type Result<T> = std::result::Result<T, ConsolidatorError>;
