//! Shared, feature-gated access to the consolidator.
//!
//! The routing pipeline publishes each new snapshot through the handle; the
//! consolidator diffs it against the last snapshot it accepted. Readers
//! take a shared lock and always observe the state of a complete delta.

use log::{info, warn};
use parking_lot::RwLock;
use std::sync::Arc;

use super::id_table::NextHopGroupId;
use super::orch::{DeltaStats, EcmpGroupConsolidator, GroupExport};
use super::tracker::Population;
use crate::config::ConsolidatorConfig;
use crate::error::Result;
use crate::route::NextHopSet;
use crate::state::{RoutingSnapshot, StateDelta};

#[derive(Debug)]
struct Inner {
    consolidator: EcmpGroupConsolidator,
    baseline: Arc<RoutingSnapshot>,
}

/// Cloneable handle to an optional consolidator.
///
/// When `consolidate_ecmp_groups` is off there is no consolidator at all:
/// publishing is a no-op and every query answers as if no group existed.
#[derive(Debug, Clone)]
pub struct ConsolidatorHandle {
    inner: Option<Arc<RwLock<Inner>>>,
}

impl ConsolidatorHandle {
    pub fn new(config: &ConsolidatorConfig) -> Self {
        let inner = if config.consolidate_ecmp_groups {
            info!(
                "ConsolidatorHandle: ECMP group consolidation enabled (limit: {})",
                config
                    .max_ecmp_groups
                    .map_or_else(|| "none".to_string(), |limit| limit.to_string())
            );
            Some(Arc::new(RwLock::new(Inner {
                consolidator: EcmpGroupConsolidator::from_config(config),
                baseline: Arc::new(RoutingSnapshot::new()),
            })))
        } else {
            info!("ConsolidatorHandle: ECMP group consolidation disabled");
            None
        };
        Self { inner }
    }

    /// Returns a handle with consolidation off.
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Applies the delta from the last accepted snapshot to `snapshot`.
    ///
    /// Returns `Ok(None)` when consolidation is disabled. On error the
    /// baseline is kept, so the next publish is diffed against the last
    /// snapshot that was applied successfully.
    pub fn publish(&self, snapshot: Arc<RoutingSnapshot>) -> Result<Option<DeltaStats>> {
        let Some(inner) = &self.inner else {
            return Ok(None);
        };

        let mut guard = inner.write();
        let Inner {
            consolidator,
            baseline,
        } = &mut *guard;

        if Arc::ptr_eq(baseline, &snapshot) {
            return Ok(Some(DeltaStats::default()));
        }

        let result = consolidator.consolidate(&StateDelta::new(&**baseline, &snapshot));
        match result {
            Ok(stats) => {
                *baseline = snapshot;
                Ok(Some(stats))
            }
            Err(e) => {
                warn!("ConsolidatorHandle: Keeping previous snapshot as baseline");
                Err(e)
            }
        }
    }

    /// Runs `f` under the read lock. Returns `None` when disabled.
    pub fn read<R>(&self, f: impl FnOnce(&EcmpGroupConsolidator) -> R) -> Option<R> {
        self.inner.as_ref().map(|inner| f(&inner.read().consolidator))
    }

    pub fn lookup(&self, nhops: &NextHopSet) -> Option<NextHopGroupId> {
        self.read(|c| c.lookup(nhops)).flatten()
    }

    pub fn population_of(&self, id: NextHopGroupId) -> Population {
        self.read(|c| c.population_of(id)).unwrap_or(0)
    }

    pub fn group_count(&self) -> usize {
        self.read(|c| c.group_count()).unwrap_or(0)
    }

    /// Returns every group ordered by id; empty when disabled.
    pub fn export(&self) -> Vec<GroupExport> {
        self.read(|c| c.export()).unwrap_or_default()
    }

    /// Returns the last snapshot that was applied successfully.
    pub fn baseline(&self) -> Option<Arc<RoutingSnapshot>> {
        self.inner
            .as_ref()
            .map(|inner| Arc::clone(&inner.read().baseline))
    }
}
