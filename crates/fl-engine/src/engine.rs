//! The `Engine`: one shared road model, many concurrent requests.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

use fl_core::{EngineConfig, GeoPoint};
use fl_coverage::{CoveragePlan, CoverageRoutePlanner, PolicyStore, PolicyTable};
use fl_spatial::{
    load_risk_or_empty, RiskAwareRouter, RoadNetwork, RoadNetworkBuilder, RouteQuery, RouteReport,
    SpatialError, TravelMode,
};

use crate::{EngineError, EngineResult};

/// Observable lifecycle of the road model.
///
/// ```text
///   Loading ──install──▶ Ready
///      │
///      └──mark_failed──▶ Failed
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Readiness {
    Loading,
    Ready,
    Failed(String),
}

enum Model {
    Loading,
    Ready(Arc<RoadNetwork>),
    Failed(String),
}

/// Navigation and coverage planning over a shared, immutable road model.
///
/// `Engine` is `Send + Sync`; wrap it in an `Arc` to serve requests from
/// several threads.  Every request works on an `Arc` snapshot of the
/// network and keeps its own rollout state.
pub struct Engine {
    config:   EngineConfig,
    model:    RwLock<Model>,
    policies: PolicyStore,
    router:   RiskAwareRouter,
    planner:  CoverageRoutePlanner,
}

impl Engine {
    /// Validate `config` and create an engine in [`Readiness::Loading`].
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self {
            policies: PolicyStore::new(config.policy_dir.clone()),
            router:   RiskAwareRouter::new(config.thresholds),
            planner:  CoverageRoutePlanner::new(config.coverage.clone()),
            model:    RwLock::new(Model::Loading),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn readiness(&self) -> Readiness {
        match &*self.model.read().unwrap_or_else(PoisonError::into_inner) {
            Model::Loading => Readiness::Loading,
            Model::Ready(_) => Readiness::Ready,
            Model::Failed(reason) => Readiness::Failed(reason.clone()),
        }
    }

    /// Build the network from `builder` and install it.  See [`install`](Self::install).
    pub fn load(&self, builder: RoadNetworkBuilder) -> EngineResult<Arc<RoadNetwork>> {
        let network = contain("network build", || Ok(builder.build()))
            .inspect_err(|e| self.mark_failed(e.to_string()))?;
        self.install(network)
    }

    /// Attach risk scores to `network` and make it the served model.
    ///
    /// A missing or unconfigured risk dataset is not an error: the model is
    /// installed with every score at 0 and a degraded-mode warning is
    /// logged.  An unreadable dataset marks the engine as failed.
    pub fn install(&self, mut network: RoadNetwork) -> EngineResult<Arc<RoadNetwork>> {
        let table = match load_risk_or_empty(self.config.risk_csv.as_deref()) {
            Ok(t) => t,
            Err(e) => {
                let reason = format!("risk dataset: {e}");
                self.mark_failed(reason.clone());
                return Err(EngineError::Failed(reason));
            }
        };
        let matched = network.apply_risk(&table);

        let network = Arc::new(network);
        *self.model.write().unwrap_or_else(PoisonError::into_inner) =
            Model::Ready(Arc::clone(&network));
        log::info!(
            "road model ready: {} nodes, {} edges, {matched} edges with risk data",
            network.node_count(),
            network.edge_count()
        );
        Ok(network)
    }

    /// Record that model construction failed.  Requests then report
    /// [`EngineError::Failed`].
    pub fn mark_failed(&self, reason: impl Into<String>) {
        let reason = reason.into();
        log::error!("road model construction failed: {reason}");
        *self.model.write().unwrap_or_else(PoisonError::into_inner) = Model::Failed(reason);
    }

    /// Snapshot of the served network.
    pub fn network(&self) -> EngineResult<Arc<RoadNetwork>> {
        match &*self.model.read().unwrap_or_else(PoisonError::into_inner) {
            Model::Loading => Err(EngineError::NotReady),
            Model::Ready(n) => Ok(Arc::clone(n)),
            Model::Failed(reason) => Err(EngineError::Failed(reason.clone())),
        }
    }

    /// Register a policy table built in process, bypassing the policy
    /// directory.
    pub fn insert_policy(&self, table: PolicyTable) {
        self.policies.insert(table);
    }

    /// Route between two coordinates.
    ///
    /// `Ok(None)` means the destination cannot be reached (or there are no
    /// roads to snap to).
    pub fn find_path(
        &self,
        start: GeoPoint,
        end:   GeoPoint,
        mode:  TravelMode,
    ) -> EngineResult<Option<RouteReport>> {
        let network = self.network()?;
        contain("route request", || {
            match self.router.find_path(&network, start, end, mode) {
                Ok(report) => Ok(Some(report)),
                Err(SpatialError::NoRoute { from, to }) => {
                    log::debug!("no {mode} route from {from} to {to}");
                    Ok(None)
                }
                Err(SpatialError::EmptyNetwork) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    /// Answer a batch of route queries, one result per query in input order.
    pub fn find_paths(
        &self,
        queries: &[RouteQuery],
    ) -> EngineResult<Vec<EngineResult<Option<RouteReport>>>> {
        let network = self.network()?;
        contain("batch route request", || {
            Ok(self
                .router
                .find_paths(&network, queries)
                .into_iter()
                .map(|r| match r {
                    Ok(report) => Ok(Some(report)),
                    Err(SpatialError::NoRoute { .. } | SpatialError::EmptyNetwork) => Ok(None),
                    Err(e) => Err(e.into()),
                })
                .collect())
        })
    }

    /// Plan a plow route covering the streets around `start`.
    ///
    /// The policy for `subdivision` is resolved first; without one no
    /// planning is attempted.  The rollout then runs on the subgraph within
    /// the configured radius of `start`, starting at the node nearest to it.
    pub fn plan_coverage(&self, subdivision: &str, start: GeoPoint) -> EngineResult<CoveragePlan> {
        let network = self.network()?;
        contain("coverage request", || {
            let policy = self.policies.get(subdivision)?;

            let radius = self.config.coverage.radius_m;
            let area = network.subgraph_within(start, radius);
            let Some(origin) = area.snap_to_node(start) else {
                return Err(EngineError::InvalidRequest(format!(
                    "no road node within {radius} m of {start}"
                )));
            };
            log::debug!(
                "coverage for {subdivision:?}: {} nodes, {} edges within {radius} m",
                area.node_count(),
                area.edge_count()
            );

            Ok(self.planner.plan_coverage(&area, origin, Some(policy.as_ref()))?)
        })
    }
}

/// Run one request, turning a panic into [`EngineError::Computation`].
///
/// Shared state is read-only during requests, so it stays valid after a
/// contained panic.
pub(crate) fn contain<T>(what: &str, f: impl FnOnce() -> EngineResult<T>) -> EngineResult<T> {
    let result = match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(r) => r,
        Err(payload) => Err(EngineError::Computation(format!(
            "{what} panicked: {}",
            panic_message(payload.as_ref())
        ))),
    };
    if let Err(e @ EngineError::Computation(_)) = &result {
        log::error!("{what} failed: {e}");
    }
    result
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
