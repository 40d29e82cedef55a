//! Request orchestration.
//!
//! A [`Router`] answers one [`RouteRequest`] by running three branches side
//! by side: the transit search (with transfer optimization), a direct street
//! search and a direct flex search. The branches are joined, not raced; a
//! failing branch adds to [`RouteResponse::errors`] while the others still
//! contribute itineraries.

mod config;
mod error;
mod itinerary;
mod rank;
mod request;

pub use config::RouterConfig;
pub use error::RoutingError;
pub use itinerary::{Itinerary, ItineraryLeg};
pub use rank::{deduplicate, rank_itineraries};
pub use request::RouteRequest;

use std::sync::Arc;
use std::time::Duration;

use futures::future::OptionFuture;
use tracing::{debug, info, warn};

use crate::optimize::OptimizePathService;
use crate::raptor::{CostCalculator, Deadline, PathBuilder, RaptorWorker, SlackProvider};
use crate::transit::TransitDataProvider;

/// Walking or cycling straight from origin to destination.
pub trait DirectStreetSearch: Send + Sync {
    fn route(&self, request: &RouteRequest) -> Result<Vec<Itinerary>, RoutingError>;
}

/// On-demand rides straight from origin to destination.
pub trait DirectFlexSearch: Send + Sync {
    fn route(&self, request: &RouteRequest) -> Result<Vec<Itinerary>, RoutingError>;
}

/// Result of a routing request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteResponse {
    /// Best itineraries across all branches, best first
    pub itineraries: Vec<Itinerary>,
    /// One entry per failed branch
    pub errors: Vec<RoutingError>,
}

type BranchResult = Result<Vec<Itinerary>, RoutingError>;

pub struct Router<P: TransitDataProvider + 'static> {
    network: Arc<P>,
    config: RouterConfig,
    street: Option<Arc<dyn DirectStreetSearch>>,
    flex: Option<Arc<dyn DirectFlexSearch>>,
}

impl<P: TransitDataProvider + 'static> Router<P> {
    pub fn new(network: Arc<P>, config: RouterConfig) -> Self {
        Self {
            network,
            config,
            street: None,
            flex: None,
        }
    }

    pub fn with_street_search(mut self, street: Arc<dyn DirectStreetSearch>) -> Self {
        self.street = Some(street);
        self
    }

    pub fn with_flex_search(mut self, flex: Arc<dyn DirectFlexSearch>) -> Self {
        self.flex = Some(flex);
        self
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn network(&self) -> &Arc<P> {
        &self.network
    }

    /// Route one request.
    ///
    /// Every branch is bounded by the configured timeout. The transit branch
    /// also stops cooperatively at the same deadline, so it never returns a
    /// partial result.
    pub async fn route(&self, request: RouteRequest) -> RouteResponse {
        let timeout = self.config.timeout().to_std().unwrap_or_default();
        let request = Arc::new(request);
        info!(
            time = %request.time,
            arrive_by = request.arrive_by,
            access = request.access.len(),
            egress = request.egress.len(),
            "Routing request"
        );

        let transit = {
            let network = Arc::clone(&self.network);
            let config = self.config.clone();
            let request = Arc::clone(&request);
            run_branch("transit", timeout, move || {
                route_transit(network.as_ref(), &config, &request, Deadline::after(timeout))
            })
        };
        let street: OptionFuture<_> = self
            .street
            .clone()
            .map(|street| {
                let request = Arc::clone(&request);
                run_branch("street", timeout, move || street.route(&request))
            })
            .into();
        let flex: OptionFuture<_> = self
            .flex
            .clone()
            .map(|flex| {
                let request = Arc::clone(&request);
                run_branch("flex", timeout, move || flex.route(&request))
            })
            .into();

        let (transit, street, flex) = tokio::join!(transit, street, flex);

        let mut itineraries = Vec::new();
        let mut errors = Vec::new();
        for (branch, result) in [("transit", Some(transit)), ("street", street), ("flex", flex)] {
            match result {
                None => {}
                Some(Ok(found)) => {
                    debug!(branch, itineraries = found.len(), "Branch finished");
                    itineraries.extend(found);
                }
                Some(Err(error)) => {
                    warn!(branch, error = %error, "Branch failed");
                    errors.push(error);
                }
            }
        }

        let mut itineraries = rank_itineraries(deduplicate(itineraries), request.arrive_by);
        itineraries.truncate(self.config.max_results);
        info!(
            itineraries = itineraries.len(),
            errors = errors.len(),
            "Routing complete"
        );

        RouteResponse {
            itineraries,
            errors,
        }
    }
}

/// Run a blocking search on the blocking pool, bounded by `timeout`.
///
/// A panic or cancellation in the search becomes
/// [`RoutingError::BranchFailed`].
async fn run_branch<F>(branch: &'static str, timeout: Duration, search: F) -> BranchResult
where
    F: FnOnce() -> BranchResult + Send + 'static,
{
    let task = tokio::task::spawn_blocking(search);
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(RoutingError::BranchFailed {
            branch,
            message: join_error.to_string(),
        }),
        Err(_) => {
            debug!(branch, timeout_ms = timeout.as_millis() as u64, "Branch timed out");
            Err(RoutingError::Timeout)
        }
    }
}

/// Search, then re-choose the transfer points of every path found.
fn route_transit<P: TransitDataProvider>(
    network: &P,
    config: &RouterConfig,
    request: &RouteRequest,
    deadline: Deadline,
) -> BranchResult {
    let raptor_request = request.to_raptor_request(config, deadline);
    let slack: Arc<dyn SlackProvider> = Arc::new(config.slack_provider());
    let cost: Arc<dyn CostCalculator> = Arc::new(config.cost_calculator());

    let paths = RaptorWorker::new(network, &raptor_request, Arc::clone(&slack), Arc::clone(&cost))
        .route()?;
    debug!(paths = paths.len(), "Transit search found paths");

    if !config.optimize_transfers {
        return Ok(paths
            .iter()
            .map(|path| Itinerary::from_path(network, path))
            .collect());
    }

    let service = OptimizePathService::new(
        network,
        PathBuilder::new(slack, cost),
        config.wait_time_calculator(),
    );
    let mut itineraries = Vec::with_capacity(paths.len());
    for path in &paths {
        if path.transit_legs().next().is_none() {
            itineraries.push(Itinerary::from_path(network, path));
            continue;
        }
        itineraries.extend(
            service
                .find_best_transit_path(path)
                .iter()
                .map(|optimized| Itinerary::from_optimized(network, optimized)),
        );
    }
    Ok(itineraries)
}
