//! Transfer-point optimization of found paths.
//!
//! A path from [`crate::raptor::RaptorWorker`] rides a fixed sequence of
//! trips, but the search keeps whichever transfer stop it reached first.
//! [`OptimizePathService`] revisits every feasible transfer point between
//! those trips and returns the best realizations, ranked by transfer
//! priority, wait-time optimized cost, and finally the earliest transfers.

mod filter;
mod generator;
mod optimized;
mod selector;
mod service;
mod tail;
mod trip_to_trip;
mod wait_time;

pub use filter::{AssignC2Filter, CostFn, MinCostFilterChain, ParetoTailFilter, PathTailFilter};
pub use generator::TransferGenerator;
pub use optimized::OptimizedPath;
pub use selector::TransitPathLegSelector;
pub use service::OptimizePathService;
pub use tail::OptimizedPathTail;
pub use trip_to_trip::{TripStopTime, TripToTripTransfer};
pub use wait_time::{DEFAULT_MIN_SAFE_WAIT_TIME_FACTOR, TransferWaitTimeCostCalculator};
