//! Transit data: the provider abstraction and its in-memory implementation.
//!
//! The routing engine reads stops, routes, timetables and transfers through
//! [`TransitDataProvider`]. [`TransitNetwork`] holds a validated network in
//! memory and can be loaded from a JSON file.

mod constrained;
mod loader;
mod network;
mod provider;
mod search;

pub use constrained::{
    ConstrainedBoarding, ConstrainedBoardingSearch, RouteTransferConstraints, TransferSource,
};
pub use loader::{LoadError, load_network, parse_network};
pub use network::{
    ConstrainedTransfer, DEFAULT_WALK_RELUCTANCE, NetworkBuilder, Stop, TransitNetwork,
};
pub use provider::{Route, TransitDataProvider};
pub use search::find_earliest_trip;
