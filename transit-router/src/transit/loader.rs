//! JSON network files.
//!
//! A small interchange format for running the router end to end. Stops are
//! referenced by id throughout the file.
//!
//! ```json
//! {
//!   "stops": [{ "id": "A", "name": "Alpha" }, { "id": "B", "name": "Bravo" }],
//!   "routes": [{
//!     "name": "L1",
//!     "stops": ["A", "B"],
//!     "trips": [{ "id": "T1", "times": ["10:00", "10:20"] }]
//!   }],
//!   "transfers": [{ "from": "A", "to": "B", "duration_secs": 300 }],
//!   "constrained_transfers": [{
//!     "from_trip": "T1", "from_stop": "B", "to_trip": "T2", "to_stop": "B",
//!     "priority": "preferred"
//!   }]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::domain::{DataError, StopIndex, Time, TransferConstraint, TransferPriority};

use super::network::{ConstrainedTransfer, NetworkBuilder, TransitNetwork};

/// Error loading a network file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read network file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid network JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown stop id: {0}")]
    UnknownStop(String),

    #[error("trip {0} must have either `times` or both `arrivals` and `departures`")]
    MissingTimes(String),

    #[error(transparent)]
    Data(#[from] DataError),
}

#[derive(Debug, Deserialize)]
struct NetworkFile {
    stops: Vec<StopRecord>,
    #[serde(default)]
    routes: Vec<RouteRecord>,
    #[serde(default)]
    transfers: Vec<TransferRecord>,
    #[serde(default)]
    constrained_transfers: Vec<ConstrainedRecord>,
}

#[derive(Debug, Deserialize)]
struct StopRecord {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RouteRecord {
    name: String,
    stops: Vec<String>,
    #[serde(default)]
    board_allowed: Option<Vec<bool>>,
    #[serde(default)]
    alight_allowed: Option<Vec<bool>>,
    #[serde(default)]
    trips: Vec<TripRecord>,
}

#[derive(Debug, Deserialize)]
struct TripRecord {
    id: String,
    #[serde(default)]
    times: Option<Vec<String>>,
    #[serde(default)]
    arrivals: Option<Vec<String>>,
    #[serde(default)]
    departures: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct TransferRecord {
    from: String,
    to: String,
    duration_secs: i32,
    #[serde(default)]
    c1: Option<i32>,
    #[serde(default)]
    bidirectional: bool,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum PriorityRecord {
    NotAllowed,
    #[default]
    Allowed,
    Recommended,
    Preferred,
}

impl From<PriorityRecord> for TransferPriority {
    fn from(value: PriorityRecord) -> Self {
        match value {
            PriorityRecord::NotAllowed => TransferPriority::NotAllowed,
            PriorityRecord::Allowed => TransferPriority::Allowed,
            PriorityRecord::Recommended => TransferPriority::Recommended,
            PriorityRecord::Preferred => TransferPriority::Preferred,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConstrainedRecord {
    from_trip: String,
    from_stop: String,
    to_trip: String,
    to_stop: String,
    #[serde(default)]
    priority: PriorityRecord,
    #[serde(default)]
    stay_seated: bool,
    #[serde(default)]
    guaranteed: bool,
}

/// Read and validate a network file.
pub fn load_network(path: &Path) -> Result<TransitNetwork, LoadError> {
    let json = std::fs::read_to_string(path)?;
    let network = parse_network(&json)?;
    info!(
        path = %path.display(),
        stops = network.stops().len(),
        routes = network.number_of_routes(),
        "Loaded transit network"
    );
    Ok(network)
}

/// Parse and validate a network from a JSON string.
pub fn parse_network(json: &str) -> Result<TransitNetwork, LoadError> {
    let file: NetworkFile = serde_json::from_str(json)?;
    let mut builder = NetworkBuilder::new();
    let mut ids: HashMap<String, StopIndex> = HashMap::new();

    for stop in file.stops {
        let name = stop.name.unwrap_or_else(|| stop.id.clone());
        let index = builder.add_stop(stop.id.clone(), name);
        ids.insert(stop.id, index);
    }

    let lookup = |id: &str| -> Result<StopIndex, LoadError> {
        ids.get(id)
            .copied()
            .ok_or_else(|| LoadError::UnknownStop(id.to_string()))
    };

    for route in file.routes {
        let stops = route
            .stops
            .iter()
            .map(|id| lookup(id.as_str()))
            .collect::<Result<Vec<_>, _>>()?;
        let n = stops.len();
        let route_index = builder.add_route_with_restrictions(
            route.name,
            stops,
            route.board_allowed.unwrap_or_else(|| vec![true; n]),
            route.alight_allowed.unwrap_or_else(|| vec![true; n]),
        )?;

        for trip in route.trips {
            let (arrivals, departures) = match (trip.times, trip.arrivals, trip.departures) {
                (Some(times), _, _) => {
                    let times = parse_times(&times)?;
                    (times.clone(), times)
                }
                (None, Some(arrivals), Some(departures)) => {
                    (parse_times(&arrivals)?, parse_times(&departures)?)
                }
                _ => return Err(LoadError::MissingTimes(trip.id)),
            };
            builder.add_trip(route_index, trip.id, arrivals, departures)?;
        }
    }

    for transfer in file.transfers {
        let from = lookup(transfer.from.as_str())?;
        let to = lookup(transfer.to.as_str())?;
        let mut pairs = vec![(from, to)];
        if transfer.bidirectional {
            pairs.push((to, from));
        }
        for (from, to) in pairs {
            match transfer.c1 {
                Some(c1) => builder.add_transfer(from, to, transfer.duration_secs, c1)?,
                None => builder.add_walk(from, to, transfer.duration_secs)?,
            }
        }
    }

    for record in file.constrained_transfers {
        builder.add_constrained_transfer(ConstrainedTransfer {
            from_stop: lookup(record.from_stop.as_str())?,
            to_stop: lookup(record.to_stop.as_str())?,
            from_trip: record.from_trip,
            to_trip: record.to_trip,
            constraint: TransferConstraint {
                priority: record.priority.into(),
                stay_seated: record.stay_seated,
                guaranteed: record.guaranteed,
            },
        });
    }

    Ok(builder.build()?)
}

fn parse_times(times: &[String]) -> Result<Vec<Time>, DataError> {
    times
        .iter()
        .map(|s| Time::parse(s).map_err(DataError::from))
        .collect()
}
