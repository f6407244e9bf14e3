use std::collections::HashSet;
use std::path::PathBuf;

use log::info;
use serde::{Deserialize, Serialize};

use super::{TelemetryEvent, Trip};
use crate::FleetviewError;

/// Header line opening a trip in a recorded fleet file. The events that
/// follow, up to the next header, belong to this trip.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TripMeta {
    pub trip_id: String,
    pub start_time_ms: u64,
    pub end_time_ms: u64,
}

/// One line of a recorded fleet file in JSON Lines format: a stream of trip
/// headers, each followed by that trip's telemetry events in timestamp order.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum TripRecord {
    TripStart(TripMeta),
    Event(TelemetryEvent),
}

/// Loads a fleet from one or more recorded trip files.
///
/// Malformed input is rejected rather than silently producing wrong derived
/// state later: unreadable lines, events before any header, events filed
/// under the wrong trip, out-of-order timestamps, and duplicate trip ids are
/// all load-time errors. An empty fleet is too, since the simulation clock
/// has no timeline without at least one trip.
pub fn load_trip_files(paths: &[PathBuf]) -> Result<Vec<Trip>, FleetviewError> {
    let mut trips: Vec<Trip> = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for path in paths {
        if !path.exists() {
            return Err(FleetviewError::InvalidTripFile {
                path: format!("{:?}", path),
            });
        }
        let records = serde_jsonlines::json_lines(path)
            .map_err(|e| FleetviewError::TripLoaderError { source: e })?
            .collect::<Result<Vec<TripRecord>, std::io::Error>>()
            .map_err(|e| FleetviewError::TripLoaderError { source: e })?;

        let mut open: Option<(TripMeta, Vec<TelemetryEvent>)> = None;
        for record in records {
            match record {
                TripRecord::TripStart(meta) => {
                    if let Some((done, events)) = open.take() {
                        trips.push(Trip::new(
                            done.trip_id,
                            done.start_time_ms,
                            done.end_time_ms,
                            events,
                        )?);
                    }
                    if !seen_ids.insert(meta.trip_id.clone()) {
                        return Err(FleetviewError::DuplicateTrip {
                            trip_id: meta.trip_id,
                        });
                    }
                    open = Some((meta, Vec::new()));
                }
                TripRecord::Event(event) => match open.as_mut() {
                    Some((_, events)) => events.push(event),
                    None => {
                        return Err(FleetviewError::OrphanEvent {
                            trip_id: event.trip_id,
                        });
                    }
                },
            }
        }
        if let Some((done, events)) = open.take() {
            trips.push(Trip::new(
                done.trip_id,
                done.start_time_ms,
                done.end_time_ms,
                events,
            )?);
        }
    }

    if trips.is_empty() {
        return Err(FleetviewError::EmptyFleet);
    }
    info!(
        "Loaded {} trips ({} events) from {} files",
        trips.len(),
        trips.iter().map(|t| t.events.len()).sum::<usize>(),
        paths.len()
    );
    Ok(trips)
}
