pub(crate) mod fuel_alert_analyzer;
pub(crate) mod loader;
pub(crate) mod sample;
pub(crate) mod snapshot;

pub use loader::{TripMeta, TripRecord, load_trip_files};
pub use sample::sample_fleet;
pub use snapshot::{TripStateDeriver, traveled_path};

use serde::{Deserialize, Serialize};

use crate::FleetviewError;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Moving,
    Stopped,
    Cancelled,
    FuelLow,
}

/// A single recorded telemetry sample. Events are emitted once and ordered by
/// timestamp within a trip.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TelemetryEvent {
    pub trip_id: String,
    /// Milliseconds since the unix epoch
    pub timestamp_ms: u64,
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lng: f64,
    /// Vehicle speed as recorded, opaque to the simulation
    pub speed: f64,
    pub event_type: EventType,
}

impl Default for TelemetryEvent {
    fn default() -> Self {
        Self {
            trip_id: String::new(),
            timestamp_ms: 0,
            lat: 0.,
            lng: 0.,
            speed: 0.,
            event_type: EventType::Moving,
        }
    }
}

/// One vehicle's full recorded journey. Immutable after load.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Trip {
    pub trip_id: String,
    pub events: Vec<TelemetryEvent>,
    pub start_time_ms: u64,
    pub end_time_ms: u64,
}

impl Trip {
    /// Builds a trip from its recorded events, validating that every event
    /// belongs to this trip and that timestamps never decrease. The snapshot
    /// deriver scans events front to back and silently returns wrong answers
    /// on unsorted input, so out-of-order data is rejected here instead.
    pub fn new(
        trip_id: String,
        start_time_ms: u64,
        end_time_ms: u64,
        events: Vec<TelemetryEvent>,
    ) -> Result<Self, FleetviewError> {
        for (index, event) in events.iter().enumerate() {
            if event.trip_id != trip_id {
                return Err(FleetviewError::TripIdMismatch {
                    trip_id,
                    found: event.trip_id.clone(),
                    index,
                });
            }
            if index > 0 && event.timestamp_ms < events[index - 1].timestamp_ms {
                return Err(FleetviewError::NonMonotonicTimestamps { trip_id, index });
            }
        }
        if let Some(last) = events.last()
            && last.timestamp_ms > end_time_ms
        {
            log::warn!(
                "Trip {} declares end_time_ms {} before its last event at {}",
                trip_id,
                end_time_ms,
                last.timestamp_ms
            );
        }
        Ok(Self {
            trip_id,
            events,
            start_time_ms,
            end_time_ms,
        })
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    Running,
    Completed,
    Cancelled,
}

impl std::fmt::Display for TripStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TripStatus::Running => write!(f, "RUNNING"),
            TripStatus::Completed => write!(f, "COMPLETED"),
            TripStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Derived, point-in-time summary of a trip. Recomputed on every tick and
/// never mutated in place.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TripSnapshot {
    pub trip_id: String,
    pub current_event: Option<TelemetryEvent>,
    /// Share of the trip's events already replayed, 0-100
    pub progress: u8,
    pub status: TripStatus,
    pub alerts: Vec<String>,
}

impl TripSnapshot {
    /// The pre-playback snapshot: no event reached yet, nothing derived. Also
    /// what `reset()` restores, regardless of events at the exact start time.
    pub fn initial(trip_id: &str) -> Self {
        Self {
            trip_id: trip_id.to_string(),
            current_event: None,
            progress: 0,
            status: TripStatus::Running,
            alerts: Vec::new(),
        }
    }
}

/// Fleet-wide status counts over a set of trip snapshots.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FleetSummary {
    pub completed: usize,
    pub running: usize,
    pub cancelled: usize,
    pub total: usize,
}

impl FleetSummary {
    pub fn from_snapshots<'a>(snapshots: impl IntoIterator<Item = &'a TripSnapshot>) -> Self {
        let mut summary = FleetSummary::default();
        for snapshot in snapshots {
            match snapshot.status {
                TripStatus::Completed => summary.completed += 1,
                TripStatus::Running => summary.running += 1,
                TripStatus::Cancelled => summary.cancelled += 1,
            }
            summary.total += 1;
        }
        summary
    }
}

/// One tick's worth of derived state, in fleet load order.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SimulationFrame {
    pub simulation_time_ms: f64,
    pub is_playing: bool,
    pub snapshots: Vec<TripSnapshot>,
}

/// The playback stream consumed by renderers and the frame writer, one JSON
/// object per line.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum PlaybackOutput {
    Frame(Box<SimulationFrame>),
    Finished(FleetSummary),
}

pub trait AlertAnalyzer {
    fn analyze(&self, current_event: &TelemetryEvent) -> Option<String>;
}
