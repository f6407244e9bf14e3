// Library interface for fleetview
// This allows integration tests to access internal modules

pub mod config;
pub mod errors;
pub mod simulation;
pub mod telemetry;
pub mod writer;

// Re-export commonly used types
pub use errors::FleetviewError;
pub use simulation::{
    PlaybackCommand, SimulationClock, SpeedMultiplier, TickOutcome, run_playback,
};
pub use telemetry::{
    EventType, FleetSummary, PlaybackOutput, SimulationFrame, TelemetryEvent, Trip, TripSnapshot,
    TripStateDeriver, TripStatus,
};
