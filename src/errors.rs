// Error types for fleetview

use crate::telemetry::PlaybackOutput;
use snafu::Snafu;
use std::{io, sync::mpsc::SendError};

#[derive(Debug, Snafu)]
pub enum FleetviewError {
    // Errors while loading recorded trip files
    #[snafu(display("Invalid trip file: {path}"))]
    InvalidTripFile { path: String },
    #[snafu(display("Error reading trip file"))]
    TripLoaderError { source: io::Error },
    #[snafu(display("Telemetry event for trip {trip_id} found before any trip header"))]
    OrphanEvent { trip_id: String },
    #[snafu(display("Event {index} of trip {trip_id} belongs to trip {found}"))]
    TripIdMismatch {
        trip_id: String,
        found: String,
        index: usize,
    },
    #[snafu(display(
        "Event {index} of trip {trip_id} is older than the event before it; events must be ordered by timestamp"
    ))]
    NonMonotonicTimestamps { trip_id: String, index: usize },
    #[snafu(display("Trip {trip_id} is declared more than once"))]
    DuplicateTrip { trip_id: String },

    // Errors for the simulation clock
    #[snafu(display("Cannot run a simulation over an empty fleet"))]
    EmptyFleet,
    #[snafu(display("Unsupported speed multiplier {value}, expected 1, 5, or 10"))]
    InvalidSpeed { value: u32 },

    // Errors while broadcasting playback frames
    #[snafu(display("Error broadcasting playback frame"))]
    FrameBroadcastError {
        source: Box<SendError<PlaybackOutput>>,
    },

    // Errors for the frame writer
    #[snafu(display("Error writing playback file"))]
    WriterError { source: io::Error },

    // Config management errors
    #[snafu(display("Could not find application data directory to save config file"))]
    NoConfigDir,
    #[snafu(display("Error writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },
}

impl From<SendError<PlaybackOutput>> for FleetviewError {
    fn from(value: SendError<PlaybackOutput>) -> Self {
        FleetviewError::FrameBroadcastError {
            source: Box::new(value),
        }
    }
}
