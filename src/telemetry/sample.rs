use super::{EventType, TelemetryEvent, Trip};

/// Fixed origin for the sample timeline, milliseconds since the unix epoch.
pub const SAMPLE_START_MS: u64 = 1_714_060_800_000;

fn event(
    trip_id: &str,
    offset_s: u64,
    lat: f64,
    lng: f64,
    speed: f64,
    event_type: EventType,
) -> TelemetryEvent {
    TelemetryEvent {
        trip_id: trip_id.to_string(),
        timestamp_ms: SAMPLE_START_MS + offset_s * 1000,
        lat,
        lng,
        speed,
        event_type,
    }
}

/// A small built-in fleet used when no recorded trip files are supplied:
/// three trips around downtown Seattle, one with a low-fuel stretch and one
/// cancelled partway through.
pub fn sample_fleet() -> Vec<Trip> {
    let t1 = Trip::new(
        "T1".to_string(),
        SAMPLE_START_MS,
        SAMPLE_START_MS + 60_000,
        vec![
            event("T1", 0, 47.6062, -122.3321, 11.0, EventType::Moving),
            event("T1", 10, 47.6089, -122.3301, 12.5, EventType::Moving),
            event("T1", 20, 47.6115, -122.3285, 0.0, EventType::Stopped),
            event("T1", 30, 47.6141, -122.3270, 9.0, EventType::Moving),
            event("T1", 40, 47.6168, -122.3252, 13.0, EventType::Moving),
            event("T1", 50, 47.6195, -122.3237, 12.0, EventType::Moving),
            event("T1", 60, 47.6221, -122.3219, 10.5, EventType::Moving),
        ],
    );
    let t2 = Trip::new(
        "T2".to_string(),
        SAMPLE_START_MS,
        SAMPLE_START_MS + 80_000,
        vec![
            event("T2", 0, 47.6205, -122.3493, 10.0, EventType::Moving),
            event("T2", 15, 47.6199, -122.3441, 14.0, EventType::Moving),
            event("T2", 30, 47.6192, -122.3390, 8.5, EventType::FuelLow),
            event("T2", 45, 47.6186, -122.3341, 11.0, EventType::Moving),
            event("T2", 60, 47.6180, -122.3290, 12.0, EventType::Moving),
            event("T2", 80, 47.6171, -122.3222, 9.5, EventType::Moving),
        ],
    );
    let t3 = Trip::new(
        "T3".to_string(),
        SAMPLE_START_MS,
        SAMPLE_START_MS + 60_000,
        vec![
            event("T3", 0, 47.6097, -122.3331, 9.0, EventType::Moving),
            event("T3", 10, 47.6071, -122.3345, 10.0, EventType::Moving),
            event("T3", 25, 47.6044, -122.3362, 0.0, EventType::Stopped),
            event("T3", 40, 47.6044, -122.3362, 0.0, EventType::Cancelled),
        ],
    );
    [t1, t2, t3]
        .into_iter()
        .map(|t| t.expect("sample fleet is valid"))
        .collect()
}
