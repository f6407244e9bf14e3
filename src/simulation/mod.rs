pub mod runner;

pub use runner::{PlaybackCommand, run_playback};

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::FleetviewError;
use crate::telemetry::{FleetSummary, SimulationFrame, Trip, TripSnapshot, TripStateDeriver};

/// Playback speed, restricted to the multipliers the dashboard exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum SpeedMultiplier {
    X1,
    X5,
    X10,
}

impl SpeedMultiplier {
    pub fn factor(&self) -> f64 {
        match self {
            SpeedMultiplier::X1 => 1.,
            SpeedMultiplier::X5 => 5.,
            SpeedMultiplier::X10 => 10.,
        }
    }
}

impl From<SpeedMultiplier> for u32 {
    fn from(value: SpeedMultiplier) -> Self {
        value.factor() as u32
    }
}

impl TryFrom<u32> for SpeedMultiplier {
    type Error = FleetviewError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(SpeedMultiplier::X1),
            5 => Ok(SpeedMultiplier::X5),
            10 => Ok(SpeedMultiplier::X10),
            _ => Err(FleetviewError::InvalidSpeed { value }),
        }
    }
}

impl std::fmt::Display for SpeedMultiplier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x", u32::from(*self))
    }
}

/// Outcome of a single tick, so the host knows whether to keep scheduling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The clock is paused, nothing moved
    Paused,
    /// Simulated time moved forward and snapshots were recomputed
    Advanced,
    /// Simulated time reached the last trip end; clamped there and paused
    Finished,
}

/// The fleet playback state machine.
///
/// Owns the loaded fleet, the virtual clock, and the derived snapshot of
/// every trip. Independent of any rendering or scheduling framework: a host
/// calls `advance` with measured wall-clock deltas at whatever cadence it
/// likes, and reads frames back out. Simulated time only moves forward,
/// except across an explicit `reset()`.
pub struct SimulationClock {
    trips: Vec<Trip>,
    deriver: TripStateDeriver,
    start_time_ms: f64,
    max_end_time_ms: f64,
    is_playing: bool,
    simulation_time_ms: f64,
    speed: SpeedMultiplier,
    snapshots: HashMap<String, TripSnapshot>,
}

impl SimulationClock {
    /// Creates a paused clock positioned at the earliest trip start.
    pub fn new(trips: Vec<Trip>) -> Result<Self, FleetviewError> {
        if trips.is_empty() {
            return Err(FleetviewError::EmptyFleet);
        }
        let start_time_ms = trips
            .iter()
            .map(|t| t.start_time_ms)
            .min()
            .unwrap_or_default() as f64;
        let max_end_time_ms = trips
            .iter()
            .map(|t| t.end_time_ms)
            .max()
            .unwrap_or_default() as f64;
        let snapshots = Self::initial_snapshots(&trips);
        Ok(Self {
            trips,
            deriver: TripStateDeriver::default(),
            start_time_ms,
            max_end_time_ms,
            is_playing: false,
            simulation_time_ms: start_time_ms,
            speed: SpeedMultiplier::X1,
            snapshots,
        })
    }

    fn initial_snapshots(trips: &[Trip]) -> HashMap<String, TripSnapshot> {
        trips
            .iter()
            .map(|t| (t.trip_id.clone(), TripSnapshot::initial(&t.trip_id)))
            .collect()
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn simulation_time_ms(&self) -> f64 {
        self.simulation_time_ms
    }

    pub fn start_time_ms(&self) -> f64 {
        self.start_time_ms
    }

    pub fn max_end_time_ms(&self) -> f64 {
        self.max_end_time_ms
    }

    pub fn speed(&self) -> SpeedMultiplier {
        self.speed
    }

    pub fn snapshot(&self, trip_id: &str) -> Option<&TripSnapshot> {
        self.snapshots.get(trip_id)
    }

    pub fn play(&mut self) {
        self.is_playing = true;
    }

    pub fn pause(&mut self) {
        self.is_playing = false;
    }

    /// Changes the rate of subsequent advancement without moving the clock.
    pub fn set_speed(&mut self, speed: SpeedMultiplier) {
        self.speed = speed;
    }

    /// Rewinds to the start, restores the pre-playback snapshots, and pauses.
    pub fn reset(&mut self) {
        self.is_playing = false;
        self.simulation_time_ms = self.start_time_ms;
        self.snapshots = Self::initial_snapshots(&self.trips);
    }

    /// Advances the virtual clock by `dt` of wall-clock time scaled by the
    /// speed multiplier and re-derives every trip snapshot. Clamps exactly at
    /// the latest trip end and auto-pauses there.
    pub fn advance(&mut self, dt: Duration) -> TickOutcome {
        if !self.is_playing {
            return TickOutcome::Paused;
        }
        self.simulation_time_ms += dt.as_secs_f64() * 1000. * self.speed.factor();
        if self.simulation_time_ms >= self.max_end_time_ms {
            self.simulation_time_ms = self.max_end_time_ms;
            self.is_playing = false;
            self.recompute_snapshots();
            return TickOutcome::Finished;
        }
        self.recompute_snapshots();
        TickOutcome::Advanced
    }

    // Full re-derivation for every trip; the deriver is a pure function of
    // (trip, t) so there is no incremental state to carry. A snapshot whose
    // trip is missing from the fleet is left as-is rather than failing the
    // tick.
    fn recompute_snapshots(&mut self) {
        let sim_time_ms = self.simulation_time_ms;
        for (trip_id, snapshot) in self.snapshots.iter_mut() {
            if let Some(trip) = self.trips.iter().find(|t| &t.trip_id == trip_id) {
                *snapshot = self.deriver.derive(trip, sim_time_ms);
            }
        }
    }

    /// The current derived state of the whole fleet, in load order.
    pub fn frame(&self) -> SimulationFrame {
        SimulationFrame {
            simulation_time_ms: self.simulation_time_ms,
            is_playing: self.is_playing,
            snapshots: self
                .trips
                .iter()
                .map(|trip| {
                    self.snapshots
                        .get(&trip.trip_id)
                        .cloned()
                        .unwrap_or_else(|| TripSnapshot::initial(&trip.trip_id))
                })
                .collect(),
        }
    }

    pub fn summary(&self) -> FleetSummary {
        FleetSummary::from_snapshots(self.snapshots.values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{EventType, TelemetryEvent, TripStatus};

    fn event(trip_id: &str, timestamp_ms: u64, event_type: EventType) -> TelemetryEvent {
        TelemetryEvent {
            trip_id: trip_id.to_string(),
            timestamp_ms,
            event_type,
            ..Default::default()
        }
    }

    fn test_fleet() -> Vec<Trip> {
        vec![
            Trip::new(
                "A".to_string(),
                1_000,
                31_000,
                vec![
                    event("A", 1_000, EventType::Moving),
                    event("A", 16_000, EventType::Moving),
                    event("A", 31_000, EventType::Moving),
                ],
            )
            .unwrap(),
            Trip::new(
                "B".to_string(),
                6_000,
                51_000,
                vec![
                    event("B", 6_000, EventType::Moving),
                    event("B", 21_000, EventType::FuelLow),
                    event("B", 51_000, EventType::Moving),
                ],
            )
            .unwrap(),
        ]
    }

    #[test]
    fn test_starts_paused_at_earliest_trip_start() {
        let clock = SimulationClock::new(test_fleet()).unwrap();
        assert!(!clock.is_playing());
        assert_eq!(clock.simulation_time_ms(), 1_000.);
        assert_eq!(clock.max_end_time_ms(), 51_000.);
        assert_eq!(clock.snapshot("A"), Some(&TripSnapshot::initial("A")));
        assert_eq!(clock.snapshot("B"), Some(&TripSnapshot::initial("B")));
    }

    #[test]
    fn test_empty_fleet_is_rejected() {
        assert!(matches!(
            SimulationClock::new(Vec::new()),
            Err(FleetviewError::EmptyFleet)
        ));
    }

    #[test]
    fn test_advance_is_noop_while_paused() {
        let mut clock = SimulationClock::new(test_fleet()).unwrap();
        assert_eq!(clock.advance(Duration::from_secs(10)), TickOutcome::Paused);
        assert_eq!(clock.simulation_time_ms(), 1_000.);
    }

    #[test]
    fn test_advance_scales_by_speed_multiplier() {
        let mut clock = SimulationClock::new(test_fleet()).unwrap();
        clock.set_speed(SpeedMultiplier::X5);
        clock.play();
        assert_eq!(clock.advance(Duration::from_secs(2)), TickOutcome::Advanced);
        // 2s of wall clock at 5x = 10s of simulated time
        assert_eq!(clock.simulation_time_ms(), 11_000.);
        assert_eq!(clock.snapshot("A").unwrap().progress, 33);
    }

    #[test]
    fn test_set_speed_does_not_move_the_clock() {
        let mut clock = SimulationClock::new(test_fleet()).unwrap();
        clock.play();
        clock.advance(Duration::from_secs(3));
        let before = clock.simulation_time_ms();
        clock.set_speed(SpeedMultiplier::X10);
        assert_eq!(clock.simulation_time_ms(), before);
        assert!(clock.is_playing());
    }

    #[test]
    fn test_clamps_exactly_at_latest_end_and_pauses() {
        let mut clock = SimulationClock::new(test_fleet()).unwrap();
        clock.set_speed(SpeedMultiplier::X10);
        clock.play();
        assert_eq!(
            clock.advance(Duration::from_secs(3_600)),
            TickOutcome::Finished
        );
        assert_eq!(clock.simulation_time_ms(), 51_000.);
        assert!(!clock.is_playing());
        // snapshots were recomputed at the clamped time
        assert_eq!(clock.snapshot("A").unwrap().progress, 100);
        assert_eq!(clock.snapshot("A").unwrap().status, TripStatus::Completed);
        assert_eq!(clock.snapshot("B").unwrap().status, TripStatus::Completed);

        // already at the end: further ticks are paused no-ops
        assert_eq!(clock.advance(Duration::from_secs(1)), TickOutcome::Paused);
        assert_eq!(clock.simulation_time_ms(), 51_000.);
    }

    #[test]
    fn test_simulated_time_is_monotonic_while_playing() {
        let mut clock = SimulationClock::new(test_fleet()).unwrap();
        clock.play();
        let mut last = clock.simulation_time_ms();
        for _ in 0..200 {
            clock.advance(Duration::from_millis(137));
            assert!(clock.simulation_time_ms() >= last);
            last = clock.simulation_time_ms();
        }
    }

    #[test]
    fn test_reset_restores_initial_state_from_any_point() {
        let mut clock = SimulationClock::new(test_fleet()).unwrap();
        clock.set_speed(SpeedMultiplier::X10);
        clock.play();
        clock.advance(Duration::from_secs(3_600));

        clock.reset();
        assert!(!clock.is_playing());
        assert_eq!(clock.simulation_time_ms(), 1_000.);
        assert_eq!(clock.snapshot("A"), Some(&TripSnapshot::initial("A")));
        assert_eq!(clock.snapshot("B"), Some(&TripSnapshot::initial("B")));
        // speed survives a reset; only time and snapshots rewind
        assert_eq!(clock.speed(), SpeedMultiplier::X10);
    }

    #[test]
    fn test_snapshot_of_missing_trip_is_left_unchanged() {
        let mut clock = SimulationClock::new(test_fleet()).unwrap();
        clock.trips.remove(1);
        clock.play();
        clock.advance(Duration::from_secs(12));
        assert_eq!(clock.snapshot("A").unwrap().progress, 33);
        // trip B disappeared from the fleet lookup; its snapshot is stale but
        // the tick neither fails nor drops it
        assert_eq!(clock.snapshot("B"), Some(&TripSnapshot::initial("B")));
    }

    #[test]
    fn test_fleet_summary_counts() {
        let mut clock = SimulationClock::new(test_fleet()).unwrap();
        clock.play();
        clock.advance(Duration::from_secs(1));
        let summary = clock.summary();
        assert_eq!(summary.running, 2);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.completed + summary.cancelled, 0);
    }

    #[test]
    fn test_speed_multiplier_closed_set() {
        assert_eq!(SpeedMultiplier::try_from(5).unwrap(), SpeedMultiplier::X5);
        assert!(matches!(
            SpeedMultiplier::try_from(2),
            Err(FleetviewError::InvalidSpeed { value: 2 })
        ));
        assert_eq!(SpeedMultiplier::X10.to_string(), "10x");
    }
}
