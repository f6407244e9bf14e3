use std::{
    sync::mpsc::{Receiver, Sender, TryRecvError},
    thread,
    time::{Duration, Instant},
};

use log::{info, warn};

use crate::FleetviewError;
use crate::simulation::{SimulationClock, SpeedMultiplier, TickOutcome};
use crate::telemetry::{FleetSummary, PlaybackOutput};

/// Control messages accepted by a running playback loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackCommand {
    Play,
    Pause,
    Reset,
    SetSpeed(SpeedMultiplier),
    Stop,
}

/// Drives a [`SimulationClock`] at a fixed cadence until the timeline ends or
/// a `Stop` command arrives.
///
/// Runs on the caller's thread (typically a spawned one). Each iteration
/// sleeps `refresh_rate_ms`, drains pending commands, and, while playing,
/// advances the clock by the measured wall-clock delta so cadence jitter
/// never skews simulated time. Every resulting frame goes to `frame_sender`
/// and, when present, to `frame_writer_sender` as well. `Play` re-anchors the
/// wall-clock reference, so time spent paused is never replayed.
pub fn run_playback(
    mut clock: SimulationClock,
    frame_sender: Sender<PlaybackOutput>,
    frame_writer_sender: Option<Sender<PlaybackOutput>>,
    command_receiver: Receiver<PlaybackCommand>,
    refresh_rate_ms: u64,
) -> Result<FleetSummary, FleetviewError> {
    let mut last_tick = Instant::now();
    loop {
        thread::sleep(Duration::from_millis(refresh_rate_ms));

        let mut state_changed = false;
        let mut commands_disconnected = false;
        loop {
            match command_receiver.try_recv() {
                Ok(PlaybackCommand::Play) => {
                    last_tick = Instant::now();
                    clock.play();
                    state_changed = true;
                }
                Ok(PlaybackCommand::Pause) => {
                    clock.pause();
                    state_changed = true;
                }
                Ok(PlaybackCommand::Reset) => {
                    clock.reset();
                    state_changed = true;
                }
                Ok(PlaybackCommand::SetSpeed(speed)) => {
                    clock.set_speed(speed);
                    state_changed = true;
                }
                Ok(PlaybackCommand::Stop) => {
                    let summary = clock.summary();
                    broadcast(
                        PlaybackOutput::Finished(summary),
                        &frame_sender,
                        frame_writer_sender.as_ref(),
                    )?;
                    return Ok(summary);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    commands_disconnected = true;
                    break;
                }
            }
        }

        if clock.is_playing() {
            let now = Instant::now();
            let dt = now - last_tick;
            last_tick = now;
            let outcome = clock.advance(dt);
            broadcast(
                PlaybackOutput::Frame(Box::new(clock.frame())),
                &frame_sender,
                frame_writer_sender.as_ref(),
            )?;
            if outcome == TickOutcome::Finished {
                let summary = clock.summary();
                info!(
                    "Playback reached the end of the timeline at {} ms",
                    clock.simulation_time_ms()
                );
                broadcast(
                    PlaybackOutput::Finished(summary),
                    &frame_sender,
                    frame_writer_sender.as_ref(),
                )?;
                return Ok(summary);
            }
        } else {
            if state_changed {
                broadcast(
                    PlaybackOutput::Frame(Box::new(clock.frame())),
                    &frame_sender,
                    frame_writer_sender.as_ref(),
                )?;
            }
            if commands_disconnected {
                // paused with every command sender gone: nothing can ever
                // start the clock again
                warn!("Playback command channel closed while paused, ending playback");
                let summary = clock.summary();
                broadcast(
                    PlaybackOutput::Finished(summary),
                    &frame_sender,
                    frame_writer_sender.as_ref(),
                )?;
                return Ok(summary);
            }
        }
    }
}

fn broadcast(
    output: PlaybackOutput,
    frame_sender: &Sender<PlaybackOutput>,
    frame_writer_sender: Option<&Sender<PlaybackOutput>>,
) -> Result<(), FleetviewError> {
    if let Some(writer_sender) = frame_writer_sender {
        writer_sender.send(output.clone()).map_err(|e| {
            log::error!("Could not forward playback frame to writer: {}", e);
            FleetviewError::from(e)
        })?;
    }
    frame_sender.send(output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{EventType, TelemetryEvent, Trip, TripStatus};
    use std::sync::mpsc;

    fn quick_fleet() -> Vec<Trip> {
        let events = vec![
            TelemetryEvent {
                trip_id: "A".to_string(),
                timestamp_ms: 0,
                event_type: EventType::Moving,
                ..Default::default()
            },
            TelemetryEvent {
                trip_id: "A".to_string(),
                timestamp_ms: 25,
                event_type: EventType::Moving,
                ..Default::default()
            },
            TelemetryEvent {
                trip_id: "A".to_string(),
                timestamp_ms: 50,
                event_type: EventType::Moving,
                ..Default::default()
            },
        ];
        vec![Trip::new("A".to_string(), 0, 50, events).unwrap()]
    }

    #[test]
    fn test_runs_to_completion() {
        let mut clock = SimulationClock::new(quick_fleet()).unwrap();
        clock.set_speed(SpeedMultiplier::X10);
        clock.play();

        let (frame_tx, frame_rx) = mpsc::channel();
        let (_command_tx, command_rx) = mpsc::channel();
        let handle = thread::spawn(move || run_playback(clock, frame_tx, None, command_rx, 1));

        let outputs: Vec<PlaybackOutput> = frame_rx.iter().collect();
        let summary = handle.join().unwrap().unwrap();

        assert_eq!(summary.total, 1);
        assert_eq!(summary.completed, 1);
        assert!(matches!(outputs.last(), Some(PlaybackOutput::Finished(s)) if *s == summary));

        // frames carry monotonically non-decreasing simulated time, clamped
        // exactly at the last trip end
        let mut last_time = f64::MIN;
        let mut final_frame = None;
        for output in &outputs {
            if let PlaybackOutput::Frame(frame) = output {
                assert!(frame.simulation_time_ms >= last_time);
                last_time = frame.simulation_time_ms;
                final_frame = Some(frame);
            }
        }
        let final_frame = final_frame.expect("at least one frame");
        assert_eq!(final_frame.simulation_time_ms, 50.);
        assert!(!final_frame.is_playing);
        assert_eq!(final_frame.snapshots[0].status, TripStatus::Completed);
    }

    #[test]
    fn test_stop_command_ends_playback() {
        let clock = SimulationClock::new(quick_fleet()).unwrap();

        let (frame_tx, frame_rx) = mpsc::channel();
        let (command_tx, command_rx) = mpsc::channel();
        command_tx.send(PlaybackCommand::Stop).unwrap();
        let handle = thread::spawn(move || run_playback(clock, frame_tx, None, command_rx, 1));

        let summary = handle.join().unwrap().unwrap();
        assert_eq!(summary.total, 1);
        assert!(matches!(
            frame_rx.iter().last(),
            Some(PlaybackOutput::Finished(_))
        ));
    }

    #[test]
    fn test_pause_holds_simulated_time_still() {
        // a long timeline so the run cannot finish underneath the test
        let events = vec![TelemetryEvent {
            trip_id: "A".to_string(),
            timestamp_ms: 0,
            event_type: EventType::Moving,
            ..Default::default()
        }];
        let fleet = vec![Trip::new("A".to_string(), 0, 60_000, events).unwrap()];
        let mut clock = SimulationClock::new(fleet).unwrap();
        clock.play();

        let (frame_tx, frame_rx) = mpsc::channel();
        let (command_tx, command_rx) = mpsc::channel();
        let handle = thread::spawn(move || run_playback(clock, frame_tx, None, command_rx, 1));

        frame_rx.recv().unwrap();
        command_tx.send(PlaybackCommand::Pause).unwrap();

        // drain until the pause lands
        let paused_at = loop {
            if let PlaybackOutput::Frame(frame) = frame_rx.recv().unwrap() {
                if !frame.is_playing {
                    break frame.simulation_time_ms;
                }
            }
        };
        thread::sleep(Duration::from_millis(200));
        command_tx.send(PlaybackCommand::Play).unwrap();
        let resumed = loop {
            if let PlaybackOutput::Frame(frame) = frame_rx.recv().unwrap() {
                break frame;
            }
        };
        // the wall-clock anchor was reset on Play, so the 200 ms spent paused
        // did not leak into the simulated time
        assert!(resumed.simulation_time_ms - paused_at < 100.);

        command_tx.send(PlaybackCommand::Stop).unwrap();
        handle.join().unwrap().unwrap();
    }
}
