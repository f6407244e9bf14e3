use std::{path::PathBuf, sync::mpsc, thread};

use clap::{Parser, Subcommand};
use itertools::Itertools;
use log::info;

use fleetview::config::AppConfig;
use fleetview::telemetry::{load_trip_files, sample_fleet, traveled_path};
use fleetview::{
    FleetSummary, FleetviewError, PlaybackCommand, PlaybackOutput, SimulationClock,
    SimulationFrame, SpeedMultiplier, Trip, TripStateDeriver, run_playback, writer,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay recorded trips against the simulated timeline
    Replay {
        /// Recorded fleet files in JSON Lines format; replays the built-in
        /// sample fleet when omitted
        #[arg(short, long)]
        input: Vec<PathBuf>,

        /// Speed multiplier: 1, 5, or 10
        #[arg(short, long)]
        speed: Option<u32>,

        /// Playback loop cadence in milliseconds
        #[arg(long)]
        refresh_ms: Option<u64>,

        /// Also write every frame to this JSON Lines file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Derive fleet state at one point of the timeline, without replaying
    Summary {
        /// Recorded fleet files in JSON Lines format
        #[arg(short, long)]
        input: Vec<PathBuf>,

        /// Simulation time, ms since the epoch; the latest trip end when
        /// omitted
        #[arg(long)]
        at: Option<u64>,
    },
    /// Show or persist playback defaults
    Config {
        #[arg(short, long)]
        speed: Option<u32>,

        #[arg(long)]
        refresh_ms: Option<u64>,

        #[arg(long)]
        show_alerts: Option<bool>,
    },
}

fn load_fleet(input: &[PathBuf]) -> Result<Vec<Trip>, FleetviewError> {
    if input.is_empty() {
        info!("No input files given, using the built-in sample fleet");
        Ok(sample_fleet())
    } else {
        load_trip_files(input)
    }
}

fn render_frame(frame: &SimulationFrame, start_ms: f64, show_alerts: bool) {
    let line = frame
        .snapshots
        .iter()
        .map(|snapshot| {
            let mut cell = format!(
                "{} {:>3}% {}",
                snapshot.trip_id, snapshot.progress, snapshot.status
            );
            if show_alerts && !snapshot.alerts.is_empty() {
                cell.push_str(&format!(" [{}]", snapshot.alerts.iter().join(", ")));
            }
            cell
        })
        .join("  |  ");
    println!(
        "[t+{:6.1}s] {}",
        (frame.simulation_time_ms - start_ms) / 1000.,
        line
    );
}

fn print_summary(summary: &FleetSummary) {
    println!();
    println!(
        "Fleet summary: {} completed, {} running, {} cancelled ({} trips total)",
        summary.completed, summary.running, summary.cancelled, summary.total
    );
}

fn replay(
    input: &[PathBuf],
    speed: Option<u32>,
    refresh_ms: Option<u64>,
    output: Option<PathBuf>,
) -> Result<(), FleetviewError> {
    let app_config = AppConfig::from_local_file().unwrap_or_default();
    let speed = match speed {
        Some(value) => SpeedMultiplier::try_from(value)?,
        None => app_config.default_speed,
    };
    let refresh_rate_ms = refresh_ms.unwrap_or(app_config.refresh_rate_ms);

    let trips = load_fleet(input)?;
    let mut clock = SimulationClock::new(trips)?;
    clock.set_speed(speed);
    clock.play();
    let start_ms = clock.start_time_ms();
    info!(
        "Replaying {} trips at {}, one frame every {} ms",
        clock.frame().snapshots.len(),
        speed,
        refresh_rate_ms
    );

    let (frame_tx, frame_rx) = mpsc::channel::<PlaybackOutput>();
    let (command_tx, command_rx) = mpsc::channel::<PlaybackCommand>();

    // if we need to write an output file we create a second channel and have
    // the playback loop send to both the render and writer channels
    let writer_handle = if let Some(output_file) = output {
        let (writer_tx, writer_rx) = mpsc::channel::<PlaybackOutput>();
        let handle = thread::spawn(move || writer::write_frames(&output_file, writer_rx));
        thread::spawn(move || {
            run_playback(clock, frame_tx, Some(writer_tx), command_rx, refresh_rate_ms)
        });
        Some(handle)
    } else {
        thread::spawn(move || run_playback(clock, frame_tx, None, command_rx, refresh_rate_ms));
        None
    };

    ctrlc::set_handler(move || {
        println!("Stopping playback...");
        let _ = command_tx.send(PlaybackCommand::Stop);
    })
    .expect("Could not set Ctrl-C handler");

    for playback_output in frame_rx.iter() {
        match playback_output {
            PlaybackOutput::Frame(frame) => {
                render_frame(&frame, start_ms, app_config.show_alerts)
            }
            PlaybackOutput::Finished(summary) => {
                print_summary(&summary);
                break;
            }
        }
    }

    if let Some(handle) = writer_handle {
        handle.join().expect("Writer thread panicked")?;
    }
    Ok(())
}

fn summary(input: &[PathBuf], at: Option<u64>) -> Result<(), FleetviewError> {
    let app_config = AppConfig::from_local_file().unwrap_or_default();
    let trips = load_fleet(input)?;
    let at_ms = at.unwrap_or_else(|| {
        trips
            .iter()
            .map(|t| t.end_time_ms)
            .max()
            .unwrap_or_default()
    }) as f64;

    let deriver = TripStateDeriver::default();
    let snapshots = trips
        .iter()
        .map(|trip| deriver.derive(trip, at_ms))
        .collect_vec();
    for (trip, snapshot) in trips.iter().zip(&snapshots) {
        let mut line = format!(
            "{} {:>3}% {} ({} of {} waypoints traveled)",
            snapshot.trip_id,
            snapshot.progress,
            snapshot.status,
            traveled_path(trip, at_ms).len(),
            trip.events.len()
        );
        if app_config.show_alerts && !snapshot.alerts.is_empty() {
            line.push_str(&format!(" [{}]", snapshot.alerts.iter().join(", ")));
        }
        println!("{}", line);
    }
    print_summary(&FleetSummary::from_snapshots(&snapshots));
    Ok(())
}

fn config(
    speed: Option<u32>,
    refresh_ms: Option<u64>,
    show_alerts: Option<bool>,
) -> Result<(), FleetviewError> {
    let mut app_config = AppConfig::from_local_file().unwrap_or_default();
    let changed = speed.is_some() || refresh_ms.is_some() || show_alerts.is_some();
    if let Some(value) = speed {
        app_config.default_speed = SpeedMultiplier::try_from(value)?;
    }
    if let Some(value) = refresh_ms {
        app_config.refresh_rate_ms = value;
    }
    if let Some(value) = show_alerts {
        app_config.show_alerts = value;
    }
    if changed {
        app_config.save()?;
        info!("Saved playback defaults");
    }
    println!("default speed: {}", app_config.default_speed);
    println!("refresh rate: {} ms", app_config.refresh_rate_ms);
    println!("show alerts: {}", app_config.show_alerts);
    Ok(())
}

fn main() {
    colog::init();

    let cli = Args::parse();
    match &cli.command {
        Commands::Replay {
            input,
            speed,
            refresh_ms,
            output,
        } => replay(input, *speed, *refresh_ms, output.clone())
            .expect("Error while replaying fleet telemetry"),
        Commands::Summary { input, at } => {
            summary(input, *at).expect("Error while summarizing fleet telemetry")
        }
        Commands::Config {
            speed,
            refresh_ms,
            show_alerts,
        } => config(*speed, *refresh_ms, *show_alerts).expect("Error while updating config"),
    };
}
