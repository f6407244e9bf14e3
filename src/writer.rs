use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
    sync::mpsc::Receiver,
};

use crate::{FleetviewError, telemetry::PlaybackOutput};

/// Drains playback output into a JSON Lines file until the sending side
/// hangs up, then flushes.
pub fn write_frames(
    file: &PathBuf,
    frame_receiver: Receiver<PlaybackOutput>,
) -> Result<(), FleetviewError> {
    let playback_file = File::create(file).map_err(|e| FleetviewError::WriterError { source: e })?;
    let mut playback_file_writer = BufWriter::new(playback_file);
    for output in &frame_receiver {
        let _ = writeln!(
            playback_file_writer,
            "{}",
            serde_json::to_string(&output).unwrap()
        )
        .map_err(|e| {
            log::error!("Error while writing playback frame to output file: {}", e);
        });
    }
    playback_file_writer
        .flush()
        .map_err(|e| FleetviewError::WriterError { source: e })?;
    Ok(())
}
