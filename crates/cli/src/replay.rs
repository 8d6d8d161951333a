//! Feed recorded driver messages (JSON Lines) through a serial recorder.

use anyhow::{Context, Result};
use calography_graph::{DriverMessage, RecorderConfig, ShowerRecorder};
use log::{debug, info};
use std::io::BufRead;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub events: usize,
    pub steps: usize,
}

/// Apply every message from `reader`; blank lines and `#` comments are skipped.
pub fn replay_messages(
    recorder: &mut ShowerRecorder,
    reader: impl BufRead,
) -> Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();
    for (number, line) in reader.lines().enumerate() {
        let number = number + 1;
        let line = line.with_context(|| format!("Failed to read line {number}"))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let message = DriverMessage::from_json_line(trimmed)
            .with_context(|| format!("Line {number}: bad driver message"))?;
        match message {
            DriverMessage::StartEvent => {
                recorder.start_event();
                summary.events += 1;
            }
            DriverMessage::Step(record) => {
                recorder.process_step(&record).with_context(|| {
                    format!(
                        "Line {number}: step of track {} rejected",
                        record.source_track_id
                    )
                })?;
                summary.steps += 1;
            }
        }
    }
    debug!("Replayed {} steps over {} events", summary.steps, summary.events);
    Ok(summary)
}

/// Replay a whole file and write the resulting collection for `run`.
pub fn replay_file(
    input: &std::path::Path,
    config: RecorderConfig,
    run: u32,
) -> Result<(ReplaySummary, PathBuf)> {
    let file = std::fs::File::open(input)
        .with_context(|| format!("Failed to open {}", input.display()))?;
    let mut recorder = ShowerRecorder::serial(config)?;
    let summary = replay_messages(&mut recorder, std::io::BufReader::new(file))?;

    let path = recorder
        .write_collection(run)?
        .context("Serial recorder did not produce an output file")?;
    info!(
        "Replayed {} events ({} steps) into {}",
        summary.events,
        summary.steps,
        path.display()
    );
    Ok((summary, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use calography_graph::NodeKind;

    const STREAM: &str = r#"
# one gamma converting, then an empty event
{"type":"start_event"}
{"type":"step","source_track_id":1,"end_process":"conv","alive":false,
 "end_position":{"t":0.1,"x":0,"y":0,"z":5},
 "pre_step":{"particle_code":22,"momentum":{"t":10,"x":0,"y":0,"z":10},"position":{"t":0,"x":0,"y":0,"z":0}},
 "secondaries":[{"particle_code":11,"momentum":{"t":6,"x":0,"y":1,"z":6}}]}
{"type":"step","source_track_id":2,"end_process":"eIoni","deposited_energy":0.4,"alive":false,"end_position":{"t":0.2,"x":0,"y":0,"z":5.1}}
{"type":"start_event"}
"#;

    #[test]
    fn test_replay_builds_events() {
        // JSON Lines: join the pretty-printed step back onto one line.
        let stream = STREAM.replace(",\n ", ",");
        let mut recorder = ShowerRecorder::serial(RecorderConfig::default()).unwrap();
        let summary = replay_messages(&mut recorder, stream.as_bytes()).unwrap();

        assert_eq!(summary, ReplaySummary { events: 2, steps: 2 });
        let first = recorder.node_at(0).unwrap();
        assert_eq!(first.kind(), NodeKind::Track);
        assert_eq!(first.node_count(), 4);
        assert_eq!(first.subtree_energy(), 0.4);
        assert_eq!(recorder.node_at(1).unwrap().kind(), NodeKind::Root);
    }

    #[test]
    fn test_out_of_order_step_reports_line() {
        let stream = "{\"type\":\"start_event\"}\n{\"type\":\"step\",\"source_track_id\":5,\"end_process\":\"msc\",\"alive\":false,\"end_position\":{\"t\":0,\"x\":0,\"y\":0,\"z\":0}}\n";
        let mut recorder = ShowerRecorder::serial(RecorderConfig::default()).unwrap();
        let err = replay_messages(&mut recorder, stream.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("Line 2"));
    }
}
