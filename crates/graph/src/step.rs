use crate::error::{GraphError, Result};
use crate::vector::Vector4;
use serde::{Deserialize, Serialize};

/// Kinematics reported only on a track's first step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreStep {
    pub particle_code: i32,
    pub momentum: Vector4,
    pub position: Vector4,
}

/// A new track produced during a step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Secondary {
    pub particle_code: i32,
    pub momentum: Vector4,
}

/// One step of one engine track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Engine-assigned track identifier
    pub source_track_id: u32,

    /// Energy deposited during the step
    #[serde(default)]
    pub deposited_energy: f64,

    /// Name of the process that limited the step
    pub end_process: String,

    /// Post-step position and time
    pub end_position: Vector4,

    /// Post-step four-momentum
    #[serde(default)]
    pub end_momentum: Vector4,

    /// Whether the track continues past this step
    pub alive: bool,

    #[serde(default)]
    pub pre_step: Option<PreStep>,

    #[serde(default)]
    pub secondaries: Vec<Secondary>,
}

impl StepRecord {
    pub fn new(source_track_id: u32, end_process: impl Into<String>) -> Self {
        Self {
            source_track_id,
            deposited_energy: 0.0,
            end_process: end_process.into(),
            end_position: Vector4::ZERO,
            end_momentum: Vector4::ZERO,
            alive: false,
            pre_step: None,
            secondaries: Vec::new(),
        }
    }

    pub fn deposited(mut self, energy: f64) -> Self {
        self.deposited_energy = energy;
        self
    }

    pub fn ending_at(mut self, position: Vector4) -> Self {
        self.end_position = position;
        self
    }

    /// Mark the track as continuing with the given post-step momentum.
    pub fn alive_with(mut self, momentum: Vector4) -> Self {
        self.alive = true;
        self.end_momentum = momentum;
        self
    }

    pub fn first_step(mut self, pre_step: PreStep) -> Self {
        self.pre_step = Some(pre_step);
        self
    }

    pub fn secondary(mut self, particle_code: i32, momentum: Vector4) -> Self {
        self.secondaries.push(Secondary {
            particle_code,
            momentum,
        });
        self
    }
}

/// Message from a simulation driver, one per JSON line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DriverMessage {
    StartEvent,
    Step(StepRecord),
}

impl DriverMessage {
    pub fn from_json_line(line: &str) -> Result<Self> {
        serde_json::from_str(line)
            .map_err(|e| GraphError::format(format!("invalid driver message: {e}")))
    }

    pub fn to_json_line(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| GraphError::format(format!("cannot encode driver message: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_driver_messages() {
        let start = DriverMessage::from_json_line(r#"{"type":"start_event"}"#).unwrap();
        assert_eq!(start, DriverMessage::StartEvent);

        let step = DriverMessage::from_json_line(
            r#"{"type":"step","source_track_id":1,"end_process":"compt",
                "end_position":{"t":1.0,"x":0.0,"y":0.0,"z":2.0},"alive":true}"#,
        )
        .unwrap();
        let DriverMessage::Step(record) = step else {
            panic!("expected step");
        };
        assert_eq!(record.source_track_id, 1);
        assert_eq!(record.end_position, Vector4::new(1.0, 0.0, 0.0, 2.0));
        assert!(record.secondaries.is_empty());
        assert!(record.pre_step.is_none());
    }

    #[test]
    fn test_round_trip_json_line() {
        let message = DriverMessage::Step(
            StepRecord::new(3, "eIoni")
                .deposited(0.02)
                .secondary(11, Vector4::new(0.1, 0.0, 0.1, 0.0)),
        );
        let line = message.to_json_line().unwrap();
        assert_eq!(DriverMessage::from_json_line(&line).unwrap(), message);
    }

    #[test]
    fn test_malformed_line_is_format_error() {
        assert!(matches!(
            DriverMessage::from_json_line("{\"type\":\"teleport\"}"),
            Err(GraphError::Format(_))
        ));
    }
}
