//! Graph assembler: turns the ordered step stream of one event into a shower tree.
//!
//! Track nodes awaiting their next step are kept on a work stack. The engine
//! is expected to deliver steps depth-first (a track runs until it stops,
//! then the most recently produced secondary is tracked), so in
//! [`OrderingMode::Strict`] every step must continue the node on top of the
//! stack. [`OrderingMode::Keyed`] relaxes this for engines that suspend and
//! resume tracks.

use crate::codec::is_valid_process_name;
use crate::config::{OrderingMode, RecorderConfig};
use crate::error::{GraphError, Result};
use crate::step::{PreStep, StepRecord};
use crate::types::{IdAllocator, ShowerNode, TrackInfo};
use log::{debug, warn};
use std::sync::Arc;

/// Track node waiting for its next step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenTrack {
    pub source_track_id: u32,
    pub node_id: u64,
    /// Child indices leading from the event root to the node
    path: Vec<usize>,
}

/// Where the node updated by a step comes from.
enum Resolution {
    Primary(PreStep),
    Open { index: usize, particle_code: i32 },
}

/// Builds one shower tree per event into a local collection.
pub struct ShowerBuilder {
    ids: Arc<IdAllocator>,
    primary_track_id: u32,
    ordering: OrderingMode,
    events: Vec<ShowerNode>,
    open: Vec<OpenTrack>,
    secondaries: u32,
    primary_recorded: bool,
    event_open: bool,
}

impl ShowerBuilder {
    pub fn new(ids: Arc<IdAllocator>, primary_track_id: u32, ordering: OrderingMode) -> Self {
        Self {
            ids,
            primary_track_id,
            ordering,
            events: Vec::new(),
            open: Vec::new(),
            secondaries: 0,
            primary_recorded: false,
            event_open: false,
        }
    }

    pub fn from_config(config: &RecorderConfig, ids: Arc<IdAllocator>) -> Self {
        Self::new(ids, config.primary_track_id, config.ordering)
    }

    /// Begin a new event with a placeholder root.
    pub fn start_event(&mut self) {
        if self.event_open && !self.open.is_empty() {
            warn!(
                "Event {} closed with {} open tracks",
                self.events.len().saturating_sub(1),
                self.open.len()
            );
        }

        self.events.push(ShowerNode::root(&self.ids));
        self.open.clear();
        self.secondaries = 0;
        self.primary_recorded = false;
        self.event_open = true;
        debug!("Started event {}", self.events.len() - 1);
    }

    /// Apply one step record to the event in progress.
    ///
    /// On error the tree and the work stack are left untouched.
    pub fn process_step(&mut self, record: &StepRecord) -> Result<()> {
        if !self.event_open {
            return Err(GraphError::consistency(format!(
                "step of track {} received outside an event",
                record.source_track_id
            )));
        }
        if !is_valid_process_name(&record.end_process) {
            return Err(GraphError::format(format!(
                "process name {:?} must be a single non-empty token",
                record.end_process
            )));
        }

        let resolution = self.resolve(record)?;
        let first_secondary = self.reserve_secondaries(record.secondaries.len())?;

        let Some(root) = self.events.last_mut() else {
            return Err(GraphError::consistency("no event tree to update"));
        };

        let (path, particle_code) = match resolution {
            Resolution::Primary(pre) => {
                let info = TrackInfo {
                    particle_code: pre.particle_code,
                    source_track_id: record.source_track_id,
                    momentum: pre.momentum,
                };
                *root = ShowerNode::track(&self.ids, info, 0.0, pre.position);
                self.primary_recorded = true;
                (Vec::new(), pre.particle_code)
            }
            Resolution::Open {
                index,
                particle_code,
            } => (self.open.remove(index).path, particle_code),
        };

        let Some(node) = node_at_path_mut(root, &path) else {
            return Err(GraphError::consistency(format!(
                "open node of track {} is no longer reachable",
                record.source_track_id
            )));
        };

        node.set_energy(record.deposited_energy);

        let mut process =
            ShowerNode::process(&self.ids, record.end_process.as_str(), 0.0, record.end_position);
        let mut process_path = path;
        process_path.push(node.children().len());

        let mut opened = Vec::with_capacity(record.secondaries.len() + 1);
        for (offset, secondary) in (0u32..).zip(&record.secondaries) {
            let info = TrackInfo {
                particle_code: secondary.particle_code,
                source_track_id: first_secondary + offset,
                momentum: secondary.momentum,
            };
            opened.push(attach_track(&self.ids, &mut process, &process_path, info));
        }

        if record.alive {
            let info = TrackInfo {
                particle_code,
                source_track_id: record.source_track_id,
                momentum: record.end_momentum,
            };
            opened.push(attach_track(&self.ids, &mut process, &process_path, info));
        }

        debug!(
            "Track {} stepped via {}: {} secondaries, alive={}",
            record.source_track_id,
            record.end_process,
            record.secondaries.len(),
            record.alive
        );

        node.add_child(process);
        self.open.extend(opened);
        Ok(())
    }

    /// Decide which node the step updates without touching any state.
    fn resolve(&self, record: &StepRecord) -> Result<Resolution> {
        let track_id = record.source_track_id;

        if self.open.is_empty() {
            if track_id != self.primary_track_id {
                return Err(GraphError::consistency(format!(
                    "no open track to continue for step of track {track_id}"
                )));
            }
            if self.primary_recorded {
                return Err(GraphError::consistency(format!(
                    "primary track {track_id} already recorded for this event"
                )));
            }
            let Some(pre) = record.pre_step else {
                return Err(GraphError::consistency(format!(
                    "first step of primary track {track_id} carries no pre-step kinematics"
                )));
            };
            return Ok(Resolution::Primary(pre));
        }

        let index = match self.ordering {
            OrderingMode::Strict => {
                let top = self.open.len() - 1;
                let expected = self.open[top].source_track_id;
                if expected != track_id {
                    return Err(GraphError::TrackMismatch {
                        expected,
                        found: track_id,
                    });
                }
                top
            }
            OrderingMode::Keyed => self
                .open
                .iter()
                .rposition(|open| open.source_track_id == track_id)
                .ok_or_else(|| {
                    GraphError::consistency(format!("track {track_id} has no open node"))
                })?,
        };

        let particle_code = self
            .events
            .last()
            .and_then(|root| node_at_path(root, &self.open[index].path))
            .and_then(ShowerNode::particle_code)
            .ok_or_else(|| {
                GraphError::consistency(format!("open node of track {track_id} is not a track"))
            })?;

        Ok(Resolution::Open {
            index,
            particle_code,
        })
    }

    /// Claim engine ids for `count` secondaries, returning the first one.
    fn reserve_secondaries(&mut self, count: usize) -> Result<u32> {
        let overflow =
            || GraphError::consistency("secondary track ids exceed the engine id range");
        let count = u32::try_from(count).map_err(|_| overflow())?;
        let first = self
            .primary_track_id
            .checked_add(self.secondaries)
            .and_then(|id| id.checked_add(1))
            .ok_or_else(overflow)?;
        first.checked_add(count).ok_or_else(overflow)?;
        self.secondaries += count;
        Ok(first)
    }

    /// Work stack, bottom first.
    pub fn open_tracks(&self) -> &[OpenTrack] {
        &self.open
    }

    pub fn event_in_progress(&self) -> bool {
        self.event_open
    }

    /// Tree of the event in progress (or the last one started).
    pub fn current_event(&self) -> Option<&ShowerNode> {
        self.events.last()
    }

    pub fn events(&self) -> &[ShowerNode] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Move every collected tree out, closing any event in progress.
    pub fn take_events(&mut self) -> Vec<ShowerNode> {
        self.open.clear();
        self.event_open = false;
        std::mem::take(&mut self.events)
    }

    pub fn ids(&self) -> &Arc<IdAllocator> {
        &self.ids
    }
}

/// Attach a fresh track under `process`, returning its work-stack entry.
fn attach_track(
    ids: &IdAllocator,
    process: &mut ShowerNode,
    process_path: &[usize],
    info: TrackInfo,
) -> OpenTrack {
    let track = ShowerNode::track(ids, info, 0.0, process.position());
    let node_id = track.id();
    let mut path = process_path.to_vec();
    path.push(process.add_child(track));
    OpenTrack {
        source_track_id: info.source_track_id,
        node_id,
        path,
    }
}

fn node_at_path<'a>(root: &'a ShowerNode, path: &[usize]) -> Option<&'a ShowerNode> {
    let mut node = root;
    for &index in path {
        node = node.children().get(index)?;
    }
    Some(node)
}

fn node_at_path_mut<'a>(root: &'a mut ShowerNode, path: &[usize]) -> Option<&'a mut ShowerNode> {
    let mut node = root;
    for &index in path {
        node = node.child_mut(index)?;
    }
    Some(node)
}
