use crate::builder::{OpenTrack, ShowerBuilder};
use crate::config::RecorderConfig;
use crate::error::{GraphError, Result};
use crate::io;
use crate::step::StepRecord;
use crate::types::{IdAllocator, ShowerNode};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

/// Trees gathered from every worker of a run, behind a single lock.
#[derive(Debug, Default)]
pub struct MasterCollection {
    trees: Mutex<Vec<ShowerNode>>,
}

impl MasterCollection {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, Vec<ShowerNode>> {
        match self.trees.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("master collection lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Move `trees` in; returns the new size.
    pub fn append(&self, mut trees: Vec<ShowerNode>) -> usize {
        let mut guard = self.guard();
        guard.append(&mut trees);
        guard.len()
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    /// Run `f` over the trees while holding the lock.
    pub fn with_trees<R>(&self, f: impl FnOnce(&[ShowerNode]) -> R) -> R {
        f(&self.guard())
    }

    pub fn snapshot(&self) -> Vec<ShowerNode> {
        self.guard().clone()
    }

    pub fn get(&self, index: usize) -> Result<ShowerNode> {
        let guard = self.guard();
        guard.get(index).cloned().ok_or(GraphError::Lookup {
            index,
            len: guard.len(),
        })
    }

    /// Empty the collection, returning what it held.
    pub fn take(&self) -> Vec<ShowerNode> {
        std::mem::take(&mut *self.guard())
    }
}

/// Which collection a recorder reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerRole {
    /// Single-threaded run: the local collection is the result
    Serial,

    /// Worker of a multi-threaded run: merges into the master collection
    Worker,

    /// Coordinator of a multi-threaded run: reads and writes the master collection
    Master,
}

/// Driver-facing recorder: owns one worker's assembler and local collection.
pub struct ShowerRecorder {
    role: WorkerRole,
    config: RecorderConfig,
    builder: ShowerBuilder,
    master: Arc<MasterCollection>,
}

impl ShowerRecorder {
    pub fn new(
        role: WorkerRole,
        config: RecorderConfig,
        ids: Arc<IdAllocator>,
        master: Arc<MasterCollection>,
    ) -> Result<Self> {
        config.validate()?;
        let builder = ShowerBuilder::from_config(&config, ids);
        Ok(Self {
            role,
            config,
            builder,
            master,
        })
    }

    /// Recorder for a single-threaded run with its own id allocator.
    pub fn serial(config: RecorderConfig) -> Result<Self> {
        Self::new(
            WorkerRole::Serial,
            config,
            Arc::new(IdAllocator::new()),
            Arc::new(MasterCollection::new()),
        )
    }

    pub fn role(&self) -> WorkerRole {
        self.role
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    pub fn master(&self) -> &Arc<MasterCollection> {
        &self.master
    }

    pub fn start_event(&mut self) {
        self.builder.start_event();
    }

    pub fn process_step(&mut self, record: &StepRecord) -> Result<()> {
        self.builder.process_step(record)
    }

    pub fn open_tracks(&self) -> &[OpenTrack] {
        self.builder.open_tracks()
    }

    /// Move local trees into the master collection (workers only).
    ///
    /// Returns the number of trees moved.
    pub fn merge(&mut self) -> usize {
        if self.role != WorkerRole::Worker {
            return 0;
        }
        let trees = self.builder.take_events();
        let moved = trees.len();
        let total = self.master.append(trees);
        info!("Merged {moved} shower graphs into master collection ({total} total)");
        moved
    }

    fn reads_master(&self) -> bool {
        self.role == WorkerRole::Master
    }

    /// Write the collection for `run` to `<base_name><run>.<extension>`.
    ///
    /// Workers write nothing and return `None`.
    pub fn write_collection(&self, run: u32) -> Result<Option<PathBuf>> {
        if self.role == WorkerRole::Worker {
            debug!("Worker recorder skips writing run {run}");
            return Ok(None);
        }

        let path = self.config.output_path(run);
        let write = |trees: &[ShowerNode]| {
            warn_placeholders(run, trees);
            io::write_collection(&path, trees)
        };
        if self.reads_master() {
            self.master.with_trees(write)?;
        } else {
            write(self.builder.events())?;
        }
        Ok(Some(path))
    }

    pub fn size(&self) -> usize {
        if self.reads_master() {
            self.master.len()
        } else {
            self.builder.len()
        }
    }

    /// Copy of the collection this recorder exposes.
    pub fn collection(&self) -> Vec<ShowerNode> {
        if self.reads_master() {
            self.master.snapshot()
        } else {
            self.builder.events().to_vec()
        }
    }

    pub fn node_at(&self, index: usize) -> Result<ShowerNode> {
        if self.reads_master() {
            return self.master.get(index);
        }
        let events = self.builder.events();
        events.get(index).cloned().ok_or(GraphError::Lookup {
            index,
            len: events.len(),
        })
    }
}

/// Warns about events that never saw their primary track; returns how many.
fn warn_placeholders(run: u32, trees: &[ShowerNode]) -> usize {
    let empty = trees.iter().filter(|tree| tree.is_placeholder()).count();
    if empty > 0 {
        warn!(
            "Run {run}: {empty} of {} events have no primary track recorded",
            trees.len()
        );
    }
    empty
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::PreStep;
    use crate::vector::Vector4;
    use tempfile::tempdir;

    fn record_events(recorder: &mut ShowerRecorder, count: usize) {
        for _ in 0..count {
            recorder.start_event();
            let step = StepRecord::new(1, "eIoni").first_step(PreStep {
                particle_code: 11,
                momentum: Vector4::new(1.0, 0.0, 0.0, 1.0),
                position: Vector4::ZERO,
            });
            recorder.process_step(&step).unwrap();
        }
    }

    #[test]
    fn test_serial_recorder_reads_local() {
        let mut recorder = ShowerRecorder::serial(RecorderConfig::default()).unwrap();
        record_events(&mut recorder, 3);

        assert_eq!(recorder.merge(), 0);
        assert_eq!(recorder.size(), 3);
        assert_eq!(recorder.collection().len(), 3);
        assert!(recorder.node_at(2).is_ok());
        assert!(matches!(
            recorder.node_at(3),
            Err(GraphError::Lookup { index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_worker_merges_into_master() {
        let ids = Arc::new(IdAllocator::new());
        let master = Arc::new(MasterCollection::new());
        let mut worker = ShowerRecorder::new(
            WorkerRole::Worker,
            RecorderConfig::default(),
            ids.clone(),
            master.clone(),
        )
        .unwrap();
        let coordinator =
            ShowerRecorder::new(WorkerRole::Master, RecorderConfig::default(), ids, master)
                .unwrap();

        record_events(&mut worker, 2);
        assert_eq!(worker.merge(), 2);
        assert_eq!(worker.size(), 0);
        assert_eq!(coordinator.size(), 2);
        assert!(coordinator.node_at(1).is_ok());
        assert!(matches!(
            coordinator.node_at(5),
            Err(GraphError::Lookup { index: 5, len: 2 })
        ));
    }

    #[test]
    fn test_write_collection_uses_run_number() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("calo_");
        let config =
            RecorderConfig::default().with_base_name(base.to_string_lossy().into_owned());
        let mut recorder = ShowerRecorder::serial(config).unwrap();
        record_events(&mut recorder, 1);

        let path = recorder.write_collection(4).unwrap().unwrap();
        assert_eq!(path, dir.path().join("calo_4.cg"));
        assert_eq!(io::read_collection(&path).unwrap(), recorder.collection());
    }

    #[test]
    fn test_worker_does_not_write() {
        let mut worker = ShowerRecorder::new(
            WorkerRole::Worker,
            RecorderConfig::default(),
            Arc::new(IdAllocator::new()),
            Arc::new(MasterCollection::new()),
        )
        .unwrap();
        record_events(&mut worker, 1);
        assert!(worker.write_collection(0).unwrap().is_none());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = RecorderConfig {
            primary_track_id: 0,
            ..RecorderConfig::default()
        };
        assert!(matches!(
            ShowerRecorder::serial(config),
            Err(GraphError::Config(_))
        ));
    }

    #[test]
    fn test_placeholder_events_still_written() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("partial");
        let config =
            RecorderConfig::default().with_base_name(base.to_string_lossy().into_owned());
        let mut recorder = ShowerRecorder::serial(config).unwrap();
        record_events(&mut recorder, 1);
        recorder.start_event();

        let trees = recorder.collection();
        assert_eq!(warn_placeholders(0, &trees), 1);
        assert_eq!(warn_placeholders(0, &trees[..1]), 0);

        let path = recorder.write_collection(0).unwrap().unwrap();
        let written = io::read_collection(&path).unwrap();
        assert_eq!(written.len(), 2);
        assert!(written[1].is_placeholder());
    }
}
