//! # CaloGraphy Graph
//!
//! Shower graphs: the interaction history of one simulated event as a tree.
//!
//! ## Features
//!
//! - **Assembly** - rebuild the tree from the engine's depth-first step stream
//! - **Queries** - provenance, subtree energy, preorder listing, id lookup
//! - **Persistence** - lossless whitespace-tokenized text format, one tree per event
//! - **Collections** - per-worker local trees merged into a locked master collection
//!
//! ## Architecture
//!
//! ```text
//! StepRecord stream (simulation engine)
//!     │
//!     ├──> ShowerBuilder (work stack of open tracks)
//!     │      ├─ primary track replaces the event's placeholder root
//!     │      ├─ each step adds a process node under the stepping track
//!     │      └─ secondaries + continuation become open track nodes
//!     │
//!     ├──> ShowerRecorder (worker role)
//!     │      ├─ local collection, one tree per event
//!     │      └─ merge into MasterCollection (Mutex)
//!     │
//!     └──> Codec / io
//!            ├─ `id kind [fields] energy position child_count children...`
//!            └─ collection file = concatenated trees
//! ```
//!
//! ## Example
//!
//! ```rust
//! use calography_graph::{PreStep, RecorderConfig, ShowerRecorder, StepRecord, Vector4};
//!
//! let mut recorder = ShowerRecorder::serial(RecorderConfig::default()).unwrap();
//! recorder.start_event();
//! let step = StepRecord::new(1, "compt")
//!     .first_step(PreStep {
//!         particle_code: 22,
//!         momentum: Vector4::new(10.0, 0.0, 0.0, 10.0),
//!         position: Vector4::ZERO,
//!     })
//!     .alive_with(Vector4::new(9.0, 0.0, 0.5, 8.9));
//! recorder.process_step(&step).unwrap();
//!
//! let tree = recorder.node_at(0).unwrap();
//! assert_eq!(tree.node_count(), 3);
//! ```

mod builder;
mod codec;
mod collection;
mod config;
mod error;
mod graph;
pub mod io;
mod step;
mod types;
mod vector;

pub use builder::{OpenTrack, ShowerBuilder};
pub use codec::{
    decode_collection, decode_node, encode_collection, encode_node, is_valid_process_name,
    TokenStream,
};
pub use collection::{MasterCollection, ShowerRecorder, WorkerRole};
pub use config::{OrderingMode, RecorderConfig};
pub use error::{GraphError, Result};
pub use graph::{Preorder, Summary};
pub use step::{DriverMessage, PreStep, Secondary, StepRecord};
pub use types::{IdAllocator, NodeData, NodeKind, ShowerNode, TrackInfo};
pub use vector::Vector4;
