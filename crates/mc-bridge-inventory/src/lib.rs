//! Inventory request synthesis core.
//!
//! Translates flat front-protocol requests into minimal sequences of
//! back-protocol clicks. Every batch is synthesized against a shadow copy of
//! the container model; either the complete resulting plan is committed and
//! the clicks emitted downstream, or nothing is.

pub mod craft;
pub mod error;
pub mod guard;
pub mod model;
pub mod oracle;
pub mod planner;
pub mod registry;
pub mod synth;
pub mod temp;
pub mod topology;

pub use error::SynthError;
pub use model::{CanonicalSlot, InventoryModel};
pub use oracle::{ItemOracle, RecipeOracle};
pub use planner::{ClickPlanner, ClickSink};
pub use registry::{ItemTable, RecipeTable};
pub use synth::RequestSynthesizer;
pub use topology::{ContainerCategory, SlotKind, SlotMapping};
