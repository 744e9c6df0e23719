//! Spawn registry: timeline spawn tracks resolved into object lifetimes.

mod registry;
mod settings;
mod world;

pub use registry::{InstanceSpawns, SpawnRegistry, SpawnScope};
pub use settings::{SpawnOwnership, SpawnSettings, TeardownCause};
pub use world::{SpawnError, SpawnTemplate, SpawnWorld, Transform};
