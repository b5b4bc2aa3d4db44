mod registry;
mod store;

pub use registry::{Alias, EntityRegistry, UpsertOutcome};
pub use store::{KnowledgeGraph, MergeOutcome, SharedGraph};
