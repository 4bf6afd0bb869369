//! Seeded and learned pattern registry plus the adaptive-learning
//! engine that updates pattern weights from feedback and discovers
//! new patterns from confirmed-threat samples. Reads use a DashMap
//! snapshot; every mutation is funneled through the registry's per-store
//! discipline so concurrent feedback events never race on a weight.

pub mod discovery;
pub mod engine;
pub mod registry;
pub mod seeds;

pub use discovery::discover_patterns;
pub use engine::AdaptiveLearningEngine;
pub use registry::PatternRegistry;
