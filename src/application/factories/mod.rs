mod engine_factory;

pub use engine_factory::{Engine, EngineFactory};
