//! Provider abstractions for retrieval, rasterization, and generation
//!
//! The orchestrator only talks to these traits, so tests can swap in fakes
//! without loading models or shelling out to poppler.

pub mod generator;
pub mod ollama;
pub mod renderer;
pub mod retriever;
pub mod retry;

pub use generator::{GenerationOptions, VisionGenerator};
pub use ollama::OllamaVision;
pub use renderer::PageRenderer;
pub use retriever::DocumentRetriever;
