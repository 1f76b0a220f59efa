//! Document ingestion: PDF rasterization, input staging, and the sample document

pub mod rasterizer;
pub mod sample;
pub mod staging;

pub use rasterizer::PdftoppmRenderer;
pub use sample::{write_sample_pdf, SAMPLE_QUESTIONS};
pub use staging::{derive_index_name, IndexSource, StagingDir};
