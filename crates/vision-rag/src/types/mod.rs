//! Core types for documents, page images, and answers

pub mod document;
pub mod response;

pub use document::{DocumentId, IndexedDocument, PageImage};
pub use response::{Answer, PageRef, SearchResult};
