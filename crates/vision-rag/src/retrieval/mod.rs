//! Page retrieval: ColPali page encoding, on-disk indexes, late-interaction search

pub mod colpali;
pub mod encoder;
pub mod scoring;
pub mod store;

pub use colpali::ColPaliRetriever;
pub use encoder::{MultiVector, PageEncoder, ServiceEncoder};
pub use scoring::{maxsim, rank_pages};
pub use store::{validate_index_name, IndexManifest, IndexStore, PageEmbedding, StoredIndex};
