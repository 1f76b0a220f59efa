//! Page renderer trait for PDF rasterization

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;
use crate::types::PageImage;

/// Trait for converting a paged document into ordered page images
///
/// Implementations:
/// - `PdftoppmRenderer`: poppler's pdftoppm
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Render every page, ordered by page number starting at 1
    async fn render(&self, path: &Path) -> Result<Vec<PageImage>>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
