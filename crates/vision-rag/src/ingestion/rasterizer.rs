//! PDF rasterization via pdftoppm (poppler-utils)

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::RenderConfig;
use crate::error::{Error, Result};
use crate::providers::PageRenderer;
use crate::types::PageImage;

/// Output file prefix handed to pdftoppm
const PAGE_PREFIX: &str = "page";

/// Renders PDF pages to PNG with poppler's pdftoppm
pub struct PdftoppmRenderer {
    config: RenderConfig,
}

impl PdftoppmRenderer {
    /// Create a renderer from config
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Check if pdftoppm is available
    pub fn has_pdftoppm(&self) -> bool {
        Command::new(&self.config.pdftoppm)
            .arg("-v")
            .output()
            .map(|_| true) // -v prints to stderr and may exit non-zero
            .unwrap_or(false)
    }

    /// Rasterize synchronously; used from `spawn_blocking`
    pub fn render_blocking(&self, pdf_path: &Path) -> Result<Vec<PageImage>> {
        if !pdf_path.is_file() {
            return Err(Error::FileNotFound(pdf_path.to_path_buf()));
        }

        let temp_dir = tempfile::Builder::new()
            .prefix("vision-rag-render-")
            .tempdir()?;

        let output = Command::new(&self.config.pdftoppm)
            .arg("-png")
            .arg("-r")
            .arg(self.config.dpi.to_string())
            .arg(pdf_path)
            .arg(temp_dir.path().join(PAGE_PREFIX))
            .output()
            .map_err(|e| {
                Error::render(
                    pdf_path,
                    format!(
                        "failed to run {} ({}). Install with: apt install poppler-utils",
                        self.config.pdftoppm, e
                    ),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::render(
                pdf_path,
                format!("pdftoppm error: {}", stderr.trim()),
            ));
        }

        let pages = collect_pages(temp_dir.path())?;
        if pages.is_empty() {
            return Err(Error::render(pdf_path, "pdftoppm produced no images"));
        }

        tracing::debug!("Rendered {} page(s) from {}", pages.len(), pdf_path.display());
        Ok(pages)
    }
}

#[async_trait]
impl PageRenderer for PdftoppmRenderer {
    async fn render(&self, path: &Path) -> Result<Vec<PageImage>> {
        let renderer = Self::new(&self.config);
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || renderer.render_blocking(&path))
            .await
            .map_err(|e| Error::internal(format!("Task join error: {}", e)))?
    }

    fn name(&self) -> &str {
        "pdftoppm"
    }
}

/// Page number encoded in a pdftoppm output name such as `page-07.png`
fn page_number(path: &Path) -> Option<u32> {
    if path.extension()? != "png" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let (prefix, number) = stem.rsplit_once('-')?;
    if prefix != PAGE_PREFIX {
        return None;
    }
    number.parse().ok()
}

/// Read rendered pages from `dir`, ordered by page number
fn collect_pages(dir: &Path) -> Result<Vec<PageImage>> {
    let mut numbered: Vec<(u32, PathBuf)> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter_map(|p| page_number(&p).map(|n| (n, p)))
        .collect();

    numbered.sort_by_key(|(n, _)| *n);

    numbered
        .into_iter()
        .map(|(n, p)| Ok(PageImage::new(n, std::fs::read(&p)?)))
        .collect()
}
