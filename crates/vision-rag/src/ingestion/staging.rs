//! Index input resolution: source validation, index naming, and file staging
//!
//! The retriever only indexes directories, so an explicit file list is copied
//! into a scratch directory first. `StagingDir` removes that directory when
//! dropped, on success and on every error path.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::error::{Error, Result};

/// Where documents to index come from
#[derive(Debug, Clone, Copy)]
pub enum IndexSource<'a> {
    /// Every PDF in a folder
    Folder(&'a Path),
    /// An explicit list of PDF files
    Files(&'a [PathBuf]),
}

impl<'a> IndexSource<'a> {
    /// Exactly one of `folder` / `files` must be given
    pub fn from_options(folder: Option<&'a Path>, files: Option<&'a [PathBuf]>) -> Result<Self> {
        match (folder, files) {
            (Some(folder), None) => Ok(Self::Folder(folder)),
            (None, Some([])) => Err(Error::invalid_argument("file_paths must not be empty")),
            (None, Some(files)) => Ok(Self::Files(files)),
            (None, None) => Err(Error::invalid_argument(
                "Either folder_path or file_paths must be provided",
            )),
            (Some(_), Some(_)) => Err(Error::invalid_argument(
                "Only one of folder_path or file_paths may be provided",
            )),
        }
    }
}

/// Index name used when none is given
///
/// Folder: its base name. Files: the first file's base name up to its first `.`.
/// Leading dots are dropped in both cases (`.notes.pdf` gives `notes`).
pub fn derive_index_name(source: IndexSource<'_>) -> Result<String> {
    let name = match source {
        IndexSource::Folder(folder) => folder
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .or_else(|| {
                // "." or ".." have no file name until resolved
                folder
                    .canonicalize()
                    .ok()
                    .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            }),
        IndexSource::Files(files) => files.first().and_then(|first| {
            let base = first.file_name()?.to_string_lossy().into_owned();
            base.trim_start_matches('.')
                .split('.')
                .next()
                .map(str::to_string)
        }),
    };

    name.map(|n| n.trim_start_matches('.').to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| Error::invalid_argument("Cannot derive an index name; pass one explicitly"))
}

/// Scratch directory holding copies of the files to index
#[derive(Debug)]
pub struct StagingDir {
    dir: TempDir,
    staged: Vec<PathBuf>,
}

impl StagingDir {
    /// Copy `files` into a fresh directory under `parent`
    ///
    /// Every file is checked before anything is created or copied, so a
    /// missing file leaves no partial staging behind.
    pub fn stage(parent: &Path, files: &[PathBuf]) -> Result<Self> {
        let mut names = HashSet::new();
        for file in files {
            if !file.is_file() {
                return Err(Error::FileNotFound(file.clone()));
            }
            let name = file
                .file_name()
                .ok_or_else(|| Error::invalid_argument(format!("Not a file: {}", file.display())))?;
            if !names.insert(name.to_os_string()) {
                return Err(Error::invalid_argument(format!(
                    "Duplicate file name in file_paths: {}",
                    name.to_string_lossy()
                )));
            }
        }

        std::fs::create_dir_all(parent)?;
        let dir = tempfile::Builder::new()
            .prefix("staging-")
            .tempdir_in(parent)?;

        let mut staged = Vec::with_capacity(files.len());
        for file in files {
            // file_name presence was checked above
            let dest = dir.path().join(file.file_name().unwrap_or_default());
            std::fs::copy(file, &dest)?;
            staged.push(dest);
        }

        tracing::debug!("Staged {} file(s) in {}", staged.len(), dir.path().display());
        Ok(Self { dir, staged })
    }

    /// Directory to hand to the retriever
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Paths of the staged copies
    pub fn staged_files(&self) -> &[PathBuf] {
        &self.staged
    }
}
