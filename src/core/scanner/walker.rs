//! Folder enumeration using walkdir.

use super::filter::{is_hidden, ImageFilter};
use super::SortOrder;
use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Configuration for loading images from a folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadConfig {
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Folder depth to descend (1 = only the folder itself)
    pub max_depth: usize,
    /// Custom extensions to include (None = use defaults)
    pub extensions: Option<Vec<String>>,
    pub sort: SortOrder,
    pub descending: bool,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            include_hidden: false,
            max_depth: 1,
            extensions: None,
            sort: SortOrder::Name,
            descending: false,
        }
    }
}

impl LoadConfig {
    pub(crate) fn filter(&self) -> ImageFilter {
        let filter = ImageFilter::new().with_hidden(self.include_hidden);
        match &self.extensions {
            Some(extensions) => filter.with_extensions(extensions.clone()),
            None => filter,
        }
    }
}

/// List the image files in `folder`, ordered by path.
///
/// Unreadable entries are collected as errors; only a missing or
/// non-directory `folder` fails the whole call.
pub fn list_images(
    folder: &Path,
    config: &LoadConfig,
) -> Result<(Vec<PathBuf>, Vec<ScanError>), ScanError> {
    if !folder.is_dir() {
        return Err(ScanError::DirectoryNotFound {
            path: folder.to_path_buf(),
        });
    }

    let filter = config.filter();
    let mut paths = Vec::new();
    let mut errors = Vec::new();

    let walker = WalkDir::new(folder)
        .max_depth(config.max_depth.max(1))
        .sort_by_file_name()
        .into_iter()
        // Never descend into hidden folders unless asked; the root is exempt
        .filter_entry(|entry| {
            entry.depth() == 0 || filter.includes_hidden() || !is_hidden(entry.path())
        });

    for entry in walker {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && filter.should_include(entry.path()) {
                    paths.push(entry.into_path());
                }
            }
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                let error = if e.io_error().map(|io| io.kind())
                    == Some(std::io::ErrorKind::PermissionDenied)
                {
                    ScanError::PermissionDenied { path }
                } else {
                    ScanError::ReadDirectory {
                        path,
                        source: std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
                    }
                };
                errors.push(error);
            }
        }
    }

    paths.sort();
    Ok((paths, errors))
}
