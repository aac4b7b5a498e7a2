//! Cancellable "load images from folder" workflow.

use super::walker::{list_images, LoadConfig};
use super::{CancellationToken, ImageItem, SortOrder};
use crate::core::metadata::MetadataReader;
use crate::error::ScanError;
use crate::events::{Event, EventSender, LoadEvent, LoadProgress};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use tracing::{debug, info};

/// Outcome of a folder load
#[derive(Debug, Default)]
pub struct LoadResult {
    /// Annotated images in the configured order
    pub items: Vec<ImageItem>,
    /// True if the token was cancelled before every file was read
    pub cancelled: bool,
    /// Per-file failures (non-fatal)
    pub errors: Vec<ScanError>,
}

/// Enumerates a folder and annotates each image with its metadata
#[derive(Debug, Clone, Default)]
pub struct ImageLoader {
    config: LoadConfig,
    reader: MetadataReader,
}

impl ImageLoader {
    pub fn new(config: LoadConfig) -> Self {
        Self {
            config,
            reader: MetadataReader::new(),
        }
    }

    pub fn config(&self) -> &LoadConfig {
        &self.config
    }

    /// Load the images in `folder`, skipping any path in `processed`.
    ///
    /// `cancel` is checked before each file; files not yet read when it
    /// fires are left out and the result is flagged `cancelled`.
    pub fn load(
        &self,
        folder: &Path,
        processed: &HashSet<PathBuf>,
        cancel: &CancellationToken,
        events: &EventSender,
    ) -> Result<LoadResult, ScanError> {
        events.send(Event::Load(LoadEvent::Started {
            folder: folder.to_path_buf(),
        }));

        let (paths, mut errors) = list_images(folder, &self.config)?;
        let pending: Vec<PathBuf> = paths
            .into_iter()
            .filter(|p| !processed.contains(p))
            .collect();
        let total = pending.len();
        debug!(?folder, total, skipped = processed.len(), "loading images");

        let loaded = AtomicUsize::new(0);
        let outcomes: Vec<Option<Result<ImageItem, ScanError>>> = pending
            .par_iter()
            .map(|path| {
                if cancel.is_cancelled() {
                    return None;
                }
                let outcome = self.annotate(path);
                let count = loaded.fetch_add(1, AtomicOrdering::Relaxed) + 1;

                match &outcome {
                    Ok(_) => events.send(Event::Load(LoadEvent::ImageLoaded { path: path.clone() })),
                    Err(e) => events.send(Event::Load(LoadEvent::Error {
                        path: path.clone(),
                        message: e.to_string(),
                    })),
                }
                events.send(Event::Load(LoadEvent::Progress(LoadProgress {
                    loaded: count,
                    total,
                    current_path: path.clone(),
                })));
                Some(outcome)
            })
            .collect();

        let cancelled = outcomes.iter().any(Option::is_none);
        let mut items = Vec::with_capacity(total);
        for outcome in outcomes.into_iter().flatten() {
            match outcome {
                Ok(item) => items.push(item),
                Err(e) => errors.push(e),
            }
        }
        sort_items(&mut items, self.config.sort, self.config.descending);

        if cancelled {
            info!(?folder, loaded = items.len(), "load cancelled");
            events.send(Event::Load(LoadEvent::Cancelled {
                loaded: items.len(),
            }));
        } else {
            info!(?folder, total = items.len(), "load complete");
            events.send(Event::Load(LoadEvent::Completed { total: items.len() }));
        }

        Ok(LoadResult {
            items,
            cancelled,
            errors,
        })
    }

    fn annotate(&self, path: &Path) -> Result<ImageItem, ScanError> {
        let metadata = fs::metadata(path).map_err(|source| ScanError::ReadDirectory {
            path: path.to_path_buf(),
            source,
        })?;
        let created = metadata
            .created()
            .or_else(|_| metadata.modified())
            .ok()
            .map(DateTime::<Utc>::from);
        let exif = self.reader.read(path);

        Ok(ImageItem {
            path: path.to_path_buf(),
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            size: metadata.len(),
            created,
            orientation: exif.orientation,
            gps: exif.gps,
        })
    }
}

/// Order items by `sort`; file name breaks ties.
pub(crate) fn sort_items(items: &mut [ImageItem], sort: SortOrder, descending: bool) {
    items.sort_by(|a, b| {
        let primary = match sort {
            SortOrder::Name => Ordering::Equal,
            SortOrder::CreationDate => a.created.cmp(&b.created),
            SortOrder::Size => a.size.cmp(&b.size),
        };
        let ordering = primary.then_with(|| a.file_name.cmp(&b.file_name));
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}
