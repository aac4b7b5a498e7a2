//! # Scanner Module
//!
//! Finds images in a folder and annotates them for display.
//!
//! ## Supported Formats
//! - JPEG (.jpg, .jpeg)
//! - PNG (.png)
//! - BMP (.bmp)
//! - WebP (.webp)
//!
//! ## Example
//! ```rust,ignore
//! use picture_sorter::core::scanner::{CancellationToken, ImageLoader, LoadConfig};
//!
//! let loader = ImageLoader::new(LoadConfig::default());
//! let result = loader.load("/Users/photos".as_ref(), &processed, &CancellationToken::new(), &events)?;
//! ```

mod filter;
mod loader;
mod walker;

pub use filter::ImageFilter;
pub use loader::{ImageLoader, LoadResult};
pub use walker::{list_images, LoadConfig};

use crate::core::metadata::{GpsCoordinates, Rotation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// An image found in a folder, annotated with its metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageItem {
    pub path: PathBuf,
    pub file_name: String,
    /// File size in bytes
    pub size: u64,
    /// Creation time, or modification time where the platform lacks it
    pub created: Option<DateTime<Utc>>,
    /// Rotation needed to display the image upright
    pub orientation: Rotation,
    pub gps: Option<GpsCoordinates>,
}

/// Supported image formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Bmp,
    WebP,
    Unknown,
}

impl ImageFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => ImageFormat::Jpeg,
            "png" => ImageFormat::Png,
            "bmp" => ImageFormat::Bmp,
            "webp" => ImageFormat::WebP,
            _ => ImageFormat::Unknown,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(ImageFormat::from_extension)
            .unwrap_or(ImageFormat::Unknown)
    }

    /// Check if this format is supported
    pub fn is_supported(&self) -> bool {
        !matches!(self, ImageFormat::Unknown)
    }

    /// Container written back after an in-place edit.
    ///
    /// JPEG, PNG and BMP keep their format; anything else is written as PNG.
    pub fn encoder_format(&self) -> image::ImageFormat {
        match self {
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Bmp => image::ImageFormat::Bmp,
            ImageFormat::Png | ImageFormat::WebP | ImageFormat::Unknown => image::ImageFormat::Png,
        }
    }
}

/// Whether `path` has a supported image extension
pub fn is_image_file(path: &Path) -> bool {
    ImageFormat::from_path(path).is_supported()
}

/// How loaded images are ordered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Name,
    CreationDate,
    Size,
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "name" => Ok(SortOrder::Name),
            "date" | "created" | "creation-date" => Ok(SortOrder::CreationDate),
            "size" => Ok(SortOrder::Size),
            other => Err(format!("unknown sort order '{}'", other)),
        }
    }
}

/// Cooperative cancellation flag shared between a caller and a load.
///
/// Cancelling only stops enumeration; it never interrupts a file operation.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_format_from_extension_any_case() {
        assert_eq!(ImageFormat::from_extension("jpg"), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_extension("JPEG"), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_extension("Png"), ImageFormat::Png);
        assert_eq!(ImageFormat::from_extension("webp"), ImageFormat::WebP);
    }

    #[test]
    fn unsupported_extensions() {
        assert_eq!(ImageFormat::from_extension("heic"), ImageFormat::Unknown);
        assert_eq!(ImageFormat::from_extension("gif"), ImageFormat::Unknown);
        assert!(!is_image_file(Path::new("/photos/notes.txt")));
        assert!(!is_image_file(Path::new("/photos/no_extension")));
        assert!(is_image_file(Path::new("/photos/IMG_0001.JPG")));
    }

    #[test]
    fn encoder_defaults_to_png() {
        assert_eq!(ImageFormat::Jpeg.encoder_format(), image::ImageFormat::Jpeg);
        assert_eq!(ImageFormat::Bmp.encoder_format(), image::ImageFormat::Bmp);
        assert_eq!(ImageFormat::WebP.encoder_format(), image::ImageFormat::Png);
        assert_eq!(ImageFormat::Unknown.encoder_format(), image::ImageFormat::Png);
    }

    #[test]
    fn cancellation_is_shared_between_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn sort_order_parses() {
        assert_eq!("name".parse::<SortOrder>(), Ok(SortOrder::Name));
        assert_eq!("date".parse::<SortOrder>(), Ok(SortOrder::CreationDate));
        assert_eq!("SIZE".parse::<SortOrder>(), Ok(SortOrder::Size));
        assert!("colour".parse::<SortOrder>().is_err());
    }
}
