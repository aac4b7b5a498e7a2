//! # Metadata Module
//!
//! Reads the display orientation and GPS position of a photo.
//!
//! ## Extracted Fields
//! - Orientation, reduced to the rotation needed to show the image upright
//! - GPS latitude/longitude in signed decimal degrees
//!
//! Only the metadata directory is parsed; pixel data is never decoded.
//! Everything here is advisory: unreadable or corrupt metadata yields
//! `Rotation::Rotate0` and no GPS, never an error.

mod probes;
mod reader;

pub use probes::{
    apply_hemisphere, decode_coordinate, unpack_rational, CoordinateProbe, Dms, TagData,
    COORDINATE_PROBES,
};
pub use reader::{read_metadata, MetadataReader};

#[cfg(test)]
pub(crate) use reader::tests::tiff_fixture;

use serde::{Deserialize, Serialize};

/// Clockwise rotation in quarter turns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rotation {
    #[default]
    Rotate0,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl Rotation {
    /// Normalize any multiple of 90 degrees (negative = counter-clockwise).
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(Rotation::Rotate0),
            90 => Some(Rotation::Rotate90),
            180 => Some(Rotation::Rotate180),
            270 => Some(Rotation::Rotate270),
            _ => None,
        }
    }

    /// Map an EXIF orientation value to the rotation that displays it upright.
    ///
    /// Mirrored orientations (2, 4, 5, 7) and unknown values map to no rotation.
    pub fn from_exif_orientation(value: u32) -> Self {
        match value {
            3 => Rotation::Rotate180,
            6 => Rotation::Rotate90,
            8 => Rotation::Rotate270,
            _ => Rotation::Rotate0,
        }
    }

    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Rotate0 => 0,
            Rotation::Rotate90 => 90,
            Rotation::Rotate180 => 180,
            Rotation::Rotate270 => 270,
        }
    }

    /// The rotation that undoes this one
    pub fn inverse(self) -> Self {
        match self {
            Rotation::Rotate0 => Rotation::Rotate0,
            Rotation::Rotate90 => Rotation::Rotate270,
            Rotation::Rotate180 => Rotation::Rotate180,
            Rotation::Rotate270 => Rotation::Rotate90,
        }
    }
}

/// Signed decimal degrees (negative = South / West)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsCoordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn as_tuple(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

impl std::fmt::Display for GpsCoordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// Everything the reader extracts from one file
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub orientation: Rotation,
    pub gps: Option<GpsCoordinates>,
}
