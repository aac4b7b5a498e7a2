//! EXIF-backed metadata reader.

use super::probes::{apply_hemisphere, decode_coordinate, TagData};
use super::{GpsCoordinates, ImageMetadata, Rotation};
use exif::{Context, Exif, Field, In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::trace;

/// Raw TIFF tag id of the orientation field
const ORIENTATION_TAG_ID: u16 = 0x0112;

/// Ways of locating the orientation field, tried in order
type FieldQuery = for<'a> fn(&'a Exif) -> Option<&'a Field>;

const ORIENTATION_QUERIES: &[FieldQuery] = &[named_orientation, raw_orientation];

/// Reads orientation and GPS metadata without decoding pixels.
///
/// The file is opened read-only and closed before each call returns.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataReader;

impl MetadataReader {
    pub fn new() -> Self {
        Self
    }

    /// Rotation needed to display the image upright
    pub fn read_orientation(&self, path: &Path) -> Rotation {
        load_exif(path)
            .map(|exif| orientation(&exif))
            .unwrap_or_default()
    }

    /// GPS position, or `None` when either coordinate is missing or unreadable
    pub fn read_gps(&self, path: &Path) -> Option<GpsCoordinates> {
        load_exif(path).and_then(|exif| gps(&exif))
    }

    /// Orientation and GPS from a single read of the file
    pub fn read(&self, path: &Path) -> ImageMetadata {
        read_metadata(path)
    }
}

/// Extract orientation and GPS metadata from a photo file
pub fn read_metadata(path: &Path) -> ImageMetadata {
    match load_exif(path) {
        Some(exif) => ImageMetadata {
            orientation: orientation(&exif),
            gps: gps(&exif),
        },
        None => ImageMetadata::default(),
    }
}

fn load_exif(path: &Path) -> Option<Exif> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            trace!(?path, error = %e, "cannot open file for metadata");
            return None;
        }
    };

    let mut bufreader = BufReader::new(file);
    match Reader::new().read_from_container(&mut bufreader) {
        Ok(exif) => Some(exif),
        Err(e) => {
            trace!(?path, error = %e, "no readable EXIF directory");
            None
        }
    }
}

fn named_orientation(exif: &Exif) -> Option<&Field> {
    exif.get_field(Tag::Orientation, In::PRIMARY)
}

// Any IFD carrying the raw tag id, e.g. when only the thumbnail directory has it
fn raw_orientation(exif: &Exif) -> Option<&Field> {
    exif.fields()
        .find(|f| f.tag.context() == Context::Tiff && f.tag.number() == ORIENTATION_TAG_ID)
}

fn orientation(exif: &Exif) -> Rotation {
    ORIENTATION_QUERIES
        .iter()
        .find_map(|query| query(exif))
        .and_then(|field| field.value.get_uint(0))
        .map(Rotation::from_exif_orientation)
        .unwrap_or_default()
}

fn gps(exif: &Exif) -> Option<GpsCoordinates> {
    let latitude = coordinate(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, 'S')?;
    let longitude = coordinate(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, 'W')?;
    Some(GpsCoordinates::new(latitude, longitude))
}

fn coordinate(exif: &Exif, value_tag: Tag, ref_tag: Tag, negative: char) -> Option<f64> {
    let field = gps_field(exif, value_tag)?;
    let Some(data) = tag_data(&field.value) else {
        trace!(tag = %value_tag, "unsupported GPS value type");
        return None;
    };
    let value = decode_coordinate(&data)?;
    let reference = gps_field(exif, ref_tag).and_then(|f| reference_letter(&f.value));
    Some(apply_hemisphere(value, reference.as_deref(), negative))
}

fn gps_field(exif: &Exif, tag: Tag) -> Option<&Field> {
    exif.get_field(tag, In::PRIMARY)
        .or_else(|| exif.fields().find(|f| f.tag == tag))
}

/// Flatten an EXIF value into integer words for the layout probes
fn tag_data(value: &Value) -> Option<TagData> {
    match value {
        Value::Rational(v) => Some(TagData::U32(
            v.iter().flat_map(|r| [r.num, r.denom]).collect(),
        )),
        Value::SRational(v) => Some(TagData::I32(
            v.iter().flat_map(|r| [r.num, r.denom]).collect(),
        )),
        Value::Long(v) => Some(TagData::U32(v.clone())),
        Value::SLong(v) => Some(TagData::I32(v.clone())),
        Value::Short(v) => Some(TagData::U32(v.iter().map(|&s| u32::from(s)).collect())),
        Value::Byte(bytes) | Value::Undefined(bytes, _) => packed_words(bytes),
        _ => None,
    }
}

// Opaque blobs hold little-endian 64-bit words (numerator in the low half)
fn packed_words(bytes: &[u8]) -> Option<TagData> {
    if bytes.is_empty() || bytes.len() % 8 != 0 {
        return None;
    }
    let words = bytes
        .chunks_exact(8)
        .map(|chunk| {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            u64::from_le_bytes(word)
        })
        .collect();
    Some(TagData::U64(words))
}

fn reference_letter(value: &Value) -> Option<String> {
    let bytes = match value {
        Value::Ascii(vec) => vec.first()?.as_slice(),
        Value::Byte(bytes) | Value::Undefined(bytes, _) => bytes.as_slice(),
        _ => return None,
    };
    let text = std::str::from_utf8(bytes).ok()?;
    let trimmed = text.trim_end_matches('\0').trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
