//! Layout probes for GPS coordinate values.
//!
//! A coordinate is three rationals (degrees, minutes, seconds). Metadata
//! backends hand them over in different shapes, so each known layout is a
//! pure function tried in a fixed order; the first one that type-matches wins.

/// Integer words of a tag value, normalized away from the metadata backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagData {
    /// 64-bit unsigned words
    U64(Vec<u64>),
    /// 64-bit signed words
    I64(Vec<i64>),
    /// 32-bit unsigned words
    U32(Vec<u32>),
    /// 32-bit signed words
    I32(Vec<i32>),
}

/// A decoded degrees/minutes/seconds triple
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dms {
    pub degrees: f64,
    pub minutes: f64,
    pub seconds: f64,
}

impl Dms {
    /// Unsigned decimal degrees
    pub fn to_decimal(self) -> f64 {
        self.degrees + self.minutes / 60.0 + self.seconds / 3600.0
    }
}

/// One way of reading a coordinate out of tag words
pub type CoordinateProbe = fn(&TagData) -> Option<Dms>;

/// Probes in the order they are tried. Packed 64-bit rationals come first.
pub const COORDINATE_PROBES: &[CoordinateProbe] = &[
    packed_u64,
    six_words_u64,
    six_words_i64,
    six_words_u32,
    six_words_i32,
];

/// Decode a coordinate to unsigned decimal degrees using the first matching probe
pub fn decode_coordinate(data: &TagData) -> Option<f64> {
    COORDINATE_PROBES
        .iter()
        .find_map(|probe| probe(data))
        .map(Dms::to_decimal)
        .filter(|value| value.is_finite())
}

/// Apply a hemisphere reference. `negative` is the letter that flips the sign
/// ('S' for latitude, 'W' for longitude).
pub fn apply_hemisphere(value: f64, reference: Option<&str>, negative: char) -> f64 {
    let flips = reference
        .and_then(|r| r.trim().chars().next())
        .is_some_and(|c| c.eq_ignore_ascii_case(&negative));
    if flips {
        -value
    } else {
        value
    }
}

/// Split a packed rational: low 32 bits numerator, high 32 bits denominator.
pub fn unpack_rational(packed: u64) -> f64 {
    let numerator = (packed & 0xFFFF_FFFF) as u32;
    let denominator = (packed >> 32) as u32;
    ratio(numerator as f64, denominator as f64)
}

// A zero denominator zeroes that component instead of failing the read.
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

fn packed_u64(data: &TagData) -> Option<Dms> {
    match data {
        TagData::U64(words) if words.len() == 3 => Some(Dms {
            degrees: unpack_rational(words[0]),
            minutes: unpack_rational(words[1]),
            seconds: unpack_rational(words[2]),
        }),
        _ => None,
    }
}

fn six_words_u64(data: &TagData) -> Option<Dms> {
    match data {
        TagData::U64(words) => dms_from_words(&to_f64(words, |w| w as f64)),
        _ => None,
    }
}

fn six_words_i64(data: &TagData) -> Option<Dms> {
    match data {
        TagData::I64(words) => dms_from_words(&to_f64(words, |w| w as f64)),
        _ => None,
    }
}

fn six_words_u32(data: &TagData) -> Option<Dms> {
    match data {
        TagData::U32(words) => dms_from_words(&to_f64(words, f64::from)),
        _ => None,
    }
}

fn six_words_i32(data: &TagData) -> Option<Dms> {
    match data {
        TagData::I32(words) => dms_from_words(&to_f64(words, f64::from)),
        _ => None,
    }
}

fn to_f64<T: Copy>(words: &[T], convert: impl Fn(T) -> f64) -> Vec<f64> {
    words.iter().map(|&w| convert(w)).collect()
}

fn dms_from_words(words: &[f64]) -> Option<Dms> {
    if words.len() < 6 {
        return None;
    }
    Some(Dms {
        degrees: ratio(words[0], words[1]),
        minutes: ratio(words[2], words[3]),
        seconds: ratio(words[4], words[5]),
    })
}
