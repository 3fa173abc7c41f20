//! Coordinate identity.
//!
//! A location is identified purely by the bit patterns of its latitude and
//! longitude. The same key doubles as the stem of its persisted file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::CoordinateError;

const KEY_LEN: usize = 32;
const FILE_EXTENSION: &str = "json";

/// Latitude/longitude pair compared bit-for-bit.
///
/// `0.0` and `-0.0` are different coordinates here, and so are two values that
/// only differ past the last printed digit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn key(&self) -> LocationKey {
        identity_key(self.latitude, self.longitude)
    }

    /// Check that the pair describes a point on the globe.
    ///
    /// The store itself accepts any pair; callers taking user input run this
    /// first.
    pub fn validate(&self) -> Result<(), CoordinateError> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(CoordinateError::NotFinite);
        }
        if self.latitude.abs() > 90.0 {
            return Err(CoordinateError::LatitudeOutOfRange(self.latitude));
        }
        if self.longitude.abs() > 180.0 {
            return Err(CoordinateError::LongitudeOutOfRange(self.longitude));
        }
        Ok(())
    }
}

impl PartialEq for Coordinates {
    fn eq(&self, other: &Self) -> bool {
        self.latitude.to_bits() == other.latitude.to_bits()
            && self.longitude.to_bits() == other.longitude.to_bits()
    }
}

impl Eq for Coordinates {}

impl Hash for Coordinates {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.latitude.to_bits().hash(state);
        self.longitude.to_bits().hash(state);
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.latitude, self.longitude)
    }
}

/// Stable identity key of a location: 32 lowercase hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationKey(String);

impl LocationKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the persisted location data, e.g. `<key>.json`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.0, FILE_EXTENSION)
    }

    /// Recover a key from a file name produced by [`LocationKey::file_name`].
    ///
    /// Returns `None` for anything else found in the data directory.
    pub fn parse_file_name(name: &str) -> Option<Self> {
        let stem = name.strip_suffix(FILE_EXTENSION)?.strip_suffix('.')?;
        Self::parse(stem)
    }

    /// Parse a key string, accepting only the canonical form.
    pub fn parse(s: &str) -> Option<Self> {
        let well_formed = s.len() == KEY_LEN
            && s.bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        well_formed.then(|| Self(s.to_string()))
    }

    /// Coordinates encoded in the key.
    pub fn coordinates(&self) -> Option<Coordinates> {
        let lat = u64::from_str_radix(self.0.get(..16)?, 16).ok()?;
        let lon = u64::from_str_radix(self.0.get(16..)?, 16).ok()?;
        Some(Coordinates::new(f64::from_bits(lat), f64::from_bits(lon)))
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the identity key of a coordinate pair.
pub fn identity_key(latitude: f64, longitude: f64) -> LocationKey {
    LocationKey(format!(
        "{:016x}{:016x}",
        latitude.to_bits(),
        longitude.to_bits()
    ))
}
