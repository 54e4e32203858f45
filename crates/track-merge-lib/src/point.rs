//! Point model shared by every format
//!
//! A [`Point`] is created once per track-point element while parsing and never
//! changes afterwards. A [`TrackSource`] owns the points of one parsed document.

use crate::{ParseError, parser};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// One geographic sample of a recording
///
/// Latitude and longitude are always set (possibly defaulted to `0.0`), while
/// elevation and timestamp are independently optional. The timestamp is kept
/// exactly as written in the source document.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Elevation in meters, if the source carried one
    pub elevation: Option<f64>,
    /// Opaque timestamp token, verbatim from the source
    pub timestamp: Option<String>,
}

impl Point {
    /// Create a point with coordinates only
    #[inline]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            elevation: None,
            timestamp: None,
        }
    }

    #[inline]
    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = Some(elevation);
        self
    }

    #[inline]
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Point in `geo` convention (x = longitude, y = latitude)
    #[inline]
    pub fn geo_point(&self) -> geo::Point<f64> {
        geo::Point::new(self.longitude, self.latitude)
    }

    /// Whether the point sits exactly on (0, 0), which is what defaulted coordinates produce
    #[inline]
    pub fn is_origin(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }
}

/// The two supported input formats
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FormatKind {
    /// GPS Exchange Format, also the output format
    Gpx,
    /// Training Center XML
    Tcx,
}

impl FormatKind {
    pub fn all() -> &'static [Self] {
        &[Self::Gpx, Self::Tcx]
    }

    /// Upper-case label used in generated metadata
    pub fn label(&self) -> &'static str {
        match self {
            Self::Gpx => "GPX",
            Self::Tcx => "TCX",
        }
    }

    /// File extension without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Gpx => "gpx",
            Self::Tcx => "tcx",
        }
    }

    /// Detect the format from a file name's extension (case-insensitive)
    ///
    /// This is a helper for callers choosing the format tag; the parsers never
    /// look at file names or sniff the document content.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let extension = path.as_ref().extension()?.to_str()?;
        extension.parse().ok()
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FormatKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|format| format.extension().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown track format: {s:?} (expected gpx or tcx)"))
    }
}

/// The ordered points of one parsed input document plus its format tag
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackSource {
    format: FormatKind,
    points: Vec<Point>,
}

impl TrackSource {
    /// Wrap an already-built point sequence
    pub fn new(format: FormatKind, points: Vec<Point>) -> Self {
        Self { format, points }
    }

    /// Parse a document of the given format into a source
    pub fn parse(format: FormatKind, document: &str) -> Result<Self, ParseError> {
        let points = parser::parse(format, document)?;
        Ok(Self::new(format, points))
    }

    #[inline]
    pub fn format(&self) -> FormatKind {
        self.format
    }

    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Give up the source and keep its points
    pub fn into_points(self) -> Vec<Point> {
        self.points
    }
}
