//! Track Merge Library - Core Data Structures for GPX/TCX Track Merging
//!
//! This library reads GPS activity recordings in the GPX and TCX formats into a shared
//! point model, concatenates several recordings of the same format, and writes the
//! result back out as a single GPX 1.1 document.
//!
//! # Architecture
//!
//! - **[`Point`]** / **[`TrackSource`]**: Immutable point records and per-document sequences
//! - **[`parser`]**: Format-specific readers selected by an explicit [`FormatKind`]
//! - **[`merge()`]**: Ordered concatenation into a [`MergedTrack`]
//! - **[`serializer`]**: GPX 1.1 rendering of a merged track
//! - **[`SourceSet`]**: Caller-level manager enforcing the merge preconditions
//!
//! # Example
//!
//! ```
//! use track_merge_lib::{FormatKind, TrackSource, merge, serialize};
//!
//! let a = TrackSource::parse(FormatKind::Gpx, r#"<gpx><trk><trkseg>
//!     <trkpt lat="1" lon="1"/><trkpt lat="2" lon="2"/>
//! </trkseg></trk></gpx>"#).unwrap();
//! let b = TrackSource::parse(FormatKind::Gpx, r#"<gpx><trkpt lat="3" lon="3"/></gpx>"#).unwrap();
//!
//! let sources = [a, b];
//! let merged = merge(&sources, "Morning ride");
//! assert_eq!(merged.points().len(), 3);
//! assert_eq!(serialize(&merged).matches("<trkpt ").count(), 3);
//! ```

mod collection;
mod merge;
pub mod parser;
mod point;
pub mod serializer;
mod stats;
mod xml;

// Public API exports
pub use collection::{CollectionInfo, Config, SourceSet};
pub use merge::{MergedTrack, merge};
pub use parser::{ParseDiagnostics, ParseOutcome, parse, parse_with_diagnostics};
pub use point::{FormatKind, Point, TrackSource};
pub use serializer::{CREATOR, GPX_MIME_TYPE, serialize, write_to};
pub use stats::TrackStats;

/// Error produced when a document cannot be read at all
///
/// Only whole-document failures are reported here. Missing or unreadable
/// coordinates inside an otherwise well-formed document are defaulted and
/// counted in [`ParseDiagnostics`] instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Malformed XML at byte {position}: {reason}")]
    Malformed { position: u64, reason: String },
}

/// Errors raised by the caller layer ([`SourceSet`]) around parsing and merging
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Failed to parse {name}: {error}")]
    Parse {
        name: String,
        #[source]
        error: ParseError,
    },

    #[error("Failed to read {name}: {error}")]
    Io {
        name: String,
        #[source]
        error: std::io::Error,
    },

    #[error("Format mismatch: {name} is not a {expected} file (found {found})")]
    FormatMismatch {
        name: String,
        expected: FormatKind,
        found: String,
    },

    #[error("Need at least {required} sources to merge, but only {available} loaded")]
    TooFewSources { required: usize, available: usize },
}

impl SourceError {
    /// Name of the offending source, if the error is tied to one
    pub fn source_name(&self) -> Option<&str> {
        match self {
            SourceError::Parse { name, .. }
            | SourceError::Io { name, .. }
            | SourceError::FormatMismatch { name, .. } => Some(name),
            SourceError::TooFewSources { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SourceError>;
