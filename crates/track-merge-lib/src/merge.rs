//! Ordered concatenation of track sources
//!
//! The merge is format-agnostic and never fails: it copies the points of each
//! source, in source order, into one sequence. Checking that the sources share a
//! format and that there are enough of them is left to the caller (see
//! [`SourceSet`](crate::SourceSet)).

use crate::{FormatKind, Point, TrackSource, TrackStats};

/// The concatenated points of several sources plus descriptive metadata
#[derive(Debug, Clone, PartialEq)]
pub struct MergedTrack<'a> {
    sources: &'a [TrackSource],
    points: Vec<Point>,
    title: String,
}

/// Concatenate the points of `sources`, keeping source order and the document
/// order inside each source
pub fn merge<'a>(sources: &'a [TrackSource], title: impl Into<String>) -> MergedTrack<'a> {
    #[cfg(feature = "profiling")]
    profiling::scope!("merge::merge");

    let total: usize = sources.iter().map(TrackSource::len).sum();
    let mut points = Vec::with_capacity(total);
    for source in sources {
        points.extend_from_slice(source.points());
    }

    let title = title.into();
    tracing::debug!(
        "Merged {} sources into {} points ({:?})",
        sources.len(),
        points.len(),
        title
    );

    MergedTrack {
        sources,
        points,
        title,
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<'a> MergedTrack<'a> {
    /// The contributing sources, in merge order
    #[inline]
    pub fn sources(&self) -> &'a [TrackSource] {
        self.sources
    }

    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    #[inline]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[inline]
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Format of the first source, or `None` for an empty merge
    #[inline]
    pub fn format(&self) -> Option<FormatKind> {
        self.sources.first().map(TrackSource::format)
    }

    /// Statistics over the merged points
    pub fn stats(&self) -> TrackStats {
        TrackStats::from_points(&self.points)
    }

    pub fn into_points(self) -> Vec<Point> {
        self.points
    }
}
