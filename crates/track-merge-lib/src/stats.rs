//! Summary figures for a point sequence
//!
//! Everything is computed in a single pass over the points, in the order they
//! are stored. Coordinates are taken as they are: no range checks, and
//! defaulted `(0, 0)` points are counted rather than skipped.

use crate::Point;
use geo::{Coord, Rect};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Earth's mean radius in meters
const EARTH_RADIUS_M: f64 = 6371000.0;

/// Statistics over an ordered point sequence
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackStats {
    /// Total number of points
    pub point_count: usize,
    /// Points carrying an elevation
    pub with_elevation: usize,
    /// Points carrying a timestamp
    pub with_timestamp: usize,
    /// Points sitting exactly on (0, 0), the value used for defaulted coordinates
    pub defaulted_origin_points: usize,
    /// Great-circle length along consecutive points, in meters
    pub distance_meters: f64,
    /// Bounding box with x = longitude and y = latitude (None if empty)
    pub bounds: Option<Rect<f64>>,
    /// Lowest and highest elevation (None if no point has one)
    pub elevation_range: Option<(f64, f64)>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl TrackStats {
    /// Compute statistics for the given points
    pub fn from_points(points: &[Point]) -> Self {
        #[cfg(feature = "profiling")]
        profiling::scope!("stats::from_points");

        let mut stats = TrackStats {
            point_count: points.len(),
            ..Default::default()
        };

        let mut min = Coord {
            x: f64::INFINITY,
            y: f64::INFINITY,
        };
        let mut max = Coord {
            x: f64::NEG_INFINITY,
            y: f64::NEG_INFINITY,
        };
        let mut prev: Option<&Point> = None;

        for point in points {
            min.x = min.x.min(point.longitude);
            min.y = min.y.min(point.latitude);
            max.x = max.x.max(point.longitude);
            max.y = max.y.max(point.latitude);

            if let Some(elevation) = point.elevation {
                stats.with_elevation += 1;
                stats.elevation_range = Some(match stats.elevation_range {
                    Some((low, high)) => (low.min(elevation), high.max(elevation)),
                    None => (elevation, elevation),
                });
            }
            if point.timestamp.is_some() {
                stats.with_timestamp += 1;
            }
            if point.is_origin() {
                stats.defaulted_origin_points += 1;
            }

            if let Some(prev) = prev {
                stats.distance_meters += haversine_distance(prev, point);
            }
            prev = Some(point);
        }

        if !points.is_empty() {
            stats.bounds = Some(Rect::new(min, max));
        }

        stats
    }

    /// Bounds as `(min_lat, min_lon, max_lat, max_lon)`
    pub fn bounds_lat_lon(&self) -> Option<(f64, f64, f64, f64)> {
        self.bounds
            .map(|rect| (rect.min().y, rect.min().x, rect.max().y, rect.max().x))
    }
}

/// Haversine distance between two points in meters
#[inline]
pub(crate) fn haversine_distance(p1: &Point, p2: &Point) -> f64 {
    let lat1 = p1.latitude.to_radians();
    let lat2 = p2.latitude.to_radians();
    let delta_lat = (p2.latitude - p1.latitude).to_radians();
    let delta_lon = (p2.longitude - p1.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}
