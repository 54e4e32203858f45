//! Format parsers
//!
//! Both formats are read through the same `TrackParser` capability and
//! selected by the caller with a [`FormatKind`] tag; the document content is
//! never inspected to guess the format.
//!
//! Parsing is strict at the document level and lenient at the point level: a
//! document that is not well-formed XML fails as a whole, while a point with a
//! missing or unreadable coordinate still produces a [`Point`] with that
//! coordinate set to `0.0`.

use crate::xml::{self, Element};
use crate::{FormatKind, ParseError, Point};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Soft problems found while extracting points
///
/// None of these fail the parse; they are surfaced so callers can tell when
/// coordinates were fabricated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParseDiagnostics {
    /// Number of individual latitude/longitude values replaced by `0.0`
    pub defaulted_coordinates: usize,
    /// Number of elevation elements whose text was not a number (dropped)
    pub unparsable_elevations: usize,
}

impl ParseDiagnostics {
    /// True when no coordinate or elevation had to be defaulted or dropped
    pub fn is_clean(&self) -> bool {
        self.defaulted_coordinates == 0 && self.unparsable_elevations == 0
    }
}

/// Points of one document together with the diagnostics gathered while reading it
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    pub points: Vec<Point>,
    pub diagnostics: ParseDiagnostics,
}

/// Shared capability of the format-specific readers
pub(crate) trait TrackParser {
    /// Format handled by this parser
    fn format(&self) -> FormatKind;

    /// Extract all points below an already well-formed root element
    fn extract(&self, root: &Element, diagnostics: &mut ParseDiagnostics) -> Vec<Point>;
}

/// Reader for GPX track points (`trkpt` with `lat`/`lon` attributes)
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct GpxParser;

/// Reader for TCX track points (`Trackpoint` with a nested `Position`)
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct TcxParser;

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl TrackParser for GpxParser {
    fn format(&self) -> FormatKind {
        FormatKind::Gpx
    }

    fn extract(&self, root: &Element, diagnostics: &mut ParseDiagnostics) -> Vec<Point> {
        root.descendants("trkpt")
            .map(|trkpt| Point {
                latitude: coordinate(trkpt.attribute("lat"), diagnostics),
                longitude: coordinate(trkpt.attribute("lon"), diagnostics),
                elevation: elevation(trkpt.first_descendant("ele"), diagnostics),
                timestamp: timestamp(trkpt.first_descendant("time")),
            })
            .collect()
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl TrackParser for TcxParser {
    fn format(&self) -> FormatKind {
        FormatKind::Tcx
    }

    fn extract(&self, root: &Element, diagnostics: &mut ParseDiagnostics) -> Vec<Point> {
        root.descendants("Trackpoint")
            .map(|trackpoint| {
                let position = trackpoint.first_descendant("Position");
                let degrees = |name: &str| {
                    position
                        .and_then(|p| p.first_descendant(name))
                        .map(Element::text_content)
                };
                Point {
                    latitude: coordinate(degrees("LatitudeDegrees").as_deref(), diagnostics),
                    longitude: coordinate(degrees("LongitudeDegrees").as_deref(), diagnostics),
                    elevation: elevation(trackpoint.first_descendant("AltitudeMeters"), diagnostics),
                    timestamp: timestamp(trackpoint.first_descendant("Time")),
                }
            })
            .collect()
    }
}

/// Parse a document of the given format into its points
pub fn parse(format: FormatKind, document: &str) -> Result<Vec<Point>, ParseError> {
    parse_with_diagnostics(format, document).map(|outcome| outcome.points)
}

/// Parse a document and also report how many values had to be defaulted
pub fn parse_with_diagnostics(
    format: FormatKind,
    document: &str,
) -> Result<ParseOutcome, ParseError> {
    match format {
        FormatKind::Gpx => parse_with(&GpxParser, document),
        FormatKind::Tcx => parse_with(&TcxParser, document),
    }
}

fn parse_with<P: TrackParser>(parser: &P, document: &str) -> Result<ParseOutcome, ParseError> {
    #[cfg(feature = "profiling")]
    profiling::scope!("parser::parse_with");

    let root = xml::parse_document(document).inspect_err(|e| {
        tracing::debug!("Rejecting {} document: {}", parser.format(), e);
    })?;

    let mut diagnostics = ParseDiagnostics::default();
    let points = parser.extract(&root, &mut diagnostics);

    tracing::debug!(
        "Parsed {} document <{}> with {} points",
        parser.format(),
        root.name(),
        points.len()
    );
    if diagnostics.defaulted_coordinates > 0 {
        tracing::warn!(
            "{} coordinate(s) missing or unreadable in {} document, defaulted to 0.0",
            diagnostics.defaulted_coordinates,
            parser.format()
        );
    }
    if diagnostics.unparsable_elevations > 0 {
        tracing::warn!(
            "Dropped {} unreadable elevation value(s) in {} document",
            diagnostics.unparsable_elevations,
            parser.format()
        );
    }

    Ok(ParseOutcome {
        points,
        diagnostics,
    })
}

fn coordinate(raw: Option<&str>, diagnostics: &mut ParseDiagnostics) -> f64 {
    match raw.and_then(parse_number) {
        Some(value) => value,
        None => {
            diagnostics.defaulted_coordinates += 1;
            0.0
        }
    }
}

fn elevation(element: Option<&Element>, diagnostics: &mut ParseDiagnostics) -> Option<f64> {
    let text = element?.text_content();
    let value = parse_number(&text);
    if value.is_none() {
        diagnostics.unparsable_elevations += 1;
    }
    value
}

fn timestamp(element: Option<&Element>) -> Option<String> {
    Some(element?.text_content()).filter(|text| !text.is_empty())
}

/// Lenient float reading: surrounding whitespace is ignored and the longest
/// numeric prefix wins, so `"12.5 m"` reads as `12.5`. Non-finite results are
/// rejected.
pub(crate) fn parse_number(raw: &str) -> Option<f64> {
    let text = raw.trim();
    let bytes = text.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_end = digits_from(end);
    let mut mantissa_digits = int_end - end;
    end = int_end;
    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        mantissa_digits += frac_end - (end + 1);
        end = frac_end;
    }
    if mantissa_digits == 0 {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    text[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk><trkseg>
    <trkpt lat="51.5074" lon="-0.1278">
      <ele>35.2</ele>
      <time>2024-05-01T07:00:00Z</time>
    </trkpt>
    <trkpt lat="51.5076" lon="-0.1276"/>
    <trkpt lat="51.5078" lon="-0.1274"><time>2024-05-01T07:00:10Z</time></trkpt>
  </trkseg></trk>
</gpx>"#;

    const TCX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<TrainingCenterDatabase xmlns="http://www.garmin.com/xmlschemas/TrainingCenterDatabase/v2">
  <Activities><Activity Sport="Running"><Lap StartTime="2024-05-01T07:00:00Z"><Track>
    <Trackpoint>
      <Time>2024-05-01T07:00:00Z</Time>
      <Position>
        <LatitudeDegrees>12.5</LatitudeDegrees>
        <LongitudeDegrees>45.6</LongitudeDegrees>
      </Position>
      <AltitudeMeters>100.0</AltitudeMeters>
      <HeartRateBpm><Value>120</Value></HeartRateBpm>
    </Trackpoint>
    <Trackpoint>
      <Time>2024-05-01T07:00:05Z</Time>
      <HeartRateBpm><Value>121</Value></HeartRateBpm>
    </Trackpoint>
  </Track></Lap></Activity></Activities>
</TrainingCenterDatabase>"#;

    #[test]
    fn test_gpx_points_in_document_order() {
        let points = parse(FormatKind::Gpx, GPX).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(
            points[0],
            Point::new(51.5074, -0.1278)
                .with_elevation(35.2)
                .with_timestamp("2024-05-01T07:00:00Z")
        );
        assert_eq!(points[1], Point::new(51.5076, -0.1276));
        assert_eq!(points[2].elevation, None);
        assert_eq!(points[2].timestamp.as_deref(), Some("2024-05-01T07:00:10Z"));
    }

    #[test]
    fn test_gpx_missing_lat_defaults_to_zero() {
        let doc = r#"<gpx><trk><trkseg><trkpt lon="7.5"><ele>3</ele></trkpt></trkseg></trk></gpx>"#;
        let outcome = parse_with_diagnostics(FormatKind::Gpx, doc).unwrap();
        assert_eq!(outcome.points.len(), 1);
        assert_eq!(outcome.points[0].latitude, 0.0);
        assert_eq!(outcome.points[0].longitude, 7.5);
        assert_eq!(outcome.points[0].elevation, Some(3.0));
        assert_eq!(outcome.diagnostics.defaulted_coordinates, 1);
    }

    #[test]
    fn test_gpx_non_numeric_coordinates_default_to_zero() {
        let doc = r#"<gpx><trkpt lat="north" lon=""/></gpx>"#;
        let outcome = parse_with_diagnostics(FormatKind::Gpx, doc).unwrap();
        assert_eq!(outcome.points, vec![Point::new(0.0, 0.0)]);
        assert_eq!(outcome.diagnostics.defaulted_coordinates, 2);
        assert!(!outcome.diagnostics.is_clean());
    }

    #[test]
    fn test_gpx_unreadable_elevation_is_absent() {
        let doc = r#"<gpx><trkpt lat="1" lon="2"><ele>high</ele></trkpt><trkpt lat="1" lon="2"><ele></ele></trkpt></gpx>"#;
        let outcome = parse_with_diagnostics(FormatKind::Gpx, doc).unwrap();
        assert!(outcome.points.iter().all(|p| p.elevation.is_none()));
        assert_eq!(outcome.diagnostics.unparsable_elevations, 2);
        assert_eq!(outcome.diagnostics.defaulted_coordinates, 0);
    }

    #[test]
    fn test_gpx_timestamp_is_verbatim() {
        let doc = "<gpx><trkpt lat=\"1\" lon=\"2\"><time> 01/05/2024 7am </time></trkpt><trkpt lat=\"1\" lon=\"2\"><time></time></trkpt></gpx>";
        let points = parse(FormatKind::Gpx, doc).unwrap();
        assert_eq!(points[0].timestamp.as_deref(), Some(" 01/05/2024 7am "));
        assert_eq!(points[1].timestamp, None);
    }

    #[test]
    fn test_gpx_ignores_waypoints_and_route_points() {
        let doc = r#"<gpx><wpt lat="9" lon="9"/><rte><rtept lat="8" lon="8"/></rte><trk><trkseg><trkpt lat="1" lon="1"/></trkseg></trk></gpx>"#;
        let points = parse(FormatKind::Gpx, doc).unwrap();
        assert_eq!(points, vec![Point::new(1.0, 1.0)]);
    }

    #[test]
    fn test_gpx_multiple_segments_are_flattened() {
        let doc = r#"<gpx>
            <trk><trkseg><trkpt lat="1" lon="1"/></trkseg><trkseg><trkpt lat="2" lon="2"/></trkseg></trk>
            <trk><trkseg><trkpt lat="3" lon="3"/></trkseg></trk>
        </gpx>"#;
        let lats: Vec<f64> = parse(FormatKind::Gpx, doc)
            .unwrap()
            .iter()
            .map(|p| p.latitude)
            .collect();
        assert_eq!(lats, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_tcx_extraction() {
        let points = parse(FormatKind::Tcx, TCX).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].latitude, 12.5);
        assert_eq!(points[0].longitude, 45.6);
        assert_eq!(points[0].elevation, Some(100.0));
        assert_eq!(points[0].timestamp.as_deref(), Some("2024-05-01T07:00:00Z"));
    }

    #[test]
    fn test_tcx_position_with_sibling_altitude() {
        let doc = "<TrainingCenterDatabase><Trackpoint><Position><LatitudeDegrees>12.5</LatitudeDegrees><LongitudeDegrees>45.6</LongitudeDegrees></Position><AltitudeMeters>100.0</AltitudeMeters></Trackpoint></TrainingCenterDatabase>";
        let points = parse(FormatKind::Tcx, doc).unwrap();
        assert_eq!(
            points,
            vec![Point {
                latitude: 12.5,
                longitude: 45.6,
                elevation: Some(100.0),
                timestamp: None,
            }]
        );
    }

    #[test]
    fn test_tcx_missing_position_defaults_both_coordinates() {
        let outcome = parse_with_diagnostics(FormatKind::Tcx, TCX).unwrap();
        let second = &outcome.points[1];
        assert_eq!((second.latitude, second.longitude), (0.0, 0.0));
        assert_eq!(second.elevation, None);
        assert_eq!(second.timestamp.as_deref(), Some("2024-05-01T07:00:05Z"));
        assert_eq!(outcome.diagnostics.defaulted_coordinates, 2);
    }

    #[test]
    fn test_tcx_coordinates_outside_position_are_ignored() {
        let doc = "<TrainingCenterDatabase><Trackpoint><LatitudeDegrees>5</LatitudeDegrees><Position><LongitudeDegrees>6</LongitudeDegrees></Position></Trackpoint></TrainingCenterDatabase>";
        let points = parse(FormatKind::Tcx, doc).unwrap();
        assert_eq!(points, vec![Point::new(0.0, 6.0)]);
    }

    #[test]
    fn test_format_tag_is_not_sniffed() {
        // A TCX document read as GPX simply has no trkpt elements
        assert!(parse(FormatKind::Gpx, TCX).unwrap().is_empty());
        assert!(parse(FormatKind::Tcx, GPX).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_rejection() {
        let err = parse(FormatKind::Gpx, "<not-xml").unwrap_err();
        assert!(matches!(err, ParseError::Malformed { .. }));
        assert!(parse(FormatKind::Tcx, "<TrainingCenterDatabase>").is_err());
    }

    #[test]
    fn test_parse_is_idempotent() {
        assert_eq!(
            parse(FormatKind::Gpx, GPX).unwrap(),
            parse(FormatKind::Gpx, GPX).unwrap()
        );
        assert_eq!(
            parse_with_diagnostics(FormatKind::Tcx, TCX).unwrap(),
            parse_with_diagnostics(FormatKind::Tcx, TCX).unwrap()
        );
    }

    #[test]
    fn test_parser_formats() {
        assert_eq!(GpxParser.format(), FormatKind::Gpx);
        assert_eq!(TcxParser.format(), FormatKind::Tcx);
    }

    #[test]
    fn test_deeply_nested_document_parses() {
        const DEPTH: usize = 200_000;
        let doc = format!(
            r#"<gpx>{}</gpx>"#,
            format!(
                r#"{}{}<trkpt lat="1" lon="2"><ele>{}7{}</ele></trkpt>"#,
                "<x>".repeat(DEPTH),
                "</x>".repeat(DEPTH),
                "<y>".repeat(DEPTH),
                "</y>".repeat(DEPTH),
            )
        );
        let points = parse(FormatKind::Gpx, &doc).unwrap();
        assert_eq!(points, vec![Point::new(1.0, 2.0).with_elevation(7.0)]);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("12.5"), Some(12.5));
        assert_eq!(parse_number("  -0.1278 "), Some(-0.1278));
        assert_eq!(parse_number("+3"), Some(3.0));
        assert_eq!(parse_number(".5"), Some(0.5));
        assert_eq!(parse_number("5."), Some(5.0));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number("2.5E-1"), Some(0.25));
        assert_eq!(parse_number("12.5m"), Some(12.5));
        assert_eq!(parse_number("7e"), Some(7.0));
        assert_eq!(parse_number("1e999"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number("."), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
    }
}
