//! GPX 1.1 output
//!
//! The document layout is fixed: a metadata block describing the merge, then
//! a single track with a single segment holding every point in stored order.
//! Coordinates are written with Rust's shortest round-trip float formatting,
//! so reading the document back yields exactly the stored values.

use crate::{FormatKind, MergedTrack, Point};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io;

/// Producer identifier written to the `creator` attribute
pub const CREATOR: &str = "track-merge - GPX and TCX track combiner";

/// MIME type of the produced documents
pub const GPX_MIME_TYPE: &str = "application/gpx+xml";

const GPX_NAMESPACE: &str = "http://www.topografix.com/GPX/1/1";
const KEYWORDS: &str = "GPX merger, TCX combiner, combined GPS tracks";

/// Render the merged track as a complete GPX document
pub fn serialize(track: &MergedTrack<'_>) -> String {
    #[cfg(feature = "profiling")]
    profiling::scope!("serializer::serialize");

    // Rough guess: ~80 bytes per point keeps reallocation rare
    let mut buffer = Vec::with_capacity(512 + track.points().len() * 80);
    if let Err(e) = write_to(track, &mut buffer) {
        // Writes into a Vec<u8> do not fail
        tracing::error!("Failed to render GPX document: {}", e);
    }
    // Every piece written is a &str, so the buffer is valid UTF-8
    String::from_utf8(buffer)
        .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

/// Stream the rendered document into a writer
pub fn write_to<W: io::Write>(track: &MergedTrack<'_>, writer: W) -> io::Result<()> {
    #[cfg(feature = "profiling")]
    profiling::scope!("serializer::write_to");

    let format_label = track.format().map_or("GPS", |format| format.label());
    let mut w = Writer::new_with_indent(writer, b' ', 2);

    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    let mut gpx = BytesStart::new("gpx");
    gpx.push_attribute(("version", "1.1"));
    gpx.push_attribute(("creator", CREATOR));
    gpx.push_attribute(("xmlns", GPX_NAMESPACE));
    w.write_event(Event::Start(gpx))?;

    w.write_event(Event::Start(BytesStart::new("metadata")))?;
    write_text_element(&mut w, "name", track.title())?;
    write_text_element(
        &mut w,
        "desc",
        &description(track.source_count(), track.format()),
    )?;
    write_text_element(&mut w, "keywords", KEYWORDS)?;
    if let Some((min_lat, min_lon, max_lat, max_lon)) = track.stats().bounds_lat_lon() {
        let mut bounds = BytesStart::new("bounds");
        bounds.push_attribute(("minlat", min_lat.to_string().as_str()));
        bounds.push_attribute(("minlon", min_lon.to_string().as_str()));
        bounds.push_attribute(("maxlat", max_lat.to_string().as_str()));
        bounds.push_attribute(("maxlon", max_lon.to_string().as_str()));
        w.write_event(Event::Empty(bounds))?;
    }
    w.write_event(Event::End(BytesEnd::new("metadata")))?;

    w.write_event(Event::Start(BytesStart::new("trk")))?;
    write_text_element(&mut w, "name", &format!("Combined {format_label} GPS Track"))?;
    w.write_event(Event::Start(BytesStart::new("trkseg")))?;
    for point in track.points() {
        write_point(&mut w, point)?;
    }
    w.write_event(Event::End(BytesEnd::new("trkseg")))?;
    w.write_event(Event::End(BytesEnd::new("trk")))?;
    w.write_event(Event::End(BytesEnd::new("gpx")))?;

    let mut writer = w.into_inner();
    writer.write_all(b"\n")?;
    writer.flush()
}

fn description(source_count: usize, format: Option<FormatKind>) -> String {
    let label = format.map_or("GPS", |format| format.label());
    let noun = if source_count == 1 { "file" } else { "files" };
    format!("Merged GPS track from {source_count} {label} {noun}")
}

/// `<name>text</name>`, with the text escaped
fn write_text_element<W: io::Write>(w: &mut Writer<W>, name: &str, text: &str) -> io::Result<()> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    w.write_event(Event::Text(BytesText::new(text)))?;
    w.write_event(Event::End(BytesEnd::new(name)))
}

fn write_point<W: io::Write>(w: &mut Writer<W>, point: &Point) -> io::Result<()> {
    let mut trkpt = BytesStart::new("trkpt");
    trkpt.push_attribute(("lat", point.latitude.to_string().as_str()));
    trkpt.push_attribute(("lon", point.longitude.to_string().as_str()));
    w.write_event(Event::Start(trkpt))?;
    if let Some(elevation) = point.elevation {
        write_text_element(w, "ele", &elevation.to_string())?;
    }
    if let Some(timestamp) = &point.timestamp {
        write_text_element(w, "time", timestamp)?;
    }
    w.write_event(Event::End(BytesEnd::new("trkpt")))
}
