//! Reads GPX and KML documents written by the exporters back into
//! waypoints and tracking points.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::Serialize;

use crate::error::{RallyError, Result};
use crate::geodesy::cumulative_distance_km;
use crate::route_types::{Coordinate, TrackingPoint, Waypoint, WaypointId};

/// A route read from a file. Waypoint distances are recomputed from the
/// imported path.
#[derive(Debug, Default, Serialize)]
pub struct ImportedRoute {
    pub name: Option<String>,
    pub waypoints: Vec<Waypoint>,
    pub tracking: Vec<TrackingPoint>,
}

impl ImportedRoute {
    fn push_waypoint(&mut self, coord: Coordinate, time: String, name: Option<String>, poi: Option<String>) {
        let distance = cumulative_distance_km(&self.waypoints, coord);
        let id = WaypointId(self.waypoints.len() as u64 + 1);
        let mut wp = Waypoint::new(id, coord, time, distance);
        if let Some(name) = name {
            wp.name = name;
        }
        wp.poi = poi.unwrap_or_default();
        self.waypoints.push(wp);
    }
}

#[derive(Debug, Default)]
struct PointFields {
    time: Option<String>,
    name: Option<String>,
    desc: Option<String>,
}

/// Parse a GPX document.
pub fn parse_gpx(xml: &str) -> Result<ImportedRoute> {
    let mut reader = Reader::from_str(xml);
    let mut route = ImportedRoute::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"metadata" => route.name = parse_metadata_name(&mut reader)?,
                b"wpt" => {
                    if let Some((coord, fields)) = parse_point(&e, &mut reader)? {
                        route.push_waypoint(
                            coord,
                            fields.time.unwrap_or_default(),
                            fields.name,
                            fields.desc,
                        );
                    }
                }
                b"trkpt" => {
                    if let Some((coord, fields)) = parse_point(&e, &mut reader)? {
                        route
                            .tracking
                            .push(TrackingPoint::new(coord, fields.time.unwrap_or_default()));
                    }
                }
                // <trk>, <trkseg> and <gpx> are containers; descend into them
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                let Ok(coord) = parse_lat_lon(&e) else {
                    continue;
                };
                match e.local_name().as_ref() {
                    b"wpt" => route.push_waypoint(coord, String::new(), None, None),
                    b"trkpt" => route.tracking.push(TrackingPoint::new(coord, String::new())),
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(RallyError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(route)
}

/// Parse lat/lon attributes from a point element's start tag.
fn parse_lat_lon(e: &BytesStart<'_>) -> Result<Coordinate> {
    let mut lat: Option<f64> = None;
    let mut lon: Option<f64> = None;

    for attr_result in e.attributes() {
        let attr = attr_result.map_err(|e| RallyError::XmlParse(e.into()))?;
        let val = std::str::from_utf8(&attr.value).unwrap_or_default();
        match attr.key.local_name().as_ref() {
            b"lat" => lat = Some(parse_degrees("lat", val)?),
            b"lon" => lon = Some(parse_degrees("lon", val)?),
            _ => {}
        }
    }

    let lat = lat.ok_or(RallyError::MissingAttribute {
        element: "point",
        attribute: "lat",
    })?;
    let lon = lon.ok_or(RallyError::MissingAttribute {
        element: "point",
        attribute: "lon",
    })?;

    Ok(Coordinate::new(lat, lon))
}

fn parse_degrees(attribute: &'static str, val: &str) -> Result<f64> {
    val.parse::<f64>()
        .map_err(|_| RallyError::InvalidAttribute {
            element: "point",
            attribute,
            value: val.to_string(),
        })
}

/// Parse a <wpt> or <trkpt> and its children. Points with missing or
/// invalid coordinates are skipped.
fn parse_point<'a>(
    start: &BytesStart<'a>,
    reader: &mut Reader<&'a [u8]>,
) -> Result<Option<(Coordinate, PointFields)>> {
    let coord = match parse_lat_lon(start) {
        Ok(coord) => coord,
        Err(_) => {
            reader
                .read_to_end(start.name())
                .map_err(RallyError::XmlParse)?;
            return Ok(None);
        }
    };

    let mut fields = PointFields::default();
    let end_name = start.name().0.to_vec();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"time" => fields.time = Some(read_text_owned(reader, &e)?),
                b"name" => fields.name = Some(read_text_owned(reader, &e)?),
                b"desc" => fields.desc = Some(read_text_owned(reader, &e)?),
                _ => {
                    reader
                        .read_to_end(e.name())
                        .map_err(RallyError::XmlParse)?;
                }
            },
            Ok(Event::End(e)) if e.name().0 == end_name.as_slice() => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(RallyError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(Some((coord, fields)))
}

fn parse_metadata_name<'a>(reader: &mut Reader<&'a [u8]>) -> Result<Option<String>> {
    let mut name = None;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"name" {
                    name = Some(read_text_owned(reader, &e)?);
                } else {
                    reader
                        .read_to_end(e.name())
                        .map_err(RallyError::XmlParse)?;
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"metadata" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(RallyError::XmlParse(e)),
            _ => {}
        }
    }
    Ok(name)
}

enum Geometry {
    Point(Coordinate),
    LineString(Vec<Coordinate>),
}

#[derive(Default)]
struct Placemark {
    name: Option<String>,
    description: Option<String>,
    geometry: Option<Geometry>,
}

/// Parse a KML document. Point placemarks become waypoints; LineString
/// placemarks become tracking points without timestamps.
pub fn parse_kml(xml: &str) -> Result<ImportedRoute> {
    let mut reader = Reader::from_str(xml);
    let mut route = ImportedRoute::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"name" if route.name.is_none() => {
                    route.name = Some(read_text_owned(&mut reader, &e)?);
                }
                b"Placemark" => {
                    let placemark = parse_placemark(&mut reader)?;
                    match placemark.geometry {
                        Some(Geometry::Point(coord)) => route.push_waypoint(
                            coord,
                            String::new(),
                            placemark.name,
                            placemark.description,
                        ),
                        Some(Geometry::LineString(coords)) => route.tracking.extend(
                            coords
                                .into_iter()
                                .map(|c| TrackingPoint::new(c, String::new())),
                        ),
                        None => {}
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(RallyError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(route)
}

fn parse_placemark<'a>(reader: &mut Reader<&'a [u8]>) -> Result<Placemark> {
    let mut placemark = Placemark::default();
    let mut in_line_string = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"name" => placemark.name = Some(read_text_owned(reader, &e)?),
                b"description" => placemark.description = Some(read_text_owned(reader, &e)?),
                b"Point" => in_line_string = false,
                b"LineString" => in_line_string = true,
                b"coordinates" => {
                    let coords = parse_coordinates(&read_text_owned(reader, &e)?);
                    placemark.geometry = if in_line_string {
                        Some(Geometry::LineString(coords))
                    } else {
                        coords.first().copied().map(Geometry::Point)
                    };
                }
                _ => {
                    reader
                        .read_to_end(e.name())
                        .map_err(RallyError::XmlParse)?;
                }
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"Placemark" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(RallyError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(placemark)
}

/// Parse whitespace-separated `lon,lat[,alt]` tuples, skipping malformed ones.
fn parse_coordinates(text: &str) -> Vec<Coordinate> {
    text.split_whitespace()
        .filter_map(|tuple| {
            let mut parts = tuple.split(',');
            let lon = parts.next()?.parse::<f64>().ok()?;
            let lat = parts.next()?.parse::<f64>().ok()?;
            Some(Coordinate::new(lat, lon))
        })
        .collect()
}

/// Read text content of an element as an owned String.
/// Handles regular text, CDATA sections, and entity references (Event::GeneralRef).
fn read_text_owned<'a>(reader: &mut Reader<&'a [u8]>, start: &BytesStart<'_>) -> Result<String> {
    let end_name = start.name().0.to_vec();
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Text(e)) => {
                text.push_str(std::str::from_utf8(e.as_ref()).unwrap_or_default());
            }
            Ok(Event::CData(e)) => {
                text.push_str(std::str::from_utf8(e.as_ref()).unwrap_or_default());
            }
            Ok(Event::GeneralRef(e)) => {
                if let Ok(Some(ch)) = e.resolve_char_ref() {
                    text.push(ch);
                } else {
                    match std::str::from_utf8(e.as_ref()).unwrap_or_default() {
                        "amp" => text.push('&'),
                        "lt" => text.push('<'),
                        "gt" => text.push('>'),
                        "quot" => text.push('"'),
                        "apos" => text.push('\''),
                        _ => {}
                    }
                }
            }
            Ok(Event::End(e)) if e.name().0 == end_name.as_slice() => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(RallyError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpx_waypoints_and_track() {
        let xml = r#"<?xml version="1.0"?>
<gpx xmlns="http://www.topografix.com/GPX/1/1" version="1.1">
  <metadata><name>Stage 1</name><time>2025-01-01T00:00:00.000Z</time></metadata>
  <wpt lat="0" lon="0"><time>t0</time><name>Left</name><desc>gate</desc></wpt>
  <wpt lat="0" lon="0.01"><name>Right</name></wpt>
  <trk>
    <name>Stage 1 - Auto Track</name>
    <trkseg>
      <trkpt lat="0" lon="0"><time>t1</time></trkpt>
      <trkpt lat="0" lon="0.01"/>
    </trkseg>
  </trk>
</gpx>"#;
        let route = parse_gpx(xml).unwrap();
        assert_eq!(route.name.as_deref(), Some("Stage 1"));
        assert_eq!(route.waypoints.len(), 2);
        assert_eq!(route.waypoints[0].name, "Left");
        assert_eq!(route.waypoints[0].poi, "gate");
        assert_eq!(route.waypoints[0].timestamp(), "t0");
        assert_eq!(route.waypoints[1].distance(), 1.11);
        assert_eq!(route.tracking.len(), 2);
        assert_eq!(route.tracking[0].timestamp(), "t1");
        assert_eq!(route.tracking[1].timestamp(), "");
    }

    #[test]
    fn test_gpx_without_name_is_unnamed() {
        let xml = r#"<gpx version="1.1"><wpt lat="1" lon="2"/></gpx>"#;
        let route = parse_gpx(xml).unwrap();
        assert_eq!(route.waypoints[0].name, "Unnamed");
    }

    #[test]
    fn test_gpx_missing_lat_lon_skipped() {
        let xml = r#"<?xml version="1.0"?>
<gpx version="1.1">
  <wpt lat="35.0" lon="139.0"><name>Good</name></wpt>
  <wpt><name>Bad - no coords</name></wpt>
  <wpt lat="x" lon="140.0"><name>Bad lat</name></wpt>
  <wpt lat="36.0" lon="140.0"><name>Also Good</name></wpt>
</gpx>"#;
        let route = parse_gpx(xml).unwrap();
        let names: Vec<&str> = route.waypoints.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["Good", "Also Good"]);
    }

    #[test]
    fn test_gpx_entities() {
        let xml = r#"<gpx><wpt lat="1" lon="2"><name>Caf&#233; &amp; &lt;Bar&gt;</name></wpt></gpx>"#;
        let route = parse_gpx(xml).unwrap();
        assert_eq!(route.waypoints[0].name, "Café & <Bar>");
    }

    #[test]
    fn test_invalid_lat_reports_attribute() {
        let xml = r#"<wpt lat="abc" lon="1"/>"#;
        let mut reader = Reader::from_str(xml);
        let Ok(Event::Empty(e)) = reader.read_event() else {
            panic!("expected empty element");
        };
        match parse_lat_lon(&e) {
            Err(RallyError::InvalidAttribute { attribute, value, .. }) => {
                assert_eq!(attribute, "lat");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_malformed_xml_is_error() {
        assert!(matches!(
            parse_gpx("<gpx><wpt lat=\"1\" lon=\"2\"></gpx>"),
            Err(RallyError::XmlParse(_))
        ));
    }

    #[test]
    fn test_kml_points_and_line() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <name>Stage 1</name>
    <Placemark>
      <name>Bump</name>
      <description>rough</description>
      <Point><coordinates>138.75,-35,0</coordinates></Point>
    </Placemark>
    <Placemark>
      <name>Stage 1 - Track</name>
      <LineString>
        <coordinates>
          138.75,-35,0
          138.76,-35,0
          bogus
        </coordinates>
      </LineString>
    </Placemark>
  </Document>
</kml>"#;
        let route = parse_kml(xml).unwrap();
        assert_eq!(route.name.as_deref(), Some("Stage 1"));
        assert_eq!(route.waypoints.len(), 1);
        assert_eq!(route.waypoints[0].name, "Bump");
        assert_eq!(route.waypoints[0].poi, "rough");
        assert_eq!(route.waypoints[0].coord(), Coordinate::new(-35.0, 138.75));
        assert_eq!(route.tracking.len(), 2);
        assert_eq!(route.tracking[1].coord(), Coordinate::new(-35.0, 138.76));
    }

    #[test]
    fn test_parse_coordinates() {
        let coords = parse_coordinates(" 1,2,0\n 3,4 ,5 x,y");
        assert_eq!(coords, vec![Coordinate::new(2.0, 1.0), Coordinate::new(4.0, 3.0)]);
    }
}
