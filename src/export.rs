//! GPX 1.1, KML 2.2 and JSON builders for a recorded section.

use chrono::{DateTime, Utc};
use quick_xml::escape::escape;
use serde::Serialize;

use crate::clock::iso_timestamp;
use crate::error::Result;
use crate::route_types::{TrackingPoint, Waypoint};

pub const GPX_MIME: &str = "application/gpx+xml";
pub const KML_MIME: &str = "application/vnd.google-earth.kml+xml";
pub const JSON_MIME: &str = "application/json";

/// Document-level values shared by every export format.
#[derive(Debug, Clone, Copy)]
pub struct ExportMeta<'a> {
    pub name: &'a str,
    pub creator: &'a str,
    pub generated_at: DateTime<Utc>,
}

/// The JSON export record: `{ routeName, date, waypoints, tracking }`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonExport<'a> {
    pub route_name: &'a str,
    pub date: String,
    pub waypoints: &'a [Waypoint],
    pub tracking: &'a [TrackingPoint],
}

/// One generated file, ready for the download/share sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFile {
    pub filename: String,
    pub mime_type: &'static str,
    pub content: String,
}

pub fn to_gpx(waypoints: &[Waypoint], tracking: &[TrackingPoint], meta: &ExportMeta<'_>) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&format!(
        "<gpx version=\"1.1\" creator=\"{}\" xmlns=\"http://www.topografix.com/GPX/1/1\">\n",
        escape(meta.creator)
    ));
    out.push_str("  <metadata>\n");
    out.push_str(&format!("    <name>{}</name>\n", escape(meta.name)));
    out.push_str(&format!(
        "    <time>{}</time>\n",
        iso_timestamp(meta.generated_at)
    ));
    out.push_str("  </metadata>\n");

    for wp in waypoints {
        out.push_str(&format!("  <wpt lat=\"{}\" lon=\"{}\">\n", wp.lat(), wp.lon()));
        out.push_str(&format!("    <time>{}</time>\n", escape(wp.timestamp())));
        out.push_str(&format!("    <name>{}</name>\n", escape(wp.name.as_str())));
        if !wp.poi.is_empty() {
            out.push_str(&format!("    <desc>{}</desc>\n", escape(wp.poi.as_str())));
        }
        out.push_str("  </wpt>\n");
    }

    if !tracking.is_empty() {
        out.push_str("  <trk>\n");
        out.push_str(&format!(
            "    <name>{} - Auto Track</name>\n",
            escape(meta.name)
        ));
        out.push_str("    <trkseg>\n");
        for pt in tracking {
            out.push_str(&format!(
                "      <trkpt lat=\"{}\" lon=\"{}\">\n",
                pt.lat(),
                pt.lon()
            ));
            out.push_str(&format!(
                "        <time>{}</time>\n",
                escape(pt.timestamp())
            ));
            out.push_str("      </trkpt>\n");
        }
        out.push_str("    </trkseg>\n");
        out.push_str("  </trk>\n");
    }

    out.push_str("</gpx>\n");
    out
}

pub fn to_kml(waypoints: &[Waypoint], tracking: &[TrackingPoint], meta: &ExportMeta<'_>) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<kml xmlns=\"http://www.opengis.net/kml/2.2\">\n");
    out.push_str("  <Document>\n");
    out.push_str(&format!("    <name>{}</name>\n", escape(meta.name)));
    out.push_str(&format!(
        "    <description>Rally route created with {}</description>\n",
        escape(meta.creator)
    ));

    for wp in waypoints {
        out.push_str("    <Placemark>\n");
        out.push_str(&format!("      <name>{}</name>\n", escape(wp.name.as_str())));
        out.push_str(&format!(
            "      <description>{}</description>\n",
            escape(wp.poi.as_str())
        ));
        out.push_str("      <Point>\n");
        out.push_str(&format!(
            "        <coordinates>{},{},0</coordinates>\n",
            wp.lon(),
            wp.lat()
        ));
        out.push_str("      </Point>\n");
        out.push_str("    </Placemark>\n");
    }

    if !tracking.is_empty() {
        out.push_str("    <Placemark>\n");
        out.push_str(&format!("      <name>{} - Track</name>\n", escape(meta.name)));
        out.push_str("      <LineString>\n");
        out.push_str("        <coordinates>\n");
        for pt in tracking {
            out.push_str(&format!("          {},{},0\n", pt.lon(), pt.lat()));
        }
        out.push_str("        </coordinates>\n");
        out.push_str("      </LineString>\n");
        out.push_str("    </Placemark>\n");
    }

    out.push_str("  </Document>\n");
    out.push_str("</kml>\n");
    out
}

pub fn to_json<'a>(
    waypoints: &'a [Waypoint],
    tracking: &'a [TrackingPoint],
    route_name: &'a str,
    generated_at: DateTime<Utc>,
) -> JsonExport<'a> {
    JsonExport {
        route_name,
        date: iso_timestamp(generated_at),
        waypoints,
        tracking,
    }
}

/// File name stem: the route name if one was entered, else the section name.
/// Path separators are replaced so the name is a single file name.
pub fn file_stem(route_name: &str, section_name: &str) -> String {
    let route_name = route_name.trim();
    let stem = if route_name.is_empty() {
        section_name
    } else {
        route_name
    };
    stem.replace(['/', '\\'], "_")
}

/// Build the JSON, GPX and KML files for one section.
pub fn build_files(
    waypoints: &[Waypoint],
    tracking: &[TrackingPoint],
    meta: &ExportMeta<'_>,
    stem: &str,
) -> Result<Vec<ExportFile>> {
    let json = to_json(waypoints, tracking, meta.name, meta.generated_at);

    Ok(vec![
        ExportFile {
            filename: format!("{stem}.json"),
            mime_type: JSON_MIME,
            content: serde_json::to_string_pretty(&json)?,
        },
        ExportFile {
            filename: format!("{stem}.gpx"),
            mime_type: GPX_MIME,
            content: to_gpx(waypoints, tracking, meta),
        },
        ExportFile {
            filename: format!("{stem}.kml"),
            mime_type: KML_MIME,
            content: to_kml(waypoints, tracking, meta),
        },
    ])
}
