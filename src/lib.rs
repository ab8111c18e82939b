pub mod clock;
pub mod converter;
pub mod draft;
pub mod error;
pub mod export;
pub mod geodesy;
pub mod geolocation;
pub mod icons;
pub mod logging;
pub mod options;
pub mod parser;
pub mod route_types;
pub mod session;

use serde::Serialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

use crate::clock::{Clock, SystemClock};
use crate::draft::{DraftStorage, DraftStore, JsDraftStore, MemoryDraftStore};
use crate::export::ExportMeta;
use crate::options::SessionOptions;
use crate::route_types::{Coordinate, TrackingPoint, Waypoint};
use crate::session::{Command, Session};

/// Install the console logger at the given level ("error" .. "trace").
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(level: &str) {
    console_error_panic_hook::set_once();
    logging::init(logging::parse_level(level));
}

/// Haversine distance in km, rounded to 2 decimals.
#[wasm_bindgen(js_name = distanceKm)]
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    console_error_panic_hook::set_once();

    geodesy::distance_km(lat1, lon1, lat2, lon2)
}

#[wasm_bindgen(js_name = cumulativeDistanceKm)]
pub fn cumulative_distance_km(waypoints: JsValue, lat: f64, lon: f64) -> Result<f64, JsValue> {
    console_error_panic_hook::set_once();

    let waypoints: Vec<Waypoint> = from_js(waypoints)?;
    Ok(geodesy::cumulative_distance_km(
        &waypoints,
        Coordinate::new(lat, lon),
    ))
}

/// Build a GPX 1.1 document from waypoint and tracking-point arrays.
#[wasm_bindgen(js_name = buildGpx)]
pub fn build_gpx(waypoints: JsValue, tracking: JsValue, name: &str) -> Result<String, JsValue> {
    console_error_panic_hook::set_once();

    let (waypoints, tracking) = parse_lists(waypoints, tracking)?;
    let creator = SessionOptions::default().creator;
    let meta = export_meta(name, &creator);
    Ok(export::to_gpx(&waypoints, &tracking, &meta))
}

/// Build a KML 2.2 document from waypoint and tracking-point arrays.
#[wasm_bindgen(js_name = buildKml)]
pub fn build_kml(waypoints: JsValue, tracking: JsValue, name: &str) -> Result<String, JsValue> {
    console_error_panic_hook::set_once();

    let (waypoints, tracking) = parse_lists(waypoints, tracking)?;
    let creator = SessionOptions::default().creator;
    let meta = export_meta(name, &creator);
    Ok(export::to_kml(&waypoints, &tracking, &meta))
}

#[wasm_bindgen(js_name = importGpx)]
pub fn import_gpx(xml: &str) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let route = parser::parse_gpx(xml)?;
    to_js(&route)
}

#[wasm_bindgen(js_name = importKml)]
pub fn import_kml(xml: &str) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let route = parser::parse_kml(xml)?;
    to_js(&route)
}

/// The pace-note icon catalog, grouped by category.
#[wasm_bindgen(js_name = iconCatalog)]
pub fn icon_catalog() -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    to_js(icons::CATEGORIES)
}

/// A mapping session driven from the page.
///
/// Events go in through `dispatch({ type: "...", ... })`; the returned
/// outcome tells the page what to do next (start/stop the sampler, hand
/// export files to the download sink, show a status message).
#[wasm_bindgen]
pub struct RallySession {
    inner: Session,
}

#[wasm_bindgen]
impl RallySession {
    /// `storage` is a Web Storage object such as `window.localStorage`;
    /// without one the draft lives in memory only.
    #[wasm_bindgen(constructor)]
    pub fn new(storage: Option<DraftStorage>, options: JsValue) -> Result<RallySession, JsValue> {
        console_error_panic_hook::set_once();

        let options: SessionOptions = if options.is_undefined() || options.is_null() {
            SessionOptions::default()
        } else {
            from_js(options)?
        };
        let draft: Box<dyn DraftStore> = match storage {
            Some(storage) => Box::new(JsDraftStore::new(storage)),
            None => Box::new(MemoryDraftStore::new()),
        };

        Ok(RallySession {
            inner: Session::new(options, Box::new(SystemClock), draft),
        })
    }

    pub fn dispatch(&mut self, command: JsValue) -> Result<JsValue, JsValue> {
        let command: Command = from_js(command)?;
        let outcome = self.inner.dispatch(command)?;
        to_js(&outcome)
    }

    pub fn waypoints(&self) -> Result<JsValue, JsValue> {
        to_js(self.inner.waypoints())
    }

    #[wasm_bindgen(js_name = trackingPoints)]
    pub fn tracking_points(&self) -> Result<JsValue, JsValue> {
        to_js(self.inner.tracking_points())
    }

    pub fn summaries(&self) -> Result<JsValue, JsValue> {
        to_js(self.inner.summaries())
    }

    #[wasm_bindgen(js_name = mapOverlay)]
    pub fn map_overlay(&self) -> Result<JsValue, JsValue> {
        let fix = self.inner.current_fix();
        let fc = converter::to_map_overlay(
            self.inner.waypoints(),
            self.inner.tracking_points(),
            fix.as_ref(),
        );
        to_js(&fc)
    }

    #[wasm_bindgen(js_name = routeStats)]
    pub fn route_stats(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.route_stats())
    }

    /// Options for `navigator.geolocation.watchPosition`.
    #[wasm_bindgen(js_name = watchOptions)]
    pub fn watch_options(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.options().watch_options())
    }

    #[wasm_bindgen(js_name = statusMessage)]
    pub fn status_message(&self) -> Option<String> {
        self.inner.gps().status_message().map(str::to_string)
    }

    #[wasm_bindgen(js_name = isActive)]
    pub fn is_active(&self) -> bool {
        self.inner.is_active()
    }

    #[wasm_bindgen(js_name = totalDistance)]
    pub fn total_distance(&self) -> f64 {
        self.inner.total_distance()
    }
}

fn export_meta<'a>(name: &'a str, creator: &'a str) -> ExportMeta<'a> {
    ExportMeta {
        name,
        creator,
        generated_at: SystemClock.now(),
    }
}

fn parse_lists(
    waypoints: JsValue,
    tracking: JsValue,
) -> Result<(Vec<Waypoint>, Vec<TrackingPoint>), JsValue> {
    let waypoints = from_js(waypoints)?;
    let tracking = if tracking.is_undefined() || tracking.is_null() {
        Vec::new()
    } else {
        from_js(tracking)?
    };
    Ok((waypoints, tracking))
}

fn from_js<T: DeserializeOwned>(value: JsValue) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Serialize maps as plain objects so the result is JSON-compatible.
fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
