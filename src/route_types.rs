use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Format as "lat, lon" with a fixed number of decimals.
    pub fn format_fixed(&self, precision: usize) -> String {
        format!("{:.p$}, {:.p$}", self.lat, self.lon, p = precision)
    }
}

/// A position fix reported by the geolocation provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub coord: Coordinate,
    /// Horizontal accuracy radius in meters, when the provider reports one.
    pub accuracy: Option<f64>,
}

impl Fix {
    pub fn new(lat: f64, lon: f64, accuracy: Option<f64>) -> Self {
        Self {
            coord: Coordinate::new(lat, lon),
            accuracy,
        }
    }
}

/// Stable identifier of a waypoint within a session.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct WaypointId(pub u64);

impl std::fmt::Display for WaypointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub const UNNAMED: &str = "Unnamed";

/// An operator-marked point along the route.
///
/// Position, capture time and distance are fixed when the waypoint is created;
/// only the annotations (`name`, `poi`, `icon_src`) change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    #[serde(default)]
    id: WaypointId,
    pub name: String,
    lat: f64,
    lon: f64,
    timestamp: String,
    /// Cumulative km at capture time.
    distance: f64,
    #[serde(default)]
    pub poi: String,
    #[serde(default)]
    pub icon_src: String,
}

impl Waypoint {
    pub fn new(id: WaypointId, coord: Coordinate, timestamp: String, distance: f64) -> Self {
        Self {
            id,
            name: UNNAMED.to_string(),
            lat: coord.lat,
            lon: coord.lon,
            timestamp,
            distance,
            poi: String::new(),
            icon_src: String::new(),
        }
    }

    pub fn id(&self) -> WaypointId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: WaypointId) {
        self.id = id;
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    pub fn coord(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }
}

/// An automatically sampled GPS fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingPoint {
    lat: f64,
    lon: f64,
    timestamp: String,
}

impl TrackingPoint {
    pub fn new(coord: Coordinate, timestamp: String) -> Self {
        Self {
            lat: coord.lat,
            lon: coord.lon,
            timestamp,
        }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    pub fn coord(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

/// Snapshot of a section taken when it ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSummary {
    pub name: String,
    pub waypoint_count: usize,
    pub start_time: String,
    pub end_time: String,
    /// Sum of the stored waypoint distances.
    pub total_distance: f64,
    pub pois: Vec<String>,
    pub start_coords: String,
    pub end_coords: String,
    pub route_name: String,
}

/// Live statistics shown while recording.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStats {
    pub total_waypoints: usize,
    /// Stored distance of the last waypoint.
    pub route_distance: f64,
    /// Distance accumulated over tracking samples.
    pub tracked_distance: f64,
    pub duration_min: f64,
    pub avg_speed_kmh: f64,
}
