use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde_json::{Map, Value as JsonValue};

use crate::route_types::*;

/// Build the GeoJSON layers the map widget draws: one marker per waypoint,
/// the route polyline through the waypoints, the tracking polyline and the
/// current position with its accuracy radius.
pub fn to_map_overlay(
    waypoints: &[Waypoint],
    tracking: &[TrackingPoint],
    current: Option<&Fix>,
) -> FeatureCollection {
    let mut features: Vec<Feature> = waypoints
        .iter()
        .enumerate()
        .map(|(i, wp)| waypoint_to_feature(i + 1, wp))
        .collect();

    if waypoints.len() >= 2 {
        let coords = waypoints.iter().map(|wp| coord_pair(wp.coord())).collect();
        features.push(line_feature("route", coords));
    }

    if tracking.len() >= 2 {
        let coords = tracking.iter().map(|pt| coord_pair(pt.coord())).collect();
        features.push(line_feature("tracking", coords));
    }

    if let Some(fix) = current {
        features.push(position_feature(fix));
    }

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn waypoint_to_feature(label: usize, wp: &Waypoint) -> Feature {
    let mut props = layer_props("waypoint");
    props.insert("label".to_string(), JsonValue::Number(label.into()));
    props.insert("id".to_string(), JsonValue::Number(wp.id().0.into()));
    props.insert("name".to_string(), JsonValue::String(wp.name.clone()));
    props.insert(
        "timestamp".to_string(),
        JsonValue::String(wp.timestamp().to_string()),
    );
    insert_f64(&mut props, "distance", wp.distance());
    insert_non_empty(&mut props, "poi", &wp.poi);
    insert_non_empty(&mut props, "iconSrc", &wp.icon_src);

    feature(Value::Point(coord_pair(wp.coord())), props)
}

fn line_feature(layer: &str, coords: Vec<Vec<f64>>) -> Feature {
    feature(Value::LineString(coords), layer_props(layer))
}

fn position_feature(fix: &Fix) -> Feature {
    let mut props = layer_props("position");
    if let Some(accuracy) = fix.accuracy {
        insert_f64(&mut props, "accuracy", accuracy);
    }
    feature(Value::Point(coord_pair(fix.coord)), props)
}

fn feature(value: Value, props: Map<String, JsonValue>) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(props),
        foreign_members: None,
    }
}

fn layer_props(layer: &str) -> Map<String, JsonValue> {
    let mut props = Map::new();
    props.insert("layer".to_string(), JsonValue::String(layer.to_string()));
    props
}

/// GeoJSON order: [lon, lat].
fn coord_pair(c: Coordinate) -> Vec<f64> {
    vec![c.lon, c.lat]
}

fn insert_f64(props: &mut Map<String, JsonValue>, key: &str, value: f64) {
    if let Some(n) = serde_json::Number::from_f64(value) {
        props.insert(key.to_string(), JsonValue::Number(n));
    }
}

fn insert_non_empty(props: &mut Map<String, JsonValue>, key: &str, value: &str) {
    if !value.is_empty() {
        props.insert(key.to_string(), JsonValue::String(value.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wp(id: u64, lat: f64, lon: f64) -> Waypoint {
        Waypoint::new(
            WaypointId(id),
            Coordinate::new(lat, lon),
            "2025-01-01T00:00:00.000Z".to_string(),
            0.5,
        )
    }

    fn layers(fc: &FeatureCollection) -> Vec<&str> {
        fc.features
            .iter()
            .map(|f| f.properties.as_ref().unwrap()["layer"].as_str().unwrap())
            .collect()
    }

    #[test]
    fn test_empty_overlay() {
        let fc = to_map_overlay(&[], &[], None);
        assert!(fc.features.is_empty());
    }

    #[test]
    fn test_marker_properties() {
        let mut first = wp(4, -35.0, 138.75);
        first.icon_src = "/icons/left.svg".to_string();
        let fc = to_map_overlay(&[first], &[], None);

        assert_eq!(fc.features.len(), 1);
        let f = &fc.features[0];
        let props = f.properties.as_ref().unwrap();
        assert_eq!(props["layer"], "waypoint");
        assert_eq!(props["label"], 1);
        assert_eq!(props["id"], 4);
        assert_eq!(props["name"], "Unnamed");
        assert_eq!(props["iconSrc"], "/icons/left.svg");
        assert_eq!(props["distance"], 0.5);
        assert!(props.get("poi").is_none());

        // Check [lon, lat] order
        if let Value::Point(coords) = &f.geometry.as_ref().unwrap().value {
            assert!((coords[0] - 138.75).abs() < 1e-10);
            assert!((coords[1] + 35.0).abs() < 1e-10);
        } else {
            panic!("Expected Point geometry");
        }
    }

    #[test]
    fn test_all_layers() {
        let waypoints = [wp(1, 0.0, 0.0), wp(2, 0.0, 0.01)];
        let tracking = [
            TrackingPoint::new(Coordinate::new(0.0, 0.0), String::new()),
            TrackingPoint::new(Coordinate::new(0.0, 0.005), String::new()),
            TrackingPoint::new(Coordinate::new(0.0, 0.01), String::new()),
        ];
        let fix = Fix::new(0.0, 0.01, Some(12.5));
        let fc = to_map_overlay(&waypoints, &tracking, Some(&fix));

        assert_eq!(
            layers(&fc),
            vec!["waypoint", "waypoint", "route", "tracking", "position"]
        );
        let labels: Vec<u64> = fc.features[..2]
            .iter()
            .map(|f| f.properties.as_ref().unwrap()["label"].as_u64().unwrap())
            .collect();
        assert_eq!(labels, vec![1, 2]);

        match &fc.features[3].geometry.as_ref().unwrap().value {
            Value::LineString(coords) => assert_eq!(coords.len(), 3),
            _ => panic!("Expected LineString"),
        }
        assert_eq!(fc.features[4].properties.as_ref().unwrap()["accuracy"], 12.5);
    }

    #[test]
    fn test_single_tracking_point_draws_no_line() {
        let tracking = [TrackingPoint::new(Coordinate::new(0.0, 0.0), String::new())];
        let fc = to_map_overlay(&[wp(1, 0.0, 0.0)], &tracking, None);
        assert_eq!(layers(&fc), vec!["waypoint"]);
    }
}
