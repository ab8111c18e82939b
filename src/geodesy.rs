use crate::route_types::{Coordinate, Waypoint};

/// Mean Earth radius in km.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Round to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Great-circle distance in km (Haversine), rounded to 2 decimals.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    round2(EARTH_RADIUS_KM * c)
}

pub fn distance_between(a: Coordinate, b: Coordinate) -> f64 {
    distance_km(a.lat, a.lon, b.lat, b.lon)
}

/// Path length through `waypoints` and on to `current`, as if `current` were
/// appended to the list. Returns 0 for an empty list.
///
/// Each leg is rounded before summing, then the total is rounded again.
pub fn cumulative_distance_km(waypoints: &[Waypoint], current: Coordinate) -> f64 {
    let Some(last) = waypoints.last() else {
        return 0.0;
    };

    let legs: f64 = waypoints
        .windows(2)
        .map(|pair| distance_between(pair[0].coord(), pair[1].coord()))
        .sum();

    round2(legs + distance_between(last.coord(), current))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route_types::WaypointId;

    fn wp(lat: f64, lon: f64, distance: f64) -> Waypoint {
        Waypoint::new(
            WaypointId(0),
            Coordinate::new(lat, lon),
            String::new(),
            distance,
        )
    }

    #[test]
    fn test_identical_points_are_zero() {
        assert_eq!(distance_km(-35.0, 138.75, -35.0, 138.75), 0.0);
    }

    #[test]
    fn test_symmetric() {
        let pairs = [
            ((-35.0, 138.75), (-34.9, 138.6)),
            ((51.5074, -0.1278), (48.8566, 2.3522)),
            ((0.0, 179.9), (0.0, -179.9)),
        ];
        for ((a_lat, a_lon), (b_lat, b_lon)) in pairs {
            assert_eq!(
                distance_km(a_lat, a_lon, b_lat, b_lon),
                distance_km(b_lat, b_lon, a_lat, a_lon)
            );
        }
    }

    #[test]
    fn test_known_distance_london_paris() {
        let d = distance_km(51.5074, -0.1278, 48.8566, 2.3522);
        assert!((d - 343.56).abs() < 0.5, "got {d}");
    }

    #[test]
    fn test_hundredth_degree_at_equator() {
        assert_eq!(distance_km(0.0, 0.0, 0.0, 0.01), 1.11);
    }

    #[test]
    fn test_collinear_points_add_up() {
        let d01 = distance_km(0.0, 0.0, 0.0, 0.5);
        let d12 = distance_km(0.0, 0.5, 0.0, 1.0);
        let d02 = distance_km(0.0, 0.0, 0.0, 1.0);
        assert!((d02 - (d01 + d12)).abs() <= 0.02);
    }

    #[test]
    fn test_cumulative_empty_is_zero() {
        assert_eq!(cumulative_distance_km(&[], Coordinate::new(10.0, 10.0)), 0.0);
    }

    #[test]
    fn test_cumulative_single_waypoint() {
        let d = cumulative_distance_km(&[wp(0.0, 0.0, 0.0)], Coordinate::new(0.0, 0.01));
        assert_eq!(d, 1.11);
    }

    #[test]
    fn test_cumulative_two_waypoints() {
        let waypoints = [wp(0.0, 0.0, 0.0), wp(0.0, 0.01, 1.11)];
        let d = cumulative_distance_km(&waypoints, Coordinate::new(0.0, 0.02));
        assert!((d - 2.22).abs() < 1e-9, "got {d}");
    }

    #[test]
    fn test_cumulative_ignores_stored_distances() {
        let waypoints = [wp(0.0, 0.0, 99.0), wp(0.0, 0.01, 99.0)];
        let d = cumulative_distance_km(&waypoints, Coordinate::new(0.0, 0.01));
        assert_eq!(d, 1.11);
    }
}
