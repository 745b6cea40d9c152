use serde::Serialize;

use crate::models::activity::Activity;

/// Zoom used when the map shows a single trip.
pub const TRIP_ZOOM: u8 = 10;
/// Zoom used when the map shows every trip.
pub const WORLD_ZOOM: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub latitude: f64,
    pub longitude: f64,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MapView {
    pub center: LatLng,
    pub zoom: u8,
    pub markers: Vec<Marker>,
}

/// Builds map markers from activities that carry both coordinates.
///
/// Activities with either coordinate missing are skipped. The center is the
/// plain mean of the marker positions, or `(0, 0)` without markers.
pub fn project(activities: &[Activity], scoped_to_trip: bool) -> MapView {
    let markers: Vec<Marker> = activities
        .iter()
        .filter_map(|activity| {
            activity.coordinates().map(|(latitude, longitude)| Marker {
                latitude,
                longitude,
                title: activity.title.clone(),
            })
        })
        .collect();

    let center = if markers.is_empty() {
        LatLng {
            latitude: 0.0,
            longitude: 0.0,
        }
    } else {
        let count = markers.len() as f64;
        let (lat_sum, lng_sum) = markers.iter().fold((0.0, 0.0), |(lat, lng), marker| {
            (lat + marker.latitude, lng + marker.longitude)
        });
        LatLng {
            latitude: lat_sum / count,
            longitude: lng_sum / count,
        }
    };

    MapView {
        center,
        zoom: if scoped_to_trip { TRIP_ZOOM } else { WORLD_ZOOM },
        markers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::activity::tests::activity;

    fn located(id: i64, lat: Option<f64>, lng: Option<f64>) -> Activity {
        let mut item = activity(id, (2024, 10, 29), (9, 0));
        item.latitude = lat;
        item.longitude = lng;
        item
    }

    #[test]
    fn skips_activities_missing_a_coordinate() {
        let view = project(
            &[
                located(1, Some(21.0338), Some(105.85)),
                located(2, Some(20.9101), None),
                located(3, None, Some(108.338)),
                located(4, Some(15.8801), Some(108.338)),
            ],
            true,
        );
        let titles: Vec<&str> = view.markers.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["activity 1", "activity 4"]);
        assert_eq!(view.zoom, TRIP_ZOOM);
    }

    #[test]
    fn center_is_the_mean_position() {
        let view = project(
            &[
                located(1, Some(10.0), Some(100.0)),
                located(2, Some(20.0), Some(110.0)),
            ],
            false,
        );
        assert!((view.center.latitude - 15.0).abs() < 1e-9);
        assert!((view.center.longitude - 105.0).abs() < 1e-9);
        assert_eq!(view.zoom, WORLD_ZOOM);
    }

    #[test]
    fn zero_coordinates_still_count() {
        let view = project(&[located(1, Some(0.0), Some(0.0))], true);
        assert_eq!(view.markers.len(), 1);
    }

    #[test]
    fn empty_map_centers_on_origin() {
        let view = project(&[located(1, None, None)], false);
        assert!(view.markers.is_empty());
        assert_eq!(
            view.center,
            LatLng {
                latitude: 0.0,
                longitude: 0.0
            }
        );
    }
}
