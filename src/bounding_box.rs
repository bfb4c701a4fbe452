// Query area: a lat/lon box around a center point

use crate::error::{SceneError, SceneResult};
use crate::kernel_in::{GeoPoint, MetricPoint};
use crate::projector::{is_valid_coordinate, to_geo, to_metric};

/// Beyond this latitude the cosine term degenerates and the boxes get useless.
pub const POLAR_LATITUDE_LIMIT: f64 = 85.0;

/// Decimals of each bound in a query string.
pub const QUERY_DECIMALS: usize = 7;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// A square of `2 * radius` meters in the projected plane, not a geodesic circle.
    /// Fine for tens up to a few thousand meters.
    ///
    /// The corners are unprojected at their own latitude, so the box is `2 * radius`
    /// wide when its corners are projected back, but wider (about 15 % at 51°N)
    /// when the longitude span is measured at the center latitude.
    pub fn from_center_radius(center: &GeoPoint, radius: f64) -> SceneResult<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(SceneError::InvalidRadius(radius));
        }
        if center.latitude.abs() > POLAR_LATITUDE_LIMIT {
            return Err(SceneError::invalid_coordinate(
                center.latitude,
                center.longitude,
            ));
        }

        let metric_center = to_metric(center.latitude, center.longitude)?;
        let half = MetricPoint::new(radius, radius);
        let min = to_geo(metric_center - half);
        let max = to_geo(metric_center + half);

        let bounding_box = BoundingBox {
            min_lat: min.latitude,
            min_lon: min.longitude,
            max_lat: max.latitude,
            max_lon: max.longitude,
        };
        for corner in [min, max] {
            if !is_valid_coordinate(corner.latitude, corner.longitude)
                || corner.latitude.abs() > POLAR_LATITUDE_LIMIT
            {
                return Err(SceneError::invalid_coordinate(
                    corner.latitude,
                    corner.longitude,
                ));
            }
        }

        Ok(bounding_box)
    }

    pub fn min(&self) -> GeoPoint {
        GeoPoint::new(self.min_lat, self.min_lon)
    }

    pub fn max(&self) -> GeoPoint {
        GeoPoint::new(self.max_lat, self.max_lon)
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint {
            latitude: self.min_lat + (self.max_lat - self.min_lat) / 2.,
            longitude: self.min_lon + (self.max_lon - self.min_lon) / 2.,
        }
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.latitude)
            && (self.min_lon..=self.max_lon).contains(&point.longitude)
    }

    /// `min_lat,min_lon,max_lat,max_lon`, the bbox order of Overpass QL
    pub fn to_query_string(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:.prec$},{:.prec$},{:.prec$},{:.prec$}",
            self.min_lat,
            self.min_lon,
            self.max_lat,
            self.max_lon,
            prec = QUERY_DECIMALS
        )
    }
}

pub fn compute_bounding_box(center: &GeoPoint, radius: f64) -> SceneResult<BoundingBox> {
    BoundingBox::from_center_radius(center, radius)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projector::LAT_FAKT;
    use approx::assert_abs_diff_eq;

    fn erfurt() -> GeoPoint {
        GeoPoint::new(50.9786, 11.0328)
    }

    #[test]
    fn box_is_centered() {
        let bounding_box = compute_bounding_box(&erfurt(), 500.).unwrap();
        let center = bounding_box.center();
        assert!((center.latitude - 50.9786).abs() < 1e-4);
        assert!((center.longitude - 11.0328).abs() < 1e-4);
        assert!(bounding_box.contains(&erfurt()));
    }

    #[test]
    fn box_spans_twice_the_radius() {
        let bounding_box = compute_bounding_box(&erfurt(), 500.).unwrap();

        let lat_extent = (bounding_box.max_lat - bounding_box.min_lat) * LAT_FAKT;
        assert!((lat_extent - 1000.).abs() < 10.);

        let min = to_metric(bounding_box.min_lat, bounding_box.min_lon).unwrap();
        let max = to_metric(bounding_box.max_lat, bounding_box.max_lon).unwrap();
        assert_abs_diff_eq!(max.x - min.x, 1000., epsilon = 10.);
        assert_abs_diff_eq!(max.z - min.z, 1000., epsilon = 10.);
    }

    #[test]
    fn query_string_has_seven_decimals() {
        let bounding_box = compute_bounding_box(&erfurt(), 500.).unwrap();
        let query = bounding_box.to_query_string();
        let numbers: Vec<&str> = query.split(',').collect();
        assert_eq!(numbers.len(), 4);
        for number in &numbers {
            let (_, decimals) = number.split_once('.').unwrap();
            assert_eq!(decimals.len(), 7, "{number}");
        }

        let values: Vec<f64> = numbers.iter().map(|n| n.parse().unwrap()).collect();
        assert!(values[0] < 50.9786 && values[2] > 50.9786);
        assert!(values[1] < 11.0328 && values[3] > 11.0328);
    }

    #[test]
    fn invalid_input_is_rejected() {
        assert!(matches!(
            compute_bounding_box(&GeoPoint::new(f64::NAN, 11.), 500.),
            Err(SceneError::InvalidCoordinate { .. })
        ));
        assert!(matches!(
            compute_bounding_box(&erfurt(), 0.),
            Err(SceneError::InvalidRadius(_))
        ));
        assert!(compute_bounding_box(&erfurt(), -5.).is_err());
        assert!(compute_bounding_box(&GeoPoint::new(50., 200.), 500.).is_err());
    }

    #[test]
    fn polar_latitudes_fail() {
        assert!(matches!(
            compute_bounding_box(&GeoPoint::new(89.9, 0.), 500.),
            Err(SceneError::InvalidCoordinate { .. })
        ));
        assert!(compute_bounding_box(&GeoPoint::new(-86., 20.), 500.).is_err());
        // just below the limit a small box still works
        assert!(compute_bounding_box(&GeoPoint::new(84., 20.), 500.).is_ok());
    }
}
