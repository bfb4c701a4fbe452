// Geographic coordinates <-> local metric plane (equirectangular approximation)

use crate::error::{SceneError, SceneResult};
use crate::kernel_in::{GeoPoint, MetricPoint, RawPoint};

/// Meters per degree of latitude on a spherical earth.
/// Only good for small areas (a few km), it is not geodesic.
pub const LAT_FAKT: f64 = 111139.0;

pub fn is_valid_coordinate(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude)
}

/// `x = lat * K`, `z = lon * K * cos(lat)`
pub fn to_metric(latitude: f64, longitude: f64) -> SceneResult<MetricPoint> {
    if !is_valid_coordinate(latitude, longitude) {
        return Err(SceneError::invalid_coordinate(latitude, longitude));
    }

    // the closer to the pole, the smaller a degree of longitude gets in meters
    let lon_fakt = LAT_FAKT * latitude.to_radians().cos();
    Ok(MetricPoint {
        x: latitude * LAT_FAKT,
        z: longitude * lon_fakt,
    })
}

/// Same as [`to_metric`], for points which may miss a coordinate (`null` in the query result).
pub fn raw_to_metric(point: &RawPoint) -> SceneResult<MetricPoint> {
    match (point.lat, point.lon) {
        (Some(latitude), Some(longitude)) => to_metric(latitude, longitude),
        (latitude, longitude) => Err(SceneError::InvalidCoordinate {
            latitude,
            longitude,
        }),
    }
}

/// Inverse of [`to_metric`]. The longitude uses the cosine of the *recovered*
/// latitude, so this is only an approximate inverse far away from the origin.
pub fn to_geo(point: MetricPoint) -> GeoPoint {
    let latitude = point.x / LAT_FAKT;
    let longitude = point.z / (LAT_FAKT * latitude.to_radians().cos());
    GeoPoint {
        latitude,
        longitude,
    }
}

/// Projects relative to a fixed origin (the query center): each point is
/// projected on its own, then the projected origin is subtracted.
#[derive(Clone, Copy, Debug)]
pub struct Projector {
    origin: GeoPoint,
    origin_metric: MetricPoint,
}

impl Projector {
    pub fn new(origin: GeoPoint) -> SceneResult<Self> {
        let origin_metric = to_metric(origin.latitude, origin.longitude)?;
        Ok(Self {
            origin,
            origin_metric,
        })
    }

    pub fn origin(&self) -> GeoPoint {
        self.origin
    }

    pub fn project(&self, point: &GeoPoint) -> SceneResult<MetricPoint> {
        Ok(to_metric(point.latitude, point.longitude)? - self.origin_metric)
    }

    pub fn project_raw(&self, point: &RawPoint) -> SceneResult<MetricPoint> {
        Ok(raw_to_metric(point)? - self.origin_metric)
    }

    pub fn unproject(&self, position: MetricPoint) -> GeoPoint {
        to_geo(position + self.origin_metric)
    }
}
