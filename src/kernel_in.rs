// Internal Interface of the crate/lib between input modules and the scene builder

use std::collections::HashMap;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

pub type Tags = HashMap<String, String>;

/// WGS84 position in degrees. Always latitude (north) before longitude (east).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lon")]
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// Local planar position in meters. `x` points north, `z` points east.
/// The height (`y`) is not part of the projection.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct MetricPoint {
    pub x: f64,
    pub z: f64,
}

impl MetricPoint {
    pub const ZERO: Self = Self { x: 0.0, z: 0.0 };

    pub fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    pub fn distance_to(&self, other: &MetricPoint) -> f64 {
        let a = self.x - other.x;
        let b = self.z - other.z;
        f64::sqrt(a * a + b * b)
    }

    pub fn length(&self) -> f64 {
        self.distance_to(&MetricPoint::ZERO)
    }
}

impl Add for MetricPoint {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            z: self.z + other.z,
        }
    }
}

impl Sub for MetricPoint {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            z: self.z - other.z,
        }
    }
}

impl std::fmt::Display for MetricPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// A point as it comes from the query result. Missing nodes arrive as `null`.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct RawPoint {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl RawPoint {
    pub const MISSING: Self = Self {
        lat: None,
        lon: None,
    };

    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat: Some(lat),
            lon: Some(lon),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementKind {
    Way,
    Relation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberRole {
    Outer,
    Inner,
}

#[derive(Clone, Debug)]
pub struct MemberWay {
    pub reference: u64,
    pub role: MemberRole,
    pub points: Vec<RawPoint>,
}

#[derive(Clone, Debug)]
pub enum ElementGeometry {
    Way(Vec<RawPoint>),
    Relation(Vec<MemberWay>),
}

/// A way or relation with its tags and its resolved geometry. Read only.
#[derive(Clone, Debug)]
pub struct TaggedElement {
    pub id: u64,
    pub tags: Tags,
    pub geometry: ElementGeometry,
}

impl TaggedElement {
    pub fn way(id: u64, tags: Tags, points: Vec<RawPoint>) -> Self {
        Self {
            id,
            tags,
            geometry: ElementGeometry::Way(points),
        }
    }

    pub fn relation(id: u64, tags: Tags, members: Vec<MemberWay>) -> Self {
        Self {
            id,
            tags,
            geometry: ElementGeometry::Relation(members),
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self.geometry {
            ElementGeometry::Way(_) => ElementKind::Way,
            ElementGeometry::Relation(_) => ElementKind::Relation,
        }
    }
}
