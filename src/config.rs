// Settings of a scene build, passed explicitly to whoever needs them

use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::SceneResult;
use crate::kernel_in::GeoPoint;

pub static OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub dark_mode: bool,
    /// Clip areas against the circle of the query radius
    pub clip_to_circle: bool,
    pub circle_segments: usize,
    /// How far the road surface ribbon is lifted above the road bed
    pub road_surface_lift: f32,
    /// Surface width relative to the road bed
    pub road_surface_ratio: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            dark_mode: false,
            clip_to_circle: true,
            circle_segments: 64,
            road_surface_lift: 0.05,
            road_surface_ratio: 0.8,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    pub endpoint: String,
    pub max_attempts: u32,
    pub retry_interval_secs: u64,
    /// Server side timeout, also part of the query
    pub timeout_secs: u64,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            endpoint: OVERPASS_URL.into(),
            max_attempts: 10,
            retry_interval_secs: 10,
            timeout_secs: 25,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub center: GeoPoint,
    /// meters
    pub radius: f64,
    pub render: RenderSettings,
    pub query: QuerySettings,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            // Erfurt, Domplatz
            center: GeoPoint::new(50.9786, 11.0328),
            radius: 500.0,
            render: RenderSettings::default(),
            query: QuerySettings::default(),
        }
    }
}

impl SceneConfig {
    pub fn from_json(json: &str) -> SceneResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> SceneResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&json)?;
        info!("config {}: {:?}", path.as_ref().display(), config);
        Ok(config)
    }
}
