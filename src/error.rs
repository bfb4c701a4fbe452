// Errors of the crate. None of them is fatal for a scene build, the caller decides.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SceneError {
    /// Missing, NaN or out of range latitude/longitude. Also returned for polar
    /// latitudes, where the planar approximation breaks down.
    #[error("invalid coordinate: lat {latitude:?} lon {longitude:?}")]
    InvalidCoordinate {
        latitude: Option<f64>,
        longitude: Option<f64>,
    },

    #[error("invalid radius: {0} (must be finite and > 0)")]
    InvalidRadius(f64),

    /// Fewer than 2 points for a path, or an empty polygon.
    #[error("degenerate geometry of element {id}: {points} point(s)")]
    DegenerateGeometry { id: u64, points: usize },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no data after {attempts} attempt(s)")]
    NoData { attempts: u32 },
}

impl SceneError {
    pub fn invalid_coordinate(latitude: f64, longitude: f64) -> Self {
        SceneError::InvalidCoordinate {
            latitude: Some(latitude),
            longitude: Some(longitude),
        }
    }
}

pub type SceneResult<T> = Result<T, SceneError>;
