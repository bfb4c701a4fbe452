//// OSM data of a circular area -> classified, projected elements -> simple 3D meshes
//// Input: Overpass API (or a saved Overpass JSON result)

// Interface from the input modules to the scene builder
mod kernel_in;
mod error;
mod overpass;

// Geographic core: projection, query area, tag classification
mod bounding_box;
mod projector;
mod style;
mod tagticks;

mod config;
mod footprint;
mod scene;

// Interface from the scene to an output (renderer, file)
mod kernel_out;
mod mesh;

pub use bounding_box::*;
pub use config::*;
pub use error::*;
pub use footprint::Footprint;
pub use kernel_in::*;
pub use kernel_out::*;
pub use mesh::scene_to_meshes;
pub use overpass::{OverpassClient, build_query, scan_json_bytes, scan_json_str};
pub use projector::*;
pub use scene::*;
pub use style::{StyleAttributes, StyleConfig};
pub use tagticks::*;
