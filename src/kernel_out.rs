// Internal Interface of the crate/lib between the mesh builder and output modules/crates

use serde::Serialize;

use crate::tagticks::StructuralKind;

// Internal color type. It's just luck, it is the same as needed for most wgpu renderers ;-)
pub type RenderColor = [f32; 4];

// The usual format a GPU wants its vertex position: [east, height, -north]
pub type GpuPosition = [f32; 3];

// Mesh render attributes
#[derive(Clone, Debug, Serialize)]
pub struct OsmMesh {
    pub kind: StructuralKind,
    pub vertices_colors: Vec<RenderColor>,    // format: Float32x4
    pub vertices_positions: Vec<GpuPosition>, // The corners are NOT reused to get hard edges
    pub indices_to_vertices: Vec<u32>,
}

impl OsmMesh {
    pub fn new(kind: StructuralKind) -> Self {
        Self {
            kind,
            vertices_colors: vec![],
            vertices_positions: vec![],
            indices_to_vertices: vec![],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.indices_to_vertices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices_to_vertices.len() / 3
    }
}
