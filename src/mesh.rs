use log::{debug, info};

use crate::config::RenderSettings;
use crate::footprint::Footprint;
use crate::kernel_in::MetricPoint;
use crate::kernel_out::{GpuPosition, OsmMesh, RenderColor};
use crate::scene::{ElementShape, Scene, SceneElement};
use crate::tagticks::StructuralKind;

///////////////////////////////////////////////////////////////////////////////////////////////////
// Scene to meshes ////////////////////////////////////////////////////////////////////////////////

static ROAD_KEY: &str = "highway";
static ROAD_BED_SHADE: f32 = 0.7;

// Only used in the mesh builder: to the GPU space
impl MetricPoint {
    pub fn to_gpu_position(self, height: f32) -> GpuPosition {
        // Minus north because +north is -z in the GPU space.
        [self.z as f32, height, -self.x as f32]
    }
}

fn shade(color: RenderColor, factor: f32) -> RenderColor {
    [color[0] * factor, color[1] * factor, color[2] * factor, color[3]]
}

/// One mesh per structural kind, empty ones left out.
pub fn scene_to_meshes(scene: &Scene, render: &RenderSettings) -> Vec<OsmMesh> {
    let mut meshes = vec![
        OsmMesh::new(StructuralKind::LinearWay),
        OsmMesh::new(StructuralKind::RailWay),
        OsmMesh::new(StructuralKind::ExtrudedArea),
    ];

    for element in &scene.elements {
        if let Some(mesh) = meshes.iter_mut().find(|mesh| mesh.kind == element.policy.kind) {
            mesh.push_element(element, render);
        }
    }

    meshes.retain(|mesh| !mesh.is_empty());
    for mesh in &meshes {
        info!(
            "mesh {:?}: {} vertices, {} triangles",
            mesh.kind,
            mesh.vertices_positions.len(),
            mesh.triangle_count()
        );
    }
    meshes
}

impl OsmMesh {
    pub fn push_element(&mut self, element: &SceneElement, render: &RenderSettings) {
        let policy = &element.policy;
        let color = policy.color(render.dark_mode);

        match &element.shape {
            ElementShape::Paths(paths) => {
                let is_road =
                    policy.kind == StructuralKind::LinearWay && policy.tag_key == ROAD_KEY;
                for path in paths {
                    if is_road {
                        // below: the road bed, above: the narrower raised surface
                        self.push_ribbon(
                            path,
                            policy.width,
                            policy.height,
                            policy.y_offset,
                            shade(color, ROAD_BED_SHADE),
                        );
                        self.push_ribbon(
                            path,
                            policy.width * render.road_surface_ratio,
                            render.road_surface_lift,
                            policy.y_offset + policy.height,
                            color,
                        );
                    } else {
                        self.push_ribbon(path, policy.width, policy.height, policy.y_offset, color);
                    }
                }
            }
            ElementShape::Area(footprint) => {
                self.push_extruded_area(footprint, policy.height, policy.y_offset, color)
            }
        }
    }

    /// A box of `width` x `height` along every pair of consecutive points.
    pub fn push_ribbon(
        &mut self,
        path: &[MetricPoint],
        width: f32,
        height: f32,
        y_offset: f32,
        color: RenderColor,
    ) {
        let half = width as f64 / 2.;
        let bottom = y_offset;
        let top = y_offset + height;

        for pair in path.windows(2) {
            let (start, end) = (pair[0], pair[1]);
            let length = start.distance_to(&end);
            if length < 1e-6 {
                debug!("ribbon: zero length segment skipped");
                continue;
            }
            // left of the direction
            let side = MetricPoint::new(
                -(end.z - start.z) / length * half,
                (end.x - start.x) / length * half,
            );
            let start_left = start + side;
            let start_right = start - side;
            let end_left = end + side;
            let end_right = end - side;

            // top
            self.push_square(
                [
                    start_left.to_gpu_position(top),
                    start_right.to_gpu_position(top),
                    end_right.to_gpu_position(top),
                    end_left.to_gpu_position(top),
                ],
                color,
            );
            // sides
            self.push_wall(start_right, end_right, bottom, top, color);
            self.push_wall(end_left, start_left, bottom, top, color);
            // caps
            self.push_wall(start_left, start_right, bottom, top, color);
            self.push_wall(end_right, end_left, bottom, top, color);
        }
    }

    /// Flat roof at `y_offset + height` and a wall along every contour edge.
    pub fn push_extruded_area(
        &mut self,
        footprint: &Footprint,
        height: f32,
        y_offset: f32,
        color: RenderColor,
    ) {
        let top = y_offset + height;
        for (polygon_index, polygon) in footprint.polygons.iter().enumerate() {
            let (indices, positions) = footprint.triangulate(polygon_index);
            if !indices.is_empty() {
                let roof_index_offset = self.vertices_positions.len();
                for position in &positions {
                    self.vertices_positions.push(position.to_gpu_position(top));
                    self.vertices_colors.push(color);
                }
                // earcut and the GPU disagree on the winding (north is -z)
                for index in indices.iter().rev() {
                    self.indices_to_vertices
                        .push((roof_index_offset + index) as u32);
                }
            }

            for contour in polygon {
                for (index, position) in contour.iter().enumerate() {
                    let next = contour[(index + 1) % contour.len()];
                    self.push_wall(*position, next, y_offset, top, color);
                }
            }
        }
    }

    fn push_wall(
        &mut self,
        from: MetricPoint,
        to: MetricPoint,
        bottom: f32,
        top: f32,
        color: RenderColor,
    ) {
        self.push_square(
            [
                from.to_gpu_position(bottom),
                to.to_gpu_position(bottom),
                to.to_gpu_position(top),
                from.to_gpu_position(top),
            ],
            color,
        );
    }

    // The corners are not shared with neighbour squares: hard edges
    fn push_square(&mut self, corners: [GpuPosition; 4], color: RenderColor) {
        let offset = self.vertices_positions.len() as u32;
        for corner in corners {
            self.vertices_positions.push(corner);
            self.vertices_colors.push(color);
        }
        self.push_3_indices([offset, offset + 1, offset + 2]);
        self.push_3_indices([offset, offset + 2, offset + 3]);
    }

    fn push_3_indices(&mut self, indices: [u32; 3]) {
        self.indices_to_vertices.extend_from_slice(&indices);
    }
}
