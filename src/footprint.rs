// outer SHAPE of an area, with holes

use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use log::{debug, warn};

use crate::kernel_in::MetricPoint;

pub static POLYGON_OUTER: usize = 0;
pub static FIRST_HOLE_INDEX: usize = 1;

pub type Contour = Vec<MetricPoint>;
/// Outer contour first, then the holes
pub type Polygon = Vec<Contour>;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Footprint {
    pub polygons: Vec<Polygon>,
}

fn open_contour(mut contour: Contour) -> Contour {
    // OSM closes a ring by repeating the first node
    if contour.len() > 1 && contour.first() == contour.last() {
        contour.pop();
    }
    contour
}

fn contour_area(contour: &Contour) -> f64 {
    let mut sum = 0.;
    for (index, position) in contour.iter().enumerate() {
        let next = contour[(index + 1) % contour.len()];
        sum += position.x * next.z - next.x * position.z;
    }
    sum / 2.
}

impl Footprint {
    /// `None` if the outer contour has fewer than 3 corners
    pub fn new(outer: Contour) -> Option<Self> {
        let outer = open_contour(outer);
        if outer.len() < 3 {
            return None;
        }
        Some(Self {
            polygons: vec![vec![outer]],
        })
    }

    /// Adds another outer contour (multipolygons may have several)
    pub fn push_outer(&mut self, outer: Contour) {
        let outer = open_contour(outer);
        if outer.len() >= 3 {
            self.polygons.push(vec![outer]);
        }
    }

    /// The hole goes to the first polygon whose outer contour contains it.
    pub fn push_hole(&mut self, hole: Contour) {
        let hole = open_contour(hole);
        if hole.len() < 3 {
            debug!("hole with < 3 corners dropped");
            return;
        }
        let target = self
            .polygons
            .iter()
            .position(|polygon| contains(&polygon[POLYGON_OUTER], &hole[0]))
            .unwrap_or(0);
        if let Some(polygon) = self.polygons.get_mut(target) {
            polygon.push(hole);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Area without holes, square meters
    pub fn area(&self) -> f64 {
        self.polygons
            .iter()
            .map(|polygon| {
                let outer = contour_area(&polygon[POLYGON_OUTER]).abs();
                let holes: f64 = polygon[FIRST_HOLE_INDEX..]
                    .iter()
                    .map(|hole| contour_area(hole).abs())
                    .sum();
                outer - holes
            })
            .sum()
    }

    /// Intersects the footprint with a circle (around the origin) of `radius` meters.
    /// The result may be empty or split into several polygons.
    pub fn clip_to_circle(&mut self, radius: f64, segments: usize) {
        let segments = segments.max(8);
        let circle: Vec<[f64; 2]> = (0..segments)
            .map(|step| {
                let angle = step as f64 / segments as f64 * std::f64::consts::TAU;
                [radius * angle.cos(), radius * angle.sin()]
            })
            .collect();

        let subject: Vec<Vec<Vec<[f64; 2]>>> = self
            .polygons
            .iter()
            .map(|polygon| {
                polygon
                    .iter()
                    .map(|contour| contour.iter().map(|p| [p.x, p.z]).collect())
                    .collect()
            })
            .collect();

        let clipped = subject.overlay(&vec![circle], OverlayRule::Intersect, FillRule::EvenOdd);

        self.polygons = clipped
            .into_iter()
            .map(|shape| {
                shape
                    .into_iter()
                    .map(|contour| {
                        contour
                            .into_iter()
                            .map(|[x, z]| MetricPoint { x, z })
                            .collect()
                    })
                    .collect::<Polygon>()
            })
            .filter(|polygon| !polygon.is_empty() && polygon[POLYGON_OUTER].len() >= 3)
            .collect();
    }

    /// Triangle indices into the returned flat vertex list (outer, then holes).
    pub fn triangulate(&self, polygon_index: usize) -> (Vec<usize>, Vec<MetricPoint>) {
        let mut vertices = Vec::<f64>::new();
        let mut holes_starts = Vec::<usize>::new();
        let mut positions = Vec::new();

        for (contour_index, contour) in self.polygons[polygon_index].iter().enumerate() {
            if contour_index >= FIRST_HOLE_INDEX {
                holes_starts.push(vertices.len() / 2);
            }
            for position in contour {
                vertices.push(position.x);
                vertices.push(position.z);
                positions.push(*position);
            }
        }

        match earcutr::earcut(&vertices, &holes_starts, 2) {
            Ok(indices) => (indices, positions),
            Err(error) => {
                warn!("triangulate: {:?}", error);
                (Vec::new(), positions)
            }
        }
    }
}

/// Ray casting point in polygon
pub fn contains(contour: &Contour, point: &MetricPoint) -> bool {
    let mut inside = false;
    let count = contour.len();
    for index in 0..count {
        let a = contour[index];
        let b = contour[(index + count - 1) % count];
        if (a.z > point.z) != (b.z > point.z)
            && point.x < (b.x - a.x) * (point.z - a.z) / (b.z - a.z) + a.x
        {
            inside = !inside;
        }
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(center_x: f64, center_z: f64, half: f64) -> Contour {
        vec![
            MetricPoint::new(center_x - half, center_z - half),
            MetricPoint::new(center_x - half, center_z + half),
            MetricPoint::new(center_x + half, center_z + half),
            MetricPoint::new(center_x + half, center_z - half),
            MetricPoint::new(center_x - half, center_z - half),
        ]
    }

    #[test]
    fn closed_ring_is_opened() {
        let footprint = Footprint::new(square(0., 0., 10.)).unwrap();
        assert_eq!(footprint.polygons[0][POLYGON_OUTER].len(), 4);
        assert_relative_eq!(footprint.area(), 400.);
    }

    #[test]
    fn too_small_outer_is_rejected() {
        let line = vec![MetricPoint::new(0., 0.), MetricPoint::new(1., 1.)];
        assert!(Footprint::new(line).is_none());
    }

    #[test]
    fn hole_reduces_area() {
        let mut footprint = Footprint::new(square(0., 0., 10.)).unwrap();
        footprint.push_hole(square(0., 0., 5.));
        assert_eq!(footprint.polygons[0].len(), 2);
        assert_relative_eq!(footprint.area(), 300.);

        let (indices, positions) = footprint.triangulate(0);
        assert_eq!(positions.len(), 8);
        assert_eq!(indices.len() % 3, 0);
        assert!(!indices.is_empty());
    }

    #[test]
    fn footprint_inside_circle_stays() {
        let mut footprint = Footprint::new(square(0., 0., 10.)).unwrap();
        footprint.clip_to_circle(100., 64);
        assert_eq!(footprint.polygons.len(), 1);
        assert_relative_eq!(footprint.area(), 400., epsilon = 1e-2);
    }

    #[test]
    fn footprint_outside_circle_vanishes() {
        let mut footprint = Footprint::new(square(500., 500., 10.)).unwrap();
        footprint.clip_to_circle(100., 64);
        assert!(footprint.is_empty());
    }

    #[test]
    fn footprint_across_circle_is_cut() {
        // half of the square lies beyond x = 100
        let mut footprint = Footprint::new(square(100., 0., 10.)).unwrap();
        footprint.clip_to_circle(100., 256);
        assert!(!footprint.is_empty());
        let area = footprint.area();
        assert!(area > 150. && area < 250., "area {area}");
    }

    #[test]
    fn point_in_contour() {
        let contour = square(0., 0., 10.);
        assert!(contains(&contour, &MetricPoint::new(1., 1.)));
        assert!(!contains(&contour, &MetricPoint::new(11., 1.)));
    }
}
