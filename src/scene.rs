//////////////////////////////// Scene //////////////////////////////
// Tagged elements -> classified, projected elements around one origin

use log::{debug, info, warn};

use crate::bounding_box::BoundingBox;
use crate::config::SceneConfig;
use crate::error::{SceneError, SceneResult};
use crate::footprint::Footprint;
use crate::kernel_in::{
    ElementGeometry, GeoPoint, MemberRole, MemberWay, MetricPoint, RawPoint, TaggedElement,
};
use crate::projector::Projector;
use crate::tagticks::{GeometryPolicy, PolicyTable, StructuralKind, check_geometry};

#[derive(Clone, Debug)]
pub enum ElementShape {
    /// Center lines of ribbons
    Paths(Vec<Vec<MetricPoint>>),
    Area(Footprint),
}

#[derive(Clone, Debug)]
pub struct SceneElement {
    pub id: u64,
    /// Policy with the effective height
    pub policy: GeometryPolicy,
    pub shape: ElementShape,
}

/// Why elements or points did not make it into the scene
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Skipped {
    pub degenerate: usize,
    pub unclassified: usize,
    pub outside: usize,
    pub invalid_points: usize,
}

#[derive(Clone, Debug)]
pub struct Scene {
    pub origin: GeoPoint,
    pub bounding_box: BoundingBox,
    pub elements: Vec<SceneElement>,
    pub skipped: Skipped,
}

impl Scene {
    pub fn count(&self, kind: StructuralKind) -> usize {
        self.elements
            .iter()
            .filter(|element| element.policy.kind == kind)
            .count()
    }
}

pub struct SceneBuilder {
    config: SceneConfig,
    table: PolicyTable,
    projector: Projector,
    bounding_box: BoundingBox,
}

impl SceneBuilder {
    pub fn new(config: SceneConfig, table: PolicyTable) -> SceneResult<Self> {
        let projector = Projector::new(config.center)?;
        let bounding_box = BoundingBox::from_center_radius(&config.center, config.radius)?;
        Ok(Self {
            config,
            table,
            projector,
            bounding_box,
        })
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn table(&self) -> &PolicyTable {
        &self.table
    }

    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bounding_box
    }

    pub fn projector(&self) -> &Projector {
        &self.projector
    }

    /// One pass over the query result. Bad elements are logged and skipped, never fatal.
    pub fn build(&self, elements: &[TaggedElement]) -> Scene {
        let mut skipped = Skipped::default();
        let mut scene_elements = Vec::new();

        for element in elements {
            match self.add_element(element, &mut skipped) {
                Ok(Some(scene_element)) => scene_elements.push(scene_element),
                Ok(None) => (),
                Err(error) => {
                    warn!("element {} skipped: {}", element.id, error);
                    skipped.degenerate += 1;
                }
            }
        }

        info!(
            "scene: {} elements, skipped: {:?}",
            scene_elements.len(),
            skipped
        );
        Scene {
            origin: self.projector.origin(),
            bounding_box: self.bounding_box,
            elements: scene_elements,
            skipped,
        }
    }

    fn add_element(
        &self,
        element: &TaggedElement,
        skipped: &mut Skipped,
    ) -> SceneResult<Option<SceneElement>> {
        check_geometry(element)?;

        let Some(policy) = self.table.classify(&element.tags) else {
            debug!("element {}: no policy for {:?}", element.id, element.tags);
            skipped.unclassified += 1;
            return Ok(None);
        };

        let shape = match (&element.geometry, policy.kind) {
            (ElementGeometry::Way(points), StructuralKind::ExtrudedArea) => {
                let outer = self.project_points(points, skipped);
                let footprint = Footprint::new(outer).ok_or(SceneError::DegenerateGeometry {
                    id: element.id,
                    points: points.len(),
                })?;
                ElementShape::Area(footprint)
            }
            (ElementGeometry::Way(points), _) => {
                let path = self.project_points(points, skipped);
                if path.len() < 2 {
                    return Err(SceneError::DegenerateGeometry {
                        id: element.id,
                        points: path.len(),
                    });
                }
                ElementShape::Paths(vec![path])
            }
            (ElementGeometry::Relation(members), StructuralKind::ExtrudedArea) => {
                ElementShape::Area(self.relation_footprint(element.id, members, skipped)?)
            }
            (ElementGeometry::Relation(members), _) => {
                let paths: Vec<Vec<MetricPoint>> = members
                    .iter()
                    .map(|member| self.project_points(&member.points, skipped))
                    .filter(|path| path.len() >= 2)
                    .collect();
                if paths.is_empty() {
                    return Err(SceneError::DegenerateGeometry {
                        id: element.id,
                        points: 0,
                    });
                }
                ElementShape::Paths(paths)
            }
        };

        let shape = match shape {
            ElementShape::Area(mut footprint) if self.config.render.clip_to_circle => {
                footprint.clip_to_circle(self.config.radius, self.config.render.circle_segments);
                if footprint.is_empty() {
                    debug!("element {}: outside of the circle", element.id);
                    skipped.outside += 1;
                    return Ok(None);
                }
                ElementShape::Area(footprint)
            }
            shape => shape,
        };

        Ok(Some(SceneElement {
            id: element.id,
            policy,
            shape,
        }))
    }

    // Outer members become outlines, inner members holes
    fn relation_footprint(
        &self,
        id: u64,
        members: &[MemberWay],
        skipped: &mut Skipped,
    ) -> SceneResult<Footprint> {
        let mut footprint: Option<Footprint> = None;
        for member in members.iter().filter(|m| m.role == MemberRole::Outer) {
            let outer = self.project_points(&member.points, skipped);
            match footprint.as_mut() {
                Some(footprint) => footprint.push_outer(outer),
                None => footprint = Footprint::new(outer),
            }
        }

        let Some(mut footprint) = footprint else {
            return Err(SceneError::DegenerateGeometry { id, points: 0 });
        };
        for member in members.iter().filter(|m| m.role == MemberRole::Inner) {
            let hole = self.project_points(&member.points, skipped);
            footprint.push_hole(hole);
        }
        Ok(footprint)
    }

    // An invalid point is dropped, the rest of the element survives
    fn project_points(&self, points: &[RawPoint], skipped: &mut Skipped) -> Vec<MetricPoint> {
        points
            .iter()
            .filter_map(|point| match self.projector.project_raw(point) {
                Ok(position) => Some(position),
                Err(error) => {
                    debug!("point dropped: {error}");
                    skipped.invalid_points += 1;
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel_in::Tags;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    fn builder() -> SceneBuilder {
        SceneBuilder::new(SceneConfig::default(), PolicyTable::default()).unwrap()
    }

    // a small square north east of the default center
    fn ring(offset: f64) -> Vec<RawPoint> {
        let (lat, lon) = (50.9786 + offset, 11.0328 + offset);
        vec![
            RawPoint::new(lat, lon),
            RawPoint::new(lat, lon + 0.0002),
            RawPoint::new(lat + 0.0002, lon + 0.0002),
            RawPoint::new(lat + 0.0002, lon),
            RawPoint::new(lat, lon),
        ]
    }

    #[test]
    fn road_becomes_a_path() {
        let road = TaggedElement::way(
            1,
            tags(&[("highway", "residential")]),
            vec![RawPoint::new(50.9786, 11.0328), RawPoint::new(50.9790, 11.0330)],
        );
        let scene = builder().build(&[road]);
        assert_eq!(scene.elements.len(), 1);
        match &scene.elements[0].shape {
            ElementShape::Paths(paths) => {
                assert_eq!(paths[0].len(), 2);
                // the first point is the origin
                assert!(paths[0][0].length() < 1e-6);
            }
            _ => panic!("path expected"),
        }
    }

    #[test]
    fn invalid_point_is_dropped_not_the_element() {
        let road = TaggedElement::way(
            2,
            tags(&[("highway", "service")]),
            vec![
                RawPoint::new(50.9786, 11.0328),
                RawPoint::MISSING,
                RawPoint::new(50.9790, 11.0330),
            ],
        );
        let scene = builder().build(&[road]);
        assert_eq!(scene.elements.len(), 1);
        assert_eq!(scene.skipped.invalid_points, 1);
    }

    #[test]
    fn degenerate_and_unknown_elements_are_skipped() {
        let single = TaggedElement::way(
            3,
            tags(&[("highway", "primary")]),
            vec![RawPoint::new(50.9786, 11.0328)],
        );
        let unknown = TaggedElement::way(4, tags(&[("foo", "bar")]), ring(0.0));
        let two_point_building = TaggedElement::way(
            5,
            tags(&[("building", "yes")]),
            vec![RawPoint::new(50.9786, 11.0328), RawPoint::new(50.9787, 11.0328)],
        );
        let scene = builder().build(&[single, unknown, two_point_building]);
        assert!(scene.elements.is_empty());
        assert_eq!(scene.skipped.degenerate, 2);
        assert_eq!(scene.skipped.unclassified, 1);
    }

    #[test]
    fn building_with_courtyard() {
        let relation = TaggedElement::relation(
            6,
            tags(&[("building", "yes"), ("height", "23.5")]),
            vec![
                MemberWay {
                    reference: 61,
                    role: MemberRole::Outer,
                    points: ring(0.0),
                },
                MemberWay {
                    reference: 62,
                    role: MemberRole::Inner,
                    points: vec![
                        RawPoint::new(50.97865, 11.03285),
                        RawPoint::new(50.97865, 11.03295),
                        RawPoint::new(50.97875, 11.03295),
                        RawPoint::new(50.97865, 11.03285),
                    ],
                },
            ],
        );
        let scene = builder().build(&[relation]);
        assert_eq!(scene.elements.len(), 1);
        let element = &scene.elements[0];
        assert_eq!(element.policy.height, 23.5);
        match &element.shape {
            ElementShape::Area(footprint) => {
                assert_eq!(footprint.polygons.len(), 1);
                assert_eq!(footprint.polygons[0].len(), 2);
            }
            _ => panic!("area expected"),
        }
    }

    #[test]
    fn areas_outside_the_circle_are_dropped() {
        let far = TaggedElement::way(7, tags(&[("building", "yes")]), ring(0.02));
        let near = TaggedElement::way(8, tags(&[("building", "yes")]), ring(0.0));
        let scene = builder().build(&[far, near]);
        assert_eq!(scene.elements.len(), 1);
        assert_eq!(scene.elements[0].id, 8);
        assert_eq!(scene.skipped.outside, 1);
        assert_eq!(scene.count(StructuralKind::ExtrudedArea), 1);
    }

    #[test]
    fn without_clipping_far_areas_stay() {
        let mut config = SceneConfig::default();
        config.render.clip_to_circle = false;
        let builder = SceneBuilder::new(config, PolicyTable::default()).unwrap();
        let far = TaggedElement::way(7, tags(&[("building", "yes")]), ring(0.02));
        assert_eq!(builder.build(&[far]).elements.len(), 1);
    }

    #[test]
    fn invalid_center_is_rejected() {
        let mut config = SceneConfig::default();
        config.center = GeoPoint::new(95.0, 0.0);
        assert!(SceneBuilder::new(config, PolicyTable::default()).is_err());
    }
}
