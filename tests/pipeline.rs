use approx::assert_abs_diff_eq;

use osm_scene::{
    BoundingBox, ElementShape, GeoPoint, PolicyTable, SceneBuilder, SceneConfig, SceneError,
    StructuralKind, compute_bounding_box, scan_json_str, scene_to_meshes, to_geo, to_metric,
};

// A saved `out geom;` answer around the default center (Erfurt)
static ERFURT: &str = r#"{
  "version": 0.6,
  "generator": "Overpass API",
  "elements": [
    { "type": "way", "id": 100, "tags": { "highway": "motorway", "building": "yes" },
      "geometry": [ { "lat": 50.9780, "lon": 11.0320 }, { "lat": 50.9790, "lon": 11.0335 } ] },
    { "type": "way", "id": 101, "tags": { "railway": "tram" },
      "geometry": [ { "lat": 50.9782, "lon": 11.0322 }, { "lat": 50.9784, "lon": 11.0326 },
                    { "lat": 50.9788, "lon": 11.0327 } ] },
    { "type": "way", "id": 102, "tags": { "building": "church", "height": "60" },
      "geometry": [ { "lat": 50.9786, "lon": 11.0328 }, { "lat": 50.9786, "lon": 11.0331 },
                    { "lat": 50.9788, "lon": 11.0331 }, { "lat": 50.9788, "lon": 11.0328 },
                    { "lat": 50.9786, "lon": 11.0328 } ] },
    { "type": "way", "id": 103, "tags": { "amenity": "bench" },
      "geometry": [ { "lat": 50.9786, "lon": 11.0328 }, { "lat": 50.9787, "lon": 11.0328 } ] },
    { "type": "way", "id": 104, "tags": { "highway": "footway" },
      "geometry": [ { "lat": 50.9786, "lon": 11.0328 } ] },
    { "type": "way", "id": 105, "tags": { "boundary": "administrative" },
      "geometry": [ { "lat": 50.97, "lon": 11.03 }, { "lat": 50.98, "lon": 11.04 } ] }
  ]
}"#;

#[test]
fn saved_result_to_meshes() {
    let elements = scan_json_str(ERFURT).unwrap();
    assert_eq!(elements.len(), 6);

    let builder = SceneBuilder::new(SceneConfig::default(), PolicyTable::default()).unwrap();
    let scene = builder.build(&elements);

    // motorway, tram, church
    assert_eq!(scene.elements.len(), 3);
    assert_eq!(scene.skipped.degenerate, 1);
    assert_eq!(scene.skipped.unclassified, 2);

    let motorway = scene.elements.iter().find(|e| e.id == 100).unwrap();
    assert_eq!(motorway.policy.tag_value, "motorway");

    let church = scene.elements.iter().find(|e| e.id == 102).unwrap();
    assert_eq!(church.policy.kind, StructuralKind::ExtrudedArea);
    assert_eq!(church.policy.height, 35.0);
    assert!(matches!(church.shape, ElementShape::Area(_)));

    let meshes = scene_to_meshes(&scene, &builder.config().render);
    let kinds: Vec<StructuralKind> = meshes.iter().map(|mesh| mesh.kind).collect();
    assert_eq!(
        kinds,
        vec![
            StructuralKind::LinearWay,
            StructuralKind::RailWay,
            StructuralKind::ExtrudedArea
        ]
    );
    for mesh in &meshes {
        assert_eq!(mesh.vertices_positions.len(), mesh.vertices_colors.len());
        let count = mesh.vertices_positions.len() as u32;
        assert!(mesh.indices_to_vertices.iter().all(|index| *index < count));
    }
    // the church is clamped to 35 m
    let top = meshes[2]
        .vertices_positions
        .iter()
        .map(|position| position[1])
        .fold(f32::MIN, f32::max);
    assert_abs_diff_eq!(top, 35.0, epsilon = 1e-4);
}

#[test]
fn round_trip_is_exact_enough() {
    for latitude in [-80.0, -45.5, 0.0, 12.25, 50.9786, 84.0] {
        for longitude in [-180.0, -90.1, 0.0, 11.0328, 179.99, 180.0] {
            let geo = to_geo(to_metric(latitude, longitude).unwrap());
            assert_abs_diff_eq!(geo.latitude, latitude, epsilon = 1e-6);
            assert_abs_diff_eq!(geo.longitude, longitude, epsilon = 1e-6);
        }
    }
}

#[test]
fn nan_coordinates_are_invalid() {
    assert!(matches!(
        to_metric(f64::NAN, 10.0),
        Err(SceneError::InvalidCoordinate { .. })
    ));
    assert!(matches!(
        to_metric(10.0, f64::NAN),
        Err(SceneError::InvalidCoordinate { .. })
    ));
}

#[test]
fn erfurt_bounding_box_string() {
    let bounding_box: BoundingBox =
        compute_bounding_box(&GeoPoint::new(50.9786, 11.0328), 500.0).unwrap();
    let text = bounding_box.to_string();
    let parts: Vec<&str> = text.split(',').collect();
    assert_eq!(parts.len(), 4);
    assert!(parts.iter().all(|part| part.split('.').nth(1).unwrap().len() == 7));
    assert_eq!(parts[0], format!("{:.7}", bounding_box.min_lat));
    assert_eq!(parts[1], format!("{:.7}", bounding_box.min_lon));
    assert_eq!(parts[2], format!("{:.7}", bounding_box.max_lat));
    assert_eq!(parts[3], format!("{:.7}", bounding_box.max_lon));
}
