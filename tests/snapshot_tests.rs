//! Scene Snapshot Tests
//!
//! Tests for:
//! - Snapshot → Scene → Snapshot yields the same records
//! - JSON encoding of snapshots and settings
//! - Validation of malformed record lists
//! - Loading into a populated scene

use arbor::errors::SceneError;
use arbor::scene::hierarchy;
use arbor::scene::{EntityRecord, Prefab, Scene, SceneSnapshot, Transform, TransformRecord};
use arbor::settings::{OrphanPolicy, ReparentMode, SceneSettings};
use arbor::Entity;
use glam::{Quat, Vec3};

fn assert_links_valid(scene: &Scene) {
    if let Err(violation) = hierarchy::validate(scene.registry()) {
        panic!("hierarchy invariant broken: {violation}");
    }
}

/// world
/// ├── lamp (prefab, inactive)
/// │   ├── bulb
/// │   └── shade
/// └── floor
/// logic (no transform)
fn sample_scene() -> Scene {
    let mut scene = Scene::new("Sample");
    let world = scene.build_entity("world").build();
    scene.build_entity("floor").with_scale(10.0).with_parent(world).build();
    let lamp = scene
        .build_entity("lamp")
        .with_position(0.0, 2.0, 0.0)
        .with_rotation(Quat::from_rotation_y(0.5))
        .with_parent(world)
        .build();
    scene.build_entity("shade").with_parent(lamp).build();
    scene.build_entity("bulb").with_position(0.0, -0.2, 0.0).with_parent(lamp).build();
    scene.create_named("logic");

    scene.registry_mut().add(lamp, Prefab { source: "lamp.prefab".into() }).unwrap();
    scene.set_active(lamp, false);
    scene
}

fn record(id: u32, parent: Option<u32>, name: &str) -> EntityRecord {
    EntityRecord {
        id,
        parent,
        name: Some(name.to_owned()),
        ..Default::default()
    }
}

// ============================================================================
// Round Trip
// ============================================================================

#[test]
fn snapshot_lists_parents_before_children() {
    let scene = sample_scene();
    let snapshot = scene.snapshot();

    let names: Vec<&str> = snapshot
        .entities
        .iter()
        .map(|r| r.name.as_deref().unwrap_or_default())
        .collect();
    assert_eq!(names, vec!["world", "lamp", "bulb", "shade", "floor", "logic"]);
    assert!(snapshot.validate().is_ok());
    assert_eq!(snapshot.entities[0].parent, None);
    assert_eq!(snapshot.entities[2].parent, Some(snapshot.entities[1].id));
}

#[test]
fn rebuilt_scene_has_identical_snapshot() {
    let original = sample_scene();
    let snapshot = original.snapshot();

    let rebuilt = Scene::from_snapshot(&snapshot, SceneSettings::default()).unwrap();

    assert_eq!(rebuilt.name(), "Sample");
    assert_eq!(rebuilt.len(), original.len());
    assert_eq!(rebuilt.snapshot(), snapshot);
    assert_links_valid(&rebuilt);
}

#[test]
fn rebuilt_scene_keeps_ids_and_components() {
    let original = sample_scene();
    let lamp = original.find_by_name("lamp").unwrap();
    let lamp_id = original.entity_id(lamp).unwrap();

    let rebuilt = Scene::from_snapshot(&original.snapshot(), SceneSettings::default()).unwrap();

    let copy = rebuilt.find_by_id(lamp_id).unwrap();
    assert_eq!(rebuilt.name_of(copy), Some("lamp"));
    assert!(!rebuilt.is_active_in_hierarchy(copy));
    assert_eq!(rebuilt.prefab_root(copy), Some(copy));
    let logic = rebuilt.find_by_name("logic").unwrap();
    assert!(!rebuilt.registry().has::<Transform>(logic));
}

#[test]
fn rebuilt_scene_world_matrices_match() {
    let mut original = sample_scene();
    original.update_transforms();
    let mut rebuilt = Scene::from_snapshot(&original.snapshot(), SceneSettings::default()).unwrap();
    rebuilt.update_transforms();

    for name in ["world", "floor", "lamp", "bulb", "shade"] {
        let a = original.world_matrix(original.find_by_name(name).unwrap()).unwrap();
        let b = rebuilt.world_matrix(rebuilt.find_by_name(name).unwrap()).unwrap();
        assert!(a.abs_diff_eq(b, 1e-5), "world matrix of {name} differs");
    }
}

// ============================================================================
// JSON
// ============================================================================

#[test]
fn json_round_trip() {
    let snapshot = sample_scene().snapshot();
    let json = snapshot.to_json().unwrap();
    assert!(json.contains("\"lamp.prefab\""));

    let parsed = SceneSnapshot::from_json(&json).unwrap();
    assert_eq!(parsed, snapshot);
}

#[test]
fn json_omits_absent_fields() {
    let mut scene = Scene::new("bare");
    scene.create_entity();
    let json = scene.snapshot().to_json().unwrap();

    assert!(json.contains("\"uuid\""));
    assert!(!json.contains("\"transform\""));
    assert!(!json.contains("\"parent\""));
    assert!(!json.contains("\"name\": null"));
}

#[test]
fn minimal_json_loads() {
    let json = r#"{
        "name": "Hand written",
        "entities": [
            { "id": 7, "name": "root" },
            { "id": 3, "parent": 7, "name": "child",
              "transform": { "position": [1.0, 2.0, 3.0], "rotation": [0.0, 0.0, 0.0, 1.0], "scale": [1.0, 1.0, 1.0] } }
        ]
    }"#;

    let scene = Scene::from_snapshot(&SceneSnapshot::from_json(json).unwrap(), SceneSettings::default()).unwrap();

    let root = scene.find_by_name("root").unwrap();
    let child = scene.find_by_name("child").unwrap();
    assert_eq!(scene.parent(child), Some(root));
    assert!(scene.entity_id(child).is_some(), "missing uuid gets a fresh one");
    assert_eq!(
        scene.registry().get::<Transform>(child).unwrap().position,
        Vec3::new(1.0, 2.0, 3.0)
    );
}

#[test]
fn malformed_json_is_an_error() {
    assert!(matches!(SceneSnapshot::from_json("{ nope"), Err(SceneError::Json(_))));
}

#[test]
fn settings_json_fills_defaults() {
    let settings = SceneSettings::from_json(r#"{ "orphan_policy": "DestroyRecursive" }"#).unwrap();
    assert_eq!(settings.orphan_policy, OrphanPolicy::DestroyRecursive);
    assert_eq!(settings.reparent_mode, ReparentMode::KeepLocal);
    assert!(settings.drop_empty_hierarchy);

    let back = SceneSettings::from_json(&settings.to_json().unwrap()).unwrap();
    assert_eq!(back, settings);
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn child_before_parent_is_rejected() {
    let snapshot = SceneSnapshot {
        name: "bad".into(),
        entities: vec![record(1, Some(0), "child"), record(0, None, "parent")],
    };
    assert!(matches!(snapshot.validate(), Err(SceneError::Snapshot(_))));
}

#[test]
fn duplicate_ids_are_rejected() {
    let snapshot = SceneSnapshot {
        name: "bad".into(),
        entities: vec![record(0, None, "a"), record(0, None, "b")],
    };
    assert!(snapshot.validate().is_err());
}

#[test]
fn self_parent_is_rejected() {
    let snapshot = SceneSnapshot {
        name: "bad".into(),
        entities: vec![record(4, Some(4), "loop")],
    };
    assert!(snapshot.validate().is_err());
}

#[test]
fn invalid_snapshot_creates_nothing() {
    let mut scene = sample_scene();
    let before = scene.len();
    let snapshot = SceneSnapshot {
        name: "bad".into(),
        entities: vec![record(0, None, "ok"), record(1, Some(9), "dangling")],
    };

    assert!(scene.load_snapshot(&snapshot).is_err());
    assert_eq!(scene.len(), before);
    assert!(scene.find_by_name("ok").is_none());
}

// ============================================================================
// Loading Into Existing Scenes
// ============================================================================

#[test]
fn load_snapshot_appends_new_roots() {
    let source = sample_scene();
    let mut target = Scene::new("Target");
    let existing = target.create_named("existing");

    let created: Vec<Entity> = target.load_snapshot(&source.snapshot()).unwrap();

    assert_eq!(created.len(), source.len());
    assert_eq!(target.roots()[0], existing);
    assert_eq!(target.roots().len(), 3);
    assert_eq!(target.name(), "Target");
    assert_links_valid(&target);
}

#[test]
fn transform_record_converts_both_ways() {
    let transform = Transform::from_trs(Vec3::X, Quat::from_rotation_z(1.0), Vec3::splat(2.0));
    let record = TransformRecord::from(&transform);
    let back = Transform::from(&record);

    assert_eq!(back.position, transform.position);
    assert_eq!(back.rotation, transform.rotation);
    assert_eq!(back.scale, transform.scale);
}
