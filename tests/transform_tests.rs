//! Transform and transform propagation tests
//!
//! Tests for:
//! - Transform TRS operations and dirty checking
//! - Euler angles, look_at, apply_local_matrix decomposition
//! - Hierarchical matrix propagation (depth-first, batched, subtree)
//! - Pass-through of non-spatial entities
//! - Fresh world matrices and world-space write-back

use arbor::ecs::Component;
use arbor::scene::transform_system::*;
use arbor::scene::{Hierarchy, Scene, Transform};
use arbor::{Entity, ReparentMode};
use glam::{Affine3A, Mat4, Quat, Vec3};
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

// ============================================================================
// Helper
// ============================================================================

const EPSILON: f32 = 1e-5;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
}

fn cached_world(scene: &Scene, e: Entity) -> Vec3 {
    scene.world_matrix(e).unwrap().translation.into()
}

/// Chain of `length` entities, each translated +1 in X relative to its parent.
fn create_chain(scene: &mut Scene, length: usize) -> Vec<Entity> {
    let mut handles: Vec<Entity> = Vec::new();
    for i in 0..length {
        let mut builder = scene.build_entity(&format!("n{i}")).with_position(1.0, 0.0, 0.0);
        if let Some(&parent) = handles.last() {
            builder = builder.with_parent(parent);
        }
        handles.push(builder.build());
    }
    handles
}

// ============================================================================
// Transform Unit Tests
// ============================================================================

#[test]
fn transform_default_is_identity() {
    let t = Transform::new();
    assert_eq!(t.position, Vec3::ZERO);
    assert_eq!(t.rotation, Quat::IDENTITY);
    assert_eq!(t.scale, Vec3::ONE);
}

#[test]
fn transform_update_local_matrix_dirty_check() {
    let mut t = Transform::new();

    // First call always rebuilds
    assert!(t.update_local_matrix());
    assert!(!t.update_local_matrix());

    t.position = Vec3::new(1.0, 2.0, 3.0);
    assert!(t.update_local_matrix());
    assert!(!t.update_local_matrix());

    t.rotation = Quat::from_rotation_y(FRAC_PI_2);
    assert!(t.update_local_matrix());
    assert!(!t.update_local_matrix());

    t.scale = Vec3::splat(2.0);
    assert!(t.update_local_matrix());
    assert!(!t.update_local_matrix());
}

#[test]
fn transform_local_matrix_reflects_trs() {
    let mut t = Transform::from_xyz(10.0, 20.0, 30.0);
    t.scale = Vec3::splat(2.0);
    t.update_local_matrix();

    let mat = Mat4::from(*t.local_matrix());
    assert!(vec3_approx(mat.w_axis.truncate(), Vec3::new(10.0, 20.0, 30.0)));
    assert_eq!(*t.local_matrix(), t.compute_local_matrix());
}

#[test]
fn transform_euler_roundtrip() {
    let mut t = Transform::new();
    let (x, y, z) = (0.3, 0.7, 1.2);
    t.set_rotation_euler(x, y, z);

    let euler = t.rotation_euler();
    assert!(approx_eq(euler.x, x));
    assert!(approx_eq(euler.y, y));
    assert!(approx_eq(euler.z, z));
}

#[test]
fn transform_look_at_basic() {
    let mut t = Transform::new();
    t.look_at(Vec3::new(0.0, 0.0, -10.0), Vec3::Y);

    t.update_local_matrix();
    let mat = Mat4::from(*t.local_matrix());
    let forward = -mat.z_axis.truncate().normalize();
    assert!(vec3_approx(forward, Vec3::new(0.0, 0.0, -1.0)));
}

#[test]
fn transform_look_at_collinear_up_noop() {
    let mut t = Transform::new();
    let original_rotation = t.rotation;
    // Target straight above with up = Y is degenerate
    t.look_at(Vec3::new(0.0, 10.0, 0.0), Vec3::Y);
    assert_eq!(t.rotation, original_rotation);
}

#[test]
fn transform_apply_local_matrix_decomposition() {
    let original_pos = Vec3::new(5.0, -3.0, 7.0);
    let original_rot = Quat::from_rotation_y(FRAC_PI_4);
    let original_scale = Vec3::new(2.0, 3.0, 1.5);

    let mat = Affine3A::from_scale_rotation_translation(original_scale, original_rot, original_pos);

    let mut t = Transform::new();
    t.apply_local_matrix(mat);

    assert!(vec3_approx(t.position, original_pos));
    assert!(vec3_approx(t.scale, original_scale));
    assert!(t.rotation.angle_between(original_rot) < 1e-4);
}

#[test]
fn transform_mark_dirty_forces_update() {
    let mut t = Transform::new();
    t.update_local_matrix();
    assert!(!t.update_local_matrix());

    t.mark_dirty();
    assert!(t.update_local_matrix());
}

#[test]
fn transform_clone_for_marks_copy_dirty() {
    let mut t = Transform::from_xyz(1.0, 2.0, 3.0);
    t.update_local_matrix();

    let mut copy = t.clone_for(Entity::default()).unwrap();
    assert_eq!(copy.position, t.position);
    assert!(copy.update_local_matrix());
}

// ============================================================================
// Propagation Tests
// ============================================================================

#[test]
fn hierarchy_chain_world_positions() {
    let mut scene = Scene::new("chain");
    let handles = create_chain(&mut scene, 5);

    scene.update_transforms();

    for (i, &handle) in handles.iter().enumerate() {
        let expected_x = (i + 1) as f32;
        let world = cached_world(&scene, handle);
        assert!(
            approx_eq(world.x, expected_x),
            "Entity {i}: expected x={expected_x}, got x={}",
            world.x
        );
    }
}

#[test]
fn three_level_example_reaches_one_one_one() {
    let mut scene = Scene::new("example");
    let r = scene.build_entity("R").with_position(1.0, 0.0, 0.0).build();
    let c1 = scene.build_entity("C1").with_position(0.0, 1.0, 0.0).with_parent(r).build();
    let c2 = scene.build_entity("C2").with_position(0.0, 0.0, 1.0).with_parent(c1).build();

    scene.update_transforms();
    assert!(vec3_approx(cached_world(&scene, c2), Vec3::ONE));

    scene.reparent(c2, Some(r)).unwrap();
    scene.update_transforms();
    assert!(vec3_approx(cached_world(&scene, c2), Vec3::new(1.0, 0.0, 1.0)));
}

#[test]
fn recompute_is_a_fixed_point() {
    let mut scene = Scene::new("idempotent");
    let handles = create_chain(&mut scene, 4);
    scene
        .registry_mut()
        .get_mut::<Transform>(handles[1])
        .unwrap()
        .rotation = Quat::from_rotation_z(0.4);

    scene.update_transforms();
    let first: Vec<Affine3A> = handles.iter().map(|&e| scene.world_matrix(e).unwrap()).collect();
    scene.update_transforms();
    let second: Vec<Affine3A> = handles.iter().map(|&e| scene.world_matrix(e).unwrap()).collect();

    assert_eq!(first, second);
}

#[test]
fn hierarchy_batched_matches_depth_first() {
    let mut depth_first = Scene::new("dfs");
    let mut batched = Scene::new("bfs");
    let a = create_chain(&mut depth_first, 4);
    let b = create_chain(&mut batched, 4);

    depth_first.update_transforms();
    batched.update_transforms_batched();

    for (&x, &y) in a.iter().zip(&b) {
        assert!(
            vec3_approx(cached_world(&depth_first, x), cached_world(&batched, y)),
            "Mismatch for batched update"
        );
    }
}

#[test]
fn hierarchy_with_rotation_and_scale() {
    let mut scene = Scene::new("trs");
    let parent = scene
        .build_entity("parent")
        .with_position(5.0, 0.0, 0.0)
        .with_rotation(Quat::from_rotation_y(FRAC_PI_2))
        .with_scale(2.0)
        .build();
    let child = scene.build_entity("child").with_position(1.0, 0.0, 0.0).with_parent(parent).build();

    scene.update_transforms();

    // (1,0,0) -> rotate 90° about Y -> (0,0,-1) -> scale 2 -> (0,0,-2) -> translate -> (5,0,-2)
    let child_world = cached_world(&scene, child);
    assert!(approx_eq(child_world.x, 5.0), "child world x: got {}", child_world.x);
    assert!(approx_eq(child_world.z, -2.0), "child world z: got {}", child_world.z);
}

#[test]
fn hierarchy_subtree_update() {
    let mut scene = Scene::new("subtree");
    let handles = create_chain(&mut scene, 5);
    scene.update_transforms();

    scene.registry_mut().get_mut::<Transform>(handles[2]).unwrap().position = Vec3::new(10.0, 0.0, 0.0);
    scene.update_subtree(handles[2]);

    assert!(approx_eq(cached_world(&scene, handles[2]).x, 12.0));
    assert!(approx_eq(cached_world(&scene, handles[3]).x, 13.0));
    // Outside the subtree: untouched
    assert!(approx_eq(cached_world(&scene, handles[1]).x, 2.0));
}

#[test]
fn non_spatial_parent_is_transparent() {
    let mut scene = Scene::new("group");
    let root = scene.build_entity("root").with_position(0.0, 4.0, 0.0).build();
    let group = scene.create_child(root, Some("group")).unwrap();
    let leaf = scene.build_entity("leaf").with_position(1.0, 0.0, 0.0).with_parent(group).build();

    scene.update_transforms();

    assert!(scene.world_matrix(group).is_none());
    assert!(vec3_approx(cached_world(&scene, leaf), Vec3::new(1.0, 4.0, 0.0)));
}

// ============================================================================
// Level-Order Batching Tests
// ============================================================================

#[test]
fn bfs_batches_depth_and_count() {
    let mut scene = Scene::new("bfs");
    let handles = create_chain(&mut scene, 5);
    let extra = scene.build_entity("extra").with_parent(handles[0]).build();

    let mut batches = LevelOrderBatches::new();
    build_level_order(scene.registry().pool::<Hierarchy>(), &scene.roots(), &mut batches);

    assert_eq!(batches.depth(), 5);
    assert_eq!(batches.total_entities(), 6);
    let level1: Vec<Entity> = batches.iter().nth(1).unwrap().to_vec();
    assert!(level1.contains(&extra));
    assert!(level1.contains(&handles[1]));
}

#[test]
fn bfs_batches_reuse_after_clear() {
    let mut scene = Scene::new("bfs");
    let handles = create_chain(&mut scene, 3);
    let mut batches = LevelOrderBatches::new();
    build_level_order(scene.registry().pool::<Hierarchy>(), &scene.roots(), &mut batches);
    assert_eq!(batches.depth(), 3);

    scene.destroy_subtree(handles[1]);
    build_level_order(scene.registry().pool::<Hierarchy>(), &scene.roots(), &mut batches);
    assert_eq!(batches.depth(), 1);
    assert_eq!(batches.total_entities(), 1);
}

#[test]
fn empty_roots_produce_no_batches() {
    let mut batches = LevelOrderBatches::new();
    build_level_order(None, &[], &mut batches);
    assert_eq!(batches.depth(), 0);
    assert_eq!(batches.total_entities(), 0);
}

// ============================================================================
// Fresh Matrices & Write-Back
// ============================================================================

#[test]
fn world_matrix_fresh_sees_edits_before_pass() {
    let mut scene = Scene::new("fresh");
    let handles = create_chain(&mut scene, 3);
    scene.update_transforms();

    scene.registry_mut().get_mut::<Transform>(handles[0]).unwrap().position = Vec3::new(5.0, 0.0, 0.0);

    assert!(approx_eq(cached_world(&scene, handles[2]).x, 3.0));
    assert!(approx_eq(scene.world_position(handles[2]).unwrap().x, 7.0));
}

#[test]
fn set_world_matrix_writes_back_through_parent() {
    let mut scene = Scene::new("gizmo");
    let parent = scene.build_entity("parent").with_position(2.0, 0.0, 0.0).with_scale(2.0).build();
    let child = scene.build_entity("child").with_parent(parent).build();
    scene.update_transforms();

    let target = Affine3A::from_translation(Vec3::new(6.0, 4.0, 0.0));
    scene.set_world_matrix(child, target).unwrap();

    let local = scene.registry().get::<Transform>(child).unwrap().position;
    assert!(vec3_approx(local, Vec3::new(2.0, 2.0, 0.0)));
    assert!(vec3_approx(cached_world(&scene, child), Vec3::new(6.0, 4.0, 0.0)));
}

#[test]
fn set_world_matrix_requires_transform() {
    let mut scene = Scene::new("gizmo");
    let logic = scene.create_named("logic");
    assert!(scene.set_world_matrix(logic, Affine3A::IDENTITY).is_err());
}

#[test]
fn keep_world_reparent_preserves_pose() {
    let mut scene = Scene::new("keep-world");
    let a = scene.build_entity("a").with_position(3.0, 0.0, 0.0).build();
    let b = scene.build_entity("b").with_position(0.0, 5.0, 0.0).build();
    let moved = scene.build_entity("moved").with_position(1.0, 1.0, 1.0).with_parent(a).build();
    scene.update_transforms();
    let before = cached_world(&scene, moved);

    scene.reparent_with(moved, Some(b), ReparentMode::KeepWorld).unwrap();
    scene.update_transforms();

    assert!(vec3_approx(cached_world(&scene, moved), before));
    let local = scene.registry().get::<Transform>(moved).unwrap().position;
    assert!(vec3_approx(local, Vec3::new(4.0, -4.0, 1.0)));
}
