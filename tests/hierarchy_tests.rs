//! Hierarchy Link Tests
//!
//! Tests for:
//! - Reparent splice and unlink bookkeeping
//! - Cycle rejection and stale handle tolerance
//! - Traversal: children, ancestors, descendants, depth
//! - Parent chains terminate within the entity count

use arbor::errors::SceneError;
use arbor::scene::hierarchy::{self, Hierarchy};
use arbor::scene::Scene;
use arbor::Entity;

fn assert_links_valid(scene: &Scene) {
    if let Err(violation) = hierarchy::validate(scene.registry()) {
        panic!("hierarchy invariant broken: {violation}");
    }
}

/// root
/// ├── a
/// │   └── a1
/// └── b
fn small_tree(scene: &mut Scene) -> (Entity, Entity, Entity, Entity) {
    let root = scene.create_named("root");
    let b = scene.create_child(root, Some("b")).unwrap();
    let a = scene.create_child(root, Some("a")).unwrap();
    let a1 = scene.create_child(a, Some("a1")).unwrap();
    (root, a, a1, b)
}

// ============================================================================
// Reparent
// ============================================================================

#[test]
fn reparent_sets_parent_and_single_membership() {
    let mut scene = Scene::new("h");
    let (root, a, _, b) = small_tree(&mut scene);

    scene.reparent(b, Some(a)).unwrap();

    assert_eq!(scene.parent(b), Some(a));
    let under_a: Vec<Entity> = scene.children(a).collect();
    assert_eq!(under_a.iter().filter(|&&c| c == b).count(), 1);
    assert!(!scene.children(root).any(|c| c == b));
    assert_links_valid(&scene);
}

#[test]
fn reparent_splices_as_first_child() {
    let mut scene = Scene::new("h");
    let (root, a, a1, b) = small_tree(&mut scene);

    scene.reparent(a1, Some(root)).unwrap();

    assert_eq!(scene.children(root).collect::<Vec<_>>(), vec![a1, a, b]);
    let head = scene.hierarchy(a1).unwrap();
    assert_eq!(head.prev(), None);
    assert_eq!(head.next(), Some(a));
    assert_eq!(scene.hierarchy(a).unwrap().prev(), Some(a1));
    assert_links_valid(&scene);
}

#[test]
fn reparent_middle_sibling_patches_neighbours() {
    let mut scene = Scene::new("h");
    let root = scene.create_entity();
    let c = scene.create_child(root, None).unwrap();
    let b = scene.create_child(root, None).unwrap();
    let a = scene.create_child(root, None).unwrap();
    let other = scene.create_entity();

    scene.reparent(b, Some(other)).unwrap();

    assert_eq!(scene.children(root).collect::<Vec<_>>(), vec![a, c]);
    assert_eq!(scene.hierarchy(a).unwrap().next(), Some(c));
    assert_eq!(scene.hierarchy(c).unwrap().prev(), Some(a));
    assert_links_valid(&scene);
}

#[test]
fn reparent_to_none_makes_root_and_prunes_links() {
    let mut scene = Scene::new("h");
    let (root, a, a1, _) = small_tree(&mut scene);

    scene.reparent(a1, None).unwrap();

    assert_eq!(scene.parent(a1), None);
    assert!(scene.roots().contains(&a1));
    // a1 is now a childless root: its links are dropped
    assert!(!scene.registry().has::<Hierarchy>(a1));
    // a lost its only child but still has a parent
    assert!(scene.registry().has::<Hierarchy>(a));
    assert_eq!(scene.children(root).count(), 2);
    assert_links_valid(&scene);
}

#[test]
fn reparent_to_same_parent_is_noop() {
    let mut scene = Scene::new("h");
    let (root, a, _, b) = small_tree(&mut scene);
    let before: Vec<Entity> = scene.children(root).collect();

    scene.reparent(b, Some(root)).unwrap();

    assert_eq!(scene.children(root).collect::<Vec<_>>(), before);
    assert_eq!(before, vec![a, b]);
}

#[test]
fn reparent_into_descendant_is_rejected_unchanged() {
    let mut scene = Scene::new("h");
    let (root, a, a1, _) = small_tree(&mut scene);
    let before = scene.snapshot();

    let err = scene.reparent(root, Some(a1)).unwrap_err();
    assert!(matches!(
        err,
        SceneError::WouldCreateCycle { entity, new_parent } if entity == root && new_parent == a1
    ));
    assert!(scene.reparent(a, Some(a)).is_err());
    assert!(!scene.can_reparent(root, Some(a1)));
    assert!(scene.can_reparent(a1, Some(root)));

    assert_eq!(scene.snapshot(), before);
    assert_links_valid(&scene);
}

#[test]
fn reparent_with_stale_handles_is_ignored() {
    let mut scene = Scene::new("h");
    let (root, a, a1, b) = small_tree(&mut scene);
    scene.destroy_subtree(b);

    assert!(scene.reparent(b, Some(root)).is_ok());
    assert!(scene.reparent(a1, Some(b)).is_ok());
    assert_eq!(scene.parent(a1), Some(a));
    assert!(!scene.can_reparent(a1, Some(b)));
}

#[test]
fn free_function_reparent_works_on_bare_registry() {
    let mut scene = Scene::new("h");
    let registry = scene.registry_mut();
    let p = registry.create();
    let c = registry.create();

    hierarchy::reparent(registry, c, Some(p)).unwrap();

    assert_eq!(hierarchy::parent_of(registry, c), Some(p));
    assert_eq!(hierarchy::children(registry, p).collect::<Vec<_>>(), vec![c]);
    assert!(hierarchy::validate(registry).is_ok());
}

// ============================================================================
// Traversal
// ============================================================================

#[test]
fn ancestors_and_depth() {
    let mut scene = Scene::new("h");
    let (root, a, a1, b) = small_tree(&mut scene);

    assert_eq!(scene.ancestors(a1).collect::<Vec<_>>(), vec![a, root]);
    assert_eq!(scene.depth(a1), 2);
    assert_eq!(scene.depth(b), 1);
    assert_eq!(scene.depth(root), 0);
    assert!(scene.is_ancestor_of(root, a1));
    assert!(!scene.is_ancestor_of(a1, root));
    assert!(!scene.is_ancestor_of(a, a));
}

#[test]
fn descendants_in_pre_order() {
    let mut scene = Scene::new("h");
    let (root, a, a1, b) = small_tree(&mut scene);
    assert_eq!(scene.descendants(root), vec![a, a1, b]);
    assert!(scene.descendants(b).is_empty());
}

#[test]
fn parent_walk_terminates_within_entity_count() {
    let mut scene = Scene::new("h");
    let mut previous = scene.create_entity();
    for _ in 0..50 {
        let next = scene.create_entity();
        scene.reparent(next, Some(previous)).unwrap();
        previous = next;
    }
    // Shuffle a few subtrees around
    let roots = scene.roots();
    let chain = scene.descendants(roots[0]);
    scene.reparent(chain[30], Some(chain[2])).unwrap();
    scene.reparent(chain[10], None).unwrap();
    assert!(scene.reparent(chain[2], Some(chain[40])).is_err());

    let total = scene.len();
    for e in scene.registry().entities() {
        let mut steps = 0;
        let mut cursor = scene.parent(e);
        while let Some(p) = cursor {
            steps += 1;
            assert!(steps <= total);
            cursor = scene.parent(p);
        }
    }
    assert_links_valid(&scene);
}

#[test]
fn children_of_entity_without_links_is_empty() {
    let mut scene = Scene::new("h");
    let lone = scene.create_entity();
    assert_eq!(scene.children(lone).count(), 0);
    assert_eq!(scene.ancestors(lone).count(), 0);
    assert!(scene.hierarchy(lone).is_none());
}
