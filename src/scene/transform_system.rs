//! Transform propagation.
//!
//! Recomputes world matrices top-down, parent before child. Decoupled from
//! [`Scene`](crate::scene::Scene): the functions only borrow the `Transform`
//! pool mutably and the `Hierarchy` pool shared (see
//! [`Registry::split_pools`](crate::ecs::Registry::split_pools)).
//!
//! World matrices are recomputed unconditionally on every pass; only the
//! local matrix is cached behind the shadow-state check in
//! [`Transform::update_local_matrix`]. An entity without a `Transform` is
//! transparent: its children inherit its parent's world matrix.
//!
//! # Level order
//!
//! [`build_level_order`] groups the forest into BFS levels. Entities of one
//! level do not depend on each other, so a batch may be processed in any
//! order (or in parallel); batches must run in sequence.

use glam::Affine3A;
use rustc_hash::FxHashMap;

use crate::ecs::{Entity, Pool};
use crate::scene::hierarchy::{Ancestors, Children, Hierarchy};
use crate::scene::transform::Transform;

/// Entities grouped by depth: `batches[0]` are the roots.
#[derive(Debug, Default)]
pub struct LevelOrderBatches {
    pub batches: Vec<Vec<Entity>>,
}

impl LevelOrderBatches {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empties the batches, keeping their allocations.
    pub fn clear(&mut self) {
        for batch in &mut self.batches {
            batch.clear();
        }
    }

    #[must_use]
    pub fn total_entities(&self) -> usize {
        self.batches.iter().map(Vec::len).sum()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.batches.iter().take_while(|b| !b.is_empty()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[Entity]> {
        self.batches
            .iter()
            .take_while(|b| !b.is_empty())
            .map(Vec::as_slice)
    }
}

/// Fills `output` with the forest below `roots` in BFS levels.
pub fn build_level_order(
    links: Option<&Pool<Hierarchy>>,
    roots: &[Entity],
    output: &mut LevelOrderBatches,
) {
    output.clear();
    if roots.is_empty() {
        return;
    }

    let mut level = 0;
    if output.batches.is_empty() {
        output.batches.push(Vec::new());
    }
    output.batches[0].extend_from_slice(roots);

    loop {
        // Reuse the allocation of the next level if there is one.
        let mut next = output
            .batches
            .get_mut(level + 1)
            .map(std::mem::take)
            .unwrap_or_default();
        for &entity in &output.batches[level] {
            next.extend(Children::new(links, entity));
        }
        let done = next.is_empty();
        if output.batches.len() <= level + 1 {
            output.batches.push(next);
        } else {
            output.batches[level + 1] = next;
        }
        if done {
            break;
        }
        level += 1;
    }
}

/// Depth-first world update of the forest below `roots`.
///
/// Uses an explicit stack so deep hierarchies cannot overflow the call stack.
pub fn update_hierarchy(
    transforms: &mut Pool<Transform>,
    links: Option<&Pool<Hierarchy>>,
    roots: &[Entity],
) {
    let mut stack: Vec<(Entity, Affine3A)> = Vec::with_capacity(64);
    for &root in roots.iter().rev() {
        stack.push((root, Affine3A::IDENTITY));
    }
    propagate(transforms, links, &mut stack);
}

/// Updates `root` and everything below it, using the parent chain's current
/// TRS as the starting point.
pub fn update_subtree(
    transforms: &mut Pool<Transform>,
    links: Option<&Pool<Hierarchy>>,
    root: Entity,
) {
    let parent = links.and_then(|pool| pool.get(root)).and_then(Hierarchy::parent);
    let parent_world = parent.map_or(Affine3A::IDENTITY, |p| {
        compute_world_matrix(transforms, links, p)
    });
    let mut stack = vec![(root, parent_world)];
    propagate(transforms, links, &mut stack);
}

fn propagate(
    transforms: &mut Pool<Transform>,
    links: Option<&Pool<Hierarchy>>,
    stack: &mut Vec<(Entity, Affine3A)>,
) {
    while let Some((entity, parent_world)) = stack.pop() {
        let world = match transforms.get_mut(entity) {
            Some(transform) => {
                transform.update_local_matrix();
                let world = parent_world * transform.local_matrix;
                transform.set_world_matrix(world);
                world
            }
            None => parent_world,
        };

        // Push in reverse so children are visited head first.
        let start = stack.len();
        stack.extend(Children::new(links, entity).map(|child| (child, world)));
        stack[start..].reverse();
    }
}

/// Level-ordered world update.
///
/// Same result as [`update_hierarchy`]; each batch only reads matrices
/// resolved by earlier batches.
pub fn update_hierarchy_batched(
    transforms: &mut Pool<Transform>,
    links: Option<&Pool<Hierarchy>>,
    batches: &LevelOrderBatches,
) {
    let mut resolved: FxHashMap<Entity, Affine3A> =
        FxHashMap::with_capacity_and_hasher(batches.total_entities(), Default::default());

    for batch in batches.iter() {
        for &entity in batch {
            let parent_world = links
                .and_then(|pool| pool.get(entity))
                .and_then(Hierarchy::parent)
                .and_then(|p| resolved.get(&p).copied())
                .unwrap_or(Affine3A::IDENTITY);

            let world = match transforms.get_mut(entity) {
                Some(transform) => {
                    transform.update_local_matrix();
                    let world = parent_world * transform.local_matrix;
                    transform.set_world_matrix(world);
                    world
                }
                None => parent_world,
            };
            resolved.insert(entity, world);
        }
    }
}

/// World matrix of `entity` computed from the current TRS of its whole
/// parent chain, without touching any cache.
#[must_use]
pub fn compute_world_matrix(
    transforms: &Pool<Transform>,
    links: Option<&Pool<Hierarchy>>,
    entity: Entity,
) -> Affine3A {
    let local = |e: Entity| {
        transforms
            .get(e)
            .map_or(Affine3A::IDENTITY, Transform::compute_local_matrix)
    };

    let mut world = local(entity);
    for ancestor in Ancestors::new(links, entity) {
        world = local(ancestor) * world;
    }
    world
}
