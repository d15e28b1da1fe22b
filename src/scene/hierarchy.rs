//! Intrusive parent/child links.
//!
//! Tree structure is stored per entity in a [`Hierarchy`] component rather
//! than in a separate tree container: each entity knows its parent, its first
//! child and its two siblings. Children of one parent form a doubly linked
//! list headed by `first`.
//!
//! Entities without a `Hierarchy` are implicit roots with no children.
//!
//! All functions here go through generation-checked handles, so a stale
//! link can never alias a recycled slot.

use crate::ecs::{Component, Entity, Pool, Registry};
use crate::errors::{Result, SceneError};

/// Parent/child/sibling links of one entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hierarchy {
    pub(crate) parent: Option<Entity>,
    pub(crate) first: Option<Entity>,
    pub(crate) next: Option<Entity>,
    pub(crate) prev: Option<Entity>,
}

impl Component for Hierarchy {
    const NAME: &'static str = "Hierarchy";
    const ICON: &'static str = "file-tree";
    const INTERNAL: bool = true;
    // Links are rebuilt by the duplicate itself.
    const COPY_ON_DUPLICATE: bool = false;
}

impl Hierarchy {
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Entity> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<Entity> {
        self.first
    }

    #[inline]
    #[must_use]
    pub fn next(&self) -> Option<Entity> {
        self.next
    }

    #[inline]
    #[must_use]
    pub fn prev(&self) -> Option<Entity> {
        self.prev
    }

    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    #[inline]
    #[must_use]
    pub fn has_children(&self) -> bool {
        self.first.is_some()
    }
}

// ============================================================================
// Traversal
// ============================================================================

/// Iterator over the direct children of an entity, head first.
pub struct Children<'a> {
    links: Option<&'a Pool<Hierarchy>>,
    cursor: Option<Entity>,
}

impl<'a> Children<'a> {
    #[must_use]
    pub fn new(links: Option<&'a Pool<Hierarchy>>, parent: Entity) -> Self {
        let cursor = links.and_then(|pool| pool.get(parent)).and_then(|h| h.first);
        Self { links, cursor }
    }
}

impl Iterator for Children<'_> {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        let current = self.cursor?;
        self.cursor = self.links.and_then(|pool| pool.get(current)).and_then(|h| h.next);
        Some(current)
    }
}

/// Iterator over the parent chain of an entity, nearest first.
///
/// Stops after as many steps as there are linked entities, so a corrupted
/// (cyclic) chain still terminates.
pub struct Ancestors<'a> {
    links: Option<&'a Pool<Hierarchy>>,
    cursor: Option<Entity>,
    budget: usize,
}

impl<'a> Ancestors<'a> {
    #[must_use]
    pub fn new(links: Option<&'a Pool<Hierarchy>>, entity: Entity) -> Self {
        let cursor = links.and_then(|pool| pool.get(entity)).and_then(|h| h.parent);
        let budget = links.map_or(0, Pool::len);
        Self { links, cursor, budget }
    }
}

impl Iterator for Ancestors<'_> {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        if self.budget == 0 {
            return None;
        }
        self.budget -= 1;
        let current = self.cursor?;
        self.cursor = self.links.and_then(|pool| pool.get(current)).and_then(|h| h.parent);
        Some(current)
    }
}

#[inline]
#[must_use]
pub fn parent_of(registry: &Registry, entity: Entity) -> Option<Entity> {
    registry.get::<Hierarchy>(entity).and_then(|h| h.parent)
}

#[must_use]
pub fn children(registry: &Registry, entity: Entity) -> Children<'_> {
    Children::new(registry.pool::<Hierarchy>(), entity)
}

#[must_use]
pub fn ancestors(registry: &Registry, entity: Entity) -> Ancestors<'_> {
    Ancestors::new(registry.pool::<Hierarchy>(), entity)
}

/// Returns `true` if `ancestor` is a strict ancestor of `entity`.
///
/// O(depth): walks the parent chain of `entity`.
#[must_use]
pub fn is_ancestor_of(registry: &Registry, ancestor: Entity, entity: Entity) -> bool {
    ancestors(registry, entity).any(|a| a == ancestor)
}

/// Number of ancestors of `entity` (0 for roots).
#[must_use]
pub fn depth(registry: &Registry, entity: Entity) -> usize {
    ancestors(registry, entity).count()
}

/// All transitive descendants of `entity` in pre-order (children head first),
/// excluding `entity` itself.
#[must_use]
pub fn descendants(registry: &Registry, entity: Entity) -> Vec<Entity> {
    let links = registry.pool::<Hierarchy>();
    let mut out = Vec::new();
    let mut stack: Vec<Entity> = Children::new(links, entity).collect();
    stack.reverse();

    while let Some(current) = stack.pop() {
        out.push(current);
        let first_len = stack.len();
        stack.extend(Children::new(links, current));
        stack[first_len..].reverse();
    }
    out
}

// ============================================================================
// Mutation
// ============================================================================

/// Removes `entity` from its parent's child list. Its own children stay
/// attached to it.
pub(crate) fn unlink(registry: &mut Registry, entity: Entity) {
    let Some(&links) = registry.get::<Hierarchy>(entity) else {
        return;
    };
    let Some(pool) = registry.pool_mut::<Hierarchy>() else {
        return;
    };

    match (links.prev, links.parent) {
        (Some(prev), _) => {
            if let Some(h) = pool.get_mut(prev) {
                h.next = links.next;
            }
        }
        (None, Some(parent)) => {
            if let Some(h) = pool.get_mut(parent) {
                h.first = links.next;
            }
        }
        (None, None) => {}
    }
    if let Some(next) = links.next
        && let Some(h) = pool.get_mut(next)
    {
        h.prev = links.prev;
    }
    if let Some(h) = pool.get_mut(entity) {
        h.parent = None;
        h.next = None;
        h.prev = None;
    }
}

/// Splices an unlinked `entity` in as the new head of `parent`'s child list.
pub(crate) fn link_as_first_child(registry: &mut Registry, entity: Entity, parent: Entity) -> Result<()> {
    registry.get_or_insert_with(parent, Hierarchy::default)?;
    registry.get_or_insert_with(entity, Hierarchy::default)?;
    let pool = registry
        .pool_mut::<Hierarchy>()
        .ok_or(SceneError::ComponentMissing { entity, component: Hierarchy::NAME })?;

    let old_first = pool.get(parent).and_then(|h| h.first);
    debug_assert!(pool.get(entity).is_some_and(|h| h.parent.is_none() && h.prev.is_none()));

    if let Some(first) = old_first
        && let Some(h) = pool.get_mut(first)
    {
        h.prev = Some(entity);
    }
    if let Some(h) = pool.get_mut(entity) {
        h.parent = Some(parent);
        h.next = old_first;
        h.prev = None;
    }
    if let Some(h) = pool.get_mut(parent) {
        h.first = Some(entity);
    }
    Ok(())
}

/// Drops the `Hierarchy` of a root without children. Returns `true` if the
/// component was removed.
pub(crate) fn prune_if_empty(registry: &mut Registry, entity: Entity) -> bool {
    let empty = registry
        .get::<Hierarchy>(entity)
        .is_some_and(|h| h.parent.is_none() && h.first.is_none());
    if empty {
        registry.remove::<Hierarchy>(entity);
    }
    empty
}

/// Moves `entity` under `new_parent` (or makes it a root with `None`).
///
/// Stale handles are ignored. Moving an entity under itself or one of its
/// descendants is rejected with [`SceneError::WouldCreateCycle`] and leaves
/// the tree untouched. The new child becomes the head of the parent's list.
///
/// This only touches links; world matrices of the moved subtree are stale
/// until the next transform pass.
pub fn reparent(registry: &mut Registry, entity: Entity, new_parent: Option<Entity>) -> Result<()> {
    if !registry.valid(entity) {
        log::debug!("Ignoring reparent of stale entity {entity:?}");
        return Ok(());
    }
    if let Some(parent) = new_parent {
        if !registry.valid(parent) {
            log::debug!("Ignoring reparent of {entity:?} under stale parent {parent:?}");
            return Ok(());
        }
        if parent == entity || is_ancestor_of(registry, entity, parent) {
            log::warn!("Rejected reparent of {entity:?} under its own descendant {parent:?}");
            return Err(SceneError::WouldCreateCycle { entity, new_parent: parent });
        }
    }
    if parent_of(registry, entity) == new_parent {
        return Ok(());
    }

    unlink(registry, entity);
    if let Some(parent) = new_parent {
        link_as_first_child(registry, entity, parent)?;
    }
    log::trace!("Reparented {entity:?} under {new_parent:?}");
    Ok(())
}

/// Checks the doubly linked list and acyclicity invariants of every linked
/// entity. Returns a description of the first violation found.
pub fn validate(registry: &Registry) -> std::result::Result<(), String> {
    let Some(pool) = registry.pool::<Hierarchy>() else {
        return Ok(());
    };

    for (entity, links) in pool.iter() {
        if !registry.valid(entity) {
            return Err(format!("{entity:?} is linked but not alive"));
        }
        for (label, target) in [
            ("parent", links.parent),
            ("first", links.first),
            ("next", links.next),
            ("prev", links.prev),
        ] {
            if let Some(target) = target
                && !pool.contains(target)
            {
                return Err(format!("{entity:?}.{label} points at unlinked {target:?}"));
            }
        }

        if let Some(first) = links.first {
            if pool.get(first).and_then(|h| h.prev).is_some() {
                return Err(format!("first child {first:?} of {entity:?} has a prev sibling"));
            }
            let mut seen = 0usize;
            let mut prev = None;
            for child in Children::new(Some(pool), entity) {
                seen += 1;
                if seen > pool.len() {
                    return Err(format!("child list of {entity:?} does not terminate"));
                }
                let child_links = pool.get(child).copied().unwrap_or_default();
                if child_links.parent != Some(entity) {
                    return Err(format!("{child:?} is listed under {entity:?} but has parent {:?}", child_links.parent));
                }
                if child_links.prev != prev {
                    return Err(format!("{child:?}.prev is {:?}, expected {prev:?}", child_links.prev));
                }
                prev = Some(child);
            }
        }

        if let Some(parent) = links.parent
            && !Children::new(Some(pool), parent)
                .take(pool.len())
                .any(|c| c == entity)
        {
            return Err(format!("{entity:?} is missing from the child list of {parent:?}"));
        }

        let mut steps = 0usize;
        let mut cursor = links.parent;
        while let Some(current) = cursor {
            if current == entity || steps > pool.len() {
                return Err(format!("{entity:?} is its own ancestor"));
            }
            steps += 1;
            cursor = pool.get(current).and_then(|h| h.parent);
        }
    }
    Ok(())
}
