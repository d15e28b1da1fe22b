//! Hierarchy panel model.
//!
//! Produces the rows a tree widget draws, and answers the drag-drop
//! questions, without depending on any GUI toolkit.

use rustc_hash::FxHashSet;

use crate::ecs::{Component, Entity};
use crate::editor::selection::SelectionSet;
use crate::scene::{Scene, Transform};

/// Icon used when no component claims the row.
pub const DEFAULT_ICON: &str = "cube-outline";

/// One visible line of the hierarchy panel.
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyRow {
    pub entity: Entity,
    /// 0 for roots.
    pub depth: usize,
    pub name: String,
    pub icon: &'static str,
    pub has_children: bool,
    pub selected: bool,
    /// Drawn greyed out when `false`.
    pub active: bool,
    /// Drawn highlighted when the entity or an ancestor is a prefab.
    pub in_prefab: bool,
}

/// Rows in display order: roots in creation order, each followed by its
/// subtree with children head first.
///
/// A non-empty `filter` keeps entities whose name contains it (ignoring
/// case) plus their ancestors, so matches are shown in context.
#[must_use]
pub fn build_rows(scene: &Scene, selection: &SelectionSet, filter: &str) -> Vec<HierarchyRow> {
    let visible = (!filter.is_empty()).then(|| filtered_set(scene, filter));
    let is_visible = |e: Entity| visible.as_ref().is_none_or(|set| set.contains(&e));

    let mut rows = Vec::new();
    let mut stack: Vec<(Entity, usize)> = Vec::new();
    for root in scene.roots().into_iter().rev() {
        stack.push((root, 0));
    }

    while let Some((entity, depth)) = stack.pop() {
        if !is_visible(entity) {
            continue;
        }
        let start = stack.len();
        stack.extend(scene.children(entity).map(|child| (child, depth + 1)));
        let has_children = stack.len() > start;
        stack[start..].reverse();

        rows.push(HierarchyRow {
            entity,
            depth,
            name: display_name(scene, entity),
            icon: primary_icon(scene, entity),
            has_children,
            selected: selection.contains(scene, entity),
            active: scene.is_active_in_hierarchy(entity),
            in_prefab: scene.is_in_prefab(entity),
        });
    }
    rows
}

fn filtered_set(scene: &Scene, filter: &str) -> FxHashSet<Entity> {
    let needle = filter.to_lowercase();
    let mut visible = FxHashSet::default();
    for entity in scene.registry().entities() {
        if !display_name(scene, entity).to_lowercase().contains(&needle) {
            continue;
        }
        visible.insert(entity);
        visible.extend(scene.ancestors(entity));
    }
    visible
}

/// The entity's [`Name`](crate::scene::Name), or a placeholder built from
/// its slot index.
#[must_use]
pub fn display_name(scene: &Scene, entity: Entity) -> String {
    scene
        .name_of(entity)
        .map_or_else(|| format!("Entity {}", entity.index()), str::to_owned)
}

/// Icon of the first visible component (by name). `Transform` is carried by
/// nearly every entity and never decides the icon.
#[must_use]
pub fn primary_icon(scene: &Scene, entity: Entity) -> &'static str {
    scene
        .registry()
        .component_infos(entity)
        .into_iter()
        .find(|info| !info.internal && info.name != Transform::NAME)
        .map_or(DEFAULT_ICON, |info| info.icon)
}

/// Whether dropping `dragged` onto `target` should reparent it: not onto
/// itself, not into its own subtree, and not onto its current parent.
#[must_use]
pub fn can_drop_onto(scene: &Scene, dragged: Entity, target: Entity) -> bool {
    scene.valid(dragged)
        && scene.valid(target)
        && dragged != target
        && !scene.is_ancestor_of(dragged, target)
        && scene.parent(dragged) != Some(target)
}

/// Whether dropping `dragged` on the empty panel area should detach it.
/// Only entities that currently have a parent can move to the root.
#[must_use]
pub fn can_drop_to_root(scene: &Scene, dragged: Entity) -> bool {
    scene.valid(dragged) && scene.parent(dragged).is_some()
}
