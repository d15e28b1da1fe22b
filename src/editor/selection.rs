use smallvec::SmallVec;

use crate::ecs::Entity;
use crate::scene::Scene;

/// Ordered, duplicate-free set of selected entities.
///
/// Handles are not owned: entries may go stale when the scene destroys an
/// entity. Stale handles are never added, the accessors skip the ones that
/// went stale afterwards, and [`SelectionSet::prune`] drops them.
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    entities: SmallVec<[Entity; 8]>,
}

impl SelectionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `entity`. Stale handles and entities already selected are
    /// ignored. Returns `true` if the selection changed.
    pub fn select(&mut self, scene: &Scene, entity: Entity) -> bool {
        if !scene.valid(entity) || self.entities.contains(&entity) {
            return false;
        }
        self.entities.push(entity);
        true
    }

    /// Removes `entity`, keeping the order of the others.
    pub fn unselect(&mut self, entity: Entity) -> bool {
        let Some(index) = self.entities.iter().position(|&e| e == entity) else {
            return false;
        };
        self.entities.remove(index);
        true
    }

    pub fn toggle(&mut self, scene: &Scene, entity: Entity) {
        if !self.unselect(entity) {
            self.select(scene, entity);
        }
    }

    /// Click on a row of the hierarchy panel. Without `additive` (ctrl) the
    /// selection is replaced first; the clicked entity is then toggled.
    pub fn click(&mut self, scene: &Scene, entity: Entity, additive: bool) {
        if !additive {
            self.clear();
        }
        self.toggle(scene, entity);
    }

    pub fn set_single(&mut self, scene: &Scene, entity: Entity) {
        self.clear();
        self.select(scene, entity);
    }

    /// Replaces the selection with the valid entries of `entities`.
    pub fn set(&mut self, scene: &Scene, entities: impl IntoIterator<Item = Entity>) {
        self.clear();
        for entity in entities {
            self.select(scene, entity);
        }
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }

    /// Drops handles that no longer refer to a live entity. Returns how many
    /// were removed.
    pub fn prune(&mut self, scene: &Scene) -> usize {
        let before = self.entities.len();
        self.entities.retain(|e| scene.valid(*e));
        before - self.entities.len()
    }

    /// Whether `entity` is selected and still alive.
    #[must_use]
    pub fn contains(&self, scene: &Scene, entity: Entity) -> bool {
        scene.valid(entity) && self.entities.contains(&entity)
    }

    /// First live entry in selection order.
    #[must_use]
    pub fn first(&self, scene: &Scene) -> Option<Entity> {
        self.iter(scene).next()
    }

    #[must_use]
    pub fn len(&self, scene: &Scene) -> usize {
        self.iter(scene).count()
    }

    #[must_use]
    pub fn is_empty(&self, scene: &Scene) -> bool {
        self.first(scene).is_none()
    }

    /// Live entries in selection order. Stale handles are skipped even
    /// before [`SelectionSet::prune`] runs.
    pub fn iter<'a>(&'a self, scene: &'a Scene) -> impl Iterator<Item = Entity> + 'a {
        self.entities.iter().copied().filter(move |&e| scene.valid(e))
    }

    /// Raw entries, including handles that went stale since the last prune.
    #[must_use]
    pub fn as_slice(&self) -> &[Entity] {
        &self.entities
    }

    /// Live selected entities whose ancestors are not selected themselves,
    /// in selection order. Subtree operations act on these so a child is
    /// not processed twice.
    #[must_use]
    pub fn top_level(&self, scene: &Scene) -> Vec<Entity> {
        top_level(scene, &self.entities)
    }
}

/// Live entries of `entities` that have no ancestor among `entities`.
#[must_use]
pub fn top_level(scene: &Scene, entities: &[Entity]) -> Vec<Entity> {
    entities
        .iter()
        .copied()
        .filter(|&e| scene.valid(e))
        .filter(|&e| !scene.ancestors(e).any(|a| entities.contains(&a)))
        .collect()
}
