use std::sync::atomic::{AtomicU32, Ordering};

use glam::{Affine3A, Quat, Vec3};
use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::ecs::{Component, Entity, Registry};
use crate::errors::{Result, SceneError};
use crate::scene::components::{Active, EntityId, Name, Prefab};
use crate::scene::hierarchy::{self, Ancestors, Children, Hierarchy};
use crate::scene::transform::Transform;
use crate::scene::transform_system::{self, LevelOrderBatches};
use crate::settings::{OrphanPolicy, ReparentMode, SceneSettings};

static NEXT_SCENE_ID: AtomicU32 = AtomicU32::new(1);

/// Outcome of [`Scene::duplicate_with_report`].
#[derive(Debug, Default)]
pub struct DuplicateReport {
    /// Copy of the source entity, `None` if the request was ignored.
    pub root: Option<Entity>,
    /// Number of entities created (root plus copied descendants).
    pub entities_created: usize,
    /// Components that could not be cloned. The copy exists without them.
    pub failures: Vec<SceneError>,
}

impl DuplicateReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.root.is_some() && self.failures.is_empty()
    }
}

/// One scene: a component registry plus the forest formed by its
/// [`Hierarchy`] links.
///
/// Entities with no parent are roots. A `Transform` is never implied; an
/// entity without one is a valid non-spatial entity.
///
/// Dropping a scene detaches every component (detach hooks fire) before the
/// storage is released.
pub struct Scene {
    pub id: u32,
    name: String,
    registry: Registry,
    settings: SceneSettings,
    level_order: LevelOrderBatches,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        if !self.registry.is_empty() {
            log::info!("Releasing scene '{}' ({} entities)", self.name, self.registry.len());
        }
        self.registry.clear();
    }
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_settings(name, SceneSettings::default())
    }

    pub fn with_settings(name: impl Into<String>, settings: SceneSettings) -> Self {
        let name = name.into();
        let id = NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed);
        log::info!("Created scene '{name}' (id {id})");
        Self {
            id,
            name,
            registry: Registry::with_capacity(settings.entity_capacity),
            settings,
            level_order: LevelOrderBatches::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[must_use]
    pub fn settings(&self) -> &SceneSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut SceneSettings {
        &mut self.settings
    }

    /// Direct access to component storage for renderer/physics style bulk
    /// iteration.
    ///
    /// Structural edits (destroy, reparent) made through the registry bypass
    /// the hierarchy bookkeeping; use the `Scene` methods for those.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    #[inline]
    #[must_use]
    pub fn valid(&self, entity: Entity) -> bool {
        self.registry.valid(entity)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    // ========================================================================
    // Creation
    // ========================================================================

    /// Creates a root entity carrying only an [`EntityId`].
    pub fn create_entity(&mut self) -> Entity {
        let entity = self.registry.create();
        self.attach(entity, EntityId::new());
        log::trace!("Created entity {entity:?}");
        entity
    }

    /// Creates a root entity with an [`EntityId`] and a [`Name`].
    pub fn create_named(&mut self, name: impl Into<String>) -> Entity {
        let entity = self.create_entity();
        self.attach(entity, Name::new(name));
        entity
    }

    /// Creates an entity as the first child of `parent`. Returns `None` if
    /// `parent` is stale.
    pub fn create_child(&mut self, parent: Entity, name: Option<&str>) -> Option<Entity> {
        if !self.valid(parent) {
            log::debug!("Ignoring child creation under stale entity {parent:?}");
            return None;
        }
        let entity = match name {
            Some(name) => self.create_named(name),
            None => self.create_entity(),
        };
        if let Err(err) = hierarchy::link_as_first_child(&mut self.registry, entity, parent) {
            log::error!("Failed to link new child {entity:?}: {err}");
        }
        Some(entity)
    }

    /// Starts building a spatial entity.
    pub fn build_entity(&mut self, name: &str) -> EntityBuilder<'_> {
        EntityBuilder::new(self, name)
    }

    fn attach<T: Component>(&mut self, entity: Entity, value: T) {
        if let Err(err) = self.registry.insert_or_replace(entity, value) {
            log::error!("Failed to attach `{}` to {entity:?}: {err}", T::NAME);
        }
    }

    // ========================================================================
    // Structure queries
    // ========================================================================

    #[must_use]
    pub fn hierarchy(&self, entity: Entity) -> Option<&Hierarchy> {
        self.registry.get::<Hierarchy>(entity)
    }

    #[must_use]
    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        hierarchy::parent_of(&self.registry, entity)
    }

    /// Direct children, head first.
    #[must_use]
    pub fn children(&self, entity: Entity) -> Children<'_> {
        hierarchy::children(&self.registry, entity)
    }

    /// Parent chain, nearest first.
    #[must_use]
    pub fn ancestors(&self, entity: Entity) -> Ancestors<'_> {
        hierarchy::ancestors(&self.registry, entity)
    }

    /// Transitive descendants in pre-order, excluding `entity`.
    #[must_use]
    pub fn descendants(&self, entity: Entity) -> Vec<Entity> {
        hierarchy::descendants(&self.registry, entity)
    }

    #[must_use]
    pub fn is_ancestor_of(&self, ancestor: Entity, entity: Entity) -> bool {
        hierarchy::is_ancestor_of(&self.registry, ancestor, entity)
    }

    #[must_use]
    pub fn depth(&self, entity: Entity) -> usize {
        hierarchy::depth(&self.registry, entity)
    }

    /// Entities without a parent, in creation order.
    #[must_use]
    pub fn roots(&self) -> Vec<Entity> {
        let mut roots: Vec<(u64, Entity)> = self
            .registry
            .entities()
            .filter(|&e| self.parent(e).is_none())
            .map(|e| (self.registry.serial(e).unwrap_or(u64::MAX), e))
            .collect();
        roots.sort_unstable_by_key(|&(serial, _)| serial);
        roots.into_iter().map(|(_, e)| e).collect()
    }

    // ========================================================================
    // Reparenting
    // ========================================================================

    /// Whether `reparent(entity, new_parent)` would change the tree: both
    /// handles are live and `new_parent` is neither `entity` nor one of its
    /// descendants.
    #[must_use]
    pub fn can_reparent(&self, entity: Entity, new_parent: Option<Entity>) -> bool {
        if !self.valid(entity) {
            return false;
        }
        match new_parent {
            None => true,
            Some(parent) => {
                self.valid(parent)
                    && parent != entity
                    && !self.is_ancestor_of(entity, parent)
            }
        }
    }

    /// Moves `entity` under `new_parent` using the scene's default
    /// [`ReparentMode`].
    pub fn reparent(&mut self, entity: Entity, new_parent: Option<Entity>) -> Result<()> {
        self.reparent_with(entity, new_parent, self.settings.reparent_mode)
    }

    /// Moves `entity` under `new_parent`.
    ///
    /// Stale handles are ignored. A cycle is rejected with
    /// [`SceneError::WouldCreateCycle`] and the tree is left unchanged. With
    /// [`ReparentMode::KeepWorld`] the local transform is rewritten so the
    /// entity does not move on screen.
    pub fn reparent_with(
        &mut self,
        entity: Entity,
        new_parent: Option<Entity>,
        mode: ReparentMode,
    ) -> Result<()> {
        let old_parent = self.parent(entity);
        let old_world = (mode == ReparentMode::KeepWorld && self.registry.has::<Transform>(entity))
            .then(|| self.world_matrix_fresh(entity))
            .flatten();

        hierarchy::reparent(&mut self.registry, entity, new_parent)?;
        if self.parent(entity) == old_parent {
            return Ok(());
        }

        if let Some(world) = old_world {
            self.write_world_matrix(entity, world);
        }
        if let Some(transform) = self.registry.get_mut::<Transform>(entity) {
            transform.mark_dirty();
        }
        if self.settings.drop_empty_hierarchy {
            if let Some(old_parent) = old_parent {
                hierarchy::prune_if_empty(&mut self.registry, old_parent);
            }
            hierarchy::prune_if_empty(&mut self.registry, entity);
        }
        Ok(())
    }

    /// Makes `entity` a root.
    pub fn detach(&mut self, entity: Entity) -> Result<()> {
        self.reparent(entity, None)
    }

    // ========================================================================
    // Destruction
    // ========================================================================

    /// Destroys `entity` and applies the scene's [`OrphanPolicy`] to its
    /// children. Returns the number of destroyed entities; stale handles are
    /// a no-op returning 0.
    pub fn destroy_entity(&mut self, entity: Entity) -> usize {
        if !self.valid(entity) {
            log::debug!("Ignoring destroy of stale entity {entity:?}");
            return 0;
        }
        match self.settings.orphan_policy {
            OrphanPolicy::DestroyRecursive => self.destroy_subtree(entity),
            OrphanPolicy::DetachToRoot => {
                let children: Vec<Entity> = self.children(entity).collect();
                for child in children {
                    // Moving to root cannot form a cycle.
                    if let Err(err) = self.reparent(child, None) {
                        log::error!("Failed to detach {child:?}: {err}");
                    }
                }
                self.destroy_subtree(entity)
            }
        }
    }

    /// Destroys `entity` and all of its descendants, children before parents.
    ///
    /// `entity` is unlinked from its parent first, so no surviving entity
    /// references a destroyed one. Returns the number of destroyed entities;
    /// stale handles are a no-op returning 0.
    pub fn destroy_subtree(&mut self, entity: Entity) -> usize {
        if !self.valid(entity) {
            log::debug!("Ignoring destroy of stale entity {entity:?}");
            return 0;
        }
        let parent = self.parent(entity);
        hierarchy::unlink(&mut self.registry, entity);

        let doomed = self.descendants(entity);
        let mut destroyed = 0;
        for &e in doomed.iter().rev() {
            destroyed += usize::from(self.registry.destroy(e));
        }
        destroyed += usize::from(self.registry.destroy(entity));

        if let Some(parent) = parent
            && self.settings.drop_empty_hierarchy
        {
            hierarchy::prune_if_empty(&mut self.registry, parent);
        }
        log::trace!("Destroyed subtree of {entity:?} ({destroyed} entities)");
        destroyed
    }

    /// Destroys every entity. Detach hooks fire for every component.
    pub fn clear(&mut self) {
        log::info!("Clearing scene '{}' ({} entities)", self.name, self.registry.len());
        self.registry.clear();
    }

    // ========================================================================
    // Duplication
    // ========================================================================

    /// Deep-copies `source` and its subtree. See [`Scene::duplicate_with_report`].
    pub fn duplicate_entity(&mut self, source: Entity, target_parent: Option<Entity>) -> Option<Entity> {
        self.duplicate_with_report(source, target_parent).root
    }

    /// Deep-copies `source` and its subtree.
    ///
    /// Every component is copied through [`Component::clone_for`]; the child
    /// lists of the copies mirror the originals in the same order. The copy
    /// of `source` becomes a child of `target_parent`, or a root with `None`.
    ///
    /// The source subtree is captured before any copy is linked, so
    /// duplicating an entity into its own subtree copies it once.
    ///
    /// Stale `source` or `target_parent` handles are ignored. Per-component
    /// clone failures are reported but do not stop the duplicate.
    pub fn duplicate_with_report(
        &mut self,
        source: Entity,
        target_parent: Option<Entity>,
    ) -> DuplicateReport {
        let mut report = DuplicateReport::default();
        if !self.valid(source) {
            log::debug!("Ignoring duplicate of stale entity {source:?}");
            return report;
        }
        if let Some(parent) = target_parent
            && !self.valid(parent)
        {
            log::debug!("Ignoring duplicate of {source:?} under stale entity {parent:?}");
            return report;
        }

        let mut order = vec![source];
        order.extend(self.descendants(source));

        let mut copies: FxHashMap<Entity, Entity> =
            FxHashMap::with_capacity_and_hasher(order.len(), Default::default());
        for &original in &order {
            let copy = self.registry.create();
            report.failures.extend(self.registry.clone_components(original, copy));
            copies.insert(original, copy);
        }

        // Reverse pre-order links the last sibling first, so head insertion
        // restores the original order.
        for &original in order.iter().rev() {
            let Some(&copy) = copies.get(&original) else {
                continue;
            };
            let parent_copy = if original == source {
                target_parent
            } else {
                self.parent(original).and_then(|p| copies.get(&p).copied())
            };
            if let Some(parent_copy) = parent_copy
                && let Err(err) = hierarchy::link_as_first_child(&mut self.registry, copy, parent_copy)
            {
                log::error!("Failed to link duplicate {copy:?}: {err}");
                report.failures.push(err);
            }
        }

        report.root = copies.get(&source).copied();
        report.entities_created = copies.len();
        if !report.failures.is_empty() {
            log::warn!(
                "Duplicated {source:?} with {} component failure(s)",
                report.failures.len()
            );
        }
        log::trace!("Duplicated {source:?} -> {:?}", report.root);
        report
    }

    // ========================================================================
    // Transforms
    // ========================================================================

    /// Recomputes every world matrix, parent before child.
    pub fn update_transforms(&mut self) {
        let roots = self.roots();
        let (transforms, links) = self.registry.split_pools::<Transform, Hierarchy>();
        if let Some(transforms) = transforms {
            transform_system::update_hierarchy(transforms, links, &roots);
        }
    }

    /// Same as [`Scene::update_transforms`], walking the forest level by
    /// level.
    pub fn update_transforms_batched(&mut self) {
        let roots = self.roots();
        let mut batches = std::mem::take(&mut self.level_order);
        transform_system::build_level_order(self.registry.pool::<Hierarchy>(), &roots, &mut batches);

        let (transforms, links) = self.registry.split_pools::<Transform, Hierarchy>();
        if let Some(transforms) = transforms {
            transform_system::update_hierarchy_batched(transforms, links, &batches);
        }
        self.level_order = batches;
    }

    /// Recomputes world matrices of `entity` and its subtree only.
    pub fn update_subtree(&mut self, entity: Entity) {
        if !self.valid(entity) {
            return;
        }
        let (transforms, links) = self.registry.split_pools::<Transform, Hierarchy>();
        if let Some(transforms) = transforms {
            transform_system::update_subtree(transforms, links, entity);
        }
    }

    /// World matrix as of the last transform pass.
    #[must_use]
    pub fn world_matrix(&self, entity: Entity) -> Option<Affine3A> {
        self.registry.get::<Transform>(entity).map(|t| *t.world_matrix())
    }

    /// World matrix computed now from the parent chain's current TRS.
    ///
    /// Use before reads that cannot wait for the next pass (gizmo drag
    /// start). Entities without a `Transform` report their parent's.
    #[must_use]
    pub fn world_matrix_fresh(&self, entity: Entity) -> Option<Affine3A> {
        if !self.valid(entity) {
            return None;
        }
        Some(match self.registry.pool::<Transform>() {
            Some(transforms) => transform_system::compute_world_matrix(
                transforms,
                self.registry.pool::<Hierarchy>(),
                entity,
            ),
            None => Affine3A::IDENTITY,
        })
    }

    #[must_use]
    pub fn world_position(&self, entity: Entity) -> Option<Vec3> {
        self.world_matrix_fresh(entity).map(|m| m.translation.into())
    }

    /// Writes a world-space pose back into the local TRS of `entity`
    /// (gizmo manipulation) and refreshes its subtree.
    pub fn set_world_matrix(&mut self, entity: Entity, world: Affine3A) -> Result<()> {
        if !self.valid(entity) {
            return Err(SceneError::InvalidEntity(entity));
        }
        if !self.registry.has::<Transform>(entity) {
            return Err(SceneError::ComponentMissing { entity, component: Transform::NAME });
        }
        self.write_world_matrix(entity, world);
        self.update_subtree(entity);
        Ok(())
    }

    fn write_world_matrix(&mut self, entity: Entity, world: Affine3A) {
        let parent_world = self
            .parent(entity)
            .and_then(|p| self.world_matrix_fresh(p))
            .unwrap_or(Affine3A::IDENTITY);
        let local = parent_world.inverse() * world;
        if let Some(transform) = self.registry.get_mut::<Transform>(entity) {
            transform.apply_local_matrix(local);
        }
    }

    // ========================================================================
    // Names, ids & flags
    // ========================================================================

    #[must_use]
    pub fn name_of(&self, entity: Entity) -> Option<&str> {
        self.registry.get::<Name>(entity).map(Name::as_str)
    }

    /// Sets the display name. Returns `false` for stale handles.
    pub fn rename(&mut self, entity: Entity, name: impl Into<String>) -> bool {
        self.registry.insert_or_replace(entity, Name::new(name)).is_ok()
    }

    /// First entity (in creation order) with the given display name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<Entity> {
        self.registry
            .view::<Name>()
            .filter(|(_, n)| n.as_str() == name)
            .map(|(e, _)| e)
            .min_by_key(|&e| self.registry.serial(e))
    }

    #[must_use]
    pub fn entity_id(&self, entity: Entity) -> Option<Uuid> {
        self.registry.get::<EntityId>(entity).map(|id| id.0)
    }

    #[must_use]
    pub fn find_by_id(&self, id: Uuid) -> Option<Entity> {
        self.registry
            .view::<EntityId>()
            .find(|(_, eid)| eid.0 == id)
            .map(|(e, _)| e)
    }

    /// Nearest entity, starting at `entity` itself, carrying a [`Prefab`].
    #[must_use]
    pub fn prefab_root(&self, entity: Entity) -> Option<Entity> {
        if !self.valid(entity) {
            return None;
        }
        std::iter::once(entity)
            .chain(self.ancestors(entity))
            .find(|&e| self.registry.has::<Prefab>(e))
    }

    #[must_use]
    pub fn is_in_prefab(&self, entity: Entity) -> bool {
        self.prefab_root(entity).is_some()
    }

    /// `false` if `entity` or any ancestor is deactivated, or the handle is
    /// stale. A missing [`Active`] counts as active.
    #[must_use]
    pub fn is_active_in_hierarchy(&self, entity: Entity) -> bool {
        self.valid(entity)
            && std::iter::once(entity)
                .chain(self.ancestors(entity))
                .all(|e| self.registry.get::<Active>(e).is_none_or(|a| a.0))
    }

    pub fn set_active(&mut self, entity: Entity, active: bool) {
        self.attach(entity, Active(active));
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Creates a named entity with a `Transform`, optionally under a parent.
pub struct EntityBuilder<'a> {
    scene: &'a mut Scene,
    name: String,
    transform: Transform,
    parent: Option<Entity>,
}

impl<'a> EntityBuilder<'a> {
    pub fn new(scene: &'a mut Scene, name: &str) -> Self {
        Self {
            scene,
            name: name.to_string(),
            transform: Transform::new(),
            parent: None,
        }
    }

    #[must_use]
    pub fn with_position(mut self, x: f32, y: f32, z: f32) -> Self {
        self.transform.position = Vec3::new(x, y, z);
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.transform.rotation = rotation;
        self
    }

    #[must_use]
    pub fn with_scale(mut self, s: f32) -> Self {
        self.transform.scale = Vec3::splat(s);
        self
    }

    #[must_use]
    pub fn with_parent(mut self, parent: Entity) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn build(self) -> Entity {
        let entity = self.scene.create_named(self.name);
        self.scene.attach(entity, self.transform);
        if let Some(parent) = self.parent
            && let Err(err) = self.scene.reparent_with(entity, Some(parent), ReparentMode::KeepLocal)
        {
            log::error!("Failed to parent new entity {entity:?}: {err}");
        }
        entity
    }
}
