//! Component registry.
//!
//! The [`Registry`] owns entity allocation and one [`Pool`] per component
//! type. It knows nothing about hierarchy or transforms: structural
//! bookkeeping lives in [`Scene`](crate::scene::Scene), which is the entry
//! point editors should use for destroy/duplicate/reparent. The registry is
//! still exposed to collaborators (renderer, physics) for bulk iteration.

use std::any::TypeId;

use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::ecs::component::{Component, ComponentInfo};
use crate::ecs::entity::Entity;
use crate::ecs::storage::{ErasedPool, Pool};
use crate::errors::{Result, SceneError};

/// Per-entity bookkeeping.
#[derive(Debug, Clone, Copy)]
struct EntitySlot {
    /// Monotonic creation counter, used for stable display order.
    serial: u64,
}

/// Sparse, type-erased component table.
#[derive(Default)]
pub struct Registry {
    entities: SlotMap<Entity, EntitySlot>,
    pools: FxHashMap<TypeId, Box<dyn ErasedPool>>,
    next_serial: u64,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entities: SlotMap::with_capacity_and_key(capacity),
            pools: FxHashMap::default(),
            next_serial: 0,
        }
    }

    // ========================================================================
    // Entity lifecycle
    // ========================================================================

    /// Allocates a new entity without components.
    pub fn create(&mut self) -> Entity {
        let serial = self.next_serial;
        self.next_serial += 1;
        self.entities.insert(EntitySlot { serial })
    }

    /// Returns `true` if `entity` is alive in this registry.
    #[inline]
    #[must_use]
    pub fn valid(&self, entity: Entity) -> bool {
        self.entities.contains_key(entity)
    }

    /// Creation order of `entity`; smaller values were created earlier.
    #[must_use]
    pub fn serial(&self, entity: Entity) -> Option<u64> {
        self.entities.get(entity).map(|slot| slot.serial)
    }

    /// Removes every component of `entity` (firing detach hooks) and frees
    /// its slot. Stale handles are ignored.
    ///
    /// This does not touch hierarchy links held by *other* entities; use
    /// `Scene::destroy_entity` / `Scene::destroy_subtree` for that.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        if !self.valid(entity) {
            return false;
        }
        for pool in self.pools.values_mut() {
            pool.remove_entity(entity);
        }
        self.entities.remove(entity);
        true
    }

    /// Destroys every entity. Detach hooks fire for every component. Hooks
    /// registered on the pools stay installed.
    pub fn clear(&mut self) {
        for pool in self.pools.values_mut() {
            pool.clear_all();
        }
        self.entities.clear();
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterates all live entities in slot order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.keys()
    }

    // ========================================================================
    // Component access
    // ========================================================================

    /// Attaches `value` to `entity`.
    ///
    /// Adding a component type the entity already carries is a logic error in
    /// the caller: it asserts in debug builds and returns
    /// [`SceneError::ComponentAlreadyPresent`] otherwise.
    pub fn add<T: Component>(&mut self, entity: Entity, value: T) -> Result<&mut T> {
        if !self.valid(entity) {
            return Err(SceneError::InvalidEntity(entity));
        }
        let pool = self.pool_or_insert::<T>();
        if pool.contains(entity) {
            log::error!("Entity {entity:?} already has component `{}`", T::NAME);
            debug_assert!(false, "Entity {entity:?} already has component `{}`", T::NAME);
            return Err(SceneError::ComponentAlreadyPresent {
                entity,
                component: T::NAME,
            });
        }
        Ok(pool.insert(entity, value))
    }

    /// Attaches `value`, replacing (and detaching) any existing `T`.
    pub fn insert_or_replace<T: Component>(&mut self, entity: Entity, value: T) -> Result<&mut T> {
        if !self.valid(entity) {
            return Err(SceneError::InvalidEntity(entity));
        }
        let pool = self.pool_or_insert::<T>();
        pool.remove(entity);
        Ok(pool.insert(entity, value))
    }

    /// Returns the existing `T` or attaches the one produced by `make`.
    pub fn get_or_insert_with<T: Component>(
        &mut self,
        entity: Entity,
        make: impl FnOnce() -> T,
    ) -> Result<&mut T> {
        if !self.valid(entity) {
            return Err(SceneError::InvalidEntity(entity));
        }
        let pool = self.pool_or_insert::<T>();
        if pool.contains(entity) {
            return pool
                .get_mut(entity)
                .ok_or(SceneError::ComponentMissing { entity, component: T::NAME });
        }
        Ok(pool.insert(entity, make()))
    }

    /// Query for an optional component. Missing components and stale handles
    /// both yield `None`.
    #[inline]
    #[must_use]
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.pool::<T>()?.get(entity)
    }

    #[inline]
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.pool_mut::<T>()?.get_mut(entity)
    }

    #[inline]
    #[must_use]
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.pool::<T>().is_some_and(|pool| pool.contains(entity))
    }

    /// Detaches and returns the `T` of `entity`, firing detach hooks.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> Option<T> {
        self.pool_mut::<T>()?.remove(entity)
    }

    // ========================================================================
    // Hooks
    // ========================================================================

    /// Registers a callback fired right after a `T` is attached.
    pub fn on_attach<T: Component>(&mut self, hook: impl FnMut(Entity, &mut T) + 'static) {
        self.pool_or_insert::<T>().add_attach_hook(Box::new(hook));
    }

    /// Registers a callback fired right before a `T` is detached, whether by
    /// `remove`, entity destruction or `clear`.
    pub fn on_detach<T: Component>(&mut self, hook: impl FnMut(Entity, &mut T) + 'static) {
        self.pool_or_insert::<T>().add_detach_hook(Box::new(hook));
    }

    // ========================================================================
    // Pools & views
    // ========================================================================

    #[must_use]
    pub fn pool<T: Component>(&self) -> Option<&Pool<T>> {
        self.pools
            .get(&TypeId::of::<T>())
            .and_then(|pool| pool.as_any().downcast_ref::<Pool<T>>())
    }

    pub fn pool_mut<T: Component>(&mut self) -> Option<&mut Pool<T>> {
        self.pools
            .get_mut(&TypeId::of::<T>())
            .and_then(|pool| pool.as_any_mut().downcast_mut::<Pool<T>>())
    }

    fn pool_or_insert<T: Component>(&mut self) -> &mut Pool<T> {
        self.pools
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Pool::<T>::new()))
            .as_any_mut()
            .downcast_mut::<Pool<T>>()
            .expect("pool registered under the TypeId of its component")
    }

    /// Borrows two distinct pools at once: `A` mutably, `B` shared.
    ///
    /// # Panics
    ///
    /// Panics if `A` and `B` are the same type.
    pub fn split_pools<A: Component, B: Component>(
        &mut self,
    ) -> (Option<&mut Pool<A>>, Option<&Pool<B>>) {
        let [a, b] = self
            .pools
            .get_disjoint_mut([&TypeId::of::<A>(), &TypeId::of::<B>()]);
        (
            a.and_then(|pool| pool.as_any_mut().downcast_mut::<Pool<A>>()),
            b.and_then(|pool| pool.as_any().downcast_ref::<Pool<B>>()),
        )
    }

    /// Every entity carrying `T` together with its component.
    pub fn view<T: Component>(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.pool::<T>().into_iter().flat_map(Pool::iter)
    }

    pub fn view_mut<T: Component>(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.pool_mut::<T>().into_iter().flat_map(Pool::iter_mut)
    }

    /// Entities carrying both `A` and `B`.
    ///
    /// Drives iteration from the smaller pool and probes the other, so the
    /// cost is bounded by the rarer component. The result is a snapshot:
    /// structural edits made while walking it do not invalidate it.
    #[must_use]
    pub fn view2<A: Component, B: Component>(&self) -> Vec<Entity> {
        let (Some(a), Some(b)) = (self.pool::<A>(), self.pool::<B>()) else {
            return Vec::new();
        };
        if a.len() <= b.len() {
            a.entities().iter().copied().filter(|&e| b.contains(e)).collect()
        } else {
            b.entities().iter().copied().filter(|&e| a.contains(e)).collect()
        }
    }

    /// Entities carrying `A`, `B` and `C`. See [`Registry::view2`].
    #[must_use]
    pub fn view3<A: Component, B: Component, C: Component>(&self) -> Vec<Entity> {
        let (Some(a), Some(b), Some(c)) = (self.pool::<A>(), self.pool::<B>(), self.pool::<C>())
        else {
            return Vec::new();
        };
        let driver = [a.entities(), b.entities(), c.entities()]
            .into_iter()
            .min_by_key(|entities| entities.len())
            .unwrap_or_default();
        driver
            .iter()
            .copied()
            .filter(|&e| a.contains(e) && b.contains(e) && c.contains(e))
            .collect()
    }

    // ========================================================================
    // Type-erased entity operations
    // ========================================================================

    /// Describes every component attached to `entity`, sorted by name.
    #[must_use]
    pub fn component_infos(&self, entity: Entity) -> Vec<ComponentInfo> {
        let mut infos: Vec<ComponentInfo> = self
            .pools
            .values()
            .filter(|pool| pool.contains_entity(entity))
            .map(|pool| pool.info())
            .collect();
        infos.sort_by_key(|info| info.name);
        infos
    }

    /// Number of component types registered so far (including empty pools).
    #[must_use]
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    /// Total number of live components of type `T`.
    #[must_use]
    pub fn count<T: Component>(&self) -> usize {
        self.pools
            .get(&TypeId::of::<T>())
            .map_or(0, |pool| pool.component_count())
    }

    /// Copies every duplicable component of `source` onto `target` through
    /// [`Component::clone_for`].
    ///
    /// Failures are collected and returned; the remaining components are
    /// still copied.
    pub(crate) fn clone_components(&mut self, source: Entity, target: Entity) -> Vec<SceneError> {
        let mut failures = Vec::new();
        if !self.valid(source) || !self.valid(target) {
            return failures;
        }
        for pool in self.pools.values_mut() {
            if !pool.info().copy_on_duplicate {
                continue;
            }
            if let Some(Err(err)) = pool.clone_between(source, target) {
                log::warn!(
                    "Component `{}` was not duplicated onto {target:?}: {err}",
                    pool.info().name
                );
                failures.push(err);
            }
        }
        failures
    }
}
