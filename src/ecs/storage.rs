//! Per-type component pools.
//!
//! A [`Pool<T>`] is a sparse set: components live in a dense `Vec<T>` with a
//! parallel `Vec<Entity>`, and a generation-checked [`SecondaryMap`] maps each
//! entity to its dense slot. Lookups, inserts and removals are O(1); iteration
//! touches only entities that actually carry `T`.
//!
//! Removal uses `swap_remove`, so dense order is not stable across removals.

use std::any::Any;

use slotmap::SecondaryMap;

use crate::ecs::component::{Component, ComponentInfo};
use crate::ecs::entity::Entity;
use crate::errors::SceneError;

/// Callback fired when a component is attached to or detached from an entity.
pub type Hook<T> = Box<dyn FnMut(Entity, &mut T)>;

/// Dense storage for one component type.
pub struct Pool<T: Component> {
    sparse: SecondaryMap<Entity, usize>,
    entities: Vec<Entity>,
    data: Vec<T>,
    on_attach: Vec<Hook<T>>,
    on_detach: Vec<Hook<T>>,
}

impl<T: Component> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> Pool<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sparse: SecondaryMap::new(),
            entities: Vec::new(),
            data: Vec::new(),
            on_attach: Vec::new(),
            on_detach: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.sparse.contains_key(entity)
    }

    #[inline]
    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<&T> {
        let &slot = self.sparse.get(entity)?;
        self.data.get(slot)
    }

    #[inline]
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        let &slot = self.sparse.get(entity)?;
        self.data.get_mut(slot)
    }

    /// Entities carrying this component, in dense order.
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.entities.iter().copied().zip(self.data.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.entities.iter().copied().zip(self.data.iter_mut())
    }

    /// Attaches `value` to `entity` and fires the attach hooks.
    ///
    /// The caller guarantees `entity` does not carry `T` yet; the registry
    /// checks this before calling.
    pub(crate) fn insert(&mut self, entity: Entity, value: T) -> &mut T {
        debug_assert!(!self.contains(entity));
        let slot = self.data.len();
        self.entities.push(entity);
        self.data.push(value);
        self.sparse.insert(entity, slot);

        let component = &mut self.data[slot];
        for hook in &mut self.on_attach {
            hook(entity, &mut *component);
        }
        component
    }

    /// Detaches the component of `entity`, firing the detach hooks first.
    pub(crate) fn remove(&mut self, entity: Entity) -> Option<T> {
        let slot = self.sparse.remove(entity)?;

        for hook in &mut self.on_detach {
            hook(entity, &mut self.data[slot]);
        }

        let last = self.data.len() - 1;
        self.entities.swap_remove(slot);
        let value = self.data.swap_remove(slot);
        if slot != last {
            let moved = self.entities[slot];
            if let Some(moved_slot) = self.sparse.get_mut(moved) {
                *moved_slot = slot;
            }
        }
        Some(value)
    }

    /// Detaches every component, firing detach hooks for each.
    pub(crate) fn clear(&mut self) {
        for (entity, component) in self.entities.iter().zip(self.data.iter_mut()) {
            for hook in &mut self.on_detach {
                hook(*entity, &mut *component);
            }
        }
        self.entities.clear();
        self.data.clear();
        self.sparse.clear();
    }

    pub(crate) fn add_attach_hook(&mut self, hook: Hook<T>) {
        self.on_attach.push(hook);
    }

    pub(crate) fn add_detach_hook(&mut self, hook: Hook<T>) {
        self.on_detach.push(hook);
    }
}

/// Object-safe view of a [`Pool<T>`] used by entity-wide operations
/// (destroy, duplicate, inspection) that do not know the concrete type.
pub(crate) trait ErasedPool: Any {
    fn info(&self) -> ComponentInfo;
    fn contains_entity(&self, entity: Entity) -> bool;
    fn component_count(&self) -> usize;
    fn remove_entity(&mut self, entity: Entity) -> bool;
    fn clear_all(&mut self);
    /// Copies the component of `source` onto `target` via
    /// [`Component::clone_for`]. Returns `None` when `source` has no such
    /// component or `target` already has one.
    fn clone_between(&mut self, source: Entity, target: Entity) -> Option<Result<(), SceneError>>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedPool for Pool<T> {
    fn info(&self) -> ComponentInfo {
        ComponentInfo::of::<T>()
    }

    fn contains_entity(&self, entity: Entity) -> bool {
        self.contains(entity)
    }

    fn component_count(&self) -> usize {
        self.data.len()
    }

    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.remove(entity).is_some()
    }

    fn clear_all(&mut self) {
        self.clear();
    }

    fn clone_between(&mut self, source: Entity, target: Entity) -> Option<Result<(), SceneError>> {
        if self.contains(target) {
            return None;
        }
        let copy = self.get(source)?.clone_for(target);
        Some(copy.map(|value| {
            self.insert(target, value);
        }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
