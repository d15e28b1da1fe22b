//! Component capability table.
//!
//! Every type stored in a [`Registry`](crate::ecs::Registry) implements
//! [`Component`]. The trait replaces runtime type inspection: the inspector
//! reads `NAME`/`ICON`, duplication calls [`Component::clone_for`].

use std::any::TypeId;

use crate::ecs::Entity;
use crate::errors::Result;

/// Data payload attachable to at most one entity per type.
pub trait Component: Clone + 'static {
    /// Display name used by the inspector and in error messages.
    const NAME: &'static str;

    /// Icon tag resolved by the editor's icon font.
    const ICON: &'static str = "cube-outline";

    /// Bookkeeping components (names, ids, links) are hidden from the
    /// component list and never chosen as an entity's primary icon.
    const INTERNAL: bool = false;

    /// Whether `Scene::duplicate_entity` copies this component. Structural
    /// components whose contents are rebuilt by the duplicate itself opt out.
    const COPY_ON_DUPLICATE: bool = true;

    /// Produces the copy attached to `new_owner` when an entity is
    /// duplicated.
    ///
    /// The default is a plain [`Clone`]. Components that own identity-bound
    /// side data (native physics bodies, GPU handles, unique ids) override
    /// this to hand out a fresh instance. An `Err` is reported to the caller
    /// of the duplicate but does not abort it.
    fn clone_for(&self, new_owner: Entity) -> Result<Self> {
        let _ = new_owner;
        Ok(self.clone())
    }
}

/// Type-erased description of a component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentInfo {
    pub type_id: TypeId,
    pub name: &'static str,
    pub icon: &'static str,
    pub internal: bool,
    pub copy_on_duplicate: bool,
}

impl ComponentInfo {
    #[must_use]
    pub fn of<T: Component>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: T::NAME,
            icon: T::ICON,
            internal: T::INTERNAL,
            copy_on_duplicate: T::COPY_ON_DUPLICATE,
        }
    }
}
