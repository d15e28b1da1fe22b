//! Bookkeeping components attached by the scene itself.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ecs::{Component, Entity};
use crate::errors::Result;

/// Display name shown in the hierarchy panel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Component for Name {
    const NAME: &'static str = "Name";
    const ICON: &'static str = "tag";
    const INTERNAL: bool = true;
}

/// Persistent identity of an entity.
///
/// Unlike [`Entity`], the id survives save/load. Duplicates get a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for EntityId {
    const NAME: &'static str = "EntityId";
    const ICON: &'static str = "identifier";
    const INTERNAL: bool = true;

    fn clone_for(&self, _new_owner: Entity) -> Result<Self> {
        Ok(Self::new())
    }
}

/// Enables or disables an entity and, transitively, its subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Active(pub bool);

impl Default for Active {
    fn default() -> Self {
        Self(true)
    }
}

impl Component for Active {
    const NAME: &'static str = "Active";
    const ICON: &'static str = "eye";
    const INTERNAL: bool = true;
}

/// Marks the root of an instantiated prefab.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Prefab {
    /// Asset path or key the prefab was instantiated from.
    pub source: String,
}

impl Component for Prefab {
    const NAME: &'static str = "Prefab";
    const ICON: &'static str = "package-variant";
}
