//! Entity/component storage.
//!
//! - [`Entity`]: generation-checked handle (slot index + version)
//! - [`Component`]: capability trait every stored type implements
//! - [`Pool`]: per-type sparse set (dense arrays + sparse index)
//! - [`Registry`]: owns the entity slots and one pool per component type

pub mod component;
pub mod entity;
pub mod registry;
pub mod storage;

pub use component::{Component, ComponentInfo};
pub use entity::Entity;
pub use registry::Registry;
pub use storage::{Hook, Pool};
