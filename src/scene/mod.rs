//! Scene graph.
//!
//! - [`Hierarchy`]: intrusive parent/child/sibling links
//! - [`Transform`]: local TRS with cached local/world matrices
//! - [`transform_system`]: top-down world matrix propagation
//! - [`Scene`]: create/destroy/duplicate/reparent over one registry
//! - [`SceneManager`]: loaded scenes and deferred switching
//! - [`snapshot`]: flat parent-referencing records for save/load

pub mod components;
pub mod hierarchy;
pub mod manager;
#[allow(clippy::module_inception)]
pub mod scene;
pub mod snapshot;
pub mod transform;
pub mod transform_system;

pub use components::{Active, EntityId, Name, Prefab};
pub use hierarchy::{Ancestors, Children, Hierarchy};
pub use manager::{SceneHandle, SceneManager};
pub use scene::{DuplicateReport, EntityBuilder, Scene};
pub use snapshot::{EntityRecord, SceneSnapshot, TransformRecord};
pub use transform::Transform;
