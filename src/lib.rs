#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! Scene graph core for an editor: generation-checked entities, sparse
//! component pools, an intrusive parent/child hierarchy with transform
//! propagation, and the editor-side selection/clipboard/command model.

pub mod ecs;
pub mod editor;
pub mod errors;
pub mod scene;
pub mod settings;

pub use ecs::{Component, Entity, Registry};
pub use editor::{EditorContext, HierarchyCommand, SelectionSet};
pub use errors::{Result, SceneError};
pub use scene::{Hierarchy, Name, Scene, SceneManager, Transform};
pub use settings::{EditorSettings, OrphanPolicy, ReparentMode, SceneSettings};
