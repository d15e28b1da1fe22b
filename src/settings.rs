//! Scene & Editor Settings
//!
//! Runtime policy knobs for the scene graph and the editor layer.
//!
//! ```rust,ignore
//! use arbor::settings::{SceneSettings, ReparentMode};
//!
//! let settings = SceneSettings {
//!     reparent_mode: ReparentMode::KeepWorld,
//!     ..Default::default()
//! };
//! let scene = Scene::with_settings("Level", settings);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::Result;

// ---------------------------------------------------------------------------
// ReparentMode
// ---------------------------------------------------------------------------

/// How the local transform of a moved entity is treated by `Scene::reparent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReparentMode {
    /// Keep the local TRS untouched. The entity's world pose follows the new
    /// parent.
    #[default]
    KeepLocal,
    /// Rewrite the local TRS so that the world pose is unchanged after the
    /// move (drag-drop in the hierarchy panel).
    KeepWorld,
}

// ---------------------------------------------------------------------------
// OrphanPolicy
// ---------------------------------------------------------------------------

/// What happens to the children of an entity destroyed with
/// `Scene::destroy_entity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrphanPolicy {
    /// Children are unlinked and become roots.
    #[default]
    DetachToRoot,
    /// Children are destroyed along with their parent.
    DestroyRecursive,
}

// ---------------------------------------------------------------------------
// SceneSettings
// ---------------------------------------------------------------------------

/// Per-scene structural policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    /// Default mode used by `Scene::reparent`.
    pub reparent_mode: ReparentMode,
    /// Policy applied by the non-recursive `Scene::destroy_entity`.
    pub orphan_policy: OrphanPolicy,
    /// Remove the `Hierarchy` component from an entity once it is a root
    /// without children.
    pub drop_empty_hierarchy: bool,
    /// Number of entity slots reserved up front.
    pub entity_capacity: usize,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            reparent_mode: ReparentMode::KeepLocal,
            orphan_policy: OrphanPolicy::DetachToRoot,
            drop_empty_hierarchy: true,
            entity_capacity: 256,
        }
    }
}

impl SceneSettings {
    /// Parses settings from JSON. Missing fields fall back to defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes settings to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ---------------------------------------------------------------------------
// EditorSettings
// ---------------------------------------------------------------------------

/// Editor-level behaviour for duplicate / paste.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Appended to the display name of duplicated roots. `None` keeps the
    /// same name.
    pub duplicate_suffix: Option<String>,
    /// Replace the selection with the pasted / duplicated roots.
    pub select_duplicates: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            duplicate_suffix: None,
            select_duplicates: true,
        }
    }
}
