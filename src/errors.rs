//! Error Types
//!
//! This module defines the error types used throughout the scene graph.
//!
//! # Overview
//!
//! The main error type [`SceneError`] covers the recoverable failure modes:
//! - Stale or foreign entity handles
//! - Component table misuse (double add, missing component)
//! - Structural violations (reparenting into a descendant)
//! - Partial failures while duplicating component data
//! - Scene switching and snapshot decoding errors
//!
//! Stale handles are *not* errors for destroy/unselect/reparent requests: those
//! are silently ignored because the editor UI routinely outlives the entities
//! it refers to by one frame.
//!
//! # Usage
//!
//! ```rust,ignore
//! use arbor::errors::{SceneError, Result};
//!
//! fn move_under(scene: &mut Scene, child: Entity, parent: Entity) -> Result<()> {
//!     scene.reparent(child, Some(parent))
//! }
//! ```

use thiserror::Error;

use crate::ecs::Entity;

/// The main error type for scene graph operations.
#[derive(Error, Debug)]
pub enum SceneError {
    // ========================================================================
    // Handle & Component Errors
    // ========================================================================
    /// The handle does not refer to a live entity of this registry.
    #[error("Invalid entity handle: {0:?}")]
    InvalidEntity(Entity),

    /// Tried to attach a component type the entity already carries.
    #[error("Entity {entity:?} already has component `{component}`")]
    ComponentAlreadyPresent {
        /// The entity that was targeted
        entity: Entity,
        /// Component type name
        component: &'static str,
    },

    /// A required component is not attached.
    #[error("Entity {entity:?} has no component `{component}`")]
    ComponentMissing {
        /// The entity that was targeted
        entity: Entity,
        /// Component type name
        component: &'static str,
    },

    // ========================================================================
    // Structural Errors
    // ========================================================================
    /// Reparenting would make an entity its own ancestor.
    #[error("Reparenting {entity:?} under {new_parent:?} would create a cycle")]
    WouldCreateCycle {
        /// The entity being moved
        entity: Entity,
        /// The rejected parent
        new_parent: Entity,
    },

    /// A component refused to be cloned into a new owner.
    #[error("Failed to clone component `{component}`: {reason}")]
    CloneFailed {
        /// Component type name
        component: &'static str,
        /// Human readable cause
        reason: String,
    },

    // ========================================================================
    // Scene Management Errors
    // ========================================================================
    /// No scene with the given name is registered.
    #[error("Scene not found: {0}")]
    SceneNotFound(String),

    /// Scene index out of bounds.
    #[error("Scene index out of bounds: {index} (count: {count})")]
    SceneIndexOutOfBounds {
        /// The requested index
        index: usize,
        /// Number of registered scenes
        count: usize,
    },

    // ========================================================================
    // Snapshot Errors
    // ========================================================================
    /// A snapshot is structurally inconsistent.
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// JSON encoding or decoding error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Alias for `Result<T, SceneError>`.
pub type Result<T> = std::result::Result<T, SceneError>;
