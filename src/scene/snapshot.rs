//! Flat scene records for serialization.
//!
//! A [`SceneSnapshot`] lists entities parent before child, each with a
//! snapshot-local id and an optional parent id. Entity handles are not
//! stored: loading a snapshot rebuilds an isomorphic tree with fresh
//! handles. Persistent identity travels in the `uuid` field.

use glam::{Quat, Vec3};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ecs::Entity;
use crate::errors::{Result, SceneError};
use crate::scene::components::{Active, EntityId, Prefab};
use crate::scene::hierarchy;
use crate::scene::scene::Scene;
use crate::scene::transform::Transform;
use crate::settings::SceneSettings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformRecord {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl From<&Transform> for TransformRecord {
    fn from(t: &Transform) -> Self {
        Self {
            position: t.position,
            rotation: t.rotation,
            scale: t.scale,
        }
    }
}

impl From<&TransformRecord> for Transform {
    fn from(r: &TransformRecord) -> Self {
        Transform::from_trs(r.position, r.rotation, r.scale)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Snapshot-local id, unique within one snapshot.
    pub id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefab: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformRecord>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub name: String,
    pub entities: Vec<EntityRecord>,
}

impl SceneSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Checks ids are unique and every parent is listed before its child.
    pub fn validate(&self) -> Result<()> {
        let mut seen: FxHashSet<u32> = FxHashSet::default();
        for record in &self.entities {
            if let Some(parent) = record.parent
                && !seen.contains(&parent)
            {
                return Err(SceneError::Snapshot(format!(
                    "entity {} references parent {parent} that is not listed before it",
                    record.id
                )));
            }
            if !seen.insert(record.id) {
                return Err(SceneError::Snapshot(format!("duplicate entity id {}", record.id)));
            }
        }
        Ok(())
    }
}

impl Scene {
    /// Captures every entity in pre-order (roots in creation order, children
    /// head first).
    #[must_use]
    pub fn snapshot(&self) -> SceneSnapshot {
        let mut order = Vec::with_capacity(self.len());
        for root in self.roots() {
            order.push(root);
            order.extend(self.descendants(root));
        }

        let ids: FxHashMap<Entity, u32> = order
            .iter()
            .enumerate()
            .map(|(i, &e)| (e, u32::try_from(i).unwrap_or(u32::MAX)))
            .collect();

        let registry = self.registry();
        let entities = order
            .iter()
            .map(|&e| EntityRecord {
                id: ids.get(&e).copied().unwrap_or(u32::MAX),
                parent: self.parent(e).and_then(|p| ids.get(&p).copied()),
                uuid: self.entity_id(e),
                name: self.name_of(e).map(str::to_owned),
                active: registry.get::<Active>(e).map(|a| a.0),
                prefab: registry.get::<Prefab>(e).map(|p| p.source.clone()),
                transform: registry.get::<Transform>(e).map(TransformRecord::from),
            })
            .collect();

        SceneSnapshot {
            name: self.name().to_owned(),
            entities,
        }
    }

    /// Builds a new scene from `snapshot`.
    pub fn from_snapshot(snapshot: &SceneSnapshot, settings: SceneSettings) -> Result<Self> {
        let mut scene = Scene::with_settings(snapshot.name.clone(), settings);
        scene.load_snapshot(snapshot)?;
        Ok(scene)
    }

    /// Adds the entities of `snapshot` to this scene. Returns the created
    /// entities in record order.
    ///
    /// The snapshot is validated first; on error nothing is created.
    pub fn load_snapshot(&mut self, snapshot: &SceneSnapshot) -> Result<Vec<Entity>> {
        snapshot.validate()?;

        let mut created = Vec::with_capacity(snapshot.entities.len());
        let mut by_id: FxHashMap<u32, Entity> = FxHashMap::default();
        for record in &snapshot.entities {
            let entity = match &record.name {
                Some(name) => self.create_named(name.as_str()),
                None => self.create_entity(),
            };
            let registry = self.registry_mut();
            if let Some(uuid) = record.uuid {
                registry.insert_or_replace(entity, EntityId(uuid))?;
            }
            if let Some(active) = record.active {
                registry.insert_or_replace(entity, Active(active))?;
            }
            if let Some(source) = &record.prefab {
                registry.insert_or_replace(entity, Prefab { source: source.clone() })?;
            }
            if let Some(transform) = &record.transform {
                registry.insert_or_replace(entity, Transform::from(transform))?;
            }
            by_id.insert(record.id, entity);
            created.push(entity);
        }

        // Reverse order links the last sibling first; head insertion restores
        // record order.
        for (record, &entity) in snapshot.entities.iter().zip(&created).rev() {
            if let Some(parent) = record.parent.and_then(|p| by_id.get(&p).copied()) {
                hierarchy::link_as_first_child(self.registry_mut(), entity, parent)?;
            }
        }

        log::info!(
            "Loaded {} entities from snapshot '{}' into scene '{}'",
            created.len(),
            snapshot.name,
            self.name()
        );
        Ok(created)
    }
}
