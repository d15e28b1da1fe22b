use slotmap::{SlotMap, new_key_type};

use crate::errors::{Result, SceneError};
use crate::scene::Scene;

new_key_type! {
    pub struct SceneHandle;
}

/// Owns the loaded scenes and decides which one is active.
///
/// Switching is deferred: `switch_*` only queues the target and
/// [`SceneManager::apply_scene_switch`] performs it at a frame boundary, so
/// nothing holding entity handles of the old scene observes a half-switched
/// state mid-frame.
pub struct SceneManager {
    scenes: SlotMap<SceneHandle, Scene>,
    /// Registration order, used for index based switching.
    order: Vec<SceneHandle>,
    active_scene: Option<SceneHandle>,
    queued: Option<SceneHandle>,
}

impl SceneManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            scenes: SlotMap::with_key(),
            order: Vec::new(),
            active_scene: None,
            queued: None,
        }
    }

    /// Registers `scene` and returns its handle. The active scene is not
    /// changed.
    pub fn enqueue_scene(&mut self, scene: Scene) -> SceneHandle {
        log::info!("Enqueued scene '{}'", scene.name());
        let handle = self.scenes.insert(scene);
        self.order.push(handle);
        handle
    }

    pub fn create_scene(&mut self, name: &str) -> SceneHandle {
        self.enqueue_scene(Scene::new(name))
    }

    /// Creates a scene and makes it active immediately.
    pub fn create_active(&mut self, name: &str) -> &mut Scene {
        let handle = self.create_scene(name);
        self.active_scene = Some(handle);
        &mut self.scenes[handle]
    }

    /// Drops a scene and everything in it. Returns `false` for unknown
    /// handles.
    pub fn remove_scene(&mut self, handle: SceneHandle) -> bool {
        let Some(scene) = self.scenes.remove(handle) else {
            return false;
        };
        self.order.retain(|&h| h != handle);
        if self.queued == Some(handle) {
            self.queued = None;
        }
        if self.active_scene == Some(handle) {
            self.active_scene = None;
            log::warn!("Active scene '{}' was removed", scene.name());
        }
        true
    }

    /// Activates `handle` immediately, bypassing the switch queue.
    pub fn set_active(&mut self, handle: SceneHandle) {
        if self.scenes.contains_key(handle) {
            self.active_scene = Some(handle);
        } else {
            log::error!("Attempted to set invalid SceneHandle as active.");
        }
    }

    // ========================================================================
    // Deferred switching
    // ========================================================================

    /// Queues a switch to the scene registered at `index`.
    pub fn switch_to_index(&mut self, index: usize) -> Result<()> {
        let handle = self
            .order
            .get(index)
            .copied()
            .ok_or(SceneError::SceneIndexOutOfBounds { index, count: self.order.len() })?;
        self.queued = Some(handle);
        Ok(())
    }

    /// Queues a switch to the first scene called `name`.
    pub fn switch_to_name(&mut self, name: &str) -> Result<()> {
        let index = self
            .order
            .iter()
            .position(|&h| self.scenes.get(h).is_some_and(|s| s.name() == name))
            .ok_or_else(|| SceneError::SceneNotFound(name.to_string()))?;
        self.switch_to_index(index)
    }

    /// Queues a switch to the scene after the active one, wrapping around.
    pub fn switch_next(&mut self) {
        if self.order.is_empty() {
            return;
        }
        let next = self.current_index().map_or(0, |i| (i + 1) % self.order.len());
        self.queued = Some(self.order[next]);
    }

    #[must_use]
    pub fn is_switching(&self) -> bool {
        self.queued.is_some()
    }

    /// Performs a queued switch. Returns the newly active handle if a switch
    /// happened.
    pub fn apply_scene_switch(&mut self) -> Option<SceneHandle> {
        let handle = self.queued.take()?;
        let scene = self.scenes.get(handle)?;
        log::info!("Switched to scene '{}'", scene.name());
        self.active_scene = Some(handle);
        Some(handle)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[must_use]
    pub fn scene_names(&self) -> Vec<&str> {
        self.order
            .iter()
            .filter_map(|&h| self.scenes.get(h))
            .map(Scene::name)
            .collect()
    }

    #[must_use]
    pub fn scene_count(&self) -> usize {
        self.order.len()
    }

    /// Registration index of the active scene.
    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        let active = self.active_scene?;
        self.order.iter().position(|&h| h == active)
    }

    #[must_use]
    pub fn handle_at(&self, index: usize) -> Option<SceneHandle> {
        self.order.get(index).copied()
    }

    #[must_use]
    pub fn active_handle(&self) -> Option<SceneHandle> {
        self.active_scene
    }

    #[must_use]
    pub fn get_scene(&self, handle: SceneHandle) -> Option<&Scene> {
        self.scenes.get(handle)
    }

    pub fn get_scene_mut(&mut self, handle: SceneHandle) -> Option<&mut Scene> {
        self.scenes.get_mut(handle)
    }

    #[must_use]
    pub fn active_scene(&self) -> Option<&Scene> {
        self.active_scene.and_then(|h| self.scenes.get(h))
    }

    pub fn active_scene_mut(&mut self) -> Option<&mut Scene> {
        self.active_scene.and_then(|h| self.scenes.get_mut(h))
    }
}

impl Default for SceneManager {
    fn default() -> Self {
        Self::new()
    }
}
