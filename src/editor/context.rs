use glam::{Affine3A, Vec3};

use crate::ecs::Entity;
use crate::editor::clipboard::Clipboard;
use crate::editor::commands::{CommandQueue, HierarchyCommand};
use crate::editor::panel;
use crate::editor::selection::SelectionSet;
use crate::errors::{Result, SceneError};
use crate::scene::{Scene, Transform};
use crate::settings::EditorSettings;

/// Average pose of the selected spatial entities, used as the gizmo origin
/// for multi-selections.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionPivot {
    /// Mean world position.
    pub position: Vec3,
    /// Mean local scale.
    pub scale: Vec3,
    /// Number of entities that contributed.
    pub count: usize,
}

impl SelectionPivot {
    #[must_use]
    pub fn matrix(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, glam::Quat::IDENTITY, self.position)
    }
}

/// Editor state threaded through the UI handlers: selection, clipboard and
/// the queue of edits recorded during the hierarchy walk.
///
/// It refers to entities of whichever scene is passed in; call
/// [`EditorContext::on_scene_changed`] after switching scenes.
#[derive(Debug, Default)]
pub struct EditorContext {
    pub selection: SelectionSet,
    pub clipboard: Clipboard,
    pub settings: EditorSettings,
    queue: CommandQueue,
}

impl EditorContext {
    #[must_use]
    pub fn new(settings: EditorSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    // ========================================================================
    // Deferred edits
    // ========================================================================

    /// Records an edit to run on the next [`EditorContext::apply_commands`].
    pub fn push(&mut self, command: HierarchyCommand) {
        self.queue.push(command);
    }

    #[must_use]
    pub fn pending(&self) -> &[HierarchyCommand] {
        self.queue.pending()
    }

    /// Runs the queued commands in order against `scene`.
    ///
    /// A failing command is logged and skipped; the errors are returned.
    pub fn apply_commands(&mut self, scene: &mut Scene) -> Vec<SceneError> {
        let mut errors = Vec::new();
        for command in self.queue.take() {
            if let Err(err) = self.execute(scene, command) {
                log::warn!("Hierarchy edit rejected: {err}");
                errors.push(err);
            }
        }
        self.selection.prune(scene);
        errors
    }

    /// Runs one command immediately.
    pub fn execute(&mut self, scene: &mut Scene, command: HierarchyCommand) -> Result<()> {
        match command {
            HierarchyCommand::Reparent { entity, new_parent } => scene.reparent(entity, new_parent)?,
            HierarchyCommand::Drop { entity, target } => self.drop_entity(scene, entity, target)?,
            HierarchyCommand::Detach(entity) => scene.detach(entity)?,
            HierarchyCommand::Destroy(entity) => {
                scene.destroy_subtree(entity);
                self.selection.prune(scene);
            }
            HierarchyCommand::DestroySelected => {
                self.delete_selected(scene);
            }
            HierarchyCommand::Duplicate(entity) => {
                if let Some(copy) = self.duplicate_one(scene, entity)
                    && self.settings.select_duplicates
                {
                    self.selection.set_single(scene, copy);
                }
            }
            HierarchyCommand::DuplicateSelected => {
                self.duplicate_selected(scene);
            }
            HierarchyCommand::CreateChild { parent, name } => {
                if let Some(child) = self.create_child(scene, parent, name.as_deref()) {
                    self.selection.set_single(scene, child);
                }
            }
            HierarchyCommand::Rename { entity, name } => {
                scene.rename(entity, name);
            }
            HierarchyCommand::CopySelected => self.copy_selected(scene),
            HierarchyCommand::CutSelected => self.cut_selected(scene),
            HierarchyCommand::Paste { target_parent } => {
                self.paste(scene, target_parent)?;
            }
            HierarchyCommand::Click { entity, additive } => self.selection.click(scene, entity, additive),
            HierarchyCommand::Select(entity) => {
                self.selection.select(scene, entity);
            }
            HierarchyCommand::Unselect(entity) => {
                self.selection.unselect(entity);
            }
            HierarchyCommand::ClearSelection => self.selection.clear(),
        }
        Ok(())
    }

    // ========================================================================
    // Structural actions
    // ========================================================================

    /// Drag-drop onto a row (`Some`) or the empty area (`None`). Moves that
    /// break the drop rules are ignored; the dragged entity is unselected
    /// either way.
    pub fn drop_entity(&mut self, scene: &mut Scene, entity: Entity, target: Option<Entity>) -> Result<()> {
        self.selection.unselect(entity);
        let accepted = match target {
            Some(target) => panel::can_drop_onto(scene, entity, target),
            None => panel::can_drop_to_root(scene, entity),
        };
        if !accepted {
            log::debug!("Ignoring drop of {entity:?} onto {target:?}");
            return Ok(());
        }
        scene.reparent(entity, target)
    }

    /// Creates an entity, as a child of `parent` when given.
    pub fn create_child(&mut self, scene: &mut Scene, parent: Option<Entity>, name: Option<&str>) -> Option<Entity> {
        match (parent, name) {
            (Some(parent), _) => scene.create_child(parent, name),
            (None, Some(name)) => Some(scene.create_named(name)),
            (None, None) => Some(scene.create_entity()),
        }
    }

    /// Destroys the selected subtrees. Returns the number of destroyed
    /// entities.
    pub fn delete_selected(&mut self, scene: &mut Scene) -> usize {
        let destroyed = self
            .selection
            .top_level(scene)
            .into_iter()
            .map(|e| scene.destroy_subtree(e))
            .sum();
        self.selection.clear();
        destroyed
    }

    /// Duplicates each selected subtree next to its original (same parent).
    pub fn duplicate_selected(&mut self, scene: &mut Scene) -> Vec<Entity> {
        let copies: Vec<Entity> = self
            .selection
            .top_level(scene)
            .into_iter()
            .filter_map(|e| self.duplicate_one(scene, e))
            .collect();
        if self.settings.select_duplicates && !copies.is_empty() {
            self.selection.set(scene, copies.iter().copied());
        }
        copies
    }

    fn duplicate_one(&self, scene: &mut Scene, entity: Entity) -> Option<Entity> {
        let parent = scene.parent(entity);
        let copy = scene.duplicate_entity(entity, parent)?;
        if let Some(suffix) = &self.settings.duplicate_suffix {
            let name = format!("{}{suffix}", panel::display_name(scene, entity));
            scene.rename(copy, name);
        }
        Some(copy)
    }

    pub fn copy_selected(&mut self, scene: &Scene) {
        self.clipboard.copy(self.selection.iter(scene));
    }

    pub fn cut_selected(&mut self, scene: &Scene) {
        self.clipboard.cut(self.selection.iter(scene));
    }

    /// Pastes the clipboard under `target_parent`. See [`Clipboard::paste`].
    pub fn paste(&mut self, scene: &mut Scene, target_parent: Option<Entity>) -> Result<Vec<Entity>> {
        let pasted = self.clipboard.paste(scene, target_parent)?;
        self.selection.prune(scene);
        if self.settings.select_duplicates && !pasted.is_empty() {
            self.selection.set(scene, pasted.iter().copied());
        }
        Ok(pasted)
    }

    // ========================================================================
    // Gizmo & camera helpers
    // ========================================================================

    /// Mean world position and local scale of the selected entities that
    /// carry a `Transform`. `None` if there are none.
    #[must_use]
    pub fn selection_pivot(&self, scene: &Scene) -> Option<SelectionPivot> {
        let mut position = Vec3::ZERO;
        let mut scale = Vec3::ZERO;
        let mut count = 0usize;
        for entity in self.selection.iter(scene) {
            let Some(transform) = scene.registry().get::<Transform>(entity) else {
                continue;
            };
            position += scene.world_position(entity).unwrap_or_default();
            scale += transform.scale;
            count += 1;
        }
        if count == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let n = count as f32;
        Some(SelectionPivot {
            position: position / n,
            scale: scale / n,
            count,
        })
    }

    /// Applies a gizmo delta (`new_pivot * old_pivot.inverse()`) to the local
    /// transform of every selected spatial entity.
    pub fn apply_gizmo_delta(&mut self, scene: &mut Scene, delta: Affine3A) {
        for entity in self.selection.top_level(scene) {
            let Some(transform) = scene.registry_mut().get_mut::<Transform>(entity) else {
                continue;
            };
            let local = delta * transform.compute_local_matrix();
            transform.apply_local_matrix(local);
            scene.update_subtree(entity);
        }
    }

    /// World position the editor camera should frame for `entity`.
    #[must_use]
    pub fn focus_target(&self, scene: &Scene, entity: Entity) -> Option<Vec3> {
        scene
            .registry()
            .has::<Transform>(entity)
            .then(|| scene.world_position(entity))
            .flatten()
    }

    /// Forgets every handle of the previous scene.
    pub fn on_scene_changed(&mut self) {
        self.selection.clear();
        self.clipboard.clear();
        self.queue.clear();
    }
}
