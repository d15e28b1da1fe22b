//! Deferred hierarchy edits.
//!
//! The hierarchy panel walks the tree while drawing it, so it cannot splice
//! links mid-walk. It records what the user asked for instead, and the
//! queue is applied in order once the walk is done
//! (see [`EditorContext::apply_commands`](crate::editor::EditorContext::apply_commands)).

use crate::ecs::Entity;

/// One structural or selection edit requested from the editor UI.
#[derive(Debug, Clone, PartialEq)]
pub enum HierarchyCommand {
    /// Moves `entity` using the scene's reparent mode.
    Reparent { entity: Entity, new_parent: Option<Entity> },
    /// Drag-drop of `entity` onto `target` (or the root area with `None`).
    /// Checked against the panel drop rules; the dragged entity is
    /// unselected.
    Drop { entity: Entity, target: Option<Entity> },
    /// Makes `entity` a root, keeping its subtree.
    Detach(Entity),
    /// Destroys `entity` and its subtree.
    Destroy(Entity),
    DestroySelected,
    /// Copies `entity` next to the original.
    Duplicate(Entity),
    DuplicateSelected,
    CreateChild { parent: Option<Entity>, name: Option<String> },
    Rename { entity: Entity, name: String },
    CopySelected,
    CutSelected,
    Paste { target_parent: Option<Entity> },
    /// Row click; `additive` when ctrl/cmd is held.
    Click { entity: Entity, additive: bool },
    Select(Entity),
    Unselect(Entity),
    ClearSelection,
}

/// FIFO of pending [`HierarchyCommand`]s.
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    commands: Vec<HierarchyCommand>,
}

impl CommandQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: HierarchyCommand) {
        self.commands.push(command);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    #[must_use]
    pub fn pending(&self) -> &[HierarchyCommand] {
        &self.commands
    }

    /// Takes every queued command, oldest first.
    pub fn take(&mut self) -> Vec<HierarchyCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}
