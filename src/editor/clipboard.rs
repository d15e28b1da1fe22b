use smallvec::SmallVec;

use crate::ecs::Entity;
use crate::editor::selection::top_level;
use crate::errors::{Result, SceneError};
use crate::scene::Scene;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClipboardMode {
    #[default]
    Copy,
    /// Originals are destroyed once pasted.
    Cut,
}

/// Entities copied or cut for a later paste.
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    entries: SmallVec<[Entity; 8]>,
    mode: ClipboardMode,
}

impl Clipboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn copy(&mut self, entities: impl IntoIterator<Item = Entity>) {
        self.fill(entities, ClipboardMode::Copy);
    }

    pub fn cut(&mut self, entities: impl IntoIterator<Item = Entity>) {
        self.fill(entities, ClipboardMode::Cut);
    }

    fn fill(&mut self, entities: impl IntoIterator<Item = Entity>, mode: ClipboardMode) {
        self.entries.clear();
        for entity in entities {
            if !self.entries.contains(&entity) {
                self.entries.push(entity);
            }
        }
        self.mode = mode;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.mode = ClipboardMode::Copy;
    }

    #[must_use]
    pub fn mode(&self) -> ClipboardMode {
        self.mode
    }

    #[must_use]
    pub fn is_cut(&self) -> bool {
        self.mode == ClipboardMode::Cut
    }

    #[must_use]
    pub fn entries(&self) -> &[Entity] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether at least one entry is still alive in `scene`.
    #[must_use]
    pub fn can_paste(&self, scene: &Scene) -> bool {
        self.entries.iter().any(|&e| scene.valid(e))
    }

    /// Duplicates every live entry under `target_parent` (roots with `None`)
    /// and returns the copies.
    ///
    /// Entries nested under another entry are copied as part of that entry's
    /// subtree only. After a cut, the originals are destroyed and the
    /// clipboard is emptied; pasting a cut entry into its own subtree is
    /// rejected because the destroy would take the copy with it.
    ///
    /// A stale `target_parent` is ignored: nothing is copied and a cut
    /// keeps its originals.
    pub fn paste(&mut self, scene: &mut Scene, target_parent: Option<Entity>) -> Result<Vec<Entity>> {
        if let Some(target) = target_parent
            && !scene.valid(target)
        {
            log::debug!("Ignoring paste under stale entity {target:?}");
            return Ok(Vec::new());
        }

        self.entries.retain(|e| scene.valid(*e));
        let sources = top_level(scene, &self.entries);

        if self.is_cut()
            && let Some(target) = target_parent
            && let Some(&source) = sources
                .iter()
                .find(|&&s| s == target || scene.is_ancestor_of(s, target))
        {
            log::warn!("Cannot paste cut entity {source:?} into its own subtree");
            return Err(SceneError::WouldCreateCycle { entity: source, new_parent: target });
        }

        let mut pasted = Vec::with_capacity(sources.len());
        let mut copied = SmallVec::<[Entity; 8]>::new();
        for &source in &sources {
            if let Some(copy) = scene.duplicate_entity(source, target_parent) {
                pasted.push(copy);
                copied.push(source);
            }
        }

        if self.is_cut() {
            // Only originals that now have a copy may go.
            for &source in &copied {
                scene.destroy_subtree(source);
            }
            self.clear();
        }
        log::trace!("Pasted {} entities under {target_parent:?}", pasted.len());
        Ok(pasted)
    }
}
