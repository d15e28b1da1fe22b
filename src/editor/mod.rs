//! Editor-side state over a [`Scene`](crate::scene::Scene).
//!
//! Nothing here draws anything: the types model what the hierarchy panel
//! shows and the edits it requests, so any immediate-mode UI can drive them.

pub mod clipboard;
pub mod commands;
pub mod context;
pub mod panel;
pub mod selection;

pub use clipboard::{Clipboard, ClipboardMode};
pub use commands::{CommandQueue, HierarchyCommand};
pub use context::{EditorContext, SelectionPivot};
pub use panel::HierarchyRow;
pub use selection::SelectionSet;
