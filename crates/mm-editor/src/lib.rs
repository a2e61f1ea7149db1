pub mod canvas;
pub mod entity_editor;
pub mod error;
pub mod generation;
pub mod input;
pub mod interaction;
pub mod notify;
pub mod shortcuts;
pub mod store;
pub mod viewport;

pub use canvas::{CanvasEvent, MindMapCanvas};
pub use entity_editor::{EnhanceRequest, EntityEditor};
pub use error::{EditorError, GenerationError, StoreError};
pub use generation::GenerationService;
pub use input::{InputEvent, Modifiers, PointerButton};
pub use interaction::{InteractionController, InteractionOutcome, InteractionState};
pub use notify::{Notification, NotificationLevel};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use store::{InMemoryStore, MindMapStore, StoreCommand};
pub use viewport::ViewportController;
