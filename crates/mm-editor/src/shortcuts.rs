//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to canvas actions. `cmd` means ⌘ on macOS
//! and Ctrl elsewhere; either counts.

use crate::input::Modifiers;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── View ──
    ZoomIn,
    ZoomOut,
    ResetView,
    /// The alternating fit / expand control.
    ToggleFit,
    TogglePanMode,

    // ── Edit ──
    /// Collapse or expand the selected node.
    ToggleCollapse,
    DeleteSelected,
    Deselect,
}

pub struct ShortcutMap;

impl ShortcutMap {
    /// `key` is the `KeyboardEvent.key` value (e.g. `"f"`, `"Delete"`).
    pub fn resolve(key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        if modifiers.command() {
            return match key {
                "=" | "+" => Some(ShortcutAction::ZoomIn),
                "-" | "_" => Some(ShortcutAction::ZoomOut),
                "0" => Some(ShortcutAction::ResetView),
                _ => None,
            };
        }
        if modifiers.alt {
            return None;
        }

        match key {
            "f" | "F" => Some(ShortcutAction::ToggleFit),
            "h" | "H" => Some(ShortcutAction::TogglePanMode),
            "c" | "C" => Some(ShortcutAction::ToggleCollapse),
            "Delete" | "Backspace" => Some(ShortcutAction::DeleteSelected),
            "Escape" => Some(ShortcutAction::Deselect),
            _ => None,
        }
    }
}
