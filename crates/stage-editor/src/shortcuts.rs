//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to the same `EditorCommand`s the on-screen
//! controls dispatch. The shortcut map lives in Rust so it's shared across
//! WASM and native hosts.
//!
//! - Arrows = move the text one step
//! - `+` / `-` = grow / shrink the text
//! - Space = play / pause, `s` = stop
//! - `t` = toggle the text label

use crate::commands::EditorCommand;

/// Resolves key events into editor commands.
///
/// Any ⌘/Ctrl/Alt combo is left to the host (browser shortcuts, IME), so
/// only bare keys resolve. Shift is tolerated because `+` needs it on most
/// layouts.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to a command.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"ArrowUp"`, `"+"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(
        key: &str,
        ctrl: bool,
        _shift: bool,
        alt: bool,
        meta: bool,
    ) -> Option<EditorCommand> {
        if ctrl || meta || alt {
            return None;
        }

        match key {
            "ArrowUp" => Some(EditorCommand::MoveUp),
            "ArrowDown" => Some(EditorCommand::MoveDown),
            "ArrowLeft" => Some(EditorCommand::MoveLeft),
            "ArrowRight" => Some(EditorCommand::MoveRight),
            "+" | "=" => Some(EditorCommand::IncreaseTextSize),
            "-" | "_" => Some(EditorCommand::DecreaseTextSize),
            " " => Some(EditorCommand::PlayPause),
            "s" | "S" => Some(EditorCommand::Stop),
            "t" | "T" => Some(EditorCommand::ToggleText),
            _ => None,
        }
    }
}
