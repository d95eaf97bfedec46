//! Named UI commands and the dispatcher that binds them to handlers.
//!
//! Controls never look each other up. The presentation layer holds a
//! `CommandDispatcher` and calls `dispatch(name, editor)` from each button or
//! key binding; the dispatcher maps the name onto the registered handler.

use crate::editor::Editor;
use std::collections::HashMap;

/// The zero-argument commands exposed to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorCommand {
    ToggleText,
    PlayPause,
    Stop,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    IncreaseTextSize,
    DecreaseTextSize,
}

impl EditorCommand {
    pub const ALL: [EditorCommand; 9] = [
        EditorCommand::ToggleText,
        EditorCommand::PlayPause,
        EditorCommand::Stop,
        EditorCommand::MoveUp,
        EditorCommand::MoveDown,
        EditorCommand::MoveLeft,
        EditorCommand::MoveRight,
        EditorCommand::IncreaseTextSize,
        EditorCommand::DecreaseTextSize,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EditorCommand::ToggleText => "toggle-text",
            EditorCommand::PlayPause => "play-pause",
            EditorCommand::Stop => "stop",
            EditorCommand::MoveUp => "move-up",
            EditorCommand::MoveDown => "move-down",
            EditorCommand::MoveLeft => "move-left",
            EditorCommand::MoveRight => "move-right",
            EditorCommand::IncreaseTextSize => "increase-text-size",
            EditorCommand::DecreaseTextSize => "decrease-text-size",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),
}

/// A registered command callback.
pub type CommandHandler = Box<dyn Fn(&mut Editor)>;

/// Maps command names to handlers.
pub struct CommandDispatcher {
    handlers: HashMap<String, CommandHandler>,
}

impl Default for CommandDispatcher {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl CommandDispatcher {
    /// A dispatcher with no handlers.
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// A dispatcher with every `EditorCommand` bound to the matching editor
    /// operation.
    pub fn with_defaults() -> Self {
        let mut dispatcher = Self::empty();
        for command in EditorCommand::ALL {
            dispatcher.register(command.name(), move |editor: &mut Editor| {
                editor.execute(command)
            });
        }
        dispatcher
    }

    /// Bind `name` to `handler`, returning the handler it replaces.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: impl Fn(&mut Editor) + 'static,
    ) -> Option<CommandHandler> {
        self.handlers.insert(name.into(), Box::new(handler))
    }

    pub fn unregister(&mut self, name: &str) -> Option<CommandHandler> {
        self.handlers.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Run the handler registered for `name`.
    pub fn dispatch(&self, name: &str, editor: &mut Editor) -> Result<(), DispatchError> {
        let handler = self.handlers.get(name).ok_or_else(|| {
            log::warn!("unknown command {name:?}");
            DispatchError::UnknownCommand(name.to_owned())
        })?;
        handler(editor);
        Ok(())
    }

    pub fn dispatch_command(
        &self,
        command: EditorCommand,
        editor: &mut Editor,
    ) -> Result<(), DispatchError> {
        self.dispatch(command.name(), editor)
    }
}
