pub mod commands;
pub mod editor;
pub mod input;
pub mod playback;
pub mod shortcuts;
pub mod sync;
pub mod text_edit;
pub mod tools;
pub mod transform;

pub use commands::{CommandDispatcher, DispatchError, EditorCommand};
pub use editor::{AssetRequest, AssetSlot, Editor, LoadTicket, LoadedAsset};
pub use input::{InputEvent, Modifiers};
pub use playback::{PlaybackState, PlaybackStatus};
pub use sync::{GraphMutation, SyncEngine};
pub use text_edit::OverlayInputState;
pub use transform::Direction;
