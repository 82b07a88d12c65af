use tracing::debug;

use crate::app::{Model, ToastLevel};
use crate::editor::EditInput;
use crate::widget::WidgetState;

/// Everything that can change the host's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A user edit routed to the editor.
    Edit(EditInput),
    /// Flip between editable and read-only.
    ToggleReadOnly,
    /// Write the current text to disk.
    Save,
    /// The file changed on disk; carries its new content.
    ExternalChange(String),
    /// Give a pending engine load a chance to complete.
    Tick,
    Resize(u16, u16),
    Quit,
}

/// Apply `msg` to `model`.
///
/// Saving is performed as a side effect by the event loop; here it only
/// exists so the loop can see it.
pub fn update(mut model: Model, msg: Message) -> Model {
    match msg {
        Message::Edit(input) => {
            if model.editor.handle_input(&input) {
                model.sync_props();
            }
            model.follow_cursor();
        }
        Message::ToggleReadOnly => {
            model.read_only = !model.read_only;
            model.sync_props();
            let label = if model.read_only {
                "Read-only"
            } else {
                "Editing"
            };
            model.show_toast(ToastLevel::Info, label);
        }
        Message::ExternalChange(content) => {
            debug!(path = %model.file_path.display(), bytes = content.len(), "external change");
            let dirty = model.is_dirty();
            model.set_text(content.clone());
            model.mark_saved(content);
            model.follow_cursor();
            let note = if dirty {
                "Reloaded from disk (local edits replaced)"
            } else {
                "Reloaded from disk"
            };
            model.show_toast(ToastLevel::Warning, note);
        }
        Message::Tick => {
            model.editor.tick();
            match model.take_state_change() {
                Some(WidgetState::Failed) => {
                    let reason = model
                        .editor
                        .failure()
                        .unwrap_or("unknown error")
                        .to_string();
                    model.show_toast(
                        ToastLevel::Warning,
                        format!("Engine unavailable, plain editing: {reason}"),
                    );
                }
                Some(WidgetState::Live) => model.follow_cursor(),
                Some(WidgetState::Loading) | None => {}
            }
        }
        Message::Resize(width, height) => {
            model.viewport = (width, height);
            model.follow_cursor();
        }
        Message::Quit => model.should_quit = true,
        Message::Save => {}
    }
    model
}
