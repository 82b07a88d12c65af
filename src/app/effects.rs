use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::warn;

use crate::app::{App, Message, Model, ToastLevel};
use crate::watcher::FileWatcher;

const WATCH_DEBOUNCE: Duration = Duration::from_millis(200);

impl App {
    pub(super) fn make_file_watcher(path: &Path) -> notify::Result<FileWatcher> {
        FileWatcher::new(path, WATCH_DEBOUNCE)
    }

    pub(super) fn handle_message_side_effects(
        model: &mut Model,
        file_watcher: &mut Option<FileWatcher>,
        msg: &Message,
    ) {
        if matches!(msg, Message::Save) {
            match Self::save(model, file_watcher.as_mut()) {
                Ok(bytes) => model.show_toast(ToastLevel::Info, format!("Saved {bytes} bytes")),
                Err(err) => {
                    warn!(path = %model.file_path.display(), error = %err, "save failed");
                    model.show_toast(ToastLevel::Error, format!("Save failed: {err:#}"));
                }
            }
        }
    }

    fn save(model: &mut Model, watcher: Option<&mut FileWatcher>) -> Result<usize> {
        let text = model.text();
        if let Some(watcher) = watcher {
            watcher.note_written(&text);
        }
        fs::write(&model.file_path, &text)
            .with_context(|| format!("Failed to write {}", model.file_path.display()))?;
        let bytes = text.len();
        model.mark_saved(text);
        Ok(bytes)
    }
}
