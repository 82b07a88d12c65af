use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::engine::{ChangeCallback, EngineOptions};
use crate::host::HostSurface;
use crate::loader::ResourceLoader;
use crate::widget::{EditorProps, EditorView, MarkdownEditor, WidgetState};

const TOAST_DURATION: Duration = Duration::from_secs(4);

/// Rows reserved below the editor for the status and toast bars.
pub(super) const FOOTER_ROWS: u16 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// Host state.
pub struct Model {
    pub file_path: PathBuf,
    pub editor: MarkdownEditor,
    pub read_only: bool,
    pub watch_enabled: bool,
    pub should_quit: bool,
    /// First visible line.
    pub scroll_offset: usize,
    /// Terminal size as (width, height).
    pub viewport: (u16, u16),
    text: Rc<RefCell<String>>,
    saved: String,
    on_change: ChangeCallback,
    options: EngineOptions,
    toast: Option<Toast>,
    last_state: WidgetState,
}

impl Model {
    /// Mount an editor for `text` and wire its change callback into the
    /// model.
    pub fn new(
        file_path: PathBuf,
        text: String,
        loader: Arc<ResourceLoader>,
        read_only: bool,
        options: EngineOptions,
    ) -> Self {
        let shared = Rc::new(RefCell::new(text.clone()));
        let sink = Rc::clone(&shared);
        let on_change: ChangeCallback = Rc::new(move |value: &str| {
            value.clone_into(&mut sink.borrow_mut());
        });

        let surface_id = file_path
            .file_name()
            .map_or_else(|| "untitled".to_string(), |name| name.to_string_lossy().to_string());
        let props = EditorProps::new(text.clone(), Rc::clone(&on_change))
            .with_read_only(read_only)
            .with_options(options.clone());
        let editor = MarkdownEditor::mount(props, HostSurface::textarea(surface_id), loader);

        Self {
            file_path,
            editor,
            read_only,
            watch_enabled: false,
            should_quit: false,
            scroll_offset: 0,
            viewport: (80, 24),
            text: shared,
            saved: text,
            on_change,
            options,
            toast: None,
            last_state: WidgetState::Loading,
        }
    }

    /// The text the host currently owns.
    pub fn text(&self) -> String {
        self.text.borrow().clone()
    }

    /// Adopt `text` as the owned value, as if it came from outside the
    /// editor.
    pub fn set_text(&mut self, text: String) {
        *self.text.borrow_mut() = text;
        self.sync_props();
    }

    pub fn is_dirty(&self) -> bool {
        *self.text.borrow() != self.saved
    }

    pub(super) fn mark_saved(&mut self, text: String) {
        self.saved = text;
    }

    /// Hand the current owned state back to the editor.
    pub(super) fn sync_props(&mut self) {
        let props = EditorProps::new(self.text(), Rc::clone(&self.on_change))
            .with_read_only(self.read_only)
            .with_options(self.options.clone());
        self.editor.set_props(props);
    }

    /// Returns the new state when the editor's state changed since the last
    /// call.
    pub(super) fn take_state_change(&mut self) -> Option<WidgetState> {
        let state = self.editor.state();
        if state == self.last_state {
            return None;
        }
        self.last_state = state;
        Some(state)
    }

    pub(super) fn editor_height(&self) -> usize {
        usize::from(self.viewport.1.saturating_sub(FOOTER_ROWS + 1))
    }

    /// Scroll so the cursor line is visible.
    pub(super) fn follow_cursor(&mut self) {
        let cursor_line = match self.editor.view() {
            EditorView::Engine(view) | EditorView::Fallback(view) | EditorView::Loading(view) => {
                view.cursor.line
            }
        };
        let height = self.editor_height().max(1);
        if cursor_line < self.scroll_offset {
            self.scroll_offset = cursor_line;
        } else if cursor_line >= self.scroll_offset + height {
            self.scroll_offset = cursor_line + 1 - height;
        }
    }

    pub(super) fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + TOAST_DURATION,
        });
    }

    /// Drop an expired toast. Returns `true` if one was removed.
    pub(super) fn expire_toast(&mut self, now: Instant) -> bool {
        if self.toast.as_ref().is_some_and(|toast| toast.expires_at <= now) {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn active_toast(&self) -> Option<(ToastLevel, &str)> {
        self.toast
            .as_ref()
            .map(|toast| (toast.level, toast.message.as_str()))
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("file_path", &self.file_path)
            .field("editor", &self.editor)
            .field("read_only", &self.read_only)
            .field("dirty", &self.is_dirty())
            .finish_non_exhaustive()
    }
}
