use crate::editor::{EditInput, EditorBuffer};
use crate::engine::{ChangeCallback, SurfaceView};

/// Plain text input used when the engine cannot be loaded or constructed.
///
/// Accepts plain editing only. Undo and toolbar inputs are ignored, and
/// while locked only cursor movement goes through.
pub struct FallbackSurface {
    buffer: EditorBuffer,
    locked: bool,
    on_change: ChangeCallback,
}

impl FallbackSurface {
    pub fn new(value: &str, locked: bool, on_change: ChangeCallback) -> Self {
        Self {
            buffer: EditorBuffer::from_text(value),
            locked,
            on_change,
        }
    }

    pub fn value(&self) -> String {
        self.buffer.text()
    }

    /// Adopt an external value, keeping the cursor where it can stay.
    ///
    /// Returns `true` if the text changed. Never notifies the callback.
    pub fn set_value(&mut self, value: &str) -> bool {
        if self.buffer.text() == value {
            return false;
        }
        self.buffer.set_text_clamped(value);
        true
    }

    pub const fn is_locked(&self) -> bool {
        self.locked
    }

    pub const fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// Apply a user input, reporting the new text to the callback on change.
    pub fn handle_input(&mut self, input: &EditInput) -> bool {
        if self.locked && !input.is_navigation() {
            return false;
        }
        if !self.buffer.apply(input) {
            return false;
        }
        let value = self.buffer.text();
        (self.on_change)(&value);
        true
    }

    pub fn view(&self) -> SurfaceView {
        SurfaceView {
            lines: (0..self.buffer.line_count())
                .filter_map(|idx| self.buffer.line_at(idx))
                .collect(),
            cursor: self.buffer.cursor(),
            editable: !self.locked,
            toolbar: None,
            status: None,
            placeholder: None,
        }
    }
}

impl std::fmt::Debug for FallbackSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackSurface")
            .field("buffer", &self.buffer)
            .field("locked", &self.locked)
            .finish_non_exhaustive()
    }
}
