//! Built-in rope-backed markdown engine.

use std::collections::VecDeque;

use serde_json::Value;

use super::{
    ChangeListener, Engine, EngineConfig, EngineConstructionError, EngineConstructor, ListenerId,
    SurfaceView,
};
use crate::editor::{Cursor, Direction, EditInput, EditorBuffer, ToolbarAction};
use crate::host::HostSurface;

pub const ENGINE_NAME: &str = "rope-md";

const UNDO_LIMIT: usize = 200;

#[derive(Debug, Clone)]
struct UndoEntry {
    text: String,
    cursor: Cursor,
}

pub struct RopeEngine {
    buffer: EditorBuffer,
    editable: bool,
    chrome_allowed: bool,
    chrome_visible: bool,
    toolbar: Vec<ToolbarAction>,
    status: bool,
    placeholder: Option<String>,
    listeners: Vec<(ListenerId, ChangeListener)>,
    next_listener: u64,
    undo: VecDeque<UndoEntry>,
}

impl RopeEngine {
    fn emit_change(&mut self) {
        let value = self.buffer.text();
        for (_, listener) in &mut self.listeners {
            listener(&value);
        }
    }

    fn record_undo(&mut self, entry: UndoEntry) {
        if self.undo.len() == UNDO_LIMIT {
            self.undo.pop_front();
        }
        self.undo.push_back(entry);
    }

    fn snapshot(&self) -> UndoEntry {
        UndoEntry {
            text: self.buffer.text(),
            cursor: self.buffer.cursor(),
        }
    }

    fn undo(&mut self) -> bool {
        let Some(entry) = self.undo.pop_back() else {
            return false;
        };
        self.buffer.replace_text(&entry.text);
        self.buffer.move_to(entry.cursor.line, entry.cursor.col);
        true
    }

    fn run_toolbar(&mut self, action: ToolbarAction) {
        match action {
            ToolbarAction::Bold => self.wrap_inline("**"),
            ToolbarAction::Italic => self.wrap_inline("*"),
            ToolbarAction::Strikethrough => self.wrap_inline("~~"),
            ToolbarAction::Code => self.wrap_inline("`"),
            ToolbarAction::Heading => self.prefix_line("# "),
            ToolbarAction::Quote => self.prefix_line("> "),
            ToolbarAction::UnorderedList => self.prefix_line("- "),
            ToolbarAction::Link => {
                self.buffer.insert_str("[](https://)");
                for _ in 0.."](https://)".len() {
                    self.buffer.move_cursor(Direction::Left);
                }
            }
        }
    }

    /// Insert an empty marker pair and park the cursor between the halves.
    fn wrap_inline(&mut self, marker: &str) {
        self.buffer.insert_str(&marker.repeat(2));
        for _ in marker.chars() {
            self.buffer.move_cursor(Direction::Left);
        }
    }

    fn prefix_line(&mut self, prefix: &str) {
        let Cursor { line, col, .. } = self.buffer.cursor();
        self.buffer.move_home();
        self.buffer.insert_str(prefix);
        self.buffer.move_to(line, col + prefix.len());
    }

    fn status_line(&self) -> String {
        let cursor = self.buffer.cursor();
        format!(
            "lines: {}  words: {}  {}:{}",
            self.buffer.line_count(),
            self.buffer.word_count(),
            cursor.line + 1,
            cursor.col + 1
        )
    }
}

impl Engine for RopeEngine {
    fn name(&self) -> &str {
        ENGINE_NAME
    }

    fn value(&self) -> String {
        self.buffer.text()
    }

    fn set_value(&mut self, value: &str) {
        self.buffer.replace_text(value);
        self.undo.clear();
        self.emit_change();
    }

    fn is_editable(&self) -> bool {
        self.editable
    }

    fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
    }

    fn chrome_visible(&self) -> bool {
        self.chrome_visible
    }

    fn set_chrome_visible(&mut self, visible: bool) {
        self.chrome_visible = visible && self.chrome_allowed;
    }

    fn add_change_listener(&mut self, listener: ChangeListener) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, listener));
        id
    }

    fn remove_change_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    fn apply(&mut self, input: &EditInput) -> bool {
        if !self.editable && !input.is_navigation() {
            return false;
        }
        let changed = match input {
            EditInput::Undo => self.undo(),
            EditInput::Toolbar(action) => {
                let entry = self.snapshot();
                self.run_toolbar(*action);
                self.record_undo(entry);
                true
            }
            other => {
                let entry = self.snapshot();
                let changed = self.buffer.apply(other);
                if changed {
                    self.record_undo(entry);
                }
                changed
            }
        };
        if changed {
            self.emit_change();
        }
        changed
    }

    fn view(&self) -> SurfaceView {
        SurfaceView {
            lines: (0..self.buffer.line_count())
                .filter_map(|idx| self.buffer.line_at(idx))
                .collect(),
            cursor: self.buffer.cursor(),
            editable: self.editable,
            toolbar: self.chrome_visible.then(|| self.toolbar.clone()),
            status: self.status.then(|| self.status_line()),
            placeholder: if self.buffer.is_empty() {
                self.placeholder.clone()
            } else {
                None
            },
        }
    }

    fn detach(&mut self, surface: &mut HostSurface) {
        self.listeners.clear();
        surface.restore(&self.buffer.text());
    }
}

/// Constructor produced by resolving a `rope-md` engine manifest.
#[derive(Debug, Clone)]
pub struct RopeEngineConstructor {
    version: String,
    toolbar: Vec<ToolbarAction>,
}

impl RopeEngineConstructor {
    pub fn new(version: impl Into<String>, toolbar: Vec<ToolbarAction>) -> Self {
        Self {
            version: version.into(),
            toolbar,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    fn invalid(key: &str, reason: impl Into<String>) -> EngineConstructionError {
        EngineConstructionError::InvalidOption {
            engine: ENGINE_NAME.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Resolve the `toolbar` option: absent or `true` keeps the manifest
    /// toolbar, `false` disables chrome, a list selects actions.
    fn toolbar_from(
        &self,
        value: Option<&Value>,
    ) -> Result<(bool, Vec<ToolbarAction>), EngineConstructionError> {
        match value {
            None | Some(Value::Bool(true)) => Ok((true, self.toolbar.clone())),
            Some(Value::Bool(false)) => Ok((false, Vec::new())),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .and_then(ToolbarAction::from_name)
                        .ok_or_else(|| Self::invalid("toolbar", format!("unknown action {item}")))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(|actions| (true, actions)),
            Some(other) => Err(Self::invalid(
                "toolbar",
                format!("expected bool or list, got {other}"),
            )),
        }
    }
}

impl EngineConstructor for RopeEngineConstructor {
    fn name(&self) -> &str {
        ENGINE_NAME
    }

    fn construct(
        &self,
        surface: &mut HostSurface,
        config: &EngineConfig<'_>,
    ) -> Result<Box<dyn Engine>, EngineConstructionError> {
        let options = config.options;
        let (chrome_allowed, toolbar) = self.toolbar_from(options.get("toolbar"))?;
        let placeholder = match options.get("placeholder") {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text.clone()),
            Some(other) => {
                return Err(Self::invalid(
                    "placeholder",
                    format!("expected string, got {other}"),
                ));
            }
        };

        surface.bind(ENGINE_NAME)?;

        let editable = !config.read_only;
        Ok(Box::new(RopeEngine {
            buffer: EditorBuffer::from_text(config.initial_value),
            editable,
            chrome_allowed,
            chrome_visible: chrome_allowed && editable,
            toolbar,
            status: options.flag("status"),
            placeholder,
            listeners: Vec::new(),
            next_listener: 1,
            undo: VecDeque::new(),
        }))
    }
}
