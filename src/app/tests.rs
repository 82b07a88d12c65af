use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use url::Url;

use crate::app::{App, Message, Model, ToastLevel, update};
use crate::editor::{EditInput, ToolbarAction};
use crate::engine::EngineOptions;
use crate::host::MemoryDocument;
use crate::loader::{Fetcher, ResourceLoadError, ResourceLoader};
use crate::widget::WidgetState;

const MANIFEST: &[u8] = br#"{"engine":"rope-md","version":"1.0.0"}"#;
const WAIT: Duration = Duration::from_secs(5);

struct StaticFetcher(Result<Vec<u8>, ResourceLoadError>);

impl Fetcher for StaticFetcher {
    fn fetch(&self, _url: &Url) -> Result<Vec<u8>, ResourceLoadError> {
        self.0.clone()
    }
}

fn loader(body: Result<Vec<u8>, ResourceLoadError>) -> Arc<ResourceLoader> {
    Arc::new(ResourceLoader::new(
        Arc::new(StaticFetcher(body)),
        Arc::new(MemoryDocument::new()),
    ))
}

fn settled_model(text: &str, body: Result<Vec<u8>, ResourceLoadError>) -> Model {
    settled_model_with(text, body, EngineOptions::new())
}

fn settled_model_with(
    text: &str,
    body: Result<Vec<u8>, ResourceLoadError>,
    options: EngineOptions,
) -> Model {
    let mut model = Model::new(
        PathBuf::from("notes.md"),
        text.to_string(),
        loader(body),
        false,
        options,
    );
    model.editor.wait_until_settled(WAIT);
    update(model, Message::Tick)
}

fn live_model(text: &str) -> Model {
    let model = settled_model(text, Ok(MANIFEST.to_vec()));
    assert_eq!(model.editor.state(), WidgetState::Live);
    model
}

fn type_str(mut model: Model, text: &str) -> Model {
    for c in text.chars() {
        model = update(model, Message::Edit(EditInput::Insert(c)));
    }
    model
}

fn render(model: &Model, width: u16, height: u16) -> String {
    let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
    terminal.draw(|frame| App::view(model, frame)).unwrap();
    let buffer = terminal.backend().buffer();
    let mut out = String::new();
    for y in 0..buffer.area.height {
        for x in 0..buffer.area.width {
            out.push_str(buffer[(x, y)].symbol());
        }
        out.push('\n');
    }
    out
}

#[test]
fn test_typing_updates_owned_text_and_dirty_flag() {
    let model = live_model("");
    assert!(!model.is_dirty());
    let model = type_str(model, "hi");
    assert_eq!(model.text(), "hi");
    assert_eq!(model.editor.value(), "hi");
    assert!(model.is_dirty());
}

#[test]
fn test_feedback_does_not_reset_cursor() {
    let model = live_model("abc");
    let model = update(model, Message::Edit(EditInput::End));
    let model = type_str(model, "d");
    let model = type_str(model, "e");
    assert_eq!(model.text(), "abcde");
}

#[test]
fn test_external_change_replaces_text_and_clears_dirty() {
    let model = type_str(live_model("one"), "x");
    let model = update(model, Message::ExternalChange("two".to_string()));
    assert_eq!(model.text(), "two");
    assert_eq!(model.editor.value(), "two");
    assert!(!model.is_dirty());
    assert!(matches!(model.active_toast(), Some((ToastLevel::Warning, _))));
}

#[test]
fn test_toggle_read_only_blocks_edits() {
    let model = update(live_model("fixed"), Message::ToggleReadOnly);
    assert!(model.read_only);
    let model = type_str(model, "zz");
    assert_eq!(model.text(), "fixed");

    let model = update(model, Message::ToggleReadOnly);
    let model = type_str(model, "z");
    assert_eq!(model.text(), "zfixed");
}

#[test]
fn test_toolbar_action_round_trips_through_host() {
    let model = update(
        live_model(""),
        Message::Edit(EditInput::Toolbar(ToolbarAction::Bold)),
    );
    let model = type_str(model, "b");
    assert_eq!(model.text(), "**b**");
}

#[test]
fn test_failed_engine_falls_back_and_reports() {
    let model = settled_model(
        "draft",
        Err(ResourceLoadError::Network {
            url: crate::loader::DEFAULT_SCRIPT_URL.to_string(),
            reason: "offline".to_string(),
        }),
    );
    assert_eq!(model.editor.state(), WidgetState::Failed);
    assert!(model
        .active_toast()
        .is_some_and(|(level, message)| level == ToastLevel::Warning && message.contains("offline")));

    let model = update(model, Message::Edit(EditInput::End));
    let model = type_str(model, "!");
    assert_eq!(model.text(), "draft!");

    let screen = render(&model, 60, 8);
    assert!(screen.contains("PLAIN"), "{screen}");
    assert!(screen.contains("draft!"), "{screen}");
}

#[test]
fn test_render_shows_toolbar_text_and_status() {
    let model = settled_model_with(
        "# Title\nbody",
        Ok(MANIFEST.to_vec()),
        EngineOptions::new().with("status", true),
    );
    let screen = render(&model, 100, 8);
    assert!(screen.contains("[B]"), "{screen}");
    assert!(screen.contains("# Title"), "{screen}");
    assert!(screen.contains("EDIT"), "{screen}");
    assert!(screen.contains("lines: 2"), "{screen}");
}

#[test]
fn test_read_only_render_hides_toolbar() {
    let model = update(live_model("text"), Message::ToggleReadOnly);
    let screen = render(&model, 100, 8);
    assert!(!screen.contains("[B]"), "{screen}");
    assert!(screen.contains("[read-only]"), "{screen}");
}

#[test]
fn test_scroll_follows_cursor() {
    let text = (0..40).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
    let model = update(live_model(&text), Message::Resize(80, 10));
    let mut model = model;
    for _ in 0..20 {
        model = update(
            model,
            Message::Edit(EditInput::Move(crate::editor::Direction::Down)),
        );
    }
    assert!(model.scroll_offset > 0);
    let screen = render(&model, 80, 10);
    assert!(screen.contains("line 20"), "{screen}");
}

#[test]
fn test_save_writes_file_and_clears_dirty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("saved.md");
    let mut model = type_str(live_model(""), "saved text");
    model.file_path.clone_from(&path);

    let mut watcher = None;
    App::handle_message_side_effects(&mut model, &mut watcher, &Message::Save);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "saved text");
    assert!(!model.is_dirty());
}

#[test]
fn test_key_mapping() {
    let ctrl = |c| Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL));
    assert_eq!(
        App::handle_event(&ctrl('b')),
        Some(Message::Edit(EditInput::Toolbar(ToolbarAction::Bold)))
    );
    assert_eq!(App::handle_event(&ctrl('z')), Some(Message::Edit(EditInput::Undo)));
    assert_eq!(App::handle_event(&ctrl('s')), Some(Message::Save));
    assert_eq!(App::handle_event(&ctrl('r')), Some(Message::ToggleReadOnly));
    assert_eq!(
        App::handle_event(&Event::Key(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE))),
        Some(Message::Edit(EditInput::Insert('x')))
    );
    assert_eq!(
        App::handle_event(&Event::Key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE))),
        Some(Message::Quit)
    );
}

#[test]
fn test_truncate_to_width_counts_columns() {
    use crate::app::view::truncate_to_width;
    assert_eq!(truncate_to_width("short", 10), "short");
    assert_eq!(truncate_to_width("abcdef", 4), "abc…");
    // wide glyphs take two columns each
    assert_eq!(truncate_to_width("日本語テキスト", 5), "日本…");
    assert_eq!(truncate_to_width("abc", 0), "");
}
