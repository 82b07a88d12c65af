use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{App, Message};
use crate::editor::{Direction, EditInput, ToolbarAction};

impl App {
    pub(super) fn handle_event(event: &Event) -> Option<Message> {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => Self::handle_key(*key),
            Event::Paste(text) => Some(Message::Edit(EditInput::InsertText(text.clone()))),
            Event::Resize(width, height) => Some(Message::Resize(*width, *height)),
            _ => None,
        }
    }

    pub(super) fn handle_key(key: KeyEvent) -> Option<Message> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let edit = |input| Some(Message::Edit(input));

        if ctrl {
            return match key.code {
                KeyCode::Char('q' | 'c') => Some(Message::Quit),
                KeyCode::Char('s') => Some(Message::Save),
                KeyCode::Char('r') => Some(Message::ToggleReadOnly),
                KeyCode::Char('z') => edit(EditInput::Undo),
                KeyCode::Char('b') => edit(EditInput::Toolbar(ToolbarAction::Bold)),
                KeyCode::Char('i') => edit(EditInput::Toolbar(ToolbarAction::Italic)),
                KeyCode::Char('k') => edit(EditInput::Toolbar(ToolbarAction::Link)),
                KeyCode::Left => edit(EditInput::WordLeft),
                KeyCode::Right => edit(EditInput::WordRight),
                _ => None,
            };
        }

        match key.code {
            KeyCode::Esc => Some(Message::Quit),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::ALT) => {
                edit(EditInput::Insert(c))
            }
            KeyCode::Enter => edit(EditInput::Newline),
            KeyCode::Tab => edit(EditInput::InsertText("    ".to_string())),
            KeyCode::Backspace => edit(EditInput::Backspace),
            KeyCode::Delete => edit(EditInput::Delete),
            KeyCode::Left => edit(EditInput::Move(Direction::Left)),
            KeyCode::Right => edit(EditInput::Move(Direction::Right)),
            KeyCode::Up => edit(EditInput::Move(Direction::Up)),
            KeyCode::Down => edit(EditInput::Move(Direction::Down)),
            KeyCode::Home => edit(EditInput::Home),
            KeyCode::End => edit(EditInput::End),
            _ => None,
        }
    }
}
