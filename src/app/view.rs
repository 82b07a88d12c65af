use ratatui::Frame;
use ratatui::prelude::*;
use ratatui::widgets::{Clear, Paragraph};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::{App, Model, ToastLevel};
use crate::engine::SurfaceView;
use crate::widget::{EditorView, WidgetState};

impl App {
    pub(super) fn view(model: &Model, frame: &mut Frame) {
        let area = frame.area();
        let [toolbar_area, editor_area, toast_area, status_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);

        frame.render_widget(Clear, area);
        match model.editor.view() {
            EditorView::Loading(view) => {
                render_toolbar(frame, toolbar_area, None, "loading engine...");
                render_surface(frame, editor_area, &view, model.scroll_offset);
            }
            EditorView::Engine(view) => {
                render_toolbar(frame, toolbar_area, view.toolbar.as_deref(), "");
                render_surface(frame, editor_area, &view, model.scroll_offset);
            }
            EditorView::Fallback(view) => {
                render_toolbar(frame, toolbar_area, None, "plain input");
                render_surface(frame, editor_area, &view, model.scroll_offset);
            }
        }
        render_toast_bar(model, frame, toast_area);
        render_status_bar(model, frame, status_area);
    }
}

fn render_toolbar(
    frame: &mut Frame,
    area: Rect,
    actions: Option<&[crate::editor::ToolbarAction]>,
    note: &str,
) {
    let text = actions.map_or_else(
        || format!(" {note}"),
        |actions| {
            actions
                .iter()
                .map(|action| format!("[{}]", action.label()))
                .collect::<Vec<_>>()
                .join(" ")
        },
    );
    let bar = Paragraph::new(text).style(Style::default().fg(Color::Black).bg(Color::Gray));
    frame.render_widget(bar, area);
}

fn render_surface(frame: &mut Frame, area: Rect, view: &SurfaceView, scroll: usize) {
    if let Some(placeholder) = view
        .placeholder
        .as_deref()
        .filter(|_| view.lines.iter().all(String::is_empty))
    {
        let hint = Paragraph::new(placeholder.to_string())
            .style(Style::default().fg(Color::DarkGray).italic());
        frame.render_widget(hint, area);
        return;
    }
    let cursor = view.editable.then_some((view.cursor.line, view.cursor.col));
    render_text(frame, area, &view.lines, cursor, scroll, !view.editable);
}

fn render_text(
    frame: &mut Frame,
    area: Rect,
    lines: &[String],
    cursor: Option<(usize, usize)>,
    scroll: usize,
    dimmed: bool,
) {
    let gutter_width = line_number_width(lines.len().max(1));
    let text_style = if dimmed {
        Style::default().fg(Color::Gray)
    } else {
        Style::default()
    };
    let content = lines
        .iter()
        .enumerate()
        .skip(scroll)
        .take(usize::from(area.height))
        .map(|(idx, line)| {
            let number = format!("{:>width$} ", idx + 1, width = usize::from(gutter_width));
            let mut spans = vec![Span::styled(number, Style::default().fg(Color::DarkGray))];
            match cursor {
                Some((cursor_line, col)) if cursor_line == idx => {
                    spans.extend(cursor_spans(line, col, text_style));
                }
                _ => spans.push(Span::styled(line.clone(), text_style)),
            }
            Line::from(spans)
        })
        .collect::<Vec<_>>();
    frame.render_widget(Paragraph::new(content), area);
}

fn cursor_spans(line: &str, col: usize, style: Style) -> Vec<Span<'static>> {
    let col = col.min(line.len());
    let (before, rest) = line.split_at(col);
    let mut chars = rest.chars();
    let under = chars.next().map_or_else(|| " ".to_string(), String::from);
    let after = chars.as_str();

    let mut spans = Vec::with_capacity(3);
    if !before.is_empty() {
        spans.push(Span::styled(before.to_string(), style));
    }
    spans.push(Span::styled(
        under,
        Style::default().bg(Color::White).fg(Color::Black),
    ));
    if !after.is_empty() {
        spans.push(Span::styled(after.to_string(), style));
    }
    spans
}

fn render_toast_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let Some((level, message)) = model.active_toast() else {
        return;
    };
    let bg = match level {
        ToastLevel::Info => Color::Blue,
        ToastLevel::Warning => Color::Yellow,
        ToastLevel::Error => Color::Red,
    };
    let text = truncate_to_width(&format!(" {message}"), usize::from(area.width));
    let bar = Paragraph::new(text).style(Style::default().bg(bg).fg(Color::Black));
    frame.render_widget(bar, area);
}

fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let filename = model.file_path.file_name().map_or_else(
        || "untitled".to_string(),
        |s| s.to_string_lossy().to_string(),
    );
    let state = match model.editor.state() {
        WidgetState::Loading => "LOADING",
        WidgetState::Live => "EDIT",
        WidgetState::Failed => "PLAIN",
    };
    let dirty = if model.is_dirty() { " [modified]" } else { "" };
    let read_only = if model.read_only { " [read-only]" } else { "" };
    let watching = if model.watch_enabled { " [watching]" } else { "" };
    let engine_status = match model.editor.view() {
        EditorView::Engine(view) => view.status.map(|s| format!("  {s}")).unwrap_or_default(),
        _ => String::new(),
    };

    let status = format!(
        " {state}  {filename}{dirty}{read_only}{watching}{engine_status}  Ctrl+S:save  Ctrl+R:lock  Esc:quit"
    );
    let status = truncate_to_width(&status, usize::from(area.width));
    let bar = Paragraph::new(status).style(Style::default().bg(Color::Magenta).fg(Color::White));
    frame.render_widget(bar, area);
}

/// Cut `text` to at most `width` terminal columns, marking the cut with `…`.
pub(super) fn truncate_to_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let budget = width.saturating_sub(1);
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    if width > 0 {
        out.push('…');
    }
    out
}

/// Calculate the width needed for line numbers.
pub(super) const fn line_number_width(total_lines: usize) -> u16 {
    if total_lines < 10 {
        1
    } else if total_lines < 100 {
        2
    } else if total_lines < 1_000 {
        3
    } else if total_lines < 10_000 {
        4
    } else if total_lines < 100_000 {
        5
    } else {
        6
    }
}
