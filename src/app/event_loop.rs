use std::fs;
use std::io::ErrorKind;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use ratatui::DefaultTerminal;
use tracing::{debug, warn};

use crate::app::{App, Message, Model, ToastLevel, update};
use crate::watcher::FileWatcher;
use crate::widget::WidgetState;

const LOADING_POLL: Duration = Duration::from_millis(50);
const IDLE_POLL: Duration = Duration::from_millis(250);

impl App {
    /// Run the main event loop.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the terminal cannot be
    /// initialized, or the event loop hits an I/O failure.
    pub fn run(&mut self) -> Result<()> {
        let text = match fs::read_to_string(&self.file_path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => String::new(),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Failed to read {}", self.file_path.display()));
            }
        };

        let mut terminal = ratatui::try_init()
            .context("Failed to initialize terminal; markpad requires an interactive terminal")?;
        let size = terminal.size()?;

        let mut model = Model::new(
            self.file_path.clone(),
            text,
            std::sync::Arc::clone(&self.loader),
            self.read_only,
            self.options.clone(),
        );
        model.watch_enabled = self.watch_enabled;
        model = update(model, Message::Resize(size.width, size.height));

        let result = Self::event_loop(&mut terminal, model);
        ratatui::restore();
        result
    }

    fn event_loop(terminal: &mut DefaultTerminal, mut model: Model) -> Result<()> {
        let mut file_watcher = if model.watch_enabled {
            match Self::make_file_watcher(&model.file_path) {
                Ok(watcher) => Some(watcher),
                Err(err) => {
                    model.watch_enabled = false;
                    model.show_toast(ToastLevel::Warning, format!("Watch unavailable: {err}"));
                    warn!(path = %model.file_path.display(), error = %err, "watcher failed");
                    None
                }
            }
        } else {
            None
        };
        let mut needs_render = true;

        loop {
            if model.expire_toast(Instant::now()) {
                needs_render = true;
            }

            let before = model.editor.state();
            model = update(model, Message::Tick);
            let loading = model.editor.state() == WidgetState::Loading;
            if model.editor.state() != before {
                debug!(state = ?model.editor.state(), "editor settled");
                needs_render = true;
            }

            if let Some(content) = file_watcher.as_mut().and_then(FileWatcher::take_change) {
                model = update(model, Message::ExternalChange(content));
                needs_render = true;
            }

            let poll = if needs_render {
                Duration::ZERO
            } else if loading || file_watcher.is_some() {
                LOADING_POLL
            } else {
                IDLE_POLL
            };
            if event::poll(poll)? {
                if let Some(msg) = Self::handle_event(&event::read()?) {
                    model = Self::dispatch(model, &mut file_watcher, msg);
                    needs_render = true;
                }

                // Coalesce key repeat bursts into a single render.
                while event::poll(Duration::ZERO)? {
                    if let Some(msg) = Self::handle_event(&event::read()?) {
                        model = Self::dispatch(model, &mut file_watcher, msg);
                        needs_render = true;
                    }
                }
            }

            if needs_render {
                terminal.draw(|frame| Self::view(&model, frame))?;
                needs_render = false;
            }

            if model.should_quit {
                break;
            }
        }
        model.editor.unmount();
        Ok(())
    }

    fn dispatch(model: Model, file_watcher: &mut Option<FileWatcher>, msg: Message) -> Model {
        let side_msg = msg.clone();
        let mut model = update(model, msg);
        Self::handle_message_side_effects(&mut model, file_watcher, &side_msg);
        model
    }
}
