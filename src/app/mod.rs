//! Terminal host for one markdown editor.
//!
//! Follows The Elm Architecture (TEA):
//! - [`Model`]: the host's state, including the mounted editor
//! - [`Message`]: user input, file events and ticks
//! - [`update`]: state transitions
//! - [`App::run`]: event loop with rendering
//!
//! The host is a controlled parent: the editor's change callback stores the
//! new text in the model, and the model feeds it back as the editor's value.

mod effects;
mod event_loop;
mod input;
mod model;
mod update;
mod view;

pub use model::{Model, ToastLevel};
pub use update::{Message, update};

use std::path::PathBuf;
use std::sync::Arc;

use crate::engine::EngineOptions;
use crate::loader::ResourceLoader;

/// Owns the terminal and runs the event loop.
pub struct App {
    file_path: PathBuf,
    loader: Arc<ResourceLoader>,
    watch_enabled: bool,
    read_only: bool,
    options: EngineOptions,
}

impl App {
    /// Create an application editing `file_path`, acquiring the engine
    /// through `loader`.
    pub fn new(file_path: PathBuf, loader: Arc<ResourceLoader>) -> Self {
        Self {
            file_path,
            loader,
            watch_enabled: false,
            read_only: false,
            options: EngineOptions::new(),
        }
    }

    /// Feed on-disk changes into the editor as new values.
    pub fn with_watch(mut self, enabled: bool) -> Self {
        self.watch_enabled = enabled;
        self
    }

    /// Start in read-only mode.
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }
}

#[cfg(test)]
mod tests;
