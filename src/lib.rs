// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. engine::EngineHandle)
    clippy::module_name_repetitions
)]

//! # Markpad
//!
//! A markdown editing widget that acquires its editing engine at runtime.
//!
//! The first widget to mount fetches the engine bundle once; every other
//! widget, concurrent or later, shares that load. Until the engine arrives
//! the widget shows its value read-only, and if the engine cannot be loaded
//! it degrades to plain text input with the same value and change contract.
//!
//! ## Modules
//!
//! - [`loader`]: fetch-once resource acquisition and engine resolution
//! - [`engine`]: engine traits, the built-in engine, and handle lifecycle
//! - [`sync`]: pushing external props into a live engine
//! - [`widget`]: the mountable editor and its fallback surface
//! - [`host`]: the host document and text surface collaborators
//! - [`editor`]: rope-backed text buffer and input vocabulary
//! - [`render`]: markdown to HTML for read-only display
//! - [`app`]: terminal host for one editor
//! - [`config`]: rc-file and command-line configuration
//! - [`watcher`]: on-disk changes as external values

pub mod app;
pub mod config;
pub mod editor;
pub mod engine;
pub mod host;
pub mod loader;
pub mod render;
pub mod sync;
pub mod watcher;
pub mod widget;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::engine::{ChangeCallback, EngineOptions};
    pub use crate::host::{HostSurface, MemoryDocument};
    pub use crate::loader::{HttpFetcher, ResourceLoader, ResourceLocations};
    pub use crate::render::render_markdown;
    pub use crate::widget::{EditorProps, EditorView, MarkdownEditor, WidgetState};
}
