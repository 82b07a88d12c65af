//! Editing engines and their lifecycle.
//!
//! An engine is acquired at runtime (see [`crate::loader`]) as an
//! [`EngineConstructor`], bound to a [`HostSurface`], and owned by exactly one
//! [`EngineHandle`] until disposal.
//!
//! - [`Engine`]: the live editing surface
//! - [`EngineConstructor`]: builds engines against a host surface
//! - [`ModuleResolver`]: turns a fetched script resource into a constructor
//! - [`RopeEngine`]: the built-in rope-backed markdown engine

mod lifecycle;
mod module;
mod options;
mod rope;

pub use lifecycle::{ChangeCallback, EngineHandle};
pub use module::{EngineManifest, ManifestResolver, ModuleError, ModuleResolver};
pub use options::EngineOptions;
pub use rope::{ENGINE_NAME, RopeEngine, RopeEngineConstructor};

use thiserror::Error;

use crate::editor::{Cursor, EditInput, ToolbarAction};
use crate::host::{HostSurface, SurfaceError};

/// Listener invoked with the engine's serialized value after each change.
pub type ChangeListener = Box<dyn FnMut(&str)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineConstructionError {
    #[error(transparent)]
    Surface(#[from] SurfaceError),

    #[error("engine `{engine}` rejected option `{key}`: {reason}")]
    InvalidOption {
        engine: String,
        key: String,
        reason: String,
    },

    #[error("engine `{engine}` failed to initialize: {reason}")]
    Initialization { engine: String, reason: String },
}

/// Everything an engine needs at construction time.
///
/// The read-only flag travels with construction so the engine never renders
/// an editable frame it is about to lock.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig<'a> {
    pub initial_value: &'a str,
    pub options: &'a EngineOptions,
    pub read_only: bool,
}

/// Renderable state of an editing surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceView {
    pub lines: Vec<String>,
    pub cursor: Cursor,
    pub editable: bool,
    /// Toolbar actions, present only while chrome is visible.
    pub toolbar: Option<Vec<ToolbarAction>>,
    pub status: Option<String>,
    /// Shown instead of the text when the surface is empty.
    pub placeholder: Option<String>,
}

/// A live editing engine bound to a host surface.
pub trait Engine {
    fn name(&self) -> &str;

    /// Current serialized content.
    fn value(&self) -> String;

    /// Replace the content. Engines notify their change listeners afterwards.
    fn set_value(&mut self, value: &str);

    fn is_editable(&self) -> bool;

    fn set_editable(&mut self, editable: bool);

    fn chrome_visible(&self) -> bool;

    fn set_chrome_visible(&mut self, visible: bool);

    fn add_change_listener(&mut self, listener: ChangeListener) -> ListenerId;

    /// Returns `false` if no listener with `id` was registered.
    fn remove_change_listener(&mut self, id: ListenerId) -> bool;

    /// Apply a user input. Returns `true` if the content changed.
    fn apply(&mut self, input: &EditInput) -> bool;

    fn view(&self) -> SurfaceView;

    /// Unbind from `surface`, restoring it to a plain input with the final
    /// content.
    fn detach(&mut self, surface: &mut HostSurface);
}

/// Builds engines against host surfaces.
pub trait EngineConstructor: Send + Sync {
    fn name(&self) -> &str;

    /// Construct an engine bound to `surface`.
    ///
    /// # Errors
    /// Returns [`EngineConstructionError`] when the surface cannot be bound or
    /// the options are unusable. On error the surface is left unbound.
    fn construct(
        &self,
        surface: &mut HostSurface,
        config: &EngineConfig<'_>,
    ) -> Result<Box<dyn Engine>, EngineConstructionError>;
}
