use std::cell::Cell;
use std::rc::Rc;

use tracing::debug;

use super::{Engine, EngineConfig, EngineConstructionError, EngineConstructor, ListenerId};
use crate::host::HostSurface;

/// External change callback, invoked with the engine's serialized value.
pub type ChangeCallback = Rc<dyn Fn(&str)>;

/// Exclusive ownership of one constructed engine.
///
/// The handle registers exactly one change listener that forwards to the
/// widget's callback. After [`EngineHandle::dispose`] every accessor returns
/// `None` and further disposal is a no-op.
pub struct EngineHandle {
    engine: Option<Box<dyn Engine>>,
    listener: Option<ListenerId>,
    muted: Rc<Cell<bool>>,
}

impl EngineHandle {
    /// Construct an engine bound to `surface` and wire its change listener.
    ///
    /// # Errors
    /// Propagates the constructor's [`EngineConstructionError`].
    pub fn construct(
        constructor: &dyn EngineConstructor,
        surface: &mut HostSurface,
        config: &EngineConfig<'_>,
        on_change: ChangeCallback,
    ) -> Result<Self, EngineConstructionError> {
        let mut engine = constructor.construct(surface, config)?;
        let muted = Rc::new(Cell::new(false));
        let gate = Rc::clone(&muted);
        let listener = engine.add_change_listener(Box::new(move |value| {
            if !gate.get() {
                on_change(value);
            }
        }));
        debug!(
            engine = constructor.name(),
            surface = surface.id(),
            read_only = config.read_only,
            "engine constructed"
        );
        Ok(Self {
            engine: Some(engine),
            listener: Some(listener),
            muted,
        })
    }

    pub const fn is_disposed(&self) -> bool {
        self.engine.is_none()
    }

    pub fn engine(&self) -> Option<&dyn Engine> {
        self.engine.as_deref()
    }

    pub fn engine_mut(&mut self) -> Option<&mut (dyn Engine + 'static)> {
        self.engine.as_deref_mut()
    }

    /// The engine's current value, or `None` once disposed.
    pub fn value(&self) -> Option<String> {
        self.engine().map(|engine| engine.value())
    }

    /// Run `f` against the engine with change forwarding suppressed.
    ///
    /// Used for writes that originate from the external value, so the caller
    /// is not told about content it already owns.
    pub(crate) fn with_muted<R>(&mut self, f: impl FnOnce(&mut dyn Engine) -> R) -> Option<R> {
        let engine = self.engine.as_deref_mut()?;
        self.muted.set(true);
        let result = f(engine);
        self.muted.set(false);
        Some(result)
    }

    /// Remove the listener, detach from `surface` and drop the engine.
    ///
    /// Returns `true` if this call performed the disposal.
    pub fn dispose(&mut self, surface: &mut HostSurface) -> bool {
        let Some(mut engine) = self.engine.take() else {
            return false;
        };
        if let Some(id) = self.listener.take() {
            engine.remove_change_listener(id);
        }
        engine.detach(surface);
        debug!(engine = engine.name(), surface = surface.id(), "engine disposed");
        true
    }
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("engine", &self.engine.as_ref().map(|e| e.name().to_string()))
            .field("listener", &self.listener)
            .finish()
    }
}
