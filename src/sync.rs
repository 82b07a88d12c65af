//! Reconciling externally supplied props with a live engine.
//!
//! The external value is authoritative. Writes happen only when it differs
//! from what the engine reports, because every engine write resets the cursor
//! and undo history. Bridge writes are muted so they never come back out as
//! change notifications.

use tracing::debug;

use crate::engine::EngineHandle;

/// Write `next` into the engine if it differs from the engine's value.
///
/// Returns `true` if a write happened. Disposed handles are ignored.
pub fn push_value(handle: &mut EngineHandle, next: &str) -> bool {
    handle
        .with_muted(|engine| {
            if engine.value() == next {
                return false;
            }
            engine.set_value(next);
            true
        })
        .unwrap_or(false)
}

/// Lock or unlock the engine, hiding chrome while locked.
///
/// Returns `true` if the engine's mode changed. Disposed handles are ignored.
pub fn push_read_only(handle: &mut EngineHandle, locked: bool) -> bool {
    let Some(engine) = handle.engine_mut() else {
        return false;
    };
    let was_editable = engine.is_editable();
    let was_visible = engine.chrome_visible();
    engine.set_editable(!locked);
    engine.set_chrome_visible(!locked);
    was_editable != engine.is_editable() || was_visible != engine.chrome_visible()
}

/// The external inputs last applied to an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSnapshot {
    pub value: String,
    pub read_only: bool,
    pub disabled: bool,
}

/// What [`SyncSnapshot::reconcile`] pushed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    pub value_written: bool,
    pub mode_changed: bool,
}

impl SyncSnapshot {
    pub fn new(value: impl Into<String>, read_only: bool, disabled: bool) -> Self {
        Self {
            value: value.into(),
            read_only,
            disabled,
        }
    }

    /// Either flag forces non-editable mode.
    pub const fn locked(&self) -> bool {
        self.read_only || self.disabled
    }

    /// Push whatever changed between this snapshot and `next` into the
    /// engine, then adopt `next`.
    pub fn reconcile(&mut self, handle: &mut EngineHandle, next: &Self) -> SyncOutcome {
        let mut outcome = SyncOutcome::default();
        if next.value != self.value {
            outcome.value_written = push_value(handle, &next.value);
        }
        if next.read_only != self.read_only || next.disabled != self.disabled {
            outcome.mode_changed = push_read_only(handle, next.locked());
        }
        if outcome != SyncOutcome::default() {
            debug!(
                value_written = outcome.value_written,
                mode_changed = outcome.mode_changed,
                locked = next.locked(),
                "props pushed into engine"
            );
        }
        self.clone_from(next);
        outcome
    }
}
