//! The markdown editing widget.
//!
//! A [`MarkdownEditor`] is mounted against a host surface and a shared
//! [`ResourceLoader`]. While the engine loads, input goes to a plain
//! [`FallbackSurface`]; the widget then either binds a live engine seeded
//! with that text or keeps the plain surface for good. The widget is driven from one UI thread: call
//! [`MarkdownEditor::tick`] from the host's event loop to let a pending load
//! complete.

mod fallback;

pub use fallback::FallbackSurface;

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::editor::{Cursor, EditInput};
use crate::engine::{
    ChangeCallback, EngineConfig, EngineConstructor, EngineHandle, EngineOptions, SurfaceView,
};
use crate::host::HostSurface;
use crate::loader::{EngineTicket, ResourceLoader};
use crate::sync::SyncSnapshot;

const SETTLE_POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetState {
    /// Waiting for the engine; plain input is active.
    Loading,
    /// A live engine owns the surface.
    Live,
    /// The engine could not be acquired; plain input is active.
    Failed,
}

/// What the host should render for the widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorView {
    /// Plain input shown while the engine loads.
    Loading(SurfaceView),
    Engine(SurfaceView),
    Fallback(SurfaceView),
}

/// Inputs supplied by the widget's owner.
#[derive(Clone)]
pub struct EditorProps {
    pub value: String,
    pub read_only: bool,
    pub disabled: bool,
    /// Engine options, merged over the defaults. Read once at construction.
    pub options: EngineOptions,
    pub on_change: ChangeCallback,
}

impl EditorProps {
    pub fn new(value: impl Into<String>, on_change: ChangeCallback) -> Self {
        Self {
            value: value.into(),
            read_only: false,
            disabled: false,
            options: EngineOptions::new(),
            on_change,
        }
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub const fn locked(&self) -> bool {
        self.read_only || self.disabled
    }

    fn snapshot(&self) -> SyncSnapshot {
        SyncSnapshot::new(self.value.clone(), self.read_only, self.disabled)
    }
}

impl std::fmt::Debug for EditorProps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorProps")
            .field("value", &self.value)
            .field("read_only", &self.read_only)
            .field("disabled", &self.disabled)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Disposed flag shared between the widget and its pending continuations.
#[derive(Debug, Clone, Default)]
struct DisposeGuard(Rc<Cell<bool>>);

impl DisposeGuard {
    fn dispose(&self) {
        self.0.set(true);
    }

    fn is_disposed(&self) -> bool {
        self.0.get()
    }
}

#[derive(Debug)]
struct PendingMount {
    ticket: EngineTicket,
    guard: DisposeGuard,
}

/// A mounted markdown editor.
///
/// Dropping the editor unmounts it.
pub struct MarkdownEditor {
    surface: HostSurface,
    loader: Arc<ResourceLoader>,
    state: WidgetState,
    pending: Option<PendingMount>,
    handle: Option<EngineHandle>,
    fallback: Option<FallbackSurface>,
    snapshot: SyncSnapshot,
    options: EngineOptions,
    on_change: Rc<RefCell<ChangeCallback>>,
    guard: DisposeGuard,
    failure: Option<String>,
}

impl MarkdownEditor {
    /// Mount the widget on `surface` and start acquiring the engine.
    ///
    /// The stylesheet is linked immediately. If the engine is already cached
    /// the widget goes live before this returns.
    pub fn mount(props: EditorProps, mut surface: HostSurface, loader: Arc<ResourceLoader>) -> Self {
        loader.ensure_style(&loader.locations().style);
        surface.set_value(&props.value);

        let guard = DisposeGuard::default();
        let pending = PendingMount {
            ticket: loader.ensure_engine_available(),
            guard: guard.clone(),
        };
        debug!(surface = surface.id(), url = pending.ticket.url(), "editor mounted");

        let mut editor = Self {
            snapshot: props.snapshot(),
            options: props.options,
            on_change: Rc::new(RefCell::new(props.on_change)),
            surface,
            loader,
            state: WidgetState::Loading,
            pending: Some(pending),
            handle: None,
            fallback: None,
            guard,
            failure: None,
        };
        editor.fallback = Some(FallbackSurface::new(
            &editor.snapshot.value,
            editor.snapshot.locked(),
            editor.forwarder(),
        ));
        editor.tick();
        editor
    }

    pub const fn state(&self) -> WidgetState {
        self.state
    }

    pub const fn surface(&self) -> &HostSurface {
        &self.surface
    }

    /// Why the engine is unavailable, once the widget has failed.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn is_unmounted(&self) -> bool {
        self.guard.is_disposed()
    }

    /// The text currently shown by whichever surface is active.
    pub fn value(&self) -> String {
        match self.state {
            WidgetState::Live => self
                .handle
                .as_ref()
                .and_then(EngineHandle::value)
                .unwrap_or_else(|| self.surface.value().to_string()),
            WidgetState::Loading | WidgetState::Failed => self
                .fallback
                .as_ref()
                .map_or_else(|| self.surface.value().to_string(), FallbackSurface::value),
        }
    }

    /// Let a pending engine load complete. Cheap when nothing is pending.
    pub fn tick(&mut self) -> WidgetState {
        let Some(pending) = self.pending.as_mut() else {
            return self.state;
        };
        if pending.guard.is_disposed() {
            self.pending = None;
            return self.state;
        }
        let Some(outcome) = pending.ticket.poll(&self.loader) else {
            return self.state;
        };
        self.pending = None;

        match outcome {
            Ok(constructor) => self.go_live(constructor.as_ref()),
            Err(err) => {
                warn!(
                    url = err.url(),
                    surface = self.surface.id(),
                    error = %err,
                    "engine unavailable, using plain input"
                );
                self.fail(err.to_string());
            }
        }
        self.state
    }

    /// Tick until the widget leaves [`WidgetState::Loading`], `timeout`
    /// elapses, or the widget is unmounted.
    pub fn wait_until_settled(&mut self, timeout: Duration) -> WidgetState {
        let deadline = Instant::now() + timeout;
        while self.tick() == WidgetState::Loading && self.pending.is_some() && Instant::now() < deadline
        {
            thread::sleep(SETTLE_POLL_INTERVAL);
        }
        self.state
    }

    /// Replace the owner-supplied inputs.
    ///
    /// A live engine receives only what changed, and only when it differs
    /// from the engine's own value. Options and the change callback's
    /// identity do not trigger any engine work.
    pub fn set_props(&mut self, props: EditorProps) {
        if self.is_unmounted() {
            return;
        }
        *self.on_change.borrow_mut() = props.on_change.clone();
        let next = props.snapshot();

        match self.state {
            WidgetState::Live => {
                if let Some(handle) = self.handle.as_mut() {
                    self.snapshot.reconcile(handle, &next);
                }
            }
            WidgetState::Loading | WidgetState::Failed => {
                if let Some(fallback) = self.fallback.as_mut() {
                    if fallback.set_value(&next.value) {
                        self.surface.set_value(&next.value);
                    }
                    fallback.set_locked(next.locked());
                }
                self.snapshot = next;
            }
        }
    }

    /// Route a user input to the active surface.
    ///
    /// Returns `true` if the content changed. Inputs are dropped after
    /// unmount.
    pub fn handle_input(&mut self, input: &EditInput) -> bool {
        if self.is_unmounted() {
            return false;
        }
        match self.state {
            WidgetState::Live => self
                .handle
                .as_mut()
                .and_then(EngineHandle::engine_mut)
                .is_some_and(|engine| engine.apply(input)),
            WidgetState::Loading | WidgetState::Failed => {
                let Some(fallback) = self.fallback.as_mut() else {
                    return false;
                };
                let changed = fallback.handle_input(input);
                if changed {
                    let value = fallback.value();
                    self.surface.set_value(&value);
                    // the engine is seeded from this once it arrives
                    self.snapshot.value = value;
                }
                changed
            }
        }
    }

    pub fn view(&self) -> EditorView {
        match self.state {
            WidgetState::Live => self
                .handle
                .as_ref()
                .and_then(EngineHandle::engine)
                .map_or_else(
                    || EditorView::Fallback(self.detached_view()),
                    |engine| EditorView::Engine(engine.view()),
                ),
            WidgetState::Failed => EditorView::Fallback(
                self.fallback
                    .as_ref()
                    .map_or_else(|| self.detached_view(), FallbackSurface::view),
            ),
            WidgetState::Loading => EditorView::Loading(
                self.fallback
                    .as_ref()
                    .map_or_else(|| self.detached_view(), FallbackSurface::view),
            ),
        }
    }

    /// Tear the widget down. Safe to call more than once.
    ///
    /// A load still in flight is abandoned by this widget only; the shared
    /// cache still records its outcome for other widgets.
    pub fn unmount(&mut self) {
        if self.is_unmounted() {
            return;
        }
        self.guard.dispose();
        self.pending = None;
        if let Some(handle) = self.handle.as_mut() {
            handle.dispose(&mut self.surface);
        }
        debug!(surface = self.surface.id(), state = ?self.state, "editor unmounted");
    }

    fn go_live(&mut self, constructor: &dyn EngineConstructor) {
        let options = self.options.with_defaults();
        let forward = self.forwarder();
        let config = EngineConfig {
            initial_value: &self.snapshot.value,
            options: &options,
            read_only: self.snapshot.locked(),
        };
        match EngineHandle::construct(constructor, &mut self.surface, &config, forward) {
            Ok(handle) => {
                self.handle = Some(handle);
                self.fallback = None;
                self.state = WidgetState::Live;
            }
            Err(err) => {
                warn!(
                    engine = constructor.name(),
                    surface = self.surface.id(),
                    error = %err,
                    "engine construction failed, using plain input"
                );
                self.fail(err.to_string());
            }
        }
    }

    /// Keep the plain surface for good. Text typed while loading stays.
    fn fail(&mut self, reason: String) {
        if self.fallback.is_none() {
            self.fallback = Some(FallbackSurface::new(
                &self.snapshot.value,
                self.snapshot.locked(),
                self.forwarder(),
            ));
        }
        self.failure = Some(reason);
        self.state = WidgetState::Failed;
    }

    /// Non-editable view of the host surface, used once no editing surface
    /// is left.
    fn detached_view(&self) -> SurfaceView {
        SurfaceView {
            lines: self.surface.value().lines().map(str::to_string).collect(),
            cursor: Cursor::new(),
            editable: false,
            toolbar: None,
            status: None,
            placeholder: None,
        }
    }

    /// A callback that forwards to whatever the owner most recently supplied
    /// and goes quiet after unmount.
    fn forwarder(&self) -> ChangeCallback {
        let current = Rc::clone(&self.on_change);
        let guard = self.guard.clone();
        Rc::new(move |value: &str| {
            if guard.is_disposed() {
                return;
            }
            let callback = current.borrow().clone();
            callback(value);
        })
    }
}

impl Drop for MarkdownEditor {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl std::fmt::Debug for MarkdownEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkdownEditor")
            .field("surface", &self.surface.id())
            .field("state", &self.state)
            .field("snapshot", &self.snapshot)
            .field("handle", &self.handle)
            .field("failure", &self.failure)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::ToolbarAction;
    use crate::host::{MemoryDocument, ResourceKind};
    use crate::loader::{DEFAULT_STYLE_URL, Fetcher, ResourceLoadError};
    use url::Url;

    const MANIFEST: &[u8] = br#"{"engine":"rope-md","version":"1.2.0"}"#;
    const WAIT: Duration = Duration::from_secs(5);

    struct StaticFetcher(Result<Vec<u8>, ResourceLoadError>);

    impl Fetcher for StaticFetcher {
        fn fetch(&self, _url: &Url) -> Result<Vec<u8>, ResourceLoadError> {
            self.0.clone()
        }
    }

    fn loader(body: Result<Vec<u8>, ResourceLoadError>) -> (Arc<ResourceLoader>, Arc<MemoryDocument>) {
        let document = Arc::new(MemoryDocument::new());
        let loader = ResourceLoader::new(Arc::new(StaticFetcher(body)), document.clone());
        (Arc::new(loader), document)
    }

    fn recorder() -> (ChangeCallback, Rc<RefCell<Vec<String>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        (
            Rc::new(move |v: &str| sink.borrow_mut().push(v.to_string())),
            seen,
        )
    }

    fn live_editor(value: &str) -> (MarkdownEditor, Rc<RefCell<Vec<String>>>) {
        let (loader, _) = loader(Ok(MANIFEST.to_vec()));
        let (callback, seen) = recorder();
        let mut editor = MarkdownEditor::mount(
            EditorProps::new(value, callback),
            HostSurface::textarea("md"),
            loader,
        );
        assert_eq!(editor.wait_until_settled(WAIT), WidgetState::Live);
        (editor, seen)
    }

    #[test]
    fn test_mount_links_stylesheet_and_loads() {
        let (loader, document) = loader(Ok(MANIFEST.to_vec()));
        let (callback, _) = recorder();
        let mut editor = MarkdownEditor::mount(
            EditorProps::new("# hi", callback),
            HostSurface::textarea("md"),
            Arc::clone(&loader),
        );
        assert_eq!(document.count(ResourceKind::Style, DEFAULT_STYLE_URL), 1);
        assert_eq!(editor.wait_until_settled(WAIT), WidgetState::Live);
        assert!(editor.surface().is_bound());
        assert_eq!(editor.value(), "# hi");
    }

    #[test]
    fn test_keystrokes_emit_once_each() {
        let (mut editor, seen) = live_editor("");
        editor.handle_input(&EditInput::Insert('a'));
        editor.handle_input(&EditInput::Insert('b'));
        assert_eq!(*seen.borrow(), vec!["a".to_string(), "ab".to_string()]);
    }

    #[test]
    fn test_rerender_with_same_props_writes_nothing() {
        let (mut editor, seen) = live_editor("text");
        editor.handle_input(&EditInput::End);
        let (callback, _) = recorder();
        editor.set_props(EditorProps::new("text", callback));
        assert!(seen.borrow().is_empty());
        let EditorView::Engine(view) = editor.view() else {
            panic!("expected engine view");
        };
        assert_eq!(view.cursor.col, 4);
    }

    #[test]
    fn test_latest_callback_receives_changes() {
        let (mut editor, first) = live_editor("");
        let (callback, second) = recorder();
        editor.set_props(EditorProps::new("", callback));
        editor.handle_input(&EditInput::Insert('z'));
        assert!(first.borrow().is_empty());
        assert_eq!(*second.borrow(), vec!["z".to_string()]);
    }

    #[test]
    fn test_read_only_round_trip() {
        let (mut editor, seen) = live_editor("abc");
        let (callback, _) = recorder();
        editor.set_props(EditorProps::new("abc", callback.clone()).with_read_only(true));
        assert!(!editor.handle_input(&EditInput::Insert('x')));
        let EditorView::Engine(view) = editor.view() else {
            panic!("expected engine view");
        };
        assert!(!view.editable);
        assert!(view.toolbar.is_none());

        editor.set_props(EditorProps::new("abc", Rc::clone(&callback)));
        let EditorView::Engine(view) = editor.view() else {
            panic!("expected engine view");
        };
        assert!(view.editable);
        assert!(view.toolbar.is_some());
        assert!(seen.borrow().is_empty());
        assert!(editor.handle_input(&EditInput::Toolbar(ToolbarAction::Bold)));
        assert_eq!(*seen.borrow(), vec!["****abc".to_string()]);
    }

    #[test]
    fn test_failed_load_falls_back_with_value() {
        let (loader, _) = loader(Err(ResourceLoadError::Status {
            url: crate::loader::DEFAULT_SCRIPT_URL.to_string(),
            status: 404,
        }));
        let (callback, seen) = recorder();
        let mut editor = MarkdownEditor::mount(
            EditorProps::new("keep me", callback),
            HostSurface::textarea("md"),
            loader,
        );
        assert_eq!(editor.wait_until_settled(WAIT), WidgetState::Failed);
        assert!(editor.failure().is_some_and(|reason| reason.contains("404")));
        assert_eq!(editor.value(), "keep me");

        editor.handle_input(&EditInput::End);
        editor.handle_input(&EditInput::Insert('!'));
        assert_eq!(*seen.borrow(), vec!["keep me!".to_string()]);
        assert_eq!(editor.surface().value(), "keep me!");
        assert!(matches!(editor.view(), EditorView::Fallback(_)));
    }

    #[test]
    fn test_unmount_restores_surface_and_silences_callback() {
        let (mut editor, seen) = live_editor("body");
        editor.unmount();
        editor.unmount();
        assert!(editor.is_unmounted());
        assert!(!editor.surface().is_bound());
        assert_eq!(editor.surface().value(), "body");
        assert!(!editor.handle_input(&EditInput::Insert('x')));
        let (callback, _) = recorder();
        editor.set_props(EditorProps::new("ignored", callback));
        assert!(seen.borrow().is_empty());
    }
}
