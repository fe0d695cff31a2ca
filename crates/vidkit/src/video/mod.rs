//! # Video subsystem
//!
//! The context object that owns the active backend, the display and window
//! registries, the clipboard and the outbound event queue. It replaces any
//! notion of a global "current video device": everything the core does goes
//! through one `VideoSubsystem` value on the thread that created it.
//!
//! ## Re-entrancy
//!
//! Backends may report state changes while one of their calls is still
//! running. Those notifications are queued in the backend and drained by
//! [`VideoSubsystem::drain_backend`] right after every backend call, so their
//! effects are visible before the original operation returns. Draining nests
//! up to [`MAX_DRAIN_DEPTH`] levels; anything deeper is picked up by the
//! enclosing drain loop.
//!
//! ## Errors
//!
//! Every public operation returns a [`VideoResult`]. Failures are also kept as
//! a last-error message that callers can read back with
//! [`VideoSubsystem::last_error`].

mod clipboard;
mod dispatch;
mod displays;
mod fullscreen;
mod windows;

#[cfg(test)]
mod tests;

use crate::backend::{create_backend, BackendCapabilities, BackendKind, VideoBackend};
use crate::clipboard::ClipboardState;
use crate::config::{hints, Hints, VideoConfig};
use crate::display::DisplayRegistry;
use crate::error::{VideoError, VideoResult};
use crate::events::{Event, EventArg, EventHandler, EventSystem, EventType, PlatformEvent};
use crate::foundation::collections::{DisplayId, WindowId};
use crate::foundation::math::Rect;
use crate::foundation::time::Stopwatch;
use crate::window::WindowRegistry;
use std::cell::RefCell;
use std::time::Instant;

/// How deeply backend notifications may be drained recursively
pub const MAX_DRAIN_DEPTH: u32 = 8;

/// Keyboard and pointer focus bookkeeping
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct FocusState {
    pub(crate) keyboard: Option<WindowId>,
    pub(crate) mouse: Option<WindowId>,
    pub(crate) mouse_position: (f32, f32),
    pub(crate) grabbed: Option<WindowId>,
}

/// The video subsystem
pub struct VideoSubsystem {
    backend: Box<dyn VideoBackend>,
    capabilities: BackendCapabilities,
    hints: Hints,
    displays: DisplayRegistry,
    windows: WindowRegistry,
    clipboard: ClipboardState,
    events: EventSystem,
    clock: Stopwatch,
    focus: FocusState,
    gl_window: Option<WindowId>,
    desktop_area: Rect,
    last_error: RefCell<Option<String>>,
    drain_depth: u32,
    initialized: bool,
}

impl VideoSubsystem {
    /// Start the subsystem on `backend`
    ///
    /// Registers every display the backend reports. A backend reporting no
    /// display is an error.
    pub fn init(mut backend: Box<dyn VideoBackend>, hints: Hints) -> VideoResult<Self> {
        log::info!("Initializing video subsystem on the {} backend", backend.name());
        let capabilities = backend.capabilities();
        let descs = backend.init()?;
        if descs.is_empty() {
            backend.shutdown();
            return Err(VideoError::NoDisplays);
        }

        let mut video = Self {
            backend,
            capabilities,
            hints,
            displays: DisplayRegistry::new(),
            windows: WindowRegistry::new(),
            clipboard: ClipboardState::new(),
            events: EventSystem::new(),
            clock: Stopwatch::new(),
            focus: FocusState::default(),
            gl_window: None,
            desktop_area: Rect::default(),
            last_error: RefCell::new(None),
            drain_depth: 0,
            initialized: true,
        };
        for desc in descs {
            video.add_display(desc, false);
        }
        video.update_desktop_area();
        log::info!(
            "Video subsystem ready: {} display(s), desktop {}",
            video.displays.len(),
            video.desktop_area
        );
        Ok(video)
    }

    /// Start the subsystem from a configuration file's settings
    pub fn from_config(kind: BackendKind, config: &VideoConfig) -> VideoResult<Self> {
        config
            .validate()
            .map_err(|e| VideoError::invalid_param("config", e.to_string()))?;
        Self::init(create_backend(kind), config.to_hints())
    }

    /// Destroy every window, restore display modes and stop the backend
    pub fn shutdown(&mut self) {
        if !self.initialized {
            return;
        }
        log::info!("Shutting down video subsystem");
        let toplevel: Vec<WindowId> = self
            .windows
            .iter()
            .filter(|window| window.parent.is_none())
            .map(|window| window.id)
            .collect();
        for id in toplevel {
            if let Err(e) = self.destroy_window_internal(id) {
                log::debug!("Destroying window during shutdown failed: {}", e);
            }
        }
        for id in self.displays.ids() {
            if let Err(e) = self.set_display_mode_for_display(id, None) {
                log::warn!("Couldn't restore desktop mode on display {}: {}", id, e);
            }
        }
        if let Some(sequence) = self.clipboard.clear() {
            log::debug!("Clipboard provision dropped at shutdown (sequence {})", sequence);
        }
        self.backend.shutdown();
        self.events.clear();
        self.initialized = false;
    }

    /// Whether the subsystem is running
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Name of the active backend
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Capabilities the active backend declared
    pub fn capabilities(&self) -> BackendCapabilities {
        self.capabilities
    }

    /// Runtime options
    pub fn hints(&self) -> &Hints {
        &self.hints
    }

    /// Change a runtime option
    pub fn set_hint(&mut self, key: &str, value: &str) {
        self.hints.set(key, value);
    }

    /// Message of the most recent failure
    pub fn last_error(&self) -> Option<String> {
        self.last_error.borrow().clone()
    }

    /// Forget the most recent failure
    pub fn clear_error(&self) {
        self.last_error.borrow_mut().take();
    }

    /// Bounding rectangle of all displays
    pub fn desktop_area(&self) -> Rect {
        self.desktop_area
    }

    // ---- Event queue ----

    /// Take the oldest outbound event
    pub fn poll_event(&mut self) -> Option<Event> {
        self.events.poll_event()
    }

    /// Register a handler for an outbound event type
    pub fn register_handler(&mut self, event_type: EventType, handler: Box<dyn EventHandler>) {
        self.events.register_handler(event_type, handler);
    }

    /// Run registered handlers over the queued events
    ///
    /// Returns the events no handler consumed.
    pub fn deliver_events(&mut self) -> Vec<Event> {
        self.events.dispatch()
    }

    /// Outbound event queue
    pub fn events(&self) -> &EventSystem {
        &self.events
    }

    /// Outbound event queue, mutably
    pub fn events_mut(&mut self) -> &mut EventSystem {
        &mut self.events
    }

    /// Apply a notification from the backend
    pub fn dispatch(&mut self, event: PlatformEvent) {
        if !self.initialized {
            log::trace!("Dropping {:?}: video subsystem is shut down", event);
            return;
        }
        self.apply_platform_event(event);
        self.drain_backend();
    }

    /// Drain pending backend notifications and check fullscreen deadlines
    pub fn pump_events(&mut self) {
        self.pump_events_at(Instant::now());
    }

    /// [`pump_events`](Self::pump_events) with an explicit clock reading
    pub fn pump_events_at(&mut self, now: Instant) {
        if !self.initialized {
            return;
        }
        self.drain_backend();
        self.check_fullscreen_deadlines(now);
    }

    /// Apply every notification the backend has queued
    pub(crate) fn drain_backend(&mut self) {
        if self.drain_depth >= MAX_DRAIN_DEPTH {
            log::warn!("Backend notifications nested {} deep; deferring", self.drain_depth);
            return;
        }
        self.drain_depth += 1;
        while let Some(event) = self.backend.poll_event() {
            self.apply_platform_event(event);
        }
        self.drain_depth -= 1;
    }

    // ---- Error tracking ----

    fn ensure_initialized(&self) -> VideoResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(VideoError::NotInitialized)
        }
    }

    /// Run a mutating operation, recording its failure
    pub(crate) fn tracked<T>(&mut self, op: impl FnOnce(&mut Self) -> VideoResult<T>) -> VideoResult<T> {
        let result = self.ensure_initialized().and_then(|()| op(self));
        self.record(result)
    }

    /// Record the failure of a query
    pub(crate) fn record<T>(&self, result: VideoResult<T>) -> VideoResult<T> {
        if let Err(e) = &result {
            self.note_error(e);
        }
        result
    }

    /// Remember an error for `last_error` without returning it
    pub(crate) fn note_error(&self, e: &VideoError) {
        log::debug!("Video error: {}", e);
        *self.last_error.borrow_mut() = Some(e.to_string());
    }

    // ---- Event construction ----

    fn event(&self, event_type: EventType) -> Event {
        Event::new(event_type, self.clock.elapsed_secs())
    }

    pub(crate) fn window_event(&self, event_type: EventType, window: WindowId) -> Event {
        self.event(event_type).with_arg("window", EventArg::Window(window))
    }

    pub(crate) fn display_event(&self, event_type: EventType, display: DisplayId) -> Event {
        self.event(event_type).with_arg("display", EventArg::Display(display))
    }

    pub(crate) fn clipboard_event(&self, event_type: EventType) -> Event {
        self.event(event_type)
            .with_arg("sequence", EventArg::Sequence(self.clipboard.sequence()))
    }

    pub(crate) fn emit(&mut self, event: Event) {
        self.events.send(event);
    }

    // ---- Effective options ----

    /// Mode switches are emulated per window; the hint overrides the backend
    pub(crate) fn mode_switching_emulated(&self) -> bool {
        self.hints.get_bool(hints::MODE_SWITCHING_EMULATED).unwrap_or_else(|| {
            self.capabilities.contains(BackendCapabilities::MODE_SWITCHING_EMULATED)
        })
    }

    pub(crate) fn reports_fullscreen_dimensions(&self) -> bool {
        self.hints
            .get_bool(hints::BACKEND_REPORTS_FULLSCREEN_DIMENSIONS)
            .unwrap_or_else(|| self.capabilities.contains(BackendCapabilities::REPORTS_FULLSCREEN_DIMENSIONS))
    }

    pub(crate) fn fullscreen_mouse_warp_disabled(&self) -> bool {
        self.hints.get_bool_or(hints::DISABLE_FULLSCREEN_MOUSE_WARP, false)
            || self.capabilities.contains(BackendCapabilities::NO_FULLSCREEN_MOUSE_WARP)
    }

    pub(crate) fn sync_window_operations(&self) -> bool {
        self.hints.get_bool_or(hints::SYNC_WINDOW_OPERATIONS, false)
    }
}

impl Drop for VideoSubsystem {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for VideoSubsystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoSubsystem")
            .field("backend", &self.backend.name())
            .field("displays", &self.displays.len())
            .field("windows", &self.windows.len())
            .field("clipboard", &self.clipboard)
            .field("events", &self.events)
            .field("initialized", &self.initialized)
            .finish_non_exhaustive()
    }
}

/// Treat a missing backend capability as success
pub(crate) fn allow_unsupported(result: VideoResult<()>) -> VideoResult<()> {
    match result {
        Err(e) if e.is_unsupported() => {
            log::debug!("{}", e);
            Ok(())
        }
        other => other,
    }
}
