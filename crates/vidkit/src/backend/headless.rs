//! Headless backend
//!
//! An in-memory platform: displays, clipboard and window state live in a
//! shared [`HeadlessState`] that a [`HeadlessHandle`] can script and inspect
//! after the backend has been handed to the video subsystem. Every call is
//! recorded in a call log.
//!
//! With synchronous events enabled (the default) the window events a real
//! window manager would send are queued during the call itself, so the core
//! observes them before the original operation returns. Otherwise they are
//! held back until [`HeadlessHandle::deliver_deferred`].

use super::{BackendCapabilities, FullscreenOp, FullscreenResult, VideoBackend};
use crate::display::{Display, DisplayDesc, DisplayMode};
use crate::error::{VideoError, VideoResult};
use crate::events::{ClipboardOwner, PlatformEvent, WindowEvent};
use crate::foundation::collections::{DisplayId, WindowId};
use crate::foundation::math::Rect;
use crate::window::Window;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

/// A backend call, as recorded in the call log
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    /// Display switched to a mode
    SetDisplayMode {
        /// Target display
        display: DisplayId,
        /// Mode size
        w: i32,
        /// Mode size
        h: i32,
    },
    /// Native window created
    CreateWindow(WindowId),
    /// Native window destroyed
    DestroyWindow(WindowId),
    /// Title applied
    SetWindowTitle(WindowId, String),
    /// Window moved
    SetWindowPosition(WindowId, i32, i32),
    /// Window resized
    SetWindowSize(WindowId, i32, i32),
    /// Window shown
    ShowWindow(WindowId),
    /// Window hidden
    HideWindow(WindowId),
    /// Window raised
    RaiseWindow(WindowId),
    /// Window minimized
    MinimizeWindow(WindowId),
    /// Window maximized
    MaximizeWindow(WindowId),
    /// Window restored
    RestoreWindow(WindowId),
    /// Window flashed
    FlashWindow(WindowId),
    /// Fullscreen transition
    SetWindowFullscreen {
        /// Window
        window: WindowId,
        /// Display
        display: DisplayId,
        /// Transition
        op: FullscreenOp,
    },
    /// Pointer warped
    WarpMouse(WindowId),
    /// Clipboard ownership announced
    SetClipboardData(Vec<String>),
    /// Clipboard text set
    SetClipboardText(String),
    /// Primary selection set
    SetPrimarySelectionText(String),
}

/// A display known to the headless backend
#[derive(Debug, Clone)]
pub struct HeadlessDisplay {
    /// What is reported to the core
    pub desc: DisplayDesc,
    /// Bounds; `None` leaves the layout to the core
    pub bounds: Option<Rect>,
    /// Usable bounds
    pub usable_bounds: Option<Rect>,
    /// Fullscreen catalog
    pub modes: Vec<DisplayMode>,
    id: Option<DisplayId>,
}

impl HeadlessDisplay {
    /// A display with the given desktop mode and an empty catalog
    pub fn new(desktop_mode: DisplayMode) -> Self {
        Self {
            desc: DisplayDesc::new(desktop_mode),
            bounds: None,
            usable_bounds: None,
            modes: Vec::new(),
            id: None,
        }
    }

    /// Set the name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.desc.name = Some(name.into());
        self
    }

    /// Set the bounds
    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Set the usable bounds
    pub fn with_usable_bounds(mut self, bounds: Rect) -> Self {
        self.usable_bounds = Some(bounds);
        self
    }

    /// Set the fullscreen catalog
    pub fn with_modes(mut self, modes: Vec<DisplayMode>) -> Self {
        self.modes = modes;
        self
    }

    /// Set the content scale
    pub fn with_content_scale(mut self, scale: f32) -> Self {
        self.desc.content_scale = scale;
        self
    }
}

/// State shared between the backend and its handles
#[derive(Debug)]
pub struct HeadlessState {
    displays: Vec<HeadlessDisplay>,
    capabilities: BackendCapabilities,
    synchronous_events: bool,
    fullscreen_results: VecDeque<FullscreenResult>,
    fail_mode_switch: bool,
    fail_hide: Option<WindowId>,
    outbox: VecDeque<PlatformEvent>,
    deferred: VecDeque<PlatformEvent>,
    calls: Vec<BackendCall>,
    external_clipboard: HashMap<String, Vec<u8>>,
    clipboard_text: Option<String>,
    primary_selection_text: Option<String>,
}

impl HeadlessState {
    fn emit(&mut self, event: PlatformEvent) {
        if self.synchronous_events {
            self.outbox.push_back(event);
        } else {
            self.deferred.push_back(event);
        }
    }

    fn emit_window(&mut self, window: WindowId, event: WindowEvent) {
        self.emit(PlatformEvent::Window(window, event));
    }

    fn display(&self, display: &Display) -> Option<&HeadlessDisplay> {
        usize::try_from(display.driver_tag())
            .ok()
            .and_then(|index| self.displays.get(index))
    }
}

/// Headless video backend
#[derive(Debug)]
pub struct HeadlessBackend {
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessBackend {
    /// Backend with one 1920x1080@60 display
    pub fn new() -> Self {
        let desktop = DisplayMode::new(1920, 1080).with_refresh_hz(60);
        Self::empty().with_display(
            HeadlessDisplay::new(desktop)
                .with_name("Headless")
                .with_modes(vec![desktop, DisplayMode::new(1280, 720).with_refresh_hz(60)]),
        )
    }

    /// Backend without displays
    pub fn empty() -> Self {
        Self {
            state: Rc::new(RefCell::new(HeadlessState {
                displays: Vec::new(),
                capabilities: BackendCapabilities::POPUP_WINDOWS
                    | BackendCapabilities::OPENGL
                    | BackendCapabilities::VULKAN
                    | BackendCapabilities::CLIPBOARD_DATA,
                synchronous_events: true,
                fullscreen_results: VecDeque::new(),
                fail_mode_switch: false,
                fail_hide: None,
                outbox: VecDeque::new(),
                deferred: VecDeque::new(),
                calls: Vec::new(),
                external_clipboard: HashMap::new(),
                clipboard_text: None,
                primary_selection_text: None,
            })),
        }
    }

    /// Add a display reported at startup
    pub fn with_display(self, display: HeadlessDisplay) -> Self {
        self.state.borrow_mut().displays.push(display);
        self
    }

    /// Replace the declared capabilities
    pub fn with_capabilities(self, capabilities: BackendCapabilities) -> Self {
        self.state.borrow_mut().capabilities = capabilities;
        self
    }

    /// Choose whether window events are delivered during the call
    pub fn with_synchronous_events(self, synchronous: bool) -> Self {
        self.state.borrow_mut().synchronous_events = synchronous;
        self
    }

    /// Handle for scripting and inspecting the backend
    pub fn handle(&self) -> HeadlessHandle {
        HeadlessHandle { state: Rc::clone(&self.state) }
    }

    fn record(&self, call: BackendCall) {
        log::trace!("headless: {:?}", call);
        self.state.borrow_mut().calls.push(call);
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoBackend for HeadlessBackend {
    fn name(&self) -> &str {
        "headless"
    }

    fn capabilities(&self) -> BackendCapabilities {
        self.state.borrow().capabilities
    }

    fn init(&mut self) -> VideoResult<Vec<DisplayDesc>> {
        let state = self.state.borrow();
        Ok(state
            .displays
            .iter()
            .enumerate()
            .map(|(index, display)| display.desc.clone().with_driver_tag(index as u64))
            .collect())
    }

    fn shutdown(&mut self) {
        let mut state = self.state.borrow_mut();
        state.outbox.clear();
        state.deferred.clear();
    }

    fn display_added(&mut self, id: DisplayId, display: &Display) {
        let mut state = self.state.borrow_mut();
        if let Ok(index) = usize::try_from(display.driver_tag()) {
            if let Some(entry) = state.displays.get_mut(index) {
                entry.id = Some(id);
            }
        }
    }

    fn display_removed(&mut self, id: DisplayId) {
        let mut state = self.state.borrow_mut();
        for display in &mut state.displays {
            if display.id == Some(id) {
                display.id = None;
            }
        }
    }

    fn display_modes(&mut self, display: &Display) -> Vec<DisplayMode> {
        self.state
            .borrow()
            .display(display)
            .map(|entry| entry.modes.clone())
            .unwrap_or_default()
    }

    fn display_bounds(&mut self, display: &Display) -> Option<Rect> {
        self.state.borrow().display(display).and_then(|entry| entry.bounds)
    }

    fn display_usable_bounds(&mut self, display: &Display) -> Option<Rect> {
        self.state.borrow().display(display).and_then(|entry| entry.usable_bounds)
    }

    fn set_display_mode(&mut self, display: &Display, mode: &DisplayMode) -> VideoResult<()> {
        if self.state.borrow().fail_mode_switch {
            return Err(VideoError::BackendFailed(format!("mode {} rejected", mode)));
        }
        self.record(BackendCall::SetDisplayMode { display: display.id(), w: mode.w, h: mode.h });
        Ok(())
    }

    fn create_window(&mut self, window: &Window) -> VideoResult<()> {
        self.record(BackendCall::CreateWindow(window.id()));
        Ok(())
    }

    fn destroy_window(&mut self, window: &Window) {
        self.record(BackendCall::DestroyWindow(window.id()));
    }

    fn set_window_title(&mut self, window: &Window) -> VideoResult<()> {
        self.record(BackendCall::SetWindowTitle(window.id(), window.title().to_string()));
        Ok(())
    }

    fn set_window_position(&mut self, window: &Window) -> VideoResult<()> {
        let pending = window.pending_geometry();
        let x = pending.x.unwrap_or(window.rect().x);
        let y = pending.y.unwrap_or(window.rect().y);
        self.record(BackendCall::SetWindowPosition(window.id(), x, y));
        self.state.borrow_mut().emit_window(window.id(), WindowEvent::Moved { x, y });
        Ok(())
    }

    fn set_window_size(&mut self, window: &Window) -> VideoResult<()> {
        let pending = window.pending_geometry();
        let w = pending.w.unwrap_or(window.rect().w);
        let h = pending.h.unwrap_or(window.rect().h);
        self.record(BackendCall::SetWindowSize(window.id(), w, h));
        self.state.borrow_mut().emit_window(window.id(), WindowEvent::Resized { w, h });
        Ok(())
    }

    fn set_window_minimum_size(&mut self, _window: &Window) -> VideoResult<()> {
        Ok(())
    }

    fn set_window_maximum_size(&mut self, _window: &Window) -> VideoResult<()> {
        Ok(())
    }

    fn set_window_bordered(&mut self, _window: &Window, _bordered: bool) -> VideoResult<()> {
        Ok(())
    }

    fn set_window_resizable(&mut self, _window: &Window, _resizable: bool) -> VideoResult<()> {
        Ok(())
    }

    fn set_window_always_on_top(&mut self, _window: &Window, _on_top: bool) -> VideoResult<()> {
        Ok(())
    }

    fn show_window(&mut self, window: &Window) -> VideoResult<()> {
        self.record(BackendCall::ShowWindow(window.id()));
        self.state.borrow_mut().emit_window(window.id(), WindowEvent::Shown);
        Ok(())
    }

    fn hide_window(&mut self, window: &Window) -> VideoResult<()> {
        if self.state.borrow().fail_hide == Some(window.id()) {
            return Err(VideoError::BackendFailed("hide rejected".to_string()));
        }
        self.record(BackendCall::HideWindow(window.id()));
        self.state.borrow_mut().emit_window(window.id(), WindowEvent::Hidden);
        Ok(())
    }

    fn raise_window(&mut self, window: &Window) -> VideoResult<()> {
        self.record(BackendCall::RaiseWindow(window.id()));
        Ok(())
    }

    fn minimize_window(&mut self, window: &Window) -> VideoResult<()> {
        self.record(BackendCall::MinimizeWindow(window.id()));
        self.state.borrow_mut().emit_window(window.id(), WindowEvent::Minimized);
        Ok(())
    }

    fn maximize_window(&mut self, window: &Window) -> VideoResult<()> {
        self.record(BackendCall::MaximizeWindow(window.id()));
        self.state.borrow_mut().emit_window(window.id(), WindowEvent::Maximized);
        Ok(())
    }

    fn restore_window(&mut self, window: &Window) -> VideoResult<()> {
        self.record(BackendCall::RestoreWindow(window.id()));
        self.state.borrow_mut().emit_window(window.id(), WindowEvent::Restored);
        Ok(())
    }

    fn flash_window(&mut self, window: &Window) -> VideoResult<()> {
        self.record(BackendCall::FlashWindow(window.id()));
        Ok(())
    }

    fn set_window_fullscreen(&mut self, window: &Window, display: &Display, op: FullscreenOp) -> FullscreenResult {
        self.record(BackendCall::SetWindowFullscreen { window: window.id(), display: display.id(), op });

        let mut state = self.state.borrow_mut();
        let result = state.fullscreen_results.pop_front().unwrap_or(FullscreenResult::Succeeded);
        if result != FullscreenResult::Succeeded {
            return result;
        }

        let id = window.id();
        if op.is_enter() {
            state.emit_window(id, WindowEvent::EnterFullscreen);
            if state.capabilities.contains(BackendCapabilities::REPORTS_FULLSCREEN_DIMENSIONS) {
                let origin = state.display(display).and_then(|entry| entry.bounds).unwrap_or_default();
                let mode = if op == FullscreenOp::EnterExclusive {
                    *display.current_mode()
                } else {
                    *display.desktop_mode()
                };
                state.emit_window(id, WindowEvent::Resized { w: mode.w, h: mode.h });
                state.emit_window(id, WindowEvent::Moved { x: origin.x, y: origin.y });
            }
        } else {
            state.emit_window(id, WindowEvent::LeaveFullscreen);
            if state.capabilities.contains(BackendCapabilities::REPORTS_FULLSCREEN_DIMENSIONS) {
                let floating = window.floating_rect();
                state.emit_window(id, WindowEvent::Resized { w: floating.w, h: floating.h });
                state.emit_window(id, WindowEvent::Moved { x: floating.x, y: floating.y });
            }
        }
        result
    }

    fn warp_mouse(&mut self, window: &Window, _x: f32, _y: f32) {
        self.record(BackendCall::WarpMouse(window.id()));
    }

    fn set_clipboard_data(&mut self, mime_types: &[String]) -> VideoResult<()> {
        self.record(BackendCall::SetClipboardData(mime_types.to_vec()));
        self.state.borrow_mut().external_clipboard.clear();
        Ok(())
    }

    fn clipboard_data(&mut self, mime_type: &str) -> Option<Vec<u8>> {
        self.state.borrow().external_clipboard.get(mime_type).cloned()
    }

    fn has_clipboard_data(&mut self, mime_type: &str) -> bool {
        self.state.borrow().external_clipboard.contains_key(mime_type)
    }

    fn set_clipboard_text(&mut self, text: &str) -> VideoResult<()> {
        self.record(BackendCall::SetClipboardText(text.to_string()));
        self.state.borrow_mut().clipboard_text = Some(text.to_string());
        Ok(())
    }

    fn clipboard_text(&mut self) -> Option<String> {
        self.state.borrow().clipboard_text.clone()
    }

    fn has_clipboard_text(&mut self) -> Option<bool> {
        Some(self.state.borrow().clipboard_text.as_deref().is_some_and(|text| !text.is_empty()))
    }

    fn set_primary_selection_text(&mut self, text: &str) -> VideoResult<()> {
        self.record(BackendCall::SetPrimarySelectionText(text.to_string()));
        self.state.borrow_mut().primary_selection_text = Some(text.to_string());
        Ok(())
    }

    fn primary_selection_text(&mut self) -> Option<String> {
        self.state.borrow().primary_selection_text.clone()
    }

    fn has_primary_selection_text(&mut self) -> Option<bool> {
        Some(
            self.state
                .borrow()
                .primary_selection_text
                .as_deref()
                .is_some_and(|text| !text.is_empty()),
        )
    }

    fn poll_event(&mut self) -> Option<PlatformEvent> {
        self.state.borrow_mut().outbox.pop_front()
    }
}

/// Scripting and inspection handle for a [`HeadlessBackend`]
#[derive(Debug, Clone)]
pub struct HeadlessHandle {
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessHandle {
    /// Calls recorded so far
    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.borrow().calls.clone()
    }

    /// Forget recorded calls
    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Recorded fullscreen transitions
    pub fn fullscreen_calls(&self) -> Vec<(WindowId, DisplayId, FullscreenOp)> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::SetWindowFullscreen { window, display, op } => Some((*window, *display, *op)),
                _ => None,
            })
            .collect()
    }

    /// Result for the next fullscreen transition; later ones default to
    /// `Succeeded`
    pub fn script_fullscreen(&self, result: FullscreenResult) {
        self.state.borrow_mut().fullscreen_results.push_back(result);
    }

    /// Make display mode switches fail
    pub fn set_fail_mode_switch(&self, fail: bool) {
        self.state.borrow_mut().fail_mode_switch = fail;
    }

    /// Make hiding one window fail
    pub fn set_fail_hide(&self, window: Option<WindowId>) {
        self.state.borrow_mut().fail_hide = window;
    }

    /// Choose whether window events are delivered during the call
    pub fn set_synchronous_events(&self, synchronous: bool) {
        self.state.borrow_mut().synchronous_events = synchronous;
    }

    /// Release held-back window events to the core
    pub fn deliver_deferred(&self) {
        let mut state = self.state.borrow_mut();
        let deferred = std::mem::take(&mut state.deferred);
        state.outbox.extend(deferred);
    }

    /// Queue an arbitrary notification
    pub fn push_event(&self, event: PlatformEvent) {
        self.state.borrow_mut().outbox.push_back(event);
    }

    /// Hot-plug a display
    pub fn attach_display(&self, display: HeadlessDisplay) {
        let mut state = self.state.borrow_mut();
        let tag = state.displays.len() as u64;
        let desc = display.desc.clone().with_driver_tag(tag);
        state.displays.push(display);
        state.outbox.push_back(PlatformEvent::DisplayAdded(desc));
    }

    /// Unplug a display
    pub fn detach_display(&self, id: DisplayId) {
        self.state.borrow_mut().outbox.push_back(PlatformEvent::DisplayRemoved(id));
    }

    /// Another application takes the clipboard
    pub fn set_external_clipboard(&self, contents: Vec<(String, Vec<u8>)>) {
        let mut state = self.state.borrow_mut();
        let mime_types = contents.iter().map(|(mime_type, _)| mime_type.clone()).collect();
        state.external_clipboard = contents.into_iter().collect();
        state.outbox.push_back(PlatformEvent::ClipboardUpdated {
            owner: ClipboardOwner::External,
            mime_types,
        });
    }
}
