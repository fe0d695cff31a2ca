//! Backend notification handling
//!
//! Every [`PlatformEvent`] lands here, either through
//! [`VideoSubsystem::dispatch`] or while draining a backend call. Handlers
//! update the registries first and then queue the matching outbound event;
//! changes that don't alter anything are swallowed.

use super::fullscreen::Transition;
use super::VideoSubsystem;
use crate::backend::BackendCapabilities;
use crate::events::{ClipboardOwner, EventArg, EventType, PlatformEvent, WindowEvent};
use crate::foundation::collections::{DisplayId, WindowId};
use crate::window::{FullscreenState, WindowFlags};

impl VideoSubsystem {
    pub(crate) fn apply_platform_event(&mut self, event: PlatformEvent) {
        log::trace!("Platform event: {:?}", event);
        match event {
            PlatformEvent::DisplayAdded(desc) => {
                let id = self.add_display(desc, true);
                log::info!("Display {} attached", id);
            }
            PlatformEvent::DisplayRemoved(id) => self.remove_display(id),
            PlatformEvent::DisplayMoved(id) => self.on_display_moved(id),
            PlatformEvent::DisplayDesktopModeChanged(id, mode) => self.on_desktop_mode_changed(id, mode),
            PlatformEvent::DisplayContentScaleChanged(id, scale) => self.on_content_scale_changed(id, scale),
            PlatformEvent::DisplayHdrChanged(id, hdr) => self.on_hdr_changed(id, hdr),
            PlatformEvent::DisplayOrientationChanged(id, orientation) => self.on_orientation_changed(id, orientation),
            PlatformEvent::Window(id, event) => {
                if self.windows.contains(id) {
                    self.apply_window_event(id, event);
                } else {
                    log::trace!("Dropping {:?} for unknown window {:?}", event, id);
                }
            }
            PlatformEvent::MouseMoved { window, x, y } => self.on_mouse_moved(window, x, y),
            PlatformEvent::ClipboardUpdated { owner, mime_types } => self.on_clipboard_updated(owner, mime_types),
            PlatformEvent::ClipboardCancelled { sequence } => {
                if self.clipboard.cancel(sequence) {
                    let event = self
                        .event(EventType::ClipboardCancelled)
                        .with_arg("sequence", EventArg::Sequence(sequence));
                    self.emit(event);
                }
            }
        }
    }

    fn apply_window_event(&mut self, id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::Shown => self.on_window_shown(id),
            WindowEvent::Hidden => self.on_window_hidden(id),
            WindowEvent::Moved { x, y } => self.on_window_moved(id, x, y),
            WindowEvent::Resized { w, h } => self.on_window_resized(id, w, h),
            WindowEvent::PixelSizeChanged => self.check_window_pixel_size_changed(id),
            WindowEvent::Minimized => self.on_window_minimized(id),
            WindowEvent::Maximized => self.on_window_maximized(id),
            WindowEvent::Restored => self.on_window_restored(id),
            WindowEvent::EnterFullscreen => self.on_enter_fullscreen(id),
            WindowEvent::LeaveFullscreen => self.on_leave_fullscreen(id),
            WindowEvent::DisplayChanged(display) => {
                if self.displays.contains(display) {
                    self.on_window_display_changed(id, display);
                }
            }
            WindowEvent::FocusGained => self.set_keyboard_focus(Some(id)),
            WindowEvent::FocusLost => {
                if self.focus.keyboard == Some(id) {
                    self.set_keyboard_focus(None);
                }
            }
            WindowEvent::Destroyed => {
                let destroying = self.windows.get(id).map_or(true, |window| window.is_destroying);
                if !destroying {
                    if let Err(e) = self.destroy_window_internal(id) {
                        log::warn!("Destroying {:?} after platform request failed: {}", id, e);
                    }
                }
            }
        }
    }

    fn update_fullscreen_logged(&mut self, id: WindowId, transition: Transition, commit: bool) {
        if let Err(e) = self.update_fullscreen(id, transition, commit) {
            log::warn!("Fullscreen {:?} for {:?} failed: {}", transition, id, e);
        }
    }

    // ---- Visibility ----

    pub(crate) fn on_window_shown(&mut self, id: WindowId) {
        let Ok(window) = self.windows.get_mut(id) else { return };
        if window.is_visible() {
            return;
        }
        window.flags.remove(WindowFlags::HIDDEN | WindowFlags::MINIMIZED);
        let pending = window.pending_flags.take();
        let event = self.window_event(EventType::WindowShown, id);
        self.emit(event);
        if let Some(flags) = pending {
            self.apply_window_flags(id, flags);
        }
    }

    pub(crate) fn on_window_hidden(&mut self, id: WindowId) {
        let Ok(window) = self.windows.get_mut(id) else { return };
        if !window.is_visible() {
            return;
        }
        window.flags.insert(WindowFlags::HIDDEN);
        let kept = window.flags & (WindowFlags::FULLSCREEN | WindowFlags::MAXIMIZED);
        *window.pending_flags.get_or_insert_with(WindowFlags::empty) |= kept;
        let event = self.window_event(EventType::WindowHidden, id);
        self.emit(event);
        self.update_fullscreen_logged(id, Transition::Leave, false);
    }

    // ---- Geometry ----

    pub(crate) fn on_window_moved(&mut self, id: WindowId, x: i32, y: i32) {
        let Ok(window) = self.windows.get_mut(id) else { return };
        window.pending.x = None;
        window.pending.y = None;
        if window.rect.x == x && window.rect.y == y {
            return;
        }
        if window.is_floating() {
            window.floating.x = x;
            window.floating.y = y;
        }
        window.rect.x = x;
        window.rect.y = y;
        window.undefined_x = false;
        window.undefined_y = false;
        let event = self
            .window_event(EventType::WindowMoved, id)
            .with_arg("position", EventArg::Position(x, y));
        self.emit(event);
        self.check_window_display_changed(id);
    }

    pub(crate) fn on_window_resized(&mut self, id: WindowId, w: i32, h: i32) {
        let Ok(window) = self.windows.get_mut(id) else { return };
        window.pending.w = None;
        window.pending.h = None;
        if window.rect.w == w && window.rect.h == h {
            return;
        }
        if window.is_floating() {
            window.floating.w = w;
            window.floating.h = h;
        }
        window.rect.w = w;
        window.rect.h = h;
        let event = self
            .window_event(EventType::WindowResized, id)
            .with_arg("size", EventArg::Size(w, h));
        self.emit(event);
        self.check_window_pixel_size_changed(id);
        self.check_window_display_changed(id);
    }

    // ---- State ----

    fn on_window_minimized(&mut self, id: WindowId) {
        let Ok(window) = self.windows.get_mut(id) else { return };
        if window.flags.contains(WindowFlags::MINIMIZED) {
            return;
        }
        window.flags.remove(WindowFlags::MAXIMIZED);
        window.flags.insert(WindowFlags::MINIMIZED);
        let event = self.window_event(EventType::WindowMinimized, id);
        self.emit(event);
        if !self.capabilities.contains(BackendCapabilities::DISABLE_UNSET_FULLSCREEN_ON_MINIMIZE) {
            self.update_fullscreen_logged(id, Transition::Leave, false);
        }
    }

    fn on_window_maximized(&mut self, id: WindowId) {
        let Ok(window) = self.windows.get_mut(id) else { return };
        if window.flags.contains(WindowFlags::MAXIMIZED) {
            return;
        }
        window.flags.remove(WindowFlags::MINIMIZED);
        window.flags.insert(WindowFlags::MAXIMIZED);
        let event = self.window_event(EventType::WindowMaximized, id);
        self.emit(event);
    }

    fn on_window_restored(&mut self, id: WindowId) {
        let Ok(window) = self.windows.get_mut(id) else { return };
        if window.flags.intersects(WindowFlags::MINIMIZED | WindowFlags::MAXIMIZED) {
            window.flags.remove(WindowFlags::MINIMIZED | WindowFlags::MAXIMIZED);
            let event = self.window_event(EventType::WindowRestored, id);
            self.emit(event);
        }
        let resume = self
            .windows
            .get(id)
            .is_ok_and(|window| window.is_fullscreen_visible() && !window.fullscreen_in_flight);
        if resume {
            self.update_fullscreen_logged(id, Transition::Enter, false);
        }
    }

    fn on_enter_fullscreen(&mut self, id: WindowId) {
        let Ok(window) = self.windows.get(id) else { return };
        if window.flags.contains(WindowFlags::FULLSCREEN) {
            return;
        }
        self.mark_fullscreen(id, true);
        let resume = self
            .windows
            .get(id)
            .is_ok_and(|window| window.is_fullscreen_visible() && !window.fullscreen_in_flight);
        if resume {
            self.update_fullscreen_logged(id, Transition::Enter, false);
        }
    }

    fn on_leave_fullscreen(&mut self, id: WindowId) {
        let Ok(window) = self.windows.get(id) else { return };
        let in_flight = window.fullscreen_in_flight;
        if !window.flags.contains(WindowFlags::FULLSCREEN) {
            // An entry the backend accepted for later and then turned down
            if window.fullscreen_state == FullscreenState::Entering && !in_flight {
                log::debug!("Backend rejected fullscreen for {:?}", id);
                self.update_fullscreen_logged(id, Transition::Leave, false);
            }
            return;
        }
        self.mark_fullscreen(id, false);
        if !in_flight {
            self.update_fullscreen_logged(id, Transition::Leave, false);
        }
    }

    // ---- Displays ----

    pub(crate) fn on_window_display_changed(&mut self, id: WindowId, display: DisplayId) {
        let Ok(window) = self.windows.get_mut(id) else { return };
        if window.last_display == Some(display) {
            return;
        }
        window.last_display = Some(display);
        let fullscreen = window.flags.contains(WindowFlags::FULLSCREEN);
        let request = window.requested_fullscreen;
        let event = self
            .window_event(EventType::WindowDisplayChanged, id)
            .with_arg("display", EventArg::Display(display));
        self.emit(event);

        if fullscreen {
            let current = match request.filter(|mode| mode.w > 0 && mode.h > 0) {
                Some(request) => {
                    if let Err(e) = self.ensure_modes(display) {
                        log::debug!("No catalog for display {}: {}", display, e);
                    }
                    self.displays
                        .closest_fullscreen_mode(
                            display,
                            request.w,
                            request.h,
                            request.refresh.hz(),
                            request.pixel_density > 1.0,
                        )
                        .ok()
                        .flatten()
                }
                None => None,
            };
            let Ok(window) = self.windows.get_mut(id) else { return };
            window.current_fullscreen = current;
            if window.is_fullscreen_visible() && !window.fullscreen_in_flight {
                self.update_fullscreen_logged(id, Transition::Update, true);
            }
        }

        self.check_window_pixel_size_changed(id);
        self.check_window_display_scale_changed(id);
        if !self.capabilities.contains(BackendCapabilities::WINDOW_HDR_REPORTING) {
            if let Ok(hdr) = self.displays.get(display).map(|display| display.hdr()) {
                self.set_window_hdr(id, hdr);
            }
        }
    }

    // ---- Focus ----

    pub(crate) fn on_focus_gained(&mut self, id: WindowId) {
        let Ok(window) = self.windows.get_mut(id) else { return };
        window.flags.insert(WindowFlags::INPUT_FOCUS);
        self.focus.keyboard = Some(id);
        let event = self.window_event(EventType::WindowFocusGained, id);
        self.emit(event);
    }

    pub(crate) fn on_focus_lost(&mut self, id: WindowId) {
        let Ok(window) = self.windows.get_mut(id) else { return };
        window.flags.remove(WindowFlags::INPUT_FOCUS);
        if self.focus.keyboard == Some(id) {
            self.focus.keyboard = None;
        }
        let event = self.window_event(EventType::WindowFocusLost, id);
        self.emit(event);

        if self.should_minimize_on_focus_loss(id) {
            log::debug!("Minimizing fullscreen window {:?} after focus loss", id);
            if let Err(e) = self.minimize_window_internal(id) {
                log::debug!("Couldn't minimize {:?}: {}", id, e);
            }
        }
    }

    fn should_minimize_on_focus_loss(&self, id: WindowId) -> bool {
        let Ok(window) = self.windows.get(id) else { return false };
        if !window.flags.contains(WindowFlags::FULLSCREEN)
            || window.is_destroying
            || window.fullscreen_state == FullscreenState::Compositor
        {
            return false;
        }
        self.hints
            .minimize_on_focus_loss()
            .unwrap_or_else(|| window.fullscreen_exclusive && !self.mode_switching_emulated())
    }

    fn on_mouse_moved(&mut self, window: Option<WindowId>, x: f32, y: f32) {
        let window = window.filter(|id| self.windows.contains(*id));
        if self.focus.mouse != window {
            if let Some(previous) = self.focus.mouse {
                if let Ok(previous) = self.windows.get_mut(previous) {
                    previous.flags.remove(WindowFlags::MOUSE_FOCUS);
                }
            }
            if let Some(id) = window {
                if let Ok(current) = self.windows.get_mut(id) {
                    current.flags.insert(WindowFlags::MOUSE_FOCUS);
                }
            }
            self.focus.mouse = window;
        }
        self.focus.mouse_position = (x, y);
    }

    // ---- Clipboard ----

    fn on_clipboard_updated(&mut self, owner: ClipboardOwner, mime_types: Vec<String>) {
        match owner {
            ClipboardOwner::External => {
                let cancelled = self.clipboard.sequence();
                if self.clipboard.clear().is_some() {
                    log::debug!("Clipboard taken over; provision {} cancelled", cancelled);
                    let event = self
                        .event(EventType::ClipboardCancelled)
                        .with_arg("sequence", EventArg::Sequence(cancelled));
                    self.emit(event);
                }
                self.clipboard.fallback_text = None;
                self.clipboard.external_mime_types = mime_types.clone();
                let event = self
                    .clipboard_event(EventType::ClipboardUpdated)
                    .with_arg("owned", EventArg::Owned(false))
                    .with_arg("mime_types", EventArg::MimeTypes(mime_types));
                self.emit(event);
            }
            ClipboardOwner::Local => {
                let event = self
                    .clipboard_event(EventType::ClipboardUpdated)
                    .with_arg("owned", EventArg::Owned(true))
                    .with_arg("mime_types", EventArg::MimeTypes(self.clipboard.mime_types().to_vec()));
                self.emit(event);
            }
        }
    }
}
