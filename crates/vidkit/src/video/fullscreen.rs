//! Fullscreen coordinator
//!
//! Moves windows between windowed presentation and the three fullscreen
//! variants (desktop, exclusive, compositor) and keeps each display's
//! fullscreen back-reference in step.
//!
//! The `FULLSCREEN` window flag reflects what the backend has confirmed; the
//! window's [`FullscreenState`] reflects which display it occupies and how.
//! Every transition takes a `commit` flag: without it only bookkeeping is
//! updated, with it the backend is asked to perform the transition as well.
//!
//! Variant switches:
//!
//! | from \ to  | Desktop              | Exclusive                | Compositor               |
//! |------------|----------------------|--------------------------|--------------------------|
//! | Windowed   | enter                | switch mode, enter       | enter                    |
//! | Desktop    | -                    | switch mode, enter       | enter                    |
//! | Exclusive  | restore mode, enter  | switch mode, enter       | leave, restore, enter    |
//! | Compositor | leave, enter         | leave, switch, enter     | -                        |
//!
//! Leaving the compositor space or exclusive mode before entering the other
//! avoids stacking two backend transitions on one window.

use super::VideoSubsystem;
use crate::backend::{BackendCapabilities, FullscreenOp, FullscreenResult};
use crate::display::DisplayMode;
use crate::error::{VideoError, VideoResult};
use crate::events::EventType;
use crate::foundation::collections::{DisplayId, WindowId};
use crate::foundation::math::Rect;
use crate::foundation::time::Deadline;
use crate::window::{FullscreenState, WindowFlags};
use std::time::Instant;

/// Coordinator operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transition {
    /// Occupy a display
    Enter,
    /// Return to windowed presentation
    Leave,
    /// Re-apply while fullscreen, after the request or display changed
    Update,
}

impl VideoSubsystem {
    /// Enter or leave fullscreen
    ///
    /// The window's fullscreen mode request decides between desktop and
    /// exclusive fullscreen. A hidden window only records the request.
    pub fn set_window_fullscreen(&mut self, id: WindowId, fullscreen: bool) -> VideoResult<()> {
        self.tracked(|video| {
            if video.windows.get(id)?.is_popup() {
                return Err(VideoError::PopupWindow);
            }
            video.set_fullscreen_internal(id, fullscreen)
        })
    }

    pub(crate) fn set_fullscreen_internal(&mut self, id: WindowId, fullscreen: bool) -> VideoResult<()> {
        let window = self.windows.get_mut(id)?;
        if window.flags.contains(WindowFlags::HIDDEN) {
            window
                .pending_flags
                .get_or_insert_with(WindowFlags::empty)
                .set(WindowFlags::FULLSCREEN, fullscreen);
            return Ok(());
        }
        let flagged = window.flags.contains(WindowFlags::FULLSCREEN);
        let occupying = window.fullscreen_state != FullscreenState::Windowed;
        if fullscreen == flagged && fullscreen == occupying {
            return Ok(());
        }

        window.current_fullscreen = None;
        if fullscreen {
            let request = window.requested_fullscreen;
            if let Some(request) = request {
                let display = match request.display {
                    Some(display) => display,
                    None => self.displays.primary()?,
                };
                self.ensure_modes(display)?;
                let matched = self.displays.fullscreen_mode_match(&request.with_display(display));
                self.windows.get_mut(id)?.current_fullscreen = matched;
            }
        }

        let transition = if fullscreen { Transition::Enter } else { Transition::Leave };
        let result = self.update_fullscreen(id, transition, true);
        if !fullscreen || result.is_err() {
            if let Ok(window) = self.windows.get_mut(id) {
                window.current_fullscreen = None;
            }
        }
        result
    }

    /// Choose the mode used for exclusive fullscreen
    ///
    /// `None` selects desktop fullscreen. The mode must match an entry in its
    /// display's catalog. A visible fullscreen window switches right away.
    pub fn set_window_fullscreen_mode(&mut self, id: WindowId, mode: Option<DisplayMode>) -> VideoResult<()> {
        self.tracked(|video| {
            let window = video.windows.get(id)?;
            if window.is_popup() {
                return Err(VideoError::PopupWindow);
            }

            let requested = match mode {
                Some(mode) => {
                    let display = match mode.display {
                        Some(display) => display,
                        None => video.displays.primary()?,
                    };
                    video.ensure_modes(display)?;
                    let mode = mode.with_display(display).finalized();
                    if video.displays.fullscreen_mode_match(&mode).is_none() {
                        return Err(VideoError::invalid_param("mode", format!("{} is not a fullscreen mode", mode)));
                    }
                    Some(mode)
                }
                None => None,
            };

            let window = video.windows.get_mut(id)?;
            window.requested_fullscreen = requested;
            if window.flags.contains(WindowFlags::FULLSCREEN) && window.is_visible() {
                window.current_fullscreen = requested.and_then(|mode| video.displays.fullscreen_mode_match(&mode));
                if window.is_fullscreen_visible() {
                    return video.update_fullscreen(id, Transition::Update, true);
                }
            }
            Ok(())
        })
    }

    /// Exclusive mode a window uses or will use in fullscreen
    ///
    /// `None` means desktop fullscreen.
    pub fn window_fullscreen_mode(&self, id: WindowId) -> VideoResult<Option<DisplayMode>> {
        let result = self.windows.get(id).map(|window| {
            let mode = if window.flags.contains(WindowFlags::FULLSCREEN) {
                window.current_fullscreen
            } else {
                window.requested_fullscreen
            };
            mode.and_then(|mode| self.displays.fullscreen_mode_match(&mode))
        });
        self.record(result)
    }

    /// Run a coordinator transition
    ///
    /// A window being hidden or destroyed always leaves, whatever was asked.
    pub(crate) fn update_fullscreen(&mut self, id: WindowId, transition: Transition, commit: bool) -> VideoResult<()> {
        let window = self.windows.get_mut(id)?;
        let transition = if window.is_destroying || window.is_hiding {
            Transition::Leave
        } else {
            transition
        };
        let was_in_flight = std::mem::replace(&mut window.fullscreen_in_flight, true);
        log::debug!("Fullscreen {:?} for {:?} (commit: {})", transition, id, commit);

        let result = match transition {
            Transition::Leave => self.leave_fullscreen(id, commit),
            Transition::Enter | Transition::Update => self.enter_fullscreen(id, commit),
        };

        if let Ok(window) = self.windows.get_mut(id) {
            window.fullscreen_in_flight = was_in_flight;
        }
        result
    }

    /// Display a fullscreen transition targets
    ///
    /// The display of the fullscreen mode wins, then the display under the
    /// window's pending or committed geometry, then the primary display.
    fn fullscreen_target_display(&mut self, id: WindowId) -> VideoResult<DisplayId> {
        let explicit = self.windows.get(id)?.current_fullscreen.and_then(|mode| mode.display);
        if let Some(display) = explicit.filter(|display| self.displays.contains(*display)) {
            return Ok(display);
        }
        self.display_for_window_position(id)
    }

    fn enter_fullscreen(&mut self, id: WindowId, commit: bool) -> VideoResult<()> {
        let display = self.fullscreen_target_display(id)?;
        self.ensure_modes(display)?;

        let request = self.windows.get(id)?.current_fullscreen;
        let mode = request.and_then(|request| self.displays.fullscreen_mode_match(&request));
        let exclusive = mode.is_some();
        let compositor = !exclusive && self.capabilities.contains(BackendCapabilities::COMPOSITOR_FULLSCREEN);

        let window = self.windows.get_mut(id)?;
        window.fullscreen_exclusive = exclusive;
        if !exclusive {
            window.current_fullscreen = None;
        }
        let previous_state = window.fullscreen_state;
        let previous_exclusive_display = window.last_fullscreen_exclusive_display;

        if exclusive && previous_state == FullscreenState::Compositor {
            log::debug!("Leaving the compositor fullscreen space before exclusive fullscreen");
            self.leave_variant(id, None, commit)?;
        } else if compositor && previous_state == FullscreenState::Exclusive {
            log::debug!("Leaving exclusive fullscreen before entering the compositor fullscreen space");
            self.leave_variant(id, previous_exclusive_display, commit)?;
        }

        // A window occupies at most one display
        let mut vacated = self.displays.clear_fullscreen_window(id);
        vacated.extend(self.windows.get(id)?.last_fullscreen_exclusive_display);
        vacated.dedup();
        for other in vacated {
            if other != display {
                if let Err(e) = self.set_display_mode_for_display(other, None) {
                    log::warn!("Couldn't restore desktop mode on display {}: {}", other, e);
                }
            }
        }

        // A display has at most one fullscreen occupant
        if let Some(occupant) = self.displays.fullscreen_window(display) {
            log::debug!("Display {} hosts {:?}; minimizing it", display, occupant);
            if let Err(e) = self.minimize_window_internal(occupant) {
                log::debug!("Couldn't minimize {:?}: {}", occupant, e);
            }
            if self.displays.fullscreen_window(display) == Some(occupant) {
                self.release_occupancy(occupant);
            }
        }

        if let Err(e) = self.set_display_mode_for_display(display, mode) {
            return self.rollback_enter(id, commit, e);
        }
        self.displays.set_fullscreen_window(display, Some(id))?;

        let mut resized = false;
        if commit {
            let op = if exclusive {
                FullscreenOp::EnterExclusive
            } else if compositor {
                FullscreenOp::EnterCompositor
            } else {
                FullscreenOp::EnterDesktop
            };
            match self.backend_fullscreen(id, display, op)? {
                FullscreenResult::Succeeded => self.mark_fullscreen(id, true),
                FullscreenResult::Unsupported => {
                    self.mark_fullscreen(id, true);
                    resized = true;
                }
                FullscreenResult::Pending => {
                    self.windows.get_mut(id)?.fullscreen_state = FullscreenState::Entering;
                }
                FullscreenResult::Failed => {
                    return self.rollback_enter(id, commit, VideoError::FullscreenFailed);
                }
            }
        }

        let emulated = self.mode_switching_emulated();
        let window = self.windows.get_mut(id)?;
        if window.flags.contains(WindowFlags::FULLSCREEN) {
            window.fullscreen_state = if exclusive {
                FullscreenState::Exclusive
            } else if compositor {
                FullscreenState::Compositor
            } else {
                FullscreenState::Desktop
            };
            window.fullscreen_deadline = None;
            window.last_fullscreen_exclusive_display = exclusive.then_some(display);

            if resized || !self.reports_fullscreen_dimensions() {
                let bounds = self.bounds_of(display)?;
                let size = match mode {
                    Some(mode) => (mode.w, mode.h),
                    None => {
                        let desktop = self.displays.get(display)?.desktop_mode();
                        (desktop.w, desktop.h)
                    }
                };
                self.apply_fullscreen_geometry(id, Rect::new(bounds.x, bounds.y, size.0, size.1));
            }
            self.restore_mouse_position(id);
        } else if window.fullscreen_state == FullscreenState::Entering && exclusive && !emulated {
            let timeout = self.hints.mode_switch_timeout();
            log::debug!("Waiting up to {:?} for {:?} to enter fullscreen", timeout, id);
            window.fullscreen_deadline = Some(Deadline::after(Instant::now(), timeout));
        } else {
            // Occupies the display until the backend confirms
            window.fullscreen_state = FullscreenState::Entering;
        }
        Ok(())
    }

    fn rollback_enter(&mut self, id: WindowId, commit: bool, error: VideoError) -> VideoResult<()> {
        log::warn!("Entering fullscreen failed for {:?}: {}; reverting", id, error);
        if let Err(e) = self.leave_fullscreen(id, commit) {
            log::debug!("Rollback of {:?} failed too: {}", id, e);
        }
        if let Ok(window) = self.windows.get_mut(id) {
            window.fullscreen_state = FullscreenState::Windowed;
            window.fullscreen_exclusive = false;
        }
        Err(error)
    }

    /// Drop out of the current fullscreen variant before entering another
    fn leave_variant(&mut self, id: WindowId, exclusive_display: Option<DisplayId>, commit: bool) -> VideoResult<()> {
        let occupied = self.displays.display_for_fullscreen_window(id);
        if let Some(display) = exclusive_display.or(occupied) {
            if let Err(e) = self.set_display_mode_for_display(display, None) {
                log::warn!("Couldn't restore desktop mode on display {}: {}", display, e);
            }
        }
        if commit {
            if let Some(display) = occupied.or(exclusive_display) {
                if self.backend_fullscreen(id, display, FullscreenOp::Leave)? == FullscreenResult::Failed {
                    return Err(VideoError::FullscreenFailed);
                }
            }
        }
        self.displays.clear_fullscreen_window(id);
        let window = self.windows.get_mut(id)?;
        window.fullscreen_state = FullscreenState::Windowed;
        window.last_fullscreen_exclusive_display = None;
        Ok(())
    }

    fn leave_fullscreen(&mut self, id: WindowId, commit: bool) -> VideoResult<()> {
        let occupied = self.displays.display_for_fullscreen_window(id);
        let window = self.windows.get_mut(id)?;
        window.fullscreen_exclusive = false;
        if !window.flags.contains(WindowFlags::FULLSCREEN)
            && window.fullscreen_state == FullscreenState::Windowed
            && occupied.is_none()
        {
            return Ok(());
        }
        let last_display = window.last_display;

        if let Some(display) = occupied {
            if let Err(e) = self.set_display_mode_for_display(display, None) {
                log::warn!("Couldn't restore desktop mode on display {}: {}", display, e);
            }
        }

        let mut result = Ok(());
        let mut state = FullscreenState::Windowed;
        if commit {
            let display = match occupied.or(last_display).filter(|display| self.displays.contains(*display)) {
                Some(display) => Some(display),
                None => self.displays.primary().ok(),
            };
            if let Some(display) = display {
                match self.backend_fullscreen(id, display, FullscreenOp::Leave)? {
                    FullscreenResult::Succeeded | FullscreenResult::Unsupported => self.mark_fullscreen(id, false),
                    FullscreenResult::Pending => state = FullscreenState::Leaving,
                    FullscreenResult::Failed => result = Err(VideoError::FullscreenFailed),
                }
            }
        }

        self.displays.clear_fullscreen_window(id);
        let reports = self.reports_fullscreen_dimensions();
        let window = self.windows.get_mut(id)?;
        window.fullscreen_state = state;
        window.fullscreen_deadline = None;
        window.last_fullscreen_exclusive_display = None;

        if !window.flags.contains(WindowFlags::FULLSCREEN) && !reports {
            let floating = window.floating;
            self.apply_fullscreen_geometry(id, floating);
        }
        self.restore_mouse_position(id);
        result
    }

    /// Forget a window's occupancy without touching the backend
    fn release_occupancy(&mut self, id: WindowId) {
        self.displays.clear_fullscreen_window(id);
        if let Ok(window) = self.windows.get_mut(id) {
            window.fullscreen_state = FullscreenState::Windowed;
            window.fullscreen_deadline = None;
            window.last_fullscreen_exclusive_display = None;
        }
    }

    /// Ask the backend for a transition and apply what it reports meanwhile
    fn backend_fullscreen(&mut self, id: WindowId, display: DisplayId, op: FullscreenOp) -> VideoResult<FullscreenResult> {
        let window = self.windows.get(id)?;
        let target = self.displays.get(display)?;
        let result = self.backend.set_window_fullscreen(window, target, op);
        log::debug!("Backend fullscreen {:?} on display {} for {:?}: {:?}", op, display, id, result);
        self.drain_backend();
        Ok(result)
    }

    /// Set or clear the confirmed fullscreen flag, notifying on change
    pub(crate) fn mark_fullscreen(&mut self, id: WindowId, fullscreen: bool) {
        let Ok(window) = self.windows.get_mut(id) else { return };
        if window.flags.contains(WindowFlags::FULLSCREEN) == fullscreen {
            return;
        }
        window.flags.set(WindowFlags::FULLSCREEN, fullscreen);
        if fullscreen {
            window.fullscreen_deadline = None;
        }
        let event_type = if fullscreen {
            EventType::WindowEnterFullscreen
        } else {
            EventType::WindowLeaveFullscreen
        };
        let event = self.window_event(event_type, id);
        self.emit(event);
    }

    /// Commit geometry the backend won't report; the move goes first so the
    /// window never transits through a neighbouring display
    fn apply_fullscreen_geometry(&mut self, id: WindowId, rect: Rect) {
        self.on_window_moved(id, rect.x, rect.y);
        self.on_window_resized(id, rect.w, rect.h);
    }

    fn restore_mouse_position(&mut self, id: WindowId) {
        if self.focus.mouse != Some(id) || self.fullscreen_mouse_warp_disabled() {
            return;
        }
        let (x, y) = self.focus.mouse_position;
        if let Ok(window) = self.windows.get(id) {
            self.backend.warp_mouse(window, x, y);
        }
    }

    /// Revert windows whose mode switch overran its deadline
    pub(crate) fn check_fullscreen_deadlines(&mut self, now: Instant) {
        let expired: Vec<WindowId> = self
            .windows
            .iter()
            .filter(|window| !window.flags.contains(WindowFlags::FULLSCREEN))
            .filter(|window| window.fullscreen_deadline.is_some_and(|deadline| deadline.expired(now)))
            .map(|window| window.id)
            .collect();

        for id in expired {
            log::warn!("Window {:?} did not reach fullscreen in time; reverting to windowed", id);
            if let Ok(window) = self.windows.get_mut(id) {
                window.fullscreen_deadline = None;
                window.current_fullscreen = None;
            }
            if let Err(e) = self.update_fullscreen(id, Transition::Leave, false) {
                log::warn!("Reverting {:?} failed: {}", id, e);
            }
            // The flag was never set, so observers only learn of the abandoned entry here
            if self.windows.contains(id) {
                let event = self.window_event(EventType::WindowLeaveFullscreen, id);
                self.emit(event);
            }
        }
    }
}
