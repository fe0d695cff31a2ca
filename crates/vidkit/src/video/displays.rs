//! Display queries, the lazily loaded mode catalog and display hot-plug

use super::VideoSubsystem;
use crate::backend::BackendCapabilities;
use crate::display::{Display, DisplayDesc, DisplayMode, HdrProperties, Orientation};
use crate::error::{VideoError, VideoResult};
use crate::events::{EventArg, EventType};
use crate::foundation::collections::{DisplayId, WindowId};
use crate::foundation::math::{Point, Rect};
use crate::window::{FullscreenState, WindowFlags};

impl VideoSubsystem {
    /// Attached displays, primary first
    pub fn displays(&self) -> Vec<DisplayId> {
        self.displays.ids()
    }

    /// The primary display
    pub fn primary_display(&self) -> VideoResult<DisplayId> {
        self.record(self.displays.primary())
    }

    /// Look up a display
    pub fn display(&self, id: DisplayId) -> VideoResult<&Display> {
        self.record(self.displays.get(id))
    }

    /// Display name
    pub fn display_name(&self, id: DisplayId) -> VideoResult<&str> {
        self.display(id).map(Display::name)
    }

    /// Desktop mode of a display
    pub fn desktop_display_mode(&self, id: DisplayId) -> VideoResult<DisplayMode> {
        self.display(id).map(|display| *display.desktop_mode())
    }

    /// Mode a display is running
    pub fn current_display_mode(&self, id: DisplayId) -> VideoResult<DisplayMode> {
        self.display(id).map(|display| *display.current_mode())
    }

    /// Content scale of a display
    pub fn display_content_scale(&self, id: DisplayId) -> VideoResult<f32> {
        self.display(id).map(Display::content_scale)
    }

    /// Natural and current orientation of a display
    pub fn display_orientation(&self, id: DisplayId) -> VideoResult<(Orientation, Orientation)> {
        self.display(id)
            .map(|display| (display.natural_orientation(), display.current_orientation()))
    }

    /// Desktop-coordinate bounds of a display
    pub fn display_bounds(&mut self, id: DisplayId) -> VideoResult<Rect> {
        let result = self.bounds_of(id);
        self.record(result)
    }

    pub(crate) fn bounds_of(&mut self, id: DisplayId) -> VideoResult<Rect> {
        let display = self.displays.get(id)?;
        match self.backend.display_bounds(display) {
            Some(bounds) => Ok(bounds),
            None => self.displays.fallback_bounds(id),
        }
    }

    /// Display bounds minus reserved OS chrome
    ///
    /// The usable-bounds hint overrides the primary display.
    pub fn display_usable_bounds(&mut self, id: DisplayId) -> VideoResult<Rect> {
        let result = self.usable_bounds_of(id);
        self.record(result)
    }

    pub(crate) fn usable_bounds_of(&mut self, id: DisplayId) -> VideoResult<Rect> {
        if self.displays.primary()? == id {
            if let Some(bounds) = self.hints.usable_bounds_override() {
                return Ok(bounds);
            }
        }
        let display = self.displays.get(id)?;
        match self.backend.display_usable_bounds(display) {
            Some(bounds) => Ok(bounds),
            None => self.bounds_of(id),
        }
    }

    /// Display containing a point, else the nearest one
    pub fn display_for_point(&mut self, point: Point) -> VideoResult<DisplayId> {
        let result = self.display_at(point);
        self.record(result)
    }

    /// Display containing the center of a rectangle, else the nearest one
    pub fn display_for_rect(&mut self, rect: Rect) -> VideoResult<DisplayId> {
        let result = self.display_at(rect.center());
        self.record(result)
    }

    pub(crate) fn display_at(&mut self, point: Point) -> VideoResult<DisplayId> {
        let mut closest: Option<(DisplayId, i64)> = None;
        for id in self.displays.ids() {
            let bounds = self.bounds_of(id)?;
            if bounds.contains(point) {
                return Ok(id);
            }
            let distance = bounds.closest_point(point).distance_squared(point);
            if closest.map_or(true, |(_, best)| distance < best) {
                closest = Some((id, distance));
            }
        }
        closest.map(|(id, _)| id).ok_or(VideoError::NoDisplays)
    }

    /// Display a window is on
    ///
    /// A fullscreen window belongs to the display it occupies; otherwise the
    /// window's center decides.
    pub fn display_for_window(&mut self, window: WindowId) -> VideoResult<DisplayId> {
        self.tracked(|video| video.window_display(window))
    }

    pub(crate) fn window_display(&mut self, id: WindowId) -> VideoResult<DisplayId> {
        let window = self.windows.get(id)?;
        if window.flags.contains(WindowFlags::FULLSCREEN) {
            if let Some(display) = self.displays.display_for_fullscreen_window(id) {
                return Ok(display);
            }
            if let Some(display) = window.current_fullscreen.and_then(|mode| mode.display) {
                if self.displays.contains(display) {
                    return Ok(display);
                }
            }
        }
        self.display_for_window_position(id)
    }

    /// Display under a window's pending or committed geometry
    pub(crate) fn display_for_window_position(&mut self, id: WindowId) -> VideoResult<DisplayId> {
        let rect = self.global_rect(id, true)?;
        match self.display_at(rect.center()) {
            Ok(display) => Ok(display),
            Err(_) => self.displays.primary(),
        }
    }

    /// Load the fullscreen catalog if it has not been queried yet
    pub(crate) fn ensure_modes(&mut self, id: DisplayId) -> VideoResult<()> {
        let display = self.displays.get(id)?;
        if !display.modes().is_empty() {
            return Ok(());
        }
        let desktop = *display.desktop_mode();
        let modes = self.backend.display_modes(display);
        log::debug!("Display {}: loaded {} fullscreen mode(s)", id, modes.len());
        for mode in modes {
            self.displays.add_fullscreen_mode(id, mode)?;
        }
        if self.displays.get(id)?.modes().is_empty() {
            self.displays.add_fullscreen_mode(id, desktop)?;
        }
        Ok(())
    }

    /// Fullscreen catalog of a display, best mode first
    pub fn fullscreen_display_modes(&mut self, id: DisplayId) -> VideoResult<Vec<DisplayMode>> {
        self.tracked(|video| {
            video.ensure_modes(id)?;
            Ok(video.displays.get(id)?.modes().to_vec())
        })
    }

    /// Smallest catalog mode at least `w`x`h`
    ///
    /// See [`DisplayRegistry::closest_fullscreen_mode`](crate::display::DisplayRegistry::closest_fullscreen_mode).
    pub fn closest_fullscreen_display_mode(
        &mut self,
        id: DisplayId,
        w: i32,
        h: i32,
        refresh_hz: f32,
        include_high_density: bool,
    ) -> VideoResult<DisplayMode> {
        self.tracked(|video| {
            video.ensure_modes(id)?;
            video
                .displays
                .closest_fullscreen_mode(id, w, h, refresh_hz, include_high_density)?
                .ok_or_else(|| {
                    VideoError::invalid_param("mode", format!("no mode on display {} fits {}x{}", id, w, h))
                })
        })
    }

    /// Drop a display's catalog so it is queried again
    pub fn reset_fullscreen_display_modes(&mut self, id: DisplayId) -> VideoResult<()> {
        self.tracked(|video| video.displays.reset_fullscreen_modes(id))
    }

    /// Switch a display to `mode`, or back to its desktop mode
    ///
    /// `mode` must match a catalog entry. Nothing is switched while mode
    /// switching is emulated or when the display already runs the mode.
    pub(crate) fn set_display_mode_for_display(&mut self, id: DisplayId, mode: Option<DisplayMode>) -> VideoResult<()> {
        let display = self.displays.get(id)?;
        let target = match mode {
            Some(mode) => self
                .displays
                .fullscreen_mode_match(&mode.with_display(id))
                .ok_or_else(|| VideoError::invalid_param("mode", format!("{} is not a mode of display {}", mode, id)))?,
            None => *display.desktop_mode(),
        };

        if self.mode_switching_emulated() {
            return Ok(());
        }
        if display.current_mode().same_mode(&target) {
            return Ok(());
        }

        match self.backend.set_display_mode(display, &target) {
            Ok(()) => {}
            Err(e) if e.is_unsupported() => log::debug!("Display {}: {}; recording {} anyway", id, e, target),
            Err(e) => {
                log::warn!("Display {} rejected {}: {}", id, target, e);
                return Err(VideoError::ModeSwitchFailed { display: id, w: target.w, h: target.h });
            }
        }
        self.drain_backend();

        log::debug!("Display {} now runs {}", id, target);
        self.displays.set_current_mode(id, Some(target))?;
        let event = self
            .display_event(EventType::DisplayCurrentModeChanged, id)
            .with_arg("size", EventArg::Size(target.w, target.h));
        self.emit(event);
        self.update_desktop_area();
        Ok(())
    }

    pub(crate) fn update_desktop_area(&mut self) {
        let mut area: Option<Rect> = None;
        for id in self.displays.ids() {
            match self.bounds_of(id) {
                Ok(bounds) => area = Some(area.map_or(bounds, |area| area.union(&bounds))),
                Err(e) => log::debug!("Display {} has no bounds: {}", id, e),
            }
        }
        self.desktop_area = area.unwrap_or_default();
    }

    // ---- Hot-plug ----

    pub(crate) fn add_display(&mut self, desc: DisplayDesc, notify: bool) -> DisplayId {
        let id = self.displays.add(desc);
        if let Ok(display) = self.displays.get(id) {
            self.backend.display_added(id, display);
        }
        self.update_desktop_area();
        if notify {
            let event = self.display_event(EventType::DisplayAdded, id);
            self.emit(event);
        }
        id
    }

    /// Drop a display; never fails
    ///
    /// A window occupying it loses its fullscreen bookkeeping and windows last
    /// seen on it migrate to whichever display now lies under them.
    pub(crate) fn remove_display(&mut self, id: DisplayId) {
        if !self.displays.contains(id) {
            log::trace!("Ignoring removal of unknown display {}", id);
            return;
        }
        let event = self.display_event(EventType::DisplayRemoved, id);
        self.emit(event);

        if let Some(occupant) = self.displays.fullscreen_window(id) {
            log::debug!("Display {} removed under fullscreen window {:?}", id, occupant);
            if let Ok(window) = self.windows.get_mut(occupant) {
                window.fullscreen_state = FullscreenState::Windowed;
                window.fullscreen_exclusive = false;
                window.fullscreen_deadline = None;
                window.last_fullscreen_exclusive_display = None;
            }
        }

        self.displays.remove(id);
        self.backend.display_removed(id);
        self.update_desktop_area();

        let stranded: Vec<WindowId> = self
            .windows
            .iter()
            .filter(|window| window.last_display == Some(id))
            .map(|window| window.id)
            .collect();
        for window in stranded {
            if let Ok(window) = self.windows.get_mut(window) {
                window.last_display = None;
            }
            self.check_window_display_changed(window);
        }
    }

    pub(crate) fn on_display_moved(&mut self, id: DisplayId) {
        if !self.displays.contains(id) {
            return;
        }
        self.update_desktop_area();
        let event = self.display_event(EventType::DisplayMoved, id);
        self.emit(event);
    }

    pub(crate) fn on_desktop_mode_changed(&mut self, id: DisplayId, mode: DisplayMode) {
        match self.displays.set_desktop_mode(id, mode) {
            Ok(true) => {
                let event = self
                    .display_event(EventType::DisplayDesktopModeChanged, id)
                    .with_arg("size", EventArg::Size(mode.w, mode.h));
                self.emit(event);
                self.update_desktop_area();
                for window in self.windows_on_display(id) {
                    self.check_window_pixel_size_changed(window);
                }
            }
            Ok(false) => {}
            Err(e) => log::trace!("Dropping desktop mode change: {}", e),
        }
    }

    pub(crate) fn on_content_scale_changed(&mut self, id: DisplayId, scale: f32) {
        match self.displays.set_content_scale(id, scale) {
            Ok(true) => {
                let scale = self.displays.get(id).map_or(scale, Display::content_scale);
                let event = self
                    .display_event(EventType::DisplayContentScaleChanged, id)
                    .with_arg("scale", EventArg::Scale(scale));
                self.emit(event);
                for window in self.windows_on_display(id) {
                    self.check_window_display_scale_changed(window);
                }
            }
            Ok(false) => {}
            Err(e) => log::trace!("Dropping content scale change: {}", e),
        }
    }

    pub(crate) fn on_hdr_changed(&mut self, id: DisplayId, hdr: HdrProperties) {
        match self.displays.set_hdr(id, hdr) {
            Ok(true) => {
                let hdr = hdr.clamped();
                let event = self
                    .display_event(EventType::DisplayHdrChanged, id)
                    .with_arg("hdr", EventArg::Hdr(hdr));
                self.emit(event);
                if !self.capabilities.contains(BackendCapabilities::WINDOW_HDR_REPORTING) {
                    for window in self.windows_on_display(id) {
                        self.set_window_hdr(window, hdr);
                    }
                }
            }
            Ok(false) => {}
            Err(e) => log::trace!("Dropping HDR change: {}", e),
        }
    }

    pub(crate) fn on_orientation_changed(&mut self, id: DisplayId, orientation: Orientation) {
        match self.displays.set_orientation(id, orientation) {
            Ok(true) => {
                let event = self
                    .display_event(EventType::DisplayOrientationChanged, id)
                    .with_arg("orientation", EventArg::Orientation(orientation));
                self.emit(event);
            }
            Ok(false) => {}
            Err(e) => log::trace!("Dropping orientation change: {}", e),
        }
    }

    fn windows_on_display(&self, id: DisplayId) -> Vec<WindowId> {
        self.windows
            .iter()
            .filter(|window| window.last_display == Some(id))
            .map(|window| window.id)
            .collect()
    }
}
