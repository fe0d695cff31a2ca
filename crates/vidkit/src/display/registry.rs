//! Ordered set of attached displays

use super::{Display, DisplayDesc, DisplayMode, HdrProperties, Orientation, MIN_CONTENT_SCALE};
use crate::error::{VideoError, VideoResult};
use crate::foundation::collections::{DisplayId, IdAllocator, WindowId};
use crate::foundation::math::Rect;

/// Display registry
///
/// The first display is the primary one. Lookups by id are the query
/// primitive; a miss is an [`VideoError::InvalidDisplay`], never a panic.
#[derive(Debug, Default)]
pub struct DisplayRegistry {
    displays: Vec<Display>,
    ids: IdAllocator,
}

impl DisplayRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a display, assigning it a fresh identity
    pub fn add(&mut self, desc: DisplayDesc) -> DisplayId {
        let id = self.ids.next_display();
        let mut desktop_mode = desc.desktop_mode;
        desktop_mode.display = Some(id);
        desktop_mode.finalize();

        let name = desc
            .name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| id.to_string());

        log::info!("Display {} added: {} ({})", id, name, desktop_mode);
        self.displays.push(Display {
            id,
            name,
            driver_tag: desc.driver_tag,
            desktop_mode,
            current_mode: None,
            modes: Vec::new(),
            content_scale: desc.content_scale.max(MIN_CONTENT_SCALE),
            hdr: desc.hdr.clamped(),
            natural_orientation: desc.natural_orientation,
            current_orientation: desc.current_orientation,
            fullscreen_window: None,
        });
        id
    }

    /// Remove a display; unknown ids are ignored
    pub fn remove(&mut self, id: DisplayId) -> Option<Display> {
        let index = self.index_of(id)?;
        let display = self.displays.remove(index);
        log::info!("Display {} removed", id);
        Some(display)
    }

    /// Look up a display
    pub fn get(&self, id: DisplayId) -> VideoResult<&Display> {
        self.displays
            .iter()
            .find(|display| display.id == id)
            .ok_or(VideoError::InvalidDisplay(id))
    }

    fn get_mut(&mut self, id: DisplayId) -> VideoResult<&mut Display> {
        self.displays
            .iter_mut()
            .find(|display| display.id == id)
            .ok_or(VideoError::InvalidDisplay(id))
    }

    /// Position of a display in attachment order
    pub fn index_of(&self, id: DisplayId) -> Option<usize> {
        self.displays.iter().position(|display| display.id == id)
    }

    /// Whether the id names an attached display
    pub fn contains(&self, id: DisplayId) -> bool {
        self.index_of(id).is_some()
    }

    /// The primary display
    pub fn primary(&self) -> VideoResult<DisplayId> {
        self.displays.first().map(|display| display.id).ok_or(VideoError::NoDisplays)
    }

    /// Identities of all displays in attachment order
    pub fn ids(&self) -> Vec<DisplayId> {
        self.displays.iter().map(|display| display.id).collect()
    }

    /// Iterate over all displays
    pub fn iter(&self) -> impl Iterator<Item = &Display> {
        self.displays.iter()
    }

    /// Number of attached displays
    pub fn len(&self) -> usize {
        self.displays.len()
    }

    /// Whether no display is attached
    pub fn is_empty(&self) -> bool {
        self.displays.is_empty()
    }

    /// Replace the desktop mode; returns whether it changed
    pub fn set_desktop_mode(&mut self, id: DisplayId, mode: DisplayMode) -> VideoResult<bool> {
        let display = self.get_mut(id)?;
        let mut mode = mode;
        mode.display = Some(id);
        mode.finalize();
        if display.desktop_mode == mode {
            return Ok(false);
        }
        log::debug!("Display {} desktop mode {} -> {}", id, display.desktop_mode, mode);
        display.desktop_mode = mode;
        Ok(true)
    }

    /// Record the mode the display is running; `None` is the desktop mode
    pub fn set_current_mode(&mut self, id: DisplayId, mode: Option<DisplayMode>) -> VideoResult<()> {
        let display = self.get_mut(id)?;
        display.current_mode = mode.filter(|mode| !mode.same_mode(&display.desktop_mode));
        Ok(())
    }

    /// Set the content scale; returns whether it changed
    pub fn set_content_scale(&mut self, id: DisplayId, scale: f32) -> VideoResult<bool> {
        let display = self.get_mut(id)?;
        let scale = if scale.is_nan() { 1.0 } else { scale.max(MIN_CONTENT_SCALE) };
        if (display.content_scale - scale).abs() <= f32::EPSILON {
            return Ok(false);
        }
        display.content_scale = scale;
        Ok(true)
    }

    /// Set the HDR properties; returns whether they changed
    pub fn set_hdr(&mut self, id: DisplayId, hdr: HdrProperties) -> VideoResult<bool> {
        let display = self.get_mut(id)?;
        let hdr = hdr.clamped();
        if display.hdr == hdr {
            return Ok(false);
        }
        display.hdr = hdr;
        Ok(true)
    }

    /// Set the current orientation; returns whether it changed
    pub fn set_orientation(&mut self, id: DisplayId, orientation: Orientation) -> VideoResult<bool> {
        let display = self.get_mut(id)?;
        if display.current_orientation == orientation {
            return Ok(false);
        }
        display.current_orientation = orientation;
        Ok(true)
    }

    /// Add a mode to the fullscreen catalog
    ///
    /// Returns `false` when an equal mode is already present. The catalog
    /// stays sorted best-first.
    pub fn add_fullscreen_mode(&mut self, id: DisplayId, mode: DisplayMode) -> VideoResult<bool> {
        let display = self.get_mut(id)?;
        let mut mode = mode;
        mode.display = Some(id);
        mode.finalize();

        if display.modes.iter().any(|existing| existing.same_mode(&mode)) {
            return Ok(false);
        }
        display.modes.push(mode);
        display.modes.sort_by(DisplayMode::catalog_cmp);
        Ok(true)
    }

    /// Drop the fullscreen catalog and fall back to the desktop mode
    pub fn reset_fullscreen_modes(&mut self, id: DisplayId) -> VideoResult<()> {
        let display = self.get_mut(id)?;
        display.modes.clear();
        display.current_mode = None;
        Ok(())
    }

    /// Find the catalog entry for a fullscreen request
    ///
    /// Desktop requests match nothing. An exact match wins; otherwise the
    /// first (best) catalog entry satisfying the request is used.
    pub fn fullscreen_mode_match(&self, request: &DisplayMode) -> Option<DisplayMode> {
        if request.is_desktop_request() {
            return None;
        }
        let display_id = match request.display {
            Some(id) => id,
            None => self.primary().ok()?,
        };
        let display = self.get(display_id).ok()?;
        let mut normalized = *request;
        normalized.display = Some(display_id);
        normalized.finalize();

        display
            .modes
            .iter()
            .find(|mode| mode.same_mode(&normalized))
            .or_else(|| display.modes.iter().find(|mode| mode.satisfies(request)))
            .copied()
    }

    /// Smallest catalog mode at least `w`x`h`
    ///
    /// Among candidates the best aspect-ratio match wins, then the refresh rate
    /// nearest `refresh_hz` (the desktop refresh rate when zero). Modes with a
    /// pixel density above 1.0 are skipped unless `include_high_density`.
    #[allow(clippy::cast_precision_loss)]
    pub fn closest_fullscreen_mode(
        &self,
        id: DisplayId,
        w: i32,
        h: i32,
        refresh_hz: f32,
        include_high_density: bool,
    ) -> VideoResult<Option<DisplayMode>> {
        let display = self.get(id)?;
        let aspect = if h > 0 { w as f32 / h as f32 } else { 1.0 };
        let target_refresh = if refresh_hz > 0.0 { refresh_hz } else { display.desktop_mode.refresh.hz() };

        let mut closest: Option<&DisplayMode> = None;
        for mode in &display.modes {
            if w > mode.w {
                // Sorted by area; nothing further can be wide enough.
                break;
            }
            if h > mode.h {
                continue;
            }
            if mode.pixel_density > 1.0 && !include_high_density {
                continue;
            }
            if let Some(best) = closest {
                let best_aspect = best.w as f32 / best.h as f32;
                let mode_aspect = mode.w as f32 / mode.h as f32;
                if (aspect - best_aspect).abs() < (aspect - mode_aspect).abs() {
                    continue;
                }
                if mode.w == best.w
                    && mode.h == best.h
                    && (best.refresh.hz() - target_refresh).abs() < (mode.refresh.hz() - target_refresh).abs()
                {
                    continue;
                }
            }
            closest = Some(mode);
        }
        Ok(closest.copied())
    }

    /// Window occupying a display in fullscreen
    pub fn fullscreen_window(&self, id: DisplayId) -> Option<WindowId> {
        self.get(id).ok().and_then(|display| display.fullscreen_window)
    }

    /// Set or clear the fullscreen occupant of a display
    pub fn set_fullscreen_window(&mut self, id: DisplayId, window: Option<WindowId>) -> VideoResult<()> {
        self.get_mut(id)?.fullscreen_window = window;
        Ok(())
    }

    /// Display a window occupies in fullscreen
    pub fn display_for_fullscreen_window(&self, window: WindowId) -> Option<DisplayId> {
        self.displays
            .iter()
            .find(|display| display.fullscreen_window == Some(window))
            .map(|display| display.id)
    }

    /// Clear every back-reference to `window`; returns the displays touched
    pub fn clear_fullscreen_window(&mut self, window: WindowId) -> Vec<DisplayId> {
        let mut cleared = Vec::new();
        for display in &mut self.displays {
            if display.fullscreen_window == Some(window) {
                display.fullscreen_window = None;
                cleared.push(display.id);
            }
        }
        cleared
    }

    /// Bounds for a display when the backend cannot report them
    ///
    /// Displays are laid out left to right in attachment order, each as wide
    /// as its current mode.
    pub fn fallback_bounds(&self, id: DisplayId) -> VideoResult<Rect> {
        let index = self.index_of(id).ok_or(VideoError::InvalidDisplay(id))?;
        let x = self.displays[..index]
            .iter()
            .map(|display| display.current_mode().w)
            .sum();
        let mode = self.displays[index].current_mode();
        Ok(Rect::new(x, 0, mode.w, mode.h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::PixelFormat;
    use approx::assert_relative_eq;

    fn registry_with_display() -> (DisplayRegistry, DisplayId) {
        let mut registry = DisplayRegistry::new();
        let id = registry.add(DisplayDesc::new(DisplayMode::new(2560, 1440).with_refresh_hz(60)));
        (registry, id)
    }

    #[test]
    fn test_add_assigns_fresh_ids_and_names() {
        let mut registry = DisplayRegistry::new();
        let a = registry.add(DisplayDesc::new(DisplayMode::new(1920, 1080)));
        let b = registry.add(DisplayDesc::new(DisplayMode::new(1920, 1080)).with_name("Side"));
        assert_ne!(a, b);
        assert_eq!(registry.get(a).unwrap().name(), a.to_string());
        assert_eq!(registry.get(b).unwrap().name(), "Side");
        assert_eq!(registry.primary().unwrap(), a);
        assert_relative_eq!(registry.get(a).unwrap().desktop_mode().pixel_density, 1.0);
    }

    #[test]
    fn test_lookup_miss_is_an_error() {
        let (mut registry, id) = registry_with_display();
        registry.remove(id);
        assert_eq!(registry.get(id).unwrap_err(), VideoError::InvalidDisplay(id));
        assert!(registry.remove(id).is_none());
        assert_eq!(registry.primary().unwrap_err(), VideoError::NoDisplays);
    }

    #[test]
    fn test_catalog_dedupes_and_sorts() {
        let (mut registry, id) = registry_with_display();
        assert!(registry.add_fullscreen_mode(id, DisplayMode::new(1920, 1080).with_refresh_hz(60)).unwrap());
        assert!(registry.add_fullscreen_mode(id, DisplayMode::new(2560, 1440).with_refresh_hz(60)).unwrap());
        assert!(registry.add_fullscreen_mode(id, DisplayMode::new(1920, 1080).with_refresh_hz(144)).unwrap());
        // Zero density normalizes to 1.0 and 120/2 reduces to 60/1.
        assert!(!registry
            .add_fullscreen_mode(
                id,
                DisplayMode::new(1920, 1080)
                    .with_refresh(crate::display::RefreshRate::new(120, 2))
                    .with_pixel_density(0.0)
            )
            .unwrap());

        let modes = registry.get(id).unwrap().modes();
        assert_eq!(modes.len(), 3);
        assert_eq!((modes[0].w, modes[0].h), (2560, 1440));
        assert_eq!(modes[1].refresh.numerator(), 144);
        assert_eq!(modes[2].refresh.numerator(), 60);
    }

    #[test]
    fn test_mode_match_prefers_exact_then_best() {
        let (mut registry, id) = registry_with_display();
        registry.add_fullscreen_mode(id, DisplayMode::new(1920, 1080).with_refresh_hz(60)).unwrap();
        registry.add_fullscreen_mode(id, DisplayMode::new(1920, 1080).with_refresh_hz(120)).unwrap();

        let any_rate = registry.fullscreen_mode_match(&DisplayMode::new(1920, 1080).with_display(id)).unwrap();
        assert_eq!(any_rate.refresh.numerator(), 120);

        let exact = registry
            .fullscreen_mode_match(&DisplayMode::new(1920, 1080).with_refresh_hz(60).with_display(id))
            .unwrap();
        assert_eq!(exact.refresh.numerator(), 60);

        assert!(registry.fullscreen_mode_match(&DisplayMode::new(1024, 768)).is_none());
        assert!(registry.fullscreen_mode_match(&DisplayMode::new(0, 0)).is_none());
    }

    #[test]
    fn test_closest_mode() {
        let (mut registry, id) = registry_with_display();
        for (w, h, hz) in [(2560, 1440, 60), (1920, 1200, 60), (1920, 1080, 60), (1920, 1080, 30), (1280, 720, 60)] {
            registry
                .add_fullscreen_mode(id, DisplayMode::new(w, h).with_refresh_hz(hz).with_format(PixelFormat::Xrgb8888))
                .unwrap();
        }
        registry
            .add_fullscreen_mode(id, DisplayMode::new(1600, 900).with_pixel_density(2.0))
            .unwrap();

        let mode = registry.closest_fullscreen_mode(id, 1600, 900, 0.0, false).unwrap().unwrap();
        assert_eq!((mode.w, mode.h, mode.refresh.numerator()), (1920, 1080, 60));

        let mode = registry.closest_fullscreen_mode(id, 1600, 900, 30.0, false).unwrap().unwrap();
        assert_eq!((mode.w, mode.h, mode.refresh.numerator()), (1920, 1080, 30));

        let mode = registry.closest_fullscreen_mode(id, 1600, 900, 0.0, true).unwrap().unwrap();
        assert_eq!((mode.w, mode.h), (1600, 900));

        assert!(registry.closest_fullscreen_mode(id, 4096, 2160, 0.0, true).unwrap().is_none());
    }

    #[test]
    fn test_reset_restores_desktop_mode() {
        let (mut registry, id) = registry_with_display();
        let mode = DisplayMode::new(1280, 720).with_refresh_hz(60);
        registry.add_fullscreen_mode(id, mode).unwrap();
        registry.set_current_mode(id, Some(mode.with_display(id).finalized())).unwrap();
        assert!(registry.get(id).unwrap().is_mode_switched());

        registry.reset_fullscreen_modes(id).unwrap();
        let display = registry.get(id).unwrap();
        assert!(display.modes().is_empty());
        assert_eq!(display.current_mode(), display.desktop_mode());
    }

    #[test]
    fn test_content_scale_and_hdr_are_clamped() {
        let (mut registry, id) = registry_with_display();
        assert!(registry.set_content_scale(id, 0.0).unwrap());
        assert_relative_eq!(registry.get(id).unwrap().content_scale(), MIN_CONTENT_SCALE);
        assert!(!registry.set_content_scale(id, 0.05).unwrap());

        registry.set_hdr(id, HdrProperties { headroom: 0.5, sdr_white_level: 3.0 }).unwrap();
        let hdr = registry.get(id).unwrap().hdr();
        assert_relative_eq!(hdr.headroom, 1.0);
        assert_relative_eq!(hdr.sdr_white_level, 3.0);
    }

    #[test]
    fn test_fallback_bounds_lay_out_left_to_right() {
        let (mut registry, first) = registry_with_display();
        let second = registry.add(DisplayDesc::new(DisplayMode::new(1920, 1080)));
        assert_eq!(registry.fallback_bounds(first).unwrap(), Rect::new(0, 0, 2560, 1440));
        assert_eq!(registry.fallback_bounds(second).unwrap(), Rect::new(2560, 0, 1920, 1080));
    }
}
