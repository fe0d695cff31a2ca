//! Window lifecycle, geometry and state operations

use super::{allow_unsupported, VideoSubsystem};
use crate::backend::BackendCapabilities;
use crate::display::{DisplayMode, HdrProperties};
use crate::error::{VideoError, VideoResult};
use crate::events::{EventArg, EventType};
use crate::foundation::collections::WindowId;
use crate::foundation::math::{Point, Rect};
use crate::window::{Window, WindowDesc, WindowFlags, WindowPosition, MAX_WINDOW_DIMENSION};

/// Fail on popup windows
fn not_popup(window: &Window) -> VideoResult<()> {
    if window.is_popup() {
        Err(VideoError::PopupWindow)
    } else {
        Ok(())
    }
}

fn pending_flags_mut(window: &mut Window) -> &mut WindowFlags {
    window.pending_flags.get_or_insert_with(WindowFlags::empty)
}

impl VideoSubsystem {
    // ---- Lifecycle ----

    /// Create a window
    ///
    /// The window starts hidden and is shown before this returns unless
    /// [`WindowFlags::HIDDEN`] was requested. State flags in the request
    /// (fullscreen, minimized, maximized, grabs) are applied when it is shown.
    pub fn create_window(&mut self, desc: WindowDesc) -> VideoResult<WindowId> {
        self.tracked(|video| video.create_window_internal(desc))
    }

    fn validate_window_desc(&self, desc: &WindowDesc) -> VideoResult<()> {
        if desc.w > MAX_WINDOW_DIMENSION || desc.h > MAX_WINDOW_DIMENSION {
            return Err(VideoError::invalid_param(
                "size",
                format!("{}x{} exceeds {}", desc.w, desc.h, MAX_WINDOW_DIMENSION),
            ));
        }

        let graphics = desc.flags & WindowFlags::GRAPHICS_GROUP;
        if graphics.bits().count_ones() > 1 {
            return Err(VideoError::ConflictingFlags { group: "graphics", flags: graphics });
        }
        let kind = desc.flags & WindowFlags::TYPE_GROUP;
        if kind.bits().count_ones() > 1 {
            return Err(VideoError::ConflictingFlags { group: "window type", flags: kind });
        }

        if desc.flags.intersects(WindowFlags::POPUP) {
            if desc.parent.is_none() {
                return Err(VideoError::MissingParent("Popup"));
            }
            if !self.capabilities.contains(BackendCapabilities::POPUP_WINDOWS) {
                return Err(VideoError::Unsupported("popup windows"));
            }
        }
        if desc.flags.contains(WindowFlags::MODAL) && desc.parent.is_none() {
            return Err(VideoError::MissingParent("Modal"));
        }
        if let Some(parent) = desc.parent {
            self.windows.get(parent)?;
        }

        let required = [
            (WindowFlags::OPENGL, BackendCapabilities::OPENGL, "OpenGL windows"),
            (WindowFlags::VULKAN, BackendCapabilities::VULKAN, "Vulkan windows"),
            (WindowFlags::METAL, BackendCapabilities::METAL, "Metal windows"),
        ];
        for (flag, capability, what) in required {
            if desc.flags.contains(flag) && !self.capabilities.contains(capability) {
                return Err(VideoError::Unsupported(what));
            }
        }
        Ok(())
    }

    fn create_window_internal(&mut self, desc: WindowDesc) -> VideoResult<WindowId> {
        self.validate_window_desc(&desc)?;

        let w = desc.w.max(1);
        let h = desc.h.max(1);
        let mut flags = desc.flags;
        let popup = flags.intersects(WindowFlags::POPUP);
        if popup {
            flags.remove(WindowFlags::FULLSCREEN | WindowFlags::MINIMIZED | WindowFlags::MAXIMIZED);
        }

        let (x, y) = if popup {
            // Popup coordinates are relative to the parent
            let parent = match desc.parent {
                Some(parent) => self.windows.get(parent)?.rect,
                None => return Err(VideoError::MissingParent("Popup")),
            };
            let resolve = |position: WindowPosition, parent_extent: i32, extent: i32| match position {
                WindowPosition::At(value) => value,
                WindowPosition::Centered(_) => (parent_extent - extent) / 2,
                WindowPosition::Undefined(_) => 0,
            };
            (resolve(desc.x, parent.w, w), resolve(desc.y, parent.h, h))
        } else if desc.x.is_deferred() || desc.y.is_deferred() {
            let display = match desc.x.display().or_else(|| desc.y.display()) {
                Some(display) => {
                    self.displays.get(display)?;
                    display
                }
                None => self.displays.primary()?,
            };
            let usable = self.usable_bounds_of(display)?;
            let bounds = if w > usable.w || h > usable.h {
                self.bounds_of(display)?
            } else {
                usable
            };
            let x = match desc.x {
                WindowPosition::At(x) => x,
                _ => bounds.x + (bounds.w - w) / 2,
            };
            let y = match desc.y {
                WindowPosition::At(y) => y,
                _ => bounds.y + (bounds.h - h) / 2,
            };
            (x, y)
        } else {
            match (desc.x, desc.y) {
                (WindowPosition::At(x), WindowPosition::At(y)) => (x, y),
                _ => (0, 0),
            }
        };

        let mut window = Window::new(desc.title, Rect::new(x, y, w, h), (flags & WindowFlags::CREATE) | WindowFlags::HIDDEN);
        window.pending_flags = Some(flags & WindowFlags::STATE);
        window.undefined_x = matches!(desc.x, WindowPosition::Undefined(_));
        window.undefined_y = matches!(desc.y, WindowPosition::Undefined(_));
        window.parent = desc.parent;
        let id = self.windows.insert(window)?;

        if let Err(e) = self.backend.create_window(self.windows.get(id)?) {
            log::warn!("Backend couldn't create window: {}", e);
            self.windows.remove(id);
            return Err(e);
        }
        self.drain_backend();

        let display = self.display_for_window_position(id)?;
        let display_hdr = self.displays.get(display)?.hdr();
        let window = self.windows.get_mut(id)?;
        window.last_display = Some(display);
        window.hdr = display_hdr;
        let scale = self.compute_display_scale(id);
        let pixel_size = self.pixel_size(id);
        let window = self.windows.get_mut(id)?;
        window.display_scale = scale;
        window.last_pixel_size = pixel_size;

        log::debug!("Created window {:?} \"{}\" at {} on display {}", id, window.title, window.rect, display);
        if !flags.contains(WindowFlags::HIDDEN) {
            self.show_window_internal(id)?;
        }
        Ok(id)
    }

    /// Destroy a window and all of its children
    pub fn destroy_window(&mut self, id: WindowId) -> VideoResult<()> {
        self.tracked(|video| video.destroy_window_internal(id))
    }

    pub(crate) fn destroy_window_internal(&mut self, id: WindowId) -> VideoResult<()> {
        let window = self.windows.get_mut(id)?;
        if window.is_destroying {
            return Ok(());
        }
        window.is_destroying = true;
        log::debug!("Destroying window {:?}", id);

        for child in self.windows.children(id) {
            self.destroy_window_internal(child)?;
        }

        let event = self.window_event(EventType::WindowDestroyed, id);
        self.emit(event);
        self.windows.reparent(id, None)?;

        if let Err(e) = self.update_fullscreen(id, super::fullscreen::Transition::Leave, true) {
            log::debug!("Leaving fullscreen while destroying {:?}: {}", id, e);
        }
        if !self.windows.get(id)?.flags.contains(WindowFlags::EXTERNAL) {
            if let Err(e) = self.hide_window_internal(id) {
                log::debug!("Hiding {:?} while destroying: {}", id, e);
            }
        }

        if self.focus.keyboard == Some(id) {
            self.focus.keyboard = None;
        }
        if self.focus.mouse == Some(id) {
            self.focus.mouse = None;
        }
        if self.focus.grabbed == Some(id) {
            self.focus.grabbed = None;
        }
        if self.gl_window == Some(id) {
            log::debug!("Unbinding graphics context from {:?}", id);
            self.gl_window = None;
        }

        self.backend.destroy_window(self.windows.get(id)?);
        self.drain_backend();
        self.displays.clear_fullscreen_window(id);
        self.windows.remove(id);
        Ok(())
    }

    // ---- Queries ----

    /// Look up a window
    pub fn window(&self, id: WindowId) -> VideoResult<&Window> {
        self.record(self.windows.get(id))
    }

    /// Live windows in creation order
    pub fn windows(&self) -> Vec<WindowId> {
        self.windows.ids()
    }

    /// Current flags of a window
    pub fn window_flags(&self, id: WindowId) -> VideoResult<WindowFlags> {
        self.window(id).map(Window::flags)
    }

    /// Position; relative to the parent for popups
    pub fn window_position(&self, id: WindowId) -> VideoResult<Point> {
        self.window(id).map(Window::position)
    }

    /// Size in screen units
    pub fn window_size(&self, id: WindowId) -> VideoResult<(i32, i32)> {
        self.window(id).map(Window::size)
    }

    /// Size of the backing buffer in pixels
    pub fn window_size_in_pixels(&self, id: WindowId) -> VideoResult<(i32, i32)> {
        let result = self.windows.get(id).map(|_| self.pixel_size(id));
        self.record(result)
    }

    /// Pixels per screen unit
    pub fn window_pixel_density(&self, id: WindowId) -> VideoResult<f32> {
        let result = self.windows.get(id).map(|_| self.pixel_density(id));
        self.record(result)
    }

    /// Pixel density times the display's content scale
    pub fn window_display_scale(&self, id: WindowId) -> VideoResult<f32> {
        self.window(id).map(Window::display_scale)
    }

    /// HDR properties of the output the window is on
    pub fn window_hdr(&self, id: WindowId) -> VideoResult<HdrProperties> {
        self.window(id).map(Window::hdr)
    }

    /// Parent of a window
    pub fn window_parent(&self, id: WindowId) -> VideoResult<Option<WindowId>> {
        self.window(id).map(Window::parent)
    }

    /// Window with keyboard focus
    pub fn keyboard_focus(&self) -> Option<WindowId> {
        self.focus.keyboard
    }

    /// Window under the pointer
    pub fn mouse_focus(&self) -> Option<WindowId> {
        self.focus.mouse
    }

    /// Window holding an input grab
    pub fn grabbed_window(&self) -> Option<WindowId> {
        self.focus.grabbed
    }

    // ---- Coordinates ----

    /// Convert parent-relative coordinates to desktop coordinates
    ///
    /// Popup positions are relative to their parent; the conversion walks the
    /// parent chain for as long as it consists of popups.
    pub fn relative_to_global(&self, id: WindowId, x: i32, y: i32) -> VideoResult<Point> {
        let result = self.offset_to_global(id).map(|offset| Point::new(x + offset.x, y + offset.y));
        self.record(result)
    }

    /// Convert desktop coordinates to parent-relative coordinates
    pub fn global_to_relative(&self, id: WindowId, x: i32, y: i32) -> VideoResult<Point> {
        let result = self.offset_to_global(id).map(|offset| Point::new(x - offset.x, y - offset.y));
        self.record(result)
    }

    fn offset_to_global(&self, id: WindowId) -> VideoResult<Point> {
        let mut offset = Point::new(0, 0);
        let mut current = self.windows.get(id)?;
        while current.is_popup() {
            let Some(parent) = current.parent else { break };
            let parent = self.windows.get(parent)?;
            offset.x += parent.rect.x;
            offset.y += parent.rect.y;
            current = parent;
        }
        Ok(offset)
    }

    /// Desktop-coordinate rectangle of a window
    pub(crate) fn global_rect(&self, id: WindowId, include_pending: bool) -> VideoResult<Rect> {
        let window = self.windows.get(id)?;
        let mut rect = window.rect;
        if include_pending {
            rect.x = window.pending.x.unwrap_or(rect.x);
            rect.y = window.pending.y.unwrap_or(rect.y);
            rect.w = window.pending.w.unwrap_or(rect.w);
            rect.h = window.pending.h.unwrap_or(rect.h);
        }
        let offset = self.offset_to_global(id)?;
        Ok(Rect::new(rect.x + offset.x, rect.y + offset.y, rect.w, rect.h))
    }

    // ---- Geometry ----

    /// Move a window
    ///
    /// Deferred positions resolve against the target display's bounds. A
    /// maximized or fullscreen window only records the position for when it
    /// returns to floating state.
    pub fn set_window_position(&mut self, id: WindowId, x: WindowPosition, y: WindowPosition) -> VideoResult<()> {
        self.tracked(|video| {
            let window = video.windows.get(id)?;
            let floating = window.floating;
            let (x, y) = if x.is_deferred() || y.is_deferred() {
                let display = match x.display().or_else(|| y.display()) {
                    Some(display) => {
                        video.displays.get(display)?;
                        display
                    }
                    None => video.window_display(id)?,
                };
                let bounds = video.bounds_of(display)?;
                let resolve = |position: WindowPosition, origin: i32, extent: i32, current: i32, size: i32| match position {
                    WindowPosition::At(value) => value,
                    WindowPosition::Centered(_) => origin + (extent - size) / 2,
                    WindowPosition::Undefined(_) => current,
                };
                (
                    resolve(x, bounds.x, bounds.w, floating.x, floating.w),
                    resolve(y, bounds.y, bounds.h, floating.y, floating.h),
                )
            } else {
                match (x, y) {
                    (WindowPosition::At(x), WindowPosition::At(y)) => (x, y),
                    _ => (floating.x, floating.y),
                }
            };

            let window = video.windows.get_mut(id)?;
            window.floating.x = x;
            window.floating.y = y;
            window.undefined_x = false;
            window.undefined_y = false;
            if !window.is_floating() {
                return Ok(());
            }
            window.pending.x = Some(x);
            window.pending.y = Some(y);

            let result = video.backend.set_window_position(video.windows.get(id)?);
            if result.is_err() {
                let window = video.windows.get_mut(id)?;
                window.pending.x = None;
                window.pending.y = None;
            }
            result?;
            video.drain_backend();
            video.sync_if_required(id);
            Ok(())
        })
    }

    /// Resize a window
    ///
    /// The size is fitted to the aspect-ratio constraints first and then
    /// clamped to the minimum and maximum size, so the size limits win.
    pub fn set_window_size(&mut self, id: WindowId, w: i32, h: i32) -> VideoResult<()> {
        self.tracked(|video| {
            if w <= 0 {
                return Err(VideoError::invalid_param("w", "must be positive"));
            }
            if h <= 0 {
                return Err(VideoError::invalid_param("h", "must be positive"));
            }
            video.resize_window(id, w, h)
        })
    }

    fn resize_window(&mut self, id: WindowId, w: i32, h: i32) -> VideoResult<()> {
        let window = self.windows.get_mut(id)?;
        let (w, h) = window.constrain_aspect(w, h);
        let (w, h) = window.clamp_size(w, h);
        window.floating.w = w;
        window.floating.h = h;
        if !window.is_floating() {
            return Ok(());
        }
        window.pending.w = Some(w);
        window.pending.h = Some(h);

        let result = self.backend.set_window_size(self.windows.get(id)?);
        if result.is_err() {
            let window = self.windows.get_mut(id)?;
            window.pending.w = None;
            window.pending.h = None;
        }
        result?;
        self.drain_backend();
        self.sync_if_required(id);
        Ok(())
    }

    /// Commit pending geometry without waiting for the backend when
    /// synchronous window operations are requested
    fn sync_if_required(&mut self, id: WindowId) {
        if !self.sync_window_operations() {
            return;
        }
        let Ok(window) = self.windows.get(id) else { return };
        let pending = window.pending;
        if let (Some(x), Some(y)) = (pending.x, pending.y) {
            self.on_window_moved(id, x, y);
        }
        if let (Some(w), Some(h)) = (pending.w, pending.h) {
            self.on_window_resized(id, w, h);
        }
    }

    /// Set the minimum size; zero leaves an axis unconstrained
    pub fn set_window_minimum_size(&mut self, id: WindowId, min_w: i32, min_h: i32) -> VideoResult<()> {
        self.tracked(|video| {
            if min_w < 0 {
                return Err(VideoError::invalid_param("min_w", "must not be negative"));
            }
            if min_h < 0 {
                return Err(VideoError::invalid_param("min_h", "must not be negative"));
            }
            let window = video.windows.get_mut(id)?;
            let (max_w, max_h) = window.max_size;
            if (max_w > 0 && min_w > max_w) || (max_h > 0 && min_h > max_h) {
                return Err(VideoError::invalid_param("min_w", "minimum size larger than maximum size"));
            }
            window.min_size = (min_w, min_h);
            let floating = window.floating;
            allow_unsupported(video.backend.set_window_minimum_size(video.windows.get(id)?))?;
            allow_unsupported(video.resize_window(id, floating.w, floating.h))
        })
    }

    /// Set the maximum size; zero leaves an axis unconstrained
    pub fn set_window_maximum_size(&mut self, id: WindowId, max_w: i32, max_h: i32) -> VideoResult<()> {
        self.tracked(|video| {
            if max_w < 0 {
                return Err(VideoError::invalid_param("max_w", "must not be negative"));
            }
            if max_h < 0 {
                return Err(VideoError::invalid_param("max_h", "must not be negative"));
            }
            let window = video.windows.get_mut(id)?;
            let (min_w, min_h) = window.min_size;
            if (max_w > 0 && max_w < min_w) || (max_h > 0 && max_h < min_h) {
                return Err(VideoError::invalid_param("max_w", "maximum size smaller than minimum size"));
            }
            window.max_size = (max_w, max_h);
            let floating = window.floating;
            allow_unsupported(video.backend.set_window_maximum_size(video.windows.get(id)?))?;
            allow_unsupported(video.resize_window(id, floating.w, floating.h))
        })
    }

    /// Constrain the aspect ratio; zero leaves a bound open
    pub fn set_window_aspect_ratio(&mut self, id: WindowId, min_aspect: f32, max_aspect: f32) -> VideoResult<()> {
        self.tracked(|video| {
            if min_aspect.is_nan() || min_aspect < 0.0 {
                return Err(VideoError::invalid_param("min_aspect", "must not be negative"));
            }
            if max_aspect.is_nan() || max_aspect < 0.0 {
                return Err(VideoError::invalid_param("max_aspect", "must not be negative"));
            }
            if min_aspect > 0.0 && max_aspect > 0.0 && min_aspect > max_aspect {
                return Err(VideoError::invalid_param("min_aspect", "larger than max_aspect"));
            }
            let window = video.windows.get_mut(id)?;
            window.aspect_ratio = (min_aspect, max_aspect);
            let floating = window.floating;
            allow_unsupported(video.backend.set_window_aspect_ratio(video.windows.get(id)?))?;
            allow_unsupported(video.resize_window(id, floating.w, floating.h))
        })
    }

    // ---- Attributes ----

    /// Change the title
    pub fn set_window_title(&mut self, id: WindowId, title: &str) -> VideoResult<()> {
        self.tracked(|video| {
            let window = video.windows.get_mut(id)?;
            if window.title == title {
                return Ok(());
            }
            window.title = title.to_string();
            allow_unsupported(video.backend.set_window_title(video.windows.get(id)?))
        })
    }

    /// Add or remove window decoration
    pub fn set_window_bordered(&mut self, id: WindowId, bordered: bool) -> VideoResult<()> {
        self.tracked(|video| {
            let window = video.windows.get(id)?;
            not_popup(window)?;
            if bordered != window.flags.contains(WindowFlags::BORDERLESS) {
                return Ok(());
            }
            video.backend.set_window_bordered(window, bordered)?;
            video.windows.get_mut(id)?.flags.set(WindowFlags::BORDERLESS, !bordered);
            Ok(())
        })
    }

    /// Allow or forbid user resizing
    pub fn set_window_resizable(&mut self, id: WindowId, resizable: bool) -> VideoResult<()> {
        self.tracked(|video| {
            let window = video.windows.get(id)?;
            not_popup(window)?;
            if resizable == window.flags.contains(WindowFlags::RESIZABLE) {
                return Ok(());
            }
            video.backend.set_window_resizable(window, resizable)?;
            video.windows.get_mut(id)?.flags.set(WindowFlags::RESIZABLE, resizable);
            Ok(())
        })
    }

    /// Keep a window above others
    pub fn set_window_always_on_top(&mut self, id: WindowId, on_top: bool) -> VideoResult<()> {
        self.tracked(|video| {
            let window = video.windows.get(id)?;
            not_popup(window)?;
            if on_top == window.flags.contains(WindowFlags::ALWAYS_ON_TOP) {
                return Ok(());
            }
            video.backend.set_window_always_on_top(window, on_top)?;
            video.windows.get_mut(id)?.flags.set(WindowFlags::ALWAYS_ON_TOP, on_top);
            Ok(())
        })
    }

    /// Allow or forbid keyboard focus
    pub fn set_window_focusable(&mut self, id: WindowId, focusable: bool) -> VideoResult<()> {
        self.tracked(|video| {
            let window = video.windows.get(id)?;
            if focusable != window.flags.contains(WindowFlags::NOT_FOCUSABLE) {
                return Ok(());
            }
            video.backend.set_window_focusable(window, focusable)?;
            video.windows.get_mut(id)?.flags.set(WindowFlags::NOT_FOCUSABLE, !focusable);
            Ok(())
        })
    }

    /// Confine or release the pointer
    pub fn set_window_mouse_grab(&mut self, id: WindowId, grabbed: bool) -> VideoResult<()> {
        self.tracked(|video| video.set_grab(id, WindowFlags::MOUSE_GRABBED, grabbed))
    }

    /// Grab or release the keyboard
    pub fn set_window_keyboard_grab(&mut self, id: WindowId, grabbed: bool) -> VideoResult<()> {
        self.tracked(|video| video.set_grab(id, WindowFlags::KEYBOARD_GRABBED, grabbed))
    }

    fn set_grab(&mut self, id: WindowId, flag: WindowFlags, grabbed: bool) -> VideoResult<()> {
        let window = self.windows.get_mut(id)?;
        if window.flags.contains(WindowFlags::HIDDEN) {
            pending_flags_mut(window).set(flag, grabbed);
            return Ok(());
        }
        if window.flags.contains(flag) == grabbed {
            return Ok(());
        }

        // One grab at a time
        if grabbed {
            if let Some(previous) = self.focus.grabbed.filter(|previous| *previous != id) {
                if let Ok(previous) = self.windows.get_mut(previous) {
                    previous.flags.remove(WindowFlags::MOUSE_GRABBED | WindowFlags::KEYBOARD_GRABBED);
                }
            }
        }

        let window = self.windows.get(id)?;
        if flag == WindowFlags::MOUSE_GRABBED {
            self.backend.set_window_mouse_grab(window, grabbed)?;
        } else {
            self.backend.set_window_keyboard_grab(window, grabbed)?;
        }
        let window = self.windows.get_mut(id)?;
        window.flags.set(flag, grabbed);
        if window.flags.intersects(WindowFlags::MOUSE_GRABBED | WindowFlags::KEYBOARD_GRABBED) {
            self.focus.grabbed = Some(id);
        } else if self.focus.grabbed == Some(id) {
            self.focus.grabbed = None;
        }
        Ok(())
    }

    /// Re-parent a window; `None` makes it top-level
    pub fn set_window_parent(&mut self, id: WindowId, parent: Option<WindowId>) -> VideoResult<()> {
        self.tracked(|video| {
            not_popup(video.windows.get(id)?)?;
            if let Some(parent) = parent {
                if parent == id {
                    return Err(VideoError::invalid_param("parent", "a window can't be its own parent"));
                }
                not_popup(video.windows.get(parent)?)?;
            }
            if parent.is_none() {
                video.windows.get_mut(id)?.flags.remove(WindowFlags::MODAL);
            }
            video.windows.reparent(id, parent)
        })
    }

    /// Make a window modal to its parent
    pub fn set_window_modal(&mut self, id: WindowId, modal: bool) -> VideoResult<()> {
        self.tracked(|video| {
            let window = video.windows.get_mut(id)?;
            not_popup(window)?;
            if modal {
                if window.parent.is_none() {
                    return Err(VideoError::MissingParent("Modal"));
                }
                let kind = window.flags & (WindowFlags::TYPE_GROUP - WindowFlags::MODAL);
                if !kind.is_empty() {
                    return Err(VideoError::ConflictingFlags {
                        group: "window type",
                        flags: kind | WindowFlags::MODAL,
                    });
                }
            }
            window.flags.set(WindowFlags::MODAL, modal);
            Ok(())
        })
    }

    /// Raise a window above its siblings
    pub fn raise_window(&mut self, id: WindowId) -> VideoResult<()> {
        self.tracked(|video| {
            let window = video.windows.get(id)?;
            if !window.is_visible() {
                return Ok(());
            }
            allow_unsupported(video.backend.raise_window(window))
        })
    }

    /// Request the user's attention
    pub fn flash_window(&mut self, id: WindowId) -> VideoResult<()> {
        self.tracked(|video| video.backend.flash_window(video.windows.get(id)?))
    }

    /// Bind the graphics context to a window, or unbind it
    pub fn make_gl_current(&mut self, id: Option<WindowId>) -> VideoResult<()> {
        self.tracked(|video| {
            if let Some(id) = id {
                if !video.windows.get(id)?.flags.contains(WindowFlags::OPENGL) {
                    return Err(VideoError::invalid_param("window", "not an OpenGL window"));
                }
            }
            video.gl_window = id;
            Ok(())
        })
    }

    /// Window the graphics context is bound to
    pub fn gl_current_window(&self) -> Option<WindowId> {
        self.gl_window
    }

    // ---- Visibility ----

    /// Show a window
    ///
    /// A window whose parent is hidden is shown along with the parent.
    pub fn show_window(&mut self, id: WindowId) -> VideoResult<()> {
        self.tracked(|video| video.show_window_internal(id))
    }

    pub(crate) fn show_window_internal(&mut self, id: WindowId) -> VideoResult<()> {
        let window = self.windows.get(id)?;
        if window.is_visible() {
            return Ok(());
        }
        let parent_hidden = match window.parent {
            Some(parent) => !self.windows.get(parent)?.is_visible(),
            None => false,
        };
        if parent_hidden {
            self.windows.get_mut(id)?.restore_on_show = true;
            return Ok(());
        }

        let focusable = !window.flags.contains(WindowFlags::NOT_FOCUSABLE);
        match self.backend.show_window(window) {
            Ok(()) => {}
            Err(e) if e.is_unsupported() => {
                if focusable {
                    self.set_keyboard_focus(Some(id));
                }
            }
            Err(e) => return Err(e),
        }
        self.drain_backend();
        self.on_window_shown(id);

        for child in self.windows.children(id) {
            let Ok(window) = self.windows.get_mut(child) else { continue };
            if !window.restore_on_show {
                continue;
            }
            window.restore_on_show = false;
            self.show_window_internal(child)?;
        }
        Ok(())
    }

    /// Hide a window and its visible children
    ///
    /// State flags are remembered and reapplied by the next show.
    pub fn hide_window(&mut self, id: WindowId) -> VideoResult<()> {
        self.tracked(|video| video.hide_window_internal(id))
    }

    pub(crate) fn hide_window_internal(&mut self, id: WindowId) -> VideoResult<()> {
        let window = self.windows.get_mut(id)?;
        if !window.is_visible() {
            window.restore_on_show = false;
            return Ok(());
        }
        let previous_pending = window.pending_flags.replace(window.flags & WindowFlags::STATE);
        window.is_hiding = true;

        // A child that refuses to hide stays visible; the parent still hides
        let mut hidden_children = Vec::new();
        for child in self.windows.children(id) {
            if !self.windows.get(child).is_ok_and(Window::is_visible) {
                continue;
            }
            match self.hide_window_internal(child) {
                Ok(()) => {
                    self.windows.get_mut(child)?.restore_on_show = true;
                    hidden_children.push(child);
                }
                Err(e) => log::debug!("Child {:?} of {:?} stayed visible: {}", child, id, e),
            }
        }

        if let Err(e) = self.update_fullscreen(id, super::fullscreen::Transition::Leave, true) {
            log::debug!("Leaving fullscreen while hiding {:?}: {}", id, e);
        }

        let result = self.backend.hide_window(self.windows.get(id)?);
        match result {
            Ok(()) => {}
            Err(e) if e.is_unsupported() => {
                if self.focus.keyboard == Some(id) {
                    self.set_keyboard_focus(None);
                }
                if self.focus.mouse == Some(id) {
                    self.focus.mouse = None;
                }
            }
            Err(e) => {
                let window = self.windows.get_mut(id)?;
                window.is_hiding = false;
                window.pending_flags = previous_pending;
                for child in hidden_children {
                    if let Ok(child_window) = self.windows.get_mut(child) {
                        child_window.restore_on_show = false;
                    }
                    log_failure("show", self.show_window_internal(child));
                }
                return Err(e);
            }
        }
        self.drain_backend();
        self.windows.get_mut(id)?.is_hiding = false;
        self.on_window_hidden(id);
        Ok(())
    }

    /// Apply state flags deferred while the window was hidden
    pub(crate) fn apply_window_flags(&mut self, id: WindowId, flags: WindowFlags) {
        log::debug!("Applying deferred flags {:?} to {:?}", flags, id);
        if !flags.intersects(WindowFlags::MINIMIZED | WindowFlags::MAXIMIZED) {
            log_failure("restore", self.restore_window_internal(id));
        }
        if flags.contains(WindowFlags::MAXIMIZED) {
            log_failure("maximize", self.maximize_window_internal(id));
        }
        log_failure(
            "fullscreen",
            self.set_fullscreen_internal(id, flags.contains(WindowFlags::FULLSCREEN)),
        );
        if flags.contains(WindowFlags::MINIMIZED) {
            log_failure("minimize", self.minimize_window_internal(id));
        }
        if flags.contains(WindowFlags::MOUSE_GRABBED) {
            log_failure("mouse grab", self.set_grab(id, WindowFlags::MOUSE_GRABBED, true));
        }
        if flags.contains(WindowFlags::KEYBOARD_GRABBED) {
            log_failure("keyboard grab", self.set_grab(id, WindowFlags::KEYBOARD_GRABBED, true));
        }
    }

    // ---- Window state ----

    /// Minimize a window
    pub fn minimize_window(&mut self, id: WindowId) -> VideoResult<()> {
        self.tracked(|video| {
            not_popup(video.windows.get(id)?)?;
            video.minimize_window_internal(id)
        })
    }

    pub(crate) fn minimize_window_internal(&mut self, id: WindowId) -> VideoResult<()> {
        let window = self.windows.get_mut(id)?;
        if window.flags.contains(WindowFlags::HIDDEN) {
            pending_flags_mut(window).insert(WindowFlags::MINIMIZED);
            return Ok(());
        }
        if window.flags.contains(WindowFlags::MINIMIZED) {
            return Ok(());
        }
        self.backend.minimize_window(self.windows.get(id)?)?;
        self.drain_backend();
        Ok(())
    }

    /// Maximize a window
    pub fn maximize_window(&mut self, id: WindowId) -> VideoResult<()> {
        self.tracked(|video| {
            not_popup(video.windows.get(id)?)?;
            video.maximize_window_internal(id)
        })
    }

    fn maximize_window_internal(&mut self, id: WindowId) -> VideoResult<()> {
        let window = self.windows.get_mut(id)?;
        if window.flags.contains(WindowFlags::HIDDEN) {
            pending_flags_mut(window).insert(WindowFlags::MAXIMIZED);
            return Ok(());
        }
        if window.flags.contains(WindowFlags::MAXIMIZED) {
            return Ok(());
        }
        self.backend.maximize_window(self.windows.get(id)?)?;
        self.drain_backend();
        Ok(())
    }

    /// Restore a window from minimized or maximized state
    pub fn restore_window(&mut self, id: WindowId) -> VideoResult<()> {
        self.tracked(|video| {
            not_popup(video.windows.get(id)?)?;
            video.restore_window_internal(id)
        })
    }

    fn restore_window_internal(&mut self, id: WindowId) -> VideoResult<()> {
        let window = self.windows.get_mut(id)?;
        if window.flags.contains(WindowFlags::HIDDEN) {
            pending_flags_mut(window).remove(WindowFlags::MINIMIZED | WindowFlags::MAXIMIZED);
            return Ok(());
        }
        if !window.flags.intersects(WindowFlags::MINIMIZED | WindowFlags::MAXIMIZED) {
            return Ok(());
        }
        self.backend.restore_window(self.windows.get(id)?)?;
        self.drain_backend();
        Ok(())
    }

    // ---- Focus ----

    pub(crate) fn set_keyboard_focus(&mut self, id: Option<WindowId>) {
        if self.focus.keyboard == id {
            return;
        }
        if let Some(previous) = self.focus.keyboard.take() {
            self.on_focus_lost(previous);
        }
        if let Some(id) = id {
            self.on_focus_gained(id);
        }
    }

    // ---- Pixels and scale ----

    /// Pixels per screen unit for a window
    pub(crate) fn pixel_density(&self, id: WindowId) -> f32 {
        let Ok(window) = self.windows.get(id) else { return 1.0 };
        if !window.flags.contains(WindowFlags::HIGH_PIXEL_DENSITY) {
            return 1.0;
        }
        let display = self
            .displays
            .display_for_fullscreen_window(id)
            .or(window.last_display)
            .and_then(|display| self.displays.get(display).ok());
        let Some(display) = display else { return 1.0 };
        let mode: &DisplayMode = if window.fullscreen_exclusive {
            display.current_mode()
        } else {
            display.desktop_mode()
        };
        mode.pixel_density
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub(crate) fn pixel_size(&self, id: WindowId) -> (i32, i32) {
        let Ok(window) = self.windows.get(id) else { return (0, 0) };
        let density = self.pixel_density(id);
        (
            (window.rect.w as f32 * density).ceil() as i32,
            (window.rect.h as f32 * density).ceil() as i32,
        )
    }

    pub(crate) fn compute_display_scale(&self, id: WindowId) -> f32 {
        let content_scale = self
            .windows
            .get(id)
            .ok()
            .and_then(|window| window.last_display)
            .and_then(|display| self.displays.get(display).ok())
            .map_or(1.0, |display| display.content_scale());
        self.pixel_density(id) * content_scale
    }

    pub(crate) fn check_window_pixel_size_changed(&mut self, id: WindowId) {
        let (w, h) = self.pixel_size(id);
        let Ok(window) = self.windows.get_mut(id) else { return };
        if window.last_pixel_size == (w, h) {
            return;
        }
        window.last_pixel_size = (w, h);
        let event = self
            .window_event(EventType::WindowPixelSizeChanged, id)
            .with_arg("size", EventArg::Size(w, h));
        self.emit(event);
        self.check_window_display_scale_changed(id);
    }

    pub(crate) fn check_window_display_scale_changed(&mut self, id: WindowId) {
        let scale = self.compute_display_scale(id);
        let Ok(window) = self.windows.get_mut(id) else { return };
        if (window.display_scale - scale).abs() <= f32::EPSILON {
            return;
        }
        window.display_scale = scale;
        let event = self
            .window_event(EventType::WindowDisplayScaleChanged, id)
            .with_arg("scale", EventArg::Scale(scale));
        self.emit(event);
    }

    pub(crate) fn set_window_hdr(&mut self, id: WindowId, hdr: HdrProperties) {
        let Ok(window) = self.windows.get_mut(id) else { return };
        if window.hdr == hdr {
            return;
        }
        window.hdr = hdr;
        let event = self
            .window_event(EventType::WindowHdrChanged, id)
            .with_arg("hdr", EventArg::Hdr(hdr));
        self.emit(event);
    }

    /// Track the display a window lies on, migrating its fullscreen
    /// occupancy when it moved to another one
    pub(crate) fn check_window_display_changed(&mut self, id: WindowId) {
        let Ok(window) = self.windows.get(id) else { return };
        if window.is_popup() {
            return;
        }
        let last_display = window.last_display;
        let Ok(display) = self.display_for_window_position(id) else { return };
        if Some(display) == last_display {
            return;
        }

        if let Some(occupied) = self.displays.display_for_fullscreen_window(id) {
            if occupied != display {
                if let Some(occupant) = self.displays.fullscreen_window(display).filter(|other| *other != id) {
                    log::debug!("Display {} already hosts {:?}; minimizing it", display, occupant);
                    log_failure("minimize", self.minimize_window_internal(occupant));
                }
                self.displays.clear_fullscreen_window(id);
                if let Err(e) = self.displays.set_fullscreen_window(display, Some(id)) {
                    log::debug!("Couldn't move fullscreen occupancy: {}", e);
                }
            }
        }
        self.on_window_display_changed(id, display);
    }
}

fn log_failure(what: &str, result: VideoResult<()>) {
    if let Err(e) = result {
        log::debug!("Deferred {} failed: {}", what, e);
    }
}
