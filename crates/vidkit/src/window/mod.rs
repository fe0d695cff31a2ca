//! # Windows
//!
//! Window state and the arena-backed window hierarchy.
//!
//! Geometry is tracked in three sets:
//! - `rect`: the committed, live geometry as last confirmed by the backend
//! - `pending`: per-axis requests not yet confirmed
//! - `floating`: the geometry to return to when leaving maximized or
//!   fullscreen state
//!
//! Window-state flags requested while a window is hidden are kept apart in
//! `pending_flags` and applied when the window is shown.

pub mod registry;

pub use registry::WindowRegistry;

use crate::display::{DisplayMode, HdrProperties};
use crate::foundation::collections::{DisplayId, WindowId};
use crate::foundation::math::{Point, Rect};
use crate::foundation::time::Deadline;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Largest width or height a window may be created with
pub const MAX_WINDOW_DIMENSION: i32 = 16384;

bitflags! {
    /// Window flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct WindowFlags: u32 {
        /// Fullscreen
        const FULLSCREEN = 1 << 0;
        /// Usable with an OpenGL context
        const OPENGL = 1 << 1;
        /// Not visible
        const HIDDEN = 1 << 3;
        /// No window decoration
        const BORDERLESS = 1 << 4;
        /// User-resizable
        const RESIZABLE = 1 << 5;
        /// Minimized
        const MINIMIZED = 1 << 6;
        /// Maximized
        const MAXIMIZED = 1 << 7;
        /// Mouse confined to the window
        const MOUSE_GRABBED = 1 << 8;
        /// Has keyboard focus
        const INPUT_FOCUS = 1 << 9;
        /// Has mouse focus
        const MOUSE_FOCUS = 1 << 10;
        /// Wraps a window created outside this library
        const EXTERNAL = 1 << 11;
        /// Blocks interaction with its parent
        const MODAL = 1 << 12;
        /// Backed by a high pixel density buffer when available
        const HIGH_PIXEL_DENSITY = 1 << 13;
        /// Stays above other windows
        const ALWAYS_ON_TOP = 1 << 16;
        /// Utility window, not shown in the taskbar
        const UTILITY = 1 << 17;
        /// Tooltip popup
        const TOOLTIP = 1 << 18;
        /// Menu popup
        const POPUP_MENU = 1 << 19;
        /// Keyboard grabbed
        const KEYBOARD_GRABBED = 1 << 20;
        /// Usable with a Vulkan surface
        const VULKAN = 1 << 28;
        /// Usable with a Metal view
        const METAL = 1 << 29;
        /// Transparent buffer
        const TRANSPARENT = 1 << 30;
        /// Never takes keyboard focus
        const NOT_FOCUSABLE = 1 << 31;
    }
}

impl WindowFlags {
    /// At most one of these may be set
    pub const TYPE_GROUP: Self = Self::UTILITY
        .union(Self::TOOLTIP)
        .union(Self::POPUP_MENU)
        .union(Self::MODAL);

    /// At most one graphics API may be requested
    pub const GRAPHICS_GROUP: Self = Self::OPENGL.union(Self::VULKAN).union(Self::METAL);

    /// Popup kinds; these require a parent
    pub const POPUP: Self = Self::TOOLTIP.union(Self::POPUP_MENU);

    /// Flags describing window state that a hidden window defers
    pub const STATE: Self = Self::FULLSCREEN
        .union(Self::MINIMIZED)
        .union(Self::MAXIMIZED)
        .union(Self::MOUSE_GRABBED)
        .union(Self::KEYBOARD_GRABBED);

    /// Flags fixed at creation or toggled directly
    pub const CREATE: Self = Self::GRAPHICS_GROUP
        .union(Self::TYPE_GROUP)
        .union(Self::BORDERLESS)
        .union(Self::RESIZABLE)
        .union(Self::EXTERNAL)
        .union(Self::HIGH_PIXEL_DENSITY)
        .union(Self::ALWAYS_ON_TOP)
        .union(Self::TRANSPARENT)
        .union(Self::NOT_FOCUSABLE);
}

/// Coordinator state of a window with respect to fullscreen
///
/// The `FULLSCREEN` flag records what the backend confirmed; this records
/// whether the window currently occupies a display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FullscreenState {
    /// Not occupying any display
    #[default]
    Windowed,
    /// Backend transition into fullscreen in flight
    Entering,
    /// Occupying a display at its desktop mode
    Desktop,
    /// Occupying a display after switching it to a catalog mode
    Exclusive,
    /// Occupying a display through the compositor's own fullscreen space
    Compositor,
    /// Backend transition out of fullscreen in flight
    Leaving,
}

impl FullscreenState {
    /// Whether the window occupies a display in one of the settled variants
    pub fn is_fullscreen(self) -> bool {
        matches!(self, Self::Desktop | Self::Exclusive | Self::Compositor)
    }
}

/// A requested window coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPosition {
    /// Let the library pick, on the given display or the primary one
    Undefined(Option<DisplayId>),
    /// Center on the given display or the primary one
    Centered(Option<DisplayId>),
    /// Explicit coordinate; relative to the parent for popups
    At(i32),
}

impl WindowPosition {
    /// Display the position refers to, if any
    pub fn display(self) -> Option<DisplayId> {
        match self {
            Self::Undefined(display) | Self::Centered(display) => display,
            Self::At(_) => None,
        }
    }

    /// Whether the position must be resolved against a display
    pub fn is_deferred(self) -> bool {
        !matches!(self, Self::At(_))
    }
}

impl Default for WindowPosition {
    fn default() -> Self {
        Self::Undefined(None)
    }
}

/// Parameters for creating a window
#[derive(Debug, Clone)]
pub struct WindowDesc {
    /// Title
    pub title: String,
    /// Horizontal position
    pub x: WindowPosition,
    /// Vertical position
    pub y: WindowPosition,
    /// Width in screen units
    pub w: i32,
    /// Height in screen units
    pub h: i32,
    /// Requested flags
    pub flags: WindowFlags,
    /// Parent for popups, modals and other child windows
    pub parent: Option<WindowId>,
}

impl WindowDesc {
    /// A top-level window of the given size
    pub fn new(title: impl Into<String>, w: i32, h: i32) -> Self {
        Self {
            title: title.into(),
            x: WindowPosition::default(),
            y: WindowPosition::default(),
            w,
            h,
            flags: WindowFlags::empty(),
            parent: None,
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: WindowPosition, y: WindowPosition) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Set the flags
    pub fn with_flags(mut self, flags: WindowFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the parent window
    pub fn with_parent(mut self, parent: WindowId) -> Self {
        self.parent = Some(parent);
        self
    }
}

/// Geometry requested but not yet confirmed, per axis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingGeometry {
    /// Requested x
    pub x: Option<i32>,
    /// Requested y
    pub y: Option<i32>,
    /// Requested width
    pub w: Option<i32>,
    /// Requested height
    pub h: Option<i32>,
}

impl PendingGeometry {
    /// Whether any axis is pending
    pub fn is_pending(&self) -> bool {
        self.x.is_some() || self.y.is_some() || self.w.is_some() || self.h.is_some()
    }
}

/// A live window
#[derive(Debug, Clone)]
pub struct Window {
    pub(crate) id: WindowId,
    pub(crate) title: String,
    pub(crate) flags: WindowFlags,
    pub(crate) pending_flags: Option<WindowFlags>,

    pub(crate) rect: Rect,
    pub(crate) pending: PendingGeometry,
    pub(crate) floating: Rect,
    pub(crate) undefined_x: bool,
    pub(crate) undefined_y: bool,
    pub(crate) min_size: (i32, i32),
    pub(crate) max_size: (i32, i32),
    pub(crate) aspect_ratio: (f32, f32),
    pub(crate) last_pixel_size: (i32, i32),

    pub(crate) requested_fullscreen: Option<DisplayMode>,
    pub(crate) current_fullscreen: Option<DisplayMode>,
    pub(crate) fullscreen_state: FullscreenState,
    pub(crate) fullscreen_exclusive: bool,
    pub(crate) fullscreen_deadline: Option<Deadline>,
    pub(crate) fullscreen_in_flight: bool,
    pub(crate) last_fullscreen_exclusive_display: Option<DisplayId>,

    pub(crate) last_display: Option<DisplayId>,
    pub(crate) display_scale: f32,
    pub(crate) hdr: HdrProperties,

    pub(crate) is_hiding: bool,
    pub(crate) is_destroying: bool,
    pub(crate) restore_on_show: bool,

    pub(crate) parent: Option<WindowId>,
    pub(crate) children: Vec<WindowId>,
}

impl Window {
    pub(crate) fn new(title: String, rect: Rect, flags: WindowFlags) -> Self {
        Self {
            id: WindowId::default(),
            title,
            flags,
            pending_flags: None,
            rect,
            pending: PendingGeometry::default(),
            floating: rect,
            undefined_x: false,
            undefined_y: false,
            min_size: (0, 0),
            max_size: (0, 0),
            aspect_ratio: (0.0, 0.0),
            last_pixel_size: (rect.w, rect.h),
            requested_fullscreen: None,
            current_fullscreen: None,
            fullscreen_state: FullscreenState::Windowed,
            fullscreen_exclusive: false,
            fullscreen_deadline: None,
            fullscreen_in_flight: false,
            last_fullscreen_exclusive_display: None,
            last_display: None,
            display_scale: 1.0,
            hdr: HdrProperties::SDR,
            is_hiding: false,
            is_destroying: false,
            restore_on_show: false,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Window handle
    pub fn id(&self) -> WindowId {
        self.id
    }

    /// Title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Current flags
    pub fn flags(&self) -> WindowFlags {
        self.flags
    }

    /// State flags deferred until the window is shown
    pub fn pending_flags(&self) -> Option<WindowFlags> {
        self.pending_flags
    }

    /// Committed geometry; relative to the parent for popups
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Committed position
    pub fn position(&self) -> Point {
        Point::new(self.rect.x, self.rect.y)
    }

    /// Committed size
    pub fn size(&self) -> (i32, i32) {
        (self.rect.w, self.rect.h)
    }

    /// Requested but unconfirmed geometry
    pub fn pending_geometry(&self) -> PendingGeometry {
        self.pending
    }

    /// Geometry restored when leaving maximized or fullscreen state
    pub fn floating_rect(&self) -> Rect {
        self.floating
    }

    /// Minimum size; zero means unconstrained
    pub fn minimum_size(&self) -> (i32, i32) {
        self.min_size
    }

    /// Maximum size; zero means unconstrained
    pub fn maximum_size(&self) -> (i32, i32) {
        self.max_size
    }

    /// Minimum and maximum aspect ratio; zero means unconstrained
    pub fn aspect_ratio(&self) -> (f32, f32) {
        self.aspect_ratio
    }

    /// Fullscreen mode request; `None` means desktop fullscreen
    pub fn requested_fullscreen_mode(&self) -> Option<DisplayMode> {
        self.requested_fullscreen
    }

    /// Coordinator state
    pub fn fullscreen_state(&self) -> FullscreenState {
        self.fullscreen_state
    }

    /// Whether the window runs in exclusive fullscreen
    pub fn is_fullscreen_exclusive(&self) -> bool {
        self.fullscreen_exclusive
    }

    /// Whether a mode-switch deadline is armed
    pub fn has_fullscreen_deadline(&self) -> bool {
        self.fullscreen_deadline.is_some()
    }

    /// Display the window was last seen on
    pub fn last_display(&self) -> Option<DisplayId> {
        self.last_display
    }

    /// Pixel density times the display's content scale
    pub fn display_scale(&self) -> f32 {
        self.display_scale
    }

    /// HDR properties of the output the window is on
    pub fn hdr(&self) -> HdrProperties {
        self.hdr
    }

    /// Parent window
    pub fn parent(&self) -> Option<WindowId> {
        self.parent
    }

    /// Children, most recently attached first
    pub fn children(&self) -> &[WindowId] {
        &self.children
    }

    /// Whether the window is a tooltip or popup menu
    pub fn is_popup(&self) -> bool {
        self.flags.intersects(WindowFlags::POPUP)
    }

    /// Whether the window is shown
    pub fn is_visible(&self) -> bool {
        !self.flags.contains(WindowFlags::HIDDEN)
    }

    /// Fullscreen, shown and not minimized
    pub fn is_fullscreen_visible(&self) -> bool {
        self.flags.contains(WindowFlags::FULLSCREEN)
            && !self.flags.intersects(WindowFlags::HIDDEN | WindowFlags::MINIMIZED)
    }

    /// Whether the window's size follows its floating geometry
    pub(crate) fn is_floating(&self) -> bool {
        !self.flags.intersects(WindowFlags::FULLSCREEN | WindowFlags::MAXIMIZED)
    }

    /// Clamp a size to the min/max constraints
    pub(crate) fn clamp_size(&self, w: i32, h: i32) -> (i32, i32) {
        let (min_w, min_h) = self.min_size;
        let (max_w, max_h) = self.max_size;
        let mut w = w.max(min_w);
        let mut h = h.max(min_h);
        if max_w > 0 {
            w = w.min(max_w);
        }
        if max_h > 0 {
            h = h.min(max_h);
        }
        (w.max(1), h.max(1))
    }

    /// Adjust a size so its aspect ratio falls within the constraints
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub(crate) fn constrain_aspect(&self, w: i32, h: i32) -> (i32, i32) {
        let (min_aspect, max_aspect) = self.aspect_ratio;
        if h <= 0 {
            return (w, h);
        }
        let aspect = w as f32 / h as f32;
        if min_aspect > 0.0 && aspect < min_aspect {
            return (w, ((w as f32 / min_aspect).round() as i32).max(1));
        }
        if max_aspect > 0.0 && aspect > max_aspect {
            return (((h as f32 * max_aspect).round() as i32).max(1), h);
        }
        (w, h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_groups() {
        assert!(WindowFlags::TYPE_GROUP.contains(WindowFlags::MODAL));
        assert!(!WindowFlags::TYPE_GROUP.contains(WindowFlags::OPENGL));
        assert!((WindowFlags::STATE & WindowFlags::CREATE).is_empty());
    }

    #[test]
    fn test_size_constraints() {
        let mut window = Window::new("t".into(), Rect::new(0, 0, 100, 100), WindowFlags::empty());
        window.min_size = (200, 0);
        window.max_size = (0, 300);
        assert_eq!(window.clamp_size(100, 500), (200, 300));

        window.aspect_ratio = (1.0, 2.0);
        assert_eq!(window.constrain_aspect(100, 200), (100, 100));
        assert_eq!(window.constrain_aspect(900, 300), (600, 300));
        assert_eq!(window.constrain_aspect(300, 200), (300, 200));
    }

    #[test]
    fn test_fullscreen_visibility() {
        let mut window = Window::new("t".into(), Rect::new(0, 0, 100, 100), WindowFlags::FULLSCREEN);
        assert!(window.is_fullscreen_visible());
        window.flags |= WindowFlags::MINIMIZED;
        assert!(!window.is_fullscreen_visible());
        assert!(!window.is_floating());
    }
}
