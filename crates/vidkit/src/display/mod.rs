//! # Displays
//!
//! Attached outputs, their mode catalogs and the registry that owns them.
//!
//! A display's catalog is empty until it is first queried; the video
//! subsystem fills it lazily from the backend. The current mode is stored as
//! an owned copy, `None` meaning "the desktop mode", so it can never dangle
//! when the catalog is re-sorted or reset.

pub mod mode;
pub mod registry;

pub use mode::{DisplayMode, PixelFormat, RefreshRate};
pub use registry::DisplayRegistry;

use crate::foundation::collections::{DisplayId, WindowId};
use serde::{Deserialize, Serialize};

/// Smallest content scale a display may report
pub const MIN_CONTENT_SCALE: f32 = 0.1;

/// HDR output properties
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HdrProperties {
    /// Maximum brightness relative to SDR white, at least 1.0
    pub headroom: f32,
    /// SDR white level relative to 80 nits, at least 1.0
    pub sdr_white_level: f32,
}

impl HdrProperties {
    /// Properties of a display without HDR output
    pub const SDR: Self = Self { headroom: 1.0, sdr_white_level: 1.0 };

    /// Clamp both values to their minimum of 1.0
    pub fn clamped(self) -> Self {
        Self {
            headroom: if self.headroom >= 1.0 { self.headroom } else { 1.0 },
            sdr_white_level: if self.sdr_white_level >= 1.0 { self.sdr_white_level } else { 1.0 },
        }
    }

    /// Whether the output can exceed SDR white
    pub fn is_hdr(&self) -> bool {
        self.headroom > 1.0
    }
}

impl Default for HdrProperties {
    fn default() -> Self {
        Self::SDR
    }
}

/// Physical orientation of a display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Orientation {
    /// Unknown orientation
    Unknown,
    /// Landscape, right side up
    #[default]
    Landscape,
    /// Landscape, upside down
    LandscapeFlipped,
    /// Portrait, right side up
    Portrait,
    /// Portrait, upside down
    PortraitFlipped,
}

/// What a backend reports about a newly attached display
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayDesc {
    /// Human-readable name; the numeric id is used when empty
    pub name: Option<String>,
    /// Backend-private tag handed back through [`Display::driver_tag`]
    pub driver_tag: u64,
    /// Desktop mode
    pub desktop_mode: DisplayMode,
    /// Content scale
    pub content_scale: f32,
    /// HDR output properties
    pub hdr: HdrProperties,
    /// Orientation of the panel at rest
    pub natural_orientation: Orientation,
    /// Orientation right now
    pub current_orientation: Orientation,
}

impl DisplayDesc {
    /// Describe a display with the given desktop mode
    pub fn new(desktop_mode: DisplayMode) -> Self {
        Self {
            name: None,
            driver_tag: 0,
            desktop_mode,
            content_scale: 1.0,
            hdr: HdrProperties::SDR,
            natural_orientation: Orientation::Landscape,
            current_orientation: Orientation::Landscape,
        }
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the backend tag
    pub fn with_driver_tag(mut self, tag: u64) -> Self {
        self.driver_tag = tag;
        self
    }

    /// Set the content scale
    pub fn with_content_scale(mut self, scale: f32) -> Self {
        self.content_scale = scale;
        self
    }

    /// Set the HDR properties
    pub fn with_hdr(mut self, hdr: HdrProperties) -> Self {
        self.hdr = hdr;
        self
    }
}

/// An attached output
#[derive(Debug, Clone)]
pub struct Display {
    pub(crate) id: DisplayId,
    pub(crate) name: String,
    pub(crate) driver_tag: u64,
    pub(crate) desktop_mode: DisplayMode,
    pub(crate) current_mode: Option<DisplayMode>,
    pub(crate) modes: Vec<DisplayMode>,
    pub(crate) content_scale: f32,
    pub(crate) hdr: HdrProperties,
    pub(crate) natural_orientation: Orientation,
    pub(crate) current_orientation: Orientation,
    pub(crate) fullscreen_window: Option<WindowId>,
}

impl Display {
    /// Display identity
    pub fn id(&self) -> DisplayId {
        self.id
    }

    /// Human-readable name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tag the backend attached when reporting the display
    pub fn driver_tag(&self) -> u64 {
        self.driver_tag
    }

    /// Desktop mode
    pub fn desktop_mode(&self) -> &DisplayMode {
        &self.desktop_mode
    }

    /// Mode the display is currently running; the desktop mode unless a
    /// fullscreen window switched it
    pub fn current_mode(&self) -> &DisplayMode {
        self.current_mode.as_ref().unwrap_or(&self.desktop_mode)
    }

    /// Whether the display runs something other than its desktop mode
    pub fn is_mode_switched(&self) -> bool {
        self.current_mode.is_some()
    }

    /// Fullscreen catalog as loaded so far, best mode first
    pub fn modes(&self) -> &[DisplayMode] {
        &self.modes
    }

    /// Content scale
    pub fn content_scale(&self) -> f32 {
        self.content_scale
    }

    /// HDR output properties
    pub fn hdr(&self) -> HdrProperties {
        self.hdr
    }

    /// Orientation of the panel at rest
    pub fn natural_orientation(&self) -> Orientation {
        self.natural_orientation
    }

    /// Orientation right now
    pub fn current_orientation(&self) -> Orientation {
        self.current_orientation
    }

    /// Window occupying the display in fullscreen, if any
    pub fn fullscreen_window(&self) -> Option<WindowId> {
        self.fullscreen_window
    }
}
