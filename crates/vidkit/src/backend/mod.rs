//! Video backend implementations
//!
//! Platform-independent abstraction over native windowing systems. The core
//! holds exactly one active backend and calls into it synchronously.
//!
//! Optional operations have default implementations that report
//! [`VideoError::Unsupported`], so a backend only implements what its
//! platform can do. Notifications a backend produces, whether from its own
//! event loop or synchronously inside one of these calls, are queued and
//! handed to the core through [`VideoBackend::poll_event`].

pub mod headless;

pub use headless::{BackendCall, HeadlessBackend, HeadlessDisplay, HeadlessHandle};

use crate::display::{Display, DisplayDesc, DisplayMode};
use crate::error::{VideoError, VideoResult};
use crate::events::PlatformEvent;
use crate::foundation::collections::DisplayId;
use crate::foundation::math::Rect;
use crate::window::Window;
use bitflags::bitflags;

bitflags! {
    /// Capabilities and quirks a backend declares
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BackendCapabilities: u32 {
        /// Tooltip and popup-menu windows
        const POPUP_WINDOWS = 1 << 0;
        /// OpenGL-capable windows
        const OPENGL = 1 << 1;
        /// Vulkan-capable windows
        const VULKAN = 1 << 2;
        /// Metal-capable windows
        const METAL = 1 << 3;
        /// Fullscreen modes are emulated per window; displays never switch
        const MODE_SWITCHING_EMULATED = 1 << 4;
        /// Minimizing keeps the window's fullscreen occupancy
        const DISABLE_UNSET_FULLSCREEN_ON_MINIMIZE = 1 << 5;
        /// The backend reports its own size and position after fullscreen
        /// transitions
        const REPORTS_FULLSCREEN_DIMENSIONS = 1 << 6;
        /// Do not warp the pointer after fullscreen transitions
        const NO_FULLSCREEN_MOUSE_WARP = 1 << 7;
        /// Desktop fullscreen goes through the compositor's own fullscreen
        /// space
        const COMPOSITOR_FULLSCREEN = 1 << 8;
        /// The backend reports per-window HDR properties itself
        const WINDOW_HDR_REPORTING = 1 << 9;
        /// Typed clipboard data; otherwise only the text calls are used
        const CLIPBOARD_DATA = 1 << 10;
    }
}

/// Fullscreen transition requested from the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FullscreenOp {
    /// Occupy the display at its desktop mode
    EnterDesktop,
    /// Occupy the display after a mode switch
    EnterExclusive,
    /// Occupy the compositor's fullscreen space
    EnterCompositor,
    /// Return to windowed presentation
    Leave,
}

impl FullscreenOp {
    /// Whether the operation enters fullscreen
    pub fn is_enter(self) -> bool {
        !matches!(self, Self::Leave)
    }
}

/// Outcome of a fullscreen transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FullscreenResult {
    /// The window is in the requested state on return
    Succeeded,
    /// The transition was rejected
    Failed,
    /// The backend will report the outcome with a window event later
    Pending,
    /// The backend has no fullscreen support; the core emulates it
    Unsupported,
}

/// Video backend trait for platform abstraction
///
/// Not `Send`: the whole video core runs on the thread that owns it.
#[allow(unused_variables)]
pub trait VideoBackend {
    /// Backend name
    fn name(&self) -> &str;

    /// Capabilities and quirks
    fn capabilities(&self) -> BackendCapabilities;

    /// Start the backend and enumerate attached displays
    fn init(&mut self) -> VideoResult<Vec<DisplayDesc>>;

    /// Stop the backend
    fn shutdown(&mut self) {}

    /// The core registered a display under `id`
    fn display_added(&mut self, id: DisplayId, display: &Display) {}

    /// The core dropped a display
    fn display_removed(&mut self, id: DisplayId) {}

    /// Fullscreen modes a display supports
    fn display_modes(&mut self, display: &Display) -> Vec<DisplayMode> {
        Vec::new()
    }

    /// Desktop-coordinate bounds of a display
    fn display_bounds(&mut self, display: &Display) -> Option<Rect> {
        None
    }

    /// Bounds minus reserved OS chrome
    fn display_usable_bounds(&mut self, display: &Display) -> Option<Rect> {
        None
    }

    /// Switch a display's output mode
    fn set_display_mode(&mut self, display: &Display, mode: &DisplayMode) -> VideoResult<()> {
        Err(VideoError::Unsupported("display mode switching"))
    }

    /// Create the native window
    fn create_window(&mut self, window: &Window) -> VideoResult<()> {
        Ok(())
    }

    /// Destroy the native window
    fn destroy_window(&mut self, window: &Window) {}

    /// Apply the window title
    fn set_window_title(&mut self, window: &Window) -> VideoResult<()> {
        Err(VideoError::Unsupported("window titles"))
    }

    /// Move the window to its pending position
    fn set_window_position(&mut self, window: &Window) -> VideoResult<()> {
        Err(VideoError::Unsupported("window positioning"))
    }

    /// Resize the window to its pending size
    fn set_window_size(&mut self, window: &Window) -> VideoResult<()> {
        Err(VideoError::Unsupported("window resizing"))
    }

    /// Apply the minimum size
    fn set_window_minimum_size(&mut self, window: &Window) -> VideoResult<()> {
        Err(VideoError::Unsupported("minimum window size"))
    }

    /// Apply the maximum size
    fn set_window_maximum_size(&mut self, window: &Window) -> VideoResult<()> {
        Err(VideoError::Unsupported("maximum window size"))
    }

    /// Apply the aspect-ratio constraints
    fn set_window_aspect_ratio(&mut self, window: &Window) -> VideoResult<()> {
        Err(VideoError::Unsupported("window aspect ratio"))
    }

    /// Apply the decoration flag
    fn set_window_bordered(&mut self, window: &Window, bordered: bool) -> VideoResult<()> {
        Err(VideoError::Unsupported("window borders"))
    }

    /// Apply the resizable flag
    fn set_window_resizable(&mut self, window: &Window, resizable: bool) -> VideoResult<()> {
        Err(VideoError::Unsupported("resizable windows"))
    }

    /// Apply the always-on-top flag
    fn set_window_always_on_top(&mut self, window: &Window, on_top: bool) -> VideoResult<()> {
        Err(VideoError::Unsupported("always-on-top windows"))
    }

    /// Apply the focusable flag
    fn set_window_focusable(&mut self, window: &Window, focusable: bool) -> VideoResult<()> {
        Err(VideoError::Unsupported("focusable toggling"))
    }

    /// Confine or release the pointer
    fn set_window_mouse_grab(&mut self, window: &Window, grabbed: bool) -> VideoResult<()> {
        Ok(())
    }

    /// Grab or release the keyboard
    fn set_window_keyboard_grab(&mut self, window: &Window, grabbed: bool) -> VideoResult<()> {
        Ok(())
    }

    /// Make the window visible
    fn show_window(&mut self, window: &Window) -> VideoResult<()> {
        Err(VideoError::Unsupported("showing windows"))
    }

    /// Hide the window
    fn hide_window(&mut self, window: &Window) -> VideoResult<()> {
        Err(VideoError::Unsupported("hiding windows"))
    }

    /// Raise the window above its siblings
    fn raise_window(&mut self, window: &Window) -> VideoResult<()> {
        Err(VideoError::Unsupported("raising windows"))
    }

    /// Minimize the window
    fn minimize_window(&mut self, window: &Window) -> VideoResult<()> {
        Err(VideoError::Unsupported("minimizing windows"))
    }

    /// Maximize the window
    fn maximize_window(&mut self, window: &Window) -> VideoResult<()> {
        Err(VideoError::Unsupported("maximizing windows"))
    }

    /// Restore the window from minimized or maximized state
    fn restore_window(&mut self, window: &Window) -> VideoResult<()> {
        Err(VideoError::Unsupported("restoring windows"))
    }

    /// Request the user's attention
    fn flash_window(&mut self, window: &Window) -> VideoResult<()> {
        Err(VideoError::Unsupported("flashing windows"))
    }

    /// Move the window into or out of fullscreen on `display`
    fn set_window_fullscreen(&mut self, window: &Window, display: &Display, op: FullscreenOp) -> FullscreenResult {
        FullscreenResult::Unsupported
    }

    /// Move the pointer to window-relative coordinates
    fn warp_mouse(&mut self, window: &Window, x: f32, y: f32) {}

    /// Announce a local clipboard provision offering `mime_types`
    fn set_clipboard_data(&mut self, mime_types: &[String]) -> VideoResult<()> {
        Err(VideoError::Unsupported("clipboard data"))
    }

    /// Data another application offers for a content type
    fn clipboard_data(&mut self, mime_type: &str) -> Option<Vec<u8>> {
        None
    }

    /// Whether another application offers a content type
    fn has_clipboard_data(&mut self, mime_type: &str) -> bool {
        false
    }

    /// Place text on the clipboard
    fn set_clipboard_text(&mut self, text: &str) -> VideoResult<()> {
        Err(VideoError::Unsupported("clipboard text"))
    }

    /// Text on the clipboard
    fn clipboard_text(&mut self) -> Option<String> {
        None
    }

    /// Whether the clipboard holds text
    fn has_clipboard_text(&mut self) -> Option<bool> {
        None
    }

    /// Place text in the primary selection
    fn set_primary_selection_text(&mut self, text: &str) -> VideoResult<()> {
        Err(VideoError::Unsupported("primary selection"))
    }

    /// Text in the primary selection
    fn primary_selection_text(&mut self) -> Option<String> {
        None
    }

    /// Whether the primary selection holds text
    fn has_primary_selection_text(&mut self) -> Option<bool> {
        None
    }

    /// Take the next queued notification
    fn poll_event(&mut self) -> Option<PlatformEvent> {
        None
    }
}

/// Available backend kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// In-memory backend with a single 1920x1080 display
    #[default]
    Headless,
}

/// Create a backend of the given kind
pub fn create_backend(kind: BackendKind) -> Box<dyn VideoBackend> {
    match kind {
        BackendKind::Headless => Box::new(HeadlessBackend::new()),
    }
}
