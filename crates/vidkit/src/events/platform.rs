//! Notifications injected by the backend

use crate::display::{DisplayDesc, DisplayMode, HdrProperties, Orientation};
use crate::foundation::collections::{DisplayId, WindowId};

/// Who owns the system clipboard after an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardOwner {
    /// This process
    Local,
    /// Another application
    External,
}

/// Window state change reported by the backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowEvent {
    /// Window became visible
    Shown,
    /// Window was hidden
    Hidden,
    /// Window moved to a new position
    Moved {
        /// New x
        x: i32,
        /// New y
        y: i32,
    },
    /// Window resized
    Resized {
        /// New width
        w: i32,
        /// New height
        h: i32,
    },
    /// Backing buffer size changed
    PixelSizeChanged,
    /// Window minimized
    Minimized,
    /// Window maximized
    Maximized,
    /// Window restored
    Restored,
    /// Backend finished entering fullscreen
    EnterFullscreen,
    /// Backend left fullscreen
    LeaveFullscreen,
    /// Window now lies on another display
    DisplayChanged(DisplayId),
    /// Keyboard focus gained
    FocusGained,
    /// Keyboard focus lost
    FocusLost,
    /// The platform destroyed the window
    Destroyed,
}

/// A backend-to-core notification
///
/// Applied through `VideoSubsystem::dispatch`; events naming windows or
/// displays that no longer exist are dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformEvent {
    /// A monitor was attached
    DisplayAdded(DisplayDesc),
    /// A monitor was detached
    DisplayRemoved(DisplayId),
    /// A monitor's bounds changed
    DisplayMoved(DisplayId),
    /// A monitor's desktop mode changed
    DisplayDesktopModeChanged(DisplayId, DisplayMode),
    /// A monitor's content scale changed
    DisplayContentScaleChanged(DisplayId, f32),
    /// A monitor's HDR properties changed
    DisplayHdrChanged(DisplayId, HdrProperties),
    /// A monitor was rotated
    DisplayOrientationChanged(DisplayId, Orientation),
    /// Window state change
    Window(WindowId, WindowEvent),
    /// Pointer moved; coordinates are relative to the focused window
    MouseMoved {
        /// Window under the pointer
        window: Option<WindowId>,
        /// Pointer x
        x: f32,
        /// Pointer y
        y: f32,
    },
    /// Clipboard contents changed
    ClipboardUpdated {
        /// New owner
        owner: ClipboardOwner,
        /// Content types now offered
        mime_types: Vec<String>,
    },
    /// The platform gave up a clipboard provision made under `sequence`
    ClipboardCancelled {
        /// Sequence number captured when the provision was made
        sequence: u32,
    },
}
