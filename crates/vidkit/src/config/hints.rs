//! String-keyed runtime options consumed by the video core

use crate::foundation::math::Rect;
use std::collections::HashMap;
use std::time::Duration;

/// Commit requested window geometry immediately instead of waiting for the
/// backend to confirm it
pub const SYNC_WINDOW_OPERATIONS: &str = "video.sync_window_operations";
/// Treat fullscreen mode switches as emulated per-window
pub const MODE_SWITCHING_EMULATED: &str = "video.mode_switching_emulated";
/// The backend sends its own resize/move after fullscreen transitions
pub const BACKEND_REPORTS_FULLSCREEN_DIMENSIONS: &str = "video.backend_reports_fullscreen_dimensions";
/// Do not restore the cursor position after fullscreen transitions
pub const DISABLE_FULLSCREEN_MOUSE_WARP: &str = "video.disable_fullscreen_mouse_warp";
/// `"x,y,w,h"` override for the primary display's usable bounds
pub const DISPLAY_USABLE_BOUNDS: &str = "video.display_usable_bounds";
/// `auto`, `1` or `0`
pub const MINIMIZE_ON_FOCUS_LOSS: &str = "video.minimize_on_focus_loss";
/// Milliseconds a true mode switch may take before it is reverted
pub const MODE_SWITCH_TIMEOUT_MS: &str = "video.mode_switch_timeout_ms";

/// Default deadline for a true fullscreen mode switch
pub const DEFAULT_MODE_SWITCH_TIMEOUT: Duration = Duration::from_millis(5000);

/// String-keyed option store
///
/// Values are kept as strings; accessors interpret them on read so that a
/// malformed value behaves like an unset one.
#[derive(Debug, Clone, Default)]
pub struct Hints {
    values: HashMap<String, String>,
}

impl Hints {
    /// Create an empty option store
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        log::debug!("Hint {} = {}", key, value);
        self.values.insert(key, value);
    }

    /// Remove an option, returning its previous value
    pub fn reset(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    /// Raw string value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Boolean value; `None` when unset or not a recognised boolean
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)?.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        }
    }

    /// Boolean value with a default
    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }

    /// Unsigned integer value
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key)?.trim().parse().ok()
    }

    /// Usable-bounds override for the primary display
    pub fn usable_bounds_override(&self) -> Option<Rect> {
        let raw = self.get(DISPLAY_USABLE_BOUNDS)?;
        match raw.parse() {
            Ok(rect) => Some(rect),
            Err(e) => {
                log::warn!("Ignoring {}: {}", DISPLAY_USABLE_BOUNDS, e);
                None
            }
        }
    }

    /// Deadline applied to true fullscreen mode switches
    pub fn mode_switch_timeout(&self) -> Duration {
        self.get_u64(MODE_SWITCH_TIMEOUT_MS)
            .map_or(DEFAULT_MODE_SWITCH_TIMEOUT, Duration::from_millis)
    }

    /// Explicit minimize-on-focus-loss choice; `None` means automatic
    pub fn minimize_on_focus_loss(&self) -> Option<bool> {
        match self.get(MINIMIZE_ON_FOCUS_LOSS) {
            None => None,
            Some(value) if value.trim().is_empty() || value.eq_ignore_ascii_case("auto") => None,
            Some(_) => self.get_bool(MINIMIZE_ON_FOCUS_LOSS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolean_parsing() {
        let mut hints = Hints::new();
        hints.set(SYNC_WINDOW_OPERATIONS, "1");
        hints.set(MODE_SWITCHING_EMULATED, "False");
        hints.set(DISABLE_FULLSCREEN_MOUSE_WARP, "maybe");

        assert_eq!(hints.get_bool(SYNC_WINDOW_OPERATIONS), Some(true));
        assert_eq!(hints.get_bool(MODE_SWITCHING_EMULATED), Some(false));
        assert_eq!(hints.get_bool(DISABLE_FULLSCREEN_MOUSE_WARP), None);
        assert!(hints.get_bool_or(DISABLE_FULLSCREEN_MOUSE_WARP, true));
    }

    #[test]
    fn test_usable_bounds_override() {
        let mut hints = Hints::new();
        assert_eq!(hints.usable_bounds_override(), None);

        hints.set(DISPLAY_USABLE_BOUNDS, "0,32,1920,1048");
        assert_eq!(hints.usable_bounds_override(), Some(Rect::new(0, 32, 1920, 1048)));

        hints.set(DISPLAY_USABLE_BOUNDS, "garbage");
        assert_eq!(hints.usable_bounds_override(), None);
    }

    #[test]
    fn test_minimize_on_focus_loss_auto() {
        let mut hints = Hints::new();
        assert_eq!(hints.minimize_on_focus_loss(), None);
        hints.set(MINIMIZE_ON_FOCUS_LOSS, "auto");
        assert_eq!(hints.minimize_on_focus_loss(), None);
        hints.set(MINIMIZE_ON_FOCUS_LOSS, "0");
        assert_eq!(hints.minimize_on_focus_loss(), Some(false));
    }

    #[test]
    fn test_timeout_default_and_override() {
        let mut hints = Hints::new();
        assert_eq!(hints.mode_switch_timeout(), DEFAULT_MODE_SWITCH_TIMEOUT);
        hints.set(MODE_SWITCH_TIMEOUT_MS, "250");
        assert_eq!(hints.mode_switch_timeout(), Duration::from_millis(250));
    }
}
