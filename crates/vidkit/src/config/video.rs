//! # Video Configuration
//!
//! File-backed configuration for the video core. Every field maps onto one of
//! the string-keyed [`Hints`](super::Hints); fields left as `None` leave the
//! backend's own behavior in charge.

use super::hints::{self, Hints};
use super::{Config, ConfigError};
use serde::{Deserialize, Serialize};

/// Video core configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Log filter used by the demo binary and `foundation::logging::init_with_level`
    pub log_level: String,
    /// Commit requested window geometry without waiting for backend confirmation
    pub sync_window_operations: bool,
    /// Force per-window mode-switch emulation
    pub mode_switching_emulated: Option<bool>,
    /// The backend sends its own resize/move after fullscreen transitions
    pub backend_reports_fullscreen_dimensions: Option<bool>,
    /// Skip cursor restoration after fullscreen transitions
    pub disable_fullscreen_mouse_warp: bool,
    /// `"x,y,w,h"` usable-bounds override for the primary display
    pub display_usable_bounds: Option<String>,
    /// Minimize exclusive fullscreen windows on focus loss; `None` is automatic
    pub minimize_on_focus_loss: Option<bool>,
    /// Deadline for a true mode switch, in milliseconds
    pub mode_switch_timeout_ms: u64,
}

impl VideoConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            sync_window_operations: false,
            mode_switching_emulated: None,
            backend_reports_fullscreen_dimensions: None,
            disable_fullscreen_mouse_warp: false,
            display_usable_bounds: None,
            minimize_on_focus_loss: None,
            mode_switch_timeout_ms: 5000,
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable synchronous window operations
    pub fn with_sync_window_operations(mut self, enabled: bool) -> Self {
        self.sync_window_operations = enabled;
        self
    }

    /// Force mode-switch emulation on or off
    pub fn with_mode_switching_emulated(mut self, emulated: bool) -> Self {
        self.mode_switching_emulated = Some(emulated);
        self
    }

    /// Set the usable-bounds override
    pub fn with_display_usable_bounds(mut self, bounds: impl Into<String>) -> Self {
        self.display_usable_bounds = Some(bounds.into());
        self
    }

    /// Set the mode-switch deadline
    pub fn with_mode_switch_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.mode_switch_timeout_ms = timeout_ms;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(bounds) = &self.display_usable_bounds {
            bounds
                .parse::<crate::foundation::math::Rect>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "display_usable_bounds".to_string(),
                    value: bounds.clone(),
                })?;
        }

        if self.mode_switch_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "mode_switch_timeout_ms".to_string(),
                value: "0".to_string(),
            });
        }

        Ok(())
    }

    /// Convert into the string-keyed form consumed by the core
    pub fn to_hints(&self) -> Hints {
        fn flag(value: bool) -> &'static str {
            if value { "1" } else { "0" }
        }

        let mut out = Hints::new();
        out.set(hints::SYNC_WINDOW_OPERATIONS, flag(self.sync_window_operations));
        out.set(hints::DISABLE_FULLSCREEN_MOUSE_WARP, flag(self.disable_fullscreen_mouse_warp));
        out.set(hints::MODE_SWITCH_TIMEOUT_MS, self.mode_switch_timeout_ms.to_string());
        if let Some(emulated) = self.mode_switching_emulated {
            out.set(hints::MODE_SWITCHING_EMULATED, flag(emulated));
        }
        if let Some(reports) = self.backend_reports_fullscreen_dimensions {
            out.set(hints::BACKEND_REPORTS_FULLSCREEN_DIMENSIONS, flag(reports));
        }
        if let Some(bounds) = &self.display_usable_bounds {
            out.set(hints::DISPLAY_USABLE_BOUNDS, bounds.clone());
        }
        out.set(
            hints::MINIMIZE_ON_FOCUS_LOSS,
            self.minimize_on_focus_loss.map_or("auto", flag),
        );
        out
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for VideoConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_toml_round_trip_with_partial_file() {
        let parsed: VideoConfig = toml::from_str(
            "sync_window_operations = true\ndisplay_usable_bounds = \"0,24,1920,1056\"\n",
        )
        .unwrap();
        assert!(parsed.sync_window_operations);
        assert_eq!(parsed.mode_switch_timeout_ms, 5000);
        assert_eq!(parsed.log_level, "info");
        parsed.validate().unwrap();
    }

    #[test]
    fn test_ron_parse() {
        let parsed: VideoConfig = ron::from_str("(mode_switching_emulated: Some(true))").unwrap();
        assert_eq!(parsed.mode_switching_emulated, Some(true));
    }

    #[test]
    fn test_file_round_trip() {
        let config = VideoConfig::new()
            .with_log_level("debug")
            .with_mode_switching_emulated(false)
            .with_display_usable_bounds("0,30,1920,1050");
        for extension in ["toml", "ron"] {
            let path = std::env::temp_dir().join(format!("vidkit-config-{}.{}", std::process::id(), extension));
            config.save_to_file(&path).unwrap();
            let loaded = VideoConfig::load_from_file(&path).unwrap();
            std::fs::remove_file(&path).unwrap();
            assert_eq!(loaded, config);
        }

        let result = config.save_to_file(std::env::temp_dir().join("vidkit-config.yaml"));
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_validation_rejects_bad_bounds() {
        let config = VideoConfig::new().with_display_usable_bounds("1,2,3");
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_to_hints() {
        let hints = VideoConfig::new()
            .with_sync_window_operations(true)
            .with_mode_switch_timeout_ms(100)
            .to_hints();
        assert_eq!(hints.get_bool(super::hints::SYNC_WINDOW_OPERATIONS), Some(true));
        assert_eq!(hints.get_bool(super::hints::MODE_SWITCHING_EMULATED), None);
        assert_eq!(hints.mode_switch_timeout(), Duration::from_millis(100));
        assert_eq!(hints.minimize_on_focus_loss(), None);
    }
}
