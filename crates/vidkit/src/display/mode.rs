//! Display modes and the catalog ordering used for mode matching

use crate::foundation::collections::DisplayId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Pixel format of a display mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PixelFormat {
    /// Unknown or unspecified format
    #[default]
    Unknown,
    /// 8-bit palettized
    Index8,
    /// 16-bit packed 5-6-5
    Rgb565,
    /// 24-bit packed RGB
    Rgb888,
    /// 32-bit XRGB, 8 bits per channel
    Xrgb8888,
    /// 32-bit XBGR, 8 bits per channel
    Xbgr8888,
    /// 32-bit ARGB, 8 bits per channel
    Argb8888,
    /// 32-bit ABGR, 8 bits per channel
    Abgr8888,
    /// 32-bit XRGB, 10 bits per color channel
    Xrgb2101010,
    /// 64-bit half-float RGBA
    Rgba64Float,
}

impl PixelFormat {
    /// Color depth in bits per pixel
    pub const fn bits_per_pixel(self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::Index8 => 8,
            Self::Rgb565 => 16,
            Self::Rgb888 => 24,
            Self::Xrgb8888 | Self::Xbgr8888 | Self::Argb8888 | Self::Abgr8888 => 32,
            Self::Xrgb2101010 => 32,
            Self::Rgba64Float => 64,
        }
    }

    /// Packing layout rank; higher ranks carry more color information
    const fn layout_rank(self) -> u8 {
        match self {
            Self::Unknown | Self::Index8 => 0,
            Self::Rgb565 => 1,
            Self::Rgb888 => 2,
            Self::Xrgb8888 | Self::Xbgr8888 | Self::Argb8888 | Self::Abgr8888 => 3,
            Self::Xrgb2101010 => 4,
            Self::Rgba64Float => 5,
        }
    }
}

/// Refresh rate kept as a reduced fraction
///
/// The float value is always derived from the fraction. A zero numerator
/// means "unspecified".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RefreshRate {
    numerator: u32,
    denominator: u32,
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

impl RefreshRate {
    /// Unspecified refresh rate
    pub const UNSPECIFIED: Self = Self { numerator: 0, denominator: 1 };

    /// Create a refresh rate from a fraction, reducing it
    pub fn new(numerator: u32, denominator: u32) -> Self {
        if numerator == 0 || denominator == 0 {
            return Self::UNSPECIFIED;
        }
        let divisor = gcd(numerator, denominator);
        Self {
            numerator: numerator / divisor,
            denominator: denominator / divisor,
        }
    }

    /// Whole-number refresh rate in Hz
    pub fn from_hz(hz: u32) -> Self {
        Self::new(hz, 1)
    }

    /// Numerator of the reduced fraction
    pub fn numerator(&self) -> u32 {
        self.numerator
    }

    /// Denominator of the reduced fraction
    pub fn denominator(&self) -> u32 {
        self.denominator
    }

    /// Whether no refresh rate was given
    pub fn is_unspecified(&self) -> bool {
        self.numerator == 0
    }

    /// Refresh rate in Hz
    #[allow(clippy::cast_precision_loss)]
    pub fn hz(&self) -> f32 {
        if self.is_unspecified() {
            0.0
        } else {
            (f64::from(self.numerator) / f64::from(self.denominator)) as f32
        }
    }
}

impl Default for RefreshRate {
    fn default() -> Self {
        Self::UNSPECIFIED
    }
}

impl Ord for RefreshRate {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = u64::from(self.numerator) * u64::from(other.denominator);
        let rhs = u64::from(other.numerator) * u64::from(self.denominator);
        lhs.cmp(&rhs)
    }
}

impl PartialOrd for RefreshRate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for RefreshRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}Hz", self.hz())
    }
}

/// A concrete output configuration
///
/// Also used as the window's fullscreen request: a request with zero width or
/// height means "the display's desktop mode".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DisplayMode {
    /// Owning display; `None` on requests means "the primary display"
    pub display: Option<DisplayId>,
    /// Width in screen units
    pub w: i32,
    /// Height in screen units
    pub h: i32,
    /// Pixel format
    pub format: PixelFormat,
    /// Pixels per screen unit; values `<= 0` are normalized to 1.0
    pub pixel_density: f32,
    /// Refresh rate
    pub refresh: RefreshRate,
}

impl DisplayMode {
    /// Create a mode with the given size and otherwise unspecified fields
    pub fn new(w: i32, h: i32) -> Self {
        Self {
            w,
            h,
            ..Self::default()
        }
    }

    /// Set the refresh rate in whole Hz
    pub fn with_refresh_hz(mut self, hz: u32) -> Self {
        self.refresh = RefreshRate::from_hz(hz);
        self
    }

    /// Set the refresh rate as a fraction
    pub fn with_refresh(mut self, refresh: RefreshRate) -> Self {
        self.refresh = refresh;
        self
    }

    /// Set the pixel format
    pub fn with_format(mut self, format: PixelFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the pixel density
    pub fn with_pixel_density(mut self, pixel_density: f32) -> Self {
        self.pixel_density = pixel_density;
        self
    }

    /// Set the owning display
    pub fn with_display(mut self, display: DisplayId) -> Self {
        self.display = Some(display);
        self
    }

    /// Normalize fields before the mode is stored or compared
    pub fn finalize(&mut self) {
        if self.pixel_density.is_nan() || self.pixel_density <= 0.0 {
            self.pixel_density = 1.0;
        }
    }

    /// Copy of the mode, normalized
    pub fn finalized(mut self) -> Self {
        self.finalize();
        self
    }

    /// Area in screen units
    pub fn area(&self) -> i64 {
        i64::from(self.w) * i64::from(self.h)
    }

    /// Size in pixels
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn pixel_size(&self) -> (i32, i32) {
        let density = if self.pixel_density > 0.0 { self.pixel_density } else { 1.0 };
        (
            (self.w as f32 * density).round() as i32,
            (self.h as f32 * density).round() as i32,
        )
    }

    /// Whether this is a desktop-mode request rather than a specific mode
    pub fn is_desktop_request(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// Catalog ordering: "better" modes sort first
    ///
    /// Larger area, then higher color depth and layout, then higher refresh
    /// rate, then higher pixel density. Remaining ties fall back to the
    /// individual fields so the order is total over normalized modes.
    pub fn catalog_cmp(&self, other: &Self) -> Ordering {
        other
            .area()
            .cmp(&self.area())
            .then_with(|| other.format.bits_per_pixel().cmp(&self.format.bits_per_pixel()))
            .then_with(|| other.format.layout_rank().cmp(&self.format.layout_rank()))
            .then_with(|| other.refresh.cmp(&self.refresh))
            .then_with(|| other.pixel_density.total_cmp(&self.pixel_density))
            .then_with(|| other.w.cmp(&self.w))
            .then_with(|| other.h.cmp(&self.h))
            .then_with(|| (other.format as u8).cmp(&(self.format as u8)))
    }

    /// Exact-field equality of two normalized modes, ignoring the display
    pub fn same_mode(&self, other: &Self) -> bool {
        self.catalog_cmp(other) == Ordering::Equal
    }

    /// Whether this catalog mode satisfies a request
    ///
    /// Width and height must match. An unspecified format, refresh rate or
    /// pixel density in the request matches anything.
    pub fn satisfies(&self, request: &Self) -> bool {
        self.w == request.w
            && self.h == request.h
            && (request.format == PixelFormat::Unknown || request.format == self.format)
            && (request.refresh.is_unspecified() || request.refresh == self.refresh)
            && (request.pixel_density.is_nan()
                || request.pixel_density <= 0.0
                || request.pixel_density.to_bits() == self.pixel_density.to_bits())
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}@{} ({:?}, x{})", self.w, self.h, self.refresh, self.format, self.pixel_density)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_refresh_rate_is_reduced() {
        let rate = RefreshRate::new(120_000, 2000);
        assert_eq!((rate.numerator(), rate.denominator()), (60, 1));
        assert_eq!(rate, RefreshRate::from_hz(60));

        let ntsc = RefreshRate::new(60000, 1001);
        assert_relative_eq!(ntsc.hz(), 59.94, epsilon = 0.01);
        assert!(ntsc < RefreshRate::from_hz(60));
        assert!(RefreshRate::new(0, 5).is_unspecified());
        assert!(RefreshRate::new(5, 0).is_unspecified());
    }

    #[test]
    fn test_finalize_normalizes_density() {
        let mode = DisplayMode::new(800, 600).with_pixel_density(-2.0).finalized();
        assert_relative_eq!(mode.pixel_density, 1.0);
        let mode = DisplayMode::new(800, 600).finalized();
        assert_relative_eq!(mode.pixel_density, 1.0);
    }

    #[test]
    fn test_larger_area_always_sorts_first() {
        let big_slow = DisplayMode::new(2560, 1440).with_refresh_hz(30).finalized();
        let small_fast = DisplayMode::new(1920, 1080)
            .with_refresh_hz(240)
            .with_pixel_density(2.0)
            .with_format(PixelFormat::Rgba64Float)
            .finalized();
        assert_eq!(big_slow.catalog_cmp(&small_fast), Ordering::Less);
        assert_eq!(small_fast.catalog_cmp(&big_slow), Ordering::Greater);
    }

    #[test]
    fn test_tie_breaks_in_priority_order() {
        let base = DisplayMode::new(1920, 1080)
            .with_format(PixelFormat::Xrgb8888)
            .with_refresh_hz(60)
            .finalized();
        let deeper = base.with_format(PixelFormat::Rgba64Float);
        let faster = base.with_refresh_hz(144);
        let denser = base.with_pixel_density(2.0);

        assert_eq!(deeper.catalog_cmp(&faster), Ordering::Less);
        assert_eq!(faster.catalog_cmp(&denser), Ordering::Less);
        assert_eq!(denser.catalog_cmp(&base), Ordering::Less);
        let display = crate::foundation::collections::IdAllocator::new().next_display();
        assert!(base.same_mode(&base.with_display(display)));
    }

    #[test]
    fn test_request_wildcards() {
        let mode = DisplayMode::new(1920, 1080)
            .with_format(PixelFormat::Xrgb8888)
            .with_refresh_hz(120)
            .finalized();
        assert!(mode.satisfies(&DisplayMode::new(1920, 1080)));
        assert!(mode.satisfies(&DisplayMode::new(1920, 1080).with_refresh_hz(120)));
        assert!(!mode.satisfies(&DisplayMode::new(1920, 1080).with_refresh_hz(60)));
        assert!(!mode.satisfies(&DisplayMode::new(1920, 1200)));
    }
}
