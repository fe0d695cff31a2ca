use super::*;
use crate::config::hints;
use crate::display::{HdrProperties, Orientation, MIN_CONTENT_SCALE};
use crate::error::VideoError;
use crate::events::PlatformEvent;
use crate::foundation::math::Point;
use crate::window::WindowFlags;
use approx::assert_relative_eq;

#[test]
fn test_backend_without_displays_fails() {
    let result = VideoSubsystem::init(Box::new(HeadlessBackend::empty()), Hints::new());
    assert!(matches!(result, Err(VideoError::NoDisplays)));
}

#[test]
fn test_displays_are_registered_in_order() {
    let (video, _handle) = start(two_displays());
    let (d1, d2) = display_ids(&video);

    assert_eq!(video.primary_display().unwrap(), d1);
    assert_eq!(video.display_name(d1).unwrap(), "D1");
    assert_eq!(video.display_name(d2).unwrap(), "D2");
    assert_eq!(video.desktop_display_mode(d2).unwrap().w, 2560);
    assert_eq!(video.desktop_display_mode(d2).unwrap().display, Some(d2));
    assert_eq!(video.desktop_area(), Rect::new(0, 0, 4480, 1440));
}

#[test]
fn test_catalog_is_loaded_lazily_and_sorted() {
    let (mut video, _handle) = start(two_displays());
    let (_d1, d2) = display_ids(&video);
    assert!(video.display(d2).unwrap().modes().is_empty());

    let modes = video.fullscreen_display_modes(d2).unwrap();
    assert_eq!(modes.len(), 2);
    assert_eq!((modes[0].w, modes[0].h), (2560, 1440));
    assert_eq!((modes[1].w, modes[1].h), (1920, 1080));
    assert!(modes.iter().all(|mode| mode.display == Some(d2)));

    video.reset_fullscreen_display_modes(d2).unwrap();
    assert!(video.display(d2).unwrap().modes().is_empty());
    assert_eq!(video.fullscreen_display_modes(d2).unwrap().len(), 2);
}

#[test]
fn test_empty_catalog_falls_back_to_desktop_mode() {
    let backend = HeadlessBackend::empty().with_display(HeadlessDisplay::new(DisplayMode::new(1024, 768)));
    let (mut video, _handle) = start(backend);
    let display = video.primary_display().unwrap();

    let modes = video.fullscreen_display_modes(display).unwrap();
    assert_eq!(modes.len(), 1);
    assert_eq!((modes[0].w, modes[0].h), (1024, 768));
}

#[test]
fn test_closest_mode_picks_smallest_fit() {
    let (mut video, _handle) = start(two_displays());
    let (_d1, d2) = display_ids(&video);

    let mode = video.closest_fullscreen_display_mode(d2, 1600, 900, 0.0, false).unwrap();
    assert_eq!((mode.w, mode.h), (1920, 1080));

    let mode = video.closest_fullscreen_display_mode(d2, 2000, 1200, 0.0, false).unwrap();
    assert_eq!((mode.w, mode.h), (2560, 1440));

    let result = video.closest_fullscreen_display_mode(d2, 4000, 3000, 0.0, false);
    assert!(matches!(result, Err(VideoError::InvalidParam { .. })));
}

#[test]
fn test_bounds_and_point_lookup() {
    let (mut video, _handle) = start(two_displays());
    let (d1, d2) = display_ids(&video);

    assert_eq!(video.display_bounds(d2).unwrap(), Rect::new(1920, 0, 2560, 1440));
    assert_eq!(video.display_for_point(Point::new(100, 100)).unwrap(), d1);
    assert_eq!(video.display_for_point(Point::new(3000, 100)).unwrap(), d2);
    // Outside every display: the nearest one wins
    assert_eq!(video.display_for_point(Point::new(-500, 50)).unwrap(), d1);
    assert_eq!(video.display_for_rect(Rect::new(1800, 0, 400, 100)).unwrap(), d2);
}

#[test]
fn test_fallback_bounds_without_backend_layout() {
    let backend = HeadlessBackend::empty()
        .with_display(HeadlessDisplay::new(DisplayMode::new(1280, 1024)))
        .with_display(HeadlessDisplay::new(DisplayMode::new(1920, 1080)));
    let (mut video, _handle) = start(backend);
    let (d1, d2) = display_ids(&video);

    assert_eq!(video.display_bounds(d1).unwrap(), Rect::new(0, 0, 1280, 1024));
    assert_eq!(video.display_bounds(d2).unwrap(), Rect::new(1280, 0, 1920, 1080));
}

#[test]
fn test_usable_bounds_hint_overrides_primary() {
    let mut hints = Hints::new();
    hints.set(hints::DISPLAY_USABLE_BOUNDS, "0,30,1920,1050");
    let (mut video, _handle) = start_with_hints(two_displays(), hints);
    let (d1, d2) = display_ids(&video);

    assert_eq!(video.display_usable_bounds(d1).unwrap(), Rect::new(0, 30, 1920, 1050));
    assert_eq!(video.display_usable_bounds(d2).unwrap(), Rect::new(1920, 0, 2560, 1440));
}

#[test]
fn test_unknown_display_is_an_error() {
    let (mut video, handle) = start(two_displays());
    let (d1, d2) = display_ids(&video);
    handle.detach_display(d2);
    video.pump_events();

    assert_eq!(video.display(d2).err(), Some(VideoError::InvalidDisplay(d2)));
    assert!(video.last_error().is_some());
    assert_eq!(video.displays(), vec![d1]);
}

#[test]
fn test_hot_plug_assigns_fresh_id() {
    let (mut video, handle) = start(HeadlessBackend::new());
    let first = video.primary_display().unwrap();

    handle.attach_display(HeadlessDisplay::new(DisplayMode::new(1280, 720)).with_name("Projector"));
    video.pump_events();

    let ids = video.displays();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[1], first);
    assert_eq!(video.display_name(ids[1]).unwrap(), "Projector");
    assert_eq!(video.desktop_area(), Rect::new(0, 0, 3200, 1080));

    let events = drain(&mut video);
    assert_eq!(count(&events, EventType::DisplayAdded), 1);
    assert_eq!(events[0].get_display(), Some(ids[1]));
}

#[test]
fn test_unplug_moves_windows_to_remaining_display() {
    let (mut video, handle) = start(two_displays());
    let (d1, d2) = display_ids(&video);
    let window = window_on(&mut video, Some(d2), "stranded");
    assert_eq!(video.window(window).unwrap().last_display(), Some(d2));
    drain(&mut video);

    handle.detach_display(d2);
    video.pump_events();

    assert_eq!(video.window(window).unwrap().last_display(), Some(d1));
    let events = drain(&mut video);
    let changed = events
        .iter()
        .find(|event| event.event_type == EventType::WindowDisplayChanged)
        .unwrap();
    assert_eq!(changed.get_display(), Some(d1));
    assert_eq!(changed.get_window(), Some(window));
}

#[test]
fn test_moving_window_across_displays() {
    let (mut video, _handle) = start(two_displays());
    let (d1, d2) = display_ids(&video);
    let window = window_on(&mut video, Some(d1), "traveller");
    drain(&mut video);

    video.set_window_position(window, WindowPosition::Centered(Some(d2)), WindowPosition::Centered(Some(d2))).unwrap();

    assert_eq!(video.display_for_window(window).unwrap(), d2);
    assert_eq!(video.window(window).unwrap().rect(), Rect::new(2800, 420, 800, 600));
    assert_eq!(count(&drain(&mut video), EventType::WindowDisplayChanged), 1);
}

#[test]
fn test_exclusive_window_follows_display_change() {
    let (mut video, _handle) = start(two_displays());
    let (d1, d2) = display_ids(&video);
    let window = window_on(&mut video, Some(d1), "game");
    video
        .set_window_fullscreen_mode(window, Some(DisplayMode::new(1920, 1080).with_display(d1)))
        .unwrap();
    video.set_window_fullscreen(window, true).unwrap();
    assert_eq!(video.display(d1).unwrap().fullscreen_window(), Some(window));

    video.dispatch(PlatformEvent::Window(window, crate::events::WindowEvent::DisplayChanged(d2)));

    assert_eq!(video.display(d2).unwrap().fullscreen_window(), Some(window));
    assert_eq!(video.display(d1).unwrap().fullscreen_window(), None);
    let mode = video.window_fullscreen_mode(window).unwrap().unwrap();
    assert_eq!((mode.w, mode.h, mode.display), (1920, 1080, Some(d2)));
    assert_eq!(video.current_display_mode(d2).unwrap().refresh.numerator(), 120);
}

#[test]
fn test_content_scale_is_clamped_and_propagated() {
    let (mut video, _handle) = start(HeadlessBackend::new());
    let display = video.primary_display().unwrap();
    let window = window_on(&mut video, None, "scaled");
    drain(&mut video);

    video.dispatch(PlatformEvent::DisplayContentScaleChanged(display, 2.0));
    assert_relative_eq!(video.display_content_scale(display).unwrap(), 2.0);
    assert_relative_eq!(video.window_display_scale(window).unwrap(), 2.0);

    video.dispatch(PlatformEvent::DisplayContentScaleChanged(display, 0.0));
    assert_relative_eq!(video.display_content_scale(display).unwrap(), MIN_CONTENT_SCALE);

    let events = drain(&mut video);
    assert_eq!(count(&events, EventType::DisplayContentScaleChanged), 2);
    assert_eq!(count(&events, EventType::WindowDisplayScaleChanged), 2);
}

#[test]
fn test_hdr_change_reaches_windows() {
    let (mut video, _handle) = start(HeadlessBackend::new());
    let display = video.primary_display().unwrap();
    let window = window_on(&mut video, None, "hdr");
    let hdr = HdrProperties { headroom: 4.0, sdr_white_level: 2.0 };

    video.dispatch(PlatformEvent::DisplayHdrChanged(display, hdr));
    assert!(video.window_hdr(window).unwrap().is_hdr());

    // Repeating the same properties is silent
    drain(&mut video);
    video.dispatch(PlatformEvent::DisplayHdrChanged(display, hdr));
    assert!(drain(&mut video).is_empty());
}

#[test]
fn test_orientation_and_desktop_mode_changes() {
    let (mut video, _handle) = start(HeadlessBackend::new());
    let display = video.primary_display().unwrap();
    drain(&mut video);

    video.dispatch(PlatformEvent::DisplayOrientationChanged(display, Orientation::Portrait));
    video.dispatch(PlatformEvent::DisplayDesktopModeChanged(display, DisplayMode::new(2560, 1440).with_refresh_hz(60)));

    assert_eq!(video.display_orientation(display).unwrap().1, Orientation::Portrait);
    assert_eq!(video.desktop_display_mode(display).unwrap().w, 2560);
    let events = drain(&mut video);
    assert_eq!(count(&events, EventType::DisplayOrientationChanged), 1);
    assert_eq!(count(&events, EventType::DisplayDesktopModeChanged), 1);
}

#[test]
fn test_high_density_window_pixel_size() {
    let desktop = DisplayMode::new(1440, 900).with_pixel_density(2.0);
    let backend = HeadlessBackend::empty().with_display(HeadlessDisplay::new(desktop).with_modes(vec![desktop]));
    let (mut video, _handle) = start(backend);
    let window = video
        .create_window(WindowDesc::new("retina", 400, 300).with_flags(WindowFlags::HIGH_PIXEL_DENSITY))
        .unwrap();
    let plain = window_on(&mut video, None, "plain");

    assert_eq!(video.window_size_in_pixels(window).unwrap(), (800, 600));
    assert_relative_eq!(video.window_pixel_density(window).unwrap(), 2.0);
    assert_eq!(video.window_size_in_pixels(plain).unwrap(), (800, 600));
    assert_relative_eq!(video.window_pixel_density(plain).unwrap(), 1.0);
}
