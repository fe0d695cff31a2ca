use super::*;
use crate::backend::{BackendCall, FullscreenResult};
use crate::clipboard::ClipboardProducer;
use crate::events::PlatformEvent;
use crate::window::{FullscreenState, WindowFlags};
use std::time::{Duration, Instant};

#[test]
fn test_exclusive_request_without_refresh_picks_matching_size() {
    let (mut video, _handle) = start(two_displays());
    let (_d1, d2) = display_ids(&video);
    let window = window_on(&mut video, Some(d2), "game");

    video
        .set_window_fullscreen_mode(window, Some(DisplayMode::new(1920, 1080).with_display(d2)))
        .unwrap();
    video.set_window_fullscreen(window, true).unwrap();

    let mode = video.window_fullscreen_mode(window).unwrap().unwrap();
    assert_eq!((mode.w, mode.h), (1920, 1080));
    assert_eq!(mode.refresh.numerator(), 120);
    assert_eq!(mode.display, Some(d2));
    assert_eq!(video.current_display_mode(d2).unwrap().w, 1920);
    assert_eq!(video.window(window).unwrap().fullscreen_state(), FullscreenState::Exclusive);
}

#[test]
fn test_show_applies_pending_maximize() {
    let (mut video, handle) = start(HeadlessBackend::new());
    let window = video
        .create_window(WindowDesc::new("later", 640, 480).with_flags(WindowFlags::HIDDEN))
        .unwrap();
    video.maximize_window(window).unwrap();
    assert!(!video.window_flags(window).unwrap().contains(WindowFlags::MAXIMIZED));
    assert!(!handle.calls().contains(&BackendCall::MaximizeWindow(window)));

    video.show_window(window).unwrap();

    let flags = video.window_flags(window).unwrap();
    assert!(flags.contains(WindowFlags::MAXIMIZED));
    assert!(!flags.contains(WindowFlags::HIDDEN));
    assert_eq!(video.window(window).unwrap().pending_flags(), None);
    let calls = handle.calls();
    let shown = calls.iter().position(|call| *call == BackendCall::ShowWindow(window)).unwrap();
    let maximized = calls.iter().position(|call| *call == BackendCall::MaximizeWindow(window)).unwrap();
    assert!(shown < maximized);
}

#[test]
fn test_stale_clipboard_callbacks_are_discarded() {
    let (mut video, _handle) = start(HeadlessBackend::new());
    video.set_clipboard_text("first").unwrap();
    assert_eq!(video.clipboard_sequence(), 1);
    let stale = video.clipboard_sequence();

    let producer: ClipboardProducer = Box::new(|_: &str| Some(b"second".to_vec()));
    video.set_clipboard_data(Some(producer), None, &["text/plain"]).unwrap();
    assert_eq!(video.clipboard_sequence(), 2);

    assert!(video.serve_clipboard_request(stale, "text/plain").is_none());
    video.dispatch(PlatformEvent::ClipboardCancelled { sequence: stale });

    assert!(video.has_clipboard_data("text/plain"));
    assert_eq!(video.clipboard_text(), "second");
    assert_eq!(
        video.serve_clipboard_request(2, "text/plain").unwrap().as_bytes(),
        b"second"
    );
}

#[test]
fn test_entering_occupied_display_minimizes_occupant() {
    let (mut video, _handle) = start(HeadlessBackend::new());
    let display = video.primary_display().unwrap();
    let first = window_on(&mut video, None, "V");
    let second = window_on(&mut video, None, "W");

    video.set_window_fullscreen(first, true).unwrap();
    assert_eq!(video.display(display).unwrap().fullscreen_window(), Some(first));

    video.set_window_fullscreen(second, true).unwrap();

    assert!(video.window_flags(first).unwrap().contains(WindowFlags::MINIMIZED));
    assert_eq!(video.window(first).unwrap().fullscreen_state(), FullscreenState::Windowed);
    assert_eq!(video.display(display).unwrap().fullscreen_window(), Some(second));
    assert_eq!(video.window(second).unwrap().fullscreen_state(), FullscreenState::Desktop);
}

#[test]
fn test_destroying_parent_destroys_popups_first() {
    let (mut video, handle) = start(HeadlessBackend::new());
    let parent = window_on(&mut video, None, "parent");
    let menu = video
        .create_window(
            WindowDesc::new("menu", 120, 200)
                .with_flags(WindowFlags::POPUP_MENU)
                .with_parent(parent),
        )
        .unwrap();
    let tooltip = video
        .create_window(WindowDesc::new("tip", 100, 24).with_flags(WindowFlags::TOOLTIP).with_parent(parent))
        .unwrap();
    drain(&mut video);

    video.destroy_window(parent).unwrap();

    let destroyed: Vec<WindowId> = drain(&mut video)
        .iter()
        .filter(|event| event.event_type == EventType::WindowDestroyed)
        .filter_map(Event::get_window)
        .collect();
    assert_eq!(destroyed.len(), 3);
    assert_eq!(destroyed[2], parent);
    assert!(destroyed[..2].contains(&menu));
    assert!(destroyed[..2].contains(&tooltip));

    let order: Vec<WindowId> = handle
        .calls()
        .iter()
        .filter_map(|call| match call {
            BackendCall::DestroyWindow(id) => Some(*id),
            _ => None,
        })
        .collect();
    assert_eq!(order.last(), Some(&parent));
    assert!(video.windows().is_empty());
    assert!(video.window(menu).is_err());
}

#[test]
fn test_mode_switch_timeout_reverts_to_windowed() {
    let (mut video, handle) = start(HeadlessBackend::new());
    let display = video.primary_display().unwrap();
    let window = window_on(&mut video, None, "slow");
    video.set_window_fullscreen_mode(window, Some(DisplayMode::new(1280, 720))).unwrap();

    handle.script_fullscreen(FullscreenResult::Pending);
    video.set_window_fullscreen(window, true).unwrap();
    assert_eq!(video.window(window).unwrap().fullscreen_state(), FullscreenState::Entering);
    assert!(video.window(window).unwrap().has_fullscreen_deadline());
    assert_eq!(video.display(display).unwrap().fullscreen_window(), Some(window));
    assert_eq!(video.current_display_mode(display).unwrap().w, 1280);

    // Not yet due
    video.pump_events_at(Instant::now());
    assert_eq!(video.window(window).unwrap().fullscreen_state(), FullscreenState::Entering);

    drain(&mut video);
    video.pump_events_at(Instant::now() + Duration::from_secs(6));
    assert_eq!(count(&drain(&mut video), EventType::WindowLeaveFullscreen), 1);

    let window = video.window(window).unwrap();
    assert_eq!(window.fullscreen_state(), FullscreenState::Windowed);
    assert!(!window.flags().contains(WindowFlags::FULLSCREEN));
    assert!(!window.has_fullscreen_deadline());
    assert_eq!(video.display(display).unwrap().fullscreen_window(), None);
    assert_eq!(video.current_display_mode(display).unwrap().w, 1920);
}
