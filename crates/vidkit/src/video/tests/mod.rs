//! Subsystem tests against the headless backend

use super::VideoSubsystem;
use crate::backend::{HeadlessBackend, HeadlessDisplay, HeadlessHandle};
use crate::config::Hints;
use crate::display::DisplayMode;
use crate::events::{Event, EventType};
use crate::foundation::collections::{DisplayId, WindowId};
use crate::foundation::math::Rect;
use crate::window::{WindowDesc, WindowPosition};

mod clipboard;
mod displays;
mod scenarios;

fn start(backend: HeadlessBackend) -> (VideoSubsystem, HeadlessHandle) {
    start_with_hints(backend, Hints::new())
}

fn start_with_hints(backend: HeadlessBackend, hints: Hints) -> (VideoSubsystem, HeadlessHandle) {
    let handle = backend.handle();
    let video = VideoSubsystem::init(Box::new(backend), hints).expect("headless backend starts");
    (video, handle)
}

/// D1 1920x1080@60 at the origin, D2 2560x1440@60 to its right with an
/// extra 1920x1080@120 mode
fn two_displays() -> HeadlessBackend {
    let d1 = DisplayMode::new(1920, 1080).with_refresh_hz(60);
    let d2 = DisplayMode::new(2560, 1440).with_refresh_hz(60);
    HeadlessBackend::empty()
        .with_display(
            HeadlessDisplay::new(d1)
                .with_name("D1")
                .with_bounds(Rect::new(0, 0, 1920, 1080))
                .with_modes(vec![d1]),
        )
        .with_display(
            HeadlessDisplay::new(d2)
                .with_name("D2")
                .with_bounds(Rect::new(1920, 0, 2560, 1440))
                .with_modes(vec![d2, DisplayMode::new(1920, 1080).with_refresh_hz(120)]),
        )
}

fn display_ids(video: &VideoSubsystem) -> (DisplayId, DisplayId) {
    let ids = video.displays();
    (ids[0], ids[1])
}

fn window_on(video: &mut VideoSubsystem, display: Option<DisplayId>, title: &str) -> WindowId {
    let desc = WindowDesc::new(title, 800, 600)
        .with_position(WindowPosition::Centered(display), WindowPosition::Centered(display));
    video.create_window(desc).expect("window is created")
}

fn drain(video: &mut VideoSubsystem) -> Vec<Event> {
    std::iter::from_fn(|| video.poll_event()).collect()
}

fn count(events: &[Event], event_type: EventType) -> usize {
    events.iter().filter(|event| event.event_type == event_type).count()
}
