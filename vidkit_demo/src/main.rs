//! Headless vidkit walkthrough
//!
//! Drives the video core against the in-memory backend: two displays, a
//! window hierarchy, desktop and exclusive fullscreen, a display unplug and
//! the clipboard. Pass a `.toml` or `.ron` file to override the defaults.

use vidkit::backend::HeadlessHandle;
use vidkit::config::{Config, ConfigError};
use vidkit::foundation::logging;
use vidkit::prelude::*;

#[derive(thiserror::Error, Debug)]
enum DemoError {
    #[error("video error: {0}")]
    Video(#[from] VideoError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

fn load_config() -> Result<VideoConfig, ConfigError> {
    let config = match std::env::args().nth(1) {
        Some(path) => VideoConfig::load_from_file(path)?,
        None => VideoConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn backend() -> HeadlessBackend {
    let laptop = DisplayMode::new(1920, 1080).with_refresh_hz(60);
    let monitor = DisplayMode::new(2560, 1440).with_refresh_hz(60);
    HeadlessBackend::empty()
        .with_display(
            HeadlessDisplay::new(laptop)
                .with_name("Built-in")
                .with_bounds(Rect::new(0, 0, 1920, 1080))
                .with_modes(vec![laptop, DisplayMode::new(1280, 720).with_refresh_hz(60)]),
        )
        .with_display(
            HeadlessDisplay::new(monitor)
                .with_name("External")
                .with_bounds(Rect::new(1920, 0, 2560, 1440))
                .with_modes(vec![monitor, DisplayMode::new(1920, 1080).with_refresh_hz(144)]),
        )
}

fn log_events(video: &mut VideoSubsystem) {
    while let Some(event) = video.poll_event() {
        match (event.get_window(), event.get_display()) {
            (Some(window), _) => log::info!("  {:?} window={:?}", event.event_type, window),
            (None, Some(display)) => log::info!("  {:?} display={}", event.event_type, display),
            (None, None) => log::info!("  {:?}", event.event_type),
        }
    }
}

fn describe_displays(video: &mut VideoSubsystem) -> Result<(), VideoError> {
    for id in video.displays() {
        let bounds = video.display_bounds(id)?;
        let modes = video.fullscreen_display_modes(id)?;
        log::info!(
            "Display {} \"{}\" at {}, {} fullscreen modes",
            id,
            video.display_name(id)?,
            bounds,
            modes.len()
        );
        for mode in modes {
            log::debug!("  {}x{} @ {:.0}Hz", mode.w, mode.h, mode.refresh.hz());
        }
    }
    Ok(())
}

fn fullscreen_tour(video: &mut VideoSubsystem, window: WindowId, external: DisplayId) -> Result<(), VideoError> {
    log::info!("Entering desktop fullscreen");
    video.set_window_fullscreen(window, true)?;
    log::info!("  now {:?} at {}", video.window(window)?.fullscreen_state(), video.window(window)?.rect());
    video.set_window_fullscreen(window, false)?;
    log_events(video);

    log::info!("Entering exclusive fullscreen at 1920x1080@144");
    let mode = video.closest_fullscreen_display_mode(external, 1920, 1080, 144.0, false)?;
    video.set_window_fullscreen_mode(window, Some(mode))?;
    video.set_window_fullscreen(window, true)?;
    let current = video.current_display_mode(external)?;
    log::info!("  display mode is now {}x{} @ {:.0}Hz", current.w, current.h, current.refresh.hz());
    log_events(video);
    Ok(())
}

fn unplug(video: &mut VideoSubsystem, handle: &HeadlessHandle, display: DisplayId, window: WindowId) -> Result<(), VideoError> {
    log::info!("Unplugging display {}", display);
    handle.detach_display(display);
    video.pump_events();
    log::info!(
        "  window now on display {} as {:?}",
        video.display_for_window(window)?,
        video.window(window)?.fullscreen_state()
    );
    log_events(video);
    Ok(())
}

fn clipboard_tour(video: &mut VideoSubsystem) -> Result<(), VideoError> {
    video.set_clipboard_text("hello from vidkit")?;
    log::info!("Clipboard text: \"{}\" (sequence {})", video.clipboard_text(), video.clipboard_sequence());

    let producer: ClipboardProducer = Box::new(|mime_type: &str| {
        log::info!("  producing {}", mime_type);
        (mime_type == "application/json").then(|| br#"{"greeting":"hello"}"#.to_vec())
    });
    let cleanup: ClipboardCleanup = Box::new(|| log::info!("  provision released"));
    video.set_clipboard_data(Some(producer), Some(cleanup), &["application/json"])?;
    if let Some(data) = video.clipboard_data("application/json")? {
        log::info!("Clipboard JSON: {}", data.to_text());
    }
    video.clear_clipboard_data()?;
    log_events(video);
    Ok(())
}

fn run(config: &VideoConfig) -> Result<(), DemoError> {
    let backend = backend();
    let handle = backend.handle();
    let mut video = VideoSubsystem::init(Box::new(backend), config.to_hints())?;
    describe_displays(&mut video)?;

    let displays = video.displays();
    let (primary, external) = match displays.as_slice() {
        [primary, external, ..] => (*primary, *external),
        _ => return Err(VideoError::NoDisplays.into()),
    };

    let main = video.create_window(
        WindowDesc::new("vidkit demo", 1024, 768)
            .with_position(WindowPosition::Centered(Some(external)), WindowPosition::Centered(Some(external))),
    )?;
    let menu = video.create_window(
        WindowDesc::new("menu", 200, 300)
            .with_flags(WindowFlags::POPUP_MENU)
            .with_parent(main)
            .with_position(WindowPosition::At(16), WindowPosition::At(32)),
    )?;
    log::info!("Main window at {}, menu at {}", video.window(main)?.rect(), video.window(menu)?.rect());
    log_events(&mut video);

    video.destroy_window(menu)?;
    fullscreen_tour(&mut video, main, external)?;
    unplug(&mut video, &handle, external, main)?;
    log::info!("Primary display {} now shows {:?}", primary, video.display(primary)?.fullscreen_window());

    clipboard_tour(&mut video)?;

    video.shutdown();
    Ok(())
}

fn main() {
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    logging::init_with_level(&config.log_level);

    log::info!("Starting vidkit headless demo");
    if let Err(e) = run(&config) {
        log::error!("Demo failed: {}", e);
        std::process::exit(1);
    }
    log::info!("Demo finished");
}
