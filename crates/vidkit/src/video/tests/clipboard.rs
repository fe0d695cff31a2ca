use super::*;
use crate::backend::{BackendCall, BackendCapabilities};
use crate::clipboard::{ClipboardCleanup, ClipboardProducer};
use crate::error::VideoError;
use crate::events::{ClipboardOwner, PlatformEvent};
use std::cell::Cell;
use std::rc::Rc;

fn image_producer() -> ClipboardProducer {
    Box::new(|mime_type: &str| (mime_type == "image/png").then(|| vec![0x89, b'P', b'N', b'G']))
}

fn counting_cleanup(counter: &Rc<Cell<u32>>) -> ClipboardCleanup {
    let counter = Rc::clone(counter);
    Box::new(move || counter.set(counter.get() + 1))
}

#[test]
fn test_provision_is_served_lazily() {
    let (mut video, handle) = start(HeadlessBackend::new());
    let calls = Rc::new(Cell::new(0));
    let seen = Rc::clone(&calls);
    let producer: ClipboardProducer = Box::new(move |_: &str| {
        seen.set(seen.get() + 1);
        Some(b"payload".to_vec())
    });

    video.set_clipboard_data(Some(producer), None, &["application/x-demo"]).unwrap();
    assert_eq!(calls.get(), 0);
    assert!(handle
        .calls()
        .contains(&BackendCall::SetClipboardData(vec!["application/x-demo".to_string()])));

    let data = video.clipboard_data("application/x-demo").unwrap().unwrap();
    assert_eq!(data.as_bytes(), b"payload");
    assert_eq!(data.as_bytes_with_nul().last(), Some(&0));
    assert_eq!(calls.get(), 1);

    assert_eq!(video.clipboard_data("text/html").unwrap(), None);
    assert_eq!(video.clipboard_mime_types(), vec!["application/x-demo".to_string()]);
}

#[test]
fn test_invalid_provisions_are_rejected() {
    let (mut video, _handle) = start(HeadlessBackend::new());

    let result = video.set_clipboard_data(Some(image_producer()), None, &[]);
    assert!(matches!(result, Err(VideoError::InvalidParam { param: "mime_types", .. })));

    let result = video.set_clipboard_data(Some(image_producer()), None, &["image/png", ""]);
    assert!(matches!(result, Err(VideoError::InvalidParam { param: "mime_types", .. })));

    let result = video.set_clipboard_data(None, None, &["image/png"]);
    assert!(matches!(result, Err(VideoError::InvalidParam { param: "producer", .. })));

    assert!(matches!(
        video.clipboard_data(""),
        Err(VideoError::InvalidParam { param: "mime_type", .. })
    ));
    assert_eq!(video.clipboard_sequence(), 0);
}

#[test]
fn test_replacing_provision_runs_cleanup_once() {
    let (mut video, _handle) = start(HeadlessBackend::new());
    let cleanups = Rc::new(Cell::new(0));

    video
        .set_clipboard_data(Some(image_producer()), Some(counting_cleanup(&cleanups)), &["image/png"])
        .unwrap();
    video.set_clipboard_text("replacement").unwrap();
    assert_eq!(cleanups.get(), 1);

    video.clear_clipboard_data().unwrap();
    assert_eq!(cleanups.get(), 1);
    assert_eq!(video.clipboard_sequence(), 3);
    assert!(!video.has_clipboard_text());
}

#[test]
fn test_clearing_without_provision_is_noop() {
    let (mut video, handle) = start(HeadlessBackend::new());
    drain(&mut video);

    video.clear_clipboard_data().unwrap();
    video.set_clipboard_data(None, None, &[]).unwrap();
    video.set_clipboard_text("").unwrap();

    assert_eq!(video.clipboard_sequence(), 0);
    assert!(drain(&mut video).is_empty());
    assert!(!handle.calls().iter().any(|call| matches!(call, BackendCall::SetClipboardData(_))));
}

#[test]
fn test_external_owner_cancels_provision() {
    let (mut video, handle) = start(HeadlessBackend::new());
    let cleanups = Rc::new(Cell::new(0));
    video
        .set_clipboard_data(Some(image_producer()), Some(counting_cleanup(&cleanups)), &["image/png"])
        .unwrap();
    let ours = video.clipboard_sequence();
    drain(&mut video);

    handle.set_external_clipboard(vec![("text/plain".to_string(), b"from elsewhere".to_vec())]);
    video.pump_events();

    assert_eq!(cleanups.get(), 1);
    assert_eq!(video.clipboard_sequence(), ours + 1);
    assert!(!video.has_clipboard_data("image/png"));
    assert!(video.has_clipboard_data("text/plain"));
    assert_eq!(video.clipboard_mime_types(), vec!["text/plain".to_string()]);
    assert_eq!(
        video.clipboard_data("text/plain").unwrap().unwrap().as_bytes(),
        b"from elsewhere"
    );

    let events = drain(&mut video);
    let cancelled = events
        .iter()
        .find(|event| event.event_type == EventType::ClipboardCancelled)
        .unwrap();
    assert_eq!(cancelled.get_sequence(), Some(ours));
    let updated = events
        .iter()
        .find(|event| event.event_type == EventType::ClipboardUpdated)
        .unwrap();
    assert_eq!(updated.get_owned(), Some(false));
}

#[test]
fn test_platform_cancel_of_live_provision() {
    let (mut video, _handle) = start(HeadlessBackend::new());
    let cleanups = Rc::new(Cell::new(0));
    video
        .set_clipboard_data(Some(image_producer()), Some(counting_cleanup(&cleanups)), &["image/png"])
        .unwrap();
    let live = video.clipboard_sequence();
    drain(&mut video);

    video.dispatch(PlatformEvent::ClipboardCancelled { sequence: live });
    video.dispatch(PlatformEvent::ClipboardCancelled { sequence: live });

    assert_eq!(cleanups.get(), 1);
    assert!(!video.has_clipboard_data("image/png"));
    assert!(video.serve_clipboard_request(live, "image/png").is_none());
    assert_eq!(count(&drain(&mut video), EventType::ClipboardCancelled), 1);
}

#[test]
fn test_local_owner_notification() {
    let (mut video, _handle) = start(HeadlessBackend::new());
    video.set_clipboard_data(Some(image_producer()), None, &["image/png"]).unwrap();
    drain(&mut video);

    video.dispatch(PlatformEvent::ClipboardUpdated { owner: ClipboardOwner::Local, mime_types: Vec::new() });

    let events = drain(&mut video);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].get_owned(), Some(true));
    assert_eq!(events[0].get_mime_types(), Some(&["image/png".to_string()][..]));
    assert!(video.has_clipboard_data("image/png"));
}

#[test]
fn test_text_only_backend_gets_provision_text() {
    let backend = HeadlessBackend::new().with_capabilities(BackendCapabilities::POPUP_WINDOWS);
    let (mut video, handle) = start(backend);

    video.set_clipboard_text("hello").unwrap();

    assert!(handle.calls().contains(&BackendCall::SetClipboardText("hello".to_string())));
    assert!(!handle.calls().iter().any(|call| matches!(call, BackendCall::SetClipboardData(_))));
    assert_eq!(video.clipboard_text(), "hello");
    assert!(video.has_clipboard_text());

    video.set_clipboard_data(Some(image_producer()), None, &["image/png"]).unwrap();
    assert!(handle.calls().contains(&BackendCall::SetClipboardText(String::new())));
}

#[test]
fn test_clipboard_updates_are_announced() {
    let (mut video, _handle) = start(HeadlessBackend::new());
    drain(&mut video);

    video.set_clipboard_text("one").unwrap();
    video.set_clipboard_text("two").unwrap();
    video.clear_clipboard_data().unwrap();

    let sequences: Vec<u32> = drain(&mut video)
        .iter()
        .filter(|event| event.event_type == EventType::ClipboardUpdated)
        .filter_map(Event::get_sequence)
        .collect();
    assert_eq!(sequences, vec![1, 2, 3]);
}

#[test]
fn test_primary_selection() {
    let (mut video, handle) = start(HeadlessBackend::new());
    assert!(!video.has_primary_selection_text());

    video.set_primary_selection_text("selected").unwrap();

    assert_eq!(video.primary_selection_text(), "selected");
    assert!(video.has_primary_selection_text());
    assert!(handle
        .calls()
        .contains(&BackendCall::SetPrimarySelectionText("selected".to_string())));
    // The primary selection is not the clipboard
    assert_eq!(video.clipboard_sequence(), 0);
}

#[test]
fn test_clipboard_after_shutdown() {
    let (mut video, _handle) = start(HeadlessBackend::new());
    video.set_clipboard_text("bye").unwrap();
    video.shutdown();

    video.clear_error();
    assert_eq!(video.clipboard_text(), "");
    assert_eq!(video.last_error(), Some(VideoError::NotInitialized.to_string()));
    assert!(!video.has_clipboard_text());
    assert_eq!(video.set_clipboard_text("late"), Err(VideoError::NotInitialized));
}
