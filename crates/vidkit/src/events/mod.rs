//! Outbound notifications
//!
//! The video core queues an [`Event`] for every observable state change.
//! Applications poll the queue or register an [`EventHandler`] per
//! [`EventType`]; a handler that returns `true` consumes the event. Arguments
//! are keyed by name, so producers and consumers never agree on an order.
//!
//! Inbound notifications from the backend are [`PlatformEvent`]s.

pub mod platform;

pub use platform::{ClipboardOwner, PlatformEvent, WindowEvent};

use crate::display::{HdrProperties, Orientation};
use crate::foundation::collections::{DisplayId, WindowId};
use std::collections::{HashMap, VecDeque};

/// Kind of notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// A display was attached
    DisplayAdded,
    /// A display was detached
    DisplayRemoved,
    /// A display's bounds changed
    DisplayMoved,
    /// A display's desktop mode changed
    DisplayDesktopModeChanged,
    /// A display switched modes
    DisplayCurrentModeChanged,
    /// A display's content scale changed
    DisplayContentScaleChanged,
    /// A display's HDR properties changed
    DisplayHdrChanged,
    /// A display was rotated
    DisplayOrientationChanged,
    /// Window became visible
    WindowShown,
    /// Window was hidden
    WindowHidden,
    /// Window moved
    WindowMoved,
    /// Window resized
    WindowResized,
    /// Window size in pixels changed
    WindowPixelSizeChanged,
    /// Window minimized
    WindowMinimized,
    /// Window maximized
    WindowMaximized,
    /// Window restored from minimized or maximized state
    WindowRestored,
    /// Window entered fullscreen
    WindowEnterFullscreen,
    /// Window left fullscreen
    WindowLeaveFullscreen,
    /// Window moved to another display
    WindowDisplayChanged,
    /// Window display scale changed
    WindowDisplayScaleChanged,
    /// Window HDR properties changed
    WindowHdrChanged,
    /// Window gained keyboard focus
    WindowFocusGained,
    /// Window lost keyboard focus
    WindowFocusLost,
    /// Window is being destroyed
    WindowDestroyed,
    /// Clipboard or primary selection contents changed
    ClipboardUpdated,
    /// A clipboard provision was cancelled
    ClipboardCancelled,
}

/// Typed value attached to an event under a well-known key
#[derive(Debug, Clone, PartialEq)]
pub enum EventArg {
    /// Window handle
    Window(WindowId),
    /// Display identity
    Display(DisplayId),
    /// Position in desktop or parent coordinates
    Position(i32, i32),
    /// Size in screen units or pixels
    Size(i32, i32),
    /// Scale factor
    Scale(f32),
    /// HDR properties
    Hdr(HdrProperties),
    /// Display orientation
    Orientation(Orientation),
    /// Clipboard sequence number
    Sequence(u32),
    /// Whether this process owns the clipboard
    Owned(bool),
    /// Advertised content types
    MimeTypes(Vec<String>),
}

/// Notification with named arguments
#[derive(Debug, Clone)]
pub struct Event {
    /// What happened
    pub event_type: EventType,
    /// Seconds since the subsystem started
    pub timestamp: f64,
    args: HashMap<&'static str, EventArg>,
}

impl Event {
    /// Event without arguments
    pub fn new(event_type: EventType, timestamp: f64) -> Self {
        Self {
            event_type,
            timestamp,
            args: HashMap::new(),
        }
    }

    /// Attach an argument, replacing any previous value under `key`
    pub fn with_arg(mut self, key: &'static str, value: EventArg) -> Self {
        self.args.insert(key, value);
        self
    }

    /// Raw argument lookup
    pub fn get_arg(&self, key: &str) -> Option<&EventArg> {
        self.args.get(key)
    }

    /// Get window argument if present
    pub fn get_window(&self) -> Option<WindowId> {
        match self.get_arg("window") {
            Some(EventArg::Window(id)) => Some(*id),
            _ => None,
        }
    }

    /// Get display argument if present
    pub fn get_display(&self) -> Option<DisplayId> {
        match self.get_arg("display") {
            Some(EventArg::Display(id)) => Some(*id),
            _ => None,
        }
    }

    /// Get position argument if present
    pub fn get_position(&self) -> Option<(i32, i32)> {
        match self.get_arg("position") {
            Some(EventArg::Position(x, y)) => Some((*x, *y)),
            _ => None,
        }
    }

    /// Get size argument if present
    pub fn get_size(&self) -> Option<(i32, i32)> {
        match self.get_arg("size") {
            Some(EventArg::Size(w, h)) => Some((*w, *h)),
            _ => None,
        }
    }

    /// Get scale argument if present
    pub fn get_scale(&self) -> Option<f32> {
        match self.get_arg("scale") {
            Some(EventArg::Scale(scale)) => Some(*scale),
            _ => None,
        }
    }

    /// Get HDR argument if present
    pub fn get_hdr(&self) -> Option<HdrProperties> {
        match self.get_arg("hdr") {
            Some(EventArg::Hdr(hdr)) => Some(*hdr),
            _ => None,
        }
    }

    /// Get sequence argument if present
    pub fn get_sequence(&self) -> Option<u32> {
        match self.get_arg("sequence") {
            Some(EventArg::Sequence(sequence)) => Some(*sequence),
            _ => None,
        }
    }

    /// Get clipboard ownership argument if present
    pub fn get_owned(&self) -> Option<bool> {
        match self.get_arg("owned") {
            Some(EventArg::Owned(owned)) => Some(*owned),
            _ => None,
        }
    }

    /// Get content types argument if present
    pub fn get_mime_types(&self) -> Option<&[String]> {
        match self.get_arg("mime_types") {
            Some(EventArg::MimeTypes(types)) => Some(types.as_slice()),
            _ => None,
        }
    }
}

/// Receives events of the types it was registered for
pub trait EventHandler {
    /// Handle an event; `true` stops delivery to later handlers
    fn on_event(&mut self, event: &Event) -> bool;
}

/// Outbound queue plus per-type handler chains
pub struct EventSystem {
    queue: VecDeque<Event>,
    handlers: HashMap<EventType, Vec<Box<dyn EventHandler>>>,
}

impl EventSystem {
    /// Empty queue with no handlers
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            handlers: HashMap::new(),
        }
    }

    /// Append a handler to the chain for `event_type`
    pub fn register_handler(&mut self, event_type: EventType, handler: Box<dyn EventHandler>) {
        self.handlers
            .entry(event_type)
            .or_default()
            .push(handler);
    }

    /// Queue an event
    pub fn send(&mut self, event: Event) {
        log::trace!("Event {:?} queued", event.event_type);
        self.queue.push_back(event);
    }

    /// Take the oldest queued event without running handlers
    pub fn poll_event(&mut self) -> Option<Event> {
        self.queue.pop_front()
    }

    /// Queued events, oldest first
    pub fn pending(&self) -> impl Iterator<Item = &Event> {
        self.queue.iter()
    }

    /// Number of queued events
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Deliver all queued events to registered handlers
    ///
    /// Returns the events no handler consumed.
    pub fn dispatch(&mut self) -> Vec<Event> {
        let queued = std::mem::take(&mut self.queue);
        queued
            .into_iter()
            .filter(|event| !self.dispatch_event(event))
            .collect()
    }

    fn dispatch_event(&mut self, event: &Event) -> bool {
        self.handlers
            .get_mut(&event.event_type)
            .is_some_and(|chain| chain.iter_mut().any(|handler| handler.on_event(event)))
    }

    /// Drop everything still queued
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

impl Default for EventSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSystem")
            .field("queued", &self.queue.len())
            .field("handler_types", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct TestHandler {
        events_received: Rc<RefCell<Vec<EventType>>>,
        consume: bool,
    }

    impl EventHandler for TestHandler {
        fn on_event(&mut self, event: &Event) -> bool {
            self.events_received.borrow_mut().push(event.event_type);
            self.consume
        }
    }

    #[test]
    fn test_poll_preserves_order() {
        let mut system = EventSystem::new();
        system.send(Event::new(EventType::WindowShown, 0.0));
        system.send(Event::new(EventType::WindowMoved, 0.1).with_arg("position", EventArg::Position(4, 2)));

        assert_eq!(system.poll_event().unwrap().event_type, EventType::WindowShown);
        let moved = system.poll_event().unwrap();
        assert_eq!(moved.get_position(), Some((4, 2)));
        assert_eq!(moved.get_size(), None);
        assert!(system.poll_event().is_none());
    }

    #[test]
    fn test_consumed_events_stop_forwarding() {
        let mut system = EventSystem::new();
        let first = Rc::new(RefCell::new(Vec::new()));
        let second = Rc::new(RefCell::new(Vec::new()));
        system.register_handler(
            EventType::WindowResized,
            Box::new(TestHandler { events_received: first.clone(), consume: true }),
        );
        system.register_handler(
            EventType::WindowResized,
            Box::new(TestHandler { events_received: second.clone(), consume: false }),
        );

        system.send(Event::new(EventType::WindowResized, 0.0));
        system.send(Event::new(EventType::WindowHidden, 0.0));
        let unconsumed = system.dispatch();

        assert_eq!(first.borrow().as_slice(), &[EventType::WindowResized]);
        assert!(second.borrow().is_empty());
        assert_eq!(unconsumed.len(), 1);
        assert_eq!(unconsumed[0].event_type, EventType::WindowHidden);
        assert!(system.is_empty());
    }

    #[test]
    fn test_clear_queue() {
        let mut system = EventSystem::new();
        system.send(Event::new(EventType::ClipboardUpdated, 0.0).with_arg("owned", EventArg::Owned(true)));
        assert_eq!(system.len(), 1);
        system.clear();
        assert!(system.is_empty());
    }
}
