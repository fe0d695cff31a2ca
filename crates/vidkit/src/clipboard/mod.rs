//! # Clipboard ownership
//!
//! The clipboard never stores bytes for a local provision. It stores a
//! producer closure and the content types it advertises, and pulls data from
//! the producer on demand.
//!
//! Every provision is tagged with a sequence number. Zero means "no
//! provision"; the counter wraps from `u32::MAX` back to 1. Cancellations and
//! asynchronous requests carry the sequence they were issued under and are
//! ignored once the live sequence has moved on.

use std::fmt;

/// Text content types, tried in this order
pub const TEXT_MIME_TYPES: [&str; 5] = [
    "text/plain;charset=utf-8",
    "text/plain",
    "TEXT",
    "UTF8_STRING",
    "STRING",
];

/// Produces clipboard data for a content type on demand
pub type ClipboardProducer = Box<dyn FnMut(&str) -> Option<Vec<u8>>>;

/// Runs once when a provision is cancelled or replaced
pub type ClipboardCleanup = Box<dyn FnOnce()>;

/// Whether a content type is one of the text types
pub fn is_text_mime_type(mime_type: &str) -> bool {
    TEXT_MIME_TYPES.contains(&mime_type)
}

/// Clipboard data copied out for the caller
///
/// The buffer always ends in a NUL byte that is not part of the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardData {
    bytes: Vec<u8>,
}

impl ClipboardData {
    /// Copy a payload, appending the terminator
    pub fn new(payload: &[u8]) -> Self {
        let mut bytes = Vec::with_capacity(payload.len() + 1);
        bytes.extend_from_slice(payload);
        bytes.push(0);
        Self { bytes }
    }

    /// Payload without the terminator
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.bytes.len() - 1]
    }

    /// Payload including the terminator
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.bytes
    }

    /// Payload length, excluding the terminator
    pub fn len(&self) -> usize {
        self.bytes.len() - 1
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Payload decoded as UTF-8, replacing invalid sequences
    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(self.as_bytes()).into_owned()
    }
}

struct Provision {
    producer: ClipboardProducer,
    cleanup: Option<ClipboardCleanup>,
    mime_types: Vec<String>,
}

/// Local clipboard provision and fallback text storage
#[derive(Default)]
pub struct ClipboardState {
    sequence: u32,
    provision: Option<Provision>,
    pub(crate) fallback_text: Option<String>,
    pub(crate) primary_selection_text: Option<String>,
    pub(crate) external_mime_types: Vec<String>,
}

impl ClipboardState {
    /// Create an empty clipboard
    pub fn new() -> Self {
        Self::default()
    }

    /// Live sequence number; zero before the first provision
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Whether a local provision is active
    pub fn has_provision(&self) -> bool {
        self.provision.is_some()
    }

    /// Content types the local provision advertises
    pub fn mime_types(&self) -> &[String] {
        match &self.provision {
            Some(provision) => &provision.mime_types,
            None => &[],
        }
    }

    fn advance(&mut self) -> u32 {
        self.sequence = self.sequence.wrapping_add(1);
        if self.sequence == 0 {
            self.sequence = 1;
        }
        self.sequence
    }

    /// Cancel the provision made under `sequence`
    ///
    /// A no-op returning `false` when the sequence is stale or nothing is
    /// provided. The cleanup closure runs exactly once.
    pub fn cancel(&mut self, sequence: u32) -> bool {
        if sequence != self.sequence {
            log::trace!("Ignoring stale clipboard cancel {} (live {})", sequence, self.sequence);
            return false;
        }
        match self.provision.take() {
            Some(provision) => {
                if let Some(cleanup) = provision.cleanup {
                    cleanup();
                }
                true
            }
            None => false,
        }
    }

    /// Replace the provision, returning the new sequence number
    pub fn install(
        &mut self,
        producer: ClipboardProducer,
        cleanup: Option<ClipboardCleanup>,
        mime_types: Vec<String>,
    ) -> u32 {
        self.cancel(self.sequence);
        let sequence = self.advance();
        self.provision = Some(Provision { producer, cleanup, mime_types });
        sequence
    }

    /// Drop the provision; advances the sequence when one was active
    pub fn clear(&mut self) -> Option<u32> {
        if !self.has_provision() {
            return None;
        }
        self.cancel(self.sequence);
        Some(self.advance())
    }

    /// Whether the local provision offers a content type
    pub fn has_data(&self, mime_type: &str) -> bool {
        self.mime_types().iter().any(|offered| offered == mime_type)
    }

    /// Pull data for a content type from the local producer
    pub fn produce(&mut self, mime_type: &str) -> Option<ClipboardData> {
        let provision = self.provision.as_mut()?;
        if !provision.mime_types.iter().any(|offered| offered == mime_type) {
            return None;
        }
        (provision.producer)(mime_type).map(|bytes| ClipboardData::new(&bytes))
    }

    /// Serve an asynchronous request issued under `sequence`
    pub fn produce_for(&mut self, sequence: u32, mime_type: &str) -> Option<ClipboardData> {
        if sequence != self.sequence {
            log::trace!("Dropping clipboard request for stale sequence {}", sequence);
            return None;
        }
        self.produce(mime_type)
    }
}

impl fmt::Debug for ClipboardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClipboardState")
            .field("sequence", &self.sequence)
            .field("mime_types", &self.mime_types())
            .finish_non_exhaustive()
    }
}

/// Producer serving a fixed string for every text content type
pub fn text_producer(text: String) -> ClipboardProducer {
    Box::new(move |mime_type| is_text_mime_type(mime_type).then(|| text.as_bytes().to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn producer(payload: &'static str) -> ClipboardProducer {
        Box::new(move |_| Some(payload.as_bytes().to_vec()))
    }

    #[test]
    fn test_sequence_increments_by_one() {
        let mut clipboard = ClipboardState::new();
        for expected in 1..=3 {
            let sequence = clipboard.install(producer("x"), None, vec!["text/plain".into()]);
            assert_eq!(sequence, expected);
        }
    }

    #[test]
    fn test_sequence_wraps_past_zero() {
        let mut clipboard = ClipboardState { sequence: u32::MAX, ..ClipboardState::default() };
        assert_eq!(clipboard.install(producer("x"), None, vec!["a".into()]), 1);
    }

    #[test]
    fn test_stale_cancel_is_noop() {
        let cleanups = Rc::new(Cell::new(0));
        let mut clipboard = ClipboardState::new();
        let counter = cleanups.clone();
        clipboard.install(producer("one"), Some(Box::new(move || counter.set(counter.get() + 1))), vec!["a".into()]);
        let counter = cleanups.clone();
        let second = clipboard.install(producer("two"), Some(Box::new(move || counter.set(counter.get() + 10))), vec!["a".into()]);
        assert_eq!(cleanups.get(), 1);

        assert!(!clipboard.cancel(second - 1));
        assert!(clipboard.has_provision());
        assert_eq!(clipboard.produce("a").unwrap().as_bytes(), b"two");

        assert!(clipboard.cancel(second));
        assert_eq!(cleanups.get(), 11);
        assert!(!clipboard.cancel(second));
    }

    #[test]
    fn test_data_is_nul_terminated() {
        let mut clipboard = ClipboardState::new();
        clipboard.install(producer("hello"), None, vec!["text/plain".into()]);
        let data = clipboard.produce("text/plain").unwrap();
        assert_eq!(data.len(), 5);
        assert_eq!(data.as_bytes_with_nul(), b"hello\0");
        assert!(clipboard.produce("image/png").is_none());
        assert!(clipboard.has_data("text/plain"));
        assert!(!clipboard.has_data("image/png"));
    }

    #[test]
    fn test_clear_advances_only_with_provision() {
        let mut clipboard = ClipboardState::new();
        assert_eq!(clipboard.clear(), None);
        clipboard.install(producer("x"), None, vec!["a".into()]);
        assert_eq!(clipboard.clear(), Some(2));
        assert!(clipboard.mime_types().is_empty());
        assert!(clipboard.produce_for(1, "a").is_none());
    }

    #[test]
    fn test_text_producer_only_serves_text() {
        let mut produce = text_producer("abc".into());
        assert_eq!(produce("UTF8_STRING"), Some(b"abc".to_vec()));
        assert_eq!(produce("image/png"), None);
    }
}
