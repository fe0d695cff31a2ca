//! Clipboard and primary selection operations
//!
//! A local provision is announced to the backend by content type only; data
//! is pulled from the producer when someone asks for it. Backends without the
//! typed clipboard API receive the provision's text instead, and when they
//! lack a text clipboard too the text is kept in-process.

use super::VideoSubsystem;
use crate::backend::BackendCapabilities;
use crate::clipboard::{
    is_text_mime_type, text_producer, ClipboardCleanup, ClipboardData, ClipboardProducer, TEXT_MIME_TYPES,
};
use crate::error::{VideoError, VideoResult};
use crate::events::{EventArg, EventType};

impl VideoSubsystem {
    /// Offer clipboard data, or clear the local offer
    ///
    /// Either a producer with at least one content type, or no producer and no
    /// content types to clear. The producer is called lazily for each request.
    /// `cleanup` runs once when the offer is replaced or cancelled.
    pub fn set_clipboard_data(
        &mut self,
        producer: Option<ClipboardProducer>,
        cleanup: Option<ClipboardCleanup>,
        mime_types: &[&str],
    ) -> VideoResult<()> {
        self.tracked(|video| match producer {
            None => {
                if !mime_types.is_empty() || cleanup.is_some() {
                    return Err(VideoError::invalid_param(
                        "producer",
                        "content types or a cleanup callback need a producer",
                    ));
                }
                video.clear_clipboard_internal()
            }
            Some(producer) => {
                if mime_types.is_empty() {
                    return Err(VideoError::invalid_param("mime_types", "at least one content type is required"));
                }
                if mime_types.iter().any(|mime_type| mime_type.is_empty()) {
                    return Err(VideoError::invalid_param("mime_types", "content types can't be empty"));
                }
                let mime_types: Vec<String> = mime_types.iter().map(|mime_type| (*mime_type).to_string()).collect();
                let sequence = video.clipboard.install(producer, cleanup, mime_types.clone());
                video.clipboard.external_mime_types.clear();
                log::debug!("Clipboard provision {} offers {:?}", sequence, mime_types);
                video.announce_clipboard(&mime_types)?;

                let event = video
                    .clipboard_event(EventType::ClipboardUpdated)
                    .with_arg("owned", EventArg::Owned(true))
                    .with_arg("mime_types", EventArg::MimeTypes(mime_types));
                video.emit(event);
                Ok(())
            }
        })
    }

    /// Drop the local clipboard offer
    pub fn clear_clipboard_data(&mut self) -> VideoResult<()> {
        self.tracked(Self::clear_clipboard_internal)
    }

    fn clear_clipboard_internal(&mut self) -> VideoResult<()> {
        let Some(sequence) = self.clipboard.clear() else {
            return Ok(());
        };
        log::debug!("Clipboard cleared (sequence {})", sequence);
        self.announce_clipboard(&[])?;
        let event = self
            .clipboard_event(EventType::ClipboardUpdated)
            .with_arg("owned", EventArg::Owned(true))
            .with_arg("mime_types", EventArg::MimeTypes(Vec::new()));
        self.emit(event);
        Ok(())
    }

    fn announce_clipboard(&mut self, mime_types: &[String]) -> VideoResult<()> {
        if self.capabilities.contains(BackendCapabilities::CLIPBOARD_DATA) {
            let result = self.backend.set_clipboard_data(mime_types);
            self.drain_backend();
            return result;
        }

        let text = mime_types
            .iter()
            .find(|mime_type| is_text_mime_type(mime_type))
            .and_then(|mime_type| self.clipboard.produce(mime_type))
            .map(|data| data.to_text())
            .unwrap_or_default();
        match self.backend.set_clipboard_text(&text) {
            Ok(()) => {
                self.clipboard.fallback_text = None;
                Ok(())
            }
            Err(e) if e.is_unsupported() => {
                log::trace!("Keeping clipboard text in-process: {}", e);
                self.clipboard.fallback_text = Some(text).filter(|text| !text.is_empty());
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Clipboard data for a content type
    ///
    /// The local offer is asked first, then whatever another application
    /// offers. The returned buffer is NUL-terminated.
    pub fn clipboard_data(&mut self, mime_type: &str) -> VideoResult<Option<ClipboardData>> {
        self.tracked(|video| {
            if mime_type.is_empty() {
                return Err(VideoError::invalid_param("mime_type", "can't be empty"));
            }
            Ok(video.fetch_clipboard_data(mime_type))
        })
    }

    fn fetch_clipboard_data(&mut self, mime_type: &str) -> Option<ClipboardData> {
        if let Some(data) = self.clipboard.produce(mime_type) {
            return Some(data);
        }
        if self.capabilities.contains(BackendCapabilities::CLIPBOARD_DATA) {
            if let Some(bytes) = self.backend.clipboard_data(mime_type) {
                return Some(ClipboardData::new(&bytes));
            }
        }
        if !is_text_mime_type(mime_type) {
            return None;
        }
        self.backend
            .clipboard_text()
            .or_else(|| self.clipboard.fallback_text.clone())
            .filter(|text| !text.is_empty())
            .map(|text| ClipboardData::new(text.as_bytes()))
    }

    /// Whether data is available for a content type
    pub fn has_clipboard_data(&mut self, mime_type: &str) -> bool {
        if !self.initialized || mime_type.is_empty() {
            return false;
        }
        if self.clipboard.has_data(mime_type) {
            return true;
        }
        if self.capabilities.contains(BackendCapabilities::CLIPBOARD_DATA) && self.backend.has_clipboard_data(mime_type)
        {
            return true;
        }
        is_text_mime_type(mime_type) && self.has_text_content()
    }

    /// Content types currently offered, locally or by another application
    pub fn clipboard_mime_types(&self) -> Vec<String> {
        if self.clipboard.has_provision() {
            self.clipboard.mime_types().to_vec()
        } else {
            self.clipboard.external_mime_types.clone()
        }
    }

    /// Put text on the clipboard; an empty string clears it
    pub fn set_clipboard_text(&mut self, text: &str) -> VideoResult<()> {
        if text.is_empty() {
            return self.clear_clipboard_data();
        }
        self.set_clipboard_data(Some(text_producer(text.to_string())), None, &TEXT_MIME_TYPES)
    }

    /// Clipboard text; empty when there is none
    pub fn clipboard_text(&mut self) -> String {
        if let Err(e) = self.ensure_initialized() {
            self.note_error(&e);
            return String::new();
        }
        TEXT_MIME_TYPES
            .iter()
            .find_map(|mime_type| self.fetch_clipboard_data(mime_type))
            .map(|data| data.to_text())
            .unwrap_or_default()
    }

    /// Whether the clipboard holds non-empty text
    pub fn has_clipboard_text(&mut self) -> bool {
        if !self.initialized {
            return false;
        }
        TEXT_MIME_TYPES.iter().any(|mime_type| self.clipboard.has_data(mime_type)) || self.has_text_content()
    }

    fn has_text_content(&mut self) -> bool {
        self.backend
            .has_clipboard_text()
            .unwrap_or_else(|| self.clipboard.fallback_text.as_deref().is_some_and(|text| !text.is_empty()))
    }

    /// Put text in the primary selection
    pub fn set_primary_selection_text(&mut self, text: &str) -> VideoResult<()> {
        self.tracked(|video| {
            match video.backend.set_primary_selection_text(text) {
                Ok(()) => video.clipboard.primary_selection_text = None,
                Err(e) if e.is_unsupported() => {
                    log::trace!("Keeping primary selection in-process: {}", e);
                    video.clipboard.primary_selection_text = Some(text.to_string());
                }
                Err(e) => return Err(e),
            }
            video.drain_backend();
            let event = video
                .clipboard_event(EventType::ClipboardUpdated)
                .with_arg("owned", EventArg::Owned(true));
            video.emit(event);
            Ok(())
        })
    }

    /// Primary selection text; empty when there is none
    pub fn primary_selection_text(&mut self) -> String {
        if !self.initialized {
            return String::new();
        }
        self.backend
            .primary_selection_text()
            .or_else(|| self.clipboard.primary_selection_text.clone())
            .unwrap_or_default()
    }

    /// Whether the primary selection holds non-empty text
    pub fn has_primary_selection_text(&mut self) -> bool {
        if !self.initialized {
            return false;
        }
        self.backend.has_primary_selection_text().unwrap_or_else(|| {
            self.clipboard
                .primary_selection_text
                .as_deref()
                .is_some_and(|text| !text.is_empty())
        })
    }

    /// Answer a backend data request made under `sequence`
    ///
    /// Requests for a provision that has since been replaced get nothing.
    pub fn serve_clipboard_request(&mut self, sequence: u32, mime_type: &str) -> Option<ClipboardData> {
        self.clipboard.produce_for(sequence, mime_type)
    }

    /// Sequence number of the live clipboard provision
    pub fn clipboard_sequence(&self) -> u32 {
        self.clipboard.sequence()
    }
}
