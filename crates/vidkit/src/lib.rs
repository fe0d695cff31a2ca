//! # vidkit
//!
//! Platform-independent core of a video subsystem: it tracks displays and
//! their mode catalogs, owns the window hierarchy, coordinates fullscreen
//! transitions and negotiates clipboard ownership. Native windowing systems
//! plug in through the [`backend::VideoBackend`] trait.
//!
//! ## Features
//!
//! - **Display Registry**: displays, desktop/current modes, a lazily loaded
//!   fullscreen mode catalog and hot-plug handling
//! - **Window Registry**: stable window handles, parent/child hierarchy,
//!   geometry with floating-rectangle bookkeeping
//! - **Fullscreen Coordinator**: desktop, exclusive and compositor fullscreen
//!   with asynchronous backend confirmation and mode-switch deadlines
//! - **Clipboard**: sequence-numbered, lazily produced clipboard data
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vidkit::prelude::*;
//!
//! fn main() -> Result<(), VideoError> {
//!     let mut video = VideoSubsystem::init(Box::new(HeadlessBackend::new()), Hints::new())?;
//!     let window = video.create_window(WindowDesc::new("Hello", 800, 600))?;
//!     video.set_window_fullscreen(window, true)?;
//!
//!     while let Some(event) = video.poll_event() {
//!         println!("{:?}", event.event_type);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod error;
pub mod config;
pub mod display;
pub mod window;
pub mod events;
pub mod clipboard;
pub mod backend;
pub mod video;

pub use error::{VideoError, VideoResult};
pub use video::VideoSubsystem;

/// Common imports for vidkit users
pub mod prelude {
    pub use crate::{
        backend::{
            BackendCapabilities, BackendKind, FullscreenOp, FullscreenResult, HeadlessBackend, HeadlessDisplay,
            VideoBackend,
        },
        clipboard::{ClipboardCleanup, ClipboardData, ClipboardProducer},
        config::{Config, Hints, VideoConfig},
        display::{Display, DisplayDesc, DisplayMode, HdrProperties, Orientation, PixelFormat},
        events::{Event, EventArg, EventHandler, EventType, PlatformEvent, WindowEvent},
        foundation::{
            collections::{DisplayId, WindowId},
            math::{Point, Rect},
        },
        window::{FullscreenState, Window, WindowDesc, WindowFlags, WindowPosition},
        VideoError, VideoResult, VideoSubsystem,
    };
}
