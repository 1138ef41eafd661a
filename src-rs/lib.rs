//! Screenshot annotation engine.
//!
//! A captured image is opened in an [`Editor`], annotated with highlights,
//! arrows and text through pointer and keyboard events, and exported at
//! native resolution to a file, the clipboard, or an upload collaborator.

pub mod annotation;
pub mod capture;
pub mod color;
pub mod config;
pub mod dataurl;
pub mod editor;
pub mod error;
pub mod export;
pub mod geometry;
pub mod handoff;
pub mod history;
pub mod list;
pub mod raster;
pub mod render;
pub mod upload;

pub use annotation::{Annotation, Cursor, CursorStyle, FontDescriptor, Tool};
pub use capture::{CaptureMode, CaptureProvider, CapturedImage, PageInfo};
pub use color::Color;
pub use config::EditorConfig;
pub use editor::{Editor, InteractionState, Notification, NotificationKind, TextKey};
pub use error::{EditorError, Result};
pub use geometry::{Point, Viewport};
