//! spritify turns a rendered animation frame sequence into a sprite sheet and/or an animated GIF
//! by driving ImageMagick (`montage` and `convert`).
//!
//! The crate is host-independent:
//!
//! - Describe the output with [`SpriteSheetSettings`]
//! - Collect frames into a [`FrameSet`] (or let [`discover_frames`] find them)
//! - Run [`SpriteSheetInvoker::generate`] with a [`ProcessRunner`]
//!
//! Render hosts can call [`on_render_complete`] from their render-finished event instead.
#![forbid(unsafe_code)]

mod foundation;

/// ImageMagick command construction.
pub mod command;
/// Frame discovery and validation.
pub mod frames;
/// Render-completion entry point.
pub mod hook;
/// Sprite sheet invoker.
pub mod invoker;
/// Process execution seam.
pub mod runner;
pub mod settings;

pub use crate::foundation::color::Rgba;
pub use crate::foundation::error::{SpritifyError, SpritifyResult};

pub use crate::command::{ImageMagickTools, Tool, ToolInvocation, shell_quote};
pub use crate::frames::{FrameSet, discover_frames, discover_frames_filtered, frame_number};
pub use crate::hook::{RenderComplete, ViewArtifacts, on_render_complete, run_render_complete};
pub use crate::invoker::{GeneratedArtifacts, SpriteSheetInvoker};
pub use crate::runner::{
    ProcessOutput, ProcessRunner, RecordedCall, RecordingRunner, SystemRunner,
};
pub use crate::settings::{SpriteSheetSettings, TileSize};
