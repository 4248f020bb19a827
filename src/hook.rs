//! Render-completion entry point for hosts.
//!
//! The host owns the event subscription and calls in here once a render finishes.

use std::path::PathBuf;

use crate::foundation::error::SpritifyResult;
use crate::frames::discover_frames_filtered;
use crate::invoker::{GeneratedArtifacts, SpriteSheetInvoker};
use crate::runner::ProcessRunner;
use crate::settings::SpriteSheetSettings;

/// A finished animation render as reported by the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderComplete {
    /// Directory the host wrote the frames into.
    pub render_dir: PathBuf,
    /// View file suffixes (e.g. `_L`, `_R`) for multiview renders; empty for a single view.
    pub views: Vec<String>,
}

impl RenderComplete {
    pub fn new(render_dir: impl Into<PathBuf>) -> Self {
        Self {
            render_dir: render_dir.into(),
            views: Vec::new(),
        }
    }

    pub fn with_views<I, S>(mut self, views: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.views = views.into_iter().map(Into::into).collect();
        self
    }

    /// View suffixes to build for: the reported views, or a single unsuffixed view.
    pub fn view_suffixes(&self, multiview: bool) -> Vec<String> {
        if multiview && !self.views.is_empty() {
            self.views.clone()
        } else {
            vec![String::new()]
        }
    }
}

/// Artifacts for one view suffix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewArtifacts {
    pub view: String,
    pub artifacts: GeneratedArtifacts,
}

/// Automatic path: does nothing unless `auto_run` is enabled.
#[tracing::instrument(skip(invoker, settings), fields(render_dir = %event.render_dir.display()))]
pub fn on_render_complete<R: ProcessRunner>(
    invoker: &SpriteSheetInvoker<R>,
    settings: &SpriteSheetSettings,
    event: &RenderComplete,
) -> SpritifyResult<Vec<ViewArtifacts>> {
    if !settings.auto_run {
        tracing::debug!("auto_run disabled; skipping");
        return Ok(Vec::new());
    }
    run_render_complete(invoker, settings, event)
}

/// Manual path: always builds, regardless of `auto_run`.
pub fn run_render_complete<R: ProcessRunner>(
    invoker: &SpriteSheetInvoker<R>,
    settings: &SpriteSheetSettings,
    event: &RenderComplete,
) -> SpritifyResult<Vec<ViewArtifacts>> {
    settings.validate()?;
    let mut out = Vec::new();
    for view in event.view_suffixes(settings.multiview) {
        let frames = discover_frames_filtered(
            &event.render_dir,
            &view,
            &settings.frame_extension,
            |p| settings.is_artifact(p, &view),
        )?;
        tracing::info!(view = %view, frames = frames.len(), "building artifacts");
        let artifacts = invoker.generate(settings, &frames, &view)?;
        out.push(ViewArtifacts { view, artifacts });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::RecordingRunner;

    #[test]
    fn auto_run_off_skips_everything() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SpriteSheetSettings {
            auto_run: false,
            ..Default::default()
        };
        let invoker = SpriteSheetInvoker::new(RecordingRunner::new());
        // The empty render dir would fail discovery if the hook got that far.
        let out = on_render_complete(&invoker, &settings, &RenderComplete::new(dir.path())).unwrap();
        assert!(out.is_empty());
        assert!(invoker.runner().calls().is_empty());
    }

    #[test]
    fn previous_sheet_in_render_dir_is_not_a_frame() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["0001.png", "0002.png", "sprites.png"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let settings = SpriteSheetSettings {
            output_dir: dir.path().to_path_buf(),
            make_gif: false,
            ..Default::default()
        };
        let invoker = SpriteSheetInvoker::new(RecordingRunner::new());
        run_render_complete(&invoker, &settings, &RenderComplete::new(dir.path())).unwrap();

        let args = invoker.runner().calls()[0].args_lossy();
        let sheet = dir.path().join("sprites.png").display().to_string();
        assert_eq!(args.iter().filter(|a| **a == sheet).count(), 1);
        assert_eq!(args.last(), Some(&sheet));
    }

    #[test]
    fn single_view_when_multiview_disabled() {
        let event = RenderComplete::new("/r").with_views(["_L", "_R"]);
        assert_eq!(event.view_suffixes(false), vec![String::new()]);
        assert_eq!(event.view_suffixes(true), vec!["_L".to_owned(), "_R".to_owned()]);
        assert_eq!(RenderComplete::new("/r").view_suffixes(true), vec![String::new()]);
    }
}
