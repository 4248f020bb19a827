//! The sprite sheet invoker: frames + settings in, artifacts out.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::command::{ImageMagickTools, Tool, ToolInvocation};
use crate::foundation::error::{SpritifyError, SpritifyResult};
use crate::frames::FrameSet;
use crate::runner::ProcessRunner;
use crate::settings::SpriteSheetSettings;

/// Files written by one successful [`SpriteSheetInvoker::generate`] call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GeneratedArtifacts {
    pub sheets: Vec<PathBuf>,
    pub gif: Option<PathBuf>,
}

impl GeneratedArtifacts {
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.sheets
            .iter()
            .chain(self.gif.iter())
            .map(PathBuf::as_path)
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty() && self.gif.is_none()
    }
}

/// Builds ImageMagick invocations and runs them one at a time through a [`ProcessRunner`].
#[derive(Debug)]
pub struct SpriteSheetInvoker<R> {
    runner: R,
}

impl<R: ProcessRunner> SpriteSheetInvoker<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Build every invocation `generate` would run, without probing or running anything.
    ///
    /// Sheets come first (one per page, never more frames than the tile grid holds), followed by
    /// the GIF.
    pub fn plan(
        &self,
        settings: &SpriteSheetSettings,
        frames: &FrameSet,
        view: &str,
    ) -> SpritifyResult<Vec<ToolInvocation>> {
        settings.validate()?;
        let tools = ImageMagickTools::from_settings(settings);
        let mut plan = Vec::new();

        if settings.make_sheet {
            let pages = frames.pages(settings.sheet_count, settings.tile_capacity());
            if pages.len() > settings.sheet_count as usize {
                tracing::warn!(
                    sheets = pages.len(),
                    requested = settings.sheet_count,
                    columns = settings.columns,
                    rows = settings.rows,
                    "tile grid is smaller than the frames per sheet; splitting into extra sheets"
                );
            }
            let count = pages.len();
            for (index, page) in pages.into_iter().enumerate() {
                let out = settings.sheet_path(view, index, count)?;
                plan.push(ToolInvocation::montage(&tools, settings, page, &out));
            }
        }

        if settings.make_gif {
            let out = settings.gif_path(view)?;
            plan.push(ToolInvocation::gif(&tools, settings, frames.paths(), &out));
        }

        Ok(plan)
    }

    /// Validate inputs, check every required binary, then run the planned invocations in order.
    ///
    /// Stops at the first failing process. Existing outputs are never removed up front; each tool
    /// overwrites its own artifact.
    #[tracing::instrument(skip(self, settings, frames), fields(frames = frames.len()))]
    pub fn generate(
        &self,
        settings: &SpriteSheetSettings,
        frames: &FrameSet,
        view: &str,
    ) -> SpritifyResult<GeneratedArtifacts> {
        let plan = self.plan(settings, frames, view)?;

        let programs: BTreeSet<&Path> = plan.iter().map(|inv| inv.program.as_path()).collect();
        for program in programs {
            if !self.runner.is_available(program) {
                return Err(SpritifyError::binary_not_found(program));
            }
        }

        if !plan.is_empty() {
            ensure_output_writable(&settings.output_dir, plan.iter().map(|inv| &inv.output))?;
        }

        let mut artifacts = GeneratedArtifacts::default();
        for inv in &plan {
            tracing::debug!(command = %inv.display_command(), "running {}", inv.tool);
            let out = self.runner.run(&inv.program, &inv.args)?;
            if !out.success() {
                return Err(SpritifyError::tool_failure(
                    inv.tool.name(),
                    out.status_text(),
                    out.stderr_text(),
                ));
            }
            tracing::info!(path = %inv.output.display(), "wrote {}", artifact_kind(inv.tool));
            match inv.tool {
                Tool::Montage => artifacts.sheets.push(inv.output.clone()),
                Tool::Convert => artifacts.gif = Some(inv.output.clone()),
            }
        }

        Ok(artifacts)
    }

    /// Convenience for hosts holding a plain path list: validates it into a [`FrameSet`] first.
    pub fn generate_from_paths(
        &self,
        settings: &SpriteSheetSettings,
        frame_paths: Vec<PathBuf>,
    ) -> SpritifyResult<GeneratedArtifacts> {
        let frames = FrameSet::new(frame_paths)?;
        self.generate(settings, &frames, "")
    }
}

fn artifact_kind(tool: Tool) -> &'static str {
    match tool {
        Tool::Montage => "sprite sheet",
        Tool::Convert => "animated GIF",
    }
}

/// Create the output directory and refuse read-only artifacts before any process runs.
fn ensure_output_writable<'a>(
    dir: &Path,
    outputs: impl IntoIterator<Item = &'a PathBuf>,
) -> SpritifyResult<()> {
    std::fs::create_dir_all(dir).map_err(|e| SpritifyError::unwritable(dir, e.to_string()))?;
    let meta = std::fs::metadata(dir).map_err(|e| SpritifyError::unwritable(dir, e.to_string()))?;
    if meta.permissions().readonly() {
        return Err(SpritifyError::unwritable(dir, "directory is read-only"));
    }
    for out in outputs {
        match std::fs::metadata(out) {
            Ok(meta) if meta.is_dir() => {
                return Err(SpritifyError::unwritable(out, "path is a directory"));
            }
            Ok(meta) if meta.permissions().readonly() => {
                return Err(SpritifyError::unwritable(out, "existing file is read-only"));
            }
            _ => {}
        }
    }
    Ok(())
}
