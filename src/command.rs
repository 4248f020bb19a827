//! ImageMagick command lines.
//!
//! Invocations are built as argv vectors and never pass through a shell. The quoted rendering in
//! [`ToolInvocation::display_command`] exists for logs and dry runs only.

use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::settings::SpriteSheetSettings;

/// Bit depth forced on the sprite sheet.
const SHEET_DEPTH: &str = "8";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tool {
    /// Tiles frames into a grid.
    Montage,
    /// Encodes the animated GIF.
    Convert,
}

impl Tool {
    pub fn name(self) -> &'static str {
        match self {
            Self::Montage => "montage",
            Self::Convert => "convert",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where the ImageMagick executables live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageMagickTools {
    bin_dir: Option<PathBuf>,
}

impl ImageMagickTools {
    pub fn new(bin_dir: Option<PathBuf>) -> Self {
        Self { bin_dir }
    }

    pub fn from_settings(settings: &SpriteSheetSettings) -> Self {
        Self::new(settings.imagemagick_dir.clone())
    }

    /// Program path for `tool`: inside the configured directory, or the bare name for a `PATH`
    /// lookup.
    pub fn program(&self, tool: Tool) -> PathBuf {
        let file = format!("{}{}", tool.name(), std::env::consts::EXE_SUFFIX);
        match &self.bin_dir {
            Some(dir) => dir.join(file),
            None => PathBuf::from(file),
        }
    }
}

/// One external process call: program, argv and the artifact it writes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolInvocation {
    pub tool: Tool,
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub output: PathBuf,
}

impl ToolInvocation {
    /// Sprite sheet: `montage -depth 8 -tile CxR -geometry G -background B -quality Q frames... out`.
    pub fn montage(
        tools: &ImageMagickTools,
        settings: &SpriteSheetSettings,
        frames: &[PathBuf],
        output: &Path,
    ) -> Self {
        let mut args: Vec<OsString> = [
            "-depth",
            SHEET_DEPTH,
            "-tile",
            &settings.tile_spec(),
            "-geometry",
            &settings.geometry(),
            "-background",
            &settings.background.to_imagemagick(),
            "-quality",
            &settings.quality.to_string(),
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.extend(frames.iter().map(|f| f.clone().into_os_string()));
        args.push(output.as_os_str().to_owned());

        Self {
            tool: Tool::Montage,
            program: tools.program(Tool::Montage),
            args,
            output: output.to_path_buf(),
        }
    }

    /// Animated GIF: `convert -delay D -dispose background -loop L frames... out.gif`.
    ///
    /// Only the GIF settings apply; tiling, padding and background do not.
    pub fn gif(
        tools: &ImageMagickTools,
        settings: &SpriteSheetSettings,
        frames: &[PathBuf],
        output: &Path,
    ) -> Self {
        let mut args: Vec<OsString> = [
            "-delay",
            &settings.gif_delay.to_string(),
            "-dispose",
            "background",
            "-loop",
            &settings.gif_loop.to_string(),
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.extend(frames.iter().map(|f| f.clone().into_os_string()));
        args.push(output.as_os_str().to_owned());

        Self {
            tool: Tool::Convert,
            program: tools.program(Tool::Convert),
            args,
            output: output.to_path_buf(),
        }
    }

    /// POSIX-shell-quoted command line, suitable for copy/paste.
    pub fn display_command(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(shell_quote)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_command())
    }
}

/// Quote one argument for a POSIX shell. Plain words are returned unchanged.
pub fn shell_quote(arg: &OsStr) -> Cow<'_, str> {
    let s = arg.to_string_lossy();
    let plain = !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./+=:,@%".contains(c));
    if plain {
        return s;
    }
    Cow::Owned(format!("'{}'", s.replace('\'', r"'\''")))
}
