//! Sprite sheet configuration.
//!
//! [`SpriteSheetSettings`] is the single configuration entity. Hosts build it (from a UI, a JSON
//! file, CLI flags) and pass it into the invoker; nothing in the core mutates it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::foundation::color::Rgba;
use crate::foundation::error::{SpritifyError, SpritifyResult};

/// Fixed tile size override for `-geometry`.
///
/// Deserializes from `"WxH"` or `{"width": W, "height": H}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TileSize {
    pub width: u32,
    pub height: u32,
}

impl<'de> Deserialize<'de> for TileSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Obj { width: u32, height: u32 },
        }

        match Repr::deserialize(deserializer)? {
            Repr::Text(s) => s.parse().map_err(serde::de::Error::custom),
            Repr::Obj { width, height } => Ok(Self { width, height }),
        }
    }
}

impl FromStr for TileSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("tile size \"{s}\" must look like WIDTHxHEIGHT"))?;
        let width = w
            .parse()
            .map_err(|_| format!("invalid tile width \"{w}\""))?;
        let height = h
            .parse()
            .map_err(|_| format!("invalid tile height \"{h}\""))?;
        Ok(Self { width, height })
    }
}

impl fmt::Display for TileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpriteSheetSettings {
    /// Directory receiving the sprite sheet(s) and the GIF.
    pub output_dir: PathBuf,
    /// Sprite sheet file name. The GIF reuses its stem.
    pub filename: String,
    pub columns: u32,
    pub rows: u32,
    /// Gap in pixels added around every tile.
    pub padding: u32,
    /// Fill for padding and empty cells.
    pub background: Rgba,
    pub make_sheet: bool,
    pub make_gif: bool,
    /// Centiseconds per GIF frame.
    pub gif_delay: u32,
    /// GIF repeat count, 0 loops forever.
    pub gif_loop: u32,
    /// Build artifacts automatically when the host reports a finished render.
    pub auto_run: bool,
    /// Directory holding `montage`/`convert`. `None` resolves them through `PATH`.
    pub imagemagick_dir: Option<PathBuf>,
    pub quality: u8,
    /// Split the frames across this many sheet files.
    pub sheet_count: u32,
    pub tile_size: Option<TileSize>,
    /// Extension (without dot) of the rendered frames to collect.
    pub frame_extension: String,
    /// Emit one artifact set per view when the render uses multiple views.
    pub multiview: bool,
}

impl Default for SpriteSheetSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            filename: "sprites.png".to_owned(),
            columns: 8,
            rows: 8,
            padding: 2,
            background: Rgba::TRANSPARENT,
            make_sheet: true,
            make_gif: true,
            gif_delay: 4,
            gif_loop: 0,
            auto_run: true,
            imagemagick_dir: None,
            quality: 100,
            sheet_count: 1,
            tile_size: None,
            frame_extension: "png".to_owned(),
            multiview: true,
        }
    }
}

impl SpriteSheetSettings {
    pub fn validate(&self) -> SpritifyResult<()> {
        if self.columns == 0 || self.rows == 0 {
            return Err(SpritifyError::validation(
                "columns and rows must be at least 1",
            ));
        }
        if self.quality > 100 {
            return Err(SpritifyError::validation("quality must be within 0..=100"));
        }
        if self.sheet_count == 0 {
            return Err(SpritifyError::validation("sheet_count must be at least 1"));
        }
        if let Some(size) = self.tile_size
            && (size.width == 0 || size.height == 0)
        {
            return Err(SpritifyError::validation(
                "tile_size width/height must be non-zero",
            ));
        }
        if self.frame_extension.is_empty() || self.frame_extension.contains('.') {
            return Err(SpritifyError::validation(
                "frame_extension must be a bare extension such as \"png\"",
            ));
        }

        let (_, ext) = self.split_filename()?;
        if self.make_sheet && self.make_gif && ext.eq_ignore_ascii_case("gif") {
            return Err(SpritifyError::validation(
                "sprite sheet filename must not use the .gif extension when a GIF is also generated",
            ));
        }
        Ok(())
    }

    pub fn from_json_str(s: &str) -> SpritifyResult<Self> {
        serde_json::from_str(s).map_err(|e| SpritifyError::serde(e.to_string()))
    }

    pub fn from_json_path(path: &Path) -> SpritifyResult<Self> {
        use anyhow::Context as _;
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings '{}'", path.display()))?;
        serde_json::from_str(&s)
            .map_err(|e| SpritifyError::serde(format!("{}: {e}", path.display())))
    }

    pub fn to_json_pretty(&self) -> SpritifyResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| SpritifyError::serde(e.to_string()))
    }

    /// `-tile` argument, e.g. `4x2`.
    pub fn tile_spec(&self) -> String {
        format!("{}x{}", self.columns, self.rows)
    }

    /// `-geometry` argument: optional fixed tile size followed by the padding offset.
    pub fn geometry(&self) -> String {
        match self.tile_size {
            Some(size) => format!("{size}+{}+{}", self.padding, self.padding),
            None => format!("+{}+{}", self.padding, self.padding),
        }
    }

    pub fn tile_capacity(&self) -> u64 {
        u64::from(self.columns) * u64::from(self.rows)
    }

    /// Output path of sheet `index` out of `count` for the given view suffix.
    ///
    /// A single sheet is `stem<view>.ext`; split sheets are `stem-<index><view>.ext`.
    pub fn sheet_path(&self, view: &str, index: usize, count: usize) -> SpritifyResult<PathBuf> {
        let (stem, ext) = self.split_filename()?;
        let name = if count > 1 {
            format!("{stem}-{index}{view}.{ext}")
        } else {
            format!("{stem}{view}.{ext}")
        };
        Ok(self.output_dir.join(name))
    }

    pub fn gif_path(&self, view: &str) -> SpritifyResult<PathBuf> {
        let (stem, _) = self.split_filename()?;
        Ok(self.output_dir.join(format!("{stem}{view}.gif")))
    }

    /// `true` when `path` is a file this configuration writes for `view`: the sheet, any
    /// numbered page `stem-<index><view>.ext`, or the GIF, inside `output_dir`.
    pub fn is_artifact(&self, path: &Path, view: &str) -> bool {
        let Ok((stem, ext)) = self.split_filename() else {
            return false;
        };
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        if !same_dir(path.parent(), &self.output_dir) {
            return false;
        }
        if name == format!("{stem}{view}.gif") {
            return true;
        }
        let Some(rest) = name
            .strip_suffix(&format!("{view}.{ext}"))
            .and_then(|r| r.strip_prefix(stem))
        else {
            return false;
        };
        rest.is_empty()
            || rest
                .strip_prefix('-')
                .is_some_and(|i| !i.is_empty() && i.bytes().all(|b| b.is_ascii_digit()))
    }

    fn split_filename(&self) -> SpritifyResult<(&str, &str)> {
        let path = Path::new(&self.filename);
        if path.file_name().and_then(|n| n.to_str()) != Some(self.filename.as_str()) {
            return Err(SpritifyError::validation(format!(
                "filename \"{}\" must be a bare file name",
                self.filename
            )));
        }
        match self.filename.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Ok((stem, ext)),
            _ => Err(SpritifyError::validation(format!(
                "filename \"{}\" needs a stem and an extension, e.g. sprites.png",
                self.filename
            ))),
        }
    }
}

fn same_dir(parent: Option<&Path>, dir: &Path) -> bool {
    let Some(parent) = parent else {
        return false;
    };
    match (std::fs::canonicalize(parent), std::fs::canonicalize(dir)) {
        (Ok(a), Ok(b)) => a == b,
        _ => parent == dir,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        SpriteSheetSettings::default().validate().unwrap();
    }

    #[test]
    fn validation_catches_bad_values() {
        let base = SpriteSheetSettings::default();

        assert!(
            SpriteSheetSettings {
                columns: 0,
                ..base.clone()
            }
            .validate()
            .is_err()
        );
        assert!(
            SpriteSheetSettings {
                rows: 0,
                ..base.clone()
            }
            .validate()
            .is_err()
        );
        assert!(
            SpriteSheetSettings {
                quality: 101,
                ..base.clone()
            }
            .validate()
            .is_err()
        );
        assert!(
            SpriteSheetSettings {
                sheet_count: 0,
                ..base.clone()
            }
            .validate()
            .is_err()
        );
        assert!(
            SpriteSheetSettings {
                filename: "sprites".to_owned(),
                ..base.clone()
            }
            .validate()
            .is_err()
        );
        assert!(
            SpriteSheetSettings {
                filename: "out/sprites.png".to_owned(),
                ..base.clone()
            }
            .validate()
            .is_err()
        );
        assert!(
            SpriteSheetSettings {
                filename: "anim.gif".to_owned(),
                ..base.clone()
            }
            .validate()
            .is_err()
        );
        assert!(
            SpriteSheetSettings {
                frame_extension: ".png".to_owned(),
                ..base
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn geometry_and_tile_spec() {
        let mut s = SpriteSheetSettings {
            columns: 4,
            rows: 2,
            padding: 2,
            ..Default::default()
        };
        assert_eq!(s.tile_spec(), "4x2");
        assert_eq!(s.geometry(), "+2+2");

        s.tile_size = Some("64x32".parse().unwrap());
        assert_eq!(s.geometry(), "64x32+2+2");
        assert_eq!(s.tile_capacity(), 8);
    }

    #[test]
    fn output_naming_follows_split_and_view() {
        let s = SpriteSheetSettings {
            output_dir: PathBuf::from("/out"),
            ..Default::default()
        };
        assert_eq!(s.sheet_path("", 0, 1).unwrap(), PathBuf::from("/out/sprites.png"));
        assert_eq!(s.sheet_path("_L", 0, 1).unwrap(), PathBuf::from("/out/sprites_L.png"));
        assert_eq!(s.sheet_path("", 1, 3).unwrap(), PathBuf::from("/out/sprites-1.png"));
        assert_eq!(s.sheet_path("_R", 2, 3).unwrap(), PathBuf::from("/out/sprites-2_R.png"));
        assert_eq!(s.gif_path("_R").unwrap(), PathBuf::from("/out/sprites_R.gif"));
    }

    #[test]
    fn artifacts_are_recognized_by_name_and_dir() {
        let dir = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let s = SpriteSheetSettings {
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let at = |name: &str| dir.path().join(name);

        assert!(s.is_artifact(&at("sprites.png"), ""));
        assert!(s.is_artifact(&at("sprites-0.png"), ""));
        assert!(s.is_artifact(&at("sprites-12.png"), ""));
        assert!(s.is_artifact(&at("sprites.gif"), ""));
        assert!(s.is_artifact(&at("sprites-1_L.png"), "_L"));
        assert!(s.is_artifact(&at("sprites_L.gif"), "_L"));

        assert!(!s.is_artifact(&at("sprites-.png"), ""));
        assert!(!s.is_artifact(&at("sprites-a.png"), ""));
        assert!(!s.is_artifact(&at("0001.png"), ""));
        assert!(!s.is_artifact(&at("sprites_L.png"), ""));
        assert!(!s.is_artifact(&other.path().join("sprites.png"), ""));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let s = SpriteSheetSettings::from_json_str(
            r##"{"columns": 4, "rows": 2, "background": "#ffffff", "tile_size": {"width": 16, "height": 16}}"##,
        )
        .unwrap();
        assert_eq!(s.columns, 4);
        assert_eq!(s.rows, 2);
        assert_eq!(s.background, Rgba::rgba(1.0, 1.0, 1.0, 1.0));
        assert_eq!(s.filename, "sprites.png");
        assert_eq!(s.tile_size, Some(TileSize { width: 16, height: 16 }));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = SpriteSheetSettings::from_json_str(r#"{"colums": 4}"#).unwrap_err();
        assert!(matches!(err, SpritifyError::Serde(_)));
    }

    #[test]
    fn json_round_trip_preserves_settings() {
        let s = SpriteSheetSettings {
            gif_delay: 10,
            imagemagick_dir: Some(PathBuf::from("/usr/local/bin")),
            ..Default::default()
        };
        let back = SpriteSheetSettings::from_json_str(&s.to_json_pretty().unwrap()).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn tile_size_accepts_string_form_in_json() {
        let s = SpriteSheetSettings::from_json_str(r#"{"tile_size": "64x32"}"#).unwrap();
        assert_eq!(s.tile_size, Some(TileSize { width: 64, height: 32 }));
        assert!(SpriteSheetSettings::from_json_str(r#"{"tile_size": "64"}"#).is_err());
    }

    #[test]
    fn tile_size_parse_errors() {
        assert!("64".parse::<TileSize>().is_err());
        assert!("ax2".parse::<TileSize>().is_err());
        assert_eq!("8X4".parse::<TileSize>().unwrap().to_string(), "8x4");
    }
}
