//! Rendered frame sequences.
//!
//! Frames are opaque files owned by the render host. This module only finds them, checks that
//! they form a usable sequence, and keeps them in playback order.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::foundation::error::{SpritifyError, SpritifyResult};

/// Container formats the host may render to that cannot be tiled frame by frame.
const VIDEO_EXTENSIONS: &[&str] = &[
    "avi", "flv", "m4v", "mkv", "mov", "mp4", "mpeg", "mpg", "ogv", "webm", "wmv",
];

/// Ordered, non-empty list of frame files. Order is playback order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameSet {
    paths: Vec<PathBuf>,
}

impl FrameSet {
    /// Validate an explicit frame list, keeping the given order.
    pub fn new(paths: Vec<PathBuf>) -> SpritifyResult<Self> {
        Self::new_for_view(paths, "")
    }

    /// Like [`FrameSet::new`], for frames whose stems end in a view suffix (`frame0001_L.png`).
    pub fn new_for_view(paths: Vec<PathBuf>, view: &str) -> SpritifyResult<Self> {
        if paths.is_empty() {
            return Err(SpritifyError::invalid_frames("no frames given"));
        }

        let mut seen = HashSet::with_capacity(paths.len());
        for p in &paths {
            if is_video_container(p) {
                return Err(SpritifyError::invalid_frames(format!(
                    "'{}' is a video file; render still image frames instead",
                    p.display()
                )));
            }
            if !p.is_file() {
                return Err(SpritifyError::invalid_frames(format!(
                    "frame '{}' does not exist or is not a file",
                    p.display()
                )));
            }
            if !seen.insert(p.as_path()) {
                return Err(SpritifyError::invalid_frames(format!(
                    "frame '{}' is listed more than once",
                    p.display()
                )));
            }
        }

        // Numbered frames must step by one, in either direction, for the whole list.
        let numbers: Option<Vec<u64>> = paths.iter().map(|p| frame_number(p, view)).collect();
        if let Some(numbers) = numbers
            && numbers.len() > 1
        {
            let descending = numbers[1] < numbers[0];
            for (pair, window) in paths.windows(2).zip(numbers.windows(2)) {
                let expected = if descending {
                    window[0].checked_sub(1)
                } else {
                    window[0].checked_add(1)
                };
                if expected != Some(window[1]) {
                    return Err(SpritifyError::invalid_frames(format!(
                        "frame sequence is not contiguous: '{}' ({}) is followed by '{}' ({})",
                        pair[0].display(),
                        window[0],
                        pair[1].display(),
                        window[1]
                    )));
                }
            }
        }

        Ok(Self { paths })
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Split into consecutive pages of `ceil(len / sheet_count)` frames, capped at `capacity`.
    ///
    /// When the cap applies there are more pages than `sheet_count`, so no page ever overflows
    /// its tile grid.
    pub fn pages(&self, sheet_count: u32, capacity: u64) -> Vec<&[PathBuf]> {
        let count = sheet_count.max(1) as usize;
        let capacity = usize::try_from(capacity).unwrap_or(usize::MAX).max(1);
        let per_sheet = self.paths.len().div_ceil(count).clamp(1, capacity);
        self.paths.chunks(per_sheet).collect()
    }
}

/// Collect the frames for one view from a render output directory (recursively).
///
/// Files match when their name ends with `<view>.<extension>`; the extension compares
/// case-insensitively. Frames are ordered by trailing frame number, or by file name when some
/// frames carry no number.
pub fn discover_frames(render_dir: &Path, view: &str, extension: &str) -> SpritifyResult<FrameSet> {
    discover_frames_filtered(render_dir, view, extension, |_| false)
}

/// [`discover_frames`], dropping every file for which `skip` returns `true`.
///
/// Hosts skip their own artifacts here so sheets from a previous run written into the render
/// directory are not picked up as frames.
pub fn discover_frames_filtered(
    render_dir: &Path,
    view: &str,
    extension: &str,
    skip: impl Fn(&Path) -> bool,
) -> SpritifyResult<FrameSet> {
    if VIDEO_EXTENSIONS
        .iter()
        .any(|v| v.eq_ignore_ascii_case(extension))
    {
        return Err(SpritifyError::invalid_frames(format!(
            "'.{extension}' is a video container; set the render output to an image format such as PNG"
        )));
    }
    if !render_dir.is_dir() {
        return Err(SpritifyError::invalid_frames(format!(
            "render output directory '{}' does not exist",
            render_dir.display()
        )));
    }

    let mut frames: Vec<PathBuf> = WalkDir::new(render_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| matches_view(p, view, extension))
        .filter(|p| !skip(p))
        .collect();

    tracing::debug!(
        dir = %render_dir.display(),
        view,
        count = frames.len(),
        "discovered frames"
    );

    if frames.is_empty() {
        return Err(SpritifyError::invalid_frames(format!(
            "there are 0 '.{extension}' images in '{}'; set the render output format to {} and render the animation first",
            render_dir.display(),
            extension.to_uppercase()
        )));
    }

    if frames.iter().all(|p| frame_number(p, view).is_some()) {
        frames.sort_by_key(|p| frame_number(p, view));
    }

    FrameSet::new_for_view(frames, view)
}

/// Trailing frame number of the file stem after stripping the view suffix.
pub fn frame_number(path: &Path, view: &str) -> Option<u64> {
    let stem = path.file_stem()?.to_str()?;
    let stem = stem.strip_suffix(view)?;
    let digits_at = stem
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    stem[digits_at..].parse().ok()
}

fn matches_view(path: &Path, view: &str, extension: &str) -> bool {
    let ext_ok = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension));
    let stem_ok = path
        .file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.ends_with(view));
    ext_ok && stem_ok
}

fn is_video_container(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| VIDEO_EXTENSIONS.iter().any(|v| v.eq_ignore_ascii_case(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let p = dir.join(name);
        std::fs::write(&p, b"").unwrap();
        p
    }

    #[test]
    fn frame_number_reads_trailing_digits() {
        assert_eq!(frame_number(Path::new("/r/frame_0012.png"), ""), Some(12));
        assert_eq!(frame_number(Path::new("/r/0007_L.png"), "_L"), Some(7));
        assert_eq!(frame_number(Path::new("/r/0007_L.png"), ""), None);
        assert_eq!(frame_number(Path::new("/r/cover.png"), ""), None);
    }

    #[test]
    fn empty_list_is_invalid() {
        let err = FrameSet::new(vec![]).unwrap_err();
        assert!(matches!(err, SpritifyError::InvalidFrameSet(_)));
    }

    #[test]
    fn rejects_gaps_duplicates_missing_and_video() {
        let dir = tempfile::tempdir().unwrap();
        let f1 = touch(dir.path(), "f0001.png");
        let f3 = touch(dir.path(), "f0003.png");
        let clip = touch(dir.path(), "clip.mp4");

        for paths in [
            vec![f1.clone(), f3.clone()],
            vec![f1.clone(), f1.clone()],
            vec![f1.clone(), dir.path().join("f0002.png")],
            vec![clip],
        ] {
            let err = FrameSet::new(paths).unwrap_err();
            assert!(matches!(err, SpritifyError::InvalidFrameSet(_)), "{err}");
        }
    }

    #[test]
    fn unnumbered_frames_keep_given_order() {
        let dir = tempfile::tempdir().unwrap();
        let b = touch(dir.path(), "b.png");
        let a = touch(dir.path(), "a.png");
        let set = FrameSet::new(vec![b.clone(), a.clone()]).unwrap();
        assert_eq!(set.paths(), &[b, a]);
    }

    #[test]
    fn discovery_walks_nested_dirs_and_filters_views() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir_all(&nested).unwrap();
        touch(dir.path(), "frame_10.png");
        touch(dir.path(), "frame_9.png");
        touch(&nested, "frame_11.PNG");
        touch(dir.path(), "frame_9_L.png");
        touch(dir.path(), "notes.txt");

        let set = discover_frames(dir.path(), "", "png").unwrap();
        let names: Vec<_> = set
            .paths()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        // frame_9_L.png carries no trailing number for the unsuffixed view: name order applies.
        assert_eq!(names.len(), 4);

        let left = discover_frames(dir.path(), "_L", "png").unwrap();
        assert_eq!(left.len(), 1);
    }

    #[test]
    fn discovery_sorts_numerically() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "frame_10.png");
        touch(dir.path(), "frame_9.png");
        touch(dir.path(), "frame_11.png");
        let set = discover_frames(dir.path(), "", "png").unwrap();
        assert_eq!(
            set.paths(),
            &[
                dir.path().join("frame_9.png"),
                dir.path().join("frame_10.png"),
                dir.path().join("frame_11.png"),
            ]
        );
    }

    #[test]
    fn discovery_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            discover_frames(dir.path(), "", "png").unwrap_err(),
            SpritifyError::InvalidFrameSet(_)
        ));
        assert!(matches!(
            discover_frames(&dir.path().join("missing"), "", "png").unwrap_err(),
            SpritifyError::InvalidFrameSet(_)
        ));
        assert!(matches!(
            discover_frames(dir.path(), "", "mp4").unwrap_err(),
            SpritifyError::InvalidFrameSet(_)
        ));
    }

    #[test]
    fn discovery_skips_filtered_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "0001.png");
        touch(dir.path(), "0002.png");
        let sheet = touch(dir.path(), "sprites.png");

        let set = discover_frames_filtered(dir.path(), "", "png", |p| p == sheet).unwrap();
        assert_eq!(
            set.paths(),
            &[dir.path().join("0001.png"), dir.path().join("0002.png")]
        );
    }

    #[test]
    fn pages_split_by_ceiling() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<_> = (1..=5)
            .map(|i| touch(dir.path(), &format!("f{i}.png")))
            .collect();
        let set = FrameSet::new(paths).unwrap();
        let sizes = |pages: Vec<&[PathBuf]>| pages.iter().map(|p| p.len()).collect::<Vec<_>>();
        assert_eq!(sizes(set.pages(2, 64)), vec![3, 2]);
        assert_eq!(sizes(set.pages(1, 64)), vec![5]);
        assert_eq!(sizes(set.pages(4, 64)), vec![2, 2, 1]);
    }

    #[test]
    fn pages_never_exceed_grid_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<_> = (1..=70)
            .map(|i| touch(dir.path(), &format!("{i:04}.png")))
            .collect();
        let set = FrameSet::new(paths).unwrap();
        let sizes: Vec<_> = set.pages(1, 64).iter().map(|p| p.len()).collect();
        assert_eq!(sizes, vec![64, 6]);
        let sizes: Vec<_> = set.pages(2, 64).iter().map(|p| p.len()).collect();
        assert_eq!(sizes, vec![35, 35]);
        let sizes: Vec<_> = set.pages(1, 0).iter().map(|p| p.len()).collect();
        assert_eq!(sizes.len(), 70);
    }

    #[test]
    fn reverse_playback_order_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<_> = [3, 2, 1]
            .iter()
            .map(|i| touch(dir.path(), &format!("f{i:04}.png")))
            .collect();
        let set = FrameSet::new(paths.clone()).unwrap();
        assert_eq!(set.paths(), paths.as_slice());

        let mixed = vec![paths[1].clone(), paths[0].clone(), paths[2].clone()];
        let err = FrameSet::new(mixed).unwrap_err();
        assert!(matches!(err, SpritifyError::InvalidFrameSet(_)));
    }

    #[test]
    fn extreme_frame_numbers_do_not_wrap() {
        let dir = tempfile::tempdir().unwrap();
        let last = touch(dir.path(), &format!("f{}.png", u64::MAX));
        let first = touch(dir.path(), "f0.png");

        let err = FrameSet::new(vec![last.clone(), first.clone()]).unwrap_err();
        assert!(matches!(err, SpritifyError::InvalidFrameSet(_)));
        let err = FrameSet::new(vec![first, last]).unwrap_err();
        assert!(matches!(err, SpritifyError::InvalidFrameSet(_)));
    }
}
