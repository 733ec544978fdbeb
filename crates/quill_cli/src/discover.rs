//! SVG file discovery for batch thumbnail generation

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// An SVG file found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvgFile {
    pub path: PathBuf,
    /// Directory relative to the scan root, empty for top-level files
    pub relative_dir: PathBuf,
    /// File name without its extension
    pub display_name: String,
}

impl SvgFile {
    /// Output path for this file's thumbnail under `out_dir`
    pub fn thumbnail_path(&self, out_dir: &Path) -> PathBuf {
        out_dir
            .join(&self.relative_dir)
            .join(format!("{}.png", self.display_name))
    }
}

/// Whether `path` has an `.svg` extension, ignoring case
pub fn is_svg(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"))
}

/// Display name derived from the file name
pub fn display_name(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    (!stem.is_empty()).then(|| stem.to_string())
}

/// Collect SVG files under `root`, walking each directory in file-name order
pub fn discover(root: &Path, recursive: bool) -> Result<Vec<SvgFile>> {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files = Vec::new();

    for entry in WalkDir::new(root).max_depth(max_depth).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() || !is_svg(entry.path()) {
            continue;
        }
        let Some(display_name) = display_name(entry.path()) else {
            continue;
        };
        let relative_dir = entry
            .path()
            .strip_prefix(root)
            .ok()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default();
        files.push(SvgFile {
            path: entry.into_path(),
            relative_dir,
            display_name,
        });
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_svg_extension_ignores_case() {
        assert!(is_svg(Path::new("icons/home.svg")));
        assert!(is_svg(Path::new("LOGO.SVG")));
        assert!(is_svg(Path::new("mixed.SvG")));
        assert!(!is_svg(Path::new("image.png")));
        assert!(!is_svg(Path::new("svg")));
        assert!(!is_svg(Path::new("archive.svg.gz")));
    }

    #[test]
    fn test_display_name_strips_extension() {
        assert_eq!(display_name(Path::new("a/b/arrow-left.svg")).as_deref(), Some("arrow-left"));
        assert_eq!(display_name(Path::new("v1.2.svg")).as_deref(), Some("v1.2"));
    }

    #[test]
    fn test_thumbnail_path_mirrors_subdirectories() {
        let file = SvgFile {
            path: PathBuf::from("in/ui/close.svg"),
            relative_dir: PathBuf::from("ui"),
            display_name: "close".into(),
        };
        assert_eq!(
            file.thumbnail_path(Path::new("out")),
            PathBuf::from("out/ui/close.png")
        );
    }

    #[test]
    fn test_discover_filters_and_recurses() {
        let root = std::env::temp_dir().join(format!("quill-discover-{}", std::process::id()));
        let nested = root.join("nested");
        fs::create_dir_all(&nested).unwrap();
        fs::write(root.join("b.svg"), "<svg/>").unwrap();
        fs::write(root.join("A.SVG"), "<svg/>").unwrap();
        fs::write(root.join("notes.txt"), "").unwrap();
        fs::write(nested.join("c.svg"), "<svg/>").unwrap();

        let flat = discover(&root, false).unwrap();
        let names: Vec<_> = flat.iter().map(|f| f.display_name.as_str()).collect();
        assert_eq!(names, ["A", "b"]);

        let deep = discover(&root, true).unwrap();
        assert_eq!(deep.len(), 3);
        let nested_file = deep.iter().find(|f| f.display_name == "c").unwrap();
        assert_eq!(nested_file.relative_dir, PathBuf::from("nested"));
        assert_eq!(deep[0].relative_dir, PathBuf::new());

        assert!(discover(&root.join("missing"), false).is_err());

        fs::remove_dir_all(&root).unwrap();
    }
}
