//! Quill configuration file handling
//!
//! `quill.toml` supplies defaults for the `render` and `thumbnails`
//! commands. Every key is optional and command-line flags take precedence.

use anyhow::{Context, Result};
use quill_core::{parse_color, Color};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// File name looked up in the working directory
pub const CONFIG_FILE: &str = "quill.toml";

/// Top-level `quill.toml`
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct QuillConfig {
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub thumbnails: ThumbnailConfig,
}

/// `[render]` table
#[derive(Debug, Deserialize, Serialize)]
pub struct RenderConfig {
    /// Output width for documents without an intrinsic size
    #[serde(default = "default_width")]
    pub width: u32,
    /// Output height for documents without an intrinsic size
    #[serde(default = "default_height")]
    pub height: u32,
    /// Background color in any SVG color syntax
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default = "default_true")]
    pub antialias: bool,
}

fn default_width() -> u32 {
    quill_svg::DEFAULT_RENDER_SIZE.0
}

fn default_height() -> u32 {
    quill_svg::DEFAULT_RENDER_SIZE.1
}

fn default_background() -> String {
    "transparent".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            background: default_background(),
            antialias: true,
        }
    }
}

impl RenderConfig {
    /// Parse the configured background color
    pub fn background_color(&self) -> Result<Color> {
        parse_color(&self.background)
            .with_context(|| format!("Invalid background color '{}'", self.background))
    }
}

/// `[thumbnails]` table
#[derive(Debug, Deserialize, Serialize)]
pub struct ThumbnailConfig {
    /// Edge length of the square thumbnails
    #[serde(default = "default_thumbnail_size")]
    pub size: u32,
    /// Output directory, relative to the working directory
    #[serde(default = "default_output")]
    pub output: String,
    /// Descend into subdirectories
    #[serde(default)]
    pub recursive: bool,
}

fn default_thumbnail_size() -> u32 {
    quill_svg::THUMBNAIL_SIZE
}

fn default_output() -> String {
    "thumbnails".to_string()
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            size: default_thumbnail_size(),
            output: default_output(),
            recursive: false,
        }
    }
}

impl QuillConfig {
    /// Load an explicitly named configuration file, which must exist
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Load `quill.toml` from a directory, or defaults when there is none
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(Self::default());
        }
        Self::load(&config_path)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: QuillConfig = toml::from_str(content)?;
        if config.thumbnails.size == 0 {
            anyhow::bail!("[thumbnails] size must be at least 1");
        }
        Ok(config)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = QuillConfig::from_toml("").unwrap();
        assert_eq!((config.render.width, config.render.height), (200, 200));
        assert_eq!(config.render.background, "transparent");
        assert!(config.render.antialias);
        assert_eq!(config.thumbnails.size, 64);
        assert_eq!(config.thumbnails.output, "thumbnails");
        assert!(!config.thumbnails.recursive);
    }

    #[test]
    fn test_partial_tables_keep_other_defaults() {
        let config = QuillConfig::from_toml(
            r##"
            [render]
            width = 512
            background = "#ffffff"

            [thumbnails]
            recursive = true
            "##,
        )
        .unwrap();
        assert_eq!(config.render.width, 512);
        assert_eq!(config.render.height, 200);
        assert_eq!(config.render.background_color().unwrap(), Color::WHITE);
        assert!(config.render.antialias);
        assert_eq!(config.thumbnails.size, 64);
        assert!(config.thumbnails.recursive);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(QuillConfig::from_toml("[render]\nwidth = \"wide\"").is_err());
        assert!(QuillConfig::from_toml("[thumbnails]\nsize = 0").is_err());

        let config = QuillConfig::from_toml("[render]\nbackground = \"bogus\"").unwrap();
        assert!(config.render.background_color().is_err());
    }

    #[test]
    fn test_serialized_defaults_parse_back() {
        let text = QuillConfig::default().to_toml().unwrap();
        assert!(text.contains("[render]"));
        let config = QuillConfig::from_toml(&text).unwrap();
        assert_eq!(config.thumbnails.size, 64);
    }

    #[test]
    fn test_missing_file_means_defaults() {
        let dir = std::env::temp_dir().join("quill-config-test-missing");
        let config = QuillConfig::load_from_dir(&dir).unwrap();
        assert_eq!(config.render.width, 200);
    }
}
