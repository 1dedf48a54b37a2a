//! Tool configuration.
//!
//! An optional `fixgen.toml` supplies default generation options and the
//! default output location for the CLI. Values are layered: stock defaults,
//! then the config file, then command-line flags.
//!
//! ## Config File Location
//!
//! `--config <path>` names the file explicitly. Without it, `fixgen.toml` in
//! the working directory is used when present; otherwise stock defaults
//! apply.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [output]
//! dir = "."                 # Where `generate` writes files
//! prefix = "generated"      # File name prefix
//!
//! [options]
//! background_color = "#f0f0f0"
//! text_color = "#333333"
//! padding = 40             # 0-4096
//! quality = 85              # JPEG quality (1-100)
//! fps = 12                  # MP4 frame rate
//! duration_secs = 2         # MP4 length
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse: override just the values you want:
//!
//! ```toml
//! [options]
//! shadow = true
//! ```
//!
//! Unknown keys are ignored with a warning, so a config written for a newer
//! version still loads.

use crate::layout::MAX_CANVAS;
use crate::options::{Options, parse_color};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_CONFIG_FILE: &str = "fixgen.toml";
pub const MAX_FONT_SIZE: u32 = 1024;
pub const MAX_PADDING: u32 = 4096;
pub const MAX_LINE_SPACING: u32 = 1024;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Contents of `fixgen.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixgenConfig {
    /// Default output location for `generate`.
    pub output: OutputConfig,
    /// Default generation options.
    pub options: Options,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: String,
    pub prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: ".".to_string(),
            prefix: "generated".to_string(),
        }
    }
}

impl FixgenConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let o = &self.options;
        if !(1..=100).contains(&o.quality) {
            return Err(ConfigError::Validation(
                "options.quality must be 1-100".into(),
            ));
        }
        if !(1..=60).contains(&o.fps) {
            return Err(ConfigError::Validation("options.fps must be 1-60".into()));
        }
        if !(1..=60).contains(&o.duration_secs) {
            return Err(ConfigError::Validation(
                "options.duration_secs must be 1-60".into(),
            ));
        }
        for (key, value, max) in [
            ("width", o.width, MAX_CANVAS.0),
            ("height", o.height, MAX_CANVAS.1),
            ("font_size", o.font_size, MAX_FONT_SIZE),
        ] {
            if value.is_some_and(|v| !(1..=max).contains(&v)) {
                return Err(ConfigError::Validation(format!(
                    "options.{key} must be 1-{max}"
                )));
            }
        }
        if o.padding > MAX_PADDING {
            return Err(ConfigError::Validation(format!(
                "options.padding must be at most {MAX_PADDING}"
            )));
        }
        if o.line_spacing > MAX_LINE_SPACING {
            return Err(ConfigError::Validation(format!(
                "options.line_spacing must be at most {MAX_LINE_SPACING}"
            )));
        }
        let prefix = &self.output.prefix;
        if prefix.is_empty() || prefix.contains(['/', '\\']) {
            return Err(ConfigError::Validation(
                "output.prefix must be a non-empty file name prefix".into(),
            ));
        }
        for (key, value) in [
            ("background_color", &o.background_color),
            ("text_color", &o.text_color),
        ] {
            if parse_color(value).is_none() {
                warn!("options.{key} = {value:?} is not a color; using the default");
            }
        }
        Ok(())
    }
}

/// Stock defaults as a TOML value, the base layer for merging.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(FixgenConfig::default())?)
}

/// Deep-merge `overlay` onto `base`. Tables merge key by key; any other
/// value in the overlay replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<FixgenConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: FixgenConfig = serde_ignored::deserialize(merged, |path| {
        warn!("ignoring unknown config key: {path}");
    })?;
    config.validate()?;
    Ok(config)
}

/// Load configuration.
///
/// An explicit path must exist. Without one, `fixgen.toml` in the working
/// directory is used if present.
pub fn load_config(explicit: Option<&Path>) -> Result<FixgenConfig, ConfigError> {
    let path = match explicit {
        Some(path) => Some(path),
        None => Some(Path::new(DEFAULT_CONFIG_FILE)).filter(|p| p.is_file()),
    };
    let overlay = match path {
        Some(path) => {
            debug!("loading config from {}", path.display());
            let content = fs::read_to_string(path)?;
            Some(toml::from_str::<toml::Value>(&content)?)
        }
        None => None,
    };
    resolve_config(stock_defaults_value()?, overlay)
}

/// Returns a fully-commented stock `fixgen.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# fixgen configuration
# ====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Command-line flags override them.
#
# Loaded from --config <path>, or ./fixgen.toml when present.
# Unknown keys are ignored with a warning.

# ---------------------------------------------------------------------------
# Output location for `fixgen generate`
# ---------------------------------------------------------------------------
[output]
dir = "."
# Files are named <prefix>_<YYYYmmdd_HHMMSS>[_<n>].<ext>
prefix = "generated"

# ---------------------------------------------------------------------------
# Generation options (each format reads only the keys it uses)
# ---------------------------------------------------------------------------
[options]
# xlsx
sheet_name = "Sheet1"
auto_adjust_columns = true

# pdf, docx, odt, html. Title defaults to the first line of content.
# title = "My fixture"
# author = "QA"

# Canvas size for raster, svg and mp4. Omit to size from content length.
# width = 800
# height = 600
# font_size = 16

# Colors: #rgb, #rrggbb, #rrggbbaa or a CSS name (black, white, red, ...)
background_color = "#f0f0f0"
text_color = "#333333"

# Text placement for raster and mp4
padding = 40
align = "center"          # left | center | right
valign = "middle"         # top | middle | bottom
line_spacing = 4
shadow = false
border = false
# Grow the canvas to fit the text
auto_resize = true

# JPEG quality (1-100)
quality = 85

# mp4 (requires ffmpeg on PATH)
duration_secs = 2
fps = 12
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Align;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn resolve(overlay: &str) -> Result<FixgenConfig, ConfigError> {
        let overlay: toml::Value = toml::from_str(overlay).unwrap();
        resolve_config(stock_defaults_value().unwrap(), Some(overlay))
    }

    #[test]
    fn defaults_are_valid() {
        let config = FixgenConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.output.prefix, "generated");
        assert_eq!(config.options, Options::default());
    }

    #[test]
    fn stock_defaults_round_trip() {
        let config = resolve_config(stock_defaults_value().unwrap(), None).unwrap();
        assert_eq!(config, FixgenConfig::default());
    }

    #[test]
    fn partial_overlay_keeps_other_defaults() {
        let config = resolve("[options]\nshadow = true\nalign = \"left\"\n").unwrap();
        assert!(config.options.shadow);
        assert_eq!(config.options.align, Align::Left);
        assert_eq!(config.options.padding, 40);
        assert_eq!(config.output, OutputConfig::default());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let config = resolve("future = 1\n[options]\nsparkles = true\nfps = 24\n").unwrap();
        assert_eq!(config.options.fps, 24);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        for overlay in [
            "[options]\nquality = 0",
            "[options]\nfps = 0",
            "[options]\nduration_secs = 600",
            "[options]\nwidth = 0",
            "[options]\nwidth = 4294967295",
            "[options]\nheight = 100000",
            "[options]\nfont_size = 4294967295",
            "[options]\npadding = 4294967295",
            "[options]\nline_spacing = 100000",
            "[output]\nprefix = \"a/b\"",
            "[output]\nprefix = \"\"",
        ] {
            assert!(
                matches!(resolve(overlay), Err(ConfigError::Validation(_))),
                "{overlay}"
            );
        }
    }

    #[test]
    fn wrong_type_is_a_parse_error() {
        assert!(matches!(
            resolve("[options]\npadding = \"wide\""),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn merge_is_deep() {
        let base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 3\nz = 4\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"]["x"].as_integer(), Some(1));
        assert_eq!(merged["a"]["y"].as_integer(), Some(3));
        assert_eq!(merged["a"]["z"].as_integer(), Some(4));
    }

    #[test]
    fn load_config_from_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.toml");
        fs::write(&path, "[output]\nprefix = \"fixture\"\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.output.prefix, "fixture");
    }

    #[test]
    fn load_config_missing_explicit_path_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_config(Some(&tmp.path().join("absent.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let value: toml::Value = toml::from_str(stock_config_toml()).unwrap();
        let config = resolve_config(stock_defaults_value().unwrap(), Some(value)).unwrap();
        assert_eq!(config, FixgenConfig::default());
    }
}
