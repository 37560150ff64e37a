//! Tool configuration.
//!
//! Handles loading, validating, and merging `photo-catalog.toml`. The file is
//! optional: stock defaults are the base layer and the user file is merged on
//! top, so it only needs the keys it wants to change. Command-line flags
//! override the merged result.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! catalog = "photos.json"   # Catalog document read and written by every command
//!
//! [output]
//! base_dir = "public"       # Variants are written under {base_dir}/img/{Lg,Md,Sm}/
//! assets_prefix = false     # Record paths as "assets/img/..." instead of "img/..."
//! format = "jpg"            # jpg, png, gif, bmp, tiff or webp
//! quality = 85              # JPEG/WebP quality (25-100)
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{OutputFormat, Quality};
use crate::resize::ResizeOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "photo-catalog.toml";

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

/// Configuration loaded from `photo-catalog.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// Path of the catalog JSON document.
    pub catalog: String,
    pub output: OutputConfig,
    pub processing: ProcessingConfig,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            catalog: "photos.json".to_string(),
            output: OutputConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl CatalogConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(Quality::MIN..=Quality::MAX).contains(&self.output.quality) {
            return Err(ConfigError::Validation(format!(
                "output.quality must be {}-{}",
                Quality::MIN,
                Quality::MAX
            )));
        }
        if self.output.base_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "output.base_dir must not be empty".into(),
            ));
        }
        if self.catalog.trim().is_empty() {
            return Err(ConfigError::Validation("catalog must not be empty".into()));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn catalog_path(&self) -> PathBuf {
        PathBuf::from(&self.catalog)
    }
}

/// Where and how variants are exported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub base_dir: String,
    pub assets_prefix: bool,
    pub format: OutputFormat,
    /// Applies to JPEG and WebP only.
    pub quality: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_dir: "public".to_string(),
            assets_prefix: false,
            format: OutputFormat::default(),
            quality: Quality::default().value(),
        }
    }
}

impl OutputConfig {
    pub fn resize_options(&self) -> ResizeOptions {
        ResizeOptions {
            base_dir: PathBuf::from(&self.base_dir),
            add_assets_prefix: self.assets_prefix,
            quality: Quality::new(self.quality),
            format: self.format,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// The stock default config as a `toml::Value::Table`, the base layer for
/// merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(CatalogConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
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

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist and `Err` if it exists but
/// is not valid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<CatalogConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: CatalogConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the file at `path`, falling back to stock defaults when
/// it does not exist.
pub fn load_config(path: &Path) -> Result<CatalogConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `photo-catalog.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# photo-catalog configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Command-line flags override them.
# Unknown keys will cause an error.

# Catalog document (JSON array of photo records) read and written by every
# command.
catalog = "photos.json"

# ---------------------------------------------------------------------------
# Exported variants
# ---------------------------------------------------------------------------
[output]
# Root directory for exported files. Each photo is written three times:
#   {base_dir}/img/Lg/{name}.{ext}   1920x1080
#   {base_dir}/img/Md/{name}.{ext}   1024x768
#   {base_dir}/img/Sm/{name}.{ext}   960x640
base_dir = "public"

# Record paths as "assets/img/..." instead of "img/...". Only the path stored
# in the catalog changes; files are still written under base_dir.
assets_prefix = false

# Output format: jpg, png, gif, bmp, tiff or webp.
format = "jpg"

# Encoding quality for jpg and webp (25 = smallest, 100 = best).
quality = 85

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
