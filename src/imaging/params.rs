//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the [`resize`](crate::resize) pipeline (which decides
//! what variants to create and where they go) and the
//! [`backend`](super::backend) (which does the pixel work). This separation
//! lets unit tests swap in a recording mock without touching the planner.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (25–100, default 85). Clamped on construction.
//! - [`OutputFormat`]: The closed set of formats a batch can export to.
//! - [`ExportTarget`]: One crop-resized output: destination path plus exact dimensions.
//! - [`ExportParams`]: A full export job: one source, every target, format and quality.

use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Quality setting for lossy image encoding (25-100).
///
/// Only JPEG and WebP honour it; see [`OutputFormat::supports_quality`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub const MIN: u32 = 25;
    pub const MAX: u32 = 100;

    pub fn new(value: u32) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// Output encoding selected once per processing batch.
///
/// Serialized lowercase (`"jpg"`, `"webp"`, ...), which is also the file
/// extension written and the value stored in each record's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    #[serde(alias = "jpeg")]
    Jpg,
    Png,
    Gif,
    Bmp,
    #[serde(alias = "tif")]
    Tiff,
    Webp,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 6] = [
        OutputFormat::Jpg,
        OutputFormat::Png,
        OutputFormat::Gif,
        OutputFormat::Bmp,
        OutputFormat::Tiff,
        OutputFormat::Webp,
    ];

    /// File extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::Gif => "gif",
            OutputFormat::Bmp => "bmp",
            OutputFormat::Tiff => "tiff",
            OutputFormat::Webp => "webp",
        }
    }

    /// Whether the encoder for this format takes a lossy quality parameter.
    pub fn supports_quality(self) -> bool {
        matches!(self, OutputFormat::Jpg | OutputFormat::Webp)
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            OutputFormat::Jpg => ImageFormat::Jpeg,
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Gif => ImageFormat::Gif,
            OutputFormat::Bmp => ImageFormat::Bmp,
            OutputFormat::Tiff => ImageFormat::Tiff,
            OutputFormat::Webp => ImageFormat::WebP,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown output format '{0}' (expected one of jpg, png, gif, bmp, tiff, webp)")]
pub struct ParseFormatError(pub String);

impl FromStr for OutputFormat {
    type Err = ParseFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(OutputFormat::Jpg),
            "png" => Ok(OutputFormat::Png),
            "gif" => Ok(OutputFormat::Gif),
            "bmp" => Ok(OutputFormat::Bmp),
            "tif" | "tiff" => Ok(OutputFormat::Tiff),
            "webp" => Ok(OutputFormat::Webp),
            _ => Err(ParseFormatError(s.to_string())),
        }
    }
}

/// One crop-resized output of an export job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTarget {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Parameters for an export: decode `source` once, then crop-resize and
/// encode it once per target.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportParams {
    pub source: PathBuf,
    pub targets: Vec<ExportTarget>,
    pub format: OutputFormat,
    pub quality: Quality,
}
