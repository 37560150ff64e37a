//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::into_dimensions` (header only) |
//! | EXIF | `kamadak-exif` (`exif::Reader::read_from_container`) |
//! | Decode (JPEG, PNG, GIF, BMP, TIFF, WebP) | `image` crate decoders |
//! | Crop-resize | centered `crop_imm`, then `resize_exact` with `Lanczos3` (see [`plan_crop`]) |
//! | Encode JPEG | `image::codecs::jpeg::JpegEncoder` with quality |
//! | Encode WebP | `webp::Encoder` (lossy, with quality) |
//! | Encode PNG, GIF, BMP, TIFF | `DynamicImage::write_to` |
//!
//! ## Metadata stripping
//!
//! Every output is encoded from a freshly built 8-bit pixel buffer. No encoder
//! is handed an ICC profile, EXIF block, XMP packet, IPTC record or CICP
//! tags, so none of the source's metadata reaches the written file.

use super::backend::{BackendError, Dimensions, ExifEntry, ImageBackend};
use super::calculations::plan_crop;
use super::params::{ExportParams, OutputFormat, Quality};
use exif::{In, Value};
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Pure Rust backend using the `image`, `webp` and `kamadak-exif` crates.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Open with the format guessed from content, falling back to the extension.
fn open_reader(path: &Path) -> Result<ImageReader<BufReader<File>>, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    open_reader(path)?
        .decode()
        .map_err(|e| BackendError::Decode(format!("{}: {}", path.display(), e)))
}

/// Center-crop to the aspect ratio of `width`×`height`, then scale to exactly
/// that size.
fn crop_resize(img: &DynamicImage, width: u32, height: u32) -> Result<DynamicImage, BackendError> {
    let plan = plan_crop((img.width(), img.height()), (width, height)).ok_or_else(|| {
        BackendError::ProcessingFailed(format!(
            "cannot crop {}x{} to {}x{}",
            img.width(),
            img.height(),
            width,
            height
        ))
    })?;
    let window = img.crop_imm(plan.offset.0, plan.offset.1, plan.crop.0, plan.crop.1);
    Ok(window.resize_exact(width, height, FilterType::Lanczos3))
}

/// Encode `img` to `path` without carrying over any metadata.
fn encode_stripped(
    img: &DynamicImage,
    path: &Path,
    format: OutputFormat,
    quality: Quality,
) -> Result<(), BackendError> {
    match format {
        OutputFormat::Jpg => {
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let writer = BufWriter::new(File::create(path)?);
            let encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(writer, quality.value() as u8);
            rgb.write_with_encoder(encoder)
                .map_err(|e| BackendError::Encode(format!("JPEG {}: {}", path.display(), e)))
        }
        OutputFormat::Webp => {
            let rgba = img.to_rgba8();
            let encoded = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
                .encode(quality.value() as f32);
            std::fs::write(path, &*encoded)?;
            Ok(())
        }
        OutputFormat::Png | OutputFormat::Gif | OutputFormat::Bmp | OutputFormat::Tiff => {
            let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
            let mut writer = BufWriter::new(File::create(path)?);
            rgba.write_to(&mut writer, format.image_format())
                .map_err(|e| {
                    BackendError::Encode(format!("{} {}: {}", format, path.display(), e))
                })?;
            writer.flush()?;
            Ok(())
        }
    }
}

/// Render an EXIF value in the raw textual form the normalizers consume.
fn value_to_string(value: &Value) -> String {
    fn join<T: ToString>(values: &[T]) -> String {
        values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    match value {
        Value::Ascii(vec) => vec
            .iter()
            .map(|v| String::from_utf8_lossy(v).trim_matches(char::from(0)).trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        Value::Rational(vec) => vec
            .iter()
            .map(|r| format!("{}/{}", r.num, r.denom))
            .collect::<Vec<_>>()
            .join(","),
        Value::SRational(vec) => vec
            .iter()
            .map(|r| format!("{}/{}", r.num, r.denom))
            .collect::<Vec<_>>()
            .join(","),
        Value::Byte(vec) => join(vec),
        Value::Short(vec) => join(vec),
        Value::Long(vec) => join(vec),
        Value::SByte(vec) => join(vec),
        Value::SShort(vec) => join(vec),
        Value::SLong(vec) => join(vec),
        Value::Float(vec) => join(vec),
        Value::Double(vec) => join(vec),
        _ => String::new(),
    }
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = open_reader(path)?
            .into_dimensions()
            .map_err(|e| BackendError::Decode(format!("{}: {}", path.display(), e)))?;
        Ok(Dimensions { width, height })
    }

    fn read_exif(&self, path: &Path) -> Result<Option<Vec<ExifEntry>>, BackendError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let exif = match exif::Reader::new().read_from_container(&mut reader) {
            Ok(exif) => exif,
            Err(exif::Error::Io(e)) => return Err(BackendError::Io(e)),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no readable EXIF block");
                return Ok(None);
            }
        };

        let entries = exif
            .fields()
            .filter(|field| field.ifd_num == In::PRIMARY)
            .map(|field| ExifEntry {
                tag: field.tag,
                value: value_to_string(&field.value),
            })
            .collect();
        Ok(Some(entries))
    }

    fn export(&self, params: &ExportParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        for target in &params.targets {
            let resized = crop_resize(&img, target.width, target.height)?;
            encode_stripped(&resized, &target.output, params.format, params.quality)?;
            debug!(
                output = %target.output.display(),
                width = target.width,
                height = target.height,
                "wrote variant"
            );
        }
        Ok(())
    }
}
