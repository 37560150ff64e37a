//! Shared test utilities for the photo-catalog test suite.
//!
//! Provides fixture builders for real image files (with and without EXIF)
//! and sample records for catalog and serializer tests.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_jpeg_with_exif(&tmp.path().join("a.jpg"), 64, 48, &ExifFixture::full());
//! write_test_image(&tmp.path().join("plain.png"), 64, 48);
//! ```

use exif::experimental::Writer;
use exif::{Field, In, Rational, Tag, Value};
use image::{Rgb, RgbImage};
use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::catalog::{CameraSettings, PhotoRecord, Resolution, SizeSlot};
use crate::imaging::OutputFormat;

// =========================================================================
// Image fixtures
// =========================================================================

/// A small gradient so encoders have something non-trivial to compress.
fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    })
}

/// Write a metadata-free image; the format follows the path's extension.
pub fn write_test_image(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    gradient(width, height).save(path).unwrap();
}

/// EXIF fields to embed in a fixture JPEG. `None` leaves the tag out.
#[derive(Debug, Clone, Default)]
pub struct ExifFixture {
    pub model: Option<&'static str>,
    pub lens_model: Option<&'static str>,
    pub exposure_time: Option<(u32, u32)>,
    pub f_number: Option<(u32, u32)>,
    pub recommended_exposure_index: Option<u32>,
    pub iso_speed: Option<u16>,
    pub artist: Option<&'static str>,
}

impl ExifFixture {
    /// All five recognized tags plus an unrecognized one.
    pub fn full() -> Self {
        Self {
            model: Some("X-T5"),
            lens_model: Some("XF33mmF1.4 R LM WR"),
            exposure_time: Some((1, 250)),
            f_number: Some((28, 10)),
            recommended_exposure_index: Some(400),
            iso_speed: None,
            artist: Some("Test Photographer"),
        }
    }

    /// An EXIF block that carries no camera model.
    pub fn without_model() -> Self {
        Self {
            model: None,
            ..Self::full()
        }
    }

    fn fields(&self) -> Vec<Field> {
        let ascii = |tag: Tag, s: &str| Field {
            tag,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![s.as_bytes().to_vec()]),
        };
        let rational = |tag: Tag, (num, denom): (u32, u32)| Field {
            tag,
            ifd_num: In::PRIMARY,
            value: Value::Rational(vec![Rational { num, denom }]),
        };

        let mut fields = Vec::new();
        if let Some(model) = self.model {
            fields.push(ascii(Tag::Model, model));
        }
        if let Some(artist) = self.artist {
            fields.push(ascii(Tag::Artist, artist));
        }
        if let Some(lens) = self.lens_model {
            fields.push(ascii(Tag::LensModel, lens));
        }
        if let Some(exposure) = self.exposure_time {
            fields.push(rational(Tag::ExposureTime, exposure));
        }
        if let Some(f_number) = self.f_number {
            fields.push(rational(Tag::FNumber, f_number));
        }
        if let Some(rei) = self.recommended_exposure_index {
            fields.push(Field {
                tag: Tag::RecommendedExposureIndex,
                ifd_num: In::PRIMARY,
                value: Value::Long(vec![rei]),
            });
        }
        if let Some(iso) = self.iso_speed {
            fields.push(Field {
                tag: Tag::PhotographicSensitivity,
                ifd_num: In::PRIMARY,
                value: Value::Short(vec![iso]),
            });
        }
        fields
    }

    /// Serialize the fields as a TIFF-structured EXIF block.
    fn tiff_bytes(&self) -> Vec<u8> {
        let fields = self.fields();
        let mut writer = Writer::new();
        for field in &fields {
            writer.push_field(field);
        }
        let mut buf = Cursor::new(Vec::new());
        writer.write(&mut buf, false).unwrap();
        buf.into_inner()
    }
}

/// Encode a JPEG and splice an `APP1 Exif` segment in right after `SOI`.
pub fn jpeg_with_exif(width: u32, height: u32, fixture: &ExifFixture) -> Vec<u8> {
    let mut jpeg = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(gradient(width, height))
        .write_to(&mut jpeg, image::ImageFormat::Jpeg)
        .unwrap();
    let jpeg = jpeg.into_inner();
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "encoder must start with SOI");

    let tiff = fixture.tiff_bytes();
    let segment_len = u16::try_from(2 + 6 + tiff.len()).unwrap();

    let mut out = Vec::with_capacity(jpeg.len() + tiff.len() + 10);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// Write a JPEG carrying the given EXIF fields.
pub fn write_jpeg_with_exif(path: &Path, width: u32, height: u32, fixture: &ExifFixture) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, jpeg_with_exif(width, height, fixture)).unwrap();
}

// =========================================================================
// Record fixtures
// =========================================================================

/// A record with only its identity set.
pub fn bare_record(file_name: &str) -> PhotoRecord {
    PhotoRecord::new(file_name)
}

/// A record with every field populated.
pub fn full_record(file_name: &str) -> PhotoRecord {
    let mut record = PhotoRecord::new(file_name);
    record.alt_name = Some("harbour-at-dusk".into());
    record.format = OutputFormat::Webp;
    record.alt = Some("Fishing boats moored at dusk".into());
    record.tags = vec!["harbour".into(), "boats".into(), "dusk".into()];
    record.camera_settings = CameraSettings {
        camera_model: Some("X-T5".into()),
        lens_model: Some("XF33mmF1.4 R LM WR".into()),
        shutter_speed: Some("1/250".into()),
        aperture: Some(2.8),
        iso_value: Some("400".into()),
    };
    for slot in SizeSlot::ALL {
        let (width, height) = slot.dimensions();
        record.resolutions.set(
            slot,
            Resolution {
                path: format!("assets/img/{}/harbour-at-dusk.webp", slot.label()),
                width,
                height,
            },
        );
    }
    record
}

// =========================================================================
// Log capture
// =========================================================================

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a thread-local subscriber and return what it logged at
/// `WARN` or above, as plain text.
pub fn capture_warnings<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8_lossy(&buffer.0.lock().unwrap()).into_owned();
    (result, logs)
}
