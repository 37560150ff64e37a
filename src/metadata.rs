//! Camera metadata extraction.
//!
//! Reads the five EXIF tags a record cares about and merges them into the
//! catalog:
//!
//! | Tag | Field | Normalizer |
//! |-----|-------|------------|
//! | `Model` | `camera_model` | trimmed text |
//! | `LensModel` | `lens_model` | trimmed text |
//! | `ExposureTime` | `shutter_speed` | [`normalize_shutter_speed`] |
//! | `FNumber` | `aperture` | [`parse_rational_to_decimal`] |
//! | `RecommendedExposureIndex` | `iso_value` | [`normalize_iso`] |
//!
//! Many bodies never write `RecommendedExposureIndex`; when it is missing the
//! older `PhotographicSensitivity` (ISO speed) tag fills `iso_value` instead.
//!
//! ## Classification
//!
//! A file whose EXIF block is missing, empty, or lacks a camera model has no
//! usable metadata. It goes on the catalog's no-data list and gets no record.
//! Otherwise the record is found or created by file name, so a bare record
//! left by an earlier resize pass picks up its camera settings here.

use crate::catalog::{CameraSettings, PhotoCatalog};
use crate::imaging::{ExifEntry, OutputFormat};
use crate::normalize::{normalize_iso, normalize_shutter_speed, parse_rational_to_decimal};
use exif::Tag;
use tracing::debug;

/// The closed set of EXIF tags read into [`CameraSettings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognizedTag {
    CameraModel,
    LensModel,
    ExposureTime,
    FNumber,
    RecommendedExposureIndex,
}

const ALL_SEEN: u8 = 0b1_1111;

impl RecognizedTag {
    pub const ALL: [RecognizedTag; 5] = [
        RecognizedTag::CameraModel,
        RecognizedTag::LensModel,
        RecognizedTag::ExposureTime,
        RecognizedTag::FNumber,
        RecognizedTag::RecommendedExposureIndex,
    ];

    pub fn exif_tag(self) -> Tag {
        match self {
            RecognizedTag::CameraModel => Tag::Model,
            RecognizedTag::LensModel => Tag::LensModel,
            RecognizedTag::ExposureTime => Tag::ExposureTime,
            RecognizedTag::FNumber => Tag::FNumber,
            RecognizedTag::RecommendedExposureIndex => Tag::RecommendedExposureIndex,
        }
    }

    pub fn from_exif(tag: Tag) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.exif_tag() == tag)
    }

    fn bit(self) -> u8 {
        1 << self as u8
    }

    /// Normalize `raw` and store it in the matching field.
    fn apply(self, raw: &str, settings: &mut CameraSettings) {
        let raw = raw.trim();
        if raw.is_empty() {
            return;
        }
        match self {
            RecognizedTag::CameraModel => settings.camera_model = Some(raw.to_string()),
            RecognizedTag::LensModel => settings.lens_model = Some(raw.to_string()),
            RecognizedTag::ExposureTime => {
                settings.shutter_speed = Some(normalize_shutter_speed(raw))
            }
            RecognizedTag::FNumber => settings.aperture = Some(parse_rational_to_decimal(raw)),
            RecognizedTag::RecommendedExposureIndex => settings.iso_value = normalize_iso(raw),
        }
    }
}

/// Build camera settings from raw entries.
///
/// The first occurrence of each recognized tag wins; scanning stops once all
/// five have been seen. Unrecognized tags are ignored.
pub fn read_camera_settings(entries: &[ExifEntry]) -> CameraSettings {
    let mut settings = CameraSettings::default();
    let mut seen = 0u8;
    let mut iso_speed = None;

    for entry in entries {
        match RecognizedTag::from_exif(entry.tag) {
            Some(kind) => {
                if seen & kind.bit() == 0 {
                    kind.apply(&entry.value, &mut settings);
                    seen |= kind.bit();
                }
                if seen == ALL_SEEN {
                    break;
                }
            }
            None if entry.tag == Tag::PhotographicSensitivity && iso_speed.is_none() => {
                iso_speed = normalize_iso(&entry.value);
            }
            None => {}
        }
    }

    if settings.iso_value.is_none() {
        settings.iso_value = iso_speed;
    }
    settings
}

/// Whether `entries` would produce a record (a camera model is present).
pub fn has_usable_metadata(entries: Option<&[ExifEntry]>) -> bool {
    entries.is_some_and(|entries| read_camera_settings(entries).has_usable_metadata())
}

/// What [`extract`] did with a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
    /// Camera settings were written to the record.
    Recorded,
    /// The record already had camera settings; they were left alone.
    AlreadyPopulated,
    /// No usable metadata.
    NoData,
}

impl Extraction {
    pub fn is_no_data(self) -> bool {
        self == Extraction::NoData
    }
}

/// Merge a file's EXIF entries into the catalog.
///
/// - missing/empty block or no camera model: the name goes on the no-data
///   list (unless a record already exists) and [`Extraction::NoData`] is
///   returned;
/// - otherwise the record is found or created (new records get `format`) and
///   its camera settings are set, at most once per record.
pub fn extract(
    catalog: &mut PhotoCatalog,
    file_name: &str,
    entries: Option<&[ExifEntry]>,
    format: OutputFormat,
) -> Extraction {
    let settings = match entries {
        Some(entries) if !entries.is_empty() => read_camera_settings(entries),
        _ => CameraSettings::default(),
    };

    if !settings.has_usable_metadata() {
        debug!(file = file_name, "no usable EXIF metadata");
        catalog.mark_no_data(file_name);
        return Extraction::NoData;
    }

    let record = catalog.find_or_create_as(file_name, format);
    if !record.camera_settings.is_empty() {
        return Extraction::AlreadyPopulated;
    }
    record.camera_settings = settings;
    Extraction::Recorded
}
