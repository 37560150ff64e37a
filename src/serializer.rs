//! JSON persistence for the catalog.
//!
//! The catalog is stored as a top-level array of records (the no-data list is
//! session state and is not written):
//!
//! ```json
//! [
//!   {
//!     "fileName": "DSCF0042.JPG",
//!     "altName": "harbour-at-dusk",
//!     "type": "webp",
//!     "alt": "Fishing boats moored at dusk",
//!     "resolutions": {
//!       "previewS": { "path": "assets/img/Sm/harbour-at-dusk.webp", "width": 960, "height": 640 },
//!       "previewM": { "path": "assets/img/Md/harbour-at-dusk.webp", "width": 1024, "height": 768 },
//!       "previewL": { "path": "assets/img/Lg/harbour-at-dusk.webp", "width": 1920, "height": 1080 }
//!     },
//!     "tags": ["harbour", "boats"],
//!     "cameraSettings": {
//!       "cameraModel": "X-T5",
//!       "lensModel": "XF33mmF1.4 R LM WR",
//!       "shutterSpeed": "1/250",
//!       "aperture": 2.8,
//!       "isoValue": "400"
//!     }
//!   }
//! ]
//! ```
//!
//! Absent optionals are written as `null`. On load every key is optional and
//! unknown keys are ignored, so documents written by older tools still load.
//! The document types below are kept separate from the domain types in
//! [`crate::catalog`]; each record is rebuilt field by field.

use crate::catalog::{CameraSettings, PhotoCatalog, PhotoRecord, Resolution, Resolutions};
use crate::imaging::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct PhotoDocument {
    file_name: String,
    alt_name: Option<String>,
    #[serde(rename = "type")]
    format: Option<String>,
    alt: Option<String>,
    resolutions: ResolutionsDocument,
    tags: Vec<String>,
    camera_settings: CameraSettingsDocument,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(default)]
struct ResolutionsDocument {
    #[serde(rename = "previewS")]
    small: Option<ResolutionDocument>,
    #[serde(rename = "previewM")]
    medium: Option<ResolutionDocument>,
    #[serde(rename = "previewL")]
    large: Option<ResolutionDocument>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(default)]
struct ResolutionDocument {
    path: String,
    width: u32,
    height: u32,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct CameraSettingsDocument {
    camera_model: Option<String>,
    lens_model: Option<String>,
    shutter_speed: Option<String>,
    aperture: Option<f64>,
    iso_value: Option<String>,
}

impl From<&Resolution> for ResolutionDocument {
    fn from(r: &Resolution) -> Self {
        Self {
            path: r.path.clone(),
            width: r.width,
            height: r.height,
        }
    }
}

impl From<ResolutionDocument> for Resolution {
    fn from(doc: ResolutionDocument) -> Self {
        Self {
            path: doc.path,
            width: doc.width,
            height: doc.height,
        }
    }
}

impl From<&PhotoRecord> for PhotoDocument {
    fn from(record: &PhotoRecord) -> Self {
        let settings = &record.camera_settings;
        Self {
            file_name: record.file_name.clone(),
            alt_name: record.alt_name.clone(),
            format: Some(record.format.to_string()),
            alt: record.alt.clone(),
            resolutions: ResolutionsDocument {
                small: record.resolutions.small.as_ref().map(Into::into),
                medium: record.resolutions.medium.as_ref().map(Into::into),
                large: record.resolutions.large.as_ref().map(Into::into),
            },
            tags: record.tags.clone(),
            camera_settings: CameraSettingsDocument {
                camera_model: settings.camera_model.clone(),
                lens_model: settings.lens_model.clone(),
                shutter_speed: settings.shutter_speed.clone(),
                aperture: settings.aperture,
                iso_value: settings.iso_value.clone(),
            },
        }
    }
}

impl PhotoDocument {
    fn into_record(self) -> PhotoRecord {
        let format = match self.format.as_deref() {
            None => OutputFormat::default(),
            Some(text) => text.parse().unwrap_or_else(|e| {
                warn!(file = %self.file_name, error = %e, "unknown type, using default");
                OutputFormat::default()
            }),
        };
        let settings = self.camera_settings;
        PhotoRecord {
            file_name: self.file_name,
            alt_name: self.alt_name,
            format,
            alt: self.alt,
            resolutions: Resolutions {
                small: self.resolutions.small.map(Into::into),
                medium: self.resolutions.medium.map(Into::into),
                large: self.resolutions.large.map(Into::into),
            },
            tags: self.tags,
            camera_settings: CameraSettings {
                camera_model: settings.camera_model,
                lens_model: settings.lens_model,
                shutter_speed: settings.shutter_speed,
                aperture: settings.aperture,
                iso_value: settings.iso_value,
            },
        }
    }
}

/// Serialize every record, in catalog order, as pretty-printed JSON.
pub fn save(catalog: &PhotoCatalog) -> Result<String, CatalogError> {
    let documents: Vec<PhotoDocument> = catalog.records().iter().map(Into::into).collect();
    Ok(serde_json::to_string_pretty(&documents)?)
}

/// Parse a catalog document into records.
///
/// Entries without a `fileName` have no identity and are dropped with a
/// warning. Duplicates are not resolved here; see [`merge_loaded`].
pub fn load(document: &str) -> Result<Vec<PhotoRecord>, CatalogError> {
    let documents: Vec<PhotoDocument> = serde_json::from_str(document)?;
    Ok(documents
        .into_iter()
        .enumerate()
        .filter_map(|(i, doc)| {
            if doc.file_name.trim().is_empty() {
                warn!(index = i, "catalog entry has no fileName, skipping");
                None
            } else {
                Some(doc.into_record())
            }
        })
        .collect())
}

/// What [`merge_loaded`] did with a batch of records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    /// Records whose file name was already in the catalog.
    pub skipped: usize,
}

/// Insert loaded records, keeping the resident record whenever a name is
/// already present. Names on the no-data list are promoted to records.
pub fn merge_loaded(catalog: &mut PhotoCatalog, records: Vec<PhotoRecord>) -> LoadReport {
    let mut report = LoadReport::default();
    for record in records {
        let name = record.file_name.clone();
        if catalog.insert(record) {
            report.loaded += 1;
        } else {
            warn!(file = %name, "duplicate record in catalog, keeping the first");
            report.skipped += 1;
        }
    }
    report
}

/// Write the catalog document to `path`, creating parent directories.
pub fn save_to_path(catalog: &PhotoCatalog, path: &Path) -> Result<(), CatalogError> {
    let json = save(catalog)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)?;
    debug!(path = %path.display(), records = catalog.len(), "saved catalog");
    Ok(())
}

/// Load the document at `path` into `catalog`. A missing file loads nothing.
pub fn load_into(catalog: &mut PhotoCatalog, path: &Path) -> Result<LoadReport, CatalogError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no catalog file yet");
            return Ok(LoadReport::default());
        }
        Err(e) => return Err(e.into()),
    };
    let report = merge_loaded(catalog, load(&content)?);
    debug!(
        path = %path.display(),
        loaded = report.loaded,
        skipped = report.skipped,
        "loaded catalog"
    );
    Ok(report)
}
