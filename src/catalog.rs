//! The in-memory photo catalog.
//!
//! A [`PhotoCatalog`] is constructed once per run and handed by reference to
//! every stage that reads or writes it. It holds two ordered lists:
//!
//! - **records**: one [`PhotoRecord`] per source file, in insertion order.
//!   Order is for display; identity is the file name.
//! - **no-data**: file names that were scanned but carried no usable EXIF,
//!   remembered so a re-scan in the same session skips them.
//!
//! ## Invariants
//!
//! Maintained by every mutator, so callers never need to check them:
//!
//! - no two records share a file name;
//! - a file name is in at most one of the two lists.
//!
//! Both the metadata pass and the resize pass reach records through
//! [`PhotoCatalog::find_or_create_as`], which is the single place a record is
//! created outside of loading.

use crate::imaging::OutputFormat;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// One of the three fixed output sizes attached to a record.
///
/// Declaration order is the processing order (large first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SizeSlot {
    Large,
    Medium,
    Small,
}

impl SizeSlot {
    pub const ALL: [SizeSlot; 3] = [SizeSlot::Large, SizeSlot::Medium, SizeSlot::Small];

    /// Export dimensions (width, height). Every variant is cropped to exactly this.
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            SizeSlot::Large => (1920, 1080),
            SizeSlot::Medium => (1024, 768),
            SizeSlot::Small => (960, 640),
        }
    }

    /// Directory label under `img/`.
    pub fn label(self) -> &'static str {
        match self {
            SizeSlot::Large => "Lg",
            SizeSlot::Medium => "Md",
            SizeSlot::Small => "Sm",
        }
    }
}

/// Where one exported variant lives and how big it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Relative, slash-separated path as recorded for consumers. May carry an
    /// `assets/` prefix that the on-disk location does not have.
    pub path: String,
    pub width: u32,
    pub height: u32,
}

/// The three resolution slots of a record. A slot stays `None` until the
/// resize pass fills it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolutions {
    pub small: Option<Resolution>,
    pub medium: Option<Resolution>,
    pub large: Option<Resolution>,
}

impl Resolutions {
    pub fn get(&self, slot: SizeSlot) -> Option<&Resolution> {
        match slot {
            SizeSlot::Small => self.small.as_ref(),
            SizeSlot::Medium => self.medium.as_ref(),
            SizeSlot::Large => self.large.as_ref(),
        }
    }

    pub fn set(&mut self, slot: SizeSlot, resolution: Resolution) {
        let target = match slot {
            SizeSlot::Small => &mut self.small,
            SizeSlot::Medium => &mut self.medium,
            SizeSlot::Large => &mut self.large,
        };
        *target = Some(resolution);
    }

    /// All three slots are filled.
    pub fn is_complete(&self) -> bool {
        SizeSlot::ALL.iter().all(|slot| self.get(*slot).is_some())
    }
}

/// Camera settings read from EXIF. Each field is `None` unless the tag was
/// present in the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CameraSettings {
    pub camera_model: Option<String>,
    pub lens_model: Option<String>,
    /// Display form: `"1/250"` for fast speeds, decimal seconds for slow ones.
    pub shutter_speed: Option<String>,
    /// f-number rounded to two decimals.
    pub aperture: Option<f64>,
    pub iso_value: Option<String>,
}

impl CameraSettings {
    /// A record has usable metadata iff a camera model was read.
    pub fn has_usable_metadata(&self) -> bool {
        self.camera_model
            .as_deref()
            .is_some_and(|model| !model.trim().is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// One source photo and everything derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoRecord {
    /// Identity key, unique within a catalog.
    pub file_name: String,
    /// Name used for exported files instead of the source stem.
    pub alt_name: Option<String>,
    pub format: OutputFormat,
    /// Accessibility text.
    pub alt: Option<String>,
    pub resolutions: Resolutions,
    pub tags: Vec<String>,
    pub camera_settings: CameraSettings,
}

impl PhotoRecord {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            alt_name: None,
            format: OutputFormat::default(),
            alt: None,
            resolutions: Resolutions::default(),
            tags: Vec::new(),
            camera_settings: CameraSettings::default(),
        }
    }

    /// Stem for exported files: the alt name when set, else the source stem.
    pub fn output_stem(&self) -> String {
        self.alt_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(file_stem)
            .unwrap_or_else(|| file_stem(&self.file_name))
    }
}

/// File name without its final extension (`"a.b.jpg"` → `"a.b"`).
pub fn file_stem(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string())
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Ordered, name-unique collection of photo records plus the no-data list.
#[derive(Debug, Default)]
pub struct PhotoCatalog {
    records: Vec<PhotoRecord>,
    no_data: Vec<String>,
    /// file name → position in `records`. Records are never removed, so
    /// positions stay valid.
    index: HashMap<String, usize>,
}

impl PhotoCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[PhotoRecord] {
        &self.records
    }

    pub fn no_data(&self) -> &[String] {
        &self.no_data
    }

    pub fn get(&self, file_name: &str) -> Option<&PhotoRecord> {
        self.index.get(file_name).map(|&i| &self.records[i])
    }

    fn get_mut(&mut self, file_name: &str) -> Option<&mut PhotoRecord> {
        let i = *self.index.get(file_name)?;
        Some(&mut self.records[i])
    }

    /// Whether a record exists for `file_name`.
    pub fn contains(&self, file_name: &str) -> bool {
        self.index.contains_key(file_name)
    }

    pub fn is_no_data(&self, file_name: &str) -> bool {
        self.no_data.iter().any(|n| n == file_name)
    }

    /// Whether `file_name` was already seen, as a record or as no-data.
    pub fn is_known(&self, file_name: &str) -> bool {
        self.contains(file_name) || self.is_no_data(file_name)
    }

    /// Return the record for `file_name`, creating a bare one if needed.
    pub fn find_or_create(&mut self, file_name: &str) -> &mut PhotoRecord {
        self.find_or_create_as(file_name, OutputFormat::default())
    }

    /// Like [`find_or_create`](Self::find_or_create), but a newly created
    /// record gets `format`. An existing record keeps its own format.
    ///
    /// A name on the no-data list is promoted: it leaves that list and
    /// becomes a record.
    pub fn find_or_create_as(&mut self, file_name: &str, format: OutputFormat) -> &mut PhotoRecord {
        if let Some(&i) = self.index.get(file_name) {
            return &mut self.records[i];
        }
        let mut record = PhotoRecord::new(file_name);
        record.format = format;
        self.push(record)
    }

    /// Insert a fully built record. Returns `false`, leaving the catalog
    /// untouched, when a record with the same name exists.
    pub fn insert(&mut self, record: PhotoRecord) -> bool {
        if self.contains(&record.file_name) {
            return false;
        }
        self.push(record);
        true
    }

    fn push(&mut self, record: PhotoRecord) -> &mut PhotoRecord {
        if let Some(pos) = self.no_data.iter().position(|n| *n == record.file_name) {
            debug!(file = %record.file_name, "promoting no-data entry to a record");
            self.no_data.remove(pos);
        }
        let i = self.records.len();
        self.index.insert(record.file_name.clone(), i);
        self.records.push(record);
        &mut self.records[i]
    }

    /// Remember that `file_name` has no usable metadata. Returns `false` if
    /// the name is already known in either list.
    pub fn mark_no_data(&mut self, file_name: &str) -> bool {
        if self.is_known(file_name) {
            return false;
        }
        self.no_data.push(file_name.to_string());
        true
    }

    /// Append a tag. Blank tags are ignored; duplicates are kept.
    pub fn add_tag(&mut self, file_name: &str, tag: &str) -> bool {
        let Some(tag) = non_blank(tag) else {
            return false;
        };
        match self.get_mut(file_name) {
            Some(record) => {
                record.tags.push(tag);
                true
            }
            None => false,
        }
    }

    /// Set the alt text. Blank text clears it.
    pub fn set_alt(&mut self, file_name: &str, text: &str) -> bool {
        match self.get_mut(file_name) {
            Some(record) => {
                record.alt = non_blank(text);
                true
            }
            None => false,
        }
    }

    /// Set the name used for exported files. Blank clears it.
    pub fn set_alt_name(&mut self, file_name: &str, alt_name: &str) -> bool {
        match self.get_mut(file_name) {
            Some(record) => {
                record.alt_name = non_blank(alt_name);
                true
            }
            None => false,
        }
    }

    /// Set one resolution slot of an existing record.
    pub fn set_resolution(
        &mut self,
        file_name: &str,
        slot: SizeSlot,
        resolution: Resolution,
    ) -> bool {
        match self.get_mut(file_name) {
            Some(record) => {
                record.resolutions.set(slot, resolution);
                true
            }
            None => false,
        }
    }
}
