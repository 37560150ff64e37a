//! Multi-resolution export of a photo.
//!
//! Every photo is exported at three fixed sizes, cropped to fill (never
//! letterboxed), with all metadata stripped:
//!
//! | Slot | Size | Directory |
//! |------|------|-----------|
//! | large | 1920×1080 | `img/Lg/` |
//! | medium | 1024×768 | `img/Md/` |
//! | small | 960×640 | `img/Sm/` |
//!
//! ## Written path vs recorded path
//!
//! Files are always written to `{base_dir}/img/{Lg|Md|Sm}/{stem}.{ext}`. The
//! path stored in the record is relative and slash-separated, and gains an
//! `assets/` prefix when [`ResizeOptions::add_assets_prefix`] is set:
//!
//! ```text
//! written:  public/img/Lg/harbour.jpg
//! recorded: assets/img/Lg/harbour.jpg
//! ```
//!
//! A web front end that serves `public/` under `/assets` reads the recorded
//! path; the prefix never changes where bytes land.

use crate::catalog::{PhotoCatalog, Resolution, SizeSlot, file_stem};
use crate::imaging::{BackendError, ExportParams, ExportTarget, ImageBackend, OutputFormat, Quality};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Recorded-path prefix used when `add_assets_prefix` is set.
pub const ASSETS_PREFIX: &str = "assets/";

/// Per-batch export settings.
#[derive(Debug, Clone)]
pub struct ResizeOptions {
    pub base_dir: PathBuf,
    pub add_assets_prefix: bool,
    pub quality: Quality,
    pub format: OutputFormat,
}

impl ResizeOptions {
    /// These options with the format of `file_name`'s record, when it has one.
    pub fn in_format_of(&self, catalog: &PhotoCatalog, file_name: &str) -> Self {
        let mut options = self.clone();
        if let Some(record) = catalog.get(file_name) {
            options.format = record.format;
        }
        options
    }
}

/// Exported variants by slot.
pub type Variants = BTreeMap<SizeSlot, Resolution>;

/// Where one variant will be written and what gets recorded for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedVariant {
    pub slot: SizeSlot,
    pub output: PathBuf,
    pub resolution: Resolution,
}

/// Plan the three variants for `stem` without touching the filesystem.
pub fn plan_variants(stem: &str, options: &ResizeOptions) -> Vec<PlannedVariant> {
    let file_name = format!("{}.{}", stem, options.format.extension());
    let prefix = if options.add_assets_prefix {
        ASSETS_PREFIX
    } else {
        ""
    };

    SizeSlot::ALL
        .into_iter()
        .map(|slot| {
            let (width, height) = slot.dimensions();
            PlannedVariant {
                slot,
                output: options
                    .base_dir
                    .join("img")
                    .join(slot.label())
                    .join(&file_name),
                resolution: Resolution {
                    path: format!("{}img/{}/{}", prefix, slot.label(), file_name),
                    width,
                    height,
                },
            }
        })
        .collect()
}

/// Create the output directories and export all three variants of `source`.
///
/// Touches no catalog; see [`attach`] and [`resize`].
pub fn export_variants(
    backend: &impl ImageBackend,
    source: &Path,
    stem: &str,
    options: &ResizeOptions,
) -> Result<Variants, BackendError> {
    let planned = plan_variants(stem, options);

    for variant in &planned {
        if let Some(parent) = variant.output.parent() {
            std::fs::create_dir_all(parent)?;
        }
    }

    backend.export(&ExportParams {
        source: source.to_path_buf(),
        targets: planned
            .iter()
            .map(|v| ExportTarget {
                output: v.output.clone(),
                width: v.resolution.width,
                height: v.resolution.height,
            })
            .collect(),
        format: options.format,
        quality: options.quality,
    })?;

    Ok(planned
        .into_iter()
        .map(|v| (v.slot, v.resolution))
        .collect())
}

/// Record exported variants on the record for `file_name`, creating a bare
/// record (with `format`) if none exists. Only the addressed slots change.
pub fn attach(
    catalog: &mut PhotoCatalog,
    file_name: &str,
    variants: &Variants,
    format: OutputFormat,
) {
    let record = catalog.find_or_create_as(file_name, format);
    for (slot, resolution) in variants {
        record.resolutions.set(*slot, resolution.clone());
    }
}

/// Stem used for `file_name`'s exports: its record's alt name if it has one.
pub fn output_stem(catalog: &PhotoCatalog, file_name: &str) -> String {
    catalog
        .get(file_name)
        .map(|record| record.output_stem())
        .unwrap_or_else(|| file_stem(file_name))
}

/// Export `source` and attach the variants to the record for `file_name`.
pub fn resize(
    catalog: &mut PhotoCatalog,
    backend: &impl ImageBackend,
    source: &Path,
    file_name: &str,
    options: &ResizeOptions,
) -> Result<Variants, BackendError> {
    let stem = output_stem(catalog, file_name);
    let variants = export_variants(backend, source, &stem, options)?;
    attach(catalog, file_name, &variants, options.format);
    Ok(variants)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::test_helpers::full_record;
    use tempfile::TempDir;

    fn options(base_dir: &Path, assets: bool) -> ResizeOptions {
        ResizeOptions {
            base_dir: base_dir.to_path_buf(),
            add_assets_prefix: assets,
            quality: Quality::new(80),
            format: OutputFormat::Jpg,
        }
    }

    // =========================================================================
    // plan_variants
    // =========================================================================

    #[test]
    fn plan_has_three_fixed_sizes_in_order() {
        let planned = plan_variants("dawn", &options(Path::new("/site"), false));
        let sizes: Vec<(SizeSlot, u32, u32)> = planned
            .iter()
            .map(|v| (v.slot, v.resolution.width, v.resolution.height))
            .collect();
        assert_eq!(
            sizes,
            vec![
                (SizeSlot::Large, 1920, 1080),
                (SizeSlot::Medium, 1024, 768),
                (SizeSlot::Small, 960, 640),
            ]
        );
    }

    #[test]
    fn plan_layout_without_assets_prefix() {
        let planned = plan_variants("dawn", &options(Path::new("/site"), false));
        assert_eq!(planned[0].output, PathBuf::from("/site/img/Lg/dawn.jpg"));
        assert_eq!(planned[0].resolution.path, "img/Lg/dawn.jpg");
        assert_eq!(planned[2].resolution.path, "img/Sm/dawn.jpg");
    }

    #[test]
    fn assets_prefix_changes_only_recorded_path() {
        let plain = plan_variants("dawn", &options(Path::new("/site"), false));
        let prefixed = plan_variants("dawn", &options(Path::new("/site"), true));

        for (a, b) in plain.iter().zip(&prefixed) {
            assert_eq!(a.output, b.output);
            assert_eq!(b.resolution.path, format!("assets/{}", a.resolution.path));
        }
        assert_eq!(prefixed[1].resolution.path, "assets/img/Md/dawn.jpg");
    }

    #[test]
    fn plan_uses_format_extension() {
        let mut opts = options(Path::new("/site"), false);
        opts.format = OutputFormat::Webp;
        let planned = plan_variants("dawn", &opts);
        assert!(planned.iter().all(|v| v.resolution.path.ends_with("dawn.webp")));
    }

    // =========================================================================
    // export_variants / resize with mock backend
    // =========================================================================

    #[test]
    fn export_creates_directories_and_calls_backend_once() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        let opts = options(tmp.path(), false);

        let variants =
            export_variants(&backend, Path::new("/in/dawn.jpg"), "dawn", &opts).unwrap();

        assert_eq!(variants.len(), 3);
        for label in ["Lg", "Md", "Sm"] {
            assert!(tmp.path().join("img").join(label).is_dir());
        }
        let exports = backend.exports();
        assert_eq!(exports.len(), 1);
        assert!(matches!(
            &exports[0],
            RecordedOp::Export { targets, quality: 80, format: OutputFormat::Jpg, .. }
                if targets.len() == 3
        ));
    }

    #[test]
    fn resize_creates_bare_record_when_missing() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        let mut catalog = PhotoCatalog::new();

        resize(
            &mut catalog,
            &backend,
            Path::new("/in/dawn.jpg"),
            "dawn.jpg",
            &options(tmp.path(), true),
        )
        .unwrap();

        let record = catalog.get("dawn.jpg").unwrap();
        assert!(record.resolutions.is_complete());
        assert!(record.camera_settings.is_empty());
        assert_eq!(
            record.resolutions.large.as_ref().unwrap().path,
            "assets/img/Lg/dawn.jpg"
        );
    }

    #[test]
    fn re_export_in_record_format_keeps_paths_and_type_consistent() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        let mut catalog = PhotoCatalog::new();
        let mut existing = full_record("dawn.jpg");
        existing.alt_name = None;
        existing.format = OutputFormat::Jpg;
        catalog.insert(existing);

        let mut batch = options(tmp.path(), false);
        batch.format = OutputFormat::Png;
        let options = batch.in_format_of(&catalog, "dawn.jpg");
        assert_eq!(options.format, OutputFormat::Jpg);

        resize(
            &mut catalog,
            &backend,
            Path::new("/in/dawn.jpg"),
            "dawn.jpg",
            &options,
        )
        .unwrap();

        let record = catalog.get("dawn.jpg").unwrap();
        assert_eq!(record.format, OutputFormat::Jpg);
        for slot in SizeSlot::ALL {
            let path = &record.resolutions.get(slot).unwrap().path;
            assert!(path.ends_with(".jpg"), "{path}");
        }
    }

    #[test]
    fn unknown_file_keeps_batch_format() {
        let tmp = TempDir::new().unwrap();
        let mut batch = options(tmp.path(), false);
        batch.format = OutputFormat::Webp;

        let options = batch.in_format_of(&PhotoCatalog::new(), "new.jpg");
        assert_eq!(options.format, OutputFormat::Webp);
    }

    #[test]
    fn resize_keeps_existing_settings_and_tags() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        let mut catalog = PhotoCatalog::new();
        let mut existing = full_record("dawn.jpg");
        existing.alt_name = None;
        existing.resolutions = Default::default();
        catalog.insert(existing.clone());

        resize(
            &mut catalog,
            &backend,
            Path::new("/in/dawn.jpg"),
            "dawn.jpg",
            &options(tmp.path(), false),
        )
        .unwrap();

        let record = catalog.get("dawn.jpg").unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(record.camera_settings, existing.camera_settings);
        assert_eq!(record.tags, existing.tags);
        assert_eq!(record.alt, existing.alt);
        assert_eq!(record.format, existing.format);
        assert_eq!(
            record.resolutions.small.as_ref().unwrap(),
            &Resolution {
                path: "img/Sm/dawn.jpg".into(),
                width: 960,
                height: 640
            }
        );
    }

    #[test]
    fn resize_names_outputs_after_alt_name() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        let mut catalog = PhotoCatalog::new();
        catalog.find_or_create("DSCF0042.JPG");
        catalog.set_alt_name("DSCF0042.JPG", "harbour");

        let variants = resize(
            &mut catalog,
            &backend,
            Path::new("/in/DSCF0042.JPG"),
            "DSCF0042.JPG",
            &options(tmp.path(), false),
        )
        .unwrap();

        assert_eq!(variants[&SizeSlot::Medium].path, "img/Md/harbour.jpg");
        // Identity stays the source file name.
        assert!(catalog.contains("DSCF0042.JPG"));
        assert!(!catalog.contains("harbour"));
    }

    #[test]
    fn resize_failure_leaves_catalog_untouched() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new().with_not_image("notes.txt");
        let mut catalog = PhotoCatalog::new();

        let err = resize(
            &mut catalog,
            &backend,
            Path::new("/in/notes.txt"),
            "notes.txt",
            &options(tmp.path(), false),
        )
        .unwrap_err();

        assert!(matches!(err, BackendError::Decode(_)));
        assert!(catalog.is_empty());
    }
}
