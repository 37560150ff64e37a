//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations the pipeline needs:
//! identify (is this an image at all?), read_exif, and export.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Tests use the recording
//! `MockBackend` in this module's test submodule.

use super::params::ExportParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not an image we can decode. Callers treat this as
    /// "skip with a message", never as a batch failure.
    #[error("Not a decodable image: {0}")]
    Decode(String),
    #[error("Encoding failed: {0}")]
    Encode(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// One raw EXIF field as read from a file.
///
/// `value` keeps the raw textual form the normalizers expect: rationals as
/// `"N/D"`, integers as decimal strings, ASCII as its trimmed text. Multi-valued
/// fields are comma-joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExifEntry {
    pub tag: exif::Tag,
    pub value: String,
}

impl ExifEntry {
    pub fn new(tag: exif::Tag, value: impl Into<String>) -> Self {
        Self {
            tag,
            value: value.into(),
        }
    }
}

/// Trait for image processing backends.
///
/// `Sync` so one backend can be shared across the rayon worker pool.
pub trait ImageBackend: Sync {
    /// Read the header and report dimensions. Fails with
    /// [`BackendError::Decode`] for anything that is not a supported image.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Read the embedded EXIF block.
    ///
    /// `Ok(None)` means the file carries no EXIF block at all; an empty
    /// vector means a block was present but held no fields.
    fn read_exif(&self, path: &Path) -> Result<Option<Vec<ExifEntry>>, BackendError>;

    /// Decode the source once, then crop-resize, strip metadata and encode
    /// one output per target.
    fn export(&self, params: &ExportParams) -> Result<(), BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::params::{ExportTarget, OutputFormat, Quality};
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    /// Mock backend that records operations without executing them.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    ///
    /// Behaviour is keyed by file name so results do not depend on the order
    /// rayon happens to schedule files in.
    #[derive(Default)]
    pub struct MockBackend {
        pub exif: Mutex<HashMap<String, Vec<ExifEntry>>>,
        pub not_images: Mutex<HashSet<String>>,
        pub failing_exports: Mutex<HashSet<String>>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(String),
        ReadExif(String),
        Export {
            source: String,
            targets: Vec<(String, u32, u32)>,
            format: OutputFormat,
            quality: u32,
        },
    }

    fn file_name(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Register EXIF entries returned for `name`. Files without an entry
        /// report no EXIF block.
        pub fn with_exif(self, name: &str, entries: Vec<ExifEntry>) -> Self {
            self.exif.lock().unwrap().insert(name.to_string(), entries);
            self
        }

        /// Mark `name` as undecodable: identify and export fail with `Decode`.
        pub fn with_not_image(self, name: &str) -> Self {
            self.not_images.lock().unwrap().insert(name.to_string());
            self
        }

        /// Make export of `name` fail with a non-decode error.
        pub fn with_failing_export(self, name: &str) -> Self {
            self.failing_exports
                .lock()
                .unwrap()
                .insert(name.to_string());
            self
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn exports(&self) -> Vec<RecordedOp> {
            self.get_operations()
                .into_iter()
                .filter(|op| matches!(op, RecordedOp::Export { .. }))
                .collect()
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
            let name = file_name(path);
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(name.clone()));

            if self.not_images.lock().unwrap().contains(&name) {
                return Err(BackendError::Decode(format!("{name}: unsupported format")));
            }
            Ok(Dimensions {
                width: 4000,
                height: 3000,
            })
        }

        fn read_exif(&self, path: &Path) -> Result<Option<Vec<ExifEntry>>, BackendError> {
            let name = file_name(path);
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::ReadExif(name.clone()));

            Ok(self.exif.lock().unwrap().get(&name).cloned())
        }

        fn export(&self, params: &ExportParams) -> Result<(), BackendError> {
            let name = file_name(&params.source);
            self.operations.lock().unwrap().push(RecordedOp::Export {
                source: name.clone(),
                targets: params
                    .targets
                    .iter()
                    .map(|t| (t.output.to_string_lossy().to_string(), t.width, t.height))
                    .collect(),
                format: params.format,
                quality: params.quality.value(),
            });

            if self.not_images.lock().unwrap().contains(&name) {
                return Err(BackendError::Decode(format!("{name}: unsupported format")));
            }
            if self.failing_exports.lock().unwrap().contains(&name) {
                return Err(BackendError::Encode(format!("{name}: disk full")));
            }
            Ok(())
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::new();

        let result = backend.identify(Path::new("/test/image.jpg")).unwrap();
        assert_eq!(result.width, 4000);

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Identify(p) if p == "image.jpg"));
    }

    #[test]
    fn mock_returns_registered_exif_by_name() {
        let backend = MockBackend::new().with_exif(
            "a.jpg",
            vec![ExifEntry::new(exif::Tag::Model, "X100V")],
        );

        let found = backend.read_exif(Path::new("/in/a.jpg")).unwrap();
        assert_eq!(found.unwrap()[0].value, "X100V");
        assert!(backend.read_exif(Path::new("/in/b.jpg")).unwrap().is_none());
    }

    #[test]
    fn mock_not_image_fails_with_decode() {
        let backend = MockBackend::new().with_not_image("notes.txt");
        let err = backend.identify(Path::new("/in/notes.txt")).unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)));
    }

    #[test]
    fn mock_records_export() {
        let backend = MockBackend::new();

        backend
            .export(&ExportParams {
                source: "/in/source.jpg".into(),
                targets: vec![ExportTarget {
                    output: "/out/img/Lg/source.jpg".into(),
                    width: 1920,
                    height: 1080,
                }],
                format: OutputFormat::Jpg,
                quality: Quality::new(90),
            })
            .unwrap();

        let ops = backend.exports();
        assert_eq!(ops.len(), 1);
        assert!(matches!(
            &ops[0],
            RecordedOp::Export { quality: 90, targets, .. } if targets[0].1 == 1920
        ));
    }
}
