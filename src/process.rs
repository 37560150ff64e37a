//! Batch ingestion of a source folder.
//!
//! Every regular, non-hidden file directly inside the folder is a candidate.
//! Candidates are taken in file-name order and each one goes through:
//!
//! ```text
//! identify ──► read_exif ──► export (Lg, Md, Sm) ──► catalog
//!    │             │               │
//!    │             └─ no model ──► no-data list
//!    └─ not an image ──► skipped
//! ```
//!
//! ## Parallel Processing
//!
//! The I/O heavy part (header read, EXIF read, decode, crop-resize, encode,
//! write) runs on the [rayon](https://docs.rs/rayon) pool. The catalog is only
//! touched on the calling thread: a snapshot decides what each file needs
//! before the parallel phase, and the results are applied afterwards in
//! input order. No lock is needed and record order is deterministic.
//!
//! ## What gets skipped
//!
//! A file is left alone when it is on the no-data list, or when its record
//! already has camera settings and all three resolutions. Running the same
//! folder twice therefore changes nothing the second time. A file that fails
//! to decode is reported and skipped; any other per-file failure is reported
//! and the batch moves on. Only a missing or unreadable folder fails the
//! batch itself.

use crate::catalog::PhotoCatalog;
use crate::imaging::{BackendError, ExifEntry, ImageBackend};
use crate::metadata::{self, Extraction};
use crate::resize::{self, ResizeOptions, Variants};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot read source folder: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Source folder not found: {0}")]
    SourceNotFound(PathBuf),
    #[error("Source is not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Which passes a batch runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchMode {
    /// Metadata extraction, then resizing of files that have a record.
    #[default]
    Full,
    /// Only read EXIF into the catalog.
    MetadataOnly,
    /// Only export variants. Files without a record get a bare one.
    ResizeOnly,
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub resize: ResizeOptions,
    pub mode: BatchMode,
}

/// Why a file was not processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Nothing left to do for this file.
    AlreadyKnown,
    /// The file could not be decoded as an image.
    NotAnImage(String),
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Processed {
        /// `None` when the metadata pass did not run for this file.
        metadata: Option<Extraction>,
        /// Empty when no variants were exported.
        variants: Variants,
    },
    /// Scanned without usable EXIF and put on the no-data list.
    NoData,
    Skipped(SkipReason),
    Failed(String),
}

/// Progress events sent while a batch runs.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    FolderStarted { folder: String, file_count: usize },
    /// `index` is 1-based, in file-name order.
    FileFinished {
        index: usize,
        file_name: String,
        outcome: FileOutcome,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileResult {
    pub file_name: String,
    pub outcome: FileOutcome,
}

/// Summary of a batch, with one entry per candidate file in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessReport {
    pub files: Vec<FileResult>,
}

impl ProcessReport {
    fn count(&self, pred: impl Fn(&FileOutcome) -> bool) -> usize {
        self.files.iter().filter(|f| pred(&f.outcome)).count()
    }

    pub fn processed(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Processed { .. }))
    }

    pub fn no_data(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::NoData))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Failed(_)))
    }

    pub fn outcome(&self, file_name: &str) -> Option<&FileOutcome> {
        self.files
            .iter()
            .find(|f| f.file_name == file_name)
            .map(|f| &f.outcome)
    }
}

/// Regular, non-hidden files directly inside `folder`, sorted by name.
pub fn candidate_files(folder: &Path) -> Result<Vec<PathBuf>, ProcessError> {
    if !folder.exists() {
        return Err(ProcessError::SourceNotFound(folder.to_path_buf()));
    }
    if !folder.is_dir() {
        return Err(ProcessError::NotADirectory(folder.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        files.push(entry.into_path());
    }
    Ok(files)
}

/// Per-file work decided from the catalog before the parallel phase.
struct Job {
    path: PathBuf,
    file_name: String,
    /// Output stem, from the record's alt name if it already has one.
    stem: String,
    needs_metadata: bool,
    /// Resolutions are incomplete and resizing is enabled.
    wants_resize: bool,
    /// Resize even without usable EXIF.
    resize_unconditionally: bool,
}

/// What a worker brings back for the catalog.
struct Work {
    /// `Some` when EXIF was read: the block, or `None` if the file had none.
    exif: Option<Option<Vec<ExifEntry>>>,
    variants: Variants,
}

fn plan_job(
    catalog: &PhotoCatalog,
    path: PathBuf,
    file_name: String,
    mode: BatchMode,
) -> Option<Job> {
    if catalog.is_no_data(&file_name) {
        return None;
    }
    let record = catalog.get(&file_name);

    let needs_metadata = mode != BatchMode::ResizeOnly
        && record.is_none_or(|r| r.camera_settings.is_empty());
    let wants_resize = mode != BatchMode::MetadataOnly
        && record.is_none_or(|r| !r.resolutions.is_complete());

    if !needs_metadata && !wants_resize {
        return None;
    }

    Some(Job {
        stem: resize::output_stem(catalog, &file_name),
        resize_unconditionally: mode == BatchMode::ResizeOnly || record.is_some(),
        path,
        file_name,
        needs_metadata,
        wants_resize,
    })
}

/// Output stems that more than one resizing job in the batch would write to,
/// with the files involved.
fn shared_stems(jobs: &[(String, Option<Job>)]) -> Vec<(String, Vec<String>)> {
    let mut by_stem: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for job in jobs.iter().filter_map(|(_, job)| job.as_ref()) {
        if job.wants_resize {
            by_stem
                .entry(job.stem.as_str())
                .or_default()
                .push(job.file_name.clone());
        }
    }
    by_stem
        .into_iter()
        .filter(|(_, files)| files.len() > 1)
        .map(|(stem, files)| (stem.to_string(), files))
        .collect()
}

fn skip_or_fail(file_name: &str, err: BackendError) -> FileOutcome {
    match err {
        BackendError::Decode(msg) => {
            debug!(file = file_name, reason = %msg, "not an image");
            FileOutcome::Skipped(SkipReason::NotAnImage(msg))
        }
        other => {
            warn!(file = file_name, error = %other, "processing failed");
            FileOutcome::Failed(other.to_string())
        }
    }
}

fn run_job(
    backend: &impl ImageBackend,
    job: &Job,
    options: &ResizeOptions,
) -> Result<Work, FileOutcome> {
    backend
        .identify(&job.path)
        .map_err(|e| skip_or_fail(&job.file_name, e))?;

    let exif = if job.needs_metadata {
        let entries = backend
            .read_exif(&job.path)
            .map_err(|e| skip_or_fail(&job.file_name, e))?;
        Some(entries)
    } else {
        None
    };

    let usable = exif
        .as_ref()
        .is_some_and(|entries| metadata::has_usable_metadata(entries.as_deref()));
    let variants = if job.wants_resize && (job.resize_unconditionally || usable) {
        resize::export_variants(backend, &job.path, &job.stem, options)
            .map_err(|e| skip_or_fail(&job.file_name, e))?
    } else {
        Variants::new()
    };

    Ok(Work { exif, variants })
}

fn apply(
    catalog: &mut PhotoCatalog,
    job: &Job,
    work: Work,
    options: &ResizeOptions,
) -> FileOutcome {
    let extraction = work.exif.map(|entries| {
        metadata::extract(catalog, &job.file_name, entries.as_deref(), options.format)
    });

    if !work.variants.is_empty() {
        resize::attach(catalog, &job.file_name, &work.variants, options.format);
    }

    match extraction {
        Some(Extraction::NoData) if work.variants.is_empty() => FileOutcome::NoData,
        metadata => FileOutcome::Processed {
            metadata,
            variants: work.variants,
        },
    }
}

/// Ingest every candidate file in `folder` into `catalog`.
///
/// Progress is reported on `events` when given. A file's event is sent once
/// its result has been applied to the catalog, in file-name order.
pub fn process_folder(
    catalog: &mut PhotoCatalog,
    backend: &impl ImageBackend,
    folder: &Path,
    options: &BatchOptions,
    events: Option<Sender<ProcessEvent>>,
) -> Result<ProcessReport, ProcessError> {
    let files = candidate_files(folder)?;
    info!(folder = %folder.display(), files = files.len(), "processing folder");

    if let Some(tx) = &events {
        tx.send(ProcessEvent::FolderStarted {
            folder: folder.display().to_string(),
            file_count: files.len(),
        })
        .ok();
    }

    let jobs: Vec<(String, Option<Job>)> = files
        .into_iter()
        .map(|path| {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let job = plan_job(catalog, path, file_name.clone(), options.mode);
            (file_name, job)
        })
        .collect();

    for (stem, files) in shared_stems(&jobs) {
        warn!(
            stem = %stem,
            files = ?files,
            "files share an output stem, their variants overwrite each other"
        );
    }

    let results: Vec<Option<Result<Work, FileOutcome>>> = jobs
        .par_iter()
        .map(|(_, job)| {
            job.as_ref()
                .map(|job| run_job(backend, job, &options.resize))
        })
        .collect();

    let mut report = ProcessReport::default();
    for (i, ((file_name, job), result)) in jobs.into_iter().zip(results).enumerate() {
        let outcome = match (job, result) {
            (Some(job), Some(Ok(work))) => apply(catalog, &job, work, &options.resize),
            (_, Some(Err(outcome))) => outcome,
            _ => FileOutcome::Skipped(SkipReason::AlreadyKnown),
        };

        if let Some(tx) = &events {
            tx.send(ProcessEvent::FileFinished {
                index: i + 1,
                file_name: file_name.clone(),
                outcome: outcome.clone(),
            })
            .ok();
        }
        report.files.push(FileResult { file_name, outcome });
    }

    info!(
        processed = report.processed(),
        no_data = report.no_data(),
        skipped = report.skipped(),
        failed = report.failed(),
        "folder done"
    );
    Ok(report)
}
