//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every file leads with its positional index and name; what happened to it
//! follows as indented context lines. Paths shown are the recorded paths, the
//! same strings a consumer of the catalog reads.
//!
//! # Output Format
//!
//! ## Process
//!
//! ```text
//! photos/ (3 files)
//!     001 DSCF0042.JPG
//!         Metadata: recorded
//!         Lg: img/Lg/DSCF0042.jpg
//!         Md: img/Md/DSCF0042.jpg
//!         Sm: img/Sm/DSCF0042.jpg
//!     002 notes.txt
//!         Skipped: not an image
//!     003 scan.png
//!         No EXIF data
//! Processed 1, no data 1, skipped 1, failed 0
//! ```
//!
//! ## List
//!
//! ```text
//! 001 DSCF0042.JPG → harbour-at-dusk
//!     Camera: X-T5, XF33mmF1.4 R LM WR, 1/250, f/2.8, ISO 400
//!     Alt: Fishing boats moored at dusk
//!     Tags: harbour, boats
//!     Lg: assets/img/Lg/harbour-at-dusk.jpg (1920x1080)
//!
//! No EXIF data
//!     scan.png
//! ```
//!
//! # Architecture
//!
//! Each display has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::catalog::{CameraSettings, PhotoCatalog, PhotoRecord, SizeSlot};
use crate::metadata::Extraction;
use crate::process::{FileOutcome, ProcessEvent, ProcessReport, SkipReason};

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    format!("{} {}", n, if n == 1 { one } else { many })
}

/// One-line camera summary, leaving out absent fields.
fn camera_summary(settings: &CameraSettings) -> Option<String> {
    let parts: Vec<String> = [
        settings.camera_model.clone(),
        settings.lens_model.clone(),
        settings.shutter_speed.clone(),
        settings.aperture.map(|f| format!("f/{}", f)),
        settings.iso_value.as_ref().map(|iso| format!("ISO {}", iso)),
    ]
    .into_iter()
    .flatten()
    .collect();
    (!parts.is_empty()).then(|| parts.join(", "))
}

// ============================================================================
// Process output
// ============================================================================

/// Format a single process progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::FolderStarted { folder, file_count } => {
            vec![format!("{} ({})", folder, plural(*file_count, "file", "files"))]
        }
        ProcessEvent::FileFinished {
            index,
            file_name,
            outcome,
        } => {
            let mut lines = vec![format!(
                "{}{} {}",
                indent(1),
                format_index(*index),
                file_name
            )];
            let ctx = indent(2);
            match outcome {
                FileOutcome::Processed { metadata, variants } => {
                    match metadata {
                        Some(Extraction::Recorded) => {
                            lines.push(format!("{ctx}Metadata: recorded"))
                        }
                        Some(Extraction::AlreadyPopulated) => {
                            lines.push(format!("{ctx}Metadata: unchanged"))
                        }
                        Some(Extraction::NoData) => lines.push(format!("{ctx}Metadata: none")),
                        None => {}
                    }
                    for (slot, resolution) in variants {
                        lines.push(format!("{ctx}{}: {}", slot.label(), resolution.path));
                    }
                }
                FileOutcome::NoData => lines.push(format!("{ctx}No EXIF data")),
                FileOutcome::Skipped(SkipReason::AlreadyKnown) => {
                    lines.push(format!("{ctx}Skipped: already catalogued"))
                }
                FileOutcome::Skipped(SkipReason::NotAnImage(_)) => {
                    lines.push(format!("{ctx}Skipped: not an image"))
                }
                FileOutcome::Failed(reason) => lines.push(format!("{ctx}Failed: {reason}")),
            }
            lines
        }
    }
}

/// One-line batch summary.
pub fn format_report(report: &ProcessReport) -> Vec<String> {
    vec![format!(
        "Processed {}, no data {}, skipped {}, failed {}",
        report.processed(),
        report.no_data(),
        report.skipped(),
        report.failed()
    )]
}

// ============================================================================
// Catalog listing
// ============================================================================

fn format_record(index: usize, record: &PhotoRecord) -> Vec<String> {
    let ctx = indent(1);
    let header = match &record.alt_name {
        Some(alt_name) => format!(
            "{} {} \u{2192} {}",
            format_index(index),
            record.file_name,
            alt_name
        ),
        None => format!("{} {}", format_index(index), record.file_name),
    };
    let mut lines = vec![header];

    if let Some(summary) = camera_summary(&record.camera_settings) {
        lines.push(format!("{ctx}Camera: {summary}"));
    }
    if let Some(alt) = &record.alt {
        lines.push(format!("{ctx}Alt: {alt}"));
    }
    if !record.tags.is_empty() {
        lines.push(format!("{ctx}Tags: {}", record.tags.join(", ")));
    }
    for slot in SizeSlot::ALL {
        if let Some(resolution) = record.resolutions.get(slot) {
            lines.push(format!(
                "{ctx}{}: {} ({}x{})",
                slot.label(),
                resolution.path,
                resolution.width,
                resolution.height
            ));
        }
    }
    lines
}

/// Format every record in catalog order, then the no-data list.
pub fn format_catalog(catalog: &PhotoCatalog) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, record) in catalog.records().iter().enumerate() {
        lines.extend(format_record(i + 1, record));
    }

    if !catalog.no_data().is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push("No EXIF data".to_string());
        for name in catalog.no_data() {
            lines.push(format!("{}{}", indent(1), name));
        }
    }

    if lines.is_empty() {
        lines.push("Catalog is empty".to_string());
    }
    lines
}

/// Print the catalog listing to stdout.
pub fn print_catalog(catalog: &PhotoCatalog) {
    for line in format_catalog(catalog) {
        println!("{}", line);
    }
}
