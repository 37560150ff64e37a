//! # photo-catalog
//!
//! Ingests a folder of photographs into a JSON catalog. For every image it
//! reads the camera settings from EXIF and exports three web-sized,
//! metadata-stripped variants. The catalog is then curated in place with
//! tags, alt text and rename targets.
//!
//! # Architecture
//!
//! ```text
//! folder/ ──► process ──┬─► metadata ──► catalog ──► serializer ──► photos.json
//!                       └─► resize ─────────┘
//!                             │
//!                             └─► {base_dir}/img/{Lg,Md,Sm}/
//! ```
//!
//! A [`catalog::PhotoCatalog`] is built once per run and passed by reference
//! to every stage. Records are keyed by source file name; the metadata and
//! resize passes both find-or-create the same record, in either order.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`catalog`] | Records, resolution slots, the no-data list, and their invariants |
//! | [`normalize`] | Raw EXIF strings → display values (shutter speed, aperture, ISO) |
//! | [`metadata`] | The five recognized EXIF tags and the record/no-data decision |
//! | [`resize`] | The three fixed-size exports and their recorded paths |
//! | [`process`] | Folder batches: candidate discovery, parallel work, progress events |
//! | [`serializer`] | JSON document format, load/save, dedupe on load |
//! | [`config`] | `photo-catalog.toml` loading, validation, and merging |
//! | [`imaging`] | Pure-Rust image operations behind the [`imaging::ImageBackend`] trait |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Catalog Mutation Stays on One Thread
//!
//! Decoding and encoding run on the rayon pool, but only the calling thread
//! writes to the catalog, in file-name order. Uniqueness holds without a lock
//! and the catalog comes out in the same order on every run.
//!
//! ## Stripping by Construction
//!
//! Variants are encoded from freshly decoded pixel buffers. No encoder is ever
//! handed a profile or marker segment, so there is nothing to strip after the
//! fact.

pub mod catalog;
pub mod config;
pub mod imaging;
pub mod metadata;
pub mod normalize;
pub mod output;
pub mod process;
pub mod resize;
pub mod serializer;

#[cfg(test)]
pub(crate) mod test_helpers;
