//! Image processing in pure Rust, with no system dependencies.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **EXIF** | `kamadak-exif` |
//! | **Crop-resize** | centered `crop_imm` + Lanczos3 `resize_exact` |
//! | **Encode** | `image` encoders; lossy WebP via `webp` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for crop geometry (unit testable)
//! - **Parameters**: Data structures describing an export
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ExifEntry, ImageBackend};
pub use calculations::{CropPlan, plan_crop};
pub use params::{ExportParams, ExportTarget, OutputFormat, ParseFormatError, Quality};
pub use rust_backend::RustBackend;
