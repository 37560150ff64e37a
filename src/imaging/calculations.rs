//! Pure calculation functions for crop-resize geometry.
//!
//! All functions here are pure and testable without any I/O or images.

/// Largest target an export may request, in pixels.
pub const MAX_TARGET_PIXELS: u64 = 64 * 1024 * 1024;

/// How to turn a source image into an exact target size: crop a centered
/// `crop`-sized window at `offset` out of the source (at source resolution,
/// with the target's aspect ratio), then scale that window to `target`.
///
/// The only buffers this needs are the source and the target, whatever the
/// source's aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropPlan {
    pub crop: (u32, u32),
    pub offset: (u32, u32),
    pub target: (u32, u32),
}

/// Largest window inside `source` with the aspect ratio of `target`.
///
/// One edge matches the source exactly, the other is trimmed. Neither edge is
/// ever smaller than one pixel.
pub fn calculate_crop_window(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = (u64::from(source.0), u64::from(source.1));
    let (tgt_w, tgt_h) = (u64::from(target.0), u64::from(target.1));

    if src_w * tgt_h > src_h * tgt_w {
        // Wider than the target: keep the height, trim the width
        let w = (src_h * tgt_w + tgt_h / 2) / tgt_h;
        (w.clamp(1, src_w) as u32, source.1)
    } else {
        let h = (src_w * tgt_h + tgt_w / 2) / tgt_w;
        (source.0, h.clamp(1, src_h) as u32)
    }
}

/// Plan a centered crop-and-scale from `source` to exactly `target`.
///
/// Returns `None` when either size has a zero edge, or when the target
/// exceeds [`MAX_TARGET_PIXELS`].
pub fn plan_crop(source: (u32, u32), target: (u32, u32)) -> Option<CropPlan> {
    if source.0 == 0 || source.1 == 0 || target.0 == 0 || target.1 == 0 {
        return None;
    }
    if u64::from(target.0) * u64::from(target.1) > MAX_TARGET_PIXELS {
        return None;
    }
    let crop = calculate_crop_window(source, target);
    let offset = ((source.0 - crop.0) / 2, (source.1 - crop.1) / 2);
    Some(CropPlan {
        crop,
        offset,
        target,
    })
}
