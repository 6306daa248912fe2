//! Fitting a source rectangle into a target rectangle

use crate::types::FitMode;

use super::PlacementRect;

/// Compute where a `source_w` x `source_h` rectangle lands inside a
/// `target_w` x `target_h` rectangle.
///
/// The result keeps the source aspect ratio and is centered on both axes.
/// Coordinates are relative to the target's own origin; callers add any
/// margin offset. Under [`FitMode::Cover`] the rectangle may extend past the
/// target on one axis (negative `x` or `y`); the consumer clips it.
///
/// All four lengths must be positive.
pub fn fit(
    source_w: f32,
    source_h: f32,
    target_w: f32,
    target_h: f32,
    mode: FitMode,
) -> PlacementRect {
    debug_assert!(source_w > 0.0 && source_h > 0.0);
    debug_assert!(target_w > 0.0 && target_h > 0.0);

    let source_ratio = source_w / source_h;
    let target_ratio = target_w / target_h;

    let (width, height) = match mode {
        FitMode::Contain => {
            if source_ratio > target_ratio {
                (target_w, target_w / source_ratio)
            } else {
                (target_h * source_ratio, target_h)
            }
        }
        FitMode::Cover => {
            if source_ratio > target_ratio {
                (target_h * source_ratio, target_h)
            } else {
                (target_w, target_w / source_ratio)
            }
        }
    };

    PlacementRect::new(
        (target_w - width) / 2.0,
        (target_h - height) / 2.0,
        width,
        height,
    )
}
