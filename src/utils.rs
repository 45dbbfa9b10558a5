//! Utility functions for box geometry and safe numeric casts.

pub mod safe_cast;

use opencv::core::Rect;
use safe_cast::f32_to_i32_clamp;

/// Expand a face bounding box by `shift` of its size, square it, and clamp it
/// to the image boundaries. Landmark networks expect a loose square crop.
#[must_use]
#[allow(clippy::cast_precision_loss)] // Precision loss acceptable for box dimensions
pub fn refine_box(bbox: Rect, max_width: i32, max_height: i32, shift: f32) -> Rect {
    let mut bbox = bbox;

    let x_shift = f32_to_i32_clamp(bbox.width as f32 * shift, 0, max_width);
    let y_shift = f32_to_i32_clamp(bbox.height as f32 * shift, 0, max_height);

    bbox.x = (bbox.x - x_shift).max(0);
    bbox.y = (bbox.y - y_shift).max(0);
    bbox.width = (bbox.width + 2 * x_shift).min(max_width - bbox.x);
    bbox.height = (bbox.height + 2 * y_shift).min(max_height - bbox.y);

    // Make it square
    let side_length = bbox.width.max(bbox.height).min(max_width).min(max_height);
    bbox.width = side_length;
    bbox.height = side_length;

    if bbox.x + bbox.width > max_width {
        bbox.x = max_width - bbox.width;
    }
    if bbox.y + bbox.height > max_height {
        bbox.y = max_height - bbox.height;
    }

    bbox
}
