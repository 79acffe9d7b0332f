//! Moving-average smoothing across neighbouring display columns.

use crate::mapper::PixelPoint;

/// Smooths `points` in place over the columns within `radius` of each
/// point's `x`.
///
/// `points` must be sorted by `x`. Columns that received no bins are not
/// emitted, so a window only covers the points that exist in it and sparse
/// low-frequency columns are never blended with distant neighbours.
///
/// dB values are averaged directly (they are already clamped to the display
/// range, so no `-inf` reaches the mean). The overlap flag takes the majority
/// vote of its window. Windows shrink at the edges.
pub fn smooth_columns(points: &mut [PixelPoint], radius: usize) {
    if radius == 0 || points.len() < 2 {
        return;
    }

    let source = points.to_vec();
    let reach = radius as f32;
    let mut lo = 0;
    let mut hi = 0;

    for (i, point) in points.iter_mut().enumerate() {
        let x = source[i].x;
        while source[lo].x < x - reach {
            lo += 1;
        }
        while hi < source.len() && source[hi].x <= x + reach {
            hi += 1;
        }
        let window = &source[lo..hi];
        let n = window.len() as f32;

        point.left_db = window.iter().map(|p| p.left_db).sum::<f32>() / n;
        if point.right_db.is_some() {
            point.right_db = Some(
                window
                    .iter()
                    .map(|p| p.right_db.unwrap_or(p.left_db))
                    .sum::<f32>()
                    / n,
            );
        }

        let votes = window.iter().filter(|p| p.overlapping).count();
        point.overlapping = votes * 2 > window.len();
    }
}
