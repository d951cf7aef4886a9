use nms_core::ResponseMap;

/// Lower bound of the 8-bit normalized response range
pub const NORMALIZED_MIN: f32 = 0.0;
/// Upper bound of the 8-bit normalized response range
pub const NORMALIZED_MAX: f32 = 255.0;

/// Stretch the finite values of `map` linearly onto `[lo, hi]`.
///
/// The smallest finite value maps to `lo` and the largest to `hi`. A map whose
/// finite values are all equal maps to `lo`. NaN and infinite cells do not take
/// part in the min/max search; NaN stays NaN. A map without any finite value is
/// returned unchanged.
pub fn normalize_min_max(map: &ResponseMap, lo: f32, hi: f32) -> ResponseMap {
    let Some((min, max)) = finite_range(map) else {
        return map.clone();
    };

    let (min, max) = (min as f64, max as f64);
    let span = max - min;
    let scale = if span > f64::EPSILON {
        (hi as f64 - lo as f64) / span
    } else {
        0.0
    };
    let shift = lo as f64 - min * scale;

    map.map_values(|v| (v as f64 * scale + shift) as f32)
}

/// Stretch onto the 8-bit range `[0, 255]`
pub fn normalize_to_u8_range(map: &ResponseMap) -> ResponseMap {
    normalize_min_max(map, NORMALIZED_MIN, NORMALIZED_MAX)
}

/// Truncate every value toward zero.
///
/// A response of 100.9 becomes 100 and no longer passes a threshold of 100.
pub fn truncate_responses(map: &ResponseMap) -> ResponseMap {
    map.map_values(f32::trunc)
}

fn finite_range(map: &ResponseMap) -> Option<(f32, f32)> {
    map.data()
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
