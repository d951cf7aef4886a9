//! Disc overlap between two keypoints

use nms_core::Keypoint;
use std::f32::consts::PI;

/// Intersection over union of the discs spanned by two keypoints.
///
/// Each keypoint is a disc of diameter `size` centred on `(x, y)`. Returns 0
/// for disjoint or touching discs and 1 for identical ones. When one disc
/// lies inside the other the ratio of their areas is returned.
pub fn overlap(a: &Keypoint, b: &Keypoint) -> f32 {
    let ra = a.size * 0.5;
    let rb = b.size * 0.5;
    let ra2 = ra * ra;
    let rb2 = rb * rb;

    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dist = (dx * dx + dy * dy).sqrt();

    if ra.min(rb) + dist <= ra.max(rb) {
        let larger = ra2.max(rb2);
        if larger <= 0.0 {
            return 0.0;
        }
        return ra2.min(rb2) / larger;
    }

    if dist >= ra + rb {
        return 0.0;
    }

    // Half-angles subtended by the chord at each centre
    let d2 = dist * dist;
    let cos_alpha = ((rb2 + d2 - ra2) / (b.size * dist)).clamp(-1.0, 1.0);
    let cos_beta = ((ra2 + d2 - rb2) / (a.size * dist)).clamp(-1.0, 1.0);
    let alpha = cos_alpha.acos();
    let beta = cos_beta.acos();

    let sectors = ra2 * beta + rb2 * alpha;
    let triangles = ra2 * beta.sin() * cos_beta + rb2 * alpha.sin() * cos_alpha;
    let intersection = sectors - triangles;
    let union = (ra2 + rb2) * PI - intersection;

    (intersection / union).clamp(0.0, 1.0)
}

/// True when the overlap strictly exceeds `max_overlap`
#[inline]
pub fn overlaps(a: &Keypoint, b: &Keypoint, max_overlap: f32) -> bool {
    overlap(a, b) > max_overlap
}
