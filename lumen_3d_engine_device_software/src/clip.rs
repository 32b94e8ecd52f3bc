/// Homogeneous clipping of triangles against the view volume.
///
/// Both render and selection mode use this to decide whether a triangle is
/// visible: a triangle survives when some part of it lies inside
/// `-w <= x, y, z <= w`. Depths are reported in window units `[0, 1]`.

use glam::Vec4;

/// The six clip planes as `(axis, sign)`: inside when `w + sign * v[axis] >= 0`
const PLANES: [(usize, f32); 6] = [
    (0, 1.0),
    (0, -1.0),
    (1, 1.0),
    (1, -1.0),
    (2, 1.0),
    (2, -1.0),
];

fn distance(v: Vec4, axis: usize, sign: f32) -> f32 {
    v.w + sign * v[axis]
}

/// Clip one triangle given in clip coordinates.
///
/// Returns the window-depth range `(min, max)` covered by the visible part,
/// or `None` when nothing of it is inside the view volume.
pub fn clip_triangle(triangle: [Vec4; 3]) -> Option<(f32, f32)> {
    let mut polygon: Vec<Vec4> = triangle.to_vec();

    for &(axis, sign) in PLANES.iter() {
        if polygon.is_empty() {
            return None;
        }
        let mut clipped = Vec::with_capacity(polygon.len() + 2);
        for i in 0..polygon.len() {
            let current = polygon[i];
            let next = polygon[(i + 1) % polygon.len()];
            let d_current = distance(current, axis, sign);
            let d_next = distance(next, axis, sign);

            if d_current >= 0.0 {
                clipped.push(current);
            }
            if (d_current >= 0.0) != (d_next >= 0.0) {
                let t = d_current / (d_current - d_next);
                clipped.push(current + (next - current) * t);
            }
        }
        polygon = clipped;
    }

    polygon
        .iter()
        .filter(|v| v.w > f32::EPSILON)
        .map(|v| (v.z / v.w + 1.0) * 0.5)
        .fold(None, |range, depth| match range {
            None => Some((depth, depth)),
            Some((lo, hi)) => Some((lo.min(depth), hi.max(depth))),
        })
        .map(|(lo, hi)| (lo.clamp(0.0, 1.0), hi.clamp(0.0, 1.0)))
}
