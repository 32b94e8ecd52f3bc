/// Homogeneous 4x4 transforms in double precision.
///
/// Scene math runs in `f64` so that coordinates spanning hundreds of orders of
/// magnitude survive until the global correction factor brings them into
/// range. Only at the device boundary is a transform narrowed to `f32`
/// through [`Transform::to_gpu`].

use std::ops::Mul;
use bytemuck::{Pod, Zeroable};
use glam::{DMat4, DVec3, DVec4, Mat4};

/// Cosine above which an axis and its up vector count as parallel
pub const PARALLEL_COSINE: f64 = 0.98;

/// Affine or projective 4x4 transform (column-major, column vectors)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    matrix: DMat4,
}

/// Single-precision matrix laid out for upload
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuMatrix {
    /// Columns, each `[x, y, z, w]`
    pub cols: [[f32; 4]; 4],
}

impl GpuMatrix {
    /// Raw bytes in column-major order
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// Convert back to a glam matrix
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.cols)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self { matrix: DMat4::IDENTITY }
    }

    pub fn from_matrix(matrix: DMat4) -> Self {
        Self { matrix }
    }

    pub fn matrix(&self) -> &DMat4 {
        &self.matrix
    }

    /// Build from four columns; the last row is taken from each column's `w`
    pub fn from_columns(x: DVec4, y: DVec4, z: DVec4, w: DVec4) -> Self {
        Self { matrix: DMat4::from_cols(x, y, z, w) }
    }

    pub fn translation(offset: DVec3) -> Self {
        Self { matrix: DMat4::from_translation(offset) }
    }

    pub fn scale(factors: DVec3) -> Self {
        Self { matrix: DMat4::from_scale(factors) }
    }

    /// Right-handed rotation by `angle` radians about `axis`.
    ///
    /// The axis is normalized here; a zero axis yields the identity.
    pub fn rotation(angle: f64, axis: DVec3) -> Self {
        match axis.try_normalize() {
            Some(axis) => Self { matrix: DMat4::from_axis_angle(axis, angle) },
            None => Self::identity(),
        }
    }

    /// Rotation about an axis passing through `origin`
    pub fn rotation_about(angle: f64, axis: DVec3, origin: DVec3) -> Self {
        let mut ret = Self::rotation(angle, axis);
        let moved = ret.transform_point(origin);
        ret.matrix.w_axis = (origin - moved).extend(1.0);
        ret
    }

    /// Camera transform looking from `eye` toward `target`
    pub fn look_at(eye: DVec3, target: DVec3, up: DVec3) -> Self {
        Self { matrix: DMat4::look_at_rh(eye, target, up) }
    }

    /// Perspective frustum and its closed-form inverse.
    ///
    /// Arguments follow the classic `glFrustum` convention: the near plane
    /// rectangle `[left, right] x [bottom, top]` at distance `near`, and the
    /// far plane at `far`. Both distances must be positive with `near < far`.
    pub fn frustum(left: f64, right: f64, bottom: f64, top: f64, near: f64, far: f64) -> (Self, Self) {
        let projection = DMat4::from_cols(
            DVec4::new(2.0 * near / (right - left), 0.0, 0.0, 0.0),
            DVec4::new(0.0, 2.0 * near / (top - bottom), 0.0, 0.0),
            DVec4::new(
                (right + left) / (right - left),
                (top + bottom) / (top - bottom),
                (far + near) / (near - far),
                -1.0,
            ),
            DVec4::new(0.0, 0.0, 2.0 * far * near / (near - far), 0.0),
        );
        let inverse = DMat4::from_cols(
            DVec4::new((right - left) / (2.0 * near), 0.0, 0.0, 0.0),
            DVec4::new(0.0, (top - bottom) / (2.0 * near), 0.0, 0.0),
            DVec4::new(0.0, 0.0, 0.0, (near - far) / (2.0 * far * near)),
            DVec4::new(
                (right + left) / (2.0 * near),
                (top + bottom) / (2.0 * near),
                -1.0,
                (far + near) / (2.0 * far * near),
            ),
        );
        (Self { matrix: projection }, Self { matrix: inverse })
    }

    /// Restrict drawing to a `width` x `height` pixel region around `(x, y)`.
    ///
    /// Pre-multiplied onto a projection, it maps the region to the whole
    /// clip volume, which is how selection mode knows what lies under the
    /// cursor. `viewport` is `[x, y, width, height]`.
    pub fn pick_matrix(x: f64, y: f64, width: f64, height: f64, viewport: [f64; 4]) -> Self {
        if width <= 0.0 || height <= 0.0 {
            return Self::identity();
        }
        let [vx, vy, vw, vh] = viewport;
        let offset = DVec3::new(
            (vw - 2.0 * (x - vx)) / width,
            (vh - 2.0 * (y - vy)) / height,
            0.0,
        );
        Self::translation(offset).compose(&Self::scale(DVec3::new(vw / width, vh / height, 1.0)))
    }

    /// `self * rhs`: apply `rhs` first, then `self`
    pub fn compose(&self, rhs: &Transform) -> Self {
        Self { matrix: self.matrix * rhs.matrix }
    }

    /// Inverse of a rigid transform (orthonormal rotation plus translation).
    ///
    /// Uses the transpose instead of a general inversion. The result is only
    /// meaningful when the upper 3x3 block is orthonormal.
    pub fn invert_ortho(&self) -> Self {
        let m = &self.matrix;
        let (x, y, z, t) = (m.x_axis.truncate(), m.y_axis.truncate(), m.z_axis.truncate(), m.w_axis.truncate());
        Self {
            matrix: DMat4::from_cols(
                DVec4::new(x.x, y.x, z.x, 0.0),
                DVec4::new(x.y, y.y, z.y, 0.0),
                DVec4::new(x.z, y.z, z.z, 0.0),
                DVec4::new(-x.dot(t), -y.dot(t), -z.dot(t), 1.0),
            ),
        }
    }

    /// General inverse; `None` for a singular matrix
    pub fn inverse(&self) -> Option<Self> {
        let det = self.matrix.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        Some(Self { matrix: self.matrix.inverse() })
    }

    /// Transform a point, ignoring any projective row
    pub fn transform_point(&self, point: DVec3) -> DVec3 {
        self.matrix.transform_point3(point)
    }

    /// Transform a direction (no translation)
    pub fn transform_vector(&self, vector: DVec3) -> DVec3 {
        self.matrix.transform_vector3(vector)
    }

    /// Transform a point with perspective division
    pub fn project_point(&self, point: DVec3) -> DVec3 {
        self.matrix.project_point3(point)
    }

    /// Apply the inverse of a rigid transform to `v` without building it.
    ///
    /// `w` is 1 for points and 0 for directions.
    pub fn times_inv(&self, v: DVec3, w: f64) -> DVec3 {
        let m = &self.matrix;
        let d = v - m.w_axis.truncate() * w;
        DVec3::new(
            m.x_axis.truncate().dot(d),
            m.y_axis.truncate().dot(d),
            m.z_axis.truncate().dot(d),
        )
    }

    /// Narrow to single precision
    pub fn as_mat4(&self) -> Mat4 {
        self.matrix.as_mat4()
    }

    /// Narrow to single precision in an upload-ready layout
    pub fn to_gpu(&self) -> GpuMatrix {
        GpuMatrix { cols: self.matrix.as_mat4().to_cols_array_2d() }
    }
}

impl Mul for Transform {
    type Output = Transform;

    fn mul(self, rhs: Transform) -> Transform {
        self.compose(&rhs)
    }
}

impl From<DMat4> for Transform {
    fn from(matrix: DMat4) -> Self {
        Self::from_matrix(matrix)
    }
}

/// Orthonormal basis derived from an axis and an up hint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Basis {
    pub x: DVec3,
    pub y: DVec3,
    pub z: DVec3,
    /// The up hint was nearly parallel to the axis and a synthetic one was used
    pub degenerate: bool,
}

/// Build the local basis shared by frames and primitives.
///
/// `x` follows `axis`. `z` is `axis x up` unless the two are within
/// [`PARALLEL_COSINE`] of parallel, in which case `-x` (or `+z` when the axis
/// itself lies along x) stands in for `up`. Returns `None` when `axis` or `up`
/// has zero length.
pub fn orthonormal_basis(axis: DVec3, up: DVec3) -> Option<Basis> {
    let x = axis.try_normalize()?;
    let up_length = up.length();
    if up_length == 0.0 || !up_length.is_finite() {
        return None;
    }

    let cosine = x.dot(up).abs() / up_length;
    let degenerate = cosine > PARALLEL_COSINE;
    let z = if degenerate {
        if x.dot(DVec3::NEG_X).abs() > PARALLEL_COSINE {
            x.cross(DVec3::Z)
        } else {
            x.cross(DVec3::NEG_X)
        }
    } else {
        x.cross(up)
    }
    .try_normalize()?;
    let y = z.cross(x).normalize();

    Some(Basis { x, y, z, degenerate })
}

/// Length of `v` without overflowing when the squares would.
///
/// Components up to `f64::MAX / 2` give a finite result.
pub fn stable_length(v: DVec3) -> f64 {
    let largest = v.abs().max_element();
    if largest == 0.0 || !largest.is_finite() {
        return largest;
    }
    (v / largest).length() * largest
}

#[cfg(test)]
#[path = "transform_tests.rs"]
mod tests;
