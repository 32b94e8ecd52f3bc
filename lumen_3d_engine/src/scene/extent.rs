/// Extent - world-space bounding volume accumulated once per extent pass.
///
/// Besides the axis-aligned box, an extent counts how many selection-buffer
/// words a pick over the scene can need: every body adds the fixed hit-record
/// overhead plus one word per enclosing frame.

use glam::DVec3;
use crate::math::{Transform, stable_length};

/// Words of every selection hit record besides its name stack
pub const HIT_RECORD_OVERHEAD: usize = 4;

/// Near plane never closer than this fraction of the far plane
pub const NEAR_FAR_RATIO: f64 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub struct Extent {
    mins: DVec3,
    maxs: DVec3,
    first: bool,
    frame_depth: usize,
    select_buffer_depth: usize,
}

impl Default for Extent {
    fn default() -> Self {
        Self::new()
    }
}

impl Extent {
    /// Empty extent at nesting depth 0
    pub fn new() -> Self {
        Self {
            mins: DVec3::ZERO,
            maxs: DVec3::ZERO,
            first: true,
            frame_depth: 0,
            select_buffer_depth: 0,
        }
    }

    /// Forget all bounds and counters
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn is_empty(&self) -> bool {
        self.first
    }

    pub fn mins(&self) -> DVec3 {
        self.mins
    }

    pub fn maxs(&self) -> DVec3 {
        self.maxs
    }

    pub fn frame_depth(&self) -> usize {
        self.frame_depth
    }

    /// Selection-buffer words needed to pick anything accumulated so far
    pub fn select_buffer_depth(&self) -> usize {
        self.select_buffer_depth
    }

    pub fn add_point(&mut self, point: DVec3) {
        if self.first {
            self.first = false;
            self.mins = point;
            self.maxs = point;
        } else {
            self.mins = self.mins.min(point);
            self.maxs = self.maxs.max(point);
        }
    }

    /// Widen to contain a sphere; the sign of `radius` is ignored
    pub fn add_sphere(&mut self, center: DVec3, radius: f64) {
        let r = DVec3::splat(radius.abs());
        if self.first {
            self.first = false;
            self.mins = center - r;
            self.maxs = center + r;
        } else {
            self.mins = self.mins.min(center - r);
            self.maxs = self.maxs.max(center + r);
        }
    }

    /// Fold a child frame's local extent in as a bounding sphere.
    ///
    /// The corners of `local` are mapped through `frame_transform`, and the
    /// sphere around their centroid that holds all of them is added. The
    /// child's selection-buffer words carry over.
    pub fn merge_local(&mut self, frame_transform: &Transform, local: &Extent) {
        self.select_buffer_depth += local.select_buffer_depth;
        if local.first {
            return;
        }
        let corners = local.corners().map(|c| frame_transform.transform_point(c));
        let center = corners.iter().fold(DVec3::ZERO, |acc, c| acc + *c / 8.0);
        let radius = corners
            .iter()
            .map(|c| stable_length(*c - center))
            .fold(0.0, f64::max);
        self.add_sphere(center, radius);
    }

    /// Enter a frame: bodies added from now on need one more name word
    pub fn push_frame(&mut self) {
        self.frame_depth += 1;
    }

    pub fn pop_frame(&mut self) {
        self.frame_depth = self.frame_depth.saturating_sub(1);
    }

    /// Empty scratch extent at the nesting depth of `parent`
    pub fn nested(parent: &Extent) -> Self {
        Self {
            frame_depth: parent.frame_depth,
            ..Self::new()
        }
    }

    /// Account for the hit record of one pickable body at this nesting depth
    pub fn add_body(&mut self) {
        self.select_buffer_depth += HIT_RECORD_OVERHEAD + self.frame_depth;
    }

    /// Midpoint of the box (origin when empty)
    pub fn center(&self) -> DVec3 {
        if self.first {
            return DVec3::ZERO;
        }
        self.mins * 0.5 + self.maxs * 0.5
    }

    /// Length of the box diagonal
    pub fn scale(&self) -> f64 {
        if self.first {
            return 0.0;
        }
        stable_length(self.maxs - self.mins)
    }

    /// Move the box so that its center sits at the origin
    pub fn recenter(&mut self) {
        let c = self.center();
        self.mins -= c;
        self.maxs -= c;
    }

    /// The eight box corners
    pub fn corners(&self) -> [DVec3; 8] {
        let (lo, hi) = (self.mins, self.maxs);
        [
            DVec3::new(lo.x, lo.y, lo.z),
            DVec3::new(hi.x, lo.y, lo.z),
            DVec3::new(lo.x, hi.y, lo.z),
            DVec3::new(hi.x, hi.y, lo.z),
            DVec3::new(lo.x, lo.y, hi.z),
            DVec3::new(hi.x, lo.y, hi.z),
            DVec3::new(lo.x, hi.y, hi.z),
            DVec3::new(hi.x, hi.y, hi.z),
        ]
    }

    fn projections(&self, camera: DVec3, forward: DVec3) -> impl Iterator<Item = f64> + '_ {
        let forward = forward.normalize_or_zero();
        self.corners().into_iter().map(move |c| (c - camera).dot(forward))
    }

    /// Smallest corner distance in front of the camera along `forward`
    pub fn near_clip(&self, camera: DVec3, forward: DVec3) -> f64 {
        self.projections(camera, forward).fold(f64::INFINITY, f64::min)
    }

    /// Largest corner distance along `forward`
    pub fn far_clip(&self, camera: DVec3, forward: DVec3) -> f64 {
        self.projections(camera, forward).fold(f64::NEG_INFINITY, f64::max)
    }

    /// Near and far planes usable as a projection frustum.
    ///
    /// Near is raised to at least `NEAR_FAR_RATIO * far` so depth precision is
    /// not wasted, and stays strictly below far. `None` when the box lies
    /// entirely behind the camera or the extent is empty.
    pub fn clip_planes(&self, camera: DVec3, forward: DVec3) -> Option<(f64, f64)> {
        if self.first {
            return None;
        }
        let far = self.far_clip(camera, forward);
        if !(far > 0.0) || !far.is_finite() {
            return None;
        }
        let near = self.near_clip(camera, forward).max(far * NEAR_FAR_RATIO);
        if near < far {
            Some((near, far))
        } else {
            // A flat box facing the camera: open a slab around it
            Some((far * (1.0 - NEAR_FAR_RATIO), far * (1.0 + NEAR_FAR_RATIO)))
        }
    }

    /// Per-axis half extents of a box centered at `center` that holds the extent
    pub fn range(&self, center: DVec3) -> DVec3 {
        if self.first {
            return DVec3::ZERO;
        }
        (self.maxs - center).abs().max((center - self.mins).abs())
    }

    /// Half extent of a cube centered at `center` that holds the extent, on every axis
    pub fn uniform_range(&self, center: DVec3) -> DVec3 {
        DVec3::splat(self.range(center).max_element())
    }
}

#[cfg(test)]
#[path = "extent_tests.rs"]
mod tests;
