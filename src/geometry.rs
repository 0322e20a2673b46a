//! Axis-aligned bounds and the ray tests used for picking.
//!
//! Bounds are always derived from the current world transform of an object.
//! Nothing here caches: callers recompute after every scale or position edit.

use crate::scene::{SceneObject, Transform};
use glam::{Mat4, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn expand_to(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn size(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            self.max - self.min
        }
    }

    pub fn center(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            (self.min + self.max) * 0.5
        }
    }

    /// Largest of the x/y/z spans.
    pub fn max_extent(&self) -> f32 {
        self.size().max_element()
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Boxes that only share a face, edge or corner do not intersect.
    pub fn intersects(&self, other: &Aabb) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }

    /// Slab test. Returns the distance along `dir` to the first hit, or to the
    /// exit point when the origin is inside the box.
    pub fn ray_intersection(&self, origin: Vec3, dir: Vec3) -> Option<f32> {
        if self.is_empty() {
            return None;
        }
        let mut t_min: f32 = 0.0;
        let mut t_max: f32 = f32::INFINITY;
        let origin_arr = origin.to_array();
        let dir_arr = dir.to_array();
        let min_arr = self.min.to_array();
        let max_arr = self.max.to_array();
        for axis in 0..3 {
            let o = origin_arr[axis];
            let d = dir_arr[axis];
            if d.abs() < 1e-6 {
                if o < min_arr[axis] || o > max_arr[axis] {
                    return None;
                }
            } else {
                let inv_d = 1.0 / d;
                let mut t1 = (min_arr[axis] - o) * inv_d;
                let mut t2 = (max_arr[axis] - o) * inv_d;
                if t1 > t2 {
                    std::mem::swap(&mut t1, &mut t2);
                }
                t_min = t_min.max(t1);
                t_max = t_max.min(t2);
                if t_min > t_max {
                    return None;
                }
            }
        }
        if t_max < 0.0 {
            return None;
        }
        Some(if t_min >= 0.0 { t_min } else { t_max })
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

pub fn intersects(a: &Aabb, b: &Aabb) -> bool {
    a.intersects(b)
}

/// World-space box enclosing every vertex of `object` under its current root transform.
pub fn bounding_box(object: &SceneObject) -> Aabb {
    bounding_box_with(object, &object.transform)
}

/// Same as [`bounding_box`] but evaluated as if the root carried `transform`.
pub fn bounding_box_with(object: &SceneObject, transform: &Transform) -> Aabb {
    let root = transform.matrix();
    let mut bounds = Aabb::EMPTY;
    for mesh in object.meshes() {
        let world: Mat4 = root * mesh.local;
        for position in &mesh.geometry.positions {
            bounds.expand_to(world.transform_point3(*position));
        }
    }
    bounds
}

/// Möller–Trumbore, two-sided. Returns the distance along `dir`.
pub fn ray_triangle(origin: Vec3, dir: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
    const EPSILON: f32 = 1e-7;
    let edge1 = b - a;
    let edge2 = c - a;
    let p = dir.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = dir.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = edge2.dot(q) * inv_det;
    (t > EPSILON).then_some(t)
}

pub fn ray_plane(origin: Vec3, dir: Vec3, plane_origin: Vec3, plane_normal: Vec3) -> Option<Vec3> {
    let denom = plane_normal.dot(dir);
    if denom.abs() < 1e-6 {
        return None;
    }
    let t = plane_normal.dot(plane_origin - origin) / denom;
    if t < 0.0 {
        return None;
    }
    Some(origin + dir * t)
}
