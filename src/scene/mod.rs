//! Scene object model: loaded model hierarchies, their shared material and
//! the two helper nodes each model carries (highlight box and drag proxy).

use crate::geometry::{self, Aabb};
use glam::{Mat4, Quat, Vec3};
use rand::Rng;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// World up axis. The scene is right-handed with +Z up; every camera and
/// asset orientation computation reads this instead of assuming +Y.
pub const WORLD_UP: Vec3 = Vec3::Z;

/// glTF content is authored +Y up. Rotating +90° about X stands it upright
/// in the +Z-up world.
pub fn asset_up_correction() -> Quat {
    Quat::from_rotation_x(std::f32::consts::FRAC_PI_2)
}

pub const HIGHLIGHT_COLOR: Rgb = Rgb::new(0xff, 0xff, 0x00);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn from_u32(value: u32) -> Self {
        Self {
            r: ((value >> 16) & 0xFF) as u8,
            g: ((value >> 8) & 0xFF) as u8,
            b: (value & 0xFF) as u8,
        }
    }

    pub fn random(rng: &mut impl Rng) -> Self {
        Self::from_u32(rng.gen_range(0..(1u32 << 24)))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid hex color '{0}', expected #rrggbb")]
pub struct ParseRgbError(String);

impl FromStr for Rgb {
    type Err = ParseRgbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        if digits.len() != 6 {
            return Err(ParseRgbError(s.to_string()));
        }
        u32::from_str_radix(digits, 16)
            .map(Self::from_u32)
            .map_err(|_| ParseRgbError(s.to_string()))
    }
}

/// Appearance shared by every mesh of one model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub base_color: Rgb,
    pub opacity: f32,
    pub transparent: bool,
}

impl Material {
    pub fn new(base_color: Rgb) -> Self {
        Self {
            base_color,
            opacity: 1.0,
            transparent: true,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new(Rgb::new(0xff, 0xff, 0xff))
    }
}

/// Triangle list in mesh-local space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshGeometry {
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl MeshGeometry {
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self { positions, indices }
    }

    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(|tri| {
            Some([
                *self.positions.get(tri[0] as usize)?,
                *self.positions.get(tri[1] as usize)?,
                *self.positions.get(tri[2] as usize)?,
            ])
        })
    }
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: Option<String>,
    /// Transform relative to the owning object's root.
    pub local: Mat4,
    pub geometry: Arc<MeshGeometry>,
    pub material: Material,
}

impl Mesh {
    pub fn new(name: Option<String>, local: Mat4, geometry: Arc<MeshGeometry>) -> Self {
        Self {
            name,
            local,
            geometry,
            material: Material::default(),
        }
    }
}

/// A loaded model hierarchy, flattened to meshes under a single root transform.
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub name: String,
    pub transform: Transform,
    pub visible: bool,
    meshes: Vec<Mesh>,
    material_revision: u64,
}

impl SceneObject {
    pub fn new(name: impl Into<String>, transform: Transform, meshes: Vec<Mesh>) -> Self {
        Self {
            name: name.into(),
            transform,
            visible: true,
            meshes,
            material_revision: 0,
        }
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes
            .iter()
            .map(|mesh| mesh.geometry.indices.len() / 3)
            .sum()
    }

    /// Pushes `material` into every mesh. Renderers compare
    /// [`material_revision`](Self::material_revision) to know when to re-upload.
    pub fn apply_material(&mut self, material: &Material) {
        for mesh in &mut self.meshes {
            mesh.material = *material;
        }
        self.material_revision += 1;
    }

    pub fn material_revision(&self) -> u64 {
        self.material_revision
    }

    /// Nearest triangle hit along the ray, in world units.
    pub fn raycast(&self, origin: Vec3, dir: Vec3) -> Option<f32> {
        geometry::bounding_box(self).ray_intersection(origin, dir)?;
        let root = self.transform.matrix();
        let mut nearest: Option<f32> = None;
        for mesh in &self.meshes {
            let world = root * mesh.local;
            for [a, b, c] in mesh.geometry.triangles() {
                let hit = geometry::ray_triangle(
                    origin,
                    dir,
                    world.transform_point3(a),
                    world.transform_point3(b),
                    world.transform_point3(c),
                );
                if let Some(t) = hit {
                    if nearest.map_or(true, |best| t < best) {
                        nearest = Some(t);
                    }
                }
            }
        }
        nearest
    }
}

/// Wireframe outline around a model. Only its visibility is toggled; the box
/// lives as long as the model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighlightBox {
    pub bounds: Aabb,
    pub color: Rgb,
    pub visible: bool,
}

impl HighlightBox {
    pub fn around(object: &SceneObject) -> Self {
        Self {
            bounds: geometry::bounding_box(object),
            color: HIGHLIGHT_COLOR,
            visible: false,
        }
    }

    pub fn update(&mut self, object: &SceneObject) {
        self.bounds = geometry::bounding_box(object);
    }
}

/// Identity of a drag proxy, derived from the owning model's manifest index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProxyHandle(usize);

impl ProxyHandle {
    pub fn for_index(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ProxyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "drag-proxy-{}", self.0)
    }
}

/// Invisible box used only as the pointer target for dragging a model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragProxy {
    pub handle: ProxyHandle,
    pub size: Vec3,
    pub position: Vec3,
}

impl DragProxy {
    pub fn fitted(handle: ProxyHandle, bounds: &Aabb) -> Self {
        Self {
            handle,
            size: bounds.size(),
            position: bounds.center(),
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_center_size(self.position, self.size)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{cube_at, unit_cube};
    use super::*;

    #[test]
    fn hex_colors_round_trip_through_display() {
        let color: Rgb = "#1a2B3c".parse().unwrap();
        assert_eq!(color, Rgb::new(0x1a, 0x2b, 0x3c));
        assert_eq!(color.to_string(), "#1a2b3c");
        assert!("#12345".parse::<Rgb>().is_err());
        assert!("#zzzzzz".parse::<Rgb>().is_err());
    }

    #[test]
    fn apply_material_reaches_every_mesh() {
        let mut object = unit_cube("a");
        let extra = object.meshes()[0].clone();
        object = SceneObject::new("a", Transform::IDENTITY, vec![extra.clone(), extra]);
        let material = Material {
            base_color: Rgb::new(10, 20, 30),
            opacity: 0.4,
            transparent: true,
        };
        object.apply_material(&material);
        assert_eq!(object.material_revision(), 1);
        assert!(object.meshes().iter().all(|mesh| mesh.material == material));
    }

    #[test]
    fn raycast_returns_nearest_face() {
        let cube = cube_at("a", Vec3::new(0.0, 0.0, 0.0), 2.0);
        let t = cube.raycast(Vec3::new(0.1, 0.2, 10.0), Vec3::NEG_Z).unwrap();
        assert!((t - 9.0).abs() < 1e-4);
        assert!(cube.raycast(Vec3::new(3.0, 0.0, 10.0), Vec3::NEG_Z).is_none());
    }

    #[test]
    fn asset_up_correction_maps_y_to_z() {
        let up = asset_up_correction() * Vec3::Y;
        assert!((up - WORLD_UP).length() < 1e-5);
    }

    #[test]
    fn proxy_handle_keeps_large_indices() {
        let index = u32::MAX as usize + 7;
        assert_eq!(ProxyHandle::for_index(index).index(), index);
        assert_ne!(ProxyHandle::for_index(index), ProxyHandle::for_index(6));
    }

    #[test]
    fn highlight_box_tracks_moved_object() {
        let mut cube = unit_cube("a");
        let mut highlight = HighlightBox::around(&cube);
        assert!(!highlight.visible);
        cube.transform.translation = Vec3::new(4.0, 0.0, 0.0);
        highlight.update(&cube);
        assert!((highlight.bounds.center() - Vec3::new(4.0, 0.0, 0.0)).length() < 1e-5);
    }
}
