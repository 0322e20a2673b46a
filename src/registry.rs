//! Placed models in manifest order, plus the drag-proxy side table.

use crate::geometry::{self, Aabb};
use crate::scene::{DragProxy, HighlightBox, Material, ProxyHandle, Rgb, SceneObject};
use glam::Vec3;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("{0} is not registered")]
    NotFound(ProxyHandle),
    #[error("no model with index {0}")]
    UnknownModel(usize),
    #[error("a model with index {0} is already registered")]
    DuplicateIndex(usize),
}

/// One placed asset and the helper nodes it owns.
#[derive(Debug, Clone)]
pub struct Model {
    index: usize,
    name: String,
    object: SceneObject,
    transparency_percent: u8,
    material: Material,
    highlight: HighlightBox,
    proxy: DragProxy,
}

impl Model {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn visible(&self) -> bool {
        self.object.visible
    }

    pub fn object(&self) -> &SceneObject {
        &self.object
    }

    pub fn transparency_percent(&self) -> u8 {
        self.transparency_percent
    }

    pub fn base_color(&self) -> Rgb {
        self.material.base_color
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn highlight(&self) -> &HighlightBox {
        &self.highlight
    }

    pub fn proxy(&self) -> &DragProxy {
        &self.proxy
    }

    pub fn root_position(&self) -> Vec3 {
        self.object.transform.translation
    }

    /// Current world bounds, recomputed from geometry.
    pub fn bounds(&self) -> Aabb {
        geometry::bounding_box(&self.object)
    }

    pub(crate) fn set_highlight_visible(&mut self, visible: bool) {
        self.highlight.visible = visible;
    }

    fn set_base_color(&mut self, color: Rgb) {
        self.material.base_color = color;
        self.object.apply_material(&self.material);
    }

    fn set_transparency(&mut self, percent: u8) {
        self.transparency_percent = percent.min(100);
        self.material.opacity = self.transparency_percent as f32 / 100.0;
        self.object.apply_material(&self.material);
    }
}

/// Proxy-to-model link. `offset` is frozen at insertion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProxyLink {
    pub model: usize,
    pub offset: Vec3,
}

#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: Vec<Model>,
    proxies: HashMap<ProxyHandle, ProxyLink>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Models in manifest order.
    pub fn iter(&self) -> impl Iterator<Item = &Model> {
        self.models.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Model> {
        self.slot(index).ok().map(|slot| &self.models[slot])
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Model> {
        match self.slot(index) {
            Ok(slot) => Some(&mut self.models[slot]),
            Err(_) => None,
        }
    }

    pub fn proxy_handles(&self) -> Vec<ProxyHandle> {
        self.models.iter().map(|model| model.proxy.handle).collect()
    }

    pub fn bounding_boxes(&self) -> Vec<Aabb> {
        self.models.iter().map(Model::bounds).collect()
    }

    pub fn visible_highlight_count(&self) -> usize {
        self.models
            .iter()
            .filter(|model| model.highlight.visible)
            .count()
    }

    /// Registers an already placed object. Builds its hidden highlight box
    /// and a drag proxy fitted to its current bounds, applies its material,
    /// and records the proxy-to-root offset.
    pub fn insert(
        &mut self,
        mut object: SceneObject,
        index: usize,
        name: impl Into<String>,
        base_color: Rgb,
    ) -> Result<&Model, RegistryError> {
        let slot = match self.slot(index) {
            Ok(_) => return Err(RegistryError::DuplicateIndex(index)),
            Err(slot) => slot,
        };

        let material = Material::new(base_color);
        object.apply_material(&material);

        let bounds = geometry::bounding_box(&object);
        let handle = ProxyHandle::for_index(index);
        let proxy = DragProxy::fitted(handle, &bounds);
        let offset = object.transform.translation - proxy.position;

        let model = Model {
            index,
            name: name.into(),
            highlight: HighlightBox::around(&object),
            object,
            transparency_percent: 100,
            material,
            proxy,
        };
        self.proxies.insert(
            handle,
            ProxyLink {
                model: index,
                offset,
            },
        );
        self.models.insert(slot, model);
        Ok(&self.models[slot])
    }

    /// Drops every model together with its highlight box and drag proxy.
    pub fn clear(&mut self) {
        self.models.clear();
        self.proxies.clear();
    }

    pub fn resolve(&self, handle: ProxyHandle) -> Result<(&Model, ProxyLink), RegistryError> {
        let link = *self
            .proxies
            .get(&handle)
            .ok_or(RegistryError::NotFound(handle))?;
        let model = self.get(link.model).ok_or(RegistryError::NotFound(handle))?;
        Ok((model, link))
    }

    /// Moves a drag proxy and carries its model along: the model root lands
    /// at `position + offset` and the highlight box is refit.
    pub fn move_proxy(&mut self, handle: ProxyHandle, position: Vec3) -> Result<(), RegistryError> {
        let link = *self
            .proxies
            .get(&handle)
            .ok_or(RegistryError::NotFound(handle))?;
        let model = self
            .get_mut(link.model)
            .ok_or(RegistryError::NotFound(handle))?;
        model.proxy.position = position;
        model.object.transform.translation = position + link.offset;
        model.highlight.update(&model.object);
        Ok(())
    }

    pub fn set_model_color(&mut self, index: usize, color: Rgb) -> Result<(), RegistryError> {
        self.model_mut(index)?.set_base_color(color);
        Ok(())
    }

    /// `percent` is clamped to 0..=100; opacity becomes `percent / 100`.
    pub fn set_model_transparency(
        &mut self,
        index: usize,
        percent: u8,
    ) -> Result<(), RegistryError> {
        self.model_mut(index)?.set_transparency(percent);
        Ok(())
    }

    pub fn set_model_visibility(
        &mut self,
        index: usize,
        visible: bool,
    ) -> Result<(), RegistryError> {
        self.model_mut(index)?.object.visible = visible;
        Ok(())
    }

    fn model_mut(&mut self, index: usize) -> Result<&mut Model, RegistryError> {
        self.get_mut(index).ok_or(RegistryError::UnknownModel(index))
    }

    fn slot(&self, index: usize) -> Result<usize, usize> {
        self.models.binary_search_by_key(&index, |model| model.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::test_support::cube_at;

    fn registry_with(models: &[(usize, Vec3)]) -> ModelRegistry {
        let mut registry = ModelRegistry::new();
        for &(index, center) in models {
            registry
                .insert(
                    cube_at(&format!("m{index}"), center, 2.0),
                    index,
                    format!("Model {index}"),
                    Rgb::new(1, 2, 3),
                )
                .unwrap();
        }
        registry
    }

    #[test]
    fn insert_keeps_manifest_order() {
        let registry = registry_with(&[(2, Vec3::X * 6.0), (0, Vec3::ZERO), (1, Vec3::Y * 6.0)]);
        let order: Vec<usize> = registry.iter().map(Model::index).collect();
        assert_eq!(order, vec![0, 1, 2]);
        assert_eq!(registry.proxy_handles().len(), 3);
    }

    #[test]
    fn insert_builds_hidden_highlight_and_fitted_proxy() {
        let registry = registry_with(&[(0, Vec3::new(1.0, 2.0, 0.0))]);
        let model = registry.get(0).unwrap();
        assert!(!model.highlight().visible);
        assert_eq!(model.transparency_percent(), 100);
        assert!(model.visible());
        assert!((model.proxy().position - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-5);
        assert!((model.proxy().size - Vec3::splat(2.0)).length() < 1e-5);
        assert!(model
            .object()
            .meshes()
            .iter()
            .all(|mesh| mesh.material.base_color == Rgb::new(1, 2, 3)));
    }

    #[test]
    fn duplicate_index_is_rejected() {
        let mut registry = registry_with(&[(0, Vec3::ZERO)]);
        let err = registry
            .insert(cube_at("again", Vec3::X * 5.0, 1.0), 0, "again", Rgb::new(0, 0, 0))
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateIndex(0));
    }

    #[test]
    fn resolve_unknown_proxy_is_not_found() {
        let registry = registry_with(&[(0, Vec3::ZERO)]);
        let handle = ProxyHandle::for_index(9);
        assert_eq!(
            registry.resolve(handle).unwrap_err(),
            RegistryError::NotFound(handle)
        );
        let (model, link) = registry.resolve(ProxyHandle::for_index(0)).unwrap();
        assert_eq!(model.index(), 0);
        assert_eq!(link.model, 0);
    }

    #[test]
    fn offset_survives_every_move() {
        // Geometry sits away from the root, so the proxy center and root differ.
        let object = cube_at("off-center", Vec3::ZERO, 1.0);
        let mesh = object.meshes()[0].clone();
        let shifted = crate::scene::Mesh {
            local: glam::Mat4::from_translation(Vec3::new(0.0, 0.0, 0.5)),
            ..mesh
        };
        let object = SceneObject::new("off-center", object.transform, vec![shifted]);

        let mut registry = ModelRegistry::new();
        registry.insert(object, 0, "off-center", Rgb::new(0, 0, 0)).unwrap();
        let handle = ProxyHandle::for_index(0);
        let (_, link) = registry.resolve(handle).unwrap();
        assert!((link.offset - Vec3::new(0.0, 0.0, -0.5)).length() < 1e-5);

        for step in 0..10 {
            let target = Vec3::new(step as f32 * 0.7, -(step as f32), 0.25 * step as f32);
            registry.move_proxy(handle, target).unwrap();
            let model = registry.get(0).unwrap();
            let expected_root = model.proxy().position + link.offset;
            assert!((model.root_position() - expected_root).length() < 1e-5);
            assert!((model.highlight().bounds.center() - target).length() < 1e-4);
        }
    }

    #[test]
    fn clear_empties_models_and_proxies() {
        let mut registry = registry_with(&[(0, Vec3::ZERO), (1, Vec3::X * 5.0)]);
        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.resolve(ProxyHandle::for_index(0)).is_err());
    }

    #[test]
    fn editor_writes_update_every_mesh() {
        let mut registry = registry_with(&[(0, Vec3::ZERO)]);
        registry.set_model_color(0, "#336699".parse().unwrap()).unwrap();
        registry.set_model_transparency(0, 40).unwrap();
        registry.set_model_visibility(0, false).unwrap();

        let model = registry.get(0).unwrap();
        assert_eq!(model.base_color().to_string(), "#336699");
        assert_eq!(model.transparency_percent(), 40);
        assert!(!model.visible());
        for mesh in model.object().meshes() {
            assert_eq!(mesh.material.base_color, Rgb::new(0x33, 0x66, 0x99));
            assert!((mesh.material.opacity - 0.4).abs() < 1e-6);
        }
    }

    #[test]
    fn transparency_is_clamped() {
        let mut registry = registry_with(&[(0, Vec3::ZERO)]);
        registry.set_model_transparency(0, 250).unwrap();
        assert_eq!(registry.get(0).unwrap().transparency_percent(), 100);
        assert_eq!(
            registry.set_model_color(5, Rgb::new(0, 0, 0)).unwrap_err(),
            RegistryError::UnknownModel(5)
        );
    }
}
