//! Pointer arbitration between camera orbit, proxy dragging and click-to-select.
//!
//! Orbit is the default. Hovering or dragging a proxy switches it off, and
//! releasing the hover or finishing the drag switches it back on. A press
//! that misses every proxy either turns into an orbit gesture (once it
//! travels past the click slop) or into a click that picks the nearest mesh.

use crate::camera::{Camera, OrbitControls, Viewport};
use crate::config::InteractionConfig;
use crate::geometry;
use crate::registry::{ModelRegistry, RegistryError};
use crate::scene::ProxyHandle;
use crate::selection::SelectionController;
use glam::{Vec2, Vec3};

/// Everything a pointer event may read or write.
pub struct InteractionContext<'a> {
    pub registry: &'a mut ModelRegistry,
    pub selection: &'a mut SelectionController,
    pub camera: &'a mut Camera,
    pub orbit: &'a mut OrbitControls,
    pub viewport: Viewport,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragState {
    proxy: ProxyHandle,
    plane_origin: Vec3,
    plane_normal: Vec3,
    grab_offset: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum Gesture {
    #[default]
    Idle,
    /// Button held after a press that missed every proxy.
    Pressed { start: Vec2, last: Vec2, orbiting: bool },
    Dragging(DragState),
}

#[derive(Debug)]
pub struct InteractionCoordinator {
    armed: bool,
    proxies: Vec<ProxyHandle>,
    hovered: Option<ProxyHandle>,
    gesture: Gesture,
    click_slop_px: f32,
}

impl InteractionCoordinator {
    pub fn new(config: &InteractionConfig) -> Self {
        Self {
            armed: false,
            proxies: Vec::new(),
            hovered: None,
            gesture: Gesture::Idle,
            click_slop_px: config.click_slop_px,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn hovered(&self) -> Option<ProxyHandle> {
        self.hovered
    }

    pub fn dragged(&self) -> Option<ProxyHandle> {
        match self.gesture {
            Gesture::Dragging(drag) => Some(drag.proxy),
            _ => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragged().is_some()
    }

    pub fn is_orbiting(&self) -> bool {
        matches!(self.gesture, Gesture::Pressed { orbiting: true, .. })
    }

    /// False for the whole of any hover or drag, true otherwise.
    pub fn orbit_enabled(&self) -> bool {
        self.hovered.is_none() && !self.is_dragging()
    }

    /// Enables hover, drag and click over exactly `proxies`.
    pub fn arm(&mut self, proxies: Vec<ProxyHandle>, orbit: &mut OrbitControls) {
        log::info!("Interaction armed over {} drag proxies", proxies.len());
        self.armed = true;
        self.proxies = proxies;
        self.hovered = None;
        self.gesture = Gesture::Idle;
        self.sync_orbit(orbit);
    }

    pub fn disarm(&mut self, orbit: &mut OrbitControls) {
        if self.armed {
            log::debug!("Interaction disarmed");
        }
        self.armed = false;
        self.proxies.clear();
        self.hovered = None;
        self.gesture = Gesture::Idle;
        self.sync_orbit(orbit);
    }

    pub fn pointer_move(&mut self, ctx: &mut InteractionContext<'_>, position: Vec2) {
        match self.gesture {
            Gesture::Dragging(drag) => self.drag_to(ctx, drag, position),
            Gesture::Pressed {
                start,
                last,
                orbiting,
            } => {
                let orbiting = orbiting || start.distance(position) > self.click_slop_px;
                if orbiting {
                    ctx.orbit.rotate(ctx.camera, position - last);
                }
                self.gesture = Gesture::Pressed {
                    start,
                    last: position,
                    orbiting,
                };
            }
            Gesture::Idle => self.update_hover(ctx, position),
        }
        self.sync_orbit(ctx.orbit);
    }

    pub fn pointer_down(&mut self, ctx: &mut InteractionContext<'_>, position: Vec2) {
        if self.gesture != Gesture::Idle {
            return;
        }
        match self.pick_proxy(ctx, position) {
            Some((handle, hit)) => self.begin_drag(ctx, handle, hit),
            None => {
                self.hovered = None;
                self.gesture = Gesture::Pressed {
                    start: position,
                    last: position,
                    orbiting: false,
                };
            }
        }
        self.sync_orbit(ctx.orbit);
    }

    pub fn pointer_up(&mut self, ctx: &mut InteractionContext<'_>, position: Vec2) {
        match std::mem::take(&mut self.gesture) {
            Gesture::Dragging(drag) => {
                log::debug!("Drag of {} ended", drag.proxy);
                self.update_hover(ctx, position);
            }
            Gesture::Pressed {
                orbiting: false, ..
            } => {
                self.click(ctx, position);
            }
            Gesture::Pressed { orbiting: true, .. } | Gesture::Idle => {}
        }
        self.sync_orbit(ctx.orbit);
    }

    /// Pointer left the surface or focus was lost: end whatever is in progress.
    pub fn cancel(&mut self, orbit: &mut OrbitControls) {
        if let Gesture::Dragging(drag) = self.gesture {
            log::debug!("Drag of {} cancelled", drag.proxy);
        }
        self.gesture = Gesture::Idle;
        self.hovered = None;
        self.sync_orbit(orbit);
    }

    /// Drops a hover or drag whose model can no longer be picked, e.g. after
    /// it was hidden.
    pub fn release_unpickable(&mut self, registry: &ModelRegistry, orbit: &mut OrbitControls) {
        let pickable = |handle: ProxyHandle| {
            registry
                .resolve(handle)
                .map_or(false, |(model, _)| model.visible())
        };
        if let Some(proxy) = self.dragged() {
            if !pickable(proxy) {
                log::debug!("Drag of {} ended, model no longer pickable", proxy);
                self.gesture = Gesture::Idle;
            }
        }
        if let Some(handle) = self.hovered {
            if !pickable(handle) && self.dragged() != Some(handle) {
                log::debug!("Hover off {}", handle);
                self.hovered = None;
            }
        }
        self.sync_orbit(orbit);
    }

    /// Casts a ray through `position` and selects the nearest visible model
    /// whose mesh it hits. Equal distances go to the lower manifest index.
    /// A miss leaves the selection unchanged.
    pub fn click(&mut self, ctx: &mut InteractionContext<'_>, position: Vec2) -> Option<usize> {
        if !self.armed {
            return None;
        }
        let (origin, dir) = ctx.camera.screen_ray(position, ctx.viewport)?;
        let index = pick_model(ctx.registry, origin, dir)?;
        if ctx.selection.select(ctx.registry, index) {
            log::debug!("Click selected model {}", index);
        }
        Some(index)
    }

    /// Nearest armed, visible proxy under the pointer and the world hit point.
    fn pick_proxy(
        &self,
        ctx: &InteractionContext<'_>,
        position: Vec2,
    ) -> Option<(ProxyHandle, Vec3)> {
        if !self.armed {
            return None;
        }
        let (origin, dir) = ctx.camera.screen_ray(position, ctx.viewport)?;
        let mut best: Option<(ProxyHandle, f32)> = None;
        for model in ctx.registry.iter().filter(|model| model.visible()) {
            let proxy = model.proxy();
            if !self.proxies.contains(&proxy.handle) {
                continue;
            }
            if let Some(t) = proxy.bounds().ray_intersection(origin, dir) {
                if best.map_or(true, |(_, nearest)| t < nearest) {
                    best = Some((proxy.handle, t));
                }
            }
        }
        best.map(|(handle, t)| (handle, origin + dir * t))
    }

    fn update_hover(&mut self, ctx: &InteractionContext<'_>, position: Vec2) {
        let hovered = self.pick_proxy(ctx, position).map(|(handle, _)| handle);
        if hovered != self.hovered {
            match (self.hovered, hovered) {
                (_, Some(handle)) => log::debug!("Hover on {}", handle),
                (Some(handle), None) => log::debug!("Hover off {}", handle),
                (None, None) => {}
            }
            self.hovered = hovered;
        }
    }

    fn begin_drag(&mut self, ctx: &mut InteractionContext<'_>, handle: ProxyHandle, hit: Vec3) {
        let (index, proxy_position) = match ctx.registry.resolve(handle) {
            Ok((model, _)) => (model.index(), model.proxy().position),
            Err(err) => {
                self.abort(err);
                return;
            }
        };
        if !ctx.selection.is_selected(index) {
            ctx.selection.select(ctx.registry, index);
        }

        // Drag in the camera-facing plane through the proxy center.
        let plane_normal = ctx.camera.forward();
        let ray_dir = (hit - ctx.camera.position).normalize_or_zero();
        let grab_point =
            geometry::ray_plane(ctx.camera.position, ray_dir, proxy_position, plane_normal)
                .unwrap_or(proxy_position);
        log::debug!("Drag of {} started on model {}", handle, index);
        self.hovered = Some(handle);
        self.gesture = Gesture::Dragging(DragState {
            proxy: handle,
            plane_origin: proxy_position,
            plane_normal,
            grab_offset: proxy_position - grab_point,
        });
    }

    fn drag_to(&mut self, ctx: &mut InteractionContext<'_>, drag: DragState, position: Vec2) {
        let Some((origin, dir)) = ctx.camera.screen_ray(position, ctx.viewport) else {
            return;
        };
        let hit = geometry::ray_plane(origin, dir, drag.plane_origin, drag.plane_normal);
        let Some(hit) = hit else {
            return;
        };
        if let Err(err) = ctx.registry.move_proxy(drag.proxy, hit + drag.grab_offset) {
            self.abort(err);
        }
    }

    fn abort(&mut self, err: RegistryError) {
        log::error!("Aborting drag gesture: {}", err);
        self.gesture = Gesture::Idle;
        self.hovered = None;
    }

    fn sync_orbit(&self, orbit: &mut OrbitControls) {
        orbit.enabled = self.orbit_enabled();
    }
}

/// Nearest visible model whose mesh the ray hits. Equal distances go to the
/// lower manifest index.
pub fn pick_model(registry: &ModelRegistry, origin: Vec3, dir: Vec3) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for model in registry.iter().filter(|model| model.visible()) {
        if let Some(t) = model.object().raycast(origin, dir) {
            if best.map_or(true, |(_, nearest)| t < nearest) {
                best = Some((model.index(), t));
            }
        }
    }
    best.map(|(index, _)| index)
}
