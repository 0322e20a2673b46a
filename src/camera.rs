use crate::config::CameraConfig;
use crate::scene::WORLD_UP;
use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};

/// Named camera presets. Every preset is reachable from every other in one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraView {
    Default,
    Front,
    Top,
    Left,
    Right,
}

impl CameraView {
    pub const ALL: [CameraView; 5] = [
        CameraView::Default,
        CameraView::Front,
        CameraView::Top,
        CameraView::Left,
        CameraView::Right,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CameraView::Default => "Default",
            CameraView::Front => "Front",
            CameraView::Top => "Top",
            CameraView::Left => "Left",
            CameraView::Right => "Right",
        }
    }

    /// Camera position for this preset, in units of the camera distance.
    fn offset(self) -> Vec3 {
        match self {
            CameraView::Default => Vec3::new(-1.0, -1.0, 1.0),
            CameraView::Left => Vec3::new(-2.0, 0.0, 0.0),
            CameraView::Right => Vec3::new(2.0, 0.0, 0.0),
            CameraView::Front => Vec3::new(0.0, -2.0, 0.0),
            CameraView::Top => Vec3::new(0.0, 0.0, 2.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.height > 0 {
            self.width as f32 / self.height as f32
        } else {
            1.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Desktop,
    Mobile,
}

impl DeviceClass {
    pub fn for_width(width: u32, compact_viewport_width: u32) -> Self {
        if width < compact_viewport_width {
            DeviceClass::Mobile
        } else {
            DeviceClass::Desktop
        }
    }
}

/// Perspective camera in the +Z-up world.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_deg: f32,
    pub near: f32,
    pub far: f32,
    pub aspect: f32,
}

impl Camera {
    pub fn new(config: &CameraConfig, aspect: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            target: Vec3::ZERO,
            up: WORLD_UP,
            fov_y_deg: config.field_of_view_deg,
            near: config.near,
            far: config.far,
            aspect,
        }
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Looking straight along the up axis falls back to +Y as the screen-up hint.
    fn effective_up(&self) -> Vec3 {
        if self.forward().cross(self.up).length_squared() < 1e-8 {
            Vec3::Y
        } else {
            self.up
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.effective_up())
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(
            self.fov_y_deg.to_radians(),
            self.aspect.max(0.0001),
            self.near,
            self.far,
        )
    }

    /// World-space ray through a pixel (top-left origin). Returns `(origin, direction)`.
    pub fn screen_ray(&self, screen: Vec2, viewport: Viewport) -> Option<(Vec3, Vec3)> {
        if viewport.is_empty() {
            return None;
        }
        let ndc_x = (2.0 * screen.x / viewport.width as f32) - 1.0;
        let ndc_y = 1.0 - (2.0 * screen.y / viewport.height as f32);
        let inv_view_proj = (self.projection_matrix() * self.view_matrix()).inverse();
        let near = inv_view_proj * glam::Vec4::new(ndc_x, ndc_y, -1.0, 1.0);
        let far = inv_view_proj * glam::Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
        if near.w.abs() < f32::EPSILON || far.w.abs() < f32::EPSILON {
            return None;
        }
        let near = near.xyz() / near.w;
        let far = far.xyz() / far.w;
        let dir = (far - near).normalize_or_zero();
        if dir == Vec3::ZERO {
            return None;
        }
        Some((self.position, dir))
    }

    /// Pixel position of a world point, or `None` when it is behind the camera.
    pub fn project_point(&self, point: Vec3, viewport: Viewport) -> Option<Vec2> {
        if viewport.is_empty() {
            return None;
        }
        let clip = self.projection_matrix() * self.view_matrix() * point.extend(1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        let ndc = clip.xyz() / clip.w;
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * viewport.width as f32,
            (1.0 - ndc.y) * 0.5 * viewport.height as f32,
        ))
    }
}

/// Free-look orbit around a fixed target. The interaction coordinator turns
/// it off while the pointer hovers or drags a model.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub enabled: bool,
    pub target: Vec3,
    rotate_speed: f32,
    zoom_step: f32,
}

const MIN_POLAR: f32 = 0.01;

impl OrbitControls {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            enabled: true,
            target: Vec3::ZERO,
            rotate_speed: config.orbit_rotate_speed,
            zoom_step: config.orbit_zoom_step,
        }
    }

    /// Rotates by a pointer delta in pixels. Returns `false` when disabled.
    pub fn rotate(&self, camera: &mut Camera, delta_px: Vec2) -> bool {
        if !self.enabled {
            return false;
        }
        let offset = camera.position - self.target;
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return false;
        }
        let azimuth = offset.y.atan2(offset.x) - delta_px.x * self.rotate_speed;
        let polar = ((offset.z / radius).clamp(-1.0, 1.0).acos() - delta_px.y * self.rotate_speed)
            .clamp(MIN_POLAR, std::f32::consts::PI - MIN_POLAR);
        let (sin_polar, cos_polar) = polar.sin_cos();
        let (sin_azimuth, cos_azimuth) = azimuth.sin_cos();
        camera.position = self.target
            + Vec3::new(
                radius * sin_polar * cos_azimuth,
                radius * sin_polar * sin_azimuth,
                radius * cos_polar,
            );
        camera.look_at(self.target);
        true
    }

    /// Positive steps move toward the target.
    pub fn zoom(&self, camera: &mut Camera, steps: f32) -> bool {
        if !self.enabled || steps == 0.0 {
            return false;
        }
        let offset = camera.position - self.target;
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return false;
        }
        let new_radius = (radius * self.zoom_step.powf(-steps)).clamp(camera.near, camera.far);
        camera.position = self.target + offset * (new_radius / radius);
        true
    }
}

/// Discrete preset camera. `distance` is sticky: it only changes when a
/// preset is applied with `recompute_distance` or the viewport is resized.
#[derive(Debug, Clone)]
pub struct CameraViewController {
    camera: Camera,
    view: CameraView,
    distance: f32,
    viewport: Viewport,
    device: DeviceClass,
    config: CameraConfig,
}

impl CameraViewController {
    pub fn new(config: CameraConfig, viewport: Viewport, device: DeviceClass) -> Self {
        let mut controller = Self {
            camera: Camera::new(&config, viewport.aspect_ratio()),
            view: CameraView::Default,
            distance: config.initial_distance,
            viewport,
            device,
            config,
        };
        controller.set_view(CameraView::Default, false);
        controller
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn view(&self) -> CameraView {
        self.view
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn device(&self) -> DeviceClass {
        self.device
    }

    /// `k * (aspect_offset - aspect)` with `k` picked by device class.
    pub fn compute_distance(&self, aspect_ratio: f32, device: DeviceClass) -> f32 {
        let factor = match device {
            DeviceClass::Mobile => self.config.mobile_distance_factor,
            DeviceClass::Desktop => self.config.desktop_distance_factor,
        };
        (factor * (self.config.aspect_offset - aspect_ratio)).max(self.config.min_distance)
    }

    pub fn set_view(&mut self, view: CameraView, recompute_distance: bool) {
        if recompute_distance {
            self.distance = self.compute_distance(self.viewport.aspect_ratio(), self.device);
        }
        self.view = view;
        self.camera.position = view.offset() * self.distance;
        self.camera.look_at(Vec3::ZERO);
    }

    /// Updates the projection aspect and refreshes the sticky distance. The
    /// camera stays where it is until the next preset is applied.
    pub fn resize(&mut self, viewport: Viewport, device: DeviceClass) {
        if viewport.is_empty() {
            return;
        }
        self.viewport = viewport;
        self.device = device;
        self.camera.aspect = viewport.aspect_ratio();
        self.distance = self.compute_distance(self.camera.aspect, device);
    }
}
