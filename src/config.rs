use serde::Deserialize;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "WindowConfig::default_title")]
    pub title: String,
    #[serde(default = "WindowConfig::default_width")]
    pub width: u32,
    #[serde(default = "WindowConfig::default_height")]
    pub height: u32,
}

impl WindowConfig {
    fn default_title() -> String {
        "Model Viewer".to_string()
    }

    const fn default_width() -> u32 {
        1280
    }

    const fn default_height() -> u32 {
        720
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: Self::default_title(),
            width: Self::default_width(),
            height: Self::default_height(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "CameraConfig::default_field_of_view_deg")]
    pub field_of_view_deg: f32,
    #[serde(default = "CameraConfig::default_near")]
    pub near: f32,
    #[serde(default = "CameraConfig::default_far")]
    pub far: f32,
    /// Distance used before the first full load has completed.
    #[serde(default = "CameraConfig::default_initial_distance")]
    pub initial_distance: f32,
    #[serde(default = "CameraConfig::default_desktop_distance_factor")]
    pub desktop_distance_factor: f32,
    #[serde(default = "CameraConfig::default_mobile_distance_factor")]
    pub mobile_distance_factor: f32,
    #[serde(default = "CameraConfig::default_aspect_offset")]
    pub aspect_offset: f32,
    #[serde(default = "CameraConfig::default_min_distance")]
    pub min_distance: f32,
    /// Viewports narrower than this many pixels use the mobile distance factor.
    #[serde(default = "CameraConfig::default_compact_viewport_width")]
    pub compact_viewport_width: u32,
    #[serde(default = "CameraConfig::default_orbit_rotate_speed")]
    pub orbit_rotate_speed: f32,
    #[serde(default = "CameraConfig::default_orbit_zoom_step")]
    pub orbit_zoom_step: f32,
}

impl CameraConfig {
    const fn default_field_of_view_deg() -> f32 {
        20.0
    }

    const fn default_near() -> f32 {
        1.0
    }

    const fn default_far() -> f32 {
        1000.0
    }

    const fn default_initial_distance() -> f32 {
        20.0
    }

    const fn default_desktop_distance_factor() -> f32 {
        12.0
    }

    const fn default_mobile_distance_factor() -> f32 {
        15.0
    }

    const fn default_aspect_offset() -> f32 {
        3.0
    }

    const fn default_min_distance() -> f32 {
        1.0
    }

    const fn default_compact_viewport_width() -> u32 {
        997
    }

    const fn default_orbit_rotate_speed() -> f32 {
        0.005
    }

    const fn default_orbit_zoom_step() -> f32 {
        1.1
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            field_of_view_deg: Self::default_field_of_view_deg(),
            near: Self::default_near(),
            far: Self::default_far(),
            initial_distance: Self::default_initial_distance(),
            desktop_distance_factor: Self::default_desktop_distance_factor(),
            mobile_distance_factor: Self::default_mobile_distance_factor(),
            aspect_offset: Self::default_aspect_offset(),
            min_distance: Self::default_min_distance(),
            compact_viewport_width: Self::default_compact_viewport_width(),
            orbit_rotate_speed: Self::default_orbit_rotate_speed(),
            orbit_zoom_step: Self::default_orbit_zoom_step(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlacementConfig {
    #[serde(default = "PlacementConfig::default_min_target_extent")]
    pub min_target_extent: f32,
    #[serde(default = "PlacementConfig::default_max_target_extent")]
    pub max_target_extent: f32,
    #[serde(default = "PlacementConfig::default_grid_min")]
    pub grid_min: i32,
    #[serde(default = "PlacementConfig::default_grid_max")]
    pub grid_max: i32,
    #[serde(default = "PlacementConfig::default_max_attempts")]
    pub max_attempts: u32,
}

impl PlacementConfig {
    const fn default_min_target_extent() -> f32 {
        2.0
    }

    const fn default_max_target_extent() -> f32 {
        4.0
    }

    const fn default_grid_min() -> i32 {
        -5
    }

    const fn default_grid_max() -> i32 {
        3
    }

    const fn default_max_attempts() -> u32 {
        10_000
    }
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            min_target_extent: Self::default_min_target_extent(),
            max_target_extent: Self::default_max_target_extent(),
            grid_min: Self::default_grid_min(),
            grid_max: Self::default_grid_max(),
            max_attempts: Self::default_max_attempts(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InteractionConfig {
    /// Pointer travel (pixels) after which a press stops counting as a click.
    #[serde(default = "InteractionConfig::default_click_slop_px")]
    pub click_slop_px: f32,
}

impl InteractionConfig {
    const fn default_click_slop_px() -> f32 {
        4.0
    }
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            click_slop_px: Self::default_click_slop_px(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViewerConfig {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default = "ViewerConfig::default_manifest_path")]
    pub manifest_path: String,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub placement: PlacementConfig,
    #[serde(default)]
    pub interaction: InteractionConfig,
    /// Fixed seed for placement and color randomness.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            manifest_path: Self::default_manifest_path(),
            camera: CameraConfig::default(),
            placement: PlacementConfig::default(),
            interaction: InteractionConfig::default(),
            seed: None,
        }
    }
}

impl ViewerConfig {
    fn default_manifest_path() -> String {
        "assets/models/sample-models.json".to_string()
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::ViewerConfig;

    #[test]
    fn empty_object_yields_defaults() {
        let config = ViewerConfig::from_json("{}").unwrap();
        assert_eq!(config.manifest_path, "assets/models/sample-models.json");
        assert_eq!(config.camera.field_of_view_deg, 20.0);
        assert_eq!(config.camera.compact_viewport_width, 997);
        assert_eq!(config.placement.grid_min, -5);
        assert_eq!(config.placement.grid_max, 3);
        assert_eq!(config.placement.max_attempts, 10_000);
        assert!(config.seed.is_none());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = ViewerConfig::from_json(
            r#"{ "camera": { "desktop_distance_factor": 10.0 }, "seed": 7 }"#,
        )
        .unwrap();
        assert_eq!(config.camera.desktop_distance_factor, 10.0);
        assert_eq!(config.camera.mobile_distance_factor, 15.0);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.window.width, 1280);
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.json");
        std::fs::write(&path, r#"{ "manifest_path": "models.json" }"#).unwrap();
        let config = ViewerConfig::load(&path).unwrap();
        assert_eq!(config.manifest_path, "models.json");
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ViewerConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(ViewerConfig::from_json("{ not json").is_err());
    }
}
