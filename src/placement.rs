//! Random, collision-free placement of freshly loaded models.
//!
//! A model is first scaled so its largest span lands in
//! `[min_target_extent, max_target_extent)`, then integer grid positions on
//! the z = 0 plane are drawn until its scaled box overlaps none of the
//! already-placed boxes.

use crate::config::PlacementConfig;
use crate::geometry::{self, Aabb};
use crate::scene::{SceneObject, Transform};
use glam::Vec3;
use rand::Rng;

/// Source of the random draws made during placement.
pub trait PlacementSampler {
    /// Uniform in `[min, max)`.
    fn target_extent(&mut self, min: f32, max: f32) -> f32;
    /// Uniform integer in `[min, max]`.
    fn grid_coordinate(&mut self, min: i32, max: i32) -> i32;
}

/// Adapts any `rand` generator.
#[derive(Debug, Clone)]
pub struct RandomSampler<R>(pub R);

impl<R: Rng> PlacementSampler for RandomSampler<R> {
    fn target_extent(&mut self, min: f32, max: f32) -> f32 {
        if max > min {
            self.0.gen_range(min..max)
        } else {
            min
        }
    }

    fn grid_coordinate(&mut self, min: i32, max: i32) -> i32 {
        if max >= min {
            self.0.gen_range(min..=max)
        } else {
            min
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Vec3,
    /// Final uniform root scale.
    pub scale: f32,
    pub attempts: u32,
}

impl Placement {
    pub fn apply(&self, object: &mut SceneObject) {
        object.transform.scale = Vec3::splat(self.scale);
        object.transform.translation = self.position;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum PlacementError {
    #[error("no free position found after {attempts} attempts")]
    Exhausted { attempts: u32 },
    #[error("model has no measurable extent")]
    DegenerateBounds,
}

#[derive(Debug, Clone)]
pub struct PlacementEngine {
    config: PlacementConfig,
}

impl PlacementEngine {
    pub fn new(config: PlacementConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    /// Computes a position and scale for `object` that keeps it clear of
    /// every box in `existing`. Does not modify `object`.
    pub fn place(
        &self,
        object: &SceneObject,
        existing: &[Aabb],
        sampler: &mut dyn PlacementSampler,
    ) -> Result<Placement, PlacementError> {
        let max_extent = geometry::bounding_box(object).max_extent();
        if !max_extent.is_finite() || max_extent <= 0.0 {
            return Err(PlacementError::DegenerateBounds);
        }

        let target_extent = sampler.target_extent(
            self.config.min_target_extent,
            self.config.max_target_extent,
        );
        let scale_factor = target_extent / max_extent;
        // Root scale is uniform for loaded assets, x stands for all three axes.
        let scale = object.transform.scale.x * scale_factor;

        // Bounds of the scaled model with its root at the origin; each
        // candidate is that box shifted by the candidate translation.
        let scaled_at_origin = geometry::bounding_box_with(
            object,
            &Transform {
                translation: Vec3::ZERO,
                rotation: object.transform.rotation,
                scale: Vec3::splat(scale),
            },
        );

        for attempt in 1..=self.config.max_attempts {
            let x = sampler.grid_coordinate(self.config.grid_min, self.config.grid_max);
            let y = sampler.grid_coordinate(self.config.grid_min, self.config.grid_max);
            let position = Vec3::new(x as f32, y as f32, 0.0);
            let candidate = scaled_at_origin.translated(position);
            if !existing.iter().any(|placed| placed.intersects(&candidate)) {
                return Ok(Placement {
                    position,
                    scale,
                    attempts: attempt,
                });
            }
        }

        Err(PlacementError::Exhausted {
            attempts: self.config.max_attempts,
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::PlacementSampler;
    use std::collections::VecDeque;

    /// Replays fixed draws; falls back to the range minimum once exhausted.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedSampler {
        pub(crate) extents: VecDeque<f32>,
        pub(crate) coordinates: VecDeque<i32>,
    }

    impl ScriptedSampler {
        pub(crate) fn new(extents: &[f32], positions: &[(i32, i32)]) -> Self {
            Self {
                extents: extents.iter().copied().collect(),
                coordinates: positions.iter().flat_map(|&(x, y)| [x, y]).collect(),
            }
        }
    }

    impl PlacementSampler for ScriptedSampler {
        fn target_extent(&mut self, min: f32, _max: f32) -> f32 {
            self.extents.pop_front().unwrap_or(min)
        }

        fn grid_coordinate(&mut self, min: i32, _max: i32) -> i32 {
            self.coordinates.pop_front().unwrap_or(min)
        }
    }
}
