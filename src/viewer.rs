//! Composition root. Owns every viewer component and is the single place
//! where load completions are placed and inserted.

use crate::assets::{LoadBatch, LoadCompletion, LoadQueue, Manifest, Settle};
use crate::camera::{
    Camera, CameraView, CameraViewController, DeviceClass, OrbitControls, Viewport,
};
use crate::config::ViewerConfig;
use crate::interaction::{InteractionContext, InteractionCoordinator};
use crate::placement::{PlacementEngine, PlacementSampler, RandomSampler};
use crate::registry::{Model, ModelRegistry, RegistryError};
use crate::scene::{Rgb, SceneObject};
use crate::selection::SelectionController;
use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// What happened to one load completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// From a superseded generation; nothing changed.
    Stale,
    Inserted(usize),
    /// Decoded but not placed (no free slot, degenerate or duplicate).
    Skipped(usize),
    Failed(usize),
}

pub struct Viewer {
    config: ViewerConfig,
    registry: ModelRegistry,
    selection: SelectionController,
    placement: PlacementEngine,
    sampler: Box<dyn PlacementSampler>,
    color_rng: StdRng,
    cameras: CameraViewController,
    orbit: OrbitControls,
    interaction: InteractionCoordinator,
    batch: LoadBatch,
    first_load_done: bool,
}

impl Viewer {
    pub fn new(config: ViewerConfig, viewport: Viewport) -> Self {
        let (sampler_rng, color_rng) = match config.seed {
            Some(seed) => (
                StdRng::seed_from_u64(seed),
                StdRng::seed_from_u64(seed.wrapping_add(1)),
            ),
            None => (StdRng::from_entropy(), StdRng::from_entropy()),
        };
        Self::with_sampler(config, viewport, Box::new(RandomSampler(sampler_rng)), color_rng)
    }

    pub fn with_sampler(
        config: ViewerConfig,
        viewport: Viewport,
        sampler: Box<dyn PlacementSampler>,
        color_rng: StdRng,
    ) -> Self {
        let device = DeviceClass::for_width(viewport.width, config.camera.compact_viewport_width);
        Self {
            registry: ModelRegistry::new(),
            selection: SelectionController::new(),
            placement: PlacementEngine::new(config.placement.clone()),
            sampler,
            color_rng,
            cameras: CameraViewController::new(config.camera.clone(), viewport, device),
            orbit: OrbitControls::new(&config.camera),
            interaction: InteractionCoordinator::new(&config.interaction),
            batch: LoadBatch::new(),
            first_load_done: false,
            config,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn selected_model(&self) -> Option<&Model> {
        self.selection.selected_model(&self.registry)
    }

    pub fn cameras(&self) -> &CameraViewController {
        &self.cameras
    }

    pub fn camera(&self) -> &Camera {
        self.cameras.camera()
    }

    pub fn orbit(&self) -> &OrbitControls {
        &self.orbit
    }

    pub fn interaction(&self) -> &InteractionCoordinator {
        &self.interaction
    }

    pub fn load_generation(&self) -> u64 {
        self.batch.generation()
    }

    pub fn pending_loads(&self) -> usize {
        self.batch.remaining()
    }

    /// True once every load of the current generation has settled.
    pub fn is_interactive(&self) -> bool {
        self.interaction.is_armed()
    }

    /// Tears down the current model set and opens a new load generation.
    /// Returns the generation id the caller must tag each load with.
    pub fn begin_load(&mut self, manifest: &Manifest) -> u64 {
        // Selection first, so no highlight outlives its model.
        self.selection.clear(&mut self.registry);
        self.registry.clear();
        self.interaction.disarm(&mut self.orbit);
        let generation = self.batch.begin(manifest.len());
        log::info!(
            "Load generation {} started with {} models",
            generation,
            manifest.len()
        );
        if self.batch.is_complete() {
            self.on_batch_complete();
        }
        generation
    }

    /// Starts a generation and queues every manifest entry on `queue`.
    pub fn load_manifest(&mut self, manifest: &Manifest, queue: &LoadQueue) -> u64 {
        let generation = self.begin_load(manifest);
        for (index, entry) in manifest.entries().iter().enumerate() {
            if let Err(err) = queue.submit(generation, index, entry.clone()) {
                self.handle_completion(LoadCompletion {
                    generation,
                    index,
                    name: entry.name.clone(),
                    result: Err(err),
                });
            }
        }
        generation
    }

    pub fn handle_completion(&mut self, completion: LoadCompletion) -> CompletionOutcome {
        let LoadCompletion {
            generation,
            index,
            name,
            result,
        } = completion;
        let settle = self.batch.settle(generation);
        if settle == Settle::Stale {
            log::debug!(
                "Discarding stale load of '{}' (generation {}, current {})",
                name,
                generation,
                self.batch.generation()
            );
            return CompletionOutcome::Stale;
        }

        let outcome = match result {
            Ok(object) => self.place_and_insert(index, name, object),
            Err(err) => {
                log::warn!("Model {} '{}' failed to load: {}", index, name, err);
                CompletionOutcome::Failed(index)
            }
        };
        if settle == Settle::Complete {
            self.on_batch_complete();
        }
        outcome
    }

    /// Stops waiting for the loads still outstanding and arms interaction
    /// over whatever has arrived. Returns how many loads were abandoned.
    pub fn give_up_pending_loads(&mut self) -> usize {
        if self.batch.is_complete() {
            return 0;
        }
        let abandoned = self.batch.give_up();
        log::warn!(
            "Giving up on {} pending loads of generation {}",
            abandoned,
            self.batch.generation()
        );
        self.on_batch_complete();
        abandoned
    }

    fn place_and_insert(
        &mut self,
        index: usize,
        name: String,
        mut object: SceneObject,
    ) -> CompletionOutcome {
        let existing = self.registry.bounding_boxes();
        let placement = match self
            .placement
            .place(&object, &existing, self.sampler.as_mut())
        {
            Ok(placement) => placement,
            Err(err) => {
                log::warn!("Skipping model {} '{}': {}", index, name, err);
                return CompletionOutcome::Skipped(index);
            }
        };
        placement.apply(&mut object);

        let color = Rgb::random(&mut self.color_rng);
        match self.registry.insert(object, index, name, color) {
            Ok(model) => {
                log::debug!(
                    "Placed model {} '{}' at {:?} scale {:.3} after {} attempts",
                    index,
                    model.name(),
                    placement.position,
                    placement.scale,
                    placement.attempts
                );
                CompletionOutcome::Inserted(index)
            }
            Err(err) => {
                log::warn!("Skipping model {}: {}", index, err);
                CompletionOutcome::Skipped(index)
            }
        }
    }

    fn on_batch_complete(&mut self) {
        log::info!(
            "Load generation {} settled with {} models",
            self.batch.generation(),
            self.registry.len()
        );
        self.interaction
            .arm(self.registry.proxy_handles(), &mut self.orbit);
        if !self.first_load_done {
            self.first_load_done = true;
            self.cameras.set_view(CameraView::Default, true);
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        let viewport = Viewport::new(width, height);
        if viewport.is_empty() {
            return;
        }
        let device = DeviceClass::for_width(width, self.config.camera.compact_viewport_width);
        self.cameras.resize(viewport, device);
        log::debug!(
            "Viewport resized to {}x{} ({:?}), camera distance {:.2}",
            width,
            height,
            device,
            self.cameras.distance()
        );
    }

    pub fn set_view(&mut self, view: CameraView) {
        self.cameras.set_view(view, false);
        log::info!("Camera view set to {}", view.label());
    }

    pub fn pointer_move(&mut self, position: Vec2) {
        self.interact(|coordinator, ctx| coordinator.pointer_move(ctx, position));
    }

    pub fn pointer_down(&mut self, position: Vec2) {
        self.interact(|coordinator, ctx| coordinator.pointer_down(ctx, position));
    }

    pub fn pointer_up(&mut self, position: Vec2) {
        self.interact(|coordinator, ctx| coordinator.pointer_up(ctx, position));
    }

    pub fn pointer_cancel(&mut self) {
        self.interaction.cancel(&mut self.orbit);
    }

    /// Wheel zoom; ignored while orbit is suspended.
    pub fn zoom(&mut self, steps: f32) {
        self.orbit.zoom(self.cameras.camera_mut(), steps);
    }

    fn interact<R>(
        &mut self,
        f: impl FnOnce(&mut InteractionCoordinator, &mut InteractionContext<'_>) -> R,
    ) -> R {
        let viewport = self.cameras.viewport();
        let mut ctx = InteractionContext {
            registry: &mut self.registry,
            selection: &mut self.selection,
            camera: self.cameras.camera_mut(),
            orbit: &mut self.orbit,
            viewport,
        };
        f(&mut self.interaction, &mut ctx)
    }

    pub fn select_model(&mut self, index: usize) -> bool {
        self.selection.select(&mut self.registry, index)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear(&mut self.registry);
    }

    pub fn set_model_color(&mut self, index: usize, color: Rgb) -> Result<(), RegistryError> {
        self.registry.set_model_color(index, color)
    }

    pub fn set_model_transparency(
        &mut self,
        index: usize,
        percent: u8,
    ) -> Result<(), RegistryError> {
        self.registry.set_model_transparency(index, percent)
    }

    pub fn set_model_visibility(
        &mut self,
        index: usize,
        visible: bool,
    ) -> Result<(), RegistryError> {
        self.registry.set_model_visibility(index, visible)?;
        self.interaction
            .release_unpickable(&self.registry, &mut self.orbit);
        Ok(())
    }

    /// Gives the selected model a fresh random color. Returns the color applied.
    pub fn randomize_selected_color(&mut self) -> Option<Rgb> {
        let index = self.selection.selected()?;
        let color = Rgb::random(&mut self.color_rng);
        self.registry.set_model_color(index, color).ok()?;
        Some(color)
    }

    pub fn toggle_selected_visibility(&mut self) -> Option<bool> {
        let model = self.selected_model()?;
        let (index, visible) = (model.index(), !model.visible());
        self.set_model_visibility(index, visible).ok()?;
        Some(visible)
    }

    /// Shifts the selected model's transparency by `delta` percent, clamped to 0..=100.
    pub fn adjust_selected_transparency(&mut self, delta: i16) -> Option<u8> {
        let model = self.selected_model()?;
        let index = model.index();
        let percent = (model.transparency_percent() as i16 + delta).clamp(0, 100) as u8;
        self.registry.set_model_transparency(index, percent).ok()?;
        Some(percent)
    }
}
