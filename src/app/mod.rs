mod input;

use crate::assets::{AssetError, GltfLoader, LoadQueue, Manifest};
use crate::camera::Viewport;
use crate::config::{ConfigError, ViewerConfig};
use crate::viewer::Viewer;
use input::{InputAction, InputState};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

/// How often pending loads are polled while a generation is in flight.
const LOAD_POLL_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Asset(#[from] AssetError),
}

pub struct App {
    window: Option<Arc<Window>>,
    viewer: Viewer,
    queue: LoadQueue,
    manifest_path: PathBuf,
    input: InputState,
    close_requested: bool,
}

impl App {
    fn new(config: ViewerConfig, queue: LoadQueue) -> Self {
        let viewport = Viewport::new(config.window.width, config.window.height);
        Self {
            window: None,
            manifest_path: PathBuf::from(&config.manifest_path),
            viewer: Viewer::new(config, viewport),
            queue,
            input: InputState::default(),
            close_requested: false,
        }
    }

    /// Re-reads the manifest and starts a new load generation. A manifest
    /// that cannot be read leaves the current scene untouched.
    fn reload(&mut self) {
        match Manifest::load(&self.manifest_path) {
            Ok(manifest) => {
                log::info!(
                    "Loading {} models from {}",
                    manifest.len(),
                    self.manifest_path.display()
                );
                self.viewer.load_manifest(&manifest, &self.queue);
            }
            Err(err) => log::error!("Reload aborted: {}", err),
        }
    }

    fn handle_action(&mut self, event_loop: &ActiveEventLoop, action: InputAction) {
        match action {
            InputAction::None => {}
            InputAction::SetView(view) => self.viewer.set_view(view),
            InputAction::Reload => self.reload(),
            InputAction::GiveUpLoads => {
                self.viewer.give_up_pending_loads();
            }
            InputAction::ToggleVisibility => {
                if let Some(visible) = self.viewer.toggle_selected_visibility() {
                    log::info!("Selected model visible: {}", visible);
                }
            }
            InputAction::RandomizeColor => {
                if let Some(color) = self.viewer.randomize_selected_color() {
                    log::info!("Selected model color: {}", color);
                }
            }
            InputAction::AdjustTransparency(delta) => {
                if let Some(percent) = self.viewer.adjust_selected_transparency(delta) {
                    log::info!("Selected model transparency: {}%", percent);
                }
            }
            InputAction::Exit => {
                self.close_requested = true;
                event_loop.exit();
            }
        }
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        self.viewer.resize(new_size.width, new_size.height);
    }

    fn drain_loads(&mut self) {
        for completion in self.queue.drain() {
            self.viewer.handle_completion(completion);
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let config = &self.viewer.config().window;
        let window_attrs = WindowAttributes::default()
            .with_title(config.title.clone())
            .with_inner_size(PhysicalSize::new(config.width, config.height))
            .with_resizable(true);

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("Failed to create window: {}", err);
                event_loop.exit();
                return;
            }
        };
        self.handle_resize(window.inner_size());
        self.window = Some(window);
        self.reload();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.close_requested = true;
                event_loop.exit();
            }
            WindowEvent::Focused(focused) => {
                if !focused {
                    self.input.reset();
                    self.viewer.pointer_cancel();
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.repeat {
                    return;
                }
                let pressed = event.state == ElementState::Pressed;
                let action = self.input.handle_key(event.physical_key, pressed);
                self.handle_action(event_loop, action);
            }
            WindowEvent::Resized(new_size) => {
                self.handle_resize(new_size);
            }
            WindowEvent::CursorMoved { position, .. } => {
                let cursor = glam::Vec2::new(position.x as f32, position.y as f32);
                self.input.cursor = Some(cursor);
                self.viewer.pointer_move(cursor);
            }
            WindowEvent::CursorLeft { .. } => {
                self.input.reset();
                self.viewer.pointer_cancel();
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let Some(cursor) = self.input.cursor else {
                    return;
                };
                match state {
                    ElementState::Pressed => {
                        self.input.left_held = true;
                        self.viewer.pointer_down(cursor);
                    }
                    ElementState::Released => {
                        if self.input.left_held {
                            self.input.left_held = false;
                            self.viewer.pointer_up(cursor);
                        }
                    }
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.viewer.zoom(input::wheel_steps(delta));
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.drain_loads();
        if self.close_requested {
            return;
        }
        if self.viewer.pending_loads() > 0 {
            let deadline = Instant::now() + LOAD_POLL_INTERVAL;
            event_loop.set_control_flow(ControlFlow::WaitUntil(deadline));
        } else {
            event_loop.set_control_flow(ControlFlow::Wait);
        }
    }
}

pub fn run(config: ViewerConfig) -> Result<(), AppError> {
    log::info!("Model viewer starting, manifest {}", config.manifest_path);
    log::info!("   Keys: 1-5 views, R reload, G stop waiting, V visibility, C color, [ ] transparency, Esc exit");

    let manifest = Manifest::load(&config.manifest_path)?;
    let queue = LoadQueue::new(Arc::new(GltfLoader::new(manifest.base_dir())))?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config, queue);
    event_loop.run_app(&mut app)?;

    log::info!("Model viewer closed");
    Ok(())
}
