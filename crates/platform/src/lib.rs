//! Platform layer: the interactive preview window.
//!
//! Key events apply deltas to the current rotation; every frame tick
//! renders the mesh with that rotation. No rotation grid here — the grid
//! belongs to the headless capture driver.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use asset::texture::TextureData;
use corelib::Vec3;
use corelib::camera::Camera;
use corelib::rotation::RotationSample;
use corelib::transform::Transform;
use renderer::{GpuBackend as _, Mesh, ShadingMode, WindowState};

/// Static configuration for one preview session.
pub struct PreviewConfig {
    pub obj: PathBuf,
    pub texture: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    pub distance: f32,
    pub mode: ShadingMode,
    pub backends: wgpu::Backends,
}

const ROTATE_STEP_DEG: i32 = 5;

/// Light directions cycled by the space key.
const LIGHT_DIRS: &[[f32; 3]] = &[
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, 0.0],
    [0.0, -1.0, 1.0],
    [0.0, 1.0, 0.0],
];

fn wrap_deg(deg: i32) -> i32 {
    (deg % 360 + 360) % 360
}

struct PreviewApp {
    config: PreviewConfig,
    window: Option<Arc<Window>>,
    state: Option<WindowState>,
    mesh: Option<Mesh>,
    rotation: RotationSample,
    light_index: usize,
    error: Option<anyhow::Error>,
}

impl PreviewApp {
    fn new(config: PreviewConfig) -> Self {
        Self {
            config,
            window: None,
            state: None,
            mesh: None,
            rotation: RotationSample::ZERO,
            light_index: 0,
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("orbitsnap preview")
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));
        let window = Arc::new(event_loop.create_window(attrs)?);
        log::info!(
            "Window created: {}x{}",
            window.inner_size().width,
            window.inner_size().height
        );

        let texture = match &self.config.texture {
            Some(path) => TextureData::from_path(path)?,
            None => TextureData::checkerboard(64),
        };
        let state = pollster::block_on(WindowState::new(
            window.clone(),
            self.config.backends,
            &texture,
            Camera::default(),
        ))?;
        let mesh = Mesh::from_obj_path(state.context(), &self.config.obj)?;
        log::info!(
            "preview ready: {} shape(s) via {} backend",
            mesh.shape_count(),
            state.context().name()
        );

        self.window = Some(window);
        self.state = Some(state);
        self.mesh = Some(mesh);
        Ok(())
    }

    /// Key press -> rotation/light state delta.
    fn on_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::ArrowDown => {
                self.rotation.x_deg = wrap_deg(self.rotation.x_deg - ROTATE_STEP_DEG);
            }
            KeyCode::ArrowUp => {
                self.rotation.x_deg = wrap_deg(self.rotation.x_deg + ROTATE_STEP_DEG);
            }
            KeyCode::ArrowRight => {
                self.rotation.y_deg = wrap_deg(self.rotation.y_deg - ROTATE_STEP_DEG);
            }
            KeyCode::ArrowLeft => {
                self.rotation.y_deg = wrap_deg(self.rotation.y_deg + ROTATE_STEP_DEG);
            }
            KeyCode::KeyN => {
                self.rotation.z_deg = wrap_deg(self.rotation.z_deg - ROTATE_STEP_DEG);
            }
            KeyCode::KeyM => {
                self.rotation.z_deg = wrap_deg(self.rotation.z_deg + ROTATE_STEP_DEG);
            }
            KeyCode::KeyC => {
                log::info!(
                    "rotation: x:{} y:{} z:{}",
                    self.rotation.x_deg,
                    self.rotation.y_deg,
                    self.rotation.z_deg
                );
            }
            KeyCode::Space => {
                self.light_index = (self.light_index + 1) % LIGHT_DIRS.len();
                if let Some(state) = &mut self.state {
                    state
                        .scene_mut()
                        .set_light_dir(Vec3::from(LIGHT_DIRS[self.light_index]));
                }
            }
            _ => {}
        }
    }

    /// Frame tick -> render with the current rotation.
    fn redraw(&mut self) {
        let (Some(state), Some(mesh)) = (&mut self.state, &self.mesh) else {
            return;
        };
        let view = self.rotation.view_matrix(self.config.distance);
        let model = Transform::identity().matrix();
        match state.render(mesh, view, model, self.config.mode) {
            Ok(()) => {}
            Err(err) if WindowState::is_surface_lost(&err) => {
                log::warn!("surface lost, recreating");
                state.recreate_surface();
            }
            Err(err) => log::error!("render error: {err}"),
        }
    }
}

impl ApplicationHandler for PreviewApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_none() {
            if let Err(err) = self.init(event_loop) {
                self.error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested. Exiting preview.");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(state) = &mut self.state {
                    state.resize(size.width, size.height);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => self.on_key(code),
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// Run the preview until the window closes.
pub fn run_preview(config: PreviewConfig) -> Result<()> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = PreviewApp::new(config);
    event_loop.run_app(&mut app)?;

    match app.error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degrees_wrap_into_a_full_turn() {
        assert_eq!(wrap_deg(-5), 355);
        assert_eq!(wrap_deg(360), 0);
        assert_eq!(wrap_deg(725), 5);
    }
}
