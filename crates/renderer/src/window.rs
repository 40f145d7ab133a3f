//! Windowed surface state for the interactive preview.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use corelib::Mat4;
use corelib::camera::Camera;
use winit::window::Window;

use asset::texture::TextureData;

use crate::context::GpuContext;
use crate::mesh::Mesh;
use crate::scene::{self, Scene, SceneParams, ShadingMode};

/// Surface, scene and depth buffer bound to one window.
pub struct WindowState {
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    ctx: GpuContext,
    scene: Scene,
    camera: Camera,
    depth_view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl WindowState {
    /// Create GPU state bound to an `Arc<Window>`.
    pub async fn new(
        window: Arc<Window>,
        backends: wgpu::Backends,
        texture: &TextureData,
        camera: Camera,
    ) -> Result<Self> {
        let size = window.inner_size();
        let width = size.width.max(1);
        let height = size.height.max(1);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let surface: wgpu::Surface<'static> = instance
            .create_surface(window.clone())
            .context("surface creation failed")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable GPU adapter")?;
        log::info!("GPU adapter: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("orbitsnap device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await
            .context("GPU device creation failed")?;

        // Prefer an sRGB surface format.
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(caps.formats[0]);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let ctx = GpuContext::from_parts(device, queue);
        let depth_view = scene::create_depth_view(&ctx.device, width, height);
        let scene = Scene::new(
            &ctx,
            SceneParams {
                target_format: surface_format,
                flipped_target: false,
                z_near: camera.z_near,
                z_far: camera.z_far,
            },
            texture,
        );

        Ok(Self {
            surface,
            surface_config,
            ctx,
            scene,
            camera,
            depth_view,
            width,
            height,
        })
    }

    /// The backend meshes upload through.
    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Resize: reconfigure surface & recreate the depth view.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.surface_config.width = self.width;
        self.surface_config.height = self.height;
        self.surface.configure(&self.ctx.device, &self.surface_config);
        self.depth_view = scene::create_depth_view(&self.ctx.device, self.width, self.height);
    }

    /// Render one frame with the given camera pose and shading mode.
    pub fn render(
        &mut self,
        mesh: &Mesh,
        view: Mat4,
        model: Mat4,
        mode: ShadingMode,
    ) -> Result<(), wgpu::SurfaceError> {
        let frame = self.surface.get_current_texture()?;
        let frame_view = frame.texture.create_view(&Default::default());

        let proj = self
            .camera
            .with_aspect(self.width as f32 / self.height as f32)
            .proj();

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("preview encoder"),
            });
        self.scene.draw(
            &self.ctx,
            &mut encoder,
            &frame_view,
            &self.depth_view,
            mesh,
            proj,
            view,
            model,
            mode,
        );
        self.ctx.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    pub fn is_surface_lost(err: &wgpu::SurfaceError) -> bool {
        matches!(
            err,
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated
        )
    }

    pub fn recreate_surface(&mut self) {
        self.resize(self.width, self.height);
    }
}
