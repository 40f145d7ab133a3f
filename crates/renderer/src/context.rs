//! GPU instance/device setup shared by the headless and windowed paths.

use anyhow::{Context as _, Result};
use wgpu::util::DeviceExt;

use crate::backend::{GpuBackend, GpuBuffer};

/// Owns the wgpu device/queue pair. Implements [`GpuBackend`] so mesh
/// upload goes through the same seam the tests fake.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    /// Create a context with no surface, for offscreen capture.
    pub fn headless(backends: wgpu::Backends) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .context("no suitable GPU adapter")?;
        log::info!("GPU adapter: {:?}", adapter.get_info());

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("orbitsnap device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                .using_resolution(adapter.limits()),
            memory_hints: Default::default(),
            trace: Default::default(),
        }))
        .context("GPU device creation failed")?;

        Ok(Self { device, queue })
    }

    /// Wrap an already-created device/queue pair (the windowed path).
    pub fn from_parts(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self { device, queue }
    }
}

impl GpuBackend for GpuContext {
    fn name(&self) -> &'static str {
        "wgpu"
    }

    fn create_vertex_buffer(&self, label: &str, contents: &[u8]) -> GpuBuffer {
        GpuBuffer::Wgpu(
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(label),
                    contents,
                    usage: wgpu::BufferUsages::VERTEX,
                }),
        )
    }

    fn create_index_buffer(&self, label: &str, contents: &[u8]) -> GpuBuffer {
        GpuBuffer::Wgpu(
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(label),
                    contents,
                    usage: wgpu::BufferUsages::INDEX,
                }),
        )
    }
}
