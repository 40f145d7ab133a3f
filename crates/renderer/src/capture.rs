//! Offscreen capture: render into a private color target, read the pixels
//! back synchronously, and hand them to a snapshot writer.

use std::path::PathBuf;

use anyhow::Result;
use corelib::camera::Camera;
use corelib::{Mat4, Vec3};
use thiserror::Error;

use asset::snapshot::SnapshotWriter;
use asset::texture::TextureData;

use crate::context::GpuContext;
use crate::mesh::Mesh;
use crate::scene::{self, Scene, SceneParams, ShadingMode};

const CAPTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("framebuffer read-back failed: {0}")]
    MapFailed(#[from] wgpu::BufferAsyncError),
    #[error("read-back channel closed before the buffer was mapped")]
    Cancelled,
}

/// Offscreen color+depth target with a reusable read-back buffer.
struct CaptureTarget {
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    readback: wgpu::Buffer,
    width: u32,
    height: u32,
    padded_bytes_per_row: u32,
}

impl CaptureTarget {
    fn new(ctx: &GpuContext, width: u32, height: u32) -> Self {
        let color = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("capture color target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: CAPTURE_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = scene::create_depth_view(&ctx.device, width, height);

        let padded = padded_bytes_per_row(width);
        let readback = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("capture read-back"),
            size: padded as u64 * height as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            color,
            color_view,
            depth_view,
            readback,
            width,
            height,
            padded_bytes_per_row: padded,
        }
    }
}

/// Headless renderer: draws a mesh from an explicit camera pose and
/// persists each frame as a numbered snapshot.
///
/// The capture projection negates Y so the raw target rows read bottom-up;
/// the snapshot writer flips them back into top-down image order.
pub struct SnapshotRenderer {
    ctx: GpuContext,
    scene: Scene,
    camera: Camera,
    target: Option<CaptureTarget>,
}

impl SnapshotRenderer {
    pub fn new(ctx: GpuContext, texture: &TextureData, camera: Camera) -> Self {
        let scene = Scene::new(
            &ctx,
            SceneParams {
                target_format: CAPTURE_FORMAT,
                flipped_target: true,
                z_near: camera.z_near,
                z_far: camera.z_far,
            },
            texture,
        );
        Self {
            ctx,
            scene,
            camera,
            target: None,
        }
    }

    /// The backend meshes upload through.
    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Draw the mesh, read the color target back, and write snapshot
    /// `<prefix><id>.png` through `writer`. The id affects naming only.
    #[allow(clippy::too_many_arguments)]
    pub fn render_and_capture(
        &mut self,
        mesh: &Mesh,
        view: Mat4,
        model: Mat4,
        width: u32,
        height: u32,
        mode: ShadingMode,
        writer: &SnapshotWriter,
        snapshot_id: u32,
    ) -> Result<PathBuf> {
        let pixels = self.render_frame(mesh, view, model, width, height, mode)?;
        let path = writer.write(snapshot_id, width, height, pixels)?;
        Ok(path)
    }

    /// Draw and read back one frame; blocks until the pixels are on the CPU.
    fn render_frame(
        &mut self,
        mesh: &Mesh,
        view: Mat4,
        model: Mat4,
        width: u32,
        height: u32,
        mode: ShadingMode,
    ) -> Result<Vec<u8>, CaptureError> {
        let width = width.max(1);
        let height = height.max(1);
        let target = match &mut self.target {
            Some(t) if t.width == width && t.height == height => t,
            slot => slot.insert(CaptureTarget::new(&self.ctx, width, height)),
        };

        let proj = Mat4::from_scale(Vec3::new(1.0, -1.0, 1.0))
            * self.camera.with_aspect(width as f32 / height as f32).proj();

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("capture encoder"),
            });
        self.scene.draw(
            &self.ctx,
            &mut encoder,
            &target.color_view,
            &target.depth_view,
            mesh,
            proj,
            view,
            model,
            mode,
        );
        encoder.copy_texture_to_buffer(
            target.color.as_image_copy(),
            wgpu::TexelCopyBufferInfo {
                buffer: &target.readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(target.padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.ctx.queue.submit(Some(encoder.finish()));

        let slice = target.readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });
        let _ = self.ctx.device.poll(wgpu::PollType::Wait);
        rx.recv().map_err(|_| CaptureError::Cancelled)??;

        let pixels = {
            let data = slice.get_mapped_range();
            unpad_rows(&data, width, height, target.padded_bytes_per_row)
        };
        target.readback.unmap();
        Ok(pixels)
    }
}

/// Bytes per read-back row, padded to the copy alignment.
fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * 4;
    unpadded.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT) * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT
}

/// Strip the per-row copy padding, leaving tightly packed RGBA8 rows.
fn unpad_rows(data: &[u8], width: u32, height: u32, padded: u32) -> Vec<u8> {
    let unpadded = (width * 4) as usize;
    let mut pixels = Vec::with_capacity(unpadded * height as usize);
    for row in 0..height as usize {
        let start = row * padded as usize;
        pixels.extend_from_slice(&data[start..start + unpadded]);
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_padding_is_aligned_and_sufficient() {
        for width in [1u32, 64, 500, 513, 1024] {
            let padded = padded_bytes_per_row(width);
            assert_eq!(padded % wgpu::COPY_BYTES_PER_ROW_ALIGNMENT, 0);
            assert!(padded >= width * 4);
            assert!(padded - width * 4 < wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        }
    }

    #[test]
    fn unpadding_keeps_exactly_the_pixel_bytes() {
        let width = 2u32;
        let height = 3u32;
        let padded = padded_bytes_per_row(width);
        let mut data = vec![0u8; (padded * height) as usize];
        for row in 0..height {
            for byte in 0..width * 4 {
                data[(row * padded + byte) as usize] = row as u8 + 1;
            }
        }
        let pixels = unpad_rows(&data, width, height, padded);
        assert_eq!(pixels.len(), (width * height * 4) as usize);
        assert!(pixels[..8].iter().all(|&b| b == 1));
        assert!(pixels[8..16].iter().all(|&b| b == 2));
        assert!(pixels[16..].iter().all(|&b| b == 3));
    }
}
