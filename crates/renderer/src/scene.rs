//! Scene pipeline: diffuse-lit or depth-visualized shading of one mesh,
//! one directional white light, one diffuse texture.

use bytemuck::{Pod, Zeroable};
use corelib::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use asset::texture::TextureData;

use crate::backend::GpuBuffer;
use crate::context::GpuContext;
use crate::mesh::{DrawShapes, Mesh, ShapeBuffers};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Fragment shading selector, set per draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShadingMode {
    /// Textured diffuse lighting.
    Diffuse,
    /// Grayscale linearized fragment depth.
    DepthView,
}

/// Scene uniforms (16-byte aligned).
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct SceneUniform {
    proj: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    /// Directional light, xyz used.
    light_dir: [f32; 4],
    /// x: shading mode, y: z_near, z: z_far.
    params: [f32; 4],
}

/// Static parameters fixed at scene creation.
pub struct SceneParams {
    pub target_format: wgpu::TextureFormat,
    /// The capture target renders with Y negated so its raw rows read
    /// bottom-up; that mirrors the winding, so front faces flip to CW.
    pub flipped_target: bool,
    pub z_near: f32,
    pub z_far: f32,
}

const POSITION_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: 12,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &wgpu::vertex_attr_array![0 => Float32x3],
};

const TEXCOORD_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: 8,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &wgpu::vertex_attr_array![1 => Float32x2],
};

const NORMAL_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: 12,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &wgpu::vertex_attr_array![2 => Float32x3],
};

/// Pipeline, uniforms and texture bindings for drawing meshes.
pub struct Scene {
    pipeline: wgpu::RenderPipeline,
    uniform_buf: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    light_dir: Vec3,
    z_near: f32,
    z_far: f32,
}

impl Scene {
    pub fn new(ctx: &GpuContext, params: SceneParams, texture: &TextureData) -> Self {
        let device = &ctx.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
        });

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("scene bind group layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: wgpu::BufferSize::new(
                                std::mem::size_of::<SceneUniform>() as u64,
                            ),
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let uniform_init = SceneUniform {
            proj: Mat4::IDENTITY.to_cols_array_2d(),
            view: Mat4::IDENTITY.to_cols_array_2d(),
            model: Mat4::IDENTITY.to_cols_array_2d(),
            light_dir: [0.0, 0.0, -1.0, 0.0],
            params: [0.0, params.z_near, params.z_far, 0.0],
        };
        let uniform_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("scene uniforms"),
            contents: bytemuck::bytes_of(&uniform_init),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let (texture_view, sampler) = upload_texture(ctx, texture);

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene bind group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&texture_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let front_face = if params.flipped_target {
            wgpu::FrontFace::Cw
        } else {
            wgpu::FrontFace::Ccw
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("scene pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[POSITION_LAYOUT, TEXCOORD_LAYOUT, NORMAL_LAYOUT],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: params.target_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                front_face,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            uniform_buf,
            bind_group,
            light_dir: Vec3::new(-1.0, -1.0, -1.0).normalize(),
            z_near: params.z_near,
            z_far: params.z_far,
        }
    }

    pub fn light_dir(&self) -> Vec3 {
        self.light_dir
    }

    pub fn set_light_dir(&mut self, dir: Vec3) {
        self.light_dir = dir.normalize_or(Vec3::NEG_Z);
    }

    /// Encode one pass drawing `mesh` into the given color/depth views.
    /// Clears to white, clears depth to 1.0, then draws every shape.
    #[allow(clippy::too_many_arguments)]
    pub fn draw(
        &self,
        ctx: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        color: &wgpu::TextureView,
        depth: &wgpu::TextureView,
        mesh: &Mesh,
        proj: Mat4,
        view: Mat4,
        model: Mat4,
        mode: ShadingMode,
    ) {
        let uniforms = SceneUniform {
            proj: proj.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            light_dir: [self.light_dir.x, self.light_dir.y, self.light_dir.z, 0.0],
            params: [
                match mode {
                    ShadingMode::Diffuse => 0.0,
                    ShadingMode::DepthView => 1.0,
                },
                self.z_near,
                self.z_far,
                0.0,
            ],
        };
        ctx.queue
            .write_buffer(&self.uniform_buf, 0, bytemuck::bytes_of(&uniforms));

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("scene pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: 1.0,
                        g: 1.0,
                        b: 1.0,
                        a: 0.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);

        let mut drawer = ShapeDrawer {
            pass: &mut rpass,
            defaults: mesh.defaults(),
        };
        mesh.render(&mut drawer);
    }
}

/// Create a depth texture view matching the given target size.
pub(crate) fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let tex = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    tex.create_view(&wgpu::TextureViewDescriptor::default())
}

fn upload_texture(ctx: &GpuContext, data: &TextureData) -> (wgpu::TextureView, wgpu::Sampler) {
    let size = wgpu::Extent3d {
        width: data.width,
        height: data.height,
        depth_or_array_layers: 1,
    };
    let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("diffuse texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    ctx.queue.write_texture(
        texture.as_image_copy(),
        &data.data,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(data.bytes_per_pixel() * data.width),
            rows_per_image: Some(data.height),
        },
        size,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let sampler = ctx.device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("diffuse sampler"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    });
    (view, sampler)
}

/// Binds a shape's buffers into the fixed attribute slots and issues the
/// indexed draw. Vacant optional slots get the mesh's shared zero buffer.
struct ShapeDrawer<'a, 'p> {
    pass: &'a mut wgpu::RenderPass<'p>,
    defaults: Option<&'a GpuBuffer>,
}

impl DrawShapes for ShapeDrawer<'_, '_> {
    fn draw_shape(&mut self, shape: &ShapeBuffers) {
        let Some(position) = shape.position().and_then(GpuBuffer::as_wgpu) else {
            return;
        };
        self.pass.set_vertex_buffer(0, position.slice(..));

        let defaults = self.defaults.and_then(GpuBuffer::as_wgpu);
        let vertices = shape.vertex_count() as u64;

        match shape.texcoord().and_then(GpuBuffer::as_wgpu) {
            Some(buf) => self.pass.set_vertex_buffer(1, buf.slice(..)),
            None => {
                if let Some(buf) = defaults {
                    self.pass.set_vertex_buffer(1, buf.slice(..vertices * 8));
                }
            }
        }
        match shape.normal().and_then(GpuBuffer::as_wgpu) {
            Some(buf) => self.pass.set_vertex_buffer(2, buf.slice(..)),
            None => {
                if let Some(buf) = defaults {
                    self.pass.set_vertex_buffer(2, buf.slice(..vertices * 12));
                }
            }
        }

        if let Some(index) = shape.index().as_wgpu() {
            self.pass
                .set_index_buffer(index.slice(..), wgpu::IndexFormat::Uint32);
            self.pass.draw_indexed(0..shape.index_count(), 0, 0..1);
        }
    }
}
