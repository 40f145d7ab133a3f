//! GPU-resident mesh: one buffer set per loaded shape.
//!
//! Upload happens once at construction; the sets keep the source file's
//! shape order and are freed exactly once when the mesh drops.

use std::path::Path;

use asset::shape::ShapeData;

use crate::backend::{GpuBackend, GpuBuffer};

/// GPU buffer set for one shape: attribute buffers that exist only when the
/// source arrays are non-empty, the always-present index buffer, and the
/// stored index count.
#[derive(Debug)]
pub struct ShapeBuffers {
    position: Option<GpuBuffer>,
    texcoord: Option<GpuBuffer>,
    normal: Option<GpuBuffer>,
    index: GpuBuffer,
    index_count: u32,
    vertex_count: u32,
}

impl ShapeBuffers {
    pub fn position(&self) -> Option<&GpuBuffer> {
        self.position.as_ref()
    }

    pub fn texcoord(&self) -> Option<&GpuBuffer> {
        self.texcoord.as_ref()
    }

    pub fn normal(&self) -> Option<&GpuBuffer> {
        self.normal.as_ref()
    }

    pub fn index(&self) -> &GpuBuffer {
        &self.index
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }
}

/// Sink for the draw calls a mesh produces. The wgpu render pass encoder
/// implements this; tests substitute a recorder.
pub trait DrawShapes {
    fn draw_shape(&mut self, shape: &ShapeBuffers);
}

/// All shapes of one model, resident on the GPU in file order.
pub struct Mesh {
    shapes: Vec<ShapeBuffers>,
    defaults: Option<GpuBuffer>,
}

impl Mesh {
    /// Parse an OBJ file and upload every shape. A parse error surfaces
    /// with the parser diagnostic and the path, before any GPU allocation.
    pub fn from_obj_path(backend: &dyn GpuBackend, path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let shapes = asset::obj::load_obj_from_path(path)?;
        Ok(Self::upload(backend, &shapes))
    }

    /// Upload parsed shapes as static buffers, one set per shape in file
    /// order. A shape with no positions gets no attribute buffers but keeps
    /// its index buffer; texcoord/normal buffers exist only when the source
    /// arrays do.
    pub fn upload(backend: &dyn GpuBackend, shapes: &[ShapeData]) -> Self {
        let mut sets = Vec::with_capacity(shapes.len());
        let mut default_bytes = 0usize;

        for (i, shape) in shapes.iter().enumerate() {
            let position = (!shape.positions.is_empty()).then(|| {
                backend.create_vertex_buffer(
                    &format!("shape{i} positions"),
                    bytemuck::cast_slice(&shape.positions),
                )
            });
            let texcoord = (!shape.texcoords.is_empty()).then(|| {
                backend.create_vertex_buffer(
                    &format!("shape{i} texcoords"),
                    bytemuck::cast_slice(&shape.texcoords),
                )
            });
            let normal = (!shape.normals.is_empty()).then(|| {
                backend.create_vertex_buffer(
                    &format!("shape{i} normals"),
                    bytemuck::cast_slice(&shape.normals),
                )
            });
            let index = backend.create_index_buffer(
                &format!("shape{i} indices"),
                bytemuck::cast_slice(&shape.indices),
            );

            // A drawable shape missing texcoords or normals reads zeros from
            // the mesh-wide default buffer instead of its own allocation.
            if position.is_some() && (texcoord.is_none() || normal.is_none()) {
                default_bytes = default_bytes
                    .max(shape.vertex_count() * 3 * std::mem::size_of::<f32>());
            }

            sets.push(ShapeBuffers {
                position,
                texcoord,
                normal,
                index,
                index_count: shape.indices.len() as u32,
                vertex_count: shape.vertex_count() as u32,
            });
        }

        let defaults = (default_bytes > 0).then(|| {
            backend.create_vertex_buffer("mesh default attributes", &vec![0u8; default_bytes])
        });

        Self {
            shapes: sets,
            defaults,
        }
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    pub fn shapes(&self) -> &[ShapeBuffers] {
        &self.shapes
    }

    /// Shared zero-filled attribute data for vacant texcoord/normal slots.
    pub fn defaults(&self) -> Option<&GpuBuffer> {
        self.defaults.as_ref()
    }

    /// Issue one draw per buffer set with geometry, in shape order.
    /// Sets without a position buffer are skipped.
    pub fn render(&self, pass: &mut dyn DrawShapes) {
        for shape in &self.shapes {
            if shape.position.is_some() {
                pass.draw_shape(shape);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DummyBackend;

    #[derive(Default)]
    struct Recorder {
        index_counts: Vec<u32>,
    }

    impl DrawShapes for Recorder {
        fn draw_shape(&mut self, shape: &ShapeBuffers) {
            self.index_counts.push(shape.index_count());
        }
    }

    fn quad() -> ShapeData {
        ShapeData {
            name: "quad".into(),
            positions: vec![
                0.0, 0.0, 0.0, //
                1.0, 0.0, 0.0, //
                1.0, 1.0, 0.0, //
                0.0, 1.0, 0.0,
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
            ..Default::default()
        }
    }

    fn triangle_full() -> ShapeData {
        ShapeData {
            name: "tri".into(),
            positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            texcoords: vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            normals: vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            indices: vec![0, 1, 2],
            ..Default::default()
        }
    }

    #[test]
    fn one_buffer_set_per_shape_in_file_order() {
        let mesh = Mesh::upload(&DummyBackend, &[quad(), triangle_full()]);
        assert_eq!(mesh.shape_count(), 2);
        assert_eq!(mesh.shapes()[0].index_count(), 6);
        assert_eq!(mesh.shapes()[1].index_count(), 3);
    }

    #[test]
    fn positions_only_shape_allocates_no_optional_buffers() {
        let mesh = Mesh::upload(&DummyBackend, &[quad()]);
        let set = &mesh.shapes()[0];
        assert!(set.position().is_some());
        assert!(set.texcoord().is_none());
        assert!(set.normal().is_none());
        assert_eq!(set.index().size(), 6 * 4);
        assert_eq!(set.index_count(), 6);
    }

    #[test]
    fn optional_buffers_are_independent() {
        let mut shape = triangle_full();
        shape.normals.clear();
        let mesh = Mesh::upload(&DummyBackend, &[shape]);
        let set = &mesh.shapes()[0];
        assert!(set.texcoord().is_some());
        assert!(set.normal().is_none());
    }

    #[test]
    fn fully_attributed_mesh_needs_no_default_buffer() {
        let mesh = Mesh::upload(&DummyBackend, &[triangle_full()]);
        assert!(mesh.defaults().is_none());
    }

    #[test]
    fn default_buffer_covers_the_largest_incomplete_shape() {
        let mesh = Mesh::upload(&DummyBackend, &[quad(), triangle_full()]);
        // The quad (4 vertices) lacks texcoords and normals.
        let defaults = mesh.defaults().expect("defaults allocated");
        assert_eq!(defaults.size(), 4 * 3 * 4);
    }

    #[test]
    fn shape_without_positions_keeps_only_its_index_buffer() {
        let shape = ShapeData {
            name: "degenerate".into(),
            indices: vec![0, 1, 2],
            ..Default::default()
        };
        let mesh = Mesh::upload(&DummyBackend, &[shape]);
        let set = &mesh.shapes()[0];
        assert!(set.position().is_none());
        assert!(set.texcoord().is_none());
        assert!(set.normal().is_none());
        assert_eq!(set.index().size(), 3 * 4);
        // Dropping the mesh releases only what exists.
        drop(mesh);
    }

    #[test]
    fn render_draws_once_per_set_with_stored_counts_in_order() {
        let mesh = Mesh::upload(&DummyBackend, &[quad(), triangle_full()]);
        let mut recorder = Recorder::default();
        mesh.render(&mut recorder);
        assert_eq!(recorder.index_counts, vec![6, 3]);
    }

    #[test]
    fn render_skips_sets_without_positions() {
        let no_positions = ShapeData {
            indices: vec![0, 1, 2],
            ..Default::default()
        };
        let mesh = Mesh::upload(&DummyBackend, &[no_positions, quad()]);
        let mut recorder = Recorder::default();
        mesh.render(&mut recorder);
        assert_eq!(recorder.index_counts, vec![6]);
    }

    #[test]
    fn failed_parse_allocates_nothing() {
        assert!(Mesh::from_obj_path(&DummyBackend, "/nonexistent/model.obj").is_err());
    }

    #[test]
    fn empty_mesh_renders_nothing() {
        let mesh = Mesh::upload(&DummyBackend, &[]);
        assert_eq!(mesh.shape_count(), 0);
        let mut recorder = Recorder::default();
        mesh.render(&mut recorder);
        assert!(recorder.index_counts.is_empty());
    }
}
