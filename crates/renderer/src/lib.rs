//! Renderer: wgpu context, per-shape GPU buffers, the diffuse/depth scene
//! pipeline, offscreen capture and the windowed preview surface.

pub mod backend;
pub mod capture;
pub mod context;
pub mod mesh;
pub mod scene;
pub mod window;

pub use backend::{DummyBackend, GpuBackend, GpuBuffer};
pub use capture::{CaptureError, SnapshotRenderer};
pub use context::GpuContext;
pub use mesh::{DrawShapes, Mesh, ShapeBuffers};
pub use scene::{Scene, SceneParams, ShadingMode};
pub use window::WindowState;
