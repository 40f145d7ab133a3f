//! GPU backend seam: buffer creation behind a trait so the mesh upload
//! logic runs against a dummy backend in tests.

/// Handle to a GPU buffer resource.
#[derive(Debug)]
pub enum GpuBuffer {
    /// Dummy backend (no GPU allocation); remembers the requested size.
    Dummy { size: u64 },
    /// wgpu backend buffer.
    Wgpu(wgpu::Buffer),
}

impl GpuBuffer {
    pub fn as_wgpu(&self) -> Option<&wgpu::Buffer> {
        match self {
            Self::Wgpu(buffer) => Some(buffer),
            Self::Dummy { .. } => None,
        }
    }

    pub fn size(&self) -> u64 {
        match self {
            Self::Dummy { size } => *size,
            Self::Wgpu(buffer) => buffer.size(),
        }
    }
}

/// The buffer allocations the mesh manager needs from a GPU backend.
/// Buffers are static: uploaded once, drawn many times, freed on drop.
pub trait GpuBackend {
    fn name(&self) -> &'static str;

    /// Create a vertex buffer initialized with `contents`.
    fn create_vertex_buffer(&self, label: &str, contents: &[u8]) -> GpuBuffer;

    /// Create an index buffer initialized with `contents`.
    fn create_index_buffer(&self, label: &str, contents: &[u8]) -> GpuBuffer;
}

/// No-op backend for tests and development.
#[derive(Debug, Default)]
pub struct DummyBackend;

impl GpuBackend for DummyBackend {
    fn name(&self) -> &'static str {
        "dummy"
    }

    fn create_vertex_buffer(&self, _label: &str, contents: &[u8]) -> GpuBuffer {
        GpuBuffer::Dummy {
            size: contents.len() as u64,
        }
    }

    fn create_index_buffer(&self, _label: &str, contents: &[u8]) -> GpuBuffer {
        GpuBuffer::Dummy {
            size: contents.len() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dummy_buffers_remember_their_size() {
        let backend = DummyBackend;
        let buf = backend.create_vertex_buffer("test", &[0u8; 24]);
        assert_eq!(buf.size(), 24);
        assert!(buf.as_wgpu().is_none());
    }
}
