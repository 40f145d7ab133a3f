//! CPU-side shape data produced by the OBJ loader.

/// One named drawable sub-mesh: flat attribute arrays plus triangle indices.
///
/// Positions are 3 floats per vertex. Texcoords (2 per vertex) and normals
/// (3 per vertex) may be empty when the source file omits them; when
/// present they line up with the position array vertex by vertex.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShapeData {
    pub name: String,
    pub positions: Vec<f32>,
    pub texcoords: Vec<f32>,
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
}

impl ShapeData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn has_texcoords(&self) -> bool {
        !self.texcoords.is_empty()
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    /// Attribute arrays form whole vertices, optional arrays match the
    /// position count, and indices form whole triangles.
    pub fn is_consistent(&self) -> bool {
        let verts = self.positions.len() / 3;
        self.positions.len() % 3 == 0
            && self.indices.len() % 3 == 0
            && (self.texcoords.is_empty() || self.texcoords.len() == verts * 2)
            && (self.normals.is_empty() || self.normals.len() == verts * 3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_only_shape_is_consistent() {
        let shape = ShapeData {
            positions: vec![0.0; 12],
            indices: vec![0, 1, 2, 0, 2, 3],
            ..Default::default()
        };
        assert_eq!(shape.vertex_count(), 4);
        assert!(!shape.has_texcoords());
        assert!(!shape.has_normals());
        assert!(shape.is_consistent());
    }

    #[test]
    fn mismatched_texcoords_are_inconsistent() {
        let shape = ShapeData {
            positions: vec![0.0; 9],
            texcoords: vec![0.0; 4],
            indices: vec![0, 1, 2],
            ..Default::default()
        };
        assert!(!shape.is_consistent());
    }

    #[test]
    fn partial_triangle_is_inconsistent() {
        let shape = ShapeData {
            positions: vec![0.0; 9],
            indices: vec![0, 1],
            ..Default::default()
        };
        assert!(!shape.is_consistent());
    }
}
