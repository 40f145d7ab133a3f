//! OBJ mesh loading via the `tobj` parser.
//!
//! Faces are triangulated and re-indexed to a single index per vertex, so
//! per-shape texcoord/normal arrays line up with positions. Companion MTL
//! files are consumed and ignored; texturing comes from an explicit image.

use std::io::BufRead;
use std::path::Path;

use anyhow::{Context, Result};

use crate::shape::ShapeData;

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    }
}

/// Load all shapes from an OBJ file, in file order.
///
/// Fails with the parser diagnostic and the offending path; nothing is
/// produced on failure.
pub fn load_obj_from_path(path: impl AsRef<Path>) -> Result<Vec<ShapeData>> {
    let path = path.as_ref();
    let (models, _materials) = tobj::load_obj(path, &load_options())
        .with_context(|| format!("failed to load OBJ file {}", path.display()))?;
    let shapes = convert(models);
    let verts: usize = shapes.iter().map(ShapeData::vertex_count).sum();
    let indices: usize = shapes.iter().map(|s| s.indices.len()).sum();
    log::info!(
        "loaded {}: {} shape(s), {} vertices, {} indices",
        path.display(),
        shapes.len(),
        verts,
        indices
    );
    Ok(shapes)
}

/// Load shapes from an in-memory OBJ source.
pub fn load_obj_from_reader(reader: &mut impl BufRead) -> Result<Vec<ShapeData>> {
    let (models, _materials) = tobj::load_obj_buf(reader, &load_options(), |_| {
        Ok((Vec::new(), Default::default()))
    })
    .context("failed to parse OBJ source")?;
    Ok(convert(models))
}

fn convert(models: Vec<tobj::Model>) -> Vec<ShapeData> {
    models
        .into_iter()
        .map(|model| {
            let mesh = model.mesh;
            ShapeData {
                name: model.name,
                positions: mesh.positions,
                texcoords: mesh.texcoords,
                normals: mesh.normals,
                indices: mesh.indices,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_str(src: &str) -> Result<Vec<ShapeData>> {
        load_obj_from_reader(&mut std::io::Cursor::new(src))
    }

    #[test]
    fn quad_with_positions_only() {
        let shapes = load_str(
            "v 0 0 0\n\
             v 1 0 0\n\
             v 1 1 0\n\
             v 0 1 0\n\
             f 1 2 3\n\
             f 1 3 4\n",
        )
        .expect("parse quad");
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].vertex_count(), 4);
        assert_eq!(shapes[0].indices.len(), 6);
        assert!(!shapes[0].has_texcoords());
        assert!(!shapes[0].has_normals());
        assert!(shapes[0].is_consistent());
    }

    #[test]
    fn empty_source_yields_no_shapes() {
        let shapes = load_str("").expect("parse empty");
        assert!(shapes.is_empty());
    }

    #[test]
    fn shapes_keep_file_order() {
        let shapes = load_str(
            "o first\n\
             v 0 0 0\nv 1 0 0\nv 0 1 0\n\
             f 1 2 3\n\
             o second\n\
             v 0 0 1\nv 1 0 1\nv 0 1 1\n\
             f 4 5 6\n",
        )
        .expect("parse two shapes");
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[0].name, "first");
        assert_eq!(shapes[1].name, "second");
    }

    #[test]
    fn texcoords_and_normals_line_up_with_positions() {
        let shapes = load_str(
            "v 0 0 0\nv 1 0 0\nv 0 1 0\n\
             vt 0 0\nvt 1 0\nvt 0 1\n\
             vn 0 0 1\n\
             f 1/1/1 2/2/1 3/3/1\n",
        )
        .expect("parse triangle");
        assert_eq!(shapes.len(), 1);
        let shape = &shapes[0];
        assert_eq!(shape.vertex_count(), 3);
        assert_eq!(shape.texcoords.len(), 6);
        assert_eq!(shape.normals.len(), 9);
        assert!(shape.is_consistent());
    }

    #[test]
    fn quads_are_triangulated() {
        let shapes = load_str(
            "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\n\
             f 1 2 3 4\n",
        )
        .expect("parse quad face");
        assert_eq!(shapes[0].indices.len(), 6);
    }

    #[test]
    fn face_with_unknown_vertex_is_an_error() {
        assert!(load_str("f 1 2 3\n").is_err());
    }

    #[test]
    fn missing_file_error_names_the_path() {
        let err = load_obj_from_path("/nonexistent/model.obj").unwrap_err();
        assert!(format!("{err:#}").contains("model.obj"));
    }
}
