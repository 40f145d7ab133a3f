//! Asset I/O: OBJ shape loading, textures, snapshot output.

pub mod obj;
pub mod shape;
pub mod snapshot;
pub mod texture;
