//! Snapshot persistence: flips captured frames into image row order and
//! writes them as numbered PNGs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::RgbaImage;

/// Writes captured frames to `<dir>/<prefix><id>.png`.
///
/// Ids are assigned by the caller, one per frame; a later capture with the
/// same id silently overwrites.
#[derive(Clone, Debug)]
pub struct SnapshotWriter {
    dir: PathBuf,
    prefix: String,
}

impl SnapshotWriter {
    /// Create a writer rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create snapshot directory {}", dir.display()))?;
        Ok(Self {
            dir,
            prefix: prefix.into(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: u32) -> PathBuf {
        self.dir.join(format!("{}{}.png", self.prefix, id))
    }

    /// Write one captured frame.
    ///
    /// `pixels` are tightly packed RGBA8 rows straight from the framebuffer
    /// read-back, bottom row first; the written image is flipped to the
    /// top-down order PNG expects.
    pub fn write(&self, id: u32, width: u32, height: u32, pixels: Vec<u8>) -> Result<PathBuf> {
        let image = RgbaImage::from_raw(width, height, pixels)
            .context("captured pixel buffer does not match its dimensions")?;
        let image = image::imageops::flip_vertical(&image);
        let path = self.path_for(id);
        image
            .save(&path)
            .with_context(|| format!("failed to write snapshot {}", path.display()))?;
        log::debug!("wrote snapshot {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_writer(tag: &str) -> SnapshotWriter {
        let dir = std::env::temp_dir().join(format!("orbitsnap-{}-{}", tag, std::process::id()));
        SnapshotWriter::new(dir, "snap").expect("create writer")
    }

    #[test]
    fn paths_use_prefix_and_id() {
        let writer = temp_writer("naming");
        assert!(writer.path_for(42).ends_with("snap42.png"));
    }

    #[test]
    fn written_snapshot_is_flipped_and_sized() {
        let writer = temp_writer("flip");
        // 1x2 frame, bottom row red, top row blue (framebuffer order).
        let pixels = vec![255, 0, 0, 255, 0, 0, 255, 255];
        let path = writer.write(0, 1, 2, pixels).expect("write snapshot");

        let image = image::open(&path).expect("reload snapshot").to_rgba8();
        assert_eq!(image.dimensions(), (1, 2));
        // Top row of the file is the framebuffer's last row.
        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 255, 255]);
        assert_eq!(image.get_pixel(0, 1).0, [255, 0, 0, 255]);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn same_id_overwrites() {
        let writer = temp_writer("overwrite");
        writer.write(7, 1, 1, vec![255, 0, 0, 255]).expect("first");
        let path = writer.write(7, 1, 1, vec![0, 255, 0, 255]).expect("second");
        let image = image::open(&path).expect("reload").to_rgba8();
        assert_eq!(image.get_pixel(0, 0).0, [0, 255, 0, 255]);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn size_mismatch_is_an_error() {
        let writer = temp_writer("mismatch");
        assert!(writer.write(0, 2, 2, vec![0u8; 4]).is_err());
    }
}
