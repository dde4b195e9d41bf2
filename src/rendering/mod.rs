//! Rendering: grid → RGBA canvas → PNG

pub mod layout;
pub mod paint;
pub mod raster;
pub mod text;

use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, RgbaImage};
use sha2::{Digest, Sha256};

use crate::store::Grid;
use crate::{BoardConfig, Result};

pub use raster::rasterize;
pub use text::{detect_label_renderer, LabelRenderer};

/// An encoded render of a board.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub width: u32,
    pub height: u32,
    pub png_data: Vec<u8>,
}

impl Snapshot {
    pub fn from_image(image: &RgbaImage) -> Result<Self> {
        Ok(Self {
            width: image.width(),
            height: image.height(),
            png_data: encode_png(image)?,
        })
    }

    /// SHA-256 of the PNG bytes, hex encoded. Stable across runs for the same board.
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(&self.png_data))
    }

    /// Persist the PNG, replacing `path` atomically.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        crate::store::write_atomic(path, &self.png_data)?;
        log::info!("Saved {}x{} board image to {}", self.width, self.height, path.display());
        Ok(())
    }
}

/// Encode a canvas as an RGBA PNG (alpha kept, so the background stays transparent).
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

/// Rasterize `grid`, probing for a label font as configured, and encode the result.
pub fn render(grid: &Grid, config: &BoardConfig) -> Result<Snapshot> {
    let labels = detect_label_renderer(config);
    let image = rasterize(grid, config, labels.as_deref())?;
    Snapshot::from_image(&image)
}
