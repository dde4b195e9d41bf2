//! Pixelboard
//!
//! A shared, persistent grid of colored cells that is updated from untrusted
//! pixel requests and rendered to a PNG with gridlines and coordinate labels.
//!
//! # Pipeline
//!
//! - **Grid store** ([`store`]): loads and atomically saves the JSON grid artifact
//! - **Update merger** ([`update`]): validates requests from a batch or a direct
//!   source and applies the accepted ones (last write wins)
//! - **Rasterizer** ([`rendering`]): turns the grid into an RGBA image
//!
//! # Example
//!
//! ```no_run
//! use pixelboard::{BoardConfig, Pipeline};
//! use pixelboard::update::DirectorySource;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = Pipeline::new(BoardConfig::default(), "grid.json", "grid.png")?;
//! let report = pipeline.run(&mut DirectorySource::new("pixel-updates"))?;
//! println!("applied {} updates", report.summary.applied);
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

pub mod color;
pub mod error;
pub mod pipeline;
pub mod rendering;
pub mod store;
pub mod update;

pub use color::Color;
pub use error::{Error, Result};
pub use pipeline::{Pipeline, PipelineReport};
pub use store::{Coord, Grid, GridStore};

/// Smallest valid coordinate on each axis.
///
/// Fixed per deployment; the artifact itself does not record it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Origin {
    /// Cells are numbered `0..width`.
    #[default]
    Zero,
    /// Cells are numbered `1..=width`.
    One,
}

impl Origin {
    pub const ALL: [Origin; 2] = [Origin::Zero, Origin::One];

    pub fn lower_bound(self) -> i64 {
        match self {
            Origin::Zero => 0,
            Origin::One => 1,
        }
    }

    pub fn from_lower_bound(lower_bound: i64) -> Result<Self> {
        match lower_bound {
            0 => Ok(Origin::Zero),
            1 => Ok(Origin::One),
            other => Err(Error::ConfigError(format!("origin must be 0 or 1, got {other}"))),
        }
    }
}

/// Configuration for loading, merging and rendering a board
///
/// The defaults match the classic board: 20 pixels per cell, 0-based
/// coordinates, faint black gridlines and slightly stronger black labels.
///
/// # Examples
///
/// ```
/// let cfg = pixelboard::BoardConfig::default();
/// assert_eq!(cfg.cell_size, 20);
/// ```
#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// Edge length of one cell in the rendered image, in pixels
    pub cell_size: u32,
    /// Indexing origin for update coordinates
    pub origin: Origin,
    /// RGBA color of the gridline overlay
    pub gridline_rgba: [u8; 4],
    /// RGBA color of the axis labels
    pub label_rgba: [u8; 4],
    /// Whether to try drawing axis labels at all
    pub labels: bool,
    /// Font to use for labels; system fonts are searched when unset
    pub font_path: Option<PathBuf>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            cell_size: 20,
            origin: Origin::Zero,
            gridline_rgba: [0, 0, 0, 64],
            label_rgba: [0, 0, 0, 160],
            labels: true,
            font_path: None,
        }
    }
}

impl BoardConfig {
    pub fn validate(&self) -> Result<()> {
        if self.cell_size == 0 {
            return Err(Error::ConfigError("cell_size must be at least 1".into()));
        }
        Ok(())
    }
}
