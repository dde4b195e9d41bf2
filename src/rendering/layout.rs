/// Board geometry: where cells, gridlines and labels land on the canvas.

use crate::store::{Coord, Grid};
use crate::{BoardConfig, Error, Origin, Result};

/// Largest RGBA canvas a render may allocate (1 GiB).
pub const MAX_CANVAS_BYTES: u64 = 1 << 30;

#[derive(Debug, Clone, PartialEq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// A label and the top-left pixel it is drawn from.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelAnchor {
    pub x: i32,
    pub y: i32,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardLayout {
    pub cols: u32,
    pub rows: u32,
    pub cell_size: u32,
    pub origin: Origin,
    canvas_width: u32,
    canvas_height: u32,
}

impl BoardLayout {
    pub fn new(grid: &Grid, config: &BoardConfig) -> Result<Self> {
        let too_big = || {
            Error::RenderFailure(format!(
                "{}x{} grid at {} px per cell does not fit in a canvas",
                grid.width, grid.height, config.cell_size
            ))
        };
        let canvas_width = grid.width.checked_mul(config.cell_size).ok_or_else(too_big)?;
        let canvas_height = grid.height.checked_mul(config.cell_size).ok_or_else(too_big)?;
        // i32 pixel positions are used throughout painting
        if canvas_width > i32::MAX as u32 || canvas_height > i32::MAX as u32 {
            return Err(too_big());
        }
        let bytes = u64::from(canvas_width) * u64::from(canvas_height) * 4;
        if bytes > MAX_CANVAS_BYTES {
            return Err(Error::RenderFailure(format!(
                "{canvas_width}x{canvas_height} canvas needs {bytes} bytes, more than the {MAX_CANVAS_BYTES} byte limit"
            )));
        }
        Ok(Self {
            cols: grid.width,
            rows: grid.height,
            cell_size: config.cell_size,
            origin: config.origin,
            canvas_width,
            canvas_height,
        })
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        (self.canvas_width, self.canvas_height)
    }

    /// Pixel block covered by a cell, or `None` when the cell is off the board.
    pub fn cell_rect(&self, coord: Coord) -> Option<Rect> {
        let col = coord.x.checked_sub(self.origin.lower_bound())?;
        let row = coord.y.checked_sub(self.origin.lower_bound())?;
        if !(0..i64::from(self.cols)).contains(&col) || !(0..i64::from(self.rows)).contains(&row) {
            return None;
        }
        let size = i64::from(self.cell_size);
        Some(Rect {
            x: (col * size) as i32,
            y: (row * size) as i32,
            width: self.cell_size,
            height: self.cell_size,
        })
    }

    /// x positions of the `cols + 1` vertical gridlines.
    ///
    /// The closing line sits one pixel past the canvas, so it is pulled back
    /// onto the last column to stay visible.
    pub fn vertical_lines(&self) -> Vec<u32> {
        Self::line_positions(self.cols, self.cell_size, self.canvas_width)
    }

    /// y positions of the `rows + 1` horizontal gridlines.
    pub fn horizontal_lines(&self) -> Vec<u32> {
        Self::line_positions(self.rows, self.cell_size, self.canvas_height)
    }

    fn line_positions(count: u32, cell_size: u32, extent: u32) -> Vec<u32> {
        (0..=count)
            .map(|i| (i * cell_size).min(extent.saturating_sub(1)))
            .collect()
    }

    /// Glyph size for labels: a bit under half a cell, never below 6 px.
    pub fn label_px(&self) -> f32 {
        (self.cell_size as f32 * 0.45).max(6.0)
    }

    /// One label per column, along the top edge.
    pub fn column_labels(&self) -> Vec<LabelAnchor> {
        let lo = self.origin.lower_bound();
        (0..self.cols)
            .map(|col| LabelAnchor {
                x: (col * self.cell_size) as i32 + 2,
                y: 1,
                text: (i64::from(col) + lo).to_string(),
            })
            .collect()
    }

    /// One label per row, along the left edge, in the lower half of the
    /// first cell so it never collides with the column labels.
    pub fn row_labels(&self) -> Vec<LabelAnchor> {
        let lo = self.origin.lower_bound();
        (0..self.rows)
            .map(|row| LabelAnchor {
                x: 1,
                y: (row * self.cell_size + self.cell_size / 2) as i32,
                text: (i64::from(row) + lo).to_string(),
            })
            .collect()
    }
}
