/// Display list for one board render

use crate::rendering::layout::BoardLayout;
use crate::store::Grid;
use crate::BoardConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    /// Opaque block; replaces whatever is underneath.
    SolidRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        rgba: [u8; 4],
    },
    /// One-pixel line across the whole canvas, blended over the cells.
    Line {
        axis: Axis,
        at: u32,
        rgba: [u8; 4],
    },
    Text {
        x: i32,
        y: i32,
        text: String,
        px: f32,
        rgba: [u8; 4],
    },
}

/// Cells first, then gridlines, then labels (when enabled).
pub fn build_display_list(grid: &Grid, layout: &BoardLayout, config: &BoardConfig) -> Vec<PaintCommand> {
    let mut commands = Vec::with_capacity(grid.len() + (layout.cols + layout.rows) as usize * 2 + 2);

    for (coord, color) in grid.iter() {
        match layout.cell_rect(*coord) {
            Some(rect) => commands.push(PaintCommand::SolidRect {
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
                rgba: color.rgba(),
            }),
            None => log::warn!("Cell ({}) lies outside the board; not drawn", coord),
        }
    }

    for at in layout.vertical_lines() {
        commands.push(PaintCommand::Line { axis: Axis::Vertical, at, rgba: config.gridline_rgba });
    }
    for at in layout.horizontal_lines() {
        commands.push(PaintCommand::Line { axis: Axis::Horizontal, at, rgba: config.gridline_rgba });
    }

    if config.labels {
        let px = layout.label_px();
        for anchor in layout.column_labels().into_iter().chain(layout.row_labels()) {
            commands.push(PaintCommand::Text {
                x: anchor.x,
                y: anchor.y,
                text: anchor.text,
                px,
                rgba: config.label_rgba,
            });
        }
    }

    commands
}
