/// Rasterizer: executes a display list on an RGBA canvas

use image::{Rgba, RgbaImage};

use crate::rendering::layout::BoardLayout;
use crate::rendering::paint::{build_display_list, Axis, PaintCommand};
use crate::rendering::text::LabelRenderer;
use crate::store::Grid;
use crate::{BoardConfig, Error, Result};

/// Render `grid` onto a fresh, fully transparent canvas.
///
/// Labels are only drawn when a renderer is supplied.
pub fn rasterize(grid: &Grid, config: &BoardConfig, labels: Option<&dyn LabelRenderer>) -> Result<RgbaImage> {
    config.validate()?;
    let layout = BoardLayout::new(grid, config)?;
    let (width, height) = layout.canvas_size();
    let mut canvas = blank_canvas(width, height)?;
    let commands = build_display_list(grid, &layout, config);
    execute(&mut canvas, &commands, labels);
    Ok(canvas)
}

// Allocation failure is reported instead of aborting the process.
fn blank_canvas(width: u32, height: u32) -> Result<RgbaImage> {
    let len = width as usize * height as usize * 4;
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|e| {
        Error::RenderFailure(format!("cannot allocate {width}x{height} canvas: {e}"))
    })?;
    buf.resize(len, 0);
    RgbaImage::from_raw(width, height, buf)
        .ok_or_else(|| Error::RenderFailure(format!("canvas buffer does not match {width}x{height}")))
}

/// Run paint commands in order.
///
/// A label that fails to draw disables the remaining labels; the rest of the
/// image is still produced.
pub fn execute(canvas: &mut RgbaImage, commands: &[PaintCommand], labels: Option<&dyn LabelRenderer>) {
    let mut labels = labels;
    for cmd in commands {
        match cmd {
            PaintCommand::SolidRect { x, y, width, height, rgba } => {
                fill_block(canvas, *x, *y, *width, *height, *rgba);
            }
            PaintCommand::Line { axis, at, rgba } => draw_line(canvas, *axis, *at, *rgba),
            PaintCommand::Text { x, y, text, px, rgba } => {
                let Some(renderer) = labels else { continue };
                if let Err(e) = renderer.draw_text(canvas, *x, *y, text, *px, *rgba) {
                    log::warn!("Skipping coordinate labels: {}", e);
                    labels = None;
                }
            }
        }
    }
}

// Per-pixel on purpose: boards are small and this keeps the output obvious.
fn fill_block(canvas: &mut RgbaImage, x: i32, y: i32, width: u32, height: u32, rgba: [u8; 4]) {
    for dy in 0..height as i32 {
        for dx in 0..width as i32 {
            put(canvas, x + dx, y + dy, rgba);
        }
    }
}

fn draw_line(canvas: &mut RgbaImage, axis: Axis, at: u32, rgba: [u8; 4]) {
    let (w, h) = canvas.dimensions();
    match axis {
        Axis::Vertical if at < w => {
            for y in 0..h {
                blend_over(canvas.get_pixel_mut(at, y), rgba);
            }
        }
        Axis::Horizontal if at < h => {
            for x in 0..w {
                blend_over(canvas.get_pixel_mut(x, at), rgba);
            }
        }
        _ => {}
    }
}

fn put(canvas: &mut RgbaImage, x: i32, y: i32, rgba: [u8; 4]) {
    if x < 0 || y < 0 || x as u32 >= canvas.width() || y as u32 >= canvas.height() {
        return;
    }
    canvas.put_pixel(x as u32, y as u32, Rgba(rgba));
}

/// Source-over compositing of a straight-alpha color onto a straight-alpha pixel.
pub fn blend_over(dst: &mut Rgba<u8>, src: [u8; 4]) {
    let sa = f32::from(src[3]) / 255.0;
    if sa <= 0.0 {
        return;
    }
    let da = f32::from(dst[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);
    let mut out = [0u8; 4];
    for i in 0..3 {
        let c = (f32::from(src[i]) * sa + f32::from(dst[i]) * da * (1.0 - sa)) / out_a;
        out[i] = c.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    *dst = Rgba(out);
}
