//! Coordinate label drawing.
//!
//! Text rendering is optional: [`detect_label_renderer`] returns `None` when no
//! usable font is found (or the `labels` feature is off), and the rasterizer
//! then simply leaves the labels out.

use std::path::Path;

use image::RgbaImage;

use crate::{BoardConfig, Result};

/// "Draw text at pixel position" capability.
pub trait LabelRenderer {
    /// Draw `text` with its top-left corner at `(x, y)`, `px` pixels tall.
    fn draw_text(&self, canvas: &mut RgbaImage, x: i32, y: i32, text: &str, px: f32, rgba: [u8; 4]) -> Result<()>;
}

/// Well-known locations of fonts with plain digits, tried in order.
pub const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/liberation/LiberationMono-Regular.ttf",
    "/System/Library/Fonts/Monaco.ttf",
    "/System/Library/Fonts/Supplemental/Courier New.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\consola.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Find a label renderer for this configuration, if one is available.
///
/// An explicit `font_path` is the only candidate when set; otherwise the
/// system locations above are tried in order.
pub fn detect_label_renderer(config: &BoardConfig) -> Option<Box<dyn LabelRenderer>> {
    if !config.labels {
        log::debug!("Coordinate labels disabled");
        return None;
    }

    let found = match &config.font_path {
        Some(path) => load_font(path),
        None => SYSTEM_FONT_CANDIDATES.iter().find_map(|p| load_font(Path::new(p))),
    };
    if found.is_none() {
        log::info!("No usable font found; rendering without coordinate labels");
    }
    found
}

#[cfg(feature = "labels")]
fn load_font(path: &Path) -> Option<Box<dyn LabelRenderer>> {
    let data = std::fs::read(path).ok()?;
    match FontLabels::from_bytes(data) {
        Ok(labels) => {
            log::debug!("Using {} for coordinate labels", path.display());
            Some(Box::new(labels))
        }
        Err(e) => {
            log::warn!("Ignoring font {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(not(feature = "labels"))]
fn load_font(_path: &Path) -> Option<Box<dyn LabelRenderer>> {
    None
}

/// Label renderer backed by a TrueType/OpenType font.
#[cfg(feature = "labels")]
pub struct FontLabels {
    font: fontdue::Font,
}

#[cfg(feature = "labels")]
impl FontLabels {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let font = fontdue::Font::from_bytes(data, fontdue::FontSettings::default())
            .map_err(|e| crate::Error::RenderFailure(format!("unreadable font: {e}")))?;
        Ok(Self { font })
    }
}

#[cfg(feature = "labels")]
impl LabelRenderer for FontLabels {
    fn draw_text(&self, canvas: &mut RgbaImage, x: i32, y: i32, text: &str, px: f32, rgba: [u8; 4]) -> Result<()> {
        if let Some(ch) = text.chars().find(|&c| self.font.lookup_glyph_index(c) == 0) {
            return Err(crate::Error::RenderFailure(format!("font has no glyph for {ch:?}")));
        }

        let ascent = self
            .font
            .horizontal_line_metrics(px)
            .map(|m| m.ascent)
            .unwrap_or(px);
        let baseline = y + ascent.round() as i32;
        let (w, h) = canvas.dimensions();
        let mut pen_x = x as f32;

        for ch in text.chars() {
            let (metrics, coverage) = self.font.rasterize(ch, px);
            let left = pen_x.round() as i32 + metrics.xmin;
            let top = baseline - (metrics.height as i32 + metrics.ymin);

            for row in 0..metrics.height {
                for col in 0..metrics.width {
                    let cov = coverage[row * metrics.width + col];
                    let (gx, gy) = (left + col as i32, top + row as i32);
                    if cov == 0 || gx < 0 || gy < 0 || gx as u32 >= w || gy as u32 >= h {
                        continue;
                    }
                    let alpha = (u16::from(rgba[3]) * u16::from(cov) / 255) as u8;
                    super::raster::blend_over(
                        canvas.get_pixel_mut(gx as u32, gy as u32),
                        [rgba[0], rgba[1], rgba[2], alpha],
                    );
                }
            }
            pen_x += metrics.advance_width;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_labels_detect_nothing() {
        let cfg = BoardConfig { labels: false, ..Default::default() };
        assert!(detect_label_renderer(&cfg).is_none());
    }

    #[test]
    fn missing_font_path_detects_nothing() {
        let cfg = BoardConfig {
            font_path: Some("/definitely/not/a/font.ttf".into()),
            ..Default::default()
        };
        assert!(detect_label_renderer(&cfg).is_none());
    }

    #[cfg(feature = "labels")]
    #[test]
    fn garbage_font_bytes_are_rejected() {
        assert!(FontLabels::from_bytes(b"not a font".to_vec()).is_err());
    }

    #[cfg(feature = "labels")]
    fn fixture_font() -> BoardConfig {
        BoardConfig {
            font_path: Some(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/DejaVuSansMono.ttf").into()),
            ..Default::default()
        }
    }

    #[cfg(feature = "labels")]
    #[test]
    fn explicit_font_draws_digits_inside_canvas() {
        let renderer = detect_label_renderer(&fixture_font()).expect("fixture font loads");
        let mut canvas = RgbaImage::new(40, 20);
        renderer.draw_text(&mut canvas, 2, 1, "12", 9.0, [0, 0, 0, 160]).unwrap();

        let inked: Vec<_> = canvas
            .enumerate_pixels()
            .filter(|(_, _, p)| p[3] > 0)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!inked.is_empty());
        // nothing lands left of or above the anchor, and nothing is more opaque than the label color
        assert!(inked.iter().all(|&(x, y)| x >= 2 && y >= 1));
        assert!(canvas.pixels().all(|p| p[3] <= 160));
    }

    #[cfg(feature = "labels")]
    #[test]
    fn glyphs_are_clipped_at_the_canvas_edge() {
        let renderer = detect_label_renderer(&fixture_font()).unwrap();
        let mut canvas = RgbaImage::new(6, 6);
        renderer.draw_text(&mut canvas, 3, 3, "99", 12.0, [255, 0, 0, 255]).unwrap();
        assert!(canvas.pixels().any(|p| p[3] > 0));
        renderer.draw_text(&mut canvas, -50, -50, "7", 12.0, [255, 0, 0, 255]).unwrap();
    }

    #[cfg(feature = "labels")]
    #[test]
    fn missing_glyph_is_a_render_failure() {
        let renderer = detect_label_renderer(&fixture_font()).unwrap();
        let mut canvas = RgbaImage::new(20, 20);
        let err = renderer
            .draw_text(&mut canvas, 0, 0, "1\u{17000}", 9.0, [0, 0, 0, 255])
            .unwrap_err();
        assert!(matches!(err, crate::Error::RenderFailure(_)));
        assert!(canvas.pixels().all(|p| p[3] == 0), "nothing drawn before failing");
    }
}
