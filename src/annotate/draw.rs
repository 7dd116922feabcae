//! Box and text drawing over RGB frames.

use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use tracing::{debug, warn};

use crate::detect::BoundingBox;

pub const RED: Rgb<u8> = Rgb([255, 0, 0]);
pub const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Common locations checked when no font path is configured.
const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
];

/// Draws box outlines and label text into frames.
///
/// Works without a font: labels and overlays are then skipped, boxes are
/// still drawn. Cheap to clone, the font data is reference-counted.
#[derive(Clone)]
pub struct Painter {
    font: Option<FontArc>,
}

impl Painter {
    pub fn new(font_path: Option<&Path>) -> Self {
        let font = match font_path {
            Some(path) => load_font(path),
            None => SYSTEM_FONT_PATHS
                .iter()
                .find_map(|candidate| load_font(Path::new(candidate))),
        };
        if font.is_none() {
            warn!("no usable font found, overlays will have no text");
        }
        Self { font }
    }

    /// A painter that never draws text. Boxes only.
    pub fn without_font() -> Self {
        Self { font: None }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn draw_box(&self, image: &mut RgbImage, bbox: &BoundingBox, color: Rgb<u8>, thickness: u32) {
        for inset in 0..thickness {
            if bbox.width <= inset * 2 || bbox.height <= inset * 2 {
                break;
            }
            let rect = Rect::at((bbox.x + inset) as i32, (bbox.y + inset) as i32)
                .of_size(bbox.width - inset * 2, bbox.height - inset * 2);
            draw_hollow_rect_mut(image, rect, color);
        }
    }

    pub fn draw_text(&self, image: &mut RgbImage, text: &str, x: i32, y: i32, size: f32, color: Rgb<u8>) {
        let Some(font) = &self.font else {
            return;
        };
        draw_text_mut(image, color, x, y, PxScale::from(size), font, text);
    }
}

fn load_font(path: &Path) -> Option<FontArc> {
    let data = std::fs::read(path).ok()?;
    match FontArc::try_from_vec(data) {
        Ok(font) => {
            debug!(path = %path.display(), "loaded overlay font");
            Some(font)
        }
        Err(e) => {
            warn!(path = %path.display(), "unusable font: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_box_marks_the_outline() {
        let painter = Painter::without_font();
        let mut image = RgbImage::new(32, 32);
        let bbox = BoundingBox {
            x: 4,
            y: 4,
            width: 10,
            height: 10,
        };
        painter.draw_box(&mut image, &bbox, RED, 2);

        assert_eq!(*image.get_pixel(4, 4), RED);
        assert_eq!(*image.get_pixel(5, 5), RED);
        // Interior stays untouched.
        assert_eq!(*image.get_pixel(8, 8), Rgb([0, 0, 0]));
    }

    #[test]
    fn oversized_thickness_does_not_panic() {
        let painter = Painter::without_font();
        let mut image = RgbImage::new(16, 16);
        let bbox = BoundingBox {
            x: 2,
            y: 2,
            width: 3,
            height: 3,
        };
        painter.draw_box(&mut image, &bbox, GREEN, 10);
    }

    #[test]
    fn text_without_font_is_a_noop() {
        let painter = Painter::without_font();
        let mut image = RgbImage::new(16, 16);
        painter.draw_text(&mut image, "FPS: 30.0", 0, 0, 12.0, WHITE);
        assert!(image.pixels().all(|p| p.0 == [0, 0, 0]));
    }
}
