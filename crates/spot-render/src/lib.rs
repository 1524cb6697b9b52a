pub mod canvas;

use serde::{Deserialize, Serialize};
use spot_vision::{frame::Frame, Detection};

pub use canvas::ImageSurface;

/// Pixel rectangle on the canvas, ready to stroke.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScreenBox {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
    pub confidence: f32,
    pub class_id: u32,
}

impl ScreenBox {
    pub fn label(&self) -> String {
        format!("#{} {:.2}", self.class_id, self.confidence)
    }
}

/// Maps a normalized detection onto a `canvas_w x canvas_h` canvas. Corners
/// are clamped to the canvas.
pub fn overlay(d: &Detection, canvas_w: u32, canvas_h: u32) -> ScreenBox {
    let (l, t, r, b) = d.bbox.corners();
    let (cw, ch) = (canvas_w as f32, canvas_h as f32);
    let px = |v: f32, span: f32| (v.clamp(0.0, 1.0) * span).round() as u32;

    let left = px(l, cw);
    let top = px(t, ch);
    let right = px(r, cw);
    let bottom = px(b, ch);
    ScreenBox {
        left,
        top,
        width: right.saturating_sub(left),
        height: bottom.saturating_sub(top),
        confidence: d.confidence,
        class_id: d.class_id,
    }
}

/// Drawing surface at the render boundary.
pub trait Surface {
    fn canvas_size(&self) -> (u32, u32);
    fn draw_frame(&mut self, frame: &Frame);
    fn draw_box(&mut self, b: &ScreenBox);
    fn present(&mut self) {}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub box_rgb: [u8; 3],
    pub line_px: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { canvas_width: 640, canvas_height: 480, box_rgb: [0, 255, 0], line_px: 2 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spot_vision::BBox;

    #[test]
    fn maps_to_pixels() {
        let d = Detection::new(BBox::new(0.5, 0.5, 0.2, 0.5), 0.8).with_class(1);
        let b = overlay(&d, 200, 100);
        assert_eq!((b.left, b.top, b.width, b.height), (80, 25, 40, 50));
        assert_eq!(b.class_id, 1);
        assert_eq!(b.label(), "#1 0.80");
    }

    #[test]
    fn clamps_into_canvas() {
        let d = Detection::new(BBox::new(0.95, 0.05, 0.3, 0.3), 0.8);
        let b = overlay(&d, 100, 100);
        assert_eq!((b.left, b.top), (80, 0));
        assert_eq!(b.left + b.width, 100);
        assert_eq!(b.top + b.height, 20);
    }

    #[test]
    fn same_input_same_output() {
        let d = Detection::new(BBox::new(0.3, 0.6, 0.1, 0.1), 0.5);
        assert_eq!(overlay(&d, 640, 480), overlay(&d, 640, 480));
    }
}
