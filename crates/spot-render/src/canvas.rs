use std::path::Path;

use anyhow::{Context, Result};
use image::{imageops::FilterType, ImageBuffer, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use tracing::debug;

use spot_vision::frame::Frame;

use crate::{RenderConfig, ScreenBox, Surface};

/// In-memory RGB canvas. Frames are scaled to the canvas, boxes are stroked
/// as outlines.
pub struct ImageSurface {
    canvas: RgbImage,
    color: Rgb<u8>,
    line_px: u32,
    presented: u64,
}

impl ImageSurface {
    pub fn new(cfg: &RenderConfig) -> Self {
        Self {
            canvas: RgbImage::new(cfg.canvas_width.max(1), cfg.canvas_height.max(1)),
            color: Rgb(cfg.box_rgb),
            line_px: cfg.line_px.max(1),
            presented: 0,
        }
    }

    pub fn canvas(&self) -> &RgbImage { &self.canvas }
    pub fn presented(&self) -> u64 { self.presented }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.canvas.save(path).with_context(|| format!("write snapshot {}", path.display()))?;
        debug!("render: snapshot written to {}", path.display());
        Ok(())
    }
}

impl Surface for ImageSurface {
    fn canvas_size(&self) -> (u32, u32) {
        self.canvas.dimensions()
    }

    fn draw_frame(&mut self, frame: &Frame) {
        let (w, h) = self.canvas.dimensions();
        let Some(src) = ImageBuffer::<Rgb<u8>, &[u8]>::from_raw(frame.width, frame.height, frame.rgb()) else {
            return;
        };
        if (frame.width, frame.height) == (w, h) {
            self.canvas.copy_from_slice(frame.rgb());
        } else {
            self.canvas = image::imageops::resize(&src, w, h, FilterType::Triangle);
        }
    }

    fn draw_box(&mut self, b: &ScreenBox) {
        // thick strokes grow inward so the outline stays inside the box
        for i in 0..self.line_px {
            let (w, h) = (b.width.saturating_sub(2 * i), b.height.saturating_sub(2 * i));
            if w == 0 || h == 0 { break; }
            let rect = Rect::at((b.left + i) as i32, (b.top + i) as i32).of_size(w, h);
            draw_hollow_rect_mut(&mut self.canvas, rect, self.color);
        }
    }

    fn present(&mut self) {
        self.presented += 1;
    }
}
