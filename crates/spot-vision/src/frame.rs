use std::sync::Arc;

use anyhow::{Context, Result};
use image::{imageops::FilterType, DynamicImage, ImageBuffer, Rgb};

/// Raw RGB8 frame. The pixel buffer is shared between the render path and
/// any in-flight inference.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    rgb: Arc<[u8]>,
}

impl Frame {
    pub fn new(width: u32, height: u32, rgb: Vec<u8>) -> Result<Self> {
        let need = width as usize * height as usize * 3;
        anyhow::ensure!(width > 0 && height > 0, "frame must be non-empty ({}x{})", width, height);
        anyhow::ensure!(rgb.len() == need, "frame buffer size mismatch: {} != {}", rgb.len(), need);
        Ok(Self { width, height, rgb: rgb.into() })
    }

    pub fn solid(width: u32, height: u32, px: [u8; 3]) -> Result<Self> {
        let rgb = px.iter().copied().cycle().take(width as usize * height as usize * 3).collect();
        Self::new(width, height, rgb)
    }

    pub fn from_image(img: DynamicImage) -> Result<Self> {
        let rgb = img.to_rgb8();
        let (w, h) = rgb.dimensions();
        Self::new(w, h, rgb.into_raw())
    }

    pub fn rgb(&self) -> &[u8] { &self.rgb }
}

/// Square RGB8 buffer at the model's input size.
#[derive(Debug, Clone)]
pub struct ModelInput {
    pub size: u32,
    pub rgb: Vec<u8>,
}

/// Stretch-resizes the frame to `size x size`. Boxes decoded against this
/// input map back by plain division, so no letterbox is applied.
pub fn prepare_input(frame: &Frame, size: u32) -> Result<ModelInput> {
    anyhow::ensure!(size > 0, "model input size must be > 0");
    if frame.width == size && frame.height == size {
        return Ok(ModelInput { size, rgb: frame.rgb().to_vec() });
    }
    let view: ImageBuffer<Rgb<u8>, &[u8]> = ImageBuffer::from_raw(frame.width, frame.height, frame.rgb())
        .context("wrap frame buffer")?;
    let resized = image::imageops::resize(&view, size, size, FilterType::Triangle);
    Ok(ModelInput { size, rgb: resized.into_raw() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_buffer() {
        assert!(Frame::new(2, 2, vec![0; 11]).is_err());
        assert!(Frame::new(0, 2, vec![]).is_err());
    }

    #[test]
    fn resize_to_model_input() {
        let frame = Frame::solid(32, 16, [10, 20, 30]).unwrap();
        let input = prepare_input(&frame, 8).unwrap();
        assert_eq!(input.size, 8);
        assert_eq!(input.rgb.len(), 8 * 8 * 3);
        assert_eq!(&input.rgb[..3], &[10, 20, 30]);
    }

    #[test]
    fn same_size_is_copied() {
        let frame = Frame::solid(4, 4, [1, 2, 3]).unwrap();
        assert_eq!(prepare_input(&frame, 4).unwrap().rgb, frame.rgb());
    }
}
