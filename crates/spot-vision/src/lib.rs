mod iou;
pub mod cluster;
pub mod doctor;
pub mod frame;
pub mod pipeline;
pub mod smoother;

pub use cluster::{cluster, select_best, Cluster};
pub use iou::iou;
pub use pipeline::DetectionPipeline;

use serde::{Deserialize, Serialize};

/// Center-form box, normalized 0..1 to the image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl BBox {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn area(&self) -> f32 {
        self.w.max(0.0) * self.h.max(0.0)
    }

    /// (left, top, right, bottom)
    pub fn corners(&self) -> (f32, f32, f32, f32) {
        (self.x - self.w / 2.0, self.y - self.h / 2.0, self.x + self.w / 2.0, self.y + self.h / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BBox,
    // uncalibrated score, may exceed 1.0
    pub confidence: f32,
    #[serde(default)]
    pub class_id: u32,
}

impl Detection {
    pub fn new(bbox: BBox, confidence: f32) -> Self {
        Self { bbox, confidence, class_id: 0 }
    }

    pub fn with_class(mut self, class_id: u32) -> Self {
        self.class_id = class_id;
        self
    }
}

/// How the model export lays out its flat output tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputLayout {
    /// `[4 + classes][N]`: all xs, then all ys, ...
    #[default]
    ChannelsFirst,
    /// `[N][4 + classes]`
    Rows,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Square model input edge in pixels. Raw box values are in these units.
    pub model_input_size: u32,
    pub num_classes: usize,
    pub output_layout: OutputLayout,
    pub min_confidence: f32,
    pub iou_threshold: f32,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            model_input_size: 640,
            num_classes: 1,
            output_layout: OutputLayout::ChannelsFirst,
            min_confidence: 0.5,
            iou_threshold: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("model_input_size must be > 0")]
    ZeroInputSize,
    #[error("num_classes must be > 0")]
    NoClasses,
    #[error("prediction length {len} is not a multiple of stride {stride}")]
    Shape { len: usize, stride: usize },
}

/// Coordinate transform: split the flat tensor into candidates and divide the
/// spatial values by the model input size.
///
/// Each candidate carries `[x, y, w, h, score0..scoreC]`. With one class the
/// score is the confidence; with more, the best class score wins and its index
/// becomes `class_id`.
pub fn decode_predictions(raw: &[f32], cfg: &VisionConfig) -> Result<Vec<Detection>, DecodeError> {
    if cfg.model_input_size == 0 { return Err(DecodeError::ZeroInputSize); }
    if cfg.num_classes == 0 { return Err(DecodeError::NoClasses); }

    let stride = 4 + cfg.num_classes;
    if raw.len() % stride != 0 {
        return Err(DecodeError::Shape { len: raw.len(), stride });
    }
    let num_preds = raw.len() / stride;
    let scale = cfg.model_input_size as f32;

    let at = |pred: usize, channel: usize| -> f32 {
        match cfg.output_layout {
            OutputLayout::ChannelsFirst => raw[channel * num_preds + pred],
            OutputLayout::Rows => raw[pred * stride + channel],
        }
    };

    let mut out = Vec::with_capacity(num_preds);
    for i in 0..num_preds {
        let mut best_c = 0usize;
        let mut best_p = at(i, 4);
        for c in 1..cfg.num_classes {
            let p = at(i, 4 + c);
            if p > best_p { best_p = p; best_c = c; }
        }
        let bbox = BBox::new(at(i, 0) / scale, at(i, 1) / scale, at(i, 2) / scale, at(i, 3) / scale);
        out.push(Detection::new(bbox, best_p).with_class(best_c as u32));
    }
    Ok(out)
}

/// Rejects non-finite values and zero/negative extents before clustering.
pub fn is_well_formed(d: &Detection) -> bool {
    let b = &d.bbox;
    [b.x, b.y, b.w, b.h, d.confidence].iter().all(|v| v.is_finite()) && b.w > 0.0 && b.h > 0.0
}

/// Keeps detections strictly above `min_confidence`, preserving order.
pub fn filter_confident(dets: Vec<Detection>, min_confidence: f32) -> Vec<Detection> {
    dets.into_iter().filter(|d| d.confidence > min_confidence).collect()
}
