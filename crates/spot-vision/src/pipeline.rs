use tracing::{debug, warn};

use crate::{cluster, decode_predictions, filter_confident, is_well_formed, select_best, Cluster, Detection, VisionConfig};

/// One-frame post-processing: decode, gate, filter, cluster, select.
///
/// Holds only configuration, so repeated runs over the same tensor give the
/// same answer.
#[derive(Debug, Clone)]
pub struct DetectionPipeline {
    cfg: VisionConfig,
}

impl DetectionPipeline {
    pub fn new(cfg: VisionConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &VisionConfig { &self.cfg }

    /// All clusters for the frame. A malformed tensor is logged and yields none.
    pub fn clusters(&self, raw: &[f32]) -> Vec<Cluster> {
        let decoded = match decode_predictions(raw, &self.cfg) {
            Ok(d) => d,
            Err(e) => {
                warn!("vision: dropping malformed prediction frame: {}", e);
                return Vec::new();
            }
        };

        let total = decoded.len();
        let sane: Vec<Detection> = decoded.into_iter().filter(is_well_formed).collect();
        if sane.len() < total {
            debug!("vision: rejected {} degenerate candidates", total - sane.len());
        }

        let kept = filter_confident(sane, self.cfg.min_confidence);
        if kept.is_empty() { return Vec::new(); }
        cluster(&kept, self.cfg.iou_threshold)
    }

    /// Best detection for the frame, or `None` when nothing passes.
    pub fn run(&self, raw: &[f32]) -> Option<Detection> {
        let clusters = self.clusters(raw);
        let best = select_best(&clusters)?;
        debug!(
            "vision: best of {} clusters conf={:.3} members={}",
            clusters.len(), best.confidence, best.members
        );
        Some(best.to_detection())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OutputLayout;
    use approx::assert_abs_diff_eq;

    fn pipeline() -> DetectionPipeline {
        DetectionPipeline::new(VisionConfig {
            model_input_size: 100,
            output_layout: OutputLayout::Rows,
            min_confidence: 0.5,
            iou_threshold: 0.2,
            ..Default::default()
        })
    }

    #[test]
    fn picks_strongest_cluster() {
        let raw = [
            50.0, 50.0, 20.0, 20.0, 0.6, //
            52.0, 50.0, 20.0, 20.0, 0.4, // below threshold
            10.0, 10.0, 10.0, 10.0, 0.9, //
            11.0, 10.0, 10.0, 10.0, 0.7,
        ];
        let best = pipeline().run(&raw).unwrap();
        assert_abs_diff_eq!(best.confidence, 0.9);
        assert_abs_diff_eq!(best.bbox.y, 0.1, epsilon = 1e-6);
        // (0.10*0.9 + 0.11*0.7) / 1.6
        assert_abs_diff_eq!(best.bbox.x, 0.104375, epsilon = 1e-5);
    }

    #[test]
    fn malformed_frame_is_no_detection() {
        assert!(pipeline().run(&[1.0, 2.0, 3.0]).is_none());
    }

    #[test]
    fn nothing_confident_is_no_detection() {
        assert!(pipeline().run(&[50.0, 50.0, 20.0, 20.0, 0.5]).is_none());
        assert!(pipeline().run(&[]).is_none());
    }

    #[test]
    fn degenerate_boxes_never_reach_output() {
        let raw = [50.0, 50.0, 0.0, 20.0, 0.9, 50.0, 50.0, 20.0, 20.0, f32::NAN];
        assert!(pipeline().run(&raw).is_none());
    }

    #[test]
    fn repeated_runs_agree() {
        let raw = [50.0, 50.0, 20.0, 20.0, 0.6, 52.0, 50.0, 20.0, 20.0, 0.8];
        let p = pipeline();
        assert_eq!(p.run(&raw), p.run(&raw));
        assert_eq!(p.clusters(&raw), p.clusters(&raw));
    }
}
