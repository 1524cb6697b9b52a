use anyhow::Result;
use tracing::warn;

use crate::VisionConfig;

pub fn check_vision(cfg: &VisionConfig) -> Result<()> {
    anyhow::ensure!(cfg.model_input_size >= 32, "vision.model_input_size too small");
    anyhow::ensure!(cfg.num_classes >= 1, "vision.num_classes must be >= 1");
    anyhow::ensure!(
        cfg.min_confidence.is_finite() && cfg.min_confidence >= 0.0,
        "vision.min_confidence must be a finite score >= 0"
    );
    anyhow::ensure!((0.0..=1.0).contains(&cfg.iou_threshold), "vision.iou_threshold should be 0..1");
    if cfg.min_confidence > 1.0 {
        // scores are uncalibrated, so this may be intended
        warn!("doctor: vision.min_confidence={} is above 1.0", cfg.min_confidence);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass() {
        check_vision(&VisionConfig::default()).unwrap();
    }

    #[test]
    fn rejects_out_of_range() {
        let bad_iou = VisionConfig { iou_threshold: 1.5, ..Default::default() };
        assert!(check_vision(&bad_iou).is_err());
        let nan_conf = VisionConfig { min_confidence: f32::NAN, ..Default::default() };
        assert!(check_vision(&nan_conf).is_err());
        let tiny = VisionConfig { model_input_size: 0, ..Default::default() };
        assert!(check_vision(&tiny).is_err());
    }

    #[test]
    fn high_threshold_is_only_a_warning() {
        check_vision(&VisionConfig { min_confidence: 4.0, ..Default::default() }).unwrap();
    }
}
