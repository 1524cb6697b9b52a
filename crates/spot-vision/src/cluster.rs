//! Greedy IoU clustering.
//!
//! Each detection joins the first same-class cluster it overlaps by more than
//! the threshold, otherwise it seeds a new cluster. There is no best-match
//! search and clusters never merge with each other, so the result depends on
//! input order.

use serde::Serialize;

use crate::{iou, BBox, Detection};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Cluster {
    pub bbox: BBox,
    /// Max over members.
    pub confidence: f32,
    pub class_id: u32,
    pub members: usize,
}

impl Cluster {
    fn seed(d: &Detection) -> Self {
        Self { bbox: d.bbox, confidence: d.confidence, class_id: d.class_id, members: 1 }
    }

    fn absorb(&mut self, d: &Detection) {
        let (cw, dw) = (self.confidence, d.confidence);
        let total = cw + dw;
        if total > 0.0 {
            let mix = |c: f32, v: f32| (c * cw + v * dw) / total;
            self.bbox = BBox::new(
                mix(self.bbox.x, d.bbox.x),
                mix(self.bbox.y, d.bbox.y),
                mix(self.bbox.w, d.bbox.w),
                mix(self.bbox.h, d.bbox.h),
            );
        }
        self.confidence = self.confidence.max(d.confidence);
        self.members += 1;
    }

    pub fn to_detection(&self) -> Detection {
        Detection::new(self.bbox, self.confidence).with_class(self.class_id)
    }
}

/// Clusters in creation order.
pub fn cluster(dets: &[Detection], iou_threshold: f32) -> Vec<Cluster> {
    let mut clusters: Vec<Cluster> = Vec::new();
    for d in dets {
        let hit = clusters
            .iter_mut()
            .filter(|c| c.class_id == d.class_id)
            .find(|c| iou(&c.bbox, &d.bbox) > iou_threshold);
        match hit {
            Some(c) => c.absorb(d),
            None => clusters.push(Cluster::seed(d)),
        }
    }
    clusters
}

/// Highest confidence wins; ties go to the earliest cluster.
pub fn select_best(clusters: &[Cluster]) -> Option<&Cluster> {
    let mut best: Option<&Cluster> = None;
    for c in clusters {
        best = match best {
            None => Some(c),
            Some(b) => if c.confidence > b.confidence { Some(c) } else { Some(b) },
        };
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn det(x: f32, y: f32, w: f32, h: f32, conf: f32) -> Detection {
        Detection::new(BBox::new(x, y, w, h), conf)
    }

    fn with_conf(conf: f32) -> Cluster {
        Cluster { bbox: BBox::new(0.5, 0.5, 0.1, 0.1), confidence: conf, class_id: 0, members: 1 }
    }

    #[test]
    fn overlapping_pair_merges_weighted() {
        let dets = [det(0.5, 0.5, 0.2, 0.2, 0.6), det(0.52, 0.5, 0.2, 0.2, 0.4)];
        let out = cluster(&dets, 0.2);
        assert_eq!(out.len(), 1);
        assert_abs_diff_eq!(out[0].confidence, 0.6);
        assert_abs_diff_eq!(out[0].bbox.x, 0.508, epsilon = 1e-6);
        assert_abs_diff_eq!(out[0].bbox.y, 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(out[0].bbox.w, 0.2, epsilon = 1e-6);
        assert_eq!(out[0].members, 2);
    }

    #[test]
    fn low_overlap_stays_separate() {
        let dets = [det(0.2, 0.2, 0.2, 0.2, 0.6), det(0.8, 0.8, 0.2, 0.2, 0.4)];
        let out = cluster(&dets, 0.2);
        assert_eq!(out.len(), 2);
        assert_abs_diff_eq!(out[0].bbox.x, 0.2);
        assert_abs_diff_eq!(out[1].bbox.x, 0.8);
    }

    #[test]
    fn iou_equal_to_threshold_does_not_merge() {
        let a = det(0.5, 0.5, 0.2, 0.2, 0.6);
        let t = iou(&a.bbox, &a.bbox);
        assert_eq!(cluster(&[a, a], t).len(), 2);
    }

    #[test]
    fn classes_never_share_a_cluster() {
        let a = det(0.5, 0.5, 0.2, 0.2, 0.6);
        let b = a.with_class(3);
        let out = cluster(&[a, b], 0.2);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].class_id, 3);
    }

    #[test]
    fn joins_first_match_only() {
        // c overlaps both seeds; it must land in the first one
        let a = det(0.40, 0.5, 0.2, 0.2, 0.5);
        let b = det(0.60, 0.5, 0.2, 0.2, 0.5);
        let c = det(0.50, 0.5, 0.2, 0.2, 0.9);
        let out = cluster(&[a, b, c], 0.1);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].members, 2);
        assert_eq!(out[1].members, 1);
        assert_abs_diff_eq!(out[0].confidence, 0.9);
    }

    #[test]
    fn empty_in_empty_out() {
        assert!(cluster(&[], 0.5).is_empty());
        assert!(select_best(&[]).is_none());
    }

    #[test]
    fn select_picks_max() {
        let cs = [with_conf(0.7), with_conf(0.9), with_conf(0.3)];
        assert_abs_diff_eq!(select_best(&cs).unwrap().confidence, 0.9);
    }

    #[test]
    fn select_tie_keeps_earliest() {
        let mut cs = [with_conf(0.8), with_conf(0.8)];
        cs[1].class_id = 7;
        assert_eq!(select_best(&cs).unwrap().class_id, 0);
    }
}
