use std::collections::VecDeque;

use crate::{BBox, Detection};

/// Last N accepted detections, oldest first.
#[derive(Debug, Clone)]
pub struct History {
    capacity: usize,
    entries: VecDeque<Detection>,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, entries: VecDeque::with_capacity(capacity) }
    }

    pub fn push(&mut self, d: Detection) {
        if self.capacity == 0 { return; }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(d);
    }

    pub fn clear(&mut self) { self.entries.clear(); }
    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
    pub fn capacity(&self) -> usize { self.capacity }

    pub fn iter(&self) -> impl Iterator<Item = &Detection> {
        self.entries.iter()
    }
}

/// Confidence-weighted mean of the window; confidence is the window max and
/// the class follows the newest entry. `None` for an empty window.
pub fn smooth(history: &History) -> Option<Detection> {
    let newest = *history.entries.back()?;

    let mut sum = [0.0f32; 4];
    let mut weight = 0.0f32;
    let mut max_conf = f32::MIN;
    for d in history.iter() {
        let c = d.confidence;
        sum[0] += d.bbox.x * c;
        sum[1] += d.bbox.y * c;
        sum[2] += d.bbox.w * c;
        sum[3] += d.bbox.h * c;
        weight += c;
        max_conf = max_conf.max(c);
    }
    if weight <= 0.0 { return Some(newest); }

    let bbox = BBox::new(sum[0] / weight, sum[1] / weight, sum[2] / weight, sum[3] / weight);
    Some(Detection::new(bbox, max_conf).with_class(newest.class_id))
}

#[derive(Debug, Clone)]
pub struct TemporalSmoother {
    history: History,
}

impl TemporalSmoother {
    pub fn new(capacity: usize) -> Self {
        Self { history: History::new(capacity) }
    }

    /// Records `d` and returns the smoothed estimate. Capacity 0 passes through.
    pub fn update(&mut self, d: Detection) -> Detection {
        self.history.push(d);
        smooth(&self.history).unwrap_or(d)
    }

    pub fn reset(&mut self) { self.history.clear(); }
    pub fn history(&self) -> &History { &self.history }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn det(x: f32, conf: f32) -> Detection {
        Detection::new(BBox::new(x, 0.5, 0.2, 0.2), conf)
    }

    #[test]
    fn history_evicts_oldest() {
        let mut h = History::new(2);
        h.push(det(0.1, 1.0));
        h.push(det(0.2, 1.0));
        h.push(det(0.3, 1.0));
        assert_eq!(h.len(), 2);
        let xs: Vec<f32> = h.iter().map(|d| d.bbox.x).collect();
        assert_eq!(xs, vec![0.2, 0.3]);
    }

    #[test]
    fn weighted_average_and_max_conf() {
        let mut h = History::new(5);
        h.push(det(0.4, 0.25));
        h.push(det(0.6, 0.75));
        let s = smooth(&h).unwrap();
        assert_abs_diff_eq!(s.bbox.x, 0.55, epsilon = 1e-6);
        assert_abs_diff_eq!(s.bbox.y, 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(s.confidence, 0.75);
    }

    #[test]
    fn empty_history_has_no_estimate() {
        assert!(smooth(&History::new(5)).is_none());
    }

    #[test]
    fn zero_capacity_passes_through() {
        let mut s = TemporalSmoother::new(0);
        let d = det(0.3, 0.9);
        assert_eq!(s.update(d), d);
        assert!(s.history().is_empty());
    }

    #[test]
    fn first_update_is_identity() {
        let mut s = TemporalSmoother::new(5);
        let d = det(0.3, 0.9).with_class(2);
        let out = s.update(d);
        assert_abs_diff_eq!(out.bbox.x, 0.3, epsilon = 1e-6);
        assert_eq!(out.class_id, 2);
    }

    #[test]
    fn reset_forgets_window() {
        let mut s = TemporalSmoother::new(5);
        s.update(det(0.1, 1.0));
        s.reset();
        let out = s.update(det(0.9, 1.0));
        assert_abs_diff_eq!(out.bbox.x, 0.9, epsilon = 1e-6);
    }
}
