use crate::BBox;

pub fn iou(a: &BBox, b: &BBox) -> f32 {
    let (al, at, ar, ab) = a.corners();
    let (bl, bt, br, bb) = b.corners();

    let left = al.max(bl);
    let top = at.max(bt);
    let right = ar.min(br);
    let bottom = ab.min(bb);
    if right < left || bottom < top { return 0.0; }

    let inter = (right - left) * (bottom - top);
    let union = a.area() + b.area() - inter;
    if union <= 0.0 { 0.0 } else { (inter / union).clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn identical_boxes_give_one() {
        let a = BBox::new(0.4, 0.6, 0.2, 0.3);
        assert_abs_diff_eq!(iou(&a, &a), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn symmetric() {
        let a = BBox::new(0.5, 0.5, 0.2, 0.2);
        let b = BBox::new(0.55, 0.45, 0.3, 0.1);
        assert_eq!(iou(&a, &b), iou(&b, &a));
    }

    #[test]
    fn disjoint_boxes_give_zero() {
        let a = BBox::new(0.1, 0.1, 0.1, 0.1);
        let b = BBox::new(0.9, 0.9, 0.1, 0.1);
        assert_eq!(iou(&a, &b), 0.0);
    }

    #[test]
    fn partial_overlap() {
        // corners (0,0)-(0.2,0.2) and (0.1,0.1)-(0.3,0.3)
        let a = BBox::new(0.1, 0.1, 0.2, 0.2);
        let b = BBox::new(0.2, 0.2, 0.2, 0.2);
        assert_abs_diff_eq!(iou(&a, &b), 0.01 / 0.07, epsilon = 1e-5);
    }

    #[test]
    fn zero_area_boxes_give_zero() {
        let a = BBox::new(0.5, 0.5, 0.0, 0.0);
        assert_eq!(iou(&a, &a), 0.0);
    }
}
