use crate::types::{Bounds, Container, Rectangle};

/// Scores how badly a packing violates its constraints.
///
/// The cost is the sum of all pairwise overlap areas plus, for every rectangle
/// sticking out of the container, its outside area scaled by the squared
/// distance between its center and the container's center. The distance factor
/// gives far-away rectangles a gradient back towards the container.
///
/// A cost of zero means no rectangles overlap and all of them lie inside the
/// container. Touching edges count as neither.
#[derive(Debug, Clone, Copy, Default)]
pub struct CostAnalyzer;

impl CostAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Total cost of the container, read through the effective (pending-aware) poses.
    pub fn analyze(&self, container: &Container) -> f64 {
        let rects = container.rectangles();
        let mut cost = 0.0;

        for (i, a) in rects.iter().enumerate() {
            for b in &rects[i + 1..] {
                // Same name means same rectangle
                if a.name() == b.name() {
                    continue;
                }
                let overlap = overlap_area(&a.bounds(), &b.bounds());
                if overlap > 0.0 {
                    cost += overlap;
                }
            }
        }

        for rect in rects {
            cost += self.out_of_box_area(rect, container);
        }

        cost
    }

    pub fn out_of_box_area(&self, rect: &Rectangle, container: &Container) -> f64 {
        let bounds = rect.bounds();
        let outside = bounds.area() - overlap_area(&bounds, &container.bounds());
        if outside <= 0.0 {
            return 0.0;
        }

        let (rx, ry) = bounds.center();
        let (cx, cy) = container.bounds().center();
        let dist_sq = (rx - cx).powi(2) + (ry - cy).powi(2);
        outside * dist_sq
    }
}

/// Overlapping area of two axis-aligned rectangles.
pub fn overlap_area(a: &Bounds, b: &Bounds) -> f64 {
    if a.x + a.width <= b.x
        || b.x + b.width <= a.x
        || a.y + a.height <= b.y
        || b.y + b.height <= a.y
    {
        return 0.0;
    }

    let x_overlap = axis_overlap(a.x, a.width, b.x, b.width);
    let y_overlap = axis_overlap(a.y, a.height, b.y, b.height);
    x_overlap * y_overlap
}

// Covers containment in either direction as well as partial overlap from either side.
fn axis_overlap(a_start: f64, a_len: f64, b_start: f64, b_len: f64) -> f64 {
    a_len
        .min(b_len)
        .min(a_start + a_len - b_start)
        .min(b_start + b_len - a_start)
}
