use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn rotated(&self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }

    pub fn fits_in(&self, other: &Size) -> bool {
        self.width <= other.width && self.height <= other.height
    }

    pub fn is_positive(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    pub fn has_finite_area(&self) -> bool {
        self.area().is_finite()
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Axis-aligned extent with its lower-left corner at (`x`, `y`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Position of a rectangle's lower-left corner plus its 90° rotation flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub rotated: bool,
}

impl Pose {
    pub fn new(x: f64, y: f64, rotated: bool) -> Self {
        Self { x, y, rotated }
    }
}

/// Committed poses, one entry per finished optimization iteration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PoseHistory {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub rotated: Vec<bool>,
}

impl PoseHistory {
    pub fn push(&mut self, pose: Pose) {
        self.x.push(pose.x);
        self.y.push(pose.y);
        self.rotated.push(pose.rotated);
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

pub type Color = [u8; 3];

/// A rectangle to be packed.
///
/// The rectangle carries a committed pose and, between a move proposal and its
/// resolution, a pending one. Every geometric accessor reads the effective pose:
/// the pending pose when present, the committed one otherwise. This lets a move
/// be scored before it is applied.
#[derive(Debug, Clone)]
pub struct Rectangle {
    name: String,
    size: Size,
    committed: Pose,
    pending: Option<Pose>,
    history: PoseHistory,
    pub color: Color,
}

impl Rectangle {
    pub fn new(name: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            name: name.into(),
            size: Size::new(width, height),
            committed: Pose::default(),
            pending: None,
            history: PoseHistory::default(),
            color: [100, 149, 237],
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unrotated size.
    pub fn base_size(&self) -> Size {
        self.size
    }

    pub fn committed_pose(&self) -> Pose {
        self.committed
    }

    pub fn pending_pose(&self) -> Option<Pose> {
        self.pending
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn effective_pose(&self) -> Pose {
        self.pending.unwrap_or(self.committed)
    }

    pub fn set_position(&mut self, x: f64, y: f64) {
        self.committed.x = x;
        self.committed.y = y;
    }

    pub fn set_rotated(&mut self, rotated: bool) {
        self.committed.rotated = rotated;
    }

    /// Stores a tentative pose. Values are not range-checked.
    pub fn propose(&mut self, pose: Pose) {
        self.pending = Some(pose);
    }

    pub fn commit(&mut self) {
        if let Some(pose) = self.pending.take() {
            self.committed = pose;
        }
    }

    pub fn discard(&mut self) {
        self.pending = None;
    }

    pub fn x(&self) -> f64 {
        self.effective_pose().x
    }

    pub fn y(&self) -> f64 {
        self.effective_pose().y
    }

    pub fn rotated(&self) -> bool {
        self.effective_pose().rotated
    }

    /// Size after applying the effective rotation.
    pub fn size(&self) -> Size {
        if self.rotated() {
            self.size.rotated()
        } else {
            self.size
        }
    }

    /// Size under the committed rotation, ignoring any pending proposal.
    pub fn committed_size(&self) -> Size {
        if self.committed.rotated {
            self.size.rotated()
        } else {
            self.size
        }
    }

    pub fn width(&self) -> f64 {
        self.size().width
    }

    pub fn height(&self) -> f64 {
        self.size().height
    }

    pub fn bounds(&self) -> Bounds {
        let pose = self.effective_pose();
        let size = self.size();
        Bounds::new(pose.x, pose.y, size.width, size.height)
    }

    pub fn history(&self) -> &PoseHistory {
        &self.history
    }

    pub(crate) fn clear_history(&mut self) {
        self.history = PoseHistory::default();
    }

    pub(crate) fn record_history(&mut self) {
        let pose = self.effective_pose();
        self.history.push(pose);
    }
}

/// Fixed-size box holding the rectangles.
#[derive(Debug, Clone)]
pub struct Container {
    size: Size,
    x: f64,
    y: f64,
    rectangles: Vec<Rectangle>,
}

impl Container {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            size: Size::new(width, height),
            x: 0.0,
            y: 0.0,
            rectangles: Vec::new(),
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn width(&self) -> f64 {
        self.size.width
    }

    pub fn height(&self) -> f64 {
        self.size.height
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.x, self.y, self.size.width, self.size.height)
    }

    pub fn add_rectangle(&mut self, rectangle: Rectangle) {
        self.rectangles.push(rectangle);
    }

    pub fn rectangles(&self) -> &[Rectangle] {
        &self.rectangles
    }

    pub fn rectangles_mut(&mut self) -> &mut [Rectangle] {
        &mut self.rectangles
    }

    pub fn rectangle(&self, name: &str) -> Option<&Rectangle> {
        self.rectangles.iter().find(|r| r.name() == name)
    }

    pub fn len(&self) -> usize {
        self.rectangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rectangles.is_empty()
    }
}
