use std::ops::Sub;

/// A position in viewport (client) coordinates, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Display and drag state of the floating leaderboard window.
///
/// `minimized` and `maximized` are mutually exclusive; dragging is independent
/// of both. `position` stays `None` until the first drag, meaning the window
/// is still anchored to the bottom/right corner by the stylesheet.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WindowState {
    pub minimized: bool,
    pub maximized: bool,
    pub closed: bool,
    pub dragging: bool,
    pub drag_offset: Point,
    pub position: Option<Point>,
}

impl WindowState {
    /// Returns the new `minimized` value.
    pub fn toggle_minimize(&mut self) -> bool {
        self.minimized = !self.minimized;
        self.maximized = false;
        self.minimized
    }

    /// Returns the new `maximized` value.
    pub fn toggle_maximize(&mut self) -> bool {
        self.maximized = !self.maximized;
        self.minimized = false;
        self.maximized
    }

    /// Hide the window for the rest of the page's life.
    pub fn close(&mut self) {
        self.closed = true;
        self.dragging = false;
    }

    /// Start dragging: remember where inside the window it was grabbed and
    /// switch to top/left anchoring at its current origin.
    pub fn begin_drag(&mut self, pointer: Point, window_origin: Point) {
        self.dragging = true;
        self.drag_offset = pointer - window_origin;
        self.position = Some(window_origin);
    }

    /// Track the pointer 1:1. No clamping, so the window may leave the viewport.
    pub fn drag_to(&mut self, pointer: Point) -> Option<Point> {
        if !self.dragging {
            return None;
        }
        let origin = pointer - self.drag_offset;
        self.position = Some(origin);
        Some(origin)
    }

    /// Returns whether a drag was in progress.
    pub fn end_drag(&mut self) -> bool {
        std::mem::replace(&mut self.dragging, false)
    }

    pub fn is_top_left_anchored(&self) -> bool {
        self.position.is_some()
    }
}

/// CSS length for an anchored edge, or empty to defer to the stylesheet.
pub fn px(value: Option<f64>) -> String {
    value.map(|v| format!("{v}px")).unwrap_or_default()
}
