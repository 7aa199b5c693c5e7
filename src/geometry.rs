//! Positions, sizes and rectangles.
//!
//! Positions and sizes are plain cgmath types, so adding a size to a position, subtracting two
//! positions and scaling a size are just the cgmath operators.

use cgmath::{Point2, Vector2};

/// A point in some view’s local coordinate space.
pub type Position = Point2<f64>;

/// A size (`x` is the width, `y` is the height). Non-negative by convention.
pub type Size = Vector2<f64>;

/// A rectangle defined by its minimum and maximum corners.
///
/// The all-zero rectangle (`Rectangle::default()`) doubles as the “unset” sentinel for a view’s
/// internal coordinate system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    /// Minimum corner.
    pub min: Position,

    /// Maximum corner.
    pub max: Position,
}

impl Default for Rectangle {
    fn default() -> Rectangle {
        Rectangle {
            min: Point2::new(0., 0.),
            max: Point2::new(0., 0.),
        }
    }
}

impl Rectangle {
    /// Creates a new rectangle.
    pub fn new(min: Position, max: Position) -> Rectangle {
        Rectangle { min, max }
    }

    /// Returns the rectangle from the origin to `size`.
    pub fn from_size(size: Size) -> Rectangle {
        Rectangle {
            min: Point2::new(0., 0.),
            max: Point2::new(size.x, size.y),
        }
    }

    /// Returns true if this is the unset sentinel.
    pub fn is_unset(&self) -> bool {
        *self == Rectangle::default()
    }

    pub fn size(&self) -> Size {
        self.max - self.min
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Returns `(x_min, x_max, y_min, y_max)`.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        (self.min.x, self.max.x, self.min.y, self.max.y)
    }

    /// Returns true if the point is inside the rectangle.
    ///
    /// The rectangle is half-open: the minimum edges are inside, the maximum edges are not.
    pub fn contains(&self, point: Position) -> bool {
        point.x >= self.min.x && point.y >= self.min.y && point.x < self.max.x && point.y < self.max.y
    }

    /// Returns true if the two rectangles intersect.
    pub fn intersects(&self, rect: Rectangle) -> bool {
        self.min.x < rect.max.x
            && self.min.y < rect.max.y
            && rect.min.x < self.max.x
            && rect.min.y < self.max.y
    }

    /// Returns the intersection rectangle.
    pub fn intersection(&self, rect: Rectangle) -> Option<Rectangle> {
        if !self.intersects(rect) {
            return None;
        }

        Some(Rectangle {
            min: Point2::new(self.min.x.max(rect.min.x), self.min.y.max(rect.min.y)),
            max: Point2::new(self.max.x.min(rect.max.x), self.max.y.min(rect.max.y)),
        })
    }

    /// Returns the rectangle moved by `offset`.
    pub fn translate(&self, offset: Size) -> Rectangle {
        Rectangle {
            min: self.min + offset,
            max: self.max + offset,
        }
    }
}
