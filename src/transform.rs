//! Axis-aligned affine transforms.

use crate::geometry::{Position, Size};
use cgmath::{Matrix4, Point2, Vector2};

/// Maps points from one coordinate space to another.
///
/// `x' = scale.x * x + translate.x` and `y' = scale.y * y + translate.y`. There is no rotation or
/// shear term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale: Vector2<f64>,
    pub translate: Vector2<f64>,
}

impl Default for Transform {
    fn default() -> Self {
        Transform::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        scale: Vector2 { x: 1., y: 1. },
        translate: Vector2 { x: 0., y: 0. },
    };

    pub fn new(scale: Vector2<f64>, translate: Vector2<f64>) -> Transform {
        Transform { scale, translate }
    }

    /// A pure scale.
    pub fn scale(x: f64, y: f64) -> Transform {
        Transform {
            scale: Vector2::new(x, y),
            translate: Vector2::new(0., 0.),
        }
    }

    /// A pure translation.
    pub fn translate(offset: Vector2<f64>) -> Transform {
        Transform {
            scale: Vector2::new(1., 1.),
            translate: offset,
        }
    }

    /// Returns the transform that applies `self` first, then `then`.
    ///
    /// A child’s parent-relative transform composed with its parent’s window transform is the
    /// child’s window transform.
    pub fn compose(self, then: Transform) -> Transform {
        Transform {
            scale: Vector2::new(self.scale.x * then.scale.x, self.scale.y * then.scale.y),
            translate: Vector2::new(
                then.scale.x * self.translate.x + then.translate.x,
                then.scale.y * self.translate.y + then.translate.y,
            ),
        }
    }

    /// Returns the inverse transform.
    ///
    /// Both scale components must be non-zero; otherwise the result contains infinities or NaNs.
    pub fn invert(self) -> Transform {
        let sx = 1. / self.scale.x;
        let sy = 1. / self.scale.y;
        Transform {
            scale: Vector2::new(sx, sy),
            translate: Vector2::new(-self.translate.x * sx, -self.translate.y * sy),
        }
    }

    /// Maps a point.
    pub fn apply(&self, p: Position) -> Position {
        Point2::new(
            self.scale.x * p.x + self.translate.x,
            self.scale.y * p.y + self.translate.y,
        )
    }

    /// Maps a size; translation does not apply to sizes.
    pub fn apply_size(&self, s: Size) -> Size {
        Vector2::new(self.scale.x * s.x, self.scale.y * s.y)
    }

    /// The column-major 4×4 view matrix handed to graphics backends.
    pub fn to_matrix(&self) -> Matrix4<f32> {
        #[rustfmt::skip]
        let m = Matrix4::new(
            self.scale.x as f32, 0., 0., 0.,
            0., self.scale.y as f32, 0., 0.,
            0., 0., 1., 0.,
            self.translate.x as f32, self.translate.y as f32, 0., 1.,
        );
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cgmath::Vector4;

    #[test]
    fn round_trip() {
        let transforms = [
            Transform::IDENTITY,
            Transform::new(Vector2::new(2., 0.5), Vector2::new(-3., 7.)),
            Transform::new(Vector2::new(-1.5, 3.), Vector2::new(0.25, -100.)),
            Transform::new(Vector2::new(1e-3, 1e3), Vector2::new(5., 5.)),
        ];
        let points = [
            Point2::new(0., 0.),
            Point2::new(1., -1.),
            Point2::new(123.456, -0.001),
        ];
        for t in transforms.iter() {
            for p in points.iter() {
                let q = t.invert().apply(t.apply(*p));
                assert_relative_eq!(q, *p, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn compose_order() {
        let t = Transform::scale(2., 3.);
        let u = Transform::translate(Vector2::new(10., 20.));
        let p = Point2::new(1., 1.);

        // t first, then u
        assert_eq!(t.compose(u).apply(p), Point2::new(12., 23.));
        // u first, then t
        assert_eq!(u.compose(t).apply(p), Point2::new(22., 63.));
        assert_eq!(t.compose(u).apply(p), u.apply(t.apply(p)));
    }

    #[test]
    fn compose_with_inverse_is_identity() {
        let t = Transform::new(Vector2::new(4., 0.25), Vector2::new(3., -9.));
        let id = t.compose(t.invert());
        assert_relative_eq!(id.scale, Vector2::new(1., 1.));
        assert_relative_eq!(id.translate, Vector2::new(0., 0.));
    }

    #[test]
    fn sizes_ignore_translation() {
        let t = Transform::new(Vector2::new(2., 3.), Vector2::new(100., 100.));
        assert_eq!(t.apply_size(Vector2::new(1., 1.)), Vector2::new(2., 3.));
    }

    #[test]
    fn matrix_matches_apply() {
        let t = Transform::new(Vector2::new(2., 3.), Vector2::new(5., -1.));
        let m = t.to_matrix();
        let v = m * Vector4::new(1., 2., 0., 1.);
        assert_relative_eq!(v, Vector4::new(7., 5., 0., 1.));
    }
}
