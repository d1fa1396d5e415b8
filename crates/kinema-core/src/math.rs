use serde::{Deserialize, Serialize};

/// A 2D point in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }
}

impl Default for Point2D {
    fn default() -> Self {
        Self::zero()
    }
}

/// Placement of a draw item: translation, rotation (degrees) and scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform2D {
    pub position: Point2D,
    pub rotation: f64,
    pub scale: Point2D,
}

impl Transform2D {
    /// No translation, no rotation, unit scale.
    pub fn identity() -> Self {
        Self {
            position: Point2D::zero(),
            rotation: 0.0,
            scale: Point2D::new(1.0, 1.0),
        }
    }

    /// Map a point from item-local space into its parent space.
    pub fn apply(&self, p: Point2D) -> Point2D {
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        let sx = p.x * self.scale.x;
        let sy = p.y * self.scale.y;
        Point2D {
            x: sx * cos - sy * sin + self.position.x,
            y: sx * sin + sy * cos + self.position.y,
        }
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_identity() {
        let t = Transform2D::identity();
        assert_eq!(t.position, Point2D::zero());
        assert_eq!(t.scale, Point2D::new(1.0, 1.0));
        assert_eq!(t.apply(Point2D::new(3.0, 4.0)), Point2D::new(3.0, 4.0));
    }

    #[test]
    fn test_transform_apply_rotation_and_translation() {
        let t = Transform2D {
            position: Point2D::new(10.0, 0.0),
            rotation: 90.0,
            scale: Point2D::new(2.0, 2.0),
        };
        let p = t.apply(Point2D::new(1.0, 0.0));
        assert!((p.x - 10.0).abs() < 1e-9);
        assert!((p.y - 2.0).abs() < 1e-9);
    }
}
