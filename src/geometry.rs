use std::fmt;
use std::ops::{Add, Index, Mul};

#[derive(Clone, Copy, Debug, PartialEq)]
/// Point in 2D real space
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// z-component of `(b - a) x (self - a)`
    ///
    /// Positive when `self` lies to the left of the directed line from `a` to `b`
    pub fn side_of(&self, a: &Self, b: &Self) -> f64 {
        (b.x - a.x) * (self.y - a.y) - (b.y - a.y) * (self.x - a.x)
    }

    /// Linear interpolation between two points (`t = 0` gives `self`, `t = 1` gives `other`)
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        Self::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

impl Default for Point {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0 }
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl Mul<f64> for Point {
    type Output = Self;

    fn mul(self, coefficient: f64) -> Self {
        Self::new(self.x * coefficient, self.y * coefficient)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "(x: {:.10}, y: {:.10})", self.x, self.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
/// 2D vector in real space
pub struct V2D {
    inner: [f64; 2],
}

impl V2D {
    pub const fn from([x, y]: [f64; 2]) -> Self {
        Self { inner: [x, y] }
    }

    /// Vector of length `length` pointing along `angle` (radians from the x-axis)
    pub fn polar(length: f64, angle: f64) -> Self {
        Self::from([length * angle.cos(), length * angle.sin()])
    }

    pub fn x(&self) -> f64 {
        self.inner[0]
    }

    pub fn y(&self) -> f64 {
        self.inner[1]
    }

    pub fn dot_with(&self, other: &Self) -> f64 {
        self[0] * other[0] + self[1] * other[1]
    }

    pub fn norm(&self) -> f64 {
        self.dot_with(self).sqrt()
    }

    /// Angle from the x-axis in radians
    pub fn angle(&self) -> f64 {
        self[1].atan2(self[0])
    }
}

impl Default for V2D {
    fn default() -> Self {
        Self { inner: [0.0; 2] }
    }
}

impl Index<usize> for V2D {
    type Output = f64;
    fn index(&self, index: usize) -> &Self::Output {
        &self.inner[index]
    }
}

impl fmt::Display for V2D {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{:.5}, {:.5}]", self[0], self[1])
    }
}

/// Axis aligned rectangle described by its lower-left (`start`) and upper-right (`end`) corners
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub start: Point,
    pub end: Point,
}

impl BoundingBox {
    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    pub fn width(&self) -> f64 {
        self.end.x - self.start.x
    }

    pub fn height(&self) -> f64 {
        self.end.y - self.start.y
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{} -> {}]", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_of_line() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(1.0, 0.0);

        assert!(Point::new(0.5, 1.0).side_of(&a, &b) > 0.0);
        assert!(Point::new(0.5, -1.0).side_of(&a, &b) < 0.0);
        assert_eq!(Point::new(2.0, 0.0).side_of(&a, &b), 0.0);
    }

    #[test]
    fn bounding_box_extent() {
        let bb = BoundingBox::new(Point::new(-0.5, -2.0), Point::new(2.0, 3.0));

        assert!((bb.width() - 2.5).abs() < 1e-14);
        assert!((bb.height() - 5.0).abs() < 1e-14);
    }

    #[test]
    fn point_arithmetic() {
        let a = Point::new(1.0, 2.0);
        let b = Point::new(3.0, -2.0);

        assert_eq!(a + b, Point::new(4.0, 0.0));
        assert_eq!(a * 0.5, Point::new(0.5, 1.0));
        assert_eq!(a.lerp(&b, 0.25), Point::new(1.5, 1.0));
    }

    #[test]
    fn polar_vectors() {
        let v = V2D::polar(2.0, std::f64::consts::FRAC_PI_2);
        assert!(v.x().abs() < 1e-14);
        assert!((v.y() - 2.0).abs() < 1e-14);
        assert!((v.norm() - 2.0).abs() < 1e-14);
        assert!((v.angle() - std::f64::consts::FRAC_PI_2).abs() < 1e-14);
    }
}
