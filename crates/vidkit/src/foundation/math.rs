//! Integer screen-space geometry

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A point in desktop coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate
    pub x: i32,
    /// Vertical coordinate
    pub y: i32,
}

impl Point {
    /// Create a new point
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Squared euclidean distance to another point
    pub fn distance_squared(&self, other: Point) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        dx * dx + dy * dy
    }
}

/// An axis-aligned rectangle in desktop coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Width in screen units
    pub w: i32,
    /// Height in screen units
    pub h: i32,
}

impl Rect {
    /// Create a new rectangle
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// A rectangle with no area
    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// Right edge (exclusive)
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    /// Bottom edge (exclusive)
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// Center point, rounded towards the origin
    pub fn center(&self) -> Point {
        Point::new(self.x + self.w / 2, self.y + self.h / 2)
    }

    /// Check whether a point lies inside the rectangle
    pub fn contains(&self, point: Point) -> bool {
        !self.is_empty()
            && point.x >= self.x
            && point.x < self.right()
            && point.y >= self.y
            && point.y < self.bottom()
    }

    /// Smallest rectangle enclosing both rectangles
    ///
    /// Empty rectangles do not contribute to the union.
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }

    /// Snap a point to the closest point inside the rectangle
    ///
    /// The right and bottom edges are exclusive, matching `contains`.
    pub fn closest_point(&self, point: Point) -> Point {
        let right = self.right() - 1;
        let bottom = self.bottom() - 1;
        Point::new(
            point.x.clamp(self.x, right.max(self.x)),
            point.y.clamp(self.y, bottom.max(self.y)),
        )
    }

    /// Check whether this rectangle fits inside `other` by size alone
    pub fn fits_within(&self, other: &Rect) -> bool {
        self.w <= other.w && self.h <= other.h
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x, self.y, self.w, self.h)
    }
}

/// Error produced when parsing an `"x,y,w,h"` rectangle
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("expected \"x,y,w,h\", got {0:?}")]
pub struct ParseRectError(pub String);

impl FromStr for Rect {
    type Err = ParseRectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<i32> = s
            .split(',')
            .map(|part| part.trim().parse::<i32>())
            .collect::<Result<_, _>>()
            .map_err(|_| ParseRectError(s.to_string()))?;

        match parts.as_slice() {
            [x, y, w, h] => Ok(Rect::new(*x, *y, *w, *h)),
            _ => Err(ParseRectError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_skips_empty() {
        let a = Rect::new(0, 0, 1920, 1080);
        let b = Rect::new(1920, 0, 2560, 1440);
        assert_eq!(a.union(&b), Rect::new(0, 0, 4480, 1440));
        assert_eq!(Rect::default().union(&a), a);
        assert_eq!(a.union(&Rect::default()), a);
    }

    #[test]
    fn test_closest_point_clamps_to_inside() {
        let r = Rect::new(100, 100, 50, 50);
        assert_eq!(r.closest_point(Point::new(0, 0)), Point::new(100, 100));
        assert_eq!(r.closest_point(Point::new(500, 120)), Point::new(149, 120));
        assert_eq!(r.closest_point(Point::new(120, 130)), Point::new(120, 130));
    }

    #[test]
    fn test_contains_excludes_far_edges() {
        let r = Rect::new(0, 0, 10, 10);
        assert!(r.contains(Point::new(0, 0)));
        assert!(r.contains(Point::new(9, 9)));
        assert!(!r.contains(Point::new(10, 5)));
    }

    #[test]
    fn test_parse_usable_bounds_string() {
        assert_eq!("0, 24, 1920,1056".parse::<Rect>(), Ok(Rect::new(0, 24, 1920, 1056)));
        assert!("0,24,1920".parse::<Rect>().is_err());
        assert!("a,b,c,d".parse::<Rect>().is_err());
    }
}
