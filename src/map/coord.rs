//! Map coordinates and per-point flags.
//!
//! Map coordinates are stored in native integer micrometers of paper space.
//! Floating point helpers work in millimeters.

use bitflags::bitflags;

bitflags! {
    /// Per-point drawing flags carried by a coordinate.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CoordFlags: u8 {
        /// The two following coordinates are curve control points.
        const CURVE_START = 0x01;
        /// Dash point (line symbols) or corner point.
        const DASH_POINT = 0x02;
        /// First point of a hole in an area.
        const HOLE_POINT = 0x04;
    }
}

/// One map coordinate in native micrometers, with drawing flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MapCoord {
    pub x: i32,
    pub y: i32,
    pub flags: CoordFlags,
}

impl MapCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            flags: CoordFlags::empty(),
        }
    }

    pub const fn with_flags(x: i32, y: i32, flags: CoordFlags) -> Self {
        Self { x, y, flags }
    }

    /// Construct from millimeters, rounding half away from zero.
    pub fn from_mm(x: f64, y: f64) -> Self {
        Self::new((x * 1000.0).round() as i32, (y * 1000.0).round() as i32)
    }

    pub fn x_mm(&self) -> f64 {
        f64::from(self.x) / 1000.0
    }

    pub fn y_mm(&self) -> f64 {
        f64::from(self.y) / 1000.0
    }

    pub fn is_curve_start(&self) -> bool {
        self.flags.contains(CoordFlags::CURVE_START)
    }

    pub fn is_dash_point(&self) -> bool {
        self.flags.contains(CoordFlags::DASH_POINT)
    }

    pub fn is_hole_point(&self) -> bool {
        self.flags.contains(CoordFlags::HOLE_POINT)
    }

    /// This coordinate translated by `(dx, dy)` micrometers, flags kept.
    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            flags: self.flags,
        }
    }
}

/// An axis-aligned bounding box in millimeters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// A degenerate box around a single point.
    pub fn point(x: f64, y: f64) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    pub fn include(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn include_bounds(&mut self, other: &Bounds) {
        self.include(other.min_x, other.min_y);
        self.include(other.max_x, other.max_y);
    }

    /// Grow the box by `margin` on all four sides.
    pub fn inflated(&self, margin: f64) -> Self {
        Self {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn contains_bounds(&self, other: &Bounds) -> bool {
        self.min_x <= other.min_x
            && self.min_y <= other.min_y
            && self.max_x >= other.max_x
            && self.max_y >= other.max_y
    }

    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    /// Bounding box of a coordinate sequence, `None` when empty.
    pub fn of_coords(coords: &[MapCoord]) -> Option<Self> {
        let mut iter = coords.iter();
        let first = iter.next()?;
        let mut bounds = Bounds::point(first.x_mm(), first.y_mm());
        for c in iter {
            bounds.include(c.x_mm(), c.y_mm());
        }
        Some(bounds)
    }
}
