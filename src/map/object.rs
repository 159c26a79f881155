//! Drawn objects: concrete geometry instances referencing a symbol.

use super::coord::{Bounds, MapCoord};

/// Horizontal text alignment, with the on-disk code as discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum HorizontalAlignment {
    #[default]
    Left = 0,
    Center = 1,
    Right = 2,
}

/// Vertical text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerticalAlignment {
    Baseline,
    #[default]
    Top,
    Center,
    Bottom,
}

/// Layout of one laid-out text line, in text coordinates.
///
/// Produced by the caller's font engine; `y` is the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextLineLayout {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub ascent: f64,
    pub descent: f64,
}

/// A point object.
#[derive(Debug, Clone)]
pub struct PointObject {
    pub coord: MapCoord,
    /// Rotation in radians.
    pub rotation: f32,
}

/// A path object (line or area outline, depending on the symbol).
#[derive(Debug, Clone)]
pub struct PathObject {
    pub coords: Vec<MapCoord>,
}

/// A text object.
#[derive(Debug, Clone)]
pub struct TextObject {
    pub text: String,
    pub anchor: MapCoord,
    /// Rotation in radians.
    pub rotation: f32,
    pub h_align: HorizontalAlignment,
    pub v_align: VerticalAlignment,
    /// Declared box `(width, height)` in millimeters; `None` for a single
    /// anchor point.
    pub box_size: Option<(f64, f64)>,
    /// Line layout computed by the caller's font engine.
    pub lines: Vec<TextLineLayout>,
}

impl TextObject {
    pub fn has_single_anchor(&self) -> bool {
        self.box_size.is_none()
    }
}

/// The variant payload of an object.
#[derive(Debug, Clone)]
pub enum ObjectKind {
    Point(PointObject),
    Path(PathObject),
    Text(TextObject),
}

/// A drawn object referencing exactly one symbol by map index.
#[derive(Debug, Clone)]
pub struct Object {
    pub symbol: usize,
    pub kind: ObjectKind,
}

impl Object {
    /// The raw coordinate sequence of this object.
    pub fn raw_coords(&self) -> &[MapCoord] {
        match &self.kind {
            ObjectKind::Point(p) => std::slice::from_ref(&p.coord),
            ObjectKind::Path(p) => &p.coords,
            ObjectKind::Text(t) => std::slice::from_ref(&t.anchor),
        }
    }

    /// Bounding box in millimeters, `None` for empty geometry.
    pub fn extent_mm(&self) -> Option<Bounds> {
        match &self.kind {
            ObjectKind::Point(p) => Some(Bounds::point(p.coord.x_mm(), p.coord.y_mm())),
            ObjectKind::Path(p) => Bounds::of_coords(&p.coords),
            ObjectKind::Text(t) => {
                let mut bounds = Bounds::point(t.anchor.x_mm(), t.anchor.y_mm());
                if let Some((w, h)) = t.box_size {
                    // Conservative box around any rotation.
                    let radius = (w * w + h * h).sqrt() / 2.0;
                    bounds = bounds.inflated(radius);
                }
                Some(bounds)
            },
        }
    }

    /// A copy translated by `(dx, dy)` micrometers.
    pub fn translated(&self, dx: i32, dy: i32) -> Object {
        let kind = match &self.kind {
            ObjectKind::Point(p) => ObjectKind::Point(PointObject {
                coord: p.coord.translated(dx, dy),
                rotation: p.rotation,
            }),
            ObjectKind::Path(p) => ObjectKind::Path(PathObject {
                coords: p.coords.iter().map(|c| c.translated(dx, dy)).collect(),
            }),
            ObjectKind::Text(t) => ObjectKind::Text(TextObject {
                anchor: t.anchor.translated(dx, dy),
                ..t.clone()
            }),
        };
        Object {
            symbol: self.symbol,
            kind,
        }
    }
}
