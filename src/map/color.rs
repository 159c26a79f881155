//! Map colors and color references.

/// CMYK components in the range 0.0 ..= 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Cmyk {
    pub c: f32,
    pub m: f32,
    pub y: f32,
    pub k: f32,
}

impl Cmyk {
    pub const fn new(c: f32, m: f32, y: f32, k: f32) -> Self {
        Self { c, m, y, k }
    }
}

/// One entry of the map's ordered color table.
#[derive(Debug, Clone, PartialEq)]
pub struct MapColor {
    pub name: String,
    pub cmyk: Cmyk,
    /// Opacity in 0.0 ..= 1.0.
    pub opacity: f32,
    pub knockout: bool,
}

impl MapColor {
    pub fn new(name: impl Into<String>, cmyk: Cmyk) -> Self {
        Self {
            name: name.into(),
            cmyk,
            opacity: 1.0,
            knockout: false,
        }
    }

    /// The designated registration pseudo-color (full CMYK coverage).
    pub fn registration() -> Self {
        Self {
            name: "Registration black".to_string(),
            cmyk: Cmyk::new(1.0, 1.0, 1.0, 1.0),
            opacity: 1.0,
            knockout: false,
        }
    }
}

/// A symbol's reference to a color.
///
/// The registration pseudo-color is not part of the map's color table; it is
/// materialized as an ordinary first color only during export, when a symbol
/// actually uses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorRef {
    /// Index into [`crate::map::Map::colors`].
    Map(usize),
    /// The registration pseudo-color.
    Registration,
}
