//! Symbol definitions: the reusable drawing styles referenced by objects.
//!
//! This is the read-only contract consumed by the export codec. Editing
//! semantics, rendering and icon rasterization live outside this crate; a
//! symbol carries its icon as a pre-rendered pixel buffer.

use super::Map;
use super::color::ColorRef;
use super::coord::MapCoord;

/// Side length of the symbol icon in pixels.
pub const ICON_SIZE: usize = 22;

/// A pre-rendered 22x22 symbol icon in premultiplied RGBA, row 0 at the top.
#[derive(Clone, PartialEq, Eq)]
pub struct IconImage {
    pixels: Box<[[u8; 4]; ICON_SIZE * ICON_SIZE]>,
}

impl IconImage {
    /// All-white, fully opaque icon.
    pub fn white() -> Self {
        Self {
            pixels: Box::new([[255, 255, 255, 255]; ICON_SIZE * ICON_SIZE]),
        }
    }

    pub fn from_pixels(pixels: Box<[[u8; 4]; ICON_SIZE * ICON_SIZE]>) -> Self {
        Self { pixels }
    }

    /// Premultiplied RGBA value at `(x, y)`, y growing downwards.
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        self.pixels[y * ICON_SIZE + x]
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, rgba: [u8; 4]) {
        self.pixels[y * ICON_SIZE + x] = rgba;
    }
}

impl std::fmt::Debug for IconImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IconImage").finish_non_exhaustive()
    }
}

/// A drawing style referenced by objects.
#[derive(Debug, Clone)]
pub struct Symbol {
    /// Two-component symbol number, e.g. `[101, 3]` for "101.3".
    pub number: [i32; 2],
    pub name: String,
    pub hidden: bool,
    pub protected: bool,
    /// Pre-rendered icon; `None` exports as all white.
    pub icon: Option<IconImage>,
    pub kind: SymbolKind,
}

impl Symbol {
    pub fn new(number: [i32; 2], name: impl Into<String>, kind: SymbolKind) -> Self {
        Self {
            number,
            name: name.into(),
            hidden: false,
            protected: false,
            icon: None,
            kind,
        }
    }

    /// Whether this symbol draws with the given color, directly or through
    /// nested element or part symbols.
    pub fn contains_color(&self, map: &Map, color: ColorRef) -> bool {
        self.kind.contains_color(map, color)
    }
}

/// The variant-specific payload of a symbol.
#[derive(Debug, Clone)]
pub enum SymbolKind {
    Point(PointSymbol),
    Line(LineSymbol),
    Area(AreaSymbol),
    Text(TextSymbol),
    Combined(CombinedSymbol),
}

impl SymbolKind {
    pub(crate) fn contains_color(&self, map: &Map, color: ColorRef) -> bool {
        match self {
            SymbolKind::Point(point) => point.contains_color(map, color),
            SymbolKind::Line(line) => line.contains_color(map, color),
            SymbolKind::Area(area) => area.contains_color(map, color),
            SymbolKind::Text(text) => text.contains_color(color),
            SymbolKind::Combined(combined) => combined.parts.iter().any(|part| {
                match &part.symbol {
                    PartRef::Shared(index) => map
                        .symbols
                        .get(*index)
                        .is_some_and(|s| s.contains_color(map, color)),
                    PartRef::Private(symbol) => symbol.contains_color(map, color),
                }
            }),
        }
    }
}

fn matches(slot: Option<ColorRef>, color: ColorRef) -> bool {
    slot == Some(color)
}

/// A point symbol: inner dot, outer ring, and additional drawing elements.
#[derive(Debug, Clone, Default)]
pub struct PointSymbol {
    pub rotatable: bool,
    /// Radius of the filled inner circle, micrometers.
    pub inner_radius: i32,
    pub inner_color: Option<ColorRef>,
    /// Line width of the outer ring, micrometers.
    pub outer_width: i32,
    pub outer_color: Option<ColorRef>,
    pub elements: Vec<PointSymbolElement>,
}

impl PointSymbol {
    pub fn has_inner_dot(&self) -> bool {
        self.inner_radius > 0 && self.inner_color.is_some()
    }

    pub fn has_outer_ring(&self) -> bool {
        self.outer_width > 0 && self.outer_color.is_some()
    }

    /// True when the symbol draws nothing at all.
    pub fn is_empty(&self) -> bool {
        !self.has_inner_dot() && !self.has_outer_ring() && self.elements.is_empty()
    }

    fn contains_color(&self, map: &Map, color: ColorRef) -> bool {
        matches(self.inner_color, color)
            || matches(self.outer_color, color)
            || self
                .elements
                .iter()
                .any(|e| e.symbol.contains_color(map, color))
    }
}

/// One drawing element of a point symbol.
#[derive(Debug, Clone)]
pub struct PointSymbolElement {
    pub symbol: ElementSymbol,
    pub coords: Vec<MapCoord>,
}

/// The primitive symbol realizing one point-symbol element.
#[derive(Debug, Clone)]
pub enum ElementSymbol {
    Point(Box<PointSymbol>),
    Line(Box<LineSymbol>),
    Area(Box<AreaSymbol>),
}

impl ElementSymbol {
    fn contains_color(&self, map: &Map, color: ColorRef) -> bool {
        match self {
            ElementSymbol::Point(point) => point.contains_color(map, color),
            ElementSymbol::Line(line) => line.contains_color(map, color),
            ElementSymbol::Area(area) => area.contains_color(map, color),
        }
    }
}

/// Line cap styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapStyle {
    #[default]
    Flat,
    Round,
    Square,
    Pointed,
}

/// Line join styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinStyle {
    #[default]
    Bevel,
    Miter,
    Round,
}

/// One border line of a line symbol.
#[derive(Debug, Clone, Default)]
pub struct LineSymbolBorder {
    pub color: Option<ColorRef>,
    /// Micrometers.
    pub width: i32,
    /// Shift outwards from the main line edge, micrometers.
    pub shift: i32,
    pub dashed: bool,
    pub dash_length: i32,
    pub break_length: i32,
}

impl LineSymbolBorder {
    pub fn is_visible(&self) -> bool {
        self.width > 0 && self.color.is_some()
    }
}

/// A line symbol.
#[derive(Debug, Clone, Default)]
pub struct LineSymbol {
    pub color: Option<ColorRef>,
    /// Micrometers.
    pub line_width: i32,
    pub cap_style: CapStyle,
    pub join_style: JoinStyle,
    pub pointed_cap_length: i32,

    pub dashed: bool,
    pub dash_length: i32,
    pub break_length: i32,
    pub dashes_in_group: i32,
    pub in_group_break_length: i32,
    pub half_outer_dashes: bool,
    /// Segment length between mid symbols when not dashed.
    pub segment_length: i32,
    pub end_length: i32,
    pub show_at_least_one_symbol: bool,
    pub mid_symbols_per_spot: i32,
    pub mid_symbol_distance: i32,

    pub has_border: bool,
    pub border: LineSymbolBorder,
    pub right_border: LineSymbolBorder,

    pub start_symbol: Option<Box<PointSymbol>>,
    pub mid_symbol: Option<Box<PointSymbol>>,
    pub dash_symbol: Option<Box<PointSymbol>>,
    pub end_symbol: Option<Box<PointSymbol>>,
}

impl LineSymbol {
    /// The mid symbol, when present and non-empty.
    pub fn active_mid_symbol(&self) -> Option<&PointSymbol> {
        self.mid_symbol.as_deref().filter(|s| !s.is_empty())
    }

    /// The dash symbol, when present and non-empty.
    pub fn active_dash_symbol(&self) -> Option<&PointSymbol> {
        self.dash_symbol.as_deref().filter(|s| !s.is_empty())
    }

    pub fn active_start_symbol(&self) -> Option<&PointSymbol> {
        self.start_symbol.as_deref().filter(|s| !s.is_empty())
    }

    pub fn active_end_symbol(&self) -> Option<&PointSymbol> {
        self.end_symbol.as_deref().filter(|s| !s.is_empty())
    }

    fn contains_color(&self, map: &Map, color: ColorRef) -> bool {
        matches(self.color, color)
            || (self.has_border
                && (matches(self.border.color, color) || matches(self.right_border.color, color)))
            || [
                &self.start_symbol,
                &self.mid_symbol,
                &self.dash_symbol,
                &self.end_symbol,
            ]
            .into_iter()
            .flatten()
            .any(|s| s.contains_color(map, color))
    }
}

/// One fill pattern of an area symbol.
#[derive(Debug, Clone)]
pub struct FillPattern {
    pub kind: FillPatternKind,
    /// Rotation in radians.
    pub angle: f32,
    pub rotatable: bool,
    /// Distance between pattern rows, micrometers.
    pub line_spacing: i32,
    /// Offset of every second row, micrometers.
    pub line_offset: i32,
}

/// The two fill pattern families.
#[derive(Debug, Clone)]
pub enum FillPatternKind {
    /// Hatching lines.
    Line {
        color: Option<ColorRef>,
        line_width: i32,
    },
    /// Repeated point symbols.
    Point {
        point_distance: i32,
        point: Box<PointSymbol>,
    },
}

/// An area symbol.
#[derive(Debug, Clone, Default)]
pub struct AreaSymbol {
    pub color: Option<ColorRef>,
    pub patterns: Vec<FillPattern>,
}

impl AreaSymbol {
    fn contains_color(&self, map: &Map, color: ColorRef) -> bool {
        matches(self.color, color)
            || self.patterns.iter().any(|p| match &p.kind {
                FillPatternKind::Line { color: c, .. } => matches(*c, color),
                FillPatternKind::Point { point, .. } => point.contains_color(map, color),
            })
    }
}

/// Framing decoration of a text symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextFraming {
    #[default]
    None,
    /// Drop shadow, offsets in micrometers.
    Shadow { x_offset: i32, y_offset: i32 },
    /// Outline, half width in micrometers.
    Line { half_width: i32 },
}

/// Font metrics of a text symbol, in text coordinate units.
///
/// Computed by the caller's font engine; the codec only consumes them.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FontMetrics {
    pub ascent: f64,
    pub descent: f64,
    pub line_spacing: f64,
}

/// A text symbol.
#[derive(Debug, Clone)]
pub struct TextSymbol {
    pub color: Option<ColorRef>,
    pub font_family: String,
    /// Font size in millimeters.
    pub font_size: f64,
    pub bold: bool,
    pub italic: bool,
    pub underlined: bool,
    pub kerning: bool,
    /// Line spacing factor (1.0 = font default).
    pub line_spacing: f64,
    /// Millimeters.
    pub paragraph_spacing: f64,
    /// Additional space between characters, as a fraction of a space width.
    pub character_spacing: f64,
    /// Custom tab stop positions, micrometers.
    pub custom_tabs: Vec<i32>,

    pub framing_color: Option<ColorRef>,
    pub framing: TextFraming,

    pub has_line_below: bool,
    pub line_below_color: Option<ColorRef>,
    /// Millimeters.
    pub line_below_width: f64,
    /// Millimeters.
    pub line_below_distance: f64,

    /// Metrics of the font at `internal_scaling` units per mm.
    pub metrics: FontMetrics,
    /// Text coordinate units per millimeter.
    pub internal_scaling: f64,
}

impl Default for TextSymbol {
    fn default() -> Self {
        Self {
            color: None,
            font_family: String::new(),
            font_size: 4.0,
            bold: false,
            italic: false,
            underlined: false,
            kerning: false,
            line_spacing: 1.0,
            paragraph_spacing: 0.0,
            character_spacing: 0.0,
            custom_tabs: Vec::new(),
            framing_color: None,
            framing: TextFraming::None,
            has_line_below: false,
            line_below_color: None,
            line_below_width: 0.0,
            line_below_distance: 0.0,
            metrics: FontMetrics::default(),
            internal_scaling: 1.0,
        }
    }
}

impl TextSymbol {
    fn contains_color(&self, color: ColorRef) -> bool {
        matches(self.color, color)
            || matches(self.framing_color, color)
            || (self.has_line_below && matches(self.line_below_color, color))
    }
}

/// A reference from a combined symbol to one of its parts.
#[derive(Debug, Clone)]
pub enum PartRef {
    /// Index of a regular map symbol.
    Shared(usize),
    /// A part owned by the combination, not listed in the map.
    Private(Box<Symbol>),
}

/// One part of a combined symbol.
#[derive(Debug, Clone)]
pub struct CombinedPart {
    pub symbol: PartRef,
    /// Whether the part exists only inside this combination.
    pub private: bool,
}

/// A symbol composed of up to three part symbols.
#[derive(Debug, Clone, Default)]
pub struct CombinedSymbol {
    pub parts: Vec<CombinedPart>,
}
