//! Symbol encoder: one binary record per map symbol.
//!
//! Text symbols produce one record per horizontal alignment in use, and
//! combined symbols decompose into zero to three records of the primitive
//! types. The decomposition is a heuristic matched to orienteering symbol
//! sets, not a general conversion.
//!
//! Variant fields follow the common head from [`super::records`]:
//! - point: data_size i16 (version 8) or data_size i16 + reserved i16
//! - area: a 32-byte block of fill, hatch, structure and border fields
//! - line: a 64-byte block of style, dash, double-line and pattern sizes
//! - text: font name, basic, special and framing blocks, 198 bytes
//!
//! Point, area and line records append a "pattern": the inlined drawing
//! elements of the attached point symbols.

use smallvec::SmallVec;

use crate::common::binary::ByteWriter;
use crate::map::color::ColorRef;
use crate::map::coord::{Bounds, MapCoord};
use crate::map::object::{HorizontalAlignment, ObjectKind};
use crate::map::symbol::{
    AreaSymbol, CapStyle, CombinedPart, CombinedSymbol, ElementSymbol, FillPatternKind, JoinStyle,
    LineSymbol, PartRef, PointSymbol, Symbol, SymbolKind, TextFraming, TextSymbol,
};

use super::convert::{convert_rotation, convert_size};
use super::export::{ExportContext, TextAlignmentNumber};
use super::file::OcdFileBuilder;
use super::icon::{ICON_BYTES_V6, ICON_BYTES_V9, rasterize_v6, rasterize_v9};
use super::objects::export_coordinates;
use super::records::{
    BASE_SYMBOL_SIZE_V8, BASE_SYMBOL_SIZE_V9, BaseSymbol, Element, OcdPoint, OcdVersion,
    SymbolIcon, element_type, symbol_status, symbol_type,
};

/// Export all map symbols into the builder, assigning format numbers.
pub fn export_symbols(ctx: &mut ExportContext<'_>, builder: &mut OcdFileBuilder) {
    let map = ctx.map;
    for index in 0..map.symbols.len() {
        if ctx.symbol_numbers.contains_key(&index) {
            continue; // exported by a combined symbol
        }

        let symbol = &map.symbols[index];
        match &symbol.kind {
            SymbolKind::Point(point) => {
                let (record, number) = export_point_symbol(ctx, symbol, point);
                ctx.symbol_numbers.insert(index, number);
                builder.add_symbol(record);
            },
            SymbolKind::Area(area) => {
                let (record, number) = export_area_symbol(ctx, symbol, area, None);
                ctx.symbol_numbers.insert(index, number);
                builder.add_symbol(record);
            },
            SymbolKind::Line(line) => {
                let (record, number) = export_line_symbol(ctx, symbol, line, None, None);
                ctx.symbol_numbers.insert(index, number);
                builder.add_symbol(record);
            },
            SymbolKind::Text(text) => {
                export_text_symbol_variants(ctx, builder, index, symbol, text);
            },
            SymbolKind::Combined(combined) => {
                export_combined_symbol(ctx, builder, index, symbol, combined);
            },
        }
    }
}

fn base_symbol_size(version: OcdVersion) -> usize {
    if version == OcdVersion::V8 {
        BASE_SYMBOL_SIZE_V8
    } else {
        BASE_SYMBOL_SIZE_V9
    }
}

/// Fill the common record head and assign a unique symbol number.
fn setup_base_symbol(ctx: &mut ExportContext<'_>, symbol: &Symbol, symbol_type: u8) -> BaseSymbol {
    let map = ctx.map;

    let factor = ctx.version.symbol_number_factor() as i32;
    let mut number = symbol.number[0] * factor;
    if symbol.number[1] >= 0 {
        number += symbol.number[1] % factor;
    }
    // Symbol number 0.0 is not valid
    let mut number = if number > 0 { number as u32 } else { 1 };
    while ctx.assigned_numbers.contains(&number) {
        number += 1;
    }
    ctx.assigned_numbers.push(number);

    let mut status = 0;
    if symbol.protected {
        status |= symbol_status::PROTECTED;
    }
    if symbol.hidden {
        status |= symbol_status::HIDDEN;
    }

    // One bit per exported color table entry, registration first.
    let mut colors = [0u8; 32];
    let mut bit = 0usize;
    if ctx.uses_registration_color {
        if symbol.contains_color(map, ColorRef::Registration) {
            colors[0] |= 1;
        }
        bit += 1;
    }
    for c in 0..map.colors.len() {
        if bit >= 8 * colors.len() {
            break;
        }
        if symbol.contains_color(map, ColorRef::Map(c)) {
            colors[bit / 8] |= 1 << (bit % 8);
        }
        bit += 1;
    }

    let icon = if ctx.version == OcdVersion::V8 {
        let mut bits = Box::new([0u8; ICON_BYTES_V6]);
        rasterize_v6(symbol.icon.as_ref(), &mut bits);
        SymbolIcon::V6(bits)
    } else {
        let mut bits = Box::new([0u8; ICON_BYTES_V9]);
        rasterize_v9(symbol.icon.as_ref(), &mut bits);
        SymbolIcon::V9(bits)
    };

    BaseSymbol {
        size: 0,
        number: number as i32,
        symbol_type,
        type2: 0,
        flags: 0,
        extent: 0,
        status,
        colors,
        description: ctx.encoding.encode(&symbol.name),
        icon,
    }
}

/// Byte size of a point symbol's inlined pattern, computed up front.
///
/// Each element contributes two coordinate units of header plus one unit
/// per coordinate; a point element contributes that once per visible ring.
fn pattern_size(point: Option<&PointSymbol>) -> usize {
    let Some(point) = point else {
        return 0;
    };

    let mut count = 0;
    for element in &point.elements {
        let factor = match &element.symbol {
            ElementSymbol::Point(sub) => {
                usize::from(sub.has_inner_dot()) + usize::from(sub.has_outer_ring())
            },
            _ => 1,
        };
        count += factor * (2 + element.coords.len());
    }
    if point.has_inner_dot() {
        count += 2 + 1;
    }
    if point.has_outer_ring() {
        count += 2 + 1;
    }
    count * OcdPoint::SIZE
}

/// Write the pattern of a point symbol: its own rings at the origin, then
/// one sub-pattern per element.
fn export_pattern(ctx: &ExportContext<'_>, point: Option<&PointSymbol>, w: &mut ByteWriter) {
    let Some(point) = point else {
        return;
    };

    let origin = [MapCoord::default()];
    export_point_rings(ctx, &origin, point, w);
    for element in &point.elements {
        match &element.symbol {
            ElementSymbol::Point(sub) => export_point_rings(ctx, &element.coords, sub, w),
            ElementSymbol::Line(line) => {
                let mut flags = 0;
                if line.cap_style == CapStyle::Round {
                    flags |= 1;
                } else if line.join_style == JoinStyle::Miter {
                    flags |= 4;
                }
                Element {
                    element_type: element_type::LINE,
                    flags,
                    color: ctx.convert_color(line.color),
                    line_width: convert_size(line.line_width) as i16,
                    num_coords: element.coords.len() as i16,
                    ..Default::default()
                }
                .write(w);
                export_coordinates(&element.coords, Some(line), w);
            },
            ElementSymbol::Area(area) => {
                Element {
                    element_type: element_type::AREA,
                    color: ctx.convert_color(area.color),
                    num_coords: element.coords.len() as i16,
                    ..Default::default()
                }
                .write(w);
                export_coordinates(&element.coords, None, w);
            },
        }
    }
}

/// Dot and circle elements for a point symbol's inner and outer ring.
fn export_point_rings(
    ctx: &ExportContext<'_>,
    coords: &[MapCoord],
    point: &PointSymbol,
    w: &mut ByteWriter,
) {
    if point.has_inner_dot() {
        Element {
            element_type: element_type::DOT,
            color: ctx.convert_color(point.inner_color),
            diameter: convert_size(2 * point.inner_radius) as i16,
            num_coords: coords.len() as i16,
            ..Default::default()
        }
        .write(w);
        export_coordinates(coords, None, w);
    }
    if point.has_outer_ring() {
        let diameter = if ctx.version == OcdVersion::V8 {
            convert_size(2 * point.inner_radius + 2 * point.outer_width)
        } else {
            convert_size(2 * point.inner_radius + point.outer_width)
        };
        Element {
            element_type: element_type::CIRCLE,
            color: ctx.convert_color(point.outer_color),
            line_width: convert_size(point.outer_width) as i16,
            diameter: diameter as i16,
            num_coords: coords.len() as i16,
            ..Default::default()
        }
        .write(w);
        export_coordinates(coords, None, w);
    }
}

/// Bounding radius of a point symbol in 0.01 mm, from coordinate boxes
/// inflated by each element's drawing margin.
fn point_symbol_extent(point: Option<&PointSymbol>) -> i32 {
    let Some(point) = point else {
        return 0;
    };

    let mut bounds: Option<Bounds> = None;
    for element in &point.elements {
        let Some(coord_bounds) = Bounds::of_coords(&element.coords) else {
            continue;
        };
        let margin_um = match &element.symbol {
            ElementSymbol::Line(line) => line.line_width / 2,
            ElementSymbol::Point(sub) => sub.inner_radius + sub.outer_width,
            ElementSymbol::Area(_) => 0,
        };
        let inflated = coord_bounds.inflated(f64::from(margin_um) / 1000.0);
        match &mut bounds {
            Some(all) => all.include_bounds(&inflated),
            None => bounds = Some(inflated),
        }
    }

    let mut extent_mm = bounds.map_or(0.0, |b| 0.5 * b.width().max(b.height()));
    if point.inner_color.is_some() {
        extent_mm = extent_mm.max(0.001 * f64::from(point.inner_radius));
    }
    if point.outer_color.is_some() {
        extent_mm = extent_mm.max(0.001 * f64::from(point.inner_radius + point.outer_width));
    }
    convert_size((1000.0 * extent_mm).round().max(0.0) as i32)
}

pub(crate) fn export_point_symbol(
    ctx: &mut ExportContext<'_>,
    symbol: &Symbol,
    point: &PointSymbol,
) -> (Vec<u8>, u32) {
    let mut base = setup_base_symbol(ctx, symbol, symbol_type::POINT);
    base.extent = point_symbol_extent(Some(point));
    if base.extent <= 0 {
        base.extent = 100;
    }
    if point.rotatable {
        base.flags |= 1;
    }

    let pattern = pattern_size(Some(point));
    let header_size = base_symbol_size(ctx.version)
        + if ctx.version == OcdVersion::V8 { 2 } else { 4 };
    base.size = (header_size + pattern) as i32;

    let mut w = ByteWriter::with_capacity(header_size + pattern);
    base.write(&mut w);
    w.i16((pattern / 8) as i16); // data_size
    if ctx.version != OcdVersion::V8 {
        w.i16(0); // reserved
    }
    export_pattern(ctx, Some(point), &mut w);
    debug_assert_eq!(w.len(), base.size as usize);

    (w.into_vec(), base.number as u32)
}

/// Area symbol fields between the common head and the pattern, 32 bytes.
#[derive(Debug, Default)]
struct AreaCommon {
    border_on: u8,
    fill_on: u8,
    fill_color: i16,
    hatch_mode: i16,
    hatch_color: i16,
    hatch_line_width: i16,
    hatch_dist: i16,
    hatch_angle_1: i16,
    hatch_angle_2: i16,
    structure_mode: i16,
    structure_width: i16,
    structure_height: i16,
    structure_angle: i16,
    border_symbol: i32,
    data_size: i16,
}

impl AreaCommon {
    const SIZE: usize = 32;

    fn write(&self, w: &mut ByteWriter) {
        w.u8(self.border_on);
        w.u8(self.fill_on);
        w.i16(self.fill_color);
        w.i16(self.hatch_mode);
        w.i16(self.hatch_color);
        w.i16(self.hatch_line_width);
        w.i16(self.hatch_dist);
        w.i16(self.hatch_angle_1);
        w.i16(self.hatch_angle_2);
        w.i16(self.structure_mode);
        w.i16(self.structure_width);
        w.i16(self.structure_height);
        w.i16(self.structure_angle);
        w.i32(self.border_symbol);
        w.i16(self.data_size);
        w.i16(0); // reserved
    }
}

const HATCH_NONE: i16 = 0;
const HATCH_SINGLE: i16 = 1;
const HATCH_CROSS: i16 = 2;
const STRUCTURE_NONE: i16 = 0;
const STRUCTURE_ALIGNED_ROWS: i16 = 1;
const STRUCTURE_SHIFTED_ROWS: i16 = 2;

pub(crate) fn export_area_symbol(
    ctx: &mut ExportContext<'_>,
    symbol: &Symbol,
    area: &AreaSymbol,
    border: Option<u32>,
) -> (Vec<u8>, u32) {
    let mut base = setup_base_symbol(ctx, symbol, symbol_type::AREA);

    let mut common = AreaCommon::default();
    if area.color.is_some() {
        common.fill_on = 1;
        common.fill_color = ctx.convert_color(area.color);
    }
    if let Some(border_number) = border {
        common.border_on = 1;
        common.border_symbol = border_number as i32;
    }

    let mut flags = 0u16;
    let mut pattern_point: Option<&PointSymbol> = None;
    for pattern in &area.patterns {
        match &pattern.kind {
            FillPatternKind::Line { color, line_width } => match common.hatch_mode {
                HATCH_NONE => {
                    common.hatch_mode = HATCH_SINGLE;
                    common.hatch_color = ctx.convert_color(*color);
                    common.hatch_line_width = convert_size(*line_width) as i16;
                    common.hatch_dist = if ctx.version == OcdVersion::V8 {
                        convert_size(pattern.line_spacing - line_width) as i16
                    } else {
                        convert_size(pattern.line_spacing) as i16
                    };
                    common.hatch_angle_1 = convert_rotation(pattern.angle) as i16;
                    if pattern.rotatable {
                        flags |= 1;
                    }
                },
                HATCH_SINGLE if common.hatch_color == ctx.convert_color(*color) => {
                    common.hatch_mode = HATCH_CROSS;
                    common.hatch_line_width =
                        (common.hatch_line_width + convert_size(*line_width) as i16) / 2;
                    common.hatch_dist = (common.hatch_dist
                        + convert_size(pattern.line_spacing - line_width) as i16)
                        / 2;
                    common.hatch_angle_2 = convert_rotation(pattern.angle) as i16;
                    if pattern.rotatable {
                        flags |= 1;
                    }
                },
                _ => {
                    ctx.warn(format!(
                        "In area symbol \"{}\", skipping a fill pattern.",
                        symbol.name
                    ));
                },
            },
            FillPatternKind::Point {
                point_distance,
                point,
            } => match common.structure_mode {
                STRUCTURE_NONE => {
                    common.structure_mode = STRUCTURE_ALIGNED_ROWS;
                    common.structure_width = convert_size(*point_distance) as i16;
                    common.structure_height = convert_size(pattern.line_spacing) as i16;
                    common.structure_angle = convert_rotation(pattern.angle) as i16;
                    pattern_point = Some(point.as_ref());
                    if pattern.rotatable {
                        flags |= 1;
                    }
                },
                STRUCTURE_ALIGNED_ROWS => {
                    common.structure_mode = STRUCTURE_SHIFTED_ROWS;
                    // This only works for the orienteering symbol sets; a
                    // general conversion is not possible.
                    ctx.warn(format!(
                        "In area symbol \"{}\", assuming a \"shifted rows\" point pattern. \
                         This might be correct as well as incorrect.",
                        symbol.name
                    ));
                    if pattern.line_offset != 0 {
                        common.structure_height /= 2;
                    } else {
                        common.structure_width /= 2;
                    }
                },
                _ => {
                    ctx.warn(format!(
                        "In area symbol \"{}\", skipping a fill pattern.",
                        symbol.name
                    ));
                },
            },
        }
    }
    base.flags = flags;

    let pattern = pattern_size(pattern_point);
    let header_size = base_symbol_size(ctx.version) + AreaCommon::SIZE;
    base.size = (header_size + pattern) as i32;
    common.data_size = (pattern / 8) as i16;

    let mut w = ByteWriter::with_capacity(header_size + pattern);
    base.write(&mut w);
    common.write(&mut w);
    export_pattern(ctx, pattern_point, &mut w);
    debug_assert_eq!(w.len(), base.size as usize);

    (w.into_vec(), base.number as u32)
}

/// Line symbol fields between the common head and the patterns, 64 bytes.
#[derive(Debug, Default)]
struct LineCommon {
    line_color: i16,
    line_width: i16,
    line_style: i16,
    dist_from_start: i16,
    dist_from_end: i16,
    main_length: i16,
    end_length: i16,
    main_gap: i16,
    sec_gap: i16,
    end_gap: i16,
    min_sym: i16,
    num_prim_sym: i16,
    prim_sym_dist: i16,
    framing_color: i16,
    framing_width: i16,
    framing_style: i16,
    double_mode: i16,
    double_width: i16,
    double_color: i16,
    double_left_color: i16,
    double_right_color: i16,
    double_left_width: i16,
    double_right_width: i16,
    double_length: i16,
    double_gap: i16,
    active_symbols: u16,
    primary_data_size: i16,
    secondary_data_size: i16,
    corner_data_size: i16,
    start_data_size: i16,
    end_data_size: i16,
}

impl LineCommon {
    const SIZE: usize = 64;

    fn write(&self, w: &mut ByteWriter) {
        w.i16(self.line_color);
        w.i16(self.line_width);
        w.i16(self.line_style);
        w.i16(self.dist_from_start);
        w.i16(self.dist_from_end);
        w.i16(self.main_length);
        w.i16(self.end_length);
        w.i16(self.main_gap);
        w.i16(self.sec_gap);
        w.i16(self.end_gap);
        w.i16(self.min_sym);
        w.i16(self.num_prim_sym);
        w.i16(self.prim_sym_dist);
        w.i16(self.framing_color);
        w.i16(self.framing_width);
        w.i16(self.framing_style);
        w.i16(self.double_mode);
        w.i16(self.double_width);
        w.i16(self.double_color);
        w.i16(self.double_left_color);
        w.i16(self.double_right_color);
        w.i16(self.double_left_width);
        w.i16(self.double_right_width);
        w.i16(self.double_length);
        w.i16(self.double_gap);
        w.u16(self.active_symbols);
        w.i16(self.primary_data_size);
        w.i16(self.secondary_data_size);
        w.i16(self.corner_data_size);
        w.i16(self.start_data_size);
        w.i16(self.end_data_size);
        w.i16(0); // reserved
    }
}

/// The six representable cap/join combinations, or a cap-only fallback.
fn line_style_code(
    ctx: &mut ExportContext<'_>,
    name: &str,
    cap: CapStyle,
    join: JoinStyle,
) -> i16 {
    match (cap, join) {
        (CapStyle::Flat, JoinStyle::Bevel) => 0,
        (CapStyle::Round, JoinStyle::Round) => 1,
        (CapStyle::Pointed, JoinStyle::Bevel) => 2,
        (CapStyle::Pointed, JoinStyle::Round) => 3,
        (CapStyle::Flat, JoinStyle::Miter) => 4,
        (CapStyle::Pointed, JoinStyle::Miter) => 6,
        _ => {
            ctx.warn(format!(
                "In line symbol \"{name}\", cannot represent cap/join combination."
            ));
            match cap {
                CapStyle::Round => 1,
                CapStyle::Pointed => 3,
                CapStyle::Flat | CapStyle::Square => 0,
            }
        },
    }
}

/// Fill the double-line block from a bordered line symbol. Shared between
/// the plain border export and the combined "double line filling" case.
fn setup_double_line(
    ctx: &mut ExportContext<'_>,
    name: &str,
    line: &LineSymbol,
    common: &mut LineCommon,
) {
    if line.border.dashed && !line.right_border.dashed {
        common.double_mode = 2;
    } else {
        common.double_mode = if line.border.dashed { 3 } else { 1 };
    }

    common.double_left_width = convert_size(line.border.width) as i16;
    common.double_right_width = convert_size(line.right_border.width) as i16;
    common.double_left_color = ctx.convert_color(line.border.color);
    common.double_right_color = ctx.convert_color(line.right_border.color);

    if line.border.dashed {
        common.double_length = convert_size(line.border.dash_length) as i16;
        common.double_gap = convert_size(line.border.break_length) as i16;
    } else if line.right_border.dashed {
        common.double_length = convert_size(line.right_border.dash_length) as i16;
        common.double_gap = convert_size(line.right_border.break_length) as i16;
    }

    let inconsistent = (line.border.dashed
        && line.right_border.dashed
        && (line.border.dash_length != line.right_border.dash_length
            || line.border.break_length != line.right_border.break_length))
        || (!line.border.dashed && line.right_border.dashed);
    if inconsistent {
        ctx.warn(format!(
            "In line symbol \"{name}\", cannot export the borders correctly."
        ));
    }
}

pub(crate) fn export_line_symbol(
    ctx: &mut ExportContext<'_>,
    symbol: &Symbol,
    line: &LineSymbol,
    framing: Option<&LineSymbol>,
    double_line: Option<&LineSymbol>,
) -> (Vec<u8>, u32) {
    let mut base = setup_base_symbol(ctx, symbol, symbol_type::LINE);

    let mut extent = convert_size(line.line_width / 2);
    if line.has_border {
        extent += convert_size((line.border.shift + line.border.width / 2).max(0));
    }
    extent = extent.max(point_symbol_extent(line.start_symbol.as_deref()));
    extent = extent.max(point_symbol_extent(line.end_symbol.as_deref()));
    extent = extent.max(point_symbol_extent(line.mid_symbol.as_deref()));
    extent = extent.max(point_symbol_extent(line.dash_symbol.as_deref()));
    base.extent = extent;

    let mut common = LineCommon::default();
    if line.color.is_some() {
        common.line_color = ctx.convert_color(line.color);
        common.line_width = convert_size(line.line_width) as i16;
    }
    common.line_style = line_style_code(ctx, &symbol.name, line.cap_style, line.join_style);
    if line.cap_style == CapStyle::Pointed {
        common.dist_from_start = convert_size(line.pointed_cap_length) as i16;
        common.dist_from_end = convert_size(line.pointed_cap_length) as i16;
    }

    if line.dashed {
        if line.active_mid_symbol().is_some() {
            if line.dashes_in_group > 1 {
                ctx.warn(format!(
                    "In line symbol \"{}\", neglecting the dash grouping.",
                    symbol.name
                ));
            }
            common.main_length = convert_size(line.dash_length + line.break_length) as i16;
            common.end_length = common.main_length / 2;
            common.main_gap = convert_size(line.break_length) as i16;
        } else if line.dashes_in_group > 1 {
            if line.dashes_in_group > 2 {
                ctx.warn(format!(
                    "In line symbol \"{}\", the number of dashes in a group has been reduced to 2.",
                    symbol.name
                ));
            }
            common.main_length =
                convert_size(2 * line.dash_length + line.in_group_break_length) as i16;
            common.end_length = common.main_length;
            common.main_gap = convert_size(line.break_length) as i16;
            common.sec_gap = convert_size(line.in_group_break_length) as i16;
            common.end_gap = common.sec_gap;
        } else {
            common.main_length = convert_size(line.dash_length) as i16;
            common.end_length = common.main_length / if line.half_outer_dashes { 2 } else { 1 };
            common.main_gap = convert_size(line.break_length) as i16;
        }
    } else {
        common.main_length = convert_size(line.segment_length) as i16;
        common.end_length = convert_size(line.end_length) as i16;
    }

    if line.has_border && (line.border.is_visible() || line.right_border.is_visible()) {
        common.double_width =
            convert_size(line.line_width - line.border.width + 2 * line.border.shift) as i16;
        setup_double_line(ctx, &symbol.name, line, &mut common);
    }

    common.min_sym = if line.show_at_least_one_symbol { 0 } else { -1 };
    common.num_prim_sym = line.mid_symbols_per_spot as i16;
    common.prim_sym_dist = convert_size(line.mid_symbol_distance) as i16;

    common.primary_data_size = (pattern_size(line.mid_symbol.as_deref()) / 8) as i16;
    common.corner_data_size = (pattern_size(line.dash_symbol.as_deref()) / 8) as i16;
    common.start_data_size = (pattern_size(line.start_symbol.as_deref()) / 8) as i16;
    common.end_data_size = (pattern_size(line.end_symbol.as_deref()) / 8) as i16;

    if let Some(framing) = framing {
        common.framing_color = ctx.convert_color(framing.color);
        common.framing_width = convert_size(framing.line_width) as i16;
        common.framing_style = match (framing.cap_style, framing.join_style) {
            (CapStyle::Flat, JoinStyle::Bevel) => 0,
            (CapStyle::Round, JoinStyle::Round) => 1,
            (CapStyle::Flat, JoinStyle::Miter) => 4,
            (cap, _) => {
                ctx.warn(format!(
                    "In line symbol \"{}\", cannot represent cap/join combination.",
                    symbol.name
                ));
                if cap == CapStyle::Round { 1 } else { 0 }
            },
        };
    }

    if let Some(double_line) = double_line {
        common.double_width = convert_size(
            double_line.line_width - double_line.border.width + 2 * double_line.border.shift,
        ) as i16;
        common.double_color = ctx.convert_color(double_line.color);
        if double_line.has_border
            && (double_line.border.is_visible() || double_line.right_border.is_visible())
        {
            setup_double_line(ctx, &symbol.name, double_line, &mut common);
        }
    }

    if ctx.version >= OcdVersion::V11 {
        if common.secondary_data_size != 0 {
            common.active_symbols |= 0x08;
        }
        if common.corner_data_size != 0 {
            common.active_symbols |= 0x04;
        }
        if common.start_data_size != 0 {
            common.active_symbols |= 0x02;
        }
        if common.end_data_size != 0 {
            common.active_symbols |= 0x01;
        }
    }

    let pattern = 8
        * (common.primary_data_size as usize
            + common.secondary_data_size as usize
            + common.corner_data_size as usize
            + common.start_data_size as usize
            + common.end_data_size as usize);
    let header_size = base_symbol_size(ctx.version) + LineCommon::SIZE;
    base.size = (header_size + pattern) as i32;

    let mut w = ByteWriter::with_capacity(header_size + pattern);
    base.write(&mut w);
    common.write(&mut w);
    export_pattern(ctx, line.mid_symbol.as_deref(), &mut w);
    export_pattern(ctx, line.dash_symbol.as_deref(), &mut w);
    export_pattern(ctx, line.start_symbol.as_deref(), &mut w);
    export_pattern(ctx, line.end_symbol.as_deref(), &mut w);
    debug_assert_eq!(w.len(), base.size as usize);

    (w.into_vec(), base.number as u32)
}

/// One text record per horizontal alignment actually used by an object of
/// this symbol; a single default record when the symbol is unused.
fn export_text_symbol_variants(
    ctx: &mut ExportContext<'_>,
    builder: &mut OcdFileBuilder,
    index: usize,
    symbol: &Symbol,
    text: &TextSymbol,
) {
    let mut alignments: Vec<HorizontalAlignment> = Vec::new();
    for object in ctx.map.objects() {
        if object.symbol != index {
            continue;
        }
        if let ObjectKind::Text(text_object) = &object.kind
            && !alignments.contains(&text_object.h_align)
        {
            alignments.push(text_object.h_align);
        }
    }

    if alignments.is_empty() {
        // Export the symbol even if unused.
        let (record, number) = export_text_symbol(ctx, symbol, text, HorizontalAlignment::Left);
        ctx.symbol_numbers.insert(index, number);
        builder.add_symbol(record);
        return;
    }

    for alignment in alignments {
        let (record, number) = export_text_symbol(ctx, symbol, text, alignment);
        ctx.symbol_numbers.insert(index, number);
        ctx.text_alignment_numbers.push(TextAlignmentNumber {
            symbol: index,
            alignment,
            number,
        });
        builder.add_symbol(record);
    }
}

fn export_text_symbol(
    ctx: &mut ExportContext<'_>,
    symbol: &Symbol,
    text: &TextSymbol,
    alignment: HorizontalAlignment,
) -> (Vec<u8>, u32) {
    let mut base = setup_base_symbol(ctx, symbol, symbol_type::TEXT);
    if ctx.version == OcdVersion::V8 {
        base.type2 = 1;
    }
    let header_size = base_symbol_size(ctx.version) + 32 + 14 + 142 + 10;
    base.size = header_size as i32;

    let mut w = ByteWriter::with_capacity(header_size);
    base.write(&mut w);

    // Font name
    w.pascal_string(&ctx.encoding.encode(&text.font_family), 31);

    // Basic block
    w.i16(ctx.convert_color(text.color));
    // Font size in tenths of a point.
    w.i16((10.0 * text.font_size / 25.4 * 72.0).round() as i16);
    w.i16(if text.bold { 700 } else { 400 });
    w.u8(u8::from(text.italic));
    w.u8(0); // reserved
    let char_spacing = convert_size((1000.0 * text.character_spacing).round() as i32) as i16;
    if char_spacing != 0 {
        ctx.warn(format!(
            "In text symbol {}: custom character spacing is set, \
             its implementation does not match OCAD's behavior yet",
            symbol.name
        ));
    }
    w.i16(char_spacing);
    w.i16(100); // word spacing
    w.i16(alignment as i16);

    // Special block
    let absolute_line_spacing =
        text.line_spacing * (text.metrics.line_spacing / text.internal_scaling);
    w.i16((absolute_line_spacing / (text.font_size * 0.01)).round() as i16);
    w.i16(convert_size((1000.0 * text.paragraph_spacing).round() as i32) as i16);
    if text.underlined {
        ctx.warn(format!("In text symbol {}: ignoring underlining", symbol.name));
    }
    if text.kerning {
        ctx.warn(format!("In text symbol {}: ignoring kerning", symbol.name));
    }
    w.u8(u8::from(text.has_line_below));
    w.u8(0); // reserved
    w.i16(ctx.convert_color(text.line_below_color));
    w.i16(convert_size((1000.0 * text.line_below_width).round() as i32) as i16);
    w.i16(convert_size((1000.0 * text.line_below_distance).round() as i32) as i16);
    let num_tabs = text.custom_tabs.len().min(32);
    w.u16(num_tabs as u16);
    for i in 0..32 {
        let tab = if i < num_tabs {
            convert_size(text.custom_tabs[i])
        } else {
            0
        };
        w.i32(tab);
    }

    // Framing block
    let mut framing_mode = 0u8;
    let mut framing_color = 0i16;
    let mut framing_line_width = 0i16;
    let mut framing_offset_x = 0i16;
    let mut framing_offset_y = 0i16;
    if text.framing_color.is_some() {
        framing_color = ctx.convert_color(text.framing_color);
        match text.framing {
            TextFraming::None => {
                framing_color = 0;
            },
            TextFraming::Shadow { x_offset, y_offset } => {
                framing_mode = 1;
                framing_offset_x = convert_size(x_offset) as i16;
                framing_offset_y = -(convert_size(y_offset) as i16);
            },
            TextFraming::Line { half_width } => {
                framing_mode = 2;
                framing_line_width = convert_size(half_width) as i16;
            },
        }
    }
    w.u8(framing_mode);
    w.u8(0); // reserved
    w.i16(framing_line_width);
    w.i16(framing_offset_x);
    w.i16(framing_offset_y);
    w.i16(framing_color);

    debug_assert_eq!(w.len(), header_size);
    (w.into_vec(), base.number as u32)
}

/// A combined-symbol part with its symbol resolved.
#[derive(Clone, Copy)]
struct ResolvedPart<'a> {
    symbol: &'a Symbol,
    shared_index: Option<usize>,
    private: bool,
}

fn resolve_part<'a>(map: &'a crate::map::Map, part: &'a CombinedPart) -> Option<ResolvedPart<'a>> {
    let (symbol, shared_index) = match &part.symbol {
        PartRef::Shared(index) => (map.symbols.get(*index)?, Some(*index)),
        PartRef::Private(symbol) => (symbol.as_ref(), None),
    };
    Some(ResolvedPart {
        symbol,
        shared_index,
        private: part.private,
    })
}

/// A copy of a part symbol carrying the combination's identity.
fn with_combined_identity(combined: &Symbol, part: &Symbol) -> Symbol {
    Symbol {
        number: combined.number,
        name: combined.name.clone(),
        hidden: combined.hidden,
        protected: combined.protected,
        icon: part.icon.clone(),
        kind: part.kind.clone(),
    }
}

fn maybe_framing(line: &LineSymbol) -> bool {
    !line.has_border
        && !line.dashed
        && line.cap_style != CapStyle::Pointed
        && line.active_dash_symbol().is_none()
        && line.active_mid_symbol().is_none()
        && line.active_start_symbol().is_none()
        && line.active_end_symbol().is_none()
}

fn maybe_double_filling(line: &LineSymbol) -> bool {
    line.has_border
        && line.line_width > 0
        && line.color.is_some()
        && line.cap_style != CapStyle::Pointed
        && line.active_dash_symbol().is_none()
        && line.active_mid_symbol().is_none()
        && line.active_start_symbol().is_none()
        && line.active_end_symbol().is_none()
}

fn part_line(part: ResolvedPart<'_>) -> Option<&LineSymbol> {
    match &part.symbol.kind {
        SymbolKind::Line(line) => Some(line),
        _ => None,
    }
}

/// Decompose a combined symbol into primitive records, or drop it with a
/// warning.
fn export_combined_symbol(
    ctx: &mut ExportContext<'_>,
    builder: &mut OcdFileBuilder,
    index: usize,
    symbol: &Symbol,
    combined: &CombinedSymbol,
) {
    let map = ctx.map;
    let mut parts: SmallVec<[ResolvedPart<'_>; 3]> = SmallVec::new();
    let mut num_parts = 0;
    for part in &combined.parts {
        if let Some(resolved) = resolve_part(map, part) {
            if num_parts < 3 {
                parts.push(resolved);
            }
            num_parts += 1;
        }
    }

    if try_export_combined(ctx, builder, index, symbol, &mut parts, num_parts) {
        return;
    }
    ctx.warn(format!("Unhandled combined symbol: {}", symbol.name));
}

fn try_export_combined(
    ctx: &mut ExportContext<'_>,
    builder: &mut OcdFileBuilder,
    index: usize,
    symbol: &Symbol,
    parts: &mut [ResolvedPart<'_>],
    num_parts: usize,
) -> bool {
    match num_parts {
        1 => {
            // Single part: output just this part, if sufficient.
            let duplicate = with_combined_identity(symbol, parts[0].symbol);
            let (record, number) = match &duplicate.kind {
                SymbolKind::Area(area) => export_area_symbol(ctx, &duplicate, area, None),
                SymbolKind::Line(line) => export_line_symbol(ctx, &duplicate, line, None, None),
                _ => return false,
            };
            builder.add_symbol(record);
            ctx.symbol_numbers.insert(index, number);
            true
        },

        2 | 3 => {
            // Area with border, or line with framing and/or filled double
            // line, if sufficient.
            let is_line = |p: &ResolvedPart<'_>| matches!(p.symbol.kind, SymbolKind::Line(_));
            let is_area = |p: &ResolvedPart<'_>| matches!(p.symbol.kind, SymbolKind::Area(_));
            if !is_line(&parts[0]) && !is_line(&parts[1]) {
                return false;
            }
            if is_area(&parts[1]) {
                parts.swap(0, 1);
            }
            if is_area(&parts[0]) {
                if ctx.version < OcdVersion::V9 || num_parts != 2 {
                    return false;
                }
                return export_area_with_border(ctx, builder, index, symbol, parts);
            }

            if !(is_line(&parts[0])
                && is_line(&parts[1])
                && (num_parts == 2 || is_line(&parts[2])))
            {
                return false;
            }

            if num_parts == 3 && !part_line(parts[2]).is_some_and(maybe_double_filling) {
                // If there is a candidate double line/filling, move it last.
                if part_line(parts[0]).is_some_and(maybe_double_filling) {
                    parts.swap(0, 2);
                } else if part_line(parts[1]).is_some_and(maybe_double_filling) {
                    parts.swap(1, 2);
                } else {
                    return false;
                }
            }
            if !part_line(parts[1]).is_some_and(maybe_framing) {
                // If there is a candidate framing, move it second.
                parts.swap(0, 1);
            }
            let Some(framing) = part_line(parts[1]) else {
                return false;
            };
            if !maybe_framing(framing) {
                return false;
            }

            let duplicate = with_combined_identity(symbol, parts[0].symbol);
            let SymbolKind::Line(main_line) = &duplicate.kind else {
                return false;
            };
            if num_parts == 3 && main_line.has_border {
                return false;
            }
            let double_line = if num_parts == 3 {
                part_line(parts[2])
            } else {
                None
            };

            let (record, number) =
                export_line_symbol(ctx, &duplicate, main_line, Some(framing), double_line);
            builder.add_symbol(record);
            ctx.symbol_numbers.insert(index, number);
            true
        },

        _ => false,
    }
}

/// Case: one area part and one line part, version 9 and later. The line
/// becomes a referenced border symbol; a private border is cloned under a
/// derived name and number.
fn export_area_with_border(
    ctx: &mut ExportContext<'_>,
    builder: &mut OcdFileBuilder,
    index: usize,
    symbol: &Symbol,
    parts: &[ResolvedPart<'_>],
) -> bool {
    let border_part = parts[1];
    let SymbolKind::Line(_) = &border_part.symbol.kind else {
        return false;
    };

    let border_number = match border_part.shared_index.and_then(|i| {
        ctx.symbol_numbers.get(&i).copied()
    }) {
        Some(number) => number,
        None => {
            let (record, number) = if border_part.private {
                let mut clone = with_combined_identity(symbol, border_part.symbol);
                clone.name = format!("Border of {}", clone.name);
                clone.number[1] += 1;
                let SymbolKind::Line(line) = clone.kind.clone() else {
                    return false;
                };
                export_line_symbol(ctx, &clone, &line, None, None)
            } else {
                let border_symbol = border_part.symbol;
                let SymbolKind::Line(line) = &border_symbol.kind else {
                    return false;
                };
                export_line_symbol(ctx, border_symbol, line, None, None)
            };
            if let Some(shared) = border_part.shared_index {
                ctx.symbol_numbers.insert(shared, number);
            }
            builder.add_symbol(record);
            number
        },
    };

    let duplicate = with_combined_identity(symbol, parts[0].symbol);
    let SymbolKind::Area(area) = &duplicate.kind else {
        return false;
    };
    let (record, number) = export_area_symbol(ctx, &duplicate, area, Some(border_number));
    builder.add_symbol(record);
    ctx.symbol_numbers.insert(index, number);
    true
}
