//! Object encoder: one binary record per drawn object, in map order.
//!
//! Point and path records carry the raw coordinate sequence with per-point
//! flags. Text records instead synthesize anchor and bounding coordinates
//! and append the UTF-16LE text payload in 64-byte chunks.

use crate::common::binary::{ByteWriter, pad_to_chunk, padded_size};
use crate::common::encoding::{decode_utf16le_lossy_prefix, encode_utf16le};
use crate::map::Map;
use crate::map::coord::{Bounds, MapCoord};
use crate::map::object::{Object, ObjectKind, TextObject, VerticalAlignment};
use crate::map::symbol::{LineSymbol, PartRef, SymbolKind, TextSymbol};

use super::convert::{convert_point, convert_rotation};
use super::export::ExportContext;
use super::file::OcdFileBuilder;
use super::records::{ObjectIndexEntry, OcdPoint, OcdVersion};

/// Byte size of one text chunk (eight coordinate units).
const TEXT_CHUNK_SIZE: usize = 8 * OcdPoint::SIZE;
/// Maximum number of text chunks per object.
const TEXT_MAX_CHUNKS: usize = 1024 / 8;

/// The common object record head, serialized per version.
#[derive(Debug, Default)]
struct ObjectHeader {
    symbol: i32,
    object_type: u8,
    num_items: u32,
    num_text: u32,
    angle: i16,
}

impl ObjectHeader {
    fn size(version: OcdVersion) -> usize {
        if version == OcdVersion::V8 { 24 } else { 32 }
    }

    fn write(&self, w: &mut ByteWriter, version: OcdVersion) {
        if version == OcdVersion::V8 {
            w.i16(self.symbol as i16);
            w.u8(self.object_type);
            // Text records store 2-byte characters.
            let unicode = matches!(self.object_type, 4 | 5);
            w.u8(u8::from(unicode));
            w.u16(self.num_items as u16);
            w.u16(self.num_text as u16);
            w.i16(self.angle);
            w.zeros(14);
        } else {
            w.i32(self.symbol);
            w.u8(self.object_type);
            w.u8(0); // reserved
            w.i16(self.angle);
            w.u32(self.num_items);
            w.u32(self.num_text);
            w.zeros(16);
        }
        debug_assert_eq!(w.len() % Self::size(version), 0);
    }
}

/// Export all objects of all parts into the builder.
pub fn export_objects(ctx: &mut ExportContext<'_>, builder: &mut OcdFileBuilder) {
    let map = ctx.map;
    let (dx, dy) = ctx.area_offset;
    for part in &map.parts {
        for object in &part.objects {
            if dx != 0 || dy != 0 {
                // Encode a translated duplicate, never the original.
                export_object(ctx, builder, &object.translated(-dx, -dy));
            } else {
                export_object(ctx, builder, object);
            }
        }
    }
}

/// Whether the object's symbol fills an area, directly or through a
/// combination.
fn symbol_fills_area(map: &Map, kind: &SymbolKind) -> bool {
    match kind {
        SymbolKind::Area(_) => true,
        SymbolKind::Combined(combined) => combined.parts.iter().any(|part| {
            match &part.symbol {
                PartRef::Shared(index) => map
                    .symbols
                    .get(*index)
                    .is_some_and(|s| symbol_fills_area(map, &s.kind)),
                PartRef::Private(symbol) => symbol_fills_area(map, &symbol.kind),
            }
        }),
        _ => false,
    }
}

fn export_object(ctx: &mut ExportContext<'_>, builder: &mut OcdFileBuilder, object: &Object) {
    let map = ctx.map;
    let version = ctx.version;
    let symbol_kind = map.symbols.get(object.symbol).map(|s| &s.kind);
    let symbol_number = ctx
        .symbol_numbers
        .get(&object.symbol)
        .copied()
        .unwrap_or(0);

    let mut header = ObjectHeader::default();
    let mut text_payload: Option<(&TextObject, Vec<u8>)> = None;
    match &object.kind {
        ObjectKind::Point(point) => {
            header.object_type = 1;
            header.symbol = symbol_number as i32;
            header.angle = convert_rotation(point.rotation) as i16;
            header.num_items = 1;
        },
        ObjectKind::Path(path) => {
            header.object_type = if symbol_kind.is_some_and(|kind| symbol_fills_area(map, kind)) {
                3
            } else {
                2
            };
            header.symbol = symbol_number as i32;
            header.num_items = path.coords.len() as u32;
        },
        ObjectKind::Text(text) => {
            header.object_type = if text.has_single_anchor() { 4 } else { 5 };
            header.symbol = ctx
                .text_alignment_numbers
                .iter()
                .find(|m| m.symbol == object.symbol && m.alignment == text.h_align)
                .map_or(symbol_number, |m| m.number) as i32;
            header.angle = convert_rotation(text.rotation) as i16;
            if !text.lines.is_empty() {
                header.num_items = if text.has_single_anchor() { 5 } else { 4 };
                let data = export_text_data(ctx, text);
                header.num_text = (data.len() / OcdPoint::SIZE) as u32;
                text_payload = Some((text, data));
            }
        },
    }

    let header_size = ObjectHeader::size(version);
    let mut w =
        ByteWriter::with_capacity(header_size + 8 * (header.num_items + header.num_text) as usize);
    header.write(&mut w, version);
    if let Some((text, data)) = text_payload {
        let fallback_symbol;
        let text_symbol = match symbol_kind {
            Some(SymbolKind::Text(text_symbol)) => text_symbol,
            _ => {
                fallback_symbol = TextSymbol::default();
                &fallback_symbol
            },
        };
        if text.has_single_anchor() {
            export_text_coordinates_single(text, text_symbol, &mut w);
        } else {
            export_text_coordinates_box(text, text_symbol, &mut w);
        }
        w.bytes(&data);
    } else if header.num_items > 0 {
        let line_symbol = match symbol_kind {
            Some(SymbolKind::Line(line)) => Some(line),
            _ => None,
        };
        export_coordinates(object.raw_coords(), line_symbol, &mut w);
    }
    debug_assert_eq!(
        w.len(),
        header_size + 8 * (header.num_items + header.num_text) as usize
    );

    let extent = object
        .extent_mm()
        .unwrap_or_else(|| Bounds::point(0.0, 0.0));
    let padded = padded_size(w.len(), 8);
    let size = if version < OcdVersion::V11 {
        ((padded - header_size) / OcdPoint::SIZE) as i32
    } else {
        padded as i32
    };
    let entry = ObjectIndexEntry {
        bottom_left: convert_point(MapCoord::from_mm(extent.min_x, extent.max_y)),
        top_right: convert_point(MapCoord::from_mm(extent.max_x, extent.min_y)),
        position: 0, // filled during assembly
        size,
        symbol: header.symbol,
        object_type: header.object_type,
        status: 1, // normal object
    };
    builder.add_object(w.into_vec(), entry);
}

/// Write a coordinate sequence with per-point flags.
///
/// A dash point becomes a format dash point only when the owning line
/// symbol is dashed without a dash marker symbol; otherwise it is a corner
/// point. The curve-start flag marks the following two control points.
pub(crate) fn export_coordinates(
    coords: &[MapCoord],
    line_symbol: Option<&LineSymbol>,
    w: &mut ByteWriter,
) -> u16 {
    let mut num_points = 0;
    let mut curve_start = false;
    let mut curve_continue = false;
    let mut hole_point = false;
    for coord in coords {
        let mut p = convert_point(*coord);
        if coord.is_dash_point() {
            match line_symbol {
                Some(line) if line.active_dash_symbol().is_none() && line.dashed => {
                    p.y |= OcdPoint::Y_DASH;
                },
                _ => p.y |= OcdPoint::Y_CORNER,
            }
        }
        if curve_start {
            p.x |= OcdPoint::X_CTL1;
        }
        if hole_point {
            p.y |= OcdPoint::Y_HOLE;
        }
        if curve_continue {
            p.x |= OcdPoint::X_CTL2;
        }

        curve_continue = curve_start;
        curve_start = coord.is_curve_start();
        hole_point = coord.is_hole_point();

        p.write(w);
        num_points += 1;
    }
    num_points
}

/// Rotate `(x, y)` by `angle` radians in the y-down map plane.
fn rotate_point(x: f64, y: f64, angle: f64) -> (f64, f64) {
    let (sin, cos) = angle.sin_cos();
    (x * cos - y * sin, x * sin + y * cos)
}

/// Map a point from text coordinates to map millimeters.
fn text_to_map(text: &TextObject, scaling: f64, x: f64, y: f64) -> MapCoord {
    let (x, y) = rotate_point(x / scaling, y / scaling, -f64::from(text.rotation));
    MapCoord::from_mm(x + text.anchor.x_mm(), y + text.anchor.y_mm())
}

/// Five coordinates for a single-anchor text object: the baseline anchor
/// point, then the corners of the tight text bounding box, bottom left,
/// bottom right, top right, top left.
fn export_text_coordinates_single(text: &TextObject, symbol: &TextSymbol, w: &mut ByteWriter) {
    let scaling = symbol.internal_scaling;
    let line0 = &text.lines[0];
    convert_point(text_to_map(text, scaling, 0.0, line0.y)).write(w);

    let mut bounds = Bounds::point(line0.x, line0.y - line0.ascent);
    for line in &text.lines {
        bounds.include(line.x, line.y - line.ascent);
        bounds.include(line.x + line.width, line.y + line.descent);
    }

    let corners = [
        (bounds.min_x, bounds.max_y),
        (bounds.max_x, bounds.max_y),
        (bounds.max_x, bounds.min_y),
        (bounds.min_x, bounds.min_y),
    ];
    for (x, y) in corners {
        convert_point(text_to_map(text, scaling, x, y)).write(w);
    }
}

/// Four corners of a box-anchored text object. The format only supports
/// top vertical alignment, so other alignments move the top edge to the
/// top of the first line.
fn export_text_coordinates_box(text: &TextObject, symbol: &TextSymbol, w: &mut ByteWriter) {
    let scaling = symbol.internal_scaling;
    let (box_width, box_height) = text.box_size.unwrap_or((0.0, 0.0));
    let line0 = &text.lines[0];

    let mut new_top = if text.v_align == VerticalAlignment::Top {
        -box_height / 2.0
    } else {
        (line0.y - line0.ascent) / scaling
    };
    // Account for extra internal leading.
    let top_adjust =
        -symbol.font_size + (symbol.metrics.ascent + symbol.metrics.descent + 0.5) / scaling;
    new_top -= top_adjust;

    let corners = [
        (-box_width / 2.0, box_height / 2.0),
        (box_width / 2.0, box_height / 2.0),
        (box_width / 2.0, new_top),
        (-box_width / 2.0, new_top),
    ];
    for (x, y) in corners {
        let (x, y) = rotate_point(x, y, -f64::from(text.rotation));
        convert_point(MapCoord::from_mm(
            x + text.anchor.x_mm(),
            y + text.anchor.y_mm(),
        ))
        .write(w);
    }
}

/// Encode the text payload: newline normalization, UTF-16LE, truncation to
/// the chunk limit, zero padding to a chunk boundary.
fn export_text_data(ctx: &mut ExportContext<'_>, object: &TextObject) -> Vec<u8> {
    let max_size = TEXT_CHUNK_SIZE * TEXT_MAX_CHUNKS;

    let mut text = object.text.replace('\n', "\r\n");
    if object.text.starts_with('\n') {
        text.insert_str(0, "\r\n");
    }

    let mut encoded = encode_utf16le(&text);
    if encoded.len() >= max_size {
        // Truncate safely by decoding the truncated encoded data.
        let truncated = decode_utf16le_lossy_prefix(&encoded[..max_size - 1]);
        let remainder = &text[truncated.len()..];
        ctx.warn(format!("Text truncated at '|': {truncated}|{remainder}"));
        encoded = encode_utf16le(&truncated);
    }
    debug_assert!(encoded.len() < max_size);

    pad_to_chunk(&mut encoded, TEXT_CHUNK_SIZE);
    encoded
}
