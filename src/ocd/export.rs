//! Export orchestration: one call turns a map into a complete file image.
//!
//! The pipeline is synchronous and single-threaded. All mutable state
//! (symbol numbers, text alignment mapping, warnings) lives in one
//! [`ExportContext`] created per call, so concurrent exports of different
//! maps are independent.

use std::collections::HashMap;

use crate::common::binary::ByteWriter;
use crate::common::encoding::NarrowEncoding;
use crate::common::{Error, Result};
use crate::map::color::{ColorRef, MapColor};
use crate::map::coord::{Bounds, MapCoord};
use crate::map::object::HorizontalAlignment;
use crate::map::Map;

use super::convert::convert_point;
use super::file::OcdFileBuilder;
use super::objects::export_objects;
use super::params::{STRING_TYPE_COLOR, STRING_TYPE_SCALE, string_for_color, string_for_scale};
use super::records::OcdVersion;
use super::symbols::export_symbols;

/// Options for one export run.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// WHATWG label of the 8-bit encoding for narrow strings (versions 8
    /// to 11). Defaults to windows-1252; ignored for version 12 (UTF-8).
    pub encoding: Option<String>,
}

/// The result of a successful export.
#[derive(Debug)]
pub struct Export {
    /// The complete file image.
    pub data: Vec<u8>,
    /// Non-fatal anomalies, in the order they were detected.
    pub warnings: Vec<String>,
}

/// One entry of the text symbol alignment mapping.
#[derive(Debug, Clone, Copy)]
pub struct TextAlignmentNumber {
    /// Map symbol index.
    pub symbol: usize,
    pub alignment: HorizontalAlignment,
    /// Assigned format symbol number of this alignment's record.
    pub number: u32,
}

/// Mutable state of one export run.
pub struct ExportContext<'a> {
    pub map: &'a Map,
    pub version: OcdVersion,
    pub encoding: NarrowEncoding,
    /// Global translation subtracted from all coordinates, micrometers.
    pub area_offset: (i32, i32),
    pub uses_registration_color: bool,
    /// Map symbol index to assigned format number.
    pub symbol_numbers: HashMap<usize, u32>,
    /// All assigned numbers, including clones not listed in the map.
    pub assigned_numbers: Vec<u32>,
    pub text_alignment_numbers: Vec<TextAlignmentNumber>,
    warnings: Vec<String>,
}

impl<'a> ExportContext<'a> {
    fn new(map: &'a Map, version: OcdVersion, encoding: NarrowEncoding) -> Self {
        Self {
            map,
            version,
            encoding,
            area_offset: (0, 0),
            uses_registration_color: map.uses_registration_color(),
            symbol_numbers: HashMap::new(),
            assigned_numbers: Vec::new(),
            text_alignment_numbers: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// The exported color table number for a color reference.
    ///
    /// The registration color occupies entry 0 and shifts the others up by
    /// one when present; unknown references fall back to 0.
    pub fn convert_color(&self, color: Option<ColorRef>) -> i16 {
        match color {
            Some(ColorRef::Map(index)) if index < self.map.colors.len() => {
                (index + usize::from(self.uses_registration_color)) as i16
            },
            _ => 0,
        }
    }
}

/// Export `map` as an OCD file of the given version (8 to 12).
pub fn export(map: &Map, version: u16, options: &ExportOptions) -> Result<Export> {
    let version = OcdVersion::from_number(version)?;

    let mut encoding_warning = None;
    let encoding = if version == OcdVersion::V12 {
        NarrowEncoding::utf8()
    } else {
        match &options.encoding {
            None => NarrowEncoding::default_8bit(),
            Some(label) => match NarrowEncoding::for_label(label) {
                Ok(encoding) => encoding,
                Err(fallback) => {
                    encoding_warning = Some(format!(
                        "Encoding '{label}' is not available, using {}.",
                        fallback.name()
                    ));
                    fallback
                },
            },
        }
    };

    let mut ctx = ExportContext::new(map, version, encoding);
    if let Some(warning) = encoding_warning {
        ctx.warn(warning);
    }

    // Check for a necessary offset (and add related warnings early).
    ctx.area_offset = calculate_area_offset(&mut ctx);

    let mut builder = OcdFileBuilder::new(version);
    if version == OcdVersion::V8 {
        export_setup_v8(&mut ctx, &mut builder)?;
    } else {
        export_setup_params(&mut ctx, &mut builder);
    }
    export_symbols(&mut ctx, &mut builder);
    export_objects(&mut ctx, &mut builder);

    Ok(Export {
        data: builder.finish(),
        warnings: ctx.warnings,
    })
}

/// The drawing area of version 8 readers, in millimeters.
const DRAWING_AREA_MM: f64 = 2000.0;

/// A translation moving the map into the bounded legacy drawing area,
/// snapped to 100 m in projected coordinates. Zero when everything fits.
fn calculate_area_offset(ctx: &mut ExportContext<'_>) -> (i32, i32) {
    let ocd_bounds = Bounds {
        min_x: -DRAWING_AREA_MM,
        min_y: -DRAWING_AREA_MM,
        max_x: DRAWING_AREA_MM,
        max_y: DRAWING_AREA_MM,
    };

    let mut offset = (0.0f64, 0.0f64);
    let Some(extent) = ctx.map.calculate_extent_mm() else {
        return (0, 0);
    };
    if ocd_bounds.contains_bounds(&extent) {
        return (0, 0);
    }

    if extent.width() < ocd_bounds.width() && extent.height() < ocd_bounds.height() {
        // The extent fits into the limited area.
        ctx.warn("Coordinates are adjusted to fit into the OCAD 8 drawing area (-2 m ... 2 m).");
        offset = extent.center();
    } else {
        // The extent is too wide to fit. Only move the objects if they are
        // completely outside the drawing area; this avoids repeated moves
        // on open/save/close cycles.
        if !extent.intersects(&ocd_bounds) {
            ctx.warn(
                "Coordinates are adjusted to fit into the OCAD 8 drawing area (-2 m ... 2 m).",
            );
            let mut count = 0usize;
            let mut sum = (0.0f64, 0.0f64);
            for object in ctx.map.objects() {
                if let Some(extent) = object.extent_mm() {
                    let center = extent.center();
                    sum.0 += center.0;
                    sum.1 += center.1;
                    count += 1;
                }
            }
            if count > 0 {
                offset = (sum.0 / count as f64, sum.1 / count as f64);
            }
        }
        ctx.warn(
            "Some coordinates remain outside of the OCAD 8 drawing area. \
             They might be unreachable in OCAD.",
        );
    }

    if offset.0.abs() + offset.1.abs() > 0.0 {
        // Round the offset to 100 m in projected coordinates, to avoid a
        // crude grid offset.
        const UNIT: f64 = 100.0;
        let georef = &ctx.map.georef;
        let projected = georef.to_projected(offset.0, offset.1);
        let projected = (
            (projected.0 / UNIT).round() * UNIT,
            (projected.1 / UNIT).round() * UNIT,
        );
        offset = georef.to_map(projected.0, projected.1);
    }

    let coord = MapCoord::from_mm(offset.0, offset.1);
    (coord.x, coord.y)
}

/// Byte limit of the version 8 notes block, including the terminator.
const NOTES_LIMIT_V8: usize = 32768;

/// Version 8 header blocks: view setup, notes and the color table.
fn export_setup_v8(ctx: &mut ExportContext<'_>, builder: &mut OcdFileBuilder) -> Result<()> {
    let map = ctx.map;
    let georef = &map.georef;

    let mut setup = ByteWriter::with_capacity(48);
    convert_point(MapCoord::default()).write(&mut setup); // view center
    setup.f64(f64::from(georef.scale_denominator));
    setup.f64(georef.ref_point.0);
    setup.f64(georef.ref_point.1);
    setup.f64(georef.grivation_deg);
    setup.f64(1.0); // zoom
    builder.set_setup(setup.into_vec());

    let mut notes = ctx.encoding.encode(&map.notes);
    if !notes.is_empty() {
        if notes.len() + 1 > NOTES_LIMIT_V8 {
            ctx.warn("Map notes were truncated to fit the OCD version 8 notes block.");
            notes.truncate(NOTES_LIMIT_V8 - 1);
        }
        notes.push(0);
        builder.set_info(notes);
    }

    let limit = if ctx.uses_registration_color { 255 } else { 256 };
    if map.colors.len() > limit {
        return Err(Error::TooManyColors {
            count: map.colors.len(),
            limit,
            version: 8,
        });
    }

    let encoding = ctx.encoding;
    let mut w = ByteWriter::with_capacity(4 + 256 * 72);
    let mut num_colors = 0u16;
    let mut entries = ByteWriter::with_capacity(256 * 72);
    let mut add_color = |color: &MapColor, number: u16, entries: &mut ByteWriter| {
        let level = |v: f32| (f64::from(v) * 200.0).round() as u8;
        entries.i16(number as i16);
        entries.i16(0); // reserved
        entries.u8(level(color.cmyk.c));
        entries.u8(level(color.cmyk.m));
        entries.u8(level(color.cmyk.y));
        entries.u8(level(color.cmyk.k));
        entries.pascal_string(&encoding.encode(&color.name), 31);
        entries.zeros(32); // separations
    };
    if ctx.uses_registration_color {
        ctx.warn("Registration black is exported as a regular color.");
        add_color(&MapColor::registration(), num_colors, &mut entries);
        num_colors += 1;
    }
    for color in &map.colors {
        add_color(color, num_colors, &mut entries);
        num_colors += 1;
    }
    entries.zeros((256 - usize::from(num_colors)) * 72);

    w.u16(num_colors);
    w.u16(0); // spot color separations
    w.bytes(entries.as_slice());
    builder.set_symbol_header(w.into_vec());

    ctx.warn("Spot color information was ignored.");
    Ok(())
}

/// Version 9+ setup: scale, notes and colors as parameter strings.
fn export_setup_params(ctx: &mut ExportContext<'_>, builder: &mut OcdFileBuilder) {
    let map = ctx.map;

    let scale_string = string_for_scale(&map.georef, &map.grid, ctx.version);
    builder.add_string(STRING_TYPE_SCALE, ctx.encoding.encode(&scale_string));

    builder.add_string(
        ctx.version.notes_string_type(),
        ctx.encoding.encode(&map.notes),
    );

    let mut number = 0;
    if ctx.uses_registration_color {
        ctx.warn("Registration black is exported as a regular color.");
        let string = string_for_color(number, &MapColor::registration());
        builder.add_string(STRING_TYPE_COLOR, ctx.encoding.encode(&string));
        number += 1;
    }
    for color in &map.colors {
        let string = string_for_color(number, color);
        builder.add_string(STRING_TYPE_COLOR, ctx.encoding.encode(&string));
        number += 1;
    }

    ctx.warn("Spot color information was ignored.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::object::{ObjectKind, PointObject};
    use crate::map::{MapPart, Object};

    fn map_with_point(x_mm: f64, y_mm: f64) -> Map {
        let mut map = Map::default();
        let mut part = MapPart::default();
        part.objects.push(Object {
            symbol: 0,
            kind: ObjectKind::Point(PointObject {
                coord: MapCoord::from_mm(x_mm, y_mm),
                rotation: 0.0,
            }),
        });
        map.parts.push(part);
        map
    }

    fn offset_for(map: &Map) -> ((i32, i32), Vec<String>) {
        let mut ctx = ExportContext::new(map, OcdVersion::V8, NarrowEncoding::default_8bit());
        let offset = calculate_area_offset(&mut ctx);
        (offset, ctx.warnings)
    }

    #[test]
    fn test_no_offset_inside_drawing_area() {
        let map = map_with_point(100.0, -100.0);
        let (offset, warnings) = offset_for(&map);
        assert_eq!(offset, (0, 0));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_offset_snaps_to_projected_grid() {
        // A small extent far outside the bounds moves by its center,
        // snapped to 100 m. At 1:15000, 100 m is 6.667 mm on the map.
        let map = map_with_point(3000.0, 0.0);
        let (offset, warnings) = offset_for(&map);
        // 3000 mm -> 45000 m, already a multiple of 100 m.
        assert_eq!(offset, (3_000_000, 0));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("adjusted to fit"));
    }

    #[test]
    fn test_wide_extent_warns_about_remaining() {
        let mut map = map_with_point(3000.0, 0.0);
        map.parts[0].objects.push(Object {
            symbol: 0,
            kind: ObjectKind::Point(PointObject {
                coord: MapCoord::from_mm(8000.0, 0.0),
                rotation: 0.0,
            }),
        });
        let (offset, warnings) = offset_for(&map);
        // Both objects outside: move to the average center (5500 mm maps
        // to 82500 m, snapped to 82500).
        assert_eq!(offset, (5_500_000, 0));
        assert_eq!(warnings.len(), 2);
        assert!(warnings[1].contains("remain outside"));
    }

    #[test]
    fn test_wide_intersecting_extent_stays() {
        let mut map = map_with_point(0.0, 0.0);
        map.parts[0].objects.push(Object {
            symbol: 0,
            kind: ObjectKind::Point(PointObject {
                coord: MapCoord::from_mm(8000.0, 0.0),
                rotation: 0.0,
            }),
        });
        let (offset, warnings) = offset_for(&map);
        assert_eq!(offset, (0, 0));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("remain outside"));
    }

    #[test]
    fn test_v8_color_limit() {
        let mut map = Map::default();
        for i in 0..257 {
            map.colors
                .push(MapColor::new(format!("c{i}"), Default::default()));
        }
        let err = export(&map, 8, &ExportOptions::default()).unwrap_err();
        assert!(matches!(err, Error::TooManyColors { count: 257, .. }));

        // Version 9 has no such limit.
        assert!(export(&map, 9, &ExportOptions::default()).is_ok());
    }

    #[test]
    fn test_unsupported_version() {
        let map = Map::default();
        let err = export(&map, 7, &ExportOptions::default()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion(7)));
    }

    #[test]
    fn test_unknown_encoding_falls_back() {
        let map = Map::default();
        let options = ExportOptions {
            encoding: Some("no-such-encoding".to_string()),
        };
        let export = export(&map, 9, &options).unwrap();
        assert!(export.warnings.iter().any(|w| w.contains("not available")));
    }
}
