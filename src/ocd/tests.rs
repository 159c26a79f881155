//! End-to-end export tests: whole files, checked through their indices.

use crate::map::color::{Cmyk, ColorRef, MapColor};
use crate::map::coord::MapCoord;
use crate::map::object::{HorizontalAlignment, Object, ObjectKind, PointObject, TextObject};
use crate::map::symbol::{
    AreaSymbol, CombinedPart, CombinedSymbol, LineSymbol, PartRef, PointSymbol, Symbol, SymbolKind,
    TextSymbol,
};
use crate::map::{Map, MapPart};

use super::export::{ExportOptions, export};
use super::records::ObjectIndexEntry;

fn read_u16(data: &[u8], pos: usize) -> u16 {
    u16::from_le_bytes([data[pos], data[pos + 1]])
}

fn read_i16(data: &[u8], pos: usize) -> i16 {
    i16::from_le_bytes([data[pos], data[pos + 1]])
}

fn read_u32(data: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes(data[pos..pos + 4].try_into().unwrap())
}

fn read_i32(data: &[u8], pos: usize) -> i32 {
    i32::from_le_bytes(data[pos..pos + 4].try_into().unwrap())
}

/// Positions of all symbol records, following the index chain.
fn symbol_positions(data: &[u8]) -> Vec<usize> {
    let mut result = Vec::new();
    let mut block = read_u32(data, 8) as usize;
    while block != 0 {
        for slot in 0..256 {
            let pos = read_u32(data, block + 4 + slot * 4) as usize;
            if pos != 0 {
                result.push(pos);
            }
        }
        block = read_u32(data, block) as usize;
    }
    result
}

/// Offsets of all used object index entries, following the index chain.
fn object_entries(data: &[u8], version: u16) -> Vec<usize> {
    let entry_size = if version == 8 {
        ObjectIndexEntry::SIZE_V8
    } else {
        ObjectIndexEntry::SIZE_V9
    };
    let mut result = Vec::new();
    let mut block = read_u32(data, 12) as usize;
    while block != 0 {
        for slot in 0..256 {
            let entry = block + 4 + slot * entry_size;
            if read_u32(data, entry + 16) != 0 {
                result.push(entry);
            }
        }
        block = read_u32(data, block) as usize;
    }
    result
}

/// String types of all used string index entries.
fn string_types(data: &[u8]) -> Vec<i32> {
    let mut result = Vec::new();
    let mut block = read_u32(data, 32) as usize;
    while block != 0 {
        for slot in 0..256 {
            let entry = block + 4 + slot * 16;
            if read_u32(data, entry) != 0 {
                result.push(read_i32(data, entry + 8));
            }
        }
        block = read_u32(data, block) as usize;
    }
    result
}

/// A map with one color, one dot symbol and one point object at (10, -5) mm.
fn dot_map() -> Map {
    let mut map = Map::default();
    map.colors
        .push(MapColor::new("Purple", Cmyk::new(0.35, 0.85, 0.0, 0.0)));
    map.symbols.push(Symbol::new(
        [101, 0],
        "Dot",
        SymbolKind::Point(PointSymbol {
            inner_radius: 250,
            inner_color: Some(ColorRef::Map(0)),
            ..Default::default()
        }),
    ));
    let mut part = MapPart::default();
    part.objects.push(Object {
        symbol: 0,
        kind: ObjectKind::Point(PointObject {
            coord: MapCoord::from_mm(10.0, -5.0),
            rotation: 0.0,
        }),
    });
    map.parts.push(part);
    map
}

#[test]
fn test_v9_symbol_and_object_roundtrip() {
    let result = export(&dot_map(), 9, &ExportOptions::default()).unwrap();
    let data = &result.data;

    let symbols = symbol_positions(data);
    assert_eq!(symbols.len(), 1);
    let record = symbols[0];
    assert_eq!(read_i32(data, record + 4), 101_000); // number
    assert_eq!(data[record + 8], 1); // point type

    let entries = object_entries(data, 9);
    assert_eq!(entries.len(), 1);
    let entry = entries[0];
    assert_eq!(read_i32(data, entry + 24), 101_000); // symbol
    assert_eq!(data[entry + 28], 1); // object type
    assert_eq!(data[entry + 30], 1); // status

    // Record head and the single coordinate behind it.
    let object = read_u32(data, entry + 16) as usize;
    assert_eq!(read_i32(data, object), 101_000);
    assert_eq!(data[object + 4], 1);
    assert_eq!(read_u32(data, object + 8), 1); // num_items
    assert_eq!(read_i32(data, object + 32), 1000 << 8); // 10 mm
    assert_eq!(read_i32(data, object + 36), 500 << 8); // -5 mm, y inverted
}

#[test]
fn test_v8_symbol_and_object_roundtrip() {
    let result = export(&dot_map(), 8, &ExportOptions::default()).unwrap();
    let data = &result.data;

    assert_eq!(data[2], 2); // file type of a version 8 map
    assert_eq!(read_u16(data, 4), 8);

    let symbols = symbol_positions(data);
    assert_eq!(symbols.len(), 1);
    assert_eq!(read_i16(data, symbols[0] + 2), 1010); // number, factor 10

    let entries = object_entries(data, 8);
    assert_eq!(entries.len(), 1);
    let entry = entries[0];
    assert_eq!(read_i16(data, entry + 22), 1010); // symbol
    let object = read_u32(data, entry + 16) as usize;
    assert_eq!(read_i16(data, object), 1010);
    assert_eq!(data[object + 2], 1); // object type
    assert_eq!(read_u16(data, object + 4), 1); // num_items
    // One coordinate after the 24-byte head.
    assert_eq!(read_u16(data, entry + 20), 1); // entry size in units
    assert_eq!(read_i32(data, object + 24), 1000 << 8);
}

#[test]
fn test_duplicate_symbol_numbers_are_bumped() {
    let mut map = dot_map();
    let duplicate = map.symbols[0].clone();
    map.symbols.push(duplicate);

    let result = export(&map, 9, &ExportOptions::default()).unwrap();
    let numbers: Vec<i32> = symbol_positions(&result.data)
        .iter()
        .map(|&pos| read_i32(&result.data, pos + 4))
        .collect();
    assert_eq!(numbers, vec![101_000, 101_001]);
}

#[test]
fn test_v9_parameter_strings_present() {
    let result = export(&dot_map(), 9, &ExportOptions::default()).unwrap();
    let types = string_types(&result.data);
    assert!(types.contains(&1039)); // scale
    assert!(types.contains(&11)); // notes
    assert!(types.contains(&9)); // the one color
    assert_eq!(types.iter().filter(|&&t| t == 9).count(), 1);
}

#[test]
fn test_v11_uses_other_notes_type() {
    let mut map = dot_map();
    map.notes = "control descriptions pending".to_string();
    let result = export(&map, 11, &ExportOptions::default()).unwrap();
    let types = string_types(&result.data);
    assert!(types.contains(&1061));
    assert!(!types.contains(&11));
}

#[test]
fn test_v8_notes_truncated() {
    let mut map = dot_map();
    map.notes = "a".repeat(40_000);
    let result = export(&map, 8, &ExportOptions::default()).unwrap();
    assert!(result.warnings.iter().any(|w| w.contains("truncated")));

    let info_pos = read_u32(&result.data, 24) as usize;
    let info_size = read_u32(&result.data, 28) as usize;
    assert_eq!(info_size, 32_768);
    assert_eq!(result.data[info_pos + info_size - 1], 0);
}

/// A combined symbol holding a private area fill and a private border line.
fn combined_area_map() -> Map {
    let mut map = Map::default();
    map.colors
        .push(MapColor::new("Green", Cmyk::new(0.76, 0.0, 0.91, 0.0)));
    let fill = Symbol::new(
        [201, 0],
        "fill",
        SymbolKind::Area(AreaSymbol {
            color: Some(ColorRef::Map(0)),
            patterns: Vec::new(),
        }),
    );
    let edge = Symbol::new(
        [201, 0],
        "edge",
        SymbolKind::Line(LineSymbol {
            color: Some(ColorRef::Map(0)),
            line_width: 100,
            ..Default::default()
        }),
    );
    map.symbols.push(Symbol::new(
        [201, 0],
        "Settlement",
        SymbolKind::Combined(CombinedSymbol {
            parts: vec![
                CombinedPart {
                    symbol: PartRef::Private(Box::new(fill)),
                    private: true,
                },
                CombinedPart {
                    symbol: PartRef::Private(Box::new(edge)),
                    private: true,
                },
            ],
        }),
    ));
    map
}

#[test]
fn test_combined_area_with_border_v9() {
    let result = export(&combined_area_map(), 9, &ExportOptions::default()).unwrap();
    let data = &result.data;
    assert!(!result.warnings.iter().any(|w| w.contains("Unhandled")));

    // The border line comes first, then the area referencing it.
    let symbols = symbol_positions(data);
    assert_eq!(symbols.len(), 2);
    let border = symbols[0];
    let area = symbols[1];
    assert_eq!(data[border + 8], 2); // line type
    assert_eq!(read_i32(data, border + 4), 201_001);
    assert_eq!(data[area + 8], 3); // area type
    assert_eq!(read_i32(data, area + 4), 201_000);

    // Area record: border enabled, border symbol number filled in.
    assert_eq!(data[area + 568], 1);
    assert_eq!(read_i32(data, area + 568 + 24), 201_001);
}

#[test]
fn test_combined_area_with_border_v8_dropped() {
    let result = export(&combined_area_map(), 8, &ExportOptions::default()).unwrap();
    assert!(
        result
            .warnings
            .iter()
            .any(|w| w.contains("Unhandled combined symbol: Settlement"))
    );
    assert!(symbol_positions(&result.data).is_empty());
}

fn text_object(x_mm: f64, h_align: HorizontalAlignment) -> Object {
    Object {
        symbol: 0,
        kind: ObjectKind::Text(TextObject {
            text: String::new(),
            anchor: MapCoord::from_mm(x_mm, 0.0),
            rotation: 0.0,
            h_align,
            v_align: Default::default(),
            box_size: None,
            lines: Vec::new(),
        }),
    }
}

#[test]
fn test_text_symbol_record_per_alignment() {
    let mut map = Map::default();
    map.colors.push(MapColor::new("Black", Cmyk::new(0.0, 0.0, 0.0, 1.0)));
    map.symbols.push(Symbol::new(
        [512, 0],
        "Label",
        SymbolKind::Text(TextSymbol {
            color: Some(ColorRef::Map(0)),
            ..Default::default()
        }),
    ));
    let mut part = MapPart::default();
    part.objects.push(text_object(10.0, HorizontalAlignment::Left));
    part.objects
        .push(text_object(20.0, HorizontalAlignment::Center));
    map.parts.push(part);

    let result = export(&map, 9, &ExportOptions::default()).unwrap();
    let data = &result.data;

    // One record per alignment in use, with bumped numbers.
    let symbols = symbol_positions(data);
    assert_eq!(symbols.len(), 2);
    assert_eq!(read_i32(data, symbols[0] + 4), 512_000);
    assert_eq!(read_i32(data, symbols[1] + 4), 512_001);
    assert_eq!(data[symbols[0] + 8], 4); // text type

    // Each object references its alignment's record.
    let entries = object_entries(data, 9);
    assert_eq!(entries.len(), 2);
    assert_eq!(read_i32(data, entries[0] + 24), 512_000);
    assert_eq!(read_i32(data, entries[1] + 24), 512_001);
}

#[test]
fn test_registration_color_shifts_table() {
    let mut map = dot_map();
    map.symbols.push(Symbol::new(
        [999, 0],
        "Registration mark",
        SymbolKind::Point(PointSymbol {
            inner_radius: 250,
            inner_color: Some(ColorRef::Registration),
            ..Default::default()
        }),
    ));

    let result = export(&map, 9, &ExportOptions::default()).unwrap();
    assert!(
        result
            .warnings
            .iter()
            .any(|w| w.contains("Registration black"))
    );
    // Registration takes entry 0, the map color moves to entry 1. The dot
    // symbol's color mask (offset 20 of the record head) has bit 1 set.
    let symbols = symbol_positions(&result.data);
    assert_eq!(symbols.len(), 2);
    let dot = symbols[0];
    assert_eq!(result.data[dot + 20], 0b10);

    // Two color definitions in the string index.
    let types = string_types(&result.data);
    assert_eq!(types.iter().filter(|&&t| t == 9).count(), 2);
}
