//! Parameter string payloads for version 9 and later files.
//!
//! Parameter strings are tab-separated key-value runs: a first field with
//! free text, then one-letter keys directly followed by their value. Only
//! the string types written by the exporter are covered here; the string
//! records and their index are assembled in [`super::file`].

use crate::map::color::MapColor;
use crate::map::geo::{Georeferencing, GridUnit, MapGrid};

use super::records::OcdVersion;

/// Parameter string type of a color definition.
pub const STRING_TYPE_COLOR: i32 = 9;
/// Parameter string type of the scale and grid setup.
pub const STRING_TYPE_SCALE: i32 = 1039;

/// Format a type 9 color definition for color table entry `number`.
pub fn string_for_color(number: i32, color: &MapColor) -> String {
    let percent = |v: f32| (f64::from(v) * 100.0).round() as i32;
    format!(
        "{}\tn{}\tc{}\tm{}\ty{}\tk{}\to{}\tt{}",
        color.name,
        number,
        percent(color.cmyk.c),
        percent(color.cmyk.m),
        percent(color.cmyk.y),
        percent(color.cmyk.k),
        // The o flag enables overprinting, so knockout colors write 0.
        i32::from(!color.knockout),
        percent(color.opacity),
    )
}

/// Grid spacing as `(meters in terrain, millimeters on map)`.
pub fn grid_spacing(grid: &MapGrid, scale_denominator: u32) -> (f64, f64) {
    let spacing = grid.horizontal_spacing.min(grid.vertical_spacing);
    let factor = f64::from(scale_denominator) / 1000.0;
    match grid.unit {
        GridUnit::MillimetersOnMap => (spacing * factor, spacing),
        GridUnit::MetersInTerrain => (spacing, spacing / factor),
    }
}

/// Format the type 1039 scale parameter string.
pub fn string_for_scale(
    georef: &Georeferencing,
    grid: &MapGrid,
    version: OcdVersion,
) -> String {
    let (real_spacing, map_spacing) = grid_spacing(grid, georef.scale_denominator);
    let ref_point = georef.to_projected(0.0, 0.0);
    let mut string = format!(
        "\tm{}\tg{:.4}\tr1\tx{}\ty{}\ta{:.8}\td{:.6}\ti0",
        georef.scale_denominator,
        map_spacing,
        ref_point.0.round() as i64,
        ref_point.1.round() as i64,
        georef.grivation_deg,
        real_spacing,
    );
    if version > OcdVersion::V9 {
        string.push_str("\tb0.00\tc0.00");
    }
    string
}
