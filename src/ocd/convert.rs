//! Numeric conversion layer: map-space reals to OCD fixed-point integers.
//!
//! OCD coordinates are 24-bit fixed point values shifted left by 8 bits,
//! with per-point flags in the freed low byte, at a resolution of 0.01 mm.
//! Map coordinates come in at 0.001 mm, so every conversion divides by 10.

use crate::map::MapCoord;

use super::records::OcdPoint;

/// Convert one native coordinate component (micrometers) to the 24-bit
/// fixed-point representation, scaled by 1/10 and shifted left 8 bits.
///
/// Rounds half up for both signs: -5 rounds up to 0, -6 rounds down to -1.
pub const fn convert_point_member(value: i32) -> i32 {
    if value < -5 {
        (0x8000_0000u32 | ((0x007f_ffffu32 & (((value - 4) / 10) as u32)) << 8)) as i32
    } else {
        ((0x007f_ffffu32 & (((value + 5) / 10) as u32)) << 8) as i32
    }
}

/// Convert a coordinate pair, inverting the Y axis (map Y-up, format Y-down).
pub const fn convert_point_xy(x: i32, y: i32) -> OcdPoint {
    OcdPoint {
        x: convert_point_member(x),
        y: convert_point_member(-y),
    }
}

/// Convert a map coordinate, dropping its flags.
pub const fn convert_point(coord: MapCoord) -> OcdPoint {
    convert_point_xy(coord.x, coord.y)
}

/// Convert an unsigned-domain size (micrometers) to 0.01 mm units.
pub const fn convert_size(size: i32) -> i32 {
    (size + 5) / 10
}

/// Convert a rotation in radians to tenths of a degree.
pub fn convert_rotation(angle: f32) -> i32 {
    (10.0 * f64::from(angle).to_degrees()).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    // convert_point_member() shall round half up for both signs.
    #[test]
    fn test_point_member_rounds_half_up() {
        assert_eq!(convert_point_member(-16), 0xffff_fe00u32 as i32); // down
        assert_eq!(convert_point_member(-15), 0xffff_ff00u32 as i32); // up
        assert_eq!(convert_point_member(-6), 0xffff_ff00u32 as i32); // down
        assert_eq!(convert_point_member(-5), 0); // up
        assert_eq!(convert_point_member(-1), 0); // up
        assert_eq!(convert_point_member(0), 0); // unchanged
        assert_eq!(convert_point_member(1), 0); // down
        assert_eq!(convert_point_member(4), 0); // down
        assert_eq!(convert_point_member(5), 0x0000_0100); // up
        assert_eq!(convert_point_member(14), 0x0000_0100); // down
        assert_eq!(convert_point_member(15), 0x0000_0200); // up
    }

    #[test]
    fn test_point_member_boundaries_every_five() {
        // Expected unit value for every multiple of 5 in [-20, 20].
        let cases = [
            (-20, -2),
            (-15, -1),
            (-10, -1),
            (-5, 0),
            (0, 0),
            (5, 1),
            (10, 1),
            (15, 2),
            (20, 2),
        ];
        for (input, unit) in cases {
            assert_eq!(
                convert_point_member(input) >> 8,
                unit,
                "convert_point_member({input})"
            );
        }
    }

    #[test]
    fn test_point_inverts_y() {
        let p = convert_point_xy(15, 15);
        assert_eq!(p.x >> 8, 2);
        assert_eq!(p.y >> 8, -1); // -15 rounds up to -1
    }

    #[test]
    fn test_size() {
        assert_eq!(convert_size(0), 0);
        assert_eq!(convert_size(4), 0);
        assert_eq!(convert_size(5), 1);
        assert_eq!(convert_size(14), 1);
        assert_eq!(convert_size(15), 2);
        assert_eq!(convert_size(350), 35);
    }

    #[test]
    fn test_rotation() {
        assert_eq!(convert_rotation(0.0), 0);
        assert_eq!(convert_rotation(std::f32::consts::PI), 1800);
        assert_eq!(convert_rotation(-std::f32::consts::FRAC_PI_2), -900);
        assert_eq!(convert_rotation(std::f32::consts::FRAC_PI_4), 450);
    }
}
