//! Nearest-color searches over the fixed OCD icon palettes.
//!
//! Version 8 icons use a 16-entry palette searched in HSV space with
//! distance multipliers tuned for orienteering map colors; version 9 and
//! later use a uniform 5x5x5 RGB cube. Both searches keep the first minimal
//! distance, so candidate order is part of the contract.

/// HSV triple with Qt semantics: hue 0..=359 or `None` for achromatic,
/// saturation and value 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsv {
    pub hue: Option<i32>,
    pub saturation: i32,
    pub value: i32,
}

/// Convert RGB to HSV with Qt semantics.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> Hsv {
    let max = r.max(g).max(b) as i32;
    let min = r.min(g).min(b) as i32;
    let delta = max - min;
    if delta == 0 {
        return Hsv {
            hue: None,
            saturation: 0,
            value: max,
        };
    }

    let (r, g, b) = (r as i32, g as i32, b as i32);
    let mut hue = if max == r {
        60.0 * f64::from(g - b) / f64::from(delta)
    } else if max == g {
        120.0 + 60.0 * f64::from(b - r) / f64::from(delta)
    } else {
        240.0 + 60.0 * f64::from(r - g) / f64::from(delta)
    };
    if hue < 0.0 {
        hue += 360.0;
    }
    Hsv {
        hue: Some((hue.round() as i32).rem_euclid(360)),
        saturation: ((255.0 * f64::from(delta) / f64::from(max)).round()) as i32,
        value: max,
    }
}

/// Luminance as computed by Qt's `qGray`, used for dithering decisions.
#[inline]
pub fn gray(r: u8, g: u8, b: u8) -> i32 {
    (r as i32 * 11 + g as i32 * 16 + b as i32 * 5) / 32
}

/// The 16-entry palette in HSV; hue `None` marks achromatic entries.
const PALETTE_V6: [(Option<i32>, i32, i32); 16] = [
    (None, 0, 0),         //  0 black
    (Some(0), 255, 128),  //  1 dark red
    (Some(120), 255, 128),//  2 dark green
    (Some(60), 255, 128), //  3 olive
    (Some(240), 255, 128),//  4 dark blue
    (Some(300), 255, 128),//  5 purple
    (Some(180), 255, 128),//  6 teal
    (None, 0, 128),       //  7 gray
    (None, 0, 192),       //  8 light gray
    (Some(0), 255, 255),  //  9 red
    (Some(120), 255, 255),// 10 green
    (Some(60), 255, 255), // 11 yellow
    (Some(240), 255, 255),// 12 blue
    (Some(300), 255, 255),// 13 magenta
    (Some(180), 255, 255),// 14 cyan
    (None, 0, 255),       // 15 white
];

/// Chromatic candidate indices, in search order.
const CHROMATIC_V6: [usize; 12] = [1, 2, 3, 4, 5, 6, 9, 10, 11, 12, 13, 14];

/// Nearest 16-entry palette index for an opaque RGB color.
pub fn palette_color_v6(r: u8, g: u8, b: u8) -> u8 {
    // Quickly return for most frequent value
    if (r, g, b) == (255, 255, 255) {
        return 15;
    }

    let color = rgb_to_hsv(r, g, b);
    let Some(hue) = color.hue else {
        return gray_index_v6(r, g, b);
    };
    if color.saturation < 32 {
        return gray_index_v6(r, g, b);
    }

    let sq = |n: i32| i64::from(n) * i64::from(n);
    let mut best_index = 0u8;
    let mut best_distance: i64 = 2_100_000; // > 6 * (10*sq(180) + sq(128) + sq(64))
    for i in CHROMATIC_V6 {
        let (palette_hue, palette_sat, palette_value) = PALETTE_V6[i];
        let hue_dist = (hue - palette_hue.unwrap()).abs();
        let mut distance = 10 * sq(hue_dist.min(360 - hue_dist))
            + sq(color.saturation - palette_sat)
            + sq(color.value - palette_value);

        // Manual tweaking for orienteering color frequency
        distance *= match i {
            1 => 3,  // dark red
            3 => 4,  // olive
            11 => 4, // yellow
            9 => 6,  // red is unlikely
            _ => 2,
        };

        if distance < best_distance {
            best_distance = distance;
            best_index = i as u8;
        }
    }
    best_index
}

fn gray_index_v6(r: u8, g: u8, b: u8) -> u8 {
    match gray(r, g, b) {
        192.. => 8,
        128.. => 7,
        _ => 0,
    }
}

/// The five channel levels of the 5x5x5 cube palette.
const LEVELS_V9: [i32; 5] = [0x00, 0x40, 0x80, 0xc0, 0xff];

/// Nearest 125-entry cube palette index for an opaque RGB color.
///
/// Entry `i` is `(LEVELS[i/25], LEVELS[i/5 % 5], LEVELS[i % 5])`; blue
/// varies fastest. White is entry 124.
pub fn palette_color_v9(r: u8, g: u8, b: u8) -> u8 {
    // Quickly return most frequent value
    if (r, g, b) == (255, 255, 255) {
        return 124;
    }

    let (r, g, b) = (r as i32, g as i32, b as i32);
    let sq = |n: i32| n * n;
    let mut best_index = 0u8;
    let mut best_distance = 10_000; // > (2 + 3 + 4) * sq(32)
    let mut i = 0u8;
    for pr in LEVELS_V9 {
        for pg in LEVELS_V9 {
            for pb in LEVELS_V9 {
                let distance = 2 * sq(r - pr) + 4 * sq(g - pg) + 3 * sq(b - pb);
                if distance < best_distance {
                    best_distance = distance;
                    best_index = i;
                }
                i = i.wrapping_add(1);
            }
        }
    }
    best_index
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hsv_primaries() {
        assert_eq!(
            rgb_to_hsv(255, 0, 0),
            Hsv {
                hue: Some(0),
                saturation: 255,
                value: 255
            }
        );
        assert_eq!(rgb_to_hsv(0, 255, 0).hue, Some(120));
        assert_eq!(rgb_to_hsv(0, 0, 255).hue, Some(240));
        assert_eq!(rgb_to_hsv(128, 128, 128).hue, None);
        assert_eq!(rgb_to_hsv(0, 0, 0).value, 0);
    }

    #[test]
    fn test_v6_white_fast_path_and_grays() {
        assert_eq!(palette_color_v6(255, 255, 255), 15);
        assert_eq!(palette_color_v6(0, 0, 0), 0);
        assert_eq!(palette_color_v6(128, 128, 128), 7);
        assert_eq!(palette_color_v6(192, 192, 192), 8);
    }

    #[test]
    fn test_v6_saturated_colors() {
        assert_eq!(palette_color_v6(0, 255, 0), 10); // green
        assert_eq!(palette_color_v6(0, 0, 255), 12); // blue
        assert_eq!(palette_color_v6(255, 255, 0), 11); // yellow
        assert_eq!(palette_color_v6(0, 255, 255), 14); // cyan
        assert_eq!(palette_color_v6(0, 128, 0), 2); // dark green
    }

    #[test]
    fn test_v9_white_fast_path_and_corners() {
        assert_eq!(palette_color_v9(255, 255, 255), 124);
        assert_eq!(palette_color_v9(0, 0, 0), 0);
        assert_eq!(palette_color_v9(0, 0, 255), 4);
        assert_eq!(palette_color_v9(255, 0, 0), 100);
        assert_eq!(palette_color_v9(0, 255, 0), 20);
    }

    #[test]
    fn test_v9_idempotent_on_palette_members() {
        // Re-quantizing a palette RGB value returns the same entry.
        for (i, pr) in LEVELS_V9.iter().enumerate() {
            for (j, pg) in LEVELS_V9.iter().enumerate() {
                for (k, pb) in LEVELS_V9.iter().enumerate() {
                    let index = (i * 25 + j * 5 + k) as u8;
                    assert_eq!(palette_color_v9(*pr as u8, *pg as u8, *pb as u8), index);
                }
            }
        }
    }

    proptest! {
        #[test]
        fn prop_v6_deterministic(r: u8, g: u8, b: u8) {
            let first = palette_color_v6(r, g, b);
            prop_assert_eq!(palette_color_v6(r, g, b), first);
            prop_assert!(first < 16);
        }

        #[test]
        fn prop_v9_deterministic(r: u8, g: u8, b: u8) {
            let first = palette_color_v9(r, g, b);
            prop_assert_eq!(palette_color_v9(r, g, b), first);
            prop_assert!(first < 125);
        }
    }
}
