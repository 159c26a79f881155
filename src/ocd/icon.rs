//! Symbol icon rasterization into the fixed per-version icon buffers.
//!
//! Icons are 22x22 pixels with the origin at the bottom left (rows are
//! written bottom to top). Version 8 packs two 4-bit palette indices per
//! byte with ordered dithering; version 9 and later store one 8-bit palette
//! index per pixel. Input pixels are premultiplied RGBA and get composited
//! over white first.

use crate::map::symbol::{ICON_SIZE, IconImage};

use super::palette::{gray, palette_color_v6, palette_color_v9, rgb_to_hsv};

/// Byte size of the packed 4-bit icon (11 data bytes + 1 padding per row).
pub const ICON_BYTES_V6: usize = 264;
/// Byte size of the 8-bit icon.
pub const ICON_BYTES_V9: usize = 484;

/// Ordered dithering 2x2 threshold matrix, adjusted for o-map halftones
const THRESHOLD: [i32; 4] = [24, 192, 136, 80];

fn composited(icon: Option<&IconImage>, x: usize, y: usize) -> (u8, u8, u8) {
    let Some(icon) = icon else {
        return (255, 255, 255);
    };
    // Apply premultiplied pixel on white background
    let [r, g, b, a] = icon.pixel(x, y);
    let over = |c: u8| (255 - a as i32 + c as i32).clamp(0, 255) as u8;
    (over(r), over(g), over(b))
}

fn dithered_pixel_v6(icon: Option<&IconImage>, x: usize, y: usize) -> u8 {
    let (r, g, b) = composited(icon, x, y);
    let threshold = THRESHOLD[x % 2 + 2 * (y % 2)];
    match palette_color_v6(r, g, b) {
        // Black to gray (50%)
        0 => {
            if gray(r, g, b) < 128 - threshold / 2 {
                0
            } else {
                7
            }
        },
        // Gray (50%) to light gray
        7 => {
            if gray(r, g, b) < 192 - threshold / 4 {
                7
            } else {
                8
            }
        },
        // Light gray to white
        8 => {
            if gray(r, g, b) < 256 - threshold / 4 {
                8
            } else {
                15
            }
        },
        // Pure white
        15 => 15,
        // Color to white
        color => {
            if rgb_to_hsv(r, g, b).saturation >= threshold {
                color
            } else {
                15
            }
        },
    }
}

/// Rasterize into the 4-bit packed icon buffer of version 8 files.
pub fn rasterize_v6(icon: Option<&IconImage>, out: &mut [u8; ICON_BYTES_V6]) {
    let mut pos = 0;
    for y in (0..ICON_SIZE).rev() {
        for x in (0..ICON_SIZE).step_by(2) {
            let first = dithered_pixel_v6(icon, x, y);
            let second = dithered_pixel_v6(icon, x + 1, y);
            out[pos] = (first << 4) + second;
            pos += 1;
        }
        pos += 1; // row padding byte
    }
}

/// Rasterize into the 8-bit icon buffer of version 9 and later files.
pub fn rasterize_v9(icon: Option<&IconImage>, out: &mut [u8; ICON_BYTES_V9]) {
    let mut pos = 0;
    for y in (0..ICON_SIZE).rev() {
        for x in 0..ICON_SIZE {
            let (r, g, b) = composited(icon, x, y);
            out[pos] = palette_color_v9(r, g, b);
            pos += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_icon_is_all_white() {
        let mut v6 = [0u8; ICON_BYTES_V6];
        rasterize_v6(None, &mut v6);
        for (i, byte) in v6.iter().enumerate() {
            if i % 12 == 11 {
                assert_eq!(*byte, 0, "padding byte {i}");
            } else {
                assert_eq!(*byte, 0xff, "data byte {i}"); // two white nibbles
            }
        }

        let mut v9 = [0u8; ICON_BYTES_V9];
        rasterize_v9(None, &mut v9);
        assert!(v9.iter().all(|&b| b == 124));
    }

    #[test]
    fn test_bottom_row_written_first() {
        let mut icon = IconImage::white();
        // Black pixel at the bottom-left corner (x=0, y=21).
        icon.set_pixel(0, ICON_SIZE - 1, [0, 0, 0, 255]);

        let mut v9 = [0u8; ICON_BYTES_V9];
        rasterize_v9(Some(&icon), &mut v9);
        assert_eq!(v9[0], 0);
        assert_eq!(v9[1], 124);

        let mut v6 = [0u8; ICON_BYTES_V6];
        rasterize_v6(Some(&icon), &mut v6);
        // First byte holds pixels (0,21) and (1,21): black nibble then white.
        assert_eq!(v6[0], 0x0f);
    }

    #[test]
    fn test_alpha_composites_over_white() {
        let mut icon = IconImage::white();
        // Fully transparent pixel must render as white.
        icon.set_pixel(0, ICON_SIZE - 1, [0, 0, 0, 0]);
        let mut v9 = [0u8; ICON_BYTES_V9];
        rasterize_v9(Some(&icon), &mut v9);
        assert_eq!(v9[0], 124);
    }
}
