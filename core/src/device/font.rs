//! VDG character generator data.
//!
//! The MC6847 internal set holds 64 glyphs covering ASCII 0x40-0x5F
//! followed by 0x20-0x3F. Each glyph is a 5×7 bitmap centered in an 8×12 character
//! cell. Semigraphics tile bitmaps are derived at compile time from the
//! block geometry instead of being stored.

pub const FONT_WIDTH: usize = 8;
pub const FONT_HEIGHT: usize = 12;

/// 5×7 glyph rows, MSB-left in the low 5 bits.
const GLYPHS_5X7: [[u8; 7]; 64] = [
    // 0x00: @
    [0b01110, 0b10001, 0b00001, 0b01101, 0b10101, 0b10101, 0b01110],
    // 0x01-0x1A: A-Z
    [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
    [0b11110, 0b10001, 0b11110, 0b10001, 0b10001, 0b10001, 0b11110],
    [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
    [0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110],
    [0b11111, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000, 0b11111],
    [0b11111, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000, 0b10000],
    [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111],
    [0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001, 0b10001],
    [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
    [0b00001, 0b00001, 0b00001, 0b00001, 0b10001, 0b10001, 0b01110],
    [0b10001, 0b10010, 0b11100, 0b10010, 0b10001, 0b10001, 0b10001],
    [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
    [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
    [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001],
    [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
    [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
    [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
    [0b11110, 0b10001, 0b10001, 0b11110, 0b10010, 0b10001, 0b10001],
    [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
    [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
    [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
    [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
    [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b11011, 0b10001],
    [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
    [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100],
    [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
    // 0x1B-0x1F: [ \ ] up-arrow left-arrow
    [0b01110, 0b01000, 0b01000, 0b01000, 0b01000, 0b01000, 0b01110],
    [0b00000, 0b10000, 0b01000, 0b00100, 0b00010, 0b00001, 0b00000],
    [0b01110, 0b00010, 0b00010, 0b00010, 0b00010, 0b00010, 0b01110],
    [0b00100, 0b01110, 0b10101, 0b00100, 0b00100, 0b00100, 0b00100],
    [0b00000, 0b00100, 0b01000, 0b11111, 0b01000, 0b00100, 0b00000],
    // 0x20: space
    [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000],
    // 0x21-0x2F: ! " # $ % & ' ( ) * + , - . /
    [0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00000, 0b00100],
    [0b01010, 0b01010, 0b01010, 0b00000, 0b00000, 0b00000, 0b00000],
    [0b01010, 0b01010, 0b11111, 0b01010, 0b11111, 0b01010, 0b01010],
    [0b00100, 0b01111, 0b10100, 0b01110, 0b00101, 0b11110, 0b00100],
    [0b11000, 0b11001, 0b00010, 0b00100, 0b01000, 0b10011, 0b00011],
    [0b01100, 0b10010, 0b10100, 0b01000, 0b10101, 0b10010, 0b01101],
    [0b00100, 0b00100, 0b01000, 0b00000, 0b00000, 0b00000, 0b00000],
    [0b00010, 0b00100, 0b01000, 0b01000, 0b01000, 0b00100, 0b00010],
    [0b01000, 0b00100, 0b00010, 0b00010, 0b00010, 0b00100, 0b01000],
    [0b00000, 0b00100, 0b10101, 0b01110, 0b10101, 0b00100, 0b00000],
    [0b00000, 0b00100, 0b00100, 0b11111, 0b00100, 0b00100, 0b00000],
    [0b00000, 0b00000, 0b00000, 0b00000, 0b00100, 0b00100, 0b01000],
    [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000],
    [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100],
    [0b00000, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b00000],
    // 0x30-0x39: digits
    [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
    [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
    [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
    [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
    [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
    [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
    [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
    [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
    [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
    [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
    // 0x3A-0x3F: : ; < = > ?
    [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b01100, 0b00000],
    [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b00100, 0b01000],
    [0b00010, 0b00100, 0b01000, 0b10000, 0b01000, 0b00100, 0b00010],
    [0b00000, 0b00000, 0b11111, 0b00000, 0b11111, 0b00000, 0b00000],
    [0b01000, 0b00100, 0b00010, 0b00001, 0b00010, 0b00100, 0b01000],
    [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b00000, 0b00100],
];

/// 64 glyphs expanded into full 8×12 cell rows: two blank rows above, three
/// below, glyph shifted into bits 6:2.
pub const FONT: [[u8; FONT_HEIGHT]; 64] = {
    let mut table = [[0u8; FONT_HEIGHT]; 64];
    let mut glyph = 0;
    while glyph < 64 {
        let mut row = 0;
        while row < 7 {
            table[glyph][row + 2] = GLYPHS_5X7[glyph][row] << 2;
            row += 1;
        }
        glyph += 1;
    }
    table
};

/// Semigraphics-4 tiles: 2×2 luminance quadrants per cell, bit 3 top-left,
/// bit 2 top-right, bit 1 bottom-left, bit 0 bottom-right.
pub const SEMIGRAPH_4: [[u8; FONT_HEIGHT]; 16] = {
    let mut table = [[0u8; FONT_HEIGHT]; 16];
    let mut tile = 0;
    while tile < 16 {
        let mut row = 0;
        while row < FONT_HEIGHT {
            let (left, right) = if row < FONT_HEIGHT / 2 {
                (tile & 0x08, tile & 0x04)
            } else {
                (tile & 0x02, tile & 0x01)
            };
            let mut bits = 0u8;
            if left != 0 {
                bits |= 0xF0;
            }
            if right != 0 {
                bits |= 0x0F;
            }
            table[tile][row] = bits;
            row += 1;
        }
        tile += 1;
    }
    table
};

/// Semigraphics-6 tiles: 2×3 luminance blocks per cell, bit 5 top-left down
/// to bit 0 bottom-right.
pub const SEMIGRAPH_6: [[u8; FONT_HEIGHT]; 64] = {
    let mut table = [[0u8; FONT_HEIGHT]; 64];
    let mut tile = 0;
    while tile < 64 {
        let mut row = 0;
        while row < FONT_HEIGHT {
            let band = row / (FONT_HEIGHT / 3);
            let left_bit = 5 - band * 2;
            let (left, right) = (tile >> left_bit & 1, tile >> (left_bit - 1) & 1);
            let mut bits = 0u8;
            if left != 0 {
                bits |= 0xF0;
            }
            if right != 0 {
                bits |= 0x0F;
            }
            table[tile][row] = bits;
            row += 1;
        }
        tile += 1;
    }
    table
};
