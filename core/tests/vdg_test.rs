//! VDG mode decode and rendering.

use dragon_core::device::font::{FONT, FONT_HEIGHT, FONT_WIDTH};
use dragon_core::device::vdg::{
    RenderError, Vdg, FB_BLACK, FB_GREEN, FB_WHITE, FB_YELLOW, FRAME_SIZE, SCREEN_WIDTH,
};
use dragon_core::device::VideoMode;

/// 64 KiB backing store standing in for the bus.
fn ram_with(base: u16, data: &[u8]) -> Vec<u8> {
    let mut ram = vec![0u8; 0x10000];
    ram[base as usize..base as usize + data.len()].copy_from_slice(data);
    ram
}

fn render(vdg: &mut Vdg, ram: &[u8]) {
    vdg.render(|addr| ram[addr as usize]).expect("renderable mode");
}

#[test]
fn mode_truth_table() {
    use VideoMode::*;
    // (sam, pia, expected); pia bits: 4=G 3:1=GM 0=CSS
    let table = [
        (0, 0x00, AlphaInternal),
        (0, 0x02, AlphaExternal),
        (2, 0x00, SemiGraphics8),
        (4, 0x00, SemiGraphics12),
        (6, 0x00, SemiGraphics24),
        (1, 0x10, Graphics1C),
        (1, 0x12, Graphics1R),
        (2, 0x14, Graphics2C),
        (3, 0x16, Graphics2R),
        (4, 0x18, Graphics3C),
        (5, 0x1A, Graphics3R),
        (6, 0x1C, Graphics6C),
        (6, 0x1E, Graphics6R),
        (7, 0x00, Dma),
        (7, 0x1E, Dma),
    ];
    let mut vdg = Vdg::new();
    for (sam, pia, expected) in table {
        vdg.set_sam_mode(sam);
        vdg.set_pia_mode(pia);
        assert_eq!(vdg.current_mode(), expected, "sam={sam} pia=0x{pia:02x}");
    }
}

#[test]
fn dma_mode_is_an_error() {
    let mut vdg = Vdg::new();
    vdg.set_sam_mode(7);
    let err = vdg.render(|_| 0).unwrap_err();
    assert_eq!(err, RenderError::DmaMode);
}

#[test]
fn render_is_idempotent() {
    let mut vdg = Vdg::new();
    let ram = ram_with(0x0400, &[0x55; 512]);
    render(&mut vdg, &ram);
    let first = *vdg.frame();
    render(&mut vdg, &ram);
    assert!(first[..] == vdg.frame()[..]);
}

#[test]
fn alpha_cell_renders_glyph_green_on_black() {
    let mut vdg = Vdg::new();
    // Code 0x15 is the glyph 'U' with the inverse bit clear.
    let ram = ram_with(0x0400, &[0x15]);
    render(&mut vdg, &ram);

    let frame = vdg.frame();
    let glyph = &FONT[0x15];
    for row in 0..FONT_HEIGHT {
        for col in 0..FONT_WIDTH {
            let pixel = frame[row * SCREEN_WIDTH + col];
            let lit = glyph[row] & (0x80 >> col) != 0;
            assert_eq!(
                pixel,
                if lit { FB_GREEN } else { FB_BLACK },
                "row {row} col {col}"
            );
        }
    }
}

#[test]
fn alpha_inverse_swaps_colors() {
    let mut vdg = Vdg::new();
    // 0x55 carries the inverse bit (0x40): black glyph on green cell.
    let ram = ram_with(0x0400, &[0x55]);
    render(&mut vdg, &ram);
    // Row 0 of every glyph cell is blank, so inverse paints foreground.
    assert_eq!(vdg.frame()[0], FB_GREEN);

    let ram = ram_with(0x0400, &[0x15]);
    render(&mut vdg, &ram);
    assert_eq!(vdg.frame()[0], FB_BLACK);
}

#[test]
fn css_selects_buff_foreground() {
    let mut vdg = Vdg::new();
    vdg.set_pia_mode(0x01);
    let ram = ram_with(0x0400, &[0x55 | 0x40]); // inverse: row 0 shows fg
    render(&mut vdg, &ram);
    assert_eq!(vdg.frame()[0], FB_WHITE);
}

#[test]
fn semigraphics4_quadrants_and_color() {
    let mut vdg = Vdg::new();
    // Tile 0x08 = top-left quadrant lit; color bits 110 = magenta slot,
    // here color index 6 of the VDG set.
    let ram = ram_with(0x0400, &[0x80 | 0x60 | 0x08]);
    render(&mut vdg, &ram);
    let frame = vdg.frame();

    let fg = frame[0];
    assert_ne!(fg, FB_BLACK, "top-left lit");
    assert_eq!(frame[4], FB_BLACK, "top-right dark");
    assert_eq!(frame[6 * SCREEN_WIDTH], FB_BLACK, "bottom-left dark");
}

#[test]
fn video_offset_moves_the_window() {
    let mut vdg = Vdg::new();
    vdg.set_video_offset(0x04); // base 0x0800
    let ram = ram_with(0x0800, &[0x40]); // inverse space: solid cell
    render(&mut vdg, &ram);
    assert_eq!(vdg.frame()[0], FB_GREEN);
}

#[test]
fn resolution_graphics_6r_one_bit_per_pixel() {
    let mut vdg = Vdg::new();
    vdg.set_sam_mode(6);
    vdg.set_pia_mode(0x1E); // G6R, CSS=0
    let ram = ram_with(0x0400, &[0xA0]); // pixels 1,0,1,0,0,0,0,0
    render(&mut vdg, &ram);
    let frame = vdg.frame();
    assert_eq!(frame[0], FB_GREEN);
    assert_eq!(frame[1], FB_BLACK);
    assert_eq!(frame[2], FB_GREEN);
    assert_eq!(frame[3], FB_BLACK);
}

#[test]
fn resolution_graphics_3r_doubles_pixels() {
    let mut vdg = Vdg::new();
    vdg.set_sam_mode(5);
    vdg.set_pia_mode(0x1A); // G3R: 128 wide, doubled
    let ram = ram_with(0x0400, &[0x80]);
    render(&mut vdg, &ram);
    let frame = vdg.frame();
    assert_eq!(frame[0], FB_GREEN);
    assert_eq!(frame[1], FB_GREEN, "pixel doubled");
    assert_eq!(frame[2], FB_BLACK);
}

#[test]
fn color_graphics_two_bits_per_pixel() {
    let mut vdg = Vdg::new();
    vdg.set_sam_mode(6);
    vdg.set_pia_mode(0x1C); // G6C, CSS=0
    // 0b00_01_10_11: green, yellow, blue, red in the CSS=0 set.
    let ram = ram_with(0x0400, &[0b0001_1011]);
    render(&mut vdg, &ram);
    let frame = vdg.frame();
    assert_eq!(frame[0], FB_GREEN);
    assert_eq!(frame[1], FB_GREEN);
    assert_eq!(frame[2], FB_YELLOW);
    assert_eq!(frame[3], FB_YELLOW);
}

#[test]
fn frame_has_exact_size_and_full_coverage() {
    let mut vdg = Vdg::new();
    // Solid inverse-space screen: every pixel becomes foreground.
    let ram = ram_with(0x0400, &[0x60; 512]);
    render(&mut vdg, &ram);
    assert_eq!(vdg.frame().len(), FRAME_SIZE);
    assert!(vdg.frame().iter().all(|&p| p == FB_GREEN));
}
