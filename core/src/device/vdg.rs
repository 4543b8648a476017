//! MC6847 Video Display Generator.
//!
//! One `render` call paints a complete 256×192 frame of 8-bit palette
//! indices from the video RAM window selected by the SAM. Video memory is
//! read through a caller-supplied accessor on every call, so the frame
//! always reflects current bus state and repeated renders with an
//! unchanged bus are byte-identical.

use log::{debug, error};

use super::font::{FONT, FONT_HEIGHT, FONT_WIDTH, SEMIGRAPH_4, SEMIGRAPH_6};

pub const SCREEN_WIDTH: usize = 256;
pub const SCREEN_HEIGHT: usize = 192;
pub const FRAME_SIZE: usize = SCREEN_WIDTH * SCREEN_HEIGHT;

const SCREEN_WIDTH_CHAR: usize = 32;
const SCREEN_HEIGHT_CHAR: usize = 16;

// Host frame-buffer palette indices.
pub const FB_BLACK: u8 = 0;
pub const FB_BLUE: u8 = 1;
pub const FB_GREEN: u8 = 2;
pub const FB_CYAN: u8 = 3;
pub const FB_RED: u8 = 4;
pub const FB_MAGENTA: u8 = 5;
pub const FB_BROWN: u8 = 6;
pub const FB_GRAY: u8 = 7;
pub const FB_DARK_GRAY: u8 = 8;
pub const FB_LIGHT_BLUE: u8 = 9;
pub const FB_LIGHT_GREEN: u8 = 10;
pub const FB_LIGHT_CYAN: u8 = 11;
pub const FB_LIGHT_RED: u8 = 12;
pub const FB_LIGHT_MAGENTA: u8 = 13;
pub const FB_YELLOW: u8 = 14;
pub const FB_WHITE: u8 = 15;

/// Host palette as BGR triples, index-aligned with the FB_* constants.
pub const PALETTE_BGR: [[u8; 3]; 16] = [
    [0x00, 0x00, 0x00], // black
    [0xAA, 0x00, 0x00], // blue
    [0x00, 0xAA, 0x00], // green
    [0xAA, 0xAA, 0x00], // cyan
    [0x00, 0x00, 0xAA], // red
    [0xAA, 0x00, 0xAA], // magenta
    [0x00, 0x55, 0xAA], // brown
    [0xAA, 0xAA, 0xAA], // gray
    [0x55, 0x55, 0x55], // dark gray
    [0xFF, 0x55, 0x55], // light blue
    [0x55, 0xFF, 0x55], // light green
    [0xFF, 0xFF, 0x55], // light cyan
    [0x55, 0x55, 0xFF], // light red
    [0xFF, 0x55, 0xFF], // light magenta
    [0x55, 0xFF, 0xFF], // yellow
    [0xFF, 0xFF, 0xFF], // white
];

/// VDG color set in C0..C3 order for CSS=0, then CSS=1.
const COLORS: [u8; 8] = [
    FB_GREEN,
    FB_YELLOW,
    FB_LIGHT_BLUE,
    FB_RED,
    FB_WHITE, // buff
    FB_CYAN,
    FB_LIGHT_MAGENTA,
    FB_BROWN, // orange
];

const CHAR_SEMI_GRAPHICS: u8 = 0x80;
const CHAR_INVERSE: u8 = 0x40;

// PIA-driven mode bits, already shifted right by 3 from port B.
const PIA_GRAPHICS: u8 = 0x10;
const PIA_GM_MASK: u8 = 0x0E;
const PIA_EXT_INT: u8 = 0x02;
const PIA_COLOR_SET: u8 = 0x01;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VideoMode {
    AlphaInternal, // per-byte SG4 when bit 7 set
    AlphaExternal, // per-byte SG6 when bit 7 set
    SemiGraphics8,
    SemiGraphics12,
    SemiGraphics24,
    Graphics1C,
    Graphics1R,
    Graphics2C,
    Graphics2R,
    Graphics3C,
    Graphics3R,
    Graphics6C,
    Graphics6R,
    Dma,
    Undefined,
}

/// (row repeat, video memory bytes) per full-graphics mode.
fn graphics_geometry(mode: VideoMode) -> (usize, usize) {
    use VideoMode::*;
    match mode {
        Graphics1C => (3, 1024),
        Graphics1R => (3, 1024),
        Graphics2C => (3, 2048),
        Graphics2R => (2, 1536),
        Graphics3C => (2, 3072),
        Graphics3R => (1, 3072),
        Graphics6C => (1, 6144),
        Graphics6R => (1, 6144),
        _ => (1, 0),
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum RenderError {
    /// SAM mode 7 selects external DMA video, which this machine never
    /// programs; reaching it is a programming invariant violation.
    DmaMode,
    /// The SAM/PIA mode bit combination matches no row of the mode matrix.
    UndefinedMode,
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DmaMode => write!(f, "DMA video mode is not supported"),
            Self::UndefinedMode => write!(f, "SAM/PIA mode bits resolve to no video mode"),
        }
    }
}

impl std::error::Error for RenderError {}

pub struct Vdg {
    sam_video_mode: u8,
    pia_video_mode: u8,
    video_ram_offset: u8,
    prev_mode: Option<VideoMode>,
    frame: Box<[u8; FRAME_SIZE]>,
}

impl Vdg {
    pub fn new() -> Self {
        Self {
            sam_video_mode: 0,
            pia_video_mode: 0,
            video_ram_offset: 0x02,
            prev_mode: None,
            frame: Box::new([FB_BLACK; FRAME_SIZE]),
        }
    }

    pub fn reset(&mut self) {
        self.sam_video_mode = 0;
        self.pia_video_mode = 0;
        self.video_ram_offset = 0x02;
        self.prev_mode = None;
    }

    /// Display base offset from the SAM (display address = offset << 9).
    pub fn set_video_offset(&mut self, offset: u8) {
        self.video_ram_offset = offset;
    }

    pub fn set_sam_mode(&mut self, mode: u8) {
        self.sam_video_mode = mode & 0x07;
    }

    /// Mode bits from PIA1 port B, pre-shifted: bit 4 ^A/G, bits 3:1 GM2:0
    /// (GM0 doubles as ^INT in alpha modes), bit 0 CSS.
    pub fn set_pia_mode(&mut self, mode: u8) {
        self.pia_video_mode = mode & 0x1F;
    }

    pub fn frame(&self) -> &[u8; FRAME_SIZE] {
        &self.frame
    }

    /// Resolve the current mode from the SAM/PIA bit matrix.
    pub fn current_mode(&self) -> VideoMode {
        use VideoMode::*;
        if self.sam_video_mode == 7 {
            return Dma;
        }
        if self.pia_video_mode & PIA_GRAPHICS != 0 {
            return match self.pia_video_mode & PIA_GM_MASK {
                0x00 => Graphics1C,
                0x02 => Graphics1R,
                0x04 => Graphics2C,
                0x06 => Graphics2R,
                0x08 => Graphics3C,
                0x0A => Graphics3R,
                0x0C => Graphics6C,
                _ => Graphics6R,
            };
        }
        match (self.sam_video_mode, self.pia_video_mode & PIA_EXT_INT) {
            (0, 0) => AlphaInternal,
            (0, _) => AlphaExternal,
            (2, 0) => SemiGraphics8,
            (4, 0) => SemiGraphics12,
            (6, 0) => SemiGraphics24,
            _ => Undefined,
        }
    }

    /// Paint a full frame. `read` fetches one video RAM byte through the
    /// bus; the renderer never writes through it.
    pub fn render(&mut self, mut read: impl FnMut(u16) -> u8) -> Result<(), RenderError> {
        use VideoMode::*;

        let mode = self.current_mode();
        if self.prev_mode != Some(mode) {
            self.prev_mode = Some(mode);
            debug!("VDG mode {mode:?}");
        }

        let base = (self.video_ram_offset as u16) << 9;
        match mode {
            AlphaInternal => self.render_alpha_semi4(base, &mut read),
            AlphaExternal => self.render_alpha_semi6(base, &mut read),
            SemiGraphics8 => self.render_semi_ext(4, base, &mut read),
            SemiGraphics12 => self.render_semi_ext(6, base, &mut read),
            SemiGraphics24 => self.render_semi_ext(12, base, &mut read),
            Graphics1C | Graphics2C | Graphics3C | Graphics6C => {
                self.render_color_graphics(mode, base, &mut read)
            }
            Graphics1R | Graphics2R | Graphics3R | Graphics6R => {
                self.render_resolution_graphics(mode, base, &mut read)
            }
            Dma => {
                error!("render: DMA mode selected");
                return Err(RenderError::DmaMode);
            }
            Undefined => {
                error!(
                    "render: unresolvable mode (sam={}, pia=0x{:02x})",
                    self.sam_video_mode, self.pia_video_mode
                );
                return Err(RenderError::UndefinedMode);
            }
        }
        Ok(())
    }

    fn css_color(&self) -> u8 {
        if self.pia_video_mode & PIA_COLOR_SET != 0 {
            COLORS[4]
        } else {
            COLORS[0]
        }
    }

    /// Text cell or semigraphics-4 tile decode shared by the alpha and
    /// extended semigraphics renderers.
    fn cell_pattern(&self, c: u8, font_row: usize) -> (u8, u8, u8) {
        let mut bg = FB_BLACK;
        let (pattern, fg) = if c & CHAR_SEMI_GRAPHICS != 0 {
            let fg = COLORS[((c & 0x70) >> 4) as usize];
            (SEMIGRAPH_4[(c & 0x0F) as usize][font_row], fg)
        } else {
            let mut fg = self.css_color();
            if c & CHAR_INVERSE != 0 {
                std::mem::swap(&mut fg, &mut bg);
            }
            (FONT[(c & 0x3F) as usize][font_row], fg)
        };
        (pattern, fg, bg)
    }

    fn render_alpha_semi4(&mut self, base: u16, read: &mut impl FnMut(u16) -> u8) {
        let mut out = 0;
        for row in 0..SCREEN_HEIGHT_CHAR {
            let row_address = base + (row * SCREEN_WIDTH_CHAR) as u16;
            for font_row in 0..FONT_HEIGHT {
                for col in 0..SCREEN_WIDTH_CHAR {
                    let c = read(row_address + col as u16);
                    let (pattern, fg, bg) = self.cell_pattern(c, font_row);
                    for bit in (0..FONT_WIDTH).rev() {
                        self.frame[out] = if pattern & (1 << bit) != 0 { fg } else { bg };
                        out += 1;
                    }
                }
            }
        }
    }

    fn render_alpha_semi6(&mut self, base: u16, read: &mut impl FnMut(u16) -> u8) {
        let color_set = 4 * (self.pia_video_mode & PIA_COLOR_SET) as usize;
        let mut out = 0;
        for row in 0..SCREEN_HEIGHT_CHAR {
            let row_address = base + (row * SCREEN_WIDTH_CHAR) as u16;
            for font_row in 0..FONT_HEIGHT {
                for col in 0..SCREEN_WIDTH_CHAR {
                    let c = read(row_address + col as u16);
                    let (pattern, fg, bg) = if c & CHAR_SEMI_GRAPHICS != 0 {
                        let fg = COLORS[((c >> 6) & 0x03) as usize + color_set];
                        (SEMIGRAPH_6[(c & 0x3F) as usize][font_row], fg, FB_BLACK)
                    } else {
                        let mut fg = self.css_color();
                        let mut bg = FB_BLACK;
                        if c & CHAR_INVERSE != 0 {
                            std::mem::swap(&mut fg, &mut bg);
                        }
                        (FONT[(c & 0x3F) as usize][font_row], fg, bg)
                    };
                    for bit in (0..FONT_WIDTH).rev() {
                        self.frame[out] = if pattern & (1 << bit) != 0 { fg } else { bg };
                        out += 1;
                    }
                }
            }
        }
    }

    /// SG8/SG12/SG24: the character row is split into `segments` sub-rows,
    /// each with its own byte per column; the tile pattern row index runs
    /// continuously down the full cell.
    fn render_semi_ext(&mut self, segments: usize, base: u16, read: &mut impl FnMut(u16) -> u8) {
        let seg_scan_lines = FONT_HEIGHT / segments;
        let mut out = 0;
        let mut font_row = 0;
        for row in 0..SCREEN_HEIGHT_CHAR {
            for seg_row in 0..segments {
                let row_address =
                    base + ((row * segments + seg_row) * SCREEN_WIDTH_CHAR) as u16;
                for _ in 0..seg_scan_lines {
                    for col in 0..SCREEN_WIDTH_CHAR {
                        let c = read(row_address + col as u16);
                        let (pattern, fg, bg) = self.cell_pattern(c, font_row);
                        for bit in (0..FONT_WIDTH).rev() {
                            self.frame[out] = if pattern & (1 << bit) != 0 { fg } else { bg };
                            out += 1;
                        }
                    }
                    font_row = (font_row + 1) % FONT_HEIGHT;
                }
            }
        }
    }

    /// 1-bpp modes: a set bit paints the CSS color, clear paints black.
    /// Pixels double horizontally except in G6R; rows repeat per geometry.
    fn render_resolution_graphics(
        &mut self,
        mode: VideoMode,
        base: u16,
        read: &mut impl FnMut(u16) -> u8,
    ) {
        let (row_rep, video_mem) = graphics_geometry(mode);
        let fg = self.css_color();
        let mut line = [FB_BLACK; SCREEN_WIDTH];
        let mut line_index = 0;
        let mut out = 0;

        for offset in 0..video_mem {
            let byte = read(base.wrapping_add(offset as u16));
            for bit in (0..8).rev() {
                let pixel = if byte & (1 << bit) != 0 { fg } else { FB_BLACK };
                line[line_index] = pixel;
                line_index += 1;
                if mode != VideoMode::Graphics6R {
                    line[line_index] = pixel;
                    line_index += 1;
                }
            }
            if line_index >= SCREEN_WIDTH {
                for _ in 0..row_rep {
                    self.frame[out..out + SCREEN_WIDTH].copy_from_slice(&line);
                    out += SCREEN_WIDTH;
                }
                line_index = 0;
            }
        }
    }

    /// 2-bpp modes: four pixels per byte from a CSS-selected four-color
    /// subset. G1C quadruples pixels horizontally, the rest double.
    fn render_color_graphics(
        &mut self,
        mode: VideoMode,
        base: u16,
        read: &mut impl FnMut(u16) -> u8,
    ) {
        let (row_rep, video_mem) = graphics_geometry(mode);
        let color_set = 4 * (self.pia_video_mode & PIA_COLOR_SET) as usize;
        let mut line = [FB_BLACK; SCREEN_WIDTH];
        let mut line_index = 0;
        let mut out = 0;

        for offset in 0..video_mem {
            let byte = read(base.wrapping_add(offset as u16));
            for shift in [6u8, 4, 2, 0] {
                let pixel = COLORS[((byte >> shift) & 0x03) as usize + color_set];
                let rep = if mode == VideoMode::Graphics1C { 4 } else { 2 };
                for _ in 0..rep {
                    line[line_index] = pixel;
                    line_index += 1;
                }
            }
            if line_index >= SCREEN_WIDTH {
                for _ in 0..row_rep {
                    self.frame[out..out + SCREEN_WIDTH].copy_from_slice(&line);
                    out += SCREEN_WIDTH;
                }
                line_index = 0;
            }
        }
    }
}

impl Default for Vdg {
    fn default() -> Self {
        Self::new()
    }
}
