//! SAM (MC6883 synchronous address multiplexer) control toggles.
//!
//! The SAM is programmed through write-only address pairs in
//! 0xFFC0..=0xFFDF: writing the even address of a pair clears its bit,
//! writing the odd address sets it. Data written is irrelevant. Fields in
//! address order: V0-V2 (VDG mode), F0-F6 (display base offset), P1 (page),
//! R0-R1 (RAM rate), M0-M1 (memory size), TY (map type). Only the V and F
//! fields have observable effect in this machine; the rest are stored and
//! ignored.

use log::debug;

pub const SAM_BASE: u16 = 0xFFC0;
pub const SAM_LAST: u16 = 0xFFDF;

pub struct Sam {
    video_mode: u8,       // V2:V0
    video_ram_offset: u8, // F6:F0, display base = offset << 9
    page: u8,             // P1
    ram_rate: u8,         // R1:R0
    memory_size: u8,      // M1:M0
    map_type: u8,         // TY
}

impl Sam {
    pub fn new() -> Self {
        let mut sam = Self {
            video_mode: 0,
            video_ram_offset: 0,
            page: 0,
            ram_rate: 0,
            memory_size: 0,
            map_type: 0,
        };
        sam.reset();
        sam
    }

    /// Power-on state: alphanumeric mode, text screen at 0x0400.
    pub fn reset(&mut self) {
        self.video_mode = 0;
        self.video_ram_offset = 0x02;
        self.page = 0;
        self.ram_rate = 0;
        self.memory_size = 0;
        self.map_type = 0;
    }

    /// Handle a write anywhere in the toggle window.
    pub fn write(&mut self, addr: u16) {
        let toggle = addr - SAM_BASE;
        let bit = (toggle & 1) as u8;
        match toggle >> 1 {
            n @ 0..=2 => {
                let old = self.video_mode;
                self.set_bits(Field::VideoMode, n as u8, bit);
                if old != self.video_mode {
                    debug!("SAM video mode {}", self.video_mode);
                }
            }
            n @ 3..=9 => self.set_bits(Field::Offset, n as u8 - 3, bit),
            10 => self.page = bit,
            n @ 11..=12 => self.set_bits(Field::RamRate, n as u8 - 11, bit),
            n @ 13..=14 => self.set_bits(Field::MemorySize, n as u8 - 13, bit),
            _ => self.map_type = bit,
        }
    }

    /// Reads of the toggle window return nothing meaningful.
    pub fn read(&self) -> u8 {
        0
    }

    pub fn video_mode(&self) -> u8 {
        self.video_mode
    }

    pub fn video_ram_offset(&self) -> u8 {
        self.video_ram_offset
    }

    fn set_bits(&mut self, field: Field, pos: u8, bit: u8) {
        let reg = match field {
            Field::VideoMode => &mut self.video_mode,
            Field::Offset => &mut self.video_ram_offset,
            Field::RamRate => &mut self.ram_rate,
            Field::MemorySize => &mut self.memory_size,
        };
        if bit != 0 {
            *reg |= 1 << pos;
        } else {
            *reg &= !(1 << pos);
        }
    }
}

enum Field {
    VideoMode,
    Offset,
    RamRate,
    MemorySize,
}

impl Default for Sam {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_pairs_set_and_clear() {
        let mut sam = Sam::new();
        sam.write(0xFFC1); // V0 set
        sam.write(0xFFC5); // V2 set
        assert_eq!(sam.video_mode(), 0b101);
        sam.write(0xFFC4); // V2 clear
        assert_eq!(sam.video_mode(), 0b001);
    }

    #[test]
    fn offset_field_builds_display_base() {
        let mut sam = Sam::new();
        // Clear the power-on offset, then set F1 (offset = 2 → base 0x0400)
        for pair in 0..7 {
            sam.write(0xFFC6 + pair * 2);
        }
        sam.write(0xFFC9);
        assert_eq!(sam.video_ram_offset(), 0x02);
        assert_eq!((sam.video_ram_offset() as u16) << 9, 0x0400);
    }

    #[test]
    fn reset_restores_text_screen() {
        let mut sam = Sam::new();
        sam.write(0xFFC7); // F0 set
        sam.write(0xFFC1); // V0 set
        sam.reset();
        assert_eq!(sam.video_ram_offset(), 0x02);
        assert_eq!(sam.video_mode(), 0);
    }
}
