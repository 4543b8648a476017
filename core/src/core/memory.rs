//! Tagged 64 KiB address space.
//!
//! Each of the 65,536 cells carries a byte and a tag telling the board how
//! an access resolves: plain RAM, write-protected ROM, or a memory-mapped
//! I/O window identified by a slot number. The slot is an opaque index; the
//! board maps it onto a concrete peripheral. Storing a small discriminant
//! instead of a handler pointer keeps the dispatch a closed set.

use log::trace;

/// How a single address resolves on access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellTag {
    /// Read/write backing byte.
    Ram,
    /// Read-only backing byte; writes are dropped.
    Rom,
    /// Access dispatches to the I/O slot with this index.
    Io(u8),
}

/// 64 KiB of bytes plus per-address tags.
pub struct Memory {
    bytes: Box<[u8; 0x10000]>,
    tags: Box<[CellTag; 0x10000]>,
}

impl Memory {
    /// All cells zeroed and tagged `Ram`.
    pub fn new() -> Self {
        Self {
            bytes: Box::new([0; 0x10000]),
            tags: Box::new([CellTag::Ram; 0x10000]),
        }
    }

    pub fn tag(&self, addr: u16) -> CellTag {
        self.tags[addr as usize]
    }

    /// Backing byte regardless of tag. I/O windows return whatever byte the
    /// cell last held; peripheral registers are not consulted.
    pub fn byte(&self, addr: u16) -> u8 {
        self.bytes[addr as usize]
    }

    /// Store to the backing byte honoring ROM protection. Returns false when
    /// the write was dropped.
    pub fn set_byte(&mut self, addr: u16, data: u8) -> bool {
        match self.tags[addr as usize] {
            CellTag::Rom => {
                trace!("dropped write 0x{data:02x} to ROM address 0x{addr:04x}");
                false
            }
            _ => {
                self.bytes[addr as usize] = data;
                true
            }
        }
    }

    /// Copy `data` into the backing store starting at `base`, ignoring tags.
    /// Used for ROM image loading before the range is write-protected.
    pub fn load(&mut self, base: u16, data: &[u8]) {
        let start = base as usize;
        let end = (start + data.len()).min(0x10000);
        self.bytes[start..end].copy_from_slice(&data[..end - start]);
    }

    /// Mark an inclusive address range read-only.
    pub fn define_rom(&mut self, lo: u16, hi: u16) {
        for tag in &mut self.tags[lo as usize..=hi as usize] {
            *tag = CellTag::Rom;
        }
    }

    /// Attach an inclusive address range to an I/O slot. Redefining a range
    /// that already maps to I/O simply replaces the slot (last writer wins).
    pub fn define_io(&mut self, lo: u16, hi: u16, slot: u8) {
        for tag in &mut self.tags[lo as usize..=hi as usize] {
            *tag = CellTag::Io(slot);
        }
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}
