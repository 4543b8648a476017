//! Dragon keyboard matrix model.
//!
//! The host delivers XT set-1 style scan codes (bit 7 set = key release,
//! 0 = nothing pending). The model latches an 8-column × 7-row active-low
//! matrix image; the PIA port read senses rows for whichever columns are
//! currently strobed low.
//!
//! F1 (scan code 0x3B) is not part of the matrix: it latches the loader
//! escape channel the executive polls once per loop iteration.

/// Synthesized "function key" channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FunctionKey {
    None,
    LoaderEscape,
}

const SCAN_RELEASE: u8 = 0x80;
const SCAN_F1: u8 = 0x3B;

/// Matrix position of a key: (column 0-7, row 0-6).
type MatrixPos = (u8, u8);

/// XT set-1 make code → Dragon matrix position.
///
/// Matrix layout (column across, row down):
///
/// ```text
/// row 0: 0 1 2 3 4 5 6 7
/// row 1: 8 9 : ; , - . /
/// row 2: @ A B C D E F G
/// row 3: H I J K L M N O
/// row 4: P Q R S T U V W
/// row 5: X Y Z UP DOWN LEFT RIGHT SPACE
/// row 6: ENTER CLEAR BREAK - - - - SHIFT
/// ```
fn matrix_pos(scan: u8) -> Option<MatrixPos> {
    let pos = match scan {
        // Digit row (XT 0x02-0x0B is 1..9,0)
        0x0B => (0, 0), // 0
        0x02 => (1, 0), // 1
        0x03 => (2, 0), // 2
        0x04 => (3, 0), // 3
        0x05 => (4, 0), // 4
        0x06 => (5, 0), // 5
        0x07 => (6, 0), // 6
        0x08 => (7, 0), // 7
        0x09 => (0, 1), // 8
        0x0A => (1, 1), // 9
        0x27 => (3, 1), // ; (shifted reads as :)
        0x33 => (4, 1), // ,
        0x0C => (5, 1), // -
        0x34 => (6, 1), // .
        0x35 => (7, 1), // /
        0x1A => (0, 2), // @ (mapped from [)
        0x1E => (1, 2), // A
        0x30 => (2, 2), // B
        0x2E => (3, 2), // C
        0x20 => (4, 2), // D
        0x12 => (5, 2), // E
        0x21 => (6, 2), // F
        0x22 => (7, 2), // G
        0x23 => (0, 3), // H
        0x17 => (1, 3), // I
        0x24 => (2, 3), // J
        0x25 => (3, 3), // K
        0x26 => (4, 3), // L
        0x32 => (5, 3), // M
        0x31 => (6, 3), // N
        0x18 => (7, 3), // O
        0x19 => (0, 4), // P
        0x10 => (1, 4), // Q
        0x13 => (2, 4), // R
        0x1F => (3, 4), // S
        0x14 => (4, 4), // T
        0x16 => (5, 4), // U
        0x2F => (6, 4), // V
        0x11 => (7, 4), // W
        0x2D => (0, 5), // X
        0x15 => (1, 5), // Y
        0x2C => (2, 5), // Z
        0x48 => (3, 5), // cursor up
        0x50 => (4, 5), // cursor down
        0x4B => (5, 5), // cursor left (also backspace)
        0x0E => (5, 5), // backspace doubles as cursor left
        0x4D => (6, 5), // cursor right
        0x39 => (7, 5), // space
        0x1C => (0, 6), // ENTER
        0x47 => (1, 6), // CLEAR (Home)
        0x01 => (2, 6), // BREAK (Esc)
        0x2A => (7, 6), // left shift
        0x36 => (7, 6), // right shift
        _ => return None,
    };
    Some(pos)
}

pub struct Keyboard {
    /// Per-column row image, active low (bit clear = key down).
    matrix: [u8; 8],
    function_key: FunctionKey,
}

impl Keyboard {
    pub fn new() -> Self {
        Self {
            matrix: [0x7F; 8],
            function_key: FunctionKey::None,
        }
    }

    pub fn reset(&mut self) {
        self.matrix = [0x7F; 8];
        self.function_key = FunctionKey::None;
    }

    /// Latch one scan code into the matrix image. Codes that have no
    /// matrix position are ignored.
    pub fn process_scan_code(&mut self, scan: u8) {
        if scan == 0 {
            return;
        }
        let released = scan & SCAN_RELEASE != 0;
        let code = scan & !SCAN_RELEASE;

        if code == SCAN_F1 {
            if !released {
                self.function_key = FunctionKey::LoaderEscape;
            }
            return;
        }

        if let Some((col, row)) = matrix_pos(code) {
            if released {
                self.matrix[col as usize] |= 1 << row;
            } else {
                self.matrix[col as usize] &= !(1 << row);
            }
        }
    }

    /// Row sense for the given active-low column strobe byte: a row bit
    /// reads low iff a pressed key sits in a strobed column.
    pub fn row_sense(&self, column_strobe: u8) -> u8 {
        let mut rows = 0x7F;
        for (col, image) in self.matrix.iter().enumerate() {
            if column_strobe & (1 << col) == 0 {
                rows &= image;
            }
        }
        rows
    }

    /// Take the latched function-key event, clearing the channel.
    pub fn take_function_key(&mut self) -> FunctionKey {
        std::mem::replace(&mut self.function_key, FunctionKey::None)
    }
}

impl Default for Keyboard {
    fn default() -> Self {
        Self::new()
    }
}
