//! Cassette tape capture trap.
//!
//! The BASIC ROM routine `CasByteOut` touches the `CasLastSine` RAM
//! variable sixteen times per byte it modulates out to tape. A write trap
//! on that variable counts the touches, recovers the byte being sent from
//! the top of the hardware stack, and runs a small state machine over the
//! byte stream. When a complete CAS stream (leader, header block, data
//! blocks, EOF block) has passed, the byte-exact capture is handed to the
//! host as a .CAS file named after the header block.

use log::debug;

use crate::core::CpuView;

/// `CasLastSine` in the BASIC direct page.
pub const CAS_LAST_SINE: u16 = 0x0085;

/// PCs inside the `CasByteOut` sine loops; only accesses from these count.
const CAS_BYTE_OUT_LOW: u16 = 0xBE1C;
const CAS_BYTE_OUT_HIGH: u16 = 0xBE3F;

const ACCESSES_PER_BYTE: u32 = 16;
const CAPTURE_CAPACITY: usize = 64 * 1024;
const FILE_NAME_MAX: usize = 8;

const LEADER_BYTE: u8 = 0x55;
const SYNC_BYTE: u8 = 0x3C;
const BLOCK_HEADER: u8 = 0x00;
const BLOCK_DATA: u8 = 0x01;
const BLOCK_EOF: u8 = 0xFF;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StreamState {
    Idle,
    Leader,
    Sync,
    /// Inside a block; `remaining` counts down through the checksum byte.
    Header {
        remaining: i32,
    },
    Data {
        remaining: i32,
    },
    Eof {
        remaining: i32,
    },
    Write,
}

/// A completed cassette capture, ready for the host file writer.
pub struct CasFile {
    pub name: String,
    pub data: Vec<u8>,
}

pub struct TapeTrap {
    state: StreamState,
    access_count: u32,
    capture: Vec<u8>,
    file_name: String,
    /// Header bytes seen so far in the current header block, for filename
    /// extraction.
    header_pos: i32,
}

impl TapeTrap {
    pub fn new() -> Self {
        Self {
            state: StreamState::Idle,
            access_count: 0,
            capture: Vec::with_capacity(CAPTURE_CAPACITY),
            file_name: String::new(),
            header_pos: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Called for every trapped access to `CasLastSine`. `stack_byte` is
    /// the byte at the CPU hardware stack top, fetched by the board.
    /// Returns a finished capture when an EOF block completes.
    pub fn on_access(&mut self, cpu: &CpuView, stack_byte: u8) -> Option<CasFile> {
        if cpu.pc != CAS_BYTE_OUT_LOW && cpu.pc != CAS_BYTE_OUT_HIGH {
            return None;
        }
        self.access_count += 1;
        if self.access_count < ACCESSES_PER_BYTE {
            return None;
        }
        self.access_count = 0;
        self.consume(stack_byte)
    }

    /// Advance the stream state machine by one tape byte.
    fn consume(&mut self, byte: u8) -> Option<CasFile> {
        if self.capture.len() < CAPTURE_CAPACITY {
            self.capture.push(byte);
        } else {
            *self.capture.last_mut().unwrap() = byte;
        }

        self.state = match self.state {
            StreamState::Idle => {
                if byte == LEADER_BYTE {
                    StreamState::Leader
                } else {
                    StreamState::Idle
                }
            }
            StreamState::Leader => match byte {
                LEADER_BYTE => StreamState::Leader,
                SYNC_BYTE => StreamState::Sync,
                _ => StreamState::Idle,
            },
            StreamState::Sync => match byte {
                BLOCK_HEADER => {
                    self.file_name.clear();
                    self.header_pos = -1;
                    StreamState::Header { remaining: -1 }
                }
                BLOCK_DATA => StreamState::Data { remaining: -1 },
                BLOCK_EOF => StreamState::Eof { remaining: -1 },
                _ => StreamState::Idle,
            },
            StreamState::Header { remaining } => self.header_byte(remaining, byte),
            StreamState::Data { remaining } => {
                // First byte is the block length; count down through it and
                // the trailing checksum.
                if remaining < 0 {
                    StreamState::Data {
                        remaining: byte as i32,
                    }
                } else if remaining == 0 {
                    StreamState::Leader
                } else {
                    StreamState::Data {
                        remaining: remaining - 1,
                    }
                }
            }
            StreamState::Eof { remaining } => {
                if remaining < 0 {
                    StreamState::Eof {
                        remaining: byte as i32,
                    }
                } else if remaining == 0 {
                    StreamState::Write
                } else {
                    StreamState::Eof {
                        remaining: remaining - 1,
                    }
                }
            }
            StreamState::Write => StreamState::Idle,
        };

        if self.state == StreamState::Write {
            // The checksum byte that lands here completes the stream.
            self.state = StreamState::Idle;
            let file = CasFile {
                name: if self.file_name.is_empty() {
                    "TAPE".to_string()
                } else {
                    self.file_name.clone()
                },
                data: std::mem::take(&mut self.capture),
            };
            debug!("tape: captured {} bytes as '{}'", file.data.len(), file.name);
            self.file_name.clear();
            Some(file)
        } else {
            None
        }
    }

    fn header_byte(&mut self, remaining: i32, byte: u8) -> StreamState {
        if remaining < 0 {
            self.header_pos = 0;
            return StreamState::Header {
                remaining: byte as i32,
            };
        }
        if remaining == 0 {
            return StreamState::Leader;
        }
        // The first eight block bytes hold the filename; keep alphanumerics.
        if (self.header_pos as usize) < FILE_NAME_MAX && byte.is_ascii_alphanumeric() {
            self.file_name.push(byte as char);
        }
        self.header_pos += 1;
        StreamState::Header {
            remaining: remaining - 1,
        }
    }
}

impl Default for TapeTrap {
    fn default() -> Self {
        Self::new()
    }
}
