//! Host collaborator interfaces.
//!
//! The core depends on the embedding platform only through these traits:
//! a monotonic microsecond clock, raw keyboard scan codes, the joystick
//! comparator loop, the audio DAC/mux, the reset button, drive indicator
//! LEDs, the tape file writer and a fatal-diagnostic sink. Null
//! implementations are provided for tests and headless use.

use dragon_core::device::wd2797::{ImageStream, ImageType, MediaError};

/// Motor LED source masks.
pub const MOTOR_LED_DISK: u8 = 0x01;
pub const MOTOR_LED_TAPE: u8 = 0x02;

pub trait HostIo {
    /// Wrapping microsecond monotonic clock.
    fn now_us(&mut self) -> u32;

    /// Next keyboard scan code; 0 when none pending, bit 7 set on release.
    fn read_scan_code(&mut self) -> u8;

    fn joystick_button(&mut self) -> bool;

    /// Comparator output of the external joystick ADC. The host must allow
    /// at least 20 µs of settling after a DAC write before sampling.
    fn joystick_comparator(&mut self) -> bool;

    /// Latch a 6-bit value into the external DAC.
    fn write_dac(&mut self, value: u8);

    /// 2-bit analog multiplexer source select.
    fn audio_mux_select(&mut self, select: u8);

    /// Reset button state, true while pressed.
    fn reset_button(&mut self) -> bool;

    fn motor_led_on(&mut self, mask: u8);
    fn motor_led_off(&mut self, mask: u8);

    /// Persist a captured cassette stream.
    fn write_tape(&mut self, name: &str, data: &[u8]) -> Result<(), MediaError>;

    /// Fatal diagnostic sink. The machine stops stepping after this.
    fn halt(&mut self, reason: &str);
}

/// Headless host: time advances a fixed amount per query, inputs are idle,
/// outputs are recorded where tests want to observe them.
pub struct NullHost {
    pub clock_us: u32,
    /// Microseconds added per `now_us` call; keeps time moving for code
    /// that polls the clock in a loop.
    pub clock_step: u32,
    pub scan_codes: std::collections::VecDeque<u8>,
    pub comparator: bool,
    pub button: bool,
    /// Clock window (start, end) during which the reset button reads as
    /// pressed.
    pub reset_window: Option<(u32, u32)>,
    pub dac_writes: Vec<u8>,
    pub mux_selects: Vec<u8>,
    pub motor_mask: u8,
    pub tapes: Vec<(String, Vec<u8>)>,
    pub halt_reason: Option<String>,
}

impl NullHost {
    pub fn new() -> Self {
        Self {
            clock_us: 0,
            clock_step: 2,
            scan_codes: std::collections::VecDeque::new(),
            comparator: false,
            button: false,
            reset_window: None,
            dac_writes: Vec::new(),
            mux_selects: Vec::new(),
            motor_mask: 0,
            tapes: Vec::new(),
            halt_reason: None,
        }
    }
}

impl Default for NullHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostIo for NullHost {
    fn now_us(&mut self) -> u32 {
        self.clock_us = self.clock_us.wrapping_add(self.clock_step);
        self.clock_us
    }

    fn read_scan_code(&mut self) -> u8 {
        self.scan_codes.pop_front().unwrap_or(0)
    }

    fn joystick_button(&mut self) -> bool {
        self.button
    }

    fn joystick_comparator(&mut self) -> bool {
        self.comparator
    }

    fn write_dac(&mut self, value: u8) {
        self.dac_writes.push(value);
    }

    fn audio_mux_select(&mut self, select: u8) {
        self.mux_selects.push(select);
    }

    fn reset_button(&mut self) -> bool {
        let now = self.now_us();
        match self.reset_window {
            Some((start, end)) => now >= start && now < end,
            None => false,
        }
    }

    fn motor_led_on(&mut self, mask: u8) {
        self.motor_mask |= mask;
    }

    fn motor_led_off(&mut self, mask: u8) {
        self.motor_mask &= !mask;
    }

    fn write_tape(&mut self, name: &str, data: &[u8]) -> Result<(), MediaError> {
        self.tapes.push((name.to_string(), data.to_vec()));
        Ok(())
    }

    fn halt(&mut self, reason: &str) {
        self.halt_reason = Some(reason.to_string());
    }
}

/// Disk image held in memory, usable both by tests and by hosts that load
/// whole images off their storage stack.
pub struct MemoryImage {
    kind: ImageType,
    bytes: Vec<u8>,
    position: usize,
}

impl MemoryImage {
    pub fn new(kind: ImageType, bytes: Vec<u8>) -> Self {
        Self {
            kind,
            bytes,
            position: 0,
        }
    }

    /// Build a blank single-sided VDK image with the standard 12-byte
    /// header, `tracks` tracks of 18 × 256-byte sectors.
    pub fn blank_vdk(tracks: u8) -> Self {
        let mut bytes = vec![
            b'D', b'K', 12, 0, // magic, header_size (LE)
            0x10, 0x10, // version, compatibility version
            0, 0, // source id, source version
            tracks, 1, // tracks, sides
            0, 0, // flags, compression
        ];
        bytes.resize(12 + tracks as usize * 18 * 256, 0);
        Self::new(ImageType::Vdk, bytes)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl ImageStream for MemoryImage {
    fn image_type(&self) -> ImageType {
        self.kind
    }

    fn seek(&mut self, offset: u32) -> Result<(), MediaError> {
        if offset as usize > self.bytes.len() {
            return Err(MediaError::SeekOutOfRange);
        }
        self.position = offset as usize;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<(), MediaError> {
        let end = self.position + buf.len();
        if end > self.bytes.len() {
            return Err(MediaError::ReadFault);
        }
        buf.copy_from_slice(&self.bytes[self.position..end]);
        self.position = end;
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), MediaError> {
        let end = self.position + buf.len();
        if end > self.bytes.len() {
            return Err(MediaError::WriteFault);
        }
        self.bytes[self.position..end].copy_from_slice(buf);
        self.position = end;
        Ok(())
    }
}
