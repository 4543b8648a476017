//! WD2797 floppy disk controller and the drive/motor control port.
//!
//! The controller runs against a mounted disk image exposed as a flat,
//! seekable byte stream. Interrupt side effects are returned to the board
//! as `DiskSignals` rather than raised directly: INTRQ maps to the CPU NMI
//! line (gated by the control port's NMI enable) and the data-rate tick
//! maps to a cartridge FIRQ pulse through PIA1.

use log::{debug, error, warn};

pub const SECTORS_PER_TRACK: u32 = 18;
pub const SECTOR_SIZE: u32 = 256;
pub const TRACK_BYTES: usize = (SECTORS_PER_TRACK * SECTOR_SIZE) as usize;
const ID_FIELD_SIZE: usize = 6;
const VDK_HEADER_BYTES: usize = 12;

/// Sector fill byte used when formatting.
const FORMAT_FILL: u8 = 0xE5;
/// Gap bytes discarded from the head of a WRITE TRACK byte stream before
/// the sector ID quad.
const FORMAT_GAP_SKIP: usize = 111;

const DISK_TICK_US: u32 = 1_000;
const IDLE_NMI_DELAY_US: u32 = 250 * DISK_TICK_US;

// Command opcodes (Dragon DOS uses this subset; anything else is treated
// as an illegal command).
const CMD_RESTORE: u8 = 0x00;
const CMD_SEEK: u8 = 0x10;
const CMD_READ_SECTOR: u8 = 0x88;
const CMD_WRITE_SECTOR: u8 = 0xA8;
const CMD_READ_ADDRESS: u8 = 0xC0;
const CMD_FORCE_INTERRUPT: u8 = 0xD0;
const CMD_WRITE_TRACK: u8 = 0xF4;
const CMD_STEP_MASK: u8 = 0xFC;

// Status bits.
pub const ST_BUSY: u8 = 0x01;
pub const ST_DRQ: u8 = 0x02;
pub const ST_TRACK0: u8 = 0x04;
pub const ST_CRC_ERROR: u8 = 0x08;
pub const ST_RECORD_NOT_FOUND: u8 = 0x10;
pub const ST_HEAD_LOADED: u8 = 0x20;
pub const ST_WRITE_PROTECT: u8 = 0x40;
pub const ST_NOT_READY: u8 = 0x80;

// Drive control port bits.
const CTL_NMI_ENABLE: u8 = 0x20;
const CTL_WRITE_PRECOMP: u8 = 0x10;
const CTL_SINGLE_DENSITY: u8 = 0x08;
const CTL_MOTOR_ON: u8 = 0x04;
const CTL_DRIVE_MASK: u8 = 0x03;

/// Kind of disk image mounted behind the byte stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageType {
    None,
    Raw,
    Vdk,
}

/// Media-level failures reported by the image byte stream.
#[derive(Debug)]
pub enum MediaError {
    SeekOutOfRange,
    ReadFault,
    WriteFault,
    NotMounted,
}

impl std::fmt::Display for MediaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SeekOutOfRange => write!(f, "seek beyond end of image"),
            Self::ReadFault => write!(f, "image read fault"),
            Self::WriteFault => write!(f, "image write fault"),
            Self::NotMounted => write!(f, "no image mounted"),
        }
    }
}

impl std::error::Error for MediaError {}

/// Flat byte-stream interface over a mounted disk image.
pub trait ImageStream {
    fn image_type(&self) -> ImageType;
    fn seek(&mut self, offset: u32) -> Result<(), MediaError>;
    fn read(&mut self, buf: &mut [u8]) -> Result<(), MediaError>;
    fn write(&mut self, buf: &[u8]) -> Result<(), MediaError>;
}

/// Always-empty drive bay.
pub struct NoImage;

impl ImageStream for NoImage {
    fn image_type(&self) -> ImageType {
        ImageType::None
    }
    fn seek(&mut self, _offset: u32) -> Result<(), MediaError> {
        Err(MediaError::NotMounted)
    }
    fn read(&mut self, _buf: &mut [u8]) -> Result<(), MediaError> {
        Err(MediaError::NotMounted)
    }
    fn write(&mut self, _buf: &[u8]) -> Result<(), MediaError> {
        Err(MediaError::NotMounted)
    }
}

/// Interrupt and indicator side effects of one controller operation,
/// applied by the board after the handler returns.
#[derive(Default, Clone, Copy, Debug)]
pub struct DiskSignals {
    /// INTRQ, to be raised as CPU NMI.
    pub intrq_nmi: bool,
    /// Data-rate pulse, to be raised as cartridge FIRQ through PIA1.
    pub drq_firq: bool,
    /// Motor state changed; drive the host LED.
    pub motor: Option<bool>,
    /// Unknown command or drive-select invariant violated; fatal.
    pub fatal: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DiskState {
    Idle,
    Read,
    Write,
    ReadId,
    WriteTrack,
}

#[derive(Clone, Copy, Debug, Default)]
struct VdkHeader {
    header_size: u16,
    tracks: u8,
    sides: u8,
}

pub struct Wd2797 {
    status: u8,
    track: u8,
    sector: u8,
    data: u8,
    state: DiskState,

    nmi_inhibit: bool,
    motor_on: bool,
    double_density: bool,
    drive: u8,

    vdk: VdkHeader,
    buffer: Box<[u8; TRACK_BYTES]>,
    buffer_index: usize,
    /// Image offset the active WRITE/WRITE TRACK command will commit to.
    pending_offset: u32,

    /// Interrupt pacing timestamp; None while the tick machine is parked.
    time_mark: Option<u32>,
}

impl Wd2797 {
    pub fn new() -> Self {
        Self {
            status: ST_TRACK0,
            track: 0,
            sector: 1,
            data: 0,
            state: DiskState::Idle,
            nmi_inhibit: true,
            motor_on: false,
            double_density: false,
            drive: 0,
            vdk: VdkHeader::default(),
            buffer: Box::new([0; TRACK_BYTES]),
            buffer_index: 0,
            pending_offset: 0,
            time_mark: None,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn motor_on(&self) -> bool {
        self.motor_on
    }

    // --- Register access, dispatched by window offset (0xFF40 + offset) ---

    pub fn register_read(&mut self, offset: u16) -> u8 {
        match offset {
            0 => self.status,
            1 => self.track,
            2 => self.sector,
            3 => self.data_read(),
            _ => 0,
        }
    }

    pub fn register_write(
        &mut self,
        offset: u16,
        data: u8,
        img: &mut dyn ImageStream,
    ) -> DiskSignals {
        match offset {
            0 => self.command_write(data, img),
            1 => {
                if self.status & ST_BUSY == 0 {
                    self.track = data;
                }
                DiskSignals::default()
            }
            2 => {
                if self.status & ST_BUSY == 0 {
                    self.sector = data;
                }
                DiskSignals::default()
            }
            3 => self.data_write(data, img),
            8 => self.control_write(data),
            _ => DiskSignals::default(),
        }
    }

    // --- Command register ---

    fn command_write(&mut self, data: u8, img: &mut dyn ImageStream) -> DiskSignals {
        let mut signals = DiskSignals::default();

        if data == CMD_FORCE_INTERRUPT {
            debug!("wd2797: force interrupt");
            self.state = DiskState::Idle;
            self.status = 0;
            return signals;
        }
        if self.status & ST_BUSY != 0 {
            return signals;
        }

        if data & CMD_STEP_MASK == CMD_RESTORE {
            debug!("wd2797: restore");
            self.state = DiskState::Idle;
            self.track = 0;
            self.status = ST_TRACK0;
            signals.intrq_nmi = self.intrq();
        } else if data & CMD_STEP_MASK == CMD_SEEK {
            self.state = DiskState::Idle;
            self.track = self.data;
            self.status = if self.track == 0 { ST_TRACK0 } else { 0 };
            debug!("wd2797: seek track {}", self.track);
            signals.intrq_nmi = self.intrq();
        } else if data == CMD_READ_SECTOR {
            if img.image_type() != ImageType::None {
                match self.begin_sector_io(img) {
                    Ok(offset) => {
                        debug!(
                            "wd2797: read sector t={} s={} offset=0x{offset:08x}",
                            self.track, self.sector
                        );
                        let mut sector = [0u8; SECTOR_SIZE as usize];
                        match img.seek(offset).and_then(|_| img.read(&mut sector)) {
                            Ok(()) => {
                                self.buffer[..sector.len()].copy_from_slice(&sector);
                                self.state = DiskState::Read;
                                self.status = ST_BUSY;
                                self.buffer_index = 0;
                            }
                            Err(e) => self.media_fault("read sector", e),
                        }
                    }
                    Err(e) => self.media_fault("read sector", e),
                }
            }
        } else if data == CMD_WRITE_SECTOR {
            if img.image_type() != ImageType::None {
                match self.begin_sector_io(img) {
                    Ok(offset) => {
                        debug!(
                            "wd2797: write sector t={} s={} offset=0x{offset:08x}",
                            self.track, self.sector
                        );
                        self.pending_offset = offset;
                        self.state = DiskState::Write;
                        self.status = ST_BUSY;
                        self.buffer_index = 0;
                    }
                    Err(e) => self.media_fault("write sector", e),
                }
            }
        } else if data == CMD_READ_ADDRESS {
            debug!("wd2797: read address");
            self.buffer[0] = self.track;
            self.buffer[1] = 1;
            self.buffer[2] = self.sector;
            self.buffer[3] = (SECTOR_SIZE - 1) as u8;
            self.buffer[4] = 0xBE;
            self.buffer[5] = 0xEF;
            self.state = DiskState::ReadId;
            self.status = ST_BUSY;
            self.buffer_index = 0;
        } else if data == CMD_WRITE_TRACK {
            if img.image_type() != ImageType::None {
                match self.refresh_vdk_header(img) {
                    Ok(()) => {
                        debug!("wd2797: write track");
                        self.state = DiskState::WriteTrack;
                        self.status = ST_BUSY;
                        self.buffer_index = 0;
                    }
                    Err(e) => self.media_fault("write track", e),
                }
            }
        } else {
            error!("wd2797: illegal command 0x{data:02x}");
            self.state = DiskState::Idle;
            signals.fatal = true;
        }

        signals
    }

    // --- Data register ---

    fn data_read(&mut self) -> u8 {
        match self.state {
            DiskState::Read => {
                self.data = self.buffer[self.buffer_index];
                self.status &= !ST_DRQ;
                self.buffer_index += 1;
                if self.buffer_index == SECTOR_SIZE as usize {
                    self.state = DiskState::Idle;
                    self.status &= !ST_BUSY;
                }
                self.data
            }
            DiskState::ReadId => {
                self.data = self.buffer[self.buffer_index];
                self.status &= !ST_DRQ;
                self.buffer_index += 1;
                if self.buffer_index == ID_FIELD_SIZE {
                    self.state = DiskState::Idle;
                    self.status &= !(ST_BUSY | ST_DRQ);
                }
                self.data
            }
            _ => self.data,
        }
    }

    fn data_write(&mut self, data: u8, img: &mut dyn ImageStream) -> DiskSignals {
        self.data = data;
        match self.state {
            DiskState::Write => {
                self.buffer[self.buffer_index] = data;
                self.status &= !ST_DRQ;
                self.buffer_index += 1;
                if self.buffer_index == SECTOR_SIZE as usize {
                    self.state = DiskState::Idle;
                    let offset = self.pending_offset;
                    let sector = &self.buffer[..SECTOR_SIZE as usize];
                    if let Err(e) = img.seek(offset).and_then(|_| img.write(sector)) {
                        self.media_fault("write sector", e);
                    } else {
                        self.status &= !ST_BUSY;
                    }
                }
            }
            DiskState::WriteTrack => {
                self.status &= !ST_DRQ;
                if self.buffer_index < FORMAT_GAP_SKIP {
                    // Leading gap pattern; discarded.
                    self.buffer_index += 1;
                } else if self.buffer_index < FORMAT_GAP_SKIP + 4 {
                    // {track, head, sector, size} ID quad.
                    self.buffer[self.buffer_index] = data;
                    self.buffer_index += 1;
                } else {
                    self.state = DiskState::Idle;
                    let format_track = self.buffer[FORMAT_GAP_SKIP];
                    let offset =
                        self.image_offset(format_track, 1) + self.vdk.header_size as u32;
                    debug!("wd2797: formatting track {format_track} at 0x{offset:08x}");
                    self.buffer.fill(FORMAT_FILL);
                    let track = *self.buffer;
                    if let Err(e) = img.seek(offset).and_then(|_| img.write(&track)) {
                        self.media_fault("write track", e);
                    } else {
                        self.status &= !ST_BUSY;
                    }
                }
            }
            _ => {}
        }
        DiskSignals::default()
    }

    // --- Drive / motor control port (0xFF48) ---

    fn control_write(&mut self, data: u8) -> DiskSignals {
        let mut signals = DiskSignals::default();
        let new_drive = data & CTL_DRIVE_MASK;

        self.nmi_inhibit = data & CTL_NMI_ENABLE == 0;
        self.double_density = data & CTL_SINGLE_DENSITY != 0;
        let motor = data & CTL_MOTOR_ON != 0;
        if motor != self.motor_on {
            self.motor_on = motor;
            signals.motor = Some(motor);
        }

        if new_drive != self.drive {
            error!("wd2797: drive change to {new_drive} (single-drive machine)");
            signals.fatal = true;
        }

        debug!(
            "wd2797: control 0x{data:02x} nmi_inh={} motor={} dd={} precomp={}",
            self.nmi_inhibit,
            self.motor_on,
            self.double_density,
            data & CTL_WRITE_PRECOMP != 0
        );
        signals
    }

    // --- Interrupt pacing tick (call about every millisecond) ---

    /// Drives the two timed behaviours: while a command streams data, DRQ
    /// plus a cartridge FIRQ pulse per tick; 250 ms after the controller
    /// goes idle, one completion NMI.
    pub fn tick(&mut self, now_us: u32) -> DiskSignals {
        let mut signals = DiskSignals::default();

        if self.state != DiskState::Idle && self.time_mark.is_none() {
            self.time_mark = Some(now_us);
        }

        let duration = if self.state == DiskState::Idle {
            IDLE_NMI_DELAY_US
        } else {
            DISK_TICK_US
        };

        if let Some(mark) = self.time_mark {
            if now_us.wrapping_sub(mark) >= duration {
                if self.state == DiskState::Idle {
                    self.time_mark = None;
                    signals.intrq_nmi = self.intrq();
                } else {
                    self.time_mark = Some(now_us);
                    self.status |= ST_DRQ;
                    signals.drq_firq = true;
                }
            }
        }
        signals
    }

    // --- Helpers ---

    fn intrq(&self) -> bool {
        !self.nmi_inhibit
    }

    /// Byte offset of the current track/sector in the image, VDK header
    /// included. Refreshes the cached VDK geometry first.
    fn begin_sector_io(&mut self, img: &mut dyn ImageStream) -> Result<u32, MediaError> {
        self.refresh_vdk_header(img)?;
        Ok(self.image_offset(self.track, self.sector) + self.vdk.header_size as u32)
    }

    fn refresh_vdk_header(&mut self, img: &mut dyn ImageStream) -> Result<(), MediaError> {
        if img.image_type() == ImageType::Vdk {
            let mut header = [0u8; VDK_HEADER_BYTES];
            img.seek(0)?;
            img.read(&mut header)?;
            self.vdk = VdkHeader {
                header_size: u16::from_le_bytes([header[2], header[3]]),
                tracks: header[8],
                sides: header[9].max(1),
            };
            debug!(
                "wd2797: VDK header={} tracks={} sides={}",
                self.vdk.header_size, self.vdk.tracks, self.vdk.sides
            );
        } else {
            self.vdk = VdkHeader {
                header_size: 0,
                tracks: 40,
                sides: 1,
            };
        }
        Ok(())
    }

    /// Single-sided image offset: side 0 of `sides` interleaved track
    /// groups, 18 sectors of 256 bytes, sector numbering from 1.
    fn image_offset(&self, track: u8, sector: u8) -> u32 {
        let sides = self.vdk.sides.max(1) as u32;
        (track as u32 * sides) * SECTORS_PER_TRACK * SECTOR_SIZE
            + (sector.max(1) as u32 - 1) * SECTOR_SIZE
    }

    fn media_fault(&mut self, what: &str, e: MediaError) {
        warn!("wd2797: {what} failed: {e}");
        self.state = DiskState::Idle;
        self.status = ST_RECORD_NOT_FOUND | ST_CRC_ERROR;
        self.buffer_index = 0;
    }
}

impl Default for Wd2797 {
    fn default() -> Self {
        Self::new()
    }
}
