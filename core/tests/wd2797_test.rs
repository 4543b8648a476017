//! WD2797 command state machine against an in-memory VDK image.

use dragon_core::device::wd2797::{
    ImageStream, ImageType, MediaError, NoImage, Wd2797, ST_BUSY, ST_CRC_ERROR, ST_DRQ,
    ST_RECORD_NOT_FOUND, ST_TRACK0,
};

struct TestImage {
    kind: ImageType,
    bytes: Vec<u8>,
    position: usize,
}

impl TestImage {
    /// Blank VDK: 12-byte header, 40 tracks, 1 side.
    fn vdk() -> Self {
        let mut bytes = vec![b'D', b'K', 12, 0, 0x10, 0x10, 0, 0, 40, 1, 0, 0];
        bytes.resize(12 + 40 * 18 * 256, 0);
        Self {
            kind: ImageType::Vdk,
            bytes,
            position: 0,
        }
    }
}

impl ImageStream for TestImage {
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

/// Image offset of (track, sector) in a single-sided VDK.
fn vdk_offset(track: u32, sector: u32) -> usize {
    (12 + track * 18 * 256 + (sector - 1) * 256) as usize
}

#[test]
fn restore_homes_to_track_zero() {
    let mut disk = Wd2797::new();
    let mut img = TestImage::vdk();
    disk.register_write(1, 17, &mut img); // track register
    let signals = disk.register_write(0, 0x00, &mut img); // RESTORE
    assert_eq!(disk.register_read(1), 0);
    assert_eq!(disk.register_read(0), ST_TRACK0);
    assert!(!signals.intrq_nmi, "NMI still inhibited after power-on");
}

#[test]
fn seek_loads_track_from_data_register() {
    let mut disk = Wd2797::new();
    let mut img = TestImage::vdk();
    disk.register_write(8, 0x24, &mut img); // NMI enable + motor on
    disk.register_write(3, 5, &mut img); // data register = target track
    let signals = disk.register_write(0, 0x10, &mut img); // SEEK
    assert_eq!(disk.register_read(1), 5);
    assert_eq!(disk.register_read(0) & ST_TRACK0, 0);
    assert!(signals.intrq_nmi, "completion INTRQ with NMI enabled");
}

#[test]
fn read_sector_streams_256_bytes() {
    let mut disk = Wd2797::new();
    let mut img = TestImage::vdk();
    let base = vdk_offset(1, 2);
    for (i, b) in img.bytes[base..base + 256].iter_mut().enumerate() {
        *b = i as u8;
    }
    img.bytes[base] = 0xA5;

    disk.register_write(3, 1, &mut img);
    disk.register_write(0, 0x10, &mut img); // seek track 1
    disk.register_write(2, 2, &mut img); // sector 2
    disk.register_write(0, 0x88, &mut img); // READ SECTOR
    assert_ne!(disk.register_read(0) & ST_BUSY, 0);

    assert_eq!(disk.register_read(3), 0xA5, "first byte of the sector");
    for i in 1..256 {
        assert_eq!(disk.register_read(3), i as u8);
    }
    assert_eq!(disk.register_read(0) & ST_BUSY, 0, "busy clears after 256");
}

#[test]
fn read_sector_idle_nmi_after_completion_delay() {
    let mut disk = Wd2797::new();
    let mut img = TestImage::vdk();
    disk.register_write(8, 0x24, &mut img); // NMI enable
    disk.register_write(0, 0x88, &mut img); // READ SECTOR on track 0/sector 1

    // While streaming: DRQ + FIRQ pulses at the 1 ms cadence.
    let s = disk.tick(10); // arms the mark
    assert!(!s.drq_firq);
    let s = disk.tick(10 + 1_000);
    assert!(s.drq_firq, "data-rate FIRQ while busy");
    assert_ne!(disk.register_read(0) & ST_DRQ, 0);

    for _ in 0..256 {
        disk.register_read(3);
    }
    // Back to idle: NMI after the 250 ms completion delay.
    let s = disk.tick(20_000);
    assert!(!s.intrq_nmi, "too early");
    let s = disk.tick(20_000 + 250_000);
    assert!(s.intrq_nmi, "completion NMI");
    let s = disk.tick(600_000);
    assert!(!s.intrq_nmi, "one-shot");
}

#[test]
fn write_sector_round_trip() {
    let mut disk = Wd2797::new();
    let mut img = TestImage::vdk();

    disk.register_write(3, 3, &mut img);
    disk.register_write(0, 0x10, &mut img); // seek track 3
    disk.register_write(2, 7, &mut img); // sector 7
    disk.register_write(0, 0xA8, &mut img); // WRITE SECTOR
    assert_ne!(disk.register_read(0) & ST_BUSY, 0);
    for i in 0..256u32 {
        disk.register_write(3, (255 - i) as u8, &mut img);
    }
    assert_eq!(disk.register_read(0) & ST_BUSY, 0);

    let base = vdk_offset(3, 7);
    assert_eq!(img.bytes[base], 255);
    assert_eq!(img.bytes[base + 255], 0);

    // READ back returns what was written.
    disk.register_write(0, 0x88, &mut img);
    assert_eq!(disk.register_read(3), 255);
}

#[test]
fn read_address_returns_id_field() {
    let mut disk = Wd2797::new();
    let mut img = TestImage::vdk();
    disk.register_write(3, 9, &mut img);
    disk.register_write(0, 0x10, &mut img); // seek track 9
    disk.register_write(2, 4, &mut img);
    disk.register_write(0, 0xC0, &mut img); // READ ADDRESS
    let id: Vec<u8> = (0..6).map(|_| disk.register_read(3)).collect();
    assert_eq!(id, vec![9, 1, 4, 0xFF, 0xBE, 0xEF]);
    assert_eq!(disk.register_read(0) & ST_BUSY, 0);
}

#[test]
fn write_track_formats_with_fill() {
    let mut disk = Wd2797::new();
    let mut img = TestImage::vdk();
    disk.register_write(0, 0xF4, &mut img); // WRITE TRACK

    // 111 gap bytes, then the {track, head, sector, size} quad.
    for _ in 0..111 {
        disk.register_write(3, 0x4E, &mut img);
    }
    for b in [2u8, 0, 1, 1] {
        disk.register_write(3, b, &mut img);
    }
    disk.register_write(3, 0x00, &mut img); // completion byte

    assert_eq!(disk.register_read(0) & ST_BUSY, 0);
    let base = vdk_offset(2, 1);
    assert!(img.bytes[base..base + 18 * 256].iter().all(|&b| b == 0xE5));
}

#[test]
fn force_interrupt_goes_idle_without_intrq() {
    let mut disk = Wd2797::new();
    let mut img = TestImage::vdk();
    disk.register_write(0, 0x88, &mut img);
    assert_ne!(disk.register_read(0) & ST_BUSY, 0);
    let signals = disk.register_write(0, 0xD0, &mut img);
    assert!(!signals.intrq_nmi);
    assert_eq!(disk.register_read(0), 0);
}

#[test]
fn registers_locked_while_busy() {
    let mut disk = Wd2797::new();
    let mut img = TestImage::vdk();
    disk.register_write(2, 5, &mut img);
    disk.register_write(0, 0x88, &mut img); // busy now
    disk.register_write(1, 20, &mut img);
    disk.register_write(2, 9, &mut img);
    assert_eq!(disk.register_read(1), 0);
    assert_eq!(disk.register_read(2), 5);
}

#[test]
fn commands_refused_without_image() {
    let mut disk = Wd2797::new();
    let mut img = NoImage;
    disk.register_write(0, 0x88, &mut img);
    assert_eq!(disk.register_read(0) & ST_BUSY, 0, "no image, no command");
    // FORCE INTERRUPT still accepted.
    let signals = disk.register_write(0, 0xD0, &mut img);
    assert!(!signals.fatal);
}

#[test]
fn seek_past_end_reports_record_not_found() {
    let mut disk = Wd2797::new();
    let mut img = TestImage::vdk();
    disk.register_write(3, 60, &mut img); // beyond 40 tracks
    disk.register_write(0, 0x10, &mut img);
    disk.register_write(0, 0x88, &mut img); // READ SECTOR off the end
    let status = disk.register_read(0);
    assert_ne!(status & (ST_RECORD_NOT_FOUND | ST_CRC_ERROR), 0);
    assert_eq!(status & ST_BUSY, 0);
}

#[test]
fn motor_bit_drives_led_signal() {
    let mut disk = Wd2797::new();
    let mut img = TestImage::vdk();
    let signals = disk.register_write(8, 0x04, &mut img);
    assert_eq!(signals.motor, Some(true));
    assert!(disk.motor_on());
    let signals = disk.register_write(8, 0x00, &mut img);
    assert_eq!(signals.motor, Some(false));
}

#[test]
fn drive_change_is_fatal() {
    let mut disk = Wd2797::new();
    let mut img = TestImage::vdk();
    let signals = disk.register_write(8, 0x01, &mut img); // select drive 1
    assert!(signals.fatal);
}

#[test]
fn illegal_command_is_fatal() {
    let mut disk = Wd2797::new();
    let mut img = TestImage::vdk();
    let signals = disk.register_write(0, 0xE0, &mut img);
    assert!(signals.fatal);
}
