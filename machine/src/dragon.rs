//! Dragon 32 board and executive loop.
//!
//! The board owns the tagged 64 KiB memory, all peripheral models and the
//! host collaborators, and implements the CPU-facing `Bus` by dispatching
//! I/O-window accesses through a closed slot enum. The executive drives
//! one CPU instruction per iteration, polls the reset button, paces the
//! disk interrupt tick and refreshes the VDG frame at 50 Hz.

use log::{error, info, warn};

use dragon_core::core::{Bus, CellTag, CpuView, InterruptState, MemOp, Memory};
use dragon_core::cpu::{Mc6809, RunState};
use dragon_core::device::keyboard::FunctionKey;
use dragon_core::device::sam::{SAM_BASE, SAM_LAST};
use dragon_core::device::tape::CAS_LAST_SINE;
use dragon_core::device::vdg::FRAME_SIZE;
use dragon_core::device::wd2797::{DiskSignals, ImageStream};
use dragon_core::device::{Keyboard, Mc6821, Sam, TapeTrap, Vdg, Wd2797};

use crate::host::{HostIo, MOTOR_LED_DISK};

// Memory windows.
const ROM_BASE: u16 = 0x8000;
const ROM_LAST: u16 = 0xFEFF;
const DOS_ROM_BASE: u16 = 0xC000;
const VECTOR_BASE: u16 = 0xFFF0;
const PIA0_BASE: u16 = 0xFF00;
const PIA1_BASE: u16 = 0xFF20;
const DISK_BASE: u16 = 0xFF40;
const DISK_LAST: u16 = 0xFF48;

/// BASIC warm/cold start marker; anything but 0x55 forces a cold start.
const COLD_START_FLAG: u16 = 0x0071;
/// EXEC default vector, pointed at a freshly loaded cartridge.
const EXEC_VECTOR: u16 = 0x009D;

const VDG_REFRESH_US: u32 = 1_000_000 / 50;
const LONG_RESET_US: u32 = 1_500_000;

/// I/O window owners; the slot byte stored in the memory tags indexes this
/// closed set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum IoSlot {
    Pia0,
    Pia1,
    Disk,
    Sam,
    Tape,
}

const IO_SLOTS: [IoSlot; 5] = [
    IoSlot::Pia0,
    IoSlot::Pia1,
    IoSlot::Disk,
    IoSlot::Sam,
    IoSlot::Tape,
];

/// Event returned by one executive iteration for the embedding binary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecEvent {
    None,
    /// F1 pressed: suspend emulation and hand over to the loader.
    LoaderEscape,
    /// Illegal opcode; the CPU is stopped at the offending address.
    Exception,
    /// A fatal invariant failed; `HostIo::halt` has been called.
    Halted,
}

struct Board<H: HostIo, D: ImageStream> {
    mem: Memory,
    sam: Sam,
    vdg: Vdg,
    pia0: Mc6821,
    pia1: Mc6821,
    keyboard: Keyboard,
    disk: Wd2797,
    tape: TapeTrap,
    disk_image: D,
    host: H,
    nmi_latch: bool,
    last_mux: u8,
    fatal: bool,
}

impl<H: HostIo, D: ImageStream> Board<H, D> {
    fn io_access(&mut self, cpu: &CpuView, slot: IoSlot, addr: u16, data: u8, op: MemOp) -> u8 {
        let write = op == MemOp::Write;
        match slot {
            IoSlot::Pia0 => self.pia0_access(addr, data, write),
            IoSlot::Pia1 => self.pia1_access(addr, data, write),
            IoSlot::Disk => {
                if write {
                    let signals =
                        self.disk
                            .register_write(addr - DISK_BASE, data, &mut self.disk_image);
                    self.apply_disk_signals(signals);
                    data
                } else {
                    self.disk.register_read(addr - DISK_BASE)
                }
            }
            IoSlot::Sam => {
                if write {
                    self.sam.write(addr);
                    self.vdg.set_sam_mode(self.sam.video_mode());
                    self.vdg.set_video_offset(self.sam.video_ram_offset());
                    data
                } else {
                    self.sam.read()
                }
            }
            IoSlot::Tape => {
                // The trap address is an ordinary RAM variable to the ROM;
                // keep the backing byte live while counting accesses.
                if write {
                    self.mem.set_byte(addr, data);
                }
                let stack_byte = self.mem.byte(cpu.s);
                if let Some(file) = self.tape.on_access(cpu, stack_byte) {
                    if let Err(e) = self.host.write_tape(&file.name, &file.data) {
                        warn!("tape: writing '{}' failed: {e}", file.name);
                    }
                }
                self.mem.byte(addr)
            }
        }
    }

    fn pia0_access(&mut self, addr: u16, data: u8, write: bool) -> u8 {
        let offset = (addr & 0x03) as u8;
        let result = if write {
            self.pia0.write(offset, data);
            data
        } else {
            // Port A senses the joystick comparator on bit 7; port B senses
            // the keyboard rows for the column strobe driven on port A.
            if offset == 0 {
                let comparator = (self.host.joystick_comparator() as u8) << 7;
                self.pia0.set_port_a_input(comparator | 0x7F);
            }
            if offset == 2 {
                let strobe = self.pia0.output_a();
                self.pia0.set_port_b_input(self.keyboard.row_sense(strobe));
            }
            self.pia0.read(offset)
        };

        // CA2/CB2 drive the analog multiplexer select lines.
        let mux = (self.pia0.cb2_output() as u8) << 1 | self.pia0.ca2_output() as u8;
        if mux != self.last_mux {
            self.last_mux = mux;
            self.host.audio_mux_select(mux);
        }
        result
    }

    fn pia1_access(&mut self, addr: u16, data: u8, write: bool) -> u8 {
        let offset = (addr & 0x03) as u8;
        if write {
            self.pia1.write(offset, data);
            match offset {
                0 => {
                    // Port A bits 7:2 feed the 6-bit DAC.
                    self.host.write_dac(self.pia1.output_a() >> 2);
                }
                2 => {
                    // Port B bits 7:3 are the VDG mode lines.
                    self.vdg.set_pia_mode(self.pia1.output_b() >> 3);
                }
                _ => {}
            }
            data
        } else {
            if offset == 0 {
                // Bit 1 is the cassette input, idle low; the rest pull up.
                self.pia1.set_port_a_input(0xFD);
            }
            self.pia1.read(offset)
        }
    }

    fn apply_disk_signals(&mut self, signals: DiskSignals) {
        if signals.intrq_nmi {
            self.nmi_latch = true;
        }
        if signals.drq_firq {
            // Cartridge FIRQ enters through PIA1 CB1; a full pulse covers
            // either programmed edge polarity.
            self.pia1.set_cb1(true);
            self.pia1.set_cb1(false);
        }
        if let Some(on) = signals.motor {
            if on {
                self.host.motor_led_on(MOTOR_LED_DISK);
            } else {
                self.host.motor_led_off(MOTOR_LED_DISK);
            }
        }
        if signals.fatal {
            self.fail("wd2797 invariant violated");
        }
    }

    fn fail(&mut self, reason: &str) {
        error!("fatal: {reason}");
        self.host.halt(reason);
        self.fatal = true;
    }

    fn render_frame(&mut self) {
        let Self { vdg, mem, .. } = self;
        if let Err(e) = vdg.render(|addr| mem.byte(addr)) {
            let reason = e.to_string();
            self.fail(&reason);
        }
    }

    /// 50 Hz field sync pulse into PIA0 CB1.
    fn vsync(&mut self) {
        self.pia0.set_cb1(true);
        self.pia0.set_cb1(false);
    }
}

impl<H: HostIo, D: ImageStream> Bus for Board<H, D> {
    fn read(&mut self, cpu: &CpuView, addr: u16) -> u8 {
        match self.mem.tag(addr) {
            CellTag::Ram | CellTag::Rom => self.mem.byte(addr),
            CellTag::Io(slot) => match IO_SLOTS.get(slot as usize) {
                Some(&slot) => self.io_access(cpu, slot, addr, 0, MemOp::Read),
                None => 0,
            },
        }
    }

    fn write(&mut self, cpu: &CpuView, addr: u16, data: u8) {
        match self.mem.tag(addr) {
            CellTag::Ram | CellTag::Rom => {
                self.mem.set_byte(addr, data);
            }
            CellTag::Io(slot) => {
                if let Some(&slot) = IO_SLOTS.get(slot as usize) {
                    self.io_access(cpu, slot, addr, data, MemOp::Write);
                }
            }
        }
    }

    fn check_interrupts(&mut self) -> InterruptState {
        InterruptState {
            nmi: std::mem::take(&mut self.nmi_latch),
            firq: self.pia1.irq_a() || self.pia1.irq_b(),
            irq: self.pia0.irq_a() || self.pia0.irq_b(),
        }
    }
}

pub struct Dragon32<H: HostIo, D: ImageStream> {
    cpu: Mc6809,
    board: Board<H, D>,
    last_refresh: u32,
}

impl<H: HostIo, D: ImageStream> Dragon32<H, D> {
    /// Build the board with the standard memory map. ROM images still need
    /// to be loaded and sealed before the first reset.
    pub fn new(host: H, disk_image: D) -> Self {
        let mut mem = Memory::new();
        mem.define_io(PIA0_BASE, PIA0_BASE + 3, IoSlot::Pia0 as u8);
        mem.define_io(PIA1_BASE, PIA1_BASE + 3, IoSlot::Pia1 as u8);
        mem.define_io(DISK_BASE, DISK_LAST, IoSlot::Disk as u8);
        mem.define_io(SAM_BASE, SAM_LAST, IoSlot::Sam as u8);
        mem.define_io(CAS_LAST_SINE, CAS_LAST_SINE, IoSlot::Tape as u8);

        Self {
            cpu: Mc6809::new(),
            board: Board {
                mem,
                sam: Sam::new(),
                vdg: Vdg::new(),
                pia0: Mc6821::new(),
                pia1: Mc6821::new(),
                keyboard: Keyboard::new(),
                disk: Wd2797::new(),
                tape: TapeTrap::new(),
                disk_image,
                host,
                nmi_latch: false,
                last_mux: 0,
                fatal: false,
            },
            last_refresh: 0,
        }
    }

    // --- ROM loading ---

    /// Load the 16 KiB BASIC ROM at 0x8000.
    pub fn load_basic_rom(&mut self, image: &[u8]) {
        self.board.mem.load(ROM_BASE, image);
        info!("loaded BASIC ROM, {} bytes", image.len());
    }

    /// Load the DOS ROM at 0xC000.
    pub fn load_dos_rom(&mut self, image: &[u8]) {
        self.board.mem.load(DOS_ROM_BASE, image);
        info!("loaded DOS ROM, {} bytes", image.len());
    }

    /// Load a cartridge ROM at 0xC000 and point the BASIC EXEC vector at
    /// its entry.
    pub fn load_cartridge(&mut self, image: &[u8]) {
        self.board.mem.load(DOS_ROM_BASE, image);
        let entry = DOS_ROM_BASE.to_be_bytes();
        self.board.mem.set_byte(EXEC_VECTOR, entry[0]);
        self.board.mem.set_byte(EXEC_VECTOR + 1, entry[1]);
        info!("loaded cartridge ROM, {} bytes", image.len());
    }

    /// Write-protect the ROM region and mirror the top of the BASIC ROM
    /// into the interrupt-vector page.
    pub fn seal_roms(&mut self) {
        for offset in 0..16u16 {
            let byte = self.board.mem.byte(0xBFF0 + offset);
            self.board.mem.set_byte(VECTOR_BASE + offset, byte);
        }
        self.board.mem.define_rom(ROM_BASE, ROM_LAST);
        self.board.mem.define_rom(VECTOR_BASE, 0xFFFF);
    }

    // --- Reset ---

    /// Reset peripherals and the CPU. Cold additionally clears the CPU
    /// register file; the BASIC cold/warm distinction is made separately
    /// through the 0x0071 marker.
    pub fn reset(&mut self, cold: bool) {
        self.board.sam.reset();
        self.board.vdg.reset();
        self.board.pia0.reset();
        self.board.pia1.reset();
        self.board.keyboard.reset();
        self.board.disk.reset();
        self.board.tape.reset();
        self.board.nmi_latch = false;
        self.cpu.reset(&mut self.board, cold);
    }

    // --- Executive loop ---

    /// One executive iteration: a CPU instruction plus housekeeping.
    pub fn run_iteration(&mut self) -> ExecEvent {
        if self.board.fatal {
            return ExecEvent::Halted;
        }

        match self.cpu.step(&mut self.board) {
            RunState::Exception => {
                let state = self.cpu.snapshot();
                error!(
                    "op-code exception at pc=0x{:04x} last_pc=0x{:04x}",
                    state.pc, state.last_pc
                );
                return ExecEvent::Exception;
            }
            _ => {}
        }

        self.poll_reset();

        let now = self.board.host.now_us();
        let signals = self.board.disk.tick(now);
        self.board.apply_disk_signals(signals);

        let scan = self.board.host.read_scan_code();
        self.board.keyboard.process_scan_code(scan);
        if self.board.keyboard.take_function_key() == FunctionKey::LoaderEscape {
            return ExecEvent::LoaderEscape;
        }

        let now = self.board.host.now_us();
        if now.wrapping_sub(self.last_refresh) >= VDG_REFRESH_US {
            self.last_refresh = now;
            self.board.render_frame();
            self.board.vsync();
        }

        if self.board.fatal {
            return ExecEvent::Halted;
        }
        ExecEvent::None
    }

    /// Run until an event stops the loop.
    pub fn run(&mut self) -> ExecEvent {
        loop {
            let event = self.run_iteration();
            if event != ExecEvent::None {
                return event;
            }
        }
    }

    /// Reset button scan: the press is timed to completion, then a short
    /// press warm-restarts and a long press (≥1.5 s) clears the BASIC
    /// cold-start marker so the ROM runs its cold path.
    fn poll_reset(&mut self) {
        if !self.board.host.reset_button() {
            return;
        }
        let start = self.board.host.now_us();
        while self.board.host.reset_button() {}
        let held = self.board.host.now_us().wrapping_sub(start);

        let cold = held >= LONG_RESET_US;
        if cold {
            self.board.mem.set_byte(COLD_START_FLAG, 0);
            info!("force cold restart");
        }
        self.reset(cold);
    }

    // --- Accessors ---

    pub fn cpu(&self) -> &Mc6809 {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Mc6809 {
        &mut self.cpu
    }

    pub fn host(&self) -> &H {
        &self.board.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.board.host
    }

    pub fn disk_image(&self) -> &D {
        &self.board.disk_image
    }

    pub fn disk_image_mut(&mut self) -> &mut D {
        &mut self.board.disk_image
    }

    pub fn frame(&self) -> &[u8; FRAME_SIZE] {
        self.board.vdg.frame()
    }

    pub fn render_frame(&mut self) {
        self.board.render_frame();
    }

    pub fn memory(&self) -> &Memory {
        &self.board.mem
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.board.mem
    }

    /// Bus access with an anonymous CPU view (host/debugger path).
    pub fn bus_read(&mut self, addr: u16) -> u8 {
        self.board.read(&CpuView::default(), addr)
    }

    pub fn bus_write(&mut self, addr: u16, data: u8) {
        self.board.write(&CpuView::default(), addr, data);
    }

    /// Bus access attributed to a specific CPU view, for trap-sensitive
    /// addresses.
    pub fn bus_write_as(&mut self, view: CpuView, addr: u16, data: u8) {
        self.board.write(&view, addr, data);
    }

    pub fn mnemonic_at(&mut self, pc: u16) -> String {
        let Self { cpu, board, .. } = self;
        cpu.mnemonic_at(board, pc)
    }
}
