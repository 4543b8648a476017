//! MC6809E interpreter.
//!
//! One full instruction executes per `step()` call, which keeps the
//! executive loop in control for breakpoints, tracing and interrupt
//! scheduling. Interrupt request lines are latched and sampled only at
//! instruction boundaries (plus the CWAI/SYNC wake-up paths).

mod alu;
mod branch;
mod load_store;
mod stack;
mod transfer;

use crate::core::{Bus, CpuView, InterruptState};
use crate::cpu::{CpuState, RunState};

/// Condition code register bits.
#[repr(u8)]
#[derive(Copy, Clone, Debug)]
pub enum CcFlag {
    C = 0x01, // Carry
    V = 0x02, // Overflow
    Z = 0x04, // Zero
    N = 0x08, // Negative
    I = 0x10, // IRQ mask
    H = 0x20, // Half carry
    F = 0x40, // FIRQ mask
    E = 0x80, // Entire state stacked
}

/// Interrupt and software-trap vectors.
pub(crate) mod vector {
    pub const SWI3: u16 = 0xFFF2;
    pub const SWI2: u16 = 0xFFF4;
    pub const FIRQ: u16 = 0xFFF6;
    pub const IRQ: u16 = 0xFFF8;
    pub const SWI: u16 = 0xFFFA;
    pub const NMI: u16 = 0xFFFC;
    pub const RESET: u16 = 0xFFFE;
}

pub struct Mc6809 {
    // Register file
    pub a: u8,
    pub b: u8,
    pub dp: u8,
    pub cc: u8,
    pub x: u16,
    pub y: u16,
    pub u: u16,
    pub s: u16,
    pub pc: u16,

    // Per-instruction shadow
    pub(crate) run_state: RunState,
    pub(crate) last_pc: u16,
    pub(crate) last_opcode: [u8; 5],
    pub(crate) last_opcode_len: u8,

    // Interrupt request latches set by `irq`/`firq`/`nmi` or merged from the
    // bus; cleared when the corresponding interrupt is accepted.
    pub(crate) lines: InterruptState,
    // NMI is ignored until the first load of S after reset.
    pub(crate) nmi_armed: bool,
}

impl Mc6809 {
    pub fn new() -> Self {
        Self {
            a: 0,
            b: 0,
            dp: 0,
            cc: CcFlag::I as u8 | CcFlag::F as u8,
            x: 0,
            y: 0,
            u: 0,
            s: 0,
            pc: 0,
            run_state: RunState::Running,
            last_pc: 0,
            last_opcode: [0; 5],
            last_opcode_len: 0,
            lines: InterruptState::default(),
            nmi_armed: false,
        }
    }

    // --- Register helpers ---

    pub fn get_d(&self) -> u16 {
        u16::from_be_bytes([self.a, self.b])
    }

    pub fn set_d(&mut self, val: u16) {
        let bytes = val.to_be_bytes();
        self.a = bytes[0];
        self.b = bytes[1];
    }

    #[inline]
    pub(crate) fn set_flag(&mut self, flag: CcFlag, set: bool) {
        if set {
            self.cc |= flag as u8
        } else {
            self.cc &= !(flag as u8)
        }
    }

    #[inline]
    pub(crate) fn flag(&self, flag: CcFlag) -> bool {
        self.cc & flag as u8 != 0
    }

    /// All S loads go through here so the post-reset NMI window closes at
    /// the right moment.
    #[inline]
    pub(crate) fn set_s(&mut self, val: u16) {
        self.s = val;
        self.nmi_armed = true;
    }

    fn view(&self) -> CpuView {
        CpuView {
            pc: self.pc,
            s: self.s,
            last_pc: self.last_pc,
        }
    }

    // --- Bus access helpers ---

    pub(crate) fn rd(&mut self, bus: &mut dyn Bus, addr: u16) -> u8 {
        bus.read(&self.view(), addr)
    }

    pub(crate) fn wr(&mut self, bus: &mut dyn Bus, addr: u16, data: u8) {
        bus.write(&self.view(), addr, data)
    }

    pub(crate) fn rd16(&mut self, bus: &mut dyn Bus, addr: u16) -> u16 {
        let hi = self.rd(bus, addr);
        let lo = self.rd(bus, addr.wrapping_add(1));
        u16::from_be_bytes([hi, lo])
    }

    pub(crate) fn wr16(&mut self, bus: &mut dyn Bus, addr: u16, data: u16) {
        let bytes = data.to_be_bytes();
        self.wr(bus, addr, bytes[0]);
        self.wr(bus, addr.wrapping_add(1), bytes[1]);
    }

    /// Fetch one instruction byte at PC, recording it in the opcode shadow.
    pub(crate) fn fetch_byte(&mut self, bus: &mut dyn Bus) -> u8 {
        let byte = self.rd(bus, self.pc);
        self.pc = self.pc.wrapping_add(1);
        if (self.last_opcode_len as usize) < self.last_opcode.len() {
            self.last_opcode[self.last_opcode_len as usize] = byte;
            self.last_opcode_len += 1;
        }
        byte
    }

    pub(crate) fn fetch_word(&mut self, bus: &mut dyn Bus) -> u16 {
        let hi = self.fetch_byte(bus);
        let lo = self.fetch_byte(bus);
        u16::from_be_bytes([hi, lo])
    }

    // --- External control ---

    /// Latch the maskable interrupt request line.
    pub fn irq(&mut self) {
        self.lines.irq = true;
    }

    /// Latch the fast interrupt request line.
    pub fn firq(&mut self) {
        self.lines.firq = true;
    }

    /// Latch the non-maskable interrupt request line.
    pub fn nmi(&mut self) {
        self.lines.nmi = true;
    }

    /// Merge externally computed line state into the latches.
    pub fn signal_interrupt(&mut self, int: InterruptState) {
        self.lines.nmi |= int.nmi;
        self.lines.firq |= int.firq;
        self.lines.irq |= int.irq;
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn snapshot(&self) -> CpuState {
        CpuState {
            a: self.a,
            b: self.b,
            dp: self.dp,
            cc: self.cc,
            x: self.x,
            y: self.y,
            u: self.u,
            s: self.s,
            pc: self.pc,
            last_pc: self.last_pc,
            last_opcode: self.last_opcode,
            last_opcode_len: self.last_opcode_len,
            run_state: self.run_state,
        }
    }

    /// Reset per the MC6809E datasheet. Cold reset clears the register file
    /// and re-arms the NMI inhibit window; warm reset only masks interrupts
    /// and re-fetches the vector.
    pub fn reset(&mut self, bus: &mut dyn Bus, cold: bool) {
        if cold {
            self.a = 0;
            self.b = 0;
            self.x = 0;
            self.y = 0;
            self.u = 0;
            self.s = 0;
            self.dp = 0;
            self.cc = CcFlag::I as u8 | CcFlag::F as u8;
            self.nmi_armed = false;
        } else {
            self.cc |= CcFlag::I as u8 | CcFlag::F as u8;
        }
        self.lines = InterruptState::default();
        self.pc = self.rd16(bus, vector::RESET);
        self.run_state = RunState::Running;
    }

    /// Execute one instruction (or service one interrupt) and return the
    /// resulting run state.
    pub fn step(&mut self, bus: &mut dyn Bus) -> RunState {
        self.signal_interrupt(bus.check_interrupts());

        match self.run_state {
            RunState::Halted | RunState::Exception => return self.run_state,
            RunState::WaitingInterrupt => return self.wake_from_cwai(bus),
            RunState::Syncing => {
                if !self.lines.any() {
                    return RunState::Syncing;
                }
                self.run_state = RunState::Running;
            }
            RunState::Running => {}
        }

        if self.dispatch_interrupt(bus) {
            return self.run_state;
        }

        self.last_pc = self.pc;
        self.last_opcode_len = 0;
        let opcode = self.fetch_byte(bus);
        self.execute(bus, opcode);
        self.run_state
    }

    /// Take the highest-priority pending unmasked interrupt, if any.
    /// Returns true when an interrupt was accepted this step.
    fn dispatch_interrupt(&mut self, bus: &mut dyn Bus) -> bool {
        if self.lines.nmi && self.nmi_armed {
            self.lines.nmi = false;
            self.service_nmi(bus);
            true
        } else if self.lines.firq && !self.flag(CcFlag::F) {
            self.lines.firq = false;
            self.service_firq(bus);
            true
        } else if self.lines.irq && !self.flag(CcFlag::I) {
            self.lines.irq = false;
            self.service_irq(bus);
            true
        } else {
            false
        }
    }

    fn illegal_opcode(&mut self, opcode: u8) {
        log::error!(
            "illegal opcode 0x{opcode:02x} at 0x{:04x}",
            self.last_pc
        );
        self.run_state = RunState::Exception;
    }

    fn execute(&mut self, bus: &mut dyn Bus, opcode: u8) {
        match opcode {
            // Page prefixes
            0x10 => {
                let next = self.fetch_byte(bus);
                self.execute_page2(bus, next);
            }
            0x11 => {
                let next = self.fetch_byte(bus);
                self.execute_page3(bus, next);
            }

            // Misc inherent / immediate
            0x12 => {} // NOP
            0x13 => self.op_sync(),
            0x19 => self.op_daa(),
            0x1A => self.op_orcc(bus),
            0x1C => self.op_andcc(bus),
            0x1D => self.op_sex(),
            0x1E => self.op_exg(bus),
            0x1F => self.op_tfr(bus),
            0x3A => self.op_abx(),
            0x3C => self.op_cwai(bus),
            0x3D => self.op_mul(),
            0x3F => self.op_swi(bus),

            // Direct-page memory unary/shift (0x00-0x0F)
            0x00 => self.rmw_direct(bus, Self::neg8),
            0x03 => self.rmw_direct(bus, Self::com8),
            0x04 => self.rmw_direct(bus, Self::lsr8),
            0x06 => self.rmw_direct(bus, Self::ror8),
            0x07 => self.rmw_direct(bus, Self::asr8),
            0x08 => self.rmw_direct(bus, Self::asl8),
            0x09 => self.rmw_direct(bus, Self::rol8),
            0x0A => self.rmw_direct(bus, Self::dec8),
            0x0C => self.rmw_direct(bus, Self::inc8),
            0x0D => self.tst_direct(bus),
            0x0E => self.op_jmp_direct(bus),
            0x0F => self.clr_direct(bus),

            // Branches
            0x16 => self.op_lbra(bus),
            0x17 => self.op_lbsr(bus),
            0x20..=0x2F => self.op_branch_short(bus, opcode & 0x0F),

            // LEA
            0x30 => self.op_leax(bus),
            0x31 => self.op_leay(bus),
            0x32 => self.op_leas(bus),
            0x33 => self.op_leau(bus),

            // Stack ops
            0x34 => self.op_pshs(bus),
            0x35 => self.op_puls(bus),
            0x36 => self.op_pshu(bus),
            0x37 => self.op_pulu(bus),

            // Subroutine / return
            0x39 => self.op_rts(bus),
            0x3B => self.op_rti(bus),
            0x8D => self.op_bsr(bus),

            // Accumulator A unary/shift (0x40-0x4F)
            0x40 => self.a = self.neg8(self.a),
            0x43 => self.a = self.com8(self.a),
            0x44 => self.a = self.lsr8(self.a),
            0x46 => self.a = self.ror8(self.a),
            0x47 => self.a = self.asr8(self.a),
            0x48 => self.a = self.asl8(self.a),
            0x49 => self.a = self.rol8(self.a),
            0x4A => self.a = self.dec8(self.a),
            0x4C => self.a = self.inc8(self.a),
            0x4D => self.tst8(self.a),
            0x4F => self.a = self.clr8(),

            // Accumulator B unary/shift (0x50-0x5F)
            0x50 => self.b = self.neg8(self.b),
            0x53 => self.b = self.com8(self.b),
            0x54 => self.b = self.lsr8(self.b),
            0x56 => self.b = self.ror8(self.b),
            0x57 => self.b = self.asr8(self.b),
            0x58 => self.b = self.asl8(self.b),
            0x59 => self.b = self.rol8(self.b),
            0x5A => self.b = self.dec8(self.b),
            0x5C => self.b = self.inc8(self.b),
            0x5D => self.tst8(self.b),
            0x5F => self.b = self.clr8(),

            // Indexed memory unary/shift (0x60-0x6F)
            0x60 => self.rmw_indexed(bus, Self::neg8),
            0x63 => self.rmw_indexed(bus, Self::com8),
            0x64 => self.rmw_indexed(bus, Self::lsr8),
            0x66 => self.rmw_indexed(bus, Self::ror8),
            0x67 => self.rmw_indexed(bus, Self::asr8),
            0x68 => self.rmw_indexed(bus, Self::asl8),
            0x69 => self.rmw_indexed(bus, Self::rol8),
            0x6A => self.rmw_indexed(bus, Self::dec8),
            0x6C => self.rmw_indexed(bus, Self::inc8),
            0x6D => self.tst_indexed(bus),
            0x6E => self.op_jmp_indexed(bus),
            0x6F => self.clr_indexed(bus),

            // Extended memory unary/shift (0x70-0x7F)
            0x70 => self.rmw_extended(bus, Self::neg8),
            0x73 => self.rmw_extended(bus, Self::com8),
            0x74 => self.rmw_extended(bus, Self::lsr8),
            0x76 => self.rmw_extended(bus, Self::ror8),
            0x77 => self.rmw_extended(bus, Self::asr8),
            0x78 => self.rmw_extended(bus, Self::asl8),
            0x79 => self.rmw_extended(bus, Self::rol8),
            0x7A => self.rmw_extended(bus, Self::dec8),
            0x7C => self.rmw_extended(bus, Self::inc8),
            0x7D => self.tst_extended(bus),
            0x7E => self.op_jmp_extended(bus),
            0x7F => self.clr_extended(bus),

            // Accumulator A ALU (0x80-0xBF)
            0x80 | 0x90 | 0xA0 | 0xB0 => {
                let m = self.operand8(bus, opcode);
                self.a = self.sub8(self.a, m);
            }
            0x81 | 0x91 | 0xA1 | 0xB1 => {
                let m = self.operand8(bus, opcode);
                self.sub8(self.a, m);
            }
            0x82 | 0x92 | 0xA2 | 0xB2 => {
                let m = self.operand8(bus, opcode);
                self.a = self.sbc8(self.a, m);
            }
            0x83 | 0x93 | 0xA3 | 0xB3 => {
                let m = self.operand16(bus, opcode);
                let r = self.sub16(self.get_d(), m);
                self.set_d(r);
            }
            0x84 | 0x94 | 0xA4 | 0xB4 => {
                let m = self.operand8(bus, opcode);
                self.a = self.logic8(self.a & m);
            }
            0x85 | 0x95 | 0xA5 | 0xB5 => {
                let m = self.operand8(bus, opcode);
                self.logic8(self.a & m);
            }
            0x86 | 0x96 | 0xA6 | 0xB6 => {
                let m = self.operand8(bus, opcode);
                self.a = self.logic8(m);
            }
            0x97 | 0xA7 | 0xB7 => {
                let ea = self.operand_ea(bus, opcode);
                let a = self.a;
                self.logic8(a);
                self.wr(bus, ea, a);
            }
            0x88 | 0x98 | 0xA8 | 0xB8 => {
                let m = self.operand8(bus, opcode);
                self.a = self.logic8(self.a ^ m);
            }
            0x89 | 0x99 | 0xA9 | 0xB9 => {
                let m = self.operand8(bus, opcode);
                self.a = self.adc8(self.a, m);
            }
            0x8A | 0x9A | 0xAA | 0xBA => {
                let m = self.operand8(bus, opcode);
                self.a = self.logic8(self.a | m);
            }
            0x8B | 0x9B | 0xAB | 0xBB => {
                let m = self.operand8(bus, opcode);
                self.a = self.add8(self.a, m);
            }
            0x8C | 0x9C | 0xAC | 0xBC => {
                let m = self.operand16(bus, opcode);
                self.sub16(self.x, m);
            }
            0x9D | 0xAD | 0xBD => {
                let ea = self.operand_ea(bus, opcode);
                self.jsr(bus, ea);
            }
            0x8E | 0x9E | 0xAE | 0xBE => {
                let m = self.operand16(bus, opcode);
                self.x = self.logic16(m);
            }
            0x9F | 0xAF | 0xBF => {
                let ea = self.operand_ea(bus, opcode);
                let x = self.x;
                self.logic16(x);
                self.wr16(bus, ea, x);
            }

            // Accumulator B ALU (0xC0-0xFF)
            0xC0 | 0xD0 | 0xE0 | 0xF0 => {
                let m = self.operand8(bus, opcode);
                self.b = self.sub8(self.b, m);
            }
            0xC1 | 0xD1 | 0xE1 | 0xF1 => {
                let m = self.operand8(bus, opcode);
                self.sub8(self.b, m);
            }
            0xC2 | 0xD2 | 0xE2 | 0xF2 => {
                let m = self.operand8(bus, opcode);
                self.b = self.sbc8(self.b, m);
            }
            0xC3 | 0xD3 | 0xE3 | 0xF3 => {
                let m = self.operand16(bus, opcode);
                let r = self.add16(self.get_d(), m);
                self.set_d(r);
            }
            0xC4 | 0xD4 | 0xE4 | 0xF4 => {
                let m = self.operand8(bus, opcode);
                self.b = self.logic8(self.b & m);
            }
            0xC5 | 0xD5 | 0xE5 | 0xF5 => {
                let m = self.operand8(bus, opcode);
                self.logic8(self.b & m);
            }
            0xC6 | 0xD6 | 0xE6 | 0xF6 => {
                let m = self.operand8(bus, opcode);
                self.b = self.logic8(m);
            }
            0xD7 | 0xE7 | 0xF7 => {
                let ea = self.operand_ea(bus, opcode);
                let b = self.b;
                self.logic8(b);
                self.wr(bus, ea, b);
            }
            0xC8 | 0xD8 | 0xE8 | 0xF8 => {
                let m = self.operand8(bus, opcode);
                self.b = self.logic8(self.b ^ m);
            }
            0xC9 | 0xD9 | 0xE9 | 0xF9 => {
                let m = self.operand8(bus, opcode);
                self.b = self.adc8(self.b, m);
            }
            0xCA | 0xDA | 0xEA | 0xFA => {
                let m = self.operand8(bus, opcode);
                self.b = self.logic8(self.b | m);
            }
            0xCB | 0xDB | 0xEB | 0xFB => {
                let m = self.operand8(bus, opcode);
                self.b = self.add8(self.b, m);
            }
            0xCC | 0xDC | 0xEC | 0xFC => {
                let m = self.operand16(bus, opcode);
                let r = self.logic16(m);
                self.set_d(r);
            }
            0xDD | 0xED | 0xFD => {
                let ea = self.operand_ea(bus, opcode);
                let d = self.get_d();
                self.logic16(d);
                self.wr16(bus, ea, d);
            }
            0xCE | 0xDE | 0xEE | 0xFE => {
                let m = self.operand16(bus, opcode);
                self.u = self.logic16(m);
            }
            0xDF | 0xEF | 0xFF => {
                let ea = self.operand_ea(bus, opcode);
                let u = self.u;
                self.logic16(u);
                self.wr16(bus, ea, u);
            }

            _ => self.illegal_opcode(opcode),
        }
    }

    fn execute_page2(&mut self, bus: &mut dyn Bus, opcode: u8) {
        match opcode {
            0x3F => self.op_swi2(bus),

            // Long branches
            0x21..=0x2F => self.op_branch_long(bus, opcode & 0x0F),

            // CMPD
            0x83 | 0x93 | 0xA3 | 0xB3 => {
                let m = self.operand16(bus, opcode);
                self.sub16(self.get_d(), m);
            }
            // CMPY
            0x8C | 0x9C | 0xAC | 0xBC => {
                let m = self.operand16(bus, opcode);
                self.sub16(self.y, m);
            }
            // LDY / STY
            0x8E | 0x9E | 0xAE | 0xBE => {
                let m = self.operand16(bus, opcode);
                self.y = self.logic16(m);
            }
            0x9F | 0xAF | 0xBF => {
                let ea = self.operand_ea(bus, opcode);
                let y = self.y;
                self.logic16(y);
                self.wr16(bus, ea, y);
            }
            // LDS / STS
            0xCE | 0xDE | 0xEE | 0xFE => {
                let m = self.operand16(bus, opcode);
                let s = self.logic16(m);
                self.set_s(s);
            }
            0xDF | 0xEF | 0xFF => {
                let ea = self.operand_ea(bus, opcode);
                let s = self.s;
                self.logic16(s);
                self.wr16(bus, ea, s);
            }

            _ => self.illegal_opcode(opcode),
        }
    }

    fn execute_page3(&mut self, bus: &mut dyn Bus, opcode: u8) {
        match opcode {
            0x3F => self.op_swi3(bus),

            // CMPU
            0x83 | 0x93 | 0xA3 | 0xB3 => {
                let m = self.operand16(bus, opcode);
                self.sub16(self.u, m);
            }
            // CMPS
            0x8C | 0x9C | 0xAC | 0xBC => {
                let m = self.operand16(bus, opcode);
                self.sub16(self.s, m);
            }

            _ => self.illegal_opcode(opcode),
        }
    }
}

impl Default for Mc6809 {
    fn default() -> Self {
        Self::new()
    }
}
