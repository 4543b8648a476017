//! Stack operations and interrupt servicing.
//!
//! Stacking contract: full machine-state pushes (IRQ, NMI, SWI family,
//! CWAI) store, in push order, {PC_lo, PC_hi, U_lo, U_hi, Y_lo, Y_hi,
//! X_lo, X_hi, DP, B, A, CC}. FIRQ pushes only {PC_lo, PC_hi, CC} with
//! the E flag clear so RTI knows how much to restore.

use super::{vector, CcFlag, Mc6809};
use crate::core::Bus;
use crate::cpu::RunState;

// PSH/PUL post-byte bits, PC down to CC.
const PB_PC: u8 = 0x80;
const PB_US: u8 = 0x40;
const PB_Y: u8 = 0x20;
const PB_X: u8 = 0x10;
const PB_DP: u8 = 0x08;
const PB_B: u8 = 0x04;
const PB_A: u8 = 0x02;
const PB_CC: u8 = 0x01;

impl Mc6809 {
    // --- Raw stack primitives ---

    pub(crate) fn push8_s(&mut self, bus: &mut dyn Bus, val: u8) {
        self.s = self.s.wrapping_sub(1);
        let addr = self.s;
        self.wr(bus, addr, val);
    }

    /// Push a 16-bit value low byte first, leaving the high byte at the
    /// lower address.
    pub(crate) fn push16_s(&mut self, bus: &mut dyn Bus, val: u16) {
        self.push8_s(bus, val as u8);
        self.push8_s(bus, (val >> 8) as u8);
    }

    pub(crate) fn pull8_s(&mut self, bus: &mut dyn Bus) -> u8 {
        let addr = self.s;
        let val = self.rd(bus, addr);
        self.s = self.s.wrapping_add(1);
        val
    }

    pub(crate) fn pull16_s(&mut self, bus: &mut dyn Bus) -> u16 {
        let hi = self.pull8_s(bus);
        let lo = self.pull8_s(bus);
        u16::from_be_bytes([hi, lo])
    }

    fn push8_u(&mut self, bus: &mut dyn Bus, val: u8) {
        self.u = self.u.wrapping_sub(1);
        let addr = self.u;
        self.wr(bus, addr, val);
    }

    fn push16_u(&mut self, bus: &mut dyn Bus, val: u16) {
        self.push8_u(bus, val as u8);
        self.push8_u(bus, (val >> 8) as u8);
    }

    fn pull8_u(&mut self, bus: &mut dyn Bus) -> u8 {
        let addr = self.u;
        let val = self.rd(bus, addr);
        self.u = self.u.wrapping_add(1);
        val
    }

    fn pull16_u(&mut self, bus: &mut dyn Bus) -> u16 {
        let hi = self.pull8_u(bus);
        let lo = self.pull8_u(bus);
        u16::from_be_bytes([hi, lo])
    }

    // --- PSHS/PULS/PSHU/PULU ---

    pub(crate) fn op_pshs(&mut self, bus: &mut dyn Bus) {
        let mask = self.fetch_byte(bus);
        if mask & PB_PC != 0 {
            let pc = self.pc;
            self.push16_s(bus, pc);
        }
        if mask & PB_US != 0 {
            let u = self.u;
            self.push16_s(bus, u);
        }
        if mask & PB_Y != 0 {
            let y = self.y;
            self.push16_s(bus, y);
        }
        if mask & PB_X != 0 {
            let x = self.x;
            self.push16_s(bus, x);
        }
        if mask & PB_DP != 0 {
            let dp = self.dp;
            self.push8_s(bus, dp);
        }
        if mask & PB_B != 0 {
            let b = self.b;
            self.push8_s(bus, b);
        }
        if mask & PB_A != 0 {
            let a = self.a;
            self.push8_s(bus, a);
        }
        if mask & PB_CC != 0 {
            let cc = self.cc;
            self.push8_s(bus, cc);
        }
    }

    pub(crate) fn op_puls(&mut self, bus: &mut dyn Bus) {
        let mask = self.fetch_byte(bus);
        if mask & PB_CC != 0 {
            self.cc = self.pull8_s(bus);
        }
        if mask & PB_A != 0 {
            self.a = self.pull8_s(bus);
        }
        if mask & PB_B != 0 {
            self.b = self.pull8_s(bus);
        }
        if mask & PB_DP != 0 {
            self.dp = self.pull8_s(bus);
        }
        if mask & PB_X != 0 {
            self.x = self.pull16_s(bus);
        }
        if mask & PB_Y != 0 {
            self.y = self.pull16_s(bus);
        }
        if mask & PB_US != 0 {
            self.u = self.pull16_s(bus);
        }
        if mask & PB_PC != 0 {
            self.pc = self.pull16_s(bus);
        }
    }

    /// PSHU: bit 6 names S instead of U.
    pub(crate) fn op_pshu(&mut self, bus: &mut dyn Bus) {
        let mask = self.fetch_byte(bus);
        if mask & PB_PC != 0 {
            let pc = self.pc;
            self.push16_u(bus, pc);
        }
        if mask & PB_US != 0 {
            let s = self.s;
            self.push16_u(bus, s);
        }
        if mask & PB_Y != 0 {
            let y = self.y;
            self.push16_u(bus, y);
        }
        if mask & PB_X != 0 {
            let x = self.x;
            self.push16_u(bus, x);
        }
        if mask & PB_DP != 0 {
            let dp = self.dp;
            self.push8_u(bus, dp);
        }
        if mask & PB_B != 0 {
            let b = self.b;
            self.push8_u(bus, b);
        }
        if mask & PB_A != 0 {
            let a = self.a;
            self.push8_u(bus, a);
        }
        if mask & PB_CC != 0 {
            let cc = self.cc;
            self.push8_u(bus, cc);
        }
    }

    pub(crate) fn op_pulu(&mut self, bus: &mut dyn Bus) {
        let mask = self.fetch_byte(bus);
        if mask & PB_CC != 0 {
            self.cc = self.pull8_u(bus);
        }
        if mask & PB_A != 0 {
            self.a = self.pull8_u(bus);
        }
        if mask & PB_B != 0 {
            self.b = self.pull8_u(bus);
        }
        if mask & PB_DP != 0 {
            self.dp = self.pull8_u(bus);
        }
        if mask & PB_X != 0 {
            self.x = self.pull16_u(bus);
        }
        if mask & PB_Y != 0 {
            self.y = self.pull16_u(bus);
        }
        if mask & PB_US != 0 {
            let s = self.pull16_u(bus);
            self.set_s(s);
        }
        if mask & PB_PC != 0 {
            self.pc = self.pull16_u(bus);
        }
    }

    // --- Machine-state stacking ---

    /// Push the entire machine state with E set (IRQ/NMI/SWI/CWAI).
    fn push_entire(&mut self, bus: &mut dyn Bus) {
        self.set_flag(CcFlag::E, true);
        let (pc, u, y, x) = (self.pc, self.u, self.y, self.x);
        self.push16_s(bus, pc);
        self.push16_s(bus, u);
        self.push16_s(bus, y);
        self.push16_s(bus, x);
        let (dp, b, a, cc) = (self.dp, self.b, self.a, self.cc);
        self.push8_s(bus, dp);
        self.push8_s(bus, b);
        self.push8_s(bus, a);
        self.push8_s(bus, cc);
    }

    /// Push PC and CC only with E clear (FIRQ).
    fn push_partial(&mut self, bus: &mut dyn Bus) {
        self.set_flag(CcFlag::E, false);
        let pc = self.pc;
        self.push16_s(bus, pc);
        let cc = self.cc;
        self.push8_s(bus, cc);
    }

    // --- Hardware interrupt service ---

    pub(crate) fn service_nmi(&mut self, bus: &mut dyn Bus) {
        self.push_entire(bus);
        self.cc |= CcFlag::I as u8 | CcFlag::F as u8;
        self.pc = self.rd16(bus, vector::NMI);
    }

    pub(crate) fn service_firq(&mut self, bus: &mut dyn Bus) {
        self.push_partial(bus);
        self.cc |= CcFlag::I as u8 | CcFlag::F as u8;
        self.pc = self.rd16(bus, vector::FIRQ);
    }

    pub(crate) fn service_irq(&mut self, bus: &mut dyn Bus) {
        self.push_entire(bus);
        self.cc |= CcFlag::I as u8;
        self.pc = self.rd16(bus, vector::IRQ);
    }

    // --- Software interrupts ---

    pub(crate) fn op_swi(&mut self, bus: &mut dyn Bus) {
        self.push_entire(bus);
        self.cc |= CcFlag::I as u8 | CcFlag::F as u8;
        self.pc = self.rd16(bus, vector::SWI);
    }

    pub(crate) fn op_swi2(&mut self, bus: &mut dyn Bus) {
        self.push_entire(bus);
        self.pc = self.rd16(bus, vector::SWI2);
    }

    pub(crate) fn op_swi3(&mut self, bus: &mut dyn Bus) {
        self.push_entire(bus);
        self.pc = self.rd16(bus, vector::SWI3);
    }

    // --- RTI ---

    pub(crate) fn op_rti(&mut self, bus: &mut dyn Bus) {
        self.cc = self.pull8_s(bus);
        if self.flag(CcFlag::E) {
            self.a = self.pull8_s(bus);
            self.b = self.pull8_s(bus);
            self.dp = self.pull8_s(bus);
            self.x = self.pull16_s(bus);
            self.y = self.pull16_s(bus);
            self.u = self.pull16_s(bus);
        }
        self.pc = self.pull16_s(bus);
    }

    // --- CWAI / SYNC ---

    /// CWAI: clear CC bits, stack the entire state now, then wait. The
    /// eventual interrupt vectors without re-stacking.
    pub(crate) fn op_cwai(&mut self, bus: &mut dyn Bus) {
        let mask = self.fetch_byte(bus);
        self.cc &= mask;
        self.push_entire(bus);
        self.run_state = RunState::WaitingInterrupt;
    }

    /// Wake-up path while in the CWAI wait state. The machine state is
    /// already on the stack, so acceptance only sets masks and vectors.
    pub(crate) fn wake_from_cwai(&mut self, bus: &mut dyn Bus) -> RunState {
        if self.lines.nmi && self.nmi_armed {
            self.lines.nmi = false;
            self.cc |= CcFlag::I as u8 | CcFlag::F as u8;
            self.pc = self.rd16(bus, vector::NMI);
            self.run_state = RunState::Running;
        } else if self.lines.firq && !self.flag(CcFlag::F) {
            self.lines.firq = false;
            self.cc |= CcFlag::I as u8 | CcFlag::F as u8;
            self.pc = self.rd16(bus, vector::FIRQ);
            self.run_state = RunState::Running;
        } else if self.lines.irq && !self.flag(CcFlag::I) {
            self.lines.irq = false;
            self.cc |= CcFlag::I as u8;
            self.pc = self.rd16(bus, vector::IRQ);
            self.run_state = RunState::Running;
        }
        self.run_state
    }

    /// SYNC: stop until any interrupt line is latched. A masked line just
    /// resumes execution; an unmasked line is serviced at the next step.
    pub(crate) fn op_sync(&mut self) {
        self.run_state = RunState::Syncing;
    }
}
