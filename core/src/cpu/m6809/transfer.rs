//! EXG and TFR.
//!
//! Register codes: 0=D 1=X 2=Y 3=U 4=S 5=PC 8=A 9=B 10=CC 11=DP.
//! Cross-size moves follow observed hardware: an 8-bit source reads as
//! 0xFF in the high half; a 16-bit source stores its low byte into an
//! 8-bit destination. Invalid codes read as all-ones and store nowhere.

use super::Mc6809;
use crate::core::Bus;

impl Mc6809 {
    fn reg_get(&self, code: u8) -> u16 {
        match code {
            0x0 => self.get_d(),
            0x1 => self.x,
            0x2 => self.y,
            0x3 => self.u,
            0x4 => self.s,
            0x5 => self.pc,
            0x8 => 0xFF00 | self.a as u16,
            0x9 => 0xFF00 | self.b as u16,
            0xA => 0xFF00 | self.cc as u16,
            0xB => 0xFF00 | self.dp as u16,
            _ => 0xFFFF,
        }
    }

    fn reg_set(&mut self, code: u8, val: u16) {
        match code {
            0x0 => self.set_d(val),
            0x1 => self.x = val,
            0x2 => self.y = val,
            0x3 => self.u = val,
            0x4 => self.set_s(val),
            0x5 => self.pc = val,
            0x8 => self.a = val as u8,
            0x9 => self.b = val as u8,
            0xA => self.cc = val as u8,
            0xB => self.dp = val as u8,
            _ => {}
        }
    }

    pub(crate) fn op_tfr(&mut self, bus: &mut dyn Bus) {
        let postbyte = self.fetch_byte(bus);
        let src = postbyte >> 4;
        let dst = postbyte & 0x0F;
        let val = self.reg_get(src);
        self.reg_set(dst, val);
    }

    pub(crate) fn op_exg(&mut self, bus: &mut dyn Bus) {
        let postbyte = self.fetch_byte(bus);
        let r1 = postbyte >> 4;
        let r2 = postbyte & 0x0F;
        let v1 = self.reg_get(r1);
        let v2 = self.reg_get(r2);
        self.reg_set(r1, v2);
        self.reg_set(r2, v1);
    }
}
