//! One-line MC6809 disassembly for the trace/breakpoint surface.
//!
//! `mnemonic_at` renders the instruction at an address as "MNEM operand".
//! It reads program bytes through the bus; callers are expected to point it
//! at RAM/ROM, not at live I/O windows.

use crate::core::{Bus, CpuView};
use crate::cpu::m6809::Mc6809;

#[derive(Clone, Copy, PartialEq)]
enum Mode {
    Inherent,
    Imm8,
    Imm16,
    Direct,
    Indexed,
    Extended,
    Rel8,
    Rel16,
    PushPull,
    RegPair,
}

/// Column mnemonic for the regular 0x80-0xFF opcode block.
fn alu_name(op: u8) -> Option<(&'static str, bool)> {
    // (name, is_16bit_immediate)
    let a_side = op < 0xC0;
    match op & 0x0F {
        0x0 => Some((if a_side { "SUBA" } else { "SUBB" }, false)),
        0x1 => Some((if a_side { "CMPA" } else { "CMPB" }, false)),
        0x2 => Some((if a_side { "SBCA" } else { "SBCB" }, false)),
        0x3 => Some((if a_side { "SUBD" } else { "ADDD" }, true)),
        0x4 => Some((if a_side { "ANDA" } else { "ANDB" }, false)),
        0x5 => Some((if a_side { "BITA" } else { "BITB" }, false)),
        0x6 => Some((if a_side { "LDA" } else { "LDB" }, false)),
        0x7 => Some((if a_side { "STA" } else { "STB" }, false)),
        0x8 => Some((if a_side { "EORA" } else { "EORB" }, false)),
        0x9 => Some((if a_side { "ADCA" } else { "ADCB" }, false)),
        0xA => Some((if a_side { "ORA" } else { "ORB" }, false)),
        0xB => Some((if a_side { "ADDA" } else { "ADDB" }, false)),
        0xC => Some((if a_side { "CMPX" } else { "LDD" }, true)),
        0xD => Some((if a_side { "JSR" } else { "STD" }, true)),
        0xE => Some((if a_side { "LDX" } else { "LDU" }, true)),
        0xF => Some((if a_side { "STX" } else { "STU" }, true)),
        _ => None,
    }
}

const BRANCHES: [&str; 16] = [
    "BRA", "BRN", "BHI", "BLS", "BCC", "BCS", "BNE", "BEQ", "BVC", "BVS", "BPL", "BMI", "BGE",
    "BLT", "BGT", "BLE",
];

const UNARY: [&str; 16] = [
    "NEG", "?", "?", "COM", "LSR", "?", "ROR", "ASR", "ASL", "ROL", "DEC", "?", "INC", "TST",
    "JMP", "CLR",
];

const EXG_REGS: [&str; 16] = [
    "D", "X", "Y", "U", "S", "PC", "?", "?", "A", "B", "CC", "DP", "?", "?", "?", "?",
];

fn page1(op: u8) -> (String, Mode) {
    use Mode::*;
    let (name, mode): (String, Mode) = match op {
        0x12 => ("NOP".into(), Inherent),
        0x13 => ("SYNC".into(), Inherent),
        0x16 => ("LBRA".into(), Rel16),
        0x17 => ("LBSR".into(), Rel16),
        0x19 => ("DAA".into(), Inherent),
        0x1A => ("ORCC".into(), Imm8),
        0x1C => ("ANDCC".into(), Imm8),
        0x1D => ("SEX".into(), Inherent),
        0x1E => ("EXG".into(), RegPair),
        0x1F => ("TFR".into(), RegPair),
        0x00..=0x0F => (UNARY[(op & 0x0F) as usize].to_string(), Direct),
        0x20..=0x2F => (BRANCHES[(op & 0x0F) as usize].to_string(), Rel8),
        0x30 => ("LEAX".into(), Indexed),
        0x31 => ("LEAY".into(), Indexed),
        0x32 => ("LEAS".into(), Indexed),
        0x33 => ("LEAU".into(), Indexed),
        0x34 => ("PSHS".into(), PushPull),
        0x35 => ("PULS".into(), PushPull),
        0x36 => ("PSHU".into(), PushPull),
        0x37 => ("PULU".into(), PushPull),
        0x39 => ("RTS".into(), Inherent),
        0x3A => ("ABX".into(), Inherent),
        0x3B => ("RTI".into(), Inherent),
        0x3C => ("CWAI".into(), Imm8),
        0x3D => ("MUL".into(), Inherent),
        0x3F => ("SWI".into(), Inherent),
        0x40..=0x4F => (format!("{}A", UNARY[(op & 0x0F) as usize]), Inherent),
        0x50..=0x5F => (format!("{}B", UNARY[(op & 0x0F) as usize]), Inherent),
        0x60..=0x6F => (UNARY[(op & 0x0F) as usize].to_string(), Indexed),
        0x70..=0x7F => (UNARY[(op & 0x0F) as usize].to_string(), Extended),
        0x8D => ("BSR".into(), Rel8),
        0x80..=0xFF => {
            let (name, wide) = alu_name(op).unwrap();
            let mode = match (op >> 4) & 0x03 {
                0 if wide => Imm16,
                0 => Imm8,
                1 => Direct,
                2 => Indexed,
                _ => Extended,
            };
            (name.to_string(), mode)
        }
        _ => ("???".into(), Inherent),
    };
    (name, mode)
}

fn page2(op: u8) -> (String, Mode) {
    use Mode::*;
    let mode_of = |op: u8| match (op >> 4) & 0x03 {
        0 => Imm16,
        1 => Direct,
        2 => Indexed,
        _ => Extended,
    };
    match op {
        0x21..=0x2F => (format!("L{}", BRANCHES[(op & 0x0F) as usize]), Rel16),
        0x3F => ("SWI2".into(), Inherent),
        0x83 | 0x93 | 0xA3 | 0xB3 => ("CMPD".into(), mode_of(op)),
        0x8C | 0x9C | 0xAC | 0xBC => ("CMPY".into(), mode_of(op)),
        0x8E | 0x9E | 0xAE | 0xBE => ("LDY".into(), mode_of(op)),
        0x9F | 0xAF | 0xBF => ("STY".into(), mode_of(op)),
        0xCE | 0xDE | 0xEE | 0xFE => ("LDS".into(), mode_of(op)),
        0xDF | 0xEF | 0xFF => ("STS".into(), mode_of(op)),
        _ => ("???".into(), Inherent),
    }
}

fn page3(op: u8) -> (String, Mode) {
    use Mode::*;
    let mode_of = |op: u8| match (op >> 4) & 0x03 {
        0 => Imm16,
        1 => Direct,
        2 => Indexed,
        _ => Extended,
    };
    match op {
        0x3F => ("SWI3".into(), Inherent),
        0x83 | 0x93 | 0xA3 | 0xB3 => ("CMPU".into(), mode_of(op)),
        0x8C | 0x9C | 0xAC | 0xBC => ("CMPS".into(), mode_of(op)),
        _ => ("???".into(), Inherent),
    }
}

fn index_reg_name(sel: u8) -> &'static str {
    match sel & 0x03 {
        0 => "X",
        1 => "Y",
        2 => "U",
        _ => "S",
    }
}

struct Reader<'a> {
    bus: &'a mut dyn Bus,
    view: CpuView,
    pc: u16,
}

impl Reader<'_> {
    fn byte(&mut self) -> u8 {
        let b = self.bus.read(&self.view, self.pc);
        self.pc = self.pc.wrapping_add(1);
        b
    }

    fn word(&mut self) -> u16 {
        let hi = self.byte();
        let lo = self.byte();
        u16::from_be_bytes([hi, lo])
    }
}

fn format_indexed(r: &mut Reader) -> String {
    let pb = r.byte();
    if pb & 0x80 == 0 {
        // 5-bit two's-complement constant offset
        let off = if pb & 0x10 != 0 {
            (pb & 0x1F) as i16 - 32
        } else {
            (pb & 0x1F) as i16
        };
        return format!("{off},{}", index_reg_name(pb >> 5));
    }
    let reg = index_reg_name(pb >> 5);
    let indirect = pb & 0x10 != 0;
    let body = match pb & 0x0F {
        0x00 => format!(",{reg}+"),
        0x01 => format!(",{reg}++"),
        0x02 => format!(",-{reg}"),
        0x03 => format!(",--{reg}"),
        0x04 => format!(",{reg}"),
        0x05 => format!("B,{reg}"),
        0x06 => format!("A,{reg}"),
        0x08 => format!("{},{reg}", r.byte() as i8),
        0x09 => format!("{},{reg}", r.word() as i16),
        0x0B => format!("D,{reg}"),
        0x0C => format!("{},PCR", r.byte() as i8),
        0x0D => format!("{},PCR", r.word() as i16),
        0x0F => format!("${:04X}", r.word()),
        _ => "?".to_string(),
    };
    if indirect {
        format!("[{body}]")
    } else {
        body
    }
}

fn format_push_pull(mask: u8, user_stack: bool) -> String {
    let names = [
        "CC",
        "A",
        "B",
        "DP",
        "X",
        "Y",
        if user_stack { "S" } else { "U" },
        "PC",
    ];
    let list: Vec<&str> = (0..8usize)
        .filter(|i| mask & (1 << i) != 0)
        .map(|i| names[i])
        .collect();
    list.join(",")
}

impl Mc6809 {
    /// Disassemble the instruction at `pc`.
    pub fn mnemonic_at(&self, bus: &mut dyn Bus, pc: u16) -> String {
        let view = CpuView {
            pc,
            s: self.s,
            last_pc: self.last_pc,
        };
        let mut r = Reader { bus, view, pc };

        let mut op = r.byte();
        let (name, mode) = match op {
            0x10 => {
                op = r.byte();
                page2(op)
            }
            0x11 => {
                op = r.byte();
                page3(op)
            }
            _ => page1(op),
        };

        let user_stack = op == 0x36 || op == 0x37;
        match mode {
            Mode::Inherent => name,
            Mode::Imm8 => format!("{name} #${:02X}", r.byte()),
            Mode::Imm16 => format!("{name} #${:04X}", r.word()),
            Mode::Direct => format!("{name} <${:02X}", r.byte()),
            Mode::Extended => format!("{name} ${:04X}", r.word()),
            Mode::Indexed => {
                let operand = format_indexed(&mut r);
                format!("{name} {operand}")
            }
            Mode::Rel8 => {
                let off = r.byte() as i8 as u16;
                format!("{name} ${:04X}", r.pc.wrapping_add(off))
            }
            Mode::Rel16 => {
                let off = r.word();
                format!("{name} ${:04X}", r.pc.wrapping_add(off))
            }
            Mode::PushPull => {
                let mask = r.byte();
                format!("{name} {}", format_push_pull(mask, user_stack))
            }
            Mode::RegPair => {
                let pb = r.byte();
                format!(
                    "{name} {},{}",
                    EXG_REGS[(pb >> 4) as usize],
                    EXG_REGS[(pb & 0x0F) as usize]
                )
            }
        }
    }
}
