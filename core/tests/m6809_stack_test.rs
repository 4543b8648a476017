//! PSH/PUL, TFR/EXG and RTI.

mod common;

use common::TestBus;
use dragon_core::cpu::{CcFlag, Mc6809};

#[test]
fn pshs_full_mask_layout() {
    let mut cpu = Mc6809::new();
    let mut bus = TestBus::new();
    cpu.a = 0x11;
    cpu.b = 0x22;
    cpu.dp = 0x33;
    cpu.x = 0x4455;
    cpu.y = 0x6677;
    cpu.u = 0x8899;
    cpu.s = 0x0200;
    cpu.cc = 0xD0;
    bus.load(0x0000, &[0x34, 0xFF]); // PSHS all
    cpu.step(&mut bus);

    assert_eq!(cpu.s, 0x0200 - 12);
    // Ascending from the final stack pointer: CC A B DP X Y U PC.
    let s = cpu.s as usize;
    assert_eq!(bus.memory[s], 0xD0);
    assert_eq!(bus.memory[s + 1], 0x11);
    assert_eq!(bus.memory[s + 2], 0x22);
    assert_eq!(bus.memory[s + 3], 0x33);
    assert_eq!(bus.memory[s + 4], 0x44);
    assert_eq!(bus.memory[s + 5], 0x55);
    assert_eq!(bus.memory[s + 6], 0x66);
    assert_eq!(bus.memory[s + 7], 0x77);
    assert_eq!(bus.memory[s + 8], 0x88);
    assert_eq!(bus.memory[s + 9], 0x99);
    assert_eq!(bus.memory[s + 10], 0x00, "PC high");
    assert_eq!(bus.memory[s + 11], 0x02, "PC low");
}

#[test]
fn puls_restores_in_order() {
    let mut cpu = Mc6809::new();
    let mut bus = TestBus::new();
    cpu.s = 0x01F4;
    bus.load(
        0x01F4,
        &[0xD0, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0x10, 0x00],
    );
    bus.load(0x0000, &[0x35, 0xFF]); // PULS all
    cpu.step(&mut bus);
    assert_eq!(cpu.cc, 0xD0);
    assert_eq!(cpu.a, 0x11);
    assert_eq!(cpu.b, 0x22);
    assert_eq!(cpu.dp, 0x33);
    assert_eq!(cpu.x, 0x4455);
    assert_eq!(cpu.y, 0x6677);
    assert_eq!(cpu.u, 0x8899);
    assert_eq!(cpu.pc, 0x1000);
    assert_eq!(cpu.s, 0x0200);
}

#[test]
fn partial_mask_only_pushes_named_registers() {
    let mut cpu = Mc6809::new();
    let mut bus = TestBus::new();
    cpu.a = 0xAA;
    cpu.b = 0xBB;
    cpu.s = 0x0200;
    bus.load(0x0000, &[0x34, 0x06]); // PSHS A,B
    cpu.step(&mut bus);
    assert_eq!(cpu.s, 0x01FE);
    assert_eq!(bus.memory[0x01FE], 0xAA);
    assert_eq!(bus.memory[0x01FF], 0xBB);
}

#[test]
fn pshu_pushes_s_for_bit6() {
    let mut cpu = Mc6809::new();
    let mut bus = TestBus::new();
    cpu.u = 0x0300;
    cpu.s = 0x1234;
    bus.load(0x0000, &[0x36, 0x40]); // PSHU S
    cpu.step(&mut bus);
    assert_eq!(cpu.u, 0x02FE);
    assert_eq!(bus.memory[0x02FE], 0x12);
    assert_eq!(bus.memory[0x02FF], 0x34);
}

#[test]
fn tfr_and_exg() {
    let mut cpu = Mc6809::new();
    let mut bus = TestBus::new();
    cpu.x = 0xBEEF;
    bus.load(0x0000, &[0x1F, 0x12, 0x1E, 0x89]); // TFR X,Y ; EXG A,B
    cpu.step(&mut bus);
    assert_eq!(cpu.y, 0xBEEF);

    cpu.a = 0x12;
    cpu.b = 0x34;
    cpu.step(&mut bus);
    assert_eq!(cpu.a, 0x34);
    assert_eq!(cpu.b, 0x12);
}

#[test]
fn tfr_cross_size() {
    let mut cpu = Mc6809::new();
    let mut bus = TestBus::new();
    cpu.a = 0x42;
    bus.load(0x0000, &[0x1F, 0x81]); // TFR A,X
    cpu.step(&mut bus);
    assert_eq!(cpu.x, 0xFF42, "8-bit source reads high half as 0xFF");

    cpu.pc = 0x0000;
    cpu.x = 0x1234;
    bus.load(0x0000, &[0x1F, 0x19]); // TFR X,B
    cpu.step(&mut bus);
    assert_eq!(cpu.b, 0x34, "16-bit source stores low byte");
}

#[test]
fn tfr_to_pc_jumps() {
    let mut cpu = Mc6809::new();
    let mut bus = TestBus::new();
    cpu.x = 0x4000;
    bus.load(0x0000, &[0x1F, 0x15]); // TFR X,PC
    cpu.step(&mut bus);
    assert_eq!(cpu.pc, 0x4000);
}

#[test]
fn rti_full_and_partial() {
    let mut cpu = Mc6809::new();
    let mut bus = TestBus::new();

    // Partial frame: E clear, only CC and PC stacked.
    cpu.s = 0x01FD;
    bus.load(0x01FD, &[0x00, 0x30, 0x00]); // CC(E=0), PC=0x3000
    bus.load(0x0000, &[0x3B]); // RTI
    cpu.step(&mut bus);
    assert_eq!(cpu.pc, 0x3000);
    assert_eq!(cpu.s, 0x0200);

    // Full frame: E set, entire state stacked.
    let mut cpu = Mc6809::new();
    cpu.s = 0x01F4;
    bus.load(
        0x01F4,
        &[
            CcFlag::E as u8, // CC with E set
            0x11, 0x22, 0x33, // A B DP
            0x44, 0x55, 0x66, 0x77, // X Y
            0x88, 0x99, // U
            0x20, 0x00, // PC
        ],
    );
    bus.load(0x0000, &[0x3B]);
    cpu.step(&mut bus);
    assert_eq!(cpu.a, 0x11);
    assert_eq!(cpu.x, 0x4455);
    assert_eq!(cpu.u, 0x8899);
    assert_eq!(cpu.pc, 0x2000);
    assert_eq!(cpu.s, 0x0200);
}
