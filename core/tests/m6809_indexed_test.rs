//! Indexed addressing post-byte coverage.

mod common;

use common::TestBus;
use dragon_core::cpu::{Mc6809, RunState};

#[test]
fn five_bit_constant_offset() {
    let mut cpu = Mc6809::new();
    let mut bus = TestBus::new();
    cpu.x = 0x1000;
    bus.memory[0x1005] = 0xAB;
    bus.load(0x0000, &[0xA6, 0x05]); // LDA 5,X
    cpu.step(&mut bus);
    assert_eq!(cpu.a, 0xAB);

    // Negative 5-bit offset: -2 = 0b11110
    cpu.pc = 0x0000;
    bus.memory[0x0FFE] = 0xCD;
    bus.load(0x0000, &[0xA6, 0x1E]); // LDA -2,X
    cpu.step(&mut bus);
    assert_eq!(cpu.a, 0xCD);
}

#[test]
fn register_selection_bits() {
    let mut cpu = Mc6809::new();
    let mut bus = TestBus::new();
    cpu.y = 0x2000;
    cpu.u = 0x3000;
    cpu.s = 0x4000;
    bus.memory[0x2000] = 0x11;
    bus.memory[0x3000] = 0x22;
    bus.memory[0x4000] = 0x33;
    bus.load(0x0000, &[0xA6, 0xA4, 0xA6, 0xC4, 0xA6, 0xE4]); // LDA ,Y ; ,U ; ,S
    cpu.step(&mut bus);
    assert_eq!(cpu.a, 0x11);
    cpu.step(&mut bus);
    assert_eq!(cpu.a, 0x22);
    cpu.step(&mut bus);
    assert_eq!(cpu.a, 0x33);
}

#[test]
fn post_increment_by_one_and_two() {
    let mut cpu = Mc6809::new();
    let mut bus = TestBus::new();
    cpu.x = 0x1000;
    bus.memory[0x1000] = 0x11;
    bus.memory[0x1001] = 0x22;
    bus.load(0x0000, &[0xA6, 0x80, 0xA6, 0x81]); // LDA ,X+ ; LDA ,X++
    cpu.step(&mut bus);
    assert_eq!(cpu.a, 0x11);
    assert_eq!(cpu.x, 0x1001);
    cpu.step(&mut bus);
    assert_eq!(cpu.a, 0x22);
    assert_eq!(cpu.x, 0x1003);
}

#[test]
fn pre_decrement_by_one_and_two() {
    let mut cpu = Mc6809::new();
    let mut bus = TestBus::new();
    cpu.x = 0x1002;
    bus.memory[0x1001] = 0xAA;
    bus.memory[0x0FFF] = 0xBB;
    bus.load(0x0000, &[0xA6, 0x82, 0xA6, 0x83]); // LDA ,-X ; LDA ,--X
    cpu.step(&mut bus);
    assert_eq!(cpu.a, 0xAA);
    assert_eq!(cpu.x, 0x1001);
    cpu.step(&mut bus);
    assert_eq!(cpu.a, 0xBB);
    assert_eq!(cpu.x, 0x0FFF);
}

#[test]
fn accumulator_offsets() {
    let mut cpu = Mc6809::new();
    let mut bus = TestBus::new();
    cpu.x = 0x1000;
    cpu.a = 0x02;
    cpu.b = 0xFE; // -2 signed
    bus.memory[0x1002] = 0x55;
    bus.memory[0x0FFE] = 0x66;
    bus.load(0x0000, &[0xE6, 0x86]); // LDB A,X
    cpu.step(&mut bus);
    assert_eq!(cpu.b, 0x55);

    cpu.pc = 0x0000;
    cpu.b = 0xFE;
    bus.load(0x0000, &[0xA6, 0x85]); // LDA B,X (B = -2)
    cpu.step(&mut bus);
    assert_eq!(cpu.a, 0x66);
}

#[test]
fn d_accumulator_offset() {
    let mut cpu = Mc6809::new();
    let mut bus = TestBus::new();
    cpu.x = 0x1000;
    cpu.set_d(0x0234);
    bus.memory[0x1234] = 0x77;
    bus.load(0x0000, &[0xA6, 0x8B]); // LDA D,X
    cpu.step(&mut bus);
    assert_eq!(cpu.a, 0x77);
}

#[test]
fn eight_and_sixteen_bit_offsets() {
    let mut cpu = Mc6809::new();
    let mut bus = TestBus::new();
    cpu.x = 0x1000;
    bus.memory[0x0F80] = 0x88;
    bus.load(0x0000, &[0xA6, 0x88, 0x80]); // LDA -128,X
    cpu.step(&mut bus);
    assert_eq!(cpu.a, 0x88);

    cpu.pc = 0x0000;
    bus.memory[0x1800] = 0x99;
    bus.load(0x0000, &[0xA6, 0x89, 0x08, 0x00]); // LDA $0800,X
    cpu.step(&mut bus);
    assert_eq!(cpu.a, 0x99);
}

#[test]
fn pc_relative_offsets() {
    let mut cpu = Mc6809::new();
    let mut bus = TestBus::new();
    // LDA 4,PCR at 0x0100: operand address = 0x0103 + 4 = 0x0107
    bus.memory[0x0107] = 0x42;
    bus.load(0x0100, &[0xA6, 0x8C, 0x04]);
    cpu.pc = 0x0100;
    cpu.step(&mut bus);
    assert_eq!(cpu.a, 0x42);

    // LDA $0200,PCR (16-bit) at 0x0100: 0x0104 + 0x0200 = 0x0304
    bus.memory[0x0304] = 0x43;
    bus.load(0x0100, &[0xA6, 0x8D, 0x02, 0x00]);
    cpu.pc = 0x0100;
    cpu.step(&mut bus);
    assert_eq!(cpu.a, 0x43);
}

#[test]
fn indirect_modes() {
    let mut cpu = Mc6809::new();
    let mut bus = TestBus::new();
    cpu.x = 0x1000;
    // [,X]: pointer at 0x1000 -> 0x2000
    bus.memory[0x1000] = 0x20;
    bus.memory[0x1001] = 0x00;
    bus.memory[0x2000] = 0xAA;
    bus.load(0x0000, &[0xA6, 0x94]); // LDA [,X]
    cpu.step(&mut bus);
    assert_eq!(cpu.a, 0xAA);

    // [,X++]: same pointer, X advances by 2
    cpu.pc = 0x0000;
    cpu.x = 0x1000;
    bus.load(0x0000, &[0xA6, 0x91]); // LDA [,X++]
    cpu.step(&mut bus);
    assert_eq!(cpu.a, 0xAA);
    assert_eq!(cpu.x, 0x1002);

    // [$3000] extended indirect
    bus.memory[0x3000] = 0x40;
    bus.memory[0x3001] = 0x10;
    bus.memory[0x4010] = 0xBB;
    cpu.pc = 0x0000;
    bus.load(0x0000, &[0xA6, 0x9F, 0x30, 0x00]); // LDA [$3000]
    cpu.step(&mut bus);
    assert_eq!(cpu.a, 0xBB);
}

#[test]
fn indexed_store_and_rmw() {
    let mut cpu = Mc6809::new();
    let mut bus = TestBus::new();
    cpu.x = 0x1000;
    cpu.a = 0x5A;
    bus.load(0x0000, &[0xA7, 0x84, 0x6C, 0x84]); // STA ,X ; INC ,X
    cpu.step(&mut bus);
    assert_eq!(bus.memory[0x1000], 0x5A);
    cpu.step(&mut bus);
    assert_eq!(bus.memory[0x1000], 0x5B);
}

#[test]
fn lea_from_indexed() {
    let mut cpu = Mc6809::new();
    let mut bus = TestBus::new();
    cpu.x = 0x1000;
    bus.load(0x0000, &[0x30, 0x88, 0x10]); // LEAX 16,X
    cpu.step(&mut bus);
    assert_eq!(cpu.x, 0x1010);

    // LEAX with zero result sets Z
    cpu.pc = 0x0000;
    cpu.x = 0xFFF0;
    cpu.step(&mut bus);
    assert_eq!(cpu.x, 0x0000);
    assert!(cpu.cc & dragon_core::cpu::CcFlag::Z as u8 != 0);
}

#[test]
fn undefined_postbyte_is_an_exception() {
    let mut cpu = Mc6809::new();
    let mut bus = TestBus::new();
    bus.load(0x0000, &[0xA6, 0x87]); // postbyte 0x87 is not defined
    let state = cpu.step(&mut bus);
    assert_eq!(state, RunState::Exception);
}
