use dragon_core::core::{Bus, CpuView, InterruptState};
use dragon_core::cpu::Mc6809;

/// Minimal bus for CPU testing: flat 64 KiB memory plus controllable
/// interrupt lines.
pub struct TestBus {
    pub memory: [u8; 0x10000],
    pub irq: bool,
    pub firq: bool,
    pub nmi: bool,
}

impl TestBus {
    pub fn new() -> Self {
        Self {
            memory: [0; 0x10000],
            irq: false,
            firq: false,
            nmi: false,
        }
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
    }
}

impl Bus for TestBus {
    fn read(&mut self, _cpu: &CpuView, addr: u16) -> u8 {
        self.memory[addr as usize]
    }

    fn write(&mut self, _cpu: &CpuView, addr: u16, data: u8) {
        self.memory[addr as usize] = data;
    }

    fn check_interrupts(&mut self) -> InterruptState {
        InterruptState {
            nmi: std::mem::take(&mut self.nmi),
            firq: self.firq,
            irq: self.irq,
        }
    }
}

/// Execute `n` instructions.
#[allow(dead_code)]
pub fn step_n(cpu: &mut Mc6809, bus: &mut TestBus, n: usize) {
    for _ in 0..n {
        cpu.step(bus);
    }
}
