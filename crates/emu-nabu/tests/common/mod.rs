//! Shared fixtures: a CPU that replays a script of bus accesses, and a
//! presenter that counts frames.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use emu_core::{Cpu, IoBus, Presenter};
use emu_nabu::{Nabu, NabuConfig, Rom};

/// One scripted instruction.
#[derive(Debug, Clone, Copy)]
pub enum Op {
    Read(u16),
    Write(u16, u8),
    In(u16),
    Out(u16, u8),
    /// A 4 T-state NOP.
    Idle,
}

/// Register snapshot of the scripted CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptRegisters {
    pub pc: u16,
}

/// Replays `Op`s, one per step. Runs NOPs once the script is exhausted.
#[derive(Default)]
pub struct ScriptedCpu {
    script: VecDeque<Op>,
    cycles: u64,
    pc: u16,
    /// Values returned by `Read` and `In` ops, in order.
    pub results: Vec<u8>,
    /// Last interrupt request seen before a step.
    pub irq: Option<u8>,
    pub resets: u32,
}

impl ScriptedCpu {
    pub fn push(&mut self, op: Op) {
        self.script.push_back(op);
    }

    pub fn extend(&mut self, ops: impl IntoIterator<Item = Op>) {
        self.script.extend(ops);
    }

    pub fn is_idle(&self) -> bool {
        self.script.is_empty()
    }
}

impl Cpu for ScriptedCpu {
    type Registers = ScriptRegisters;

    fn step<B: IoBus>(&mut self, bus: &mut B) -> u32 {
        let op = self.script.pop_front().unwrap_or(Op::Idle);
        let cost = match op {
            Op::Read(addr) => {
                self.results.push(bus.read(addr));
                7
            }
            Op::Write(addr, value) => {
                bus.write(addr, value);
                7
            }
            Op::In(port) => {
                self.results.push(bus.read_io(port));
                11
            }
            Op::Out(port, value) => {
                bus.write_io(port, value);
                11
            }
            Op::Idle => 4,
        };
        self.pc = self.pc.wrapping_add(1);
        self.cycles += u64::from(cost);
        cost
    }

    fn cycles(&self) -> u64 {
        self.cycles
    }

    fn pc(&self) -> u16 {
        self.pc
    }

    fn registers(&self) -> ScriptRegisters {
        ScriptRegisters { pc: self.pc }
    }

    fn set_interrupt(&mut self, request: Option<u8>) {
        self.irq = request;
    }

    fn nmi(&mut self) {}

    fn reset(&mut self) {
        self.pc = 0;
        self.script.clear();
        self.resets += 1;
    }
}

/// Counts presented frames.
#[derive(Clone, Default)]
pub struct FrameCounter(pub Rc<Cell<u32>>);

impl Presenter for FrameCounter {
    fn present(&mut self, frame: &[u32], width: usize, height: usize) {
        assert_eq!(frame.len(), width * height);
        self.0.set(self.0.get() + 1);
    }
}

/// 8K ROM whose bytes are their address's low byte XOR $5A.
pub fn make_rom() -> Rom {
    let data = (0..8192u32).map(|i| (i as u8) ^ 0x5A).collect();
    Rom::from_bytes(data).expect("8K ROM")
}

pub fn headless_config() -> NabuConfig {
    NabuConfig {
        throttle: false,
        ..NabuConfig::default()
    }
}

pub fn make_nabu() -> Nabu<ScriptedCpu> {
    make_nabu_with(&headless_config())
}

pub fn make_nabu_with(config: &NabuConfig) -> Nabu<ScriptedCpu> {
    Nabu::new(ScriptedCpu::default(), make_rom(), config).expect("machine")
}

/// Run scanlines until the script has been consumed.
pub fn run_script(nabu: &mut Nabu<ScriptedCpu>) {
    for _ in 0..10_000 {
        if nabu.cpu().is_idle() {
            return;
        }
        nabu.run_scanline().expect("scanline");
    }
    panic!("script did not finish");
}
