//! CPU trace logging for nestest.log-compatible output.
//!
//! This module provides functionality to generate execution traces matching
//! the nestest golden log format, useful for cross-checking instruction
//! decoding and timing against a reference run.

use crate::addressing::AddrMode;
use crate::bus::Bus;
use crate::cpu::Cpu;
use crate::opcodes::{OpcodeEntry, OPCODE_TABLE};
use std::fmt::Write as _;

/// Trace entry representing a single instruction execution.
#[derive(Debug, Clone)]
pub struct TraceEntry {
    /// Program counter at the start of the instruction.
    pub pc: u16,
    /// Opcode byte.
    pub opcode: u8,
    /// Operand bytes (0-2 bytes).
    pub operand_bytes: Vec<u8>,
    /// Disassembled instruction string.
    pub disassembly: String,
    /// Accumulator register.
    pub a: u8,
    /// X register.
    pub x: u8,
    /// Y register.
    pub y: u8,
    /// Status register.
    pub p: u8,
    /// Stack pointer.
    pub sp: u8,
    /// Total CPU cycles.
    pub cycles: u64,
}

impl TraceEntry {
    /// Format the trace entry in nestest.log format:
    /// `PC  OPCODE_BYTES  DISASM    A:XX X:XX Y:XX P:XX SP:XX CYC:XXXXX`.
    #[must_use]
    pub fn format(&self) -> String {
        let mut bytes_str = String::new();
        write!(bytes_str, "{:02X}", self.opcode).unwrap();
        for byte in &self.operand_bytes {
            write!(bytes_str, " {byte:02X}").unwrap();
        }
        let bytes_field = format!("{bytes_str:<10}");
        let disasm_field = format!("{:<32}", self.disassembly);

        format!(
            "{:04X}  {}{}A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
            self.pc, bytes_field, disasm_field, self.a, self.x, self.y, self.p, self.sp, self.cycles
        )
    }
}

/// CPU trace logger for generating nestest-compatible logs.
#[derive(Debug, Default)]
pub struct CpuTracer {
    entries: Vec<String>,
}

impl CpuTracer {
    /// Create a new, empty CPU tracer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Log the current CPU state before the next instruction executes.
    ///
    /// Must be called before `cpu.clock()`/`cpu.step()` runs the
    /// instruction at `cpu.pc()`, since the log records pre-execution state.
    pub fn trace(&mut self, cpu: &Cpu, bus: &mut impl Bus) {
        let entry = Self::create_trace_entry(cpu, bus);
        self.entries.push(entry.format());
    }

    /// All logged entries joined with newlines.
    #[must_use]
    pub fn get_log(&self) -> String {
        self.entries.join("\n")
    }

    /// Number of logged entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no instructions have been traced yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn create_trace_entry(cpu: &Cpu, bus: &mut impl Bus) -> TraceEntry {
        let pc = cpu.pc();
        let opcode = bus.read(pc);
        let entry = OPCODE_TABLE[opcode as usize];

        let operand_bytes = fetch_operand_bytes(pc, entry.mode, bus);
        let disassembly = disassemble(cpu, bus, pc, entry);

        TraceEntry {
            pc,
            opcode,
            operand_bytes,
            disassembly,
            a: cpu.a(),
            x: cpu.x(),
            y: cpu.y(),
            p: cpu.status().bits(),
            sp: cpu.sp(),
            cycles: cpu.cycles(),
        }
    }
}

fn fetch_operand_bytes(pc: u16, mode: AddrMode, bus: &mut impl Bus) -> Vec<u8> {
    (1..=mode.operand_size())
        .map(|i| bus.read(pc.wrapping_add(u16::from(i))))
        .collect()
}

#[allow(clippy::too_many_lines)]
fn disassemble(cpu: &Cpu, bus: &mut impl Bus, pc: u16, entry: OpcodeEntry) -> String {
    let mnemonic = entry.mnemonic;

    match entry.mode {
        AddrMode::Implicit => format!("{mnemonic}"),
        AddrMode::Accumulator => format!("{mnemonic} A"),

        AddrMode::Immediate => {
            let value = bus.read(pc.wrapping_add(1));
            format!("{mnemonic} #${value:02X}")
        }

        AddrMode::ZeroPage => {
            let addr = bus.read(pc.wrapping_add(1));
            let value = bus.read(u16::from(addr));
            format!("{mnemonic} ${addr:02X} = {value:02X}")
        }

        AddrMode::ZeroPageX => {
            let base = bus.read(pc.wrapping_add(1));
            let addr = base.wrapping_add(cpu.x());
            let value = bus.read(u16::from(addr));
            format!("{mnemonic} ${base:02X},X @ {addr:02X} = {value:02X}")
        }

        AddrMode::ZeroPageY => {
            let base = bus.read(pc.wrapping_add(1));
            let addr = base.wrapping_add(cpu.y());
            let value = bus.read(u16::from(addr));
            format!("{mnemonic} ${base:02X},Y @ {addr:02X} = {value:02X}")
        }

        AddrMode::Absolute => {
            let lo = bus.read(pc.wrapping_add(1));
            let hi = bus.read(pc.wrapping_add(2));
            let addr = u16::from_le_bytes([lo, hi]);
            if matches!(mnemonic, crate::opcodes::Mnemonic::Jmp | crate::opcodes::Mnemonic::Jsr) {
                format!("{mnemonic} ${addr:04X}")
            } else {
                let value = bus.read(addr);
                format!("{mnemonic} ${addr:04X} = {value:02X}")
            }
        }

        AddrMode::AbsoluteX => {
            let lo = bus.read(pc.wrapping_add(1));
            let hi = bus.read(pc.wrapping_add(2));
            let base = u16::from_le_bytes([lo, hi]);
            let addr = base.wrapping_add(u16::from(cpu.x()));
            let value = bus.read(addr);
            format!("{mnemonic} ${base:04X},X @ {addr:04X} = {value:02X}")
        }

        AddrMode::AbsoluteY => {
            let lo = bus.read(pc.wrapping_add(1));
            let hi = bus.read(pc.wrapping_add(2));
            let base = u16::from_le_bytes([lo, hi]);
            let addr = base.wrapping_add(u16::from(cpu.y()));
            let value = bus.read(addr);
            format!("{mnemonic} ${base:04X},Y @ {addr:04X} = {value:02X}")
        }

        AddrMode::Indirect => {
            let lo = bus.read(pc.wrapping_add(1));
            let hi = bus.read(pc.wrapping_add(2));
            let ptr = u16::from_le_bytes([lo, hi]);
            let target = bus.read_u16_wrap(ptr);
            format!("{mnemonic} (${ptr:04X}) = {target:04X}")
        }

        AddrMode::IndexedIndirect => {
            let base = bus.read(pc.wrapping_add(1));
            let ptr = base.wrapping_add(cpu.x());
            let lo = u16::from(bus.read(u16::from(ptr)));
            let hi = u16::from(bus.read(u16::from(ptr.wrapping_add(1))));
            let addr = (hi << 8) | lo;
            let value = bus.read(addr);
            format!("{mnemonic} (${base:02X},X) @ {ptr:02X} = {addr:04X} = {value:02X}")
        }

        AddrMode::IndirectIndexed => {
            let ptr = bus.read(pc.wrapping_add(1));
            let lo = u16::from(bus.read(u16::from(ptr)));
            let hi = u16::from(bus.read(u16::from(ptr.wrapping_add(1))));
            let base = (hi << 8) | lo;
            let addr = base.wrapping_add(u16::from(cpu.y()));
            let value = bus.read(addr);
            format!("{mnemonic} (${ptr:02X}),Y = {base:04X} @ {addr:04X} = {value:02X}")
        }

        AddrMode::Relative => {
            let offset = bus.read(pc.wrapping_add(1)) as i8;
            let target = pc.wrapping_add(2).wrapping_add(offset as u16);
            format!("{mnemonic} ${target:04X}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestBus {
        memory: Vec<u8>,
    }

    impl TestBus {
        fn new() -> Self {
            Self { memory: vec![0; 0x10000] }
        }
    }

    impl Bus for TestBus {
        fn read(&mut self, addr: u16) -> u8 {
            self.memory[addr as usize]
        }

        fn write(&mut self, addr: u16, value: u8) {
            self.memory[addr as usize] = value;
        }
    }

    #[test]
    fn trace_lda_immediate() {
        let mut bus = TestBus::new();
        bus.memory[0xFFFC] = 0x00;
        bus.memory[0xFFFD] = 0xC0;
        bus.memory[0xC000] = 0xA9;
        bus.memory[0xC001] = 0x42;

        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        cpu.set_pc(0xC000);

        let mut tracer = CpuTracer::new();
        tracer.trace(&cpu, &mut bus);
        let log = tracer.get_log();

        assert!(log.contains("C000"));
        assert!(log.contains("A9 42"));
        assert!(log.contains("LDA #$42"));
        assert!(log.contains("SP:FD"));
        assert_eq!(tracer.len(), 1);
    }

    #[test]
    fn trace_jmp_absolute() {
        let mut bus = TestBus::new();
        bus.memory[0xFFFC] = 0x00;
        bus.memory[0xFFFD] = 0xC0;
        bus.memory[0xC000] = 0x4C;
        bus.memory[0xC001] = 0xF5;
        bus.memory[0xC002] = 0xC5;

        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        cpu.set_pc(0xC000);

        let mut tracer = CpuTracer::new();
        tracer.trace(&cpu, &mut bus);
        let log = tracer.get_log();

        assert!(log.contains("4C F5 C5"));
        assert!(log.contains("JMP $C5F5"));
    }
}
