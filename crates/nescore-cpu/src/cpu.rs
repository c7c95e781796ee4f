//! 6502 CPU core.
//!
//! The CPU advances one cycle at a time via [`Cpu::clock`], but executes an
//! instruction's register/memory side effects atomically on the cycle that
//! starts it — the remaining cycles are simply counted down. This is the
//! model documented for this core: simpler than a fully granular per-bus-
//! cycle state machine, and sufficient for game compatibility.

use crate::addressing::AddrMode;
use crate::bus::Bus;
use crate::opcodes::{allows_page_cross_bonus, Mnemonic, OPCODE_TABLE};
use crate::status::Status;
use crate::vectors;

/// MOS 6502 CPU core.
#[derive(Debug, Clone)]
pub struct Cpu {
    /// Accumulator.
    a: u8,
    /// X index register.
    x: u8,
    /// Y index register.
    y: u8,
    /// Stack pointer (stack lives at `$0100 + sp`).
    sp: u8,
    /// Program counter.
    pc: u16,
    /// Status register.
    status: Status,

    opcode: u8,
    addr_abs: u16,
    addr_rel: u16,
    cycles_remaining: u8,
    total_cycles: u64,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    /// Construct a CPU in an unpowered state. Call [`Cpu::reset`] before
    /// clocking it.
    #[must_use]
    pub fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0,
            pc: 0,
            status: Status::new(),
            opcode: 0,
            addr_abs: 0,
            addr_rel: 0,
            cycles_remaining: 0,
            total_cycles: 0,
        }
    }

    /// Accumulator.
    #[must_use]
    pub const fn a(&self) -> u8 {
        self.a
    }

    /// X index register.
    #[must_use]
    pub const fn x(&self) -> u8 {
        self.x
    }

    /// Y index register.
    #[must_use]
    pub const fn y(&self) -> u8 {
        self.y
    }

    /// Stack pointer.
    #[must_use]
    pub const fn sp(&self) -> u8 {
        self.sp
    }

    /// Program counter.
    #[must_use]
    pub const fn pc(&self) -> u16 {
        self.pc
    }

    /// Status register.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Force the program counter. Used by harnesses that start execution at
    /// a fixed address (e.g. an automation entry point) instead of the
    /// reset vector.
    pub fn set_pc(&mut self, pc: u16) {
        self.pc = pc;
    }

    /// Total CPU cycles clocked since construction.
    #[must_use]
    pub const fn cycles(&self) -> u64 {
        self.total_cycles
    }

    /// True when the CPU is between instructions (the next `clock()` will
    /// start a new one). A pending NMI/IRQ is only delivered at this point.
    #[must_use]
    pub const fn instruction_complete(&self) -> bool {
        self.cycles_remaining == 0
    }

    /// Power-on/reset sequence: load PC from the reset vector, clear the
    /// general-purpose registers, and consume 8 cycles of reset latency.
    pub fn reset(&mut self, bus: &mut impl Bus) {
        self.pc = bus.read_u16(vectors::RESET);
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.sp = 0xFD;
        self.status = Status::U | Status::I;
        self.addr_abs = 0;
        self.addr_rel = 0;
        self.cycles_remaining = 8;
    }

    /// Maskable interrupt request. No-op while the I flag is set.
    pub fn irq(&mut self, bus: &mut impl Bus) {
        if self.status.contains(Status::I) {
            return;
        }
        self.push_u16(bus, self.pc);
        self.push(bus, self.status.to_stack_byte(false));
        self.status.insert(Status::I);
        self.pc = bus.read_u16(vectors::IRQ);
        self.cycles_remaining = 7;
    }

    /// Non-maskable interrupt. Always delivered, regardless of the I flag.
    pub fn nmi(&mut self, bus: &mut impl Bus) {
        self.push_u16(bus, self.pc);
        self.push(bus, self.status.to_stack_byte(false));
        self.status.insert(Status::I);
        self.pc = bus.read_u16(vectors::NMI);
        self.cycles_remaining = 8;
    }

    /// Advance the CPU by one cycle. When `cycles_remaining` reaches zero, a
    /// new instruction is fetched, decoded, and its side effects executed;
    /// otherwise this call just burns down the remaining count.
    pub fn clock(&mut self, bus: &mut impl Bus) {
        if self.cycles_remaining == 0 {
            self.opcode = self.fetch_pc_byte(bus);
            self.status.insert(Status::U);

            let entry = OPCODE_TABLE[self.opcode as usize];
            let addr_extra_cycle = self.resolve_address(entry.mode, bus);
            self.cycles_remaining = entry.cycles;

            let op_extra_cycle = self.execute(entry.mnemonic, entry.mode, bus);
            if addr_extra_cycle && op_extra_cycle {
                self.cycles_remaining += 1;
            }
        }
        self.cycles_remaining -= 1;
        self.total_cycles += 1;
    }

    /// Run one full instruction: clock until the CPU is between
    /// instructions again. Convenient for tests and simple host loops; the
    /// system bus drives `clock()` directly instead.
    pub fn step(&mut self, bus: &mut impl Bus) {
        self.clock(bus);
        while !self.instruction_complete() {
            self.clock(bus);
        }
    }

    fn fetch_pc_byte(&mut self, bus: &mut impl Bus) -> u8 {
        let value = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        value
    }

    fn push(&mut self, bus: &mut impl Bus, value: u8) {
        bus.write(0x0100 + u16::from(self.sp), value);
        self.sp = self.sp.wrapping_sub(1);
    }

    fn pop(&mut self, bus: &mut impl Bus) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read(0x0100 + u16::from(self.sp))
    }

    fn push_u16(&mut self, bus: &mut impl Bus, value: u16) {
        self.push(bus, (value >> 8) as u8);
        self.push(bus, (value & 0xFF) as u8);
    }

    fn pop_u16(&mut self, bus: &mut impl Bus) -> u16 {
        let lo = u16::from(self.pop(bus));
        let hi = u16::from(self.pop(bus));
        (hi << 8) | lo
    }

    /// Resolve `addr_abs`/`addr_rel` for the given addressing mode. Returns
    /// whether the address computation itself crossed a page boundary
    /// (eligible for the read penalty, combined with `execute`'s return
    /// value in `clock`).
    fn resolve_address(&mut self, mode: AddrMode, bus: &mut impl Bus) -> bool {
        match mode {
            AddrMode::Implicit | AddrMode::Accumulator => false,
            AddrMode::Immediate => {
                self.addr_abs = self.pc;
                self.pc = self.pc.wrapping_add(1);
                false
            }
            AddrMode::ZeroPage => {
                self.addr_abs = u16::from(self.fetch_pc_byte(bus));
                false
            }
            AddrMode::ZeroPageX => {
                self.addr_abs = u16::from(self.fetch_pc_byte(bus).wrapping_add(self.x));
                false
            }
            AddrMode::ZeroPageY => {
                self.addr_abs = u16::from(self.fetch_pc_byte(bus).wrapping_add(self.y));
                false
            }
            AddrMode::Absolute => {
                self.addr_abs = self.fetch_abs(bus);
                false
            }
            AddrMode::AbsoluteX => {
                let base = self.fetch_abs(bus);
                self.addr_abs = base.wrapping_add(u16::from(self.x));
                (self.addr_abs & 0xFF00) != (base & 0xFF00)
            }
            AddrMode::AbsoluteY => {
                let base = self.fetch_abs(bus);
                self.addr_abs = base.wrapping_add(u16::from(self.y));
                (self.addr_abs & 0xFF00) != (base & 0xFF00)
            }
            AddrMode::Indirect => {
                let ptr = self.fetch_abs(bus);
                self.addr_abs = bus.read_u16_wrap(ptr);
                false
            }
            AddrMode::IndexedIndirect => {
                let t = self.fetch_pc_byte(bus).wrapping_add(self.x);
                let lo = u16::from(bus.read(u16::from(t)));
                let hi = u16::from(bus.read(u16::from(t.wrapping_add(1))));
                self.addr_abs = (hi << 8) | lo;
                false
            }
            AddrMode::IndirectIndexed => {
                let t = self.fetch_pc_byte(bus);
                let lo = u16::from(bus.read(u16::from(t)));
                let hi = u16::from(bus.read(u16::from(t.wrapping_add(1))));
                let base = (hi << 8) | lo;
                self.addr_abs = base.wrapping_add(u16::from(self.y));
                (self.addr_abs & 0xFF00) != (base & 0xFF00)
            }
            AddrMode::Relative => {
                let offset = self.fetch_pc_byte(bus) as i8;
                self.addr_rel = offset as i16 as u16;
                false
            }
        }
    }

    fn fetch_abs(&mut self, bus: &mut impl Bus) -> u16 {
        let lo = u16::from(self.fetch_pc_byte(bus));
        let hi = u16::from(self.fetch_pc_byte(bus));
        (hi << 8) | lo
    }

    /// Read the operand named by `mode`/`addr_abs`. Not used by opcodes with
    /// no operand (branches, flag sets, transfers, stack ops, jumps).
    fn operand(&self, mode: AddrMode, bus: &mut impl Bus) -> u8 {
        match mode {
            AddrMode::Accumulator => self.a,
            _ => bus.read(self.addr_abs),
        }
    }

    fn store_result(&mut self, mode: AddrMode, bus: &mut impl Bus, value: u8) {
        match mode {
            AddrMode::Accumulator => self.a = value,
            _ => bus.write(self.addr_abs, value),
        }
    }

    fn compare(&mut self, reg: u8, m: u8) {
        let result = reg.wrapping_sub(m);
        self.status.set_flag(Status::C, reg >= m);
        self.status.set_zn(result);
    }

    fn branch_if(&mut self, bus: &mut impl Bus, condition: bool) {
        if !condition {
            return;
        }
        self.cycles_remaining += 1;
        let target = self.pc.wrapping_add(self.addr_rel);
        if (target & 0xFF00) != (self.pc & 0xFF00) {
            self.cycles_remaining += 1;
        }
        self.pc = target;
        let _ = bus;
    }

    fn adc(&mut self, m: u8) {
        let carry_in = u16::from(self.status.contains(Status::C));
        let sum = u16::from(self.a) + u16::from(m) + carry_in;
        let result = sum as u8;
        self.status.set_flag(Status::C, sum > 0xFF);
        self.status
            .set_flag(Status::V, (!(self.a ^ m) & (self.a ^ result) & 0x80) != 0);
        self.a = result;
        self.status.set_zn(result);
    }

    /// Execute the decoded mnemonic. Returns whether this opcode permits the
    /// page-cross read bonus (combined with the addressing mode's own
    /// crossing flag in `clock`). Branches manage `cycles_remaining`
    /// directly instead, per the taken/not-taken/page-crossed cycle table.
    #[allow(clippy::too_many_lines)]
    fn execute(&mut self, mnemonic: Mnemonic, mode: AddrMode, bus: &mut impl Bus) -> bool {
        match mnemonic {
            Mnemonic::Adc => {
                let m = self.operand(mode, bus);
                self.adc(m);
            }
            Mnemonic::Sbc => {
                let m = self.operand(mode, bus);
                self.adc(!m);
            }
            Mnemonic::And => {
                self.a &= self.operand(mode, bus);
                self.status.set_zn(self.a);
            }
            Mnemonic::Ora => {
                self.a |= self.operand(mode, bus);
                self.status.set_zn(self.a);
            }
            Mnemonic::Eor => {
                self.a ^= self.operand(mode, bus);
                self.status.set_zn(self.a);
            }
            Mnemonic::Asl => {
                let m = self.operand(mode, bus);
                self.status.set_flag(Status::C, m & 0x80 != 0);
                let result = m << 1;
                self.status.set_zn(result);
                self.store_result(mode, bus, result);
            }
            Mnemonic::Lsr => {
                let m = self.operand(mode, bus);
                self.status.set_flag(Status::C, m & 0x01 != 0);
                let result = m >> 1;
                self.status.set_zn(result);
                self.store_result(mode, bus, result);
            }
            Mnemonic::Rol => {
                let m = self.operand(mode, bus);
                let carry_in = u8::from(self.status.contains(Status::C));
                self.status.set_flag(Status::C, m & 0x80 != 0);
                let result = (m << 1) | carry_in;
                self.status.set_zn(result);
                self.store_result(mode, bus, result);
            }
            Mnemonic::Ror => {
                let m = self.operand(mode, bus);
                let carry_in = u8::from(self.status.contains(Status::C));
                self.status.set_flag(Status::C, m & 0x01 != 0);
                let result = (m >> 1) | (carry_in << 7);
                self.status.set_zn(result);
                self.store_result(mode, bus, result);
            }
            Mnemonic::Bit => {
                let m = self.operand(mode, bus);
                self.status.set_flag(Status::Z, self.a & m == 0);
                self.status.set_flag(Status::N, m & 0x80 != 0);
                self.status.set_flag(Status::V, m & 0x40 != 0);
            }
            Mnemonic::Cmp => {
                let m = self.operand(mode, bus);
                self.compare(self.a, m);
            }
            Mnemonic::Cpx => {
                let m = self.operand(mode, bus);
                self.compare(self.x, m);
            }
            Mnemonic::Cpy => {
                let m = self.operand(mode, bus);
                self.compare(self.y, m);
            }
            Mnemonic::Dec => {
                let result = self.operand(mode, bus).wrapping_sub(1);
                self.status.set_zn(result);
                self.store_result(mode, bus, result);
            }
            Mnemonic::Inc => {
                let result = self.operand(mode, bus).wrapping_add(1);
                self.status.set_zn(result);
                self.store_result(mode, bus, result);
            }
            Mnemonic::Dex => {
                self.x = self.x.wrapping_sub(1);
                self.status.set_zn(self.x);
            }
            Mnemonic::Dey => {
                self.y = self.y.wrapping_sub(1);
                self.status.set_zn(self.y);
            }
            Mnemonic::Inx => {
                self.x = self.x.wrapping_add(1);
                self.status.set_zn(self.x);
            }
            Mnemonic::Iny => {
                self.y = self.y.wrapping_add(1);
                self.status.set_zn(self.y);
            }
            Mnemonic::Lda => {
                self.a = self.operand(mode, bus);
                self.status.set_zn(self.a);
            }
            Mnemonic::Ldx => {
                self.x = self.operand(mode, bus);
                self.status.set_zn(self.x);
            }
            Mnemonic::Ldy => {
                self.y = self.operand(mode, bus);
                self.status.set_zn(self.y);
            }
            Mnemonic::Sta => bus.write(self.addr_abs, self.a),
            Mnemonic::Stx => bus.write(self.addr_abs, self.x),
            Mnemonic::Sty => bus.write(self.addr_abs, self.y),
            Mnemonic::Tax => {
                self.x = self.a;
                self.status.set_zn(self.x);
            }
            Mnemonic::Tay => {
                self.y = self.a;
                self.status.set_zn(self.y);
            }
            Mnemonic::Txa => {
                self.a = self.x;
                self.status.set_zn(self.a);
            }
            Mnemonic::Tya => {
                self.a = self.y;
                self.status.set_zn(self.a);
            }
            Mnemonic::Tsx => {
                self.x = self.sp;
                self.status.set_zn(self.x);
            }
            Mnemonic::Txs => self.sp = self.x,
            Mnemonic::Pha => self.push(bus, self.a),
            Mnemonic::Pla => {
                self.a = self.pop(bus);
                self.status.set_zn(self.a);
            }
            Mnemonic::Php => {
                let byte = self.status.to_stack_byte(true);
                self.push(bus, byte);
            }
            Mnemonic::Plp => {
                let byte = self.pop(bus);
                self.status = Status::from_stack_byte(byte);
            }
            Mnemonic::Jmp => self.pc = self.addr_abs,
            Mnemonic::Jsr => {
                let return_addr = self.pc.wrapping_sub(1);
                self.push_u16(bus, return_addr);
                self.pc = self.addr_abs;
            }
            Mnemonic::Rts => {
                let addr = self.pop_u16(bus);
                self.pc = addr.wrapping_add(1);
            }
            Mnemonic::Brk => {
                self.pc = self.pc.wrapping_add(1);
                self.push_u16(bus, self.pc);
                let byte = self.status.to_stack_byte(true);
                self.push(bus, byte);
                self.status.insert(Status::I);
                self.pc = bus.read_u16(vectors::IRQ);
            }
            Mnemonic::Rti => {
                let byte = self.pop(bus);
                self.status = Status::from_stack_byte(byte);
                self.pc = self.pop_u16(bus);
            }
            Mnemonic::Bcc => self.branch_if(bus, !self.status.contains(Status::C)),
            Mnemonic::Bcs => self.branch_if(bus, self.status.contains(Status::C)),
            Mnemonic::Beq => self.branch_if(bus, self.status.contains(Status::Z)),
            Mnemonic::Bne => self.branch_if(bus, !self.status.contains(Status::Z)),
            Mnemonic::Bmi => self.branch_if(bus, self.status.contains(Status::N)),
            Mnemonic::Bpl => self.branch_if(bus, !self.status.contains(Status::N)),
            Mnemonic::Bvc => self.branch_if(bus, !self.status.contains(Status::V)),
            Mnemonic::Bvs => self.branch_if(bus, self.status.contains(Status::V)),
            Mnemonic::Clc => self.status.remove(Status::C),
            Mnemonic::Cld => self.status.remove(Status::D),
            Mnemonic::Cli => self.status.remove(Status::I),
            Mnemonic::Clv => self.status.remove(Status::V),
            Mnemonic::Sec => self.status.insert(Status::C),
            Mnemonic::Sed => self.status.insert(Status::D),
            Mnemonic::Sei => self.status.insert(Status::I),
            Mnemonic::Nop => {}
        }

        allows_page_cross_bonus(mnemonic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    struct TestBus {
        memory: [u8; 0x10000],
    }

    impl TestBus {
        fn new() -> Self {
            Self { memory: [0; 0x10000] }
        }

        fn load(&mut self, addr: u16, program: &[u8]) {
            for (i, &byte) in program.iter().enumerate() {
                self.memory[addr as usize + i] = byte;
            }
        }

        fn with_reset_vector(addr: u16) -> Self {
            let mut bus = Self::new();
            bus.memory[0xFFFC] = (addr & 0xFF) as u8;
            bus.memory[0xFFFD] = (addr >> 8) as u8;
            bus
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
    fn reset_determinism() {
        let mut bus = TestBus::with_reset_vector(0x8000);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);

        assert_eq!(cpu.pc(), 0x8000);
        assert_eq!(cpu.sp(), 0xFD);
        assert_eq!(cpu.a(), 0);
        assert_eq!(cpu.x(), 0);
        assert_eq!(cpu.y(), 0);
        assert!(cpu.status().contains(Status::U));
        assert!(cpu.status().contains(Status::I));
        assert!(!cpu.status().contains(Status::C));
    }

    #[test]
    fn lda_immediate_sets_flags() {
        let mut bus = TestBus::with_reset_vector(0x8000);
        bus.load(0x8000, &[0xA9, 0x00]);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        cpu.step(&mut bus);

        assert_eq!(cpu.a(), 0);
        assert!(cpu.status().contains(Status::Z));
        assert_eq!(cpu.pc(), 0x8002);
    }

    #[test]
    fn adc_sets_carry_and_overflow() {
        let mut bus = TestBus::with_reset_vector(0x8000);
        // LDA #$7F, ADC #$01 -> overflow (0x7F + 1 = 0x80, signed overflow)
        bus.load(0x8000, &[0xA9, 0x7F, 0x69, 0x01]);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        cpu.step(&mut bus);
        cpu.step(&mut bus);

        assert_eq!(cpu.a(), 0x80);
        assert!(cpu.status().contains(Status::V));
        assert!(cpu.status().contains(Status::N));
        assert!(!cpu.status().contains(Status::C));
    }

    #[test]
    fn sbc_is_adc_of_inverted_operand() {
        let mut bus_a = TestBus::with_reset_vector(0x8000);
        bus_a.load(0x8000, &[0xA9, 0x50, 0x38, 0xE9, 0x10]); // LDA #$50, SEC, SBC #$10
        let mut cpu_a = Cpu::new();
        cpu_a.reset(&mut bus_a);
        cpu_a.step(&mut bus_a);
        cpu_a.step(&mut bus_a);
        cpu_a.step(&mut bus_a);

        let mut bus_b = TestBus::with_reset_vector(0x8000);
        bus_b.load(0x8000, &[0xA9, 0x50, 0x38, 0x69, 0xEF]); // LDA #$50, SEC, ADC #$EF (~0x10)
        let mut cpu_b = Cpu::new();
        cpu_b.reset(&mut bus_b);
        cpu_b.step(&mut bus_b);
        cpu_b.step(&mut bus_b);
        cpu_b.step(&mut bus_b);

        assert_eq!(cpu_a.a(), cpu_b.a());
        assert_eq!(cpu_a.status(), cpu_b.status());
    }

    #[test]
    fn page_cross_adds_a_cycle() {
        let mut bus = TestBus::with_reset_vector(0x8000);
        // LDA $12F0,X
        bus.load(0x8000, &[0xBD, 0xF0, 0x12]);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);

        cpu.x = 0x15; // 0x12F0 + 0x15 crosses into the next page
        let before = cpu.cycles();
        cpu.step(&mut bus);
        assert_eq!(cpu.cycles() - before, 5);
    }

    #[test]
    fn no_page_cross_is_base_cycles() {
        let mut bus = TestBus::with_reset_vector(0x8000);
        bus.load(0x8000, &[0xBD, 0xF0, 0x12]);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);

        cpu.x = 0x05; // stays on the same page
        let before = cpu.cycles();
        cpu.step(&mut bus);
        assert_eq!(cpu.cycles() - before, 4);
    }

    #[test]
    fn jmp_indirect_page_wrap_bug() {
        let mut bus = TestBus::with_reset_vector(0x8000);
        bus.load(0x8000, &[0x6C, 0xFF, 0x02]); // JMP ($02FF)
        bus.memory[0x02FF] = 0x34;
        bus.memory[0x0200] = 0x56; // wrap reads this as the high byte (the bug)
        bus.memory[0x0300] = 0x78; // a correct fetch would read this instead
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        cpu.step(&mut bus);

        assert_eq!(cpu.pc(), 0x5634);
    }

    #[test]
    fn stack_roundtrip_preserves_byte_and_sp() {
        let mut bus = TestBus::with_reset_vector(0x8000);
        bus.load(0x8000, &[0xA9, 0x42, 0x48, 0xA9, 0x00, 0x68]); // LDA #$42, PHA, LDA #$00, PLA
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        let sp_before = cpu.sp();

        cpu.step(&mut bus);
        cpu.step(&mut bus);
        cpu.step(&mut bus);
        assert_eq!(cpu.a(), 0);
        cpu.step(&mut bus);

        assert_eq!(cpu.a(), 0x42);
        assert_eq!(cpu.sp(), sp_before);
    }

    #[test]
    fn jsr_then_rts_restores_pc_and_sp() {
        let mut bus = TestBus::with_reset_vector(0x8000);
        bus.load(0x8000, &[0x20, 0x10, 0x80]); // JSR $8010
        bus.memory[0x8010] = 0x60; // RTS
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        let sp_before = cpu.sp();

        cpu.step(&mut bus);
        assert_eq!(cpu.pc(), 0x8010);
        assert_eq!(cpu.sp(), sp_before.wrapping_sub(2));

        cpu.step(&mut bus);
        assert_eq!(cpu.pc(), 0x8003);
        assert_eq!(cpu.sp(), sp_before);
    }

    #[test]
    fn branch_taken_adds_a_cycle_and_moves_pc() {
        let mut bus = TestBus::with_reset_vector(0x8000);
        bus.load(0x8000, &[0xA9, 0x00, 0xF0, 0x05]); // LDA #$00, BEQ +5
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        cpu.step(&mut bus);

        let before = cpu.cycles();
        cpu.step(&mut bus);
        assert_eq!(cpu.pc(), 0x8009);
        assert_eq!(cpu.cycles() - before, 3);
    }

    #[test]
    fn branch_not_taken_is_base_cycles() {
        let mut bus = TestBus::with_reset_vector(0x8000);
        bus.load(0x8000, &[0xA9, 0x01, 0xF0, 0x05]); // LDA #$01, BEQ +5
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        cpu.step(&mut bus);

        let before = cpu.cycles();
        cpu.step(&mut bus);
        assert_eq!(cpu.pc(), 0x8004);
        assert_eq!(cpu.cycles() - before, 2);
    }

    #[test]
    fn nmi_pushes_state_and_vectors() {
        let mut bus = TestBus::with_reset_vector(0x8000);
        bus.memory[0xFFFA] = 0x00;
        bus.memory[0xFFFB] = 0x90;
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        cpu.step(&mut bus); // consume the reset's dead cycles via a NOP-equivalent fetch

        cpu.nmi(&mut bus);
        assert_eq!(cpu.pc(), 0x9000);
    }

    #[test]
    fn brk_sets_break_and_vectors_to_irq() {
        let mut bus = TestBus::with_reset_vector(0x8000);
        bus.load(0x8000, &[0x00]); // BRK
        bus.memory[0xFFFE] = 0x00;
        bus.memory[0xFFFF] = 0x90;
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        cpu.step(&mut bus);

        assert_eq!(cpu.pc(), 0x9000);
        assert!(cpu.status().contains(Status::I));
    }

    /// Runs `LDA #a; [SEC|CLC]; ADC #m` (or `SBC #m`) from a freshly reset
    /// CPU and returns the resulting accumulator and status.
    fn run_adc_sbc(a: u8, m: u8, carry_in: bool, sbc: bool) -> (u8, Status) {
        let mut bus = TestBus::with_reset_vector(0x8000);
        let carry_op = if carry_in { 0x38 } else { 0x18 }; // SEC / CLC
        let alu_op = if sbc { 0xE9 } else { 0x69 }; // SBC # / ADC #
        bus.load(0x8000, &[0xA9, a, carry_op, alu_op, m]);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        cpu.step(&mut bus);
        cpu.step(&mut bus);
        cpu.step(&mut bus);
        (cpu.a(), cpu.status())
    }

    proptest! {
        #[test]
        fn adc_matches_wrapping_sum_and_flags(a: u8, m: u8, carry_in: bool) {
            let (result, status) = run_adc_sbc(a, m, carry_in, false);

            let sum = u16::from(a) + u16::from(m) + u16::from(carry_in);
            prop_assert_eq!(result, sum as u8);
            prop_assert_eq!(status.contains(Status::C), sum >= 256);
            prop_assert_eq!(status.contains(Status::Z), result == 0);
            prop_assert_eq!(status.contains(Status::N), result & 0x80 != 0);

            let overflow = (!(a ^ m) & (a ^ result)) & 0x80 != 0;
            prop_assert_eq!(status.contains(Status::V), overflow);
        }

        #[test]
        fn sbc_is_adc_of_complemented_operand(a: u8, m: u8, carry_in: bool) {
            let (sbc_result, sbc_status) = run_adc_sbc(a, m, carry_in, true);
            let (adc_result, adc_status) = run_adc_sbc(a, m ^ 0xFF, carry_in, false);

            prop_assert_eq!(sbc_result, adc_result);
            prop_assert_eq!(sbc_status, adc_status);
        }

        #[test]
        fn stack_roundtrip_preserves_any_byte(byte: u8) {
            let mut bus = TestBus::with_reset_vector(0x8000);
            bus.load(0x8000, &[0xA9, byte, 0x48, 0xA9, 0x00, 0x68]); // LDA #byte, PHA, LDA #$00, PLA
            let mut cpu = Cpu::new();
            cpu.reset(&mut bus);
            let sp_before = cpu.sp();

            cpu.step(&mut bus);
            cpu.step(&mut bus);
            cpu.step(&mut bus);
            cpu.step(&mut bus);

            prop_assert_eq!(cpu.a(), byte);
            prop_assert_eq!(cpu.sp(), sp_before);
        }
    }
}
