//! Legal 6502 opcode decode table.
//!
//! Every opcode byte decodes to a [`Mnemonic`], an [`AddrMode`], and a base
//! cycle count. Only the 56 documented/legal mnemonics are assigned; every
//! other byte decodes to an implicit-mode two-cycle [`Mnemonic::Nop`] by
//! construction, so unofficial opcodes need no special-casing elsewhere in
//! the CPU.

use crate::addressing::AddrMode;
use std::fmt;

/// A legal 6502 mnemonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Mnemonic {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs,
    Clc, Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx, Iny,
    Jmp, Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp, Rol, Ror,
    Rti, Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay, Tsx, Txa, Txs, Tya,
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Adc => "ADC", Self::And => "AND", Self::Asl => "ASL", Self::Bcc => "BCC",
            Self::Bcs => "BCS", Self::Beq => "BEQ", Self::Bit => "BIT", Self::Bmi => "BMI",
            Self::Bne => "BNE", Self::Bpl => "BPL", Self::Brk => "BRK", Self::Bvc => "BVC",
            Self::Bvs => "BVS", Self::Clc => "CLC", Self::Cld => "CLD", Self::Cli => "CLI",
            Self::Clv => "CLV", Self::Cmp => "CMP", Self::Cpx => "CPX", Self::Cpy => "CPY",
            Self::Dec => "DEC", Self::Dex => "DEX", Self::Dey => "DEY", Self::Eor => "EOR",
            Self::Inc => "INC", Self::Inx => "INX", Self::Iny => "INY", Self::Jmp => "JMP",
            Self::Jsr => "JSR", Self::Lda => "LDA", Self::Ldx => "LDX", Self::Ldy => "LDY",
            Self::Lsr => "LSR", Self::Nop => "NOP", Self::Ora => "ORA", Self::Pha => "PHA",
            Self::Php => "PHP", Self::Pla => "PLA", Self::Plp => "PLP", Self::Rol => "ROL",
            Self::Ror => "ROR", Self::Rti => "RTI", Self::Rts => "RTS", Self::Sbc => "SBC",
            Self::Sec => "SEC", Self::Sed => "SED", Self::Sei => "SEI", Self::Sta => "STA",
            Self::Stx => "STX", Self::Sty => "STY", Self::Tax => "TAX", Self::Tay => "TAY",
            Self::Tsx => "TSX", Self::Txa => "TXA", Self::Txs => "TXS", Self::Tya => "TYA",
        };
        f.write_str(name)
    }
}

/// One decoded opcode-table entry.
#[derive(Debug, Clone, Copy)]
pub struct OpcodeEntry {
    /// The mnemonic to execute.
    pub mnemonic: Mnemonic,
    /// How to compute the operand address.
    pub mode: AddrMode,
    /// Base cycle count before any page-cross/branch bonus.
    pub cycles: u8,
}

const fn e(mnemonic: Mnemonic, mode: AddrMode, cycles: u8) -> OpcodeEntry {
    OpcodeEntry { mnemonic, mode, cycles }
}

const NOP_IMP: OpcodeEntry = e(Mnemonic::Nop, AddrMode::Implicit, 2);

macro_rules! am {
    (Imp) => { AddrMode::Implicit };
    (Acc) => { AddrMode::Accumulator };
    (Imm) => { AddrMode::Immediate };
    (Zp0) => { AddrMode::ZeroPage };
    (Zpx) => { AddrMode::ZeroPageX };
    (Zpy) => { AddrMode::ZeroPageY };
    (Abs) => { AddrMode::Absolute };
    (Abx) => { AddrMode::AbsoluteX };
    (Aby) => { AddrMode::AbsoluteY };
    (Ind) => { AddrMode::Indirect };
    (Idx) => { AddrMode::IndexedIndirect };
    (Idy) => { AddrMode::IndirectIndexed };
    (Rel) => { AddrMode::Relative };
}

macro_rules! op {
    ($m:ident, $mode:ident, $c:expr) => { e(Mnemonic::$m, am!($mode), $c) };
}

/// Build the full 256-entry decode table at compile time. Every opcode byte
/// not explicitly assigned here falls through to [`NOP_IMP`].
const fn build_table() -> [OpcodeEntry; 256] {
    let mut table = [NOP_IMP; 256];

    table[0x00] = op!(Brk, Imp, 7);
    table[0x01] = op!(Ora, Idx, 6);
    table[0x05] = op!(Ora, Zp0, 3);
    table[0x06] = op!(Asl, Zp0, 5);
    table[0x08] = op!(Php, Imp, 3);
    table[0x09] = op!(Ora, Imm, 2);
    table[0x0A] = op!(Asl, Acc, 2);
    table[0x0D] = op!(Ora, Abs, 4);
    table[0x0E] = op!(Asl, Abs, 6);

    table[0x10] = op!(Bpl, Rel, 2);
    table[0x11] = op!(Ora, Idy, 5);
    table[0x15] = op!(Ora, Zpx, 4);
    table[0x16] = op!(Asl, Zpx, 6);
    table[0x18] = op!(Clc, Imp, 2);
    table[0x19] = op!(Ora, Aby, 4);
    table[0x1D] = op!(Ora, Abx, 4);
    table[0x1E] = op!(Asl, Abx, 7);

    table[0x20] = op!(Jsr, Abs, 6);
    table[0x21] = op!(And, Idx, 6);
    table[0x24] = op!(Bit, Zp0, 3);
    table[0x25] = op!(And, Zp0, 3);
    table[0x26] = op!(Rol, Zp0, 5);
    table[0x28] = op!(Plp, Imp, 4);
    table[0x29] = op!(And, Imm, 2);
    table[0x2A] = op!(Rol, Acc, 2);
    table[0x2C] = op!(Bit, Abs, 4);
    table[0x2D] = op!(And, Abs, 4);
    table[0x2E] = op!(Rol, Abs, 6);

    table[0x30] = op!(Bmi, Rel, 2);
    table[0x31] = op!(And, Idy, 5);
    table[0x35] = op!(And, Zpx, 4);
    table[0x36] = op!(Rol, Zpx, 6);
    table[0x38] = op!(Sec, Imp, 2);
    table[0x39] = op!(And, Aby, 4);
    table[0x3D] = op!(And, Abx, 4);
    table[0x3E] = op!(Rol, Abx, 7);

    table[0x40] = op!(Rti, Imp, 6);
    table[0x41] = op!(Eor, Idx, 6);
    table[0x45] = op!(Eor, Zp0, 3);
    table[0x46] = op!(Lsr, Zp0, 5);
    table[0x48] = op!(Pha, Imp, 3);
    table[0x49] = op!(Eor, Imm, 2);
    table[0x4A] = op!(Lsr, Acc, 2);
    table[0x4C] = op!(Jmp, Abs, 3);
    table[0x4D] = op!(Eor, Abs, 4);
    table[0x4E] = op!(Lsr, Abs, 6);

    table[0x50] = op!(Bvc, Rel, 2);
    table[0x51] = op!(Eor, Idy, 5);
    table[0x55] = op!(Eor, Zpx, 4);
    table[0x56] = op!(Lsr, Zpx, 6);
    table[0x58] = op!(Cli, Imp, 2);
    table[0x59] = op!(Eor, Aby, 4);
    table[0x5D] = op!(Eor, Abx, 4);
    table[0x5E] = op!(Lsr, Abx, 7);

    table[0x60] = op!(Rts, Imp, 6);
    table[0x61] = op!(Adc, Idx, 6);
    table[0x65] = op!(Adc, Zp0, 3);
    table[0x66] = op!(Ror, Zp0, 5);
    table[0x68] = op!(Pla, Imp, 4);
    table[0x69] = op!(Adc, Imm, 2);
    table[0x6A] = op!(Ror, Acc, 2);
    table[0x6C] = op!(Jmp, Ind, 5);
    table[0x6D] = op!(Adc, Abs, 4);
    table[0x6E] = op!(Ror, Abs, 6);

    table[0x70] = op!(Bvs, Rel, 2);
    table[0x71] = op!(Adc, Idy, 5);
    table[0x75] = op!(Adc, Zpx, 4);
    table[0x76] = op!(Ror, Zpx, 6);
    table[0x78] = op!(Sei, Imp, 2);
    table[0x79] = op!(Adc, Aby, 4);
    table[0x7D] = op!(Adc, Abx, 4);
    table[0x7E] = op!(Ror, Abx, 7);

    table[0x81] = op!(Sta, Idx, 6);
    table[0x84] = op!(Sty, Zp0, 3);
    table[0x85] = op!(Sta, Zp0, 3);
    table[0x86] = op!(Stx, Zp0, 3);
    table[0x88] = op!(Dey, Imp, 2);
    table[0x8A] = op!(Txa, Imp, 2);
    table[0x8C] = op!(Sty, Abs, 4);
    table[0x8D] = op!(Sta, Abs, 4);
    table[0x8E] = op!(Stx, Abs, 4);

    table[0x90] = op!(Bcc, Rel, 2);
    table[0x91] = op!(Sta, Idy, 6);
    table[0x94] = op!(Sty, Zpx, 4);
    table[0x95] = op!(Sta, Zpx, 4);
    table[0x96] = op!(Stx, Zpy, 4);
    table[0x98] = op!(Tya, Imp, 2);
    table[0x99] = op!(Sta, Aby, 5);
    table[0x9A] = op!(Txs, Imp, 2);
    table[0x9D] = op!(Sta, Abx, 5);

    table[0xA0] = op!(Ldy, Imm, 2);
    table[0xA1] = op!(Lda, Idx, 6);
    table[0xA2] = op!(Ldx, Imm, 2);
    table[0xA4] = op!(Ldy, Zp0, 3);
    table[0xA5] = op!(Lda, Zp0, 3);
    table[0xA6] = op!(Ldx, Zp0, 3);
    table[0xA8] = op!(Tay, Imp, 2);
    table[0xA9] = op!(Lda, Imm, 2);
    table[0xAA] = op!(Tax, Imp, 2);
    table[0xAC] = op!(Ldy, Abs, 4);
    table[0xAD] = op!(Lda, Abs, 4);
    table[0xAE] = op!(Ldx, Abs, 4);

    table[0xB0] = op!(Bcs, Rel, 2);
    table[0xB1] = op!(Lda, Idy, 5);
    table[0xB4] = op!(Ldy, Zpx, 4);
    table[0xB5] = op!(Lda, Zpx, 4);
    table[0xB6] = op!(Ldx, Zpy, 4);
    table[0xB8] = op!(Clv, Imp, 2);
    table[0xB9] = op!(Lda, Aby, 4);
    table[0xBA] = op!(Tsx, Imp, 2);
    table[0xBC] = op!(Ldy, Abx, 4);
    table[0xBD] = op!(Lda, Abx, 4);
    table[0xBE] = op!(Ldx, Aby, 4);

    table[0xC0] = op!(Cpy, Imm, 2);
    table[0xC1] = op!(Cmp, Idx, 6);
    table[0xC4] = op!(Cpy, Zp0, 3);
    table[0xC5] = op!(Cmp, Zp0, 3);
    table[0xC6] = op!(Dec, Zp0, 5);
    table[0xC8] = op!(Iny, Imp, 2);
    table[0xC9] = op!(Cmp, Imm, 2);
    table[0xCA] = op!(Dex, Imp, 2);
    table[0xCC] = op!(Cpy, Abs, 4);
    table[0xCD] = op!(Cmp, Abs, 4);
    table[0xCE] = op!(Dec, Abs, 6);

    table[0xD0] = op!(Bne, Rel, 2);
    table[0xD1] = op!(Cmp, Idy, 5);
    table[0xD5] = op!(Cmp, Zpx, 4);
    table[0xD6] = op!(Dec, Zpx, 6);
    table[0xD8] = op!(Cld, Imp, 2);
    table[0xD9] = op!(Cmp, Aby, 4);
    table[0xDD] = op!(Cmp, Abx, 4);
    table[0xDE] = op!(Dec, Abx, 7);

    table[0xE0] = op!(Cpx, Imm, 2);
    table[0xE1] = op!(Sbc, Idx, 6);
    table[0xE4] = op!(Cpx, Zp0, 3);
    table[0xE5] = op!(Sbc, Zp0, 3);
    table[0xE6] = op!(Inc, Zp0, 5);
    table[0xE8] = op!(Inx, Imp, 2);
    table[0xE9] = op!(Sbc, Imm, 2);
    table[0xEA] = op!(Nop, Imp, 2);
    table[0xEC] = op!(Cpx, Abs, 4);
    table[0xED] = op!(Sbc, Abs, 4);
    table[0xEE] = op!(Inc, Abs, 6);

    table[0xF0] = op!(Beq, Rel, 2);
    table[0xF1] = op!(Sbc, Idy, 5);
    table[0xF5] = op!(Sbc, Zpx, 4);
    table[0xF6] = op!(Inc, Zpx, 6);
    table[0xF8] = op!(Sed, Imp, 2);
    table[0xF9] = op!(Sbc, Aby, 4);
    table[0xFD] = op!(Sbc, Abx, 4);
    table[0xFE] = op!(Inc, Abx, 7);

    table
}

/// The 256-entry opcode decode table, indexed by opcode byte.
pub static OPCODE_TABLE: [OpcodeEntry; 256] = build_table();

/// Returns true if this mnemonic, when addressed in an indexed mode that
/// crossed a page boundary, is eligible for the one-cycle read penalty.
/// Writes and read-modify-write instructions never get this bonus.
#[must_use]
pub const fn allows_page_cross_bonus(mnemonic: Mnemonic) -> bool {
    matches!(
        mnemonic,
        Mnemonic::Adc
            | Mnemonic::And
            | Mnemonic::Cmp
            | Mnemonic::Eor
            | Mnemonic::Lda
            | Mnemonic::Ldx
            | Mnemonic::Ldy
            | Mnemonic::Ora
            | Mnemonic::Sbc
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lda_variants_decode_correctly() {
        assert_eq!(OPCODE_TABLE[0xA9].mnemonic, Mnemonic::Lda);
        assert_eq!(OPCODE_TABLE[0xA9].mode, AddrMode::Immediate);
        assert_eq!(OPCODE_TABLE[0xAD].mode, AddrMode::Absolute);
        assert_eq!(OPCODE_TABLE[0xB1].mode, AddrMode::IndirectIndexed);
    }

    #[test]
    fn jmp_indirect_decodes() {
        assert_eq!(OPCODE_TABLE[0x6C].mnemonic, Mnemonic::Jmp);
        assert_eq!(OPCODE_TABLE[0x6C].mode, AddrMode::Indirect);
        assert_eq!(OPCODE_TABLE[0x6C].cycles, 5);
    }

    #[test]
    fn unassigned_bytes_are_nop() {
        for illegal in [0x02, 0x03, 0x04, 0x0B, 0x0C, 0xFF, 0xDF] {
            assert_eq!(OPCODE_TABLE[illegal].mnemonic, Mnemonic::Nop);
            assert_eq!(OPCODE_TABLE[illegal].mode, AddrMode::Implicit);
            assert_eq!(OPCODE_TABLE[illegal].cycles, 2);
        }
    }

    #[test]
    fn page_cross_bonus_excludes_writes_and_rmw() {
        assert!(allows_page_cross_bonus(Mnemonic::Lda));
        assert!(!allows_page_cross_bonus(Mnemonic::Sta));
        assert!(!allows_page_cross_bonus(Mnemonic::Asl));
    }
}
