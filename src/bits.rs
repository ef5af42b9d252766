//! Bit views over a raw instruction word.
//!
//! Instructions are 1..=4 little-endian 16-bit parcels; the whole window is
//! held as one `u64` and the various instruction formats are plain accessor
//! sets over it. A decode branch picks the accessor set matching the shape it
//! has already committed to; the bits are never copied or re-parsed.

use crate::operand::Reg;

/// Raw instruction word: up to four parcels, most significant parcel last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Word(pub u64);

impl Word {
    /// Builds the word from a code window, zero-padding past the end.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut raw = [0u8; 8];
        let n = bytes.len().min(8);
        raw[..n].copy_from_slice(&bytes[..n]);
        Word(u64::from_le_bytes(raw))
    }

    /// Bits `lo..=hi`, right-aligned. Out-of-range indices are a caller bug.
    #[inline]
    pub fn bits(self, hi: u32, lo: u32) -> u64 {
        assert!(hi >= lo && hi < 64, "bad bit range {hi}:{lo}");
        let width = hi - lo + 1;
        let mask = if width == 64 { u64::MAX } else { (1 << width) - 1 };
        (self.0 >> lo) & mask
    }

    #[inline]
    pub fn bit(self, i: u32) -> bool {
        self.bits(i, i) != 0
    }

    // Fields shared by the dispatch layers.

    pub fn hi5(self) -> u64 {
        self.bits(15, 11)
    }

    pub fn lo5(self) -> u64 {
        self.bits(4, 0)
    }

    /// Upper 4 bits of the primary opcode.
    pub fn opcode_hi(self) -> u64 {
        self.bits(10, 7)
    }

    /// Lower 2 bits of the primary opcode.
    pub fn opcode_lo(self) -> u64 {
        self.bits(6, 5)
    }

    /// Discriminant for the floating-point sub-space.
    pub fn is_fp(self) -> bool {
        self.bit(26)
    }

    pub fn ext_opcode_hi(self) -> u64 {
        self.bits(25, 23)
    }

    pub fn ext_opcode_lo(self) -> u64 {
        self.bits(22, 21)
    }

    pub fn ext_hi5(self) -> u64 {
        self.bits(31, 27)
    }

    pub fn ext_lo5(self) -> u64 {
        self.bits(20, 16)
    }

    pub fn reg1(self) -> Reg {
        Reg::new(self.lo5() as u8)
    }

    pub fn reg2(self) -> Reg {
        Reg::new(self.hi5() as u8)
    }
}

/// Sign-extends the low `width` bits of `v`.
#[inline]
pub fn sign_extend(v: u64, width: u32) -> i64 {
    assert!(width >= 1 && width <= 64, "bad field width {width}");
    let shift = 64 - width;
    ((v << shift) as i64) >> shift
}

/// Format III: conditional branch, 9-bit scaled displacement.
pub mod fmt3 {
    use super::Word;

    pub fn cond(w: Word) -> u8 {
        w.bits(3, 0) as u8
    }

    pub fn disp9(w: Word) -> u64 {
        w.bits(15, 11) << 4 | w.bits(6, 4) << 1
    }
}

/// Format IV: short EP-based load/store, 7-bit displacement family.
pub mod fmt4 {
    use super::Word;

    pub fn disp7(w: Word) -> u64 {
        w.bits(6, 0)
    }

    pub fn disp6(w: Word) -> u64 {
        w.bits(6, 1)
    }

    pub fn sub_opcode(w: Word) -> u64 {
        w.bits(0, 0)
    }
}

/// Format V: 22-bit relative jump, displacement split across two parcels.
pub mod fmt5 {
    use super::Word;

    pub fn disp22(w: Word) -> u64 {
        w.bits(5, 0) << 16 | w.bits(31, 16)
    }
}

/// Format VI: reg-reg-imm16 (and the 48-bit imm32 extension).
pub mod fmt6 {
    use super::Word;

    pub fn imm16(w: Word) -> u64 {
        w.bits(31, 16)
    }

    pub fn imm32(w: Word) -> u64 {
        w.bits(47, 32) << 16 | w.bits(31, 16)
    }
}

/// Format VII: based load/store with a 16-bit displacement field.
pub mod fmt7 {
    use super::Word;

    pub fn disp15(w: Word) -> u64 {
        w.bits(31, 17)
    }

    pub fn disp16(w: Word) -> u64 {
        w.bits(31, 16)
    }

    pub fn sub_opcode(w: Word) -> u64 {
        w.bits(16, 16)
    }
}

/// Format VIII: bit manipulation on a based byte.
pub mod fmt8 {
    use super::Word;

    pub fn sub_opcode(w: Word) -> u64 {
        w.bits(15, 14)
    }

    pub fn bit_index(w: Word) -> u8 {
        w.bits(13, 11) as u8
    }

    pub fn disp16(w: Word) -> u64 {
        w.bits(31, 16)
    }
}

/// Format XI: three-register extended ops.
pub mod fmt11 {
    use super::Word;
    use crate::operand::Reg;

    pub fn reg3(w: Word) -> Reg {
        Reg::new(w.bits(31, 27) as u8)
    }
}

/// Format XII: reg-reg extended ops with a split 10-bit immediate.
pub mod fmt12 {
    use super::Word;

    pub fn imm10(w: Word) -> u64 {
        w.bits(22, 18) << 5 | w.bits(4, 0)
    }
}

/// Format XIII: PREPARE/DISPOSE register-list forms.
pub mod fmt13 {
    use super::Word;
    use crate::operand::Reg;

    pub fn imm5(w: Word) -> u64 {
        w.bits(4, 1)
    }

    pub fn list12(w: Word) -> u16 {
        (w.bits(31, 21) << 1 | w.bits(0, 0)) as u16
    }

    pub fn reg2(w: Word) -> Reg {
        Reg::new(w.bits(20, 16) as u8)
    }

    pub fn imm16(w: Word) -> u64 {
        w.bits(47, 32)
    }

    pub fn imm32(w: Word) -> u64 {
        w.bits(63, 48) << 16 | w.bits(47, 32)
    }
}

/// Format XIV: 48-bit load/store with a 23-bit displacement.
pub mod fmt14 {
    use super::Word;
    use crate::operand::Reg;

    pub fn reg3(w: Word) -> Reg {
        Reg::new(w.bits(31, 27) as u8)
    }

    pub fn sub_opcode(w: Word) -> u64 {
        w.bits(19, 16)
    }

    pub fn disp23(w: Word) -> u64 {
        w.bits(47, 32) << 7 | w.bits(26, 20)
    }
}

/// Floating-point format: category / type / subop nesting.
pub mod fmtf {
    use super::Word;
    use crate::operand::Reg;

    pub fn reg1(w: Word) -> Reg {
        Reg::new(w.bits(4, 0) as u8)
    }

    pub fn reg2(w: Word) -> Reg {
        Reg::new(w.bits(20, 16) as u8)
    }

    pub fn reg3(w: Word) -> Reg {
        Reg::new(w.bits(31, 27) as u8)
    }

    pub fn category(w: Word) -> u64 {
        w.bits(25, 23)
    }

    pub fn fp_type(w: Word) -> u64 {
        w.bits(22, 21)
    }
}
