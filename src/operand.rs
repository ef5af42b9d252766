//! Operand model shared by the decoder and the lifter.
//!
//! Every immediate-like operand carries its exact source bit width and
//! signedness; extension to a full register width happens where the value is
//! consumed, not where it is built. The one decode-time exception is a
//! displacement based on `r0`: the hardware treats that as an absolute
//! address, so the offset is re-wrapped as 32-bit unsigned at construction
//! because the encoded field really is a different shape.

use serde::{Deserialize, Serialize};

use crate::bits::sign_extend;

/// General-purpose register index, `r0..=r31`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Reg(u8);

impl Reg {
    pub const R0: Reg = Reg(0);
    /// Stack pointer.
    pub const SP: Reg = Reg(3);
    /// Global pointer.
    pub const GP: Reg = Reg(4);
    /// Text pointer.
    pub const TP: Reg = Reg(5);
    /// Element pointer, base of the short load/store forms.
    pub const EP: Reg = Reg(30);
    /// Link pointer.
    pub const LP: Reg = Reg(31);

    pub fn new(index: u8) -> Self {
        assert!(index < 32, "register index out of range: {index}");
        Reg(index)
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

/// Immediate with explicit source width and signedness. The raw field bits
/// are stored masked; `value()` applies the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Imm {
    bits: u64,
    width: u8,
    signed: bool,
}

impl Imm {
    pub fn new(bits: u64, width: u8, signed: bool) -> Self {
        assert!(width >= 1 && width <= 64, "bad immediate width {width}");
        let mask = if width == 64 {
            u64::MAX
        } else {
            (1 << width) - 1
        };
        Imm {
            bits: bits & mask,
            width,
            signed,
        }
    }

    pub fn width(self) -> u8 {
        self.width
    }

    pub fn signed(self) -> bool {
        self.signed
    }

    /// Raw field bits, zero-extended.
    pub fn raw(self) -> u64 {
        self.bits
    }

    /// The operand value, sign- or zero-extended per its declared shape.
    pub fn value(self) -> i64 {
        if self.signed {
            sign_extend(self.bits, self.width as u32)
        } else {
            self.bits as i64
        }
    }
}

/// Base register plus immediate offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disp {
    pub base: Reg,
    pub offset: Imm,
}

impl Disp {
    pub fn new(base: Reg, offset: Imm) -> Self {
        // r0 is hardwired zero, so the encoding means an absolute address and
        // the offset becomes the wider unsigned form.
        let offset = if base.is_zero() {
            Imm::new(offset.value() as u64, 32, false)
        } else {
            offset
        };
        Disp { base, offset }
    }

    /// `[reg]` with no displacement.
    pub fn reg_only(base: Reg) -> Self {
        Disp::new(base, Imm::new(0, 1, false))
    }
}

/// Branch condition codes, 16-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cond {
    V,
    L,
    Z,
    Nh,
    N,
    R,
    Lt,
    Le,
    Nv,
    Nl,
    Nz,
    H,
    P,
    Sa,
    Ge,
    Gt,
}

impl Cond {
    pub fn from_bits(v: u8) -> Self {
        use Cond::*;
        const TABLE: [Cond; 16] = [V, L, Z, Nh, N, R, Lt, Le, Nv, Nl, Nz, H, P, Sa, Ge, Gt];
        TABLE[(v & 0xF) as usize]
    }
}

/// Floating-point condition codes, 16-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FpCond {
    F,
    Un,
    Eq,
    Ueq,
    Olt,
    Ult,
    Ole,
    Ule,
    Sf,
    Ngle,
    Seq,
    Ngl,
    Lt,
    Nge,
    Le,
    Ngt,
}

impl FpCond {
    pub fn from_bits(v: u8) -> Self {
        use FpCond::*;
        const TABLE: [FpCond; 16] = [
            F, Un, Eq, Ueq, Olt, Ult, Ole, Ule, Sf, Ngle, Seq, Ngl, Lt, Nge, Le, Ngt,
        ];
        TABLE[(v & 0xF) as usize]
    }
}

/// Cache maintenance sub-operation; unknown encodings stay decodable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheOp {
    Invalid,
    Chbii,
    Cibii,
    Cfali,
    Cisti,
    Cildi,
    Cll,
}

impl CacheOp {
    pub fn from_encoding(v: u64) -> Self {
        match v {
            0x00 => CacheOp::Chbii,
            0x20 => CacheOp::Cibii,
            0x40 => CacheOp::Cfali,
            0x60 => CacheOp::Cisti,
            0x61 => CacheOp::Cildi,
            0x7e => CacheOp::Cll,
            _ => CacheOp::Invalid,
        }
    }

    pub fn is_valid(self) -> bool {
        self != CacheOp::Invalid
    }
}

/// Prefetch sub-operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrefetchOp {
    Invalid,
    Prefi,
}

impl PrefetchOp {
    pub fn from_encoding(v: u64) -> Self {
        match v {
            0x0 => PrefetchOp::Prefi,
            _ => PrefetchOp::Invalid,
        }
    }

    pub fn is_valid(self) -> bool {
        self != PrefetchOp::Invalid
    }
}

/// Mask-bit priority order of the 12-bit register list. The hardware assigns
/// mask bits to this fixed, non-contiguous register set; the decoded list is
/// then kept in ascending register order.
pub const LIST12_REGS: [u8; 12] = [30, 31, 29, 28, 23, 22, 21, 20, 27, 26, 25, 24];

/// Register list from a PREPARE/DISPOSE mask, ascending order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegList(Vec<Reg>);

impl RegList {
    pub fn from_mask(mask: u16) -> Self {
        let mut regs: Vec<Reg> = LIST12_REGS
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, &r)| Reg::new(r))
            .collect();
        regs.sort();
        RegList(regs)
    }

    pub fn regs(&self) -> &[Reg] {
        &self.0
    }

    pub fn contains(&self, reg: Reg) -> bool {
        self.0.contains(&reg)
    }
}

/// Even/odd register pair; the even register carries the low half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegPair {
    pub hi: Reg,
    pub lo: Reg,
}

impl RegPair {
    /// Pairs `reg` with its partner per the fixed rule: an even register
    /// pairs with the next odd one.
    pub fn from_reg(reg: Reg) -> Self {
        let r = reg.index();
        if r % 2 == 0 {
            RegPair {
                hi: Reg::new(r + 1),
                lo: reg,
            }
        } else {
            RegPair {
                hi: reg,
                lo: Reg::new(r - 1),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    Reg(Reg),
    /// Status register by raw ID; name resolution is generation-specific and
    /// happens in the lifter.
    SysReg(u8),
    Imm(Imm),
    Disp(Disp),
    /// One bit of a based byte, selected by a literal index.
    BitMem { index: u8, mem: Disp },
    RegList(RegList),
    RegPair(RegPair),
    RegRange { lo: Reg, hi: Reg },
    Cond(Cond),
    FpCond(FpCond),
    CacheOp(CacheOp),
    PrefetchOp(PrefetchOp),
    /// PC-relative jump target.
    RelJump(Imm),
    /// Jump through a base register plus offset.
    BasedJump(Disp),
    /// Jump through a register.
    RegJump(Reg),
    /// Trap/syscall vector.
    VecJump(u8),
}
