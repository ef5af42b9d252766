//! The mnemonic catalogue.
//!
//! Variants are laid out in generation order: each generation's additions
//! form a contiguous range, so the minimum required generation falls out of
//! the catalogue position. The few opcodes that break the pattern (the
//! ES-only debug pair) are listed explicitly.

use serde::{Deserialize, Serialize};

use crate::subarch::SubArch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum Mnemonic {
    /// Reserved or illegal-for-target encoding.
    Invalid,
    /// Encoding documented as undefined.
    Undefined,

    // Baseline V850.
    Add,
    Addi,
    And,
    Andi,
    B,
    Cmp,
    Di,
    Divh,
    Ei,
    Halt,
    Jarl,
    Jmp,
    Jr,
    LdB,
    LdH,
    LdW,
    Ldsr,
    Mov,
    Movea,
    Movhi,
    Mulh,
    Mulhi,
    Nop,
    Not,
    Or,
    Ori,
    Reti,
    Sar,
    Satadd,
    Satsub,
    Satsubi,
    Satsubr,
    Setf,
    Shl,
    Shr,
    SldB,
    SldH,
    SldW,
    SstB,
    SstH,
    SstW,
    StB,
    StH,
    StW,
    Stsr,
    Sub,
    Subr,
    Trap,
    Tst,
    Xor,
    Xori,

    // V850E additions.
    Bsh,
    Bsw,
    Callt,
    Clr1,
    Cmov,
    Ctret,
    Dispose,
    Div,
    Divhu,
    Divu,
    Hsw,
    LdBu,
    LdHu,
    Not1,
    Mul,
    Mulu,
    Prepare,
    Sasf,
    Set1,
    SldBu,
    SldHu,
    Switch,
    Sxb,
    Sxh,
    Tst1,
    Zxb,
    Zxh,

    // V850ES debug pair, dropped again from E2 onward.
    Dbret,
    Dbtrap,

    // V850E2 additions.
    Adf,
    Hsh,
    Mac,
    Macu,
    Sbf,
    Sch0l,
    Sch0r,
    Sch1l,
    Sch1r,

    // V850E2S additions.
    Caxi,
    Divq,
    Divqu,
    Eiret,
    Feret,
    Fetrap,
    Rie,
    Synce,
    Syncm,
    Syncp,
    Syscall,

    // Floating-point space. Gated with the E2S tier even though the FPU
    // ships on E2M-class parts; see DESIGN.md.
    AbsfD,
    AbsfS,
    AddfD,
    AddfS,
    CeilfDl,
    CeilfDul,
    CeilfDuw,
    CeilfDw,
    CeilfSl,
    CeilfSul,
    CeilfSuw,
    CeilfSw,
    CmovfD,
    CmovfS,
    CmpfD,
    CmpfS,
    CvtfDl,
    CvtfDs,
    CvtfDul,
    CvtfDuw,
    CvtfDw,
    CvtfLd,
    CvtfLs,
    CvtfSd,
    CvtfSl,
    CvtfSul,
    CvtfSuw,
    CvtfSw,
    CvtfUld,
    CvtfUls,
    CvtfUwd,
    CvtfUws,
    CvtfWd,
    CvtfWs,
    DivfD,
    DivfS,
    FloorfDl,
    FloorfDul,
    FloorfDuw,
    FloorfDw,
    FloorfSl,
    FloorfSul,
    FloorfSuw,
    FloorfSw,
    MaddfS,
    MaxfD,
    MaxfS,
    MinfD,
    MinfS,
    MsubfS,
    MulfD,
    MulfS,
    NegfD,
    NegfS,
    NmaddfS,
    NmsubfS,
    RecipfD,
    RecipfS,
    RsqrtfD,
    RsqrtfS,
    SqrtfD,
    SqrtfS,
    SubfD,
    SubfS,
    Trfsr,
    TrncfDl,
    TrncfDul,
    TrncfDuw,
    TrncfDw,
    TrncfSl,
    TrncfSul,
    TrncfSuw,
    TrncfSw,

    // RH850 additions.
    FmafS,
    FmsfS,
    FnmafS,
    FnmsfS,
    CvtfHs,
    CvtfSh,
    Bins,
    Rotl,
    Loop,
    Cll,
    Pushsp,
    Popsp,
    Snooze,
    LdlW,
    StcW,
    Synci,
    Cache,
    Pref,
}

impl Mnemonic {
    /// Minimum generation on which this mnemonic exists, or `None` for the
    /// sentinels.
    pub fn required_subarch(self) -> Option<SubArch> {
        use Mnemonic::*;
        let v = self as u16;
        let within = |lo: Mnemonic, hi: Mnemonic| (lo as u16..=hi as u16).contains(&v);
        if within(Add, Xori) {
            Some(SubArch::V850)
        } else if within(Bsh, Zxh) {
            Some(SubArch::V850E)
        } else if matches!(self, Dbret | Dbtrap) {
            Some(SubArch::V850Es)
        } else if within(Adf, Sch1r) {
            Some(SubArch::V850E2)
        } else if within(Caxi, Syscall) || within(AbsfD, TrncfSw) {
            Some(SubArch::V850E2s)
        } else if within(FmafS, Pref) {
            Some(SubArch::Rh850)
        } else {
            None
        }
    }

    pub fn is_sentinel(self) -> bool {
        matches!(self, Mnemonic::Invalid | Mnemonic::Undefined)
    }
}
