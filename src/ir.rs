//! Architecture-neutral IR emitted by the lifter.
//!
//! The lifter appends [`IrOp`] statements to an [`IrBuilder`] sink owned by
//! the caller; expression trees are built from [`Expr`]. Control-flow labels
//! are opaque handles handed out by the builder, which also answers whether a
//! code address already has a label from earlier in the same pass.

use std::collections::HashMap;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::mnemonic::Mnemonic;
use crate::operand::Reg;

bitflags! {
    /// Condition flags of the program status word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct FlagSet: u8 {
        const Z = 1 << 0;
        const S = 1 << 1;
        const OV = 1 << 2;
        const CY = 1 << 3;
        const SAT = 1 << 4;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Flag {
    Z,
    S,
    Ov,
    Cy,
    Sat,
}

/// Flag-group effect an arithmetic/logic operation declares. Exactly one of
/// these is attached to every flag-setting expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlagWrite {
    /// Zero, sign, overflow.
    ZsOv,
    /// Zero, sign, overflow, carry.
    NoSat,
    /// All five, including saturation.
    All,
}

impl FlagWrite {
    pub fn flags(self) -> FlagSet {
        match self {
            FlagWrite::ZsOv => FlagSet::Z | FlagSet::S | FlagSet::OV,
            FlagWrite::NoSat => FlagSet::Z | FlagSet::S | FlagSet::OV | FlagSet::CY,
            FlagWrite::All => FlagSet::all(),
        }
    }
}

/// Generic comparison predicate over the current flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlagCond {
    Overflow,
    NoOverflow,
    Equal,
    NotEqual,
    Negative,
    Positive,
    UnsignedLt,
    UnsignedLe,
    UnsignedGt,
    UnsignedGe,
    SignedLt,
    SignedLe,
    SignedGt,
    SignedGe,
}

/// Status register identifier. Regular IDs are small; the banked generations
/// compose `selID << 8 | regID` into the same space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SysRegId(pub u32);

impl SysRegId {
    pub const EIPC: SysRegId = SysRegId(0);
    pub const EIPSW: SysRegId = SysRegId(1);
    pub const FEPC: SysRegId = SysRegId(2);
    pub const FEPSW: SysRegId = SysRegId(3);
    pub const ECR: SysRegId = SysRegId(4);
    pub const PSW: SysRegId = SysRegId(5);
    pub const CTPC: SysRegId = SysRegId(16);
    pub const CTPSW: SysRegId = SysRegId(17);
    pub const CTBP: SysRegId = SysRegId(20);
    pub const DIR: SysRegId = SysRegId(21);
    pub const EIWR: SysRegId = SysRegId(28);
    pub const FEWR: SysRegId = SysRegId(29);
    pub const DBWR: SysRegId = SysRegId(30);
    pub const BSEL: SysRegId = SysRegId(31);
}

/// Primitive operations with no generic IR equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intrinsic {
    Bsh,
    Bsw,
    Hsw,
    Sch0l,
    Sch0r,
    Sch1l,
    Sch1r,
    Caxi,
    LdlW,
    StcW,
    /// Indirect status-register write: value, raw ID, bank selector.
    Ldsr,
    /// Indirect status-register read: raw ID, bank selector.
    Stsr,
    CacheOp,
    Prefetch,
    Snooze,
    Cll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    And,
    Or,
    Xor,
    Mul,
    MulU,
    Div,
    DivU,
    Shl,
    /// Logical shift right.
    Shr,
    /// Arithmetic shift right.
    Sar,
    Rol,
    CmpEq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnOp {
    Not,
    Neg,
}

/// Expression tree. Sizes are in bytes of the produced value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expr {
    Const {
        size: u8,
        value: u64,
    },
    /// A materialized code address.
    ConstPtr(u32),
    Reg {
        size: u8,
        reg: Reg,
    },
    SysReg(SysRegId),
    Flag(Flag),
    FlagCond(FlagCond),
    Load {
        size: u8,
        addr: Box<Expr>,
    },
    /// Pop one stack slot.
    Pop {
        size: u8,
    },
    Binary {
        op: BinOp,
        size: u8,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        flags: Option<FlagWrite>,
    },
    Unary {
        op: UnOp,
        size: u8,
        value: Box<Expr>,
        flags: Option<FlagWrite>,
    },
    SignExtend {
        size: u8,
        value: Box<Expr>,
    },
    ZeroExtend {
        size: u8,
        value: Box<Expr>,
    },
    LowPart {
        size: u8,
        value: Box<Expr>,
    },
}

impl Expr {
    pub fn constant(size: u8, value: u64) -> Expr {
        Expr::Const { size, value }
    }

    pub fn reg(size: u8, reg: Reg) -> Expr {
        Expr::Reg { size, reg }
    }

    pub fn load(size: u8, addr: Expr) -> Expr {
        Expr::Load {
            size,
            addr: Box::new(addr),
        }
    }

    pub fn binary(op: BinOp, size: u8, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            size,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            flags: None,
        }
    }

    pub fn binary_flags(op: BinOp, size: u8, lhs: Expr, rhs: Expr, flags: FlagWrite) -> Expr {
        Expr::Binary {
            op,
            size,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            flags: Some(flags),
        }
    }

    pub fn unary(op: UnOp, size: u8, value: Expr) -> Expr {
        Expr::Unary {
            op,
            size,
            value: Box::new(value),
            flags: None,
        }
    }

    pub fn unary_flags(op: UnOp, size: u8, value: Expr, flags: FlagWrite) -> Expr {
        Expr::Unary {
            op,
            size,
            value: Box::new(value),
            flags: Some(flags),
        }
    }

    pub fn sign_extend(size: u8, value: Expr) -> Expr {
        Expr::SignExtend {
            size,
            value: Box::new(value),
        }
    }

    pub fn zero_extend(size: u8, value: Expr) -> Expr {
        Expr::ZeroExtend {
            size,
            value: Box::new(value),
        }
    }

    pub fn low_part(size: u8, value: Expr) -> Expr {
        Expr::LowPart {
            size,
            value: Box::new(value),
        }
    }
}

/// Opaque control-flow label handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Label(pub u32);

/// One IR statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IrOp {
    SetReg {
        size: u8,
        reg: Reg,
        value: Expr,
    },
    /// Write a double-width value across an even/odd pair; `hi` takes the
    /// upper half.
    SetRegPair {
        hi: Reg,
        lo: Reg,
        value: Expr,
    },
    SetSysReg {
        id: SysRegId,
        value: Expr,
    },
    SetFlag {
        flag: Flag,
        value: Expr,
    },
    Store {
        size: u8,
        addr: Expr,
        value: Expr,
    },
    Push {
        size: u8,
        value: Expr,
    },
    /// Evaluate for flag effects only.
    Eval(Expr),
    If {
        cond: Expr,
        then_label: Label,
        else_label: Label,
    },
    Goto(Label),
    Jump(Expr),
    Call(Expr),
    Ret(Expr),
    Trap(u8),
    Intrinsic {
        outputs: Vec<Reg>,
        intrinsic: Intrinsic,
        inputs: Vec<Expr>,
    },
    /// Semantics not modeled for this mnemonic.
    Unimplemented(Mnemonic),
}

/// Sink the lifter appends to, plus the label capability used for
/// control-flow linking. The surrounding analysis driver owns all state.
pub trait IrBuilder {
    fn emit(&mut self, op: IrOp);

    /// Label for `addr` if that address was already reached in this pass.
    fn label_for(&mut self, addr: u32) -> Option<Label>;

    fn new_label(&mut self) -> Label;

    fn mark_label(&mut self, label: Label);
}

/// In-memory builder: a linear op list with label bookkeeping. Serves as the
/// default sink and as the test harness.
#[derive(Debug, Default)]
pub struct IrFunction {
    ops: Vec<IrOp>,
    address_labels: HashMap<u32, Label>,
    marks: HashMap<Label, usize>,
    next_label: u32,
}

impl IrFunction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[IrOp] {
        &self.ops
    }

    /// Registers `addr` as already decoded, so branches to it resolve to a
    /// label instead of a materialized jump.
    pub fn add_address_label(&mut self, addr: u32) -> Label {
        if let Some(&l) = self.address_labels.get(&addr) {
            return l;
        }
        let l = self.alloc();
        self.address_labels.insert(addr, l);
        l
    }

    pub fn mark_of(&self, label: Label) -> Option<usize> {
        self.marks.get(&label).copied()
    }

    fn alloc(&mut self) -> Label {
        let l = Label(self.next_label);
        self.next_label += 1;
        l
    }
}

impl IrBuilder for IrFunction {
    fn emit(&mut self, op: IrOp) {
        self.ops.push(op);
    }

    fn label_for(&mut self, addr: u32) -> Option<Label> {
        self.address_labels.get(&addr).copied()
    }

    fn new_label(&mut self) -> Label {
        self.alloc()
    }

    fn mark_label(&mut self, label: Label) {
        let at = self.ops.len();
        self.marks.insert(label, at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_groups_expand_to_the_declared_sets() {
        assert_eq!(FlagWrite::ZsOv.flags(), FlagSet::Z | FlagSet::S | FlagSet::OV);
        assert!(FlagWrite::NoSat.flags().contains(FlagSet::CY));
        assert!(!FlagWrite::NoSat.flags().contains(FlagSet::SAT));
        assert_eq!(FlagWrite::All.flags(), FlagSet::all());
    }

    #[test]
    fn ir_function_reuses_address_labels() {
        let mut f = IrFunction::new();
        let a = f.add_address_label(0x100);
        let b = f.add_address_label(0x100);
        assert_eq!(a, b);
        assert_eq!(f.label_for(0x100), Some(a));
        assert_eq!(f.label_for(0x102), None);
        assert_ne!(f.new_label(), a);
    }
}
