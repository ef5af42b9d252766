//! Semantic lifter: decoded instructions to IR statements.
//!
//! One base mnemonic-to-handler table carries the oldest generation; each
//! later generation contributes an override map merged in at construction.
//! Handlers are plain functions, so the per-generation behavior is auditable
//! as data instead of being buried in a type hierarchy.
//!
//! Register zero is hardwired: reads fold to constant zero, and writes keep
//! the value as a bare evaluation so flag effects survive while the result is
//! discarded.

use std::collections::HashMap;

use tracing::debug;

use crate::decode::Instruction;
use crate::ir::{
    BinOp, Expr, Flag, FlagCond, FlagWrite, Intrinsic, IrBuilder, IrOp, SysRegId, UnOp,
};
use crate::mnemonic::Mnemonic;
use crate::operand::{Cond, Disp, Imm, Operand, Reg};
use crate::subarch::SubArch;

/// One instruction in flight: the decoded record plus its address.
pub struct Ctx<'a> {
    pub mnemonic: Mnemonic,
    pub operands: &'a [Operand],
    pub length: u8,
    pub addr: u32,
}

impl Ctx<'_> {
    fn next_pc(&self) -> u32 {
        self.addr.wrapping_add(self.length as u32 * 2)
    }
}

type Handler = fn(&Lifter, &Ctx<'_>, &mut dyn IrBuilder);

pub struct Lifter {
    subarch: SubArch,
    handlers: HashMap<Mnemonic, Handler>,
}

impl Lifter {
    pub fn new(subarch: SubArch) -> Self {
        let mut handlers: HashMap<Mnemonic, Handler> = base_handlers().into_iter().collect();
        if subarch >= SubArch::V850Es {
            handlers.extend(es_overrides());
        }
        if subarch >= SubArch::V850E2 {
            handlers.extend(e2_overrides());
        }
        Lifter { subarch, handlers }
    }

    pub fn subarch(&self) -> SubArch {
        self.subarch
    }

    /// Lifts one instruction into `il` and returns the bytes consumed.
    /// Mnemonics without a semantic model emit [`IrOp::Unimplemented`].
    pub fn lift(&self, inst: &Instruction, addr: u32, il: &mut dyn IrBuilder) -> u8 {
        let ctx = Ctx {
            mnemonic: inst.mnemonic,
            operands: &inst.operands,
            length: inst.length,
            addr,
        };
        match self.handlers.get(&inst.mnemonic) {
            Some(handler) => handler(self, &ctx, il),
            None => {
                debug!(mnemonic = ?inst.mnemonic, addr, "no semantic model");
                il.emit(IrOp::Unimplemented(inst.mnemonic));
            }
        }
        inst.length * 2
    }

    /// Status-register write. The directly addressable set grows with the
    /// generation; everything outside it becomes an intrinsic carrying the
    /// raw ID (plus the bank selector where the generation has banks).
    fn sysreg_write(&self, il: &mut dyn IrBuilder, value: Expr, id: u8, sel: Option<u8>) {
        if self.subarch >= SubArch::Rh850 {
            let sel = sel.unwrap_or(0);
            if sel == 0 && id <= 5 {
                il.emit(IrOp::SetSysReg {
                    id: SysRegId(id as u32),
                    value,
                });
            } else {
                il.emit(IrOp::Intrinsic {
                    outputs: Vec::new(),
                    intrinsic: Intrinsic::Ldsr,
                    inputs: vec![
                        value,
                        Expr::constant(1, id as u64),
                        Expr::constant(1, sel as u64),
                    ],
                });
            }
        } else if self.subarch >= SubArch::V850E2 {
            if (28..=31).contains(&id) {
                il.emit(IrOp::SetSysReg {
                    id: SysRegId(id as u32),
                    value,
                });
            } else {
                il.emit(IrOp::Intrinsic {
                    outputs: Vec::new(),
                    intrinsic: Intrinsic::Ldsr,
                    inputs: vec![
                        value,
                        Expr::constant(1, id as u64),
                        Expr::SysReg(SysRegId::BSEL),
                    ],
                });
            }
        } else if self.writable_sysreg(id) {
            il.emit(IrOp::SetSysReg {
                id: SysRegId(id as u32),
                value,
            });
        } else {
            il.emit(IrOp::Intrinsic {
                outputs: Vec::new(),
                intrinsic: Intrinsic::Ldsr,
                inputs: vec![value, Expr::constant(1, id as u64)],
            });
        }
    }

    /// Status-register read into a general register operand.
    fn sysreg_read(&self, il: &mut dyn IrBuilder, id: u8, dst: &Operand, sel: Option<u8>) {
        if self.subarch >= SubArch::Rh850 {
            let sel = sel.unwrap_or(0);
            if sel == 0 && id <= 5 {
                write(dst, il, Expr::SysReg(SysRegId(id as u32)), 4);
            } else {
                il.emit(IrOp::Intrinsic {
                    outputs: vec![as_reg(dst)],
                    intrinsic: Intrinsic::Stsr,
                    inputs: vec![Expr::constant(1, id as u64), Expr::constant(1, sel as u64)],
                });
            }
        } else if self.subarch >= SubArch::V850E2 {
            if (28..=31).contains(&id) {
                write(dst, il, Expr::SysReg(SysRegId(id as u32)), 4);
            } else {
                il.emit(IrOp::Intrinsic {
                    outputs: vec![as_reg(dst)],
                    intrinsic: Intrinsic::Stsr,
                    inputs: vec![Expr::constant(1, id as u64), Expr::SysReg(SysRegId::BSEL)],
                });
            }
        } else if self.readable_sysreg(id) {
            write(dst, il, Expr::SysReg(SysRegId(id as u32)), 4);
        } else {
            il.emit(IrOp::Intrinsic {
                outputs: vec![as_reg(dst)],
                intrinsic: Intrinsic::Stsr,
                inputs: vec![Expr::constant(1, id as u64)],
            });
        }
    }

    fn readable_sysreg(&self, id: u8) -> bool {
        match id {
            0..=5 => true,
            11..=21 => self.subarch >= SubArch::V850Es,
            _ => false,
        }
    }

    /// ECR is read-only everywhere; DIR joins it once it exists.
    fn writable_sysreg(&self, id: u8) -> bool {
        self.readable_sysreg(id) && id != 4 && id != 21
    }
}

// Operand plumbing.

fn as_reg(op: &Operand) -> Reg {
    match op {
        Operand::Reg(r) => *r,
        other => panic!("register operand expected, got {other:?}"),
    }
}

fn as_imm(op: &Operand) -> Imm {
    match op {
        Operand::Imm(i) => *i,
        other => panic!("immediate operand expected, got {other:?}"),
    }
}

fn as_cond(op: &Operand) -> Cond {
    match op {
        Operand::Cond(c) => *c,
        other => panic!("condition operand expected, got {other:?}"),
    }
}

fn const_sized(size: u8, v: i64) -> Expr {
    let mask = if size >= 8 {
        u64::MAX
    } else {
        (1u64 << (size as u32 * 8)) - 1
    };
    Expr::constant(size, (v as u64) & mask)
}

fn addr_of(d: &Disp) -> Expr {
    if d.base.is_zero() {
        return const_sized(4, d.offset.value());
    }
    if d.offset.raw() == 0 {
        return Expr::reg(4, d.base);
    }
    Expr::binary(
        BinOp::Add,
        4,
        Expr::reg(4, d.base),
        const_sized(4, d.offset.value()),
    )
}

fn value_of(op: &Operand, size: u8) -> Expr {
    match op {
        Operand::Reg(r) => {
            if r.is_zero() {
                Expr::constant(size, 0)
            } else if size < 4 {
                Expr::low_part(size, Expr::reg(4, *r))
            } else {
                Expr::reg(size, *r)
            }
        }
        Operand::Imm(i) => const_sized(size, i.value()),
        Operand::Disp(d) => Expr::load(size, addr_of(d)),
        Operand::BitMem { mem, .. } => Expr::load(size, addr_of(mem)),
        other => panic!("operand {other:?} has no value"),
    }
}

fn write(op: &Operand, il: &mut dyn IrBuilder, value: Expr, size: u8) {
    match op {
        Operand::Reg(r) => {
            if r.is_zero() {
                il.emit(IrOp::Eval(value));
            } else {
                il.emit(IrOp::SetReg {
                    size,
                    reg: *r,
                    value,
                });
            }
        }
        Operand::RegPair(p) => il.emit(IrOp::SetRegPair {
            hi: p.hi,
            lo: p.lo,
            value,
        }),
        Operand::Disp(d) => il.emit(IrOp::Store {
            size,
            addr: addr_of(d),
            value,
        }),
        Operand::BitMem { mem, .. } => il.emit(IrOp::Store {
            size,
            addr: addr_of(mem),
            value,
        }),
        other => panic!("operand {other:?} is not writable"),
    }
}

fn dest_of(op: &Operand, ctx: &Ctx<'_>) -> Expr {
    match op {
        Operand::RelJump(i) => Expr::ConstPtr(ctx.addr.wrapping_add(i.value() as u32)),
        Operand::RegJump(r) => {
            if r.is_zero() {
                Expr::constant(4, 0)
            } else {
                Expr::reg(4, *r)
            }
        }
        Operand::BasedJump(d) => {
            if d.base.is_zero() {
                const_sized(4, d.offset.value())
            } else {
                Expr::binary(
                    BinOp::Add,
                    4,
                    Expr::reg(4, d.base),
                    const_sized(4, d.offset.value()),
                )
            }
        }
        other => panic!("operand {other:?} is not a jump target"),
    }
}

fn cond_expr(c: Cond) -> Expr {
    match c {
        Cond::V => Expr::FlagCond(FlagCond::Overflow),
        Cond::L => Expr::FlagCond(FlagCond::UnsignedLt),
        Cond::Z => Expr::FlagCond(FlagCond::Equal),
        Cond::Nh => Expr::FlagCond(FlagCond::UnsignedLe),
        Cond::N => Expr::FlagCond(FlagCond::Negative),
        // "Always": the branch handler short-circuits it, everyone else gets
        // a true constant.
        Cond::R => Expr::constant(1, 1),
        Cond::Lt => Expr::FlagCond(FlagCond::SignedLt),
        Cond::Le => Expr::FlagCond(FlagCond::SignedLe),
        Cond::Nv => Expr::FlagCond(FlagCond::NoOverflow),
        Cond::Nl => Expr::FlagCond(FlagCond::UnsignedGe),
        Cond::Nz => Expr::FlagCond(FlagCond::NotEqual),
        Cond::H => Expr::FlagCond(FlagCond::UnsignedGt),
        Cond::P => Expr::FlagCond(FlagCond::Positive),
        Cond::Sa => Expr::Flag(Flag::Sat),
        Cond::Ge => Expr::FlagCond(FlagCond::SignedGe),
        Cond::Gt => Expr::FlagCond(FlagCond::SignedGt),
    }
}

fn if_then_else<T, E>(il: &mut dyn IrBuilder, cond: Expr, then_body: T, else_body: E)
where
    T: FnOnce(&mut dyn IrBuilder),
    E: FnOnce(&mut dyn IrBuilder),
{
    let t = il.new_label();
    let f = il.new_label();
    let done = il.new_label();
    il.emit(IrOp::If {
        cond,
        then_label: t,
        else_label: f,
    });
    il.mark_label(t);
    then_body(il);
    il.emit(IrOp::Goto(done));
    il.mark_label(f);
    else_body(il);
    il.emit(IrOp::Goto(done));
    il.mark_label(done);
}

// Handler tables.

fn base_handlers() -> Vec<(Mnemonic, Handler)> {
    use Mnemonic::*;
    vec![
        (Add, lift_add as Handler),
        (Addi, lift_add3),
        (And, lift_logic2_and),
        (Andi, lift_logic3_and),
        (B, lift_branch),
        (Clr1, lift_clr1),
        (Cmp, lift_cmp),
        (Dispose, lift_dispose),
        (Jarl, lift_jarl),
        (Jmp, lift_jmp),
        (Jr, lift_jr),
        (LdB, lift_load),
        (LdBu, lift_load),
        (LdH, lift_load),
        (LdHu, lift_load),
        (LdW, lift_load),
        (SldB, lift_load),
        (SldBu, lift_load),
        (SldH, lift_load),
        (SldHu, lift_load),
        (SldW, lift_load),
        (Ldsr, lift_ldsr),
        (Mov, lift_mov),
        (Movea, lift_movea),
        (Movhi, lift_movhi),
        (Mul, lift_mul),
        (Mulu, lift_mul),
        (Mulh, lift_mulh),
        (Mulhi, lift_mulhi),
        (Nop, lift_nop),
        (Not, lift_not),
        (Not1, lift_not1),
        (Or, lift_logic2_or),
        (Ori, lift_logic3_or),
        (Prepare, lift_prepare),
        (Sar, lift_shift_sar),
        (Satadd, lift_satadd),
        (Satsub, lift_satsub),
        (Satsubi, lift_satsubi),
        (Satsubr, lift_satsubr),
        (Set1, lift_set1),
        (Setf, lift_setf),
        (Shl, lift_shift_shl),
        (Shr, lift_shift_shr),
        (StB, lift_store),
        (StH, lift_store),
        (StW, lift_store),
        (SstB, lift_store),
        (SstH, lift_store),
        (SstW, lift_store),
        (Stsr, lift_stsr),
        (Sub, lift_sub),
        (Subr, lift_subr),
        (Switch, lift_switch),
        (Sxb, lift_sxb),
        (Sxh, lift_sxh),
        (Trap, lift_trap),
        (Tst, lift_tst),
        (Tst1, lift_tst1),
        (Xor, lift_logic2_xor),
        (Xori, lift_logic3_xor),
        (Zxb, lift_zxb),
        (Zxh, lift_zxh),
    ]
}

fn es_overrides() -> Vec<(Mnemonic, Handler)> {
    use Mnemonic::*;
    vec![
        (Bsh, lift_swap_bsh as Handler),
        (Bsw, lift_swap_bsw),
        (Callt, lift_callt),
        (Cmov, lift_cmov),
        (Ctret, lift_ctret),
        (Hsw, lift_swap_hsw),
    ]
}

fn e2_overrides() -> Vec<(Mnemonic, Handler)> {
    use Mnemonic::*;
    vec![
        (Hsw, lift_hsw_move as Handler),
        (Sch0l, lift_search_sch0l),
        (Sch0r, lift_search_sch0r),
        (Sch1l, lift_search_sch1l),
        (Sch1r, lift_search_sch1r),
    ]
}

// Arithmetic and logic.

fn binop2(ctx: &Ctx<'_>, il: &mut dyn IrBuilder, op: BinOp, flags: FlagWrite) {
    let (src, dst) = (&ctx.operands[0], &ctx.operands[1]);
    let val0 = value_of(src, 4);
    let val1 = value_of(dst, 4);
    write(dst, il, Expr::binary_flags(op, 4, val0, val1, flags), 4);
}

fn binop3(ctx: &Ctx<'_>, il: &mut dyn IrBuilder, op: BinOp, flags: FlagWrite) {
    let (src0, src1, dst) = (&ctx.operands[0], &ctx.operands[1], &ctx.operands[2]);
    let val0 = value_of(src0, 4);
    let val1 = value_of(src1, 4);
    write(dst, il, Expr::binary_flags(op, 4, val0, val1, flags), 4);
}

fn lift_add(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    binop2(ctx, il, BinOp::Add, FlagWrite::NoSat);
}

fn lift_add3(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    binop3(ctx, il, BinOp::Add, FlagWrite::NoSat);
}

fn lift_logic2_and(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    binop2(ctx, il, BinOp::And, FlagWrite::ZsOv);
}

fn lift_logic2_or(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    binop2(ctx, il, BinOp::Or, FlagWrite::ZsOv);
}

fn lift_logic2_xor(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    binop2(ctx, il, BinOp::Xor, FlagWrite::ZsOv);
}

fn lift_logic3_and(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    binop3(ctx, il, BinOp::And, FlagWrite::ZsOv);
}

fn lift_logic3_or(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    binop3(ctx, il, BinOp::Or, FlagWrite::ZsOv);
}

fn lift_logic3_xor(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    binop3(ctx, il, BinOp::Xor, FlagWrite::ZsOv);
}

fn lift_not(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    let (src, dst) = (&ctx.operands[0], &ctx.operands[1]);
    let val = value_of(src, 4);
    write(
        dst,
        il,
        Expr::unary_flags(UnOp::Not, 4, val, FlagWrite::ZsOv),
        4,
    );
}

fn lift_sub(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    let (src, dst) = (&ctx.operands[0], &ctx.operands[1]);
    let val0 = value_of(src, 4);
    let val1 = value_of(dst, 4);
    write(
        dst,
        il,
        Expr::binary_flags(BinOp::Sub, 4, val1, val0, FlagWrite::NoSat),
        4,
    );
}

fn lift_subr(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    let (src, dst) = (&ctx.operands[0], &ctx.operands[1]);
    let val0 = value_of(src, 4);
    let val1 = value_of(dst, 4);
    write(
        dst,
        il,
        Expr::binary_flags(BinOp::Sub, 4, val0, val1, FlagWrite::NoSat),
        4,
    );
}

fn lift_cmp(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    let (src, dst) = (&ctx.operands[0], &ctx.operands[1]);
    let val0 = value_of(src, 4);
    let val1 = value_of(dst, 4);
    il.emit(IrOp::Eval(Expr::binary_flags(
        BinOp::Sub,
        4,
        val1,
        val0,
        FlagWrite::NoSat,
    )));
}

fn lift_tst(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    let (src, dst) = (&ctx.operands[0], &ctx.operands[1]);
    let val0 = value_of(src, 4);
    let val1 = value_of(dst, 4);
    il.emit(IrOp::Eval(Expr::binary_flags(
        BinOp::And,
        4,
        val0,
        val1,
        FlagWrite::ZsOv,
    )));
}

// Saturating family: all five flags, two- and three-operand shapes.

fn saturating(ctx: &Ctx<'_>, il: &mut dyn IrBuilder, op: BinOp, reversed: bool) {
    let (lhs_op, rhs_op, dst) = if ctx.operands.len() == 3 {
        (&ctx.operands[1], &ctx.operands[0], &ctx.operands[2])
    } else {
        (&ctx.operands[1], &ctx.operands[0], &ctx.operands[1])
    };
    let (lhs, rhs) = if reversed {
        (value_of(rhs_op, 4), value_of(lhs_op, 4))
    } else {
        (value_of(lhs_op, 4), value_of(rhs_op, 4))
    };
    write(
        dst,
        il,
        Expr::binary_flags(op, 4, lhs, rhs, FlagWrite::All),
        4,
    );
}

fn lift_satadd(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    saturating(ctx, il, BinOp::Add, false);
}

fn lift_satsub(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    saturating(ctx, il, BinOp::Sub, false);
}

fn lift_satsubi(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    saturating(ctx, il, BinOp::Sub, false);
}

fn lift_satsubr(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    saturating(ctx, il, BinOp::Sub, true);
}

// Moves.

fn lift_mov(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    let (src, dst) = (&ctx.operands[0], &ctx.operands[1]);
    let val = value_of(src, 4);
    write(dst, il, val, 4);
}

fn lift_movea(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    let (imm, src, dst) = (&ctx.operands[0], &ctx.operands[1], &ctx.operands[2]);
    let val = value_of(src, 4);
    let add = Expr::binary(BinOp::Add, 4, val, const_sized(4, as_imm(imm).value()));
    write(dst, il, add, 4);
}

fn lift_movhi(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    let (imm, src, dst) = (&ctx.operands[0], &ctx.operands[1], &ctx.operands[2]);
    let val = value_of(src, 4);
    let add = Expr::binary(
        BinOp::Add,
        4,
        val,
        const_sized(4, as_imm(imm).value() << 16),
    );
    write(dst, il, add, 4);
}

// Multiplies.

fn lift_mul(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    let (src0, src1, dst) = (&ctx.operands[0], &ctx.operands[1], &ctx.operands[2]);
    let op = if ctx.mnemonic == Mnemonic::Mulu {
        BinOp::MulU
    } else {
        BinOp::Mul
    };
    let val0 = value_of(src0, 4);
    let val1 = value_of(src1, 4);
    // The product spreads across dst:src1 as a pair.
    il.emit(IrOp::SetRegPair {
        hi: as_reg(dst),
        lo: as_reg(src1),
        value: Expr::binary(op, 8, val0, val1),
    });
}

fn lift_mulh(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    let (src, dst) = (&ctx.operands[0], &ctx.operands[1]);
    let val0 = value_of(src, 2);
    let val1 = value_of(dst, 2);
    write(dst, il, Expr::binary(BinOp::Mul, 4, val0, val1), 4);
}

fn lift_mulhi(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    let (imm, src, dst) = (&ctx.operands[0], &ctx.operands[1], &ctx.operands[2]);
    let val0 = value_of(imm, 2);
    let val1 = value_of(src, 2);
    write(dst, il, Expr::binary(BinOp::Mul, 4, val0, val1), 4);
}

// Shifts: the amount comes first; a third operand makes the op non-destructive.

fn shift(ctx: &Ctx<'_>, il: &mut dyn IrBuilder, op: BinOp) {
    let (amount, src) = (&ctx.operands[0], &ctx.operands[1]);
    let dst = ctx.operands.get(2).unwrap_or(src);
    let mut count = value_of(amount, 4);
    if matches!(amount, Operand::Reg(_)) {
        count = Expr::binary(BinOp::And, 4, count, Expr::constant(4, 0x1f));
    }
    let val = value_of(src, 4);
    write(
        dst,
        il,
        Expr::binary_flags(op, 4, val, count, FlagWrite::NoSat),
        4,
    );
}

fn lift_shift_shl(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    shift(ctx, il, BinOp::Shl);
}

fn lift_shift_shr(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    shift(ctx, il, BinOp::Shr);
}

fn lift_shift_sar(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    shift(ctx, il, BinOp::Sar);
}

// Width changers.

fn lift_sxb(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    let dst = &ctx.operands[0];
    let val = value_of(dst, 1);
    write(dst, il, Expr::sign_extend(4, val), 4);
}

fn lift_sxh(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    let dst = &ctx.operands[0];
    let val = value_of(dst, 2);
    write(dst, il, Expr::sign_extend(4, val), 4);
}

fn lift_zxb(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    let dst = &ctx.operands[0];
    let val = value_of(dst, 1);
    write(dst, il, Expr::zero_extend(4, val), 4);
}

fn lift_zxh(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    let dst = &ctx.operands[0];
    let val = value_of(dst, 2);
    write(dst, il, Expr::zero_extend(4, val), 4);
}

// Loads and stores. Width and signedness ride on the mnemonic suffix.

fn access_width(m: Mnemonic) -> (u8, bool) {
    use Mnemonic::*;
    match m {
        LdB | SldB | StB | SstB => (1, true),
        LdBu | SldBu => (1, false),
        LdH | SldH | StH | SstH => (2, true),
        LdHu | SldHu => (2, false),
        _ => (4, true),
    }
}

fn lift_load(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    let (size, signed) = access_width(ctx.mnemonic);
    let (src, dst) = (&ctx.operands[0], &ctx.operands[1]);
    let mut val = value_of(src, size);
    if size < 4 {
        val = if signed {
            Expr::sign_extend(4, val)
        } else {
            Expr::zero_extend(4, val)
        };
    }
    write(dst, il, val, 4);
}

fn lift_store(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    let (size, _) = access_width(ctx.mnemonic);
    let (src, dst) = (&ctx.operands[0], &ctx.operands[1]);
    let val = value_of(src, size);
    write(dst, il, val, size);
}

// Control flow.

fn lift_branch(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    let cond = as_cond(&ctx.operands[0]);
    let disp = as_imm(&ctx.operands[1]);
    let dest = ctx.addr.wrapping_add(disp.value() as u32);
    let tgt = il.label_for(dest);
    let flt = il.label_for(ctx.next_pc());
    if cond == Cond::R {
        match tgt {
            Some(t) => il.emit(IrOp::Goto(t)),
            None => il.emit(IrOp::Jump(Expr::ConstPtr(dest))),
        }
        return;
    }
    let c = cond_expr(cond);
    let t = tgt.unwrap_or_else(|| il.new_label());
    let f = flt.unwrap_or_else(|| il.new_label());
    il.emit(IrOp::If {
        cond: c,
        then_label: t,
        else_label: f,
    });
    if tgt.is_none() {
        il.mark_label(t);
        il.emit(IrOp::Jump(Expr::ConstPtr(dest)));
    }
    if flt.is_none() {
        il.mark_label(f);
    }
}

fn lift_jarl(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    let (dst, link) = (&ctx.operands[0], &ctx.operands[1]);
    let dest = dest_of(dst, ctx);
    write(link, il, Expr::ConstPtr(ctx.next_pc()), 4);
    if as_reg(link) == Reg::LP {
        il.emit(IrOp::Call(dest));
    } else {
        il.emit(IrOp::Jump(dest));
    }
}

fn lift_jmp(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    let dst = &ctx.operands[0];
    let dest = dest_of(dst, ctx);
    if matches!(dst, Operand::RegJump(r) if *r == Reg::LP) {
        il.emit(IrOp::Ret(dest));
    } else {
        il.emit(IrOp::Jump(dest));
    }
}

fn lift_jr(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    let dest = dest_of(&ctx.operands[0], ctx);
    il.emit(IrOp::Jump(dest));
}

fn lift_switch(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    let index = as_reg(&ctx.operands[0]);
    let npc = Expr::constant(4, ctx.next_pc() as u64);
    let adr = Expr::binary(
        BinOp::Add,
        4,
        npc.clone(),
        Expr::binary(BinOp::Shl, 4, Expr::reg(4, index), Expr::constant(4, 1)),
    );
    let tbl = Expr::binary(
        BinOp::Shl,
        4,
        Expr::sign_extend(4, Expr::load(2, adr)),
        Expr::constant(4, 1),
    );
    il.emit(IrOp::Jump(Expr::binary(BinOp::Add, 4, npc, tbl)));
}

fn lift_trap(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    match ctx.operands[0] {
        Operand::VecJump(v) => il.emit(IrOp::Trap(v)),
        ref other => panic!("vector operand expected, got {other:?}"),
    }
}

// Stack frames.

fn lift_dispose(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    let imm = as_imm(&ctx.operands[0]);
    let list = match &ctx.operands[1] {
        Operand::RegList(l) => l,
        other => panic!("register list expected, got {other:?}"),
    };
    il.emit(IrOp::SetReg {
        size: 4,
        reg: Reg::SP,
        value: Expr::binary(
            BinOp::Add,
            4,
            Expr::reg(4, Reg::SP),
            const_sized(4, imm.value()),
        ),
    });
    for &r in list.regs().iter().rev() {
        il.emit(IrOp::SetReg {
            size: 4,
            reg: r,
            value: Expr::Pop { size: 4 },
        });
    }
    if let Some(ret) = ctx.operands.get(2) {
        let r = as_reg(ret);
        if r == Reg::LP {
            il.emit(IrOp::Ret(Expr::reg(4, r)));
        } else {
            il.emit(IrOp::Jump(Expr::reg(4, r)));
        }
    }
}

fn lift_prepare(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    let list = match &ctx.operands[0] {
        Operand::RegList(l) => l,
        other => panic!("register list expected, got {other:?}"),
    };
    let imm = as_imm(&ctx.operands[1]);
    for &r in list.regs() {
        il.emit(IrOp::Push {
            size: 4,
            value: Expr::reg(4, r),
        });
    }
    il.emit(IrOp::SetReg {
        size: 4,
        reg: Reg::SP,
        value: Expr::binary(
            BinOp::Sub,
            4,
            Expr::reg(4, Reg::SP),
            const_sized(4, imm.value()),
        ),
    });
    if let Some(ep) = ctx.operands.get(2) {
        il.emit(IrOp::SetReg {
            size: 4,
            reg: Reg::EP,
            value: value_of(ep, 4),
        });
    }
}

// Single-bit memory ops.

fn bit1op(
    ctx: &Ctx<'_>,
    il: &mut dyn IrBuilder,
    writeback: Option<fn(Expr, Expr) -> Expr>,
) {
    let dst = ctx.operands.last().unwrap_or_else(|| unreachable!());
    let b = value_of(dst, 1);
    let index = if ctx.operands.len() == 1 {
        match dst {
            Operand::BitMem { index, .. } => Expr::constant(1, *index as u64),
            other => panic!("bit-addressed operand expected, got {other:?}"),
        }
    } else {
        Expr::binary(BinOp::And, 1, value_of(&ctx.operands[0], 1), Expr::constant(1, 0x7))
    };
    let mask = Expr::binary(BinOp::Shl, 1, Expr::constant(1, 1), index);
    let z = Expr::binary(
        BinOp::CmpEq,
        1,
        Expr::binary(BinOp::And, 1, b.clone(), mask.clone()),
        Expr::constant(1, 0),
    );
    il.emit(IrOp::SetFlag {
        flag: Flag::Z,
        value: z,
    });
    if let Some(f) = writeback {
        let val = f(b, mask);
        write(dst, il, val, 1);
    }
}

fn lift_set1(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    bit1op(ctx, il, Some(|b, mask| Expr::binary(BinOp::Or, 1, b, mask)));
}

fn lift_clr1(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    bit1op(
        ctx,
        il,
        Some(|b, mask| Expr::binary(BinOp::And, 1, b, Expr::unary(UnOp::Not, 1, mask))),
    );
}

fn lift_not1(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    bit1op(ctx, il, Some(|b, mask| Expr::binary(BinOp::Xor, 1, b, mask)));
}

fn lift_tst1(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    bit1op(ctx, il, None);
}

// Flag consumers.

fn lift_setf(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    let cond = as_cond(&ctx.operands[0]);
    let dst = ctx.operands[1].clone();
    let c = cond_expr(cond);
    if_then_else(
        il,
        c,
        |il| write(&dst, il, Expr::constant(4, 1), 4),
        |il| write(&dst, il, Expr::constant(4, 0), 4),
    );
}

fn lift_cmov(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    let cond = as_cond(&ctx.operands[0]);
    let (src0, src1, dst) = (
        ctx.operands[1].clone(),
        ctx.operands[2].clone(),
        ctx.operands[3].clone(),
    );
    let c = cond_expr(cond);
    if_then_else(
        il,
        c,
        |il| write(&dst, il, value_of(&src0, 4), 4),
        |il| write(&dst, il, value_of(&src1, 4), 4),
    );
}

// Status registers.

fn lift_ldsr(l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    let value = value_of(&ctx.operands[0], 4);
    let id = match ctx.operands[1] {
        Operand::SysReg(id) => id,
        ref other => panic!("status register operand expected, got {other:?}"),
    };
    let sel = ctx.operands.get(2).map(|s| as_imm(s).raw() as u8);
    l.sysreg_write(il, value, id, sel);
}

fn lift_stsr(l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    let id = match ctx.operands[0] {
        Operand::SysReg(id) => id,
        ref other => panic!("status register operand expected, got {other:?}"),
    };
    let sel = ctx.operands.get(2).map(|s| as_imm(s).raw() as u8);
    l.sysreg_read(il, id, &ctx.operands[1], sel);
}

// V850ES additions.

fn swap_intrinsic(ctx: &Ctx<'_>, il: &mut dyn IrBuilder, intrinsic: Intrinsic) {
    let (src, dst) = (&ctx.operands[0], &ctx.operands[1]);
    let val = value_of(src, 4);
    il.emit(IrOp::Intrinsic {
        outputs: vec![as_reg(dst)],
        intrinsic,
        inputs: vec![val],
    });
}

fn lift_swap_bsh(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    swap_intrinsic(ctx, il, Intrinsic::Bsh);
}

fn lift_swap_bsw(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    swap_intrinsic(ctx, il, Intrinsic::Bsw);
}

fn lift_swap_hsw(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    swap_intrinsic(ctx, il, Intrinsic::Hsw);
}

fn lift_callt(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    let imm = as_imm(&ctx.operands[0]);
    il.emit(IrOp::SetSysReg {
        id: SysRegId::CTPC,
        value: Expr::ConstPtr(ctx.next_pc()),
    });
    il.emit(IrOp::SetSysReg {
        id: SysRegId::CTPSW,
        value: Expr::SysReg(SysRegId::PSW),
    });
    let entry = Expr::binary(
        BinOp::Add,
        4,
        Expr::SysReg(SysRegId::CTBP),
        Expr::constant(4, (imm.raw() << 1) & 0xffff_ffff),
    );
    il.emit(IrOp::Jump(Expr::binary(
        BinOp::Add,
        4,
        Expr::SysReg(SysRegId::CTBP),
        Expr::zero_extend(4, Expr::load(2, entry)),
    )));
}

fn lift_ctret(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    let _ = ctx;
    il.emit(IrOp::SetSysReg {
        id: SysRegId::PSW,
        value: Expr::SysReg(SysRegId::CTPSW),
    });
    il.emit(IrOp::Ret(Expr::SysReg(SysRegId::CTPC)));
}

// V850E2 additions and revisions.

fn lift_hsw_move(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    let (src, dst) = (&ctx.operands[0], &ctx.operands[1]);
    let val = value_of(src, 4);
    write(dst, il, val, 4);
}

fn search_intrinsic(ctx: &Ctx<'_>, il: &mut dyn IrBuilder, intrinsic: Intrinsic) {
    let (src, dst) = (&ctx.operands[0], &ctx.operands[1]);
    let val = value_of(src, 4);
    il.emit(IrOp::Intrinsic {
        outputs: vec![as_reg(dst)],
        intrinsic,
        inputs: vec![val],
    });
}

fn lift_search_sch0l(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    search_intrinsic(ctx, il, Intrinsic::Sch0l);
}

fn lift_search_sch0r(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    search_intrinsic(ctx, il, Intrinsic::Sch0r);
}

fn lift_search_sch1l(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    search_intrinsic(ctx, il, Intrinsic::Sch1l);
}

fn lift_search_sch1r(_l: &Lifter, ctx: &Ctx<'_>, il: &mut dyn IrBuilder) {
    search_intrinsic(ctx, il, Intrinsic::Sch1r);
}

fn lift_nop(_l: &Lifter, _ctx: &Ctx<'_>, _il: &mut dyn IrBuilder) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_always_is_a_constant() {
        assert_eq!(cond_expr(Cond::R), Expr::constant(1, 1));
        assert_eq!(cond_expr(Cond::Sa), Expr::Flag(Flag::Sat));
        assert_eq!(cond_expr(Cond::Nz), Expr::FlagCond(FlagCond::NotEqual));
    }

    #[test]
    fn sized_constants_are_masked() {
        assert_eq!(const_sized(2, -1), Expr::constant(2, 0xFFFF));
        assert_eq!(const_sized(4, -2), Expr::constant(4, 0xFFFF_FFFE));
    }

    #[test]
    fn r0_reads_fold_to_zero() {
        assert_eq!(value_of(&Operand::Reg(Reg::R0), 4), Expr::constant(4, 0));
        assert_eq!(
            value_of(&Operand::Reg(Reg::new(7)), 2),
            Expr::low_part(2, Expr::reg(4, Reg::new(7)))
        );
    }

    #[test]
    fn generation_tiers_pick_their_overrides() {
        // HSW swaps halves up to ES, and is a straight move from E2 on.
        let es = Lifter::new(SubArch::V850Es);
        let e2 = Lifter::new(SubArch::V850E2);
        assert!(es.handlers.get(&Mnemonic::Hsw).is_some());
        assert!(e2.handlers.get(&Mnemonic::Hsw).is_some());
        assert_ne!(
            es.handlers[&Mnemonic::Hsw] as usize,
            e2.handlers[&Mnemonic::Hsw] as usize
        );
        // Plain V850E has no CALLT model.
        let e = Lifter::new(SubArch::V850E);
        assert!(e.handlers.get(&Mnemonic::Callt).is_none());
    }
}
