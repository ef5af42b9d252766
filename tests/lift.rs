use pretty_assertions::assert_eq;
use v850_rs::ir::{BinOp, Expr, Flag, FlagWrite, Intrinsic, IrFunction, IrOp, SysRegId};
use v850_rs::operand::Reg;
use v850_rs::{decode, Lifter, Mnemonic, SubArch};

fn enc(parcels: &[u16]) -> Vec<u8> {
    parcels.iter().flat_map(|p| p.to_le_bytes()).collect()
}

fn lift(parcels: &[u16], subarch: SubArch, addr: u32) -> Vec<IrOp> {
    let inst = decode(&enc(parcels), subarch).unwrap();
    let mut il = IrFunction::new();
    let consumed = Lifter::new(subarch).lift(&inst, addr, &mut il);
    assert_eq!(consumed as usize, inst.byte_len());
    il.ops().to_vec()
}

fn reg(i: u8) -> Expr {
    Expr::reg(4, Reg::new(i))
}

#[test]
fn add_writes_back_with_arithmetic_flags() {
    // add r1, r2
    let ops = lift(&[0x11C1], SubArch::V850, 0);
    assert_eq!(
        ops,
        vec![IrOp::SetReg {
            size: 4,
            reg: Reg::new(2),
            value: Expr::binary_flags(BinOp::Add, 4, reg(1), reg(2), FlagWrite::NoSat),
        }]
    );
}

#[test]
fn writes_to_r0_become_bare_evaluations() {
    // add r1, r0: the result is discarded but the flags still land.
    let ops = lift(&[0x01C1], SubArch::V850, 0);
    assert_eq!(
        ops,
        vec![IrOp::Eval(Expr::binary_flags(
            BinOp::Add,
            4,
            reg(1),
            Expr::constant(4, 0),
            FlagWrite::NoSat,
        ))]
    );
}

#[test]
fn saturating_forms_touch_all_five_flags() {
    // satadd r1, r2
    let ops = lift(&[0x10C1], SubArch::V850, 0);
    assert_eq!(
        ops,
        vec![IrOp::SetReg {
            size: 4,
            reg: Reg::new(2),
            value: Expr::binary_flags(BinOp::Add, 4, reg(2), reg(1), FlagWrite::All),
        }]
    );
}

#[test]
fn jarl_links_then_calls() {
    // jarl +0x100, lp at 0x1000
    let ops = lift(&[0xFF80, 0x0100], SubArch::V850, 0x1000);
    assert_eq!(
        ops,
        vec![
            IrOp::SetReg {
                size: 4,
                reg: Reg::LP,
                value: Expr::ConstPtr(0x1004),
            },
            IrOp::Call(Expr::ConstPtr(0x1100)),
        ]
    );
}

#[test]
fn switch_walks_the_halfword_table() {
    // switch r5 at 0x200: table base is the next pc.
    let ops = lift(&[0x0045], SubArch::V850E, 0x200);
    let npc = Expr::constant(4, 0x202);
    let entry = Expr::binary(
        BinOp::Add,
        4,
        npc.clone(),
        Expr::binary(BinOp::Shl, 4, reg(5), Expr::constant(4, 1)),
    );
    let offset = Expr::binary(
        BinOp::Shl,
        4,
        Expr::sign_extend(4, Expr::load(2, entry)),
        Expr::constant(4, 1),
    );
    assert_eq!(ops, vec![IrOp::Jump(Expr::binary(BinOp::Add, 4, npc, offset))]);
}

#[test]
fn conditional_branch_synthesizes_unseen_targets() {
    // bz +8 at 0x100, neither side decoded yet.
    let inst = decode(&enc(&[0x05C2]), SubArch::V850).unwrap();
    let mut il = IrFunction::new();
    Lifter::new(SubArch::V850).lift(&inst, 0x100, &mut il);
    let ops = il.ops();
    assert_eq!(ops.len(), 2);
    let (t, f) = match &ops[0] {
        IrOp::If {
            then_label,
            else_label,
            ..
        } => (*then_label, *else_label),
        other => panic!("expected a conditional, got {other:?}"),
    };
    assert_eq!(ops[1], IrOp::Jump(Expr::ConstPtr(0x108)));
    // Taken side is marked before the materialized jump, fallthrough after.
    assert_eq!(il.mark_of(t), Some(1));
    assert_eq!(il.mark_of(f), Some(2));
}

#[test]
fn unconditional_branch_uses_known_labels() {
    // br +8 at 0x100 with 0x108 already decoded.
    let inst = decode(&enc(&[0x05C5]), SubArch::V850).unwrap();
    let mut il = IrFunction::new();
    let target = il.add_address_label(0x108);
    Lifter::new(SubArch::V850).lift(&inst, 0x100, &mut il);
    assert_eq!(il.ops(), &[IrOp::Goto(target)]);
}

#[test]
fn dispose_pops_then_returns() {
    // dispose 4, {r31}, [r31]
    let ops = lift(&[0x0648, 0x003F], SubArch::V850E, 0);
    assert_eq!(
        ops,
        vec![
            IrOp::SetReg {
                size: 4,
                reg: Reg::SP,
                value: Expr::binary(BinOp::Add, 4, reg(3), Expr::constant(4, 4)),
            },
            IrOp::SetReg {
                size: 4,
                reg: Reg::LP,
                value: Expr::Pop { size: 4 },
            },
            IrOp::Ret(reg(31)),
        ]
    );
}

#[test]
fn prepare_pushes_and_seeds_ep() {
    // prepare {r31}, 2, sp
    let ops = lift(&[0x0784, 0x0021], SubArch::V850E, 0);
    assert_eq!(
        ops,
        vec![
            IrOp::Push {
                size: 4,
                value: reg(31),
            },
            IrOp::SetReg {
                size: 4,
                reg: Reg::SP,
                value: Expr::binary(BinOp::Sub, 4, reg(3), Expr::constant(4, 2)),
            },
            IrOp::SetReg {
                size: 4,
                reg: Reg::EP,
                value: reg(3),
            },
        ]
    );
}

#[test]
fn unsigned_load_zero_extends() {
    // ld.bu 5[r1], r2
    let ops = lift(&[0x17A1, 0x0005], SubArch::V850E, 0);
    assert_eq!(
        ops,
        vec![IrOp::SetReg {
            size: 4,
            reg: Reg::new(2),
            value: Expr::zero_extend(
                4,
                Expr::load(
                    1,
                    Expr::binary(BinOp::Add, 4, reg(1), Expr::constant(4, 5)),
                ),
            ),
        }]
    );
}

#[test]
fn setf_materializes_both_arms() {
    // setf z, r10
    let ops = lift(&[0x57E2, 0x0000], SubArch::V850, 0);
    assert_eq!(ops.len(), 5);
    assert!(matches!(ops[0], IrOp::If { .. }));
    assert_eq!(
        ops[1],
        IrOp::SetReg {
            size: 4,
            reg: Reg::new(10),
            value: Expr::constant(4, 1),
        }
    );
    assert!(matches!(ops[2], IrOp::Goto(_)));
    assert_eq!(
        ops[3],
        IrOp::SetReg {
            size: 4,
            reg: Reg::new(10),
            value: Expr::constant(4, 0),
        }
    );
}

#[test]
fn bit_set_updates_the_zero_flag_then_stores() {
    // set1 #3, 4[r6]
    let ops = lift(&[0x1FC6, 0x0004], SubArch::V850, 0);
    assert_eq!(ops.len(), 2);
    assert!(matches!(
        &ops[0],
        IrOp::SetFlag {
            flag: Flag::Z,
            ..
        }
    ));
    assert!(matches!(&ops[1], IrOp::Store { size: 1, .. }));
}

#[test]
fn wide_multiply_spreads_across_a_pair() {
    // mul r1, r2, r3
    let ops = lift(&[0x17E1, 0x1A20], SubArch::V850E, 0);
    assert_eq!(
        ops,
        vec![IrOp::SetRegPair {
            hi: Reg::new(3),
            lo: Reg::new(2),
            value: Expr::binary(BinOp::Mul, 8, reg(1), reg(2)),
        }]
    );
}

#[test]
fn callt_saves_state_then_jumps_through_the_table() {
    let ops = lift(&[0x0205], SubArch::V850Es, 0x40);
    assert_eq!(
        ops[0],
        IrOp::SetSysReg {
            id: SysRegId::CTPC,
            value: Expr::ConstPtr(0x42),
        }
    );
    assert_eq!(
        ops[1],
        IrOp::SetSysReg {
            id: SysRegId::CTPSW,
            value: Expr::SysReg(SysRegId::PSW),
        }
    );
    assert!(matches!(&ops[2], IrOp::Jump(_)));
    assert_eq!(ops.len(), 3);
}

#[test]
fn sysreg_access_follows_the_generation() {
    // stsr psw, r13: direct on the oldest tier.
    let stsr = [0x6FE5, 0x0040];
    let ops = lift(&stsr, SubArch::V850, 0);
    assert_eq!(
        ops,
        vec![IrOp::SetReg {
            size: 4,
            reg: Reg::new(13),
            value: Expr::SysReg(SysRegId::PSW),
        }]
    );

    // The banked generations go through the selector intrinsic instead.
    let ops = lift(&stsr, SubArch::V850E2m, 0);
    assert_eq!(
        ops,
        vec![IrOp::Intrinsic {
            outputs: vec![Reg::new(13)],
            intrinsic: Intrinsic::Stsr,
            inputs: vec![Expr::constant(1, 5), Expr::SysReg(SysRegId::BSEL)],
        }]
    );

    let ops = lift(&stsr, SubArch::Rh850, 0);
    assert!(matches!(&ops[0], IrOp::SetReg { .. }));

    // ldsr to the read-only cause register is indirect everywhere.
    let ops = lift(&[0x27ED, 0x0020], SubArch::V850, 0);
    assert_eq!(
        ops,
        vec![IrOp::Intrinsic {
            outputs: vec![],
            intrinsic: Intrinsic::Ldsr,
            inputs: vec![reg(13), Expr::constant(1, 4)],
        }]
    );
}

#[test]
fn banked_sysreg_selector_reaches_the_intrinsic() {
    // ldsr r13, sr5, 2
    let ops = lift(&[0x2FED, 0x1020], SubArch::Rh850, 0);
    assert_eq!(
        ops,
        vec![IrOp::Intrinsic {
            outputs: vec![],
            intrinsic: Intrinsic::Ldsr,
            inputs: vec![reg(13), Expr::constant(1, 5), Expr::constant(1, 2)],
        }]
    );
}

#[test]
fn swap_handlers_depend_on_the_tier() {
    // hsw r2, r3 swaps halves up to ES and is a plain move from E2 on.
    let hsw = [0x17E0, 0x1B44];
    let ops = lift(&hsw, SubArch::V850Es, 0);
    assert_eq!(
        ops,
        vec![IrOp::Intrinsic {
            outputs: vec![Reg::new(3)],
            intrinsic: Intrinsic::Hsw,
            inputs: vec![reg(2)],
        }]
    );

    let ops = lift(&hsw, SubArch::V850E2m, 0);
    assert_eq!(
        ops,
        vec![IrOp::SetReg {
            size: 4,
            reg: Reg::new(3),
            value: reg(2),
        }]
    );
}

#[test]
fn mnemonics_without_a_model_surface_as_unimplemented() {
    // halt decodes everywhere but has no semantic model.
    let ops = lift(&[0x07E0, 0x0120], SubArch::V850E2m, 0);
    assert_eq!(ops, vec![IrOp::Unimplemented(Mnemonic::Halt)]);

    // cmov exists on V850E, but its model arrives with the ES tier.
    let cmov = [0x17E1, 0x1B34];
    let ops = lift(&cmov, SubArch::V850E, 0);
    assert_eq!(ops, vec![IrOp::Unimplemented(Mnemonic::Cmov)]);
    let ops = lift(&cmov, SubArch::V850E2m, 0);
    assert!(matches!(&ops[0], IrOp::If { .. }));
}

#[test]
fn lifting_is_deterministic() {
    let a = lift(&[0x11C1], SubArch::V850E2m, 0x80);
    let b = lift(&[0x11C1], SubArch::V850E2m, 0x80);
    assert_eq!(a, b);
}
