//! Floating-point sub-space: bit 26 set inside the extended region. The
//! category field (bits 25:23) picks the family, the type field (22:21) the
//! shape, and the single/double split rides on bit 20 with the three
//! even-register guard bits 11, 0 and 27. All encodings are two parcels.

use super::{op_imm, op_reg, Instruction};
use crate::bits::{fmtf, Word};
use crate::mnemonic::Mnemonic;
use crate::operand::{FpCond, Operand, Reg, RegPair};

pub(super) fn decode(w: Word) -> Instruction {
    match fmtf::category(w) {
        0 => match fmtf::fp_type(w) {
            0 => conditional_move(w),
            1 => compare(w),
            2 => unary_convert(w),
            _ => arithmetic(w),
        },
        1 => fused_multiply(w),
        2 | 3 => multiply_accumulate(w),
        _ => Instruction::undefined(2),
    }
}

fn pair(r: Reg) -> Operand {
    Operand::RegPair(RegPair::from_reg(r))
}

fn conditional_move(w: Word) -> Instruction {
    let fcbit = w.bits(19, 17);
    let reg3 = fmtf::reg3(w);
    if !reg3.is_zero() {
        if !w.bit(20) {
            return Instruction::new(
                Mnemonic::CmovfS,
                vec![
                    op_imm(fcbit, 3, false),
                    op_reg(fmtf::reg1(w)),
                    op_reg(fmtf::reg2(w)),
                    op_reg(reg3),
                ],
                2,
            );
        }
        if !w.bit(11) && !w.bit(0) && !w.bit(27) {
            return Instruction::new(
                Mnemonic::CmovfD,
                vec![
                    op_imm(fcbit, 3, false),
                    pair(fmtf::reg1(w)),
                    pair(fmtf::reg2(w)),
                    pair(reg3),
                ],
                2,
            );
        }
        return Instruction::invalid(2);
    }
    if w.hi5() == 0 && w.lo5() == 0 && !w.bit(20) {
        return Instruction::new(Mnemonic::Trfsr, vec![op_imm(fcbit, 3, false)], 2);
    }
    Instruction::invalid(2)
}

fn compare(w: Word) -> Instruction {
    let fcbit = w.bits(19, 17);
    let cond = Operand::FpCond(FpCond::from_bits(w.bits(30, 27) as u8));
    if !w.bit(31) && !w.bit(20) {
        let mut ops = vec![cond, op_reg(fmtf::reg2(w)), op_reg(fmtf::reg1(w))];
        if fcbit != 0 {
            ops.push(op_imm(fcbit, 3, false));
        }
        return Instruction::new(Mnemonic::CmpfS, ops, 2);
    }
    if !w.bit(31) && !w.bit(11) && !w.bit(0) {
        let mut ops = vec![cond, pair(fmtf::reg1(w)), pair(fmtf::reg2(w))];
        if fcbit != 0 {
            ops.push(op_imm(fcbit, 3, false));
        }
        return Instruction::new(Mnemonic::CmpfD, ops, 2);
    }
    Instruction::invalid(2)
}

/// Leaf entry: mnemonic plus whether bits 11 and 27 must be clear (the
/// even-register constraints of the double-precision side).
type Leaf = (Mnemonic, bool, bool);

fn leaf_ok(w: Word, leaf: Leaf) -> Option<Mnemonic> {
    let (m, req11, req27) = leaf;
    if (!req11 || !w.bit(11)) && (!req27 || !w.bit(27)) {
        Some(m)
    } else {
        None
    }
}

/// The round-and-convert families share one 8-way layout selected by
/// bit 4, bit 20 and bit 18.
fn eight_way(w: Word, table: [Leaf; 8]) -> Option<Mnemonic> {
    let sel = (w.bits(4, 4) << 2 | w.bits(20, 20) << 1 | w.bits(18, 18)) as usize;
    leaf_ok(w, table[sel])
}

fn single_double(w: Word, single: Mnemonic, double: Mnemonic) -> Option<Mnemonic> {
    let leaf: Leaf = if w.bit(20) {
        (double, true, true)
    } else {
        (single, false, false)
    };
    if !w.bit(4) {
        leaf_ok(w, leaf)
    } else {
        None
    }
}

fn unary_convert(w: Word) -> Instruction {
    use Mnemonic::*;
    let m = match w.bits(3, 0) {
        0 => unary_convert_0(w),
        1 => unary_convert_1(w),
        2 => unary_convert_2(w),
        3 => unary_convert_3(w),
        4 => eight_way(
            w,
            [
                (CvtfSw, true, true),
                (CvtfSl, true, false),
                (CvtfDw, false, true),
                (CvtfDl, false, false),
                (CvtfSuw, true, true),
                (CvtfSul, true, false),
                (CvtfDuw, false, true),
                (CvtfDul, false, false),
            ],
        )
        .filter(|_| matches!(w.bits(19, 17), 0 | 2)),
        _ => None,
    };
    match m {
        Some(m) => Instruction::new(m, vec![op_reg(fmtf::reg2(w)), op_reg(fmtf::reg3(w))], 2),
        None => Instruction::invalid(2),
    }
}

fn unary_convert_0(w: Word) -> Option<Mnemonic> {
    use Mnemonic::*;
    match w.bits(19, 17) {
        1 => {
            let m = match (w.bit(20), w.bit(4)) {
                (false, false) => CvtfWs,
                (false, true) => CvtfUws,
                (true, false) => CvtfWd,
                (true, true) => CvtfUwd,
            };
            if m != CvtfWd || !w.bit(27) {
                Some(m)
            } else {
                None
            }
        }
        4 => single_double(w, AbsfS, AbsfD),
        7 => single_double(w, SqrtfS, SqrtfD),
        _ => None,
    }
}

fn unary_convert_1(w: Word) -> Option<Mnemonic> {
    use Mnemonic::*;
    match w.bits(19, 17) {
        0 | 2 => eight_way(
            w,
            [
                (TrncfSw, true, true),
                (TrncfSl, true, false),
                (TrncfDw, false, true),
                (TrncfDl, false, false),
                (TrncfSuw, true, true),
                (TrncfSul, true, false),
                (TrncfDuw, false, true),
                (TrncfDul, false, false),
            ],
        ),
        1 => {
            let sel = (w.bits(4, 4) << 1 | w.bits(20, 20)) as usize;
            let table: [Leaf; 4] = [
                (CvtfLs, false, true),
                (CvtfLd, false, false),
                (CvtfUls, false, true),
                (CvtfUld, false, false),
            ];
            leaf_ok(w, table[sel])
        }
        4 => single_double(w, NegfS, NegfD),
        7 => single_double(w, RecipfS, RecipfD),
        _ => None,
    }
}

fn unary_convert_2(w: Word) -> Option<Mnemonic> {
    use Mnemonic::*;
    match w.bits(19, 17) {
        0 | 2 => eight_way(
            w,
            [
                (CeilfSw, true, true),
                (CeilfSl, true, false),
                (CeilfDw, false, true),
                (CeilfDl, false, false),
                (CeilfSuw, true, true),
                (CeilfSul, true, false),
                (CeilfDuw, false, true),
                (CeilfDul, false, false),
            ],
        ),
        1 => {
            if !w.bit(27) && !w.bit(4) && w.bit(20) {
                Some(CvtfSd)
            } else if !w.bit(4) && !w.bit(20) {
                Some(CvtfHs)
            } else {
                None
            }
        }
        7 => single_double(w, RsqrtfS, RsqrtfD),
        _ => None,
    }
}

fn unary_convert_3(w: Word) -> Option<Mnemonic> {
    use Mnemonic::*;
    match w.bits(19, 17) {
        0 | 2 => eight_way(
            w,
            [
                (FloorfSw, true, true),
                (FloorfSl, true, false),
                (FloorfDw, false, true),
                (FloorfDl, false, false),
                (FloorfSuw, true, true),
                (FloorfSul, true, false),
                (FloorfDuw, false, true),
                (FloorfDul, false, false),
            ],
        ),
        1 => {
            if !w.bit(11) && !w.bit(4) && w.bit(20) {
                Some(CvtfDs)
            } else if !w.bit(4) && !w.bit(20) {
                Some(CvtfSh)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn arithmetic(w: Word) -> Instruction {
    use Mnemonic::*;
    let families = [
        Some((AddfS, AddfD)),
        Some((SubfS, SubfD)),
        Some((MulfS, MulfD)),
        None,
        Some((MaxfS, MaxfD)),
        Some((MinfS, MinfD)),
        None,
        Some((DivfS, DivfD)),
    ];
    let Some((single, double)) = families[w.bits(19, 17) as usize] else {
        return Instruction::invalid(2);
    };
    let m = if w.bit(20) { double } else { single };
    if !w.bit(20) || (!w.bit(11) && !w.bit(27) && !w.bit(0)) {
        return Instruction::new(
            m,
            vec![
                op_reg(fmtf::reg1(w)),
                op_reg(fmtf::reg2(w)),
                op_reg(fmtf::reg3(w)),
            ],
            2,
        );
    }
    Instruction::invalid(2)
}

fn fused_multiply(w: Word) -> Instruction {
    if fmtf::fp_type(w) == 3 && w.bits(20, 19) == 0 {
        let m = match w.bits(18, 17) {
            0 => Mnemonic::FmafS,
            1 => Mnemonic::FmsfS,
            2 => Mnemonic::FnmafS,
            _ => Mnemonic::FnmsfS,
        };
        return Instruction::new(
            m,
            vec![
                op_reg(fmtf::reg1(w)),
                op_reg(fmtf::reg2(w)),
                op_reg(fmtf::reg3(w)),
            ],
            2,
        );
    }
    Instruction::invalid(2)
}

fn multiply_accumulate(w: Word) -> Instruction {
    let reg4 = Reg::new((w.ext_lo5() | w.bits(23, 23)) as u8);
    let m = match fmtf::fp_type(w) {
        0 => Mnemonic::MaddfS,
        1 => Mnemonic::MsubfS,
        2 => Mnemonic::NmaddfS,
        _ => Mnemonic::NmsubfS,
    };
    Instruction::new(
        m,
        vec![
            op_reg(fmtf::reg1(w)),
            op_reg(fmtf::reg2(w)),
            op_reg(fmtf::reg3(w)),
            op_reg(reg4),
        ],
        2,
    )
}
