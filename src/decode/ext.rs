//! Extended opcode grid: two-parcel encodings selected by bits 25:23 and
//! 22:21 of the raw word. Every instruction in this space is two parcels.

use super::{op_imm, op_reg, Instruction};
use crate::bits::{fmt11, fmt12, Word};
use crate::mnemonic::Mnemonic;
use crate::operand::{CacheOp, Cond, Disp, Operand, PrefetchOp, Reg, RegPair};
use crate::subarch::SubArch;

pub(super) fn decode(w: Word, subarch: SubArch) -> Instruction {
    match (w.ext_opcode_hi(), w.ext_opcode_lo()) {
        (0, 0) => setf(w),
        (0, 1) => sysreg_move(w, subarch, false),
        (0, 2) => sysreg_move(w, subarch, true),
        (0, 3) => Instruction::undefined(2),
        (1, c @ (0 | 1 | 2)) => shift(w, c),
        (1, _) => bitop_reg_or_caxi(w),
        (2, 0) => trap(w),
        (2, 1) => halt_snooze(w),
        (2, 2) => returns(w),
        (2, 3) => system(w),
        (3, _) => Instruction::undefined(2),
        (4, 0) => sasf(w),
        (4, 1) => mul_reg(w),
        (4, 2) | (4, 3) => mul_imm9(w),
        (5, 0) => divide(w, Mnemonic::Divh, Mnemonic::Divhu, 0),
        (5, 1) => Instruction::undefined(2),
        (5, 2) => divide(w, Mnemonic::Div, Mnemonic::Divu, 0),
        (5, 3) => divide(w, Mnemonic::Divq, Mnemonic::Divqu, 7),
        (6, 0) => cmov(w, op_imm(w.lo5(), 5, true)),
        (6, 1) => cmov(w, op_reg(w.reg1())),
        (6, 2) => byte_halfword_swap(w),
        (6, 3) => bit_search_or_link(w),
        (7, 0) => conditional_arith(w, Mnemonic::Satsub, Mnemonic::Sbf),
        (7, 1) => conditional_arith(w, Mnemonic::Satadd, Mnemonic::Adf),
        (7, 2) => mac(w, Mnemonic::Mac),
        _ => mac(w, Mnemonic::Macu),
    }
}

fn setf(w: Word) -> Instruction {
    if w.ext_hi5() == 0 && w.ext_lo5() == 0 {
        if !w.bit(4) {
            return Instruction::new(
                Mnemonic::Setf,
                vec![
                    Operand::Cond(Cond::from_bits(w.lo5() as u8)),
                    op_reg(w.reg2()),
                ],
                2,
            );
        }
        return Instruction::new(Mnemonic::Rie, Vec::new(), 2);
    }
    Instruction::invalid(2)
}

/// LDSR/STSR. The banked generations carry a selector in the upper field of
/// the second parcel; everything earlier requires it to be zero.
fn sysreg_move(w: Word, subarch: SubArch, store: bool) -> Instruction {
    if w.ext_lo5() != 0 {
        return Instruction::invalid(2);
    }
    let (m, mut ops) = if store {
        (
            Mnemonic::Stsr,
            vec![Operand::SysReg(w.lo5() as u8), op_reg(w.reg2())],
        )
    } else {
        (
            Mnemonic::Ldsr,
            vec![op_reg(w.reg1()), Operand::SysReg(w.hi5() as u8)],
        )
    };
    if w.ext_hi5() != 0 {
        if subarch < SubArch::Rh850 {
            return Instruction::invalid(2);
        }
        ops.push(op_imm(w.ext_hi5(), 5, false));
    }
    Instruction::new(m, ops, 2)
}

fn shift(w: Word, column: u64) -> Instruction {
    let m = match column {
        0 => Mnemonic::Shr,
        1 => Mnemonic::Sar,
        _ => Mnemonic::Shl,
    };
    if w.ext_hi5() == 0 && w.ext_lo5() == 0 {
        return Instruction::new(m, vec![op_reg(w.reg1()), op_reg(w.reg2())], 2);
    }
    if w.ext_lo5() == 0x2 {
        return Instruction::new(
            m,
            vec![
                op_reg(w.reg1()),
                op_reg(w.reg2()),
                op_reg(Reg::new(w.ext_hi5() as u8)),
            ],
            2,
        );
    }
    if column == 2 && (w.ext_lo5() == 0x4 || w.ext_lo5() == 0x6) {
        let count = if w.ext_lo5() == 0x4 {
            op_imm(w.lo5(), 5, false)
        } else {
            op_reg(w.reg1())
        };
        return Instruction::new(
            Mnemonic::Rotl,
            vec![count, op_reg(w.reg2()), op_reg(Reg::new(w.ext_hi5() as u8))],
            2,
        );
    }
    if w.bit(20) {
        return bins(w, column);
    }
    Instruction::invalid(2)
}

/// The three BINS variants cover bit positions 0..=31 between them; the
/// column supplies the +16 offsets.
fn bins(w: Word, column: u64) -> Instruction {
    let mut msb = (w.ext_hi5() >> 1) as u8;
    let mut lsb = ((w.bits(27, 27) << 3) | w.bits(19, 17)) as u8;
    if column == 0 {
        msb += 16;
        lsb += 16;
    } else if column == 1 {
        msb += 16;
    }
    let pos = lsb;
    let wid = msb - pos + 1;
    Instruction::new(
        Mnemonic::Bins,
        vec![
            op_reg(w.reg1()),
            op_imm(wid as u64, 5, false),
            op_imm(pos as u64, 5, false),
            op_reg(w.reg2()),
        ],
        2,
    )
}

fn bitop_reg_or_caxi(w: Word) -> Instruction {
    if w.ext_hi5() == 0 && w.bits(20, 19) == 0 {
        let m = match w.bits(18, 17) {
            0 => Mnemonic::Set1,
            1 => Mnemonic::Not1,
            2 => Mnemonic::Clr1,
            _ => Mnemonic::Tst1,
        };
        return Instruction::new(
            m,
            vec![op_reg(w.reg2()), Operand::Disp(Disp::reg_only(w.reg1()))],
            2,
        );
    }
    if w.ext_lo5() == 0xe {
        return Instruction::new(
            Mnemonic::Caxi,
            vec![
                Operand::Disp(Disp::reg_only(w.reg1())),
                op_reg(w.reg2()),
                op_reg(fmt11::reg3(w)),
            ],
            2,
        );
    }
    Instruction::invalid(2)
}

fn trap(w: Word) -> Instruction {
    if w.hi5() == 0 && w.ext_hi5() == 0 && w.ext_lo5() == 0 {
        return Instruction::new(Mnemonic::Trap, vec![Operand::VecJump(w.lo5() as u8)], 2);
    }
    Instruction::invalid(2)
}

fn halt_snooze(w: Word) -> Instruction {
    if w.lo5() == 0 && w.ext_hi5() == 0 && w.ext_lo5() == 0 {
        match w.hi5() {
            0 => return Instruction::new(Mnemonic::Halt, Vec::new(), 2),
            1 => return Instruction::new(Mnemonic::Snooze, Vec::new(), 2),
            _ => {}
        }
    }
    Instruction::invalid(2)
}

fn returns(w: Word) -> Instruction {
    if w.hi5() == 0 && w.lo5() == 0 && w.ext_hi5() == 0 {
        let sel = w.bits(18, 17) as usize;
        let m = match w.bits(20, 19) {
            0 => [
                Mnemonic::Reti,
                Mnemonic::Undefined,
                Mnemonic::Ctret,
                Mnemonic::Dbret,
            ][sel],
            1 => [
                Mnemonic::Eiret,
                Mnemonic::Feret,
                Mnemonic::Undefined,
                Mnemonic::Undefined,
            ][sel],
            _ => return Instruction::invalid(2),
        };
        if m == Mnemonic::Undefined {
            return Instruction::undefined(2);
        }
        return Instruction::new(m, Vec::new(), 2);
    }
    Instruction::invalid(2)
}

fn system(w: Word) -> Instruction {
    if w.lo5() == 0 && w.ext_hi5() == 0 && w.ext_lo5() == 0 {
        let m = match (w.bits(15, 14), w.bits(13, 11)) {
            (0, 0) => Mnemonic::Di,
            (2, 0) => Mnemonic::Ei,
            _ => return Instruction::undefined(2),
        };
        return Instruction::new(m, Vec::new(), 2);
    }
    if w.hi5() == 0x1a && w.bits(31, 30) == 0 && w.ext_lo5() == 0 {
        let vector8 = (w.bits(29, 27) << 5 | w.lo5()) as u8;
        return Instruction::new(Mnemonic::Syscall, vec![Operand::VecJump(vector8)], 2);
    }
    if w.hi5() == 0x1f && w.lo5() == 0x1f && w.ext_hi5() == 0x1e && w.ext_lo5() == 0 {
        return Instruction::new(Mnemonic::Cll, Vec::new(), 2);
    }
    if w.bits(15, 13) == 0x6 && w.ext_lo5() == 0 {
        let op = PrefetchOp::from_encoding(w.ext_hi5());
        if op.is_valid() {
            return Instruction::new(
                Mnemonic::Pref,
                vec![
                    Operand::PrefetchOp(op),
                    Operand::Disp(Disp::reg_only(w.reg1())),
                ],
                2,
            );
        }
        return Instruction::invalid(2);
    }
    if w.bits(15, 13) == 0x7 && w.ext_lo5() == 0 {
        // Unknown maintenance codes still decode; the operand carries the
        // invalid marker.
        let op = CacheOp::from_encoding(w.bits(12, 11) << 5 | w.ext_hi5());
        return Instruction::new(
            Mnemonic::Cache,
            vec![Operand::CacheOp(op), Operand::Disp(Disp::reg_only(w.reg1()))],
            2,
        );
    }
    if (w.hi5() == 0x8 || w.hi5() == 0xc) && w.ext_lo5() == 0 {
        let m = if w.hi5() == 0x8 {
            Mnemonic::Pushsp
        } else {
            Mnemonic::Popsp
        };
        return Instruction::new(
            m,
            vec![Operand::RegRange {
                lo: w.reg1(),
                hi: fmt11::reg3(w),
            }],
            2,
        );
    }
    Instruction::invalid(2)
}

fn sasf(w: Word) -> Instruction {
    if !w.bit(4) && w.ext_hi5() == 0 && w.ext_lo5() == 0 {
        return Instruction::new(
            Mnemonic::Sasf,
            vec![
                Operand::Cond(Cond::from_bits(w.lo5() as u8)),
                op_reg(w.reg2()),
            ],
            2,
        );
    }
    Instruction::invalid(2)
}

fn mul_reg(w: Word) -> Instruction {
    if w.ext_lo5() == 0 {
        return Instruction::new(
            Mnemonic::Mul,
            vec![op_reg(w.reg1()), op_reg(w.reg2()), op_reg(fmt11::reg3(w))],
            2,
        );
    }
    Instruction::invalid(2)
}

fn mul_imm9(w: Word) -> Instruction {
    let m = if w.bit(17) {
        Mnemonic::Mulu
    } else {
        Mnemonic::Mul
    };
    let imm9 = fmt12::imm10(w) & 0x1ff;
    Instruction::new(
        m,
        vec![
            op_imm(imm9, 9, false),
            op_reg(w.reg2()),
            op_reg(fmt11::reg3(w)),
        ],
        2,
    )
}

fn divide(w: Word, signed: Mnemonic, unsigned: Mnemonic, marker: u64) -> Instruction {
    if w.bits(20, 18) != marker {
        return Instruction::invalid(2);
    }
    let m = if w.bit(17) { unsigned } else { signed };
    Instruction::new(
        m,
        vec![op_reg(w.reg1()), op_reg(w.reg2()), op_reg(fmt11::reg3(w))],
        2,
    )
}

fn cmov(w: Word, source: Operand) -> Instruction {
    let cond = Cond::from_bits((w.ext_lo5() >> 1) as u8);
    Instruction::new(
        Mnemonic::Cmov,
        vec![
            Operand::Cond(cond),
            source,
            op_reg(w.reg2()),
            op_reg(fmt11::reg3(w)),
        ],
        2,
    )
}

fn byte_halfword_swap(w: Word) -> Instruction {
    if w.lo5() == 0 {
        let m = match w.bits(18, 17) {
            0 => Mnemonic::Bsw,
            1 => Mnemonic::Bsh,
            2 => Mnemonic::Hsw,
            _ => Mnemonic::Hsh,
        };
        return Instruction::new(m, vec![op_reg(w.reg2()), op_reg(fmt11::reg3(w))], 2);
    }
    Instruction::invalid(2)
}

fn bit_search_or_link(w: Word) -> Instruction {
    if w.lo5() == 0 && w.bits(20, 19) == 0 {
        let m = match w.bits(18, 17) {
            0 => Mnemonic::Sch0r,
            1 => Mnemonic::Sch1r,
            2 => Mnemonic::Sch0l,
            _ => Mnemonic::Sch1l,
        };
        return Instruction::new(
            m,
            vec![op_reg(w.reg2()), op_reg(Reg::new(w.ext_hi5() as u8))],
            2,
        );
    }
    if w.hi5() == 0 && w.ext_lo5() == 0x18 {
        return Instruction::new(
            Mnemonic::LdlW,
            vec![
                Operand::Disp(Disp::reg_only(w.reg1())),
                op_reg(Reg::new(w.ext_hi5() as u8)),
            ],
            2,
        );
    }
    if w.hi5() == 0 && w.ext_lo5() == 0x1a {
        return Instruction::new(
            Mnemonic::StcW,
            vec![
                op_reg(Reg::new(w.ext_hi5() as u8)),
                Operand::Disp(Disp::reg_only(w.reg1())),
            ],
            2,
        );
    }
    Instruction::invalid(2)
}

fn conditional_arith(w: Word, saturating: Mnemonic, conditional: Mnemonic) -> Instruction {
    let regs = [op_reg(w.reg1()), op_reg(w.reg2()), op_reg(fmt11::reg3(w))];
    // Condition code 0xd is the reserved slot reused by the saturating form.
    if w.ext_lo5() == 0x1a {
        return Instruction::new(saturating, regs.to_vec(), 2);
    }
    let cond = Cond::from_bits((w.ext_lo5() >> 1) as u8);
    let mut ops = vec![Operand::Cond(cond)];
    ops.extend(regs);
    Instruction::new(conditional, ops, 2)
}

fn mac(w: Word, m: Mnemonic) -> Instruction {
    if w.bit(27) {
        return Instruction::invalid(2);
    }
    let reg4 = Reg::new((w.ext_lo5() | w.bits(23, 23)) as u8);
    Instruction::new(
        m,
        vec![
            op_reg(w.reg1()),
            op_reg(w.reg2()),
            Operand::RegPair(RegPair::from_reg(fmt11::reg3(w))),
            Operand::RegPair(RegPair::from_reg(reg4)),
        ],
        2,
    )
}
