use pretty_assertions::assert_eq;
use v850_rs::operand::{CacheOp, Cond, Disp, Imm, Operand, PrefetchOp, Reg, RegPair};
use v850_rs::{decode, Instruction, Mnemonic, SubArch};

fn enc(parcels: &[u16]) -> Vec<u8> {
    parcels.iter().flat_map(|p| p.to_le_bytes()).collect()
}

// Extended grid entry: row 0xF column 3, second-parcel bit 16 clear.
fn enc_ext(reg1: u16, reg2: u16, second: u16) -> Vec<u8> {
    enc(&[(reg2 << 11) | (0xF << 7) | (3 << 5) | reg1, second])
}

// Second parcel of the extended grid: reg3/ext 15..11, opcode 9..5, low field 4..0.
fn ext2(hi5: u16, op_hi: u16, op_lo: u16, lo5: u16) -> u16 {
    (hi5 << 11) | (op_hi << 7) | (op_lo << 5) | lo5
}

fn dec(bytes: &[u8]) -> Instruction {
    decode(bytes, SubArch::V850E2m).unwrap()
}

fn dec_rh(bytes: &[u8]) -> Instruction {
    decode(bytes, SubArch::Rh850).unwrap()
}

fn r(i: u8) -> Operand {
    Operand::Reg(Reg::new(i))
}

fn imm(bits: u64, width: u8, signed: bool) -> Operand {
    Operand::Imm(Imm::new(bits, width, signed))
}

fn reg_mem(base: u8) -> Operand {
    Operand::Disp(Disp::reg_only(Reg::new(base)))
}

#[test]
fn setf_and_rie_split_on_bit4() {
    let i = dec(&enc_ext(Cond::Z as u16, 10, ext2(0, 0, 0, 0)));
    assert_eq!((i.mnemonic, i.length), (Mnemonic::Setf, 2));
    assert_eq!(i.operands, vec![Operand::Cond(Cond::Z), r(10)]);

    // Bit 4 set in the condition field is the reserved-instruction trap.
    let i = dec(&enc_ext(0x10, 10, ext2(0, 0, 0, 0)));
    assert_eq!(i.mnemonic, Mnemonic::Rie);
    assert!(i.operands.is_empty());
}

#[test]
fn sysreg_moves() {
    let i = decode(&enc_ext(13, 5, ext2(0, 0, 1, 0)), SubArch::V850).unwrap();
    assert_eq!(i.mnemonic, Mnemonic::Ldsr);
    assert_eq!(i.operands, vec![r(13), Operand::SysReg(5)]);

    let i = decode(&enc_ext(5, 13, ext2(0, 0, 2, 0)), SubArch::V850).unwrap();
    assert_eq!(i.mnemonic, Mnemonic::Stsr);
    assert_eq!(i.operands, vec![Operand::SysReg(5), r(13)]);
}

#[test]
fn banked_sysreg_selector_is_rh850_only() {
    let bytes = enc_ext(13, 5, ext2(2, 0, 1, 0));
    let i = dec_rh(&bytes);
    assert_eq!(i.mnemonic, Mnemonic::Ldsr);
    assert_eq!(i.operands, vec![r(13), Operand::SysReg(5), imm(2, 5, false)]);

    let i = dec(&bytes);
    assert_eq!((i.mnemonic, i.length), (Mnemonic::Invalid, 2));
}

#[test]
fn extended_shifts() {
    let i = dec(&enc_ext(1, 2, ext2(0, 1, 2, 0)));
    assert_eq!(i.mnemonic, Mnemonic::Shl);
    assert_eq!(i.operands, vec![r(1), r(2)]);

    // Low field 2 selects the three-register form.
    let i = dec(&enc_ext(1, 2, ext2(3, 1, 2, 2)));
    assert_eq!(i.mnemonic, Mnemonic::Shl);
    assert_eq!(i.operands, vec![r(1), r(2), r(3)]);

    let i = dec(&enc_ext(1, 2, ext2(3, 1, 0, 2)));
    assert_eq!(i.mnemonic, Mnemonic::Shr);
    let i = dec(&enc_ext(1, 2, ext2(3, 1, 1, 2)));
    assert_eq!(i.mnemonic, Mnemonic::Sar);
}

#[test]
fn rotl_shares_the_shl_cell() {
    let i = dec_rh(&enc_ext(5, 2, ext2(3, 1, 2, 4)));
    assert_eq!(i.mnemonic, Mnemonic::Rotl);
    assert_eq!(i.operands, vec![imm(5, 5, false), r(2), r(3)]);

    let i = dec_rh(&enc_ext(1, 2, ext2(3, 1, 2, 6)));
    assert_eq!(i.operands, vec![r(1), r(2), r(3)]);
}

#[test]
fn bins_field_arithmetic() {
    // Column 2 variant: msb=5, lsb=2 giving pos 2, width 4.
    let i = dec_rh(&enc_ext(1, 2, ext2(10, 1, 2, 0x14)));
    assert_eq!(i.mnemonic, Mnemonic::Bins);
    assert_eq!(
        i.operands,
        vec![r(1), imm(4, 5, false), imm(2, 5, false), r(2)]
    );
}

#[test]
fn register_form_bit_ops_and_caxi() {
    let i = dec(&enc_ext(4, 3, ext2(0, 1, 3, 2 << 1)));
    assert_eq!(i.mnemonic, Mnemonic::Clr1);
    assert_eq!(i.operands, vec![r(3), reg_mem(4)]);

    let i = dec(&enc_ext(1, 2, ext2(3, 1, 3, 0xE)));
    assert_eq!(i.mnemonic, Mnemonic::Caxi);
    assert_eq!(i.operands, vec![reg_mem(1), r(2), r(3)]);
}

#[test]
fn trap_halt_and_returns() {
    let i = dec(&enc_ext(0x10, 0, ext2(0, 2, 0, 0)));
    assert_eq!(i.mnemonic, Mnemonic::Trap);
    assert_eq!(i.operands, vec![Operand::VecJump(0x10)]);

    let i = dec(&enc_ext(0, 0, ext2(0, 2, 1, 0)));
    assert_eq!(i.mnemonic, Mnemonic::Halt);

    let i = dec(&enc_ext(0, 0, ext2(0, 2, 2, 0)));
    assert_eq!(i.mnemonic, Mnemonic::Reti);
    let i = decode(&enc_ext(0, 0, ext2(0, 2, 2, 4)), SubArch::V850Es).unwrap();
    assert_eq!(i.mnemonic, Mnemonic::Ctret);
    let i = decode(&enc_ext(0, 0, ext2(0, 2, 2, 6)), SubArch::V850Es).unwrap();
    assert_eq!(i.mnemonic, Mnemonic::Dbret);
    let i = dec(&enc_ext(0, 0, ext2(0, 2, 2, 8)));
    assert_eq!(i.mnemonic, Mnemonic::Eiret);
    let i = dec(&enc_ext(0, 0, ext2(0, 2, 2, 10)));
    assert_eq!(i.mnemonic, Mnemonic::Feret);
    // The unassigned slot stays a documented hole.
    let i = dec(&enc_ext(0, 0, ext2(0, 2, 2, 2)));
    assert_eq!(i.mnemonic, Mnemonic::Undefined);
}

#[test]
fn interrupt_control() {
    let i = dec(&enc_ext(0, 0, ext2(0, 2, 3, 0)));
    assert_eq!(i.mnemonic, Mnemonic::Di);
    let i = dec(&enc_ext(0, 0x10, ext2(0, 2, 3, 0)));
    assert_eq!(i.mnemonic, Mnemonic::Ei);
    let i = dec(&enc_ext(0, 0x04, ext2(0, 2, 3, 0)));
    assert_eq!(i.mnemonic, Mnemonic::Undefined);
}

#[test]
fn syscall_vector_assembly() {
    // vector8 = high bits from the second parcel, low from reg1.
    let i = dec(&enc_ext(3, 0x1A, ext2(1, 2, 3, 0)));
    assert_eq!(i.mnemonic, Mnemonic::Syscall);
    assert_eq!(i.operands, vec![Operand::VecJump(0x23)]);
}

#[test]
fn stack_range_push_pop() {
    let i = dec_rh(&enc_ext(6, 8, ext2(9, 2, 3, 0)));
    assert_eq!(i.mnemonic, Mnemonic::Pushsp);
    assert_eq!(
        i.operands,
        vec![Operand::RegRange {
            lo: Reg::new(6),
            hi: Reg::new(9),
        }]
    );

    let i = dec_rh(&enc_ext(6, 0xC, ext2(9, 2, 3, 0)));
    assert_eq!(i.mnemonic, Mnemonic::Popsp);
}

#[test]
fn prefetch_requires_a_known_op() {
    let i = dec_rh(&enc_ext(4, 0x18, ext2(0, 2, 3, 0)));
    assert_eq!(i.mnemonic, Mnemonic::Pref);
    assert_eq!(
        i.operands,
        vec![Operand::PrefetchOp(PrefetchOp::Prefi), reg_mem(4)]
    );

    let i = dec_rh(&enc_ext(4, 0x18, ext2(3, 2, 3, 0)));
    assert_eq!(i.mnemonic, Mnemonic::Invalid);
}

#[test]
fn cache_keeps_unknown_codes() {
    let i = dec_rh(&enc_ext(4, 0x1C, ext2(0, 2, 3, 0)));
    assert_eq!(i.mnemonic, Mnemonic::Cache);
    assert_eq!(i.operands, vec![Operand::CacheOp(CacheOp::Chbii), reg_mem(4)]);

    // Unknown maintenance codes still decode, carrying the invalid marker.
    let i = dec_rh(&enc_ext(4, 0x1C, ext2(3, 2, 3, 0)));
    assert_eq!(i.mnemonic, Mnemonic::Cache);
    assert_eq!(
        i.operands,
        vec![Operand::CacheOp(CacheOp::Invalid), reg_mem(4)]
    );
}

#[test]
fn cll_exact_pattern() {
    let i = dec_rh(&enc_ext(0x1F, 0x1F, ext2(0x1E, 2, 3, 0)));
    assert_eq!(i.mnemonic, Mnemonic::Cll);
    assert!(i.operands.is_empty());
}

#[test]
fn sasf_takes_a_condition() {
    let i = dec(&enc_ext(Cond::Nz as u16, 10, ext2(0, 4, 0, 0)));
    assert_eq!(i.mnemonic, Mnemonic::Sasf);
    assert_eq!(i.operands, vec![Operand::Cond(Cond::Nz), r(10)]);
}

#[test]
fn three_register_multiplies() {
    let i = dec(&enc_ext(1, 2, ext2(3, 4, 1, 0)));
    assert_eq!(i.mnemonic, Mnemonic::Mul);
    assert_eq!(i.operands, vec![r(1), r(2), r(3)]);

    // 9-bit immediate form, split across both parcels; bit 17 picks mulu.
    let i = dec(&enc(&[
        (2 << 11) | (0xF << 7) | (3 << 5) | 4,
        ext2(3, 4, 3, 0x02),
    ]));
    assert_eq!(i.mnemonic, Mnemonic::Mulu);
    assert_eq!(i.operands, vec![imm(260, 9, false), r(2), r(3)]);
}

#[test]
fn divide_family_markers() {
    let i = dec(&enc_ext(1, 2, ext2(3, 5, 2, 0)));
    assert_eq!(i.mnemonic, Mnemonic::Div);
    let i = dec(&enc_ext(1, 2, ext2(3, 5, 2, 2)));
    assert_eq!(i.mnemonic, Mnemonic::Divu);
    let i = dec(&enc_ext(1, 2, ext2(3, 5, 0, 0)));
    assert_eq!(i.mnemonic, Mnemonic::Divh);
    assert_eq!(i.operands, vec![r(1), r(2), r(3)]);

    // The quick divides require the 7-marker in bits 20..18.
    let i = dec(&enc_ext(1, 2, ext2(3, 5, 3, 0x1C)));
    assert_eq!(i.mnemonic, Mnemonic::Divq);
    let i = dec(&enc_ext(1, 2, ext2(3, 5, 3, 0)));
    assert_eq!(i.mnemonic, Mnemonic::Invalid);
}

#[test]
fn conditional_moves() {
    let i = dec(&enc_ext(0x1D, 2, ext2(3, 6, 0, Cond::Z as u16 * 2)));
    assert_eq!(i.mnemonic, Mnemonic::Cmov);
    assert_eq!(
        i.operands,
        vec![Operand::Cond(Cond::Z), imm(0x1D, 5, true), r(2), r(3)]
    );

    let i = dec(&enc_ext(1, 2, ext2(3, 6, 1, Cond::Nz as u16 * 2)));
    assert_eq!(
        i.operands,
        vec![Operand::Cond(Cond::Nz), r(1), r(2), r(3)]
    );
}

#[test]
fn swap_and_search_cells() {
    let i = dec(&enc_ext(0, 2, ext2(3, 6, 2, 1 << 1)));
    assert_eq!(i.mnemonic, Mnemonic::Bsh);
    assert_eq!(i.operands, vec![r(2), r(3)]);
    let i = dec(&enc_ext(0, 2, ext2(3, 6, 2, 0)));
    assert_eq!(i.mnemonic, Mnemonic::Bsw);
    let i = dec(&enc_ext(0, 2, ext2(3, 6, 2, 2 << 1)));
    assert_eq!(i.mnemonic, Mnemonic::Hsw);
    let i = dec(&enc_ext(0, 2, ext2(3, 6, 2, 3 << 1)));
    assert_eq!(i.mnemonic, Mnemonic::Hsh);

    let i = dec(&enc_ext(0, 2, ext2(3, 6, 3, 2 << 1)));
    assert_eq!(i.mnemonic, Mnemonic::Sch0l);
    assert_eq!(i.operands, vec![r(2), r(3)]);
    let i = dec(&enc_ext(0, 2, ext2(3, 6, 3, 0)));
    assert_eq!(i.mnemonic, Mnemonic::Sch0r);
}

#[test]
fn load_link_store_conditional() {
    let i = dec_rh(&enc_ext(4, 0, ext2(6, 6, 3, 0x18)));
    assert_eq!(i.mnemonic, Mnemonic::LdlW);
    assert_eq!(i.operands, vec![reg_mem(4), r(6)]);

    let i = dec_rh(&enc_ext(4, 0, ext2(6, 6, 3, 0x1A)));
    assert_eq!(i.mnemonic, Mnemonic::StcW);
    assert_eq!(i.operands, vec![r(6), reg_mem(4)]);
}

#[test]
fn conditional_arith_and_the_saturating_slot() {
    let i = dec(&enc_ext(1, 2, ext2(3, 7, 1, Cond::Lt as u16 * 2)));
    assert_eq!(i.mnemonic, Mnemonic::Adf);
    assert_eq!(
        i.operands,
        vec![Operand::Cond(Cond::Lt), r(1), r(2), r(3)]
    );

    let i = dec(&enc_ext(1, 2, ext2(3, 7, 0, Cond::Nz as u16 * 2)));
    assert_eq!(i.mnemonic, Mnemonic::Sbf);

    // Condition slot 0xd is reused by the three-register saturating forms.
    let i = dec(&enc_ext(1, 2, ext2(3, 7, 1, 0x1A)));
    assert_eq!(i.mnemonic, Mnemonic::Satadd);
    assert_eq!(i.operands, vec![r(1), r(2), r(3)]);
    let i = dec(&enc_ext(1, 2, ext2(3, 7, 0, 0x1A)));
    assert_eq!(i.mnemonic, Mnemonic::Satsub);
}

#[test]
fn multiply_accumulate_pairs() {
    let pair = |even: u8| Operand::RegPair(RegPair::from_reg(Reg::new(even)));
    let i = dec(&enc_ext(1, 2, ext2(6, 7, 2, 8)));
    assert_eq!(i.mnemonic, Mnemonic::Mac);
    assert_eq!(i.operands, vec![r(1), r(2), pair(6), pair(8)]);

    let i = dec(&enc_ext(1, 2, ext2(6, 7, 3, 8)));
    assert_eq!(i.mnemonic, Mnemonic::Macu);

    // Odd accumulator pairs are rejected.
    let i = dec(&enc_ext(1, 2, ext2(7, 7, 2, 8)));
    assert_eq!(i.mnemonic, Mnemonic::Invalid);
}
