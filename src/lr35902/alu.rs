use crate::lr35902::command::{AluOp, CbOp};
use crate::lr35902::registers::{Flags, Registers};

/// Applies an accumulator operation. CP only sets flags.
pub fn accumulate(registers: &mut Registers, op: AluOp, value: u8) {
    let carry = registers.flag(Flags::CARRY) as u8;
    let a = registers.a;

    let result = match op {
        AluOp::Add => add8(registers, a, value, 0),
        AluOp::Adc => add8(registers, a, value, carry),
        AluOp::Sub | AluOp::Cp => sub8(registers, a, value, 0),
        AluOp::Sbc => sub8(registers, a, value, carry),
        AluOp::And => {
            let result = a & value;
            registers.set_flags(result == 0, false, true, false);
            result
        }
        AluOp::Xor => {
            let result = a ^ value;
            registers.set_flags(result == 0, false, false, false);
            result
        }
        AluOp::Or => {
            let result = a | value;
            registers.set_flags(result == 0, false, false, false);
            result
        }
    };

    if op != AluOp::Cp {
        registers.a = result;
    }
}

fn add8(registers: &mut Registers, a: u8, value: u8, carry: u8) -> u8 {
    let sum = a as u16 + value as u16 + carry as u16;
    let half_carry = (a & 0x0f) + (value & 0x0f) + carry > 0x0f;
    let result = sum as u8;
    registers.set_flags(result == 0, false, half_carry, sum > 0xff);
    result
}

fn sub8(registers: &mut Registers, a: u8, value: u8, carry: u8) -> u8 {
    let result = a.wrapping_sub(value).wrapping_sub(carry);
    let half_carry = (a & 0x0f) < (value & 0x0f) + carry;
    let full_carry = (a as u16) < value as u16 + carry as u16;
    registers.set_flags(result == 0, true, half_carry, full_carry);
    result
}

/// 8-bit INC, carry is left alone.
pub fn increment(registers: &mut Registers, value: u8) -> u8 {
    let result = value.wrapping_add(1);
    registers.set_flag(Flags::ZERO, result == 0);
    registers.set_flag(Flags::SUBTRACT, false);
    registers.set_flag(Flags::HALF_CARRY, value & 0x0f == 0x0f);
    result
}

/// 8-bit DEC, carry is left alone.
pub fn decrement(registers: &mut Registers, value: u8) -> u8 {
    let result = value.wrapping_sub(1);
    registers.set_flag(Flags::ZERO, result == 0);
    registers.set_flag(Flags::SUBTRACT, true);
    registers.set_flag(Flags::HALF_CARRY, value & 0x0f == 0);
    result
}

/// ADD HL,rr. Half carry comes from bit 11, zero is untouched.
pub fn add_hl(registers: &mut Registers, value: u16) {
    let hl = registers.hl();
    let (result, carry) = hl.overflowing_add(value);
    let half_carry = (hl & 0x0fff) + (value & 0x0fff) > 0x0fff;

    registers.set_flag(Flags::SUBTRACT, false);
    registers.set_flag(Flags::HALF_CARRY, half_carry);
    registers.set_flag(Flags::CARRY, carry);
    registers.set_hl(result);
}

/// SP plus a signed offset, as used by ADD SP,e and LD HL,SP+e. Flags come from the unsigned low byte.
pub fn offset_sp(registers: &mut Registers, offset: u8) -> u16 {
    let sp = registers.sp;
    let half_carry = (sp & 0x000f) + (offset as u16 & 0x000f) > 0x000f;
    let carry = (sp & 0x00ff) + offset as u16 > 0x00ff;
    registers.set_flags(false, false, half_carry, carry);

    sp.wrapping_add(offset as i8 as i16 as u16)
}

pub fn daa(registers: &mut Registers) {
    let subtract = registers.flag(Flags::SUBTRACT);
    let mut carry = registers.flag(Flags::CARRY);
    let mut adjust = 0u8;

    if registers.flag(Flags::HALF_CARRY) || (!subtract && registers.a & 0x0f > 0x09) {
        adjust |= 0x06;
    }
    if carry || (!subtract && registers.a > 0x99) {
        adjust |= 0x60;
        carry = true;
    }

    registers.a = if subtract {
        registers.a.wrapping_sub(adjust)
    } else {
        registers.a.wrapping_add(adjust)
    };

    registers.set_flag(Flags::ZERO, registers.a == 0);
    registers.set_flag(Flags::HALF_CARRY, false);
    registers.set_flag(Flags::CARRY, carry);
}

pub fn cpl(registers: &mut Registers) {
    registers.a = !registers.a;
    registers.set_flag(Flags::SUBTRACT, true);
    registers.set_flag(Flags::HALF_CARRY, true);
}

pub fn scf(registers: &mut Registers) {
    registers.set_flag(Flags::SUBTRACT, false);
    registers.set_flag(Flags::HALF_CARRY, false);
    registers.set_flag(Flags::CARRY, true);
}

pub fn ccf(registers: &mut Registers) {
    let carry = registers.flag(Flags::CARRY);
    registers.set_flag(Flags::SUBTRACT, false);
    registers.set_flag(Flags::HALF_CARRY, false);
    registers.set_flag(Flags::CARRY, !carry);
}

/// Runs a CB operation on `value`. Returns the value to write back, or None for BIT.
pub fn cb(registers: &mut Registers, op: CbOp, value: u8) -> Option<u8> {
    let carry_in = registers.flag(Flags::CARRY) as u8;

    let (result, carry) = match op {
        CbOp::Rlc => (value.rotate_left(1), value & 0x80 != 0),
        CbOp::Rrc => (value.rotate_right(1), value & 0x01 != 0),
        CbOp::Rl => (value << 1 | carry_in, value & 0x80 != 0),
        CbOp::Rr => (value >> 1 | carry_in << 7, value & 0x01 != 0),
        CbOp::Sla => (value << 1, value & 0x80 != 0),
        CbOp::Sra => (value >> 1 | value & 0x80, value & 0x01 != 0),
        CbOp::Swap => (value.rotate_left(4), false),
        CbOp::Srl => (value >> 1, value & 0x01 != 0),
        CbOp::Bit(bit) => {
            registers.set_flag(Flags::ZERO, value & (1 << bit) == 0);
            registers.set_flag(Flags::SUBTRACT, false);
            registers.set_flag(Flags::HALF_CARRY, true);
            return None;
        }
        CbOp::Res(bit) => return Some(value & !(1 << bit)),
        CbOp::Set(bit) => return Some(value | 1 << bit),
    };

    registers.set_flags(result == 0, false, false, carry);
    Some(result)
}

/// RLCA, RRCA, RLA and RRA: the CB rotate with zero always cleared.
pub fn rotate_a(registers: &mut Registers, op: CbOp) {
    let value = registers.a;
    if let Some(result) = cb(registers, op, value) {
        registers.a = result;
    }
    registers.set_flag(Flags::ZERO, false);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_borrows_from_both_nibbles() {
        let mut registers = Registers::default();
        registers.a = 0x10;
        accumulate(&mut registers, AluOp::Sub, 0x01);
        assert_eq!(registers.a, 0x0f);
        assert!(registers.flag(Flags::HALF_CARRY));
        assert!(!registers.flag(Flags::CARRY));

        accumulate(&mut registers, AluOp::Cp, 0x10);
        assert_eq!(registers.a, 0x0f, "CP leaves A alone");
        assert!(registers.flag(Flags::CARRY));
        assert!(registers.flag(Flags::SUBTRACT));
    }

    #[test]
    fn adc_and_sbc_use_the_carry() {
        let mut registers = Registers::default();
        registers.a = 0x0f;
        registers.set_flag(Flags::CARRY, true);
        accumulate(&mut registers, AluOp::Adc, 0xf0);
        assert_eq!(registers.a, 0x00);
        assert_eq!(registers.f, Flags::ZERO | Flags::HALF_CARRY | Flags::CARRY);

        accumulate(&mut registers, AluOp::Sbc, 0x00);
        assert_eq!(registers.a, 0xff);
        assert_eq!(registers.f, Flags::SUBTRACT | Flags::HALF_CARRY | Flags::CARRY);
    }

    #[test]
    fn increment_keeps_carry() {
        let mut registers = Registers::default();
        registers.set_flag(Flags::CARRY, true);

        assert_eq!(increment(&mut registers, 0xff), 0x00);
        assert_eq!(registers.f, Flags::ZERO | Flags::HALF_CARRY | Flags::CARRY);

        assert_eq!(decrement(&mut registers, 0x10), 0x0f);
        assert_eq!(registers.f, Flags::SUBTRACT | Flags::HALF_CARRY | Flags::CARRY);
    }

    #[test]
    fn sp_offset_flags_use_the_low_byte() {
        let mut registers = Registers::default();
        registers.sp = 0x00ff;
        assert_eq!(offset_sp(&mut registers, 0x01), 0x0100);
        assert_eq!(registers.f, Flags::HALF_CARRY | Flags::CARRY);

        registers.sp = 0x1000;
        assert_eq!(offset_sp(&mut registers, 0xff), 0x0fff);
        assert_eq!(registers.f, Flags::empty());
    }

    #[test]
    fn shifts_and_bits() {
        let mut registers = Registers::default();
        assert_eq!(cb(&mut registers, CbOp::Sra, 0x81), Some(0xc0));
        assert!(registers.flag(Flags::CARRY));

        assert_eq!(cb(&mut registers, CbOp::Swap, 0xf1), Some(0x1f));
        assert!(!registers.flag(Flags::CARRY));

        registers.set_flag(Flags::CARRY, true);
        assert_eq!(cb(&mut registers, CbOp::Bit(7), 0x7f), None);
        assert_eq!(registers.f, Flags::ZERO | Flags::HALF_CARRY | Flags::CARRY);

        assert_eq!(cb(&mut registers, CbOp::Res(0), 0xff), Some(0xfe));
        assert_eq!(cb(&mut registers, CbOp::Set(7), 0x00), Some(0x80));
    }

    #[test]
    fn rla_rotates_through_carry() {
        let mut registers = Registers::default();
        registers.a = 0x80;
        rotate_a(&mut registers, CbOp::Rl);
        assert_eq!(registers.a, 0x00);
        assert_eq!(registers.f, Flags::CARRY);

        rotate_a(&mut registers, CbOp::Rr);
        assert_eq!(registers.a, 0x80);
        assert_eq!(registers.f, Flags::empty());
    }
}
