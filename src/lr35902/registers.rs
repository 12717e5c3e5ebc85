use bitflags::bitflags;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Flags: u8 {
        const ZERO       = 0b1000_0000;
        const SUBTRACT   = 0b0100_0000;
        const HALF_CARRY = 0b0010_0000;
        const CARRY      = 0b0001_0000;
    }
}

impl From<u8> for Flags {
    fn from(byte: u8) -> Self {
        // The low nibble of F does not exist in hardware
        Self::from_bits_truncate(byte)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registers {
    pub a: u8,
    pub f: Flags,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub sp: u16,
    pub pc: u16,
}

impl Registers {
    #[inline]
    pub fn af(&self) -> u16 {
        u16::from_be_bytes([self.a, self.f.bits()])
    }

    #[inline]
    pub fn bc(&self) -> u16 {
        u16::from_be_bytes([self.b, self.c])
    }

    #[inline]
    pub fn de(&self) -> u16 {
        u16::from_be_bytes([self.d, self.e])
    }

    #[inline]
    pub fn hl(&self) -> u16 {
        u16::from_be_bytes([self.h, self.l])
    }

    #[inline]
    pub fn set_af(&mut self, value: u16) {
        let [high, low] = value.to_be_bytes();
        self.a = high;
        self.f = Flags::from(low);
    }

    #[inline]
    pub fn set_bc(&mut self, value: u16) {
        [self.b, self.c] = value.to_be_bytes();
    }

    #[inline]
    pub fn set_de(&mut self, value: u16) {
        [self.d, self.e] = value.to_be_bytes();
    }

    #[inline]
    pub fn set_hl(&mut self, value: u16) {
        [self.h, self.l] = value.to_be_bytes();
    }

    #[inline]
    pub fn flag(&self, flag: Flags) -> bool {
        self.f.contains(flag)
    }

    #[inline]
    pub fn set_flag(&mut self, flag: Flags, value: bool) {
        self.f.set(flag, value);
    }

    /// Assigns all four flags at once, in Z N H C order.
    pub fn set_flags(&mut self, zero: bool, subtract: bool, half_carry: bool, carry: bool) {
        self.f.set(Flags::ZERO, zero);
        self.f.set(Flags::SUBTRACT, subtract);
        self.f.set(Flags::HALF_CARRY, half_carry);
        self.f.set(Flags::CARRY, carry);
    }
}

impl Default for Registers {
    fn default() -> Registers {
        Registers {
            a: 0,
            f: Flags::empty(),
            b: 0,
            c: 0,
            d: 0,
            e: 0,
            h: 0,
            l: 0,
            sp: 0,
            pc: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_combine_high_then_low() {
        let mut registers = Registers::default();
        registers.set_bc(0x1234);
        registers.set_de(0x5678);
        registers.set_hl(0x9abc);

        assert_eq!(registers.b, 0x12);
        assert_eq!(registers.c, 0x34);
        assert_eq!(registers.de(), 0x5678);
        assert_eq!(registers.h, 0x9a);
        assert_eq!(registers.l, 0xbc);
    }

    #[test]
    fn f_low_nibble_is_always_zero() {
        let mut registers = Registers::default();
        registers.set_af(0x12ff);

        assert_eq!(registers.a, 0x12);
        assert_eq!(registers.f.bits(), 0xf0);
        assert_eq!(registers.af(), 0x12f0);
    }
}
