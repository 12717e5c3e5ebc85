/// Every operand form an instruction can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    A,
    B,
    C,
    D,
    E,
    F,
    H,
    L,
    AF,
    BC,
    DE,
    HL,
    SP,
    PC,
    /// Immediate byte consumed from PC.
    EatPcByte,
    /// Immediate little endian word consumed from PC.
    EatPcWord,
    AddressBC,
    AddressDE,
    AddressHL,
    AddressSP,
    /// Byte at the immediate word address.
    AddressNn,
    /// Word at the immediate word address, written low byte first.
    AddressNnWord,
    /// $ff00 + immediate byte.
    HighPageByte,
    /// $ff00 + C.
    HighPageC,
}

impl Destination {
    pub fn requires_16_bits(&self) -> bool {
        match self {
            Destination::A
            | Destination::B
            | Destination::C
            | Destination::D
            | Destination::E
            | Destination::F
            | Destination::H
            | Destination::L
            | Destination::EatPcByte
            | Destination::AddressBC
            | Destination::AddressDE
            | Destination::AddressHL
            | Destination::AddressSP
            | Destination::AddressNn
            | Destination::HighPageByte
            | Destination::HighPageC => false,
            Destination::AF
            | Destination::BC
            | Destination::DE
            | Destination::HL
            | Destination::SP
            | Destination::PC
            | Destination::EatPcWord
            | Destination::AddressNnWord => true,
        }
    }

    /// Decodes the 3-bit register field shared by LD r,r', the ALU block and the CB table.
    pub fn from_register_bits(bits: u8) -> Destination {
        match bits & 0b111 {
            0b000 => Destination::B,
            0b001 => Destination::C,
            0b010 => Destination::D,
            0b011 => Destination::E,
            0b100 => Destination::H,
            0b101 => Destination::L,
            0b110 => Destination::AddressHL,
            _ => Destination::A,
        }
    }

    /// Decodes the 2-bit pair field used by 16-bit loads and arithmetic.
    pub fn from_pair_bits(bits: u8) -> Destination {
        match bits & 0b11 {
            0b00 => Destination::BC,
            0b01 => Destination::DE,
            0b10 => Destination::HL,
            _ => Destination::SP,
        }
    }

    /// Same as [`Destination::from_pair_bits`] but AF takes the place of SP, as PUSH and POP encode it.
    pub fn from_stack_pair_bits(bits: u8) -> Destination {
        match bits & 0b11 {
            0b11 => Destination::AF,
            bits => Destination::from_pair_bits(bits),
        }
    }

    #[inline]
    pub fn is_memory(&self) -> bool {
        matches!(
            self,
            Destination::AddressBC
                | Destination::AddressDE
                | Destination::AddressHL
                | Destination::AddressSP
                | Destination::AddressNn
                | Destination::AddressNnWord
                | Destination::HighPageByte
                | Destination::HighPageC
        )
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            Destination::A => "A",
            Destination::B => "B",
            Destination::C => "C",
            Destination::D => "D",
            Destination::E => "E",
            Destination::F => "F",
            Destination::H => "H",
            Destination::L => "L",
            Destination::AF => "AF",
            Destination::BC => "BC",
            Destination::DE => "DE",
            Destination::HL => "HL",
            Destination::SP => "SP",
            Destination::PC => "PC",
            Destination::EatPcByte => "n",
            Destination::EatPcWord => "nn",
            Destination::AddressBC => "(BC)",
            Destination::AddressDE => "(DE)",
            Destination::AddressHL => "(HL)",
            Destination::AddressSP => "(SP)",
            Destination::AddressNn | Destination::AddressNnWord => "(nn)",
            Destination::HighPageByte => "($ff00+n)",
            Destination::HighPageC => "($ff00+C)",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_field_decodes_hl_indirect() {
        assert_eq!(Destination::from_register_bits(0b110), Destination::AddressHL);
        assert_eq!(Destination::from_register_bits(0b111), Destination::A);
        assert!(!Destination::from_register_bits(0b110).requires_16_bits());
    }

    #[test]
    fn stack_pairs_use_af() {
        assert_eq!(Destination::from_stack_pair_bits(0b11), Destination::AF);
        assert_eq!(Destination::from_pair_bits(0b11), Destination::SP);
        assert!(Destination::AF.requires_16_bits());
        assert!(Destination::AddressNnWord.requires_16_bits());
    }
}
