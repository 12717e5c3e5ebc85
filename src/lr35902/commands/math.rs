use crate::error::EdgeError;
use crate::lr35902::command::{define_command, AluOp, Operation, TableBuilder};
use crate::lr35902::destination::Destination;

const ALU_MNEMONICS: [&str; 8] = ["ADD", "ADC", "SUB", "SBC", "AND", "XOR", "OR", "CP"];

pub fn register(table: &mut TableBuilder) -> Result<(), EdgeError> {
    // inc r / dec r
    for bits in 0..8u8 {
        let target = Destination::from_register_bits(bits);
        let cycles = if target.is_memory() { 12 } else { 4 };
        define_command!(table, 0x04 | bits << 3, "INC", (cycles, None), Operation::Increment(target));
        define_command!(table, 0x05 | bits << 3, "DEC", (cycles, None), Operation::Decrement(target));
    }

    // inc rr / dec rr / add hl, rr
    for bits in 0..4u8 {
        let pair = Destination::from_pair_bits(bits);
        define_command!(table, 0x03 | bits << 4, "INC", (8, None), Operation::Increment(pair));
        define_command!(table, 0x0b | bits << 4, "DEC", (8, None), Operation::Decrement(pair));
        define_command!(table, 0x09 | bits << 4, "ADD", (8, None), Operation::AddHl(pair));
    }

    // alu a, r
    for opcode in 0x80..=0xbfu8 {
        let bits = (opcode >> 3) & 0b111;
        let source = Destination::from_register_bits(opcode);
        let cycles = if source.is_memory() { 8 } else { 4 };
        define_command!(
            table,
            opcode,
            ALU_MNEMONICS[bits as usize],
            (cycles, None),
            Operation::Alu(AluOp::from_bits(bits), source)
        );
    }

    // alu a, imm8
    for bits in 0..8u8 {
        define_command!(
            table,
            0xc6 | bits << 3,
            ALU_MNEMONICS[bits as usize],
            (8, None),
            Operation::Alu(AluOp::from_bits(bits), Destination::EatPcByte)
        );
    }

    define_command!(table, 0xe8, "ADD", (16, None), Operation::AddSp);
    define_command!(table, 0x27, "DAA", (4, None), Operation::Daa);
    define_command!(table, 0x2f, "CPL", (4, None), Operation::Cpl);
    define_command!(table, 0x37, "SCF", (4, None), Operation::Scf);
    define_command!(table, 0x3f, "CCF", (4, None), Operation::Ccf);

    Ok(())
}
