use crate::error::EdgeError;
use crate::lr35902::command::{define_command, CbOp, Operation, TableBuilder};
use crate::lr35902::destination::Destination;

const SHIFT_MNEMONICS: [&str; 8] = ["RLC", "RRC", "RL", "RR", "SLA", "SRA", "SWAP", "SRL"];

/// Fills the table reached through $cb. Costs include the prefix byte.
pub fn register(table: &mut TableBuilder) -> Result<(), EdgeError> {
    for opcode in 0..=u8::MAX {
        let target = Destination::from_register_bits(opcode);
        let operation_bits = (opcode >> 3) & 0b111;

        let (mnemonic, operation) = match opcode >> 6 {
            0b00 => (SHIFT_MNEMONICS[operation_bits as usize], CbOp::from_shift_bits(operation_bits)),
            0b01 => ("BIT", CbOp::Bit(operation_bits)),
            0b10 => ("RES", CbOp::Res(operation_bits)),
            _ => ("SET", CbOp::Set(operation_bits)),
        };

        let cycles = match (operation, target.is_memory()) {
            (_, false) => 8,
            // BIT only reads (HL)
            (CbOp::Bit(_), true) => 12,
            (_, true) => 16,
        };

        define_command!(table, opcode, mnemonic, (cycles, None), Operation::Cb(operation, target));
    }
    Ok(())
}
