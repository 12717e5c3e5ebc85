use crate::error::EdgeError;
use crate::lr35902::command::{define_command, Operation, TableBuilder};

/// Opcodes the DMG leaves undefined. Executing one locks up real hardware.
pub const RESERVED_OPCODES: [u8; 11] = [0xd3, 0xdb, 0xdd, 0xe3, 0xe4, 0xeb, 0xec, 0xed, 0xf4, 0xfc, 0xfd];

pub fn register(table: &mut TableBuilder) -> Result<(), EdgeError> {
    define_command!(table, 0x00, "NOP", (4, None), Operation::Nop);
    define_command!(table, 0x10, "STOP", (4, None), Operation::Stop);
    define_command!(table, 0x76, "HALT", (4, None), Operation::Halt);
    define_command!(table, 0xf3, "DI", (4, None), Operation::Di);
    define_command!(table, 0xfb, "EI", (4, None), Operation::Ei);
    // The prefixed command supplies the real cost
    define_command!(table, 0xcb, "PREFIX CB", (4, None), Operation::Prefix);

    for opcode in RESERVED_OPCODES {
        define_command!(table, opcode, "UNIMPLEMENTED", (4, None), Operation::Unimplemented);
    }

    Ok(())
}
