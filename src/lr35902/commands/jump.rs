use crate::error::EdgeError;
use crate::lr35902::command::{define_command, Condition, Operation, TableBuilder};

pub fn register(table: &mut TableBuilder) -> Result<(), EdgeError> {
    define_command!(table, 0xc3, "JP", (16, None), Operation::Jump(Condition::Always));
    define_command!(table, 0xe9, "JP HL", (4, None), Operation::JumpHl);
    define_command!(table, 0x18, "JR", (12, None), Operation::JumpRelative(Condition::Always));
    define_command!(table, 0xcd, "CALL", (24, None), Operation::Call(Condition::Always));
    define_command!(table, 0xc9, "RET", (16, None), Operation::Return(Condition::Always));
    define_command!(table, 0xd9, "RETI", (16, None), Operation::ReturnInterrupt);

    for bits in 0..4u8 {
        let condition = Condition::from_bits(bits);
        define_command!(table, 0xc2 | bits << 3, "JP", (16, Some(12)), Operation::Jump(condition));
        define_command!(table, 0x20 | bits << 3, "JR", (12, Some(8)), Operation::JumpRelative(condition));
        define_command!(table, 0xc4 | bits << 3, "CALL", (24, Some(12)), Operation::Call(condition));
        define_command!(table, 0xc0 | bits << 3, "RET", (20, Some(8)), Operation::Return(condition));
    }

    // rst
    for bits in 0..8u8 {
        define_command!(table, 0xc7 | bits << 3, "RST", (16, None), Operation::Restart(bits << 3));
    }

    Ok(())
}
