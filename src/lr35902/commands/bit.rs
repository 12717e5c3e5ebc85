use crate::error::EdgeError;
use crate::lr35902::command::{define_command, CbOp, Operation, TableBuilder};

/// Accumulator rotates. Unlike their CB counterparts they always clear Z.
pub fn register(table: &mut TableBuilder) -> Result<(), EdgeError> {
    define_command!(table, 0x07, "RLCA", (4, None), Operation::RotateA(CbOp::Rlc));
    define_command!(table, 0x0f, "RRCA", (4, None), Operation::RotateA(CbOp::Rrc));
    define_command!(table, 0x17, "RLA", (4, None), Operation::RotateA(CbOp::Rl));
    define_command!(table, 0x1f, "RRA", (4, None), Operation::RotateA(CbOp::Rr));
    Ok(())
}
