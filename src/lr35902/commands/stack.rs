use crate::error::EdgeError;
use crate::lr35902::command::{define_command, Operation, TableBuilder};
use crate::lr35902::destination::Destination;

pub fn register(table: &mut TableBuilder) -> Result<(), EdgeError> {
    for bits in 0..4u8 {
        let pair = Destination::from_stack_pair_bits(bits);
        define_command!(table, 0xc5 | bits << 4, "PUSH", (16, None), Operation::Push(pair));
        define_command!(table, 0xc1 | bits << 4, "POP", (12, None), Operation::Pop(pair));
    }
    Ok(())
}
