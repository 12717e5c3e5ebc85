use crate::error::EdgeError;
use crate::lr35902::command::{OpcodeTable, TableBuilder};

pub mod bit;
pub mod cb;
pub mod jump;
pub mod load;
pub mod math;
pub mod misc;
pub mod stack;

/// Builds the unprefixed table. Fails on any duplicate or missing opcode.
pub fn main_table() -> Result<OpcodeTable, EdgeError> {
    let mut table = TableBuilder::new("main");
    load::register(&mut table)?;
    math::register(&mut table)?;
    bit::register(&mut table)?;
    jump::register(&mut table)?;
    stack::register(&mut table)?;
    misc::register(&mut table)?;
    table.build()
}

/// Builds the table for opcodes following the $cb prefix.
pub fn cb_table() -> Result<OpcodeTable, EdgeError> {
    let mut table = TableBuilder::new("cb");
    cb::register(&mut table)?;
    table.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lr35902::command::Operation;

    #[test]
    fn tables_are_complete() {
        let main = main_table().unwrap();
        let cb = cb_table().unwrap();

        for opcode in 0..=u8::MAX {
            assert_eq!(main.command(opcode).opcode, opcode);
            assert_eq!(cb.command(opcode).opcode, opcode);
        }
    }

    #[test]
    fn only_reserved_opcodes_are_unimplemented() {
        let main = main_table().unwrap();
        let unimplemented: Vec<u8> = main
            .iter()
            .filter(|command| command.operation == Operation::Unimplemented)
            .map(|command| command.opcode)
            .collect();

        assert_eq!(
            unimplemented,
            vec![0xd3, 0xdb, 0xdd, 0xe3, 0xe4, 0xeb, 0xec, 0xed, 0xf4, 0xfc, 0xfd]
        );
    }

    #[test]
    fn every_cost_is_in_range() {
        for table in [main_table().unwrap(), cb_table().unwrap()] {
            for command in table.iter() {
                let (taken, not_taken) = command.cycles;
                assert!(taken > 0 && taken < 33, "{} ${:02x}", table.name(), command.opcode);
                assert!(not_taken.map_or(true, |cycles| cycles < taken));
            }
        }
    }
}
