use crate::error::EdgeError;
use crate::lr35902::command::{define_command, Operation, TableBuilder};
use crate::lr35902::destination::Destination;

pub fn register(table: &mut TableBuilder) -> Result<(), EdgeError> {
    // ld r, r'
    for opcode in 0x40..=0x7fu8 {
        // $76 is HALT
        if opcode == 0x76 {
            continue;
        }

        let to = Destination::from_register_bits(opcode >> 3);
        let from = Destination::from_register_bits(opcode);
        let cycles = if to.is_memory() || from.is_memory() { 8 } else { 4 };
        define_command!(table, opcode, "LD", (cycles, None), Operation::Load { to, from });
    }

    // ld r, imm8
    for bits in 0..8u8 {
        let to = Destination::from_register_bits(bits);
        let cycles = if to.is_memory() { 12 } else { 8 };
        define_command!(
            table,
            0x06 | bits << 3,
            "LD",
            (cycles, None),
            Operation::Load {
                to,
                from: Destination::EatPcByte
            }
        );
    }

    // ld rr, imm16
    for bits in 0..4u8 {
        define_command!(
            table,
            0x01 | bits << 4,
            "LD",
            (12, None),
            Operation::Load {
                to: Destination::from_pair_bits(bits),
                from: Destination::EatPcWord
            }
        );
    }

    let loads = [
        (0x02, Destination::AddressBC, Destination::A, 8),
        (0x12, Destination::AddressDE, Destination::A, 8),
        (0x0a, Destination::A, Destination::AddressBC, 8),
        (0x1a, Destination::A, Destination::AddressDE, 8),
        (0x08, Destination::AddressNnWord, Destination::SP, 20),
        (0xe2, Destination::HighPageC, Destination::A, 8),
        (0xf2, Destination::A, Destination::HighPageC, 8),
        (0xea, Destination::AddressNn, Destination::A, 16),
        (0xfa, Destination::A, Destination::AddressNn, 16),
        (0xf9, Destination::SP, Destination::HL, 8),
    ];
    for (opcode, to, from, cycles) in loads {
        define_command!(table, opcode, "LD", (cycles, None), Operation::Load { to, from });
    }

    // ldh (imm8), a / ldh a, (imm8)
    define_command!(
        table,
        0xe0,
        "LDH",
        (12, None),
        Operation::Load {
            to: Destination::HighPageByte,
            from: Destination::A
        }
    );
    define_command!(
        table,
        0xf0,
        "LDH",
        (12, None),
        Operation::Load {
            to: Destination::A,
            from: Destination::HighPageByte
        }
    );

    define_command!(table, 0x22, "LD", (8, None), Operation::LoadHlIncrement { store: true });
    define_command!(table, 0x2a, "LD", (8, None), Operation::LoadHlIncrement { store: false });
    define_command!(table, 0x32, "LD", (8, None), Operation::LoadHlDecrement { store: true });
    define_command!(table, 0x3a, "LD", (8, None), Operation::LoadHlDecrement { store: false });

    // ld hl, sp + imm8
    define_command!(table, 0xf8, "LD", (12, None), Operation::LoadHlSpOffset);

    Ok(())
}
