use crate::error::{DuplicateOpcodeSnafu, EdgeError, MissingOpcodeSnafu};
use crate::lr35902::destination::Destination;
use snafu::OptionExt;
use std::fmt::{Display, Formatter};

/// Cycles when a branch is taken (or always), and when it is not.
pub type Cycles = (usize, Option<usize>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Always,
    NotZero,
    Zero,
    NotCarry,
    Carry,
}

impl Condition {
    /// Decodes bits 3-4 of conditional jumps, calls and returns.
    pub fn from_bits(bits: u8) -> Condition {
        match bits & 0b11 {
            0b00 => Condition::NotZero,
            0b01 => Condition::Zero,
            0b10 => Condition::NotCarry,
            _ => Condition::Carry,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
}

impl AluOp {
    pub fn from_bits(bits: u8) -> AluOp {
        match bits & 0b111 {
            0b000 => AluOp::Add,
            0b001 => AluOp::Adc,
            0b010 => AluOp::Sub,
            0b011 => AluOp::Sbc,
            0b100 => AluOp::And,
            0b101 => AluOp::Xor,
            0b110 => AluOp::Or,
            _ => AluOp::Cp,
        }
    }
}

/// Shifts, rotates and bit operations of the CB table. The four accumulator rotates reuse the first four.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CbOp {
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    Swap,
    Srl,
    Bit(u8),
    Res(u8),
    Set(u8),
}

impl CbOp {
    pub fn from_shift_bits(bits: u8) -> CbOp {
        match bits & 0b111 {
            0b000 => CbOp::Rlc,
            0b001 => CbOp::Rrc,
            0b010 => CbOp::Rl,
            0b011 => CbOp::Rr,
            0b100 => CbOp::Sla,
            0b101 => CbOp::Sra,
            0b110 => CbOp::Swap,
            _ => CbOp::Srl,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Nop,
    Load { to: Destination, from: Destination },
    /// LD (HL+),A and LD A,(HL+)
    LoadHlIncrement { store: bool },
    /// LD (HL-),A and LD A,(HL-)
    LoadHlDecrement { store: bool },
    LoadHlSpOffset,
    Increment(Destination),
    Decrement(Destination),
    Alu(AluOp, Destination),
    AddHl(Destination),
    AddSp,
    RotateA(CbOp),
    Jump(Condition),
    JumpHl,
    JumpRelative(Condition),
    Call(Condition),
    Return(Condition),
    ReturnInterrupt,
    Restart(u8),
    Push(Destination),
    Pop(Destination),
    Halt,
    Stop,
    Di,
    Ei,
    Cpl,
    Ccf,
    Scf,
    Daa,
    Prefix,
    Cb(CbOp, Destination),
    Unimplemented,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub opcode: u8,
    pub mnemonic: &'static str,
    pub cycles: Cycles,
    pub operation: Operation,
}

impl Command {
    /// Cost of the command given whether its branch was taken.
    #[inline]
    pub fn cycles_for(&self, taken: bool) -> usize {
        match self.cycles {
            (_, Some(not_taken)) if !taken => not_taken,
            (cycles, _) => cycles,
        }
    }
}

fn condition_suffix(condition: &Condition) -> &'static str {
    match condition {
        Condition::Always => "",
        Condition::NotZero => " NZ",
        Condition::Zero => " Z",
        Condition::NotCarry => " NC",
        Condition::Carry => " C",
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.operation {
            Operation::Load { to, from } => write!(f, "{} {},{}", self.mnemonic, to, from),
            Operation::LoadHlIncrement { store: true } => write!(f, "LD (HL+),A"),
            Operation::LoadHlIncrement { store: false } => write!(f, "LD A,(HL+)"),
            Operation::LoadHlDecrement { store: true } => write!(f, "LD (HL-),A"),
            Operation::LoadHlDecrement { store: false } => write!(f, "LD A,(HL-)"),
            Operation::LoadHlSpOffset => write!(f, "LD HL,SP+e"),
            Operation::Increment(target)
            | Operation::Decrement(target)
            | Operation::Push(target)
            | Operation::Pop(target) => write!(f, "{} {}", self.mnemonic, target),
            Operation::Alu(_, source) => write!(f, "{} A,{}", self.mnemonic, source),
            Operation::AddHl(source) => write!(f, "ADD HL,{}", source),
            Operation::AddSp => write!(f, "ADD SP,e"),
            Operation::Jump(condition)
            | Operation::JumpRelative(condition)
            | Operation::Call(condition)
            | Operation::Return(condition) => write!(f, "{}{}", self.mnemonic, condition_suffix(condition)),
            Operation::Restart(vector) => write!(f, "RST ${:02x}", vector),
            Operation::Cb(CbOp::Bit(bit) | CbOp::Res(bit) | CbOp::Set(bit), target) => {
                write!(f, "{} {},{}", self.mnemonic, bit, target)
            }
            Operation::Cb(_, target) => write!(f, "{} {}", self.mnemonic, target),
            _ => write!(f, "{}", self.mnemonic),
        }
    }
}

/// A complete 256 entry opcode table.
pub struct OpcodeTable {
    name: &'static str,
    commands: Vec<Command>,
}

impl OpcodeTable {
    #[inline]
    pub fn command(&self, opcode: u8) -> &Command {
        &self.commands[opcode as usize]
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }
}

/// Collects commands for one table, refusing duplicates and gaps.
pub struct TableBuilder {
    name: &'static str,
    slots: Vec<Option<Command>>,
}

impl TableBuilder {
    pub fn new(name: &'static str) -> TableBuilder {
        TableBuilder {
            name,
            slots: vec![None; 256],
        }
    }

    pub fn add(
        &mut self, opcode: u8, mnemonic: &'static str, cycles: Cycles, operation: Operation,
    ) -> Result<(), EdgeError> {
        let slot = &mut self.slots[opcode as usize];
        if let Some(existing) = slot {
            return DuplicateOpcodeSnafu {
                table: self.name,
                opcode,
                existing: existing.mnemonic,
                new: mnemonic,
            }
            .fail();
        }

        *slot = Some(Command {
            opcode,
            mnemonic,
            cycles,
            operation,
        });
        Ok(())
    }

    pub fn build(self) -> Result<OpcodeTable, EdgeError> {
        let name = self.name;
        let commands = self
            .slots
            .into_iter()
            .enumerate()
            .map(|(opcode, slot)| {
                slot.context(MissingOpcodeSnafu {
                    table: name,
                    opcode: opcode as u8,
                })
            })
            .collect::<Result<Vec<Command>, EdgeError>>()?;

        Ok(OpcodeTable { name, commands })
    }
}

/// Registers a command, returning early from the enclosing registration function on error.
macro_rules! define_command {
    ( $table:expr, $opcode:expr, $mnemonic:expr, $cycles:expr, $operation:expr ) => {
        $table.add($opcode, $mnemonic, $cycles, $operation)?
    };
}

pub(crate) use define_command;
