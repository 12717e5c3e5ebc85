pub mod alu;
pub mod command;
pub mod commands;
pub mod cpu;
pub mod destination;
mod execute;
pub mod irq;
pub mod registers;
pub mod timer;

pub const T_CYCLES_PER_SECOND: usize = 4_194_304;
