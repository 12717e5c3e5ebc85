use crate::error::EdgeError;
use crate::lr35902::command::{Command, OpcodeTable, Operation};
use crate::lr35902::commands::{cb_table, main_table};
use crate::lr35902::destination::Destination;
use crate::lr35902::irq::InterruptExecutor;
use crate::lr35902::registers::{Flags, Registers};
use crate::memory::addressable::Addressable;
use crate::memory::router::AddressRouter;
use crate::memory::{HIGH_RAM_END, HIGH_RAM_START, WORK_RAM_END, WORK_RAM_START};
use log::{trace, warn};

/// Reported while halted, the CPU idles in steps of this many cycles.
pub const HALTED_CYCLES: usize = 16;
/// Instruction address where cycle counting restarts.
const CARTRIDGE_ENTRY: u16 = 0x0100;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CpuState {
    pub registers: Registers,
    pub halt_next: bool,
}

pub struct Cpu {
    registers: Registers,
    main: OpcodeTable,
    cb: OpcodeTable,
    cycles: u64,
    halt_next: bool,
    pending_interrupt: Option<u16>,
    disassembler_mode: bool,
    debug_print: bool,
}

impl Cpu {
    /// Builds both opcode tables, refusing to start with a broken one.
    pub fn new() -> Result<Cpu, EdgeError> {
        Ok(Cpu {
            registers: Registers::default(),
            main: main_table()?,
            cb: cb_table()?,
            cycles: 0,
            halt_next: false,
            pending_interrupt: None,
            disassembler_mode: false,
            debug_print: false,
        })
    }

    #[inline]
    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    #[inline]
    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }

    /// Cycles executed since the cartridge entry point was reached.
    #[inline]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn set_debug_print(&mut self, enabled: bool) {
        self.debug_print = enabled;
    }

    /// Jumps become no-ops and the bus stops reacting, so code can be walked linearly.
    pub fn enable_disassembler_mode(&mut self, router: &mut AddressRouter, enabled: bool) {
        self.disassembler_mode = enabled;
        router.enable_disassembler_mode(enabled);
    }

    #[inline]
    pub fn is_disassembler_mode(&self) -> bool {
        self.disassembler_mode
    }

    /// Register values as the DMG boot ROM leaves them.
    pub fn skip_boot_rom(&mut self) {
        self.registers = Registers {
            a: 0x01,
            f: Flags::from(0xb0),
            b: 0x00,
            c: 0x13,
            d: 0x00,
            e: 0xd8,
            h: 0x01,
            l: 0x4d,
            sp: 0xfffe,
            pc: CARTRIDGE_ENTRY,
        };
        self.halt_next = false;
    }

    pub fn state(&self) -> CpuState {
        CpuState {
            registers: self.registers.clone(),
            halt_next: self.halt_next,
        }
    }

    pub fn set_state(&mut self, state: &CpuState) {
        self.registers = state.registers.clone();
        self.halt_next = state.halt_next;
        self.pending_interrupt = None;
    }

    /// Executes one instruction and returns the cycles it took.
    pub fn step(&mut self, router: &mut AddressRouter) -> usize {
        if self.halt_next {
            self.halt_next = false;
            router.interrupts.halt_until_interrupt();
        }
        if router.interrupts.is_halted() {
            return HALTED_CYCLES;
        }

        let pc = self.registers.pc;
        if pc == CARTRIDGE_ENTRY {
            self.cycles = 0;
        }

        let opcode = self.fetch_opcode(router);
        let mut command = self.main.command(opcode).clone();
        if command.operation == Operation::Prefix {
            let opcode = self.fetch_opcode(router);
            command = self.cb.command(opcode).clone();
        }

        if self.debug_print {
            trace!("[${:04x}] {:<16} {}", pc, command.to_string(), self);
        }

        let taken = self.execute(router, &command);
        let cycles = command.cycles_for(taken);
        assert!(cycles > 0 && cycles < 33, "{} reported {} cycles", command, cycles);

        self.cycles += cycles as u64;
        cycles
    }

    /// Enters a serviced interrupt. Costs nothing extra.
    pub fn dispatch_pending(&mut self, router: &mut AddressRouter) -> usize {
        if let Some(vector) = self.pending_interrupt.take() {
            let pc = self.registers.pc;
            self.push(router, pc);
            self.registers.pc = vector;
        }
        0
    }

    pub fn command(&self, opcode: u8) -> &Command {
        self.main.command(opcode)
    }

    pub fn cb_command(&self, opcode: u8) -> &Command {
        self.cb.command(opcode)
    }

    /// Opcode bytes are read even while disassembling.
    fn fetch_opcode(&mut self, router: &mut AddressRouter) -> u8 {
        let disassembling = router.is_disassembler_mode();
        router.enable_disassembler_mode(false);
        let opcode = router.read(self.registers.pc);
        router.enable_disassembler_mode(disassembling);

        self.registers.pc = self.registers.pc.wrapping_add(1);
        opcode
    }

    pub(crate) fn eat_pc_byte(&mut self, router: &AddressRouter) -> u8 {
        let byte = router.read(self.registers.pc);
        self.registers.pc = self.registers.pc.wrapping_add(1);
        byte
    }

    pub(crate) fn eat_pc_word(&mut self, router: &AddressRouter) -> u16 {
        let low = self.eat_pc_byte(router);
        let high = self.eat_pc_byte(router);
        u16::from_le_bytes([low, high])
    }

    /// Resolves a memory operand to its address, consuming immediates.
    fn address_of(&mut self, router: &AddressRouter, destination: Destination) -> u16 {
        match destination {
            Destination::AddressBC => self.registers.bc(),
            Destination::AddressDE => self.registers.de(),
            Destination::AddressHL => self.registers.hl(),
            Destination::AddressSP => self.registers.sp,
            Destination::AddressNn | Destination::AddressNnWord => self.eat_pc_word(router),
            Destination::HighPageByte => 0xff00 | self.eat_pc_byte(router) as u16,
            Destination::HighPageC => 0xff00 | self.registers.c as u16,
            _ => panic!("{} is not a memory operand", destination),
        }
    }

    pub(crate) fn read8(&mut self, router: &AddressRouter, source: Destination) -> u8 {
        if source.requires_16_bits() {
            panic!("8-bit read from 16-bit operand {}", source);
        }

        match source {
            Destination::A => self.registers.a,
            Destination::F => self.registers.f.bits(),
            Destination::B => self.registers.b,
            Destination::C => self.registers.c,
            Destination::D => self.registers.d,
            Destination::E => self.registers.e,
            Destination::H => self.registers.h,
            Destination::L => self.registers.l,
            Destination::EatPcByte => self.eat_pc_byte(router),
            _ => {
                let addr = self.address_of(router, source);
                router.read(addr)
            }
        }
    }

    pub(crate) fn write8(&mut self, router: &mut AddressRouter, target: Destination, value: u8) {
        if target.requires_16_bits() {
            panic!("8-bit write to 16-bit operand {}", target);
        }

        match target {
            Destination::A => self.registers.a = value,
            Destination::F => self.registers.f = Flags::from(value),
            Destination::B => self.registers.b = value,
            Destination::C => self.registers.c = value,
            Destination::D => self.registers.d = value,
            Destination::E => self.registers.e = value,
            Destination::H => self.registers.h = value,
            Destination::L => self.registers.l = value,
            Destination::EatPcByte => panic!("Cannot write through {}", target),
            _ => {
                let addr = self.address_of(router, target);
                router.write(addr, value);
            }
        }
    }

    pub(crate) fn read16(&mut self, router: &AddressRouter, source: Destination) -> u16 {
        match source {
            Destination::AF => self.registers.af(),
            Destination::BC => self.registers.bc(),
            Destination::DE => self.registers.de(),
            Destination::HL => self.registers.hl(),
            Destination::SP => self.registers.sp,
            Destination::PC => self.registers.pc,
            Destination::EatPcWord => self.eat_pc_word(router),
            _ => panic!("16-bit read from 8-bit operand {}", source),
        }
    }

    pub(crate) fn write16(&mut self, router: &mut AddressRouter, target: Destination, value: u16) {
        match target {
            Destination::AF => self.registers.set_af(value),
            Destination::BC => self.registers.set_bc(value),
            Destination::DE => self.registers.set_de(value),
            Destination::HL => self.registers.set_hl(value),
            Destination::SP => self.registers.sp = value,
            Destination::PC => self.registers.pc = value,
            Destination::AddressNnWord => {
                // Written byte by byte, the two halves may land on different owners
                let addr = self.eat_pc_word(router);
                let [low, high] = value.to_le_bytes();
                router.write(addr, low);
                router.write(addr.wrapping_add(1), high);
            }
            Destination::EatPcWord => panic!("Cannot write through {}", target),
            _ => panic!("16-bit write to 8-bit operand {}", target),
        }
    }

    pub(crate) fn push(&mut self, router: &mut AddressRouter, value: u16) {
        let [low, high] = value.to_le_bytes();
        self.registers.sp = self.registers.sp.wrapping_sub(1);
        router.write(self.registers.sp, high);
        self.registers.sp = self.registers.sp.wrapping_sub(1);
        router.write(self.registers.sp, low);
        self.check_stack_pointer();
    }

    pub(crate) fn pop(&mut self, router: &AddressRouter) -> u16 {
        self.check_stack_pointer();
        let low = router.read(self.registers.sp);
        self.registers.sp = self.registers.sp.wrapping_add(1);
        let high = router.read(self.registers.sp);
        self.registers.sp = self.registers.sp.wrapping_add(1);
        u16::from_le_bytes([low, high])
    }

    fn check_stack_pointer(&self) {
        let sp = self.registers.sp;
        if !(WORK_RAM_START..=WORK_RAM_END).contains(&sp) && !(HIGH_RAM_START..=HIGH_RAM_END).contains(&sp) {
            warn!("Stack pointer ${:04x} outside of work and high RAM", sp);
        }
    }

    pub(crate) fn jump(&mut self, target: u16) {
        if !self.disassembler_mode {
            self.registers.pc = target;
        }
    }

    pub(crate) fn request_halt(&mut self) {
        self.halt_next = true;
    }
}

impl InterruptExecutor for Cpu {
    fn interrupt_to_pc(&mut self, vector: u16) {
        // HALT directly before the interrupt is consumed by it
        self.halt_next = false;
        self.pending_interrupt = Some(vector);
    }
}

impl std::fmt::Display for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "A: ${:02x}  F: ${:02x}  B: ${:02x}  C: ${:02x}  D: ${:02x}  E: ${:02x}  H: ${:02x}  L: ${:02x}  SP: ${:04x}  PC: ${:04x}",
            self.registers.a,
            self.registers.f.bits(),
            self.registers.b,
            self.registers.c,
            self.registers.d,
            self.registers.e,
            self.registers.h,
            self.registers.l,
            self.registers.sp,
            self.registers.pc
        )
    }
}
