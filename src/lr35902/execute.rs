use crate::lr35902::alu;
use crate::lr35902::command::{Command, Condition, Operation};
use crate::lr35902::cpu::Cpu;
use crate::lr35902::destination::Destination;
use crate::lr35902::registers::Flags;
use crate::memory::router::AddressRouter;
use log::warn;

impl Cpu {
    /// Runs one decoded command. Returns whether a conditional branch was taken.
    pub(super) fn execute(&mut self, router: &mut AddressRouter, command: &Command) -> bool {
        match command.operation {
            Operation::Nop => {}
            Operation::Load { to, from } => {
                if to.requires_16_bits() {
                    let value = self.read16(router, from);
                    self.write16(router, to, value);
                } else {
                    let value = self.read8(router, from);
                    self.write8(router, to, value);
                }
            }
            Operation::LoadHlIncrement { store } => {
                self.load_hl_indirect(router, store);
                let hl = self.registers().hl().wrapping_add(1);
                self.registers_mut().set_hl(hl);
            }
            Operation::LoadHlDecrement { store } => {
                self.load_hl_indirect(router, store);
                let hl = self.registers().hl().wrapping_sub(1);
                self.registers_mut().set_hl(hl);
            }
            Operation::LoadHlSpOffset => {
                let offset = self.eat_pc_byte(router);
                let value = alu::offset_sp(self.registers_mut(), offset);
                self.registers_mut().set_hl(value);
            }
            Operation::Increment(target) => {
                if target.requires_16_bits() {
                    let value = self.read16(router, target).wrapping_add(1);
                    self.write16(router, target, value);
                } else {
                    let value = self.read8(router, target);
                    let result = alu::increment(self.registers_mut(), value);
                    self.write8(router, target, result);
                }
            }
            Operation::Decrement(target) => {
                if target.requires_16_bits() {
                    let value = self.read16(router, target).wrapping_sub(1);
                    self.write16(router, target, value);
                } else {
                    let value = self.read8(router, target);
                    let result = alu::decrement(self.registers_mut(), value);
                    self.write8(router, target, result);
                }
            }
            Operation::Alu(op, source) => {
                let value = self.read8(router, source);
                alu::accumulate(self.registers_mut(), op, value);
            }
            Operation::AddHl(source) => {
                let value = self.read16(router, source);
                alu::add_hl(self.registers_mut(), value);
            }
            Operation::AddSp => {
                let offset = self.eat_pc_byte(router);
                let value = alu::offset_sp(self.registers_mut(), offset);
                self.registers_mut().sp = value;
            }
            Operation::RotateA(op) => alu::rotate_a(self.registers_mut(), op),
            Operation::Jump(condition) => {
                let target = self.eat_pc_word(router);
                if !self.condition_met(condition) {
                    return false;
                }
                self.jump(target);
            }
            Operation::JumpHl => {
                let target = self.registers().hl();
                self.jump(target);
            }
            Operation::JumpRelative(condition) => {
                let offset = self.eat_pc_byte(router) as i8;
                if !self.condition_met(condition) {
                    return false;
                }
                let target = self.registers().pc.wrapping_add(offset as i16 as u16);
                self.jump(target);
            }
            Operation::Call(condition) => {
                let target = self.eat_pc_word(router);
                if !self.condition_met(condition) {
                    return false;
                }
                self.call(router, target);
            }
            Operation::Return(condition) => {
                if !self.condition_met(condition) {
                    return false;
                }
                self.ret(router);
            }
            Operation::ReturnInterrupt => {
                self.ret(router);
                router.interrupts.enable_interrupts_immediately();
            }
            Operation::Restart(vector) => self.call(router, vector as u16),
            Operation::Push(source) => {
                let value = self.read16(router, source);
                self.push(router, value);
            }
            Operation::Pop(target) => {
                let value = self.pop(router);
                self.write16(router, target, value);
            }
            Operation::Halt => self.request_halt(),
            Operation::Stop => {
                let next = self.eat_pc_byte(router);
                if next != 0x00 {
                    warn!("STOP followed by ${:02x} instead of NOP", next);
                }
                warn!("STOP is not emulated, continuing");
            }
            Operation::Di => router.interrupts.disable_interrupts(),
            Operation::Ei => router.interrupts.enable_interrupts(),
            Operation::Cpl => alu::cpl(self.registers_mut()),
            Operation::Ccf => alu::ccf(self.registers_mut()),
            Operation::Scf => alu::scf(self.registers_mut()),
            Operation::Daa => alu::daa(self.registers_mut()),
            Operation::Cb(op, target) => {
                let value = self.read8(router, target);
                if let Some(result) = alu::cb(self.registers_mut(), op, value) {
                    self.write8(router, target, result);
                }
            }
            Operation::Prefix => panic!("$cb prefix reached execution without its second byte"),
            Operation::Unimplemented => panic!("Unimplemented opcode ${:02x}\n{}", command.opcode, self),
        }

        true
    }

    fn load_hl_indirect(&mut self, router: &mut AddressRouter, store: bool) {
        if store {
            let value = self.registers().a;
            self.write8(router, Destination::AddressHL, value);
        } else {
            let value = self.read8(router, Destination::AddressHL);
            self.registers_mut().a = value;
        }
    }

    fn condition_met(&self, condition: Condition) -> bool {
        let registers = self.registers();
        match condition {
            Condition::Always => true,
            Condition::NotZero => !registers.flag(Flags::ZERO),
            Condition::Zero => registers.flag(Flags::ZERO),
            Condition::NotCarry => !registers.flag(Flags::CARRY),
            Condition::Carry => registers.flag(Flags::CARRY),
        }
    }

    fn call(&mut self, router: &mut AddressRouter, target: u16) {
        let pc = self.registers().pc;
        self.push(router, pc);
        self.jump(target);
    }

    fn ret(&mut self, router: &mut AddressRouter) {
        let target = self.pop(router);
        self.jump(target);
    }
}
