#[cfg(test)]
mod tests {
    use crate::gameboy::{System, SystemConfig};
    use crate::lr35902::irq::InterruptHandler;
    use crate::lr35902::registers::Flags;
    use crate::memory::addressable::Addressable;
    use crate::memory::mapper::header::rom_with_header;
    use crate::memory::mmu::DISASSEMBLER_FILL_BYTE;
    use crate::memory::registers::InterruptFlags;
    use crate::memory::{INTERRUPT_ENABLE_REGISTER, INTERRUPT_FLAGS_REGISTER, SERIAL_CONTROL_REGISTER};

    const PROGRAM_START: u16 = 0x0150;

    fn system_with_program(program: &[u8]) -> System {
        let mut rom = rom_with_header(0x00, 0x00, 0x00);
        let start = PROGRAM_START as usize;
        rom[start..start + program.len()].copy_from_slice(program);

        let mut system = System::new(rom, SystemConfig::default()).unwrap();
        system.cpu_mut().registers_mut().pc = PROGRAM_START;
        system
    }

    fn bcd(value: u8) -> u8 {
        (value / 10) << 4 | value % 10
    }

    #[test]
    fn post_boot_registers() {
        let system = System::new(rom_with_header(0x00, 0x00, 0x00), SystemConfig::default()).unwrap();
        let registers = system.cpu().registers();

        assert_eq!(registers.af(), 0x01b0);
        assert_eq!(registers.bc(), 0x0013);
        assert_eq!(registers.de(), 0x00d8);
        assert_eq!(registers.hl(), 0x014d);
        assert_eq!(registers.sp, 0xfffe);
        assert_eq!(registers.pc, 0x0100);
    }

    #[test]
    fn cycle_count_restarts_at_cartridge_entry() {
        let mut system = System::new(rom_with_header(0x00, 0x00, 0x00), SystemConfig::default()).unwrap();
        assert_eq!(system.step(), 4);
        assert_eq!(system.cpu().cycles(), 4);
    }

    #[test]
    fn accumulator_rotates_never_set_zero() {
        // RLCA, RLC B
        let mut system = system_with_program(&[0x07, 0xcb, 0x00]);
        system.cpu_mut().registers_mut().a = 0x00;
        system.cpu_mut().registers_mut().b = 0x00;

        assert_eq!(system.step(), 4);
        let registers = system.cpu().registers();
        assert!(!registers.flag(Flags::ZERO), "RLCA must clear Z");
        assert!(!registers.flag(Flags::CARRY), "RLCA of 0 must not carry");

        assert_eq!(system.step(), 8);
        assert!(system.cpu().registers().flag(Flags::ZERO), "RLC B must set Z");
    }

    #[test]
    fn add_hl_carries_from_bits_11_and_15() {
        // ADD HL,BC ; ADD HL,HL
        let mut system = system_with_program(&[0x09, 0x29]);
        let registers = system.cpu_mut().registers_mut();
        registers.set_hl(0x8a23);
        registers.set_bc(0x0605);
        registers.set_flag(Flags::ZERO, true);

        assert_eq!(system.step(), 8);
        let registers = system.cpu().registers();
        assert_eq!(registers.hl(), 0x9028);
        assert!(registers.flag(Flags::HALF_CARRY));
        assert!(!registers.flag(Flags::CARRY));
        assert!(registers.flag(Flags::ZERO), "Z is untouched");

        system.cpu_mut().registers_mut().set_hl(0x8a23);
        system.step();
        let registers = system.cpu().registers();
        assert_eq!(registers.hl(), 0x1446);
        assert!(registers.flag(Flags::HALF_CARRY));
        assert!(registers.flag(Flags::CARRY));
    }

    #[test]
    fn daa_corrects_every_bcd_sum_and_difference() {
        // ADD A,B ; DAA ; SUB B ; DAA
        let mut system = system_with_program(&[0x80, 0x27, 0x90, 0x27]);

        for a in 0..100u8 {
            for b in 0..100u8 {
                let registers = system.cpu_mut().registers_mut();
                registers.a = bcd(a);
                registers.b = bcd(b);
                registers.f = Flags::empty();
                registers.pc = PROGRAM_START;
                system.step();
                system.step();

                let registers = system.cpu().registers();
                let sum = a as u16 + b as u16;
                assert_eq!(registers.a, bcd((sum % 100) as u8), "{} + {}", a, b);
                assert_eq!(registers.flag(Flags::CARRY), sum >= 100, "carry of {} + {}", a, b);

                let registers = system.cpu_mut().registers_mut();
                registers.a = bcd(a);
                registers.f = Flags::empty();
                system.step();
                system.step();

                let registers = system.cpu().registers();
                let difference = (a as i16 - b as i16).rem_euclid(100) as u8;
                assert_eq!(registers.a, bcd(difference), "{} - {}", a, b);
                assert_eq!(registers.flag(Flags::CARRY), a < b, "borrow of {} - {}", a, b);
            }
        }
    }

    #[test]
    fn call_pushes_the_next_instruction_and_ret_returns_to_it() {
        let mut program = vec![0u8; 0x20];
        // CALL $0160
        program[..3].copy_from_slice(&[0xcd, 0x60, 0x01]);
        // RET
        program[0x10] = 0xc9;
        let mut system = system_with_program(&program);

        assert_eq!(system.step(), 24);
        assert_eq!(system.cpu().registers().pc, 0x0160);
        assert_eq!(system.cpu().registers().sp, 0xfffc);
        assert_eq!(system.router().read_word(0xfffc), 0x0153);

        assert_eq!(system.step(), 16);
        assert_eq!(system.cpu().registers().pc, 0x0153);
        assert_eq!(system.cpu().registers().sp, 0xfffe);
    }

    #[test]
    fn conditional_ret_costs_less_when_not_taken() {
        // RET NZ
        let mut system = system_with_program(&[0xc0]);
        system.cpu_mut().registers_mut().set_flag(Flags::ZERO, true);
        assert_eq!(system.step(), 8);
        assert_eq!(system.cpu().registers().pc, PROGRAM_START + 1);

        system.cpu_mut().registers_mut().pc = PROGRAM_START;
        system.cpu_mut().registers_mut().set_flag(Flags::ZERO, false);
        system.cpu_mut().registers_mut().sp = 0xc000;
        system.router_mut().write_word(0xc000, 0x1234);
        assert_eq!(system.step(), 20);
        assert_eq!(system.cpu().registers().pc, 0x1234);
    }

    #[test]
    fn relative_jumps_are_signed() {
        // JR -2 loops on itself
        let mut system = system_with_program(&[0x18, 0xfe]);
        assert_eq!(system.step(), 12);
        assert_eq!(system.cpu().registers().pc, PROGRAM_START);
    }

    #[test]
    fn pop_af_drops_the_low_nibble() {
        // PUSH BC ; POP AF
        let mut system = system_with_program(&[0xc5, 0xf1]);
        system.cpu_mut().registers_mut().set_bc(0x12ff);

        assert_eq!(system.step(), 16);
        assert_eq!(system.step(), 12);
        assert_eq!(system.cpu().registers().af(), 0x12f0);
    }

    #[test]
    fn hl_increment_and_sp_store() {
        // LD (HL+),A ; LD (nn),SP
        let mut system = system_with_program(&[0x22, 0x08, 0x00, 0xc1]);
        system.cpu_mut().registers_mut().set_hl(0xc000);
        system.cpu_mut().registers_mut().a = 0x42;

        assert_eq!(system.step(), 8);
        assert_eq!(system.router().read(0xc000), 0x42);
        assert_eq!(system.cpu().registers().hl(), 0xc001);

        assert_eq!(system.step(), 20);
        assert_eq!(system.router().read_word(0xc100), 0xfffe);
    }

    #[test]
    fn ei_takes_effect_after_the_next_instruction() {
        // EI ; NOP ; NOP
        let mut system = system_with_program(&[0xfb, 0x00, 0x00]);
        system.router_mut().write(INTERRUPT_ENABLE_REGISTER, InterruptFlags::TIMER.bits());
        system.router_mut().write(INTERRUPT_FLAGS_REGISTER, InterruptFlags::TIMER.bits());

        system.step();
        assert_eq!(system.cpu().registers().pc, PROGRAM_START + 1, "EI alone does not enable");

        system.step();
        assert_eq!(system.cpu().registers().pc, 0x0050);
        assert_eq!(system.router().read_word(0xfffc), PROGRAM_START + 2);
        assert!(!system.router().interrupts.interrupts_enabled());
    }

    #[test]
    fn reti_enables_interrupts_immediately() {
        // RETI
        let mut system = system_with_program(&[0xd9]);
        system.cpu_mut().registers_mut().sp = 0xc000;
        system.router_mut().write_word(0xc000, 0x0200);

        system.step();
        assert_eq!(system.cpu().registers().pc, 0x0200);
        assert!(system.router().interrupts.interrupts_enabled());
    }

    #[test]
    fn halt_waits_for_an_enabled_interrupt() {
        // HALT ; NOP
        let mut system = system_with_program(&[0x76, 0x00]);
        system.router_mut().write(INTERRUPT_ENABLE_REGISTER, InterruptFlags::TIMER.bits());
        system.router_mut().write(INTERRUPT_FLAGS_REGISTER, 0x00);

        system.step();
        for _ in 0..10 {
            system.step();
            assert_eq!(system.cpu().registers().pc, PROGRAM_START + 1);
        }
        assert!(system.router().interrupts.is_halted());

        system.router_mut().interrupts.request_interrupt(InterruptFlags::TIMER);
        system.step();
        assert_eq!(system.cpu().registers().pc, PROGRAM_START + 2, "IME is off, execution simply resumes");
    }

    #[test]
    fn stop_consumes_its_operand() {
        let mut system = system_with_program(&[0x10, 0x00]);
        assert_eq!(system.step(), 4);
        assert_eq!(system.cpu().registers().pc, PROGRAM_START + 2);
    }

    #[test]
    #[should_panic(expected = "Unimplemented opcode $d3")]
    fn reserved_opcodes_are_fatal() {
        let mut system = system_with_program(&[0xd3]);
        system.step();
    }

    #[test]
    fn disassembler_mode_walks_past_jumps() {
        // JP $2000 ; LD A,$55
        let mut system = system_with_program(&[0xc3, 0x00, 0x20, 0x3e, 0x55]);

        system.set_disassembler_mode(true);
        system.step();
        assert_eq!(system.cpu().registers().pc, PROGRAM_START + 3, "jump is not taken");

        system.step();
        assert_eq!(system.cpu().registers().a, DISASSEMBLER_FILL_BYTE, "operands read as filler");

        system.set_disassembler_mode(false);
        assert!(!system.router().is_disassembler_mode());
    }

    #[test]
    fn serial_transfer_reaches_output_and_requests_interrupt() {
        // LD A,'A' ; LDH ($01),A ; LD A,$81 ; LDH ($02),A
        let mut system = system_with_program(&[0x3e, b'A', 0xe0, 0x01, 0x3e, 0x81, 0xe0, 0x02]);
        system.router_mut().write(INTERRUPT_FLAGS_REGISTER, 0x00);
        for _ in 0..4 {
            system.step();
        }

        assert_eq!(system.serial_output(), "A");
        assert_eq!(system.router().read(SERIAL_CONTROL_REGISTER) & 0x80, 0);
        assert!(system.router().interrupts.interrupt_request().contains(InterruptFlags::SERIAL));
    }

    #[test]
    fn run_frame_stops_at_each_vblank() {
        // JR -2
        let mut system = system_with_program(&[0x18, 0xfe]);
        assert_eq!(system.run_frame().unwrap(), 1);
        assert_eq!(system.run_frame().unwrap(), 2);
        assert!(system.frame_count() >= 1);
    }

    #[test]
    fn states_survive_a_round_trip_through_a_slot() {
        let dir = tempfile::tempdir().unwrap();
        let mut rom = rom_with_header(0x00, 0x00, 0x00);
        rom[PROGRAM_START as usize..PROGRAM_START as usize + 2].copy_from_slice(&[0x18, 0xfe]);
        let config = SystemConfig {
            state_dir: Some(dir.path().to_path_buf()),
            ..SystemConfig::default()
        };
        let mut system = System::new(rom, config).unwrap();
        system.cpu_mut().registers_mut().pc = PROGRAM_START;
        system.router_mut().write(0xc123, 0x77);
        system.run_cycles(1000);

        let saved = system.snapshot();
        system.save_state(2).unwrap();
        assert!(dir.path().join("EDGE").join("2").join("state.bin").is_file());

        system.router_mut().write(0xc123, 0x00);
        system.cpu_mut().registers_mut().a = 0x99;
        system.load_state(2).unwrap();

        assert_eq!(system.router().read(0xc123), 0x77);
        assert_eq!(system.snapshot(), saved);
    }

    #[test]
    fn save_states_need_a_directory() {
        let mut system = system_with_program(&[0x00]);
        assert!(matches!(
            system.save_state(0),
            Err(crate::error::EdgeError::NoStateDirectory)
        ));
    }
}
