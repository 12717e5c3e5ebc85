use crate::error::{EdgeError, SaveStateMagicSnafu, SaveStateTruncatedSnafu, SaveStateVersionSnafu};
use crate::lr35902::cpu::CpuState;
use crate::lr35902::irq::InterruptState;
use crate::lr35902::registers::{Flags, Registers};
use crate::lr35902::timer::TimerState;
use crate::memory::mapper::rtc::RtcState;
use crate::memory::mapper::{CartridgeState, MapperState};
use crate::memory::mmu::MmuState;
use crate::memory::{HIGH_RAM_SIZE, WORK_RAM_SIZE};
use crate::state::{SAVE_STATE_MAGIC, SAVE_STATE_VERSION};
use crate::video::ppu::PpuState;
use crate::video::{OAM_SIZE, VIDEO_RAM_SIZE};
use snafu::ensure;

/// Everything needed to resume a machine, in file order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveState {
    pub cpu: CpuState,
    pub ppu: PpuState,
    pub timer: TimerState,
    pub cartridge: CartridgeState,
    pub interrupts: InterruptState,
    pub mmu: MmuState,
}

impl SaveState {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = StateWriter::default();
        writer.u32(SAVE_STATE_MAGIC);
        writer.u32(SAVE_STATE_VERSION);

        let registers = &self.cpu.registers;
        for byte in [
            registers.a,
            registers.f.bits(),
            registers.b,
            registers.c,
            registers.d,
            registers.e,
            registers.h,
            registers.l,
        ] {
            writer.u8(byte);
        }
        writer.u16(registers.sp);
        writer.u16(registers.pc);
        writer.bool(registers.flag(Flags::ZERO));
        writer.bool(registers.flag(Flags::HALF_CARRY));
        writer.bool(registers.flag(Flags::SUBTRACT));
        writer.bool(registers.flag(Flags::CARRY));
        writer.bool(self.cpu.halt_next);

        let ppu = &self.ppu;
        for byte in [
            ppu.lcdc, ppu.stat, ppu.scy, ppu.scx, ppu.ly, ppu.lyc, ppu.bgp, ppu.obp0, ppu.obp1, ppu.wy, ppu.wx,
        ] {
            writer.u8(byte);
        }
        writer.bytes(&ppu.vram);
        writer.bytes(&ppu.oam);

        writer.u8(self.timer.div);
        writer.u8(self.timer.tima);
        writer.u8(self.timer.tma);
        writer.u8(self.timer.tac);

        let rtc = &self.cartridge.rtc;
        writer.i64(rtc.previous_session_duration);
        writer.i64(rtc.session_start_time);
        writer.bool(rtc.has_override);
        writer.i64(rtc.current_time_override);
        writer.u8(rtc.latch_register);
        writer.bool(rtc.latched);
        writer.i64(rtc.latched_time);
        writer.bool(rtc.halted);
        let mapper = &self.cartridge.mapper;
        writer.u8(mapper.rom_bank);
        writer.u8(mapper.ram_select);
        writer.bool(mapper.ram_enabled);
        writer.u8(mapper.banking_mode);
        writer.u32(self.cartridge.ram.len() as u32);
        writer.bytes(&self.cartridge.ram);

        let interrupts = &self.interrupts;
        writer.bool(interrupts.interrupts_enabled);
        writer.u8(interrupts.interrupt_request);
        writer.u8(interrupts.interrupt_enabled_flags);
        writer.i32(interrupts.disable_loops);
        writer.i32(interrupts.enable_loops);
        writer.bool(interrupts.is_halted);

        writer.bool(self.mmu.overlay_boot_rom);
        writer.bytes(&self.mmu.work_ram);
        writer.bytes(&self.mmu.high_ram);

        writer.data
    }

    /// Parses a state written by [`SaveState::to_bytes`]. The magic and version must match exactly.
    pub fn from_bytes(data: &[u8]) -> Result<SaveState, EdgeError> {
        let mut reader = StateReader::new(data);

        let magic = reader.u32()?;
        ensure!(magic == SAVE_STATE_MAGIC, SaveStateMagicSnafu { found: magic });
        let version = reader.u32()?;
        ensure!(version == SAVE_STATE_VERSION, SaveStateVersionSnafu { found: version });

        let mut registers = Registers {
            a: reader.u8()?,
            f: Flags::from(reader.u8()?),
            b: reader.u8()?,
            c: reader.u8()?,
            d: reader.u8()?,
            e: reader.u8()?,
            h: reader.u8()?,
            l: reader.u8()?,
            sp: reader.u16()?,
            pc: reader.u16()?,
        };
        // The separate flag bytes win over F
        registers.set_flag(Flags::ZERO, reader.bool()?);
        registers.set_flag(Flags::HALF_CARRY, reader.bool()?);
        registers.set_flag(Flags::SUBTRACT, reader.bool()?);
        registers.set_flag(Flags::CARRY, reader.bool()?);
        let cpu = CpuState {
            registers,
            halt_next: reader.bool()?,
        };

        let ppu = PpuState {
            lcdc: reader.u8()?,
            stat: reader.u8()?,
            scy: reader.u8()?,
            scx: reader.u8()?,
            ly: reader.u8()?,
            lyc: reader.u8()?,
            bgp: reader.u8()?,
            obp0: reader.u8()?,
            obp1: reader.u8()?,
            wy: reader.u8()?,
            wx: reader.u8()?,
            vram: reader.bytes(VIDEO_RAM_SIZE)?,
            oam: reader.bytes(OAM_SIZE)?,
        };

        let timer = TimerState {
            div: reader.u8()?,
            tima: reader.u8()?,
            tma: reader.u8()?,
            tac: reader.u8()?,
        };

        let rtc = RtcState {
            previous_session_duration: reader.i64()?,
            session_start_time: reader.i64()?,
            has_override: reader.bool()?,
            current_time_override: reader.i64()?,
            latch_register: reader.u8()?,
            latched: reader.bool()?,
            latched_time: reader.i64()?,
            halted: reader.bool()?,
        };
        let mapper = MapperState {
            rom_bank: reader.u8()?,
            ram_select: reader.u8()?,
            ram_enabled: reader.bool()?,
            banking_mode: reader.u8()?,
        };
        let ram_size = reader.u32()? as usize;
        let cartridge = CartridgeState {
            rtc,
            mapper,
            ram: reader.bytes(ram_size)?,
        };

        let interrupts = InterruptState {
            interrupts_enabled: reader.bool()?,
            interrupt_request: reader.u8()?,
            interrupt_enabled_flags: reader.u8()?,
            disable_loops: reader.i32()?,
            enable_loops: reader.i32()?,
            is_halted: reader.bool()?,
        };

        let mmu = MmuState {
            overlay_boot_rom: reader.bool()?,
            work_ram: reader.bytes(WORK_RAM_SIZE)?,
            high_ram: reader.bytes(HIGH_RAM_SIZE)?,
        };

        Ok(SaveState {
            cpu,
            ppu,
            timer,
            cartridge,
            interrupts,
            mmu,
        })
    }
}

#[derive(Default)]
struct StateWriter {
    data: Vec<u8>,
}

impl StateWriter {
    fn u8(&mut self, value: u8) {
        self.data.push(value);
    }

    fn bool(&mut self, value: bool) {
        self.data.push(value as u8);
    }

    fn u16(&mut self, value: u16) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    fn u32(&mut self, value: u32) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    fn i32(&mut self, value: i32) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    fn i64(&mut self, value: i64) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    fn bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }
}

struct StateReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> StateReader<'a> {
    fn new(data: &'a [u8]) -> StateReader<'a> {
        StateReader { data, position: 0 }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], EdgeError> {
        let mut bytes = [0; N];
        bytes.copy_from_slice(self.slice(N)?);
        Ok(bytes)
    }

    fn slice(&mut self, length: usize) -> Result<&'a [u8], EdgeError> {
        let remaining = self.data.len() - self.position;
        ensure!(
            length <= remaining,
            SaveStateTruncatedSnafu {
                needed: length,
                remaining
            }
        );

        let slice = &self.data[self.position..self.position + length];
        self.position += length;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, EdgeError> {
        Ok(self.take::<1>()?[0])
    }

    fn bool(&mut self) -> Result<bool, EdgeError> {
        Ok(self.u8()? != 0)
    }

    fn u16(&mut self) -> Result<u16, EdgeError> {
        Ok(u16::from_le_bytes(self.take()?))
    }

    fn u32(&mut self) -> Result<u32, EdgeError> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    fn i32(&mut self) -> Result<i32, EdgeError> {
        Ok(i32::from_le_bytes(self.take()?))
    }

    fn i64(&mut self) -> Result<i64, EdgeError> {
        Ok(i64::from_le_bytes(self.take()?))
    }

    fn bytes(&mut self, length: usize) -> Result<Vec<u8>, EdgeError> {
        Ok(self.slice(length)?.to_vec())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_state() -> SaveState {
        let mut registers = Registers {
            a: 0x12,
            b: 0x34,
            c: 0x56,
            d: 0x78,
            e: 0x9a,
            h: 0xbc,
            l: 0xde,
            sp: 0xfffe,
            pc: 0x0150,
            ..Registers::default()
        };
        registers.set_flags(true, false, true, false);

        SaveState {
            cpu: CpuState {
                registers,
                halt_next: true,
            },
            ppu: PpuState {
                lcdc: 0x91,
                stat: 0x85,
                scy: 1,
                scx: 2,
                ly: 3,
                lyc: 4,
                bgp: 0xfc,
                obp0: 0xe4,
                obp1: 0x1b,
                wy: 5,
                wx: 7,
                vram: (0..VIDEO_RAM_SIZE).map(|i| i as u8).collect(),
                oam: vec![0xaa; OAM_SIZE],
            },
            timer: TimerState {
                div: 0xab,
                tima: 1,
                tma: 2,
                tac: 0b101,
            },
            cartridge: CartridgeState {
                rtc: RtcState {
                    previous_session_duration: 86_400,
                    session_start_time: 1_700_000_000,
                    has_override: true,
                    current_time_override: -5,
                    latch_register: 1,
                    latched: true,
                    latched_time: 42,
                    halted: false,
                },
                mapper: MapperState {
                    rom_bank: 3,
                    ram_select: 1,
                    ram_enabled: true,
                    banking_mode: 1,
                },
                ram: vec![0x5a; 0x2000],
            },
            interrupts: InterruptState {
                interrupts_enabled: true,
                interrupt_request: 0x01,
                interrupt_enabled_flags: 0x1f,
                disable_loops: 0,
                enable_loops: 2,
                is_halted: false,
            },
            mmu: MmuState {
                overlay_boot_rom: false,
                work_ram: vec![0x11; WORK_RAM_SIZE],
                high_ram: vec![0x22; HIGH_RAM_SIZE],
            },
        }
    }

    #[test]
    fn bytes_parse_back_to_the_same_state() {
        let state = sample_state();
        let bytes = state.to_bytes();
        assert_eq!(SaveState::from_bytes(&bytes).unwrap(), state);
    }

    #[test]
    fn header_is_magic_then_version() {
        let bytes = sample_state().to_bytes();
        assert_eq!(&bytes[..4], b"EGDE");
        assert_eq!(&bytes[4..8], &[1, 0, 0, 0]);
        // CPU registers follow the header directly
        assert_eq!(&bytes[8..10], &[0x12, 0xa0]);
    }

    #[test]
    fn wrong_magic_or_version_is_rejected() {
        let mut bytes = sample_state().to_bytes();
        bytes[0] = 0;
        assert!(matches!(
            SaveState::from_bytes(&bytes),
            Err(EdgeError::SaveStateMagic { .. })
        ));

        let mut bytes = sample_state().to_bytes();
        bytes[4] = 2;
        assert!(matches!(
            SaveState::from_bytes(&bytes),
            Err(EdgeError::SaveStateVersion { found: 2 })
        ));
    }

    #[test]
    fn truncated_state_is_rejected() {
        let bytes = sample_state().to_bytes();
        let truncated = &bytes[..bytes.len() - 1];
        assert!(matches!(
            SaveState::from_bytes(truncated),
            Err(EdgeError::SaveStateTruncated {
                needed: HIGH_RAM_SIZE,
                remaining
            }) if remaining == HIGH_RAM_SIZE - 1
        ));
    }
}
