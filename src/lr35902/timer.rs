use crate::lr35902::irq::InterruptHandler;
use crate::memory::addressable::Addressable;
use crate::memory::registers::InterruptFlags;
use crate::memory::{DIV_REGISTER, TAC_REGISTER, TIMA_REGISTER, TMA_REGISTER};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TimerState {
    pub div: u8,
    pub tima: u8,
    pub tma: u8,
    pub tac: u8,
}

pub struct Timer {
    div_counter: u16,
    cycles: usize,
    tima: u8,
    tma: u8,
    tac: u8,
}

impl Timer {
    pub fn new() -> Timer {
        Timer {
            div_counter: 0,
            cycles: 0,
            tima: 0,
            tma: 0,
            tac: 0,
        }
    }

    pub fn advance(&mut self, cycles: usize, interrupts: &mut dyn InterruptHandler) {
        self.div_counter = self.div_counter.wrapping_add(cycles as u16);

        if self.tac & 0b100 == 0 {
            return;
        }

        self.cycles += cycles;

        let period = self.period();
        while self.cycles >= period {
            self.cycles -= period;
            if self.tima == 0xff {
                self.tima = self.tma;
                interrupts.request_interrupt(InterruptFlags::TIMER);
            } else {
                self.tima += 1;
            }
        }
    }

    #[inline]
    fn period(&self) -> usize {
        match self.tac & 0b11 {
            0b00 => 1024,
            0b01 => 16,
            0b10 => 64,
            _ => 256,
        }
    }

    #[inline]
    pub fn div(&self) -> u8 {
        (self.div_counter >> 8) as u8
    }

    pub fn state(&self) -> TimerState {
        TimerState {
            div: self.div(),
            tima: self.tima,
            tma: self.tma,
            tac: self.tac,
        }
    }

    pub fn set_state(&mut self, state: &TimerState) {
        self.div_counter = (state.div as u16) << 8;
        self.cycles = 0;
        self.tima = state.tima;
        self.tma = state.tma;
        self.tac = state.tac & 0b111;
    }

    /// Loads the divider directly; only the post-boot setup needs this since
    /// CPU writes to DIV always reset it.
    pub fn set_div(&mut self, div: u8) {
        self.div_counter = (div as u16) << 8;
    }
}

impl Addressable for Timer {
    fn read(&self, addr: u16) -> u8 {
        match addr {
            DIV_REGISTER => self.div(),
            TIMA_REGISTER => self.tima,
            TMA_REGISTER => self.tma,
            TAC_REGISTER => 0b1111_1000 | self.tac,
            _ => panic!("Timer does not own ${:04x}", addr),
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            // Any write resets the divider regardless of the value
            DIV_REGISTER => self.div_counter = 0,
            TIMA_REGISTER => self.tima = data,
            TMA_REGISTER => self.tma = data,
            TAC_REGISTER => {
                if self.tac & 0b11 != data & 0b11 {
                    self.cycles = 0;
                }
                self.tac = data & 0b111;
            }
            _ => panic!("Timer does not own ${:04x}", addr),
        }
    }
}
