use crate::memory::addressable::Addressable;
use crate::memory::registers::InterruptFlags;
use crate::memory::{INTERRUPT_ENABLE_REGISTER, INTERRUPT_FLAGS_REGISTER};
use log::{trace, warn};

/// EI and DI take effect after this many calls to [`InterruptController::advance`].
pub const INTERRUPTS_ENABLE_DISABLE_LOOPS: i32 = 2;

/// Anything that can raise an interrupt request.
pub trait InterruptHandler {
    fn request_interrupt(&mut self, interrupt: InterruptFlags);
}

/// Receives the restart address of a serviced interrupt.
pub trait InterruptExecutor {
    fn interrupt_to_pc(&mut self, vector: u16);
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InterruptState {
    pub interrupts_enabled: bool,
    pub interrupt_request: u8,
    pub interrupt_enabled_flags: u8,
    pub disable_loops: i32,
    pub enable_loops: i32,
    pub is_halted: bool,
}

pub struct InterruptController {
    ime: bool,
    request: InterruptFlags,
    enabled: InterruptFlags,
    disable_loops: i32,
    enable_loops: i32,
    halted: bool,
}

impl InterruptController {
    pub fn new() -> InterruptController {
        InterruptController {
            ime: false,
            request: InterruptFlags::empty(),
            enabled: InterruptFlags::empty(),
            disable_loops: 0,
            enable_loops: 0,
            halted: false,
        }
    }

    /// Services at most one pending interrupt, highest priority first.
    pub fn handle_interrupt_request(&mut self, executor: &mut dyn InterruptExecutor) {
        if !self.ime {
            return;
        }

        let handleable = self.request & self.enabled;
        let Some(interrupt) = InterruptFlags::PRIORITY
            .into_iter()
            .find(|interrupt| handleable.contains(*interrupt))
        else {
            return;
        };

        self.request.remove(interrupt);
        // Must be re-enabled by EI or RETI
        self.ime = false;

        if let Some(vector) = interrupt.to_vector() {
            trace!("Servicing {} interrupt at ${:04x}", interrupt, vector);
            executor.interrupt_to_pc(vector);
        }
    }

    pub fn advance(&mut self, _cycles: usize) {
        if self.disable_loops > 0 {
            if self.disable_loops == 1 {
                self.ime = false;
            }
            self.disable_loops -= 1;
        }
        if self.enable_loops > 0 {
            if self.enable_loops == 1 {
                self.ime = true;
            }
            self.enable_loops -= 1;
        }
    }

    pub fn disable_interrupts(&mut self) {
        self.disable_loops = INTERRUPTS_ENABLE_DISABLE_LOOPS;
        self.enable_loops = 0;
    }

    pub fn enable_interrupts(&mut self) {
        self.enable_loops = INTERRUPTS_ENABLE_DISABLE_LOOPS;
        self.disable_loops = 0;
    }

    /// RETI path, takes effect without the EI delay.
    pub fn enable_interrupts_immediately(&mut self) {
        self.ime = true;
        self.enable_loops = 0;
        self.disable_loops = 0;
    }

    #[inline]
    pub fn interrupts_enabled(&self) -> bool {
        self.ime
    }

    /// Halts until an enabled interrupt is requested. Unlike a plain halt flag, an enabled
    /// request that is already pending keeps the CPU running instead of sleeping through it.
    pub fn halt_until_interrupt(&mut self) {
        self.halted = (self.request & self.enabled).is_empty();
    }

    #[inline]
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    #[inline]
    pub fn interrupt_request(&self) -> InterruptFlags {
        self.request
    }

    #[inline]
    pub fn interrupt_enabled_flags(&self) -> InterruptFlags {
        self.enabled
    }

    pub fn state(&self) -> InterruptState {
        InterruptState {
            interrupts_enabled: self.ime,
            interrupt_request: self.request.bits(),
            interrupt_enabled_flags: self.enabled.bits(),
            disable_loops: self.disable_loops,
            enable_loops: self.enable_loops,
            is_halted: self.halted,
        }
    }

    pub fn set_state(&mut self, state: &InterruptState) {
        self.ime = state.interrupts_enabled;
        self.request = InterruptFlags::from(state.interrupt_request);
        self.enabled = InterruptFlags::from(state.interrupt_enabled_flags);
        self.disable_loops = state.disable_loops;
        self.enable_loops = state.enable_loops;
        self.halted = state.is_halted;
    }
}

impl InterruptHandler for InterruptController {
    fn request_interrupt(&mut self, interrupt: InterruptFlags) {
        // An enabled request wakes the CPU even while IME is off
        if self.enabled.intersects(interrupt) {
            self.halted = false;
        }
        self.request |= interrupt;
    }
}

impl Addressable for InterruptController {
    fn read(&self, addr: u16) -> u8 {
        match addr {
            // Upper three bits of IF are unused and read back as set
            INTERRUPT_FLAGS_REGISTER => self.request.bits() | 0b1110_0000,
            INTERRUPT_ENABLE_REGISTER => self.enabled.bits(),
            _ => panic!("Interrupt controller does not own ${:04x}", addr),
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            INTERRUPT_FLAGS_REGISTER => self.request = InterruptFlags::from(data),
            INTERRUPT_ENABLE_REGISTER => {
                if data & 0b1110_0000 != 0 {
                    warn!("Unused interrupt enable bits set: {:08b}", data);
                }
                self.enabled = InterruptFlags::from(data);
            }
            _ => panic!("Interrupt controller does not own ${:04x}", addr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingExecutor {
        vectors: Vec<u16>,
    }

    impl InterruptExecutor for RecordingExecutor {
        fn interrupt_to_pc(&mut self, vector: u16) {
            self.vectors.push(vector);
        }
    }

    fn enabled_controller() -> InterruptController {
        let mut controller = InterruptController::new();
        controller.enable_interrupts_immediately();
        controller.write(INTERRUPT_ENABLE_REGISTER, 0x1f);
        controller
    }

    #[test]
    fn services_one_interrupt_per_call_in_priority_order() {
        let mut controller = enabled_controller();
        let mut executor = RecordingExecutor::default();
        controller.request_interrupt(InterruptFlags::TIMER);
        controller.request_interrupt(InterruptFlags::VBLANK);

        controller.handle_interrupt_request(&mut executor);
        assert_eq!(executor.vectors, vec![0x40]);
        assert!(!controller.interrupts_enabled());

        controller.enable_interrupts_immediately();
        controller.handle_interrupt_request(&mut executor);
        assert_eq!(executor.vectors, vec![0x40, 0x50]);

        controller.enable_interrupts_immediately();
        controller.handle_interrupt_request(&mut executor);
        assert_eq!(executor.vectors, vec![0x40, 0x50]);
    }

    #[test]
    fn disabled_ime_services_nothing() {
        let mut controller = enabled_controller();
        let mut executor = RecordingExecutor::default();
        controller.disable_interrupts();
        controller.advance(4);
        controller.advance(4);
        controller.request_interrupt(InterruptFlags::VBLANK);

        controller.handle_interrupt_request(&mut executor);
        assert!(executor.vectors.is_empty());
        assert!(controller.interrupt_request().contains(InterruptFlags::VBLANK));
    }

    #[test]
    fn disable_takes_two_advances() {
        let mut controller = enabled_controller();
        controller.disable_interrupts();

        controller.advance(4);
        assert!(controller.interrupts_enabled(), "still enabled after the first advance");
        controller.advance(4);
        assert!(!controller.interrupts_enabled(), "disabled after the second advance");
    }

    #[test]
    fn enable_takes_two_advances_and_cancels_disable() {
        let mut controller = InterruptController::new();
        controller.disable_interrupts();
        controller.enable_interrupts();

        controller.advance(4);
        assert!(!controller.interrupts_enabled());
        controller.advance(4);
        assert!(controller.interrupts_enabled());
        controller.advance(4);
        assert!(controller.interrupts_enabled());
    }

    #[test]
    fn enabled_request_wakes_halted_cpu() {
        let mut controller = InterruptController::new();
        controller.write(INTERRUPT_ENABLE_REGISTER, InterruptFlags::TIMER.bits());
        controller.halt_until_interrupt();

        controller.request_interrupt(InterruptFlags::VBLANK);
        assert!(controller.is_halted(), "VBlank is not enabled");

        controller.request_interrupt(InterruptFlags::TIMER);
        assert!(!controller.is_halted());
    }

    #[test]
    fn pending_request_prevents_halt() {
        let mut controller = InterruptController::new();
        controller.write(INTERRUPT_ENABLE_REGISTER, InterruptFlags::TIMER.bits());
        controller.request_interrupt(InterruptFlags::TIMER);

        controller.halt_until_interrupt();
        assert!(!controller.is_halted());
    }
}
