use log::debug;
use std::time::{SystemTime, UNIX_EPOCH};

pub const RTC_SECONDS_REGISTER: u8 = 0x08;
pub const RTC_MINUTES_REGISTER: u8 = 0x09;
pub const RTC_HOURS_REGISTER: u8 = 0x0a;
pub const RTC_DAYS_LOW_REGISTER: u8 = 0x0b;
pub const RTC_DAYS_HIGH_REGISTER: u8 = 0x0c;

const SECONDS_PER_DAY: i64 = 86400;
const DAY_COUNTER_LIMIT: i64 = 512;

const DAYS_HIGH_BIT: u8 = 0b0000_0001;
const HALT_BIT: u8 = 0b0100_0000;
const DAY_CARRY_BIT: u8 = 0b1000_0000;

fn wall_clock() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs() as i64)
        .unwrap_or(0)
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RtcState {
    pub previous_session_duration: i64,
    pub session_start_time: i64,
    pub has_override: bool,
    pub current_time_override: i64,
    pub latch_register: u8,
    pub latched: bool,
    pub latched_time: i64,
    pub halted: bool,
}

/// MBC3 real time clock. No counters are stored, every register is derived from
/// `previous_session_duration + (current_time - session_start_time)` in seconds.
pub struct Rtc {
    previous_session_duration: i64,
    session_start_time: i64,
    has_override: bool,
    current_time_override: i64,
    latch_register: u8,
    latched: bool,
    latched_time: i64,
    halted: bool,
}

impl Rtc {
    pub fn new() -> Rtc {
        Rtc {
            previous_session_duration: 0,
            session_start_time: wall_clock(),
            has_override: false,
            current_time_override: 0,
            latch_register: 0xff,
            latched: false,
            latched_time: 0,
            halted: false,
        }
    }

    fn current_time(&self) -> i64 {
        if self.latched {
            self.latched_time
        } else {
            self.unlatched_time()
        }
    }

    fn unlatched_time(&self) -> i64 {
        if self.has_override {
            self.current_time_override
        } else {
            wall_clock()
        }
    }

    pub fn elapsed(&self) -> i64 {
        self.previous_session_duration + (self.current_time() - self.session_start_time)
    }

    pub fn seconds(&self) -> u8 {
        self.elapsed().rem_euclid(60) as u8
    }

    pub fn minutes(&self) -> u8 {
        (self.elapsed().div_euclid(60)).rem_euclid(60) as u8
    }

    pub fn hours(&self) -> u8 {
        (self.elapsed().div_euclid(3600)).rem_euclid(24) as u8
    }

    pub fn days(&self) -> u16 {
        (self.elapsed().div_euclid(SECONDS_PER_DAY)).rem_euclid(DAY_COUNTER_LIMIT) as u16
    }

    pub fn day_carry(&self) -> bool {
        self.elapsed().div_euclid(SECONDS_PER_DAY) >= DAY_COUNTER_LIMIT
    }

    #[inline]
    pub fn halted(&self) -> bool {
        self.halted
    }

    pub fn read(&self, register: u8) -> u8 {
        match register {
            RTC_SECONDS_REGISTER => self.seconds(),
            RTC_MINUTES_REGISTER => self.minutes(),
            RTC_HOURS_REGISTER => self.hours(),
            RTC_DAYS_LOW_REGISTER => (self.days() & 0xff) as u8,
            RTC_DAYS_HIGH_REGISTER => {
                let mut value = ((self.days() >> 8) as u8) & DAYS_HIGH_BIT;
                if self.halted {
                    value |= HALT_BIT;
                }
                if self.day_carry() {
                    value |= DAY_CARRY_BIT;
                }
                value
            }
            _ => panic!("Unknown RTC register: ${:02x}", register),
        }
    }

    /// Sets a register by shifting the accumulated duration so the requested field reads back,
    /// leaving the other fields untouched.
    pub fn write(&mut self, register: u8, data: u8) {
        if register == RTC_DAYS_HIGH_REGISTER {
            let was_halted = self.halted;
            self.halted = data & HALT_BIT != 0;
            if !was_halted && self.halted {
                // Collapse everything into the previous session and freeze
                self.previous_session_duration = self.elapsed();
                self.session_start_time = 0;
                self.current_time_override = 0;
                self.has_override = true;
            } else if was_halted && !self.halted {
                self.session_start_time = wall_clock();
                self.has_override = false;
            }
        }

        if !self.halted {
            self.rebase();
        }

        let delta = match register {
            RTC_SECONDS_REGISTER => (data & 0x3f).min(60) as i64 - self.seconds() as i64,
            RTC_MINUTES_REGISTER => 60 * ((data & 0x3f).min(60) as i64 - self.minutes() as i64),
            RTC_HOURS_REGISTER => 3600 * ((data & 0x1f).min(24) as i64 - self.hours() as i64),
            RTC_DAYS_LOW_REGISTER => SECONDS_PER_DAY * (data as i64 - (self.days() & 0xff) as i64),
            RTC_DAYS_HIGH_REGISTER => {
                let requested = if data & DAYS_HIGH_BIT != 0 { 256 } else { 0 };
                let mut delta = SECONDS_PER_DAY * (requested - (self.days() & 0x100) as i64);
                if data & DAY_CARRY_BIT == 0 && self.day_carry() {
                    let overflowed_days = self.elapsed().div_euclid(SECONDS_PER_DAY) / DAY_COUNTER_LIMIT;
                    delta -= overflowed_days * DAY_COUNTER_LIMIT * SECONDS_PER_DAY;
                }
                delta
            }
            _ => panic!("Unknown RTC register: ${:02x}", register),
        };
        self.previous_session_duration += delta;

        debug!(
            "RTC: register ${:02x} <- {}, now {}d {:02}:{:02}:{:02}",
            register,
            data,
            self.days(),
            self.hours(),
            self.minutes(),
            self.seconds()
        );
    }

    /// Moves the running session into the accumulated duration so edits apply to a fixed base.
    fn rebase(&mut self) {
        let now = self.current_time();
        self.previous_session_duration = self.elapsed();
        self.session_start_time = now;
    }

    /// A 0 -> 1 write freezes the clock for reads, any other write releases it.
    pub fn latch(&mut self, data: u8) {
        let will_latch = data == 0x01 && self.latch_register == 0x00;
        if will_latch {
            self.latched_time = self.unlatched_time();
        }
        self.latch_register = data;
        self.latched = will_latch;
    }

    pub fn set_previous_session_duration(&mut self, seconds: i64) {
        self.previous_session_duration = seconds;
    }

    pub fn set_session_start_time(&mut self, seconds: i64) {
        self.session_start_time = seconds;
    }

    pub fn set_time_override(&mut self, seconds: i64) {
        self.current_time_override = seconds;
        self.has_override = true;
    }

    pub fn clear_time_override(&mut self) {
        self.has_override = false;
    }

    pub fn state(&self) -> RtcState {
        RtcState {
            previous_session_duration: self.previous_session_duration,
            session_start_time: self.session_start_time,
            has_override: self.has_override,
            current_time_override: self.current_time_override,
            latch_register: self.latch_register,
            latched: self.latched,
            latched_time: self.latched_time,
            halted: self.halted,
        }
    }

    pub fn set_state(&mut self, state: &RtcState) {
        self.previous_session_duration = state.previous_session_duration;
        self.session_start_time = state.session_start_time;
        self.has_override = state.has_override;
        self.current_time_override = state.current_time_override;
        self.latch_register = state.latch_register;
        self.latched = state.latched;
        self.latched_time = state.latched_time;
        self.halted = state.halted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frozen_rtc(duration: i64) -> Rtc {
        let mut rtc = Rtc::new();
        rtc.set_previous_session_duration(duration);
        rtc.set_session_start_time(0);
        rtc.set_time_override(0);
        rtc
    }

    #[test]
    fn day_counter_overflow_sets_carry() {
        let mut rtc = frozen_rtc(511 * SECONDS_PER_DAY);
        rtc.set_time_override(SECONDS_PER_DAY);

        assert_eq!(rtc.read(RTC_DAYS_LOW_REGISTER), 0);
        assert_eq!(rtc.read(RTC_DAYS_HIGH_REGISTER) & DAYS_HIGH_BIT, 0);
        assert_eq!(rtc.read(RTC_DAYS_HIGH_REGISTER) & DAY_CARRY_BIT, DAY_CARRY_BIT);
    }

    #[test]
    fn fields_derive_from_elapsed_seconds() {
        let rtc = frozen_rtc(300 * SECONDS_PER_DAY + 13 * 3600 + 37 * 60 + 59);

        assert_eq!(rtc.read(RTC_SECONDS_REGISTER), 59);
        assert_eq!(rtc.read(RTC_MINUTES_REGISTER), 37);
        assert_eq!(rtc.read(RTC_HOURS_REGISTER), 13);
        assert_eq!(rtc.read(RTC_DAYS_LOW_REGISTER), (300 & 0xff) as u8);
        assert_eq!(rtc.read(RTC_DAYS_HIGH_REGISTER), 0x01);
    }

    #[test]
    fn halt_collapses_elapsed_time() {
        let duration = 5 * 3600 + 30;
        let mut rtc = frozen_rtc(duration);
        rtc.set_time_override(0);

        rtc.write(RTC_DAYS_HIGH_REGISTER, HALT_BIT);
        assert!(rtc.halted());
        assert_eq!(rtc.elapsed(), duration);

        // Time passing while halted must not count
        rtc.write(RTC_DAYS_HIGH_REGISTER, 0x00);
        assert!(!rtc.halted());
        let elapsed = rtc.elapsed();
        assert!(elapsed >= duration && elapsed - duration <= 1, "elapsed {} vs {}", elapsed, duration);
    }

    #[test]
    fn writes_only_change_the_written_field() {
        let mut rtc = frozen_rtc(2 * SECONDS_PER_DAY + 3 * 3600 + 4 * 60 + 5);
        rtc.write(RTC_DAYS_HIGH_REGISTER, HALT_BIT);

        rtc.write(RTC_MINUTES_REGISTER, 42);
        rtc.write(RTC_DAYS_LOW_REGISTER, 200);

        assert_eq!(rtc.read(RTC_SECONDS_REGISTER), 5);
        assert_eq!(rtc.read(RTC_MINUTES_REGISTER), 42);
        assert_eq!(rtc.read(RTC_HOURS_REGISTER), 3);
        assert_eq!(rtc.read(RTC_DAYS_LOW_REGISTER), 200);

        rtc.write(RTC_DAYS_HIGH_REGISTER, HALT_BIT | DAYS_HIGH_BIT);
        assert_eq!(rtc.days(), 456);
        rtc.write(RTC_DAYS_HIGH_REGISTER, HALT_BIT);
        assert_eq!(rtc.days(), 200);
    }

    #[test]
    fn clearing_carry_drops_overflowed_days() {
        let mut rtc = frozen_rtc(515 * SECONDS_PER_DAY);
        rtc.write(RTC_DAYS_HIGH_REGISTER, HALT_BIT | DAY_CARRY_BIT);
        assert!(rtc.day_carry());

        rtc.write(RTC_DAYS_HIGH_REGISTER, HALT_BIT);
        assert!(!rtc.day_carry());
        assert_eq!(rtc.days(), 3);
    }

    #[test]
    fn latch_freezes_reads_until_released() {
        let mut rtc = frozen_rtc(10);
        rtc.latch(0x00);
        rtc.latch(0x01);

        rtc.set_time_override(100);
        assert_eq!(rtc.read(RTC_SECONDS_REGISTER), 10);

        rtc.latch(0x00);
        assert_eq!(rtc.read(RTC_MINUTES_REGISTER), 1);
        assert_eq!(rtc.read(RTC_SECONDS_REGISTER), 50);
    }
}
