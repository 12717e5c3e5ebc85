use crate::memory::addressable::Addressable;
use crate::memory::{SERIAL_CONTROL_REGISTER, SERIAL_DATA_REGISTER};
use log::{debug, info, trace};

/// Start a transfer using the internal clock.
const START_INTERNAL_TRANSFER: u8 = 0x81;
const TRANSFER_IN_PROGRESS: u8 = 0x80;

/// Link port without a partner. Transfers complete immediately and the sent bytes are kept.
pub struct Serial {
    sb: u8,
    sc: u8,
    line: String,
    output: String,
    transfer_completed: bool,
}

impl Serial {
    pub fn new() -> Serial {
        Serial {
            sb: 0,
            sc: 0,
            line: String::new(),
            output: String::new(),
            transfer_completed: false,
        }
    }

    /// Everything sent so far.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// True once after a transfer finished, the serial interrupt is due.
    pub fn take_transfer_completed(&mut self) -> bool {
        std::mem::take(&mut self.transfer_completed)
    }

    fn transfer(&mut self) {
        let byte = self.sb as char;
        self.output.push(byte);

        if byte == '\n' {
            info!("Serial: [{}]", self.line);
            self.line.clear();
        } else {
            self.line.push(byte);
            trace!("Serial byte ${:02x}", self.sb);
        }

        // No partner answers, so the transfer is done right away
        self.sc &= !TRANSFER_IN_PROGRESS;
        self.transfer_completed = true;
    }
}

impl Addressable for Serial {
    fn read(&self, addr: u16) -> u8 {
        match addr {
            SERIAL_DATA_REGISTER => self.sb,
            SERIAL_CONTROL_REGISTER => self.sc | 0b0111_1110,
            _ => panic!("Serial does not own ${:04x}", addr),
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            SERIAL_DATA_REGISTER => self.sb = data,
            SERIAL_CONTROL_REGISTER => {
                self.sc = data & 0b1000_0001;
                if data == START_INTERNAL_TRANSFER {
                    self.transfer();
                } else {
                    debug!("Unexpected serial control ${:02x}", data);
                }
            }
            _ => panic!("Serial does not own ${:04x}", addr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn send(serial: &mut Serial, text: &str) {
        for byte in text.bytes() {
            serial.write(SERIAL_DATA_REGISTER, byte);
            serial.write(SERIAL_CONTROL_REGISTER, START_INTERNAL_TRANSFER);
        }
    }

    #[test]
    fn transfers_collect_output_and_complete_immediately() {
        let mut serial = Serial::new();
        send(&mut serial, "Passed\n");

        assert_eq!(serial.output(), "Passed\n");
        assert_eq!(serial.read(SERIAL_CONTROL_REGISTER) & TRANSFER_IN_PROGRESS, 0);
        assert!(serial.take_transfer_completed());
        assert!(!serial.take_transfer_completed());
    }

    #[test]
    fn lines_are_buffered_until_newline() {
        let mut serial = Serial::new();
        send(&mut serial, "Hi");
        assert_eq!(serial.line, "Hi");

        send(&mut serial, "\n");
        assert_eq!(serial.line, "");
        assert_eq!(serial.output(), "Hi\n");
    }

    #[test]
    fn external_clock_writes_do_not_transfer() {
        let mut serial = Serial::new();
        serial.write(SERIAL_DATA_REGISTER, b'x');
        serial.write(SERIAL_CONTROL_REGISTER, 0x80);

        assert_eq!(serial.output(), "");
        assert_eq!(serial.read(SERIAL_CONTROL_REGISTER), 0xfe);
        assert!(!serial.take_transfer_completed());
    }
}
