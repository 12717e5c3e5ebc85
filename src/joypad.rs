use crate::memory::addressable::Addressable;
use crate::memory::JOYPAD_REGISTER;
use log::{debug, warn};

const SELECT_DIRECTIONS: u8 = 0b0001_0000;
const SELECT_BUTTONS: u8 = 0b0010_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Right,
    Left,
    Up,
    Down,
    A,
    B,
    Select,
    Start,
}

/// Snapshot of all eight inputs, true meaning held down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Buttons {
    pub right: bool,
    pub left: bool,
    pub up: bool,
    pub down: bool,
    pub a: bool,
    pub b: bool,
    pub select: bool,
    pub start: bool,
}

impl Buttons {
    pub fn get(&self, button: Button) -> bool {
        match button {
            Button::Right => self.right,
            Button::Left => self.left,
            Button::Up => self.up,
            Button::Down => self.down,
            Button::A => self.a,
            Button::B => self.b,
            Button::Select => self.select,
            Button::Start => self.start,
        }
    }

    fn slot(&mut self, button: Button) -> &mut bool {
        match button {
            Button::Right => &mut self.right,
            Button::Left => &mut self.left,
            Button::Up => &mut self.up,
            Button::Down => &mut self.down,
            Button::A => &mut self.a,
            Button::B => &mut self.b,
            Button::Select => &mut self.select,
            Button::Start => &mut self.start,
        }
    }
}

#[derive(Clone)]
pub struct Joypad {
    buttons: Buttons,
    select: u8,
}

impl Joypad {
    pub fn new() -> Joypad {
        Joypad {
            buttons: Buttons::default(),
            select: SELECT_DIRECTIONS | SELECT_BUTTONS,
        }
    }

    /// Returns true on a release to press transition, which raises the joypad interrupt.
    pub fn set_button(&mut self, button: Button, pressed: bool) -> bool {
        let slot = self.buttons.slot(button);
        let newly_pressed = pressed && !*slot;
        *slot = pressed;
        if newly_pressed {
            debug!("{:?} pressed", button);
        }
        newly_pressed
    }

    pub fn set_buttons(&mut self, buttons: Buttons) -> bool {
        const ALL: [Button; 8] = [
            Button::Right,
            Button::Left,
            Button::Up,
            Button::Down,
            Button::A,
            Button::B,
            Button::Select,
            Button::Start,
        ];

        ALL.into_iter()
            .fold(false, |pressed, button| self.set_button(button, buttons.get(button)) || pressed)
    }

    #[inline]
    pub fn buttons(&self) -> Buttons {
        self.buttons
    }

    /// Active low nibble of one button group.
    fn nibble(&self, first: Button, second: Button, third: Button, fourth: Button) -> u8 {
        let mut state = 0x0f;
        for (bit, button) in [first, second, third, fourth].into_iter().enumerate() {
            if self.buttons.get(button) {
                state &= !(1 << bit);
            }
        }
        state
    }

    pub fn as_u8(&self) -> u8 {
        let direction_select = self.select & SELECT_DIRECTIONS == 0;
        let button_select = self.select & SELECT_BUTTONS == 0;

        let mut state = 0x0f;
        if direction_select {
            state &= self.nibble(Button::Right, Button::Left, Button::Up, Button::Down);
        }
        if button_select {
            state &= self.nibble(Button::A, Button::B, Button::Select, Button::Start);
        }

        0b1100_0000 | self.select | state
    }
}

impl Addressable for Joypad {
    fn read(&self, addr: u16) -> u8 {
        match addr {
            JOYPAD_REGISTER => self.as_u8(),
            _ => panic!("Joypad does not own ${:04x}", addr),
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            JOYPAD_REGISTER => {
                self.select = data & (SELECT_DIRECTIONS | SELECT_BUTTONS);
                if self.select == 0 {
                    warn!("Joypad has buttons and d-pad mode selected");
                }
            }
            _ => panic!("Joypad does not own ${:04x}", addr),
        }
    }
}
