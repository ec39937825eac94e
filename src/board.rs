//! Peripheral glue between the Pro Mini and the clock's `io` traits

use core::{cell::RefCell, convert::Infallible};

use arduino_hal::{
    hal::port::{PC0, PC1, PD0, PD1},
    pac::{EXINT, USART0},
    port::{
        mode::{Input, Output, PullUp},
        Pin,
    },
    prelude::*,
    usart::UsartReader,
    Eeprom,
};
use avr_device::interrupt::Mutex;
use gpsclock::{
    io::{ByteSource, SettingsStore},
    Button, Debounce,
};

use crate::{millis::millis, EVENTS};

/// EEPROM address of the UTC offset byte
pub const OFFSET_ADDRESS: u16 = 5;

/// EEPROM address of the intensity byte
pub const INTENSITY_ADDRESS: u16 = 6;

/// A button must read released this long before it can be pressed again
const DEBOUNCE_MS: u32 = 200;

/// Receiving half of the hardware UART, wired to the GPS TX line
pub struct GpsSerial(pub UsartReader<USART0, Pin<Input, PD0>, Pin<Output, PD1>>);

impl ByteSource for GpsSerial {
    type Error = Infallible;

    fn read(&mut self) -> nb::Result<u8, Infallible> {
        match self.0.read() {
            Ok(byte) => Ok(byte),
            Err(_) => Err(nb::Error::WouldBlock),
        }
    }
}

/// Settings bytes in the on-chip EEPROM
pub struct EepromStore(pub Eeprom);

impl SettingsStore for EepromStore {
    fn read_raw_offset(&mut self) -> u8 {
        self.0.read_byte(OFFSET_ADDRESS)
    }

    fn write_raw_offset(&mut self, raw: u8) {
        self.0.write_byte(OFFSET_ADDRESS, raw);
    }

    fn read_raw_intensity(&mut self) -> u8 {
        self.0.read_byte(INTENSITY_ADDRESS)
    }

    fn write_raw_intensity(&mut self, raw: u8) {
        self.0.write_byte(INTENSITY_ADDRESS, raw);
    }
}

/// Front-panel buttons; both pull to ground when pressed
pub struct Buttons {
    mode: Pin<Input<PullUp>, PC0>,
    sync: Pin<Input<PullUp>, PC1>,
    mode_level: Debounce,
    sync_level: Debounce,
}

static BUTTONS: Mutex<RefCell<Option<Buttons>>> = Mutex::new(RefCell::new(None));

impl Buttons {
    /// Hand the buttons to the pin-change interrupt and enable it
    pub fn install(exint: &EXINT, mode: Pin<Input<PullUp>, PC0>, sync: Pin<Input<PullUp>, PC1>) {
        // PCINT8 and PCINT9, both on the PCINT1 vector
        // Safety: any bit pattern is valid for these registers
        exint.pcmsk1().write(|w| unsafe { w.bits(0b0000_0011) });
        // Safety: as above; only PCIE1 is set
        exint.pcicr().write(|w| unsafe { w.bits(0b0000_0010) });

        avr_device::interrupt::free(|cs| {
            BUTTONS.borrow(cs).replace(Some(Self {
                mode,
                sync,
                mode_level: Debounce::new(DEBOUNCE_MS),
                sync_level: Debounce::new(DEBOUNCE_MS),
            }));
        });
    }

    /// Post a press for every button newly pushed down
    ///
    /// Runs on every pin change, both edges included.
    fn poll(&mut self, now: u32) {
        if self.mode_level.update(self.mode.is_low(), now) {
            EVENTS.post(Button::Mode);
        }
        if self.sync_level.update(self.sync.is_low(), now) {
            EVENTS.post(Button::Sync);
        }
    }
}

#[expect(clippy::allow_attributes, reason = "expect somehow doesn't work")]
#[allow(missing_docs, reason = "macro expansion breaks doc comments")]
mod internal {
    use super::{millis, BUTTONS};

    #[avr_device::interrupt(atmega328p)]
    fn PCINT1() {
        let now = millis();
        avr_device::interrupt::free(|cs| {
            if let Some(buttons) = BUTTONS.borrow(cs).borrow_mut().as_mut() {
                buttons.poll(now);
            }
        });
    }
}
