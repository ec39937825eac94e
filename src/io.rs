//! Interfaces to the clock's external collaborators
//!
//! The firmware binary implements these for the UART, EEPROM and SPI peripherals; the test suite
//! implements them with in-memory fakes.

use crate::{
    display::{Digit, DigitBuffer, SLOTS},
    settings::Intensity,
    time::BcdTime,
};

/// A serial byte stream with non-blocking reads
pub trait ByteSource {
    /// Transport error
    type Error;

    /// Read one byte, or [`nb::Error::WouldBlock`] if none has arrived yet
    ///
    /// # Errors
    /// Returns an error if the transport fails
    fn read(&mut self) -> nb::Result<u8, Self::Error>;
}

/// Polled between byte reads to abandon a blocking operation
pub trait Cancel {
    /// Whether the operation should be abandoned
    fn is_cancelled(&mut self) -> bool;
}

impl<F> Cancel for F
where
    F: FnMut() -> bool,
{
    fn is_cancelled(&mut self) -> bool {
        self()
    }
}

/// Battery-backed source of the current local time
pub trait TimeKeeper {
    /// Bus or decoding error
    type Error;

    /// Read the current time
    ///
    /// # Errors
    /// Returns an error if the device cannot be read or holds an invalid time
    fn read_time(&mut self) -> Result<BcdTime, Self::Error>;

    /// Set the current time
    ///
    /// # Errors
    /// Returns an error if the device cannot be written
    fn write_time(&mut self, time: &BcdTime) -> Result<(), Self::Error>;
}

/// 16-digit seven-segment display
pub trait DisplaySink {
    /// Bus error
    type Error;

    /// Write one digit; `slot` counts from 0 (leftmost) to 15
    ///
    /// # Errors
    /// Returns an error if the display cannot be written
    fn write_digit(&mut self, slot: usize, digit: Digit) -> Result<(), Self::Error>;

    /// Set display brightness
    ///
    /// # Errors
    /// Returns an error if the display cannot be written
    fn set_intensity(&mut self, intensity: Intensity) -> Result<(), Self::Error>;

    /// Write a complete buffer
    ///
    /// # Errors
    /// Returns an error if the display cannot be written
    fn show(&mut self, buffer: &DigitBuffer) -> Result<(), Self::Error> {
        for slot in 0..SLOTS {
            self.write_digit(slot, buffer[slot])?;
        }
        Ok(())
    }
}

/// Non-volatile storage for the raw settings bytes
///
/// Uninitialized storage reads back as `0xFF`
pub trait SettingsStore {
    /// Stored UTC offset byte
    fn read_raw_offset(&mut self) -> u8;

    /// Store the UTC offset byte
    fn write_raw_offset(&mut self, raw: u8);

    /// Stored intensity byte
    fn read_raw_intensity(&mut self) -> u8;

    /// Store the intensity byte
    fn write_raw_intensity(&mut self, raw: u8);
}
