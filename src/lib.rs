//! GPS-disciplined 16-digit ISO-8601 clock
//!
//! Time is kept by a battery-backed ds3234 RTC and shown on sixteen seven-segment digits driven by
//! two cascaded max7219 chips. Pressing sync reads the next RMC sentence from a GPS receiver,
//! shifts it by the configured UTC offset and writes it to the RTC.
//!
//! Everything here is hardware-independent and builds for the host; the firmware binary supplies
//! the AVR peripherals through the traits in [`io`] and `embedded-hal`.
#![cfg_attr(not(test), no_std)]

pub mod clock;
pub mod display;
pub mod ds3234;
pub mod epoch;
pub mod glyph;
pub mod io;
pub mod max7219;
pub mod nmea;
pub mod offset;
pub mod settings;
pub mod state;
pub mod time;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::{
    clock::Clock,
    display::{render, DigitBuffer, DisplayMode},
    ds3234::Ds3234,
    epoch::to_epoch_seconds,
    max7219::Max7219,
    nmea::{parse_rmc, SyncError},
    offset::apply_offset,
    settings::{validate_intensity, validate_offset, Intensity, Offset, Settings},
    state::{Button, ClockState, Debounce, EventQueue, SharedState},
    time::BcdTime,
};
