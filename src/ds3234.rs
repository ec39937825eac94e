//! ds3234 RTC abstractions; interfaced via SPI
//!
//! Only the timekeeping registers are used. The chip keeps local time in 24-hour mode, but a
//! clock set by other firmware may still be in 12-hour mode, so both are decoded.

use embedded_hal::spi::SpiDevice;

use crate::{io::TimeKeeper, time::BcdTime};

const SECONDS: u8 = 0x00;
const WRITE: u8 = 0x80;

const CENTURY_BIT: u8 = 0b1000_0000;
const HOUR_12H: u8 = 0b0100_0000;
const HOUR_PM: u8 = 0b0010_0000;

/// ds3234 bus or data error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// SPI transfer failed
    Spi(E),

    /// The registers do not hold a valid date and time
    InvalidTime,
}

/// ds3234 real-time clock module
#[must_use]
pub struct Ds3234<SPI> {
    spi: SPI,
}

impl<SPI> Ds3234<SPI>
where
    SPI: SpiDevice,
{
    /// Connect to the ds3234 through its SPI device
    pub const fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Disconnect to release the SPI device
    #[must_use]
    pub fn release(self) -> SPI {
        self.spi
    }

    /// Read the complete date and time
    ///
    /// # Errors
    /// Returns an error if the SPI transfer fails or the registers hold an invalid time
    pub fn get_time(&mut self) -> Result<BcdTime, Error<SPI::Error>> {
        let mut buf = [0u8; 8];
        buf[0] = SECONDS;
        self.spi.transfer_in_place(&mut buf).map_err(Error::Spi)?;

        decode(&buf[1..]).ok_or(Error::InvalidTime)
    }

    /// Set the complete date and time
    ///
    /// # Errors
    /// Returns an error if the SPI transfer fails
    pub fn set_time(&mut self, time: &BcdTime) -> Result<(), Error<SPI::Error>> {
        self.spi.write(&encode(time)).map_err(Error::Spi)
    }
}

impl<SPI> TimeKeeper for Ds3234<SPI>
where
    SPI: SpiDevice,
{
    type Error = Error<SPI::Error>;

    fn read_time(&mut self) -> Result<BcdTime, Self::Error> {
        self.get_time()
    }

    fn write_time(&mut self, time: &BcdTime) -> Result<(), Self::Error> {
        self.set_time(time)
    }
}

/// Decode the seven timekeeping registers, seconds first
fn decode(regs: &[u8]) -> Option<BcdTime> {
    let &[seconds, minutes, hours, _weekday, date, month, year] = regs else {
        return None;
    };

    let century = if month & CENTURY_BIT == 0 { 19 } else { 20 };

    BcdTime::new(
        century,
        decode_bcd(year)?,
        decode_bcd(month & !CENTURY_BIT)?,
        decode_bcd(date)?,
        decode_hours(hours)?,
        decode_bcd(minutes)?,
        decode_bcd(seconds & 0x7f)?,
    )
    .ok()
}

/// Write burst for the seven timekeeping registers, 24-hour mode with the century bit set
const fn encode(time: &BcdTime) -> [u8; 8] {
    [
        WRITE | SECONDS,
        encode_bcd(time.second()),
        encode_bcd(time.minute()),
        encode_bcd(time.hour()),
        // Register counts 1 to 7, Sunday first
        time.weekday() + 1,
        encode_bcd(time.day()),
        encode_bcd(time.month()) | CENTURY_BIT,
        encode_bcd(time.year()),
    ]
}

/// 12/24-hour register to 24-hour binary
const fn decode_hours(reg: u8) -> Option<u8> {
    if reg & HOUR_12H == 0 {
        return decode_bcd(reg & 0x3f);
    }

    let Some(hour) = decode_bcd(reg & 0x1f) else {
        return None;
    };
    if hour == 0 || hour > 12 {
        return None;
    }

    // 12AM is midnight, 12PM is noon
    let hour = hour % 12;
    Some(if reg & HOUR_PM == 0 { hour } else { hour + 12 })
}

const fn decode_bcd(byte: u8) -> Option<u8> {
    let ones = byte & 0b0000_1111;
    let tens = byte >> 4;
    if ones > 9 || tens > 9 {
        return None;
    }
    Some(ones + tens * 10)
}

const fn encode_bcd(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}
