//! Two cascaded max7219 8-digit LED drivers; interfaced via SPI
//!
//! Chip A sits next to the MCU and drives slots 0 to 7, chip B is daisy-chained behind it and
//! drives slots 8 to 15. Every transfer shifts one 16-bit word per chip, chip B's first, and both
//! latch together when chip select rises.
//!
//! Numerals use the on-chip Code-B font; pseudo-text letters need raw segments. The decode-mode
//! register of each chip is rewritten only when that mix changes.

use embedded_hal::spi::SpiDevice;

use crate::{
    display::{Digit, DigitBuffer, Glyph, SLOTS},
    io::DisplaySink,
    settings::Intensity,
};

const NOOP: u8 = 0x00;
const DIGIT_0: u8 = 0x01;
const DECODE_MODE: u8 = 0x09;
const INTENSITY: u8 = 0x0A;
const SCAN_LIMIT: u8 = 0x0B;
const SHUTDOWN: u8 = 0x0C;
const DISPLAY_TEST: u8 = 0x0F;

const CODE_B_DASH: u8 = 0x0A;
const CODE_B_BLANK: u8 = 0x0F;
const DP: u8 = 0x80;

const DIGITS_PER_CHIP: usize = 8;
const CHIP_A: usize = 0;
const CHIP_B: usize = 1;

/// Pair of cascaded max7219 chips driving 16 seven-segment digits
#[must_use]
pub struct Max7219<SPI> {
    spi: SPI,

    /// Last decode mode written to each chip; bit n set means digit n uses Code-B
    decode: [u8; 2],
}

impl<SPI> Max7219<SPI>
where
    SPI: SpiDevice,
{
    /// Connect to the chips through their SPI device
    ///
    /// Nothing is sent until [`Max7219::init`].
    pub const fn new(spi: SPI) -> Self {
        Self {
            spi,
            decode: [0xFF; 2],
        }
    }

    /// Disconnect to release the SPI device
    #[must_use]
    pub fn release(self) -> SPI {
        self.spi
    }

    /// Bring both chips out of shutdown with every digit blank
    ///
    /// # Errors
    /// Returns an error if the SPI transfer fails
    pub fn init(&mut self, intensity: Intensity) -> Result<(), SPI::Error> {
        self.write_both(SCAN_LIMIT, [7, 7])?;
        self.write_both(DECODE_MODE, [0xFF, 0xFF])?;
        self.decode = [0xFF, 0xFF];
        self.write_both(INTENSITY, [intensity.level(); 2])?;
        self.write_both(SHUTDOWN, [1, 1])?;
        // Test mode can survive a reset of the MCU alone
        self.write_both(DISPLAY_TEST, [0, 0])?;
        self.clear()
    }

    /// Blank every digit
    ///
    /// # Errors
    /// Returns an error if the SPI transfer fails
    pub fn clear(&mut self) -> Result<(), SPI::Error> {
        self.show(&DigitBuffer::BLANK)
    }

    /// Write one digit, updating that chip's decode mode if needed
    ///
    /// # Errors
    /// Returns an error if the SPI transfer fails
    pub fn write_digit(&mut self, slot: usize, digit: Digit) -> Result<(), SPI::Error> {
        let chip = slot / DIGITS_PER_CHIP % 2;
        let bit = slot % DIGITS_PER_CHIP;

        let decode = decode_mask(self.decode[chip], bit, digit);
        if decode != self.decode[chip] {
            self.write_one(chip, DECODE_MODE, decode)?;
            self.decode[chip] = decode;
        }

        let value = encode(digit, decode & (1 << bit) != 0);
        self.write_one(chip, DIGIT_0 + bit as u8, value)
    }

    /// Write a whole frame, both chips per transfer
    ///
    /// # Errors
    /// Returns an error if the SPI transfer fails
    pub fn show(&mut self, buffer: &DigitBuffer) -> Result<(), SPI::Error> {
        let mut decode = self.decode;
        for (slot, &digit) in buffer.iter().enumerate().take(SLOTS) {
            let chip = slot / DIGITS_PER_CHIP;
            decode[chip] = decode_mask(decode[chip], slot % DIGITS_PER_CHIP, digit);
        }
        if decode != self.decode {
            self.write_both(DECODE_MODE, decode)?;
            self.decode = decode;
        }

        for bit in 0..DIGITS_PER_CHIP {
            let near = buffer[bit];
            let far = buffer[bit + DIGITS_PER_CHIP];
            self.write_both(
                DIGIT_0 + bit as u8,
                [
                    encode(near, decode[CHIP_A] & (1 << bit) != 0),
                    encode(far, decode[CHIP_B] & (1 << bit) != 0),
                ],
            )?;
        }

        Ok(())
    }

    /// Set brightness on both chips
    ///
    /// # Errors
    /// Returns an error if the SPI transfer fails
    pub fn set_intensity(&mut self, intensity: Intensity) -> Result<(), SPI::Error> {
        self.write_both(INTENSITY, [intensity.level(); 2])
    }

    /// Write `data[CHIP_A]` and `data[CHIP_B]` to `register` of each chip in one transfer
    fn write_both(&mut self, register: u8, data: [u8; 2]) -> Result<(), SPI::Error> {
        self.spi
            .write(&[register, data[CHIP_B], register, data[CHIP_A]])
    }

    /// Write `register` of one chip, shifting a no-op through the other
    fn write_one(&mut self, chip: usize, register: u8, data: u8) -> Result<(), SPI::Error> {
        let words = if chip == CHIP_B {
            [register, data, NOOP, 0]
        } else {
            [NOOP, 0, register, data]
        };
        self.spi.write(&words)
    }
}

impl<SPI> DisplaySink for Max7219<SPI>
where
    SPI: SpiDevice,
{
    type Error = SPI::Error;

    fn write_digit(&mut self, slot: usize, digit: Digit) -> Result<(), Self::Error> {
        Self::write_digit(self, slot, digit)
    }

    fn set_intensity(&mut self, intensity: Intensity) -> Result<(), Self::Error> {
        Self::set_intensity(self, intensity)
    }

    fn show(&mut self, buffer: &DigitBuffer) -> Result<(), Self::Error> {
        Self::show(self, buffer)
    }
}

/// Decode mask after placing `digit` at `bit`
///
/// Blanks and dashes exist in both decodings, so they keep whatever the digit already uses.
const fn decode_mask(mask: u8, bit: usize, digit: Digit) -> u8 {
    match digit.glyph {
        Glyph::Numeral(_) => mask | (1 << bit),
        Glyph::Segments(_) => mask & !(1 << bit),
        Glyph::Blank | Glyph::Dash => mask,
    }
}

/// Digit register value under the given decoding
const fn encode(digit: Digit, code_b: bool) -> u8 {
    let value = match (digit.glyph, code_b) {
        (Glyph::Numeral(n), _) => n,
        (Glyph::Segments(pattern), _) => pattern,
        (Glyph::Blank, true) => CODE_B_BLANK,
        (Glyph::Blank, false) => crate::glyph::BLANK,
        (Glyph::Dash, true) => CODE_B_DASH,
        (Glyph::Dash, false) => crate::glyph::DASH,
    };
    if digit.dp {
        value | DP
    } else {
        value
    }
}
