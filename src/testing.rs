//! In-memory stand-ins for the clock's peripherals

use core::convert::Infallible;

use embedded_hal::{
    delay::DelayNs,
    spi::{self, ErrorKind, ErrorType, Operation, SpiDevice},
};
use ufmt::uWrite;

use crate::{
    display::{Digit, DigitBuffer},
    io::{ByteSource, DisplaySink, SettingsStore, TimeKeeper},
    settings::Intensity,
    time::BcdTime,
};

/// Log sink collecting everything written to it
#[derive(Debug, Default)]
pub struct Log(String);

impl Log {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl uWrite for Log {
    type Error = Infallible;

    fn write_str(&mut self, s: &str) -> Result<(), Infallible> {
        self.0.push_str(s);
        Ok(())
    }
}

/// EEPROM with two cells and a write counter
#[derive(Debug)]
pub struct MemoryStore {
    pub offset: u8,
    pub intensity: u8,
    pub writes: usize,
}

impl MemoryStore {
    pub const fn new(offset: u8, intensity: u8) -> Self {
        Self {
            offset,
            intensity,
            writes: 0,
        }
    }
}

impl SettingsStore for MemoryStore {
    fn read_raw_offset(&mut self) -> u8 {
        self.offset
    }

    fn write_raw_offset(&mut self, raw: u8) {
        self.offset = raw;
        self.writes += 1;
    }

    fn read_raw_intensity(&mut self) -> u8 {
        self.intensity
    }

    fn write_raw_intensity(&mut self, raw: u8) {
        self.intensity = raw;
        self.writes += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamError;

/// Serial input that blocks forever once drained
#[derive(Debug)]
pub struct Stream {
    bytes: Vec<u8>,
    pos: usize,
    fail_at: Option<usize>,
}

impl Stream {
    pub fn new(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
            pos: 0,
            fail_at: None,
        }
    }

    /// Report a transport error once `count` bytes have been read
    pub fn failing_after(mut self, count: usize) -> Self {
        self.fail_at = Some(count);
        self
    }

    pub const fn consumed(&self) -> usize {
        self.pos
    }
}

impl ByteSource for Stream {
    type Error = StreamError;

    fn read(&mut self) -> nb::Result<u8, StreamError> {
        if self.fail_at == Some(self.pos) {
            return Err(nb::Error::Other(StreamError));
        }
        let byte = *self.bytes.get(self.pos).ok_or(nb::Error::WouldBlock)?;
        self.pos += 1;
        Ok(byte)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiError;

impl spi::Error for SpiError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// SPI device recording every transaction's outgoing bytes
///
/// In-place transfers are answered from `response`.
#[derive(Debug, Default)]
pub struct FakeSpi {
    sent: Vec<Vec<u8>>,
    response: Vec<u8>,
    pub fail: bool,
}

impl FakeSpi {
    pub fn respond(&mut self, bytes: &[u8]) {
        self.response = bytes.to_vec();
    }

    pub fn sent(&self) -> &[Vec<u8>] {
        &self.sent
    }

    pub fn clear(&mut self) {
        self.sent.clear();
    }
}

impl ErrorType for FakeSpi {
    type Error = SpiError;
}

impl SpiDevice for FakeSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), SpiError> {
        if self.fail {
            return Err(SpiError);
        }

        let mut outgoing = Vec::new();
        for op in operations {
            match op {
                Operation::Write(words) => outgoing.extend_from_slice(words),
                Operation::TransferInPlace(words) => {
                    outgoing.extend_from_slice(words);
                    for (i, word) in words.iter_mut().enumerate() {
                        *word = self.response.get(i).copied().unwrap_or(0);
                    }
                }
                Operation::Transfer(read, write) => {
                    outgoing.extend_from_slice(write);
                    read.fill(0);
                }
                Operation::Read(words) => words.fill(0),
                Operation::DelayNs(_) => {}
            }
        }
        self.sent.push(outgoing);
        Ok(())
    }
}

/// RTC that keeps whatever it was last given
#[derive(Debug, Default)]
pub struct FakeRtc {
    /// `None` fails every read
    pub time: Option<BcdTime>,
    pub writes: Vec<BcdTime>,
}

impl FakeRtc {
    pub fn at(time: BcdTime) -> Self {
        Self {
            time: Some(time),
            writes: Vec::new(),
        }
    }
}

impl TimeKeeper for FakeRtc {
    type Error = ();

    fn read_time(&mut self) -> Result<BcdTime, ()> {
        self.time.ok_or(())
    }

    fn write_time(&mut self, time: &BcdTime) -> Result<(), ()> {
        self.writes.push(*time);
        self.time = Some(*time);
        Ok(())
    }
}

/// Display keeping every complete frame it was shown
#[derive(Debug, Default)]
pub struct FakeDisplay {
    pub current: DigitBuffer,
    pub frames: Vec<DigitBuffer>,
    pub intensity: Option<Intensity>,
}

impl FakeDisplay {
    pub fn last(&self) -> Option<&DigitBuffer> {
        self.frames.last()
    }

    pub fn showed(&self, frame: &DigitBuffer) -> bool {
        self.frames.contains(frame)
    }
}

impl DisplaySink for FakeDisplay {
    type Error = Infallible;

    fn write_digit(&mut self, slot: usize, digit: Digit) -> Result<(), Infallible> {
        self.current.set(slot, digit);
        Ok(())
    }

    fn set_intensity(&mut self, intensity: Intensity) -> Result<(), Infallible> {
        self.intensity = Some(intensity);
        Ok(())
    }

    fn show(&mut self, buffer: &DigitBuffer) -> Result<(), Infallible> {
        self.current = *buffer;
        self.frames.push(*buffer);
        Ok(())
    }
}

/// Delay that only adds up how long it was asked to wait
#[derive(Debug, Default)]
pub struct FakeDelay {
    pub total_ns: u64,
}

impl FakeDelay {
    pub const fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}
