//! GPS time from NMEA 0183 RMC sentences
//!
//! ```text
//! $GPRMC,161229.487,A,3723.2475,N,12158.3416,W,0.13,309.62,120598,,*10
//!        hhmmss.sss                                        ddmmyy
//! ```
//!
//! The parser attaches to the first `RMC` it sees anywhere in the stream, regardless of talker ID
//! or sentence start, and does not verify the checksum.

use ufmt::{uDisplay, uWrite, Formatter};

use crate::{
    io::{ByteSource, Cancel},
    time::BcdTime,
};

/// Bytes scanned before a parse gives up; about one second of receiver output at 9600 baud
pub const DEFAULT_BUDGET: u16 = 1024;

/// GPS time is only meaningful for the years 2000 to 2099
const CENTURY: u8 = 20;

/// Fields between the end of the time and the start of the date
const SKIPPED_FIELDS: u8 = 8;

const MARKER: &[u8; 3] = b"RMC";

/// Why a sync attempt produced no time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncError {
    /// A non-digit where a digit was expected, a field out of calendar range, or no RMC marker
    /// within the byte budget
    InvalidData,

    /// The cancel predicate fired while waiting for input
    Cancelled,

    /// The byte source reported a transport error
    Serial,

    /// A valid time arrived but the RTC could not be written
    Rtc,
}

impl uDisplay for SyncError {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        f.write_str(match self {
            Self::InvalidData => "invalid data",
            Self::Cancelled => "cancelled",
            Self::Serial => "serial error",
            Self::Rtc => "rtc write failed",
        })
    }
}

/// Parse the time and date from the next RMC sentence in `source`
///
/// # Errors
/// See [`SyncError`]
pub fn parse_rmc<S, C>(source: &mut S, cancel: C) -> Result<BcdTime, SyncError>
where
    S: ByteSource,
    C: Cancel,
{
    RmcParser::with_budget(source, cancel, DEFAULT_BUDGET).parse()
}

/// Single-use RMC parser over a blocking, cancellable byte source
pub struct RmcParser<'a, S, C> {
    source: &'a mut S,
    cancel: C,
    budget: u16,
}

impl<'a, S, C> RmcParser<'a, S, C>
where
    S: ByteSource,
    C: Cancel,
{
    /// Parser that gives up after reading `budget` bytes
    pub const fn with_budget(source: &'a mut S, cancel: C, budget: u16) -> Self {
        Self {
            source,
            cancel,
            budget,
        }
    }

    /// Consume bytes up to and including the date field of one RMC sentence
    ///
    /// # Errors
    /// See [`SyncError`]
    pub fn parse(mut self) -> Result<BcdTime, SyncError> {
        self.find_marker()?;

        // Delimiter after the sentence ID
        self.next_byte()?;

        let hour = self.pair()?;
        let minute = self.pair()?;
        let second = self.pair()?;

        for _ in 0..SKIPPED_FIELDS {
            while self.next_byte()? != b',' {}
        }

        // Date arrives as ddmmyy
        let day = self.pair()?;
        let month = self.pair()?;
        let year = self.pair()?;

        BcdTime::new(CENTURY, year, month, day, hour, minute, second)
            .map_err(|_| SyncError::InvalidData)
    }

    fn find_marker(&mut self) -> Result<(), SyncError> {
        let mut matched = 0;
        while matched < MARKER.len() {
            let byte = self.next_byte()?;
            if byte == MARKER[matched] {
                matched += 1;
            } else if byte == MARKER[0] {
                matched = 1;
            } else {
                matched = 0;
            }
        }
        Ok(())
    }

    fn pair(&mut self) -> Result<u8, SyncError> {
        let tens = self.digit()?;
        let ones = self.digit()?;
        Ok(10 * tens + ones)
    }

    fn digit(&mut self) -> Result<u8, SyncError> {
        let value = self.next_byte()?.wrapping_sub(b'0');
        if value > 9 {
            return Err(SyncError::InvalidData);
        }
        Ok(value)
    }

    /// Blocking read that polls for cancellation before every attempt
    fn next_byte(&mut self) -> Result<u8, SyncError> {
        if self.budget == 0 {
            return Err(SyncError::InvalidData);
        }
        loop {
            if self.cancel.is_cancelled() {
                return Err(SyncError::Cancelled);
            }
            match self.source.read() {
                Ok(byte) => {
                    self.budget -= 1;
                    return Ok(byte);
                }
                Err(nb::Error::WouldBlock) => {}
                Err(nb::Error::Other(_)) => return Err(SyncError::Serial),
            }
        }
    }
}
