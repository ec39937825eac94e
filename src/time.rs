//! Calendar time shared by the RTC, GPS and display paths
//!
//! Fields are kept as bounded binary integers; the 14-digit BCD form
//! `[C C Y Y M M D D h h m m s s]` is only produced or consumed at the RTC, wire and display
//! boundaries.

use ufmt::{uDisplay, uWrite, Formatter};

/// Number of BCD digits in a [`BcdTime`]
pub const DIGITS: usize = 14;

/// Index of the first digit of each two-digit component in [`BcdTime::digits`]
pub mod index {
    /// Century tens
    pub const CENTURY: usize = 0;
    /// Year tens
    pub const YEAR: usize = 2;
    /// Month tens
    pub const MONTH: usize = 4;
    /// Day tens
    pub const DAY: usize = 6;
    /// Hour tens
    pub const HOUR: usize = 8;
    /// Minute tens
    pub const MINUTE: usize = 10;
    /// Second tens
    pub const SECOND: usize = 12;
}

/// A digit or composed field violated the calendar bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTime;

/// Month of the year
#[expect(missing_docs, reason = "self-explanatory variants")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Month {
    January = 1,
    February = 2,
    March = 3,
    April = 4,
    May = 5,
    June = 6,
    July = 7,
    August = 8,
    September = 9,
    October = 10,
    November = 11,
    December = 12,
}

impl Month {
    /// Construct from the month number
    ///
    /// # Errors
    /// Returns an error if `value` is not in `1..=12`
    pub const fn try_from_bin(value: u8) -> Result<Self, InvalidTime> {
        match value {
            1 => Ok(Self::January),
            2 => Ok(Self::February),
            3 => Ok(Self::March),
            4 => Ok(Self::April),
            5 => Ok(Self::May),
            6 => Ok(Self::June),
            7 => Ok(Self::July),
            8 => Ok(Self::August),
            9 => Ok(Self::September),
            10 => Ok(Self::October),
            11 => Ok(Self::November),
            12 => Ok(Self::December),
            _ => Err(InvalidTime),
        }
    }

    /// Number of days in the month
    #[must_use]
    pub const fn length(self, leap: bool) -> u8 {
        match self {
            Self::January
            | Self::March
            | Self::May
            | Self::July
            | Self::August
            | Self::October
            | Self::December => 31,
            Self::February => 28 + leap as u8,
            Self::April | Self::June | Self::September | Self::November => 30,
        }
    }

    /// Returns value as binary
    #[must_use]
    pub const fn bin(self) -> u8 {
        self as u8
    }
}

/// Whether a two-digit year is a leap year
///
/// Note: does not account for 100 year or 400 year correction
#[must_use]
pub const fn is_leap(year: u8) -> bool {
    year % 4 == 0
}

/// Date and time with a two-digit century
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BcdTime {
    pub(crate) century: u8,
    pub(crate) year: u8,
    pub(crate) month: u8,
    pub(crate) day: u8,
    pub(crate) hour: u8,
    pub(crate) minute: u8,
    pub(crate) second: u8,
}

impl BcdTime {
    /// Midnight, January 1st 2000
    pub const Y2K: Self = Self {
        century: 20,
        year: 0,
        month: 1,
        day: 1,
        hour: 0,
        minute: 0,
        second: 0,
    };

    /// Construct from calendar fields
    ///
    /// # Errors
    /// Returns an error if any field is outside its calendar bounds
    pub const fn new(
        century: u8,
        year: u8,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Result<Self, InvalidTime> {
        let Ok(m) = Month::try_from_bin(month) else {
            return Err(InvalidTime);
        };
        if century > 99
            || year > 99
            || day == 0
            || day > m.length(is_leap(year))
            || hour > 23
            || minute > 59
            || second > 59
        {
            return Err(InvalidTime);
        }

        Ok(Self {
            century,
            year,
            month,
            day,
            hour,
            minute,
            second,
        })
    }

    /// Construct from the 14-digit BCD representation
    ///
    /// # Errors
    /// Returns an error if a digit exceeds 9 or a composed field is out of range
    pub const fn from_digits(digits: [u8; DIGITS]) -> Result<Self, InvalidTime> {
        let mut i = 0;
        while i < DIGITS {
            if digits[i] > 9 {
                return Err(InvalidTime);
            }
            i += 1;
        }

        Self::new(
            pair(&digits, index::CENTURY),
            pair(&digits, index::YEAR),
            pair(&digits, index::MONTH),
            pair(&digits, index::DAY),
            pair(&digits, index::HOUR),
            pair(&digits, index::MINUTE),
            pair(&digits, index::SECOND),
        )
    }

    /// Returns the 14-digit BCD representation, most significant digit first
    #[must_use]
    pub const fn digits(&self) -> [u8; DIGITS] {
        let fields = [
            self.century,
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
        ];
        let mut out = [0u8; DIGITS];
        let mut i = 0;
        while i < fields.len() {
            out[2 * i] = fields[i] / 10;
            out[2 * i + 1] = fields[i] % 10;
            i += 1;
        }
        out
    }

    /// Century, e.g. 20 for the years 2000 to 2099
    #[must_use]
    pub const fn century(&self) -> u8 {
        self.century
    }

    /// Year within the century (0 to 99)
    #[must_use]
    pub const fn year(&self) -> u8 {
        self.year
    }

    /// Month (1 to 12)
    #[must_use]
    pub const fn month(&self) -> u8 {
        self.month
    }

    /// Day of the month (1 to 31)
    #[must_use]
    pub const fn day(&self) -> u8 {
        self.day
    }

    /// Hour (0 to 23)
    #[must_use]
    pub const fn hour(&self) -> u8 {
        self.hour
    }

    /// Minute (0 to 59)
    #[must_use]
    pub const fn minute(&self) -> u8 {
        self.minute
    }

    /// Second (0 to 59)
    #[must_use]
    pub const fn second(&self) -> u8 {
        self.second
    }

    /// Day of the week, 0 for Sunday through 6 for Saturday
    #[must_use]
    pub const fn weekday(&self) -> u8 {
        // 1970-01-01 was a Thursday
        ((crate::epoch::to_epoch_seconds(self) / 86_400 + 4) % 7) as u8
    }

    pub(crate) const fn month_length(&self) -> u8 {
        match Month::try_from_bin(self.month) {
            Ok(m) => m.length(is_leap(self.year)),
            Err(_) => 31,
        }
    }

    /// Advance to the next calendar day, carrying into month, year and century
    pub(crate) fn next_day(&mut self) {
        self.day += 1;
        if self.day <= self.month_length() {
            return;
        }
        self.day = 1;
        self.month += 1;
        if self.month <= 12 {
            return;
        }
        self.month = 1;
        self.year += 1;
        if self.year > 99 {
            self.year = 0;
            self.century += 1;
        }
    }

    /// Step back to the previous calendar day, borrowing from month, year and century
    pub(crate) fn prev_day(&mut self) {
        if self.day > 1 {
            self.day -= 1;
            return;
        }
        if self.month > 1 {
            self.month -= 1;
        } else {
            self.month = 12;
            if self.year > 0 {
                self.year -= 1;
            } else {
                // Below 2000 is outside the supported range; keep the digits valid
                self.year = 99;
                self.century = self.century.saturating_sub(1);
            }
        }
        self.day = self.month_length();
    }
}

impl Default for BcdTime {
    fn default() -> Self {
        Self::Y2K
    }
}

const fn pair(digits: &[u8; DIGITS], at: usize) -> u8 {
    digits[at] * 10 + digits[at + 1]
}

/// Writes a two-digit field with a leading zero
pub(crate) fn write_pair<W>(f: &mut Formatter<'_, W>, value: u8) -> Result<(), W::Error>
where
    W: uWrite + ?Sized,
{
    f.write_char(char::from(b'0' + value / 10 % 10))?;
    f.write_char(char::from(b'0' + value % 10))
}

/// ISO-8601, e.g. `2024-03-15T09:05:07`
impl uDisplay for BcdTime {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        write_pair(f, self.century)?;
        write_pair(f, self.year)?;
        f.write_str("-")?;
        write_pair(f, self.month)?;
        f.write_str("-")?;
        write_pair(f, self.day)?;
        f.write_str("T")?;
        write_pair(f, self.hour)?;
        f.write_str(":")?;
        write_pair(f, self.minute)?;
        f.write_str(":")?;
        write_pair(f, self.second)
    }
}
