//! Persisted clock settings
//!
//! The UTC offset and display intensity survive power cycles in EEPROM. A fresh chip reads back
//! `0xFF` for both, so every raw value is validated before use and healed in storage.

use ufmt::{uDisplay, uWrite, Formatter};

use crate::io::SettingsStore;

/// Offset from UTC in tenths of an hour
///
/// Always a multiple of 5 (half an hour) within `[-120, 120]`; e.g. `95` is +09:30
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Offset(i8);

impl Offset {
    /// Largest offset, +12:00
    pub const MAX: Self = Self(120);

    /// Smallest offset, -12:00
    pub const MIN: Self = Self(-120);

    /// No offset
    pub const UTC: Self = Self(0);

    const STEP: i8 = 5;

    /// Construct from tenths of an hour
    ///
    /// # Errors
    /// Returns the raw value if it is out of range or not a multiple of 5
    pub const fn new(tenths: i8) -> Result<Self, i8> {
        if tenths % Self::STEP == 0 && tenths >= Self::MIN.0 && tenths <= Self::MAX.0 {
            Ok(Self(tenths))
        } else {
            Err(tenths)
        }
    }

    /// Offset in tenths of an hour
    #[must_use]
    pub const fn tenths(self) -> i8 {
        self.0
    }

    /// Offset in minutes
    #[must_use]
    pub const fn minutes(self) -> i16 {
        self.0 as i16 * 6
    }

    /// Advance by half an hour, wrapping from +12:00 to -12:00
    pub const fn cycle(self) -> Self {
        if self.0 >= Self::MAX.0 {
            Self::MIN
        } else {
            Self(self.0 + Self::STEP)
        }
    }

    /// Byte representation for storage
    #[must_use]
    pub const fn to_raw(self) -> u8 {
        self.0 as u8
    }
}

/// Signed hours, e.g. `+9.5` or `-12.0`
impl uDisplay for Offset {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        let magnitude = self.0.unsigned_abs();
        f.write_char(if self.0 < 0 { '-' } else { '+' })?;
        uDisplay::fmt(&(magnitude / 10), f)?;
        f.write_char('.')?;
        f.write_char(char::from(b'0' + magnitude % 10))
    }
}

/// Display brightness, `0` (dimmest) to `15` (brightest)
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intensity(u8);

impl Intensity {
    /// Brightest setting
    pub const MAX: Self = Self(15);

    /// Construct from a duty-cycle level
    ///
    /// # Errors
    /// Returns the raw value if it exceeds 15
    pub const fn new(level: u8) -> Result<Self, u8> {
        if level <= Self::MAX.0 {
            Ok(Self(level))
        } else {
            Err(level)
        }
    }

    /// Duty-cycle level
    #[must_use]
    pub const fn level(self) -> u8 {
        self.0
    }

    /// Next level up, wrapping from 15 to 0
    pub const fn cycle(self) -> Self {
        if self.0 >= Self::MAX.0 {
            Self(0)
        } else {
            Self(self.0 + 1)
        }
    }
}

impl Default for Intensity {
    fn default() -> Self {
        Self(8)
    }
}

impl uDisplay for Intensity {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        uDisplay::fmt(&self.0, f)
    }
}

/// Interpret a stored byte as an [`Offset`], falling back to UTC
///
/// The byte is the two's complement `i8` written by [`Offset::to_raw`]
pub const fn validate_offset(raw: u8) -> Offset {
    match Offset::new(raw as i8) {
        Ok(offset) => offset,
        Err(_) => Offset::UTC,
    }
}

/// Interpret a stored byte as an [`Intensity`], falling back to the default of 8
pub fn validate_intensity(raw: u8) -> Intensity {
    Intensity::new(raw).unwrap_or_default()
}

/// Saved clock settings state, restored at boot
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Settings {
    /// Offset applied to GPS time before it is written to the RTC
    pub offset: Offset,

    /// Display brightness
    pub intensity: Intensity,
}

impl Settings {
    /// Read and validate the settings from `store`
    ///
    /// Values that failed validation are written back in their normalized form, so an
    /// uninitialized store heals on first boot.
    pub fn load<S: SettingsStore>(store: &mut S) -> Self {
        let raw_offset = store.read_raw_offset();
        let raw_intensity = store.read_raw_intensity();

        let settings = Self {
            offset: validate_offset(raw_offset),
            intensity: validate_intensity(raw_intensity),
        };

        if settings.offset.to_raw() != raw_offset {
            store.write_raw_offset(settings.offset.to_raw());
        }
        if settings.intensity.level() != raw_intensity {
            store.write_raw_intensity(settings.intensity.level());
        }

        settings
    }

    /// Persist the offset if it differs from the stored value
    pub fn save_offset<S: SettingsStore>(&self, store: &mut S) {
        if store.read_raw_offset() != self.offset.to_raw() {
            store.write_raw_offset(self.offset.to_raw());
        }
    }

    /// Persist the intensity if it differs from the stored value
    pub fn save_intensity<S: SettingsStore>(&self, store: &mut S) {
        if store.read_raw_intensity() != self.intensity.level() {
            store.write_raw_intensity(self.intensity.level());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Log, MemoryStore};

    #[test]
    fn offset_accepts_half_hours_within_twelve_hours() {
        for tenths in (-120..=120).step_by(5) {
            assert_eq!(validate_offset(tenths as i8 as u8).tenths(), tenths as i8);
        }
    }

    #[test]
    fn offset_rejects_invalid_raw_values() {
        assert_eq!(validate_offset(125), Offset::UTC);
        assert_eq!(validate_offset((-125i8) as u8), Offset::UTC);
        assert_eq!(validate_offset(7), Offset::UTC);
        assert_eq!(validate_offset(0xFF), Offset::UTC);
    }

    #[test]
    fn intensity_defaults_to_eight() {
        assert_eq!(validate_intensity(16).level(), 8);
        assert_eq!(validate_intensity(255).level(), 8);
        assert_eq!(validate_intensity(15).level(), 15);
        assert_eq!(validate_intensity(0).level(), 0);
    }

    #[test]
    fn cycling_wraps() {
        assert_eq!(Offset::MAX.cycle(), Offset::MIN);
        assert_eq!(Offset::new(-5).unwrap().cycle(), Offset::UTC);
        assert_eq!(Intensity::MAX.cycle().level(), 0);
        assert_eq!(Intensity::default().cycle().level(), 9);
    }

    #[test]
    fn load_heals_uninitialized_store() {
        let mut store = MemoryStore::new(0xFF, 0xFF);
        let settings = Settings::load(&mut store);
        assert_eq!(settings, Settings::default());
        assert_eq!((store.offset, store.intensity), (0, 8));
        assert_eq!(store.writes, 2);

        // Second boot reads back valid values and writes nothing
        let settings = Settings::load(&mut store);
        assert_eq!(settings, Settings::default());
        assert_eq!(store.writes, 2);
    }

    #[test]
    fn load_keeps_valid_values() {
        let mut store = MemoryStore::new((-35i8) as u8, 3);
        let settings = Settings::load(&mut store);
        assert_eq!(settings.offset.tenths(), -35);
        assert_eq!(settings.intensity.level(), 3);
        assert_eq!(store.writes, 0);
    }

    #[test]
    fn save_only_writes_changes() {
        let mut store = MemoryStore::new(0, 8);
        let mut settings = Settings::load(&mut store);
        settings.save_offset(&mut store);
        assert_eq!(store.writes, 0);

        settings.offset = Offset::new(55).unwrap();
        settings.save_offset(&mut store);
        assert_eq!((store.offset, store.writes), (55, 1));
    }

    #[test]
    fn offset_formats_as_signed_hours() {
        let mut log = Log::default();
        ufmt::uwrite!(&mut log, "{} {} {}", Offset::MIN, Offset::new(95).unwrap(), Offset::UTC).unwrap();
        assert_eq!(log.as_str(), "-12.0 +9.5 +0.0");
    }
}
