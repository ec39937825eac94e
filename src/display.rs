//! Display layout engine
//!
//! Maps a [`BcdTime`] and the selected [`DisplayMode`] onto a fresh 16-slot [`DigitBuffer`].
//! Slot 0 is the leftmost digit. Rendering is pure: nothing here touches hardware or keeps state
//! between calls.

use core::ops::Index;

use ufmt::{uDisplay, uWrite, Formatter};

use crate::{
    epoch::to_epoch_seconds,
    glyph,
    settings::{Intensity, Offset, Settings},
    time::{index, BcdTime, DIGITS},
};

/// Number of digits on the display
pub const SLOTS: usize = 16;

/// What a single digit shows, before the decimal point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    /// All segments off
    Blank,

    /// Segment G only
    Dash,

    /// Decimal digit `0..=9`
    Numeral(u8),

    /// Raw segment pattern, see [`glyph`]
    Segments(u8),
}

/// One display slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Digit {
    /// Segments to light
    pub glyph: Glyph,

    /// Decimal point
    pub dp: bool,
}

impl Digit {
    /// Nothing lit
    pub const BLANK: Self = Self::new(Glyph::Blank);

    /// Plain digit without decimal point
    #[must_use]
    pub const fn new(glyph: Glyph) -> Self {
        Self { glyph, dp: false }
    }

    /// Decimal numeral; values above 9 show only their last digit
    #[must_use]
    pub const fn numeral(value: u8) -> Self {
        Self::new(Glyph::Numeral(value % 10))
    }

    /// Pseudo-text character, see [`glyph::pattern`]
    #[must_use]
    pub const fn letter(ch: u8) -> Self {
        Self::new(Glyph::Segments(glyph::pattern(ch)))
    }

    /// Same digit with the decimal point set to `dp`
    #[must_use]
    pub const fn with_dp(self, dp: bool) -> Self {
        Self {
            glyph: self.glyph,
            dp,
        }
    }
}

/// A full frame for the display
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigitBuffer([Digit; SLOTS]);

impl DigitBuffer {
    /// Every slot blank
    pub const BLANK: Self = Self([Digit::BLANK; SLOTS]);

    /// Spell `text` in pseudo-text from `start`, leaving other slots unchanged
    ///
    /// Characters past the last slot are dropped.
    pub const fn spell(mut self, start: usize, text: &[u8]) -> Self {
        let mut i = 0;
        while i < text.len() && start + i < SLOTS {
            self.0[start + i] = Digit::letter(text[i]);
            i += 1;
        }
        self
    }

    /// Set a single slot
    pub fn set(&mut self, slot: usize, digit: Digit) {
        self.0[slot] = digit;
    }

    /// Slots from left to right
    pub fn iter(&self) -> impl Iterator<Item = &Digit> {
        self.0.iter()
    }
}

impl Default for DigitBuffer {
    fn default() -> Self {
        Self::BLANK
    }
}

impl Index<usize> for DigitBuffer {
    type Output = Digit;

    fn index(&self, slot: usize) -> &Digit {
        &self.0[slot]
    }
}

/// Where an ISO-8601 mode places the date and time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsoLayout {
    /// Slot of the first century digit
    pub date_offset: usize,

    /// Blank slots between the last day digit and the first hour digit
    pub time_gap: usize,

    /// Light the decimal point after each two-digit component from the year on
    pub delimiters: bool,
}

/// Selectable display modes, cycled by the mode button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// `|Y Y Y Y M M D D     h h m m s s |`
    IsoCombined,

    /// `|Y Y Y Y.M M.D D.    h h.m m.s s |`
    IsoCombinedDelimited,

    /// `|  Y Y Y Y M M D D h h m m s s   |`
    IsoCentered,

    /// `|  Y Y Y Y.M M.D D.h h.m m.s s   |`
    IsoCenteredDelimited,

    /// `|E P O C H - S S S S S S S S S S |` UNIX time
    Epoch,

    /// `|O F F S E t             ± # #.# |` UTC offset adjustment
    OffsetAdjust,

    /// `|I n t E n S I t y           # # |` brightness adjustment
    IntensityAdjust,
}

impl DisplayMode {
    const COMBINED: usize = 0;
    const CENTERED: usize = 1;

    /// Mode selected after `self` by the mode button, wrapping to the first
    pub const fn next(self) -> Self {
        match self {
            Self::IsoCombined => Self::IsoCombinedDelimited,
            Self::IsoCombinedDelimited => Self::IsoCentered,
            Self::IsoCentered => Self::IsoCenteredDelimited,
            Self::IsoCenteredDelimited => Self::Epoch,
            Self::Epoch => Self::OffsetAdjust,
            Self::OffsetAdjust => Self::IntensityAdjust,
            Self::IntensityAdjust => Self::IsoCombined,
        }
    }

    /// Date/time placement for the ISO-8601 modes
    #[must_use]
    pub const fn layout(self) -> Option<IsoLayout> {
        let (date_offset, time_gap, delimiters) = match self {
            Self::IsoCombined => (Self::COMBINED, 2, false),
            Self::IsoCombinedDelimited => (Self::COMBINED, 2, true),
            Self::IsoCentered => (Self::CENTERED, 0, false),
            Self::IsoCenteredDelimited => (Self::CENTERED, 0, true),
            Self::Epoch | Self::OffsetAdjust | Self::IntensityAdjust => return None,
        };
        Some(IsoLayout {
            date_offset,
            time_gap,
            delimiters,
        })
    }

    /// Whether the mode shows the current time (and the sync button starts a GPS sync)
    #[must_use]
    pub const fn shows_time(self) -> bool {
        !matches!(self, Self::OffsetAdjust | Self::IntensityAdjust)
    }

    const fn name(self) -> &'static str {
        match self {
            Self::IsoCombined => "iso",
            Self::IsoCombinedDelimited => "iso-delimited",
            Self::IsoCentered => "iso-centered",
            Self::IsoCenteredDelimited => "iso-centered-delimited",
            Self::Epoch => "epoch",
            Self::OffsetAdjust => "offset",
            Self::IntensityAdjust => "intensity",
        }
    }
}

impl Default for DisplayMode {
    fn default() -> Self {
        Self::IsoCombinedDelimited
    }
}

impl uDisplay for DisplayMode {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        f.write_str(self.name())
    }
}

/// Render the frame for `mode`
///
/// `time` is the time held by the RTC; `settings` supplies the values shown by the adjustment
/// modes.
pub fn render(time: &BcdTime, mode: DisplayMode, settings: &Settings) -> DigitBuffer {
    match mode {
        DisplayMode::Epoch => render_epoch(time),
        DisplayMode::OffsetAdjust => render_offset(settings.offset),
        DisplayMode::IntensityAdjust => render_intensity(settings.intensity),
        iso => match iso.layout() {
            Some(layout) => render_iso(time, layout),
            None => DigitBuffer::BLANK,
        },
    }
}

/// Date and time as ISO-8601 digits
pub fn render_iso(time: &BcdTime, layout: IsoLayout) -> DigitBuffer {
    let digits = time.digits();
    let mut buffer = DigitBuffer::BLANK;

    for (i, &value) in digits.iter().enumerate() {
        let slot = if i < index::HOUR {
            layout.date_offset + i
        } else {
            layout.date_offset + layout.time_gap + i
        };
        // The decimal point closes each pair from the year up to the minutes
        let delimit = layout.delimiters && i > index::CENTURY + 1 && i % 2 == 1 && i < DIGITS - 1;
        buffer.set(slot, Digit::numeral(value).with_dp(delimit));
    }

    buffer
}

/// Seconds since 1970 of `time` as read, zero padded to ten digits
pub fn render_epoch(time: &BcdTime) -> DigitBuffer {
    let mut buffer = DigitBuffer::BLANK.spell(0, b"EPOCH-");
    let mut seconds = to_epoch_seconds(time);
    for slot in (6..SLOTS).rev() {
        buffer.set(slot, Digit::numeral((seconds % 10) as u8));
        seconds /= 10;
    }

    buffer
}

/// Offset adjustment screen; the decimal point marks the half-hour digit
pub fn render_offset(offset: Offset) -> DigitBuffer {
    let tenths = offset.tenths();
    let magnitude = tenths.unsigned_abs();

    let mut buffer = DigitBuffer::BLANK.spell(0, b"OFFSET");
    if tenths < 0 {
        buffer.set(12, Digit::new(Glyph::Dash));
    }
    buffer.set(13, Digit::numeral(magnitude / 100));
    buffer.set(14, Digit::numeral(magnitude / 10).with_dp(true));
    buffer.set(15, Digit::numeral(magnitude));

    buffer
}

/// Brightness adjustment screen
pub fn render_intensity(intensity: Intensity) -> DigitBuffer {
    let level = intensity.level();

    let mut buffer = DigitBuffer::BLANK.spell(0, b"INTENSITY");
    if level >= 10 {
        buffer.set(14, Digit::numeral(level / 10));
    }
    buffer.set(15, Digit::numeral(level));

    buffer
}

/// Fixed pseudo-text screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// `CLOCy-dOOdLE-dOO`, shown at power-on
    Banner,

    /// `SynCIng`, shown while waiting for the GPS
    Syncing,

    /// `nO SynC`, shown when a sync attempt fails or is abandoned
    NoSync,

    /// `SUCCESS`, shown once the RTC has been set from GPS
    Success,
}

impl Screen {
    /// Frame for this screen
    pub const fn render(self) -> DigitBuffer {
        let text: &[u8] = match self {
            Self::Banner => b"CLOCY-DOODLE-DOO",
            Self::Syncing => b"SYNCING",
            Self::NoSync => b"NO SYNC",
            Self::Success => b"SUCCESS",
        };
        DigitBuffer::BLANK.spell(0, text)
    }
}

/// `SynCIng` with a decimal point stepping across the right half once per second
pub fn syncing_progress(second: u8) -> DigitBuffer {
    let mut buffer = Screen::Syncing.render();
    let slot = SLOTS / 2 + usize::from(second) % (SLOTS / 2);
    buffer.set(slot, buffer[slot].with_dp(true));
    buffer
}

/// Blank frame with only the decimal point at `slot` lit; one step of the power-on scan
pub fn scan_frame(slot: usize) -> DigitBuffer {
    let mut buffer = DigitBuffer::BLANK;
    buffer.set(slot % SLOTS, Digit::BLANK.with_dp(true));
    buffer
}
