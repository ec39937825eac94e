//! Raw seven-segment patterns for pseudo-text
//!
//! Bit layout, most significant bit first: `DP A B C D E F G`
//!
//! ```text
//!   _A_
//! F|_G_|B
//! E|___|C .DP
//!    D
//! ```
//!
//! Not every letter has a recognisable rendering; the ones below are the ones used by the
//! status screens and read as a mix of upper and lower case (e.g. `N` is `n`, `T` is `t`).

/// Decimal point
pub const DP: u8 = 0b1000_0000;

/// No segments lit
pub const BLANK: u8 = 0b0000_0000;

/// Segment G only
pub const DASH: u8 = 0b0000_0001;

/// Pattern for an upper-case ASCII letter, digit, `-` or space
///
/// Unsupported characters render blank.
#[must_use]
pub const fn pattern(ch: u8) -> u8 {
    match ch {
        b'0' | b'O' => 0b0111_1110,
        b'1' | b'I' => 0b0011_0000,
        b'6' => 0b0101_1111,
        b'8' => 0b0111_1111,
        b'A' => 0b0111_0111,
        b'B' => 0b0001_1111,
        b'C' => 0b0100_1110,
        b'D' => 0b0011_1101,
        b'E' => 0b0100_1111,
        b'F' => 0b0100_0111,
        b'G' => 0b0111_1011,
        b'H' => 0b0011_0111,
        b'J' => 0b0011_1100,
        b'L' => 0b0000_1110,
        b'N' => 0b0111_0110,
        b'P' => 0b0110_0111,
        b'R' => 0b0000_0101,
        b'S' => 0b0101_1011,
        b'T' => 0b0000_1111,
        b'U' => 0b0011_1110,
        b'Y' => 0b0011_1011,
        b'-' => DASH,
        _ => BLANK,
    }
}
