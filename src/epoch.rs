//! UNIX epoch time (seconds elapsed since midnight, January 1st 1970)

use crate::time::BcdTime;

/// Seconds from 1970-01-01T00:00:00 until 2000-01-01T00:00:00
pub const EPOCH_SECONDS_TO_2000: u64 = 946_684_800;

const SECONDS_IN_A_DAY: u64 = 86_400;
const SECONDS_IN_AN_HOUR: u64 = 3_600;
const SECONDS_IN_A_MINUTE: u64 = 60;
const DAYS_IN_4_YEARS: u64 = 4 * 365 + 1;

/// Days from the start of a 4-year block to the start of each month
///
/// Row 0 is the leap year, i.e. `year % 4 == 0`
const DAYS_TABLE: [[u16; 12]; 4] = [
    [0, 31, 60, 91, 121, 152, 182, 213, 244, 274, 305, 335],
    [366, 397, 425, 456, 486, 517, 547, 578, 609, 639, 670, 700],
    [731, 762, 790, 821, 851, 882, 912, 943, 974, 1004, 1035, 1065],
    [1096, 1127, 1155, 1186, 1216, 1247, 1277, 1308, 1339, 1369, 1400, 1430],
];

/// Seconds since the UNIX epoch
///
/// Valid for the years 2000 to 2099; the century digits are not consulted
#[must_use]
pub const fn to_epoch_seconds(time: &BcdTime) -> u64 {
    let year = time.year as u64;
    let block_days = (year / 4) * DAYS_IN_4_YEARS;
    let month_days = DAYS_TABLE[(year % 4) as usize][(time.month - 1) as usize] as u64;
    let days = block_days + month_days + (time.day as u64 - 1);

    EPOCH_SECONDS_TO_2000
        + days * SECONDS_IN_A_DAY
        + time.hour as u64 * SECONDS_IN_AN_HOUR
        + time.minute as u64 * SECONDS_IN_A_MINUTE
        + time.second as u64
}
