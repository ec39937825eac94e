//! UTC offset application
//!
//! GPS always reports UTC. The configured [`Offset`] is applied once, before the time is written
//! to the RTC, carrying through minutes, hours, days, months and years.

use crate::{settings::Offset, time::BcdTime};

const MINUTES_PER_HOUR: u8 = 60;
const HOURS_PER_DAY: u8 = 24;
const HALF_HOUR: u8 = 30;

/// Shift `time` by `offset`
///
/// An offset of zero is a no-op. A half-hour component is applied first, then whole hours; each
/// step carries (or borrows) into the next day when it crosses midnight.
pub fn apply_offset(time: &mut BcdTime, offset: Offset) {
    let tenths = offset.tenths();
    let hours = tenths.unsigned_abs() / 10;
    let half = tenths % 10 != 0;

    if tenths > 0 {
        if half {
            time.minute += HALF_HOUR;
            if time.minute >= MINUTES_PER_HOUR {
                time.minute -= MINUTES_PER_HOUR;
                rollover_hour(time);
            }
        }

        time.hour += hours;
        if time.hour >= HOURS_PER_DAY {
            time.hour -= HOURS_PER_DAY;
            time.next_day();
        }
    } else if tenths < 0 {
        if half {
            if time.minute < HALF_HOUR {
                time.minute += MINUTES_PER_HOUR;
                rollunder_hour(time);
            }
            time.minute -= HALF_HOUR;
        }

        if time.hour < hours {
            time.hour += HOURS_PER_DAY;
            time.prev_day();
        }
        time.hour -= hours;
    }
}

fn rollover_hour(time: &mut BcdTime) {
    time.hour += 1;
    if time.hour == HOURS_PER_DAY {
        time.hour = 0;
        time.next_day();
    }
}

fn rollunder_hour(time: &mut BcdTime) {
    if time.hour == 0 {
        time.hour = HOURS_PER_DAY;
        time.prev_day();
    }
    time.hour -= 1;
}
