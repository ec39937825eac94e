//! Millisecond uptime counter driven by Timer0 overflows

use core::cell::Cell;

use arduino_hal::{clock::Clock, pac::TC0, DefaultClock};
use avr_device::interrupt::Mutex;

const TIMER0_PRESCALE: u32 = 64;
const TIMER0_TOP: u32 = 256;

/// Length of one overflow in microseconds; 2048 on the 8 MHz Pro Mini
const OVERFLOW_US: u32 = TIMER0_PRESCALE * TIMER0_TOP / (DefaultClock::FREQ / 1_000_000);

/// Sub-millisecond remainder, counted in 8 us steps so it fits a byte
const REMAINDER_STEP_US: u32 = 8;
const REMAINDER_PER_OVERFLOW: u8 = ((OVERFLOW_US % 1000) / REMAINDER_STEP_US) as u8;
const REMAINDER_PER_MS: u8 = (1000 / REMAINDER_STEP_US) as u8;

#[derive(Clone, Copy)]
struct Uptime {
    ms: u32,
    remainder: u8,
}

impl Uptime {
    const ZERO: Self = Self {
        ms: 0,
        remainder: 0,
    };

    /// Uptime one timer overflow later
    const fn advanced(self) -> Self {
        let mut ms = self.ms.wrapping_add(OVERFLOW_US / 1000);
        let mut remainder = self.remainder + REMAINDER_PER_OVERFLOW;
        if remainder >= REMAINDER_PER_MS {
            remainder -= REMAINDER_PER_MS;
            ms = ms.wrapping_add(1);
        }
        Self { ms, remainder }
    }
}

static UPTIME: Mutex<Cell<Uptime>> = Mutex::new(Cell::new(Uptime::ZERO));

#[expect(clippy::allow_attributes, reason = "expect somehow doesn't work")]
#[allow(missing_docs, reason = "macro expansion breaks doc comments")]
mod internal {
    use super::UPTIME;

    #[avr_device::interrupt(atmega328p)]
    fn TIMER0_OVF() {
        avr_device::interrupt::free(|cs| {
            let uptime = UPTIME.borrow(cs);
            uptime.set(uptime.get().advanced());
        });
    }
}

/// Run Timer0 in fast PWM at clk/64 with the overflow interrupt on, and restart the count
pub fn init_millis(tc0: &TC0) {
    tc0.tccr0a().write(|w| w.wgm0().pwm_fast());
    tc0.tccr0b().write(|w| w.cs0().prescale_64());
    tc0.timsk0().write(|w| w.toie0().set_bit());

    avr_device::interrupt::free(|cs| UPTIME.borrow(cs).set(Uptime::ZERO));
}

/// Milliseconds since [`init_millis`]; wraps after about 49 days
#[must_use]
pub fn millis() -> u32 {
    avr_device::interrupt::free(|cs| UPTIME.borrow(cs).get().ms)
}
