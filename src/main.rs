//! Firmware for the GPS-disciplined ISO-8601 clock
//!
//! All clock behaviour lives in the `gpsclock` library; this binary only wires it to the board.
#![cfg_attr(target_arch = "avr", no_std)]
#![cfg_attr(target_arch = "avr", no_main)]
#![cfg_attr(target_arch = "avr", feature(abi_avr_interrupt))]

#[cfg(target_arch = "avr")]
pub mod board;
#[cfg(target_arch = "avr")]
pub mod millis;

#[cfg(target_arch = "avr")]
use core::cell::RefCell;

#[cfg(target_arch = "avr")]
use arduino_hal::{
    entry,
    hal::port::{PB1, PB2},
    port::{mode::Output, Pin},
    spi::{self, ChipSelectPin, DataOrder, SerialClockRate},
    Delay, Peripherals, Spi,
};
#[cfg(target_arch = "avr")]
use embedded_hal_bus::spi::{NoDelay, RefCellDevice};
#[cfg(target_arch = "avr")]
use gpsclock::{Clock, Ds3234, EventQueue, Intensity, Max7219, SharedState};
#[cfg(target_arch = "avr")]
use panic_halt as _;
#[cfg(target_arch = "avr")]
use ufmt::uwriteln;

#[cfg(target_arch = "avr")]
use crate::{
    board::{Buttons, EepromStore, GpsSerial},
    millis::{init_millis, millis},
};

/// GPS module baud rate
#[cfg(target_arch = "avr")]
const GPS_BAUD: u32 = 9600;

/// Time between RTC reads
#[cfg(target_arch = "avr")]
const REFRESH_INTERVAL: u32 = 100;

/// Button presses waiting for the main loop
#[cfg(target_arch = "avr")]
pub static EVENTS: EventQueue = EventQueue::new();

#[cfg(target_arch = "avr")]
type RtcDevice<'a> = RefCellDevice<'a, Spi, ChipSelectPin<PB2>, NoDelay>;
#[cfg(target_arch = "avr")]
type DisplayDevice<'a> = RefCellDevice<'a, Spi, Pin<Output, PB1>, NoDelay>;
#[cfg(target_arch = "avr")]
type Controller<'a> = Clock<
    'a,
    Ds3234<RtcDevice<'a>>,
    Max7219<DisplayDevice<'a>>,
    EepromStore,
    Delay,
    arduino_hal::usart::UsartWriter<
        arduino_hal::pac::USART0,
        Pin<arduino_hal::port::mode::Input, arduino_hal::hal::port::PD0>,
        Pin<Output, arduino_hal::hal::port::PD1>,
    >,
>;

/// GPS clock main loop state
///
/// # Pin Configuration
///
/// `PORTB`:
/// - `PB1`: max7219 LOAD
/// - `PB2`: ds3234 chip select
/// - `PB3`: SPI MOSI
/// - `PB4`: SPI MISO
/// - `PB5`: SPI SCK
///
/// `PORTC`:
/// - `PC0`: mode button (active low)
/// - `PC1`: sync button (active low)
///
/// `PORTD`:
/// - `PD0`: GPS TX
/// - `PD1`: debug serial out
#[cfg(target_arch = "avr")]
#[must_use]
pub struct GpsClock<'a> {
    clock: Controller<'a>,
    gps: GpsSerial,
    next_refresh: u32,
}

#[cfg(target_arch = "avr")]
impl GpsClock<'_> {
    /// Take the next pending button press, if any, and act on it
    fn try_handle(&mut self) {
        self.clock.handle_next(&EVENTS, &mut self.gps);
    }

    fn try_refresh(&mut self, now: u32) {
        if now.wrapping_sub(self.next_refresh) > u32::MAX / 2 {
            return;
        }
        self.next_refresh = now.wrapping_add(REFRESH_INTERVAL);

        self.clock.tick();
    }
}

#[cfg(target_arch = "avr")]
#[entry]
fn main() -> ! {
    let dp = Peripherals::take().unwrap();
    let pins = arduino_hal::pins!(dp);

    init_millis(&dp.TC0);

    let serial = arduino_hal::default_serial!(dp, pins, GPS_BAUD);
    let (gps, mut log) = serial.split();

    // ds3234 and max7219 both accept SPI mode 3
    let (spi, rtc_cs) = Spi::new(
        dp.SPI,
        pins.d13.into_output(),
        pins.d11.into_output(),
        pins.d12.into_pull_up_input(),
        pins.d10.into_output(),
        spi::Settings {
            data_order: DataOrder::MostSignificantFirst,
            clock: SerialClockRate::OscfOver16,
            mode: embedded_hal::spi::MODE_3,
        },
    );
    let bus = RefCell::new(spi);

    let Ok(rtc) = RefCellDevice::new_no_delay(&bus, rtc_cs);
    let Ok(display) = RefCellDevice::new_no_delay(&bus, pins.d9.into_output_high());

    let mut display = Max7219::new(display);
    if display.init(Intensity::default()).is_err() {
        uwriteln!(&mut log, "display init failed").ok();
    }

    Buttons::install(
        &dp.EXINT,
        pins.a0.into_pull_up_input(),
        pins.a1.into_pull_up_input(),
    );

    let state = SharedState::default();
    let mut controller = GpsClock {
        clock: Clock::new(
            &state,
            Ds3234::new(rtc),
            display,
            EepromStore(arduino_hal::Eeprom::new(dp.EEPROM)),
            Delay::new(),
            log,
        ),
        gps: GpsSerial(gps),
        next_refresh: 0,
    };

    controller.clock.start();

    // Safety: not called inside avr_device::interrupt::free
    unsafe { avr_device::interrupt::enable() };

    // Presses during the intro are dropped
    EVENTS.clear();

    loop {
        let now = millis();

        controller.try_handle();
        controller.try_refresh(now);
    }
}

#[cfg(not(target_arch = "avr"))]
fn main() {
    eprintln!("gpsclock is AVR firmware; build it for the atmega328p target");
}
