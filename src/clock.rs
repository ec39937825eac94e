//! Clock controller
//!
//! Owns the peripherals and turns button presses and RTC readings into display frames. The
//! firmware drives it from its main loop: [`Clock::tick`] on a fixed interval and
//! [`Clock::handle_next`] to drain the event queue.

use embedded_hal::delay::DelayNs;
use ufmt::{uWrite, uwriteln};

use crate::{
    display::{render, scan_frame, syncing_progress, DigitBuffer, DisplayMode, Screen, SLOTS},
    io::{ByteSource, Cancel, DisplaySink, SettingsStore, TimeKeeper},
    nmea::{parse_rmc, SyncError},
    offset::apply_offset,
    settings::Settings,
    state::{Button, EventQueue, SharedState},
    time::BcdTime,
};

/// A receiver without a fix reports its firmware's default date, always before 2014
pub const MIN_SYNC_YEAR: u8 = 14;

const BANNER_MS: u32 = 2000;
const STATUS_MS: u32 = 1000;

const SCAN_PASSES: usize = 5;
const SCAN_STEP_MS: u32 = 20;

/// GPS clock state machine
#[must_use]
pub struct Clock<'a, RTC, DISP, STORE, DELAY, LOG> {
    state: &'a SharedState,

    rtc: RTC,
    display: DISP,
    store: STORE,
    delay: DELAY,
    log: LOG,

    rtc_ok: bool,
}

impl<'a, RTC, DISP, STORE, DELAY, LOG> Clock<'a, RTC, DISP, STORE, DELAY, LOG>
where
    RTC: TimeKeeper,
    DISP: DisplaySink,
    STORE: SettingsStore,
    DELAY: DelayNs,
    LOG: uWrite,
{
    /// Assemble a clock from its peripherals; nothing is touched until [`Clock::start`]
    pub const fn new(
        state: &'a SharedState,
        rtc: RTC,
        display: DISP,
        store: STORE,
        delay: DELAY,
        log: LOG,
    ) -> Self {
        Self {
            state,
            rtc,
            display,
            store,
            delay,
            log,
            rtc_ok: true,
        }
    }

    /// Load settings, then play the power-on scan and banner
    pub fn start(&mut self) {
        let settings = Settings::load(&mut self.store);
        self.state.update(|s| s.settings = settings);
        uwriteln!(
            &mut self.log,
            "offset {} intensity {}",
            settings.offset,
            settings.intensity
        )
        .ok();

        if self.display.set_intensity(settings.intensity).is_err() {
            uwriteln!(&mut self.log, "display error").ok();
        }

        // Each pass sweeps left to right and back
        for _ in 0..SCAN_PASSES {
            for slot in (0..SLOTS).chain((0..SLOTS).rev()) {
                self.show(&scan_frame(slot));
                self.delay.delay_ms(SCAN_STEP_MS);
            }
        }

        self.flash(Screen::Banner, BANNER_MS);
    }

    /// Read the RTC and redraw the display
    ///
    /// If the RTC cannot be read the previous time stays on display.
    pub fn tick(&mut self) {
        match self.rtc.read_time() {
            Ok(time) => {
                self.state.update(|s| s.time = time);
                if !self.rtc_ok {
                    uwriteln!(&mut self.log, "rtc ok").ok();
                }
                self.rtc_ok = true;
            }
            Err(_) => {
                if self.rtc_ok {
                    uwriteln!(&mut self.log, "rtc read failed").ok();
                }
                self.rtc_ok = false;
            }
        }

        self.refresh();
    }

    /// React to a button press
    ///
    /// `gps` and `cancel` are only used when the press starts a sync.
    pub fn handle<GPS, C>(&mut self, button: Button, gps: &mut GPS, cancel: C)
    where
        GPS: ByteSource,
        C: Cancel,
    {
        match button {
            Button::Mode => self.next_mode(),
            Button::Sync => match self.state.snapshot().mode {
                DisplayMode::OffsetAdjust => {
                    let offset = self.state.update(|s| {
                        s.settings.offset = s.settings.offset.cycle();
                        s.settings.offset
                    });
                    uwriteln!(&mut self.log, "offset {}", offset).ok();
                }
                DisplayMode::IntensityAdjust => {
                    let intensity = self.state.update(|s| {
                        s.settings.intensity = s.settings.intensity.cycle();
                        s.settings.intensity
                    });
                    if self.display.set_intensity(intensity).is_err() {
                        uwriteln!(&mut self.log, "display error").ok();
                    }
                    uwriteln!(&mut self.log, "intensity {}", intensity).ok();
                }
                _ => match self.sync(gps, cancel) {
                    Ok(local) => {
                        uwriteln!(&mut self.log, "sync: {}", local).ok();
                        self.flash(Screen::Success, STATUS_MS);
                    }
                    Err(e) => {
                        uwriteln!(&mut self.log, "sync failed: {}", e).ok();
                        self.flash(Screen::NoSync, STATUS_MS);
                    }
                },
            },
        }

        self.refresh();
    }

    /// Handle the oldest press pending in `events`, if any
    ///
    /// A mode press made during a sync cancels it. Sync presses made during a sync are dropped;
    /// anything else stays queued for the next call.
    pub fn handle_next<GPS: ByteSource>(&mut self, events: &EventQueue, gps: &mut GPS) {
        let Some(button) = events.pop() else {
            return;
        };
        let syncs = button == Button::Sync && self.state.snapshot().mode.shows_time();

        self.handle(button, gps, || events.take(Button::Mode));

        if syncs {
            events.take(Button::Sync);
        }
    }

    /// Set the RTC from the next RMC sentence carrying a real date
    ///
    /// Sentences from a receiver still searching for satellites are skipped while the display
    /// shows progress. On success the configured offset is applied and the RTC and shared time are
    /// updated together; otherwise the RTC is left alone. Reporting the outcome is up to the
    /// caller.
    ///
    /// # Errors
    /// See [`SyncError`]
    pub fn sync<GPS, C>(&mut self, gps: &mut GPS, mut cancel: C) -> Result<BcdTime, SyncError>
    where
        GPS: ByteSource,
        C: Cancel,
    {
        uwriteln!(&mut self.log, "sync: waiting for gps").ok();
        self.show(&Screen::Syncing.render());

        loop {
            match parse_rmc(gps, || cancel.is_cancelled()) {
                Ok(utc) if utc.year() >= MIN_SYNC_YEAR => return self.commit(utc),
                Ok(utc) => {
                    uwriteln!(&mut self.log, "sync: no fix ({})", utc).ok();
                    self.show(&syncing_progress(utc.second()));
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Convert `utc` to local time and store it in the RTC and shared state
    fn commit(&mut self, utc: BcdTime) -> Result<BcdTime, SyncError> {
        let rtc = &mut self.rtc;
        self.state.update(|s| -> Result<BcdTime, SyncError> {
            let mut local = utc;
            apply_offset(&mut local, s.settings.offset);
            rtc.write_time(&local).map_err(|_| SyncError::Rtc)?;
            s.time = local;
            Ok(local)
        })
    }

    /// Advance the mode, persisting the setting being left
    fn next_mode(&mut self) {
        let (left, settings) = self.state.update(|s| {
            let left = s.mode;
            s.mode = s.mode.next();
            (left, s.settings)
        });

        match left {
            DisplayMode::OffsetAdjust => settings.save_offset(&mut self.store),
            DisplayMode::IntensityAdjust => settings.save_intensity(&mut self.store),
            _ => {}
        }

        uwriteln!(&mut self.log, "mode {}", left.next()).ok();
    }

    /// Render the current mode from a consistent snapshot
    fn refresh(&mut self) {
        let state = self.state.snapshot();
        self.show(&render(&state.time, state.mode, &state.settings));
    }

    fn flash(&mut self, screen: Screen, ms: u32) {
        self.show(&screen.render());
        self.delay.delay_ms(ms);
    }

    fn show(&mut self, buffer: &DigitBuffer) {
        if self.display.show(buffer).is_err() {
            uwriteln!(&mut self.log, "display error").ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        display::{render_intensity, render_iso, render_offset},
        settings::{Intensity, Offset},
        state::ClockState,
        testing::{FakeDelay, FakeDisplay, FakeRtc, Log, MemoryStore, Stream, StreamError},
    };

    type TestClock<'a> = Clock<'a, FakeRtc, FakeDisplay, MemoryStore, FakeDelay, Log>;

    const FIX: &[u8] =
        b"$GPRMC,223000.000,A,3723.2475,N,12158.3416,W,0.13,309.62,311223,,,A*7E\r\n";
    // Receivers report their firmware's default date until the first fix
    const NO_FIX: &[u8] = b"$GPRMC,000012.800,V,,,,,,,060103,,,N*4D\r\n";

    fn rtc_time() -> BcdTime {
        BcdTime::new(20, 24, 3, 15, 9, 5, 7).unwrap()
    }

    fn clock(state: &SharedState, store: MemoryStore) -> TestClock<'_> {
        Clock::new(
            state,
            FakeRtc::at(rtc_time()),
            FakeDisplay::default(),
            store,
            FakeDelay::default(),
            Log::default(),
        )
    }

    fn never() -> bool {
        false
    }

    /// GPS input during which `button` is pressed once the first byte has arrived
    struct PressedDuring<'a> {
        stream: Stream,
        events: &'a EventQueue,
        button: Option<Button>,
    }

    impl<'a> PressedDuring<'a> {
        fn new(bytes: &[u8], events: &'a EventQueue, button: Button) -> Self {
            Self {
                stream: Stream::new(bytes),
                events,
                button: Some(button),
            }
        }
    }

    impl ByteSource for PressedDuring<'_> {
        type Error = StreamError;

        fn read(&mut self) -> nb::Result<u8, StreamError> {
            let byte = self.stream.read()?;
            if let Some(button) = self.button.take() {
                self.events.post(button);
            }
            Ok(byte)
        }
    }

    fn in_mode(mode: DisplayMode) -> SharedState {
        SharedState::new(ClockState {
            mode,
            ..ClockState::default()
        })
    }

    #[test]
    fn start_heals_settings_and_plays_intro() {
        let state = SharedState::default();
        let mut clock = clock(&state, MemoryStore::new(0xFF, 0xFF));
        clock.start();

        assert_eq!(state.snapshot().settings, Settings::default());
        assert_eq!((clock.store.offset, clock.store.intensity), (0, 8));
        assert_eq!(clock.display.intensity, Some(Intensity::default()));

        let frames = &clock.display.frames;
        let sweep = 2 * SLOTS;
        assert_eq!(frames.len(), SCAN_PASSES * sweep + 1);
        assert_eq!(frames[0], scan_frame(0));
        assert_eq!(frames[SLOTS - 1], scan_frame(15));
        assert_eq!(frames[SLOTS], scan_frame(15));
        assert_eq!(frames[sweep - 1], scan_frame(0));
        assert_eq!(frames[sweep], scan_frame(0));
        assert_eq!(frames.last(), Some(&Screen::Banner.render()));

        let scan_ms = (SCAN_PASSES * sweep) as u64 * u64::from(SCAN_STEP_MS);
        assert_eq!(clock.delay.total_ms(), scan_ms + u64::from(BANNER_MS));
    }

    #[test]
    fn tick_shows_rtc_time() {
        let state = SharedState::default();
        let mut clock = clock(&state, MemoryStore::new(0, 8));
        clock.tick();

        assert_eq!(state.snapshot().time, rtc_time());
        let layout = DisplayMode::default().layout().unwrap();
        assert_eq!(clock.display.last(), Some(&render_iso(&rtc_time(), layout)));
    }

    #[test]
    fn rtc_failure_keeps_previous_time() {
        let state = SharedState::default();
        let mut clock = clock(&state, MemoryStore::new(0, 8));
        clock.tick();

        clock.rtc.time = None;
        clock.tick();
        clock.tick();

        assert_eq!(state.snapshot().time, rtc_time());
        assert_eq!(clock.log.as_str(), "rtc read failed\n");
    }

    #[test]
    fn mode_button_cycles_and_persists_adjustments() {
        let state = in_mode(DisplayMode::OffsetAdjust);
        let mut clock = clock(&state, MemoryStore::new(0, 8));
        let mut gps = Stream::new(b"");

        clock.handle(Button::Sync, &mut gps, never);
        clock.handle(Button::Sync, &mut gps, never);
        assert_eq!(clock.display.last(), Some(&render_offset(Offset::new(10).unwrap())));
        // Adjusting alone does not write the EEPROM
        assert_eq!(clock.store.writes, 0);

        clock.handle(Button::Mode, &mut gps, never);
        assert_eq!(state.snapshot().mode, DisplayMode::IntensityAdjust);
        assert_eq!((clock.store.offset, clock.store.writes), (10, 1));

        clock.handle(Button::Sync, &mut gps, never);
        assert_eq!(clock.display.intensity, Some(Intensity::new(9).unwrap()));
        assert_eq!(clock.display.last(), Some(&render_intensity(Intensity::new(9).unwrap())));

        clock.handle(Button::Mode, &mut gps, never);
        assert_eq!(state.snapshot().mode, DisplayMode::IsoCombined);
        assert_eq!((clock.store.intensity, clock.store.writes), (9, 2));
        assert_eq!(gps.consumed(), 0);
    }

    #[test]
    fn offset_wraps_at_twelve_hours() {
        let state = SharedState::new(ClockState {
            mode: DisplayMode::OffsetAdjust,
            settings: Settings {
                offset: Offset::MAX,
                ..Settings::default()
            },
            ..ClockState::default()
        });
        let mut clock = clock(&state, MemoryStore::new(120, 8));
        clock.handle(Button::Sync, &mut Stream::new(b""), never);
        assert_eq!(state.snapshot().settings.offset, Offset::MIN);
    }

    #[test]
    fn sync_applies_offset_before_writing_rtc() {
        let state = SharedState::new(ClockState {
            settings: Settings {
                offset: Offset::new(15).unwrap(),
                ..Settings::default()
            },
            ..ClockState::default()
        });
        let mut clock = clock(&state, MemoryStore::new(15, 8));
        let mut gps = Stream::new(FIX);

        let local = clock.sync(&mut gps, never).unwrap();

        // 22:30 UTC on New Year's Eve plus 1.5 hours
        let expected = BcdTime::new(20, 24, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(local, expected);
        assert_eq!(clock.rtc.writes, [expected]);
        assert_eq!(state.snapshot().time, expected);
        assert!(clock.display.showed(&Screen::Syncing.render()));
    }

    #[test]
    fn sync_button_reports_success() {
        let state = SharedState::default();
        let mut clock = clock(&state, MemoryStore::new(0, 8));
        clock.handle(Button::Sync, &mut Stream::new(FIX), never);

        let local = BcdTime::new(20, 23, 12, 31, 22, 30, 0).unwrap();
        assert_eq!(clock.rtc.writes, [local]);
        assert!(clock.display.showed(&Screen::Success.render()));
        assert!(!clock.display.showed(&Screen::NoSync.render()));
        assert_eq!(clock.delay.total_ms(), u64::from(STATUS_MS));
        assert!(clock.log.as_str().ends_with("sync: 2023-12-31T22:30:00\n"));
    }

    #[test]
    fn sync_waits_for_a_fix() {
        let state = SharedState::default();
        let mut clock = clock(&state, MemoryStore::new(0, 8));
        let mut input = NO_FIX.to_vec();
        input.extend_from_slice(NO_FIX);
        input.extend_from_slice(FIX);
        let mut gps = Stream::new(&input);

        let local = clock.sync(&mut gps, never).unwrap();
        assert_eq!(local, BcdTime::new(20, 23, 12, 31, 22, 30, 0).unwrap());
        assert_eq!(clock.rtc.writes.len(), 1);
        assert!(clock.display.showed(&syncing_progress(12)));
    }

    #[test]
    fn cancelled_sync_leaves_rtc_alone() {
        let state = SharedState::default();
        let mut clock = clock(&state, MemoryStore::new(0, 8));
        clock.tick();
        let mut gps = Stream::new(NO_FIX);

        let mut polls = 0;
        let result = clock.sync(&mut gps, || {
            polls += 1;
            polls > 200
        });

        assert_eq!(result, Err(SyncError::Cancelled));
        assert!(clock.rtc.writes.is_empty());
        assert_eq!(state.snapshot().time, rtc_time());
        assert!(!clock.display.showed(&Screen::Success.render()));
    }

    #[test]
    fn garbage_from_gps_shows_no_sync() {
        let state = SharedState::default();
        let mut clock = clock(&state, MemoryStore::new(0, 8));
        clock.handle(Button::Sync, &mut Stream::new(b"$GPRMC,12:00:00"), never);

        assert!(clock.rtc.writes.is_empty());
        assert!(clock.display.showed(&Screen::NoSync.render()));
        assert_eq!(clock.delay.total_ms(), u64::from(STATUS_MS));
        assert!(clock.log.as_str().ends_with("sync failed: invalid data\n"));
        // Back to the time afterwards
        let layout = DisplayMode::default().layout().unwrap();
        assert_eq!(clock.display.last(), Some(&render_iso(&BcdTime::Y2K, layout)));
    }

    #[test]
    fn sync_queued_with_mode_is_kept() {
        let state = SharedState::default();
        let mut clock = clock(&state, MemoryStore::new(0, 8));
        let events = EventQueue::new();
        events.post(Button::Mode);
        events.post(Button::Sync);

        clock.handle_next(&events, &mut Stream::new(b""));
        assert_eq!(state.snapshot().mode, DisplayMode::IsoCentered);
        assert_eq!(events.pop(), Some(Button::Sync));
    }

    #[test]
    fn sync_presses_during_sync_are_dropped() {
        let state = SharedState::default();
        let mut clock = clock(&state, MemoryStore::new(0, 8));
        let events = EventQueue::new();
        events.post(Button::Sync);

        let mut gps = PressedDuring::new(FIX, &events, Button::Sync);
        clock.handle_next(&events, &mut gps);

        assert_eq!(clock.rtc.writes.len(), 1);
        assert_eq!(events.pop(), None);
    }

    #[test]
    fn mode_press_cancels_sync() {
        let state = SharedState::default();
        let mut clock = clock(&state, MemoryStore::new(0, 8));
        let events = EventQueue::new();
        events.post(Button::Sync);

        let mut gps = PressedDuring::new(FIX, &events, Button::Mode);
        clock.handle_next(&events, &mut gps);

        assert!(clock.rtc.writes.is_empty());
        assert!(clock.display.showed(&Screen::NoSync.render()));
        // The press was spent on cancelling
        assert_eq!(state.snapshot().mode, DisplayMode::default());
        assert_eq!(events.pop(), None);
    }

    #[test]
    fn sync_press_while_adjusting_keeps_queue() {
        let state = in_mode(DisplayMode::OffsetAdjust);
        let mut clock = clock(&state, MemoryStore::new(0, 8));
        let events = EventQueue::new();
        events.post(Button::Sync);

        clock.handle_next(&events, &mut Stream::new(b""));
        assert_eq!(state.snapshot().settings.offset, Offset::new(5).unwrap());

        events.post(Button::Sync);
        clock.handle_next(&events, &mut Stream::new(b""));
        assert_eq!(state.snapshot().settings.offset, Offset::new(10).unwrap());
    }
}
