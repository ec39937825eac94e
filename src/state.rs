//! State shared between the main loop and the button interrupt

use core::cell::{Cell, RefCell};

use critical_section::Mutex;

use crate::{display::DisplayMode, settings::Settings, time::BcdTime};

/// Everything the display is rendered from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClockState {
    /// Local time as last read from (or written to) the RTC
    pub time: BcdTime,

    /// Selected display mode
    pub mode: DisplayMode,

    /// Validated persistent settings
    pub settings: Settings,
}

/// [`ClockState`] behind a critical-section mutex
///
/// Multi-step updates go through [`SharedState::update`] so nothing ever observes them half
/// applied.
pub struct SharedState(Mutex<RefCell<ClockState>>);

impl SharedState {
    /// Shared state starting from `initial`
    #[must_use]
    pub const fn new(initial: ClockState) -> Self {
        Self(Mutex::new(RefCell::new(initial)))
    }

    /// Copy of the current state
    #[must_use]
    pub fn snapshot(&self) -> ClockState {
        critical_section::with(|cs| *self.0.borrow_ref(cs))
    }

    /// Run `f` on the state inside a single critical section
    pub fn update<R>(&self, f: impl FnOnce(&mut ClockState) -> R) -> R {
        critical_section::with(|cs| f(&mut self.0.borrow_ref_mut(cs)))
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new(ClockState::default())
    }
}

/// Front-panel buttons
#[expect(missing_docs, reason = "self-explanatory variants")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Mode,
    Sync,
}

impl Button {
    const fn mask(self) -> u8 {
        match self {
            Self::Mode => 0b01,
            Self::Sync => 0b10,
        }
    }
}

/// Turns the level of one active-low button into presses
///
/// A press counts only once the button has read released for `hold_off` milliseconds, so
/// contact bounce on either edge and a long hold each give a single press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Debounce {
    hold_off: u32,
    released_at: Option<u32>,
}

impl Debounce {
    /// Debouncer for a button that starts out released
    #[must_use]
    pub const fn new(hold_off: u32) -> Self {
        Self {
            hold_off,
            released_at: Some(0),
        }
    }

    /// Feed the level read at `now` (milliseconds); returns whether it is a new press
    pub fn update(&mut self, pressed: bool, now: u32) -> bool {
        match (pressed, self.released_at) {
            (false, None) => {
                self.released_at = Some(now);
                false
            }
            (true, Some(at)) => {
                // Held again, whether this is a real press or a bounce
                self.released_at = None;
                now.wrapping_sub(at) >= self.hold_off
            }
            (false, Some(_)) | (true, None) => false,
        }
    }
}

/// Pending button presses, posted from interrupt context
///
/// Each button is a single flag; presses that arrive before the previous one was handled
/// coalesce.
pub struct EventQueue(Mutex<Cell<u8>>);

impl EventQueue {
    /// Queue with nothing pending
    #[must_use]
    pub const fn new() -> Self {
        Self(Mutex::new(Cell::new(0)))
    }

    /// Record a press of `button`
    pub fn post(&self, button: Button) {
        critical_section::with(|cs| {
            let pending = self.0.borrow(cs);
            pending.set(pending.get() | button.mask());
        });
    }

    /// Remove and return the next pending press, mode before sync
    pub fn pop(&self) -> Option<Button> {
        critical_section::with(|cs| {
            let pending = self.0.borrow(cs);
            let flags = pending.get();
            let button = [Button::Mode, Button::Sync]
                .into_iter()
                .find(|b| flags & b.mask() != 0)?;
            pending.set(flags & !button.mask());
            Some(button)
        })
    }

    /// Remove a pending press of `button`, returning whether there was one
    pub fn take(&self, button: Button) -> bool {
        critical_section::with(|cs| {
            let pending = self.0.borrow(cs);
            let flags = pending.get();
            pending.set(flags & !button.mask());
            flags & button.mask() != 0
        })
    }

    /// Drop every pending press
    pub fn clear(&self) {
        critical_section::with(|cs| self.0.borrow(cs).set(0));
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
