//! Consumer-side command state.
//!
//! The listener's handler writes here; the console's print tick reads. The
//! cell is a single last-write-wins slot, deliberately an explicit type
//! rather than ambient shared state.

use std::sync::atomic::{AtomicI8, Ordering};

use myolink_net::Event;

/// Event kind emitted by the EMG joystick bridge.
pub const EMG_JOYSTICK_KIND: &str = "emgJoystick";

/// Joystick deflection below this magnitude counts as neutral.
pub const EMG_DEAD_ZONE: f64 = 0.05;

/// Command value that moves the paddle up.
pub const UP: i8 = -1;
/// Command value that moves the paddle down.
pub const DOWN: i8 = 1;
/// Command value that holds the paddle in place.
pub const NEUTRAL: i8 = 0;

/// Single-slot shared cell holding the most recent paddle command.
///
/// Written only from the listener's handler, read only from the consumer's
/// update tick.
#[derive(Debug, Default)]
pub struct CommandCell(AtomicI8);

impl CommandCell {
    /// Create a cell holding the neutral command.
    pub fn new() -> Self {
        Self(AtomicI8::new(NEUTRAL))
    }

    /// Store the latest command.
    pub fn store(&self, command: i8) {
        self.0.store(command, Ordering::Relaxed);
    }

    /// Load the latest command.
    pub fn load(&self) -> i8 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Map an EMG joystick event onto a paddle command.
///
/// The y axis (second value) is compared against the dead zone: positive
/// deflection moves the paddle up, negative moves it down. Returns `None`
/// for events of another kind or with fewer than two values, leaving the
/// previous command in place.
pub fn command_for(event: &Event) -> Option<i8> {
    if event.kind != EMG_JOYSTICK_KIND || event.values.len() < 2 {
        return None;
    }

    let emg_y = event.values[1];
    Some(if emg_y > EMG_DEAD_ZONE {
        UP
    } else if emg_y < -EMG_DEAD_ZONE {
        DOWN
    } else {
        NEUTRAL
    })
}
