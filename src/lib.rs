/*!
# charpanel

Drivers for a small bare-metal front panel: an HD44780-class character LCD
on a 4-bit parallel bus, and a confidence-counter debouncer for pulled-up
push buttons. Everything is polled from the caller's main loop; there is no
interrupt use, no allocation, and no internal scheduling.

Basic usage:

1. Build a "sender" for the LCD bus <br/>
    The built-in sender is the 4-pin parallel driver
    [`sender::ParallelSender`]. Any type implementing
    [`sender::SendCommand`] works, which is also the seam used for
    host-side testing.
<br/>
<br/>
2. Use [`lcd::Lcd::new()`] to create a [`lcd::Lcd`] and run the hardware
    initialization sequence
<br/>
<br/>
3. Render with the [`lcd::Lcd`] methods; poll buttons with
    [`button::ButtonPanel::poll()`] once per loop iteration
*/

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

pub mod button;
pub mod command;
pub mod lcd;
pub mod sender;
pub mod utils;

/// Errors reported by the panel drivers.
///
/// Under correct wiring and valid configuration none of these occur at
/// runtime with the default (legacy) busy-wait policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The LCD busy flag never cleared within the configured poll bound
    BusyTimeout,
    /// Button index outside the configured panel
    InvalidButtonIndex,
    /// A debounce threshold of zero would fire on every armed poll
    InvalidThreshold,
    /// Row or column outside the addressable display area
    PositionOutOfRange,
    /// The underlying GPIO pin reported an error
    Pin,
}
