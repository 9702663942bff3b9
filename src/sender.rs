//! Bus transfer and busy-flag polling
//! The built-in sender is [`ParallelSender`]; to drive different wiring
//! (or a test double), implement the [`SendCommand`] trait.

use embedded_hal::delay::DelayNs;

use crate::{
    command::{Command, CommandSet},
    utils::{BitOps, BitState},
    Error,
};

mod parallel;

pub use parallel::ParallelSender;

/// Busy-flag wait policy
///
/// The controller has no failure reporting of its own: a disconnected or
/// miswired module simply never clears its busy flag. [`BusyWait::Spin`]
/// preserves that legacy behavior and hangs forever;
/// [`BusyWait::Timeout`] bounds the wait and reports
/// [`Error::BusyTimeout`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusyWait {
    /// Spin on the busy flag with no bound
    #[default]
    Spin,
    /// Give up after this many busy polls
    Timeout {
        /// Maximum number of busy-flag reads before reporting an error
        max_polls: u32,
    },
}

/// [`SendCommand`] is the trait a sender implements to move commands and
/// data over the physical bus
pub trait SendCommand<Delayer: DelayNs> {
    /// Execute one bus transaction described by a [`Command`],
    /// returning the byte read back for read transactions
    fn send(&mut self, command: Command, delayer: &mut Delayer) -> Option<u8>;

    /// Wait a fixed duration, then send
    ///
    /// Used only during initialization, before the busy flag is readable.
    fn delay_and_send(
        &mut self,
        command: Command,
        delayer: &mut Delayer,
        delay_us: u32,
    ) -> Option<u8> {
        delayer.delay_us(delay_us);
        self.send(command, delayer)
    }

    /// Wait until the controller is idle, then send
    fn wait_and_send(
        &mut self,
        command: Command,
        delayer: &mut Delayer,
        poll_interval_us: u32,
        wait: BusyWait,
    ) -> Result<Option<u8>, Error> {
        self.wait_for_idle(delayer, poll_interval_us, wait)?;
        Ok(self.send(command, delayer))
    }

    /// Poll the busy flag until it clears, per the configured policy
    fn wait_for_idle(
        &mut self,
        delayer: &mut Delayer,
        poll_interval_us: u32,
        wait: BusyWait,
    ) -> Result<(), Error> {
        match wait {
            BusyWait::Spin => {
                while self.check_busy(delayer) {
                    delayer.delay_us(poll_interval_us);
                }
                Ok(())
            }
            BusyWait::Timeout { max_polls } => {
                for _ in 0..max_polls {
                    if !self.check_busy(delayer) {
                        return Ok(());
                    }
                    delayer.delay_us(poll_interval_us);
                }
                Err(Error::BusyTimeout)
            }
        }
    }

    /// Read the busy flag once
    fn check_busy(&mut self, delayer: &mut Delayer) -> bool {
        let status = self.send(CommandSet::ReadBusyFlag.into(), delayer);
        matches!(
            status,
            Some(byte) if byte.check_bit(7) == BitState::Set
        )
    }
}
