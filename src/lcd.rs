//! High-level LCD driver
//!
//! [`Lcd`] frames every interaction with the display as busy-gated
//! command/data writes through a [`SendCommand`] sender. The driver keeps
//! no software copy of the cursor: every positioned write issues an
//! explicit set-DDRAM-address command first, so the hardware's own
//! address counter is the single source of truth.

use core::fmt::Write as _;

use embedded_hal::delay::DelayNs;

use crate::{
    command::{line_base_addr, CommandSet},
    sender::{BusyWait, SendCommand},
    Error,
};

mod init;

pub use init::Config;

/// Number of DDRAM cells per controller line
const LINE_CAPACITY: u8 = 40;

/// Physical row count of the attached module
///
/// This is display geometry, not the controller's line mode: 4-line
/// modules still run the controller in two-line mode and fold their
/// extra rows into the line address space (see
/// [`line_base_addr`](crate::command::line_base_addr)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Lines {
    /// 1602-class modules, rows 0 and 1
    #[default]
    Two,
    /// 2004-class modules, rows 0 through 3
    Four,
}

impl Lines {
    fn row_count(self) -> u8 {
        match self {
            Lines::Two => 2,
            Lines::Four => 4,
        }
    }
}

/// Character LCD driver over a borrowed sender and delayer
///
/// Borrowing the sender and delayer mutably for the driver's lifetime
/// serializes all bus access by construction.
pub struct Lcd<'a, 'b, Sender, Delayer>
where
    Sender: SendCommand<Delayer>,
    Delayer: DelayNs,
{
    sender: &'a mut Sender,
    delayer: &'b mut Delayer,
    lines: Lines,
    poll_interval_us: u32,
    busy_wait: BusyWait,
}

impl<'a, 'b, Sender, Delayer> Lcd<'a, 'b, Sender, Delayer>
where
    Sender: SendCommand<Delayer>,
    Delayer: DelayNs,
{
    fn command(&mut self, command: CommandSet) -> Result<(), Error> {
        self.sender.wait_and_send(
            command.into(),
            self.delayer,
            self.poll_interval_us,
            self.busy_wait,
        )?;
        Ok(())
    }

    /// Clear the entire display and home the cursor
    pub fn clear_display(&mut self) -> Result<(), Error> {
        self.command(CommandSet::ClearDisplay)
    }

    /// Home the cursor without clearing the display
    pub fn return_home(&mut self) -> Result<(), Error> {
        self.command(CommandSet::ReturnHome)
    }

    /// Move the cursor to a zero-based `(row, col)` position
    ///
    /// Rows are validated against the configured [`Lines`] geometry: a
    /// two-line panel rejects rows 2 and 3 rather than emitting a
    /// 4-line DDRAM address that would land mid-line on the hardware.
    pub fn set_cursor_pos(&mut self, pos: (u8, u8)) -> Result<(), Error> {
        let (row, col) = pos;
        if row >= self.lines.row_count() || col >= LINE_CAPACITY {
            return Err(Error::PositionOutOfRange);
        }

        self.command(CommandSet::SetDdramAddr(line_base_addr(row) | col))
    }

    /// Configured display geometry
    pub fn lines(&self) -> Lines {
        self.lines
    }

    /// Write a raw byte at the current cursor
    pub fn write_byte_to_cur(&mut self, byte: u8) -> Result<(), Error> {
        self.command(CommandSet::WriteData(byte))
    }

    /// Write a character at the current cursor
    ///
    /// The stock character ROM covers ASCII 0x20 through 0x7D; anything
    /// else renders as the full 0xFF block.
    pub fn write_char_to_cur(&mut self, char: char) -> Result<(), Error> {
        let out_byte = match char.is_ascii() {
            true if (0x20..=0x7D).contains(&(char as u8)) => char as u8,
            _ => 0xFF,
        };

        self.write_byte_to_cur(out_byte)
    }

    /// Write a string at the current cursor
    ///
    /// No wrapping or bounds checking is done; keeping the text inside
    /// the visible area is the caller's responsibility.
    pub fn write_str_to_cur(&mut self, str: &str) -> Result<(), Error> {
        for char in str.chars() {
            self.write_char_to_cur(char)?;
        }
        Ok(())
    }

    /// Write a decimal integer at the current cursor
    ///
    /// No leading zeros; negative values carry their sign.
    pub fn write_int_to_cur(&mut self, value: i32) -> Result<(), Error> {
        // 11 characters cover the widest i32, "-2147483648"
        let mut digits = heapless::String::<11>::new();
        let _ = write!(digits, "{}", value);

        self.write_str_to_cur(&digits)
    }

    /// Write a raw byte at a position
    pub fn write_byte_to_pos(&mut self, byte: u8, pos: (u8, u8)) -> Result<(), Error> {
        self.set_cursor_pos(pos)?;
        self.write_byte_to_cur(byte)
    }

    /// Write a character at a position
    pub fn write_char_to_pos(&mut self, char: char, pos: (u8, u8)) -> Result<(), Error> {
        self.set_cursor_pos(pos)?;
        self.write_char_to_cur(char)
    }

    /// Write a string at a position
    pub fn write_str_to_pos(&mut self, str: &str, pos: (u8, u8)) -> Result<(), Error> {
        self.set_cursor_pos(pos)?;
        self.write_str_to_cur(str)
    }

    /// Write a decimal integer at a position
    pub fn write_int_to_pos(&mut self, value: i32, pos: (u8, u8)) -> Result<(), Error> {
        self.set_cursor_pos(pos)?;
        self.write_int_to_cur(value)
    }

    /// Blank a region, preserving the legacy row semantics
    ///
    /// This is a literal port of the original panel firmware: the column
    /// index is NOT reset between rows, so only the first row in range
    /// actually receives spaces. Every later row gets a bare cursor move
    /// to one past the end column and no writes. Almost certainly an
    /// upstream bug, but callers exist that were written against it; use
    /// [`Lcd::clear_region_rows`] for the rectangle behavior.
    pub fn clear_region(&mut self, start: (u8, u8), end: (u8, u8)) -> Result<(), Error> {
        let mut col = start.1;

        for row in start.0..=end.0 {
            self.set_cursor_pos((row, col))?;
            while col <= end.1 {
                self.write_byte_to_cur(b' ')?;
                col += 1;
            }
        }

        Ok(())
    }

    /// Blank a rectangular region, restarting at the start column on
    /// every row
    pub fn clear_region_rows(&mut self, start: (u8, u8), end: (u8, u8)) -> Result<(), Error> {
        for row in start.0..=end.0 {
            self.set_cursor_pos((row, start.1))?;
            for _ in start.1..=end.1 {
                self.write_byte_to_cur(b' ')?;
            }
        }

        Ok(())
    }

    /// Replace the busy-flag wait policy
    pub fn set_busy_wait(&mut self, wait: BusyWait) {
        self.busy_wait = wait;
    }

    /// Current busy-flag wait policy
    pub fn busy_wait(&self) -> BusyWait {
        self.busy_wait
    }

    /// Change the busy-flag poll interval
    pub fn set_poll_interval(&mut self, interval_us: u32) {
        self.poll_interval_us = interval_us;
    }

    /// Current busy-flag poll interval in microseconds
    pub fn poll_interval_us(&self) -> u32 {
        self.poll_interval_us
    }
}
