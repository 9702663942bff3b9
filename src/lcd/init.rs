//! Display configuration and the power-on initialization sequence

use embedded_hal::delay::DelayNs;

use crate::{
    command::{CommandSet, Font, LineMode, MoveDirection, ShiftType, State},
    lcd::{Lcd, Lines},
    sender::{BusyWait, SendCommand},
    Error,
};

/// [`Config`] is the init config of a [`Lcd`]
pub struct Config {
    lines: Lines,
    line_mode: LineMode,
    font: Font,
    display: State,
    cursor: State,
    cursor_blink: State,
    direction: MoveDirection,
    shift_type: ShiftType,
    busy_wait: BusyWait,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lines: Lines::Two,
            line_mode: LineMode::TwoLine,
            font: Font::Font5x8,
            display: State::On,
            cursor: State::Off,
            cursor_blink: State::Off,
            direction: MoveDirection::LeftToRight,
            shift_type: ShiftType::CursorOnly,
            busy_wait: BusyWait::Spin,
        }
    }
}

#[allow(missing_docs)]
impl Config {
    pub fn set_lines(mut self, lines: Lines) -> Self {
        self.lines = lines;
        self
    }

    pub fn set_line_mode(mut self, line_mode: LineMode) -> Self {
        self.line_mode = line_mode;
        self
    }

    pub fn set_font(mut self, font: Font) -> Self {
        self.font = font;
        self
    }

    pub fn set_display_state(mut self, display: State) -> Self {
        self.display = display;
        self
    }

    pub fn set_cursor_state(mut self, cursor: State) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn set_cursor_blink(mut self, blink: State) -> Self {
        self.cursor_blink = blink;
        self
    }

    pub fn set_direction(mut self, direction: MoveDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn set_shift_type(mut self, shift_type: ShiftType) -> Self {
        self.shift_type = shift_type;
        self
    }

    pub fn set_busy_wait(mut self, busy_wait: BusyWait) -> Self {
        self.busy_wait = busy_wait;
        self
    }
}

impl<'a, 'b, Sender, Delayer> Lcd<'a, 'b, Sender, Delayer>
where
    Sender: SendCommand<Delayer>,
    Delayer: DelayNs,
{
    /// Create an [`Lcd`] driver and initialize the hardware
    ///
    /// The power-on sequence is a hardware contract: the controller wakes
    /// in an ambiguous interface width and the fixed nibble pulses below,
    /// with their delays, are the only way to force it into 4-bit mode.
    /// Reordering or shortening any step risks locking it into 8-bit
    /// mode.
    pub fn new(
        sender: &'a mut Sender,
        delayer: &'b mut Delayer,
        config: Config,
        poll_interval_us: u32,
    ) -> Result<Self, Error> {
        let wait = config.busy_wait;

        // the busy flag is not readable yet, so the reset pulses are
        // gated on fixed delays alone
        sender.delay_and_send(CommandSet::InterfaceNibble(0x3).into(), delayer, 15_000);
        sender.delay_and_send(CommandSet::InterfaceNibble(0x3).into(), delayer, 5_000);
        sender.delay_and_send(CommandSet::InterfaceNibble(0x3).into(), delayer, 150);
        sender.delay_and_send(CommandSet::InterfaceNibble(0x2).into(), delayer, 5_000);

        delayer.delay_us(40);

        sender.wait_and_send(
            CommandSet::FunctionSet(config.line_mode, config.font).into(),
            delayer,
            poll_interval_us,
            wait,
        )?;

        // display off while the remaining setup runs
        sender.wait_and_send(
            CommandSet::DisplayOnOff {
                display: State::Off,
                cursor: State::Off,
                cursor_blink: State::Off,
            }
            .into(),
            delayer,
            poll_interval_us,
            wait,
        )?;

        sender.wait_and_send(
            CommandSet::DisplayOnOff {
                display: config.display,
                cursor: config.cursor,
                cursor_blink: config.cursor_blink,
            }
            .into(),
            delayer,
            poll_interval_us,
            wait,
        )?;

        sender.wait_and_send(
            CommandSet::EntryModeSet(config.direction, config.shift_type).into(),
            delayer,
            poll_interval_us,
            wait,
        )?;

        sender.wait_and_send(CommandSet::ClearDisplay.into(), delayer, poll_interval_us, wait)?;

        delayer.delay_ms(10);

        Ok(Lcd {
            sender,
            delayer,
            lines: config.lines,
            poll_interval_us,
            busy_wait: wait,
        })
    }
}
