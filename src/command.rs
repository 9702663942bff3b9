//! HD44780 command model
//!
//! [`CommandSet`] names the controller commands this driver uses, and
//! lowers into [`Command`], the raw bus transaction a
//! [`SendCommand`](crate::sender::SendCommand) implementation executes.

use crate::utils::BitOps;

/// The controller commands used by this driver
#[derive(Clone, Copy)]
pub enum CommandSet {
    /// Clear the entire display and home the cursor
    ClearDisplay,
    /// Home the cursor without clearing
    ReturnHome,
    /// Set the cursor move direction and display shift on write
    EntryModeSet(MoveDirection, ShiftType),
    /// Display, cursor and cursor-blink on/off control
    DisplayOnOff {
        /// Whole display on or off
        display: State,
        /// Underline cursor on or off
        cursor: State,
        /// Cursor blink on or off
        cursor_blink: State,
    },
    // not a command from the datasheet: the bare nibble pulses of the
    // power-on reset dance that force the controller into a known
    // interface width before real commands are possible
    /// Raw interface-width nibble used only during initialization
    InterfaceNibble(u8),
    /// Function set, always 4-bit bus on this driver
    FunctionSet(LineMode, Font),
    /// Move the cursor to a DDRAM address
    SetDdramAddr(u8),
    /// Read the busy flag and current address counter
    ReadBusyFlag,
    /// Write one byte to DDRAM at the current cursor
    WriteData(u8),
}

/// Cursor move direction after each data write
#[derive(Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MoveDirection {
    /// Decrement the address counter
    RightToLeft,
    /// Increment the address counter
    #[default]
    LeftToRight,
}

/// Whether a data write shifts the whole display along with the cursor
#[derive(Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ShiftType {
    /// Only the cursor moves
    #[default]
    CursorOnly,
    /// Display contents shift with the cursor
    CursorAndDisplay,
}

/// On/off state of a display feature
#[derive(Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Feature disabled
    Off,
    /// Feature enabled
    #[default]
    On,
}

/// Line mode reported to the controller in the function-set command
///
/// Note that 4-line modules are still two logical controller lines; the
/// extra rows are folded into the line address space (see
/// [`line_base_addr`]).
#[derive(Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineMode {
    /// Single-line addressing
    OneLine,
    /// Two-line addressing
    #[default]
    TwoLine,
}

/// Character font
#[derive(Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Font {
    /// 5x8 dot font
    #[default]
    Font5x8,
    /// 5x11 dot font, one-line modules only
    Font5x11,
}

/// DDRAM base address of a zero-based display row
///
/// Rows 2 and 3 exist only on 4-line modules; 2-line modules use rows 0
/// and 1.
pub const fn line_base_addr(row: u8) -> u8 {
    match row {
        0 => 0x00,
        1 => 0x40,
        2 => 0x14,
        _ => 0x54,
    }
}

/// A raw bus transaction: register select, read/write, and payload
pub struct Command {
    rs: RegisterSelection,
    rw: ReadWriteOp,
    data: Option<Bits>, // read commands have their data filled by the bus
}

/// Target register of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterSelection {
    /// Instruction register
    Command,
    /// Data register
    Data,
}

/// Bus direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadWriteOp {
    /// Host drives the bus
    Write,
    /// Controller drives the bus
    Read,
}

/// Payload width of a write transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bits {
    /// A bare nibble, used only during initialization
    Bit4(u8),
    /// A full byte, sent high nibble first on the 4-bit bus
    Bit8(u8),
}

impl Command {
    pub(crate) fn new(rs: RegisterSelection, rw: ReadWriteOp, data: Option<Bits>) -> Self {
        debug_assert!(
            rw == ReadWriteOp::Read || data.is_some(),
            "write transaction without data"
        );

        Self { rs, rw, data }
    }

    /// Target register of this transaction
    pub fn register_selection(&self) -> RegisterSelection {
        self.rs
    }

    /// Bus direction of this transaction
    pub fn read_write_op(&self) -> ReadWriteOp {
        self.rw
    }

    /// Payload, present on writes
    pub fn data(&self) -> Option<Bits> {
        self.data
    }
}

impl From<CommandSet> for Command {
    fn from(command: CommandSet) -> Self {
        match command {
            CommandSet::ClearDisplay => Self::new(
                RegisterSelection::Command,
                ReadWriteOp::Write,
                Some(Bits::Bit8(0b0000_0001)),
            ),

            CommandSet::ReturnHome => Self::new(
                RegisterSelection::Command,
                ReadWriteOp::Write,
                Some(Bits::Bit8(0b0000_0010)),
            ),

            CommandSet::EntryModeSet(dir, shift) => {
                let mut raw_bits: u8 = 0b0000_0100;

                match dir {
                    MoveDirection::RightToLeft => raw_bits.clear_bit(1),
                    MoveDirection::LeftToRight => raw_bits.set_bit(1),
                };

                match shift {
                    ShiftType::CursorOnly => raw_bits.clear_bit(0),
                    ShiftType::CursorAndDisplay => raw_bits.set_bit(0),
                };

                Self::new(
                    RegisterSelection::Command,
                    ReadWriteOp::Write,
                    Some(Bits::Bit8(raw_bits)),
                )
            }

            CommandSet::DisplayOnOff {
                display,
                cursor,
                cursor_blink,
            } => {
                let mut raw_bits: u8 = 0b0000_1000;

                match display {
                    State::Off => raw_bits.clear_bit(2),
                    State::On => raw_bits.set_bit(2),
                };
                match cursor {
                    State::Off => raw_bits.clear_bit(1),
                    State::On => raw_bits.set_bit(1),
                };
                match cursor_blink {
                    State::Off => raw_bits.clear_bit(0),
                    State::On => raw_bits.set_bit(0),
                };

                Self::new(
                    RegisterSelection::Command,
                    ReadWriteOp::Write,
                    Some(Bits::Bit8(raw_bits)),
                )
            }

            CommandSet::InterfaceNibble(nibble) => {
                debug_assert!(nibble < 1 << 4, "interface pulse wider than a nibble");

                Self::new(
                    RegisterSelection::Command,
                    ReadWriteOp::Write,
                    Some(Bits::Bit4(nibble)),
                )
            }

            CommandSet::FunctionSet(line, font) => {
                // bit 4 stays clear: this driver only speaks the 4-bit bus
                let mut raw_bits: u8 = 0b0010_0000;

                match line {
                    LineMode::OneLine => raw_bits.clear_bit(3),
                    LineMode::TwoLine => raw_bits.set_bit(3),
                };

                match font {
                    Font::Font5x8 => raw_bits.clear_bit(2),
                    Font::Font5x11 => raw_bits.set_bit(2),
                };

                Self::new(
                    RegisterSelection::Command,
                    ReadWriteOp::Write,
                    Some(Bits::Bit8(raw_bits)),
                )
            }

            CommandSet::SetDdramAddr(addr) => {
                debug_assert!(addr < 1 << 7, "DDRAM address out of range");

                Self::new(
                    RegisterSelection::Command,
                    ReadWriteOp::Write,
                    Some(Bits::Bit8(0b1000_0000 | addr)),
                )
            }

            CommandSet::ReadBusyFlag => {
                Self::new(RegisterSelection::Command, ReadWriteOp::Read, None)
            }

            CommandSet::WriteData(data) => Self::new(
                RegisterSelection::Data,
                ReadWriteOp::Write,
                Some(Bits::Bit8(data)),
            ),
        }
    }
}
