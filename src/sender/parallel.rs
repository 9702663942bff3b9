use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};

use crate::{
    command::{Bits, Command, ReadWriteOp, RegisterSelection},
    sender::SendCommand,
    utils::{BitOps, BitState},
};

/// Settle time for each enable-line edge, in microseconds
///
/// The controller latches the bus on the falling edge of E; both the high
/// and the low phase must be held at least this long. Scaled by the
/// injected [`DelayNs`], never by instruction counting.
pub const E_SETTLE_US: u32 = 1;

/// Settle time after a full byte write, in microseconds
pub const POST_WRITE_SETTLE_US: u32 = 500;

/// 4-pin parallel bus sender
///
/// Drives RS, R/W and E control lines plus data lines D4-D7. The data
/// pins must be readable as well as writable (open-drain or otherwise
/// bidirectional) so the busy flag can be polled back.
pub struct ParallelSender<ControlPin, DbPin>
where
    ControlPin: OutputPin,
    DbPin: OutputPin + InputPin,
{
    rs_pin: ControlPin,
    rw_pin: ControlPin,
    en_pin: ControlPin,
    db_pins: [DbPin; 4],
}

impl<ControlPin, DbPin> ParallelSender<ControlPin, DbPin>
where
    ControlPin: OutputPin,
    DbPin: OutputPin + InputPin,
{
    /// Create a sender from its seven wires
    ///
    /// Taking ownership of the pins is what guarantees the bus is not
    /// shared with any other driver.
    pub fn new(
        rs: ControlPin,
        rw: ControlPin,
        en: ControlPin,
        db4: DbPin,
        db5: DbPin,
        db6: DbPin,
        db7: DbPin,
    ) -> Self {
        Self {
            rs_pin: rs,
            rw_pin: rw,
            en_pin: en,
            db_pins: [db4, db5, db6, db7],
        }
    }

    /// Put a nibble on the data lines and clock it in with one E pulse
    fn push_nibble(&mut self, raw_bits: u8, delayer: &mut impl DelayNs) {
        self.db_pins
            .iter_mut()
            .enumerate()
            .for_each(|(index, pin)| match raw_bits.check_bit(index as u8) {
                BitState::Set => {
                    pin.set_high().ok().unwrap();
                }
                BitState::Clear => {
                    pin.set_low().ok().unwrap();
                }
            });

        self.en_pin.set_high().ok().unwrap();
        delayer.delay_us(E_SETTLE_US);
        self.en_pin.set_low().ok().unwrap();
        delayer.delay_us(E_SETTLE_US);
    }

    /// Read a nibble back from the data lines under one E pulse
    fn fetch_nibble(&mut self, delayer: &mut impl DelayNs) -> u8 {
        self.en_pin.set_high().ok().unwrap();
        delayer.delay_us(E_SETTLE_US);

        let raw_bits = self
            .db_pins
            .iter_mut()
            .enumerate()
            // .fold() so the accumulator survives across pins
            .fold(0u8, |mut acc, (index, pin)| {
                match pin.is_high().ok().unwrap() {
                    true => acc.set_bit(index as u8),
                    false => acc.clear_bit(index as u8),
                };
                acc
            });

        self.en_pin.set_low().ok().unwrap();
        delayer.delay_us(E_SETTLE_US);

        raw_bits
    }

    /// Release the data lines so the controller can drive them
    ///
    /// In open-drain wiring, driving high releases the line.
    fn release_data_pins(&mut self) {
        self.db_pins.iter_mut().for_each(|pin| {
            pin.set_high().ok().unwrap();
        });
    }
}

impl<ControlPin, DbPin, Delayer> SendCommand<Delayer> for ParallelSender<ControlPin, DbPin>
where
    ControlPin: OutputPin,
    DbPin: OutputPin + InputPin,
    Delayer: DelayNs,
{
    fn send(&mut self, command: Command, delayer: &mut Delayer) -> Option<u8> {
        self.en_pin.set_low().ok().unwrap();

        match command.register_selection() {
            RegisterSelection::Command => {
                self.rs_pin.set_low().ok().unwrap();
            }
            RegisterSelection::Data => {
                self.rs_pin.set_high().ok().unwrap();
            }
        }

        match command.read_write_op() {
            ReadWriteOp::Write => {
                self.rw_pin.set_low().ok().unwrap();

                let bits = command.data().expect("write transaction without data");
                match bits {
                    Bits::Bit4(raw_bits) => {
                        debug_assert!(raw_bits < 1 << 4, "data wider than 4 bits");
                        self.push_nibble(raw_bits, delayer);
                    }
                    Bits::Bit8(raw_bits) => {
                        // high nibble first, per the 4-bit bus convention
                        self.push_nibble(raw_bits >> 4, delayer);
                        self.push_nibble(raw_bits & 0b1111, delayer);
                        delayer.delay_us(POST_WRITE_SETTLE_US);
                    }
                }

                None
            }
            ReadWriteOp::Read => {
                self.rw_pin.set_high().ok().unwrap();
                self.release_data_pins();

                let high_4_bits = self.fetch_nibble(delayer) << 4;
                let low_4_bits = self.fetch_nibble(delayer);

                // restore write mode before any other control-line change;
                // leaving R/W high corrupts every subsequent write
                self.rw_pin.set_low().ok().unwrap();

                Some(high_4_bits | low_4_bits)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc, vec::Vec};

    use super::*;
    use crate::command::CommandSet;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        Rs(bool),
        Rw(bool),
        En(bool),
        Db(usize, bool),
    }

    type Log = Rc<RefCell<Vec<Event>>>;

    struct LoggedPin {
        log: Log,
        id: PinId,
        level: bool,
        // level the controller drives back when this pin is read
        read_level: bool,
    }

    #[derive(Clone, Copy)]
    enum PinId {
        Rs,
        Rw,
        En,
        Db(usize),
    }

    impl LoggedPin {
        fn new(log: &Log, id: PinId) -> Self {
            Self {
                log: Rc::clone(log),
                id,
                level: false,
                read_level: false,
            }
        }

        fn record(&mut self, level: bool) {
            self.level = level;
            let event = match self.id {
                PinId::Rs => Event::Rs(level),
                PinId::Rw => Event::Rw(level),
                PinId::En => Event::En(level),
                PinId::Db(index) => Event::Db(index, level),
            };
            self.log.borrow_mut().push(event);
        }
    }

    impl embedded_hal::digital::ErrorType for LoggedPin {
        type Error = core::convert::Infallible;
    }

    impl OutputPin for LoggedPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.record(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.record(true);
            Ok(())
        }
    }

    impl InputPin for LoggedPin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(self.read_level)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.read_level)
        }
    }

    struct TotalDelay {
        total_ns: u64,
    }

    impl TotalDelay {
        fn new() -> Self {
            Self { total_ns: 0 }
        }
    }

    impl DelayNs for TotalDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ns += u64::from(ns);
        }
    }

    fn sender_with_log() -> (ParallelSender<LoggedPin, LoggedPin>, Log) {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let sender = ParallelSender::new(
            LoggedPin::new(&log, PinId::Rs),
            LoggedPin::new(&log, PinId::Rw),
            LoggedPin::new(&log, PinId::En),
            LoggedPin::new(&log, PinId::Db(0)),
            LoggedPin::new(&log, PinId::Db(1)),
            LoggedPin::new(&log, PinId::Db(2)),
            LoggedPin::new(&log, PinId::Db(3)),
        );
        (sender, log)
    }

    #[test]
    fn byte_write_sends_high_nibble_first() {
        let (mut sender, log) = sender_with_log();
        let mut delayer = TotalDelay::new();

        sender.send(
            CommandSet::FunctionSet(
                crate::command::LineMode::TwoLine,
                crate::command::Font::Font5x8,
            )
            .into(),
            &mut delayer,
        );

        // 0x28: high nibble 0b0010, low nibble 0b1000
        let expected = [
            Event::En(false),
            Event::Rs(false),
            Event::Rw(false),
            Event::Db(0, false),
            Event::Db(1, true),
            Event::Db(2, false),
            Event::Db(3, false),
            Event::En(true),
            Event::En(false),
            Event::Db(0, false),
            Event::Db(1, false),
            Event::Db(2, false),
            Event::Db(3, true),
            Event::En(true),
            Event::En(false),
        ];
        assert_eq!(log.borrow().as_slice(), expected.as_slice());
    }

    #[test]
    fn byte_write_observes_settle_times() {
        let (mut sender, _log) = sender_with_log();
        let mut delayer = TotalDelay::new();

        sender.send(CommandSet::WriteData(b'A').into(), &mut delayer);

        // two E pulses with two 1 us edges each, plus the 500 us settle
        assert_eq!(delayer.total_ns, 4 * 1_000 + 500_000);
    }

    #[test]
    fn data_write_raises_register_select() {
        let (mut sender, log) = sender_with_log();
        let mut delayer = TotalDelay::new();

        sender.send(CommandSet::WriteData(b' ').into(), &mut delayer);

        assert!(log.borrow().contains(&Event::Rs(true)));
        assert!(!log.borrow().contains(&Event::Rw(true)));
    }

    #[test]
    fn busy_read_reassembles_nibbles_and_restores_write_mode() {
        let (mut sender, log) = sender_with_log();
        let mut delayer = TotalDelay::new();

        // controller drives D7 high: busy flag set in the high nibble
        sender.db_pins[3].read_level = true;

        let status = sender.send(CommandSet::ReadBusyFlag.into(), &mut delayer);
        assert_eq!(status, Some(0x88));

        // R/W must end low so the next transaction starts in write mode
        let last_rw = log
            .borrow()
            .iter()
            .rev()
            .find_map(|event| match event {
                Event::Rw(level) => Some(*level),
                _ => None,
            })
            .unwrap();
        assert!(!last_rw);

        // data lines were released (driven high) before the first E pulse
        let events = log.borrow();
        let release_done = events
            .iter()
            .position(|&event| event == Event::Db(3, true))
            .unwrap();
        let first_pulse = events.iter().position(|&event| event == Event::En(true));
        assert!(release_done < first_pulse.unwrap());
    }

    #[test]
    fn interface_nibble_is_a_single_pulse() {
        let (mut sender, log) = sender_with_log();
        let mut delayer = TotalDelay::new();

        sender.send(CommandSet::InterfaceNibble(0x3).into(), &mut delayer);

        let pulses = log
            .borrow()
            .iter()
            .filter(|&&event| event == Event::En(true))
            .count();
        assert_eq!(pulses, 1);
        // bare nibbles get no post-byte settle
        assert_eq!(delayer.total_ns, 2 * 1_000);
    }
}
