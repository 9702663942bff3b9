//! Push-button debouncing
//!
//! Converts a noisy, pulled-up mechanical switch into a single clean
//! event per physical press. A button is considered pressed on release
//! (rising edge): the line going low arms the button, and the event
//! fires once the line has read high for an unbroken run of polls.
//!
//! Debounce duration is tied to the caller's polling rate, not to a
//! timer: with the default threshold of 200, a loop polling every 50 µs
//! needs 10 ms of clean release before the event fires. Call
//! [`ButtonPanel::poll`] once per button per loop iteration.
//!
//! ```text
//! line    1111111111110101010110000000000000001010101001111111...111
//! armed   0000000000001111111111111111111111111111111111111111...000
//! fired   0000000000000000000000000000000000000000000000000000...100
//! ```

use embedded_hal::digital::InputPin;

use crate::Error;

/// Default number of consecutive released polls required before a press
/// event fires
pub const CONFIDENCE_THRESHOLD: u16 = 200;

/// One debounced button slot
struct Button<P> {
    pin: P,
    armed: bool,
    release_confidence: u16,
}

/// A fixed bank of debounced buttons sharing one confidence threshold
///
/// The pins are expected to be configured as pull-up inputs before they
/// are handed over; taking ownership here is what makes conflicting pin
/// claims impossible.
pub struct ButtonPanel<P, const N: usize> {
    buttons: [Button<P>; N],
    threshold: u16,
}

impl<P: InputPin, const N: usize> ButtonPanel<P, N> {
    /// Bind N input pins as buttons with the default threshold
    pub fn new(pins: [P; N]) -> Self {
        Self {
            buttons: pins.map(|pin| Button {
                pin,
                armed: false,
                release_confidence: 0,
            }),
            threshold: CONFIDENCE_THRESHOLD,
        }
    }

    /// Bind N input pins as buttons with an explicit threshold
    ///
    /// The threshold must be at least 1; a zero threshold would report a
    /// press on every poll while armed.
    pub fn with_threshold(pins: [P; N], threshold: u16) -> Result<Self, Error> {
        if threshold == 0 {
            return Err(Error::InvalidThreshold);
        }

        let mut panel = Self::new(pins);
        panel.threshold = threshold;
        Ok(panel)
    }

    /// Number of configured buttons
    pub fn len(&self) -> usize {
        N
    }

    /// Whether the panel has no buttons
    pub fn is_empty(&self) -> bool {
        N == 0
    }

    /// Sample one button and report whether a debounced press completed
    ///
    /// Returns `Ok(true)` exactly once per physical press-release cycle:
    /// on the poll where the released line has been read high for the
    /// threshold-th consecutive time. Any low reading while armed (a
    /// bounce, or the button still held) restarts the count.
    pub fn poll(&mut self, index: usize) -> Result<bool, Error> {
        let button = self
            .buttons
            .get_mut(index)
            .ok_or(Error::InvalidButtonIndex)?;

        // active low: pressed pulls the line to ground
        let down = button.pin.is_low().map_err(|_| Error::Pin)?;

        if !button.armed && down {
            button.armed = true;
        }

        if button.armed {
            if down {
                button.release_confidence = 0;
            } else {
                button.release_confidence += 1;
                if button.release_confidence >= self.threshold {
                    button.armed = false;
                    button.release_confidence = 0;
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use std::vec::Vec;

    use super::*;

    /// Replays a scripted level sequence, holding the last level once
    /// the script runs out (true = electrically high = released)
    struct LevelPin {
        levels: Vec<bool>,
        cursor: usize,
    }

    impl LevelPin {
        fn new(levels: impl IntoIterator<Item = bool>) -> Self {
            Self {
                levels: levels.into_iter().collect(),
                cursor: 0,
            }
        }

        fn held(level: bool) -> Self {
            Self::new([level])
        }
    }

    impl embedded_hal::digital::ErrorType for LevelPin {
        type Error = core::convert::Infallible;
    }

    impl InputPin for LevelPin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            let level = self.levels[self.cursor.min(self.levels.len() - 1)];
            self.cursor += 1;
            Ok(level)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            self.is_high().map(|level| !level)
        }
    }

    const THRESHOLD: u16 = 5;

    fn panel_with_script(
        levels: impl IntoIterator<Item = bool>,
    ) -> ButtonPanel<LevelPin, 1> {
        ButtonPanel::with_threshold([LevelPin::new(levels)], THRESHOLD).unwrap()
    }

    #[test]
    fn unpressed_line_never_fires() {
        let mut panel = ButtonPanel::new([LevelPin::held(true)]);

        for _ in 0..10_000 {
            assert_eq!(panel.poll(0), Ok(false));
        }
        assert!(!panel.buttons[0].armed);
    }

    #[test]
    fn press_fires_exactly_once_at_the_threshold_poll() {
        // one low poll arms, then the line stays high
        let mut panel = panel_with_script([false, true]);

        let fired: Vec<usize> = (0..50)
            .filter(|_| panel.poll(0).unwrap())
            .collect();

        // poll 0 arms; polls 1..=5 count the release; the 5th high poll
        // (overall poll index 5) fires
        assert_eq!(fired, [5]);
        assert!(!panel.buttons[0].armed);
    }

    #[test]
    fn bounce_resets_the_confidence_count() {
        let mut script = vec![false]; // press
        script.extend([true; (THRESHOLD - 1) as usize]); // almost released
        script.push(false); // bounce
        script.extend([true; (THRESHOLD - 1) as usize]); // almost again
        let interrupted_len = script.len();
        script.extend([true; THRESHOLD as usize]); // finally clean

        let mut panel = panel_with_script(script);

        for _ in 0..interrupted_len {
            assert_eq!(panel.poll(0), Ok(false));
        }

        // the unbroken run: the bounce left confidence at THRESHOLD - 1,
        // so one more high poll completes it
        assert_eq!(panel.poll(0), Ok(true));
        assert_eq!(panel.poll(0), Ok(false));
    }

    #[test]
    fn holding_the_button_keeps_it_armed() {
        let mut panel = panel_with_script([false]);

        for _ in 0..1_000 {
            assert_eq!(panel.poll(0), Ok(false));
        }
        assert!(panel.buttons[0].armed);
        assert_eq!(panel.buttons[0].release_confidence, 0);
    }

    #[test]
    fn second_press_fires_a_second_event() {
        let mut script = vec![false];
        script.extend([true; THRESHOLD as usize]);
        script.push(false);
        script.extend([true; THRESHOLD as usize]);

        let mut panel = panel_with_script(script);

        let fired = (0..12).filter(|_| panel.poll(0).unwrap()).count();
        assert_eq!(fired, 2);
    }

    #[test]
    fn buttons_debounce_independently() {
        let pressed = LevelPin::new([false, true, true, true, true, true]);
        let idle = LevelPin::held(true);
        let mut panel = ButtonPanel::with_threshold([pressed, idle], THRESHOLD).unwrap();

        let mut fired = [0usize; 2];
        for _ in 0..10 {
            for (index, count) in fired.iter_mut().enumerate() {
                if panel.poll(index).unwrap() {
                    *count += 1;
                }
            }
        }

        assert_eq!(fired, [1, 0]);
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut panel = ButtonPanel::new([LevelPin::held(true)]);
        assert_eq!(panel.poll(1), Err(Error::InvalidButtonIndex));
        assert_eq!(panel.poll(usize::MAX), Err(Error::InvalidButtonIndex));
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let result = ButtonPanel::with_threshold([LevelPin::held(true)], 0);
        assert!(matches!(result, Err(Error::InvalidThreshold)));
    }
}
