//! The telemetry wire format shared by the device core and the decoder.
//!
//! Every byte on the wire is either a single nibble (`0x0..=0xF`) of a
//! measurement, or one of the three reserved [`Marker`] values. A
//! measurement is sent as its base-16 digits, least significant nibble
//! first, followed by [`Marker::Measured`]. A [`Marker::Measured`] with no
//! nibbles in front of it ends the training phase.
//!
//! A complete training and stretching cycle looks like this on the wire:
//!
//! ```text
//! START  n* MEASURED  n* MEASURED  n* MEASURED  MEASURED  ...  FINISH
//! ```

use arrayvec::ArrayVec;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Width of a single wire digit
pub const NIBBLE_BITS: u32 = 4;

/// Largest value a nibble byte can carry
pub const NIBBLE_MASK: u8 = 0x0F;

/// Number of nibbles needed to send any `u32` measurement
pub const MAX_NIBBLES: usize = (u32::BITS / NIBBLE_BITS) as usize;

/// Wire size of the longest encoded measurement, nibbles plus marker
pub const MAX_ENCODED_LEN: usize = MAX_NIBBLES + 1;

/// Reserved byte values delimiting the protocol phases.
///
/// All markers lie outside the nibble range so they can never be confused
/// with measurement digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Marker {
    /// Training begins
    Start = 0x80,
    /// End of one measurement, or of the whole training phase when no
    /// nibbles are pending
    Measured = 0x81,
    /// Stretching ends, or training was aborted
    Finish = 0x82,
}

impl Marker {
    /// The byte sent on the wire for this marker
    pub fn byte(self) -> u8 {
        self.into()
    }
}

/// Classification of a single received byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Nibble(u8),
    Marker(Marker),
    Other(u8),
}

impl From<u8> for Symbol {
    fn from(byte: u8) -> Self {
        if byte <= NIBBLE_MASK {
            return Symbol::Nibble(byte);
        }

        match Marker::try_from(byte) {
            Ok(marker) => Symbol::Marker(marker),
            Err(_) => Symbol::Other(byte),
        }
    }
}

/// Encode a measurement as its nibbles, least significant first, followed
/// by [`Marker::Measured`].
///
/// At least one nibble is always emitted, so `0` is sent as `[0x0,
/// MEASURED]` and can never be mistaken for the end of training.
pub fn encode_measurement(value: u32) -> ArrayVec<u8, MAX_ENCODED_LEN> {
    let mut encoded = ArrayVec::new();
    let mut rest = value;

    loop {
        encoded.push((rest & NIBBLE_MASK as u32) as u8);
        rest >>= NIBBLE_BITS;
        if rest == 0 {
            break;
        }
    }

    encoded.push(Marker::Measured.byte());
    encoded
}

/// The empty nibble group closing a training phase
pub fn encode_end_of_training() -> [u8; 1] {
    [Marker::Measured.byte()]
}

/// Reassemble a measurement from its nibbles, least significant first.
///
/// Callers must not pass more than [`MAX_NIBBLES`] nibbles; any excess high
/// digits are shifted out.
pub fn decode_measurement(nibbles: &[u8]) -> u32 {
    nibbles
        .iter()
        .rev()
        .fold(0, |acc, &nibble| (acc << NIBBLE_BITS) | (nibble & NIBBLE_MASK) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_are_outside_nibble_range() {
        for marker in [Marker::Start, Marker::Measured, Marker::Finish] {
            assert!(marker.byte() > NIBBLE_MASK);
            assert_eq!(Symbol::from(marker.byte()), Symbol::Marker(marker));
        }
    }

    #[test]
    fn symbol_classification() {
        assert_eq!(Symbol::from(0x00), Symbol::Nibble(0x0));
        assert_eq!(Symbol::from(0x0F), Symbol::Nibble(0xF));
        assert_eq!(Symbol::from(0x10), Symbol::Other(0x10));
        assert_eq!(Symbol::from(0xFF), Symbol::Other(0xFF));
    }

    #[test]
    fn nibbles_least_significant_first() {
        assert_eq!(
            encode_measurement(0x1A3).as_slice(),
            &[0x3, 0xA, 0x1, Marker::Measured.byte()]
        );
        assert_eq!(encode_measurement(0x5).as_slice(), &[0x5, 0x81]);
    }

    #[test]
    fn zero_still_has_a_nibble() {
        assert_eq!(encode_measurement(0).as_slice(), &[0x0, 0x81]);
    }

    #[test]
    fn widest_value_fits() {
        let encoded = encode_measurement(u32::MAX);
        assert_eq!(encoded.len(), MAX_ENCODED_LEN);
        assert_eq!(decode_measurement(&encoded[..MAX_NIBBLES]), u32::MAX);
    }

    #[test]
    fn decode_reverses_nibble_order() {
        assert_eq!(decode_measurement(&[0x3, 0xA, 0x1]), 0x1A3);
        assert_eq!(decode_measurement(&[0x0, 0x1]), 0x10);
        assert_eq!(decode_measurement(&[]), 0);
    }

    #[test]
    fn end_of_training_is_bare_marker() {
        assert_eq!(encode_end_of_training(), [Marker::Measured.byte()]);
    }
}
