//! Result codes for register access, and the classifier that picks one from
//! the bus error flags.

use crate::bus::{Bus, ErrorFlags};

//
// Public Types
//

/// Everything that can go wrong when talking to a register.
///
/// The discriminants are the numeric status codes (see [`Error::code`]). A
/// successful operation is status [`STATUS_OK`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Error {
    /// The transfer failed, but the bus reported no recognised cause
    Error = 0x01,
    /// The bus is busy. Reserved - nothing in this crate produces it.
    Busy = 0x02,
    /// Misplaced START or STOP condition (BERR)
    BusError = 0x03,
    /// Another controller won arbitration (ARLO)
    ArbitrationLost = 0x04,
    /// The device did not acknowledge (AF)
    AcknowledgeFailure = 0x05,
    /// Data overrun or underrun (OVR)
    Overrun = 0x06,
    /// DMA transfer error
    Dma = 0x07,
    /// The transfer timed out
    Timeout = 0x08,
    /// Size management error
    SizeMismatch = 0x09,
    /// The request was rejected before touching the bus, e.g. a bit-field
    /// that doesn't fit in the register, or a payload that doesn't fit in the
    /// scratch buffer.
    InvalidArgument = 0x0A,
}

//
// Public Data
//

/// The status code for a successful operation.
pub const STATUS_OK: u8 = 0x00;

//
// Public Functions
//

/// Ask the bus what went wrong with the last transfer and classify it.
///
/// Only meaningful straight after a failed transfer or probe.
pub fn check_error<B>(bus: &mut B) -> Error
where
    B: Bus,
{
    Error::classify(bus.last_error())
}

//
// impls on Public Types
//

impl Error {
    /// Pick a single error from a set of bus error flags.
    ///
    /// The flags can co-occur, but only one is reported. Precedence is BERR,
    /// ARLO, AF, OVR, DMA, TIMEOUT, SIZE. If no flag is set you get
    /// [`Error::Error`].
    pub fn classify(flags: ErrorFlags) -> Error {
        const PRECEDENCE: [(ErrorFlags, Error); 7] = [
            (ErrorFlags::BERR, Error::BusError),
            (ErrorFlags::ARLO, Error::ArbitrationLost),
            (ErrorFlags::AF, Error::AcknowledgeFailure),
            (ErrorFlags::OVR, Error::Overrun),
            (ErrorFlags::DMA, Error::Dma),
            (ErrorFlags::TIMEOUT, Error::Timeout),
            (ErrorFlags::SIZE, Error::SizeMismatch),
        ];
        PRECEDENCE
            .iter()
            .find(|(flag, _)| flags.contains(*flag))
            .map(|(_, error)| *error)
            .unwrap_or(Error::Error)
    }

    /// The numeric status code for this error.
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let text = match self {
            Error::Error => "unclassified I²C error",
            Error::Busy => "I²C bus busy",
            Error::BusError => "I²C bus error",
            Error::ArbitrationLost => "I²C arbitration lost",
            Error::AcknowledgeFailure => "I²C acknowledge failure",
            Error::Overrun => "I²C overrun",
            Error::Dma => "I²C DMA error",
            Error::Timeout => "I²C timeout",
            Error::SizeMismatch => "I²C size mismatch",
            Error::InvalidArgument => "invalid register access request",
        };
        f.write_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_is_unclassified() {
        assert_eq!(Error::classify(ErrorFlags::empty()), Error::Error);
    }

    #[test]
    fn each_flag_alone() {
        let cases = [
            (ErrorFlags::BERR, Error::BusError),
            (ErrorFlags::ARLO, Error::ArbitrationLost),
            (ErrorFlags::AF, Error::AcknowledgeFailure),
            (ErrorFlags::OVR, Error::Overrun),
            (ErrorFlags::DMA, Error::Dma),
            (ErrorFlags::TIMEOUT, Error::Timeout),
            (ErrorFlags::SIZE, Error::SizeMismatch),
        ];
        for (flags, expected) in cases {
            assert_eq!(Error::classify(flags), expected);
        }
    }

    #[test]
    fn higher_priority_flag_wins() {
        assert_eq!(
            Error::classify(ErrorFlags::AF | ErrorFlags::TIMEOUT),
            Error::AcknowledgeFailure
        );
        assert_eq!(
            Error::classify(ErrorFlags::SIZE | ErrorFlags::BERR | ErrorFlags::OVR),
            Error::BusError
        );
        assert_eq!(
            Error::classify(ErrorFlags::DMA | ErrorFlags::SIZE),
            Error::Dma
        );
    }

    #[test]
    fn unknown_bits_are_unclassified() {
        assert_eq!(Error::classify(ErrorFlags::from_bits_retain(0x100)), Error::Error);
    }

    #[test]
    fn status_codes() {
        assert_eq!(STATUS_OK, 0);
        assert_eq!(Error::Error.code(), 0x01);
        assert_eq!(Error::Busy.code(), 0x02);
        assert_eq!(Error::AcknowledgeFailure.code(), 0x05);
        assert_eq!(Error::SizeMismatch.code(), 0x09);
        assert_eq!(Error::InvalidArgument.code(), 0x0A);
    }
}

//
// End of file
//
