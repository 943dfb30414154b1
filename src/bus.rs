//! The blocking I²C capability that the register helpers are built on.
//!
//! The host supplies something that implements [`Bus`]. If you already have
//! an `embedded-hal` blocking I²C driver, wrap it in a [`BlockingBus`].

//
// Public Types
//

/// A 7-bit I²C device address.
///
/// This is the only address form the crate accepts. Vendor APIs that want the
/// address already shifted into the top seven bits of a byte should use
/// [`DeviceAddress::left_aligned`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceAddress(u8);

bitflags::bitflags! {
    /// The sticky error flags a bus reports after a failed transfer.
    ///
    /// Bit values match the STM32 HAL `HAL_I2C_ERROR_*` constants, so an STM32
    /// Cube based [`Bus`] can pass its error code straight through with
    /// [`ErrorFlags::from_bits_retain`].
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct ErrorFlags: u32 {
        /// Bus error (misplaced START or STOP)
        const BERR = 0x01;
        /// Arbitration lost
        const ARLO = 0x02;
        /// Acknowledge failure
        const AF = 0x04;
        /// Overrun / underrun
        const OVR = 0x08;
        /// DMA transfer error
        const DMA = 0x10;
        /// Timeout
        const TIMEOUT = 0x20;
        /// Size management error
        const SIZE = 0x40;
    }
}

/// A blocking I²C controller.
///
/// Every method blocks until the transfer completes, times out or fails, and
/// returns `true` on success. After a failure, [`Bus::last_error`] says why.
pub trait Bus {
    /// Write `bytes` to the device in one transfer.
    fn transmit(&mut self, address: DeviceAddress, bytes: &[u8], timeout_ms: u32) -> bool;

    /// Read `buffer.len()` bytes from the device in one transfer.
    fn receive(&mut self, address: DeviceAddress, buffer: &mut [u8], timeout_ms: u32) -> bool;

    /// Check whether the device acknowledges its address.
    fn is_ready(&mut self, address: DeviceAddress, retries: u32, timeout_ms: u32) -> bool;

    /// The error flags from the most recent failure.
    fn last_error(&mut self) -> ErrorFlags;
}

/// Adapts an `embedded-hal` blocking I²C driver into a [`Bus`].
///
/// `embedded-hal` errors carry no standard cause, so you supply a function
/// which turns your HAL's error into [`ErrorFlags`]. Timeouts are whatever
/// the wrapped driver was configured with.
pub struct BlockingBus<I2C, E> {
    i2c: I2C,
    to_flags: fn(&E) -> ErrorFlags,
    last_error: ErrorFlags,
}

//
// impls on Public Types
//

impl DeviceAddress {
    /// Wrap a 7-bit address. Returns `None` if the top bit is set.
    pub const fn new(address: u8) -> Option<DeviceAddress> {
        if address > 0x7F {
            None
        } else {
            Some(DeviceAddress(address))
        }
    }

    /// The 7-bit address, right aligned.
    pub const fn get(self) -> u8 {
        self.0
    }

    /// The address shifted up one bit, with the R/W bit clear.
    pub const fn left_aligned(self) -> u16 {
        (self.0 as u16) << 1
    }
}

impl From<DeviceAddress> for u8 {
    fn from(address: DeviceAddress) -> u8 {
        address.0
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ErrorFlags {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "ErrorFlags({=u32:#04x})", self.bits());
    }
}

impl<B> Bus for &mut B
where
    B: Bus + ?Sized,
{
    fn transmit(&mut self, address: DeviceAddress, bytes: &[u8], timeout_ms: u32) -> bool {
        (**self).transmit(address, bytes, timeout_ms)
    }

    fn receive(&mut self, address: DeviceAddress, buffer: &mut [u8], timeout_ms: u32) -> bool {
        (**self).receive(address, buffer, timeout_ms)
    }

    fn is_ready(&mut self, address: DeviceAddress, retries: u32, timeout_ms: u32) -> bool {
        (**self).is_ready(address, retries, timeout_ms)
    }

    fn last_error(&mut self) -> ErrorFlags {
        (**self).last_error()
    }
}

impl<I2C, E> BlockingBus<I2C, E>
where
    I2C: embedded_hal::blocking::i2c::Write<Error = E>
        + embedded_hal::blocking::i2c::Read<Error = E>,
{
    /// Wrap an `embedded-hal` I²C driver.
    ///
    /// `to_flags` is called on every error the driver returns.
    pub fn new(i2c: I2C, to_flags: fn(&E) -> ErrorFlags) -> BlockingBus<I2C, E> {
        BlockingBus {
            i2c,
            to_flags,
            last_error: ErrorFlags::empty(),
        }
    }

    /// Give back the wrapped driver.
    pub fn free(self) -> I2C {
        self.i2c
    }

    fn record(&mut self, result: Result<(), E>) -> bool {
        match result {
            Ok(()) => {
                self.last_error = ErrorFlags::empty();
                true
            }
            Err(e) => {
                self.last_error = (self.to_flags)(&e);
                false
            }
        }
    }
}

impl<I2C, E> Bus for BlockingBus<I2C, E>
where
    I2C: embedded_hal::blocking::i2c::Write<Error = E>
        + embedded_hal::blocking::i2c::Read<Error = E>,
{
    fn transmit(&mut self, address: DeviceAddress, bytes: &[u8], _timeout_ms: u32) -> bool {
        let result = self.i2c.write(address.get(), bytes);
        self.record(result)
    }

    fn receive(&mut self, address: DeviceAddress, buffer: &mut [u8], _timeout_ms: u32) -> bool {
        let result = self.i2c.read(address.get(), buffer);
        self.record(result)
    }

    fn is_ready(&mut self, address: DeviceAddress, retries: u32, _timeout_ms: u32) -> bool {
        for _ in 0..retries.max(1) {
            let result = self.i2c.write(address.get(), &[]);
            if self.record(result) {
                return true;
            }
        }
        false
    }

    fn last_error(&mut self) -> ErrorFlags {
        self.last_error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Pretend HAL error: the device NACKs until `acks_after` attempts.
    #[derive(Debug)]
    enum HalError {
        Nack,
        Arbitration,
    }

    struct FakeI2c {
        attempts: u32,
        acks_after: u32,
        lose_arbitration: bool,
        last_write: [u8; 4],
        last_write_len: usize,
        last_address: u8,
    }

    impl FakeI2c {
        fn new(acks_after: u32) -> FakeI2c {
            FakeI2c {
                attempts: 0,
                acks_after,
                lose_arbitration: false,
                last_write: [0; 4],
                last_write_len: 0,
                last_address: 0,
            }
        }
    }

    impl embedded_hal::blocking::i2c::Write for FakeI2c {
        type Error = HalError;

        fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), HalError> {
            self.attempts += 1;
            self.last_address = address;
            if self.lose_arbitration {
                return Err(HalError::Arbitration);
            }
            if self.attempts <= self.acks_after {
                return Err(HalError::Nack);
            }
            self.last_write[..bytes.len()].copy_from_slice(bytes);
            self.last_write_len = bytes.len();
            Ok(())
        }
    }

    impl embedded_hal::blocking::i2c::Read for FakeI2c {
        type Error = HalError;

        fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), HalError> {
            self.last_address = address;
            if self.lose_arbitration {
                return Err(HalError::Arbitration);
            }
            for (i, b) in buffer.iter_mut().enumerate() {
                *b = 0xA0 + i as u8;
            }
            Ok(())
        }
    }

    fn to_flags(e: &HalError) -> ErrorFlags {
        match e {
            HalError::Nack => ErrorFlags::AF,
            HalError::Arbitration => ErrorFlags::ARLO,
        }
    }

    #[test]
    fn device_address_range() {
        assert_eq!(DeviceAddress::new(0x7F).map(DeviceAddress::get), Some(0x7F));
        assert!(DeviceAddress::new(0x80).is_none());
        let address = DeviceAddress::new(0x3C).unwrap();
        assert_eq!(address.left_aligned(), 0x78);
        assert_eq!(u8::from(address), 0x3C);
    }

    #[test]
    fn flags_contains() {
        let flags = ErrorFlags::AF | ErrorFlags::OVR;
        assert!(flags.contains(ErrorFlags::AF));
        assert!(flags.contains(ErrorFlags::OVR));
        assert!(!flags.contains(ErrorFlags::BERR));
        assert_eq!(flags.bits(), 0x0C);

        let mut flags = ErrorFlags::empty();
        flags |= ErrorFlags::TIMEOUT;
        flags |= ErrorFlags::SIZE;
        assert_eq!(flags, ErrorFlags::from_bits_retain(0x60));
    }

    #[test]
    fn adapter_passes_seven_bit_address() {
        let mut bus = BlockingBus::new(FakeI2c::new(0), to_flags);
        let address = DeviceAddress::new(0x3C).unwrap();
        assert!(bus.transmit(address, &[0x10, 0x55], 1000));
        let i2c = bus.free();
        assert_eq!(i2c.last_address, 0x3C);
        assert_eq!(&i2c.last_write[..i2c.last_write_len], &[0x10, 0x55]);
    }

    #[test]
    fn adapter_records_and_clears_error() {
        let mut bus = BlockingBus::new(FakeI2c::new(1), to_flags);
        let address = DeviceAddress::new(0x50).unwrap();
        assert!(!bus.transmit(address, &[0x00], 1000));
        assert_eq!(bus.last_error(), ErrorFlags::AF);
        assert!(bus.transmit(address, &[0x00], 1000));
        assert!(bus.last_error().is_empty());
    }

    #[test]
    fn adapter_probe_retries() {
        let address = DeviceAddress::new(0x50).unwrap();

        let mut bus = BlockingBus::new(FakeI2c::new(1), to_flags);
        assert!(bus.is_ready(address, 2, 5));
        assert_eq!(bus.free().attempts, 2);

        let mut bus = BlockingBus::new(FakeI2c::new(5), to_flags);
        assert!(!bus.is_ready(address, 2, 5));
        assert_eq!(bus.last_error(), ErrorFlags::AF);
        assert_eq!(bus.free().attempts, 2);

        let mut bus = BlockingBus::new(FakeI2c::new(0), to_flags);
        assert!(bus.is_ready(address, 0, 5));
        assert_eq!(bus.free().attempts, 1);
    }

    #[test]
    fn adapter_receive() {
        let mut i2c = FakeI2c::new(0);
        i2c.lose_arbitration = true;
        let mut bus = BlockingBus::new(i2c, to_flags);
        let address = DeviceAddress::new(0x50).unwrap();
        let mut buffer = [0u8; 3];
        assert!(!bus.receive(address, &mut buffer, 1000));
        assert_eq!(bus.last_error(), ErrorFlags::ARLO);
        assert_eq!(buffer, [0, 0, 0]);

        let mut bus = BlockingBus::new(FakeI2c::new(0), to_flags);
        assert!(bus.receive(address, &mut buffer, 1000));
        assert_eq!(buffer, [0xA0, 0xA1, 0xA2]);
    }
}

//
// End of file
//
