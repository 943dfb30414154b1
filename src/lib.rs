//! # I²C Register Access
//!
//! Byte, word and bit-level helpers for the registers inside an I²C
//! peripheral.
//!
//! Most I²C peripherals expose a bank of registers. You write the register
//! address, then either write the new contents or read the current contents.
//! This crate wraps that pattern up, for:
//!
//! * 8-bit register addresses (the usual case)
//! * 16-bit register addresses, sent MSB first (e.g. EEPROMs)
//! * No register address at all (command-only devices)
//!
//! On top of that there are read-modify-write helpers for single bits and
//! bit-fields in 8-bit and 16-bit registers.
//!
//! The bus itself is supplied by you, through the [`Bus`] trait. A
//! [`BlockingBus`] adapter is provided for `embedded-hal` blocking I²C
//! drivers. The bus is only borrowed for the duration of each call; if more
//! than one context shares a bus, you must serialise access yourself.
//!
//! Each failure is classified into exactly one [`Error`] - see
//! [`Error::classify`]. Nothing is retried.
//!
//! # Example
//!
//! ```rust
//! # use embedded_hal::blocking::i2c::{Read, Write};
//! # struct I2c;
//! # impl Write for I2c {
//! #     type Error = ();
//! #     fn write(&mut self, _address: u8, _bytes: &[u8]) -> Result<(), ()> {
//! #         Ok(())
//! #     }
//! # }
//! # impl Read for I2c {
//! #     type Error = ();
//! #     fn read(&mut self, _address: u8, buffer: &mut [u8]) -> Result<(), ()> {
//! #         buffer.fill(0b1010_1111);
//! #         Ok(())
//! #     }
//! # }
//! use i2c_register::{BlockingBus, Device, DeviceAddress, ErrorFlags};
//!
//! fn to_flags(_e: &()) -> ErrorFlags {
//!     ErrorFlags::AF
//! }
//!
//! let mut bus = BlockingBus::new(I2c, to_flags);
//! let device = Device::new(DeviceAddress::new(0x3C).unwrap());
//! if let Err(e) = device.is_connected(&mut bus) {
//!     // Device didn't respond
//! }
//! // Put 0b010 into bits 4..2 of register 0x10
//! device.write_bits(&mut bus, 0x10, 4, 3, 0b010).unwrap();
//! let mode = device.read_bits(&mut bus, 0x10, 4, 3).unwrap();
//! # assert_eq!(mode, 0b011);
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]
#![deny(missing_docs)]

pub mod bus;
pub mod error;
pub mod field;

pub use bus::{BlockingBus, Bus, DeviceAddress, ErrorFlags};
pub use error::{check_error, Error, STATUS_OK};
pub use field::BitField;

//
// Public Types
//

/// How long to wait for things on the bus.
///
/// Units are whatever the [`Bus`] implementation uses for its timeouts -
/// usually milliseconds.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Timeout for each transmit or receive
    pub transfer_timeout_ms: u32,
    /// How many times the presence probe tries the device
    pub probe_retries: u32,
    /// Timeout for each presence probe attempt
    pub probe_timeout_ms: u32,
}

/// A register address, in one of the two sizes devices use.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegisterAddress {
    /// Sent as one byte
    Byte(u8),
    /// Sent as two bytes, most-significant byte first
    Word(u16),
}

/// A peripheral on an I²C bus, addressed by its 7-bit bus address.
///
/// Holds no bus and no cached register contents - every method takes the bus
/// and talks to the device.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Device {
    address: DeviceAddress,
    config: Config,
}

//
// Public Data
//

/// Default timeout for each transmit or receive
pub const DEFAULT_TIMEOUT_MS: u32 = 1000;

/// Default number of attempts in [`Device::is_connected`]
pub const PROBE_RETRIES: u32 = 2;

/// Default timeout for each attempt in [`Device::is_connected`]
pub const PROBE_TIMEOUT_MS: u32 = 5;

/// The longest payload a single register write or word read can carry.
pub const MAX_PAYLOAD_LEN: usize = 64;

/// The longest frame we build: a 16-bit register address plus the payload.
pub const MAX_FRAME_LEN: usize = MAX_PAYLOAD_LEN + 2;

//
// Private Types
//

type Frame = heapless::Vec<u8, MAX_FRAME_LEN>;

//
// impls on Public Types
//

impl Default for Config {
    fn default() -> Self {
        Config::STANDARD
    }
}

impl Config {
    /// 1000 per transfer, and two probe attempts of 5 each.
    pub const STANDARD: Config = Config {
        transfer_timeout_ms: DEFAULT_TIMEOUT_MS,
        probe_retries: PROBE_RETRIES,
        probe_timeout_ms: PROBE_TIMEOUT_MS,
    };
}

impl RegisterAddress {
    /// Pick the size from the value: anything above 0xFF needs 16 bits.
    pub fn infer(register: u16) -> RegisterAddress {
        match u8::try_from(register) {
            Ok(byte) => RegisterAddress::Byte(byte),
            Err(_) => RegisterAddress::Word(register),
        }
    }

    /// The bytes that go on the wire, using `buffer` for storage.
    pub fn encode(self, buffer: &mut [u8; 2]) -> &[u8] {
        match self {
            RegisterAddress::Byte(register) => {
                buffer[0] = register;
                &buffer[..1]
            }
            RegisterAddress::Word(register) => {
                *buffer = register.to_be_bytes();
                &buffer[..]
            }
        }
    }
}

impl Device {
    /// Talk to the device at `address`, with the default [`Config`].
    pub fn new(address: DeviceAddress) -> Device {
        Device::with_config(address, Config::default())
    }

    /// Talk to the device at `address`, with custom timeouts.
    pub fn with_config(address: DeviceAddress, config: Config) -> Device {
        Device { address, config }
    }

    /// The device's 7-bit bus address
    pub fn address(&self) -> DeviceAddress {
        self.address
    }

    /// The timeouts in use
    pub fn config(&self) -> Config {
        self.config
    }

    /// Check the device acknowledges its address.
    pub fn is_connected<B>(&self, bus: &mut B) -> Result<(), Error>
    where
        B: Bus,
    {
        if bus.is_ready(
            self.address,
            self.config.probe_retries,
            self.config.probe_timeout_ms,
        ) {
            Ok(())
        } else {
            Err(self.failed(bus))
        }
    }

    /// Write one byte to an 8-bit register, as a fixed two byte frame.
    pub fn write<B>(&self, bus: &mut B, register: u8, data: u8) -> Result<(), Error>
    where
        B: Bus,
    {
        self.transmit(bus, &[register, data])
    }

    /// Write one byte to an 8-bit register.
    ///
    /// Same bytes on the wire as [`Device::write`].
    pub fn write_byte<B>(&self, bus: &mut B, register: u8, data: u8) -> Result<(), Error>
    where
        B: Bus,
    {
        self.write_bytes(bus, register, &[data])
    }

    /// Write consecutive bytes starting at an 8-bit register.
    ///
    /// Sends `[register, data...]` as a single transfer. At most
    /// [`MAX_PAYLOAD_LEN`] bytes.
    pub fn write_bytes<B>(&self, bus: &mut B, register: u8, data: &[u8]) -> Result<(), Error>
    where
        B: Bus,
    {
        self.write_register(bus, RegisterAddress::Byte(register), data)
    }

    /// Write a 16-bit value to an 8-bit register, in native byte order.
    pub fn write_word<B>(&self, bus: &mut B, register: u8, data: u16) -> Result<(), Error>
    where
        B: Bus,
    {
        self.write_words(bus, register, &[data])
    }

    /// Write consecutive 16-bit values starting at an 8-bit register.
    ///
    /// Each word goes out in native (in-memory) byte order. At most
    /// [`MAX_PAYLOAD_LEN`] / 2 words.
    pub fn write_words<B>(&self, bus: &mut B, register: u8, data: &[u16]) -> Result<(), Error>
    where
        B: Bus,
    {
        let mut payload: heapless::Vec<u8, MAX_PAYLOAD_LEN> = heapless::Vec::new();
        for word in data {
            payload
                .extend_from_slice(&word.to_ne_bytes())
                .map_err(|_| Error::InvalidArgument)?;
        }
        self.write_bytes(bus, register, &payload)
    }

    /// Write one byte to a device that takes no register address.
    pub fn write_no_register<B>(&self, bus: &mut B, data: u8) -> Result<(), Error>
    where
        B: Bus,
    {
        self.transmit(bus, &[data])
    }

    /// Write raw bytes to a device that takes no register address.
    pub fn write_multi_no_register<B>(&self, bus: &mut B, data: &[u8]) -> Result<(), Error>
    where
        B: Bus,
    {
        self.transmit(bus, data)
    }

    /// Write one byte to a 16-bit register, as a fixed three byte frame.
    pub fn write_16bit_register<B>(&self, bus: &mut B, register: u16, data: u8) -> Result<(), Error>
    where
        B: Bus,
    {
        let [high, low] = register.to_be_bytes();
        self.transmit(bus, &[high, low, data])
    }

    /// Write consecutive bytes, picking the register address size from its
    /// value.
    ///
    /// Registers up to 0xFF get an 8-bit address, anything above gets a
    /// 16-bit address.
    pub fn write_some<B>(&self, bus: &mut B, register: u16, data: &[u8]) -> Result<(), Error>
    where
        B: Bus,
    {
        self.write_register(bus, RegisterAddress::infer(register), data)
    }

    /// Read one byte from an 8-bit register.
    pub fn read<B>(&self, bus: &mut B, register: u8) -> Result<u8, Error>
    where
        B: Bus,
    {
        let mut data = [0u8; 1];
        self.read_register(bus, RegisterAddress::Byte(register), &mut data)?;
        Ok(data[0])
    }

    /// Read one byte from an 8-bit register.
    ///
    /// Same bytes on the wire as [`Device::read`].
    pub fn read_byte<B>(&self, bus: &mut B, register: u8) -> Result<u8, Error>
    where
        B: Bus,
    {
        let mut data = [0u8; 1];
        self.read_bytes(bus, register, &mut data)?;
        Ok(data[0])
    }

    /// Fill `buffer` from consecutive registers starting at an 8-bit
    /// register.
    ///
    /// The register address and the read are separate transfers. If the
    /// address transfer fails, `buffer` is untouched.
    pub fn read_bytes<B>(&self, bus: &mut B, register: u8, buffer: &mut [u8]) -> Result<(), Error>
    where
        B: Bus,
    {
        self.read_register(bus, RegisterAddress::Byte(register), buffer)
    }

    /// Read a 16-bit value from an 8-bit register, in native byte order.
    pub fn read_word<B>(&self, bus: &mut B, register: u8) -> Result<u16, Error>
    where
        B: Bus,
    {
        let mut data = [0u16; 1];
        self.read_words(bus, register, &mut data)?;
        Ok(data[0])
    }

    /// Fill `buffer` with 16-bit values read from consecutive registers.
    ///
    /// Each word is taken in native (in-memory) byte order. At most
    /// [`MAX_PAYLOAD_LEN`] / 2 words. `buffer` is only written if the whole
    /// read succeeds.
    pub fn read_words<B>(&self, bus: &mut B, register: u8, buffer: &mut [u16]) -> Result<(), Error>
    where
        B: Bus,
    {
        let len = buffer.len() * 2;
        if len > MAX_PAYLOAD_LEN {
            return Err(Error::InvalidArgument);
        }
        let mut scratch = [0u8; MAX_PAYLOAD_LEN];
        self.read_bytes(bus, register, &mut scratch[..len])?;
        for (word, bytes) in buffer.iter_mut().zip(scratch[..len].chunks_exact(2)) {
            *word = u16::from_ne_bytes([bytes[0], bytes[1]]);
        }
        Ok(())
    }

    /// Read one byte from a device that takes no register address.
    pub fn read_no_register<B>(&self, bus: &mut B) -> Result<u8, Error>
    where
        B: Bus,
    {
        let mut data = [0u8; 1];
        self.receive(bus, &mut data)?;
        Ok(data[0])
    }

    /// Fill `buffer` from a device that takes no register address.
    pub fn read_some_no_register<B>(&self, bus: &mut B, buffer: &mut [u8]) -> Result<(), Error>
    where
        B: Bus,
    {
        self.receive(bus, buffer)
    }

    /// Read one byte from a 16-bit register.
    pub fn read_16bit_register<B>(&self, bus: &mut B, register: u16) -> Result<u8, Error>
    where
        B: Bus,
    {
        let mut data = [0u8; 1];
        self.read_register(bus, RegisterAddress::Word(register), &mut data)?;
        Ok(data[0])
    }

    /// Fill `buffer` from consecutive registers, picking the register address
    /// size from its value.
    ///
    /// See [`Device::write_some`].
    pub fn read_some<B>(&self, bus: &mut B, register: u16, buffer: &mut [u8]) -> Result<(), Error>
    where
        B: Bus,
    {
        self.read_register(bus, RegisterAddress::infer(register), buffer)
    }

    /// Set or clear one bit of an 8-bit register.
    ///
    /// This is a read followed by a write. Another controller touching the
    /// register in between will have its change overwritten.
    pub fn write_bit<B>(&self, bus: &mut B, register: u8, bit: u8, value: bool) -> Result<(), Error>
    where
        B: Bus,
    {
        if bit >= 8 {
            return Err(Error::InvalidArgument);
        }
        let old = self.read_byte(bus, register)?;
        let mask = 1u8 << bit;
        let new = if value { old | mask } else { old & !mask };
        self.write_byte(bus, register, new)
    }

    /// Set or clear one bit of a 16-bit register.
    pub fn write_bit_w<B>(
        &self,
        bus: &mut B,
        register: u8,
        bit: u8,
        value: bool,
    ) -> Result<(), Error>
    where
        B: Bus,
    {
        if bit >= 16 {
            return Err(Error::InvalidArgument);
        }
        let old = self.read_word(bus, register)?;
        let mask = 1u16 << bit;
        let new = if value { old | mask } else { old & !mask };
        self.write_word(bus, register, new)
    }

    /// Replace a bit-field in an 8-bit register.
    ///
    /// `bit_start` is the field's most-significant bit and `length` its size,
    /// so `1 <= length <= bit_start + 1 <= 8`. Anything else is rejected
    /// with [`Error::InvalidArgument`] before touching the bus. `data` is
    /// right aligned; bits beyond `length` are dropped.
    pub fn write_bits<B>(
        &self,
        bus: &mut B,
        register: u8,
        bit_start: u8,
        length: u8,
        data: u8,
    ) -> Result<(), Error>
    where
        B: Bus,
    {
        let field = BitField::new(bit_start, length, 8)?;
        let old = self.read_byte(bus, register)?;
        let new = field.insert(u16::from(old), u16::from(data));
        self.write_byte(bus, register, new as u8)
    }

    /// Replace a bit-field in a 16-bit register.
    ///
    /// As [`Device::write_bits`], with `bit_start + 1 <= 16`.
    pub fn write_bits_w<B>(
        &self,
        bus: &mut B,
        register: u8,
        bit_start: u8,
        length: u8,
        data: u16,
    ) -> Result<(), Error>
    where
        B: Bus,
    {
        let field = BitField::new(bit_start, length, 16)?;
        let old = self.read_word(bus, register)?;
        self.write_word(bus, register, field.insert(old, data))
    }

    /// Read one bit of an 8-bit register.
    ///
    /// Returns the register masked down to that bit, *not* 0 or 1. For bit 3
    /// you get either 0 or 8.
    pub fn read_bit<B>(&self, bus: &mut B, register: u8, bit: u8) -> Result<u8, Error>
    where
        B: Bus,
    {
        if bit >= 8 {
            return Err(Error::InvalidArgument);
        }
        Ok(self.read_byte(bus, register)? & (1 << bit))
    }

    /// Read one bit of a 16-bit register.
    ///
    /// As [`Device::read_bit`], the masked value is returned.
    pub fn read_bit_w<B>(&self, bus: &mut B, register: u8, bit: u8) -> Result<u16, Error>
    where
        B: Bus,
    {
        if bit >= 16 {
            return Err(Error::InvalidArgument);
        }
        Ok(self.read_word(bus, register)? & (1 << bit))
    }

    /// Read a bit-field from an 8-bit register, right aligned.
    ///
    /// See [`Device::write_bits`] for the meaning of `bit_start` and
    /// `length`.
    pub fn read_bits<B>(
        &self,
        bus: &mut B,
        register: u8,
        bit_start: u8,
        length: u8,
    ) -> Result<u8, Error>
    where
        B: Bus,
    {
        let field = BitField::new(bit_start, length, 8)?;
        let value = self.read_byte(bus, register)?;
        Ok(field.extract(u16::from(value)) as u8)
    }

    /// Read a bit-field from a 16-bit register, right aligned.
    pub fn read_bits_w<B>(
        &self,
        bus: &mut B,
        register: u8,
        bit_start: u8,
        length: u8,
    ) -> Result<u16, Error>
    where
        B: Bus,
    {
        let field = BitField::new(bit_start, length, 16)?;
        let value = self.read_word(bus, register)?;
        Ok(field.extract(value))
    }

    /// Send `[register address, payload...]` as one transfer.
    fn write_register<B>(
        &self,
        bus: &mut B,
        register: RegisterAddress,
        payload: &[u8],
    ) -> Result<(), Error>
    where
        B: Bus,
    {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(Error::InvalidArgument);
        }
        let mut address = [0u8; 2];
        let mut frame = Frame::new();
        frame
            .extend_from_slice(register.encode(&mut address))
            .map_err(|_| Error::InvalidArgument)?;
        frame
            .extend_from_slice(payload)
            .map_err(|_| Error::InvalidArgument)?;
        self.transmit(bus, &frame)
    }

    /// Send the register address, then read into `buffer`.
    fn read_register<B>(
        &self,
        bus: &mut B,
        register: RegisterAddress,
        buffer: &mut [u8],
    ) -> Result<(), Error>
    where
        B: Bus,
    {
        let mut address = [0u8; 2];
        self.transmit(bus, register.encode(&mut address))?;
        self.receive(bus, buffer)
    }

    fn transmit<B>(&self, bus: &mut B, bytes: &[u8]) -> Result<(), Error>
    where
        B: Bus,
    {
        #[cfg(feature = "defmt")]
        defmt::debug!(
            "Writing {} bytes to I²C device 0x{:02x}",
            bytes.len(),
            self.address.get()
        );
        if bus.transmit(self.address, bytes, self.config.transfer_timeout_ms) {
            Ok(())
        } else {
            Err(self.failed(bus))
        }
    }

    fn receive<B>(&self, bus: &mut B, buffer: &mut [u8]) -> Result<(), Error>
    where
        B: Bus,
    {
        if bus.receive(self.address, buffer, self.config.transfer_timeout_ms) {
            Ok(())
        } else {
            Err(self.failed(bus))
        }
    }

    /// Classify the bus's last failure.
    fn failed<B>(&self, bus: &mut B) -> Error
    where
        B: Bus,
    {
        let error = check_error(bus);
        #[cfg(feature = "defmt")]
        defmt::warn!("I²C device 0x{:02x}: {}", self.address.get(), error);
        error
    }
}


//
// End of file
//
