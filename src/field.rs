//! Bit-fields inside an 8-bit or 16-bit register.

use crate::Error;

/// A run of bits inside a register, holding a right-aligned value.
///
/// `start` is the position of the field's most-significant bit, counting bit
/// 0 as the least-significant bit of the register. A field with `start = 6`
/// and `length = 3` covers bits 6, 5 and 4.
///
/// A `BitField` can only be built if it fits in its register, so the mask
/// arithmetic never overflows.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitField {
    start: u8,
    length: u8,
}

impl BitField {
    /// Describe a field inside a register `width` bits wide.
    ///
    /// Requires `1 <= length <= start + 1 <= width <= 16`, otherwise you get
    /// [`Error::InvalidArgument`].
    pub fn new(start: u8, length: u8, width: u8) -> Result<BitField, Error> {
        let start_plus_one = u16::from(start) + 1;
        let length_wide = u16::from(length);
        if width > 16
            || length_wide == 0
            || length_wide > start_plus_one
            || start_plus_one > u16::from(width)
        {
            return Err(Error::InvalidArgument);
        }
        Ok(BitField { start, length })
    }

    /// The most-significant bit of the field
    pub const fn start(&self) -> u8 {
        self.start
    }

    /// The number of bits in the field
    pub const fn length(&self) -> u8 {
        self.length
    }

    /// Position of the field's least-significant bit.
    fn shift(&self) -> u32 {
        u32::from(self.start + 1 - self.length)
    }

    /// The field's bits, in register position.
    pub fn mask(&self) -> u16 {
        let ones = ((1u32 << self.length) - 1) as u16;
        ones << self.shift()
    }

    /// Replace the field inside `old` with `data`.
    ///
    /// Bits of `data` above `length` are discarded, and every bit of `old`
    /// outside the field is kept.
    pub fn insert(&self, old: u16, data: u16) -> u16 {
        let mask = self.mask();
        let data = (data << self.shift()) & mask;
        (old & !mask) | data
    }

    /// Pull the field out of `value`, right aligned.
    pub fn extract(&self, value: u16) -> u16 {
        (value & self.mask()) >> self.shift()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worked_example() {
        // 76543210
        //    xxx    start = 4, length = 3
        // 00011100  mask
        // 10101111  original
        // 10100011  original & !mask
        // 10101011  | (010 << 2)
        let field = BitField::new(4, 3, 8).unwrap();
        assert_eq!(field.mask(), 0b0001_1100);
        assert_eq!(field.insert(0b1010_1111, 0b010), 0b1010_1011);
        assert_eq!(field.extract(0b1010_1011), 0b010);
    }

    #[test]
    fn field_already_holding_value_is_unchanged() {
        // Bits 6..4 of 0b1010_1111 are already 0b010
        let field = BitField::new(6, 3, 8).unwrap();
        assert_eq!(field.mask(), 0b0111_0000);
        assert_eq!(field.insert(0b1010_1111, 0b010), 0b1010_1111);
        assert_eq!(field.insert(0b1010_1111, 0b101), 0b1101_1111);
    }

    #[test]
    fn validation() {
        assert!(BitField::new(7, 8, 8).is_ok());
        assert!(BitField::new(0, 1, 8).is_ok());
        assert!(BitField::new(15, 16, 16).is_ok());
        assert_eq!(BitField::new(3, 0, 8), Err(Error::InvalidArgument));
        assert_eq!(BitField::new(2, 4, 8), Err(Error::InvalidArgument));
        assert_eq!(BitField::new(8, 1, 8), Err(Error::InvalidArgument));
        assert_eq!(BitField::new(15, 1, 8), Err(Error::InvalidArgument));
        assert_eq!(BitField::new(16, 1, 16), Err(Error::InvalidArgument));
        assert_eq!(BitField::new(0, 1, 17), Err(Error::InvalidArgument));
        assert_eq!(BitField::new(255, 255, 8), Err(Error::InvalidArgument));
    }

    #[test]
    fn out_of_range_fields_are_rejected_not_computed() {
        // Length longer than the bits below start
        assert_eq!(BitField::new(3, 5, 8), Err(Error::InvalidArgument));
        // start + 1 doesn't fit in a byte
        assert_eq!(BitField::new(255, 1, 16), Err(Error::InvalidArgument));
        // Length wider than any shift we could do
        assert_eq!(BitField::new(40, 33, 16), Err(Error::InvalidArgument));
        assert_eq!(BitField::new(40, 33, 255), Err(Error::InvalidArgument));
    }

    #[test]
    fn full_width_masks() {
        assert_eq!(BitField::new(7, 8, 8).unwrap().mask(), 0x00FF);
        assert_eq!(BitField::new(15, 16, 16).unwrap().mask(), 0xFFFF);
        assert_eq!(BitField::new(15, 1, 16).unwrap().mask(), 0x8000);
    }

    #[test]
    fn every_byte_field_round_trips() {
        for start in 0..8u8 {
            for length in 1..=start + 1 {
                let field = BitField::new(start, length, 8).unwrap();
                let max = (1u16 << length) - 1;
                for old in 0..=0xFFu16 {
                    for data in [0, max, 0b1010_1010 & max, 0b0101_0101 & max] {
                        let new = field.insert(old, data);
                        assert_eq!(field.extract(new), data);
                        assert_eq!(new & !field.mask(), old & !field.mask());
                        assert!(new <= 0xFF);
                    }
                }
            }
        }
    }

    #[test]
    fn oversized_data_is_truncated() {
        let field = BitField::new(3, 2, 8).unwrap();
        assert_eq!(field.insert(0x00, 0xFF), 0b0000_1100);
    }
}

//
// End of file
//
