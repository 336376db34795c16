//! Address decoding for a single cache level

pub fn get_log_2(value: u64) -> u32 {
    assert!(value > 0);
    63 - value.leading_zeros()
}

pub fn is_pow_2(value: u64) -> bool {
    value != 0 && value & (value - 1) == 0
}

pub fn get_mask(bits: u32) -> u64 {
    if bits >= u64::BITS {
        u64::MAX
    } else {
        (1 << bits) - 1
    }
}

/// Where an address lives inside one level
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Coordinates {
    pub set: usize,
    pub tag: u64,
    pub block_address: u64,
}

/// Bit layout of one level, fixed at construction.
///
/// Both `block_size` and `num_sets` must be powers of two;
/// configuration validation guarantees it before a level is built.
// Addresses look like this:
// | tag | index | offset |
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    offset_bits: u32,
    index_bits: u32,
    offset_mask: u64,
    index_mask: u64,
}

impl Geometry {
    pub fn new(block_size: u64, num_sets: usize) -> Self {
        let offset_bits = get_log_2(block_size);
        let index_bits = get_log_2(num_sets as u64);
        Self {
            offset_bits,
            index_bits,
            offset_mask: get_mask(offset_bits),
            index_mask: get_mask(index_bits),
        }
    }

    pub fn block_address(&self, address: u64) -> u64 {
        address & !self.offset_mask
    }

    pub fn get_index(&self, address: u64) -> usize {
        ((address >> self.offset_bits) & self.index_mask) as usize
    }

    pub fn get_tag(&self, address: u64) -> u64 {
        let shift = self.offset_bits + self.index_bits;
        if shift >= u64::BITS {
            0
        } else {
            address >> shift
        }
    }

    pub fn decode(&self, address: u64) -> Coordinates {
        let block_address = self.block_address(address);
        Coordinates {
            set: self.get_index(block_address),
            tag: self.get_tag(block_address),
            block_address,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_log_2() {
        for n in 1..123457u64 {
            let expected = {
                let mut count = 0;
                let mut t = n;
                while t > 1 {
                    count += 1;
                    t >>= 1;
                }
                count
            };
            assert_eq!(expected, get_log_2(n));
        }
    }

    #[test]
    fn test_is_pow_2() {
        assert!(is_pow_2(1));
        assert!(is_pow_2(64));
        assert!(!is_pow_2(0));
        assert!(!is_pow_2(48));
    }

    #[test]
    fn test_decode_splits_fields() {
        // 16-byte blocks, 16 sets
        let geometry = Geometry::new(16, 16);
        let coords = geometry.decode(0x1234_5678);
        assert_eq!(coords.block_address, 0x1234_5670);
        assert_eq!(coords.set, 0x7);
        assert_eq!(coords.tag, 0x12_3456);
    }

    #[test]
    fn test_single_set_uses_whole_block_number_as_tag() {
        let geometry = Geometry::new(32, 1);
        let coords = geometry.decode(0xffe0_4540);
        assert_eq!(coords.set, 0);
        assert_eq!(coords.tag, 0xffe0_4540 >> 5);
    }

    #[test]
    fn test_addresses_in_same_block_decode_equal() {
        let geometry = Geometry::new(64, 8);
        assert_eq!(geometry.decode(0x1000), geometry.decode(0x103f));
        assert_ne!(geometry.decode(0x1000), geometry.decode(0x1040));
    }
}
