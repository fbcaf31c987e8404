// Bit 0 is the LSB of byte 0; fields are LSB-first and may straddle bytes.

fn check_range(buf_len: usize, bit_pos: usize, bit_len: u32) {
    assert!(bit_len <= 64, "bit field wider than 64 bits: {}", bit_len);
    let end = bit_pos.saturating_add(bit_len as usize);
    assert!(
        end <= buf_len.saturating_mul(8),
        "bit field {}..{} out of range for {} byte buffer",
        bit_pos,
        end,
        buf_len
    );
}

pub fn read_bits(buf: &[u8], bit_pos: usize, bit_len: u32) -> u64 {
    check_range(buf.len(), bit_pos, bit_len);

    let mut value = 0u64;
    let mut done = 0u32;
    while done < bit_len {
        let pos = bit_pos + done as usize;
        let byte = buf[pos / 8];
        let shift = (pos % 8) as u32;
        let take = (8 - shift).min(bit_len - done);
        let mask = ((1u16 << take) - 1) as u8;
        let chunk = (byte >> shift) & mask;
        value |= (chunk as u64) << done;
        done += take;
    }
    value
}

/// Write the low `bit_len` bits of `value` starting at `bit_pos`. Bits outside
/// the field keep their previous value.
pub fn write_bits(buf: &mut [u8], bit_pos: usize, bit_len: u32, value: u64) {
    check_range(buf.len(), bit_pos, bit_len);

    let mut done = 0u32;
    while done < bit_len {
        let pos = bit_pos + done as usize;
        let shift = (pos % 8) as u32;
        let take = (8 - shift).min(bit_len - done);
        let mask = (((1u16 << take) - 1) as u8) << shift;
        let chunk = (((value >> done) as u8) << shift) & mask;
        let byte = &mut buf[pos / 8];
        *byte = (*byte & !mask) | chunk;
        done += take;
    }
}

pub struct BitWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> BitWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        BitWriter { buf, pos: 0 }
    }

    pub fn put(&mut self, bit_len: u32, value: u64) {
        write_bits(self.buf, self.pos, bit_len, value);
        self.pos += bit_len as usize;
    }

    pub fn put_bool(&mut self, value: bool) {
        self.put(1, value as u64);
    }

    pub fn position(&self) -> usize {
        self.pos
    }
}

pub struct BitReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        BitReader { buf, pos: 0 }
    }

    pub fn take(&mut self, bit_len: u32) -> u64 {
        let value = read_bits(self.buf, self.pos, bit_len);
        self.pos += bit_len as usize;
        value
    }

    pub fn take_bool(&mut self) -> bool {
        self.take(1) != 0
    }

    pub fn position(&self) -> usize {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn straddling_write_keeps_neighbours() {
        let mut buf = [0u8; 2];
        write_bits(&mut buf, 4, 5, 0b10110);
        assert_eq!(read_bits(&buf, 4, 5), 22);
        assert_eq!(read_bits(&buf, 0, 4), 0);
        assert_eq!(read_bits(&buf, 9, 7), 0);
        assert_eq!(buf, [0x60, 0x01]);
    }

    #[test]
    fn write_over_set_bits_preserves_outside() {
        let mut buf = [0xFFu8; 3];
        write_bits(&mut buf, 6, 10, 0);
        assert_eq!(buf, [0x3F, 0x00, 0xFF]);
    }

    #[test]
    fn full_width_field() {
        let mut buf = [0u8; 9];
        write_bits(&mut buf, 3, 64, u64::MAX - 1);
        assert_eq!(read_bits(&buf, 3, 64), u64::MAX - 1);
        assert_eq!(read_bits(&buf, 0, 3), 0);
        assert_eq!(read_bits(&buf, 67, 5), 0);
    }

    #[test]
    fn oversized_value_is_masked() {
        let mut buf = [0u8; 1];
        write_bits(&mut buf, 2, 3, 0xFF);
        assert_eq!(buf[0], 0b0001_1100);
    }

    #[test]
    #[should_panic]
    fn out_of_range_panics() {
        let buf = [0u8; 2];
        read_bits(&buf, 10, 7);
    }

    #[test]
    fn cursors_agree() {
        let mut buf = [0u8; 4];
        let mut w = BitWriter::new(&mut buf);
        w.put(3, 5);
        w.put_bool(true);
        w.put(11, 1234);
        assert_eq!(w.position(), 15);

        let mut r = BitReader::new(&buf);
        assert_eq!(r.take(3), 5);
        assert!(r.take_bool());
        assert_eq!(r.take(11), 1234);
    }

    proptest! {
        #[test]
        fn round_trip_leaves_other_bits(
            seed in proptest::collection::vec(any::<u8>(), 1..16),
            start_raw in any::<usize>(),
            len_raw in any::<u32>(),
            value in any::<u64>(),
        ) {
            let total = seed.len() * 8;
            let len = len_raw % (total.min(64) as u32 + 1);
            let start = start_raw % (total - len as usize + 1);
            let mask = if len == 64 { u64::MAX } else { (1u64 << len) - 1 };
            let value = value & mask;

            let mut buf = seed.clone();
            write_bits(&mut buf, start, len, value);
            prop_assert_eq!(read_bits(&buf, start, len), value);

            for bit in (0..start).chain(start + len as usize..total) {
                prop_assert_eq!(read_bits(&buf, bit, 1), read_bits(&seed, bit, 1));
            }
        }
    }
}
