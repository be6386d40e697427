use num_traits::{PrimInt, Unsigned};

/// Fixed-length vector of `N`-bit unsigned integers packed into words of
/// type `T`. Values may straddle two adjacent words.
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct BitVec<T, const N: usize> {
    buf: Box<[T]>,
    len: usize,
}

impl<T, const N: usize> BitVec<T, N>
where
    T: PrimInt + Unsigned,
{
    const WORD_SIZE: usize = 8 * size_of::<T>();
    const PACKED_LENGTH_OK: () = assert!(0 < N && N <= Self::WORD_SIZE);

    pub fn new(len: usize) -> Self {
        // Add a binding to enforce a compile-time assertion.
        #[allow(clippy::let_unit_value)]
        let _ = Self::PACKED_LENGTH_OK;

        assert!(len > 0, "len must be > 0");
        let num_words = (N * len).div_ceil(Self::WORD_SIZE);

        Self {
            buf: vec![T::zero(); num_words].into_boxed_slice(),
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Largest value a slot can hold.
    pub fn max_value() -> T {
        Self::lsb_mask()
    }

    pub fn get(&self, index: usize) -> T {
        assert!(index < self.len, "index out of bounds");
        let (word_index, offset) = Self::index_and_offset(index);
        let mut value = self.buf[word_index] >> offset;
        if offset + N > Self::WORD_SIZE {
            value = value | (self.buf[word_index + 1] << (Self::WORD_SIZE - offset));
        }
        value & Self::lsb_mask()
    }

    pub fn set(&mut self, index: usize, value: T) {
        assert!(index < self.len, "index out of bounds");
        let (word_index, offset) = Self::index_and_offset(index);
        let mask = Self::lsb_mask();
        let value = value & mask;

        let first = &mut self.buf[word_index];
        *first = (*first & !(mask << offset)) | (value << offset);

        if offset + N > Self::WORD_SIZE {
            let spill = Self::WORD_SIZE - offset;
            let second = &mut self.buf[word_index + 1];
            *second = (*second & !(mask >> spill)) | (value >> spill);
        }
    }

    /// Stores `value` at `index` if it is greater than the current value.
    /// Returns whether the slot changed.
    pub fn update_max(&mut self, index: usize, value: T) -> bool {
        let value = value.min(Self::lsb_mask());
        if value > self.get(index) {
            self.set(index, value);
            true
        } else {
            false
        }
    }

    /// Slot-wise maximum with `other`, which must have the same length.
    pub fn max_assign(&mut self, other: &Self) {
        assert_eq!(self.len, other.len, "length mismatch");
        for index in 0..self.len {
            self.update_max(index, other.get(index));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.len).map(move |index| self.get(index))
    }

    fn lsb_mask() -> T {
        if N == Self::WORD_SIZE {
            T::max_value()
        } else {
            (T::one() << N) - T::one()
        }
    }

    fn index_and_offset(index: usize) -> (usize, usize) {
        (N * index / Self::WORD_SIZE, N * index % Self::WORD_SIZE)
    }
}

#[cfg(test)]
#[allow(clippy::unusual_byte_groupings)]
mod tests {
    use super::*;

    fn make_bit_vec_u8() -> BitVec<u8, 5> {
        let mut bv = BitVec::new(5);
        for (index, value) in [0b11000, 0b00101, 0b10001, 0b00101, 0b11011]
            .into_iter()
            .enumerate()
        {
            bv.set(index, value);
        }
        bv
    }

    #[test]
    fn test_buffer_size() {
        assert_eq!(BitVec::<u8, 5>::new(1).buf.len(), 1);
        assert_eq!(BitVec::<u8, 5>::new(6).buf.len(), 4);
        assert_eq!(BitVec::<u8, 5>::new(8).buf.len(), 5);
        assert_eq!(BitVec::<u8, 6>::new(10).buf.len(), 8);
        assert_eq!(BitVec::<u64, 6>::new(16).buf.len(), 2);
        assert_eq!(BitVec::<u64, 6>::new(1 << 14).buf.len(), 1536);
    }

    #[test]
    fn test_layout_u8() {
        let bv = make_bit_vec_u8();

        assert_eq!(
            &bv.buf[..],
            &[0b101_11000, 0b1_10001_00, 0b1011_0010, 0b1]
        );
    }

    #[test]
    fn test_get_u8() {
        let bv = make_bit_vec_u8();

        assert_eq!(bv.get(0), 0b11000);
        assert_eq!(bv.get(1), 0b00101);
        assert_eq!(bv.get(2), 0b10001);
        assert_eq!(bv.get(3), 0b00101);
        assert_eq!(bv.get(4), 0b11011);
    }

    #[test]
    fn test_set_word_boundary_u8() {
        let mut bv = make_bit_vec_u8();

        bv.set(1, 0b01011);

        assert_eq!(
            &bv.buf[..],
            &[0b011_11000, 0b1_10001_01, 0b1011_0010, 0b1]
        );
        assert_eq!(bv.get(0), 0b11000);
        assert_eq!(bv.get(1), 0b01011);
        assert_eq!(bv.get(2), 0b10001);
    }

    #[test]
    fn test_set_masks_value() {
        let mut bv = BitVec::<u8, 5>::new(3);

        bv.set(1, 0xff);

        assert_eq!(bv.iter().collect::<Vec<_>>(), vec![0, 0b11111, 0]);
    }

    #[test]
    fn test_set_u64_across_words() {
        let mut bv = BitVec::<u64, 6>::new(16);

        // Slot 10 occupies bits 60..66.
        bv.set(10, 0b111111);
        bv.set(11, 0b000001);

        assert_eq!(bv.buf[0], 0b1111 << 60);
        assert_eq!(bv.buf[1], 0b11 | (0b1 << 2));
        assert_eq!(bv.get(9), 0);
        assert_eq!(bv.get(10), 0b111111);
        assert_eq!(bv.get(11), 1);
    }

    #[test]
    fn test_full_width_slots() {
        let mut bv = BitVec::<u8, 8>::new(2);

        bv.set(1, 0xab);

        assert_eq!(BitVec::<u8, 8>::max_value(), 0xff);
        assert_eq!(bv.iter().collect::<Vec<_>>(), vec![0, 0xab]);
    }

    #[test]
    fn test_update_max() {
        let mut bv = make_bit_vec_u8();

        assert!(bv.update_max(1, 0b01011));
        assert_eq!(bv.get(1), 0b01011);

        assert!(!bv.update_max(3, 0b00011));
        assert_eq!(bv.get(3), 0b00101);

        assert!(!bv.update_max(4, 0b11011));
    }

    #[test]
    fn test_update_max_saturates() {
        let mut bv = BitVec::<u64, 6>::new(4);

        assert!(bv.update_max(2, 100));

        assert_eq!(bv.get(2), 63);
    }

    #[test]
    fn test_max_assign() {
        let mut left = BitVec::<u8, 5>::new(3);
        let mut right = BitVec::<u8, 5>::new(3);
        left.set(0, 7);
        left.set(1, 2);
        right.set(1, 9);
        right.set(2, 4);

        left.max_assign(&right);

        assert_eq!(left.iter().collect::<Vec<_>>(), vec![7, 9, 4]);
    }

    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn test_get_out_of_bounds() {
        BitVec::<u8, 5>::new(3).get(3);
    }
}
