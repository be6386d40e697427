use crate::bit_vec::BitVec;
use crate::cardinality::Cardinality;
use crate::error::{Error, Result};
use crate::hash::{default_build_hasher, DefaultBuildHasher};
use log::{debug, trace};
use std::fmt::{Debug, Formatter};
use std::hash::{BuildHasher, Hash};
use std::marker::PhantomData;

pub const MIN_PRECISION: usize = 4;
pub const MAX_PRECISION: usize = 18;

const HASH_BITS: u32 = u64::BITS;

// 6 bits hold ranks up to 63 >= HASH_BITS - MIN_PRECISION.
type Registers = BitVec<u64, 6>;

/// HyperLogLog cardinality estimator with `2^precision` registers.
///
/// The low `precision` bits of an item's 64-bit hash select a register,
/// which keeps the largest rank (leading zeros plus one) seen in the
/// remaining bits. Small cardinalities are estimated with linear counting.
/// There is no large-range correction, so estimates lose accuracy as the
/// cardinality approaches `2^64`.
pub struct HyperLogLog<T: ?Sized, H = DefaultBuildHasher> {
    registers: Registers,
    precision: usize,
    alpha: f64,
    build_hasher: H,
    _phantom: PhantomData<T>,
}

impl<T: ?Sized> HyperLogLog<T> {
    pub fn new(precision: usize) -> Result<Self> {
        Self::with_hasher(precision, default_build_hasher())
    }

    /// Creates the smallest estimator whose standard error
    /// `1.04 / sqrt(2^precision)` is at most `epsilon`.
    pub fn with_error(epsilon: f64) -> Result<Self> {
        Self::with_error_and_hasher(epsilon, default_build_hasher())
    }
}

impl<T: ?Sized, H> HyperLogLog<T, H> {
    pub fn with_hasher(precision: usize, build_hasher: H) -> Result<Self> {
        if !(MIN_PRECISION..=MAX_PRECISION).contains(&precision) {
            return Err(Error::invalid_config(format!(
                "precision must be in the range [{MIN_PRECISION}, {MAX_PRECISION}], got {precision}"
            )));
        }
        let alpha = alpha(precision);
        debug!(
            "creating hyperloglog: precision={}, num_buckets={}, alpha={}",
            precision,
            1usize << precision,
            alpha
        );
        Ok(Self {
            registers: Registers::new(1 << precision),
            precision,
            alpha,
            build_hasher,
            _phantom: PhantomData,
        })
    }

    pub fn with_error_and_hasher(epsilon: f64, build_hasher: H) -> Result<Self> {
        if !(0.0 < epsilon && epsilon < 1.0) {
            return Err(Error::invalid_config(format!(
                "epsilon must be in the range (0, 1), got {epsilon}"
            )));
        }
        let m = (1.04 / epsilon).powi(2);
        let precision = (m.log2().ceil() as usize).max(MIN_PRECISION);
        Self::with_hasher(precision, build_hasher)
    }

    pub fn precision(&self) -> usize {
        self.precision
    }

    pub fn num_buckets(&self) -> usize {
        self.registers.len()
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Standard error of the estimate, `1.04 / sqrt(num_buckets)`.
    pub fn relative_error(&self) -> f64 {
        1.04 / (self.num_buckets() as f64).sqrt()
    }

    /// Current rank of every register, in bucket order.
    pub fn registers(&self) -> impl Iterator<Item = u8> + '_ {
        self.registers.iter().map(|rank| rank as u8)
    }

    /// Estimated number of distinct items added.
    pub fn estimate(&self) -> f64 {
        let m = self.num_buckets() as f64;
        let raw = self.raw_estimate();
        if raw <= 2.5 * m {
            let zeros = self.registers.iter().filter(|&rank| rank == 0).count();
            if zeros > 0 {
                return m * (m / zeros as f64).ln();
            }
        }
        raw
    }

    /// [`estimate`](Self::estimate) truncated to an integer.
    pub fn count(&self) -> u64 {
        self.estimate() as u64
    }

    /// Folds `other` into `self`, after which `self` estimates the union of
    /// both streams. Both must have the same precision and hash with
    /// equivalent hashers.
    pub fn merge(&mut self, other: &Self) -> Result<()> {
        if self.precision != other.precision {
            return Err(Error::incompatible(
                "precision",
                self.precision,
                other.precision,
            ));
        }
        trace!("merging hyperloglogs with precision {}", self.precision);
        self.registers.max_assign(&other.registers);
        Ok(())
    }

    fn raw_estimate(&self) -> f64 {
        let m = self.num_buckets() as f64;
        let z: f64 = self
            .registers
            .iter()
            .map(|rank| 1. / (1u64 << rank) as f64)
            .sum();
        self.alpha * m * m / z
    }
}

impl<T, H> HyperLogLog<T, H>
where
    T: Hash + ?Sized,
    H: BuildHasher,
{
    pub fn add(&mut self, item: &T) {
        self.insert(item);
    }

    /// Adds `item` and returns whether its register changed.
    pub fn insert(&mut self, item: &T) -> bool {
        let hash = self.build_hasher.hash_one(item);
        let (bucket, rank) = bucket_and_rank(hash, self.precision);
        self.registers.update_max(bucket, rank as u64)
    }
}

fn alpha(precision: usize) -> f64 {
    match precision {
        4 => 0.673,
        5 => 0.697,
        6 => 0.709,
        _ => 0.7213 / (1. + 1.079 / (1u64 << precision) as f64),
    }
}

/// Splits a hash into its register index (low `precision` bits) and the
/// rank of the remaining `64 - precision` bits. An all-zero remainder has
/// the maximal rank `64 - precision`.
fn bucket_and_rank(hash: u64, precision: usize) -> (usize, u8) {
    let bucket = (hash & ((1 << precision) - 1)) as usize;
    let remaining = hash >> precision;
    let width = HASH_BITS - precision as u32;
    let rank = if remaining == 0 {
        width
    } else {
        remaining.leading_zeros() - precision as u32 + 1
    };
    debug_assert!(rank as u64 <= Registers::max_value());
    (bucket, rank as u8)
}

impl<T, H> Cardinality<T> for HyperLogLog<T, H>
where
    T: Hash + ?Sized,
    H: BuildHasher,
{
    fn count(&self) -> u64 {
        HyperLogLog::count(self)
    }

    fn add(&mut self, item: &T) {
        HyperLogLog::add(self, item)
    }
}

impl<T: ?Sized, H: Clone> Clone for HyperLogLog<T, H> {
    fn clone(&self) -> Self {
        Self {
            registers: self.registers.clone(),
            precision: self.precision,
            alpha: self.alpha,
            build_hasher: self.build_hasher.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<T: ?Sized, H> Debug for HyperLogLog<T, H> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "HyperLogLog {{ precision: {} }}", self.precision)
    }
}
