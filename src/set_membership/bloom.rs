use crate::error::{Error, Result};
use crate::hash::{default_build_hasher, DefaultBuildHasher, ProbeScheme, Probes};
use crate::set_membership::SetMembership;
use fixedbitset::FixedBitSet;
use log::{debug, trace};
use std::f64::consts::LN_2;
use std::fmt::{Debug, Formatter};
use std::hash::{BuildHasher, Hash};
use std::marker::PhantomData;

/// Number of bits needed to hold `num_items` items at the given false
/// positive rate: `ceil(-n * ln(p) / ln(2)^2)`, at least 1.
pub fn optimal_num_bits(num_items: usize, false_positive_rate: f64) -> usize {
    let bits = (-(num_items as f64) * false_positive_rate.ln() / (LN_2 * LN_2)).ceil();
    (bits as usize).max(1)
}

/// Number of probes minimizing the false positive rate for `num_bits` bits
/// and `num_items` items: `round(m / n * ln(2))`, at least 1.
pub fn optimal_num_hashes(num_bits: usize, num_items: usize) -> usize {
    let num_hashes = (num_bits as f64 / num_items as f64 * LN_2).round();
    (num_hashes as usize).max(1)
}

/// Shape of a [`BloomFilter`] before it is allocated.
///
/// ```
/// # use probstream::{BloomFilter, BloomFilterBuilder, ProbeScheme};
/// let filter: BloomFilter<str> = BloomFilterBuilder::with_accuracy(10_000, 0.01)?
///     .probe_scheme(ProbeScheme::EnhancedDoubleHashing)
///     .build();
/// assert_eq!(filter.num_bits(), 95851);
/// assert_eq!(filter.num_hashes(), 7);
/// # Ok::<(), probstream::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BloomFilterBuilder {
    num_bits: usize,
    num_hashes: usize,
    scheme: ProbeScheme,
}

impl BloomFilterBuilder {
    /// Derives the size and number of probes from the expected number of
    /// distinct items and the target false positive rate.
    pub fn with_accuracy(expected_items: usize, false_positive_rate: f64) -> Result<Self> {
        if expected_items == 0 {
            return Err(Error::invalid_config("expected_items must be > 0"));
        }
        // Written this way so that NaN is rejected too.
        if !(0. < false_positive_rate && false_positive_rate < 1.) {
            return Err(Error::invalid_config(format!(
                "false_positive_rate must be in the range (0, 1), got {false_positive_rate}"
            )));
        }
        let num_bits = optimal_num_bits(expected_items, false_positive_rate);
        Ok(Self {
            num_bits,
            num_hashes: optimal_num_hashes(num_bits, expected_items),
            scheme: ProbeScheme::default(),
        })
    }

    pub fn with_size(num_bits: usize, num_hashes: usize) -> Result<Self> {
        if num_bits == 0 {
            return Err(Error::invalid_config("num_bits must be > 0"));
        }
        if num_hashes == 0 {
            return Err(Error::invalid_config("num_hashes must be > 0"));
        }
        Ok(Self {
            num_bits,
            num_hashes,
            scheme: ProbeScheme::default(),
        })
    }

    pub fn probe_scheme(mut self, scheme: ProbeScheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn num_bits(&self) -> usize {
        self.num_bits
    }

    pub fn num_hashes(&self) -> usize {
        self.num_hashes
    }

    pub fn build<T: ?Sized>(self) -> BloomFilter<T> {
        self.build_with_hasher(default_build_hasher())
    }

    pub fn build_with_hasher<T: ?Sized, H>(self, build_hasher: H) -> BloomFilter<T, H> {
        debug!(
            "creating bloom filter: num_bits={}, num_hashes={}, scheme={}",
            self.num_bits, self.num_hashes, self.scheme
        );
        BloomFilter {
            bits: FixedBitSet::with_capacity(self.num_bits),
            num_hashes: self.num_hashes,
            scheme: self.scheme,
            build_hasher,
            _phantom: PhantomData,
        }
    }
}

/// A Bloom filter over items of type `T`.
///
/// `contains` never returns `false` for an added item. For items never
/// added it returns `true` with a probability that approaches the
/// configured rate as the number of distinct added items approaches the
/// expected count, and keeps growing past it.
pub struct BloomFilter<T: ?Sized, H = DefaultBuildHasher> {
    bits: FixedBitSet,
    num_hashes: usize,
    scheme: ProbeScheme,
    build_hasher: H,
    _phantom: PhantomData<T>,
}

impl<T: ?Sized> BloomFilter<T> {
    /// Creates a filter for `expected_items` distinct items at
    /// `false_positive_rate`, hashing with [`DefaultBuildHasher`].
    pub fn new(expected_items: usize, false_positive_rate: f64) -> Result<Self> {
        Ok(BloomFilterBuilder::with_accuracy(expected_items, false_positive_rate)?.build())
    }
}

impl<T: ?Sized, H> BloomFilter<T, H> {
    pub fn with_hasher(
        expected_items: usize,
        false_positive_rate: f64,
        build_hasher: H,
    ) -> Result<Self> {
        Ok(
            BloomFilterBuilder::with_accuracy(expected_items, false_positive_rate)?
                .build_with_hasher(build_hasher),
        )
    }

    pub fn num_bits(&self) -> usize {
        self.bits.len()
    }

    pub fn num_hashes(&self) -> usize {
        self.num_hashes
    }

    pub fn probe_scheme(&self) -> ProbeScheme {
        self.scheme
    }

    /// Number of bits set.
    pub fn count_ones(&self) -> usize {
        self.bits.count_ones(..)
    }

    pub fn is_empty(&self) -> bool {
        self.count_ones() == 0
    }

    /// Estimated number of distinct items added, from the fraction of set
    /// bits. Saturates once every bit is set.
    pub fn len(&self) -> usize {
        let m = self.bits.len() as f64;
        let k = self.num_hashes as f64;
        let ones = self.count_ones() as f64;
        (-m / k * (1. - ones / m).ln()) as usize
    }

    /// Probability that `contains` answers `true` for an item never added,
    /// given the bits currently set.
    pub fn false_positive_rate(&self) -> f64 {
        let fill = self.count_ones() as f64 / self.bits.len() as f64;
        fill.powi(self.num_hashes as i32)
    }

    /// Adds every item of `other` to `self`. Both filters must have the same
    /// shape and hash with equivalent hashers.
    pub fn union(&mut self, other: &Self) -> Result<()> {
        if self.bits.len() != other.bits.len() {
            return Err(Error::incompatible(
                "num_bits",
                self.bits.len(),
                other.bits.len(),
            ));
        }
        if self.num_hashes != other.num_hashes {
            return Err(Error::incompatible(
                "num_hashes",
                self.num_hashes,
                other.num_hashes,
            ));
        }
        if self.scheme != other.scheme {
            return Err(Error::incompatible("probe scheme", self.scheme, other.scheme));
        }
        trace!("union of bloom filters with {} bits", self.bits.len());
        self.bits.union_with(&other.bits);
        Ok(())
    }
}

impl<T, H> BloomFilter<T, H>
where
    T: Hash + ?Sized,
    H: BuildHasher,
{
    pub fn contains(&self, item: &T) -> bool {
        let mut probes = Probes::new(
            item,
            self.bits.len(),
            self.num_hashes,
            self.scheme,
            &self.build_hasher,
        );
        probes.all(|bit| self.bits.contains(bit))
    }

    pub fn add(&mut self, item: &T) {
        self.insert(item);
    }

    /// Adds `item` and returns whether any bit changed. `false` means the
    /// item was already (probably) present.
    pub fn insert(&mut self, item: &T) -> bool {
        let probes = Probes::new(
            item,
            self.bits.len(),
            self.num_hashes,
            self.scheme,
            &self.build_hasher,
        );
        !probes.fold(true, |acc, bit| self.bits.put(bit) & acc)
    }
}

impl<T, H> SetMembership<T> for BloomFilter<T, H>
where
    T: Hash + ?Sized,
    H: BuildHasher,
{
    fn contains(&self, item: &T) -> bool {
        BloomFilter::contains(self, item)
    }

    fn add(&mut self, item: &T) {
        BloomFilter::add(self, item)
    }
}

impl<T: ?Sized, H: Clone> Clone for BloomFilter<T, H> {
    fn clone(&self) -> Self {
        Self {
            bits: self.bits.clone(),
            num_hashes: self.num_hashes,
            scheme: self.scheme,
            build_hasher: self.build_hasher.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<T: ?Sized, H> Debug for BloomFilter<T, H> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BloomFilter {{ num_bits: {}, num_hashes: {}, scheme: {:?} }}",
            self.bits.len(),
            self.num_hashes,
            self.scheme
        )
    }
}
