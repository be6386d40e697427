use std::fmt::{Display, Formatter};
use std::hash::{BuildHasher, Hash};
use xxhash_rust::xxh3::Xxh3Builder;

/// Hasher used by the constructors that do not take one.
///
/// Seeded with a constant, so equal items hash equally across instances
/// and processes. `RandomState` would not.
pub type DefaultBuildHasher = Xxh3Builder;

pub(crate) fn default_build_hasher() -> DefaultBuildHasher {
    Xxh3Builder::new()
}

/// How a Bloom filter derives its `k` bit positions from an item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ProbeScheme {
    /// Probe `i` is the hash of the pair `(item, i)`, one full hash per probe.
    #[default]
    Salted,
    /// A single hash split into `h1` (high half) and `h2` (low half); probe
    /// `i` is `h1 + i * h2 + i^3`.
    EnhancedDoubleHashing,
}

impl Display for ProbeScheme {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeScheme::Salted => write!(f, "salted"),
            ProbeScheme::EnhancedDoubleHashing => write!(f, "enhanced double hashing"),
        }
    }
}

/// Bit positions in `[0, num_bits)` probed for one item.
pub(crate) struct Probes<'a, T: ?Sized, H> {
    item: &'a T,
    build_hasher: &'a H,
    scheme: ProbeScheme,
    num_bits: u64,
    h1: u64,
    h2: u64,
    current: usize,
    num_hashes: usize,
}

impl<'a, T, H> Probes<'a, T, H>
where
    T: Hash + ?Sized,
    H: BuildHasher,
{
    pub fn new(
        item: &'a T,
        num_bits: usize,
        num_hashes: usize,
        scheme: ProbeScheme,
        build_hasher: &'a H,
    ) -> Self {
        debug_assert!(num_bits > 0, "num_bits must be > 0");
        let (h1, h2) = match scheme {
            ProbeScheme::Salted => (0, 0),
            ProbeScheme::EnhancedDoubleHashing => {
                let hash = build_hasher.hash_one(item);
                (hash >> 32, hash & 0xffff_ffff)
            }
        };
        Self {
            item,
            build_hasher,
            scheme,
            num_bits: num_bits as u64,
            h1,
            h2,
            current: 0,
            num_hashes,
        }
    }
}

impl<T, H> Iterator for Probes<'_, T, H>
where
    T: Hash + ?Sized,
    H: BuildHasher,
{
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.num_hashes {
            return None;
        }
        let i = self.current as u64;
        self.current += 1;

        let hash = match self.scheme {
            ProbeScheme::Salted => self.build_hasher.hash_one((self.item, i)),
            ProbeScheme::EnhancedDoubleHashing => self
                .h1
                .wrapping_add(i.wrapping_mul(self.h2))
                .wrapping_add(i.wrapping_mul(i).wrapping_mul(i)),
        };
        Some((hash % self.num_bits) as usize)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.num_hashes - self.current;
        (remaining, Some(remaining))
    }
}

impl<T, H> ExactSizeIterator for Probes<'_, T, H>
where
    T: Hash + ?Sized,
    H: BuildHasher,
{
}
