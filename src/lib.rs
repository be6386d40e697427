//! Probabilistic sketches for item streams.
//!
//! * [`BloomFilter`] answers approximate set membership: no false negatives,
//!   false positives at a rate chosen at construction.
//! * [`HyperLogLog`] estimates the number of distinct items in sub-linear
//!   memory with a relative error of about `1.04 / sqrt(2^precision)`.
//!
//! Both take the hasher as a [`BuildHasher`](std::hash::BuildHasher) and
//! default to [`DefaultBuildHasher`], which gives the same hashes in every
//! instance and process.
//!
//! ```
//! use probstream::{BloomFilter, HyperLogLog};
//!
//! let mut seen = BloomFilter::<str>::new(1000, 0.01)?;
//! let mut distinct = HyperLogLog::<str>::new(10)?;
//! for email in ["alice@example.org", "bob@example.org", "alice@example.org"] {
//!     seen.add(email);
//!     distinct.add(email);
//! }
//! assert!(seen.contains("bob@example.org"));
//! assert!((1..=2).contains(&distinct.count()));
//! # Ok::<(), probstream::Error>(())
//! ```

mod bit_vec;
pub mod cardinality;
pub mod error;
pub mod hash;
pub mod set_membership;

pub use cardinality::hll::HyperLogLog;
pub use cardinality::Cardinality;
pub use error::{Error, Result};
pub use hash::{DefaultBuildHasher, ProbeScheme};
pub use set_membership::bloom::{BloomFilter, BloomFilterBuilder};
pub use set_membership::SetMembership;
