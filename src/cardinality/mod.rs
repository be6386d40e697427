pub mod hash_set;
pub mod hll;

/// Counting of distinct items, exact or approximate.
pub trait Cardinality<T: ?Sized> {
    fn count(&self) -> u64;
    fn add(&mut self, item: &T);
}
