pub mod bloom;
pub mod hash_set;

/// Insert-and-query set membership, exact or approximate.
///
/// Approximate implementations may answer `true` for items never added,
/// but never `false` for an item that was.
pub trait SetMembership<T: ?Sized> {
    fn contains(&self, item: &T) -> bool;
    fn add(&mut self, item: &T);
}
