use crate::set_membership::SetMembership;
use std::collections::HashSet;
use std::hash::{BuildHasher, Hash};

impl<T, S> SetMembership<T> for HashSet<T, S>
where
    T: Clone + Eq + Hash,
    S: BuildHasher,
{
    fn contains(&self, item: &T) -> bool {
        HashSet::contains(self, item)
    }

    fn add(&mut self, item: &T) {
        if !HashSet::contains(self, item) {
            self.insert(item.clone());
        }
    }
}

/// Linear scan baseline. Duplicates are kept out so lookups stay
/// proportional to the number of distinct items.
impl<T> SetMembership<T> for Vec<T>
where
    T: Clone + PartialEq,
{
    fn contains(&self, item: &T) -> bool {
        self.as_slice().contains(item)
    }

    fn add(&mut self, item: &T) {
        if !self.as_slice().contains(item) {
            self.push(item.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise<S: SetMembership<String>>(set: &mut S) {
        for i in 0..10 {
            set.add(&format!("user{i}"));
        }
        set.add(&"user3".to_string());

        for i in 0..10 {
            assert!(set.contains(&format!("user{i}")));
        }
        assert!(!set.contains(&"user10".to_string()));
    }

    #[test]
    fn test_hash_set() {
        let mut set = HashSet::new();
        exercise(&mut set);
        assert_eq!(set.len(), 10);
    }

    #[test]
    fn test_vec() {
        let mut list = Vec::new();
        exercise(&mut list);
        assert_eq!(list.len(), 10);
    }
}
