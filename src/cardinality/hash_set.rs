use crate::cardinality::Cardinality;
use std::collections::HashSet;
use std::hash::{BuildHasher, Hash};

impl<T, S> Cardinality<T> for HashSet<T, S>
where
    T: Clone + Eq + Hash,
    S: BuildHasher,
{
    fn count(&self) -> u64 {
        self.len() as u64
    }

    fn add(&mut self, item: &T) {
        if !self.contains(item) {
            self.insert(item.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count() {
        let mut set = HashSet::new();
        for i in 0..100u32 {
            Cardinality::add(&mut set, &(i % 40));
        }

        assert_eq!(Cardinality::count(&set), 40);
    }
}
