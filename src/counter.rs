use std::hash::Hash;

use crate::core::Tally;
use crate::session;

/// Multiset that counts hashable items natively.
///
/// Iteration follows first-insertion order; [`Counter::most_common`] gives
/// the descending view with ties left in that order.
#[derive(Debug, Clone)]
pub struct Counter<K> {
    tally: Tally<K>,
}

impl<K: Eq + Hash + Clone> Default for Counter<K> {
    fn default() -> Self {
        Counter { tally: Tally::new() }
    }
}

impl<K: Eq + Hash + Clone> Counter<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one occurrence of `item`.
    pub fn add(&mut self, item: K) {
        match self.tally.get_mut(&item) {
            Some(count) => *count += 1,
            None => self.tally.insert(item, 1),
        }
    }

    /// Count every item yielded by `items`.
    pub fn update<I: IntoIterator<Item = K>>(&mut self, items: I) {
        let _scope = session::scope("update");
        for item in items {
            self.add(item);
        }
    }

    /// Occurrences of `item`; zero when it was never seen.
    pub fn get(&self, item: &K) -> usize {
        self.tally.get(item).unwrap_or(0)
    }

    /// Number of distinct items.
    pub fn len(&self) -> usize {
        self.tally.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tally.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.tally.iter().map(|(_, c)| c).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, usize)> {
        self.tally.iter()
    }

    /// The `n` most frequent items (all of them when `n` is `None`), most
    /// frequent first.
    pub fn most_common(&self, n: Option<usize>) -> Vec<(K, usize)> {
        let _scope = session::scope("most_common");
        let mut items: Vec<(K, usize)> = self.tally.iter().map(|(k, c)| (k.clone(), c)).collect();
        items.sort_by(|a, b| b.1.cmp(&a.1));
        if let Some(n) = n {
            items.truncate(n);
        }
        items
    }
}

impl<K: Eq + Hash + Clone> FromIterator<K> for Counter<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut counter = Counter::new();
        counter.update(iter);
        counter
    }
}

impl<K: Eq + Hash + Clone> Extend<K> for Counter<K> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        self.update(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_ranks_items() {
        let counter: Counter<char> = "abracadabra".chars().collect();
        assert_eq!(counter.get(&'a'), 5);
        assert_eq!(counter.get(&'z'), 0);
        assert_eq!(counter.len(), 5);
        assert_eq!(counter.total(), 11);
        assert_eq!(counter.most_common(Some(3)), vec![('a', 5), ('b', 2), ('r', 2)]);
    }

    #[test]
    fn extend_adds_to_existing_counts() {
        let mut counter: Counter<u8> = [1, 2, 2].into_iter().collect();
        counter.extend([2, 3]);
        assert_eq!(counter.most_common(None), vec![(2, 3), (1, 1), (3, 1)]);
        assert!(!counter.is_empty());
    }
}
