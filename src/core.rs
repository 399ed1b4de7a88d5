use std::hash::Hash;

use ahash::AHashMap as HashMap;

use crate::session;

/// Item counts in a fixed iteration order. Items are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frequencies {
    entries: Vec<(String, usize)>,
}

impl Frequencies {
    /// Wrap entries whose items are already unique, keeping their order.
    pub(crate) fn from_unique(entries: Vec<(String, usize)>) -> Self {
        Frequencies { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, item: &str) -> Option<usize> {
        self.entries.iter().find(|(k, _)| k == item).map(|&(_, c)| c)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(k, c)| (k.as_str(), *c))
    }

    pub fn as_slice(&self) -> &[(String, usize)] {
        &self.entries
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    /// Order-independent comparison of the (item, count) pairs.
    pub fn same_counts(&self, other: &Frequencies) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let mine: HashMap<&str, usize> = self.iter().collect();
        other.iter().all(|(k, c)| mine.get(k) == Some(&c))
    }

    pub fn is_descending(&self) -> bool {
        self.entries.windows(2).all(|w| w[0].1 >= w[1].1)
    }
}

impl FromIterator<(String, usize)> for Frequencies {
    /// Later duplicates of an item are folded into its first position.
    fn from_iter<I: IntoIterator<Item = (String, usize)>>(iter: I) -> Self {
        let mut tally: Tally<String> = Tally::new();
        for (item, count) in iter {
            match tally.get_mut(&item) {
                Some(c) => *c += count,
                None => tally.insert(item, count),
            }
        }
        tally.into_frequencies()
    }
}

/// Accumulator from item to count that remembers first-insertion order.
#[derive(Debug, Clone)]
pub struct Tally<K> {
    index: HashMap<K, usize>,
    counts: Vec<(K, usize)>,
}

impl<K: Eq + Hash + Clone> Default for Tally<K> {
    fn default() -> Self {
        Tally { index: HashMap::new(), counts: Vec::new() }
    }
}

impl<K: Eq + Hash + Clone> Tally<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn contains(&self, item: &K) -> bool {
        self.index.contains_key(item)
    }

    pub fn get(&self, item: &K) -> Option<usize> {
        self.index.get(item).map(|&i| self.counts[i].1)
    }

    pub fn get_mut(&mut self, item: &K) -> Option<&mut usize> {
        let i = *self.index.get(item)?;
        Some(&mut self.counts[i].1)
    }

    /// Set the count for `item`; a new item goes to the end of the order.
    pub fn insert(&mut self, item: K, count: usize) {
        let _scope = session::scope("insert");
        match self.index.get(&item) {
            Some(&i) => self.counts[i].1 = count,
            None => {
                self.index.insert(item.clone(), self.counts.len());
                self.counts.push((item, count));
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, usize)> {
        self.counts.iter().map(|(k, c)| (k, *c))
    }

    pub fn into_vec(self) -> Vec<(K, usize)> {
        self.counts
    }
}

impl<K: Eq + Hash + Clone + AsRef<str>> Tally<K> {
    pub fn into_frequencies(self) -> Frequencies {
        Frequencies {
            entries: self
                .counts
                .into_iter()
                .map(|(k, c)| (k.as_ref().to_string(), c))
                .collect(),
        }
    }
}

/// Reorder `counts` by descending count. The sort is stable, so equal counts
/// keep their incoming order.
pub fn sort_counter(counts: Frequencies) -> Frequencies {
    let _scope = session::scope("sort_counter");
    let mut entries = counts.entries;
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    Frequencies { entries }
}

/// A strategy for counting item occurrences.
pub trait FrequencyCounter {
    /// Short label used in reports and benchmark ids.
    const NAME: &'static str;

    /// Count `items` and return the counts in descending order.
    fn count<S: AsRef<str>>(items: &[S]) -> Frequencies;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn freqs(pairs: &[(&str, usize)]) -> Frequencies {
        pairs.iter().map(|&(k, c)| (k.to_string(), c)).collect()
    }

    #[test]
    fn tally_keeps_first_insertion_order() {
        let mut t: Tally<&str> = Tally::new();
        t.insert("b", 1);
        t.insert("a", 1);
        t.insert("b", 5);
        assert_eq!(t.into_vec(), vec![("b", 5), ("a", 1)]);
    }

    #[test]
    fn sort_counter_is_stable_for_ties() {
        let sorted = sort_counter(freqs(&[("x", 1), ("y", 2), ("z", 1), ("w", 2)]));
        assert_eq!(sorted, freqs(&[("y", 2), ("w", 2), ("x", 1), ("z", 1)]));
        assert!(sorted.is_descending());
    }

    #[test]
    fn sort_counter_twice_matches_once() {
        let once = sort_counter(freqs(&[("a", 3), ("b", 7), ("c", 3), ("d", 9)]));
        let twice = sort_counter(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn same_counts_ignores_order() {
        let a = freqs(&[("a", 1), ("b", 2)]);
        let b = freqs(&[("b", 2), ("a", 1)]);
        let c = freqs(&[("b", 2), ("a", 2)]);
        assert!(a.same_counts(&b));
        assert!(!a.same_counts(&c));
        assert_eq!(a.total(), 3);
        assert_eq!(b.get("b"), Some(2));
        assert_eq!(b.get("q"), None);
    }

    #[test]
    fn collecting_folds_duplicates() {
        let f = freqs(&[("a", 1), ("b", 1), ("a", 2)]);
        assert_eq!(f.as_slice(), &[("a".to_string(), 3), ("b".to_string(), 1)]);
    }
}
