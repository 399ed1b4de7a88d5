use crate::core::{sort_counter, Frequencies, FrequencyCounter, Tally};
use crate::session;

/// Counts by incrementing optimistically and initialising on a miss.
///
/// Produces exactly what [`MembershipCounter`](crate::MembershipCounter)
/// produces; it exists to compare the cost of handling the first occurrence
/// after a failed lookup instead of before it.
pub struct OptimisticCounter;

/// Build the unsorted tally: try the increment, fall back to inserting 1.
pub fn create_counter_v2<S: AsRef<str>>(items: &[S]) -> Tally<&str> {
    let _scope = session::scope("create_counter_v2");
    let mut tally: Tally<&str> = Tally::new();
    for item in items {
        let item = item.as_ref();
        match tally.get_mut(&item) {
            Some(count) => *count += 1,
            None => tally.insert(item, 1),
        }
    }
    tally
}

impl FrequencyCounter for OptimisticCounter {
    const NAME: &'static str = "optimistic";

    fn count<S: AsRef<str>>(items: &[S]) -> Frequencies {
        sort_counter(create_counter_v2(items).into_frequencies())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::create_counter;

    #[test]
    fn matches_check_then_increment_exactly() {
        let items = ["q", "r", "q", "s", "r", "q", "t"];
        assert_eq!(create_counter_v2(&items).into_vec(), create_counter(&items).into_vec());
    }
}
