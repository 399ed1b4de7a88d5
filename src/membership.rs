use crate::core::{sort_counter, Frequencies, FrequencyCounter, Tally};
use crate::session;

/// Counts by testing membership first: an unseen item is set to zero, then
/// every item is incremented in place.
pub struct MembershipCounter;

/// Build the unsorted tally using the check-then-increment pattern.
pub fn create_counter<S: AsRef<str>>(items: &[S]) -> Tally<&str> {
    let _scope = session::scope("create_counter");
    let mut tally: Tally<&str> = Tally::new();
    for item in items {
        let item = item.as_ref();
        if !tally.contains(&item) {
            tally.insert(item, 0);
        }
        if let Some(count) = tally.get_mut(&item) {
            *count += 1;
        }
    }
    tally
}

impl FrequencyCounter for MembershipCounter {
    const NAME: &'static str = "membership";

    fn count<S: AsRef<str>>(items: &[S]) -> Frequencies {
        sort_counter(create_counter(items).into_frequencies())
    }
}
