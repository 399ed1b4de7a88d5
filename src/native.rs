use crate::core::{Frequencies, FrequencyCounter};
use crate::counter::Counter;

/// Delegates to [`Counter`], which keeps the counts itself and ranks them on
/// request.
pub struct NativeCounter;

impl FrequencyCounter for NativeCounter {
    const NAME: &'static str = "native";

    fn count<S: AsRef<str>>(items: &[S]) -> Frequencies {
        let counter: Counter<&str> = items.iter().map(|s| s.as_ref()).collect();
        Frequencies::from_unique(
            counter
                .most_common(None)
                .into_iter()
                .map(|(k, c)| (k.to_string(), c))
                .collect(),
        )
    }
}
