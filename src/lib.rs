//! Function-level profiling with sorted text reports, demonstrated on three
//! ways of counting how often each item occurs in a sequence.
//!
//! ```no_run
//! use countprof::{fixture, FrequencyCounter, MembershipCounter, Profile};
//!
//! let products = fixture::create_products(fixture::DEFAULT_SEED, 10_000);
//! let counts = Profile::new("count_products")
//!     .lines_to_print(10)
//!     .strip_dirs(true)
//!     .call(|| MembershipCounter::count(&products))?;
//! assert_eq!(counts.total(), 10_000);
//! # Ok::<(), countprof::ProfileError>(())
//! ```

pub mod core;
pub mod counter;
pub mod error;
pub mod fixture;
pub mod membership;
pub mod native;
pub mod optimistic;
pub mod profile;
pub mod session;
pub mod stats;

pub use crate::core::{sort_counter, Frequencies, FrequencyCounter, Tally};
pub use crate::counter::Counter;
pub use crate::error::{ProfileError, Result};
pub use crate::membership::MembershipCounter;
pub use crate::native::NativeCounter;
pub use crate::optimistic::OptimisticCounter;
pub use crate::profile::{Profile, ProfileConfig};
pub use crate::session::Session;
pub use crate::stats::{FuncKey, FuncStat, Restriction, SortKey, Stats};
