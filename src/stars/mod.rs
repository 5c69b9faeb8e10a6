// Star count enrichment.
// Caches GitHub star counts with a freshness window and refreshes them in the background.

pub mod cache;
pub mod clock;
pub mod record;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CACHE_KEY, DEFAULT_LOOKUP_TIMEOUT, DEFAULT_TTL, Resolution, StarLookup, StarsCache};
pub use clock::{Clock, SystemClock};
pub use record::{RepoId, StarRecord, StarsSnapshot};
pub use store::{FileStore, KeyValueStore, MemoryStore};
