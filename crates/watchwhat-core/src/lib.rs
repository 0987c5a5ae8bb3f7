pub mod preferences;
pub mod recommend;
pub mod search;
pub mod storage;
pub mod user_data;

#[cfg(test)]
mod testing;

pub use preferences::{ImportError, LocalPreferenceStore};
pub use recommend::{recommend, RecommendationRequest};
pub use search::{search_lines, SearchResults, SearchSession};
pub use storage::{FileStorage, MemoryStorage, StorageError, StorageEvent, StorageKey, StoragePort, WriterId};
pub use user_data::{compute_stats, UserDataService};
