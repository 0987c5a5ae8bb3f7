pub mod memory;
pub mod rest;
pub mod rows;

pub use memory::MemoryBackend;
pub use rest::RestBackend;
pub use rows::{PreferencesRow, RatingRow, WatchedRow, WatchlistRow};

use std::fmt;

/// Tables of the hosted user-data store; every row is scoped by `userId`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Preferences,
    Watchlist,
    Watched,
    Ratings,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Preferences => "user_preferences",
            Table::Watchlist => "watchlist_items",
            Table::Watched => "watched_series",
            Table::Ratings => "ratings",
        }
    }

    /// Columns of the table's uniqueness constraint, used as the upsert target
    pub fn conflict_columns(&self) -> &'static str {
        match self {
            Table::Preferences => "userId",
            Table::Watchlist | Table::Watched | Table::Ratings => "userId,serieId",
        }
    }

    /// Whether rows are keyed by content id in addition to user id
    pub fn is_per_content(&self) -> bool {
        !matches!(self, Table::Preferences)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An authenticated user of the hosted backend
#[derive(Clone, PartialEq, Eq)]
pub struct UserSession {
    pub user_id: String,
    pub access_token: String,
}

impl UserSession {
    pub fn new(user_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: access_token.into(),
        }
    }
}

impl fmt::Debug for UserSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserSession")
            .field("user_id", &self.user_id)
            .field("access_token", &"***")
            .finish()
    }
}
