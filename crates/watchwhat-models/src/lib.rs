pub mod catalog;
pub mod export;
pub mod format;
pub mod media;
pub mod preferences;
pub mod rating;
pub mod stats;
pub mod watch_history;
pub mod watchlist;

pub use catalog::{
    AuthorDetails, CastMember, CatalogReview, ContentDetails, Credits, CrewMember, Genre,
    MovieDetails, Network, Page, SeriesDetails, Video,
};
pub use export::ExportBundle;
pub use format::{format_rating, format_runtime, format_year};
pub use media::{Content, ContentKind, ContentSnapshot, MovieSummary, SeriesSummary};
pub use preferences::Preferences;
pub use rating::{is_valid_score, Rating, MAX_SCORE, MIN_SCORE};
pub use stats::UserStats;
pub use watch_history::WatchedItem;
pub use watchlist::{FavoriteItem, WatchlistItem};
