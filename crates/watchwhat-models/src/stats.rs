use serde::{Deserialize, Serialize};

/// Display-only aggregate over a user's remote data.
///
/// Built from independent reads, so it may be momentarily inconsistent with
/// a concurrent write.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_watched: usize,
    pub total_watchlist: usize,
    pub total_ratings: usize,
    /// Mean of all rating scores, rounded to one decimal
    pub average_rating: Option<f32>,
    /// Most frequent genre ids in watched history, with counts
    pub top_genres: Vec<(u32, usize)>,
}
