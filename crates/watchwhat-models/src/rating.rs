use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MIN_SCORE: f32 = 0.0;
pub const MAX_SCORE: f32 = 10.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub content_id: u64,
    pub score: f32, // 0-10 inclusive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Scores are accepted on the closed range [0, 10]; NaN is rejected
pub fn is_valid_score(score: f32) -> bool {
    (MIN_SCORE..=MAX_SCORE).contains(&score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_bounds() {
        assert!(is_valid_score(0.0));
        assert!(is_valid_score(10.0));
        assert!(is_valid_score(7.5));
        assert!(!is_valid_score(-0.1));
        assert!(!is_valid_score(10.5));
        assert!(!is_valid_score(f32::NAN));
    }
}
