use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The two kinds of content the catalog serves.
///
/// Wire names follow the catalog API (`movie`, `tv`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ContentKind {
    #[serde(rename = "movie")]
    Movie,
    #[serde(rename = "tv")]
    Series,
}

impl ContentKind {
    /// Path segment used by the catalog API for this kind
    pub fn as_path(&self) -> &'static str {
        match self {
            ContentKind::Movie => "movie",
            ContentKind::Series => "tv",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Movie => write!(f, "movie"),
            ContentKind::Series => write!(f, "series"),
        }
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "movie" | "movies" | "film" => Ok(ContentKind::Movie),
            "tv" | "series" | "show" | "shows" => Ok(ContentKind::Series),
            other => Err(format!("Unknown content kind: {}. Use 'movie' or 'series'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieSummary {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    #[serde(default)]
    pub original_language: Option<String>,
    #[serde(default)]
    pub adult: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeriesSummary {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub original_name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    #[serde(default)]
    pub origin_country: Vec<String>,
    #[serde(default)]
    pub original_language: Option<String>,
}

/// A catalog entry, discriminated once at the API boundary.
///
/// Serialized with an internal `media_type` tag so a stored or exported
/// value reads back into the same variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "media_type")]
pub enum Content {
    #[serde(rename = "movie")]
    Movie(MovieSummary),
    #[serde(rename = "tv")]
    Series(SeriesSummary),
}

impl Content {
    pub fn id(&self) -> u64 {
        match self {
            Content::Movie(m) => m.id,
            Content::Series(s) => s.id,
        }
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            Content::Movie(_) => ContentKind::Movie,
            Content::Series(_) => ContentKind::Series,
        }
    }

    pub fn display_title(&self) -> &str {
        match self {
            Content::Movie(m) => &m.title,
            Content::Series(s) => &s.name,
        }
    }

    /// Release date for movies, first air date for series
    pub fn release_date(&self) -> Option<&str> {
        match self {
            Content::Movie(m) => m.release_date.as_deref(),
            Content::Series(s) => s.first_air_date.as_deref(),
        }
    }

    pub fn vote_average(&self) -> f64 {
        match self {
            Content::Movie(m) => m.vote_average,
            Content::Series(s) => s.vote_average,
        }
    }

    pub fn popularity(&self) -> f64 {
        match self {
            Content::Movie(m) => m.popularity,
            Content::Series(s) => s.popularity,
        }
    }

    pub fn genre_ids(&self) -> &[u32] {
        match self {
            Content::Movie(m) => &m.genre_ids,
            Content::Series(s) => &s.genre_ids,
        }
    }

    pub fn poster_path(&self) -> Option<&str> {
        match self {
            Content::Movie(m) => m.poster_path.as_deref(),
            Content::Series(s) => s.poster_path.as_deref(),
        }
    }

    pub fn overview(&self) -> Option<&str> {
        match self {
            Content::Movie(m) => m.overview.as_deref(),
            Content::Series(s) => s.overview.as_deref(),
        }
    }

    pub fn snapshot(&self) -> ContentSnapshot {
        ContentSnapshot {
            id: self.id(),
            kind: self.kind(),
            title: self.display_title().to_string(),
            poster_path: self.poster_path().map(str::to_string),
            release_date: self.release_date().map(str::to_string),
            vote_average: self.vote_average(),
            genre_ids: self.genre_ids().to_vec(),
        }
    }
}

/// Denormalized copy of a catalog entry stored next to user data
/// (favorites, watched history, watchlist rows).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentSnapshot {
    pub id: u64,
    pub kind: ContentKind,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
}

impl From<&Content> for ContentSnapshot {
    fn from(content: &Content) -> Self {
        content.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_decodes_by_media_type_tag() {
        let movie: Content = serde_json::from_str(
            r#"{"media_type":"movie","id":603,"title":"The Matrix","release_date":"1999-03-30","vote_average":8.2,"genre_ids":[28,878]}"#,
        )
        .unwrap();
        assert_eq!(movie.kind(), ContentKind::Movie);
        assert_eq!(movie.display_title(), "The Matrix");
        assert_eq!(movie.genre_ids(), &[28, 878]);

        let series: Content = serde_json::from_str(
            r#"{"media_type":"tv","id":1399,"name":"Game of Thrones","first_air_date":"2011-04-17"}"#,
        )
        .unwrap();
        assert_eq!(series.kind(), ContentKind::Series);
        assert_eq!(series.release_date(), Some("2011-04-17"));
        assert_eq!(series.vote_average(), 0.0);
    }

    #[test]
    fn test_content_round_trips_through_json() {
        let content = Content::Series(SeriesSummary {
            id: 66732,
            name: "Stranger Things".to_string(),
            original_name: None,
            overview: Some("Kids and a lab".to_string()),
            poster_path: Some("/x.jpg".to_string()),
            backdrop_path: None,
            first_air_date: Some("2016-07-15".to_string()),
            vote_average: 8.6,
            vote_count: 17000,
            popularity: 300.0,
            genre_ids: vec![18, 10765],
            origin_country: vec!["US".to_string()],
            original_language: Some("en".to_string()),
        });

        let json = serde_json::to_string(&content).unwrap();
        assert!(json.contains(r#""media_type":"tv""#));
        let back: Content = serde_json::from_str(&json).unwrap();
        assert_eq!(back, content);
    }

    #[test]
    fn test_snapshot_copies_display_fields() {
        let content = Content::Movie(MovieSummary {
            id: 27205,
            title: "Inception".to_string(),
            original_title: None,
            overview: None,
            poster_path: Some("/inception.jpg".to_string()),
            backdrop_path: None,
            release_date: Some("2010-07-15".to_string()),
            vote_average: 8.4,
            vote_count: 35000,
            popularity: 90.0,
            genre_ids: vec![28, 878, 12],
            original_language: Some("en".to_string()),
            adult: false,
        });

        let snapshot = ContentSnapshot::from(&content);
        assert_eq!(snapshot.id, 27205);
        assert_eq!(snapshot.kind, ContentKind::Movie);
        assert_eq!(snapshot.title, "Inception");
        assert_eq!(snapshot.poster_path.as_deref(), Some("/inception.jpg"));
        assert_eq!(snapshot.genre_ids, vec![28, 878, 12]);
    }

    #[test]
    fn test_content_kind_parsing() {
        assert_eq!("movie".parse::<ContentKind>().unwrap(), ContentKind::Movie);
        assert_eq!("TV".parse::<ContentKind>().unwrap(), ContentKind::Series);
        assert_eq!("series".parse::<ContentKind>().unwrap(), ContentKind::Series);
        assert!("person".parse::<ContentKind>().is_err());
        assert_eq!(ContentKind::Series.as_path(), "tv");
    }
}
