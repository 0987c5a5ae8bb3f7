use serde::{Deserialize, Serialize};
use crate::media::{ContentKind, ContentSnapshot};

/// One page of a paginated catalog response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u64,
}

fn default_page() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Network {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieDetails {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub original_language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeriesDetails {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub last_air_date: Option<String>,
    #[serde(default)]
    pub episode_run_time: Vec<u32>,
    #[serde(default)]
    pub number_of_seasons: Option<u32>,
    #[serde(default)]
    pub number_of_episodes: Option<u32>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub in_production: bool,
    #[serde(default)]
    pub networks: Vec<Network>,
    #[serde(default)]
    pub original_language: Option<String>,
}

/// Full detail record for either kind of content
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "media_type")]
pub enum ContentDetails {
    #[serde(rename = "movie")]
    Movie(MovieDetails),
    #[serde(rename = "tv")]
    Series(SeriesDetails),
}

impl ContentDetails {
    pub fn id(&self) -> u64 {
        match self {
            ContentDetails::Movie(m) => m.id,
            ContentDetails::Series(s) => s.id,
        }
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            ContentDetails::Movie(_) => ContentKind::Movie,
            ContentDetails::Series(_) => ContentKind::Series,
        }
    }

    pub fn display_title(&self) -> &str {
        match self {
            ContentDetails::Movie(m) => &m.title,
            ContentDetails::Series(s) => &s.name,
        }
    }

    pub fn genres(&self) -> &[Genre] {
        match self {
            ContentDetails::Movie(m) => &m.genres,
            ContentDetails::Series(s) => &s.genres,
        }
    }

    /// Runtime in minutes; series use their first listed episode runtime
    pub fn runtime(&self) -> Option<u32> {
        match self {
            ContentDetails::Movie(m) => m.runtime,
            ContentDetails::Series(s) => s.episode_run_time.first().copied(),
        }
    }

    pub fn snapshot(&self) -> ContentSnapshot {
        let (poster_path, release_date, vote_average) = match self {
            ContentDetails::Movie(m) => (m.poster_path.clone(), m.release_date.clone(), m.vote_average),
            ContentDetails::Series(s) => (s.poster_path.clone(), s.first_air_date.clone(), s.vote_average),
        };
        ContentSnapshot {
            id: self.id(),
            kind: self.kind(),
            title: self.display_title().to_string(),
            poster_path,
            release_date,
            vote_average,
            genre_ids: self.genres().iter().map(|g| g.id).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CastMember {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub profile_path: Option<String>,
    #[serde(default)]
    pub order: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrewMember {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub job: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Credits {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Video {
    pub id: String,
    pub key: String,
    pub name: String,
    pub site: String,
    #[serde(rename = "type")]
    pub video_type: String,
    #[serde(default)]
    pub official: bool,
    #[serde(default)]
    pub published_at: Option<String>,
}

impl Video {
    pub fn is_youtube_trailer(&self) -> bool {
        self.site.eq_ignore_ascii_case("youtube") && self.video_type == "Trailer"
    }

    /// Watch URL for the hosting site, when known
    pub fn watch_url(&self) -> Option<String> {
        match self.site.to_lowercase().as_str() {
            "youtube" => Some(format!("https://www.youtube.com/watch?v={}", self.key)),
            "vimeo" => Some(format!("https://vimeo.com/{}", self.key)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthorDetails {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub rating: Option<f32>,
}

/// A public review published on the catalog (not a user rating)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogReview {
    pub id: String,
    pub author: String,
    pub content: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub author_details: Option<AuthorDetails>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_defaults_when_fields_missing() {
        let page: Page<Genre> = serde_json::from_str(r#"{"results":[{"id":18,"name":"Drama"}]}"#).unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn test_series_details_snapshot_uses_first_air_date() {
        let details = ContentDetails::Series(SeriesDetails {
            id: 1396,
            name: "Breaking Bad".to_string(),
            overview: None,
            tagline: None,
            first_air_date: Some("2008-01-20".to_string()),
            last_air_date: None,
            episode_run_time: vec![47, 45],
            number_of_seasons: Some(5),
            number_of_episodes: Some(62),
            genres: vec![Genre { id: 18, name: "Drama".to_string() }],
            vote_average: 8.9,
            vote_count: 14000,
            popularity: 400.0,
            poster_path: None,
            backdrop_path: None,
            status: Some("Ended".to_string()),
            in_production: false,
            networks: vec![],
            original_language: Some("en".to_string()),
        });

        let snapshot = details.snapshot();
        assert_eq!(snapshot.kind, ContentKind::Series);
        assert_eq!(snapshot.release_date.as_deref(), Some("2008-01-20"));
        assert_eq!(snapshot.genre_ids, vec![18]);
        assert_eq!(details.runtime(), Some(47));
    }

    #[test]
    fn test_video_urls() {
        let video = Video {
            id: "v1".to_string(),
            key: "abc123".to_string(),
            name: "Official Trailer".to_string(),
            site: "YouTube".to_string(),
            video_type: "Trailer".to_string(),
            official: true,
            published_at: None,
        };
        assert!(video.is_youtube_trailer());
        assert_eq!(video.watch_url().as_deref(), Some("https://www.youtube.com/watch?v=abc123"));
    }
}
