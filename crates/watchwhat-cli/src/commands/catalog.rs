use super::display::{
    key_value_table, overview, print_content_table, print_genre_table, print_section_header, spinner,
    truncate,
};
use super::AppContext;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use owo_colors::OwoColorize;
use serde_json::json;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use watchwhat_core::{recommend, search_lines, RecommendationRequest};
use watchwhat_models::{format_rating, format_runtime, format_year, ContentDetails, ContentKind};
use watchwhat_sources::{CatalogApi, DiscoverQuery, SearchScope, TimeWindow, TrendingScope};

const TOP_CAST: usize = 8;
const REVIEW_PREVIEW: usize = 300;

/// Discover filters as given on the command line
pub struct DiscoverFilters {
    pub genres: Vec<u32>,
    pub min_rating: Option<f32>,
    pub year: Option<u32>,
    pub sort_by: String,
    pub page: u32,
}

impl DiscoverFilters {
    fn into_query(self) -> DiscoverQuery {
        DiscoverQuery {
            page: Some(self.page),
            with_genres: watchwhat_sources::catalog::join_any(&self.genres),
            vote_average_gte: self.min_rating,
            sort_by: Some(self.sort_by),
            year: self.year,
            ..DiscoverQuery::default()
        }
    }
}

pub async fn run_search(
    ctx: &AppContext,
    query: String,
    scope: SearchScope,
    page: u32,
    output: &Output,
) -> Result<()> {
    let catalog = ctx.catalog()?;

    let pb = spinner(&format!("Searching for '{}'...", query));
    let result = catalog.search(scope, &query, page, &CancellationToken::new()).await;
    pb.finish_and_clear();

    let page = result.map_err(|e| eyre!("Search failed: {}", e))?;
    info!("Search '{}' returned {} of {} results", query, page.results.len(), page.total_results);

    output.data(serde_json::to_value(&page)?, |out| {
        print_content_table(&page.results, out);
        if page.total_pages > 1 {
            out.info(format!("Page {} of {}", page.page, page.total_pages));
        }
    });
    Ok(())
}

/// Search-as-you-type: each stdin line replaces the query, and results are
/// printed for whichever query was still current once typing paused.
pub async fn run_interactive_search(ctx: &AppContext, output: &Output) -> Result<()> {
    let catalog = Arc::new(ctx.catalog()?);

    output.info(format!(
        "Type to search (at least {} characters), Ctrl-D to finish.",
        ctx.config.search.min_query_length
    ));

    let input = BufReader::new(tokio::io::stdin());
    search_lines(catalog, &ctx.config.search, input, |delivered| {
        if delivered.query.is_empty() {
            return Ok(());
        }
        output.data(serde_json::to_value(&delivered.results)?, |out| {
            print_section_header(&format!("Results for '{}'", delivered.query), out);
            print_content_table(&delivered.results, out);
        });
        Ok(())
    })
    .await
}

pub async fn run_trending(ctx: &AppContext, scope: TrendingScope, window: TimeWindow, output: &Output) -> Result<()> {
    let catalog = ctx.catalog()?;

    let pb = spinner("Fetching trending titles...");
    let result = catalog.trending(scope, window, &CancellationToken::new()).await;
    pb.finish_and_clear();

    let page = result.map_err(|e| eyre!("Failed to fetch trending titles: {}", e))?;
    output.data(serde_json::to_value(&page.results)?, |out| {
        print_section_header(&format!("Trending this {}", window.segment()), out);
        print_content_table(&page.results, out);
    });
    Ok(())
}

pub async fn run_discover(ctx: &AppContext, kind: ContentKind, filters: DiscoverFilters, output: &Output) -> Result<()> {
    let catalog = ctx.catalog()?;
    let query = filters.into_query();
    debug!(?query, "Discover");

    let pb = spinner("Discovering...");
    let result = catalog.discover(kind, &query, &CancellationToken::new()).await;
    pb.finish_and_clear();

    let page = result.map_err(|e| eyre!("Discover failed: {}", e))?;
    output.data(serde_json::to_value(&page)?, |out| {
        print_content_table(&page.results, out);
        if page.total_pages > 1 {
            out.info(format!("Page {} of {}", page.page, page.total_pages));
        }
    });
    Ok(())
}

/// Optional sections of the details view
#[derive(Debug, Clone, Copy, Default)]
pub struct DetailExtras {
    pub similar: bool,
    pub recommended: bool,
    pub reviews: bool,
}

pub async fn run_details(
    ctx: &AppContext,
    kind: ContentKind,
    id: u64,
    extras: DetailExtras,
    output: &Output,
) -> Result<()> {
    let catalog = ctx.catalog()?;
    let cancel = CancellationToken::new();

    let pb = spinner(&format!("Loading {} {}...", kind, id));
    let (details, credits, videos) = tokio::join!(
        catalog.details(kind, id, &cancel),
        catalog.credits(kind, id, &cancel),
        catalog.videos(kind, id, &cancel),
    );
    pb.finish_and_clear();

    let details = details.map_err(|e| eyre!("Could not load {} {}: {}", kind, id, e))?;
    // Missing credits or trailers only trim the output
    let credits = credits
        .map_err(|e| warn!("Failed to load credits for {} {}: {}", kind, id, e))
        .ok();
    let trailer = videos
        .map_err(|e| warn!("Failed to load videos for {} {}: {}", kind, id, e))
        .ok()
        .and_then(|videos| videos.into_iter().find(|v| v.is_youtube_trailer()))
        .and_then(|v| v.watch_url());

    let similar = if extras.similar {
        catalog
            .similar(kind, id, 1, &cancel)
            .await
            .map_err(|e| warn!("Failed to load similar titles: {}", e))
            .ok()
            .map(|page| page.results)
    } else {
        None
    };
    let recommended = if extras.recommended {
        catalog
            .recommendations(kind, id, 1, &cancel)
            .await
            .map_err(|e| warn!("Failed to load recommendations: {}", e))
            .ok()
            .map(|page| page.results)
    } else {
        None
    };
    let reviews = if extras.reviews {
        catalog
            .reviews(kind, id, 1, &cancel)
            .await
            .map_err(|e| warn!("Failed to load reviews: {}", e))
            .ok()
            .map(|page| page.results)
    } else {
        None
    };

    let poster = poster_path(&details).map(|path| catalog.image_url(path, "w500"));

    let data = json!({
        "details": details,
        "credits": credits,
        "trailer": trailer,
        "poster_url": poster,
        "similar": similar,
        "recommended": recommended,
        "reviews": reviews,
    });

    output.data(data, |out| {
        print_details(&details, out);

        if let Some(credits) = &credits {
            let cast: Vec<String> = credits
                .cast
                .iter()
                .take(TOP_CAST)
                .map(|c| match &c.character {
                    Some(role) if !role.is_empty() => format!("{} as {}", c.name, role),
                    _ => c.name.clone(),
                })
                .collect();
            if !cast.is_empty() {
                print_section_header("Cast", out);
                for line in cast {
                    out.println(format!("  {}", line));
                }
            }
        }

        if let Some(url) = &trailer {
            out.println(format!("\n{} {}", "Trailer:".bold(), url));
        }
        if let Some(url) = &poster {
            out.println(format!("{} {}", "Poster:".bold(), url));
        }

        if let Some(similar) = &similar {
            print_section_header("Similar", out);
            print_content_table(similar, out);
        }

        if let Some(recommended) = &recommended {
            print_section_header("More like this", out);
            print_content_table(recommended, out);
        }

        if let Some(reviews) = &reviews {
            print_section_header("Reviews", out);
            if reviews.is_empty() {
                out.info("No reviews yet");
            }
            for review in reviews {
                let score = review
                    .author_details
                    .as_ref()
                    .and_then(|a| a.rating)
                    .map(|r| format!(" ({}/10)", format_rating(Some(r as f64))))
                    .unwrap_or_default();
                out.println(format!("{}{}", review.author.bold(), score));
                out.println(format!("  {}\n", truncate(review.content.trim(), REVIEW_PREVIEW)));
            }
        }
    });
    Ok(())
}

fn poster_path(details: &ContentDetails) -> Option<&str> {
    match details {
        ContentDetails::Movie(m) => m.poster_path.as_deref(),
        ContentDetails::Series(s) => s.poster_path.as_deref(),
    }
}

fn print_details(details: &ContentDetails, output: &Output) {
    let genres = details
        .genres()
        .iter()
        .map(|g| g.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let mut rows = vec![("Kind", details.kind().to_string())];
    match details {
        ContentDetails::Movie(m) => {
            rows.push(("Year", format_year(m.release_date.as_deref())));
            rows.push(("Rating", format!("{} ({} votes)", format_rating(Some(m.vote_average)), m.vote_count)));
            if let Some(status) = &m.status {
                rows.push(("Status", status.clone()));
            }
        }
        ContentDetails::Series(s) => {
            rows.push(("First aired", format_year(s.first_air_date.as_deref())));
            rows.push(("Rating", format!("{} ({} votes)", format_rating(Some(s.vote_average)), s.vote_count)));
            if let Some(seasons) = s.number_of_seasons {
                let episodes = s.number_of_episodes.map(|e| format!(", {} episodes", e)).unwrap_or_default();
                rows.push(("Seasons", format!("{}{}", seasons, episodes)));
            }
            if !s.networks.is_empty() {
                let networks: Vec<&str> = s.networks.iter().map(|n| n.name.as_str()).collect();
                rows.push(("Networks", networks.join(", ")));
            }
        }
    }
    rows.push(("Runtime", format_runtime(details.runtime())));
    rows.push(("Genres", if genres.is_empty() { "N/A".to_string() } else { genres }));

    let (overview_text, tagline) = match details {
        ContentDetails::Movie(m) => (m.overview.as_deref(), m.tagline.as_deref()),
        ContentDetails::Series(s) => (s.overview.as_deref(), s.tagline.as_deref()),
    };

    print_section_header(&format!("{} [{}]", details.display_title(), details.id()), output);
    if let Some(tagline) = tagline.filter(|t| !t.is_empty()) {
        output.println(format!("{}", tagline.italic()));
    }
    output.println(key_value_table("Details", &rows).to_string());
    output.println(overview(overview_text));
}

pub async fn run_genres(ctx: &AppContext, kind: ContentKind, output: &Output) -> Result<()> {
    let catalog = ctx.catalog()?;
    let genres = catalog
        .genres(kind, &CancellationToken::new())
        .await
        .map_err(|e| eyre!("Failed to load genres: {}", e))?;

    output.data(serde_json::to_value(&genres)?, |out| print_genre_table(&genres, out));
    Ok(())
}

pub async fn run_recommend(ctx: &AppContext, kind: ContentKind, limit: Option<usize>, output: &Output) -> Result<()> {
    let catalog = ctx.catalog()?;
    let store = ctx.local_store()?;

    let preferences = store.get();
    if !store.is_onboarding_completed() && preferences.favorite_genres.is_empty() {
        output.warn("No favorite genres yet; run `watchwhat onboarding` for better picks.");
    }

    let mut request = RecommendationRequest::from_preferences(&preferences, store.watched_ids(), kind)
        .with_config(&ctx.config.recommendations);
    if let Some(limit) = limit {
        request = request.with_limit(limit);
    }

    let pb = spinner("Finding something to watch...");
    let picks = recommend(&catalog, &request, &CancellationToken::new()).await;
    pb.finish_and_clear();

    info!("Recommended {} {} titles", picks.len(), kind);
    output.data(serde_json::to_value(&picks)?, |out| {
        print_section_header("Recommended for you", out);
        print_content_table(&picks, out);
    });
    Ok(())
}
