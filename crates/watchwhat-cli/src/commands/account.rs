use super::display::{key_value_table, print_section_header, print_snapshot_table, spinner};
use super::{fetch_snapshot, AppContext};
use crate::output::Output;
use crate::ListCommands;
use chrono::Local;
use color_eyre::eyre::{bail, eyre};
use color_eyre::Result;
use owo_colors::OwoColorize;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use watchwhat_models::{format_rating, is_valid_score, ContentKind, UserStats};
use watchwhat_sources::{CatalogApi, UserDataError};

pub async fn run_watchlist(ctx: &AppContext, cmd: ListCommands, output: &Output) -> Result<()> {
    let service = ctx.user_data()?;

    match cmd {
        ListCommands::List => {
            let pb = spinner("Loading watchlist...");
            let items = service.get_watchlist().await;
            pb.finish_and_clear();
            let items = items?;

            output.data(serde_json::to_value(&items)?, |out| {
                print_section_header(&format!("Watchlist ({})", items.len()), out);
                print_snapshot_table(
                    items
                        .iter()
                        .map(|i| (&i.content, i.added_at.with_timezone(&Local).format("%Y-%m-%d").to_string())),
                    "Added",
                    out,
                );
            });
        }
        ListCommands::Add { kind, id } => {
            if service.is_in_watchlist(id).await? {
                output.info(format!("{} is already on your watchlist", id));
                return Ok(());
            }
            let catalog = ctx.catalog()?;
            let snapshot = fetch_snapshot(&catalog, kind.into(), id).await?;
            let item = service.add_to_watchlist(snapshot).await?;
            output.success(format!("Added '{}' to your watchlist", item.content.title));
        }
        ListCommands::Remove { id } => {
            service.remove_from_watchlist(id).await?;
            output.success(format!("Removed {} from your watchlist", id));
        }
    }
    Ok(())
}

pub async fn run_rate(
    ctx: &AppContext,
    kind: ContentKind,
    id: u64,
    score: Option<f32>,
    review: Option<String>,
    delete: bool,
    output: &Output,
) -> Result<()> {
    let service = ctx.user_data()?;

    if delete {
        service.delete_rating(id).await?;
        output.success(format!("Deleted your rating for {} {}", kind, id));
        return Ok(());
    }

    let score = score.ok_or_else(|| eyre!("A score is required"))?;
    if !is_valid_score(score) {
        bail!("Score must be between 0 and 10, got {}", score);
    }

    let previous = service.get_rating(id).await?;
    let rating = service.rate(id, score, review).await?;
    debug!(content_id = id, score, "Rated");

    output.data(serde_json::to_value(&rating)?, |out| match previous {
        Some(old) => out.success(format!(
            "Updated rating for {} {} from {} to {}",
            kind,
            id,
            format_rating(Some(old.score as f64)),
            format_rating(Some(rating.score as f64))
        )),
        None => out.success(format!(
            "Rated {} {}: {}/10",
            kind,
            id,
            format_rating(Some(rating.score as f64))
        )),
    });
    Ok(())
}

/// Genre names from the catalog, or an empty map when it is unreachable
async fn genre_names(ctx: &AppContext) -> HashMap<u32, String> {
    let Ok(catalog) = ctx.catalog() else {
        return HashMap::new();
    };
    let cancel = CancellationToken::new();
    let mut names = HashMap::new();
    for kind in [ContentKind::Movie, ContentKind::Series] {
        match catalog.genres(kind, &cancel).await {
            Ok(genres) => names.extend(genres.into_iter().map(|g| (g.id, g.name))),
            Err(e) => warn!("Failed to load {} genres: {}", kind, e),
        }
    }
    names
}

fn stats_rows(stats: &UserStats, names: &HashMap<u32, String>) -> Vec<(&'static str, String)> {
    let top = if stats.top_genres.is_empty() {
        "-".to_string()
    } else {
        stats
            .top_genres
            .iter()
            .map(|(id, count)| {
                let name = names.get(id).cloned().unwrap_or_else(|| format!("#{}", id));
                format!("{} ({})", name, count)
            })
            .collect::<Vec<_>>()
            .join(", ")
    };

    vec![
        ("Watched", stats.total_watched.to_string()),
        ("On watchlist", stats.total_watchlist.to_string()),
        ("Ratings", stats.total_ratings.to_string()),
        (
            "Average rating",
            stats
                .average_rating
                .map(|r| format_rating(Some(r as f64)))
                .unwrap_or_else(|| "-".to_string()),
        ),
        ("Top genres", top),
    ]
}

pub async fn run_stats(ctx: &AppContext, output: &Output) -> Result<()> {
    let service = ctx.user_data()?;

    let pb = spinner("Crunching numbers...");
    let stats = service.get_user_stats().await;
    pb.finish_and_clear();
    let stats = stats?;

    let names = if output.is_human() { genre_names(ctx).await } else { HashMap::new() };
    output.data(serde_json::to_value(&stats)?, |out| {
        out.println(key_value_table("Your stats", &stats_rows(&stats, &names)).to_string());
    });
    Ok(())
}

/// Turn a missing or rejected session into sign-in instructions
pub fn report_auth_required(result: Result<()>, output: &Output) -> Result<()> {
    match result {
        Err(e) if e.downcast_ref::<UserDataError>().is_some_and(UserDataError::is_auth_required) => {
            output.error("You need to sign in for this.");
            output.info(format!(
                "Run {} to connect your account.",
                "watchwhat config account".bold()
            ));
            std::process::exit(2);
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_rows_use_genre_names_when_known() {
        let stats = UserStats {
            total_watched: 3,
            total_watchlist: 1,
            total_ratings: 2,
            average_rating: Some(7.5),
            top_genres: vec![(18, 2), (99, 1)],
        };
        let names = HashMap::from([(18, "Drama".to_string())]);

        let rows = stats_rows(&stats, &names);
        assert_eq!(rows[3], ("Average rating", "7.5".to_string()));
        assert_eq!(rows[4], ("Top genres", "Drama (2), #99 (1)".to_string()));
    }

    #[test]
    fn test_stats_rows_without_ratings() {
        let stats = UserStats {
            total_watched: 0,
            total_watchlist: 0,
            total_ratings: 0,
            average_rating: None,
            top_genres: Vec::new(),
        };
        let rows = stats_rows(&stats, &HashMap::new());
        assert_eq!(rows[3].1, "-");
        assert_eq!(rows[4].1, "-");
    }
}
