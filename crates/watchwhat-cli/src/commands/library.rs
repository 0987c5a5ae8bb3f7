use super::display::{check_mark, key_value_table, print_section_header, print_snapshot_table, spinner};
use super::{fetch_snapshot, prompts, AppContext};
use crate::output::Output;
use crate::{ListCommands, PrefsCommands, WatchedCommands};
use chrono::Local;
use color_eyre::eyre::{bail, eyre};
use color_eyre::Result;
use serde_json::json;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use watchwhat_models::{format_rating, is_valid_score, ContentKind, Genre, Preferences};
use watchwhat_sources::CatalogApi;

pub async fn run_favorites(ctx: &AppContext, cmd: ListCommands, output: &Output) -> Result<()> {
    let store = ctx.local_store()?;

    match cmd {
        ListCommands::List => {
            let favorites = store.favorites();
            output.data(serde_json::to_value(&favorites)?, |out| {
                print_section_header(&format!("Favorites ({})", favorites.len()), out);
                print_snapshot_table(
                    favorites
                        .iter()
                        .map(|f| (&f.content, f.added_at.with_timezone(&Local).format("%Y-%m-%d").to_string())),
                    "Added",
                    out,
                );
            });
        }
        ListCommands::Add { kind, id } => {
            let catalog = ctx.catalog()?;
            let snapshot = fetch_snapshot(&catalog, kind.into(), id).await?;
            let title = snapshot.title.clone();
            store.add_favorite(snapshot);
            output.success(format!("Added '{}' to favorites", title));
        }
        ListCommands::Remove { id } => {
            if store.remove_favorite(id) {
                output.success(format!("Removed {} from favorites", id));
            } else {
                output.warn(format!("{} is not in your favorites", id));
            }
        }
    }
    Ok(())
}

pub async fn run_watched(ctx: &AppContext, cmd: WatchedCommands, output: &Output) -> Result<()> {
    let store = ctx.local_store()?;

    match cmd {
        WatchedCommands::List => {
            let watched = store.watched();
            output.data(serde_json::to_value(&watched)?, |out| {
                print_section_header(&format!("Watched ({})", watched.len()), out);
                print_snapshot_table(
                    watched.iter().map(|w| {
                        let rating = w
                            .rating
                            .map(|r| format!("{}/10", format_rating(Some(r as f64))))
                            .unwrap_or_else(|| "-".to_string());
                        (&w.content, rating)
                    }),
                    "Your rating",
                    out,
                );
            });
        }
        WatchedCommands::Add { kind, id, rating, review } => {
            if let Some(score) = rating {
                if !is_valid_score(score) {
                    bail!("Rating must be between 0 and 10, got {}", score);
                }
            }
            let catalog = ctx.catalog()?;
            let snapshot = fetch_snapshot(&catalog, kind.into(), id).await?;
            let title = snapshot.title.clone();
            store.add_watched(snapshot, rating, review);
            output.success(format!("Marked '{}' as watched", title));
        }
        WatchedCommands::Remove { id } => {
            if store.remove_watched(id) {
                output.success(format!("Removed {} from watched history", id));
            } else {
                output.warn(format!("{} is not in your watched history", id));
            }
        }
    }
    Ok(())
}

pub async fn run_prefs(ctx: &AppContext, cmd: PrefsCommands, output: &Output) -> Result<()> {
    let store = ctx.local_store()?;

    match cmd {
        PrefsCommands::Show => show_preferences(&store.get(), output)?,
        PrefsCommands::Set {
            favorite_genres,
            disliked_genres,
            favorite_actors,
            min_rating,
            max_rating,
            languages,
            adult,
            notifications,
            autoplay_trailers,
        } => {
            let mut next = store.get();
            if let Some(genres) = favorite_genres {
                next.favorite_genres = genres;
            }
            if let Some(genres) = disliked_genres {
                next.disliked_genres = genres;
            }
            if let Some(actors) = favorite_actors {
                next.favorite_actors = actors;
            }
            if let Some(min) = min_rating {
                next.min_rating = min;
            }
            if let Some(max) = max_rating {
                next.max_rating = max;
            }
            if let Some(languages) = languages {
                next.preferred_languages = languages;
            }
            if let Some(adult) = adult {
                next.show_adult_content = adult;
            }
            if let Some(enabled) = notifications {
                next.notifications_enabled = enabled;
            }
            if let Some(enabled) = autoplay_trailers {
                next.autoplay_trailers = enabled;
            }
            validate_preferences(&next)?;

            store.save(next.clone());
            output.success("Preferences saved");
            show_preferences(&next, output)?;
        }
        PrefsCommands::Push => {
            let service = ctx.user_data()?;
            let preferences = store.get();
            let pb = spinner("Uploading preferences...");
            let result = service.upsert_preferences(&preferences).await;
            pb.finish_and_clear();
            result?;
            output.success("Preferences copied to your account");
        }
        PrefsCommands::Pull => {
            let service = ctx.user_data()?;
            let pb = spinner("Downloading preferences...");
            let result = service.get_preferences().await;
            pb.finish_and_clear();

            match result? {
                Some(preferences) => {
                    store.save(preferences.clone());
                    output.success("Preferences replaced with the ones from your account");
                    show_preferences(&preferences, output)?;
                }
                None => output.info("Your account has no stored preferences yet"),
            }
        }
    }
    Ok(())
}

fn validate_preferences(preferences: &Preferences) -> Result<()> {
    if !is_valid_score(preferences.min_rating) || !is_valid_score(preferences.max_rating) {
        bail!("Ratings must be between 0 and 10");
    }
    if preferences.min_rating > preferences.max_rating {
        bail!(
            "Minimum rating {} is above maximum rating {}",
            preferences.min_rating,
            preferences.max_rating
        );
    }
    Ok(())
}

fn join_ids<T: ToString>(ids: &[T]) -> String {
    if ids.is_empty() {
        return "-".to_string();
    }
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

fn show_preferences(preferences: &Preferences, output: &Output) -> Result<()> {
    output.data(serde_json::to_value(preferences)?, |out| {
        let rows = [
            ("Favorite genres", join_ids(&preferences.favorite_genres)),
            ("Disliked genres", join_ids(&preferences.disliked_genres)),
            ("Favorite actors", join_ids(&preferences.favorite_actors)),
            (
                "Rating range",
                format!("{} - {}", preferences.min_rating, preferences.max_rating),
            ),
            ("Languages", join_ids(&preferences.preferred_languages)),
            ("Adult content", check_mark(preferences.show_adult_content)),
            ("Notifications", check_mark(preferences.notifications_enabled)),
            ("Autoplay trailers", check_mark(preferences.autoplay_trailers)),
        ];
        out.println(key_value_table("Preferences", &rows).to_string());
    });
    Ok(())
}

pub fn run_export(ctx: &AppContext, file: Option<PathBuf>, output: &Output) -> Result<()> {
    let store = ctx.local_store()?;
    let json = store
        .export_json()
        .map_err(|e| eyre!("Failed to serialize export: {}", e))?;

    match file {
        Some(path) => {
            std::fs::write(&path, &json).map_err(|e| eyre!("Failed to write {}: {}", path.display(), e))?;
            info!("Exported local data to {}", path.display());
            output.success(format!("Exported to {}", path.display()));
        }
        // The export document itself is the output
        None => println!("{}", json),
    }
    Ok(())
}

pub fn run_import(ctx: &AppContext, file: &Path, output: &Output) -> Result<()> {
    let json = std::fs::read_to_string(file).map_err(|e| eyre!("Failed to read {}: {}", file.display(), e))?;
    let store = ctx.local_store()?;
    store
        .import_json(&json)
        .map_err(|e| eyre!("Import from {} failed: {}", file.display(), e))?;

    let counts = json!({
        "watched": store.watched().len(),
        "favorites": store.favorites().len(),
    });
    output.data(counts, |out| {
        out.success(format!(
            "Imported {} watched and {} favorites from {}",
            store.watched().len(),
            store.favorites().len(),
            file.display()
        ));
    });
    Ok(())
}

pub fn run_clear(ctx: &AppContext, yes: bool, output: &Output) -> Result<()> {
    if !yes {
        if !std::io::stdin().is_terminal() {
            bail!("Refusing to clear local data without confirmation; pass --yes");
        }
        if !prompts::prompt_yes_no("Delete all local preferences, favorites and watched history?", false)? {
            output.info("Nothing was deleted");
            return Ok(());
        }
    }

    ctx.local_store()?
        .clear_all()
        .map_err(|e| eyre!("Local data was not fully cleared: {}", e))?;
    output.success("Local data cleared");
    Ok(())
}

/// Genres of both kinds, deduplicated by id and sorted by name
async fn all_genres<C: CatalogApi + ?Sized>(catalog: &C) -> Result<Vec<Genre>> {
    let cancel = CancellationToken::new();
    let (movie, series) = tokio::join!(
        catalog.genres(ContentKind::Movie, &cancel),
        catalog.genres(ContentKind::Series, &cancel),
    );

    let mut genres = movie.map_err(|e| eyre!("Failed to load genres: {}", e))?;
    for genre in series.map_err(|e| eyre!("Failed to load genres: {}", e))? {
        if !genres.iter().any(|g| g.id == genre.id) {
            genres.push(genre);
        }
    }
    genres.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(genres)
}

pub async fn run_onboarding(ctx: &AppContext, force: bool, output: &Output) -> Result<()> {
    let store = ctx.local_store()?;
    if store.is_onboarding_completed() && !force {
        output.info("Onboarding already completed; use --force to run it again");
        return Ok(());
    }
    if !std::io::stdin().is_terminal() {
        bail!("Onboarding needs an interactive terminal");
    }

    let catalog = ctx.catalog()?;
    let pb = spinner("Loading genres...");
    let genres = all_genres(&catalog).await;
    pb.finish_and_clear();
    let genres = genres?;

    let current = store.get();
    let favorites = prompts::prompt_genres("Which genres do you enjoy?", &genres, &current.favorite_genres)?;

    let remaining: Vec<Genre> = genres.into_iter().filter(|g| !favorites.contains(&g.id)).collect();
    let disliked = prompts::prompt_genres("Any genres you would rather avoid?", &remaining, &current.disliked_genres)?;

    let min_rating = prompts::prompt_rating("Minimum rating (0-10)", current.min_rating, output)?;
    debug!(?favorites, ?disliked, min_rating, "Onboarding choices");

    let preferences = store.update(|p| {
        p.favorite_genres = favorites;
        p.disliked_genres = disliked;
        p.min_rating = min_rating.min(p.max_rating);
    });
    store.complete_onboarding();

    output.success("All set! Try `watchwhat recommend`.");
    show_preferences(&preferences, output)
}
