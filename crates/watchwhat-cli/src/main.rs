use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use commands::{account, catalog, config, library};
use std::path::PathBuf;
use watchwhat_models::ContentKind;
use watchwhat_sources::{SearchScope, TimeWindow, TrendingScope};

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "watchwhat")]
#[command(about = "WatchWhat - Find something to watch tonight")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Content kind as typed on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Movie,
    #[value(alias = "tv")]
    Series,
}

impl From<KindArg> for ContentKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Movie => ContentKind::Movie,
            KindArg::Series => ContentKind::Series,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScopeArg {
    All,
    Movie,
    #[value(alias = "tv")]
    Series,
}

impl From<ScopeArg> for SearchScope {
    fn from(scope: ScopeArg) -> Self {
        match scope {
            ScopeArg::All => SearchScope::Multi,
            ScopeArg::Movie => SearchScope::Movie,
            ScopeArg::Series => SearchScope::Series,
        }
    }
}

impl From<ScopeArg> for TrendingScope {
    fn from(scope: ScopeArg) -> Self {
        match scope {
            ScopeArg::All => TrendingScope::All,
            ScopeArg::Movie => TrendingScope::Movie,
            ScopeArg::Series => TrendingScope::Series,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WindowArg {
    Day,
    Week,
}

impl From<WindowArg> for TimeWindow {
    fn from(window: WindowArg) -> Self {
        match window {
            WindowArg::Day => TimeWindow::Day,
            WindowArg::Week => TimeWindow::Week,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Search the catalog by title
    #[command(long_about = "Search movies and series by title. With --interactive, every line typed on stdin refines the query; a search runs once typing pauses.")]
    Search {
        /// Search text (omit with --interactive)
        #[arg(required_unless_present = "interactive")]
        query: Option<String>,

        /// Restrict to movies or series
        #[arg(long, value_enum, default_value = "all")]
        kind: ScopeArg,

        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Read queries from stdin, search-as-you-type
        #[arg(long, short, action = ArgAction::SetTrue)]
        interactive: bool,
    },
    /// Show what is trending
    Trending {
        #[arg(long, value_enum, default_value = "all")]
        kind: ScopeArg,

        #[arg(long, value_enum, default_value = "week")]
        window: WindowArg,
    },
    /// Browse the catalog with filters
    Discover {
        #[arg(value_enum)]
        kind: KindArg,

        /// Genre ids, any of them may match
        #[arg(long, value_delimiter = ',')]
        genres: Vec<u32>,

        /// Minimum average vote (0-10)
        #[arg(long)]
        min_rating: Option<f32>,

        /// Release year (first air year for series)
        #[arg(long)]
        year: Option<u32>,

        /// Sort order, e.g. popularity.desc or vote_average.desc
        #[arg(long, default_value = "popularity.desc")]
        sort_by: String,

        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Show details, cast and trailers for one title
    Details {
        #[arg(value_enum)]
        kind: KindArg,

        id: u64,

        /// Also list titles similar to this one
        #[arg(long, action = ArgAction::SetTrue)]
        similar: bool,

        /// Also list titles the catalog recommends alongside this one
        #[arg(long, action = ArgAction::SetTrue)]
        recommended: bool,

        /// Also show user reviews from the catalog
        #[arg(long, action = ArgAction::SetTrue)]
        reviews: bool,
    },
    /// List genre ids and names
    Genres {
        #[arg(value_enum)]
        kind: KindArg,
    },
    /// Recommend titles from your preferences
    #[command(long_about = "Recommend highly rated titles in your favorite genres (or with your favorite actors when no genres are set), skipping anything you have watched or whose genres you dislike.")]
    Recommend {
        #[arg(long, value_enum, default_value = "series")]
        kind: KindArg,

        /// Maximum number of results (defaults to the configured limit)
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Manage local favorites
    Favorites {
        #[command(subcommand)]
        cmd: Option<ListCommands>,
    },
    /// Manage local watched history
    Watched {
        #[command(subcommand)]
        cmd: Option<WatchedCommands>,
    },
    /// Show or change preferences
    Prefs {
        #[command(subcommand)]
        cmd: Option<PrefsCommands>,
    },
    /// Manage your watchlist (requires sign-in)
    Watchlist {
        #[command(subcommand)]
        cmd: Option<ListCommands>,
    },
    /// Rate a title from 0 to 10 (requires sign-in)
    Rate {
        #[arg(value_enum)]
        kind: KindArg,

        id: u64,

        #[arg(required_unless_present = "delete")]
        score: Option<f32>,

        #[arg(long)]
        review: Option<String>,

        /// Delete your rating instead
        #[arg(long, action = ArgAction::SetTrue, conflicts_with_all = ["review", "score"])]
        delete: bool,
    },
    /// Show your watching statistics (requires sign-in)
    Stats,
    /// Export preferences, favorites and watched history as JSON
    Export {
        /// Write to this file instead of stdout
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Import a previous export, replacing local data
    Import {
        file: PathBuf,
    },
    /// Delete all local data
    #[command(long_about = "Delete preferences, favorites, watched history and the onboarding flag from local storage. This cannot be undone; you will be asked to confirm unless --yes is given.")]
    Clear {
        /// Skip the confirmation prompt
        #[arg(long, action = ArgAction::SetTrue)]
        yes: bool,
    },
    /// Pick favorite genres and a minimum rating
    Onboarding {
        /// Run even if onboarding was already completed
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
    /// Configure the catalog token and your account
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
pub enum ListCommands {
    List,
    Add {
        #[arg(value_enum)]
        kind: KindArg,
        id: u64,
    },
    Remove {
        id: u64,
    },
}

#[derive(Subcommand)]
pub enum WatchedCommands {
    List,
    Add {
        #[arg(value_enum)]
        kind: KindArg,
        id: u64,

        /// Your rating, 0-10
        #[arg(long)]
        rating: Option<f32>,

        #[arg(long)]
        review: Option<String>,
    },
    Remove {
        id: u64,
    },
}

#[derive(Subcommand)]
pub enum PrefsCommands {
    Show,
    Set {
        /// Favorite genre ids (replaces the current list)
        #[arg(long, value_delimiter = ',')]
        favorite_genres: Option<Vec<u32>>,

        /// Disliked genre ids (replaces the current list)
        #[arg(long, value_delimiter = ',')]
        disliked_genres: Option<Vec<u32>>,

        /// Favorite actor (person) ids
        #[arg(long, value_delimiter = ',')]
        favorite_actors: Option<Vec<u64>>,

        #[arg(long)]
        min_rating: Option<f32>,

        #[arg(long)]
        max_rating: Option<f32>,

        /// Preferred languages, e.g. en,de
        #[arg(long, value_delimiter = ',')]
        languages: Option<Vec<String>>,

        #[arg(long)]
        adult: Option<bool>,

        #[arg(long)]
        notifications: Option<bool>,

        #[arg(long)]
        autoplay_trailers: Option<bool>,
    },
    /// Copy local preferences to your account (requires sign-in)
    Push,
    /// Replace local preferences with the ones stored in your account
    Pull,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration (masks secrets)
    Show {
        /// Show secrets unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },
    /// Set the catalog API read token
    Catalog {
        /// API read access token (if not provided, will prompt)
        #[arg(long)]
        token: Option<String>,

        /// Response language, e.g. en-US
        #[arg(long)]
        language: Option<String>,
    },
    /// Sign in to the hosted user-data backend, or sign out
    Account {
        /// Backend URL, e.g. https://<project>.supabase.co
        #[arg(long)]
        url: Option<String>,

        /// Public (anon) API key of the backend
        #[arg(long)]
        anon_key: Option<String>,

        #[arg(long)]
        user_id: Option<String>,

        /// Session access token (if not provided, will prompt)
        #[arg(long)]
        access_token: Option<String>,

        /// Forget the stored session
        #[arg(long, action = ArgAction::SetTrue, conflicts_with_all = ["url", "anon_key", "user_id", "access_token"])]
        sign_out: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let output = output::Output::new(cli.output, cli.quiet);

    let ctx = commands::AppContext::load()?;
    logging::init_logging_with_config(cli.verbose, cli.quiet, &ctx.config.logging, ctx.paths.log_file())
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let result = match cli.command {
        Commands::Search { query, kind, page, interactive } => {
            if interactive {
                catalog::run_interactive_search(&ctx, &output).await
            } else {
                catalog::run_search(&ctx, query.unwrap_or_default(), kind.into(), page, &output).await
            }
        }
        Commands::Trending { kind, window } => catalog::run_trending(&ctx, kind.into(), window.into(), &output).await,
        Commands::Discover { kind, genres, min_rating, year, sort_by, page } => {
            let filters = catalog::DiscoverFilters { genres, min_rating, year, sort_by, page };
            catalog::run_discover(&ctx, kind.into(), filters, &output).await
        }
        Commands::Details { kind, id, similar, recommended, reviews } => {
            let extras = catalog::DetailExtras { similar, recommended, reviews };
            catalog::run_details(&ctx, kind.into(), id, extras, &output).await
        }
        Commands::Genres { kind } => catalog::run_genres(&ctx, kind.into(), &output).await,
        Commands::Recommend { kind, limit } => catalog::run_recommend(&ctx, kind.into(), limit, &output).await,
        Commands::Favorites { cmd } => library::run_favorites(&ctx, cmd.unwrap_or(ListCommands::List), &output).await,
        Commands::Watched { cmd } => library::run_watched(&ctx, cmd.unwrap_or(WatchedCommands::List), &output).await,
        Commands::Prefs { cmd } => library::run_prefs(&ctx, cmd.unwrap_or(PrefsCommands::Show), &output).await,
        Commands::Watchlist { cmd } => account::run_watchlist(&ctx, cmd.unwrap_or(ListCommands::List), &output).await,
        Commands::Rate { kind, id, score, review, delete } => {
            account::run_rate(&ctx, kind.into(), id, score, review, delete, &output).await
        }
        Commands::Stats => account::run_stats(&ctx, &output).await,
        Commands::Export { file } => library::run_export(&ctx, file, &output),
        Commands::Import { file } => library::run_import(&ctx, &file, &output),
        Commands::Clear { yes } => library::run_clear(&ctx, yes, &output),
        Commands::Onboarding { force } => library::run_onboarding(&ctx, force, &output).await,
        Commands::Config { cmd } => {
            let cmd = cmd.unwrap_or(ConfigCommands::Show { full: false });
            config::run_config(cmd, &output).await
        }
    };

    account::report_auth_required(result, &output)
}
