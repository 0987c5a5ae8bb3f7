use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};
use watchwhat_config::SearchConfig;
use watchwhat_models::Content;
use watchwhat_sources::{CatalogApi, CatalogError, SearchScope};

const RESULT_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResults {
    pub generation: u64,
    pub query: String,
    pub results: Vec<Content>,
}

/// Search-as-you-type over the catalog's multi index.
///
/// Each [`submit`](SearchSession::submit) supersedes the previous one: its
/// timer and request are cancelled and its results are never delivered.
/// A query is only sent once input has been quiet for the debounce window.
pub struct SearchSession<C: ?Sized> {
    catalog: Arc<C>,
    debounce: Duration,
    min_query_length: usize,
    /// Generation of the newest submission; guards delivery
    latest: Arc<Mutex<u64>>,
    pending: Option<(CancellationToken, JoinHandle<()>)>,
    tx: mpsc::Sender<SearchResults>,
}

impl<C> SearchSession<C>
where
    C: CatalogApi + ?Sized + 'static,
{
    pub fn new(
        catalog: Arc<C>,
        debounce: Duration,
        min_query_length: usize,
    ) -> (Self, mpsc::Receiver<SearchResults>) {
        let (tx, rx) = mpsc::channel(RESULT_CHANNEL_CAPACITY);
        let session = Self {
            catalog,
            debounce,
            min_query_length,
            latest: Arc::new(Mutex::new(0)),
            pending: None,
            tx,
        };
        (session, rx)
    }

    pub fn from_config(catalog: Arc<C>, config: &SearchConfig) -> (Self, mpsc::Receiver<SearchResults>) {
        Self::new(
            catalog,
            Duration::from_millis(config.debounce_ms),
            config.min_query_length,
        )
    }

    /// Schedule a search for `query`, returning its generation
    pub fn submit(&mut self, query: &str) -> u64 {
        self.cancel();

        let generation = {
            let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
            *latest += 1;
            *latest
        };

        let query = query.trim().to_string();
        let cancel = CancellationToken::new();
        let too_short = query.chars().count() < self.min_query_length;
        debug!(generation, query = %query, too_short, "Search submitted");

        let task = tokio::spawn(run_search(
            self.catalog.clone(),
            query,
            generation,
            if too_short { None } else { Some(self.debounce) },
            cancel.clone(),
            self.latest.clone(),
            self.tx.clone(),
        ));
        self.pending = Some((cancel, task));
        generation
    }

    /// Drop the pending search, if any
    pub fn cancel(&mut self) {
        if let Some((cancel, _task)) = self.pending.take() {
            cancel.cancel();
        }
    }

    /// Stop accepting queries but let the pending search run to completion.
    /// The results channel closes once that search has delivered.
    pub fn finish(mut self) {
        // Detach the task so Drop does not cancel it
        self.pending = None;
    }
}

/// Run one search session over the lines of `input`, handing every delivered
/// result to `deliver`. Returns after input ends and the last search is done.
pub async fn search_lines<C, R, F, E>(
    catalog: Arc<C>,
    config: &SearchConfig,
    input: R,
    mut deliver: F,
) -> Result<(), E>
where
    C: CatalogApi + ?Sized + 'static,
    R: AsyncBufRead + Unpin,
    F: FnMut(SearchResults) -> Result<(), E>,
    E: From<std::io::Error>,
{
    let (session, mut results) = SearchSession::from_config(catalog, config);
    let mut session = Some(session);
    let mut lines = input.lines();

    loop {
        tokio::select! {
            line = lines.next_line(), if session.is_some() => match line? {
                Some(query) => {
                    if let Some(session) = session.as_mut() {
                        session.submit(&query);
                    }
                }
                None => {
                    debug!("Search input closed");
                    if let Some(session) = session.take() {
                        session.finish();
                    }
                }
            },
            delivered = results.recv() => match delivered {
                Some(delivered) => deliver(delivered)?,
                None => break,
            },
        }
    }
    Ok(())
}

impl<C: ?Sized> Drop for SearchSession<C> {
    fn drop(&mut self) {
        if let Some((cancel, _)) = self.pending.take() {
            cancel.cancel();
        }
    }
}

/// `debounce` of `None` means the query is too short: deliver an empty
/// result without contacting the catalog.
async fn run_search<C>(
    catalog: Arc<C>,
    query: String,
    generation: u64,
    debounce: Option<Duration>,
    cancel: CancellationToken,
    latest: Arc<Mutex<u64>>,
    tx: mpsc::Sender<SearchResults>,
) where
    C: CatalogApi + ?Sized,
{
    let results = match debounce {
        None => Vec::new(),
        Some(window) => {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(window) => {}
            }

            match catalog.search(SearchScope::Multi, &query, 1, &cancel).await {
                Ok(page) => page.results,
                Err(CatalogError::Cancelled) => return,
                Err(e) => {
                    error!("Search for '{}' failed: {}", query, e);
                    Vec::new()
                }
            }
        }
    };

    // Holding the lock keeps a newer submit from slipping in between the
    // check and the send
    let latest = latest.lock().unwrap_or_else(PoisonError::into_inner);
    if cancel.is_cancelled() || *latest != generation {
        debug!(generation, "Dropping superseded search results");
        return;
    }
    if let Err(e) = tx.try_send(SearchResults { generation, query, results }) {
        warn!("Search results not delivered: {}", e);
    }
}
