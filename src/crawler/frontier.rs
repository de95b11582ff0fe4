//! Frontier deduplication
//!
//! Two seen-sets guard the crawl: one over search pages, one over listing
//! pages. Each set is owned by exactly one task, so neither needs a lock.
//!
//! - [`SearchFrontier`] owns the search-page set. It walks search pages
//!   (a bounded number at a time), feeds their next-page links back through
//!   the set, and forwards every listing link downstream.
//! - [`spawn_dedupe`] owns the listing set and passes each listing through
//!   once, in canonical form.
//!
//! Both stages close their output when their input is exhausted, which is
//! how completion travels down the pipeline.

use crate::crawler::fetcher::{fetch_url, FetchResult};
use crate::crawler::walker::{scan_search_page, SearchPageLinks, WalkError};
use crate::url::{canonical_key, canonicalize, UrlRole};
use reqwest::Client;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use url::Url;

/// Canonical keys already admitted for one URL role
#[derive(Debug)]
pub struct SeenSet {
    role: UrlRole,
    keys: HashSet<String>,
}

impl SeenSet {
    pub fn new(role: UrlRole) -> Self {
        Self {
            role,
            keys: HashSet::new(),
        }
    }

    pub fn role(&self) -> UrlRole {
        self.role
    }

    /// Records a URL, returning `true` the first time its canonical form is seen
    pub fn insert(&mut self, url: &Url) -> bool {
        self.keys.insert(canonical_key(url, self.role))
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.keys.contains(&canonical_key(url, self.role))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Counts from one deduplication stage
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DedupeTally {
    pub received: usize,
    pub forwarded: usize,
}

/// Forwards each URL from `source` the first time it is seen
///
/// Forwarded URLs are in canonical form. Returns once `source` closes (or
/// `sink` has no receiver left); `sink` is dropped on return, closing the
/// downstream channel.
pub async fn dedupe_and_forward(
    mut source: Receiver<Url>,
    mut seen: SeenSet,
    sink: Sender<Url>,
) -> DedupeTally {
    let mut tally = DedupeTally::default();

    while let Some(url) = source.recv().await {
        tally.received += 1;
        if !seen.insert(&url) {
            tracing::trace!("Already seen {}", url);
            continue;
        }

        if sink.send(canonicalize(&url, seen.role())).await.is_err() {
            tracing::warn!("Downstream closed, dropping remaining {:?} URLs", seen.role());
            break;
        }
        tally.forwarded += 1;
    }

    tally
}

/// Runs [`dedupe_and_forward`] as its own task
pub fn spawn_dedupe(
    source: Receiver<Url>,
    seen: SeenSet,
    capacity: usize,
) -> (Receiver<Url>, JoinHandle<DedupeTally>) {
    let (sink, output) = mpsc::channel(capacity);
    let handle = tokio::spawn(dedupe_and_forward(source, seen, sink));
    (output, handle)
}

/// Counts from walking the search pages
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SearchTally {
    /// Search pages fetched and scanned
    pub pages_visited: usize,
    /// Pages that turned out to be the site's error page
    pub bad_pages: usize,
    /// Pages that could not be fetched or decoded
    pub fetch_failures: usize,
    /// Listing links forwarded, duplicates included
    pub listing_urls_found: usize,
}

/// Why a search page produced no links
#[derive(Debug)]
enum SearchPageFailure {
    Fetch(String),
    Walk(WalkError),
}

/// Search-page frontier: a FIFO of pages still to walk behind a seen-set
pub struct SearchFrontier {
    client: Client,
    seen: SeenSet,
    queue: VecDeque<Url>,
    max_in_flight: usize,
}

impl SearchFrontier {
    pub fn new(client: Client, max_in_flight: usize) -> Self {
        Self {
            client,
            seen: SeenSet::new(UrlRole::SearchPage),
            queue: VecDeque::new(),
            max_in_flight: max_in_flight.max(1),
        }
    }

    /// Queues a search page unless it was queued before
    ///
    /// The canonical form is only the seen-set key; the page is fetched at
    /// the URL it was found under.
    pub fn enqueue(&mut self, url: &Url) -> bool {
        if !self.seen.insert(url) {
            tracing::debug!("Search page already queued: {}", url);
            return false;
        }
        self.queue.push_back(url.clone());
        true
    }

    /// Number of distinct search pages queued so far
    pub fn pages_seen(&self) -> usize {
        self.seen.len()
    }

    /// Walks every reachable search page, sending listing links to `listings`
    ///
    /// Returns when the queue is empty and no walk is in flight. `listings`
    /// is dropped on return.
    pub async fn run(mut self, listings: Sender<Url>) -> SearchTally {
        let mut tally = SearchTally::default();
        let permits = Arc::new(Semaphore::new(self.max_in_flight));
        let mut walks = JoinSet::new();

        loop {
            while let Some(url) = self.queue.pop_front() {
                let permit = match permits.clone().try_acquire_owned() {
                    Ok(permit) => permit,
                    Err(_) => {
                        self.queue.push_front(url);
                        break;
                    }
                };

                let client = self.client.clone();
                walks.spawn(async move {
                    let _permit = permit;
                    let outcome = walk_search_page(&client, &url).await;
                    (url, outcome)
                });
            }

            let Some(joined) = walks.join_next().await else {
                break;
            };

            let (url, outcome) = match joined {
                Ok(done) => done,
                Err(e) => {
                    tracing::error!("Search page task failed: {}", e);
                    tally.fetch_failures += 1;
                    continue;
                }
            };

            match outcome {
                Ok(links) => {
                    tally.pages_visited += 1;
                    tracing::info!(
                        "Search page {}: {} listings, {} next pages",
                        url,
                        links.listings.len(),
                        links.next_pages.len()
                    );

                    for next in &links.next_pages {
                        self.enqueue(next);
                    }

                    for listing in links.listings {
                        if listings.send(listing).await.is_err() {
                            tracing::warn!("Listing stage closed early");
                            return tally;
                        }
                        tally.listing_urls_found += 1;
                    }
                }
                Err(SearchPageFailure::Walk(WalkError::BadSearchPage)) => {
                    tally.bad_pages += 1;
                    tracing::warn!("Search page {} is the site error page", url);
                }
                Err(SearchPageFailure::Walk(WalkError::Lex(e))) => {
                    tally.fetch_failures += 1;
                    tracing::warn!("Could not decode search page {}: {}", url, e);
                }
                Err(SearchPageFailure::Fetch(reason)) => {
                    tally.fetch_failures += 1;
                    tracing::warn!("Failed to fetch search page {}: {}", url, reason);
                }
            }
        }

        tracing::info!(
            "Search frontier exhausted after {} pages",
            tally.pages_visited
        );
        tally
    }
}

async fn walk_search_page(client: &Client, url: &Url) -> Result<SearchPageLinks, SearchPageFailure> {
    let result = fetch_url(client, url.as_str()).await;
    let (final_url, body) = match result {
        FetchResult::Success { final_url, body, .. } => (final_url, body),
        failure => {
            return Err(SearchPageFailure::Fetch(
                failure.failure_reason().unwrap_or_default(),
            ))
        }
    };

    // Links are relative to wherever the redirects ended
    let base = Url::parse(&final_url).unwrap_or_else(|_| url.clone());
    scan_search_page(&body, &base).map_err(SearchPageFailure::Walk)
}
