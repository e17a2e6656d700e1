//! Crawl orchestrator - the batch loop
//!
//! This module ties the crawl together:
//! - Initializing the throttler, robots policy and frontier
//! - Seeding from the start URL or from persisted visited/pending state
//! - Fetching one batch at a time and joining before any bookkeeping
//! - Filtering, persisting and enqueueing discovered links
//! - Handing successful pages to enrichment and the document store
//!
//! Persistence happens once per completed batch. An interrupted batch is
//! discarded whole and its URLs are fetched again by the next run.

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, FetchResult, Fetcher, RedirectScope};
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::parse_html;
use crate::crawler::retry::RetryPolicy;
use crate::crawler::throttle::{RequestRate, Throttler};
use crate::enrich::TextEnricher;
use crate::output::CrawlReport;
use crate::robots::RobotsPolicy;
use crate::state::{CrawlPhase, StopReason, VisitedSet};
use crate::storage::{Document, DocumentStore, StateStore};
use crate::url::{normalize_url, LinkFilter};
use crate::{Result, TrawlError};
use futures::future::join_all;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// Drives a crawl from initialization to a stop reason
pub struct CrawlOrchestrator<S, D> {
    phase: CrawlPhase,
    fetcher: Fetcher,
    robots: RobotsPolicy,
    filter: LinkFilter,
    frontier: Frontier,
    visited: VisitedSet,
    enricher: TextEnricher,
    state_store: S,
    doc_store: D,
    batch_size: usize,
    max_scraped_count: u64,
    report: CrawlReport,
}

impl<S: StateStore, D: DocumentStore> CrawlOrchestrator<S, D> {
    /// Builds every collaborator and loads persisted state
    ///
    /// robots.txt is fetched here, once. Store load failures are logged and
    /// treated as a cold start; only an unbuildable client or an unparsable
    /// site URL is an error.
    pub async fn initialize(config: &Config, state_store: S, doc_store: D) -> Result<Self> {
        let crawler = &config.crawler;
        let site_base = Url::parse(&crawler.site_base)?;

        let client = build_http_client(config)?;
        let robots = RobotsPolicy::load(&client, &site_base, &config.user_agent.crawler_name).await;

        let configured = RequestRate::new(crawler.requests_per_second, crawler.time_period());
        let throttler = Arc::new(Throttler::for_site(configured, robots.suggested_rate()));
        tracing::info!("Request rate: {}", throttler.rate());

        let filter = LinkFilter::new(site_base, crawler.content_prefix.clone());
        let retry = RetryPolicy::new(crawler.max_retries, crawler.retry_backoff());
        let fetcher = Fetcher::new(client, throttler, retry)
            .with_redirect_scope(RedirectScope::new(filter.clone(), robots.clone()));

        let mut orchestrator = Self {
            phase: CrawlPhase::Initializing,
            fetcher,
            robots,
            filter,
            frontier: Frontier::with_capacity(crawler.frontier_capacity),
            visited: VisitedSet::new(),
            enricher: TextEnricher::new(),
            state_store,
            doc_store,
            batch_size: crawler.batch_size.max(1),
            max_scraped_count: crawler.max_scraped_count,
            report: CrawlReport::default(),
        };

        let start_url = normalize_url(&crawler.start_url)
            .map(String::from)
            .unwrap_or_else(|| crawler.start_url.clone());
        orchestrator.load_state(start_url);

        Ok(orchestrator)
    }

    /// Seeds the visited set and frontier from persisted state, or cold-starts
    fn load_state(&mut self, start_url: String) {
        let visited = self.state_store.load_visited().unwrap_or_else(|e| {
            tracing::warn!("Failed to load visited URLs, treating as empty: {}", e);
            HashSet::new()
        });
        let pending = self.state_store.load_pending().unwrap_or_else(|e| {
            tracing::warn!("Failed to load pending URLs, treating as empty: {}", e);
            Vec::new()
        });

        if visited.is_empty() && pending.is_empty() {
            tracing::info!("No persisted state, starting from {}", start_url);
            self.visited.insert(start_url.clone());
            self.frontier.seed([start_url.clone()]);
            // The seed goes to pending only; it is not visited until fetched
            if let Err(e) = self.state_store.dump_pending(&[start_url]) {
                tracing::error!("Failed to persist start URL: {}", e);
            }
            return;
        }

        let outstanding: Vec<String> = pending
            .iter()
            .filter(|url| !visited.contains(*url))
            .cloned()
            .collect();

        tracing::info!(
            "Resuming: {} visited, {} pending, {} outstanding",
            visited.len(),
            pending.len(),
            outstanding.len()
        );

        self.visited.extend(visited);
        self.visited.extend(pending);
        self.frontier.seed(outstanding);
    }

    /// Runs until the scrape limit is reached or the frontier runs dry
    pub async fn run(&mut self) -> Result<CrawlReport> {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Runs until a stop condition or until `shutdown` completes
    ///
    /// On shutdown the in-flight batch is abandoned without persisting
    /// anything from it.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<CrawlReport>
    where
        F: Future<Output = ()>,
    {
        self.transition(CrawlPhase::Running)?;
        let started = Instant::now();
        tokio::pin!(shutdown);

        let reason = loop {
            if let Some(reason) = self.stop_condition() {
                break reason;
            }

            let batch = self.frontier.draw_batch(self.batch_size);
            tracing::debug!(
                "Dispatching batch {} ({} URLs, {} left in frontier)",
                self.report.batches + 1,
                batch.len(),
                self.frontier.len()
            );

            let results = tokio::select! {
                results = self.fetch_batch(&batch) => results,
                _ = &mut shutdown => {
                    tracing::warn!(
                        "Interrupted, discarding in-flight batch of {} URLs",
                        batch.len()
                    );
                    break StopReason::Interrupted;
                }
            };

            self.process_batch(&batch, results);
        };

        self.transition(CrawlPhase::Stopped(reason))?;
        self.report.stop_reason = Some(reason);
        self.report.frontier_dropped = self.frontier.dropped();
        self.report.elapsed = started.elapsed();

        Ok(self.report.clone())
    }

    fn stop_condition(&self) -> Option<StopReason> {
        if self.report.visited_count >= self.max_scraped_count {
            Some(StopReason::LimitReached)
        } else if self.frontier.is_empty() {
            Some(StopReason::FrontierExhausted)
        } else {
            None
        }
    }

    async fn fetch_batch(&self, batch: &[String]) -> Vec<FetchResult> {
        join_all(batch.iter().map(|url| self.fetcher.fetch(url))).await
    }

    /// Bookkeeping for one completed batch
    fn process_batch(&mut self, batch: &[String], results: Vec<FetchResult>) {
        let mut discovered = Vec::new();
        let mut documents = Vec::new();

        for result in results {
            let FetchResult::Success { final_url, body, .. } = result else {
                self.report.failed += 1;
                continue;
            };
            self.report.succeeded += 1;

            let Ok(page_url) = Url::parse(&final_url) else {
                tracing::warn!("Cannot parse fetched URL {}, skipping its links", final_url);
                continue;
            };

            let page = parse_html(&body, &page_url);
            discovered.extend(page.links);
            documents.push(Document {
                path: page_url.path().to_string(),
                title: page.title,
                words: self.enricher.enrich(&body),
            });
        }

        let filtered = self.filter.filter(&discovered, &self.robots, &self.visited);
        tracing::info!(
            "Found {} refs, discarded {}, accepted {}",
            discovered.len(),
            filtered.discarded,
            filtered.accepted.len()
        );

        if let Err(e) = self.state_store.dump_visited(batch) {
            tracing::error!("Failed to persist {} visited URLs: {}", batch.len(), e);
        }
        if !filtered.accepted.is_empty() {
            if let Err(e) = self.state_store.dump_pending(&filtered.accepted) {
                tracing::error!(
                    "Failed to persist {} pending URLs: {}",
                    filtered.accepted.len(),
                    e
                );
            }
        }

        self.visited.extend(filtered.accepted.iter().cloned());
        self.frontier.extend(filtered.accepted.iter().cloned());

        match self.doc_store.save(&documents) {
            Ok(saved) => {
                tracing::info!("Saved {} documents", saved);
                self.report.documents_saved += saved as u64;
            }
            Err(e) => tracing::error!("Failed to save {} documents: {}", documents.len(), e),
        }

        self.report.batches += 1;
        self.report.links_found += discovered.len() as u64;
        self.report.links_enqueued += filtered.accepted.len() as u64;
        self.report.links_discarded += filtered.discarded as u64;
        self.report.visited_count += batch.len() as u64;

        tracing::info!(
            "Visited {} of {} (batch {}, {} in frontier)",
            self.report.visited_count,
            self.max_scraped_count,
            self.report.batches,
            self.frontier.len()
        );
    }

    fn transition(&mut self, next: CrawlPhase) -> Result<()> {
        if !self.phase.can_transition_to(next) {
            return Err(TrawlError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::info!("Crawl {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn robots(&self) -> &RobotsPolicy {
        &self.robots
    }

    pub fn throttler(&self) -> &Arc<Throttler> {
        self.fetcher.throttler()
    }

    pub fn report(&self) -> &CrawlReport {
        &self.report
    }

    /// Ends the run, handing the stores back for closing
    pub fn into_stores(self) -> (S, D) {
        (self.state_store, self.doc_store)
    }
}
