//! Bounded worker pool over the entry queue
//!
//! This module handles:
//! - A shared FIFO of entries, where popping is the only synchronized step
//! - A fixed number of workers, each looping pop → fetch → extract
//! - Per-worker result lists merged after all workers join
//! - Containment of per-entry failures

use crate::config::Config;
use crate::input::Entry;
use crate::pipeline::extractor::{extract_article, Extractor, NormalizedArticle, ReadabilityExtractor};
use crate::pipeline::fetcher::{fetch_with_retry, Fetcher, HttpFetcher, RetryPolicy};
use crate::pipeline::progress::{Outcome, ProgressObserver, TracingObserver};
use crate::PaperbindError;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinSet;

/// Worker pool settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Maximum number of entries processed at the same time
    pub concurrency: usize,

    /// Retry policy applied to every fetch
    pub retry: RetryPolicy,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            concurrency: 3,
            retry: RetryPolicy::default(),
        }
    }
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            concurrency: config.pipeline.concurrency.max(1),
            retry: RetryPolicy::from(&config.fetch),
        }
    }
}

/// Why an entry produced no article
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// All fetch attempts failed; carries the failure message
    FetchFailed(String),

    /// The page was fetched but nothing could be extracted
    NoContent,
}

/// An entry that was dropped from the batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    /// 1-based dequeue position
    pub index: usize,
    pub url: String,
    pub reason: SkipReason,
}

/// Result of one batch run
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Extracted articles in completion order (not input order)
    pub articles: Vec<NormalizedArticle>,

    /// Skipped entries, ordered by dequeue position
    pub skipped: Vec<SkippedEntry>,

    /// Number of entries the batch was started with
    pub total: usize,
}

impl BatchReport {
    /// Number of extracted articles
    pub fn succeeded(&self) -> usize {
        self.articles.len()
    }

    /// Hands the articles over, failing if none survived
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<NormalizedArticle>)` - At least one article was extracted
    /// * `Err(PaperbindError::BatchEmpty)` - Every entry was skipped
    pub fn into_articles(self) -> Result<Vec<NormalizedArticle>, PaperbindError> {
        if self.articles.is_empty() {
            return Err(PaperbindError::BatchEmpty { total: self.total });
        }
        Ok(self.articles)
    }
}

/// Concurrent fetch-and-extract pipeline
///
/// # Example
///
/// ```no_run
/// use paperbind::{Config, Entry, Pipeline};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let pipeline = Pipeline::from_config(&Config::default())?;
/// let report = pipeline
///     .run(vec![Entry::new("https://example.com/post", "A post")])
///     .await;
/// println!("{}/{} extracted", report.succeeded(), report.total);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Pipeline {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn Extractor>,
    observer: Arc<dyn ProgressObserver>,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn Extractor>,
        observer: Arc<dyn ProgressObserver>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            observer,
            settings,
        }
    }

    /// Builds a pipeline with the HTTP fetcher, readability extraction and
    /// tracing progress output
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self::new(
            Arc::new(HttpFetcher::new(&config.fetch)?),
            Arc::new(ReadabilityExtractor),
            Arc::new(TracingObserver),
            PipelineSettings::from(config),
        ))
    }

    /// Replaces the progress observer
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Fetches and extracts every entry
    ///
    /// Runs `min(concurrency, entries.len())` workers and resolves once all
    /// of them have drained the queue. Per-entry failures are reported to
    /// the observer and recorded in [`BatchReport::skipped`]; they never
    /// stop the batch.
    pub async fn run(&self, entries: Vec<Entry>) -> BatchReport {
        let total = entries.len();
        if total == 0 {
            self.observer
                .on_progress(0, 0, &Outcome::Finished { succeeded: 0 });
            return BatchReport::default();
        }

        let context = Arc::new(WorkerContext {
            queue: WorkQueue::new(entries),
            fetcher: Arc::clone(&self.fetcher),
            extractor: Arc::clone(&self.extractor),
            observer: Arc::clone(&self.observer),
            retry: self.settings.retry,
            total,
            completed: AtomicUsize::new(0),
        });

        let workers = self.settings.concurrency.max(1).min(total);
        tracing::debug!("Starting {} workers for {} entries", workers, total);

        let mut set = JoinSet::new();
        for _ in 0..workers {
            set.spawn(run_worker(Arc::clone(&context)));
        }

        let mut completed = Vec::new();
        let mut skipped = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(output) => {
                    completed.extend(output.articles);
                    skipped.extend(output.skipped);
                }
                Err(e) => tracing::error!("Worker task failed: {}", e),
            }
        }

        completed.sort_by_key(|(sequence, _)| *sequence);
        skipped.sort_by_key(|entry| entry.index);

        let report = BatchReport {
            articles: completed.into_iter().map(|(_, article)| article).collect(),
            skipped,
            total,
        };

        self.observer.on_progress(
            total,
            total,
            &Outcome::Finished {
                succeeded: report.succeeded(),
            },
        );

        report
    }
}

/// FIFO of entries with dequeue numbering
struct WorkQueue {
    state: Mutex<QueueState>,
}

struct QueueState {
    pending: VecDeque<Entry>,
    dequeued: usize,
}

impl WorkQueue {
    fn new(entries: Vec<Entry>) -> Self {
        Self {
            state: Mutex::new(QueueState {
                pending: entries.into(),
                dequeued: 0,
            }),
        }
    }

    /// Pops the next entry together with its 1-based dequeue index
    fn pop(&self) -> Option<(usize, Entry)> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = state.pending.pop_front()?;
        state.dequeued += 1;
        Some((state.dequeued, entry))
    }
}

/// State shared by all workers of one run
struct WorkerContext {
    queue: WorkQueue,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn Extractor>,
    observer: Arc<dyn ProgressObserver>,
    retry: RetryPolicy,
    total: usize,
    /// Completion sequence shared across workers
    completed: AtomicUsize,
}

/// Results collected by one worker
#[derive(Default)]
struct WorkerOutput {
    /// Articles tagged with their completion sequence number
    articles: Vec<(usize, NormalizedArticle)>,
    skipped: Vec<SkippedEntry>,
}

async fn run_worker(context: Arc<WorkerContext>) -> WorkerOutput {
    let mut output = WorkerOutput::default();
    while let Some((index, entry)) = context.queue.pop() {
        process_entry(&context, index, &entry, &mut output).await;
    }
    output
}

async fn process_entry(
    context: &WorkerContext,
    index: usize,
    entry: &Entry,
    output: &mut WorkerOutput,
) {
    let total = context.total;
    let observer = context.observer.as_ref();

    observer.on_progress(
        index,
        total,
        &Outcome::Fetching {
            url: entry.url.clone(),
            title: entry.title.clone(),
        },
    );

    let retry = context.retry;
    let fetched = fetch_with_retry(context.fetcher.as_ref(), &entry.url, &retry, |attempt, error| {
        observer.on_progress(
            index,
            total,
            &Outcome::Retrying {
                url: entry.url.clone(),
                attempt,
                attempts: retry.attempts,
                delay: retry.delay,
                error: error.to_string(),
            },
        );
    })
    .await;

    let body = match fetched {
        Ok(body) => body,
        Err(failure) => {
            let error = failure.to_string();
            observer.on_progress(
                index,
                total,
                &Outcome::Skipped {
                    url: entry.url.clone(),
                    error: error.clone(),
                },
            );
            output.skipped.push(SkippedEntry {
                index,
                url: entry.url.clone(),
                reason: SkipReason::FetchFailed(error),
            });
            return;
        }
    };

    let extracted = std::panic::catch_unwind(AssertUnwindSafe(|| {
        extract_article(context.extractor.as_ref(), &body, entry)
    }))
    .unwrap_or_else(|_| {
        tracing::error!("Extraction panicked for {}", entry.url);
        None
    });

    match extracted {
        Some(article) => {
            observer.on_progress(
                index,
                total,
                &Outcome::Extracted {
                    title: article.title.clone(),
                },
            );
            let sequence = context.completed.fetch_add(1, Ordering::SeqCst);
            output.articles.push((sequence, article));
        }
        None => {
            observer.on_progress(
                index,
                total,
                &Outcome::NoContent {
                    url: entry.url.clone(),
                },
            );
            output.skipped.push(SkippedEntry {
                index,
                url: entry.url.clone(),
                reason: SkipReason::NoContent,
            });
        }
    }
}
