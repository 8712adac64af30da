//! Retrying asset downloader.
//!
//! Each [`DownloadJob`] runs on the download pool. Transient failures put
//! the job back on the queue with its attempt count raised, after an
//! exponential backoff; permanent failures and exhausted jobs end as
//! [`DownloadOutcome::Failed`].

use crate::config::DownloadConfig;
use crate::queue::{Counter, ResultSink, WorkQueue, WorkerPool};
use anyhow::{Context, Result};
use rand::Rng;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// One file to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    /// Human-readable tag for logs, e.g. `12345|image`.
    pub label: String,
    pub url: String,
    pub dest: PathBuf,
    /// Attempts already made.
    pub attempt: u32,
}

impl DownloadJob {
    pub fn new(label: impl Into<String>, url: impl Into<String>, dest: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
            dest: dest.into(),
            attempt: 0,
        }
    }

    fn retry(mut self) -> Self {
        self.attempt += 1;
        self
    }
}

/// What a successful fetch did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// The destination already existed.
    Skipped,
    /// Bytes written.
    Downloaded(u64),
}

/// Terminal state of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Done {
        label: String,
        dest: PathBuf,
        status: FetchStatus,
    },
    Failed {
        label: String,
        url: String,
        attempts: u32,
        error: String,
    },
}

impl DownloadOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Why a single fetch failed.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Network or server trouble that may go away.
    #[error("transient failure: {0}")]
    Transient(String),

    /// The server refused the request.
    #[error("HTTP {status} for {url}")]
    Status { status: StatusCode, url: String },

    /// Local file system failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Blocking HTTP fetcher with retry policy.
pub struct Downloader {
    client: Client,
    config: DownloadConfig,
    counter: Arc<Counter>,
}

impl Downloader {
    pub fn new(config: &DownloadConfig, counter: Arc<Counter>) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs));

        if let Some(ref proxy) = config.proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .with_context(|| format!("Invalid proxy URL: {}", proxy))?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            config: config.clone(),
            counter,
        })
    }

    /// Fetch one job once, without retrying.
    ///
    /// The body is written next to the destination and renamed into place,
    /// so an interrupted download never leaves a truncated file behind.
    pub fn fetch(&self, job: &DownloadJob) -> std::result::Result<FetchStatus, FetchError> {
        if job.dest.exists() && !self.config.overwrite {
            tracing::debug!(label = %job.label, dest = %job.dest.display(), "already downloaded");
            return Ok(FetchStatus::Skipped);
        }

        let response = self
            .client
            .get(&job.url)
            .send()
            .map_err(|e| FetchError::Transient(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::Transient(format!("HTTP {status}")));
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: job.url.clone(),
            });
        }

        let body = response
            .bytes()
            .map_err(|e| FetchError::Transient(e.to_string()))?;

        if let Some(parent) = job.dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let partial = partial_path(&job.dest);
        if let Err(e) = std::fs::write(&partial, &body).and_then(|_| std::fs::rename(&partial, &job.dest)) {
            let _ = std::fs::remove_file(&partial);
            return Err(e.into());
        }

        Ok(FetchStatus::Downloaded(body.len() as u64))
    }

    /// Fetch a job from the pool, requeueing it on transient failure.
    pub fn handle(&self, job: DownloadJob, queue: &WorkQueue<DownloadJob>, sink: &ResultSink<DownloadOutcome>) {
        match self.fetch(&job) {
            Ok(status) => {
                let done = self.counter.increment();
                tracing::debug!(label = %job.label, ?status, done, "download finished");
                sink.record(DownloadOutcome::Done {
                    label: job.label,
                    dest: job.dest,
                    status,
                });
            }
            Err(e) if e.is_transient() && job.attempt + 1 < self.config.max_attempts => {
                let delay = backoff_delay(
                    job.attempt,
                    Duration::from_millis(self.config.backoff_base_ms),
                    Duration::from_millis(self.config.backoff_max_ms),
                    &mut rand::thread_rng(),
                );
                tracing::warn!(
                    label = %job.label,
                    attempt = job.attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "{}, retrying",
                    e
                );
                std::thread::sleep(delay);
                queue.put(job.retry());
            }
            Err(e) => {
                tracing::error!(label = %job.label, url = %job.url, attempts = job.attempt + 1, "Download failed: {}", e);
                sink.record(DownloadOutcome::Failed {
                    label: job.label,
                    url: job.url,
                    attempts: job.attempt + 1,
                    error: e.to_string(),
                });
            }
        }
    }

    /// Run `jobs` on a pool of `workers` threads and return every outcome.
    pub fn download_all(&self, jobs: Vec<DownloadJob>, workers: usize) -> Result<Vec<DownloadOutcome>> {
        self.counter.reset();
        let queue = WorkQueue::new();
        for job in jobs {
            queue.put(job);
        }
        let sink = ResultSink::new();

        WorkerPool::new("download", workers).run(&queue, |job, q| self.handle(job, q, &sink))?;

        Ok(sink.into_inner())
    }
}

fn partial_path(dest: &std::path::Path) -> PathBuf {
    let mut name = dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}

/// Delay before retry number `attempt + 1`: `base * 2^attempt`, capped at
/// `max`, plus up to a quarter of that as jitter (still capped).
pub fn backoff_delay<R: Rng>(attempt: u32, base: Duration, max: Duration, rng: &mut R) -> Duration {
    let exp = base.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX));
    let delay = exp.min(max);
    let jitter_ms = rng.gen_range(0..=delay.as_millis() as u64 / 4);
    (delay + Duration::from_millis(jitter_ms)).min(max)
}
