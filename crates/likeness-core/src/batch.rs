//! Batch orchestration for one base image.
//!
//! Enumerates the fifteen work items, skips those already on disk, and runs
//! the rest through the retrying generator with bounded concurrency. Workers
//! only generate and write; all progress bookkeeping happens in the
//! coordinating task, which emits one [`ProgressEvent`] per terminal item.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::client::ImageGenerator;
use crate::config::{Config, GenerationConfig};
use crate::error::GenerationError;
use crate::input::BaseImage;
use crate::output::OutputWriter;
use crate::progress::{ProgressEvent, RunProgress, RunReport};
use crate::request::{GenerationRequest, PromptTable};
use crate::retry::{Attempted, RetryPolicy};
use crate::types::{WorkItem, WorkKey, WorkStatus};

/// Settings for one batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Maximum work items in flight at once
    pub concurrency: usize,
    /// Skip items whose output file already exists
    pub resume: bool,
    /// Minimum spacing between network dispatches
    pub pace: Duration,
    pub retry: RetryPolicy,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self::from_config(&GenerationConfig::default())
    }
}

impl BatchOptions {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            concurrency: config.concurrency,
            resume: config.resume,
            pace: Duration::from_millis(config.pace_ms),
            retry: RetryPolicy::from_config(config),
        }
    }
}

/// What a run would do for one work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedItem {
    pub key: WorkKey,
    pub output_path: PathBuf,
    /// Output file already on disk
    pub exists: bool,
    /// Will call the API (not satisfied by resume)
    pub will_generate: bool,
}

/// List the work items for `influencer_id` with their target paths and
/// whether an existing file would satisfy them.
pub fn plan(writer: &OutputWriter, influencer_id: &str, resume: bool) -> Vec<PlannedItem> {
    WorkItem::enumerate(influencer_id)
        .iter()
        .map(|item| {
            let output_path = writer.path_for(influencer_id, item.category, item.variant_index);
            let exists = output_path.is_file();
            PlannedItem {
                key: item.key(),
                output_path,
                exists,
                will_generate: !(resume && exists),
            }
        })
        .collect()
}

/// Runs the fifteen-image batch for a base image.
pub struct BatchRunner {
    generator: Arc<dyn ImageGenerator>,
    writer: Arc<OutputWriter>,
    prompts: Arc<PromptTable>,
    options: BatchOptions,
}

impl BatchRunner {
    pub fn new(
        generator: Box<dyn ImageGenerator>,
        writer: OutputWriter,
        prompts: PromptTable,
        options: BatchOptions,
    ) -> Self {
        Self {
            generator: Arc::from(generator),
            writer: Arc::new(writer),
            prompts: Arc::new(prompts),
            options,
        }
    }

    /// Build a runner from config around an already-created generator.
    pub fn from_config(config: &Config, generator: Box<dyn ImageGenerator>) -> Self {
        Self::new(
            generator,
            OutputWriter::from_config(config),
            PromptTable::new(config.prompts.clone()),
            BatchOptions::from_config(&config.generation),
        )
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    pub fn writer(&self) -> &OutputWriter {
        &self.writer
    }

    /// Describe the run without touching the network.
    pub fn plan(&self, influencer_id: &str) -> Vec<PlannedItem> {
        plan(&self.writer, influencer_id, self.options.resume)
    }

    /// Generate every variant for `base`.
    ///
    /// `on_event` is called from this task once per item as it reaches a
    /// terminal status. Cancelling `cancel` stops dispatching; undispatched
    /// items stay pending and in-flight items finish their current attempt.
    /// An authentication failure stops dispatching as well and marks the
    /// undispatched items failed without calling the API.
    ///
    /// The report is also written to `run.json` under the influencer's
    /// output directory.
    pub async fn run<F>(
        &self,
        base: Arc<BaseImage>,
        cancel: CancellationToken,
        mut on_event: F,
    ) -> RunReport
    where
        F: FnMut(&ProgressEvent) + Send,
    {
        let influencer_id = base.influencer_id.clone();
        let mut progress = RunProgress::new(&influencer_id);
        let mut queue = progress
            .items()
            .iter()
            .map(|item| item.key())
            .collect::<Vec<_>>()
            .into_iter();

        // Child token so an auth abort can interrupt in-flight backoff
        // without cancelling the caller's token.
        let stop = cancel.child_token();
        let concurrency = self.options.concurrency.max(1);
        let mut tasks: JoinSet<(WorkKey, Attempted<PathBuf>)> = JoinSet::new();
        let mut dispatched = 0usize;
        let mut halted = false;
        let mut auth_rejected = false;

        tracing::info!(
            "Generating variants for {influencer_id} via {} (concurrency {concurrency})",
            self.generator.name()
        );

        loop {
            while !halted && tasks.len() < concurrency {
                if stop.is_cancelled() {
                    halted = true;
                    break;
                }
                let Some(key) = queue.next() else {
                    break;
                };

                if self.options.resume
                    && self
                        .writer
                        .exists(&influencer_id, key.category, key.variant_index)
                {
                    let path = self
                        .writer
                        .path_for(&influencer_id, key.category, key.variant_index);
                    tracing::debug!("Skipping {key}: {} exists", path.display());
                    if let Some(event) = progress.mark_succeeded(key, 0, path, true) {
                        on_event(&event);
                    }
                    continue;
                }

                let request = match GenerationRequest::for_base(&base, key, &self.prompts) {
                    Ok(request) => request,
                    Err(e) => {
                        tracing::error!("Cannot build request for {key}: {e}");
                        if let Some(event) = progress.mark_failed(key, 0, &e) {
                            on_event(&event);
                        }
                        continue;
                    }
                };

                if dispatched > 0 && !self.options.pace.is_zero() {
                    tokio::select! {
                        biased;
                        _ = stop.cancelled() => {
                            halted = true;
                            break;
                        }
                        _ = tokio::time::sleep(self.options.pace) => {}
                    }
                }

                progress.mark_in_flight(key);
                dispatched += 1;
                tasks.spawn(generate_one(
                    self.generator.clone(),
                    self.writer.clone(),
                    request,
                    self.options.retry.clone(),
                    stop.clone(),
                ));
            }

            let Some(joined) = tasks.join_next().await else {
                break;
            };
            let (key, outcome) = match joined {
                Ok(done) => done,
                Err(e) => {
                    tracing::error!("Generation task panicked: {e}");
                    continue;
                }
            };

            let event = match outcome.result {
                Ok(path) => {
                    tracing::info!(
                        "{influencer_id} {key} done after {} attempt(s)",
                        outcome.attempts
                    );
                    progress.mark_succeeded(key, outcome.attempts, path, false)
                }
                Err(e) => {
                    if e.is_auth() && !auth_rejected {
                        tracing::error!("Credential rejected ({e}); stopping batch");
                        auth_rejected = true;
                        stop.cancel();
                    } else {
                        tracing::warn!("{influencer_id} {key} failed: {e}");
                    }
                    progress.mark_failed(key, outcome.attempts, &e)
                }
            };
            if let Some(event) = event {
                on_event(&event);
            }
        }

        // Dispatch may have stopped early; outputs already on disk still
        // count as done and need no credential.
        if self.options.resume {
            for key in queue {
                if !self
                    .writer
                    .exists(&influencer_id, key.category, key.variant_index)
                {
                    continue;
                }
                let path = self
                    .writer
                    .path_for(&influencer_id, key.category, key.variant_index);
                if let Some(event) = progress.mark_succeeded(key, 0, path, true) {
                    on_event(&event);
                }
            }
        }

        // Anything still in flight here belonged to a panicked task.
        let leftovers: Vec<(WorkKey, WorkStatus)> = progress
            .items()
            .iter()
            .filter(|item| !item.status.is_terminal())
            .map(|item| (item.key(), item.status))
            .collect();
        for (key, status) in leftovers {
            let error = match status {
                WorkStatus::InFlight => {
                    GenerationError::Transient("generation task panicked".to_string())
                }
                _ if auth_rejected => GenerationError::Auth(
                    "not attempted; credential rejected earlier in this run".to_string(),
                ),
                _ => continue,
            };
            if let Some(event) = progress.mark_failed(key, 0, &error) {
                on_event(&event);
            }
        }

        let cancelled = cancel.is_cancelled() && !progress.is_complete();
        let report = progress.into_report(cancelled);

        match self.writer.write_report(&report) {
            Ok(path) => tracing::debug!("Wrote run report to {}", path.display()),
            Err(e) => tracing::warn!("Failed to write run report: {e}"),
        }

        tracing::info!(
            "{influencer_id}: {} succeeded ({} resumed), {} failed, {} pending",
            report.summary.succeeded,
            report.summary.resumed,
            report.summary.failed,
            report.summary.pending
        );
        report
    }
}

/// Generate and persist one work item.
async fn generate_one(
    generator: Arc<dyn ImageGenerator>,
    writer: Arc<OutputWriter>,
    request: GenerationRequest,
    retry: RetryPolicy,
    stop: CancellationToken,
) -> (WorkKey, Attempted<PathBuf>) {
    let key = request.key();
    let timeout = generator.timeout();

    let generated = retry
        .execute(&stop, |attempt| {
            let generator = &generator;
            let request = &request;
            async move {
                tracing::debug!("{key} attempt {attempt}");
                match tokio::time::timeout(timeout, generator.generate(request)).await {
                    Ok(result) => result,
                    Err(_) => Err(GenerationError::Transient(format!(
                        "timed out after {}ms",
                        timeout.as_millis()
                    ))),
                }
            }
        })
        .await;

    let attempts = generated.attempts;
    let result = match generated.result {
        Ok(image) => {
            let influencer_id = request.influencer_id.clone();
            tokio::task::spawn_blocking(move || {
                writer.write(&influencer_id, key.category, key.variant_index, &image.bytes)
            })
            .await
            .unwrap_or_else(|e| {
                Err(GenerationError::Filesystem(format!("write task failed: {e}")))
            })
        }
        Err(e) => Err(e),
    };

    (key, Attempted { result, attempts })
}
