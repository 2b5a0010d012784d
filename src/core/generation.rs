//! Report generation lifecycle: submit, poll, settle.
//!
//! ```text
//! Idle --submit--> Submitting --job complete--> Complete
//!                      |--job pending/processing--> Polling --complete--> Complete
//!                      |                              |--failed--> Failed
//!                      |--429 / error--> Failed
//! Failed | Polling --reset--> Idle
//! ```
//!
//! Every state change goes through [`Shared::apply`], which holds the epoch
//! lock while publishing. `reset` and `teardown` bump the epoch, so a status
//! read that lands afterwards is discarded instead of overwriting newer state.

use crate::domain::model::{GenerationRequest, JobStatus};
use crate::domain::ports::{ConfigProvider, ReportService, SubmitError};
use crate::utils::error::{ReportError, Result};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_JOB_FAILURE: &str = "Report generation failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub interval: Duration,
    /// Give up after this many failed status reads in a row. `None` retries forever.
    pub max_consecutive_errors: Option<u32>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_consecutive_errors: None,
        }
    }
}

impl PollOptions {
    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Self {
        Self {
            interval: config.poll_interval(),
            max_consecutive_errors: config.max_consecutive_poll_errors(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationFailure {
    /// The organization hit its report limit; route to the upgrade flow.
    QuotaExceeded { used: u64, limit: u64, message: String },
    Submission { message: String },
    Job { report_id: String, message: String },
    PollingExhausted { report_id: String, attempts: u32 },
}

impl GenerationFailure {
    pub fn message(&self) -> String {
        match self {
            GenerationFailure::QuotaExceeded { message, .. }
            | GenerationFailure::Submission { message }
            | GenerationFailure::Job { message, .. } => message.clone(),
            GenerationFailure::PollingExhausted { attempts, .. } => format!(
                "Lost contact with the report service after {} failed status checks",
                attempts
            ),
        }
    }

    pub fn is_upgrade_required(&self) -> bool {
        matches!(self, GenerationFailure::QuotaExceeded { .. })
    }

    pub fn quota(&self) -> Option<(u64, u64)> {
        match self {
            GenerationFailure::QuotaExceeded { used, limit, .. } => Some((*used, *limit)),
            _ => None,
        }
    }
}

impl From<SubmitError> for GenerationFailure {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::QuotaExceeded {
                used,
                limit,
                message,
            } => GenerationFailure::QuotaExceeded {
                used,
                limit,
                message,
            },
            SubmitError::Failed { message } => GenerationFailure::Submission { message },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationState {
    Idle,
    Submitting,
    Polling { report_id: String },
    Complete { report_id: String },
    Failed(GenerationFailure),
}

/// What a display layer shows. Exactly one applies per state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayState {
    Form,
    InProgress,
    Completed { report_id: String },
    FailedWithRetry { message: String, upgrade_required: bool },
}

impl GenerationState {
    pub fn name(&self) -> &'static str {
        match self {
            GenerationState::Idle => "idle",
            GenerationState::Submitting => "submitting",
            GenerationState::Polling { .. } => "polling",
            GenerationState::Complete { .. } => "complete",
            GenerationState::Failed(_) => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, GenerationState::Complete { .. } | GenerationState::Failed(_))
    }

    pub fn report_id(&self) -> Option<&str> {
        match self {
            GenerationState::Polling { report_id } | GenerationState::Complete { report_id } => {
                Some(report_id)
            }
            GenerationState::Failed(GenerationFailure::Job { report_id, .. })
            | GenerationState::Failed(GenerationFailure::PollingExhausted { report_id, .. }) => {
                Some(report_id)
            }
            _ => None,
        }
    }

    pub fn display(&self) -> DisplayState {
        match self {
            GenerationState::Idle => DisplayState::Form,
            GenerationState::Submitting | GenerationState::Polling { .. } => DisplayState::InProgress,
            GenerationState::Complete { report_id } => DisplayState::Completed {
                report_id: report_id.clone(),
            },
            GenerationState::Failed(failure) => DisplayState::FailedWithRetry {
                message: failure.message(),
                upgrade_required: failure.is_upgrade_required(),
            },
        }
    }
}

struct Shared {
    tx: watch::Sender<GenerationState>,
    epoch: Mutex<u64>,
}

impl Shared {
    fn new() -> Self {
        let (tx, _rx) = watch::channel(GenerationState::Idle);
        Self {
            tx,
            epoch: Mutex::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, u64> {
        // The guarded value is a plain counter, a poisoned lock is still usable.
        self.epoch.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn epoch(&self) -> u64 {
        *self.lock()
    }

    /// Publishes `next` unless the epoch moved on or the token was cancelled.
    fn apply(&self, epoch: u64, token: Option<&CancellationToken>, next: GenerationState) -> bool {
        let guard = self.lock();
        if *guard != epoch || token.is_some_and(|t| t.is_cancelled()) {
            tracing::debug!(state = next.name(), "discarding stale generation update");
            return false;
        }
        let previous = self.tx.send_replace(next);
        tracing::debug!(
            from = previous.name(),
            to = self.tx.borrow().name(),
            "generation state changed"
        );
        true
    }

    /// Invalidates every in-flight update, then publishes `next`.
    fn restart(&self, next: GenerationState) {
        let mut guard = self.lock();
        *guard += 1;
        self.tx.send_replace(next);
    }

    fn invalidate(&self) {
        *self.lock() += 1;
    }
}

/// Cancellable handle on the background status-polling task.
#[derive(Debug)]
pub struct PollHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn cancel(&self) {
        self.token.cancel();
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Drives one report generation at a time against a [`ReportService`].
pub struct ReportGenerator<S: ReportService + 'static> {
    service: Arc<S>,
    options: PollOptions,
    shared: Arc<Shared>,
    root: CancellationToken,
    poller: Option<PollHandle>,
}

impl<S: ReportService + 'static> ReportGenerator<S> {
    pub fn new(service: S, options: PollOptions) -> Self {
        Self::with_shared_service(Arc::new(service), options)
    }

    pub fn with_shared_service(service: Arc<S>, options: PollOptions) -> Self {
        Self {
            service,
            options,
            shared: Arc::new(Shared::new()),
            root: CancellationToken::new(),
            poller: None,
        }
    }

    pub fn state(&self) -> GenerationState {
        self.shared.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<GenerationState> {
        self.shared.tx.subscribe()
    }

    /// Token that tears the generator down when cancelled, usable from other tasks.
    pub fn teardown_token(&self) -> CancellationToken {
        self.root.clone()
    }

    pub fn is_torn_down(&self) -> bool {
        self.root.is_cancelled()
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(|p| !p.is_finished())
    }

    /// Submits `request` and returns the state reached once the service answered.
    ///
    /// The caller validates the request first; see
    /// [`ReportTypeCatalog::validate_request`](crate::config::toml_config::ReportTypeCatalog::validate_request).
    pub async fn submit(&mut self, request: &GenerationRequest) -> Result<GenerationState> {
        if self.is_torn_down() {
            return Err(invalid_transition("submit", "torn down"));
        }
        let current = self.state();
        if current != GenerationState::Idle {
            return Err(invalid_transition("submit", current.name()));
        }

        let epoch = self.shared.epoch();
        self.shared.apply(epoch, None, GenerationState::Submitting);
        tracing::info!(report_type = %request.report_type, "submitting report generation");

        let reply = self.service.submit(request).await;
        if self.is_torn_down() {
            tracing::debug!("generator torn down while submitting, dropping response");
            return Ok(self.state());
        }

        match reply {
            Ok(job) if job.status == JobStatus::Complete => {
                tracing::info!(report_id = %job.report_id, "report completed synchronously");
                self.shared.apply(
                    epoch,
                    Some(&self.root),
                    GenerationState::Complete {
                        report_id: job.report_id,
                    },
                );
            }
            Ok(job) => {
                tracing::info!(report_id = %job.report_id, status = ?job.status, "report queued, polling for status");
                // Polling must be visible before the task can settle the job.
                self.shared.apply(
                    epoch,
                    Some(&self.root),
                    GenerationState::Polling {
                        report_id: job.report_id.clone(),
                    },
                );
                self.start_polling(epoch, job.report_id);
            }
            Err(err) => {
                match &err {
                    SubmitError::QuotaExceeded { used, limit, .. } => {
                        tracing::warn!(used, limit, "report quota exceeded")
                    }
                    SubmitError::Failed { message } => {
                        tracing::error!(%message, "report submission failed")
                    }
                }
                self.shared.apply(epoch, Some(&self.root), GenerationState::Failed(err.into()));
            }
        }

        Ok(self.state())
    }

    /// Resolves at the first `Complete` or `Failed` state, or with the
    /// current state if the generator is torn down first.
    pub async fn wait_for_outcome(&self) -> GenerationState {
        let mut rx = self.subscribe();
        tokio::select! {
            settled = rx.wait_for(GenerationState::is_terminal) => match settled {
                Ok(state) => state.clone(),
                Err(_) => self.state(),
            },
            _ = self.root.cancelled() => self.state(),
        }
    }

    /// "Try again": back to `Idle` from `Failed` or an abandoned `Polling`.
    pub fn reset(&mut self) -> Result<()> {
        match self.state() {
            GenerationState::Failed(_) | GenerationState::Polling { .. } => {}
            other => return Err(invalid_transition("reset", other.name())),
        }
        self.stop_polling();
        self.shared.restart(GenerationState::Idle);
        tracing::debug!("generation reset");
        Ok(())
    }

    /// Stops polling for good, whatever the current state.
    pub fn teardown(&mut self) {
        self.root.cancel();
        self.stop_polling();
        self.shared.invalidate();
    }

    fn stop_polling(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.cancel();
        }
    }

    fn start_polling(&mut self, epoch: u64, report_id: String) {
        self.stop_polling();
        let token = self.root.child_token();
        let task = tokio::spawn(poll_until_settled(
            Arc::clone(&self.service),
            Arc::clone(&self.shared),
            epoch,
            report_id,
            self.options,
            token.clone(),
        ));
        self.poller = Some(PollHandle { token, task });
    }
}

impl<S: ReportService + 'static> Drop for ReportGenerator<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn poll_until_settled<S: ReportService + 'static>(
    service: Arc<S>,
    shared: Arc<Shared>,
    epoch: u64,
    report_id: String,
    options: PollOptions,
    token: CancellationToken,
) {
    let mut consecutive_errors = 0u32;

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                tracing::debug!(%report_id, "status polling cancelled");
                return;
            }
            _ = tokio::time::sleep(options.interval) => {}
        }

        let read = tokio::select! {
            biased;
            _ = token.cancelled() => return,
            read = service.status(&report_id) => read,
        };

        let settled = match read {
            Ok(status) => {
                consecutive_errors = 0;
                match status.status {
                    JobStatus::Complete => Some(GenerationState::Complete {
                        report_id: report_id.clone(),
                    }),
                    JobStatus::Failed => Some(GenerationState::Failed(GenerationFailure::Job {
                        report_id: report_id.clone(),
                        message: status
                            .error_message
                            .filter(|m| !m.trim().is_empty())
                            .unwrap_or_else(|| DEFAULT_JOB_FAILURE.to_string()),
                    })),
                    JobStatus::Pending | JobStatus::Processing => {
                        tracing::debug!(%report_id, status = ?status.status, "report still generating");
                        None
                    }
                }
            }
            Err(e) => {
                consecutive_errors += 1;
                tracing::warn!(%report_id, attempt = consecutive_errors, "status check failed, retrying: {}", e);
                match options.max_consecutive_errors {
                    Some(max) if consecutive_errors >= max => {
                        Some(GenerationState::Failed(GenerationFailure::PollingExhausted {
                            report_id: report_id.clone(),
                            attempts: consecutive_errors,
                        }))
                    }
                    _ => None,
                }
            }
        };

        if let Some(state) = settled {
            if shared.apply(epoch, Some(&token), state) {
                tracing::info!(%report_id, "report generation settled");
            }
            return;
        }
    }
}

fn invalid_transition(action: &str, state: &str) -> ReportError {
    ReportError::InvalidTransitionError {
        action: action.to_string(),
        state: state.to_string(),
    }
}
