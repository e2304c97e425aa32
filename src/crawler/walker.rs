//! Resource walker over a numeric ID space
//!
//! The walker reads its kind's cursor, processes IDs up to the ceiling and
//! persists progress. Sequential mode advances one ID at a time. Batched mode
//! runs a window of IDs concurrently and advances past the whole window only
//! once every ID in it has completed.

use crate::output::Notifier;
use crate::state::ResourceKind;
use crate::storage::CursorStore;
use crate::{MirrorError, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Outcome of processing one ID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOutcome {
    /// Primary document and all sub-resources saved
    Saved,

    /// Recorded as a `[404]` marker
    NotFound,

    /// Terminal HTTP failure, logged and alerted
    HttpError(u16),

    /// Cancellation cut processing short; the ID must be retried next run
    Interrupted,
}

impl UnitOutcome {
    /// Whether the cursor may move past this ID
    pub fn is_complete(&self) -> bool {
        !matches!(self, Self::Interrupted)
    }
}

/// Processes single IDs of one resource kind
///
/// Returning `MirrorError::RetryExhausted` stops the walk without advancing
/// past the ID.
pub trait ResourceHandler: Send + Sync + 'static {
    fn kind(&self) -> ResourceKind;

    fn process(&self, id: u64) -> impl Future<Output = Result<UnitOutcome>> + Send;
}

/// How IDs are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkMode {
    Sequential,

    /// Up to `window` IDs in flight, cursor advanced per window
    Batched { window: u64 },
}

/// Why a walk stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStop {
    CeilingReached,
    Cancelled,

    /// A unit exhausted its retries; the cursor stays before `id`
    RetryExhausted { id: u64 },
}

/// Summary of one walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkReport {
    pub kind: ResourceKind,
    pub start: u64,
    pub end: u64,
    pub stop: WalkStop,
}

impl WalkReport {
    /// IDs the cursor moved past during this walk
    pub fn advanced(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }
}

/// Drives a `ResourceHandler` across its ID space
pub struct ResourceWalker<H> {
    handler: Arc<H>,
    ceiling: u64,
    mode: WalkMode,
    cancel: CancellationToken,
    notifier: Arc<dyn Notifier>,
}

impl<H: ResourceHandler> ResourceWalker<H> {
    /// Creates a walker processing IDs strictly below `ceiling`
    pub fn new(
        handler: Arc<H>,
        ceiling: u64,
        mode: WalkMode,
        cancel: CancellationToken,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            handler,
            ceiling,
            mode,
            cancel,
            notifier,
        }
    }

    pub async fn run(&self, cursors: &mut CursorStore) -> Result<WalkReport> {
        let kind = self.handler.kind();
        let start = cursors.get(kind)?;
        tracing::info!(
            "Walking {} IDs from {} below {} ({:?})",
            kind,
            start,
            self.ceiling,
            self.mode
        );

        let stop = match self.mode {
            WalkMode::Sequential => self.run_sequential(cursors).await?,
            WalkMode::Batched { window } => self.run_batched(cursors, window.max(1)).await?,
        };

        let end = cursors.get(kind)?;
        tracing::info!("{} walk stopped at {}: {:?}", kind, end, stop);

        Ok(WalkReport {
            kind,
            start,
            end,
            stop,
        })
    }

    async fn run_sequential(&self, cursors: &mut CursorStore) -> Result<WalkStop> {
        let kind = self.handler.kind();

        loop {
            let position = cursors.get(kind)?;
            if position >= self.ceiling {
                return Ok(WalkStop::CeilingReached);
            }
            if self.cancel.is_cancelled() {
                return Ok(WalkStop::Cancelled);
            }

            match self.handler.process(position).await {
                Ok(outcome) if outcome.is_complete() => cursors.set(kind, position + 1)?,
                Ok(_) => return Ok(WalkStop::Cancelled),
                Err(MirrorError::RetryExhausted(e)) => {
                    self.report_exhausted(kind, position, &e);
                    return Ok(WalkStop::RetryExhausted { id: position });
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn run_batched(&self, cursors: &mut CursorStore, window: u64) -> Result<WalkStop> {
        let kind = self.handler.kind();

        loop {
            let position = cursors.get(kind)?;
            if position >= self.ceiling {
                return Ok(WalkStop::CeilingReached);
            }
            if self.cancel.is_cancelled() {
                return Ok(WalkStop::Cancelled);
            }

            let window_end = position.saturating_add(window).min(self.ceiling);
            tracing::debug!("Dispatching {} IDs {}..{}", kind, position, window_end);

            let mut tasks = JoinSet::new();
            for id in position..window_end {
                let handler = Arc::clone(&self.handler);
                tasks.spawn(async move { (id, handler.process(id).await) });
            }

            // Always drain the whole window so no worker outlives the walk
            let mut exhausted: Option<u64> = None;
            let mut interrupted = false;
            let mut fatal: Option<MirrorError> = None;

            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((_, Ok(outcome))) => interrupted |= !outcome.is_complete(),
                    Ok((id, Err(MirrorError::RetryExhausted(e)))) => {
                        self.report_exhausted(kind, id, &e);
                        exhausted = Some(exhausted.map_or(id, |first| first.min(id)));
                    }
                    Ok((_, Err(e))) => {
                        fatal.get_or_insert(e);
                    }
                    Err(e) => {
                        fatal.get_or_insert(MirrorError::Worker(e.to_string()));
                    }
                }
            }

            if let Some(e) = fatal {
                return Err(e);
            }
            if let Some(id) = exhausted {
                return Ok(WalkStop::RetryExhausted { id });
            }
            if interrupted {
                return Ok(WalkStop::Cancelled);
            }

            cursors.set(kind, window_end)?;
        }
    }

    fn report_exhausted(&self, kind: ResourceKind, id: u64, error: &crate::RetryExhausted) {
        tracing::error!("Stopping {} walk at {}: {}", kind, id, error);
        self.notifier
            .alert(&format!("{} {} exhausted its retries", kind, id));
    }
}
