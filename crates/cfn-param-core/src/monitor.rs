//! Wait for a submitted stack update to finish.
//!
//! Every tick the monitor re-reads the stack's event stream page by page and
//! looks only at events tagged with this run's [`CorrelationToken`]. Events
//! from other runs or older updates on the same stack never decide the
//! outcome. The completion verdict comes solely from the stack's own event
//! (logical id == stack name, type == [`STACK_RESOURCE_TYPE`]); a failed
//! nested resource ends the wait early with that resource's reason.
//!
//! ```text
//! Submitted ──▶ Polling ──┬──▶ Succeeded
//!                         ├──▶ Failed
//!                         └──▶ Cancelled
//! ```
//!
//! There is no timeout. The caller bounds the wait, if at all, through the
//! cancellation receiver.

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::api::StackApi;
use crate::config::Settings;
use crate::error::{Result, UpdateError};
use crate::token::CorrelationToken;
use crate::types::{
    ResourceStatus, StackEvent, STACK_RESOURCE_TYPE, UPDATE_CANCELLED_REASON,
};

// ---------------------------------------------------------------------------
// State / Verdict
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Submitted,
    Polling,
    Succeeded,
    Failed,
    Cancelled,
}

impl MonitorState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            MonitorState::Succeeded | MonitorState::Failed | MonitorState::Cancelled
        )
    }
}

/// What a single event means for this run.
#[derive(Debug)]
pub enum Verdict {
    /// Older than the cutoff; stop scanning this tick.
    Stale,
    /// Belongs to another operation.
    Unrelated,
    /// Ours, but not terminal.
    Progress,
    Succeeded,
    Failed(UpdateError),
}

/// Classify one event. Checks apply in order: staleness, token, resource
/// failure, stack terminal status.
pub fn classify(
    event: &StackEvent,
    stack_name: &str,
    token: &CorrelationToken,
    cutoff: DateTime<Utc>,
) -> Verdict {
    if event.timestamp.is_some_and(|ts| ts < cutoff) {
        return Verdict::Stale;
    }
    if !token.matches(event.correlation_token.as_deref()) {
        return Verdict::Unrelated;
    }
    if event.resource_status == ResourceStatus::UpdateFailed
        && event.status_reason != UPDATE_CANCELLED_REASON
    {
        return Verdict::Failed(UpdateError::ResourceUpdateFailed {
            status: event.resource_status.to_string(),
            reason: event.status_reason.clone(),
        });
    }
    if event.logical_resource_id != stack_name || event.resource_type != STACK_RESOURCE_TYPE {
        return Verdict::Progress;
    }
    match event.resource_status {
        ResourceStatus::UpdateComplete => Verdict::Succeeded,
        ResourceStatus::UpdateRollbackComplete
        | ResourceStatus::UpdateRollbackFailed
        | ResourceStatus::RollbackFailed => Verdict::Failed(UpdateError::StackRolledBack(
            event.resource_status.to_string(),
        )),
        _ => Verdict::Progress,
    }
}

enum Tick {
    Pending,
    Succeeded,
    Cancelled,
}

// ---------------------------------------------------------------------------
// Monitor
// ---------------------------------------------------------------------------

pub struct Monitor<'a, A: ?Sized> {
    api: &'a A,
    stack_name: &'a str,
    token: &'a CorrelationToken,
    settings: &'a Settings,
    cutoff: DateTime<Utc>,
    state: MonitorState,
}

impl<'a, A> Monitor<'a, A>
where
    A: StackApi + ?Sized,
{
    pub fn new(
        api: &'a A,
        stack_name: &'a str,
        token: &'a CorrelationToken,
        settings: &'a Settings,
    ) -> Self {
        let mut monitor = Self {
            api,
            stack_name,
            token,
            settings,
            cutoff: Utc::now(),
            state: MonitorState::Submitted,
        };
        monitor.started_at(Utc::now());
        monitor
    }

    /// Anchor the staleness cutoff to `started_at` minus the configured window.
    pub fn started_at(&mut self, started_at: DateTime<Utc>) -> &mut Self {
        let window = chrono::Duration::from_std(self.settings.stale_after)
            .unwrap_or_else(|_| chrono::Duration::hours(1));
        self.cutoff = started_at - window;
        self
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Poll until the update reaches a terminal state or `cancel` flips to
    /// `true`. The first poll happens one interval after the call.
    pub async fn wait(&mut self, mut cancel: watch::Receiver<bool>) -> Result<()> {
        self.state = MonitorState::Polling;
        info!("polling for stack updates until it's ready, this may take a while");

        let period = self.settings.poll_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *cancel.borrow() {
                return self.cancelled();
            }
            tokio::select! {
                biased;
                _ = cancellation(&mut cancel) => return self.cancelled(),
                _ = ticker.tick() => {}
            }

            match self.scan(&cancel).await {
                Ok(Tick::Pending) => continue,
                Ok(Tick::Succeeded) => {
                    self.state = MonitorState::Succeeded;
                    return Ok(());
                }
                Ok(Tick::Cancelled) => return self.cancelled(),
                Err(err) => {
                    self.state = MonitorState::Failed;
                    return Err(err);
                }
            }
        }
    }

    async fn scan(&self, cancel: &watch::Receiver<bool>) -> Result<Tick> {
        let mut next_token = None;
        loop {
            let page = self
                .api
                .describe_stack_events(self.stack_name, next_token)
                .await?;
            for event in &page.events {
                match classify(event, self.stack_name, self.token, self.cutoff) {
                    Verdict::Stale => return Ok(Tick::Pending),
                    Verdict::Unrelated => continue,
                    Verdict::Failed(err) => {
                        self.trace(event);
                        return Err(err);
                    }
                    Verdict::Progress => self.trace(event),
                    Verdict::Succeeded => {
                        self.trace(event);
                        return Ok(Tick::Succeeded);
                    }
                }
            }
            next_token = match page.next_token {
                Some(t) => Some(t),
                None => return Ok(Tick::Pending),
            };
            if *cancel.borrow() {
                return Ok(Tick::Cancelled);
            }
        }
    }

    fn trace(&self, event: &StackEvent) {
        if self.settings.diagnostics {
            debug!(
                "{}\t{}\t{}",
                event.resource_type, event.logical_resource_id, event.resource_status
            );
        }
    }

    fn cancelled(&mut self) -> Result<()> {
        self.state = MonitorState::Cancelled;
        Err(UpdateError::Cancelled)
    }
}

/// Resolves once the flag is set. Pends forever if every sender is gone,
/// since nobody can cancel any more.
async fn cancellation(rx: &mut watch::Receiver<bool>) {
    let closed = rx.wait_for(|cancelled| *cancelled).await.is_err();
    if closed {
        std::future::pending::<()>().await;
    }
}
