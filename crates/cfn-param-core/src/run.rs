use tokio::sync::watch;
use tracing::debug;

use crate::api::StackApi;
use crate::config::Settings;
use crate::error::{Result, UpdateError};
use crate::kv::Overrides;
use crate::monitor::Monitor;
use crate::reconcile::{reconcile, Mode, Plan};
use crate::submit::submit;

// ---------------------------------------------------------------------------
// RunRequest
// ---------------------------------------------------------------------------

/// A validated request to update some parameters of one stack.
#[derive(Debug, Clone)]
pub struct RunRequest {
    stack_name: String,
    overrides: Overrides,
    mode: Mode,
    dry_run: bool,
}

impl RunRequest {
    /// Validate inputs before anything touches the network.
    pub fn new(stack_name: impl Into<String>, overrides: Overrides, mode: Mode) -> Result<Self> {
        let stack_name = stack_name.into();
        require_stack_name(&stack_name)?;
        if overrides.is_empty() {
            return Err(UpdateError::EmptyParameters);
        }
        Ok(Self {
            stack_name,
            overrides,
            mode,
            dry_run: false,
        })
    }

    /// Stop after reconciliation and return the plan without submitting it.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }
}

/// Fails with [`UpdateError::MissingStackName`] for an empty or blank name.
pub fn require_stack_name(stack_name: &str) -> Result<()> {
    if stack_name.trim().is_empty() {
        return Err(UpdateError::MissingStackName);
    }
    Ok(())
}

#[derive(Debug)]
pub enum Outcome {
    /// Dry run: the payload that would have been submitted.
    Planned(Plan),
    /// The update was submitted and the stack reached `UPDATE_COMPLETE`.
    Updated,
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

/// Describe, reconcile, submit, then wait for the update to finish.
pub async fn run<A>(
    api: &A,
    request: &RunRequest,
    settings: &Settings,
    cancel: watch::Receiver<bool>,
) -> Result<Outcome>
where
    A: StackApi + ?Sized,
{
    if settings.diagnostics {
        let mut loaded: Vec<_> = request.overrides.iter().collect();
        loaded.sort();
        debug!("loaded parameters: {loaded:?}");
    }

    let snapshot = api.describe_stack(&request.stack_name).await?;
    let plan = reconcile(&snapshot, &request.overrides, request.mode)?;

    if settings.diagnostics {
        debug!("parameters to call UpdateStack with:");
        for p in &plan.parameters {
            debug!("{p}");
        }
    }

    if request.dry_run {
        return Ok(Outcome::Planned(plan));
    }

    let token = submit(api, &request.stack_name, plan).await?;
    Monitor::new(api, &request.stack_name, &token, settings)
        .wait(cancel)
        .await?;
    Ok(Outcome::Updated)
}
