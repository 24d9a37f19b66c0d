use async_trait::async_trait;

use crate::error::Result;
use crate::types::{EventPage, StackSnapshot, UpdateRequest};

/// The three CloudFormation calls a run needs.
///
/// Implementations translate their transport errors into
/// [`UpdateError::Api`](crate::UpdateError::Api), except the "no updates are
/// to be performed" rejection of `update_stack`, which must surface as
/// [`UpdateError::NothingToUpdate`](crate::UpdateError::NothingToUpdate).
#[async_trait]
pub trait StackApi: Send + Sync {
    /// Describe exactly one stack by name.
    async fn describe_stack(&self, stack_name: &str) -> Result<StackSnapshot>;

    async fn update_stack(&self, request: &UpdateRequest) -> Result<()>;

    /// Fetch one page of the stack's events. `next_token` is `None` for the
    /// first page of a scan.
    async fn describe_stack_events(
        &self,
        stack_name: &str,
        next_token: Option<String>,
    ) -> Result<EventPage>;
}

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::VecDeque;
    use std::fmt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use chrono::{DateTime, Utc};
    use tracing::field::{Field, Visit};
    use tracing_subscriber::layer::{self, Layer};

    use super::*;
    use crate::error::UpdateError;
    use crate::types::{ResourceStatus, StackEvent, STACK_RESOURCE_TYPE};

    /// Placeholder token in scripted events, replaced by the token of the
    /// last recorded update.
    pub const RUN_TOKEN: &str = "<run>";

    /// In-memory stack serving scripted event pages, one script entry per tick.
    #[derive(Default)]
    pub struct FakeStack {
        pub snapshot: StackSnapshot,
        pub update_error: Mutex<Option<UpdateError>>,
        pub updates: Mutex<Vec<UpdateRequest>>,
        ticks: Mutex<VecDeque<Vec<Vec<StackEvent>>>>,
        current: Mutex<Vec<Vec<StackEvent>>>,
        pub event_calls: AtomicUsize,
        update_calls: AtomicUsize,
    }

    impl FakeStack {
        pub fn new(snapshot: StackSnapshot) -> Self {
            Self {
                snapshot,
                ..Default::default()
            }
        }

        pub fn push_tick(&self, pages: Vec<Vec<StackEvent>>) {
            self.ticks.lock().unwrap().push_back(pages);
        }

        pub fn fail_update_with(&self, err: UpdateError) {
            *self.update_error.lock().unwrap() = Some(err);
        }

        /// Successful updates only.
        pub fn update_count(&self) -> usize {
            self.updates.lock().unwrap().len()
        }

        /// Every update attempt, including rejected ones.
        pub fn update_call_count(&self) -> usize {
            self.update_calls.load(Ordering::SeqCst)
        }

        pub fn event_call_count(&self) -> usize {
            self.event_calls.load(Ordering::SeqCst)
        }

        fn run_token(&self) -> Option<String> {
            self.updates
                .lock()
                .unwrap()
                .last()
                .map(|u| u.token.as_str().to_string())
        }
    }

    #[async_trait]
    impl StackApi for FakeStack {
        async fn describe_stack(&self, _stack_name: &str) -> Result<StackSnapshot> {
            Ok(self.snapshot.clone())
        }

        async fn update_stack(&self, request: &UpdateRequest) -> Result<()> {
            self.update_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(err) = self.update_error.lock().unwrap().take() {
                return Err(err);
            }
            self.updates.lock().unwrap().push(request.clone());
            Ok(())
        }

        async fn describe_stack_events(
            &self,
            _stack_name: &str,
            next_token: Option<String>,
        ) -> Result<EventPage> {
            self.event_calls.fetch_add(1, Ordering::SeqCst);
            let index = match next_token {
                None => {
                    let tick = self.ticks.lock().unwrap().pop_front().unwrap_or_default();
                    *self.current.lock().unwrap() = tick;
                    0
                }
                Some(t) => t.parse::<usize>().expect("fake page token"),
            };
            let current = self.current.lock().unwrap();
            let mut events = current.get(index).cloned().unwrap_or_default();
            if let Some(token) = self.run_token() {
                for e in &mut events {
                    if e.correlation_token.as_deref() == Some(RUN_TOKEN) {
                        e.correlation_token = Some(token.clone());
                    }
                }
            }
            let next_token = (index + 1 < current.len()).then(|| (index + 1).to_string());
            Ok(EventPage { events, next_token })
        }
    }

    /// An event for the stack itself.
    pub fn stack_event(
        stack: &str,
        status: &str,
        token: &str,
        at: DateTime<Utc>,
    ) -> StackEvent {
        StackEvent {
            timestamp: Some(at),
            resource_type: STACK_RESOURCE_TYPE.to_string(),
            logical_resource_id: stack.to_string(),
            resource_status: ResourceStatus::from(status),
            status_reason: String::new(),
            correlation_token: Some(token.to_string()),
        }
    }

    /// An event for a resource inside the stack.
    pub fn resource_event(
        id: &str,
        status: &str,
        reason: &str,
        token: &str,
        at: DateTime<Utc>,
    ) -> StackEvent {
        StackEvent {
            timestamp: Some(at),
            resource_type: "AWS::ECS::Service".to_string(),
            logical_resource_id: id.to_string(),
            resource_status: ResourceStatus::from(status),
            status_reason: reason.to_string(),
            correlation_token: Some(token.to_string()),
        }
    }

    /// Collects the message of every tracing event emitted on this thread
    /// while the guard is alive.
    pub fn capture_logs() -> (tracing::subscriber::DefaultGuard, Arc<Mutex<Vec<String>>>) {
        use tracing_subscriber::prelude::*;

        let lines = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry().with(Capture(lines.clone()));
        (tracing::subscriber::set_default(subscriber), lines)
    }

    struct Capture(Arc<Mutex<Vec<String>>>);

    impl<S: tracing::Subscriber> Layer<S> for Capture {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: layer::Context<'_, S>) {
            let mut message = Message(String::new());
            event.record(&mut message);
            self.0.lock().unwrap().push(message.0);
        }
    }

    struct Message(String);

    impl Visit for Message {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{value:?}");
            }
        }
    }
}
