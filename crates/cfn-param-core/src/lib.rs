//! `cfn-param-core` — update some parameters of a deployed CloudFormation
//! stack while keeping everything else as it is, then wait for the update.
//!
//! ```text
//! kv::parse_lines ─▶ reconcile ─▶ submit ─▶ Monitor::wait
//!                       ▲            │            │
//!                 describe_stack  update_stack  describe_stack_events
//! ```
//!
//! All network access goes through [`StackApi`]; [`aws::CloudFormation`] is
//! the production implementation.

pub mod api;
pub mod aws;
pub mod config;
pub mod error;
pub mod kv;
pub mod monitor;
pub mod reconcile;
pub mod run;
pub mod submit;
pub mod token;
pub mod types;

pub use api::StackApi;
pub use config::Settings;
pub use error::{Result, UpdateError};
pub use monitor::{Monitor, MonitorState};
pub use reconcile::{Mode, Plan};
pub use run::{run, Outcome, RunRequest};
pub use token::CorrelationToken;
