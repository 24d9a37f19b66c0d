//! Merge requested overrides into the stack's full parameter list.
//!
//! UpdateStack requires every parameter the stack defines to be listed, so
//! the plan carries one entry per current parameter, in the stack's order.
//! Only overridden keys get explicit values; the rest keep their previous
//! value server-side.

use serde::Serialize;

use crate::error::{Result, UpdateError};
use crate::kv::Overrides;
use crate::types::{StackParameter, StackSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// One `--key`/`--value` pair. An override equal to the current value is
    /// reported as [`UpdateError::AlreadySet`] instead of being submitted.
    Single,
    /// A `key=value` list; the backing system decides whether anything changed.
    Multiple,
}

/// The reconciled update payload, minus the stack name and token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub parameters: Vec<StackParameter>,
    pub capabilities: Vec<String>,
    pub notification_targets: Vec<String>,
}

pub fn reconcile(snapshot: &StackSnapshot, overrides: &Overrides, mode: Mode) -> Result<Plan> {
    let mut pending = overrides.clone();
    let mut parameters = Vec::with_capacity(snapshot.parameters.len());

    for current in &snapshot.parameters {
        match pending.remove(&current.key) {
            Some(value) => {
                if mode == Mode::Single && value == current.value {
                    return Err(UpdateError::AlreadySet {
                        key: current.key.clone(),
                        value,
                    });
                }
                parameters.push(StackParameter::explicit(&current.key, value));
            }
            None => parameters.push(StackParameter::use_previous(&current.key)),
        }
    }

    if !pending.is_empty() {
        let mut unknown: Vec<String> = pending.into_keys().collect();
        unknown.sort();
        return Err(UpdateError::UnknownParameters(unknown));
    }

    Ok(Plan {
        parameters,
        capabilities: snapshot.capabilities.clone(),
        notification_targets: snapshot.notification_targets.clone(),
    })
}
