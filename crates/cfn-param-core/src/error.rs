use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("stack name must be set")]
    MissingStackName,

    #[error("wrong parameter format, want key=value pair: {0:?}")]
    Format(String),

    #[error("wrong parameter format, both key and value must be non-empty: {0:?}")]
    EmptyPart(String),

    #[error("duplicate key in parameters list: {0:?}")]
    DuplicateKey(String),

    #[error("empty parameters list")]
    EmptyParameters,

    #[error("DescribeStacks returned {0} stacks, expected 1")]
    StackCount(usize),

    #[error("stack has no parameters with these names: {}", .0.join(", "))]
    UnknownParameters(Vec<String>),

    #[error("parameter {key} is already set to {value:?}")]
    AlreadySet { key: String, value: String },

    #[error("nothing to update")]
    NothingToUpdate,

    #[error("{status}: {reason}")]
    ResourceUpdateFailed { status: String, reason: String },

    #[error("{0}, see AWS CloudFormation Console for more details")]
    StackRolledBack(String),

    #[error("stopped waiting for the stack update: cancelled")]
    Cancelled,

    #[error("{operation}: {message}")]
    Api {
        operation: &'static str,
        message: String,
    },
}

impl UpdateError {
    /// Conditions that end the run without changing anything and are reported
    /// as warnings rather than failures.
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            UpdateError::AlreadySet { .. } | UpdateError::NothingToUpdate
        )
    }

    pub(crate) fn api(operation: &'static str, message: impl Into<String>) -> Self {
        UpdateError::Api {
            operation,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, UpdateError>;
