use rand::RngCore;
use serde::Serialize;
use std::fmt;

const PREFIX: &str = "ucs-";
const ENTROPY_BYTES: usize = 20;

/// Client request token attached to one UpdateStack call. CloudFormation
/// copies it onto every event the update produces, which is how the monitor
/// tells this run's events apart from everyone else's.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CorrelationToken(String);

impl CorrelationToken {
    pub fn generate() -> Self {
        let mut bytes = [0u8; ENTROPY_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(format!("{PREFIX}{}", hex::encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, other: Option<&str>) -> bool {
        other == Some(self.0.as_str())
    }
}

impl From<&str> for CorrelationToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
