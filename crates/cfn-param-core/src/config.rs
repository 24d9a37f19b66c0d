use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(20);
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(60 * 60);

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Run-wide configuration, resolved once at startup and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Running as a GitHub Actions step: messages carry workflow-command
    /// prefixes and overrides may come from `INPUT_PARAMETERS`.
    pub github_actions: bool,
    /// Emit the diagnostic trace of reconciled parameters and matched events.
    /// On by default only under GitHub Actions.
    pub diagnostics: bool,
    pub poll_interval: Duration,
    /// Events older than monitor start minus this are not scanned.
    pub stale_after: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            github_actions: false,
            diagnostics: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
            stale_after: DEFAULT_STALE_AFTER,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let github_actions = under_github_actions(&lookup);
        Self {
            github_actions,
            diagnostics: github_actions,
            ..Self::default()
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

pub fn under_github_actions(lookup: impl Fn(&str) -> Option<String>) -> bool {
    lookup("GITHUB_ACTIONS").as_deref() == Some("true")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_follow_github_actions_flag() {
        let on = Settings::from_lookup(|k| (k == "GITHUB_ACTIONS").then(|| "true".to_string()));
        assert!(on.github_actions);
        assert!(on.diagnostics);
        assert_eq!(on.poll_interval, DEFAULT_POLL_INTERVAL);

        let off = Settings::from_lookup(|_| None);
        assert!(!off.github_actions);
        assert!(!off.diagnostics);

        let other = Settings::from_lookup(|_| Some("1".to_string()));
        assert!(!other.diagnostics);
    }

    #[test]
    fn poll_interval_override() {
        let s = Settings::default().with_poll_interval(Duration::from_secs(5));
        assert_eq!(s.poll_interval, Duration::from_secs(5));
        assert_eq!(s.stale_after, DEFAULT_STALE_AFTER);
    }
}
