//! Runtime configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::logger::LogFilter;

/// What happens to sibling branches when one branch of a fork fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForkPolicy {
    /// Let every sibling run to completion, then report the first failure
    /// in fork order.
    #[default]
    Settle,
    /// Drop still-running siblings as soon as one branch fails.
    CancelSiblings,
}

/// Application-wide dispatch settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub fork_policy: ForkPolicy,
    /// Applied to update names before any logger sees an entry
    pub log_filter: LogFilter,
    /// Paint the unchanged model when a directly dispatched registry key
    /// does not resolve. Chained misses never paint.
    pub render_on_miss: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fork_policy: ForkPolicy::default(),
            log_filter: LogFilter::default(),
            render_on_miss: true,
        }
    }
}

impl AppConfig {
    pub fn with_fork_policy(mut self, policy: ForkPolicy) -> Self {
        self.fork_policy = policy;
        self
    }

    pub fn with_log_filter(mut self, filter: LogFilter) -> Self {
        self.log_filter = filter;
        self
    }

    pub fn with_render_on_miss(mut self, render: bool) -> Self {
        self.render_on_miss = render;
        self
    }
}

/// Configuration for the terminal event poller.
#[derive(Debug, Clone, Copy)]
pub struct PollerConfig {
    /// Timeout passed to each `crossterm::event::poll` call.
    pub poll_timeout: Duration,
    /// Sleep between poll cycles.
    pub loop_sleep: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_millis(10),
            loop_sleep: Duration::from_millis(16),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.fork_policy, ForkPolicy::Settle);
        assert!(config.render_on_miss);
        assert!(config.log_filter.should_log("anything"));
    }

    #[test]
    fn test_deserialize_partial_policy() {
        let config: AppConfig = serde_json::from_str(
            r#"{
                "fork_policy": "cancel_siblings",
                "log_filter": { "include_patterns": [], "exclude_patterns": ["tick"] },
                "render_on_miss": false
            }"#,
        )
        .unwrap();

        assert_eq!(config.fork_policy, ForkPolicy::CancelSiblings);
        assert!(!config.log_filter.should_log("tick"));
        assert!(!config.render_on_miss);
    }
}
