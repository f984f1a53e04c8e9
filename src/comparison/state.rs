use serde::{Deserialize, Serialize};

/// Lifecycle of one comparison run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Initialized,
    PluginsResolved,
    Running,
    Aggregating,
    Completed,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed)
    }

    /// Whether `self -> next` is a legal step. Any live state may fail.
    pub fn can_transition_to(&self, next: RunState) -> bool {
        use RunState::*;
        matches!(
            (self, next),
            (Initialized, PluginsResolved)
                | (PluginsResolved, Running)
                | (Running, Aggregating)
                | (Aggregating, Completed)
                | (Initialized | PluginsResolved | Running | Aggregating, Failed)
        )
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunState::Initialized => "initialized",
            RunState::PluginsResolved => "plugins_resolved",
            RunState::Running => "running",
            RunState::Aggregating => "aggregating",
            RunState::Completed => "completed",
            RunState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Tracks the current state and every state visited, in order.
#[derive(Debug, Clone)]
pub struct RunTracker {
    current: RunState,
    history: Vec<RunState>,
}

impl Default for RunTracker {
    fn default() -> Self {
        Self {
            current: RunState::Initialized,
            history: vec![RunState::Initialized],
        }
    }
}

impl RunTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> RunState {
        self.current
    }

    pub fn history(&self) -> &[RunState] {
        &self.history
    }

    /// Move to `next`. Illegal steps are ignored and logged.
    pub fn advance(&mut self, next: RunState) {
        if !self.current.can_transition_to(next) {
            tracing::error!(from = %self.current, to = %next, "illegal run state transition");
            debug_assert!(false, "illegal run state transition {} -> {}", self.current, next);
            return;
        }
        if next == RunState::Failed {
            tracing::warn!(from = %self.current, "comparison run failed");
        } else {
            tracing::info!(from = %self.current, to = %next, "comparison run state");
        }
        self.current = next;
        self.history.push(next);
    }
}
