//! Lifecycle events reported by the host and the policy deciding which of
//! them trigger a notification.

use serde::{Deserialize, Serialize};

use crate::config::NotificationSpec;

/// A lifecycle point at which the host asks whether to notify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// The run is about to execute these tasks
    RunStarted { tasks: Vec<String> },

    /// The run executed these tasks and finished with `overall_status`
    RunFinished {
        tasks: Vec<String>,
        overall_status: i32,
    },

    /// A single task failed
    TaskFailed { task: String },
}

impl LifecycleEvent {
    /// Get a short label for this event type.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::RunStarted { .. } => "run_started",
            Self::RunFinished { .. } => "run_finished",
            Self::TaskFailed { .. } => "task_failed",
        }
    }
}

/// Trigger configuration extracted from a [`NotificationSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerPolicy {
    on_start: bool,
    on_success: bool,
    on_failure: bool,
    on_tasks: Option<Vec<String>>,
    on_demand: bool,
}

impl TriggerPolicy {
    /// Resolve the spec's trigger flags.
    ///
    /// Unset `on_success`/`on_failure` default to `true` unless `on_start` is
    /// set, so a start-only notification does not also fire at the end.
    #[must_use]
    pub fn from_spec(spec: &NotificationSpec) -> Self {
        let end_default = !spec.on_start;
        Self {
            on_start: spec.on_start,
            on_success: spec.on_success.unwrap_or(end_default),
            on_failure: spec.on_failure.unwrap_or(end_default),
            on_tasks: spec.on_tasks.clone(),
            on_demand: spec.on_demand,
        }
    }

    /// Whether a notification should be sent for `event`.
    #[must_use]
    pub fn should_fire(&self, event: &LifecycleEvent) -> bool {
        if self.on_demand {
            return false;
        }

        match event {
            LifecycleEvent::RunStarted { tasks } => self.on_start && self.matches_tasks(tasks),
            LifecycleEvent::RunFinished {
                tasks,
                overall_status,
            } => {
                let wanted = if *overall_status == 0 {
                    self.on_success
                } else {
                    self.on_failure
                };
                wanted && self.matches_tasks(tasks)
            }
            LifecycleEvent::TaskFailed { task } => {
                self.on_failure
                    && self
                        .on_tasks
                        .as_ref()
                        .is_some_and(|filter| filter.iter().any(|t| t == task))
            }
        }
    }

    fn matches_tasks(&self, tasks: &[String]) -> bool {
        self.on_tasks
            .as_ref()
            .is_none_or(|filter| filter.iter().any(|t| tasks.contains(t)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NotifierKind;

    fn tasks(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    fn finished(names: &[&str], overall_status: i32) -> LifecycleEvent {
        LifecycleEvent::RunFinished {
            tasks: tasks(names),
            overall_status,
        }
    }

    #[test]
    fn test_default_fires_on_both_outcomes_only() {
        let policy = TriggerPolicy::from_spec(&NotificationSpec::new("n", NotifierKind::Webhook));
        assert!(!policy.should_fire(&LifecycleEvent::RunStarted {
            tasks: tasks(&["provision"])
        }));
        assert!(policy.should_fire(&finished(&["provision"], 0)));
        assert!(policy.should_fire(&finished(&["provision"], 1)));
    }

    #[test]
    fn test_on_start_only() {
        let mut spec = NotificationSpec::new("n", NotifierKind::Slack);
        spec.on_start = true;
        let policy = TriggerPolicy::from_spec(&spec);

        assert!(policy.should_fire(&LifecycleEvent::RunStarted {
            tasks: tasks(&["validate"])
        }));
        assert!(!policy.should_fire(&finished(&["validate"], 0)));
        assert!(!policy.should_fire(&finished(&["validate"], 2)));
    }

    #[test]
    fn test_on_start_with_explicit_failure() {
        let mut spec = NotificationSpec::new("n", NotifierKind::Slack);
        spec.on_start = true;
        spec.on_failure = Some(true);
        let policy = TriggerPolicy::from_spec(&spec);

        assert!(!policy.should_fire(&finished(&["execute"], 0)));
        assert!(policy.should_fire(&finished(&["execute"], 1)));
    }

    #[test]
    fn test_success_only() {
        let mut spec = NotificationSpec::new("n", NotifierKind::Gchat);
        spec.on_success = Some(true);
        spec.on_failure = Some(false);
        let policy = TriggerPolicy::from_spec(&spec);

        assert!(policy.should_fire(&finished(&["execute"], 0)));
        assert!(!policy.should_fire(&finished(&["execute"], 1)));
    }

    #[test]
    fn test_task_filter() {
        let mut spec = NotificationSpec::new("n", NotifierKind::Webhook);
        spec.on_start = true;
        spec.on_tasks = Some(tasks(&["provision"]));
        let policy = TriggerPolicy::from_spec(&spec);

        assert!(policy.should_fire(&LifecycleEvent::RunStarted {
            tasks: tasks(&["validate", "provision"])
        }));
        assert!(!policy.should_fire(&LifecycleEvent::RunStarted {
            tasks: tasks(&["execute"])
        }));
    }

    #[test]
    fn test_task_failed_requires_explicit_filter() {
        let event = LifecycleEvent::TaskFailed {
            task: "execute".to_string(),
        };

        let unfiltered = TriggerPolicy::from_spec(&NotificationSpec::new("n", NotifierKind::Webhook));
        assert!(!unfiltered.should_fire(&event));

        let mut spec = NotificationSpec::new("n", NotifierKind::Webhook);
        spec.on_tasks = Some(tasks(&["execute"]));
        assert!(TriggerPolicy::from_spec(&spec).should_fire(&event));

        spec.on_failure = Some(false);
        assert!(!TriggerPolicy::from_spec(&spec).should_fire(&event));
    }

    #[test]
    fn test_on_demand_never_fires() {
        let mut spec = NotificationSpec::new("n", NotifierKind::Webhook);
        spec.on_demand = true;
        spec.on_start = true;
        let policy = TriggerPolicy::from_spec(&spec);

        assert!(!policy.should_fire(&LifecycleEvent::RunStarted {
            tasks: tasks(&["validate"])
        }));
        assert!(!policy.should_fire(&finished(&["validate"], 1)));
    }

    #[test]
    fn test_event_labels() {
        assert_eq!(finished(&[], 0).label(), "run_finished");
        assert_eq!(
            LifecycleEvent::TaskFailed { task: "x".into() }.label(),
            "task_failed"
        );
    }
}
