use dagforge_core::{ExecutionId, WorkflowId};

use crate::event::Event;

/// A subscriber's match criteria: by execution id, workflow id, or
/// wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Execution(ExecutionId),
    Workflow(WorkflowId),
    All,
}

impl Filter {
    pub fn matches(&self, event: &Event) -> bool {
        match self {
            Self::Execution(id) => *id == event.execution_id,
            Self::Workflow(id) => *id == event.workflow_id,
            Self::All => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use dagforge_core::Value;

    fn event(execution_id: ExecutionId, workflow_id: WorkflowId) -> Event {
        Event::new(EventKind::NodeStarted, execution_id, workflow_id, None, Value::Null)
    }

    #[test]
    fn execution_filter_matches_only_that_execution() {
        let target = ExecutionId::v4();
        let filter = Filter::Execution(target);
        assert!(filter.matches(&event(target, WorkflowId::v4())));
        assert!(!filter.matches(&event(ExecutionId::v4(), WorkflowId::v4())));
    }

    #[test]
    fn workflow_filter_matches_every_execution_of_that_workflow() {
        let workflow = WorkflowId::v4();
        let filter = Filter::Workflow(workflow);
        assert!(filter.matches(&event(ExecutionId::v4(), workflow)));
        assert!(filter.matches(&event(ExecutionId::v4(), workflow)));
        assert!(!filter.matches(&event(ExecutionId::v4(), WorkflowId::v4())));
    }

    #[test]
    fn wildcard_matches_everything() {
        assert!(Filter::All.matches(&event(ExecutionId::v4(), WorkflowId::v4())));
    }
}
