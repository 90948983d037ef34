use crate::config::MalformedPolicy;
use crate::reconcile::{NodeReconciler, PodMutator};

/// Shared webhook state
#[derive(Debug, Clone, Copy)]
pub struct WebhookState {
    pub reconciler: NodeReconciler,
    pub mutator: PodMutator,
    pub on_malformed: MalformedPolicy,
}

impl WebhookState {
    pub fn new(on_malformed: MalformedPolicy) -> Self {
        Self {
            reconciler: NodeReconciler::new(),
            mutator: PodMutator::new(),
            on_malformed,
        }
    }
}

impl Default for WebhookState {
    fn default() -> Self {
        Self::new(MalformedPolicy::default())
    }
}
