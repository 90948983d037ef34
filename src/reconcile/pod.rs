//! Pod mutation: pin pods to nodes meeting their declared minimum versions

use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use tracing::{debug, info};

use crate::affinity::{
    build_node_selector, merge_required, replace_required_affinity, required_affinity,
};
use crate::versions::{VersionError, MIN_CONTAINERD_VERSION_LABEL, MIN_KUBELET_VERSION_LABEL};

/// Result of running the mutator over one pod
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    /// Leave the pod exactly as submitted
    Unchanged,
    /// The pod with its required node affinity replaced
    Mutated(Box<Pod>),
}

/// Injects minimum-version node affinity into pods
#[derive(Debug, Clone, Copy, Default)]
pub struct PodMutator;

impl PodMutator {
    pub fn new() -> Self {
        Self
    }

    /// Decide whether `pod` needs a version constraint and apply it.
    ///
    /// Pods without minimum-version labels are never touched. A pod whose
    /// required node affinity already equals the wanted selector is left
    /// unchanged, so running the mutator twice is a no-op.
    pub fn mutate(&self, mut pod: Pod) -> Result<MutationOutcome, VersionError> {
        let name = pod.name_any();
        let (min_containerd, min_kubelet) = declared_minimums(&pod);
        let wanted = build_node_selector(min_containerd, min_kubelet)?;

        let current = required_affinity(&pod);
        if wanted.node_selector_terms.is_empty() || current == Some(&wanted) {
            debug!(pod = %name, "Pod selector does not need updating");
            return Ok(MutationOutcome::Unchanged);
        }

        info!(pod = %name, wanted = ?wanted, "Updating affinity selector");
        let replacement = merge_required(current, &wanted);
        replace_required_affinity(&mut pod, replacement);

        Ok(MutationOutcome::Mutated(Box::new(pod)))
    }
}

/// Minimum versions declared on the pod, empty when absent
fn declared_minimums(pod: &Pod) -> (&str, &str) {
    let labels = pod.labels();
    let containerd = labels
        .get(MIN_CONTAINERD_VERSION_LABEL)
        .map_or("", String::as_str);
    let kubelet = labels
        .get(MIN_KUBELET_VERSION_LABEL)
        .map_or("", String::as_str);
    (containerd, kubelet)
}
