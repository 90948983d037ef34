//! Node reconciliation: desired version labels vs. what the node carries

use k8s_openapi::api::core::v1::Node;
use kube::ResourceExt;
use tracing::debug;

use crate::labels::NodeLabelSet;
use crate::versions::VersionError;

/// Result of reconciling one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeOutcome {
    /// The node already carries every desired label
    UpToDate,
    /// These labels must be written to the node
    NeedsUpdate(NodeLabelSet),
}

/// Computes the version labels a node should carry
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeReconciler;

impl NodeReconciler {
    pub fn new() -> Self {
        Self
    }

    /// Decide whether `node` needs its version labels written.
    ///
    /// A node that has not reported `status.nodeInfo` yet is treated as
    /// reporting empty version strings and fails like any malformed report.
    pub fn reconcile(&self, node: &Node) -> Result<NodeOutcome, VersionError> {
        let (runtime_version, kubelet_version) = reported_versions(node);
        let desired = NodeLabelSet::synthesize(runtime_version, kubelet_version)?;

        if desired.needs_update(node.metadata.labels.as_ref()) {
            debug!(node = %node.name_any(), "Version labels out of date");
            Ok(NodeOutcome::NeedsUpdate(desired))
        } else {
            Ok(NodeOutcome::UpToDate)
        }
    }

    /// Write `desired` into the node's label map, keeping unrelated labels
    pub fn apply(&self, node: &mut Node, desired: &NodeLabelSet) {
        let labels = node.metadata.labels.get_or_insert_with(Default::default);
        desired.apply_to(labels);
    }
}

/// Runtime and kubelet version strings from `status.nodeInfo`
fn reported_versions(node: &Node) -> (&str, &str) {
    node.status
        .as_ref()
        .and_then(|status| status.node_info.as_ref())
        .map(|info| {
            (
                info.container_runtime_version.as_str(),
                info.kubelet_version.as_str(),
            )
        })
        .unwrap_or(("", ""))
}
