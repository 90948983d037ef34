//! Node controller - keeps version labels on every node current
//!
//! Watches all nodes and, for each delivered object, asks the
//! [`NodeReconciler`] which labels the node should carry. Writes happen only
//! when a label is missing or stale. Failures are logged and the node is
//! requeued; the reconciler itself never retries.

use std::sync::Arc;

use futures::StreamExt;
use k8s_openapi::api::core::v1::Node;
use kube::api::Api;
use kube::runtime::controller::{Action, Controller};
use kube::runtime::watcher;
use kube::{Client, ResourceExt};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::client::{ClientError, NodeLabelWriter};
use crate::config::ControllerSettings;
use crate::reconcile::{NodeOutcome, NodeReconciler};
use crate::versions::VersionError;

/// Errors surfaced to the watch loop
#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("Node '{node}' reports unusable versions: {source}")]
    Version {
        node: String,
        #[source]
        source: VersionError,
    },

    #[error("Failed to update node '{node}': {source}")]
    Write {
        node: String,
        #[source]
        source: ClientError,
    },
}

/// Shared state handed to every reconciliation
pub struct ControllerContext {
    writer: Arc<dyn NodeLabelWriter>,
    reconciler: NodeReconciler,
    settings: ControllerSettings,
}

impl ControllerContext {
    pub fn new(writer: Arc<dyn NodeLabelWriter>, settings: ControllerSettings) -> Self {
        Self {
            writer,
            reconciler: NodeReconciler::new(),
            settings,
        }
    }
}

/// Reconcile a single node: compute its labels and write them if needed
pub async fn reconcile_node(
    node: Arc<Node>,
    ctx: Arc<ControllerContext>,
) -> Result<Action, ControllerError> {
    let name = node.name_any();

    let outcome = ctx
        .reconciler
        .reconcile(&node)
        .map_err(|source| ControllerError::Version {
            node: name.clone(),
            source,
        })?;

    match outcome {
        NodeOutcome::NeedsUpdate(labels) => {
            info!(
                node = %name,
                containerd = %labels.containerd(),
                kubelet = %labels.kubelet(),
                "Node is not in the desired state. Updating"
            );
            ctx.writer
                .write_labels(&name, &labels)
                .await
                .map_err(|source| ControllerError::Write {
                    node: name.clone(),
                    source,
                })?;
        }
        NodeOutcome::UpToDate => {
            debug!(node = %name, "Node does not need an update");
        }
    }

    Ok(Action::requeue(ctx.settings.requeue_after()))
}

/// Decide when to retry a node whose reconciliation failed
pub fn error_policy(
    node: Arc<Node>,
    error: &ControllerError,
    ctx: Arc<ControllerContext>,
) -> Action {
    warn!(node = %node.name_any(), error = %error, "Reconciliation failed");
    Action::requeue(ctx.settings.error_requeue_after())
}

// ============================================================================
// SBIO: I/O wrapper - the watch loop
// ============================================================================

/// Run the node controller until the watch stream ends
pub async fn run(client: Client, ctx: Arc<ControllerContext>) {
    let nodes: Api<Node> = Api::all(client);
    info!(controller = %ctx.settings.name, "Starting node controller");

    Controller::new(nodes, watcher::Config::default())
        .run(reconcile_node, error_policy, ctx)
        .for_each(|result| async move {
            match result {
                Ok((object, _action)) => debug!(node = %object.name, "Reconciled"),
                Err(e) => error!(error = %e, "Controller error"),
            }
        })
        .await;

    warn!("Node controller stream ended");
}
