use async_trait::async_trait;
use k8s_openapi::api::core::v1::Node;
use kube::api::{Api, Patch, PatchParams};
use kube::Client;
use serde_json::json;

use super::ClientError;
use crate::labels::NodeLabelSet;

// ============================================================================
// SBIO: Trait for abstraction (allows mocking in tests)
// ============================================================================

/// Persists version labels onto a node
#[async_trait]
pub trait NodeLabelWriter: Send + Sync {
    /// Set every label in `labels` on the named node. Labels not in the set
    /// must be left untouched.
    async fn write_labels(&self, node_name: &str, labels: &NodeLabelSet)
        -> Result<(), ClientError>;
}

/// The merge patch body that sets `labels` and nothing else
pub fn label_patch(labels: &NodeLabelSet) -> serde_json::Value {
    json!({ "metadata": { "labels": labels.as_map() } })
}

// ============================================================================
// SBIO: I/O implementation (real API server)
// ============================================================================

#[derive(Clone)]
pub struct KubeNodeWriter {
    api: Api<Node>,
}

impl KubeNodeWriter {
    pub fn new(client: Client) -> Self {
        Self {
            api: Api::all(client),
        }
    }
}

#[async_trait]
impl NodeLabelWriter for KubeNodeWriter {
    async fn write_labels(
        &self,
        node_name: &str,
        labels: &NodeLabelSet,
    ) -> Result<(), ClientError> {
        let patch = label_patch(labels);
        self.api
            .patch(node_name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }
}

// ============================================================================
// SBIO: Mock implementation for testing (no I/O)
// ============================================================================

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Records every write instead of calling the API server
    #[derive(Default)]
    pub struct MockNodeWriter {
        writes: Mutex<Vec<(String, NodeLabelSet)>>,
        fail: bool,
    }

    impl MockNodeWriter {
        pub fn new() -> Self {
            Self::default()
        }

        /// A writer whose every call fails
        pub fn failing() -> Self {
            Self {
                writes: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        pub fn writes(&self) -> Vec<(String, NodeLabelSet)> {
            self.writes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl NodeLabelWriter for MockNodeWriter {
        async fn write_labels(
            &self,
            node_name: &str,
            labels: &NodeLabelSet,
        ) -> Result<(), ClientError> {
            if self.fail {
                return Err(ClientError::Api(kube::Error::Service(
                    "api server unavailable".into(),
                )));
            }
            self.writes
                .lock()
                .unwrap()
                .push((node_name.to_string(), labels.clone()));
            Ok(())
        }
    }
}
