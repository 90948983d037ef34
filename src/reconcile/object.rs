//! Narrowing of the objects delivered by the watch loop and admission server
//!
//! The outer layers receive loosely typed objects. They are narrowed once,
//! here, into the kinds this controller handles; the reconcilers only ever see
//! concrete `Node` and `Pod` values.

use k8s_openapi::api::core::v1::{Node, Pod};
use kube::api::DynamicObject;
use kube::ResourceExt;
use thiserror::Error;

use super::node::{NodeOutcome, NodeReconciler};
use super::pod::{MutationOutcome, PodMutator};
use crate::versions::VersionError;

/// Errors raised while narrowing an untyped object
#[derive(Error, Debug)]
pub enum ObjectError {
    #[error("Unsupported kind '{0}'")]
    UnsupportedKind(String),

    #[error("Object has no type information")]
    MissingKind,

    #[error("Failed to decode {kind}: {source}")]
    Decode {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// An object of one of the kinds this controller reasons about
#[derive(Debug, Clone)]
pub enum WatchedObject {
    Node(Box<Node>),
    Pod(Box<Pod>),
}

/// What the matching reconciler decided for a [`WatchedObject`]
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectOutcome {
    Node(NodeOutcome),
    Pod(MutationOutcome),
}

impl WatchedObject {
    /// Narrow a dynamic object by its `kind`
    pub fn from_dynamic(object: DynamicObject) -> Result<Self, ObjectError> {
        let kind = object
            .types
            .as_ref()
            .map(|types| types.kind.clone())
            .ok_or(ObjectError::MissingKind)?;
        let value = serde_json::to_value(&object).map_err(|source| ObjectError::Decode {
            kind: "object",
            source,
        })?;

        match kind.as_str() {
            "Node" => serde_json::from_value(value)
                .map(|node| WatchedObject::Node(Box::new(node)))
                .map_err(|source| ObjectError::Decode {
                    kind: "Node",
                    source,
                }),
            "Pod" => serde_json::from_value(value)
                .map(|pod| WatchedObject::Pod(Box::new(pod)))
                .map_err(|source| ObjectError::Decode {
                    kind: "Pod",
                    source,
                }),
            other => Err(ObjectError::UnsupportedKind(other.to_string())),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            WatchedObject::Node(_) => "Node",
            WatchedObject::Pod(_) => "Pod",
        }
    }

    pub fn name(&self) -> String {
        match self {
            WatchedObject::Node(node) => node.name_any(),
            WatchedObject::Pod(pod) => pod.name_any(),
        }
    }

    /// Hand the object to the reconciler for its kind
    pub fn reconcile(
        self,
        nodes: &NodeReconciler,
        pods: &PodMutator,
    ) -> Result<ObjectOutcome, VersionError> {
        match self {
            WatchedObject::Node(node) => nodes.reconcile(&node).map(ObjectOutcome::Node),
            WatchedObject::Pod(pod) => pods.mutate(*pod).map(ObjectOutcome::Pod),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versions::MIN_CONTAINERD_VERSION_LABEL;
    use serde_json::json;

    fn dynamic(value: serde_json::Value) -> DynamicObject {
        serde_json::from_value(value).unwrap()
    }

    fn reconcile(object: WatchedObject) -> Result<ObjectOutcome, VersionError> {
        object.reconcile(&NodeReconciler::new(), &PodMutator::new())
    }

    #[test]
    fn test_narrow_pod() {
        let object = dynamic(json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {
                "name": "web-0",
                "labels": {"mwam.com/min-containerd-version": "v1.5.0"}
            },
            "spec": {"containers": [{"name": "web", "image": "nginx"}]}
        }));

        let narrowed = WatchedObject::from_dynamic(object).unwrap();
        assert_eq!(narrowed.kind(), "Pod");
        assert_eq!(narrowed.name(), "web-0");
        match reconcile(narrowed).unwrap() {
            ObjectOutcome::Pod(outcome) => {
                assert!(matches!(outcome, MutationOutcome::Mutated(_)))
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_narrow_node() {
        let object = dynamic(json!({
            "apiVersion": "v1",
            "kind": "Node",
            "metadata": {"name": "worker-1"},
            "status": {
                "nodeInfo": {
                    "architecture": "amd64",
                    "bootID": "",
                    "containerRuntimeVersion": "containerd://1.5.10",
                    "kernelVersion": "5.10.0",
                    "kubeProxyVersion": "v1.22.7",
                    "kubeletVersion": "v1.22.7",
                    "machineID": "",
                    "operatingSystem": "linux",
                    "osImage": "Ubuntu",
                    "systemUUID": ""
                }
            }
        }));

        let narrowed = WatchedObject::from_dynamic(object).unwrap();
        assert_eq!(narrowed.kind(), "Node");
        assert_eq!(narrowed.name(), "worker-1");
        match reconcile(narrowed).unwrap() {
            ObjectOutcome::Node(outcome) => {
                assert!(matches!(outcome, NodeOutcome::NeedsUpdate(_)))
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_kind() {
        let object = dynamic(json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {"name": "settings"}
        }));

        let err = WatchedObject::from_dynamic(object).unwrap_err();
        assert!(matches!(err, ObjectError::UnsupportedKind(kind) if kind == "ConfigMap"));
    }

    #[test]
    fn test_malformed_pod_minimum_fails() {
        let mut pod = Pod::default();
        pod.metadata.labels = Some(
            [(MIN_CONTAINERD_VERSION_LABEL.to_string(), "bogus".to_string())].into(),
        );

        assert!(reconcile(WatchedObject::Pod(Box::new(pod))).is_err());
    }
}
