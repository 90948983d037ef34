//! Node label synthesis
//!
//! Turns the version strings a node reports about itself into the four
//! `mwam.com/*-version` labels and decides whether the node already carries
//! them. The set is rebuilt from scratch on every reconciliation; existing
//! label values are only ever compared against, never merged into it.

use std::collections::BTreeMap;

use crate::versions::{
    parse_runtime_reported, parse_version, Version, VersionError, CONTAINERD_MAJOR_KEY,
    CONTAINERD_MINOR_KEY, KUBELET_MAJOR_KEY, KUBELET_MINOR_KEY,
};

/// The version labels a node should carry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLabelSet {
    containerd: Version,
    kubelet: Version,
    labels: BTreeMap<String, String>,
}

impl NodeLabelSet {
    /// Build the label set from a runtime string (`containerd://1.5.10`) and
    /// a kubelet string (`v1.22.7`). The runtime string is parsed first and
    /// the first failure is returned as-is.
    pub fn synthesize(runtime_version: &str, kubelet_version: &str) -> Result<Self, VersionError> {
        let containerd = parse_runtime_reported(runtime_version)?;
        let kubelet = parse_version(kubelet_version)?;

        let labels = BTreeMap::from([
            (CONTAINERD_MAJOR_KEY.to_string(), containerd.major.to_string()),
            (CONTAINERD_MINOR_KEY.to_string(), containerd.minor.to_string()),
            (KUBELET_MAJOR_KEY.to_string(), kubelet.major.to_string()),
            (KUBELET_MINOR_KEY.to_string(), kubelet.minor.to_string()),
        ]);
        Ok(Self {
            containerd,
            kubelet,
            labels,
        })
    }

    /// Containerd version the labels were built from
    pub fn containerd(&self) -> Version {
        self.containerd
    }

    /// Kubelet version the labels were built from
    pub fn kubelet(&self) -> Version {
        self.kubelet
    }

    /// Borrow the underlying map
    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    /// Returns true unless every desired key is present in `current` with the
    /// same value. Keys in `current` that are not ours are ignored.
    pub fn needs_update(&self, current: Option<&BTreeMap<String, String>>) -> bool {
        let Some(current) = current else {
            return !self.labels.is_empty();
        };
        self.labels
            .iter()
            .any(|(key, value)| current.get(key) != Some(value))
    }

    /// Write every desired key into `labels`, leaving other keys alone
    pub fn apply_to(&self, labels: &mut BTreeMap<String, String>) {
        for (key, value) in &self.labels {
            labels.insert(key.clone(), value.clone());
        }
    }
}
