//! Required node affinity for minimum-version pods
//!
//! A minimum of `X.Y` is expressed as two `Gt` requirements against the node
//! version labels: `major > X - 1` and `minor > Y - 1`. Requirements for
//! containerd and kubelet are ANDed inside a single `NodeSelectorTerm`.
//!
//! ## Scheduling caveat
//!
//! [`merge_required`] unions selector *terms*, and Kubernetes ORs terms
//! together. If a pod already has an unrelated required term, the version
//! term becomes an alternative to it rather than an additional condition: a
//! node matching either term alone is eligible. This is the established
//! behaviour and is kept as-is.

use k8s_openapi::api::core::v1::{
    Affinity, NodeAffinity, NodeSelector, NodeSelectorRequirement, NodeSelectorTerm, Pod,
};
use tracing::debug;

use crate::versions::{
    parse_version, VersionError, CONTAINERD_MAJOR_KEY, CONTAINERD_MINOR_KEY, KUBELET_MAJOR_KEY,
    KUBELET_MINOR_KEY,
};

/// Node selector operator for "label value is greater than"
pub const OPERATOR_GT: &str = "Gt";

/// Build a `key > value` requirement.
///
/// The value is formatted as an unsigned decimal, so callers pass thresholds
/// that have already been through `wrapping_sub`.
pub fn greater_than(key: &str, value: u64) -> NodeSelectorRequirement {
    NodeSelectorRequirement {
        key: key.to_string(),
        operator: OPERATOR_GT.to_string(),
        values: Some(vec![value.to_string()]),
    }
}

/// Append the pair of requirements encoding "at least `raw`" for one component
fn push_minimum(
    requirements: &mut Vec<NodeSelectorRequirement>,
    raw: &str,
    major_key: &str,
    minor_key: &str,
) -> Result<(), VersionError> {
    if raw.is_empty() {
        return Ok(());
    }
    let version = parse_version(raw)?;
    // The threshold is one below the minimum; a zero component wraps to u64::MAX.
    requirements.push(greater_than(major_key, version.major.wrapping_sub(1)));
    requirements.push(greater_than(minor_key, version.minor.wrapping_sub(1)));
    Ok(())
}

/// Build the selector a pod needs for its declared minimum versions.
///
/// An empty string means no minimum for that component. With no minimums at
/// all the selector has zero terms, which callers treat as "nothing wanted".
/// Otherwise the selector has exactly one term holding every requirement.
pub fn build_node_selector(
    min_containerd_version: &str,
    min_kubelet_version: &str,
) -> Result<NodeSelector, VersionError> {
    let mut requirements = Vec::new();
    push_minimum(
        &mut requirements,
        min_containerd_version,
        CONTAINERD_MAJOR_KEY,
        CONTAINERD_MINOR_KEY,
    )?;
    push_minimum(
        &mut requirements,
        min_kubelet_version,
        KUBELET_MAJOR_KEY,
        KUBELET_MINOR_KEY,
    )?;

    let node_selector_terms = if requirements.is_empty() {
        Vec::new()
    } else {
        vec![NodeSelectorTerm {
            match_expressions: Some(requirements),
            match_fields: None,
        }]
    };
    Ok(NodeSelector { node_selector_terms })
}

/// Union the terms of `addition` into `existing`.
///
/// Existing terms keep their order and come first. Terms from `addition`
/// follow in their own order, skipping any that are structurally equal to a
/// term already collected. Nothing is removed and no term is rewritten.
pub fn merge_required(existing: Option<&NodeSelector>, addition: &NodeSelector) -> NodeSelector {
    let mut terms: Vec<NodeSelectorTerm> = existing
        .map(|selector| selector.node_selector_terms.clone())
        .unwrap_or_default();

    for term in &addition.node_selector_terms {
        if terms.contains(term) {
            debug!("Dropping duplicate node selector term");
            continue;
        }
        terms.push(term.clone());
    }

    NodeSelector {
        node_selector_terms: terms,
    }
}

/// The pod's required node affinity, if it declares one
pub fn required_affinity(pod: &Pod) -> Option<&NodeSelector> {
    pod.spec
        .as_ref()?
        .affinity
        .as_ref()?
        .node_affinity
        .as_ref()?
        .required_during_scheduling_ignored_during_execution
        .as_ref()
}

/// Set the pod's required node affinity, creating the wrapper objects when
/// missing. Pod (anti-)affinity and preferred node affinity are left alone.
pub fn replace_required_affinity(pod: &mut Pod, selector: NodeSelector) {
    let spec = pod.spec.get_or_insert_with(Default::default);
    let affinity = spec.affinity.get_or_insert_with(Affinity::default);
    let node_affinity = affinity
        .node_affinity
        .get_or_insert_with(NodeAffinity::default);
    node_affinity.required_during_scheduling_ignored_during_execution = Some(selector);
}
