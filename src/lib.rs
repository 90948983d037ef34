//! Version-compatibility contract between pods and the nodes that run them.
//!
//! - Nodes are labelled with the major/minor versions of their containerd
//!   runtime and kubelet (`mwam.com/containerd-major-version`, ...).
//! - Pods labelled with `mwam.com/min-containerd-version` or
//!   `mwam.com/min-kubelet-version` get a required node affinity that only
//!   matches nodes at or above those versions.
//!
//! The pure decision logic lives in [`versions`], [`labels`], [`affinity`]
//! and [`reconcile`]. [`controller`], [`webhook`] and [`client`] are the thin
//! I/O layers around it.

pub mod affinity;
pub mod cli;
pub mod client;
pub mod config;
pub mod controller;
pub mod labels;
pub mod reconcile;
pub mod versions;
pub mod webhook;
