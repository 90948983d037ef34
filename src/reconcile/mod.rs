//! Per-object decisions for nodes and pods
//!
//! Both reconcilers are pure: they take the object as delivered by the watch
//! loop or the admission request and return what should change. Persisting
//! the change is left to the controller and webhook adapters.

pub mod node;
pub mod object;
pub mod pod;

pub use node::{NodeOutcome, NodeReconciler};
pub use object::{ObjectOutcome, WatchedObject};
pub use pod::{MutationOutcome, PodMutator};
