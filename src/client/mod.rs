//! Kubernetes client construction and node writes

pub mod nodes;

pub use nodes::{KubeNodeWriter, NodeLabelWriter};

use std::path::PathBuf;

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("In-cluster configuration unavailable: {0}")]
    InCluster(#[from] kube::config::InClusterError),

    #[error("Failed to load kubeconfig {path}: {source}")]
    Kubeconfig {
        path: PathBuf,
        #[source]
        source: kube::config::KubeconfigError,
    },

    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),
}

/// Where the client takes its credentials from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMode {
    /// Service account of the pod we run in
    InCluster,
    /// A kubeconfig file, for running from a workstation
    Local(PathBuf),
}

/// Build a Kubernetes client for the given mode
pub async fn make_client(mode: &ClientMode) -> Result<Client, ClientError> {
    let config = match mode {
        ClientMode::InCluster => {
            info!("Using in-cluster Kubernetes configuration");
            Config::incluster()?
        }
        ClientMode::Local(path) => {
            info!(kubeconfig = %path.display(), "Using local kubeconfig");
            let kubeconfig = Kubeconfig::read_from(path).map_err(|source| {
                ClientError::Kubeconfig {
                    path: path.clone(),
                    source,
                }
            })?;
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .map_err(|source| ClientError::Kubeconfig {
                    path: path.clone(),
                    source,
                })?
        }
    };
    Ok(Client::try_from(config)?)
}
