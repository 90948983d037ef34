//! Mutating admission webhook
//!
//! Receives `AdmissionReview` requests for pods and answers with a JSON patch
//! that adds the minimum-version node affinity computed by the
//! [`PodMutator`](crate::reconcile::PodMutator).

pub mod handlers;
pub mod state;

pub use handlers::{admit, create_router, pod_patch};
pub use state::WebhookState;

use std::path::PathBuf;

use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, WebhookSettings};

#[derive(Error, Debug)]
pub enum WebhookError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to load TLS certificate {cert} / {key}: {source}")]
    Tls {
        cert: PathBuf,
        key: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// SBIO: I/O wrapper - the HTTP listener
// ============================================================================

/// Serve the webhook until the listener fails
pub async fn serve(settings: &WebhookSettings, state: WebhookState) -> Result<(), WebhookError> {
    let addr = settings.socket_addr()?;
    let app = create_router(state);

    if settings.tls {
        let tls = RustlsConfig::from_pem_file(&settings.cert_file, &settings.key_file)
            .await
            .map_err(|source| WebhookError::Tls {
                cert: settings.cert_file.clone(),
                key: settings.key_file.clone(),
                source,
            })?;
        info!(%addr, "Webhook listening (TLS)");
        axum_server::bind_rustls(addr, tls)
            .serve(app.into_make_service())
            .await?;
    } else {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(%addr, "Webhook listening (plain HTTP)");
        axum::serve(listener, app).await?;
    }
    Ok(())
}
