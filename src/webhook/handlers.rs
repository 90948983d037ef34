use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use k8s_openapi::api::core::v1::Pod;
use kube::api::DynamicObject;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::MalformedPolicy;
use crate::reconcile::{MutationOutcome, ObjectOutcome, WatchedObject};
use crate::webhook::state::WebhookState;

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}

/// Mutating admission endpoint
pub async fn mutate(
    State(state): State<WebhookState>,
    Json(review): Json<AdmissionReview<DynamicObject>>,
) -> Json<AdmissionReview<DynamicObject>> {
    let request: AdmissionRequest<DynamicObject> = match review.try_into() {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Invalid admission review");
            return Json(AdmissionResponse::invalid(e.to_string()).into_review());
        }
    };
    Json(admit(&state, &request).into_review())
}

// ============================================================================
// SBIO: Pure admission logic (no I/O)
// ============================================================================

/// Answer one admission request.
///
/// Only pods are mutated; anything else is admitted untouched. A pod whose
/// minimum-version labels cannot be parsed is admitted or denied according
/// to the configured [`MalformedPolicy`].
pub fn admit(state: &WebhookState, request: &AdmissionRequest<DynamicObject>) -> AdmissionResponse {
    let response = AdmissionResponse::from(request);
    let Some(object) = request.object.clone() else {
        return response;
    };

    let object = match WatchedObject::from_dynamic(object) {
        Ok(object) => object,
        Err(e) => {
            warn!(error = %e, "Could not read admitted object");
            return response;
        }
    };
    let name = object.name();
    let original = match &object {
        WatchedObject::Pod(pod) => pod.clone(),
        other => {
            warn!(kind = other.kind(), name = %name, "Received object is not a Pod");
            return response;
        }
    };

    match object.reconcile(&state.reconciler, &state.mutator) {
        Ok(ObjectOutcome::Pod(MutationOutcome::Mutated(mutated))) => {
            match pod_patch(&original, &mutated) {
                Ok(patch) => response
                    .with_patch(patch)
                    .unwrap_or_else(|e| AdmissionResponse::from(request).deny(e.to_string())),
                Err(e) => response.deny(format!("failed to build patch: {}", e)),
            }
        }
        Ok(_) => response,
        Err(e) => match state.on_malformed {
            MalformedPolicy::Allow => {
                warn!(pod = %name, error = %e, "Admitting pod without version constraint");
                response
            }
            MalformedPolicy::Deny => {
                info!(pod = %name, error = %e, "Denying pod");
                response.deny(e.to_string())
            }
        },
    }
}

/// JSON patch turning `original` into `mutated`
pub fn pod_patch(original: &Pod, mutated: &Pod) -> Result<json_patch::Patch, serde_json::Error> {
    let before = serde_json::to_value(original)?;
    let after = serde_json::to_value(mutated)?;
    Ok(json_patch::diff(&before, &after))
}

/// Create the Axum router
pub fn create_router(state: WebhookState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/mutate", post(mutate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
