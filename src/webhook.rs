// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Admission webhook for the MySQL operator resources.
//!
//! The API server calls two endpoints for `Cluster`, `Backup`,
//! `BackupSchedule` and `Restore` objects:
//!
//! - `POST /mutate` applies defaults and answers with a JSON patch
//! - `POST /validate` defaults a copy, validates it and denies with every
//!   violation; on `UPDATE` it also refuses illegal phase transitions
//!   between `oldObject` and `object`
//!
//! `GET /healthz` and `GET /metrics` are served from the same router.
//!
//! # Example
//!
//! ```rust,no_run
//! use mysql_operator::config::OperatorConfig;
//! use mysql_operator::webhook::{webhook_router, WebhookState};
//! use std::sync::Arc;
//!
//! let router = webhook_router(Arc::new(WebhookState::new(OperatorConfig::default())));
//! ```

use crate::client::OperatorResource;
use crate::config::OperatorConfig;
use crate::constants::{
    API_GROUP, API_VERSION, HEALTH_PATH, KIND_BACKUP, KIND_BACKUP_SCHEDULE, KIND_CLUSTER,
    KIND_RESTORE, METRICS_SERVER_PATH, WEBHOOK_MUTATE_PATH, WEBHOOK_VALIDATE_PATH,
};
use crate::crd::{Backup, BackupSchedule, Cluster, Restore};
use crate::errors::WebhookError;
use crate::metrics;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use kube::{
    api::DynamicObject,
    core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation},
    ResourceExt,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

/// Shared state for webhook handlers
#[derive(Clone, Debug)]
pub struct WebhookState {
    /// Rules used for defaulting and validation
    pub config: Arc<OperatorConfig>,
}

impl WebhookState {
    #[must_use]
    pub fn new(config: OperatorConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

/// Create the webhook router with the admission, health and metrics endpoints
pub fn webhook_router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route(WEBHOOK_MUTATE_PATH, post(mutate_handler))
        .route(WEBHOOK_VALIDATE_PATH, post(validate_handler))
        .route(HEALTH_PATH, get(healthz_handler))
        .route(METRICS_SERVER_PATH, get(metrics_handler))
        .with_state(state)
}

/// What the webhook decided about one request.
#[derive(Debug)]
pub enum Verdict {
    Allow,
    Patch(json_patch::Patch),
    Deny(String),
}

/// Handle a mutating admission review.
pub async fn mutate_handler(
    State(state): State<Arc<WebhookState>>,
    Json(body): Json<AdmissionReview<DynamicObject>>,
) -> Json<AdmissionReview<DynamicObject>> {
    handle_review(body, |req| mutate(&state.config, req))
}

/// Handle a validating admission review.
pub async fn validate_handler(
    State(state): State<Arc<WebhookState>>,
    Json(body): Json<AdmissionReview<DynamicObject>>,
) -> Json<AdmissionReview<DynamicObject>> {
    handle_review(body, |req| validate(&state.config, req))
}

async fn healthz_handler() -> &'static str {
    "ok"
}

async fn metrics_handler() -> Response {
    match metrics::gather_metrics() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

fn handle_review<F>(
    body: AdmissionReview<DynamicObject>,
    decide: F,
) -> Json<AdmissionReview<DynamicObject>>
where
    F: FnOnce(&AdmissionRequest<DynamicObject>) -> Result<Verdict, WebhookError>,
{
    let req: AdmissionRequest<DynamicObject> = match body.try_into() {
        Ok(req) => req,
        Err(e) => {
            error!(error = %e, "Failed to parse admission request");
            return Json(AdmissionResponse::invalid(e.to_string()).into_review());
        }
    };

    let started = Instant::now();
    let verdict = decide(&req);
    let (response, result) = respond(&req, verdict);
    metrics::record_admission(
        &req.kind.kind,
        operation_name(&req.operation),
        result,
        started.elapsed(),
    );
    Json(response.into_review())
}

/// Turn a verdict into an admission response and a metrics result label.
fn respond(
    req: &AdmissionRequest<DynamicObject>,
    verdict: Result<Verdict, WebhookError>,
) -> (AdmissionResponse, &'static str) {
    let name = req.name.as_str();
    let kind = req.kind.kind.as_str();

    match verdict {
        Ok(Verdict::Allow) => {
            debug!(uid = %req.uid, kind, name, "Admission allowed");
            (AdmissionResponse::from(req), "allowed")
        }
        Ok(Verdict::Patch(patch)) => {
            debug!(uid = %req.uid, kind, name, ops = patch.0.len(), "Admission patched");
            match AdmissionResponse::from(req).with_patch(patch) {
                Ok(response) => (response, "patched"),
                Err(e) => {
                    error!(uid = %req.uid, kind, name, error = %e, "Failed to serialize patch");
                    (
                        AdmissionResponse::from(req).deny(format!("patch serialization error: {e}")),
                        "error",
                    )
                }
            }
        }
        Ok(Verdict::Deny(message)) => {
            warn!(uid = %req.uid, kind, name, reason = %message, "Admission denied");
            (AdmissionResponse::from(req).deny(message), "denied")
        }
        Err(e) => {
            warn!(uid = %req.uid, kind, name, error = %e, "Admission request could not be handled");
            (AdmissionResponse::from(req).deny(e.to_string()), "error")
        }
    }
}

fn operation_name(operation: &Operation) -> &'static str {
    match operation {
        Operation::Create => "CREATE",
        Operation::Update => "UPDATE",
        Operation::Delete => "DELETE",
        Operation::Connect => "CONNECT",
    }
}

/// Kinds this webhook serves, after checking the group and version.
fn served_kind(req: &AdmissionRequest<DynamicObject>) -> Result<&str, WebhookError> {
    let kind = req.kind.kind.as_str();
    match kind {
        KIND_CLUSTER | KIND_BACKUP | KIND_BACKUP_SCHEDULE | KIND_RESTORE
            if req.kind.group == API_GROUP && req.kind.version == API_VERSION =>
        {
            Ok(kind)
        }
        _ => Err(WebhookError::UnsupportedKind(format!(
            "{}/{}/{}",
            req.kind.group, req.kind.version, kind
        ))),
    }
}

/// Decode an admission object into the typed resource.
fn decode<K: OperatorResource>(obj: &DynamicObject) -> Result<K, WebhookError> {
    let value = serde_json::to_value(obj)?;
    serde_json::from_value(value).map_err(|source| WebhookError::Decode {
        kind: K::KIND.to_string(),
        source,
    })
}

// ============================================================================
// Mutation
// ============================================================================

/// Decide a mutating review: default the object and patch in the difference.
///
/// # Errors
///
/// [`WebhookError`] when the kind is not served or the object does not decode.
pub fn mutate(
    config: &OperatorConfig,
    req: &AdmissionRequest<DynamicObject>,
) -> Result<Verdict, WebhookError> {
    let kind = served_kind(req)?;
    let Some(obj) = req.object.as_ref() else {
        return Ok(Verdict::Allow);
    };

    let patch = match kind {
        KIND_CLUSTER => defaults_patch::<Cluster>(config, obj)?,
        KIND_BACKUP => defaults_patch::<Backup>(config, obj)?,
        KIND_BACKUP_SCHEDULE => defaults_patch::<BackupSchedule>(config, obj)?,
        _ => defaults_patch::<Restore>(config, obj)?,
    };

    if patch.0.is_empty() {
        Ok(Verdict::Allow)
    } else {
        Ok(Verdict::Patch(patch))
    }
}

/// JSON patch that turns `obj` into its defaulted form.
///
/// # Errors
///
/// [`WebhookError`] when `obj` does not decode as `K`.
pub fn defaults_patch<K: OperatorResource>(
    config: &OperatorConfig,
    obj: &DynamicObject,
) -> Result<json_patch::Patch, WebhookError> {
    let mut typed: K = decode(obj)?;
    let before = serde_json::to_value(&typed)?;
    typed.ensure_defaults_with(config);
    let after = serde_json::to_value(&typed)?;
    Ok(json_patch::diff(&before, &after))
}

// ============================================================================
// Validation
// ============================================================================

/// Decide a validating review.
///
/// # Errors
///
/// [`WebhookError`] when the kind is not served or an object does not decode.
pub fn validate(
    config: &OperatorConfig,
    req: &AdmissionRequest<DynamicObject>,
) -> Result<Verdict, WebhookError> {
    match served_kind(req)? {
        KIND_CLUSTER => check::<Cluster>(config, req),
        KIND_BACKUP => check::<Backup>(config, req),
        KIND_BACKUP_SCHEDULE => check::<BackupSchedule>(config, req),
        _ => check::<Restore>(config, req),
    }
}

fn check<K: OperatorResource>(
    config: &OperatorConfig,
    req: &AdmissionRequest<DynamicObject>,
) -> Result<Verdict, WebhookError> {
    let Some(obj) = req.object.as_ref() else {
        return Ok(Verdict::Allow);
    };

    let mut new: K = decode(obj)?;
    new.ensure_defaults_with(config);
    if let Err(errs) = new.validate_with(config) {
        metrics::record_validation_failure(K::KIND);
        return Ok(Verdict::Deny(format!(
            "{} \"{}\" is invalid: {errs}",
            K::KIND,
            new.name_any()
        )));
    }

    if matches!(req.operation, Operation::Update) {
        if let Some(old) = req.old_object.as_ref() {
            let old: K = decode(old)?;
            if let Err(e) = old.check_status_write(&new, config) {
                return Ok(Verdict::Deny(e.to_string()));
            }
        }
    }

    Ok(Verdict::Allow)
}

#[cfg(test)]
#[path = "webhook_tests.rs"]
mod webhook_tests;
