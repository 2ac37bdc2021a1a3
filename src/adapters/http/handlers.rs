//! HTTP handlers for the webhook, promo, and admin endpoints.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::application::RegisterAccountHandler;
use crate::domain::account::Account;
use crate::domain::billing::{PaymentEventProcessor, PaymentWebhookVerifier, ProcessOutcome};
use crate::domain::foundation::Timestamp;
use crate::domain::promo::{
    BatchSpec, PromoCode, PromoCodeEntry, PromoCodeGenerator, PromoCodeKind,
    RedemptionCoordinator, RedemptionError,
};
use crate::ports::PromoCodeRepository;

use super::dto::{
    AccountResponse, BulkGenerateRequest, BulkGenerateResponse, CodeSummary, CreateCodeRequest,
    ErrorResponse, RedeemCodeRequest, RedeemCodeResponse, ValidateCodeRequest,
    ValidateCodeResponse, WebhookAck,
};

/// Signature header the payment provider sends.
const SIGNATURE_HEADER: &str = "pay-signature";

/// Shared application state for the HTTP surface.
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<PaymentWebhookVerifier>,
    pub processor: Arc<PaymentEventProcessor>,
    pub coordinator: Arc<RedemptionCoordinator>,
    pub generator: Arc<PromoCodeGenerator>,
    pub ledger: Arc<dyn PromoCodeRepository>,
    pub register: Arc<RegisterAccountHandler>,
}

fn error_response(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(code, message))).into_response()
}

async fn authenticated_account(state: &AppState, headers: &HeaderMap) -> Result<Account, Response> {
    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| {
            error_response(
                StatusCode::UNAUTHORIZED,
                "AUTHENTICATION_REQUIRED",
                "Missing bearer token",
            )
        })?;

    state.register.authenticate(bearer).await.map_err(|e| {
        error_response(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", e.message().to_string())
    })
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook intake
// ════════════════════════════════════════════════════════════════════════════════

/// `POST /webhooks/payments`
///
/// Verification happens before anything else touches the payload. After
/// verification, every outcome - applied, ignored, anomaly, even a storage
/// failure - is acknowledged with 2xx so the provider stops redelivering;
/// failures are logged and audited instead of surfaced.
pub async fn handle_payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(signature) = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) else {
        return error_response(
            StatusCode::UNAUTHORIZED,
            "SIGNATURE_MISSING",
            "Missing signature header",
        );
    };

    let event = match state.verifier.verify_and_parse(&body, signature) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "webhook rejected at intake");
            return error_response(e.status_code(), "SIGNATURE_INVALID", e.to_string());
        }
    };

    let outcome = match state.processor.process(&event).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(event_id = %event.id, error = %e, "webhook processing failed; acknowledged");
            return (
                StatusCode::OK,
                Json(WebhookAck {
                    received: true,
                    outcome: "error_logged".to_string(),
                }),
            )
                .into_response();
        }
    };

    let outcome_str = match outcome {
        ProcessOutcome::Applied { .. } => "applied",
        ProcessOutcome::NoChange { .. } => "no_change",
        ProcessOutcome::Ignored { .. } => "ignored",
        ProcessOutcome::Anomaly { .. } => "anomaly",
    };

    (
        StatusCode::OK,
        Json(WebhookAck {
            received: true,
            outcome: outcome_str.to_string(),
        }),
    )
        .into_response()
}

// ════════════════════════════════════════════════════════════════════════════════
// Account endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// `GET /account`
///
/// Resolves the bearer token (registering a trial account on first use)
/// and returns the entitlement summary.
pub async fn get_account(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let account = match authenticated_account(&state, &headers).await {
        Ok(account) => account,
        Err(response) => return response,
    };

    let now = Timestamp::now();
    let response = AccountResponse {
        account_id: account.id.to_string(),
        email: account.email.clone(),
        status: account.subscription.status.as_str().to_string(),
        plan: account.subscription.plan.map(|p| p.as_str().to_string()),
        has_access: account.has_access(now),
        trial_days_left: account.trial_days_left(now),
        current_period_end: account
            .subscription
            .current_period_end
            .map(|t| t.to_string()),
    };

    (StatusCode::OK, Json(response)).into_response()
}

// ════════════════════════════════════════════════════════════════════════════════
// Promo endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// `POST /promo/validate`
///
/// Authentication is optional: with a bearer token the already-used check
/// runs for that account, without one only the code-level checks run.
pub async fn validate_code(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ValidateCodeRequest>,
) -> Response {
    let code = match PromoCode::try_new(&request.code) {
        Ok(code) => code,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, "INVALID_CODE_FORMAT", e.to_string())
        }
    };

    let account_id = if headers.contains_key("authorization") {
        match authenticated_account(&state, &headers).await {
            Ok(account) => Some(account.id),
            Err(response) => return response,
        }
    } else {
        None
    };

    match state.coordinator.validate(&code, account_id.as_ref()).await {
        Ok(report) => {
            let message = report.reason.as_ref().map(|r| r.user_message());
            (
                StatusCode::OK,
                Json(ValidateCodeResponse {
                    valid: report.valid,
                    reason: report.reason,
                    message,
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(code = %code, error = %e, "validation failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "Validation failed")
        }
    }
}

/// `POST /promo/redeem`
///
/// The response is definitive: on success the entitlement change has
/// already been persisted.
pub async fn redeem_code(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RedeemCodeRequest>,
) -> Response {
    let code = match PromoCode::try_new(&request.code) {
        Ok(code) => code,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, "INVALID_CODE_FORMAT", e.to_string())
        }
    };

    let account = match authenticated_account(&state, &headers).await {
        Ok(account) => account,
        Err(response) => return response,
    };

    match state.coordinator.redeem(&code, account.id).await {
        Ok(entry) => (StatusCode::OK, Json(RedeemCodeResponse::from(&entry))).into_response(),
        Err(RedemptionError::Invalid(reason)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse::new("INVALID_REDEMPTION", reason.user_message())),
        )
            .into_response(),
        Err(RedemptionError::Infrastructure(e)) => {
            tracing::error!(code = %code, error = %e, "redemption failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "Redemption failed")
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Admin endpoints
// ════════════════════════════════════════════════════════════════════════════════

fn parse_kind(kind: &str) -> Result<PromoCodeKind, Response> {
    PromoCodeKind::parse(kind).ok_or_else(|| {
        error_response(
            StatusCode::BAD_REQUEST,
            "INVALID_KIND",
            format!("unknown promo kind '{}'", kind),
        )
    })
}

/// `POST /admin/promo`
pub async fn create_code(
    State(state): State<AppState>,
    Json(request): Json<CreateCodeRequest>,
) -> Response {
    let code = match PromoCode::try_new(&request.code) {
        Ok(code) => code,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, "INVALID_CODE_FORMAT", e.to_string())
        }
    };
    let kind = match parse_kind(&request.kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    let entry = match PromoCodeEntry::new(
        code,
        kind,
        request.value,
        request.usage_limit,
        request
            .valid_from
            .map(Timestamp::from_datetime)
            .unwrap_or_else(Timestamp::now),
        request.valid_until.map(Timestamp::from_datetime),
    ) {
        Ok(entry) => entry,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, "INVALID_CODE", e.to_string()),
    };

    match state.ledger.insert(&entry).await {
        Ok(crate::ports::InsertOutcome::Inserted) => {
            (StatusCode::CREATED, Json(CodeSummary::from(&entry))).into_response()
        }
        Ok(crate::ports::InsertOutcome::DuplicateCode) => {
            error_response(StatusCode::CONFLICT, "CODE_EXISTS", "Code already exists")
        }
        Err(e) => {
            tracing::error!(error = %e, "code creation failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "Creation failed")
        }
    }
}

/// `POST /admin/promo/bulk`
pub async fn bulk_generate(
    State(state): State<AppState>,
    Json(request): Json<BulkGenerateRequest>,
) -> Response {
    let kind = match parse_kind(&request.kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    let spec = BatchSpec {
        count: request.count,
        kind,
        value: request.value,
        prefix: request.prefix.to_uppercase(),
        usage_limit: request.usage_limit,
        valid_from: request
            .valid_from
            .map(Timestamp::from_datetime)
            .unwrap_or_else(Timestamp::now),
        valid_until: request.valid_until.map(Timestamp::from_datetime),
    };

    match state.generator.generate_batch(&spec).await {
        Ok(report) => (
            StatusCode::CREATED,
            Json(BulkGenerateResponse {
                created: report
                    .created
                    .iter()
                    .map(|e| e.code.as_str().to_string())
                    .collect(),
                collision_failures: report.collision_failures,
            }),
        )
            .into_response(),
        Err(e) => error_response(StatusCode::BAD_REQUEST, "GENERATION_FAILED", e.message().to_string()),
    }
}

/// `GET /admin/promo`
pub async fn list_codes(State(state): State<AppState>) -> Response {
    match state.ledger.list().await {
        Ok(entries) => {
            let summaries: Vec<CodeSummary> = entries.iter().map(CodeSummary::from).collect();
            (StatusCode::OK, Json(summaries)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "code listing failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "Listing failed")
        }
    }
}

/// `POST /admin/promo/:code/deactivate`
pub async fn deactivate_code(State(state): State<AppState>, Path(code): Path<String>) -> Response {
    let code = match PromoCode::try_new(&code) {
        Ok(code) => code,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, "INVALID_CODE_FORMAT", e.to_string())
        }
    };

    match state.ledger.set_active(&code, false).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => error_response(StatusCode::NOT_FOUND, "CODE_NOT_FOUND", "Code not found"),
        Err(e) => {
            tracing::error!(error = %e, "code deactivation failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "Deactivation failed")
        }
    }
}
