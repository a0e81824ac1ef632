use crate::domain::errors::PoolError;
use crate::interface_adapters::protocol::{
    AllocateRequest, AllocateResponse, ClaimOnSignupRequest, ClaimOnSignupResponse, ErrorResponse,
    InitializeRequest, InitializeResponse, ReclaimResponse, ReleaseRequest, ReleaseResponse,
    StatusResponse,
};
use crate::interface_adapters::session::is_real_browser;
use crate::interface_adapters::state::{AppState, PostgresPoolStore, SystemClock};
use crate::use_cases::allocate::{AllocateOutcome, AllocateUseCase};
use crate::use_cases::claim_on_signup::ClaimOnSignupUseCase;
use crate::use_cases::initialize_pool::InitializePoolUseCase;
use crate::use_cases::pool_status::PoolStatusUseCase;
use crate::use_cases::reclaim::{NoopReclaimHook, ReclaimUseCase};
use crate::use_cases::release::ReleaseUseCase;
use axum::{extract::State, http::StatusCode, Json};
use tracing::{debug, info, warn};

// Handler for the per-request visitor slot allocation.
#[tracing::instrument(name = "pool_allocate", skip_all)]
pub async fn allocate(
    State(state): State<AppState>,
    Json(payload): Json<AllocateRequest>,
) -> Result<Json<AllocateResponse>, (StatusCode, Json<ErrorResponse>)> {
    let mut session = payload.session;

    // Crawlers and scripted clients never consume a slot.
    if !is_real_browser(payload.user_agent.as_deref()) {
        debug!("skipping allocation for non-browser agent");
        return Ok(Json(AllocateResponse {
            outcome: "skipped".to_string(),
            identity_number: None,
            workspace_id: None,
            expires_at: None,
            session,
        }));
    }

    let use_case = AllocateUseCase {
        clock: SystemClock,
        store: PostgresPoolStore {
            db: state.db.clone(),
        },
        lease_lifetime_seconds: state.lease_lifetime_seconds,
        hook: NoopReclaimHook,
    };

    let outcome = use_case
        .execute(&mut session)
        .await
        .map_err(|err| map_pool_error(err, PoolErrorContext::Allocate))?;

    match outcome {
        AllocateOutcome::Allocated(allocated) => Ok(Json(AllocateResponse {
            outcome: "allocated".to_string(),
            identity_number: Some(allocated.identity_number),
            workspace_id: Some(allocated.workspace_id),
            expires_at: Some(allocated.expires_at),
            session,
        })),
        AllocateOutcome::Exhausted => {
            // Non-fatal: the visitor continues fully anonymous.
            warn!("visitor pool exhausted");
            Ok(Json(AllocateResponse {
                outcome: "exhausted".to_string(),
                identity_number: None,
                workspace_id: None,
                expires_at: None,
                session,
            }))
        }
    }
}

// Handler for explicit early release (restart-session flow).
pub async fn release(
    State(state): State<AppState>,
    Json(payload): Json<ReleaseRequest>,
) -> Result<Json<ReleaseResponse>, (StatusCode, Json<ErrorResponse>)> {
    let mut session = payload.session;
    let use_case = ReleaseUseCase {
        store: PostgresPoolStore {
            db: state.db.clone(),
        },
    };

    let result = use_case
        .execute(&mut session)
        .await
        .map_err(|err| map_pool_error(err, PoolErrorContext::Release))?;

    Ok(Json(ReleaseResponse {
        released: result.released,
        session,
    }))
}

// Handler for the one-time ownership transfer on signup.
#[tracing::instrument(name = "pool_claim_on_signup", skip_all, fields(new_account_id = payload.new_account_id))]
pub async fn claim_on_signup(
    State(state): State<AppState>,
    Json(payload): Json<ClaimOnSignupRequest>,
) -> Result<Json<ClaimOnSignupResponse>, (StatusCode, Json<ErrorResponse>)> {
    let mut session = payload.session;
    let use_case = ClaimOnSignupUseCase {
        clock: SystemClock,
        store: PostgresPoolStore {
            db: state.db.clone(),
        },
    };

    let workspace_id = use_case
        .execute(&mut session, payload.new_account_id)
        .await
        .map_err(|err| map_pool_error(err, PoolErrorContext::ClaimOnSignup))?;

    if let Some(workspace_id) = workspace_id {
        info!(workspace_id, "visitor workspace transferred on signup");
    }

    Ok(Json(ClaimOnSignupResponse {
        workspace_id,
        session,
    }))
}

// Handler for the periodic/admin reclaim sweep.
pub async fn reclaim(
    State(state): State<AppState>,
) -> Result<Json<ReclaimResponse>, (StatusCode, Json<ErrorResponse>)> {
    let use_case = ReclaimUseCase {
        clock: SystemClock,
        store: PostgresPoolStore {
            db: state.db.clone(),
        },
        hook: NoopReclaimHook,
    };

    let freed = use_case
        .execute()
        .await
        .map_err(|err| map_pool_error(err, PoolErrorContext::Reclaim))?;

    Ok(Json(ReclaimResponse { freed }))
}

// Handler for the operational status page.
pub async fn status(
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, (StatusCode, Json<ErrorResponse>)> {
    let use_case = PoolStatusUseCase {
        clock: SystemClock,
        store: PostgresPoolStore {
            db: state.db.clone(),
        },
    };

    let status = use_case
        .execute()
        .await
        .map_err(|err| map_pool_error(err, PoolErrorContext::Status))?;

    Ok(Json(StatusResponse {
        total: status.total,
        allocated: status.allocated,
        free: status.free,
        expired: status.expired,
    }))
}

// Handler for the one-shot deployment bootstrap.
pub async fn initialize(
    State(state): State<AppState>,
    Json(payload): Json<InitializeRequest>,
) -> Result<Json<InitializeResponse>, (StatusCode, Json<ErrorResponse>)> {
    let use_case = InitializePoolUseCase {
        store: PostgresPoolStore {
            db: state.db.clone(),
        },
    };

    let created = use_case
        .execute(payload.size)
        .await
        .map_err(|err| map_pool_error(err, PoolErrorContext::Initialize))?;

    Ok(Json(InitializeResponse { created }))
}

// Helper to build a JSON error response.
fn error_response(status: StatusCode, message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            message: message.to_string(),
        }),
    )
}

// Maps domain errors to HTTP responses by endpoint context.
enum PoolErrorContext {
    Allocate,
    Release,
    ClaimOnSignup,
    Reclaim,
    Status,
    Initialize,
}

fn map_pool_error(err: PoolError, context: PoolErrorContext) -> (StatusCode, Json<ErrorResponse>) {
    match context {
        PoolErrorContext::Initialize => match err {
            PoolError::InvalidPoolSize => {
                error_response(StatusCode::BAD_REQUEST, "pool size must be at least 1")
            }
            PoolError::StorageFailure => error_response(StatusCode::BAD_GATEWAY, "storage error"),
        },
        PoolErrorContext::Allocate
        | PoolErrorContext::Release
        | PoolErrorContext::ClaimOnSignup
        | PoolErrorContext::Reclaim
        | PoolErrorContext::Status => match err {
            PoolError::StorageFailure => error_response(StatusCode::BAD_GATEWAY, "storage error"),
            PoolError::InvalidPoolSize => {
                error_response(StatusCode::BAD_REQUEST, "invalid pool request")
            }
        },
    }
}
