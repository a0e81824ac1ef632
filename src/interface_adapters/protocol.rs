use serde::{Deserialize, Serialize};

// The client-session values the web layer stores and re-presents on every
// request. Echoed back, possibly updated, in each response.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ClientSessionPayload {
    pub visitor_token: Option<String>,
    pub visitor_identity: Option<i32>,
    pub visitor_workspace: Option<i64>,
}

// Request payload for slot allocation.
#[derive(Debug, Deserialize)]
pub struct AllocateRequest {
    #[serde(default)]
    pub session: ClientSessionPayload,
    pub user_agent: Option<String>,
}

// Response payload for slot allocation.
#[derive(Debug, Serialize)]
pub struct AllocateResponse {
    // "allocated", "exhausted", or "skipped" (non-browser caller).
    pub outcome: String,
    pub identity_number: Option<i32>,
    pub workspace_id: Option<i64>,
    pub expires_at: Option<u64>,
    pub session: ClientSessionPayload,
}

// Request payload for explicit early release.
#[derive(Debug, Deserialize)]
pub struct ReleaseRequest {
    #[serde(default)]
    pub session: ClientSessionPayload,
}

// Response payload for explicit early release.
#[derive(Debug, Serialize)]
pub struct ReleaseResponse {
    pub released: bool,
    pub session: ClientSessionPayload,
}

// Request payload for the signup ownership transfer.
#[derive(Debug, Deserialize)]
pub struct ClaimOnSignupRequest {
    #[serde(default)]
    pub session: ClientSessionPayload,
    pub new_account_id: i64,
}

// Response payload for the signup ownership transfer.
#[derive(Debug, Serialize)]
pub struct ClaimOnSignupResponse {
    pub workspace_id: Option<i64>,
    pub session: ClientSessionPayload,
}

// Response payload for the reclaim sweep.
#[derive(Debug, Serialize)]
pub struct ReclaimResponse {
    pub freed: u64,
}

// Response payload for the pool status page.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub total: u64,
    pub allocated: u64,
    pub free: u64,
    pub expired: u64,
}

// Request payload for the one-shot pool bootstrap.
#[derive(Debug, Deserialize)]
pub struct InitializeRequest {
    pub size: u32,
}

// Response payload for the one-shot pool bootstrap.
#[derive(Debug, Serialize)]
pub struct InitializeResponse {
    pub created: u32,
}

// Simple error envelope for JSON responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}
