//! Admission limit for concurrent requests.
//!
//! When [`AppState`] carries a semaphore, [`limit_concurrency`] holds one
//! permit for the lifetime of each request. Requests beyond the limit wait
//! for a permit instead of being rejected.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{AppState, ErrorResponse};

/// Detail sent with the 503 when no permit can ever be granted.
pub const MSG_ADMISSION_UNAVAILABLE: &str = "admission limit unavailable";

/// axum middleware enforcing `AppState::max_concurrent_requests`.
///
/// Install with `axum::middleware::from_fn_with_state(state, limit_concurrency)`.
pub async fn limit_concurrency(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(semaphore) = state.admission().cloned() else {
        return next.run(request).await;
    };

    match semaphore.acquire_owned().await {
        Ok(_permit) => next.run(request).await,
        Err(_) => {
            tracing::error!("admission semaphore closed");
            ErrorResponse::service_unavailable(MSG_ADMISSION_UNAVAILABLE).into_response()
        }
    }
}
