//! services/api/src/web/middleware.rs
//!
//! Session gate in front of every `/me`, `/foods`, `/meals`, `/workouts` and
//! `/stats` route.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use nutrilog_core::PortError;
use std::sync::Arc;
use tracing::debug;

use crate::error::ApiError;
use crate::web::auth::session_id_from_headers;
use crate::web::state::AppState;

/// Resolves the `session` cookie to its owner and hands the owner's id to the
/// handler as an `Extension<Uuid>`.
///
/// A missing cookie, an unknown session and an expired one all answer 401
/// with the same body, so callers cannot tell them apart.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(session_id) = session_id_from_headers(req.headers()) else {
        return Err(PortError::Unauthorized.into());
    };

    let owner = match state.users.validate_auth_session(session_id).await {
        Ok(owner) => owner,
        Err(e) => {
            debug!(path = %req.uri().path(), "Session rejected: {}", e);
            return Err(PortError::Unauthorized.into());
        }
    };

    req.extensions_mut().insert(owner);
    Ok(next.run(req).await)
}
