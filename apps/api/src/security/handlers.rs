use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::errors::AppError;
use crate::security::csrf::{cookie_value, SESSION_COOKIE};
use crate::state::AppState;

/// GET /api/csrf-token
///
/// Issues a fresh CSRF token for the caller's session, replacing any prior
/// token. Callers without a valid `sid` cookie get a new signed session
/// cookie alongside the token. This endpoint is itself exempt from CSRF
/// checking: it is the issuance step.
pub async fn handle_csrf_token(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
) -> Result<Response, AppError> {
    let store = state.gate.csrf();

    let existing = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| cookie_value(raw, SESSION_COOKIE))
        .and_then(|value| store.session_from_cookie(value));

    let (session_id, new_cookie) = match existing {
        Some(id) => (id, None),
        None => {
            let (id, cookie) = store.mint_session();
            (id, Some(cookie))
        }
    };

    let token = store.issue(&session_id);

    let mut response = Json(json!({
        "success": true,
        "token": token,
    }))
    .into_response();

    if let Some(cookie) = new_cookie {
        let value = format!("{SESSION_COOKIE}={cookie}; Path=/; HttpOnly; SameSite=Lax");
        let value =
            HeaderValue::from_str(&value).map_err(|e| AppError::Internal(anyhow::Error::new(e)))?;
        response.headers_mut().insert(header::SET_COOKIE, value);
    }

    Ok(response)
}
