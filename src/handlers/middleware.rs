//! Bearer-token middleware for the protected route tree.
//!
//! Decodes the JWT once and stashes the claims as a request extension, so
//! handlers take `Extension<Claims>` instead of re-parsing headers.

use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::AppState;
use crate::models::product::ErrorResponse;

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let token = extract_bearer(req.headers()).ok_or_else(|| {
        unauthorized("Missing or malformed Authorization header".to_string())
    })?;

    let claims = state.auth.decode_token(token).map_err(|e| {
        debug!(error = %e, "Rejected bearer token");
        unauthorized(e.to_string())
    })?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() { None } else { Some(token) }
}

fn unauthorized(msg: String) -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::UNAUTHORIZED, Json(ErrorResponse { error: msg }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn well_formed_bearer_is_extracted() {
        let headers = headers_with("Bearer abc.def.ghi");
        assert_eq!(extract_bearer(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn missing_header_yields_none() {
        assert_eq!(extract_bearer(&HeaderMap::new()), None);
    }

    #[test]
    fn wrong_scheme_yields_none() {
        let headers = headers_with("Basic dXNlcjpwYXNz");
        assert_eq!(extract_bearer(&headers), None);
    }

    #[test]
    fn empty_token_yields_none() {
        let headers = headers_with("Bearer   ");
        assert_eq!(extract_bearer(&headers), None);
    }
}
