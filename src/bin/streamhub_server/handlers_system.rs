use super::*;

/// Typed request gate: pull the access token from the cookie or the
/// Authorization header, authenticate it, and attach the sanitized
/// identity to the request extensions for downstream handlers.
pub(crate) async fn require_session(
    State(state): State<Arc<AppState>>,
    req: axum::extract::Request,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(req.headers());
    let cookie_token = jar.get(ACCESS_COOKIE).map(|c| c.value().to_string());
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let token = auth::token_from_parts(cookie_token.as_deref(), bearer);

    match state.authenticator.authenticate(token.as_deref()).await {
        Ok(viewer) => {
            let mut req = req;
            req.extensions_mut().insert(viewer);
            next.run(req).await
        }
        Err(err) => failure(err),
    }
}

pub(crate) async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}
