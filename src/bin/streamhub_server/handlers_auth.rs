use super::*;

/// Multipart registration: text fields plus a required avatar file and an
/// optional cover image. Field validation and uniqueness checks run before
/// any upload, so a rejected registration stores no media; the session
/// layer then receives upload outcomes only.
pub(crate) async fn register(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<serde_json::Value>, Response> {
    let form = read_register_form(&state.tmp_dir, multipart)
        .await
        .map_err(failure)?;

    let precheck = state
        .sessions
        .precheck_registration(&form.full_name, &form.email, &form.password, &form.handle)
        .await;
    if let Err(err) = precheck {
        discard_spooled(&form);
        return Err(failure(err));
    }
    if form.avatar.is_none() {
        discard_spooled(&form);
        return Err(failure(AccountError::Upload(
            "avatar upload failed".to_string(),
        )));
    }

    let avatar = form
        .avatar
        .as_deref()
        .and_then(|path| state.media.upload(path))
        .map(|m| m.url);
    let cover_image = form
        .cover_image
        .as_deref()
        .and_then(|path| state.media.upload(path))
        .map(|m| m.url);

    let user = state
        .sessions
        .register(NewRegistration {
            full_name: form.full_name,
            email: form.email,
            password: form.password,
            handle: form.handle,
            avatar,
            cover_image,
        })
        .await
        .map_err(failure)?;

    Ok(Json(serde_json::json!({
        "message": "user registered",
        "user": user,
    })))
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct LoginRequest {
    identifier: String,
    password: String,
}

pub(crate) async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<serde_json::Value>), Response> {
    let outcome = state
        .sessions
        .login(&payload.identifier, &payload.password)
        .await
        .map_err(failure)?;

    let jar = set_session_cookies(jar, &outcome.access_token, &outcome.refresh_token);
    Ok((
        jar,
        Json(serde_json::json!({
            "message": "logged in",
            "user": outcome.identity,
            "access_token": outcome.access_token,
            "refresh_token": outcome.refresh_token,
        })),
    ))
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct RefreshRequest {
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Rotation endpoint. The refresh token can arrive as a cookie or in the
/// JSON body; a non-empty cookie wins.
pub(crate) async fn refresh_token(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    payload: Option<Json<RefreshRequest>>,
) -> Result<(CookieJar, Json<serde_json::Value>), Response> {
    let from_body = payload.and_then(|Json(p)| p.refresh_token);
    let from_cookie = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty());
    let presented = from_cookie.or(from_body);

    let tokens = state
        .sessions
        .refresh(presented.as_deref())
        .await
        .map_err(failure)?;

    let jar = set_session_cookies(jar, &tokens.access_token, &tokens.refresh_token);
    Ok((
        jar,
        Json(serde_json::json!({
            "message": "session refreshed",
            "access_token": tokens.access_token,
            "refresh_token": tokens.refresh_token,
        })),
    ))
}

pub(crate) async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<IdentityView>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<serde_json::Value>), Response> {
    state.sessions.logout(&viewer.id).await.map_err(failure)?;
    let jar = clear_session_cookies(jar);
    Ok((jar, Json(serde_json::json!({"message": "logged out"}))))
}
