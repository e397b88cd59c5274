use super::*;

pub(crate) async fn current_user(
    Extension(viewer): Extension<IdentityView>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "current user",
        "user": viewer,
    }))
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct ChangePasswordRequest {
    old_password: String,
    new_password: String,
}

pub(crate) async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<IdentityView>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>, Response> {
    state
        .sessions
        .change_password(&viewer.id, &payload.old_password, &payload.new_password)
        .await
        .map_err(failure)?;
    Ok(Json(serde_json::json!({"message": "password changed"})))
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct UpdateAccountRequest {
    full_name: String,
    email: String,
}

pub(crate) async fn update_account(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<IdentityView>,
    Json(payload): Json<UpdateAccountRequest>,
) -> Result<Json<serde_json::Value>, Response> {
    let full_name = payload.full_name.trim().to_string();
    let email = payload.email.trim().to_lowercase();
    if full_name.is_empty() || email.is_empty() {
        return Err(failure(AccountError::Validation(
            "full_name and email are required".to_string(),
        )));
    }

    let updated = state
        .store
        .update_profile(&viewer.id, full_name, email)
        .await
        .map_err(failure)?;
    Ok(Json(serde_json::json!({
        "message": "account updated",
        "user": updated.to_view(),
    })))
}

pub(crate) async fn update_avatar(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<IdentityView>,
    multipart: Multipart,
) -> Result<Json<serde_json::Value>, Response> {
    let spooled = read_single_file(&state.tmp_dir, "avatar", multipart)
        .await
        .map_err(failure)?;
    let Some(spooled) = spooled else {
        return Err(failure(AccountError::Validation(
            "avatar file is required".to_string(),
        )));
    };
    let Some(media) = state.media.upload(&spooled) else {
        return Err(failure(AccountError::Upload(
            "avatar upload failed".to_string(),
        )));
    };

    let updated = state
        .store
        .set_avatar(&viewer.id, media.url)
        .await
        .map_err(failure)?;
    Ok(Json(serde_json::json!({
        "message": "avatar updated",
        "user": updated.to_view(),
    })))
}

pub(crate) async fn update_cover_image(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<IdentityView>,
    multipart: Multipart,
) -> Result<Json<serde_json::Value>, Response> {
    let spooled = read_single_file(&state.tmp_dir, "cover_image", multipart)
        .await
        .map_err(failure)?;
    let Some(spooled) = spooled else {
        return Err(failure(AccountError::Validation(
            "cover image file is required".to_string(),
        )));
    };
    let Some(media) = state.media.upload(&spooled) else {
        return Err(failure(AccountError::Upload(
            "cover image upload failed".to_string(),
        )));
    };

    let updated = state
        .store
        .set_cover_image(&viewer.id, media.url)
        .await
        .map_err(failure)?;
    Ok(Json(serde_json::json!({
        "message": "cover image updated",
        "user": updated.to_view(),
    })))
}
